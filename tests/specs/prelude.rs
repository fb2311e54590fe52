//! Shared fixtures for behavioral specs

use chrono::{DateTime, TimeZone, Utc};
use hearth_adapters::{FakeNotifyAdapter, FakeRemoteStore};
use hearth_core::clock::FakeClock;
use hearth_core::config::EngineConfig;
use hearth_core::household::Household;
use hearth_core::id::SequentialIdGen;
use hearth_engine::TrackerEngine;
use tempfile::TempDir;

pub type SpecEngine =
    TrackerEngine<FakeRemoteStore, FakeNotifyAdapter, FakeClock, SequentialIdGen>;

pub struct Bench {
    pub engine: SpecEngine,
    pub remote: FakeRemoteStore,
    pub notify: FakeNotifyAdapter,
    pub clock: FakeClock,
    _dir: TempDir,
}

/// Engine wired to fakes, clock frozen at the given instant
pub fn bench_at(start: DateTime<Utc>) -> Bench {
    let dir = tempfile::tempdir().unwrap();
    let remote = FakeRemoteStore::new();
    let notify = FakeNotifyAdapter::new();
    let clock = FakeClock::at(start);

    let mut config = EngineConfig::default();
    config.journal_path = dir.path().join("outbox.jsonl");

    let engine = TrackerEngine::new(
        config,
        Household::new("home-1".into()),
        remote.clone(),
        notify.clone(),
        clock.clone(),
        SequentialIdGen::new("id"),
    )
    .unwrap();

    Bench {
        engine,
        remote,
        notify,
        clock,
        _dir: dir,
    }
}

pub fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}
