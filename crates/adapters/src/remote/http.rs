// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP implementation of the remote store adapter
//!
//! Calls block with a bounded timeout, so they run on the blocking
//! thread pool; a timeout surfaces as a transient error eligible for
//! outbox retry.

use super::{RemoteError, RemoteStore};
use async_trait::async_trait;
use hearth_core::config::EngineConfig;
use hearth_core::outbox::OutboxAction;
use std::time::Duration;

/// Remote store client over plain HTTP
#[derive(Clone)]
pub struct HttpRemoteStore {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            base_url: base_url.into(),
        }
    }

    /// Build a client from the engine configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.remote_url.clone(), config.remote_timeout)
    }

    fn action_url(&self, action: &OutboxAction) -> String {
        format!(
            "{}/households/{}/tasks/{}/actions",
            self.base_url, action.household_id, action.task_id
        )
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn apply(&self, action: &OutboxAction) -> Result<(), RemoteError> {
        let agent = self.agent.clone();
        let url = self.action_url(action);
        let key = action.id.to_string();
        let body = serde_json::to_string(action)
            .map_err(|e| RemoteError::Rejected(format!("unencodable action: {}", e)))?;

        let result = tokio::task::spawn_blocking(move || {
            agent
                .post(&url)
                .header("content-type", "application/json")
                .header("idempotency-key", &key)
                .send(body.as_str())
        })
        .await
        .map_err(|e| RemoteError::Transient(format!("apply interrupted: {}", e)))?;

        match result {
            Ok(_) => Ok(()),
            Err(ureq::Error::StatusCode(404)) => {
                Err(RemoteError::NotFound(action.task_id.to_string()))
            }
            Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Err(
                RemoteError::Rejected(format!("{} returned status {}", action.kind, code)),
            ),
            Err(err) => Err(RemoteError::Transient(err.to_string())),
        }
    }
}
