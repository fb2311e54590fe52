// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency graph over a household's tasks
//!
//! Maintains directed "blocks" edges and derives each task's
//! blocked/open status. An edge `from -> to` means `from` depends on
//! `to`. Edges whose target has reached a terminal status are resolved:
//! they no longer block and are ignored by cycle checks.
//!
//! Forward and reverse edges are kept in sync so "who is waiting on
//! this task" is a direct lookup rather than a scan.

use crate::task::{TaskId, TaskStatus};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Inserting the edge would let a task (transitively) depend on itself
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("dependency cycle: {from} -> {to}")]
pub struct CycleError {
    pub from: TaskId,
    pub to: TaskId,
}

/// Derived blocking state for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedStatus {
    pub blocked: bool,
    /// Blockers not yet in a terminal status, sorted for stable output
    pub unresolved_blockers: Vec<TaskId>,
}

/// Looks up the current status of a task; `None` means the task
/// vanished, which resolves any edge pointing at it
pub trait StatusSource {
    fn status_of(&self, id: &TaskId) -> Option<TaskStatus>;
}

impl<F> StatusSource for F
where
    F: Fn(&TaskId) -> Option<TaskStatus>,
{
    fn status_of(&self, id: &TaskId) -> Option<TaskStatus> {
        self(id)
    }
}

/// Directed dependency edges for one household
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// task -> tasks it depends on
    edges: HashMap<TaskId, HashSet<TaskId>>,
    /// task -> tasks that depend on it
    reverse: HashMap<TaskId, HashSet<TaskId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `from` depends-on `to`.
    ///
    /// Rejected with `CycleError` when `to` already (transitively)
    /// depends on `from` through unresolved edges; the graph is left
    /// unchanged on rejection.
    pub fn add_edge(
        &mut self,
        from: &TaskId,
        to: &TaskId,
        statuses: &impl StatusSource,
    ) -> Result<(), CycleError> {
        if from == to || self.reaches(to, from, statuses) {
            return Err(CycleError {
                from: from.clone(),
                to: to.clone(),
            });
        }
        self.edges
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        self.reverse
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
        Ok(())
    }

    /// Remove an edge; always succeeds
    pub fn remove_edge(&mut self, from: &TaskId, to: &TaskId) {
        if let Some(targets) = self.edges.get_mut(from) {
            targets.remove(to);
            if targets.is_empty() {
                self.edges.remove(from);
            }
        }
        if let Some(sources) = self.reverse.get_mut(to) {
            sources.remove(from);
            if sources.is_empty() {
                self.reverse.remove(to);
            }
        }
    }

    /// Drop every edge touching `id` (task removal)
    pub fn remove_task(&mut self, id: &TaskId) {
        if let Some(targets) = self.edges.remove(id) {
            for to in targets {
                if let Some(sources) = self.reverse.get_mut(&to) {
                    sources.remove(id);
                    if sources.is_empty() {
                        self.reverse.remove(&to);
                    }
                }
            }
        }
        if let Some(sources) = self.reverse.remove(id) {
            for from in sources {
                if let Some(targets) = self.edges.get_mut(&from) {
                    targets.remove(id);
                    if targets.is_empty() {
                        self.edges.remove(&from);
                    }
                }
            }
        }
    }

    /// Derive the blocking state of one task
    pub fn blocked_status(&self, id: &TaskId, statuses: &impl StatusSource) -> BlockedStatus {
        let mut unresolved: Vec<TaskId> = self
            .edges
            .get(id)
            .map(|targets| {
                targets
                    .iter()
                    .filter(|to| is_unresolved(to, statuses))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        unresolved.sort();

        BlockedStatus {
            blocked: !unresolved.is_empty(),
            unresolved_blockers: unresolved,
        }
    }

    /// Tasks that list `id` as a blocker, sorted
    pub fn dependents_of(&self, id: &TaskId) -> Vec<TaskId> {
        let mut dependents: Vec<TaskId> = self
            .reverse
            .get(id)
            .map(|sources| sources.iter().cloned().collect())
            .unwrap_or_default();
        dependents.sort();
        dependents
    }

    /// Blockers of `id`, resolved or not, sorted
    pub fn blockers_of(&self, id: &TaskId) -> Vec<TaskId> {
        let mut blockers: Vec<TaskId> = self
            .edges
            .get(id)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default();
        blockers.sort();
        blockers
    }

    /// Whether `target` is reachable from `start` over unresolved edges
    fn reaches(&self, start: &TaskId, target: &TaskId, statuses: &impl StatusSource) -> bool {
        let mut stack = vec![start.clone()];
        let mut visited = HashSet::new();

        while let Some(current) = stack.pop() {
            if &current == target {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(targets) = self.edges.get(&current) {
                for next in targets {
                    if is_unresolved(next, statuses) {
                        stack.push(next.clone());
                    }
                }
            }
        }
        false
    }

    /// Full-graph acyclicity check over unresolved edges, via DFS
    /// coloring. Used by invariant verification; `add_edge` keeps this
    /// true by construction.
    pub fn is_acyclic(&self, statuses: &impl StatusSource) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: HashMap<&TaskId, Color> = HashMap::new();
        for id in self.edges.keys() {
            if colors.get(id).copied().unwrap_or(Color::White) != Color::White {
                continue;
            }
            // Iterative DFS: (node, remaining children) frames
            let mut stack: Vec<(&TaskId, Vec<&TaskId>)> = Vec::new();
            colors.insert(id, Color::Gray);
            stack.push((id, self.unresolved_children(id, statuses)));

            loop {
                let next_child = match stack.last_mut() {
                    Some((_, children)) => children.pop(),
                    None => break,
                };
                match next_child {
                    Some(child) => match colors.get(child).copied().unwrap_or(Color::White) {
                        Color::Gray => return false,
                        Color::Black => {}
                        Color::White => {
                            colors.insert(child, Color::Gray);
                            let grandchildren = self.unresolved_children(child, statuses);
                            stack.push((child, grandchildren));
                        }
                    },
                    None => {
                        if let Some((node, _)) = stack.pop() {
                            colors.insert(node, Color::Black);
                        }
                    }
                }
            }
        }
        true
    }

    fn unresolved_children<'a>(
        &'a self,
        id: &TaskId,
        statuses: &impl StatusSource,
    ) -> Vec<&'a TaskId> {
        self.edges
            .get(id)
            .map(|targets| {
                targets
                    .iter()
                    .filter(|to| is_unresolved(to, statuses))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn is_unresolved(id: &TaskId, statuses: &impl StatusSource) -> bool {
    match statuses.status_of(id) {
        Some(status) => !status.is_terminal(),
        // A vanished blocker can no longer block anything
        None => false,
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
