//! Virtualized render window: keeps only the most recent `limit` messages
//! materialized in the render layer.
//!
//! The window works on log indices alone. It never looks at hidden flags;
//! callers learn which nodes were materialized through [`WindowChange`] and
//! sync whatever per-node state they need.

mod settle;

use std::collections::VecDeque;

use tracing::debug;

use crate::render::RenderLayer;

pub use settle::SettleCycle;
pub use settle::SettleReport;

/// Nodes added to and removed from the render layer by one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowChange {
    pub materialized: Vec<usize>,
    pub evicted: Vec<usize>,
}

/// Result of a from-scratch rebuild.
#[derive(Debug)]
pub struct WindowRebuild {
    pub materialized: Vec<usize>,
    pub settle: SettleCycle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWindowLimiter {
    limit: usize,
    /// Materialized log indices, oldest first. A contiguous suffix of the log
    /// when at rest.
    materialized: VecDeque<usize>,
}

impl RenderWindowLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            materialized: VecDeque::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Takes effect on the next operation. Call
    /// [`Self::apply_full_window`] to resize the current window right away.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
    }

    pub fn materialized(&self) -> Vec<usize> {
        self.materialized.iter().copied().collect()
    }

    /// Clears the render layer and materializes the last `limit` messages,
    /// keyed by their log index.
    pub fn apply_full_window<R>(&mut self, log_len: usize, render: &mut R) -> WindowRebuild
    where
        R: RenderLayer + ?Sized,
    {
        self.rebuild(log_len.saturating_sub(self.limit), log_len, render)
    }

    /// Materializes the complete log. Used once when the limiter is turned
    /// off, so the render layer no longer holds a partial list.
    pub fn rebuild_unlimited<R>(&mut self, log_len: usize, render: &mut R) -> WindowRebuild
    where
        R: RenderLayer + ?Sized,
    {
        self.rebuild(0, log_len, render)
    }

    /// Materializes the message(s) appended since the newest node and evicts
    /// the oldest nodes beyond `limit`.
    pub fn handle_append<R>(&mut self, log_len: usize, render: &mut R) -> WindowChange
    where
        R: RenderLayer + ?Sized,
    {
        let mut change = WindowChange::default();
        let first_new = self
            .materialized
            .back()
            .map_or(0, |newest| newest + 1)
            .max(log_len.saturating_sub(self.limit));
        for key in first_new..log_len {
            render.append(key);
            self.materialized.push_back(key);
            change.materialized.push(key);
        }
        while self.materialized.len() > self.limit {
            let Some(oldest) = self.materialized.pop_front() else {
                break;
            };
            render.remove(oldest);
            change.evicted.push(oldest);
        }
        change
    }

    /// Drops the node of the removed message, renumbers the rest, and
    /// back-fills one older message when the window fell under `limit`.
    ///
    /// `log_len` is the length after the removal.
    pub fn handle_deletion<R>(
        &mut self,
        removed_index: usize,
        log_len: usize,
        render: &mut R,
    ) -> WindowChange
    where
        R: RenderLayer + ?Sized,
    {
        let mut change = WindowChange::default();
        if let Some(position) = self
            .materialized
            .iter()
            .position(|key| *key == removed_index)
        {
            self.materialized.remove(position);
            render.remove(removed_index);
            change.evicted.push(removed_index);
        }

        render.renumber_after(removed_index);
        for key in &mut self.materialized {
            if *key > removed_index {
                *key -= 1;
            }
        }

        if self.materialized.len() < self.limit {
            match self.materialized.front().copied() {
                Some(oldest) if oldest > 0 => {
                    let key = oldest - 1;
                    render.insert_before(oldest, key);
                    self.materialized.push_front(key);
                    change.materialized.push(key);
                }
                None if log_len > 0 => {
                    let key = log_len - 1;
                    render.append(key);
                    self.materialized.push_back(key);
                    change.materialized.push(key);
                }
                _ => {}
            }
        }
        change
    }

    fn rebuild<R>(&mut self, first: usize, log_len: usize, render: &mut R) -> WindowRebuild
    where
        R: RenderLayer + ?Sized,
    {
        render.clear();
        self.materialized.clear();
        for key in first..log_len {
            render.append(key);
            self.materialized.push_back(key);
        }
        let settle = SettleCycle::new(render.take_pending_asset_loads());
        debug!(
            first,
            log_len,
            pending_assets = settle.pending(),
            "rebuilt render window"
        );
        WindowRebuild {
            materialized: self.materialized(),
            settle,
        }
    }
}
