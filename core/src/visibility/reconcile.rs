use hide_helper_protocol::config_types::VisibilityConfig;

use crate::log::MessageLog;

/// First index that stays visible. `keep_count == 0` shows everything.
pub fn visible_start(log_len: usize, keep_count: usize) -> usize {
    if keep_count == 0 {
        0
    } else {
        log_len.saturating_sub(keep_count)
    }
}

/// Indices whose hidden flag flipped, in log order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityDelta {
    pub to_hide: Vec<usize>,
    pub to_show: Vec<usize>,
}

impl VisibilityDelta {
    pub fn is_empty(&self) -> bool {
        self.to_hide.is_empty() && self.to_show.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_hide.len() + self.to_show.len()
    }

    /// `(index, hidden)` pairs the render layer should mirror as markers.
    pub fn marker_updates(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        let hide = self.to_hide.iter().map(|index| (*index, true));
        let show = self.to_show.iter().map(|index| (*index, false));
        hide.chain(show)
    }
}

/// Why the incremental path declined to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// `keep_count == 0`: messages may need to be shown, which only a full
    /// pass handles.
    ShowAll,
    /// The log did not grow past the recorded length, so the delta cannot be
    /// trusted.
    LogDidNotGrow,
    /// The visible window did not move forward.
    WindowDidNotAdvance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncrementalOutcome {
    Applied(VisibilityDelta),
    NeedsFullReconcile(FallbackReason),
}

/// Brings every hidden flag in line with `config`. O(log length).
///
/// Empty slots are skipped. A second call with an unchanged log returns an
/// empty delta.
pub fn full_reconcile<L>(log: &mut L, config: VisibilityConfig) -> VisibilityDelta
where
    L: MessageLog + ?Sized,
{
    let mut delta = VisibilityDelta::default();
    if !config.configured {
        return delta;
    }

    let log_len = log.len();
    let start = visible_start(log_len, config.keep_count);
    for index in 0..log_len {
        let Some(hidden) = log.is_hidden(index) else {
            continue;
        };
        let should_hide = index < start;
        if hidden == should_hide || !log.set_hidden(index, should_hide) {
            continue;
        }
        if should_hide {
            delta.to_hide.push(index);
        } else {
            delta.to_show.push(index);
        }
    }
    delta
}

/// Hides the messages that slid out of the window since
/// `config.last_known_length`. O(delta).
///
/// Only valid after append-only growth; every other situation is reported
/// as [`IncrementalOutcome::NeedsFullReconcile`] without touching the log.
pub fn incremental_reconcile<L>(log: &mut L, config: VisibilityConfig) -> IncrementalOutcome
where
    L: MessageLog + ?Sized,
{
    if !config.configured {
        return IncrementalOutcome::Applied(VisibilityDelta::default());
    }
    if config.keep_count == 0 {
        return IncrementalOutcome::NeedsFullReconcile(FallbackReason::ShowAll);
    }

    let log_len = log.len();
    if log_len <= config.last_known_length {
        return IncrementalOutcome::NeedsFullReconcile(FallbackReason::LogDidNotGrow);
    }

    let previous_start = visible_start(config.last_known_length, config.keep_count);
    let target_start = visible_start(log_len, config.keep_count);
    if target_start <= previous_start {
        return IncrementalOutcome::NeedsFullReconcile(FallbackReason::WindowDidNotAdvance);
    }

    let mut delta = VisibilityDelta::default();
    for index in previous_start..target_start {
        if log.is_hidden(index) == Some(false) && log.set_hidden(index, true) {
            delta.to_hide.push(index);
        }
    }
    IncrementalOutcome::Applied(delta)
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
