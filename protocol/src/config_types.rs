use serde::Deserialize;
use serde::Serialize;

/// Per-scope keep-count record.
///
/// A config is created zero-valued the first time a scope is touched and is
/// never deleted; "unhide all" resets it to `keep_count = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityConfig {
    /// Number of most recent messages left visible. `0` shows everything.
    #[serde(default)]
    pub keep_count: usize,

    /// `true` once the user explicitly saved a keep-count for this scope.
    /// Reconciliation never runs for a scope that has not been configured.
    #[serde(default)]
    pub configured: bool,

    /// Log length observed by the last reconciliation of this scope. Only the
    /// incremental path reads it, as the baseline of its delta window.
    #[serde(default)]
    pub last_known_length: usize,
}

impl VisibilityConfig {
    /// Keep-count to show in the settings UI, `None` when nothing is hidden by
    /// configuration.
    pub fn display_keep_count(&self) -> Option<usize> {
        (self.configured && self.keep_count > 0).then_some(self.keep_count)
    }
}
