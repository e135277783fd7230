use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use hide_helper_protocol::ScopeKey;
use hide_helper_protocol::config_types::VisibilityConfig;

/// Key-value persistence for per-scope visibility configs.
///
/// Implementations may be remote; a failed `set` leaves the caller's
/// in-memory value authoritative until a later write succeeds.
pub trait SettingsStore: Send + Sync {
    fn get(&self, scope: &ScopeKey) -> io::Result<Option<VisibilityConfig>>;
    fn set(&self, scope: &ScopeKey, config: VisibilityConfig) -> io::Result<()>;
}

/// Process-local store, used by hosts that persist elsewhere and by tests.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    configs: Mutex<BTreeMap<ScopeKey, VisibilityConfig>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail until cleared, to exercise the
    /// persistence-failure path.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `set` calls that succeeded.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> BTreeMap<ScopeKey, VisibilityConfig> {
        match self.configs.lock() {
            Ok(configs) => configs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, scope: &ScopeKey) -> io::Result<Option<VisibilityConfig>> {
        let configs = self
            .configs
            .lock()
            .map_err(|_| io::Error::other("settings store lock poisoned"))?;
        Ok(configs.get(scope).copied())
    }

    fn set(&self, scope: &ScopeKey, config: VisibilityConfig) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::other(format!(
                "settings store rejected write for {scope}"
            )));
        }
        let mut configs = self
            .configs
            .lock()
            .map_err(|_| io::Error::other("settings store lock poisoned"))?;
        configs.insert(scope.clone(), config);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
