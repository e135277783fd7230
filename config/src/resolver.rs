use std::collections::BTreeSet;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use hide_helper_protocol::EntityRef;
use hide_helper_protocol::ScopeKey;
use hide_helper_protocol::ScopeMode;
use hide_helper_protocol::config_types::VisibilityConfig;
use thiserror::Error;
use tracing::warn;

use crate::store::SettingsStore;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no character or group is selected; cannot resolve a per-entity scope")]
    UnresolvableScope,

    #[error("failed to persist visibility config for {scope}")]
    Persistence {
        scope: ScopeKey,
        #[source]
        source: io::Error,
    },
}

/// The active scope together with its current config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub scope: ScopeKey,
    pub config: VisibilityConfig,
}

/// Maps a raw keep-count entry to a value: anything that is not a
/// non-negative integer means "show everything".
pub fn parse_keep_count(raw: &str) -> usize {
    raw.trim().parse::<i64>().map_or(0, |value| {
        usize::try_from(value.max(0)).unwrap_or(usize::MAX)
    })
}

/// Resolves, caches and writes back per-scope [`VisibilityConfig`]s.
///
/// The in-memory copy is authoritative. Explicit saves are written through
/// right away. Recorded lengths and writes the store rejected stay queued
/// until the next save or [`ConfigResolver::flush`].
pub struct ConfigResolver {
    store: Arc<dyn SettingsStore>,
    cache: HashMap<ScopeKey, VisibilityConfig>,
    dirty: BTreeSet<ScopeKey>,
}

impl ConfigResolver {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            cache: HashMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    /// Returns the config of the active scope, zero-valued when the scope was
    /// never touched. `None` means entity mode without a resolvable entity.
    pub fn resolve(
        &mut self,
        scope_mode: ScopeMode,
        entity: Option<&EntityRef>,
    ) -> Option<ResolvedConfig> {
        let scope = ScopeKey::resolve(scope_mode, entity)?;
        let config = self.load(&scope);
        Some(ResolvedConfig { scope, config })
    }

    /// Records an explicit keep-count for the active scope and persists it.
    ///
    /// The new value is visible through [`Self::resolve`] even when
    /// persisting fails.
    pub fn save(
        &mut self,
        scope_mode: ScopeMode,
        entity: Option<&EntityRef>,
        keep_count: usize,
        current_log_length: usize,
    ) -> Result<ResolvedConfig, ResolveError> {
        let scope =
            ScopeKey::resolve(scope_mode, entity).ok_or(ResolveError::UnresolvableScope)?;
        let config = VisibilityConfig {
            keep_count,
            configured: true,
            last_known_length: current_log_length,
        };
        self.write(scope.clone(), config)?;
        Ok(ResolvedConfig { scope, config })
    }

    /// Moves the incremental baseline of `scope` to `log_length` in memory
    /// and queues it for the next [`Self::flush`]. Returns whether the value
    /// changed.
    pub fn record_length(&mut self, scope: &ScopeKey, log_length: usize) -> bool {
        let mut config = self.load(scope);
        if config.last_known_length == log_length {
            return false;
        }
        config.last_known_length = log_length;
        self.cache.insert(scope.clone(), config);
        self.dirty.insert(scope.clone());
        true
    }

    /// Writes every queued config: recorded lengths and writes the store
    /// rejected earlier.
    pub fn flush(&mut self) -> Result<(), ResolveError> {
        while let Some(scope) = self.dirty.first().cloned() {
            let Some(config) = self.cache.get(&scope).copied() else {
                self.dirty.remove(&scope);
                continue;
            };
            self.store
                .set(&scope, config)
                .map_err(|source| ResolveError::Persistence {
                    scope: scope.clone(),
                    source,
                })?;
            self.dirty.remove(&scope);
        }
        Ok(())
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Forgets cached configs that are already durable, so the next
    /// `resolve` reads them back from the store.
    pub fn invalidate(&mut self) {
        let dirty = &self.dirty;
        self.cache.retain(|scope, _| dirty.contains(scope));
    }

    fn load(&mut self, scope: &ScopeKey) -> VisibilityConfig {
        if let Some(config) = self.cache.get(scope) {
            return *config;
        }
        let config = match self.store.get(scope) {
            Ok(config) => config.unwrap_or_default(),
            Err(err) => {
                warn!(%scope, error = %err, "failed to read visibility config; using defaults");
                VisibilityConfig::default()
            }
        };
        self.cache.insert(scope.clone(), config);
        config
    }

    fn write(&mut self, scope: ScopeKey, config: VisibilityConfig) -> Result<(), ResolveError> {
        self.cache.insert(scope.clone(), config);
        self.dirty.insert(scope);
        self.flush()
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
