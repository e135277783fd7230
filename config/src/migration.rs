//! One-time import of keep-count settings written by the legacy per-entity
//! format into the scoped settings store.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use hide_helper_protocol::EntityRef;
use hide_helper_protocol::config_types::VisibilityConfig;
use serde::Deserialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::store::SettingsStore;

pub const LEGACY_MIGRATION_FILENAME: &str = ".legacy_visibility_migration";

/// Keep-count fields as the legacy format stored them on each character or
/// group record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyHideSettings {
    #[serde(default)]
    pub hide_last_n: i64,
    #[serde(default)]
    pub user_configured: bool,
    #[serde(default)]
    pub last_processed_length: usize,
}

impl From<&LegacyHideSettings> for VisibilityConfig {
    fn from(legacy: &LegacyHideSettings) -> Self {
        Self {
            keep_count: usize::try_from(legacy.hide_last_n.max(0)).unwrap_or(usize::MAX),
            configured: legacy.user_configured,
            last_known_length: legacy.last_processed_length,
        }
    }
}

/// Snapshot of every legacy record, keyed by character avatar and group id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LegacySnapshot {
    #[serde(default)]
    pub characters: BTreeMap<String, LegacyHideSettings>,
    #[serde(default)]
    pub groups: BTreeMap<String, LegacyHideSettings>,
}

impl LegacySnapshot {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.groups.is_empty()
    }

    fn entries(&self) -> impl Iterator<Item = (EntityRef, &LegacyHideSettings)> {
        let characters = self.characters.iter().map(|(avatar, settings)| {
            (
                EntityRef::Character {
                    avatar: avatar.clone(),
                },
                settings,
            )
        });
        let groups = self
            .groups
            .iter()
            .map(|(id, settings)| (EntityRef::Group { id: id.clone() }, settings));
        characters.chain(groups)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyMigrationStatus {
    SkippedMarker,
    SkippedNoLegacyData,
    Applied { migrated: usize },
}

/// Copies legacy records into `store` unless the migration already ran.
///
/// Scopes that already exist in the store are left alone, so running against
/// a partially migrated store is safe. The marker is written only after every
/// record was copied; a failed run is retried on the next startup.
pub async fn maybe_migrate_legacy(
    home: &Path,
    legacy: &LegacySnapshot,
    store: &dyn SettingsStore,
) -> io::Result<LegacyMigrationStatus> {
    let marker_path = home.join(LEGACY_MIGRATION_FILENAME);
    if tokio::fs::try_exists(&marker_path).await? {
        return Ok(LegacyMigrationStatus::SkippedMarker);
    }

    if legacy.is_empty() {
        create_marker(&marker_path).await?;
        return Ok(LegacyMigrationStatus::SkippedNoLegacyData);
    }

    let mut migrated = 0;
    for (entity, settings) in legacy.entries() {
        let scope = entity.scope_key();
        if store.get(&scope)?.is_some() {
            continue;
        }
        store.set(&scope, VisibilityConfig::from(settings))?;
        migrated += 1;
    }

    create_marker(&marker_path).await?;
    info!(migrated, "migrated legacy visibility settings");
    Ok(LegacyMigrationStatus::Applied { migrated })
}

async fn create_marker(marker_path: &Path) -> io::Result<()> {
    if let Some(parent) = marker_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    match OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(marker_path)
        .await
    {
        Ok(mut file) => file.write_all(b"v1\n").await,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(err),
    }
}
