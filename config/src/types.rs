//! Process-wide settings stored in `hide-helper.toml`.

// Note this file should generally be restricted to simple struct/enum
// definitions and their load/save plumbing.

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use hide_helper_protocol::ScopeMode;
use serde::Deserialize;
use serde::Serialize;

use crate::atomic_write::write_file_atomically;

/// Filename of the process-wide settings inside the home directory.
pub const SETTINGS_FILENAME: &str = "hide-helper.toml";

pub const DEFAULT_RENDER_WINDOW_LIMIT: usize = 20;
pub const DEFAULT_FULL_CHECK_DEBOUNCE: Duration = Duration::from_millis(250);
pub const DEFAULT_WRITE_BACK_DEBOUNCE: Duration = Duration::from_secs(1);

/// On-disk shape of [`HideHelperSettings`]. Every field is optional so a
/// partially written file still loads.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HideHelperToml {
    /// Master switch. When `false` no reconciliation runs, but nothing that
    /// is already hidden gets unhidden.
    pub enabled: Option<bool>,

    /// Share one keep-count across every conversation instead of keeping one
    /// per character or group.
    pub use_global_config: Option<bool>,

    #[serde(default)]
    pub render_window: RenderWindowToml,

    #[serde(default)]
    pub full_check: FullCheckToml,

    #[serde(default)]
    pub write_back: WriteBackToml,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderWindowToml {
    pub enabled: Option<bool>,
    /// Maximum number of messages materialized in the on-screen list.
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FullCheckToml {
    /// Delay used to coalesce bursts of log mutations into one full check.
    pub debounce_ms: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBackToml {
    /// Quiet period before reconciled log lengths are written to the
    /// settings store.
    pub flush_debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderWindowSettings {
    pub enabled: bool,
    pub limit: usize,
}

impl Default for RenderWindowSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: DEFAULT_RENDER_WINDOW_LIMIT,
        }
    }
}

/// Resolved process-wide settings, threaded explicitly into every call that
/// needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideHelperSettings {
    pub enabled: bool,
    pub scope_mode: ScopeMode,
    pub render_window: RenderWindowSettings,
    pub full_check_debounce: Duration,
    pub write_back_debounce: Duration,
}

impl Default for HideHelperSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            scope_mode: ScopeMode::Entity,
            render_window: RenderWindowSettings::default(),
            full_check_debounce: DEFAULT_FULL_CHECK_DEBOUNCE,
            write_back_debounce: DEFAULT_WRITE_BACK_DEBOUNCE,
        }
    }
}

impl From<HideHelperToml> for HideHelperSettings {
    fn from(toml: HideHelperToml) -> Self {
        let defaults = Self::default();
        Self {
            enabled: toml.enabled.unwrap_or(defaults.enabled),
            scope_mode: toml
                .use_global_config
                .map_or(defaults.scope_mode, ScopeMode::from_use_global_config),
            render_window: RenderWindowSettings {
                enabled: toml
                    .render_window
                    .enabled
                    .unwrap_or(defaults.render_window.enabled),
                // A zero-sized window would render nothing at all.
                limit: toml
                    .render_window
                    .limit
                    .unwrap_or(defaults.render_window.limit)
                    .max(1),
            },
            full_check_debounce: toml
                .full_check
                .debounce_ms
                .map_or(defaults.full_check_debounce, Duration::from_millis),
            write_back_debounce: toml
                .write_back
                .flush_debounce_ms
                .map_or(defaults.write_back_debounce, Duration::from_millis),
        }
    }
}

impl From<HideHelperSettings> for HideHelperToml {
    fn from(settings: HideHelperSettings) -> Self {
        Self {
            enabled: Some(settings.enabled),
            use_global_config: Some(settings.scope_mode == ScopeMode::Global),
            render_window: RenderWindowToml {
                enabled: Some(settings.render_window.enabled),
                limit: Some(settings.render_window.limit),
            },
            full_check: FullCheckToml {
                debounce_ms: Some(duration_millis(settings.full_check_debounce)),
            },
            write_back: WriteBackToml {
                flush_debounce_ms: Some(duration_millis(settings.write_back_debounce)),
            },
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl HideHelperSettings {
    pub fn path(home: &Path) -> PathBuf {
        home.join(SETTINGS_FILENAME)
    }

    /// Loads the settings file, falling back to defaults when it does not
    /// exist yet.
    pub fn load(home: &Path) -> io::Result<Self> {
        let path = Self::path(home);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err),
        };
        let toml: HideHelperToml = toml::from_str(&contents).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to parse {}: {err}", path.display()),
            )
        })?;
        Ok(toml.into())
    }

    pub fn save(&self, home: &Path) -> io::Result<()> {
        let toml = HideHelperToml::from(*self);
        let contents = toml::to_string(&toml)
            .map_err(|err| io::Error::other(format!("failed to serialize settings: {err}")))?;
        write_file_atomically(&Self::path(home), contents.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_loads_defaults() -> io::Result<()> {
        let home = tempfile::tempdir()?;
        assert_eq!(
            HideHelperSettings::load(home.path())?,
            HideHelperSettings::default()
        );
        Ok(())
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() -> io::Result<()> {
        let home = tempfile::tempdir()?;
        std::fs::write(
            HideHelperSettings::path(home.path()),
            "use_global_config = true\n[render_window]\nlimit = 0\n",
        )?;

        let settings = HideHelperSettings::load(home.path())?;
        assert_eq!(
            settings,
            HideHelperSettings {
                enabled: true,
                scope_mode: ScopeMode::Global,
                render_window: RenderWindowSettings {
                    enabled: false,
                    limit: 1,
                },
                full_check_debounce: DEFAULT_FULL_CHECK_DEBOUNCE,
                write_back_debounce: DEFAULT_WRITE_BACK_DEBOUNCE,
            }
        );
        Ok(())
    }

    #[test]
    fn saved_settings_load_back() -> io::Result<()> {
        let home = tempfile::tempdir()?;
        let settings = HideHelperSettings {
            enabled: false,
            scope_mode: ScopeMode::Global,
            render_window: RenderWindowSettings {
                enabled: true,
                limit: 40,
            },
            full_check_debounce: Duration::from_millis(100),
            write_back_debounce: Duration::from_millis(2500),
        };
        settings.save(home.path())?;
        assert_eq!(HideHelperSettings::load(home.path())?, settings);
        Ok(())
    }

    #[test]
    fn malformed_file_is_invalid_data() -> io::Result<()> {
        let home = tempfile::tempdir()?;
        std::fs::write(HideHelperSettings::path(home.path()), "enabled = \"yes\"")?;
        let err = HideHelperSettings::load(home.path()).expect_err("must reject bad types");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        Ok(())
    }
}
