mod atomic_write;
mod file_store;
mod migration;
mod resolver;
mod store;
mod types;

pub use file_store::FileSettingsStore;
pub use file_store::VISIBILITY_FILENAME;
pub use migration::LEGACY_MIGRATION_FILENAME;
pub use migration::LegacyHideSettings;
pub use migration::LegacyMigrationStatus;
pub use migration::LegacySnapshot;
pub use migration::maybe_migrate_legacy;
pub use resolver::ConfigResolver;
pub use resolver::ResolveError;
pub use resolver::ResolvedConfig;
pub use resolver::parse_keep_count;
pub use store::InMemorySettingsStore;
pub use store::SettingsStore;
pub use types::DEFAULT_FULL_CHECK_DEBOUNCE;
pub use types::DEFAULT_RENDER_WINDOW_LIMIT;
pub use types::DEFAULT_WRITE_BACK_DEBOUNCE;
pub use types::FullCheckToml;
pub use types::HideHelperSettings;
pub use types::HideHelperToml;
pub use types::RenderWindowSettings;
pub use types::RenderWindowToml;
pub use types::SETTINGS_FILENAME;
pub use types::WriteBackToml;
