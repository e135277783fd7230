use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use hide_helper_protocol::ScopeKey;
use hide_helper_protocol::config_types::VisibilityConfig;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::atomic_write::write_file_atomically;
use crate::store::SettingsStore;

const VISIBILITY_FILE_VERSION: u8 = 1;
pub const VISIBILITY_FILENAME: &str = "visibility.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
struct VisibilityFile {
    version: u8,
    scopes: BTreeMap<ScopeKey, VisibilityConfig>,
}

impl VisibilityFile {
    fn new_empty() -> Self {
        Self {
            version: VISIBILITY_FILE_VERSION,
            scopes: BTreeMap::new(),
        }
    }
}

/// Stores every scope's config in one versioned JSON file under the home
/// directory. Each write rewrites the file atomically.
#[derive(Debug)]
pub struct FileSettingsStore {
    home: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.home.join(VISIBILITY_FILENAME)
    }

    fn load_file(&self) -> io::Result<VisibilityFile> {
        let path = self.path();
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(VisibilityFile::new_empty());
            }
            Err(err) => return Err(err),
        };
        let mut parsed: VisibilityFile = serde_json::from_slice(&contents).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize {}: {err}", path.display()),
            )
        })?;
        if parsed.version == 0 {
            parsed.version = VISIBILITY_FILE_VERSION;
        }
        if parsed.version > VISIBILITY_FILE_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "visibility file version {} is newer than supported version {}",
                    parsed.version, VISIBILITY_FILE_VERSION
                ),
            ));
        }
        Ok(parsed)
    }

    fn save_file(&self, file: &VisibilityFile) -> io::Result<()> {
        let contents = serde_json::to_vec_pretty(file)
            .map_err(|err| io::Error::other(format!("failed to serialize visibility file: {err}")))?;
        write_file_atomically(&self.path(), &contents)
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, scope: &ScopeKey) -> io::Result<Option<VisibilityConfig>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| io::Error::other("visibility file lock poisoned"))?;
        Ok(self.load_file()?.scopes.get(scope).copied())
    }

    fn set(&self, scope: &ScopeKey, config: VisibilityConfig) -> io::Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| io::Error::other("visibility file lock poisoned"))?;
        let mut file = self.load_file()?;
        if file.scopes.get(scope) == Some(&config) {
            return Ok(());
        }
        file.scopes.insert(scope.clone(), config);
        self.save_file(&file)?;
        debug!(%scope, path = %self.path().display(), "persisted visibility config");
        Ok(())
    }
}
