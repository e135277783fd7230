use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

/// Selects which [`crate::config_types::VisibilityConfig`] is active.
///
/// This is process-wide state, independent of any single scope's config:
/// toggling it never rewrites either config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    /// One config per character or group.
    #[default]
    Entity,
    /// A single config shared by every conversation.
    Global,
}

impl ScopeMode {
    pub fn from_use_global_config(use_global_config: bool) -> Self {
        if use_global_config {
            Self::Global
        } else {
            Self::Entity
        }
    }
}

/// Owner of the active conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityRef {
    /// A one-on-one chat, identified by the character's avatar file name.
    Character { avatar: String },
    /// A group chat.
    Group { id: String },
}

impl EntityRef {
    pub fn scope_key(&self) -> ScopeKey {
        match self {
            Self::Character { avatar } => ScopeKey(format!("character/{avatar}")),
            Self::Group { id } => ScopeKey(format!("group/{id}")),
        }
    }
}

/// Stable identifier used as the settings-store key of one scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeKey(String);

impl ScopeKey {
    const GLOBAL: &'static str = "global";

    pub fn global() -> Self {
        Self(Self::GLOBAL.to_string())
    }

    /// Resolves the key of the active scope. `None` means entity mode without
    /// a resolvable entity, which callers treat as "no scope".
    pub fn resolve(mode: ScopeMode, entity: Option<&EntityRef>) -> Option<Self> {
        match mode {
            ScopeMode::Global => Some(Self::global()),
            ScopeMode::Entity => entity.map(EntityRef::scope_key),
        }
    }
}

impl Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ScopeKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ScopeKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let valid = value == Self::GLOBAL
            || value
                .strip_prefix("character/")
                .or_else(|| value.strip_prefix("group/"))
                .is_some_and(|rest| !rest.is_empty());
        if !valid {
            return Err(serde::de::Error::custom(format!(
                "invalid scope key: {value}"
            )));
        }
        Ok(Self(value))
    }
}
