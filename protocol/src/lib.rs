pub mod config_types;
pub mod event;
pub mod message;
mod scope;
pub use scope::EntityRef;
pub use scope::ScopeKey;
pub use scope::ScopeMode;
