//! Root of the `hide-helper-core` library.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the tracing stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod debounce;
pub mod error;
mod hide_helper;
pub mod identity;
pub mod log;
pub mod render;
pub mod render_window;
pub mod visibility;

pub use debounce::DebouncedRequester;
pub use error::HideHelperErr;
pub use hide_helper::HideHelper;
pub use hide_helper::HostContext;
pub use hide_helper::SaveOutcome;
