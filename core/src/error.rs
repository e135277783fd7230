use hide_helper_config::ResolveError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HideHelperErr>;

#[derive(Debug, Error)]
pub enum HideHelperErr {
    /// Entity mode is active but no character or group is selected.
    #[error("select a character or group before changing its hide settings")]
    UnresolvableScope,

    /// A host collaborator (the log or the render layer) is not available
    /// yet, typically because the call happened before the UI mounted.
    #[error("{0} is not available yet")]
    MissingCollaborator(&'static str),

    /// The settings store rejected a write. The in-memory value is already
    /// updated and is retried on the next write.
    #[error(transparent)]
    Persistence(ResolveError),
}

impl From<ResolveError> for HideHelperErr {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnresolvableScope => Self::UnresolvableScope,
            err @ ResolveError::Persistence { .. } => Self::Persistence(err),
        }
    }
}
