//! Errors raised while building a locomotion controller.

use thiserror::Error;

/// Errors that prevent a controller from being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("invalid tunable `{name}`: {reason}")]
    InvalidTunable { name: &'static str, reason: String },
}
