use std::path::PathBuf;

/// Every way an inspection can fail. None of them is recoverable; the caller
/// reports the error and stops.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("failed to read model file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model {}: {reason}", .path.display())]
    MalformedModel { path: PathBuf, reason: String },

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("inference engine error")]
    Engine(#[source] anyhow::Error),
}

impl InspectError {
    pub(crate) fn violation(reason: impl Into<String>) -> Self {
        Self::SchemaViolation(reason.into())
    }
}
