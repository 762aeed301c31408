use thiserror::Error;

#[derive(Error, Debug)]
pub enum KanbanError {
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KanbanError {
    /// True for failures that happened talking to (or before talking to) the
    /// remote task service.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured(_) | Self::Auth(_) | Self::Http { .. } | Self::Network(_)
        )
    }

    /// True when the user has to fix their settings before retrying.
    pub fn needs_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured(_) | Self::Auth(_))
    }
}
