/// Core error types for the Kinema engine.

/// A specialized Result type for Kinema operations.
pub type KinemaResult<T> = Result<T, KinemaError>;

/// Top-level error type encompassing all Kinema subsystems.
///
/// Routine store operations never return this: a missing id is a silent
/// no-op. Errors are reserved for bootstrap problems, backend failures and
/// misuse of the extension points.
#[derive(Debug, thiserror::Error)]
pub enum KinemaError {
    #[error("engine not initialized: {0}")]
    NotInitialized(String),

    #[error("renderer backend error: {0}")]
    Backend(String),

    #[error("unknown component type: {0}")]
    UnknownComponentType(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl KinemaError {
    /// Create an initialization-order error naming what was accessed too early.
    pub fn not_initialized(what: impl Into<String>) -> Self {
        KinemaError::NotInitialized(what.into())
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        KinemaError::Backend(message.into())
    }
}

impl From<toml::de::Error> for KinemaError {
    fn from(err: toml::de::Error) -> Self {
        KinemaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for KinemaError {
    fn from(err: toml::ser::Error) -> Self {
        KinemaError::Config(err.to_string())
    }
}
