use thiserror::Error;

/// Top-level error type for the bot.
///
/// Collaborator implementations (storage, messaging) report failures through
/// this type so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QabotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for QabotError {
    fn from(err: toml::de::Error) -> Self {
        QabotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for QabotError {
    fn from(err: toml::ser::Error) -> Self {
        QabotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QabotError {
    fn from(err: serde_json::Error) -> Self {
        QabotError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for bot operations.
pub type Result<T> = std::result::Result<T, QabotError>;
