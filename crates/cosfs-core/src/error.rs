use thiserror::Error;

/// Boxed source error carried by [`CosfsError::Io`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CosfsError {
    // IO
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Illegal state: {0}")]
    IllegalState(String),

    // Config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}, run `cosfs init` first")]
    ConfigNotFound(String),

    #[error("TOML deserialization error: {0}")]
    TomlDe(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    // Storage
    #[error("Storage not found: {0}")]
    StorageNotFound(String),

    #[error("Invalid file reference: {0}")]
    InvalidFileRef(String),
}

impl CosfsError {
    /// I/O error wrapping an underlying cause.
    pub fn io(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// I/O error with no underlying cause.
    pub fn io_msg(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState(_))
    }
}

impl From<std::io::Error> for CosfsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

pub type Result<T> = std::result::Result<T, CosfsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn io_keeps_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = CosfsError::io("Could not save file a.txt.", cause);
        assert!(err.is_io());
        assert_eq!(err.to_string(), "IO error: Could not save file a.txt.");
        assert_eq!(err.source().unwrap().to_string(), "pipe closed");
    }

    #[test]
    fn anyhow_converts_into_source() {
        let err = CosfsError::io("upload failed", anyhow::anyhow!("connection reset"));
        assert_eq!(err.source().unwrap().to_string(), "connection reset");
    }

    #[test]
    fn std_io_error_maps_to_io_kind() {
        let err: CosfsError = std::io::Error::other("disk full").into();
        assert!(err.is_io());
        assert!(!err.is_illegal_state());
    }
}
