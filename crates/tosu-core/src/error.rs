use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Pattern not found: {0}")]
    PatternNotFound(String),

    #[error("Address resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("{capability} is not implemented for {client}")]
    NotImplemented {
        client: &'static str,
        capability: &'static str,
    },

    #[error("Unknown state domain: {0}")]
    UnknownDomain(String),

    #[error("Instance destroyed")]
    InstanceDestroyed,

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("Difficulty calculator error: {0}")]
    Calculator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Calculator(format!("{:#}", e))
    }
}
