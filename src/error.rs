use thiserror::Error;

#[derive(Error, Debug)]
pub enum CtError {
    #[error("Malformed data: {0}")]
    Format(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Blinding failed: {0}")]
    Blinding(String),

    #[error("Unblinding failed: {0}")]
    Unblind(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Invalid resource state: {0}")]
    ResourceState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CtError {
    /// Stable numeric code for the error kind.
    pub fn code(&self) -> i32 {
        match self {
            CtError::IllegalArgument(_) => 1,
            CtError::ResourceState(_) => 2,
            CtError::Format(_) => 3,
            CtError::Config(_) => 4,
            CtError::Signature(_) => 7,
            CtError::Blinding(_) => 8,
            CtError::Unblind(_) => 9,
        }
    }
}

impl From<hex::FromHexError> for CtError {
    fn from(e: hex::FromHexError) -> Self {
        CtError::Format(format!("invalid hex: {}", e))
    }
}

impl From<std::io::Error> for CtError {
    fn from(e: std::io::Error) -> Self {
        CtError::Format(format!("unexpected end of data: {}", e))
    }
}

impl From<serde_json::Error> for CtError {
    fn from(e: serde_json::Error) -> Self {
        CtError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CtError>;
