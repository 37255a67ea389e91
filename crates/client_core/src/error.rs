use shared::error::ErrorCode;
use thiserror::Error;

/// Failure of a single remote call, classified by HTTP status.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("unauthorised")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("invalid response payload: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Validation,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::Forbidden => ErrorCode::Forbidden,
            Self::NotFound => ErrorCode::NotFound,
            Self::Transport(_) | Self::Server { .. } | Self::Decode(_) => ErrorCode::Internal,
        }
    }

    /// Short stable name used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Validation(_) => "validation",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Server { .. } => "server",
            Self::Decode(_) => "decode",
        }
    }
}

/// Rejection of local input before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unrecognised activity date '{0}'")]
    InvalidDate(String),
}
