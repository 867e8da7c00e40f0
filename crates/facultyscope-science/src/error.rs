use facultyscope_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    /// Non-2xx answer from the external system.
    #[error("API error from {url}: HTTP {status}: {reason}")]
    Api {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ScienceError {
    /// The external lookup failed; the caller may fall through or stop early.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Http(_) | Self::Parse(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScienceError>;
