use thiserror::Error;

/// Errors that abort a whole search.
///
/// Per-feature geometry problems never show up here, the candidate processor
/// drops the offending feature and carries on with the batch.
#[derive(Error, Debug)]
pub enum CpError {
    #[error("Could not resolve location '{input}': {reason}")]
    Resolution { input: String, reason: String },

    #[error("Invalid search budget: {0}")]
    InvalidBudget(String),

    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("{service} request failed: {reason}")]
    UpstreamService {
        service: &'static str,
        reason: String,
    },

    #[error("Invalid candidate export: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CpError {
    pub fn upstream(service: &'static str, reason: impl ToString) -> Self {
        CpError::UpstreamService {
            service,
            reason: reason.to_string(),
        }
    }

    /// True for errors caused by what the user typed rather than by a service.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            CpError::Resolution { .. } | CpError::InvalidBudget(_) | CpError::InvalidRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CpError>;
