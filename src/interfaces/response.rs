use crate::domain::errors::StatsError;
use crate::interfaces::command::CommandError;
use serde::Serialize;

/// Error body written by every boundary command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub status: u16,
    pub message: String,
}

impl From<&StatsError> for ErrorResponse {
    fn from(err: &StatsError) -> Self {
        Self {
            code: err.code().to_string(),
            status: status_for(err),
            message: err.to_string(),
        }
    }
}

impl From<&CommandError> for ErrorResponse {
    fn from(err: &CommandError) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            status: 400,
            message: err.to_string(),
        }
    }
}

impl ErrorResponse {
    pub fn exit_code(&self) -> i32 {
        exit_code_for(self.status)
    }
}

/// HTTP-style status class for an error.
pub fn status_for(err: &StatsError) -> u16 {
    match err {
        StatsError::RateLimited { .. } => 429,
        e if e.is_bad_request() => 400,
        _ => 500,
    }
}

/// Process exit code for a status class. 1 is left for startup failures.
pub fn exit_code_for(status: u16) -> i32 {
    match status {
        400 => 2,
        429 => 3,
        _ => 4,
    }
}
