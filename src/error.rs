// src/error.rs
// Error types shared by the model, the integrator and the collaborators around them.
// Core variants are caller-input errors detected before any integration work; the rest wrap I/O and rendering.

use thiserror::Error;

/// Errors surfaced by model construction, integration, plotting and persistence.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid parameter: {what}")]
    InvalidParameter { what: &'static str },

    #[error("invalid argument: {what}")]
    InvalidArgument { what: &'static str },

    #[error("unsupported integration method '{method}' (only 'rk4' is implemented)")]
    UnsupportedMethod { method: String },

    #[error("plot rendering failed: {message}")]
    Plot { message: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            SimError::InvalidParameter { .. }
                | SimError::InvalidArgument { .. }
                | SimError::UnsupportedMethod { .. }
        )
    }
}

pub type SimResult<T> = Result<T, SimError>;
