//! Error types
//!
//! Failures surface from injection, settings, loop control and frame export.
//! The tick loop itself never returns an error.

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced by the simulation core.
///
/// Nothing raised inside the tick loop is fatal: worker faults and overruns are
/// counted and logged instead of being returned.
#[derive(Debug, Error)]
pub enum SimError {
    /// Injection parameters or settings outside their valid range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// `start()` was called while the tick loop was already running.
    #[error("simulation loop is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("settings parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame export failed: {0}")]
    Image(#[from] image::ImageError),
}

impl SimError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SimError::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = SimError::invalid("x must be between 0 and 1280");
        let msg = e.to_string();
        assert!(msg.contains("invalid input"));
        assert!(msg.contains("1280"));
    }

    #[test]
    fn json_errors_convert() {
        let err: SimError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, SimError::Json(_)));
    }
}
