use thiserror::Error;

/// Custom error types for the live-volsurf library
///
/// The first four variants are the request-fatal failures of the surface
/// pipeline. The rest only come from the ambient layers (configuration,
/// feed decoding, I/O) and never from the fitter or the analytics.
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Input unavailable: {0}")]
    InputUnavailableError(String),

    #[error("Insufficient data: {0}")]
    InsufficientDataError(String),

    #[error("No near-term data: observation set is empty")]
    NoNearTermDataError,

    #[error("Numeric instability: {0}")]
    NumericInstabilityError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl SurfaceError {
    /// Stable short label, so a presenter can render distinct messages per kind
    pub fn kind(&self) -> &'static str {
        match self {
            SurfaceError::InputUnavailableError(_) => "INPUT_UNAVAILABLE",
            SurfaceError::InsufficientDataError(_) => "INSUFFICIENT_DATA",
            SurfaceError::NoNearTermDataError => "NO_NEAR_TERM_DATA",
            SurfaceError::NumericInstabilityError(_) => "NUMERIC_INSTABILITY",
            SurfaceError::ConfigError(_) => "CONFIG",
            SurfaceError::ParseError(_) => "PARSE",
            SurfaceError::IoError(_) => "IO",
            SurfaceError::SerdeError(_) => "SERDE",
        }
    }

    /// True for the four failure kinds a surface request can end in
    pub fn is_core_failure(&self) -> bool {
        matches!(
            self,
            SurfaceError::InputUnavailableError(_)
                | SurfaceError::InsufficientDataError(_)
                | SurfaceError::NoNearTermDataError
                | SurfaceError::NumericInstabilityError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SurfaceError>;
