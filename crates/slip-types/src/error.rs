use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlipError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "Solver failed ({status}) after {iterations} iterations on a {rows}x{cols} system, residual={residual:.6e}"
    )]
    Solver {
        status: String,
        iterations: usize,
        residual: f64,
        rows: usize,
        cols: usize,
    },

    #[error("Green's function kernel error: {0}")]
    Kernel(String),

    #[error("Inversion cancelled before the constrained solve")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SlipError {
    pub fn config(message: impl Into<String>) -> Self {
        SlipError::Configuration(message.into())
    }

    pub fn mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        SlipError::DimensionMismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}

pub type SlipResult<T> = Result<T, SlipError>;
