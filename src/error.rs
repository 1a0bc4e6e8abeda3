//! Error types.
//!
//! - `DashError` is the library-level taxonomy (load failures, bad selections,
//!   inference failures). Front ends decide whether a variant is fatal.
//! - `AppError` is the process-boundary type: a message plus the exit code the
//!   `evdash` binary returns.

use std::path::PathBuf;

use thiserror::Error;

/// A user selection that cannot be served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no county selected")]
    MissingCounty,
    #[error("unknown county '{0}'")]
    UnknownCounty(String),
    #[error("horizon must be a whole number of months, got '{0}'")]
    HorizonNotANumber(String),
    #[error("horizon must be between 1 and {max} months, got {horizon}")]
    HorizonOutOfRange { horizon: i64, max: u32 },
}

#[derive(Debug, Clone, Error)]
pub enum DashError {
    #[error("{what} not found: {}", path.display())]
    MissingFile { what: &'static str, path: PathBuf },

    #[error("malformed dataset '{}'{}: {message}", path.display(), fmt_line(*line))]
    MalformedData {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("incompatible model artifact '{}': {message}", path.display())]
    IncompatibleModel { path: PathBuf, message: String },

    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] SelectionError),

    #[error("forecast failed: {0}")]
    Inference(String),
}

impl DashError {
    pub fn malformed(path: impl Into<PathBuf>, line: Option<usize>, message: impl Into<String>) -> Self {
        Self::MalformedData {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn incompatible_model(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IncompatibleModel {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Recoverable errors are shown inline; the rest halt startup.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidSelection(_) | Self::Inference(_))
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::MissingFile { .. } | Self::InvalidSelection(_) => 2,
            Self::MalformedData { .. } | Self::IncompatibleModel { .. } => 3,
            Self::Inference(_) => 4,
        }
    }
}

fn fmt_line(line: Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<DashError> for AppError {
    fn from(err: DashError) -> Self {
        Self::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
