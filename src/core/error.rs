// Error handling for the COMTRADE reader

use std::path::PathBuf;
use thiserror::Error;

use crate::core::constants::DataFormat;

pub type Result<T> = std::result::Result<T, ComtradeError>;

#[derive(Error, Debug)]
pub enum ComtradeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Structural error at line {line}: {message}")]
    Structural { line: usize, message: String },

    #[error("Missing source file: {0}")]
    MissingSource(PathBuf),

    #[error("Size mismatch: expected {expected} {unit}, got {actual}")]
    SizeMismatch {
        expected: usize,
        actual: usize,
        unit: &'static str,
    },

    #[error("Malformed row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    #[error("Not a comtrade file: {0}")]
    NotComtrade(PathBuf),

    #[error("Format mismatch: decoder expects {expected}, configuration declares {declared}")]
    FormatMismatch {
        expected: DataFormat,
        declared: DataFormat,
    },

    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Load failed: {0}")]
    LoadFailed(String),
}

impl ComtradeError {
    pub(crate) fn structural(line: usize, message: impl Into<String>) -> Self {
        ComtradeError::Structural {
            line,
            message: message.into(),
        }
    }

    /// True for failures a caller may reasonably retry with the other data format.
    pub fn is_layout_mismatch(&self) -> bool {
        matches!(
            self,
            ComtradeError::SizeMismatch { .. } | ComtradeError::MalformedRow { .. }
        )
    }
}
