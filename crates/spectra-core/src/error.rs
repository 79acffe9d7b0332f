//! Error types for spectra-core.

use thiserror::Error;

/// Error type for spectra-core operations.
///
/// Every variant is a caller contract violation reported synchronously.
/// Silent or degenerate signals are never errors; they resolve to sentinel
/// values (see [`crate::math::METER_FLOOR_DB`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// All variants belong to the invalid-input family; there are no
    /// retryable conditions in this crate.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::LengthMismatch { .. } | Error::InvalidConfig(_)
        )
    }

    /// `LengthMismatch` unless both lengths agree.
    pub fn check_lengths(expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(Error::LengthMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
