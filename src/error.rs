//! Centralized error type for the spectra umbrella crate.
//!
//! Wraps the subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] spectra_core::Error),
}

impl Error {
    /// True for every contract violation (bad lengths, missing channels,
    /// out-of-range configuration). Nothing in the pipeline is retryable.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Error::Core(e) => e.is_invalid_input(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
