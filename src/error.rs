use std::io;

use thiserror::Error;

/// Errors from the mixer statistics in [`stats`](crate::stats).
///
/// Hashing itself cannot fail.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A statistics run was asked for zero rounds.
    #[error("statistics need at least one round")]
    ZeroRounds,

    /// The mixer's input or output block has no bytes to measure.
    #[error("mixer {which} block is empty")]
    EmptyBlock { which: &'static str },

    /// The chart has no samples to normalise by.
    #[error("no samples have been accumulated")]
    NoSamples,

    /// Creating or writing a chart image failed.
    #[error("avalanche chart i/o failed: {0}")]
    Io(#[from] io::Error),
}
