//! Error type for the species subsystem.
//!
//! Per the subsystem's error-handling contract, almost every fault here is
//! a programmer error (asserted impossible, or simply undefined if it
//! happens). Only the two cases that are worth a diagnosable `Result` —
//! injecting outside the grid, and allocation failure — get a variant.

use thiserror::Error;

/// Errors the species subsystem can report.
#[derive(Debug, Error)]
pub enum Error {
    /// `inject` was asked to place particles in cells outside `[0, nx)`.
    #[error("injection range [{lo}, {hi}) is outside the grid [0, {nx})")]
    InjectionOutOfRange {
        /// Lower bound of the requested (invalid) range.
        lo: i32,
        /// Upper bound (exclusive) of the requested (invalid) range.
        hi: i32,
        /// Number of cells in the grid.
        nx: i32,
    },
    /// The particle buffer could not grow to hold `requested` particles.
    #[error("failed to allocate a particle buffer for {requested} particles")]
    AllocationFailed {
        /// The number of particles the buffer was asked to hold.
        requested: usize,
    },
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
