use thiserror::Error;

/// Error taxonomy for the reliability simulator.
///
/// `SolverNonConvergence` is handled inline (retry with a widened bracket)
/// rather than surfaced here — see the BFB waiting-time solver in
/// `reliability-core`.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid CLI arguments, an unparseable code description file, or a
    /// `-n`/code-file mismatch.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A simulator precondition was violated at construction time (e.g. BFB
    /// invoked with heterogeneous component distributions).
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// A numerical edge case that could not be clamped away (e.g. a hazard
    /// solver bracket with no sign change after widening).
    #[error("numerical edge case: {0}")]
    Numerical(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
