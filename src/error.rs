use thiserror::Error;

/// Errors produced while setting up or running a simplex minimization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A start point, dimension or configuration value was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The iteration budget ran out before the best/worst gap closed.
    #[error(
        "Algorithm did not converge after {iterations} iterations \
         (best value {best_value:e}, best/worst gap {gap:e}); \
         try increasing max_iterations or simplex_size"
    )]
    NotConverged {
        iterations: usize,
        best_value: f64,
        gap: f64,
    },

    /// The objective produced NaN or an infinity.
    #[error("Objective returned non-finite value {value} at {point:?}")]
    NonFiniteObjective { point: Vec<f64>, value: f64 },

    /// The simplex was ordered before being anchored to a start point.
    #[error("Simplex has not been anchored to a start point")]
    NotAnchored,

    /// A ranking-dependent operation ran without a fresh `order()`.
    #[error("Simplex ranking is stale; order() must run first")]
    StaleRanking,
}

impl Error {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
