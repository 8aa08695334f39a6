//!
//! Error types of the Baum-Welch engine
//!
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, BWError>;

/// Stage of an iteration where a normalization denominator vanished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Forward,
    Initial,
    Transition,
    Emission,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Stage::Forward => "forward scaling",
            Stage::Initial => "initial update",
            Stage::Transition => "transition update",
            Stage::Emission => "emission update",
        };
        write!(f, "{}", name)
    }
}

/// Errors that can occur while validating or training a model.
#[derive(Error, Debug)]
pub enum BWError {
    /// Zero dimension, mismatched table length or out-of-range symbol.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// A row of a probability table does not sum to 1.
    #[error("{table} row {row} sums to {sum} (expected 1.0)")]
    NotStochastic {
        table: &'static str,
        row: usize,
        sum: f64,
    },

    /// A probability table contains a negative or non-finite entry.
    #[error("{table}[{index}] = {value} is not a probability")]
    NegativeProbability {
        table: &'static str,
        index: usize,
        value: f64,
    },

    /// A scaling or re-estimation denominator is zero.
    #[error("degenerate normalization in {stage} (sequence={sequence:?} time={time:?} state={state:?})")]
    DegenerateNormalization {
        stage: Stage,
        sequence: Option<usize>,
        time: Option<usize>,
        state: Option<usize>,
    },

    /// Negative log-likelihood increased between two iterations.
    #[error("negative log-likelihood increased at iteration {iteration}: {previous} -> {current}")]
    MonotonicityViolation {
        iteration: usize,
        previous: f64,
        current: f64,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BWError {
    ///
    /// Attach the sequence index to an error raised inside
    /// a per-sequence computation.
    ///
    pub fn in_sequence(self, k: usize) -> BWError {
        match self {
            BWError::DegenerateNormalization {
                stage, time, state, ..
            } => BWError::DegenerateNormalization {
                stage,
                sequence: Some(k),
                time,
                state,
            },
            e => e,
        }
    }
}
