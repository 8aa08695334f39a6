//!
//! Common types and numerical constants shared by the engine
//!

/// probability value in `[0, 1]`, stored as a plain f64 (scaled, not in log space)
pub type Prob = f64;

/// expected usage count accumulated from posteriors
pub type Freq = f64;

/// observed symbol, an integer in `[0, M)`
pub type Symbol = usize;

///
/// Tolerance of `|sum - 1|` for a row of a probability table
/// to be regarded as a distribution.
///
pub const STOCHASTIC_TOLERANCE: f64 = 1e-12;

///
/// Allowed increase of the negative log-likelihood between two consecutive
/// iterations before it is reported as a violation.
///
pub const MONOTONICITY_TOLERANCE: f64 = 1e-12;

///
/// Shape of the problem
///
/// * `k`: number of observation sequences
/// * `n`: number of hidden states
/// * `m`: number of distinct observation symbols
/// * `t`: length of each sequence
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    pub k: usize,
    pub n: usize,
    pub m: usize,
    pub t: usize,
}

impl Shape {
    ///
    /// Validated constructor.
    ///
    /// Every dimension should be non-zero, and `t >= 2` because the
    /// transition update needs at least one `(t, t+1)` pair.
    ///
    pub fn new(k: usize, n: usize, m: usize, t: usize) -> crate::error::Result<Shape> {
        let shape = Shape { k, n, m, t };
        if k == 0 || n == 0 || m == 0 || t == 0 {
            return Err(crate::error::BWError::InvalidShape(format!(
                "all dimensions must be non-zero ({})",
                shape
            )));
        }
        if t < 2 {
            return Err(crate::error::BWError::InvalidShape(format!(
                "sequence length must be at least 2 ({})",
                shape
            )));
        }
        Ok(shape)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "K={} N={} M={} T={}", self.k, self.n, self.m, self.t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BWError;
    use test_case::test_case;

    #[test_case(0, 2, 2, 3 ; "no sequences")]
    #[test_case(1, 0, 2, 3 ; "no states")]
    #[test_case(1, 2, 0, 3 ; "no symbols")]
    #[test_case(1, 2, 2, 0 ; "empty sequences")]
    #[test_case(1, 2, 2, 1 ; "single timestep")]
    fn shape_rejects_invalid(k: usize, n: usize, m: usize, t: usize) {
        let r = Shape::new(k, n, m, t);
        assert!(matches!(r, Err(BWError::InvalidShape(_))));
    }
    #[test]
    fn shape_accepts_valid() {
        let s = Shape::new(16, 16, 16, 32).unwrap();
        assert_eq!(s.to_string(), "K=16 N=16 M=16 T=32");
    }
}
