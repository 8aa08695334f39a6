//!
//! Forward algorithm definitions
//!
use super::params::ModelParameters;
use super::table::SeqTable;
use crate::common::{Prob, Symbol};
use crate::error::{BWError, Result, Stage};

impl ModelParameters {
    ///
    /// Run scaled Forward algorithm to the emissions
    ///
    /// `alpha[t][n]` = P(emits `x[0..=t]` and now in state `n`) / `prod_{s<=t} scale[s]`
    ///
    /// Fills `table.alpha` and `table.scale`. Each `alpha[t][..]` sums to 1.
    ///
    /// Returns `DegenerateNormalization` if some `scale[t]` is zero,
    /// that is, the emissions cannot be emitted from the current parameters.
    ///
    pub fn forward(&self, emissions: &[Symbol], table: &mut SeqTable) -> Result<()> {
        let n = self.n_states();
        assert_eq!(table.n_states(), n);
        assert_eq!(table.len(), emissions.len());

        for (t, &emission) in emissions.iter().enumerate() {
            let (done, rest) = table.alpha.split_at_mut(t * n);
            let cur = &mut rest[..n];
            if t == 0 {
                self.f_init(emission, cur);
            } else {
                self.f_step(emission, &done[(t - 1) * n..], cur);
            }
            table.scale[t] = normalize(cur).ok_or(BWError::DegenerateNormalization {
                stage: Stage::Forward,
                sequence: None,
                time: Some(t),
                state: None,
            })?;
        }
        Ok(())
    }
    ///
    /// Fill the forward probs of the first emission
    ///
    /// ```text
    /// a'[0][n] = pi[n] e(n, x[0])
    /// ```
    fn f_init(&self, emission: Symbol, cur: &mut [Prob]) {
        for (n, a) in cur.iter_mut().enumerate() {
            *a = self.init(n) * self.emit(n, emission);
        }
    }
    ///
    /// Fill the forward probs of `t` from `t-1`
    ///
    /// ```text
    /// a'[t][n1] = e(n1, x[t]) \sum_{n0} a[t-1][n0] A[n0][n1]
    /// ```
    ///
    /// accumulated row by row of the transition matrix.
    fn f_step(&self, emission: Symbol, prev: &[Prob], cur: &mut [Prob]) {
        for a in cur.iter_mut() {
            *a = 0.0;
        }
        for (n0, &a0) in prev.iter().enumerate() {
            for (a, &p_trans) in cur.iter_mut().zip(self.transition_row(n0)) {
                *a += a0 * p_trans;
            }
        }
        for (n1, a) in cur.iter_mut().enumerate() {
            *a *= self.emit(n1, emission);
        }
    }
}

///
/// Divide all entries by their sum and return the sum.
/// `None` if the sum is not positive.
///
fn normalize(xs: &mut [Prob]) -> Option<Prob> {
    let sum: Prob = xs.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for x in xs.iter_mut() {
            *x /= sum;
        }
        Some(sum)
    } else {
        None
    }
}
