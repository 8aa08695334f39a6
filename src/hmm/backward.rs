//!
//! Backward algorithm definitions
//!
use super::params::ModelParameters;
use super::table::SeqTable;
use crate::common::{Prob, Symbol};

///
/// Backward Algorithm
///
impl ModelParameters {
    ///
    /// Run scaled Backward algorithm to the emissions
    ///
    /// `beta[t][n]` = P(emits `x[t+1..]` | in state `n` at `t`) / `prod_{s>=t} scale[s]`
    ///
    /// The scaling factors are the ones filled by `forward` on the same
    /// table; they are read, never recomputed, so that
    /// `alpha[t][n] beta[t][n] scale[t]` is the exact state posterior.
    ///
    pub fn backward(&self, emissions: &[Symbol], table: &mut SeqTable) {
        let n = self.n_states();
        let t_len = emissions.len();
        assert_eq!(table.n_states(), n);
        assert_eq!(table.len(), t_len);

        // weighted[n1] = e(n1, x[t+1]) b[t+1][n1]
        let mut weighted = vec![0.0; n];
        for t in (0..t_len).rev() {
            let c = table.scale[t];
            let (cur, next) = table.beta.split_at_mut((t + 1) * n);
            let cur = &mut cur[t * n..];
            if t == t_len - 1 {
                self.b_init(c, cur);
            } else {
                self.b_step(c, emissions[t + 1], &next[..n], cur, &mut weighted);
            }
        }
    }
    ///
    /// Fill the backward probs of the last emission
    ///
    /// ```text
    /// b[T-1][n] = 1 / c[T-1]
    /// ```
    fn b_init(&self, c: Prob, cur: &mut [Prob]) {
        for b in cur.iter_mut() {
            *b = 1.0 / c;
        }
    }
    ///
    /// Fill the backward probs of `t` from `t+1`
    ///
    /// ```text
    /// b[t][n0] = 1/c[t] \sum_{n1} A[n0][n1] e(n1, x[t+1]) b[t+1][n1]
    /// ```
    fn b_step(
        &self,
        c: Prob,
        next_emission: Symbol,
        next: &[Prob],
        cur: &mut [Prob],
        weighted: &mut [Prob],
    ) {
        for (n1, w) in weighted.iter_mut().enumerate() {
            *w = self.emit(n1, next_emission) * next[n1];
        }
        for (n0, b) in cur.iter_mut().enumerate() {
            let s: Prob = self
                .transition_row(n0)
                .iter()
                .zip(weighted.iter())
                .map(|(p_trans, w)| p_trans * w)
                .sum();
            *b = s / c;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::mocks::*;

    #[test]
    fn hmm_backward_uniform() {
        let params = mock_uniform(2, 2);
        let x = [0, 1, 0];
        let mut table = SeqTable::new(2, 3);
        params.forward(&x, &mut table).unwrap();
        params.backward(&x, &mut table);
        // every scale is 0.5, so every beta is 2
        for t in 0..3 {
            for &b in table.beta_at(t) {
                assert_abs_diff_eq!(b, 2.0, epsilon = 1e-12);
            }
        }
    }
    #[test]
    fn hmm_backward_full_prob_is_consistent() {
        // P(x) = sum_n pi[n] e(n, x[0]) B[0][n] = prod_t c[t], and B[0][n] = b[0][n] prod_t c[t]
        // so sum_n pi[n] e(n, x[0]) b[0][n] = 1
        let params = mock_two_state();
        let x = [1, 0, 0, 1, 1];
        let mut table = SeqTable::new(2, 5);
        params.forward(&x, &mut table).unwrap();
        params.backward(&x, &mut table);
        let s: f64 = (0..2)
            .map(|n| params.init(n) * params.emit(n, x[0]) * table.beta_at(0)[n])
            .sum();
        assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
    }
}
