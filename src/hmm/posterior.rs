//!
//! Posterior (state usage / transition usage) from the result of Forward/Backward
//!
//! - **gamma** (for each time and each state)
//!     The probability of being in the hidden state at the time,
//!     given the whole emissions.
//!
//! - **sigma** (for each time `t < T-1` and each pair of states)
//!     The probability of the transition `n0 -> n1` between `t` and `t+1`,
//!     given the whole emissions.
//!
use super::params::ModelParameters;
use super::table::SeqTable;
use crate::common::Symbol;
use crate::error::{BWError, Result};

impl ModelParameters {
    ///
    /// Run forward, backward and posterior on a single sequence.
    ///
    /// The sequence should have at least 2 emissions and fit in `table`.
    ///
    pub fn run(&self, emissions: &[Symbol], table: &mut SeqTable) -> Result<()> {
        if emissions.len() < 2 {
            return Err(BWError::InvalidShape(format!(
                "sequence of length {} has no transition",
                emissions.len()
            )));
        }
        if table.len() != emissions.len() || table.n_states() != self.n_states() {
            return Err(BWError::InvalidShape(format!(
                "table of N={} T={} does not fit the sequence of length {} with N={}",
                table.n_states(),
                table.len(),
                emissions.len(),
                self.n_states()
            )));
        }
        if let Some(&x) = emissions.iter().find(|&&x| x >= self.n_symbols()) {
            return Err(BWError::InvalidShape(format!(
                "symbol {} is out of range [0, {})",
                x,
                self.n_symbols()
            )));
        }
        self.forward(emissions, table)?;
        self.backward(emissions, table);
        self.posterior(emissions, table);
        Ok(())
    }
    ///
    /// Fill `gamma` and `sigma` from `alpha`, `beta` and `scale`.
    ///
    /// ```text
    /// g[t][n] = a[t][n] b[t][n] c[t]
    /// s[t][n0][n1] = a[t][n0] A[n0][n1] e(n1, x[t+1]) b[t+1][n1]
    /// ```
    ///
    /// The normalizations of `a` and `b` cancel each other, so
    /// `sum_n g[t][n] = 1` and `sum_{n0,n1} s[t][n0][n1] = 1`.
    ///
    /// Called through `run`, which checks that there are at least 2 emissions.
    ///
    pub(crate) fn posterior(&self, emissions: &[Symbol], table: &mut SeqTable) {
        let n = self.n_states();
        let t_len = emissions.len();
        assert_eq!(table.len(), t_len);

        // gamma
        for t in 0..t_len {
            let c = table.scale[t];
            for i in t * n..(t + 1) * n {
                table.gamma[i] = table.alpha[i] * table.beta[i] * c;
            }
        }

        // sigma
        let mut weighted = vec![0.0; n];
        for t in 0..t_len - 1 {
            let x = emissions[t + 1];
            let beta_next = &table.beta[(t + 1) * n..(t + 2) * n];
            for (n1, w) in weighted.iter_mut().enumerate() {
                *w = self.emit(n1, x) * beta_next[n1];
            }
            let alpha = &table.alpha[t * n..(t + 1) * n];
            let sigma = &mut table.sigma[t * n * n..(t + 1) * n * n];
            for (n0, row) in sigma.chunks_mut(n).enumerate() {
                let a0 = alpha[n0];
                for ((s, &p_trans), &w) in row
                    .iter_mut()
                    .zip(self.transition_row(n0))
                    .zip(weighted.iter())
                {
                    *s = a0 * p_trans * w;
                }
            }
        }
    }
}
