//!
//! Re-estimation of the parameters from the expected usage counts
//!
//! - **ExpectedCounts** (for each state, transition and (state, symbol))
//!     The sum of posteriors `gamma`/`sigma` over all sequences and times.
//!     Counts of different sequences are summed up, so sequences can be
//!     processed independently and reduced afterwards.
//!
use super::params::ModelParameters;
use super::table::SeqTable;
use crate::common::{Freq, Symbol};
use crate::error::{BWError, Result, Stage};
use log::warn;
use std::ops::{Add, AddAssign};

///
/// Expected counts accumulated over sequences.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedCounts {
    n: usize,
    m: usize,
    /// `sum_k gamma[k][0][n]`
    pub init: Vec<Freq>,
    /// `sum_k sum_{t<T-1} sigma[k][t][n0][n1]` at `n0*N + n1`
    pub trans: Vec<Freq>,
    /// `sum_k sum_{t<T-1} gamma[k][t][n0]`
    pub trans_from: Vec<Freq>,
    /// `sum_k sum_{t: x[k][t]=m} gamma[k][t][n]` at `n*M + m`
    pub emit: Vec<Freq>,
    /// `sum_k sum_t gamma[k][t][n]`
    pub state: Vec<Freq>,
    /// number of sequences accumulated
    pub n_sequences: usize,
    /// `sum_k sum_t log scale[k][t]`
    pub log_likelihood: f64,
}

/// Constructors
impl ExpectedCounts {
    /// all-zero counts of `n` states and `m` symbols
    pub fn zero(n: usize, m: usize) -> ExpectedCounts {
        ExpectedCounts {
            n,
            m,
            init: vec![0.0; n],
            trans: vec![0.0; n * n],
            trans_from: vec![0.0; n],
            emit: vec![0.0; n * m],
            state: vec![0.0; n],
            n_sequences: 0,
            log_likelihood: 0.0,
        }
    }
    ///
    /// Counts of a single sequence, from its posterior tables
    /// filled by a successful `run`.
    ///
    pub(crate) fn from_table(table: &SeqTable, emissions: &[Symbol], m: usize) -> ExpectedCounts {
        let n = table.n_states();
        let t_len = table.len();
        let mut counts = ExpectedCounts::zero(n, m);
        counts.init.copy_from_slice(table.gamma_at(0));
        for (t, &x) in emissions.iter().enumerate() {
            let gamma = table.gamma_at(t);
            for (i, &g) in gamma.iter().enumerate() {
                counts.state[i] += g;
                counts.emit[i * m + x] += g;
                if t < t_len - 1 {
                    counts.trans_from[i] += g;
                }
            }
            if t < t_len - 1 {
                for (c, &s) in counts.trans.iter_mut().zip(table.sigma_at(t)) {
                    *c += s;
                }
            }
        }
        counts.n_sequences = 1;
        counts.log_likelihood = table.log_likelihood();
        counts
    }
    /// number of hidden states
    pub fn n_states(&self) -> usize {
        self.n
    }
    /// number of symbols
    pub fn n_symbols(&self) -> usize {
        self.m
    }
}

impl<'a> AddAssign<&'a ExpectedCounts> for ExpectedCounts {
    fn add_assign(&mut self, other: &'a ExpectedCounts) {
        assert_eq!(self.n, other.n);
        assert_eq!(self.m, other.m);
        let pairs = [
            (&mut self.init, &other.init),
            (&mut self.trans, &other.trans),
            (&mut self.trans_from, &other.trans_from),
            (&mut self.emit, &other.emit),
            (&mut self.state, &other.state),
        ];
        for (xs, ys) in pairs {
            for (x, y) in xs.iter_mut().zip(ys.iter()) {
                *x += y;
            }
        }
        self.n_sequences += other.n_sequences;
        self.log_likelihood += other.log_likelihood;
    }
}

impl Add for ExpectedCounts {
    type Output = ExpectedCounts;
    fn add(mut self, other: ExpectedCounts) -> ExpectedCounts {
        self += &other;
        self
    }
}

impl ModelParameters {
    ///
    /// Replace the parameters with the maximum likelihood estimate
    /// given the expected counts.
    ///
    /// ```text
    /// pi[n]     = init[n] / K
    /// A[n0][n1] = trans[n0][n1] / trans_from[n0]
    /// E[n][m]   = emit[n][m] / state[n]
    /// ```
    ///
    /// A zero denominator (a state never visited) is reported as
    /// `DegenerateNormalization` and the parameters are left untouched.
    ///
    pub fn reestimate(&mut self, counts: &ExpectedCounts) -> Result<()> {
        let n = self.n_states();
        let m = self.n_symbols();
        assert_eq!(counts.n, n);
        assert_eq!(counts.m, m);

        if counts.n_sequences == 0 {
            warn!("no sequences to re-estimate the initial distribution");
            return Err(BWError::DegenerateNormalization {
                stage: Stage::Initial,
                sequence: None,
                time: None,
                state: None,
            });
        }
        let k = counts.n_sequences as f64;
        let initial: Vec<f64> = counts.init.iter().map(|&g| g / k).collect();

        let mut transition = vec![0.0; n * n];
        for n0 in 0..n {
            let denom = counts.trans_from[n0];
            check_denominator(denom, Stage::Transition, n0)?;
            for n1 in 0..n {
                transition[n0 * n + n1] = counts.trans[n0 * n + n1] / denom;
            }
        }

        let mut emission = vec![0.0; n * m];
        for i in 0..n {
            let denom = counts.state[i];
            check_denominator(denom, Stage::Emission, i)?;
            for x in 0..m {
                emission[self.emission_index(i, x)] = counts.emit[i * m + x] / denom;
            }
        }

        self.set_tables(initial, transition, emission);
        Ok(())
    }
}

fn check_denominator(denom: Freq, stage: Stage, state: usize) -> Result<()> {
    if denom > 0.0 && denom.is_finite() {
        Ok(())
    } else {
        warn!("state {} has zero expected usage in {}", state, stage);
        Err(BWError::DegenerateNormalization {
            stage,
            sequence: None,
            time: None,
            state: Some(state),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::mocks::*;

    #[test]
    fn counts_from_table_and_sum() {
        let params = mock_random(3, 2, 1);
        let xs = [[0, 1, 1, 0], [1, 1, 0, 0]];
        let counts: Vec<ExpectedCounts> = xs
            .iter()
            .map(|x| {
                let mut table = SeqTable::new(3, 4);
                params.run(x, &mut table).unwrap();
                ExpectedCounts::from_table(&table, x, 2)
            })
            .collect();
        let c0 = &counts[0];
        // gamma sums to 1 for each t
        assert_abs_diff_eq!(c0.state.iter().sum::<f64>(), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c0.trans_from.iter().sum::<f64>(), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c0.trans.iter().sum::<f64>(), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c0.init.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        // symbol 1 appears twice in the first sequence
        let e1: f64 = (0..3).map(|n| c0.emit[n * 2 + 1]).sum();
        assert_abs_diff_eq!(e1, 2.0, epsilon = 1e-9);

        let total = counts[0].clone() + counts[1].clone();
        assert_eq!(total.n_sequences, 2);
        assert_abs_diff_eq!(total.state.iter().sum::<f64>(), 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            total.log_likelihood,
            counts[0].log_likelihood + counts[1].log_likelihood
        );
    }
    #[test]
    fn reestimate_keeps_rows_stochastic() {
        let mut params = mock_random(4, 5, 3);
        let x = [0, 4, 3, 1, 2, 2, 4, 0, 1, 3];
        let mut table = SeqTable::new(4, x.len());
        params.run(&x, &mut table).unwrap();
        let counts = ExpectedCounts::from_table(&table, &x, 5);
        params.reestimate(&counts).unwrap();
        params.validate(1e-9).unwrap();
    }
    #[test]
    fn reestimate_rejects_unvisited_state() {
        let mut params = mock_uniform(2, 2);
        let before = params.clone();
        let mut counts = ExpectedCounts::zero(2, 2);
        counts.n_sequences = 1;
        counts.init = vec![1.0, 0.0];
        counts.trans = vec![1.0, 0.0, 0.0, 0.0];
        counts.trans_from = vec![1.0, 0.0];
        counts.emit = vec![1.0, 1.0, 0.0, 0.0];
        counts.state = vec![2.0, 0.0];
        let r = params.reestimate(&counts);
        match r {
            Err(BWError::DegenerateNormalization { stage, state, .. }) => {
                assert_eq!(stage, Stage::Transition);
                assert_eq!(state, Some(1));
            }
            _ => panic!("unvisited state should be reported"),
        }
        assert_eq!(params, before);
    }
}
