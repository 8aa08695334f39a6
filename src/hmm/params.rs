//!
//! ModelParameters: initial/transition/emission distributions of the HMM
//!
use crate::common::{Prob, Symbol, STOCHASTIC_TOLERANCE};
use crate::error::{BWError, Result};
use crate::utils::{is_unit, row_sums};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

///
/// Storage layout of the emission table
///
/// * `RowMajor`: `E[n][m]` is stored at `n*M + m` (rows are states)
/// * `ColumnMajor`: `E[n][m]` is stored at `m*N + n`, so that the emission
///   probs of a single symbol for all states are contiguous.
///
/// The layout never changes the meaning of `emit(n, m)`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionLayout {
    RowMajor,
    ColumnMajor,
}

impl Default for EmissionLayout {
    fn default() -> Self {
        EmissionLayout::RowMajor
    }
}

///
/// HMM parameters for `N` hidden states and `M` symbols.
///
/// * `initial[n]`: P(X_0 = n)
/// * `transition[n0*N + n1]`: P(X_t+1 = n1 | X_t = n0)
/// * `emission`: P(Y_t = m | X_t = n), stored in `layout`
///
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    n: usize,
    m: usize,
    initial: Vec<Prob>,
    transition: Vec<Prob>,
    emission: Vec<Prob>,
    layout: EmissionLayout,
}

/// Constructors
impl ModelParameters {
    ///
    /// Create parameters from flat row-major tables.
    ///
    /// Lengths, non-negativity and row-stochasticity are checked here,
    /// so a non-distribution input is rejected before any iteration.
    ///
    pub fn new(
        n: usize,
        m: usize,
        initial: Vec<Prob>,
        transition: Vec<Prob>,
        emission: Vec<Prob>,
    ) -> Result<ModelParameters> {
        if n == 0 || m == 0 {
            return Err(BWError::InvalidShape(format!(
                "N={} M={} should be non-zero",
                n, m
            )));
        }
        let check_len = |name: &str, actual: usize, expected: usize| {
            if actual != expected {
                Err(BWError::InvalidShape(format!(
                    "{} has {} entries (expected {})",
                    name, actual, expected
                )))
            } else {
                Ok(())
            }
        };
        check_len("initial", initial.len(), n)?;
        check_len("transition", transition.len(), n * n)?;
        check_len("emission", emission.len(), n * m)?;

        let params = ModelParameters {
            n,
            m,
            initial,
            transition,
            emission,
            layout: EmissionLayout::RowMajor,
        };
        params.validate(STOCHASTIC_TOLERANCE)?;
        Ok(params)
    }
    ///
    /// Create parameters from nested rows
    /// `transition[n0][n1]` and `emission[n][m]`.
    ///
    pub fn from_rows(
        initial: &[Prob],
        transition: &[Vec<Prob>],
        emission: &[Vec<Prob>],
    ) -> Result<ModelParameters> {
        let n = initial.len();
        let m = emission.first().map_or(0, |row| row.len());
        if transition.len() != n
            || transition.iter().any(|row| row.len() != n)
            || emission.len() != n
            || emission.iter().any(|row| row.len() != m)
        {
            return Err(BWError::InvalidShape(
                "rows of transition/emission are not rectangular".to_string(),
            ));
        }
        ModelParameters::new(
            n,
            m,
            initial.to_vec(),
            transition.concat(),
            emission.concat(),
        )
    }
    ///
    /// All distributions are uniform: `1/N` for initial/transition,
    /// `1/M` for emission.
    ///
    pub fn uniform(n: usize, m: usize) -> ModelParameters {
        ModelParameters {
            n,
            m,
            initial: vec![1.0 / n as f64; n],
            transition: vec![1.0 / n as f64; n * n],
            emission: vec![1.0 / m as f64; n * m],
            layout: EmissionLayout::RowMajor,
        }
    }
    ///
    /// Random parameters generated from the seed.
    ///
    /// Each row is drawn uniformly from `[0, 1)` and normalized.
    /// A row that happens to sum to zero is redrawn.
    ///
    pub fn random(n: usize, m: usize, seed: u64) -> Result<ModelParameters> {
        if n == 0 || m == 0 {
            return Err(BWError::InvalidShape(format!(
                "N={} M={} should be non-zero",
                n, m
            )));
        }
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let initial = random_row(&mut rng, n);
        let transition: Vec<Prob> = (0..n).flat_map(|_| random_row(&mut rng, n)).collect();
        let emission: Vec<Prob> = (0..n).flat_map(|_| random_row(&mut rng, m)).collect();
        Ok(ModelParameters {
            n,
            m,
            initial,
            transition,
            emission,
            layout: EmissionLayout::RowMajor,
        })
    }
}

/// `len` should be positive, otherwise the row never sums to non-zero.
fn random_row<R: Rng>(rng: &mut R, len: usize) -> Vec<Prob> {
    debug_assert!(len > 0);
    loop {
        let row: Vec<Prob> = (0..len).map(|_| rng.gen::<f64>()).collect();
        let sum: f64 = row.iter().sum();
        if sum > 0.0 {
            return row.into_iter().map(|x| x / sum).collect();
        }
    }
}

/// Accessors
impl ModelParameters {
    /// number of hidden states `N`
    pub fn n_states(&self) -> usize {
        self.n
    }
    /// number of symbols `M`
    pub fn n_symbols(&self) -> usize {
        self.m
    }
    /// storage layout of the emission table
    pub fn layout(&self) -> EmissionLayout {
        self.layout
    }
    /// `P(X_0 = n)`
    #[inline]
    pub fn init(&self, n: usize) -> Prob {
        self.initial[n]
    }
    /// `P(X_t+1 = n1 | X_t = n0)`
    #[inline]
    pub fn trans(&self, n0: usize, n1: usize) -> Prob {
        self.transition[n0 * self.n + n1]
    }
    /// `P(Y_t = m | X_t = n)`
    #[inline]
    pub fn emit(&self, n: usize, m: Symbol) -> Prob {
        self.emission[self.emission_index(n, m)]
    }
    /// initial distribution as a slice
    pub fn initial(&self) -> &[Prob] {
        &self.initial
    }
    /// transition probs from `n0` as a slice
    pub fn transition_row(&self, n0: usize) -> &[Prob] {
        &self.transition[n0 * self.n..(n0 + 1) * self.n]
    }
    /// emission probs of state `n` as a row (copied when stored column-major)
    pub fn emission_row(&self, n: usize) -> Vec<Prob> {
        (0..self.m).map(|m| self.emit(n, m)).collect()
    }
    #[inline]
    pub(crate) fn emission_index(&self, n: usize, m: Symbol) -> usize {
        match self.layout {
            EmissionLayout::RowMajor => n * self.m + m,
            EmissionLayout::ColumnMajor => m * self.n + n,
        }
    }
    pub(crate) fn set_tables(&mut self, initial: Vec<Prob>, transition: Vec<Prob>, emission: Vec<Prob>) {
        debug_assert_eq!(initial.len(), self.n);
        debug_assert_eq!(transition.len(), self.n * self.n);
        debug_assert_eq!(emission.len(), self.n * self.m);
        self.initial = initial;
        self.transition = transition;
        self.emission = emission;
    }
}

/// Layout conversion
impl ModelParameters {
    ///
    /// Re-pack the emission table into `layout`.
    ///
    pub fn set_layout(&mut self, layout: EmissionLayout) {
        if self.layout == layout {
            return;
        }
        let mut emission = vec![0.0; self.n * self.m];
        for n in 0..self.n {
            for m in 0..self.m {
                let i = match layout {
                    EmissionLayout::RowMajor => n * self.m + m,
                    EmissionLayout::ColumnMajor => m * self.n + n,
                };
                emission[i] = self.emit(n, m);
            }
        }
        self.emission = emission;
        self.layout = layout;
    }
    ///
    /// Owned version of `set_layout`
    ///
    pub fn with_layout(mut self, layout: EmissionLayout) -> ModelParameters {
        self.set_layout(layout);
        self
    }
}

/// Validation
impl ModelParameters {
    ///
    /// Check that all entries are finite non-negative probabilities and
    /// every row of initial/transition/emission sums to 1 within `tolerance`.
    ///
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        let tables: [(&'static str, &Vec<Prob>); 3] = [
            ("initial", &self.initial),
            ("transition", &self.transition),
            ("emission", &self.emission),
        ];
        for &(table, values) in tables.iter() {
            if let Some((index, &value)) = values
                .iter()
                .enumerate()
                .find(|&(_, &v)| !(v.is_finite() && v >= 0.0))
            {
                return Err(BWError::NegativeProbability {
                    table,
                    index,
                    value,
                });
            }
        }
        for (table, sums) in self.row_sums() {
            if let Some((row, &sum)) = sums
                .iter()
                .enumerate()
                .find(|&(_, &sum)| !is_unit(sum, tolerance))
            {
                return Err(BWError::NotStochastic { table, row, sum });
            }
        }
        Ok(())
    }
    ///
    /// Row sums of the three tables, in the order initial, transition, emission.
    ///
    pub fn row_sums(&self) -> Vec<(&'static str, Vec<f64>)> {
        vec![
            ("initial", vec![self.initial.iter().sum()]),
            (
                "transition",
                row_sums(self.n, self.n, |n0, n1| self.trans(n0, n1)),
            ),
            ("emission", row_sums(self.n, self.m, |n, m| self.emit(n, m))),
        ]
    }
    ///
    /// Maximum absolute difference between two parameter sets of the same shape.
    ///
    pub fn diff(&self, other: &ModelParameters) -> f64 {
        assert_eq!(self.n, other.n);
        assert_eq!(self.m, other.m);
        let d_init = (0..self.n).map(|n| (self.init(n) - other.init(n)).abs());
        let d_trans = (0..self.n)
            .flat_map(|n0| (0..self.n).map(move |n1| (n0, n1)))
            .map(|(n0, n1)| (self.trans(n0, n1) - other.trans(n0, n1)).abs());
        let d_emit = (0..self.n)
            .flat_map(|n| (0..self.m).map(move |m| (n, m)))
            .map(|(n, m)| (self.emit(n, m) - other.emit(n, m)).abs());
        d_init.chain(d_trans).chain(d_emit).fold(0.0, f64::max)
    }
}

impl std::fmt::Display for ModelParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Initialization probabilities:")?;
        for n in 0..self.n {
            writeln!(f, "Pr[X_1 = {}] = {:.6}", n + 1, self.init(n))?;
        }
        writeln!(f)?;
        writeln!(f, "Transition probabilities:")?;
        for n0 in 0..self.n {
            for n1 in 0..self.n {
                writeln!(
                    f,
                    "Pr[X_t = {} | X_(t-1) = {}] = {:.6}",
                    n1 + 1,
                    n0 + 1,
                    self.trans(n0, n1)
                )?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Emission probabilities:")?;
        for n in 0..self.n {
            for m in 0..self.m {
                writeln!(
                    f,
                    "Pr[Y_t = {} | X_t = {}] = {:.6}",
                    m + 1,
                    n + 1,
                    self.emit(n, m)
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn params_random_is_stochastic() {
        for seed in 0..5 {
            let p = ModelParameters::random(4, 6, seed).unwrap();
            p.validate(1e-12).unwrap();
            assert_eq!(p.n_states(), 4);
            assert_eq!(p.n_symbols(), 6);
        }
        // same seed, same params
        assert_eq!(
            ModelParameters::random(3, 3, 11).unwrap(),
            ModelParameters::random(3, 3, 11).unwrap()
        );
    }
    #[test_case(0, 3 ; "no states")]
    #[test_case(2, 0 ; "no symbols")]
    #[test_case(0, 0 ; "empty")]
    fn params_random_rejects_zero_dimension(n: usize, m: usize) {
        let r = ModelParameters::random(n, m, 0);
        assert!(matches!(r, Err(BWError::InvalidShape(_))));
    }
    #[test]
    fn params_reject_non_stochastic_row() {
        let r = ModelParameters::from_rows(
            &[0.5, 0.5],
            &[vec![0.5, 0.5], vec![0.7, 0.7]],
            &[vec![0.5, 0.5], vec![0.5, 0.5]],
        );
        match r {
            Err(BWError::NotStochastic { table, row, sum }) => {
                assert_eq!(table, "transition");
                assert_eq!(row, 1);
                assert_abs_diff_eq!(sum, 1.4);
            }
            _ => panic!("non-stochastic transition row should be rejected"),
        }
    }
    #[test]
    fn params_reject_negative_entry() {
        let r = ModelParameters::from_rows(
            &[1.5, -0.5],
            &[vec![0.5, 0.5], vec![0.5, 0.5]],
            &[vec![0.5, 0.5], vec![0.5, 0.5]],
        );
        assert!(matches!(
            r,
            Err(BWError::NegativeProbability {
                table: "initial",
                index: 1,
                ..
            })
        ));
    }
    #[test]
    fn params_reject_wrong_length() {
        let r = ModelParameters::new(2, 2, vec![1.0], vec![0.5; 4], vec![0.5; 4]);
        assert!(matches!(r, Err(BWError::InvalidShape(_))));
        let r = ModelParameters::from_rows(
            &[0.5, 0.5],
            &[vec![0.5, 0.5], vec![1.0]],
            &[vec![0.5, 0.5], vec![0.5, 0.5]],
        );
        assert!(matches!(r, Err(BWError::InvalidShape(_))));
    }
    #[test]
    fn params_layout_keeps_meaning() {
        let p = ModelParameters::random(3, 5, 2).unwrap();
        let q = p.clone().with_layout(EmissionLayout::ColumnMajor);
        assert_eq!(q.layout(), EmissionLayout::ColumnMajor);
        for n in 0..3 {
            for m in 0..5 {
                assert_eq!(p.emit(n, m), q.emit(n, m));
            }
            assert_eq!(p.emission_row(n), q.emission_row(n));
        }
        // stored column-major: symbol 1 of state 2 is at 1*N + 2
        assert_eq!(q.emission_index(2, 1), 5);
        assert_eq!(p.emission_index(2, 1), 11);
        q.validate(1e-12).unwrap();
        let r = q.with_layout(EmissionLayout::RowMajor);
        assert_eq!(p, r);
    }
    #[test]
    fn params_display() {
        let p = ModelParameters::uniform(2, 2);
        let s = p.to_string();
        println!("{}", s);
        assert!(s.contains("Pr[X_1 = 2] = 0.500000"));
        assert!(s.contains("Pr[X_t = 1 | X_(t-1) = 2] = 0.500000"));
        assert!(s.contains("Pr[Y_t = 2 | X_t = 1] = 0.500000"));
    }
    #[test]
    fn params_diff() {
        let p = ModelParameters::uniform(2, 3);
        assert_eq!(p.diff(&p), 0.0);
        let q = ModelParameters::random(2, 3, 0).unwrap();
        assert!(p.diff(&q) > 0.0);
    }
}
