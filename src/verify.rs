//!
//! Verification of a trained model and its NLL trace
//!
//! * every row of initial/transition/emission sums to 1
//! * NLL never increases between consecutive iterations
//!
use crate::em::MonotonicityViolation;
use crate::error::{BWError, Result};
use crate::hmm::ModelParameters;
use crate::utils::is_unit;
use itertools::Itertools;
use serde::Serialize;

///
/// A row of a probability table not summing to 1
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowViolation {
    pub table: &'static str,
    pub row: usize,
    pub sum: f64,
}

///
/// Result of `check_and_verify`
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyReport {
    pub rows: Vec<RowViolation>,
    pub monotonicity: Vec<MonotonicityViolation>,
}

impl VerifyReport {
    /// no violations at all
    pub fn is_ok(&self) -> bool {
        self.rows.is_empty() && self.monotonicity.is_empty()
    }
    fn n_row_violations(&self, table: &str) -> usize {
        self.rows.iter().filter(|v| v.table == table).count()
    }
}

///
/// List all rows that do not sum to 1 and all NLL increases,
/// with the same `tolerance` for both.
///
/// Emission rows are read through `emit(n, m)`, i.e. the row of state `n`
/// is the `M` entries `n*M + m` of the row-major table.
///
pub fn check_and_verify(params: &ModelParameters, trace: &[f64], tolerance: f64) -> VerifyReport {
    let rows = params
        .row_sums()
        .into_iter()
        .flat_map(|(table, sums)| {
            sums.into_iter()
                .enumerate()
                .filter(move |&(_, sum)| !is_unit(sum, tolerance))
                .map(move |(row, sum)| RowViolation { table, row, sum })
        })
        .collect();
    VerifyReport {
        rows,
        monotonicity: monotonicity_violations(trace, tolerance),
    }
}

///
/// All iterations whose NLL is larger than the previous one by more than `tolerance`.
///
pub fn monotonicity_violations(trace: &[f64], tolerance: f64) -> Vec<MonotonicityViolation> {
    trace
        .iter()
        .tuple_windows()
        .enumerate()
        .filter(|&(_, (&previous, &current))| previous + tolerance < current)
        .map(|(i, (&previous, &current))| MonotonicityViolation {
            iteration: i + 1,
            previous,
            current,
        })
        .collect()
}

///
/// Ok if NLL is non-increasing within `tolerance`,
/// otherwise the first violation as an error.
///
pub fn check_monotonicity(trace: &[f64], tolerance: f64) -> Result<()> {
    match monotonicity_violations(trace, tolerance).into_iter().next() {
        Some(v) => Err(BWError::from(v)),
        None => Ok(()),
    }
}

impl std::fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for v in self.rows.iter() {
            writeln!(f, "FAIL: {}[{}] sums to {}", v.table, v.row, v.sum)?;
        }
        for table in ["initial", "transition", "emission"].iter() {
            match self.n_row_violations(table) {
                0 => writeln!(f, "PASSED: {} rows sum to 1.0", table)?,
                n => writeln!(f, "{} VIOLATIONS of rows in {} that do not sum to 1.0", n, table)?,
            }
        }
        for v in self.monotonicity.iter() {
            writeln!(
                f,
                "[{}]\t{}\t<\t{}\t(old nll < new nll)",
                v.iteration, v.previous, v.current
            )?;
        }
        match self.monotonicity.len() {
            0 => writeln!(f, "PASSED: monotonicity of the negative log likelihood"),
            n => writeln!(
                f,
                "{} VIOLATIONS of the monotonicity of the negative log likelihood",
                n
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::mocks::*;

    #[test]
    fn verify_passes_valid_model() {
        let params = mock_random(3, 4, 0);
        let report = check_and_verify(&params, &[10.0, 9.0, 9.0, 8.5], 1e-12);
        println!("{}", report);
        assert!(report.is_ok());
        assert!(report.to_string().contains("PASSED: emission rows sum to 1.0"));
    }
    #[test]
    fn verify_detects_nll_increase() {
        let trace = [10.0, 9.0, 9.5, 9.4, 9.6];
        let vs = monotonicity_violations(&trace, 1e-12);
        assert_eq!(vs.len(), 2);
        assert_eq!(vs[0].iteration, 2);
        assert_eq!(vs[1].iteration, 4);
        match check_monotonicity(&trace, 1e-12) {
            Err(BWError::MonotonicityViolation {
                iteration,
                previous,
                current,
            }) => {
                assert_eq!(iteration, 2);
                assert_eq!(previous, 9.0);
                assert_eq!(current, 9.5);
            }
            _ => panic!("increase should be reported"),
        }
        // tiny increases within tolerance are fine
        assert!(check_monotonicity(&[1.0, 1.0 + 1e-13], 1e-12).is_ok());
        assert!(check_monotonicity(&[], 1e-12).is_ok());
    }
    #[test]
    fn verify_detects_emission_row_of_state() {
        // 2 states, 3 symbols. Row 1 of emission (entries 3..6) is broken.
        let mut params = mock_uniform(2, 3);
        params.set_tables(
            vec![0.5, 0.5],
            vec![0.5, 0.5, 0.5, 0.5],
            vec![0.2, 0.3, 0.5, 0.2, 0.2, 0.2],
        );
        let report = check_and_verify(&params, &[], 1e-12);
        assert!(!report.is_ok());
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].table, "emission");
        assert_eq!(report.rows[0].row, 1);
        assert_abs_diff_eq!(report.rows[0].sum, 0.6, epsilon = 1e-12);
        assert!(report
            .to_string()
            .contains("1 VIOLATIONS of rows in emission that do not sum to 1.0"));
    }
}
