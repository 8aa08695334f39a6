//!
//! EM (Baum-Welch) driver
//!
//! Each iteration runs
//! Forward -> Backward -> Posterior (per sequence) -> Re-estimation (all sequences)
//! and records the negative log-likelihood of the parameters used in the iteration.
//!
pub mod config;
pub mod stop;

use crate::common::{Shape, MONOTONICITY_TOLERANCE, STOCHASTIC_TOLERANCE};
use crate::error::{BWError, Result};
use crate::hmm::{ExpectedCounts, ModelParameters, ObservationSet, Tables};
pub use config::{EmConfig, Execution};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
pub use stop::{FixedIterations, NllTolerance, StopRule, StopRuleConfig};

///
/// State of the EM run
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmStatus {
    Running,
    Converged,
    MaxIterationsReached,
}

///
/// NLL increase detected in verification mode
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonotonicityViolation {
    /// index of the iteration whose NLL is larger than the previous one
    pub iteration: usize,
    pub previous: f64,
    pub current: f64,
}

impl From<MonotonicityViolation> for BWError {
    fn from(v: MonotonicityViolation) -> BWError {
        BWError::MonotonicityViolation {
            iteration: v.iteration,
            previous: v.previous,
            current: v.current,
        }
    }
}

///
/// Result of an EM run
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmOutput {
    pub status: EmStatus,
    /// negative log-likelihood of each completed iteration
    pub nll_trace: Vec<f64>,
    /// filled only when `EmConfig::verify` is set
    pub monotonicity_violations: Vec<MonotonicityViolation>,
}

impl EmOutput {
    fn new() -> EmOutput {
        EmOutput {
            status: EmStatus::Running,
            nll_trace: Vec::new(),
            monotonicity_violations: Vec::new(),
        }
    }
    /// number of iterations actually performed
    pub fn n_iterations(&self) -> usize {
        self.nll_trace.len()
    }
    ///
    /// number of iterations until convergence,
    /// or 0 if the run did not converge within the budget.
    ///
    pub fn iterations_to_converge(&self) -> usize {
        match self.status {
            EmStatus::Converged => self.n_iterations(),
            _ => 0,
        }
    }
    /// NLL of the last iteration
    pub fn last_nll(&self) -> Option<f64> {
        self.nll_trace.last().copied()
    }
}

///
/// Check that the model and the observations are consistent
/// and the model is a valid HMM. Returns the shape of the problem.
///
pub fn check_inputs(params: &ModelParameters, obs: &ObservationSet) -> Result<Shape> {
    let shape = Shape::new(
        obs.n_sequences(),
        params.n_states(),
        params.n_symbols(),
        obs.len(),
    )?;
    if obs.n_symbols() != params.n_symbols() {
        return Err(BWError::InvalidShape(format!(
            "observations have {} symbols but the model emits {}",
            obs.n_symbols(),
            params.n_symbols()
        )));
    }
    params.validate(STOCHASTIC_TOLERANCE)?;
    Ok(shape)
}

///
/// Fit the parameters to the observations by Baum-Welch,
/// with the stop rule selected in the config.
///
/// `params` is updated in place. If an iteration fails, the error is
/// returned and `params` holds the parameters of the last
/// successful re-estimation.
///
pub fn train(
    params: &mut ModelParameters,
    obs: &ObservationSet,
    config: &EmConfig,
) -> Result<EmOutput> {
    let rule = config.stop_rule.to_rule();
    train_with_rule(params, obs, config, rule.as_ref())
}

///
/// `train` with an arbitrary stop rule (`config.stop_rule` is ignored).
///
pub fn train_with_rule<R>(
    params: &mut ModelParameters,
    obs: &ObservationSet,
    config: &EmConfig,
    rule: &R,
) -> Result<EmOutput>
where
    R: StopRule + ?Sized,
{
    config.validate()?;
    let shape = check_inputs(params, obs)?;
    info!(
        "baum-welch started {} max_iterations={} execution={:?} layout={:?}",
        shape,
        config.max_iterations,
        config.execution,
        params.layout()
    );

    let mut tables = Tables::new(shape);
    let mut output = EmOutput::new();

    while output.status == EmStatus::Running {
        let iteration = output.n_iterations();
        let counts = e_step(params, obs, &mut tables, config.execution)?;
        params.reestimate(&counts)?;

        let nll = -counts.log_likelihood;
        debug!("iteration={} nll={}", iteration, nll);
        if config.verify {
            if let Some(previous) = output.last_nll() {
                if nll > previous + MONOTONICITY_TOLERANCE {
                    warn!(
                        "nll increased at iteration={}: {} -> {}",
                        iteration, previous, nll
                    );
                    output.monotonicity_violations.push(MonotonicityViolation {
                        iteration,
                        previous,
                        current: nll,
                    });
                }
            }
        }
        output.nll_trace.push(nll);

        if rule.is_converged(&output.nll_trace) {
            output.status = EmStatus::Converged;
        } else if output.n_iterations() >= config.max_iterations {
            output.status = EmStatus::MaxIterationsReached;
        }
    }

    info!(
        "baum-welch finished status={:?} iterations={} nll={:?}",
        output.status,
        output.n_iterations(),
        output.last_nll()
    );
    Ok(output)
}

///
/// Run Forward/Backward/Posterior on every sequence and
/// sum up the expected counts.
///
/// Sequences only read `params` and write their own `SeqTable`,
/// so they are processed independently.
///
pub fn e_step(
    params: &ModelParameters,
    obs: &ObservationSet,
    tables: &mut Tables,
    execution: Execution,
) -> Result<ExpectedCounts> {
    let n = params.n_states();
    let m = params.n_symbols();
    assert_eq!(tables.len(), obs.n_sequences());

    match execution {
        Execution::Sequential => {
            let mut counts = ExpectedCounts::zero(n, m);
            for (k, (table, emissions)) in tables.tables.iter_mut().zip(obs.sequences()).enumerate()
            {
                params
                    .run(emissions, table)
                    .map_err(|e| e.in_sequence(k))?;
                counts += &ExpectedCounts::from_table(table, emissions, m);
            }
            Ok(counts)
        }
        Execution::Parallel => tables
            .tables
            .par_iter_mut()
            .zip(obs.par_sequences())
            .enumerate()
            .map(|(k, (table, emissions))| -> Result<ExpectedCounts> {
                params
                    .run(emissions, table)
                    .map_err(|e| e.in_sequence(k))?;
                Ok(ExpectedCounts::from_table(table, emissions, m))
            })
            .try_reduce(|| ExpectedCounts::zero(n, m), |a, b| Ok(a + b)),
    }
}
