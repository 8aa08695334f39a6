//!
//! Benchmark harness for the registered variants
//!
//! Each measured run trains a fresh copy of the same initial model,
//! so every run performs the same amount of work.
//!
use crate::common::Shape;
use crate::em::{EmConfig, EmOutput};
use crate::error::{BWError, Result};
use crate::hmm::{ModelParameters, ObservationSet};
use crate::registry::Variant;
use crate::utils::timer;
use log::{debug, info};
use serde::Serialize;

/// number of measured repetitions
pub const REP: usize = 20;

/// calibration runs until a measurement takes at least this long
pub const MIN_DURATION_NS: u128 = 100_000_000;

///
/// Number of floating point operations (add, mul, div) of a single
/// Baum-Welch iteration.
///
/// ```text
/// forward:    (1 add + 1 mul) K N^2 T + (1 add + 2 mul) K N T + (1 add + 2 mul) K N + (1 div) K T + (1 div) K
/// backward:   (1 add + 2 mul) K N^2 (T-1) + (1 mul) K N (T-1)
/// gamma:      (1 div + 1 mul) K N T + (1 add) K N (T-1)
/// sigma:      (1 add + 3 mul) K N^2 (T-1)
/// initial:    (1 add) K N + (1 div) N
/// transition: (2 add) K N^2 + (1 div) N^2
/// emission:   (2 add) N M K + (1 add) K N T + (1 add) K N + (1 div) N M
/// nll:        (1 add) K T
///
/// total = 9 T K N^2 - 5 K N^2 + N^2 + 8 T K N + 3 K N + K + 2 K N M + 2 T K + N + N M
/// ```
///
pub fn flops(shape: Shape) -> u128 {
    let Shape { k, n, m, t } = shape;
    let (k, n, m, t) = (k as u128, n as u128, m as u128, t as u128);
    9 * t * k * n * n - 5 * k * n * n + n * n + 8 * t * k * n + 3 * k * n + k + 2 * k * n * m
        + 2 * t * k
        + n
        + n * m
}

///
/// Measurement of a variant
///
#[derive(Debug, Clone, Serialize)]
pub struct PerfResult {
    pub name: String,
    /// runs per repetition (after calibration)
    pub n_runs: usize,
    pub repetitions: usize,
    pub max_iterations: usize,
    /// mean over repetitions, 0 if not converged within the budget
    pub iterations_to_converge: usize,
    /// flops of `max_iterations` iterations
    pub flops: u128,
    /// mean wall time of a single run
    pub ns_per_run: f64,
    pub flops_per_ns: f64,
}

impl std::fmt::Display for PerfResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Total iterations: {}", self.max_iterations)?;
        if self.iterations_to_converge == 0 {
            writeln!(
                f,
                "Warning: has not converged within the maximum iterations"
            )?;
        } else {
            writeln!(f, "Iterations to converge: {}", self.iterations_to_converge)?;
        }
        writeln!(f, "Flops: {}", self.flops)?;
        writeln!(f, "Time (ns): {:.0}", self.ns_per_run)?;
        write!(f, "Performance (flops/ns): {:.4}", self.flops_per_ns)
    }
}

///
/// Options of `perf_test`
///
#[derive(Debug, Clone, Copy)]
pub struct PerfOptions {
    pub calibrate: bool,
    pub repetitions: usize,
}

impl Default for PerfOptions {
    fn default() -> Self {
        PerfOptions {
            calibrate: true,
            repetitions: REP,
        }
    }
}

/// trained model and output of a run
type Trained = (ModelParameters, EmOutput);

///
/// Run `n_runs` trainings on fresh copies and return
/// (sum of iterations_to_converge, elapsed ns, trained model and output of the last run)
///
fn measure(
    variant: &Variant,
    init: &ModelParameters,
    obs: &ObservationSet,
    config: &EmConfig,
    n_runs: usize,
) -> Result<(usize, u128, Option<Trained>)> {
    let copies: Vec<ModelParameters> = (0..n_runs).map(|_| init.clone()).collect();
    let mut iterations = 0;
    let mut last = None;
    let (r, t) = timer(|| -> Result<()> {
        for mut params in copies {
            let output = (variant.run)(&mut params, obs, config)?;
            iterations += output.iterations_to_converge();
            last = Some((params, output));
        }
        Ok(())
    });
    r?;
    Ok((iterations, t, last))
}

///
/// Measure the mean wall time of training with `variant`.
///
/// Returns the measurement with the trained model and output of the last run,
/// which can be passed to `check_and_verify`.
///
pub fn perf_test(
    variant: &Variant,
    params: &ModelParameters,
    obs: &ObservationSet,
    config: &EmConfig,
    options: PerfOptions,
) -> Result<(PerfResult, ModelParameters, EmOutput)> {
    let shape = crate::em::check_inputs(params, obs)?;
    let init = params.clone().with_layout(variant.layout);
    let mut n_runs = 1;

    if options.calibrate {
        loop {
            let (_, t, _) = measure(variant, &init, obs, config, n_runs)?;
            let multiplier = MIN_DURATION_NS as f64 / t.max(1) as f64;
            debug!(
                "calibration {} n_runs={} t={}ns multiplier={}",
                variant.name, n_runs, t, multiplier
            );
            if multiplier > 2.0 {
                n_runs = (n_runs as f64 * multiplier).ceil() as usize;
            } else {
                break;
            }
        }
    }

    let repetitions = options.repetitions.max(1);
    let mut total_ns = 0.0;
    let mut total_iterations = 0;
    let mut last = None;
    for _ in 0..repetitions {
        let (iterations, t, trained) = measure(variant, &init, obs, config, n_runs)?;
        total_ns += t as f64 / n_runs as f64;
        total_iterations += iterations / n_runs;
        last = trained;
    }
    let ns_per_run = total_ns / repetitions as f64;
    let total_flops = config.max_iterations as u128 * flops(shape);
    let result = PerfResult {
        name: variant.name.clone(),
        n_runs,
        repetitions,
        max_iterations: config.max_iterations,
        iterations_to_converge: total_iterations / repetitions,
        flops: total_flops,
        ns_per_run,
        flops_per_ns: total_flops as f64 / ns_per_run,
    };
    info!(
        "{} n_runs={} ns_per_run={:.0}",
        result.name, result.n_runs, result.ns_per_run
    );
    let (trained, output) = last.ok_or_else(|| {
        BWError::InvalidShape(format!("no measured runs of {}", variant.name))
    })?;
    Ok((result, trained, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::mocks::*;
    use crate::registry::Registry;

    #[test]
    fn flops_of_reference_size() {
        let shape = Shape::new(16, 16, 16, 32).unwrap();
        // 9*32*16*256 - 5*16*256 + 256 + 8*32*16*16 + 3*256 + 16 + 2*16*16*16 + 2*32*16 + 16 + 256
        assert_eq!(flops(shape), 1_179_648 - 20_480 + 256 + 65_536 + 768 + 16 + 8_192 + 1_024 + 16 + 256);
    }
    #[test]
    fn perf_test_small() {
        let (params, obs) = mock_random_problem(2, 2, 3, 8, 0);
        let config = EmConfig::default().max_iterations(4);
        let registry = Registry::default();
        let options = PerfOptions {
            calibrate: false,
            repetitions: 2,
        };
        for variant in std::iter::once(registry.baseline()).chain(registry.variants().iter()) {
            let (r, trained, output) = perf_test(variant, &params, &obs, &config, options).unwrap();
            println!("{}", r);
            assert_eq!(r.n_runs, 1);
            assert_eq!(r.repetitions, 2);
            assert_eq!(r.iterations_to_converge, 0);
            assert_eq!(output.n_iterations(), 4);
            assert_eq!(trained.layout(), variant.layout);
            assert!(r.ns_per_run > 0.0);
        }
    }
}
