//!
//! Stopping rules of EM iterations
//!
//! A stop rule is a predicate over the negative log-likelihood trace,
//! checked after every iteration. The iteration budget is enforced by
//! the driver independently of the rule.
//!
use serde::{Deserialize, Serialize};

///
/// Predicate deciding whether EM has converged, given the NLL trace so far.
///
pub trait StopRule {
    fn is_converged(&self, trace: &[f64]) -> bool;
}

/// any closure over the trace is a stop rule
impl<F> StopRule for F
where
    F: Fn(&[f64]) -> bool,
{
    fn is_converged(&self, trace: &[f64]) -> bool {
        self(trace)
    }
}

///
/// Never stops early; run until the iteration budget is exhausted.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedIterations;

impl StopRule for FixedIterations {
    fn is_converged(&self, _trace: &[f64]) -> bool {
        false
    }
}

///
/// Converged when the change of NLL in the last iteration is below `tolerance`.
///
#[derive(Debug, Clone, Copy)]
pub struct NllTolerance {
    pub tolerance: f64,
}

impl StopRule for NllTolerance {
    fn is_converged(&self, trace: &[f64]) -> bool {
        match trace {
            [.., prev, last] => (prev - last).abs() < self.tolerance,
            _ => false,
        }
    }
}

///
/// Serializable selection of a built-in stop rule
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopRuleConfig {
    FixedIterations,
    NllTolerance { tolerance: f64 },
}

impl Default for StopRuleConfig {
    fn default() -> Self {
        StopRuleConfig::FixedIterations
    }
}

impl StopRuleConfig {
    pub fn to_rule(&self) -> Box<dyn StopRule> {
        match *self {
            StopRuleConfig::FixedIterations => Box::new(FixedIterations),
            StopRuleConfig::NllTolerance { tolerance } => Box::new(NllTolerance { tolerance }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_fixed_never_converges() {
        let rule = FixedIterations;
        assert!(!rule.is_converged(&[]));
        assert!(!rule.is_converged(&[3.0, 3.0, 3.0]));
    }
    #[test]
    fn stop_nll_tolerance() {
        let rule = NllTolerance { tolerance: 1e-3 };
        assert!(!rule.is_converged(&[]));
        assert!(!rule.is_converged(&[10.0]));
        assert!(!rule.is_converged(&[10.0, 9.0]));
        assert!(rule.is_converged(&[10.0, 9.0, 8.9999]));
    }
    #[test]
    fn stop_closure() {
        let rule = |trace: &[f64]| trace.len() >= 2;
        assert!(!rule.is_converged(&[1.0]));
        assert!(rule.is_converged(&[1.0, 0.5]));
    }
    #[test]
    fn stop_config_json() {
        let c: StopRuleConfig =
            serde_json::from_str(r#"{"type":"nll_tolerance","tolerance":0.01}"#).unwrap();
        assert_eq!(c, StopRuleConfig::NllTolerance { tolerance: 0.01 });
        assert!(c.to_rule().is_converged(&[1.0, 0.995]));
        let c: StopRuleConfig = serde_json::from_str(r#"{"type":"fixed_iterations"}"#).unwrap();
        assert_eq!(c, StopRuleConfig::FixedIterations);
    }
}
