//!
//! Configuration of an EM run
//!
use super::stop::StopRuleConfig;
use crate::error::{BWError, Result};
use serde::{Deserialize, Serialize};

///
/// How the per-sequence E-step is scheduled
///
/// * `Sequential`: sequences are processed in order on the calling thread
/// * `Parallel`: sequences are processed by the rayon thread pool and their
///   expected counts reduced before re-estimation
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    Sequential,
    Parallel,
}

impl Default for Execution {
    fn default() -> Self {
        Execution::Sequential
    }
}

///
/// Parameters of EM
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmConfig {
    /// iteration budget (positive)
    pub max_iterations: usize,
    /// early stopping rule, checked after each iteration
    pub stop_rule: StopRuleConfig,
    pub execution: Execution,
    /// check the monotonicity of NLL after each iteration
    pub verify: bool,
}

impl Default for EmConfig {
    fn default() -> Self {
        EmConfig {
            max_iterations: 100,
            stop_rule: StopRuleConfig::FixedIterations,
            execution: Execution::Sequential,
            verify: false,
        }
    }
}

impl EmConfig {
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
    pub fn stop_rule(mut self, stop_rule: StopRuleConfig) -> Self {
        self.stop_rule = stop_rule;
        self
    }
    pub fn execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
    ///
    /// Check the config before running
    ///
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(BWError::InvalidShape(
                "max_iterations should be positive".to_string(),
            ));
        }
        if let StopRuleConfig::NllTolerance { tolerance } = self.stop_rule {
            if !(tolerance >= 0.0) {
                return Err(BWError::InvalidShape(format!(
                    "NLL tolerance {} should be non-negative",
                    tolerance
                )));
            }
        }
        Ok(())
    }
    ///
    /// Load a config from the json file.
    /// Missing fields take their default values.
    ///
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<EmConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: EmConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
