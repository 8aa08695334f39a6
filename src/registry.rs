//!
//! Registry of Baum-Welch implementation variants
//!
//! A variant is a named training function plus the emission layout it
//! expects. The registry is an explicit value passed to the benchmark,
//! so callers can build their own set of variants.
//!
use crate::em::{self, EmConfig, EmOutput, Execution};
use crate::error::Result;
use crate::hmm::{EmissionLayout, ModelParameters, ObservationSet};

/// Training function of a variant
pub type TrainFn = fn(&mut ModelParameters, &ObservationSet, &EmConfig) -> Result<EmOutput>;

///
/// Named implementation variant
///
#[derive(Clone)]
pub struct Variant {
    pub name: String,
    pub description: String,
    /// emission layout the parameters are converted to before running
    pub layout: EmissionLayout,
    pub run: TrainFn,
}

impl Variant {
    pub fn new(name: &str, description: &str, layout: EmissionLayout, run: TrainFn) -> Variant {
        Variant {
            name: name.to_string(),
            description: description.to_string(),
            layout,
            run,
        }
    }
    ///
    /// Convert the parameters into the layout of this variant and train.
    ///
    pub fn train(
        &self,
        params: &mut ModelParameters,
        obs: &ObservationSet,
        config: &EmConfig,
    ) -> Result<EmOutput> {
        params.set_layout(self.layout);
        (self.run)(params, obs, config)
    }
}

impl std::fmt::Debug for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Variant")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("layout", &self.layout)
            .finish()
    }
}

///
/// Baseline variant and the other variants compared against it.
///
#[derive(Debug, Clone)]
pub struct Registry {
    baseline: Variant,
    variants: Vec<Variant>,
}

impl Registry {
    pub fn new(baseline: Variant) -> Registry {
        Registry {
            baseline,
            variants: Vec::new(),
        }
    }
    ///
    /// Add a variant. A variant with the same name is replaced.
    ///
    pub fn register(&mut self, variant: Variant) {
        self.variants.retain(|v| v.name != variant.name);
        self.variants.push(variant);
    }
    pub fn baseline(&self) -> &Variant {
        &self.baseline
    }
    /// registered variants (baseline excluded) in registration order
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }
    pub fn get(&self, name: &str) -> Option<&Variant> {
        if self.baseline.name == name {
            Some(&self.baseline)
        } else {
            self.variants.iter().find(|v| v.name == name)
        }
    }
    ///
    /// Variants to run for the selected names.
    /// An empty selection means all variants. The baseline is not included.
    ///
    pub fn select(&self, names: &[String]) -> Vec<&Variant> {
        self.variants
            .iter()
            .filter(|v| names.is_empty() || names.contains(&v.name))
            .collect()
    }
    /// names of all variants including the baseline
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(&self.baseline)
            .chain(self.variants.iter())
            .map(|v| v.name.as_str())
            .collect()
    }
}

fn train_sequential(
    params: &mut ModelParameters,
    obs: &ObservationSet,
    config: &EmConfig,
) -> Result<EmOutput> {
    em::train(
        params,
        obs,
        &config.clone().execution(Execution::Sequential),
    )
}

fn train_parallel(
    params: &mut ModelParameters,
    obs: &ObservationSet,
    config: &EmConfig,
) -> Result<EmOutput> {
    em::train(params, obs, &config.clone().execution(Execution::Parallel))
}

impl Default for Registry {
    ///
    /// * `baseline`: sequential, row-major emission
    /// * `parallel`: sequences processed on the rayon thread pool
    /// * `transposed`: sequential, column-major emission
    ///
    fn default() -> Self {
        let mut registry = Registry::new(Variant::new(
            "baseline",
            "sequential forward/backward with row-major emission",
            EmissionLayout::RowMajor,
            train_sequential,
        ));
        registry.register(Variant::new(
            "parallel",
            "sequences fanned out on the thread pool, counts reduced per iteration",
            EmissionLayout::RowMajor,
            train_parallel,
        ));
        registry.register(Variant::new(
            "transposed",
            "sequential with column-major (transposed) emission storage",
            EmissionLayout::ColumnMajor,
            train_sequential,
        ));
        registry
    }
}
