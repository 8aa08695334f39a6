//!
//! Mock models and observations for testing
//!
use super::obs::ObservationSet;
use super::params::ModelParameters;

///
/// All distributions are uniform
///
pub fn mock_uniform(n: usize, m: usize) -> ModelParameters {
    ModelParameters::uniform(n, m)
}

///
/// Small asymmetric 2-state 2-symbol model
///
/// ```text
/// pi = [0.6, 0.4]
/// A  = [[0.7, 0.3], [0.4, 0.6]]
/// E  = [[0.9, 0.1], [0.2, 0.8]]
/// ```
///
pub fn mock_two_state() -> ModelParameters {
    ModelParameters::from_rows(
        &[0.6, 0.4],
        &[vec![0.7, 0.3], vec![0.4, 0.6]],
        &[vec![0.9, 0.1], vec![0.2, 0.8]],
    )
    .unwrap()
}

///
/// Random model from the seed
///
pub fn mock_random(n: usize, m: usize, seed: u64) -> ModelParameters {
    ModelParameters::random(n, m, seed).unwrap()
}

///
/// Random model and random observations of the given shape
///
pub fn mock_random_problem(
    k: usize,
    n: usize,
    m: usize,
    t: usize,
    seed: u64,
) -> (ModelParameters, ObservationSet) {
    let params = ModelParameters::random(n, m, seed).unwrap();
    let obs = ObservationSet::random(k, t, m, seed.wrapping_add(1)).unwrap();
    (params, obs)
}
