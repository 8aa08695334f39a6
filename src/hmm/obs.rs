//!
//! ObservationSet: K observed sequences of length T
//!
use crate::common::Symbol;
use crate::error::{BWError, Result};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;

///
/// K independent sequences, each of length T, stored contiguously.
///
/// `data[k*T + t]` is the symbol observed at time `t` in sequence `k`.
/// Every symbol is in `[0, M)`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSet {
    k: usize,
    t: usize,
    m: usize,
    data: Vec<Symbol>,
}

impl ObservationSet {
    ///
    /// Create an observation set, checking the length and symbol range.
    ///
    pub fn new(k: usize, t: usize, m: usize, data: Vec<Symbol>) -> Result<ObservationSet> {
        check_dims(k, t, m)?;
        if data.len() != k * t {
            return Err(BWError::InvalidShape(format!(
                "observations have {} symbols (expected K*T={})",
                data.len(),
                k * t
            )));
        }
        if let Some(i) = data.iter().position(|&x| x >= m) {
            return Err(BWError::InvalidShape(format!(
                "observation {} of sequence {} at time {} is out of range [0, {})",
                data[i],
                i / t,
                i % t,
                m
            )));
        }
        Ok(ObservationSet { k, t, m, data })
    }
    ///
    /// Create from a list of sequences of equal length.
    ///
    pub fn from_sequences(m: usize, seqs: &[Vec<Symbol>]) -> Result<ObservationSet> {
        let t = seqs.first().map_or(0, |seq| seq.len());
        if seqs.iter().any(|seq| seq.len() != t) {
            return Err(BWError::InvalidShape(
                "sequences have different lengths".to_string(),
            ));
        }
        ObservationSet::new(seqs.len(), t, m, seqs.concat())
    }
    ///
    /// Random symbols drawn uniformly from `[0, M)`.
    ///
    pub fn random(k: usize, t: usize, m: usize, seed: u64) -> Result<ObservationSet> {
        check_dims(k, t, m)?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let data = (0..k * t).map(|_| rng.gen_range(0..m)).collect();
        Ok(ObservationSet { k, t, m, data })
    }
    /// number of sequences `K`
    pub fn n_sequences(&self) -> usize {
        self.k
    }
    /// length of each sequence `T`
    pub fn len(&self) -> usize {
        self.t
    }
    /// size of the alphabet `M`
    pub fn n_symbols(&self) -> usize {
        self.m
    }
    /// the `k`-th sequence
    pub fn sequence(&self, k: usize) -> &[Symbol] {
        &self.data[k * self.t..(k + 1) * self.t]
    }
    /// iterator over all sequences
    pub fn sequences(&self) -> std::slice::Chunks<'_, Symbol> {
        self.data.chunks(self.t)
    }
    /// parallel iterator over all sequences
    pub fn par_sequences(&self) -> rayon::slice::Chunks<'_, Symbol> {
        self.data.par_chunks(self.t)
    }
    ///
    /// Frequency of each symbol over all sequences
    ///
    pub fn symbol_frequencies(&self) -> Vec<f64> {
        let mut counts = vec![0.0; self.m];
        for &x in self.data.iter() {
            counts[x] += 1.0;
        }
        let total = self.data.len() as f64;
        counts.into_iter().map(|c| c / total).collect()
    }
}

fn check_dims(k: usize, t: usize, m: usize) -> Result<()> {
    if k == 0 || t == 0 || m == 0 {
        return Err(BWError::InvalidShape(format!(
            "K={} T={} M={} should be non-zero",
            k, t, m
        )));
    }
    Ok(())
}
