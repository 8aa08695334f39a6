//!
//! Table definitions
//!
//! ## SeqTable
//!
//! scratch tables of a single sequence, for each (t, state)
//!
//! `alpha[t][n]`, `beta[t][n]`, `gamma[t][n]`, `sigma[t][n0][n1]`, `scale[t]`
//!
use crate::common::{Prob, Shape};

///
/// Forward/Backward/Posterior tables of a single sequence of length T
/// with N hidden states.
///
/// All 2D/3D tables are flattened in row-major order.
///
#[derive(Debug, Clone)]
pub struct SeqTable {
    n: usize,
    t: usize,
    /// scaled forward probs `alpha[t*N + n]`
    pub alpha: Vec<Prob>,
    /// scaled backward probs `beta[t*N + n]`
    pub beta: Vec<Prob>,
    /// state posterior `gamma[t*N + n]`
    pub gamma: Vec<Prob>,
    /// transition posterior `sigma[(t*N + n0)*N + n1]` for `t < T-1`
    pub sigma: Vec<Prob>,
    /// scaling factor `scale[t]` (the sum of forward probs before normalization)
    pub scale: Vec<Prob>,
}

/// Constructors
impl SeqTable {
    pub fn new(n: usize, t: usize) -> SeqTable {
        SeqTable {
            n,
            t,
            alpha: vec![0.0; t * n],
            beta: vec![0.0; t * n],
            gamma: vec![0.0; t * n],
            sigma: vec![0.0; t.saturating_sub(1) * n * n],
            scale: vec![0.0; t],
        }
    }
}

/// Accessors
impl SeqTable {
    /// number of hidden states
    pub fn n_states(&self) -> usize {
        self.n
    }
    /// length of the sequence
    pub fn len(&self) -> usize {
        self.t
    }
    /// `alpha[t][..]`
    pub fn alpha_at(&self, t: usize) -> &[Prob] {
        &self.alpha[t * self.n..(t + 1) * self.n]
    }
    /// `beta[t][..]`
    pub fn beta_at(&self, t: usize) -> &[Prob] {
        &self.beta[t * self.n..(t + 1) * self.n]
    }
    /// `gamma[t][..]`
    pub fn gamma_at(&self, t: usize) -> &[Prob] {
        &self.gamma[t * self.n..(t + 1) * self.n]
    }
    /// `sigma[t][..][..]` as a flat `N*N` slice
    pub fn sigma_at(&self, t: usize) -> &[Prob] {
        let nn = self.n * self.n;
        &self.sigma[t * nn..(t + 1) * nn]
    }
    ///
    /// `sum_n gamma[t][n]`, which should be 1.
    ///
    pub fn gamma_sum(&self, t: usize) -> Prob {
        self.gamma_at(t).iter().sum()
    }
    ///
    /// `sum_{n0,n1} sigma[t][n0][n1]`, which should be 1.
    ///
    pub fn sigma_sum(&self, t: usize) -> Prob {
        self.sigma_at(t).iter().sum()
    }
    ///
    /// Log-likelihood of the sequence `log P(x) = sum_t log c[t]`
    /// under the parameters used in the last forward run.
    ///
    pub fn log_likelihood(&self) -> f64 {
        self.scale.iter().map(|c| c.ln()).sum()
    }
}

impl std::fmt::Display for SeqTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // Header
        writeln!(f, "t\tscale\tn\talpha\tbeta\tgamma")?;
        for t in 0..self.t {
            for n in 0..self.n {
                writeln!(
                    f,
                    "{}\t{:.4}\t{}\t{:.4}\t{:.4}\t{:.4}",
                    t,
                    self.scale[t],
                    n,
                    self.alpha[t * self.n + n],
                    self.beta[t * self.n + n],
                    self.gamma[t * self.n + n]
                )?;
            }
        }
        Ok(())
    }
}

///
/// Scratch tables for all K sequences.
///
/// Allocated once per training run and reused across iterations.
/// Each sequence owns its own `SeqTable`, so parallel workers
/// never write the same cell.
///
#[derive(Debug, Clone)]
pub struct Tables {
    pub tables: Vec<SeqTable>,
}

impl Tables {
    pub fn new(shape: Shape) -> Tables {
        Tables {
            tables: (0..shape.k).map(|_| SeqTable::new(shape.n, shape.t)).collect(),
        }
    }
    /// number of sequences
    pub fn len(&self) -> usize {
        self.tables.len()
    }
    /// table of the `k`-th sequence
    pub fn table(&self, k: usize) -> &SeqTable {
        &self.tables[k]
    }
    ///
    /// Negative log-likelihood of all sequences
    /// `-sum_k sum_t log scale[k][t]`
    ///
    pub fn neg_log_likelihood(&self) -> f64 {
        -self.tables.iter().map(|t| t.log_likelihood()).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sizes() {
        let t = SeqTable::new(3, 5);
        assert_eq!(t.alpha.len(), 15);
        assert_eq!(t.sigma.len(), 4 * 9);
        assert_eq!(t.scale.len(), 5);
        assert_eq!(t.alpha_at(4).len(), 3);
        assert_eq!(t.sigma_at(3).len(), 9);
        let shape = Shape::new(4, 3, 2, 5).unwrap();
        let ts = Tables::new(shape);
        assert_eq!(ts.len(), 4);
        assert_eq!(ts.table(3).len(), 5);
    }
    #[test]
    fn table_nll_from_scale() {
        let shape = Shape::new(2, 1, 1, 2).unwrap();
        let mut ts = Tables::new(shape);
        ts.tables[0].scale = vec![0.5, 0.5];
        ts.tables[1].scale = vec![0.25, 1.0];
        assert_abs_diff_eq!(ts.neg_log_likelihood(), 4.0 * 2f64.ln(), epsilon = 1e-12);
    }
}
