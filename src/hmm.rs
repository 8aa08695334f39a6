//!
//! Discrete-emission HMM calculation with scaled Forward/Backward
//!
//! # Overview of calculation
//!
//! x = x[0],...,x[T-1] : Emissions (symbols) of a single sequence of length T
//!
//! Forward (scaled)
//! a[t][n]
//!  = P(emits x[0..=t] and in state n at t) / (c[0] c[1] ... c[t])
//!
//! c[t] = sum_n a'[t][n] (the sum before normalization)
//!  so that `sum_n a[t][n] = 1` for every t and `P(x) = prod_t c[t]`.
//!
//! Backward (scaled by the same c)
//! b[t][n]
//!  = P(emits x[t+1..] | in state n at t) / (c[t] c[t+1] ... c[T-1])
//!
//! Posterior
//! g[t][n] = a[t][n] b[t][n] c[t]
//!         = P(in state n at t | x)
//! s[t][n0][n1] = a[t][n0] A[n0][n1] E[n1][x[t+1]] b[t+1][n1]
//!         = P(in state n0 at t and n1 at t+1 | x)
//!
//! Re-estimation
//! pi[n]     = 1/K sum_k g_k[0][n]
//! A[n0][n1] = sum_k sum_{t<T-1} s_k[t][n0][n1] / sum_k sum_{t<T-1} g_k[t][n0]
//! E[n][m]   = sum_k sum_{t: x_k[t]=m} g_k[t][n] / sum_k sum_t g_k[t][n]
//!
pub mod backward;
pub mod forward;
pub mod mocks;
pub mod obs;
pub mod params;
pub mod posterior;
pub mod reestimate;
pub mod table;
pub mod tests;

pub use obs::ObservationSet;
pub use params::{EmissionLayout, ModelParameters};
pub use reestimate::ExpectedCounts;
pub use table::{SeqTable, Tables};
