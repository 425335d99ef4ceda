//!
//! Posterior queries on a forward/backward pair and expected counts for the
//! Baum-Welch E-step.
//!
use crate::common::{Obs, ObsSeq};
use crate::error::Result;
use crate::hmm::backward::Backward;
use crate::hmm::forward::Forward;
use crate::params::HmmParams;
use crate::prob::Prob;
use itertools::izip;
use ndarray::{Array1, Array2};
use rayon::prelude::*;

///
/// Forward and backward tables of one sequence, queried together.
///
#[derive(Debug, Clone)]
pub struct HmmOutput {
    pub forward: Forward,
    pub backward: Backward,
}

impl HmmParams {
    ///
    /// Run forward and backward and pair the results.
    ///
    pub fn forward_backward(&self, obs: &[Obs]) -> Result<HmmOutput> {
        Ok(HmmOutput {
            forward: self.forward(obs)?,
            backward: self.backward(obs)?,
        })
    }
}

impl HmmOutput {
    ///
    /// Total sequence likelihood P(obs | model), taken from the forward side.
    ///
    pub fn full_prob(&self) -> Prob {
        self.forward.full_prob()
    }
    ///
    /// State posteriors gamma as a T x K matrix of plain probabilities
    ///
    /// ```text
    /// gamma[t][i] = alpha[t][i] * beta[t][i] / \sum_k alpha[t][k] * beta[t][k]
    /// ```
    ///
    /// Each row sums to 1. A row whose normalizer is zero (a sequence the
    /// model assigns no probability) stays all-zero instead of turning NaN.
    ///
    pub fn state_posteriors(&self) -> Array2<f64> {
        let tt = self.forward.len();
        if tt == 0 {
            return Array2::zeros((0, 0));
        }
        let k = self.forward.tables[0].len();
        let mut gamma = Array2::zeros((tt, k));
        for (t, (f, b)) in izip!(&self.forward.tables, &self.backward.tables).enumerate() {
            let row = Array1::from_shape_fn(k, |i| f[i] * b[i]);
            let total: Prob = row.sum();
            if !total.is_zero() {
                for i in 0..k {
                    gamma[[t, i]] = (row[i] / total).to_value();
                }
            }
        }
        gamma
    }
    ///
    /// Expected counts of one sequence for the Baum-Welch E-step.
    ///
    /// The gamma side fills initial/emission/occupancy expectations; the
    /// transition expectation comes from the pairwise posterior
    ///
    /// ```text
    /// xi[t][i][j] = alpha[t][i] * A[i][j] * B[j][obs[t+1]] * beta[t+1][j] / P(obs)
    /// ```
    ///
    /// summed over `t in [0, T-2]`.
    ///
    pub fn to_expected_counts(&self, params: &HmmParams, obs: &[Obs]) -> ExpectedCounts {
        let k = params.n_states();
        let tt = obs.len();
        let p = self.full_prob();
        let mut c = ExpectedCounts::zero(k, params.n_obs());
        c.n_seqs = 1;
        c.log_likelihood = p.to_log_value();
        let gamma = self.state_posteriors();
        for t in 0..tt {
            for i in 0..k {
                let g = gamma[[t, i]];
                c.emit[[i, obs[t]]] += g;
                c.occupancy[i] += g;
                if t + 1 < tt {
                    c.occupancy_trans[i] += g;
                }
            }
        }
        for i in 0..k {
            c.init[i] = gamma[[0, i]];
        }
        if !p.is_zero() {
            for t in 0..tt.saturating_sub(1) {
                let f = &self.forward.tables[t];
                let b = &self.backward.tables[t + 1];
                let o_next = obs[t + 1];
                for i in 0..k {
                    for j in 0..k {
                        let xi =
                            f[i] * params.trans()[[i, j]] * params.emit()[[j, o_next]] * b[j] / p;
                        c.trans[[i, j]] += xi.to_value();
                    }
                }
            }
        }
        c
    }
}

///
/// Sufficient statistics of one Baum-Welch iteration, summed over sequences.
///
/// Forms a monoid under `zero` and `+`, so a parallel E-step is a plain
/// reduction of per-sequence counts.
///
#[derive(Debug, Clone)]
pub struct ExpectedCounts {
    /// expected initial-state counts: \sum_seqs gamma[0][i]
    pub init: Array1<f64>,
    /// expected transition counts: \sum_seqs \sum_t xi[t][i][j]
    pub trans: Array2<f64>,
    /// expected emission counts: \sum_seqs \sum_t gamma[t][i] [obs[t]=o]
    pub emit: Array2<f64>,
    /// state occupancy over all steps: \sum_seqs \sum_t gamma[t][i]
    pub occupancy: Array1<f64>,
    /// state occupancy over all but the last step
    pub occupancy_trans: Array1<f64>,
    /// number of sequences aggregated
    pub n_seqs: usize,
    /// total log-likelihood of the aggregated sequences
    pub log_likelihood: f64,
}

impl ExpectedCounts {
    ///
    /// Empty accumulator with the right shapes.
    ///
    pub fn zero(n_states: usize, n_obs: usize) -> ExpectedCounts {
        ExpectedCounts {
            init: Array1::zeros(n_states),
            trans: Array2::zeros((n_states, n_states)),
            emit: Array2::zeros((n_states, n_obs)),
            occupancy: Array1::zeros(n_states),
            occupancy_trans: Array1::zeros(n_states),
            n_seqs: 0,
            log_likelihood: 0.0,
        }
    }
}

impl std::ops::Add for ExpectedCounts {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        ExpectedCounts {
            init: self.init + other.init,
            trans: self.trans + other.trans,
            emit: self.emit + other.emit,
            occupancy: self.occupancy + other.occupancy,
            occupancy_trans: self.occupancy_trans + other.occupancy_trans,
            n_seqs: self.n_seqs + other.n_seqs,
            log_likelihood: self.log_likelihood + other.log_likelihood,
        }
    }
}

impl HmmParams {
    ///
    /// E-step over a whole batch: per-sequence forward/backward runs in
    /// parallel, each worker building a private partial accumulator, combined
    /// by summation afterward.
    ///
    pub fn expected_counts_parallel(&self, seqs: &[ObsSeq]) -> Result<ExpectedCounts> {
        seqs.par_iter()
            .map(|seq| {
                let output = self.forward_backward(seq)?;
                Ok(output.to_expected_counts(self, seq))
            })
            .try_reduce(
                || ExpectedCounts::zero(self.n_states(), self.n_obs()),
                |a, b| Ok(a + b),
            )
    }
}
