//!
//! Baum-Welch training (EM for HMMs).
//!
//! ## E-step
//!
//! Expected initial/transition/emission counts from per-sequence
//! forward/backward runs, summed over the batch (`freq.rs`, parallel).
//!
//! ## M-step
//!
//! Closed-form re-estimation of (pi, A, B) from the counts. Rows are
//! renormalized exactly and a state with zero occupancy keeps its
//! previous-iteration row, so the simplex invariant survives every
//! iteration.
//!
use crate::common::ObsSeq;
use crate::error::{BktError, Result};
use crate::hmm::freq::ExpectedCounts;
use crate::params::HmmParams;
use crate::prob::Prob;
use derive_new::new;
use log::{debug, warn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

///
/// Tolerated log-likelihood decrease between iterations. EM guarantees a
/// non-decreasing likelihood, so anything beyond floating noise is an
/// implementation fault and aborts the run.
///
pub const LL_DECREASE_TOL: f64 = 1e-9;

///
/// Stopping policy for the EM loop.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, new)]
pub struct TrainConfig {
    /// iteration cap
    pub max_iter: usize,
    /// stop once the log-likelihood gain per iteration drops below this
    pub tol: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            max_iter: 100,
            tol: 1e-4,
        }
    }
}

///
/// Per-iteration total log-likelihoods of one fit, in iteration order.
///
/// Entry `t` is the likelihood of the whole batch under the parameters that
/// iteration `t`'s E-step used, so entry 0 scores the starting parameters.
/// On a run that stopped by converging, the last entry also scores the
/// returned parameters; a run stopped by the iteration cap has taken one
/// more M-step than the trace scores.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingTrace {
    pub log_likelihoods: Vec<f64>,
}

impl TrainingTrace {
    pub fn len(&self) -> usize {
        self.log_likelihoods.len()
    }
    pub fn is_empty(&self) -> bool {
        self.log_likelihoods.is_empty()
    }
    pub fn last(&self) -> Option<f64> {
        self.log_likelihoods.last().copied()
    }
    ///
    /// True if no entry drops more than `tol` below its predecessor.
    ///
    pub fn is_non_decreasing(&self, tol: f64) -> bool {
        self.log_likelihoods
            .windows(2)
            .all(|w| w[1] >= w[0] - tol)
    }
}

impl std::fmt::Display for TrainingTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (i, ll) in self.log_likelihoods.iter().enumerate() {
            writeln!(f, "{}\t{}", i, ll)?;
        }
        Ok(())
    }
}

///
/// Run Baum-Welch from `params` on the batch until the likelihood gain drops
/// below `config.tol` or `config.max_iter` iterations are spent, whichever
/// comes first. Exhausting the cap is not an error; the trace tells the
/// caller how far the run got.
///
/// Returns the re-estimated parameters together with the trace.
///
pub fn train(
    params: &HmmParams,
    seqs: &[ObsSeq],
    config: &TrainConfig,
) -> Result<(HmmParams, TrainingTrace)> {
    if seqs.is_empty() {
        return Err(BktError::NoTrainingData);
    }
    for seq in seqs {
        params.validate_sequence(seq)?;
    }
    let mut params = params.clone();
    let mut lls: Vec<f64> = Vec::new();
    for iteration in 0..config.max_iter {
        let counts = params.expected_counts_parallel(seqs)?;
        let ll = counts.log_likelihood;
        debug!("em iteration={} log_likelihood={}", iteration, ll);
        if let Some(&prev) = lls.last() {
            if ll < prev - LL_DECREASE_TOL {
                return Err(BktError::NumericalInstability {
                    iteration,
                    prev,
                    curr: ll,
                });
            }
            if ll - prev < config.tol {
                // converged; keep the parameters this likelihood belongs to
                lls.push(ll);
                break;
            }
        }
        lls.push(ll);
        params = m_step(&params, &counts)?;
    }
    Ok((params, TrainingTrace { log_likelihoods: lls }))
}

///
/// Closed-form M-step
///
/// ```text
/// pi[i]   = init[i] / n_seqs
/// A[i][j] = trans[i][j] / occupancy of i over all but last step
/// B[i][o] = emit[i][o] / occupancy of i
/// ```
///
/// Each re-estimated row is divided by its own count total, which equals the
/// occupancy normalizer up to floating noise, so rows sum to 1 exactly.
///
fn m_step(params: &HmmParams, counts: &ExpectedCounts) -> Result<HmmParams> {
    let k = params.n_states();
    let init_total: f64 = counts.init.sum();
    let init = if init_total > 0.0 {
        Array1::from_shape_fn(k, |i| Prob::from_prob(counts.init[i] / init_total))
    } else {
        warn!("no initial-state mass in the batch, keeping previous pi");
        params.init().clone()
    };
    let trans = reestimate_rows(
        &counts.trans,
        &counts.occupancy_trans,
        params.trans(),
        "trans",
    );
    let emit = reestimate_rows(&counts.emit, &counts.occupancy, params.emit(), "emit");
    HmmParams::new(init, trans, emit)
}

///
/// Normalize each count row into a distribution; a row whose state was never
/// occupied keeps the previous estimates unchanged.
///
fn reestimate_rows(
    counts: &Array2<f64>,
    occupancy: &Array1<f64>,
    prev: &Array2<Prob>,
    what: &str,
) -> Array2<Prob> {
    let (k, m) = counts.dim();
    let mut out = Array2::from_elem((k, m), Prob::zero());
    for i in 0..k {
        let total: f64 = counts.row(i).sum();
        if occupancy[i] > 0.0 && total > 0.0 {
            for j in 0..m {
                out[[i, j]] = Prob::from_prob(counts[[i, j]] / total);
            }
        } else {
            warn!("{} row {} has zero occupancy, keeping previous estimates", what, i);
            for j in 0..m {
                out[[i, j]] = prev[[i, j]];
            }
        }
    }
    out
}
