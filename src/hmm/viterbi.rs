//!
//! Viterbi algorithm: the single most probable hidden-state path.
//!
//! This maximizes the joint P(path, obs | model), which is not the same as
//! picking the per-step argmax of the state posteriors.
//!
use crate::common::{Obs, StateId};
use crate::error::Result;
use crate::params::HmmParams;
use crate::prob::Prob;
use derive_new::new;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

///
/// A decoded hidden-state path and its joint log-probability score.
///
/// `states.len()` always equals the length of the decoded observation
/// sequence.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct DecodedPath {
    pub states: Vec<StateId>,
    pub score: Prob,
}

impl DecodedPath {
    pub fn len(&self) -> usize {
        self.states.len()
    }
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl std::fmt::Display for DecodedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let path: Vec<String> = self.states.iter().map(|s| s.to_string()).collect();
        write!(f, "{}\t{}", path.join(","), self.score)
    }
}

impl HmmParams {
    ///
    /// Run Viterbi algorithm over the observation sequence
    ///
    /// ```text
    /// delta[0][i] = pi[i] * B[i][obs[0]]
    /// delta[t][i] = B[i][obs[t]] * max_j delta[t-1][j] * A[j][i]
    /// psi[t][i]   = argmax_j delta[t-1][j] * A[j][i]
    /// ```
    ///
    /// in log-space, then backtracks from `argmax_i delta[T-1][i]`. Ties are
    /// broken toward the lowest state index, both in `psi` and at the
    /// terminal, so decoding is deterministic.
    ///
    pub fn viterbi(&self, obs: &[Obs]) -> Result<DecodedPath> {
        self.validate_sequence(obs)?;
        let k = self.n_states();
        let tt = obs.len();
        let mut deltas: Vec<Array1<Prob>> = Vec::with_capacity(tt);
        // psis[t-1][i] = best predecessor of state i at step t
        let mut psis: Vec<Vec<StateId>> = Vec::with_capacity(tt.saturating_sub(1));
        deltas.push(Array1::from_shape_fn(k, |i| {
            self.init()[i] * self.emit()[[i, obs[0]]]
        }));
        for t in 1..tt {
            let o = obs[t];
            let (delta, psi) = {
                let prev = &deltas[t - 1];
                let mut delta = Array1::from_elem(k, Prob::zero());
                let mut psi = vec![0; k];
                for i in 0..k {
                    let mut best = Prob::zero();
                    let mut best_j = 0;
                    for j in 0..k {
                        let cand = prev[j] * self.trans()[[j, i]];
                        if cand > best {
                            best = cand;
                            best_j = j;
                        }
                    }
                    delta[i] = best * self.emit()[[i, o]];
                    psi[i] = best_j;
                }
                (delta, psi)
            };
            deltas.push(delta);
            psis.push(psi);
        }
        // terminal state, lowest index on ties
        let last = &deltas[tt - 1];
        let mut terminal = 0;
        for i in 1..k {
            if last[i] > last[terminal] {
                terminal = i;
            }
        }
        let score = last[terminal];
        // follow the backpointers from the terminal to the start
        let mut states = vec![0; tt];
        states[tt - 1] = terminal;
        for t in (1..tt).rev() {
            states[t - 1] = psis[t - 1][states[t]];
        }
        Ok(DecodedPath { states, score })
    }
}
