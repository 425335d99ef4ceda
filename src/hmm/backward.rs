//!
//! Backward algorithm definitions
//!
use crate::common::Obs;
use crate::error::Result;
use crate::params::HmmParams;
use crate::prob::Prob;
use ndarray::Array1;

///
/// Result of the backward algorithm, tables ordered along the sequence.
///
/// `tables[t][i]` = beta[t][i] = P(emits `obs[t+1..]` | state_t = i)
///
#[derive(Debug, Clone)]
pub struct Backward {
    pub tables: Vec<Array1<Prob>>,
}

impl Backward {
    ///
    /// Number of emission positions T
    ///
    pub fn len(&self) -> usize {
        self.tables.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl HmmParams {
    ///
    /// Run Backward algorithm over the observation sequence
    ///
    /// ```text
    /// beta[T-1][i] = 1
    /// beta[t][i]   = \sum_j A[i][j] * B[j][obs[t+1]] * beta[t+1][j]
    /// ```
    ///
    /// The tables are computed from the tail and reversed at the end, so
    /// `tables[t]` lines up with `obs[t]` like the forward tables do.
    ///
    pub fn backward(&self, obs: &[Obs]) -> Result<Backward> {
        self.validate_sequence(obs)?;
        let mut tables = Vec::with_capacity(obs.len());
        tables.push(self.b_init());
        // feed the emissions backward; the step into position t consumes obs[t+1]
        for &o in obs[1..].iter().rev() {
            let table = {
                let next = &tables[tables.len() - 1];
                self.b_step(o, next)
            };
            tables.push(table);
        }
        tables.reverse();
        Ok(Backward { tables })
    }
    ///
    /// Last backward table: beta[T-1][i] = 1 for every state.
    ///
    fn b_init(&self) -> Array1<Prob> {
        Array1::from_elem(self.n_states(), Prob::one())
    }
    ///
    /// One backward step: transition, emit the next observation, continue.
    ///
    fn b_step(&self, o_next: Obs, next: &Array1<Prob>) -> Array1<Prob> {
        let k = self.n_states();
        Array1::from_shape_fn(k, |i| {
            (0..k)
                .map(|j| self.trans()[[i, j]] * self.emit()[[j, o_next]] * next[j])
                .sum()
        })
    }
}
