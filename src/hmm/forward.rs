//!
//! Forward algorithm definitions
//!
use crate::common::Obs;
use crate::error::Result;
use crate::params::HmmParams;
use crate::prob::Prob;
use ndarray::Array1;

///
/// Result of the forward algorithm: one table per emission position.
///
/// `tables[t][i]` = alpha[t][i] = P(emits `obs[0..=t]` and state_t = i)
///
#[derive(Debug, Clone)]
pub struct Forward {
    pub tables: Vec<Array1<Prob>>,
}

impl Forward {
    ///
    /// Total sequence likelihood P(obs | model), the sum of the last table.
    ///
    pub fn full_prob(&self) -> Prob {
        match self.tables.last() {
            Some(table) => table.sum(),
            None => Prob::one(),
        }
    }
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
    /// Run Forward algorithm over the observation sequence
    ///
    /// ```text
    /// alpha[0][i] = pi[i] * B[i][obs[0]]
    /// alpha[t][i] = B[i][obs[t]] * \sum_j alpha[t-1][j] * A[j][i]
    /// ```
    ///
    /// Sums and products run in log-space `Prob`, so long sequences cannot
    /// underflow the way they would in plain probability space.
    ///
    pub fn forward(&self, obs: &[Obs]) -> Result<Forward> {
        self.validate_sequence(obs)?;
        let tables = obs
            .iter()
            .fold(Vec::with_capacity(obs.len()), |mut tables, &o| {
                let table = match tables.last() {
                    None => self.f_init(o),
                    Some(prev) => self.f_step(o, prev),
                };
                tables.push(table);
                tables
            });
        Ok(Forward { tables })
    }
    ///
    /// Initial forward table: the initial distribution weighted by the first
    /// emission.
    ///
    fn f_init(&self, o: Obs) -> Array1<Prob> {
        Array1::from_shape_fn(self.n_states(), |i| self.init()[i] * self.emit()[[i, o]])
    }
    ///
    /// One forward step: sum over predecessor states, then emit.
    ///
    fn f_step(&self, o: Obs, prev: &Array1<Prob>) -> Array1<Prob> {
        let k = self.n_states();
        Array1::from_shape_fn(k, |i| {
            let s: Prob = (0..k).map(|j| prev[j] * self.trans()[[j, i]]).sum();
            s * self.emit()[[i, o]]
        })
    }
}
