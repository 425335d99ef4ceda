//!
//! `BktModel`: the public facade of the engine
//!
//! Owns the current `HmmParams` and composes training (`em`), decoding
//! (`hmm::viterbi`) and the query surface (`score` / `posteriors` /
//! `sample`) behind one struct. Parameters are replaced wholesale by `fit`,
//! so a `&self` reader always observes a complete parameter set.
//!
use crate::common::{round_to, Obs, ObsSeq, StateId};
use crate::em::{train, TrainConfig, TrainingTrace};
use crate::error::{BktError, Result};
use crate::hmm::DecodedPath;
use crate::params::HmmParams;
use log::info;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

///
/// Seed of the default random initializer.
///
pub const DEFAULT_SEED: u64 = 0;

///
/// Knowledge-tracing model over discrete observations.
///
/// Construct with the state/observation counts, optionally configure with
/// the `with_*` builders, then `fit` on a batch of sequences and query.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BktModel {
    n_states: usize,
    n_obs: usize,
    config: TrainConfig,
    seed: u64,
    params: HmmParams,
    trained: bool,
}

impl BktModel {
    ///
    /// Untrained model with `n_states` hidden states and `n_obs` observation
    /// symbols, starting from seed-0 random parameters.
    ///
    pub fn new(n_states: usize, n_obs: usize) -> Result<BktModel> {
        let params = HmmParams::random(n_states, n_obs, DEFAULT_SEED)?;
        Ok(BktModel {
            n_states,
            n_obs,
            config: TrainConfig::default(),
            seed: DEFAULT_SEED,
            params,
            trained: false,
        })
    }
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.config.tol = tol;
        self
    }
    ///
    /// Re-draw the starting parameters from `seed`. Resets the model to its
    /// untrained state, so call this before `fit` (and before `with_params`,
    /// which it would otherwise overwrite).
    ///
    pub fn with_seed(mut self, seed: u64) -> Result<Self> {
        self.seed = seed;
        self.params = HmmParams::random(self.n_states, self.n_obs, seed)?;
        self.trained = false;
        Ok(self)
    }
    ///
    /// Start from explicit parameters instead of random ones. The model
    /// stays untrained until `fit`.
    ///
    pub fn with_params(mut self, params: HmmParams) -> Result<Self> {
        if params.n_states() != self.n_states || params.n_obs() != self.n_obs {
            return Err(BktError::InvalidParameters {
                detail: format!(
                    "params shape ({} states, {} obs) does not match model ({} states, {} obs)",
                    params.n_states(),
                    params.n_obs(),
                    self.n_states,
                    self.n_obs
                ),
            });
        }
        self.params = params;
        self.trained = false;
        Ok(self)
    }
    pub fn n_states(&self) -> usize {
        self.n_states
    }
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }
    pub fn is_trained(&self) -> bool {
        self.trained
    }
    ///
    /// Current parameters at full precision.
    ///
    pub fn params(&self) -> &HmmParams {
        &self.params
    }
    ///
    /// Run Baum-Welch on the batch, replace the stored parameters with the
    /// fitted ones and return the per-iteration log-likelihood trace.
    ///
    /// A second `fit` warm-starts from the previously fitted parameters.
    ///
    pub fn fit(&mut self, seqs: &[ObsSeq]) -> Result<TrainingTrace> {
        let (params, trace) = train(&self.params, seqs, &self.config)?;
        self.params = params;
        self.trained = true;
        info!(
            "fit n_seqs={} iterations={} log_likelihood={}",
            seqs.len(),
            trace.len(),
            trace.last().unwrap_or(f64::NEG_INFINITY),
        );
        Ok(trace)
    }
    ///
    /// Most likely hidden state path for the sequence (Viterbi).
    ///
    /// Works on an untrained model too, decoding under the starting
    /// parameters.
    ///
    pub fn predict(&self, obs: &[Obs]) -> Result<DecodedPath> {
        self.params.viterbi(obs)
    }
    ///
    /// Total log-likelihood of the sequence under the current parameters.
    ///
    pub fn score(&self, obs: &[Obs]) -> Result<f64> {
        let forward = self.params.forward(obs)?;
        Ok(forward.full_prob().to_log_value())
    }
    ///
    /// Per-timestep state posteriors (T x K, rows summing to 1). For the
    /// classic two-state model, column 1 is the mastery curve.
    ///
    pub fn posteriors(&self, obs: &[Obs]) -> Result<Array2<f64>> {
        let output = self.params.forward_backward(obs)?;
        Ok(output.state_posteriors())
    }
    ///
    /// Sample a `len`-step state path and observation sequence from the
    /// current parameters with a seeded generator.
    ///
    pub fn sample(&self, len: usize, seed: u64) -> Result<(Vec<StateId>, ObsSeq)> {
        let history = self.params.sample(len, seed)?;
        Ok((history.states(), history.observations()))
    }
    ///
    /// Fitted (pi, A, B) rounded to 2 decimal places, the precision the
    /// reporting side consumes. Full-precision values stay internal; see
    /// [`BktModel::params`].
    ///
    pub fn model_params(&self) -> Result<(Array1<f64>, Array2<f64>, Array2<f64>)> {
        if !self.trained {
            return Err(BktError::NotFitted);
        }
        let (init, trans, emit) = self.params.to_dense();
        Ok((
            init.mapv(|x| round_to(x, 2)),
            trans.mapv(|x| round_to(x, 2)),
            emit.mapv(|x| round_to(x, 2)),
        ))
    }
}

///
/// The classic BKT shape: two hidden states over correct/incorrect answers.
///
impl Default for BktModel {
    fn default() -> Self {
        BktModel::new(2, 2).unwrap()
    }
}

impl std::fmt::Display for BktModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "trained={}", self.trained)?;
        write!(f, "{}", self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::mock_bkt_params;

    #[test]
    fn model_params_is_gated_until_fit() {
        let model = BktModel::new(2, 2).unwrap();
        assert_eq!(model.model_params().unwrap_err(), BktError::NotFitted);
        // explicit starting parameters do not count as trained either
        let model = model.with_params(mock_bkt_params()).unwrap();
        assert!(!model.is_trained());
        assert_eq!(model.model_params().unwrap_err(), BktError::NotFitted);
    }
    #[test]
    fn model_params_are_rounded() {
        let mut model = BktModel::new(2, 2)
            .unwrap()
            .with_params(mock_bkt_params())
            .unwrap()
            .with_max_iter(3);
        model.fit(&[vec![0, 0, 1, 0], vec![1, 1, 0]]).unwrap();
        let (init, trans, emit) = model.model_params().unwrap();
        assert_eq!(init.len(), 2);
        assert_eq!(trans.dim(), (2, 2));
        assert_eq!(emit.dim(), (2, 2));
        for &x in init.iter().chain(trans.iter()).chain(emit.iter()) {
            assert!((0.0..=1.0).contains(&x));
            // two decimal places only
            assert_abs_diff_eq!(x * 100.0, (x * 100.0).round(), epsilon = 1e-9);
        }
    }
    #[test]
    fn predict_works_before_fit() {
        let model = BktModel::new(2, 2)
            .unwrap()
            .with_params(mock_bkt_params())
            .unwrap();
        let path = model.predict(&[0, 0, 1, 0]).unwrap();
        assert_eq!(path.states, vec![0, 0, 1, 1]);
        assert_abs_diff_eq!(path.score.to_value(), 0.01714608, epsilon = 1e-12);
    }
    #[test]
    fn fit_marks_trained_and_refit_warm_starts() {
        let mut model = BktModel::new(2, 2).unwrap().with_seed(42).unwrap();
        assert!(!model.is_trained());
        let seqs = vec![vec![0, 0, 0, 1], vec![1, 1, 0, 1], vec![0, 1, 0]];
        let first = model.fit(&seqs).unwrap();
        assert!(model.is_trained());
        assert!(first.len() >= 2);
        // second fit resumes from the fitted parameters, so its first
        // likelihood equals the last one of the first fit
        let second = model.fit(&seqs).unwrap();
        assert_abs_diff_eq!(
            second.log_likelihoods[0],
            first.last().unwrap(),
            epsilon = 1e-12
        );
    }
    #[test]
    fn seeded_models_are_reproducible() {
        let a = BktModel::new(2, 2).unwrap().with_seed(7).unwrap();
        let b = BktModel::new(2, 2).unwrap().with_seed(7).unwrap();
        assert_eq!(a.params(), b.params());
        let c = BktModel::new(2, 2).unwrap().with_seed(8).unwrap();
        assert_ne!(a.params(), c.params());
    }
    #[test]
    fn with_params_checks_dimensions() {
        let model = BktModel::new(3, 2).unwrap();
        assert!(matches!(
            model.with_params(mock_bkt_params()).unwrap_err(),
            BktError::InvalidParameters { .. }
        ));
    }
    #[test]
    fn query_surface_matches_algorithms() {
        let model = BktModel::new(2, 2)
            .unwrap()
            .with_params(mock_bkt_params())
            .unwrap();
        // score is the forward log-likelihood
        assert_abs_diff_eq!(
            model.score(&[0, 0]).unwrap(),
            0.4392f64.ln(),
            epsilon = 1e-12
        );
        // posterior rows sum to one
        let post = model.posteriors(&[0, 0, 1, 0]).unwrap();
        assert_eq!(post.dim(), (4, 2));
        for t in 0..4 {
            assert_abs_diff_eq!(post.row(t).sum(), 1.0, epsilon = 1e-12);
        }
        // sampling respects the requested length and the vocabulary
        let (states, obs) = model.sample(30, 5).unwrap();
        assert_eq!(states.len(), 30);
        assert_eq!(obs.len(), 30);
        assert!(obs.iter().all(|&o| o < 2));
    }
    #[test]
    fn constructor_and_default_shapes() {
        assert!(BktModel::new(0, 2).is_err());
        assert!(BktModel::new(2, 0).is_err());
        let model = BktModel::default();
        assert_eq!(model.n_states(), 2);
        assert_eq!(model.n_obs(), 2);
        assert!(!model.is_trained());
    }
    #[test]
    fn predict_is_idempotent() {
        let mut model = BktModel::new(2, 2).unwrap().with_seed(3).unwrap();
        model.fit(&[vec![0, 1, 0, 0], vec![1, 0, 1]]).unwrap();
        let a = model.predict(&[0, 1, 0, 1]).unwrap();
        let b = model.predict(&[0, 1, 0, 1]).unwrap();
        assert_eq!(a, b);
    }
}
