//!
//! HmmParams: the (pi, A, B) parameter set of a discrete HMM.
//!
//! * `init` (pi): initial-state distribution, length K
//! * `trans` (A): state-transition matrix, K x K, `trans[[i, j]] = P(state j at t+1 | state i at t)`
//! * `emit` (B): emission matrix, K x M, `emit[[i, o]] = P(observation o | state i)`
//!
//! Every row is validated to be a probability distribution on construction;
//! updates replace the whole value instead of mutating rows in place.
//!
use crate::common::Obs;
use crate::error::{BktError, Result};
use crate::prob::Prob;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

///
/// Tolerance for `|row sum - 1|` when validating stochastic rows.
///
pub const ROW_SUM_TOL: f64 = 1e-6;

///
/// Validated HMM parameter set. Entries are stored in log-space (`Prob`), so
/// the recursions never leave log arithmetic.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmParams {
    init: Array1<Prob>,
    trans: Array2<Prob>,
    emit: Array2<Prob>,
}

impl HmmParams {
    ///
    /// Construct from log-space entries, validating simplex constraints and
    /// dimensions.
    ///
    pub fn new(init: Array1<Prob>, trans: Array2<Prob>, emit: Array2<Prob>) -> Result<HmmParams> {
        let k = init.len();
        if k == 0 {
            return Err(invalid("initial distribution is empty"));
        }
        if trans.nrows() != k || trans.ncols() != k {
            return Err(invalid(&format!(
                "trans must be {}x{}, got {}x{}",
                k,
                k,
                trans.nrows(),
                trans.ncols()
            )));
        }
        if emit.nrows() != k {
            return Err(invalid(&format!(
                "emit must have {} rows, got {}",
                k,
                emit.nrows()
            )));
        }
        if emit.ncols() == 0 {
            return Err(invalid("observation alphabet is empty"));
        }
        check_row("init", 0, init.iter())?;
        for (i, row) in trans.rows().into_iter().enumerate() {
            check_row("trans", i, row.iter())?;
        }
        for (i, row) in emit.rows().into_iter().enumerate() {
            check_row("emit", i, row.iter())?;
        }
        Ok(HmmParams { init, trans, emit })
    }
    ///
    /// Construct from linear-space probabilities.
    ///
    pub fn from_probs(
        init: Array1<f64>,
        trans: Array2<f64>,
        emit: Array2<f64>,
    ) -> Result<HmmParams> {
        HmmParams::new(
            init.mapv(Prob::from_prob),
            trans.mapv(Prob::from_prob),
            emit.mapv(Prob::from_prob),
        )
    }
    ///
    /// Uniform initializer: every state equally likely everywhere.
    ///
    pub fn uniform(n_states: usize, n_obs: usize) -> Result<HmmParams> {
        let pi = 1.0 / n_states as f64;
        let po = 1.0 / n_obs as f64;
        HmmParams::from_probs(
            Array1::from_elem(n_states, pi),
            Array2::from_elem((n_states, n_states), pi),
            Array2::from_elem((n_states, n_obs), po),
        )
    }
    ///
    /// Seeded random initializer. Draws each entry uniformly from
    /// `[0.1, 1.1)` and normalizes per row, so no probability starts near
    /// zero and equal seeds give identical parameters.
    ///
    pub fn random(n_states: usize, n_obs: usize, seed: u64) -> Result<HmmParams> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut draw = |n: usize| -> Vec<f64> {
            let raw: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() + 0.1).collect();
            let total: f64 = raw.iter().sum();
            raw.into_iter().map(|x| x / total).collect()
        };
        let init = Array1::from(draw(n_states));
        let mut trans = Vec::with_capacity(n_states * n_states);
        for _ in 0..n_states {
            trans.extend(draw(n_states));
        }
        let mut emit = Vec::with_capacity(n_states * n_obs);
        for _ in 0..n_states {
            emit.extend(draw(n_obs));
        }
        let trans = Array2::from_shape_vec((n_states, n_states), trans)
            .map_err(|e| invalid(&e.to_string()))?;
        let emit =
            Array2::from_shape_vec((n_states, n_obs), emit).map_err(|e| invalid(&e.to_string()))?;
        HmmParams::from_probs(init, trans, emit)
    }
    ///
    /// Number of hidden states K
    ///
    pub fn n_states(&self) -> usize {
        self.init.len()
    }
    ///
    /// Observation alphabet size M
    ///
    pub fn n_obs(&self) -> usize {
        self.emit.ncols()
    }
    ///
    /// Initial-state distribution pi
    ///
    pub fn init(&self) -> &Array1<Prob> {
        &self.init
    }
    ///
    /// Transition matrix A
    ///
    pub fn trans(&self) -> &Array2<Prob> {
        &self.trans
    }
    ///
    /// Emission matrix B
    ///
    pub fn emit(&self) -> &Array2<Prob> {
        &self.emit
    }
    ///
    /// Export (pi, A, B) as linear-space probabilities, full precision.
    ///
    pub fn to_dense(&self) -> (Array1<f64>, Array2<f64>, Array2<f64>) {
        (
            self.init.mapv(|p| p.to_value()),
            self.trans.mapv(|p| p.to_value()),
            self.emit.mapv(|p| p.to_value()),
        )
    }
    ///
    /// Check an observation sequence against this model: non-empty and every
    /// code inside the alphabet `[0, M)`.
    ///
    pub fn validate_sequence(&self, obs: &[Obs]) -> Result<()> {
        if obs.is_empty() {
            return Err(BktError::EmptySequence);
        }
        let m = self.n_obs();
        for &o in obs {
            if o >= m {
                return Err(BktError::OutOfVocabulary {
                    code: o,
                    alphabet_size: m,
                });
            }
        }
        Ok(())
    }
}

fn invalid(detail: &str) -> BktError {
    BktError::InvalidParameters {
        detail: detail.to_string(),
    }
}

///
/// A stochastic row: no negative/NaN entry and sum 1 within `ROW_SUM_TOL`.
///
/// A negative linear-space probability shows up here as a NaN log value
/// (`ln` of a negative number), so one NaN test covers both.
///
fn check_row<'a, I: Iterator<Item = &'a Prob>>(name: &str, index: usize, row: I) -> Result<()> {
    let mut sum = Prob::zero();
    for &p in row {
        if p.to_log_value().is_nan() {
            return Err(invalid(&format!(
                "{} row {} contains a negative or NaN entry",
                name, index
            )));
        }
        sum += p;
    }
    let sum = sum.to_value();
    if (sum - 1.0).abs() > ROW_SUM_TOL {
        return Err(invalid(&format!(
            "{} row {} sums to {} (must be 1 within {})",
            name, index, sum, ROW_SUM_TOL
        )));
    }
    Ok(())
}

impl std::fmt::Display for HmmParams {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (init, trans, emit) = self.to_dense();
        writeln!(f, "init: {}", init)?;
        writeln!(f, "trans: {}", trans)?;
        write!(f, "emit: {}", emit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn bkt_probs() -> (Array1<f64>, Array2<f64>, Array2<f64>) {
        (
            array![0.6, 0.4],
            array![[0.7, 0.3], [0.2, 0.8]],
            array![[0.9, 0.1], [0.3, 0.7]],
        )
    }

    #[test]
    fn params_valid_construction() {
        let (pi, a, b) = bkt_probs();
        let params = HmmParams::from_probs(pi, a, b).unwrap();
        println!("{}", params);
        assert_eq!(params.n_states(), 2);
        assert_eq!(params.n_obs(), 2);
        assert_abs_diff_eq!(params.init()[0].to_value(), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(params.trans()[[1, 0]].to_value(), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(params.emit()[[0, 1]].to_value(), 0.1, epsilon = 1e-12);
    }
    #[test]
    fn params_row_sum_violation() {
        let err = HmmParams::from_probs(
            array![0.6, 0.3],
            array![[0.7, 0.3], [0.2, 0.8]],
            array![[0.9, 0.1], [0.3, 0.7]],
        )
        .unwrap_err();
        println!("{}", err);
        match err {
            BktError::InvalidParameters { detail } => assert!(detail.contains("init row 0")),
            _ => panic!("wrong error kind"),
        }

        let err = HmmParams::from_probs(
            array![0.6, 0.4],
            array![[0.7, 0.3], [0.5, 0.8]],
            array![[0.9, 0.1], [0.3, 0.7]],
        )
        .unwrap_err();
        match err {
            BktError::InvalidParameters { detail } => assert!(detail.contains("trans row 1")),
            _ => panic!("wrong error kind"),
        }
    }
    #[test]
    fn params_negative_entry() {
        let err = HmmParams::from_probs(
            array![0.6, 0.4],
            array![[0.7, 0.3], [0.2, 0.8]],
            array![[1.1, -0.1], [0.3, 0.7]],
        )
        .unwrap_err();
        match err {
            BktError::InvalidParameters { detail } => {
                assert!(detail.contains("emit row 0"));
                assert!(detail.contains("negative"));
            }
            _ => panic!("wrong error kind"),
        }
    }
    #[test]
    fn params_dimension_mismatch() {
        let (pi, a, b) = bkt_probs();
        // trans not KxK
        let err =
            HmmParams::from_probs(pi.clone(), array![[0.5, 0.5]], b.clone()).unwrap_err();
        assert!(matches!(err, BktError::InvalidParameters { .. }));
        // emit with wrong row count
        let err = HmmParams::from_probs(
            pi,
            a,
            array![[0.9, 0.1], [0.3, 0.7], [0.5, 0.5]],
        )
        .unwrap_err();
        assert!(matches!(err, BktError::InvalidParameters { .. }));
        // no states at all
        let err = HmmParams::uniform(0, 2).unwrap_err();
        assert!(matches!(err, BktError::InvalidParameters { .. }));
    }
    #[test]
    fn params_uniform() {
        let params = HmmParams::uniform(2, 2).unwrap();
        assert_abs_diff_eq!(params.init()[0].to_value(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(params.trans()[[0, 1]].to_value(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(params.emit()[[1, 0]].to_value(), 0.5, epsilon = 1e-12);
        // single state, single symbol is legal
        let tiny = HmmParams::uniform(1, 1).unwrap();
        assert!(tiny.init()[0].is_one());
    }
    #[test]
    fn params_random_seeded() {
        let a = HmmParams::random(2, 2, 7).unwrap();
        let b = HmmParams::random(2, 2, 7).unwrap();
        let c = HmmParams::random(2, 2, 8).unwrap();
        println!("{}", a);
        assert_eq!(a, b);
        assert_ne!(a, c);
        // rows already validated by construction; entries stay off the
        // simplex corners by the +0.1 shift
        let (pi, trans, emit) = a.to_dense();
        for &x in pi.iter().chain(trans.iter()).chain(emit.iter()) {
            assert!(x > 0.0 && x < 1.0);
        }
    }
    #[test]
    fn params_to_dense_full_precision() {
        let (pi, a, b) = bkt_probs();
        let params = HmmParams::from_probs(pi.clone(), a.clone(), b.clone()).unwrap();
        let (pi2, a2, b2) = params.to_dense();
        for (x, y) in pi.iter().zip(pi2.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
        for (x, y) in a.iter().zip(a2.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
        for (x, y) in b.iter().zip(b2.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }
    #[test]
    fn params_sequence_validation() {
        let params = HmmParams::uniform(2, 2).unwrap();
        assert!(params.validate_sequence(&[0, 1, 0]).is_ok());
        assert_eq!(
            params.validate_sequence(&[]).unwrap_err(),
            BktError::EmptySequence
        );
        assert_eq!(
            params.validate_sequence(&[0, 5]).unwrap_err(),
            BktError::OutOfVocabulary {
                code: 5,
                alphabet_size: 2
            }
        );
    }
    #[test]
    fn params_serialize() {
        let (pi, a, b) = bkt_probs();
        let params = HmmParams::from_probs(pi, a, b).unwrap();
        let json = serde_json::to_string(&params).unwrap();
        println!("{}", json);
        let back: HmmParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }
}
