//!
//! Sampling state paths and observations from `HmmParams`
//!
use crate::common::{Obs, ObsSeq, StateId};
use crate::error::{BktError, Result};
use crate::params::HmmParams;
use crate::prob::Prob;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

///
/// pick randomly from the choices with its own probability.
///
pub fn pick_with_prob<R: Rng, T: Copy>(rng: &mut R, choices: &[(T, Prob)]) -> T {
    choices
        .choose_weighted(rng, |item| item.1.to_value())
        .unwrap()
        .0
}

///
/// Struct for storing sampling results from HMM
///
/// One entry per time step, pairing the hidden state with the observation
/// it emitted.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SampleHistory(Vec<(StateId, Obs)>);

impl SampleHistory {
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    ///
    /// The hidden state path of the sample
    ///
    pub fn states(&self) -> Vec<StateId> {
        self.0.iter().map(|(state, _)| *state).collect()
    }
    ///
    /// The emitted observation sequence of the sample
    ///
    pub fn observations(&self) -> ObsSeq {
        self.0.iter().map(|(_, obs)| *obs).collect()
    }
}

impl std::fmt::Display for SampleHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (state, obs) in self.0.iter() {
            writeln!(f, "{} -> {}", state, obs)?;
        }
        Ok(())
    }
}

impl HmmParams {
    ///
    /// Sample a length-`len` trajectory with a seeded generator, so equal
    /// seeds reproduce the exact same history.
    ///
    pub fn sample(&self, len: usize, seed: u64) -> Result<SampleHistory> {
        if len == 0 {
            return Err(BktError::EmptySequence);
        }
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut history = Vec::with_capacity(len);
        for _ in 0..len {
            let state = match history.last() {
                None => self.pick_initial_state(&mut rng),
                Some(&(prev, _)) => self.pick_transition(&mut rng, prev),
            };
            let obs = self.pick_emission(&mut rng, state);
            history.push((state, obs));
        }
        Ok(SampleHistory(history))
    }
    fn pick_initial_state<R: Rng>(&self, rng: &mut R) -> StateId {
        let choices: Vec<(StateId, Prob)> = self.init().iter().copied().enumerate().collect();
        pick_with_prob(rng, &choices)
    }
    fn pick_transition<R: Rng>(&self, rng: &mut R, from: StateId) -> StateId {
        let choices: Vec<(StateId, Prob)> =
            self.trans().row(from).iter().copied().enumerate().collect();
        pick_with_prob(rng, &choices)
    }
    fn pick_emission<R: Rng>(&self, rng: &mut R, state: StateId) -> Obs {
        let choices: Vec<(Obs, Prob)> =
            self.emit().row(state).iter().copied().enumerate().collect();
        pick_with_prob(rng, &choices)
    }
}
