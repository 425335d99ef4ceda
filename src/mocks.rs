use crate::params::HmmParams;
use ndarray::array;

/// 2-state 2-observation mock with pi=[0.6,0.4], A=[[0.7,0.3],[0.2,0.8]]
/// and B=[[0.9,0.1],[0.3,0.7]], the worked example used by the golden tests
pub fn mock_bkt_params() -> HmmParams {
    HmmParams::from_probs(
        array![0.6, 0.4],
        array![[0.7, 0.3], [0.2, 0.8]],
        array![[0.9, 0.1], [0.3, 0.7]],
    )
    .unwrap()
}

/// mock with all rows uniform, so every path and observation is equally likely
pub fn mock_uniform_params(n_states: usize, n_obs: usize) -> HmmParams {
    HmmParams::uniform(n_states, n_obs).unwrap()
}
