//!
//! Basic types shared across the crate: hidden states, observation codes,
//! observation sequences.
//!

/// Hidden state index (in `[0, K)`)
pub type StateId = usize;

/// Observation code (in `[0, M)`)
///
/// For Bayesian Knowledge Tracing `M = 2`, with `0` = correct response and
/// `1` = incorrect response. Codes are unsigned, so a negative code is
/// unrepresentable by construction.
pub type Obs = usize;

/// A single observation sequence (e.g. one learner's response history)
///
/// A training batch is `&[ObsSeq]`; a single sequence passed to decoding is
/// `&[Obs]`. The two are distinct types on purpose, there is no implicit
/// reshape of one into the other.
pub type ObsSeq = Vec<Obs>;

///
/// Round `x` to `decimals` decimal places (half away from zero).
///
/// Used only at the reporting boundary; internal computation keeps full
/// precision.
///
pub fn round_to(x: f64, decimals: u32) -> f64 {
    let f = 10f64.powi(decimals as i32);
    (x * f).round() / f
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn rounding() {
        assert_eq!(round_to(0.678, 2), 0.68);
        assert_eq!(round_to(0.5, 2), 0.5);
        assert_eq!(round_to(1.0 / 3.0, 2), 0.33);
        assert_eq!(round_to(2.0 / 3.0, 2), 0.67);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert_eq!(round_to(0.0, 2), 0.0);
        assert_eq!(round_to(1.0, 2), 1.0);
    }
}
