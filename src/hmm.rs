//!
//! HMM recursions over a flat discrete state space.
//!
//! * `forward`: alpha tables and total sequence likelihood
//! * `backward`: beta tables
//! * `freq`: posterior (gamma / xi) queries and Baum-Welch expected counts
//! * `viterbi`: most probable hidden-state path
//!
//! All recursions run in log-space `Prob`; see `crate::prob`.
//!
pub mod backward;
pub mod forward;
pub mod freq;
pub mod viterbi;

pub use backward::Backward;
pub use forward::Forward;
pub use freq::{ExpectedCounts, HmmOutput};
pub use viterbi::DecodedPath;
