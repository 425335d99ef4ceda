//!
//! globally-available parts
//!
pub use crate::common::{Obs, ObsSeq, StateId};
pub use crate::em::{TrainConfig, TrainingTrace};
pub use crate::engine::BktModel;
pub use crate::error::{BktError, Result};
pub use crate::hmm::DecodedPath;
pub use crate::params::HmmParams;
pub use crate::prob::Prob;
