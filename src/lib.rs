pub mod common;
pub mod em;
pub mod engine;
pub mod error;
pub mod hmm;
pub mod mocks;
pub mod params;
pub mod prelude;
pub mod prob;
pub mod sample;

#[macro_use]
extern crate approx;
