//!
//! Error type shared by parameter validation, training and decoding.
//!
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BktError>;

///
/// Everything that can go wrong when constructing, fitting or querying a
/// model. All variants are raised synchronously at the offending call.
///
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BktError {
    /// A parameter matrix violates the probability-simplex constraints
    /// (row not summing to 1, negative entry, or dimension mismatch).
    #[error("invalid parameters: {detail}")]
    InvalidParameters { detail: String },

    /// Zero-length observation sequence passed to fit or predict.
    #[error("empty observation sequence")]
    EmptySequence,

    /// An observation code outside the model alphabet.
    #[error("observation code {code} is outside the alphabet [0, {alphabet_size})")]
    OutOfVocabulary { code: usize, alphabet_size: usize },

    /// fit was called with an empty batch of sequences.
    #[error("no training sequences supplied")]
    NoTrainingData,

    /// Trained parameters were requested before any successful fit.
    #[error("model is not fitted yet; call fit first")]
    NotFitted,

    /// Total log-likelihood decreased between EM iterations beyond floating
    /// tolerance. Signals a bug in the recursions, never bad user input.
    #[error("log-likelihood decreased at EM iteration {iteration}: {prev} -> {curr}")]
    NumericalInstability {
        iteration: usize,
        prev: f64,
        curr: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let e = BktError::OutOfVocabulary {
            code: 5,
            alphabet_size: 2,
        };
        assert_eq!(
            e.to_string(),
            "observation code 5 is outside the alphabet [0, 2)"
        );
        let e = BktError::InvalidParameters {
            detail: "trans row 0 sums to 0.9".to_string(),
        };
        assert_eq!(e.to_string(), "invalid parameters: trans row 0 sums to 0.9");
        assert_eq!(
            BktError::EmptySequence.to_string(),
            "empty observation sequence"
        );
    }
}
