// error.rs — Error types for the CAES codec.

use thiserror::Error;

/// Errors that can occur while decoding a CAES string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaesError {
    /// The string does not match the CAES grammar
    /// `C[0-5]-A[0-5](-LABEL)?-E[0-5](-LABEL)?-S[0-5](-LABEL)?`.
    #[error("invalid CAES code format: '{code}'")]
    InvalidFormat { code: String },
}
