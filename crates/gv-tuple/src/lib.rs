//! # gv-tuple
//!
//! Codec for `(principal, capability, scope)` authorization tuples.
//!
//! A tuple asserts that a principal may exercise a capability over a scope.
//! Its canonical serialization is the identity that downstream components
//! hash and sign, so the encoder must be deterministic: map scopes always
//! serialize in ascending key order, and a tuple only serializes after it
//! validates.
//!
//! ## Key invariants
//!
//! - **Validate-before-emit**: [`CapabilityTuple::serialize`] succeeds iff
//!   [`CapabilityTuple::validate`] returns `Ok`.
//! - **Deterministic canonical form**: two tuples with the same entries
//!   produce byte-identical wire strings regardless of construction order.
//! - **First failure wins**: validation is ordered and fail-fast, returning
//!   a single typed error.

pub mod error;
pub mod tuple;
pub mod wire;

pub use error::TupleError;
pub use tuple::{CapabilityTuple, ScopeValue, TupleScope};
pub use wire::escape;
