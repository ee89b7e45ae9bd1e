//! # gv-caes
//!
//! Codec for CAES risk codes — the four-axis classification attached to
//! every governed action.
//!
//! A CAES code rates an action along Classification (risk), Authority
//! (approval), Effect (reversibility), and Scope (blast radius), each on a
//! 0–5 scale with an optional uppercase label, e.g. `C2-A1-NOTIFY-E2-S1`.
//!
//! ## Key invariants
//!
//! - **Digits are 0..=5**: the grammar rejects anything else.
//! - **Parsed codes are fully labeled**: missing authority/effect/scope
//!   labels expand to `SELF`/`PURE`/`SELF`, so [`CaesCode::format`] is
//!   stable under re-parsing.
//! - **Comparison is by level only**: labels never participate in ordering.

pub mod code;
pub mod error;

pub use code::{authority_description, classification_description, level, CaesCode};
pub use error::CaesError;
