// error.rs — Error types for the tuple codec.
//
// Validation is fail-fast: the first failing check determines the error.
// Per-key failures carry the offending key so callers can report precisely.

use thiserror::Error;

/// Errors from tuple validation, serialization, and wire-form parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TupleError {
    #[error("principal must not be empty")]
    PrincipalEmpty,

    #[error("principal exceeds 256 characters")]
    PrincipalLength,

    #[error("principal has leading or trailing whitespace")]
    PrincipalWhitespace,

    #[error("capability must not be empty")]
    CapabilityEmpty,

    #[error("capability exceeds 256 characters")]
    CapabilityLength,

    #[error("capability has leading or trailing whitespace")]
    CapabilityWhitespace,

    #[error("capability does not match the capability grammar")]
    CapabilityFormat,

    #[error("string scope must be 1 to 512 characters")]
    ScopeTextLength,

    #[error("string scope has leading or trailing whitespace")]
    ScopeTextWhitespace,

    #[error("map scope must not be empty")]
    ScopeMapEmpty,

    #[error("map scope exceeds 16 entries")]
    ScopeMapTooLarge,

    #[error("scope key '{key}' does not match the key grammar")]
    ScopeKeyFormat { key: String },

    #[error("scope value for '{key}' exceeds 256 characters")]
    ScopeValueLength { key: String },

    #[error("scope number for '{key}' is not finite")]
    ScopeNumberNotFinite { key: String },

    /// Wire form did not have exactly three `|`-separated fields.
    #[error("wire form must have exactly three '|'-separated fields")]
    WireShape,

    /// Wire scope fragment did not start with `scope=` or `scope{{...}}`.
    #[error("wire scope fragment must be 'scope=...' or 'scope{{...}}'")]
    WireScopeFragment,

    /// A backslash escaped nothing, or escaped a character outside the
    /// escapable set.
    #[error("invalid escape sequence in wire form")]
    WireEscape,

    /// A map-scope entry was not of the form `key=value`.
    #[error("scope entry '{entry}' is not 'key=value'")]
    WireScopeEntry { entry: String },
}
