// tuple.rs — Capability tuple data model and validation.
//
// A tuple is immutable once validated; there are no setters. Map scopes use
// a BTreeMap so the canonical key order (ascending, bytewise) and key
// uniqueness are structural properties rather than runtime checks.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TupleError;
use crate::wire;

/// Grammar for a capability name: lowercase alphanumeric first character,
/// then lowercase alphanumerics plus `_ . : - { } ; = | \`.
const CAPABILITY_PATTERN: &str = r"^[a-z0-9][a-z0-9_.:\-{};=|\\]*$";

/// Grammar for a map-scope key: 1..=64 characters, lowercase alphanumeric
/// plus `_ . : -`.
const SCOPE_KEY_PATTERN: &str = r"^[a-z0-9][a-z0-9_.:-]{0,63}$";

fn capability_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CAPABILITY_PATTERN).expect("capability grammar compiles"))
}

fn scope_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SCOPE_KEY_PATTERN).expect("scope key grammar compiles"))
}

/// A scalar value inside a map scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// The scope of a tuple: either a free-form string or a flat map of
/// key/scalar entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TupleScope {
    Text(String),
    Map(BTreeMap<String, ScopeValue>),
}

/// A `(principal, capability, scope)` authorization assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityTuple {
    /// Who the assertion is about (1..=256 chars, no surrounding whitespace).
    pub principal: String,
    /// What they may do (1..=256 chars, capability grammar).
    pub capability: String,
    /// Over what (string 1..=512 chars, or map of 1..=16 entries).
    pub scope: TupleScope,
}

impl CapabilityTuple {
    /// Convenience constructor for a string-scoped tuple.
    pub fn with_text_scope(
        principal: impl Into<String>,
        capability: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.into(),
            capability: capability.into(),
            scope: TupleScope::Text(scope.into()),
        }
    }

    /// Convenience constructor for a map-scoped tuple.
    pub fn with_map_scope(
        principal: impl Into<String>,
        capability: impl Into<String>,
        entries: impl IntoIterator<Item = (String, ScopeValue)>,
    ) -> Self {
        Self {
            principal: principal.into(),
            capability: capability.into(),
            scope: TupleScope::Map(entries.into_iter().collect()),
        }
    }

    /// Run the ordered validation checks, returning the first failure.
    ///
    /// Check order: principal (empty, length, whitespace), capability
    /// (empty, length, whitespace, grammar), then scope — string scopes
    /// check length and whitespace; map scopes check emptiness, size, and
    /// each entry's key grammar and value bounds.
    pub fn validate(&self) -> Result<(), TupleError> {
        if self.principal.is_empty() {
            return Err(TupleError::PrincipalEmpty);
        }
        if self.principal.chars().count() > 256 {
            return Err(TupleError::PrincipalLength);
        }
        if self.principal.trim() != self.principal {
            return Err(TupleError::PrincipalWhitespace);
        }

        if self.capability.is_empty() {
            return Err(TupleError::CapabilityEmpty);
        }
        if self.capability.chars().count() > 256 {
            return Err(TupleError::CapabilityLength);
        }
        if self.capability.trim() != self.capability {
            return Err(TupleError::CapabilityWhitespace);
        }
        if !capability_re().is_match(&self.capability) {
            return Err(TupleError::CapabilityFormat);
        }

        match &self.scope {
            TupleScope::Text(text) => {
                let len = text.chars().count();
                if len < 1 || len > 512 {
                    return Err(TupleError::ScopeTextLength);
                }
                if text.trim() != text {
                    return Err(TupleError::ScopeTextWhitespace);
                }
            }
            TupleScope::Map(map) => {
                if map.is_empty() {
                    return Err(TupleError::ScopeMapEmpty);
                }
                if map.len() > 16 {
                    return Err(TupleError::ScopeMapTooLarge);
                }
                for (key, value) in map {
                    if !scope_key_re().is_match(key) {
                        return Err(TupleError::ScopeKeyFormat { key: key.clone() });
                    }
                    match value {
                        ScopeValue::Text(text) => {
                            if text.chars().count() > 256 {
                                return Err(TupleError::ScopeValueLength { key: key.clone() });
                            }
                        }
                        ScopeValue::Number(n) => {
                            if !n.is_finite() {
                                return Err(TupleError::ScopeNumberNotFinite {
                                    key: key.clone(),
                                });
                            }
                        }
                        ScopeValue::Bool(_) => {}
                    }
                }
            }
        }

        Ok(())
    }

    /// Emit the canonical wire form. Validates first, so this succeeds
    /// exactly when [`validate`](Self::validate) returns `Ok`.
    pub fn serialize(&self) -> Result<String, TupleError> {
        self.validate()?;
        Ok(wire::serialize_validated(self))
    }

    /// Parse a wire-form string back into a validated tuple.
    ///
    /// Scalar types in map scopes are inferred from the text (`true`/`false`
    /// become booleans, decimal numbers become numbers, everything else is a
    /// string), so a string value that spells a boolean or number will not
    /// survive a round trip with its type intact.
    pub fn parse(input: &str) -> Result<Self, TupleError> {
        wire::parse(input)
    }
}
