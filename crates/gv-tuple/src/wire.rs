// wire.rs — Canonical wire encoding for capability tuples.
//
// Wire grammar:
//
//   principal|capability|scope=<escaped text>
//   principal|capability|scope{k1=v1;k2=v2;...}
//
// Map entries appear in ascending bytewise key order. The escape character
// is `\`, applied before any of `\ | { } ; =`. Numbers use standard decimal
// formatting with `-0` normalized to `0`; booleans render as `true`/`false`.

use std::collections::BTreeMap;

use crate::error::TupleError;
use crate::tuple::{CapabilityTuple, ScopeValue, TupleScope};

/// Characters that must be backslash-escaped inside a wire component.
const ESCAPABLE: [char; 6] = ['\\', '|', '{', '}', ';', '='];

/// Backslash-escape a tuple component for the wire form.
pub fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for ch in component.chars() {
        if ESCAPABLE.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Emit the canonical wire form of a tuple the caller has already validated.
///
/// Called by [`CapabilityTuple::serialize`] after validation, which is what
/// makes the unreachable-number branch below truly unreachable.
pub(crate) fn serialize_validated(tuple: &CapabilityTuple) -> String {
    let scope_fragment = match &tuple.scope {
        TupleScope::Text(text) => format!("scope={}", escape(text)),
        TupleScope::Map(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}={}", escape(key), serialize_scalar(value)))
                .collect();
            format!("scope{{{}}}", pairs.join(";"))
        }
    };

    format!(
        "{}|{}|{}",
        escape(&tuple.principal),
        escape(&tuple.capability),
        scope_fragment
    )
}

fn serialize_scalar(value: &ScopeValue) -> String {
    match value {
        ScopeValue::Text(text) => escape(text),
        ScopeValue::Bool(true) => "true".to_string(),
        ScopeValue::Bool(false) => "false".to_string(),
        ScopeValue::Number(n) => {
            // Validation rejected non-finite numbers; fold -0 into 0 so the
            // canonical form has a single zero.
            let normalized = if *n == 0.0 { 0.0 } else { *n };
            format!("{normalized}")
        }
    }
}

/// Parse a wire-form string back into a validated tuple.
pub(crate) fn parse(input: &str) -> Result<CapabilityTuple, TupleError> {
    let fields = split_unescaped(input, '|')?;
    if fields.len() != 3 {
        return Err(TupleError::WireShape);
    }

    let principal = unescape(&fields[0])?;
    let capability = unescape(&fields[1])?;

    let scope = if let Some(rest) = fields[2].strip_prefix("scope=") {
        TupleScope::Text(unescape(rest)?)
    } else if let Some(body) = fields[2]
        .strip_prefix("scope{")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        let mut map = BTreeMap::new();
        for entry in split_unescaped(body, ';')? {
            let (raw_key, raw_value) =
                split_entry(&entry).ok_or_else(|| TupleError::WireScopeEntry {
                    entry: entry.clone(),
                })?;
            let key = unescape(raw_key)?;
            let value = infer_scalar(unescape(raw_value)?);
            map.insert(key, value);
        }
        TupleScope::Map(map)
    } else {
        return Err(TupleError::WireScopeFragment);
    };

    let tuple = CapabilityTuple {
        principal,
        capability,
        scope,
    };
    tuple.validate()?;
    Ok(tuple)
}

/// Split on a delimiter, treating backslash-escaped characters as content.
/// The returned parts keep their escape sequences for later unescaping.
fn split_unescaped(input: &str, delim: char) -> Result<Vec<String>, TupleError> {
    let mut parts = vec![String::new()];
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let escaped = chars.next().ok_or(TupleError::WireEscape)?;
            if !ESCAPABLE.contains(&escaped) {
                return Err(TupleError::WireEscape);
            }
            let last = parts.last_mut().expect("parts is never empty");
            last.push('\\');
            last.push(escaped);
        } else if ch == delim {
            parts.push(String::new());
        } else {
            parts.last_mut().expect("parts is never empty").push(ch);
        }
    }
    Ok(parts)
}

/// Split a `key=value` entry at its first unescaped `=`.
fn split_entry(entry: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (idx, ch) in entry.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' => return Some((&entry[..idx], &entry[idx + 1..])),
            _ => {}
        }
    }
    None
}

/// Remove escape sequences from a wire component.
fn unescape(input: &str) -> Result<String, TupleError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let escaped = chars.next().ok_or(TupleError::WireEscape)?;
            if !ESCAPABLE.contains(&escaped) {
                return Err(TupleError::WireEscape);
            }
            out.push(escaped);
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

/// Infer a scalar's type from its unescaped wire text.
fn infer_scalar(text: String) -> ScopeValue {
    match text.as_str() {
        "true" => return ScopeValue::Bool(true),
        "false" => return ScopeValue::Bool(false),
        _ => {}
    }
    let numeric_shape = text
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-');
    if numeric_shape {
        if let Ok(n) = text.parse::<f64>() {
            if n.is_finite() {
                return ScopeValue::Number(n);
            }
        }
    }
    ScopeValue::Text(text)
}
