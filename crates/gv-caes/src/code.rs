// code.rs — CAES code parsing, formatting, and comparison.
//
// A CAES code rates one action along four axes:
//
//   C — Classification (risk):     C0 none .. C5 restricted
//   A — Authority (approval):      A0-SELF .. A5-EMERGENCY
//   E — Effect (reversibility):    E0-PURE .. E5-PERMANENT
//   S — Scope (blast radius):      S0-SELF .. S5-EXTERNAL
//
// Labels on the A/E/S axes are optional in the wire form; parsing expands
// missing labels to the axis defaults so every parsed code formats the same
// way it re-parses.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CaesError;

/// Grammar for a CAES string. Each label is independently optional.
const CAES_PATTERN: &str =
    r"^C([0-5])-A([0-5])(?:-([A-Z]+))?-E([0-5])(?:-([A-Z]+))?-S([0-5])(?:-([A-Z]+))?$";

fn caes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CAES_PATTERN).expect("CAES grammar compiles"))
}

/// A parsed CAES code.
///
/// Components are stored in their canonical wire form (`"C2"`,
/// `"A1-NOTIFY"`, ...) so downstream code can embed them directly into
/// violation records and audit events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaesCode {
    /// Risk classification, e.g. `"C2"`. Never labeled.
    pub classification: String,
    /// Approval authority, e.g. `"A1-NOTIFY"`.
    pub authority: String,
    /// Reversibility of effects, e.g. `"E2-CHECKPOINT"`.
    pub effect: String,
    /// Blast radius, e.g. `"S1-LOCAL"`.
    pub scope: String,
}

impl CaesCode {
    /// Parse a CAES string.
    ///
    /// Accepts the bare four-field form (`C2-A1-E2-S2`) and any mix of
    /// labeled axes (`C2-A1-NOTIFY-E2-S2`). Missing labels expand to the
    /// axis defaults: authority `SELF`, effect `PURE`, scope `SELF`.
    pub fn parse(code: &str) -> Result<Self, CaesError> {
        let caps = caes_re()
            .captures(code)
            .ok_or_else(|| CaesError::InvalidFormat {
                code: code.to_string(),
            })?;

        let labeled = |axis: char, digit: usize, label: usize, default: &str| {
            let label = caps.get(label).map(|m| m.as_str()).unwrap_or(default);
            format!("{}{}-{}", axis, &caps[digit], label)
        };

        Ok(Self {
            classification: format!("C{}", &caps[1]),
            authority: labeled('A', 2, 3, "SELF"),
            effect: labeled('E', 4, 5, "PURE"),
            scope: labeled('S', 6, 7, "SELF"),
        })
    }

    /// Format this code as its fully labeled wire form.
    pub fn format(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.classification, self.authority, self.effect, self.scope
        )
    }

    /// Compare two codes lexicographically over their numeric levels,
    /// classification first. Labels are ignored.
    pub fn compare(&self, other: &CaesCode) -> Ordering {
        level(&self.classification)
            .cmp(&level(&other.classification))
            .then_with(|| level(&self.authority).cmp(&level(&other.authority)))
            .then_with(|| level(&self.effect).cmp(&level(&other.effect)))
            .then_with(|| level(&self.scope).cmp(&level(&other.scope)))
    }

    /// Whether classification, scope, and effect are each at or below the
    /// given maxima. Maxima are level strings (`"C3"`, `"S2-DOMAIN"`, ...).
    pub fn is_within(&self, max_classification: &str, max_scope: &str, max_effect: &str) -> bool {
        level(&self.classification) <= level(max_classification)
            && level(&self.scope) <= level(max_scope)
            && level(&self.effect) <= level(max_effect)
    }
}

impl fmt::Display for CaesCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Extract the numeric level from a `C`/`A`/`E`/`S`-prefixed component.
///
/// Returns `-1` when the component does not start with an axis letter
/// followed by a digit — the "unknown level" sentinel.
pub fn level(component: &str) -> i8 {
    let mut chars = component.chars();
    match (chars.next(), chars.next()) {
        (Some('C' | 'A' | 'E' | 'S'), Some(digit)) if digit.is_ascii_digit() => {
            (digit as u8 - b'0') as i8
        }
        _ => -1,
    }
}

/// Human-readable gloss for a classification level.
pub fn classification_description(classification: &str) -> &'static str {
    match level(classification) {
        0 => "None - Pure observation",
        1 => "Low - Reversible changes",
        2 => "Medium - Significant, reviewable",
        3 => "High - Enforcement, limited reversal",
        4 => "Critical - Structural changes",
        5 => "Restricted - Self-modification",
        _ => "Unknown classification level",
    }
}

/// Human-readable gloss for an authority level.
pub fn authority_description(authority: &str) -> &'static str {
    match level(authority) {
        0 => "Self-authorized",
        1 => "Self + notify owner",
        2 => "Requires review",
        3 => "Requires explicit approval",
        4 => "Requires multi-party approval",
        5 => "Emergency/security only",
        _ => "Unknown authority level",
    }
}
