//! Type dispatch: an explicit tagged union of supported type categories
//! plus a registry mapping complex type codes to their element trees.
//!
//! Primitive shape checks are hand-rolled character walks; the harness
//! only needs to reject obviously malformed lexical forms, not re-encode
//! the full datatype grammar.

use std::collections::BTreeMap;

use crate::profile::ElementNode;

/// Primitive datatype kinds the validator can shape-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Code,
    Boolean,
    Integer,
    UnsignedInt,
    PositiveInt,
    Decimal,
    Date,
    DateTime,
    Instant,
    Time,
    Uri,
    Id,
    Base64,
}

/// Where a declared type code dispatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeCategory {
    Primitive(PrimitiveKind),
    /// A complex datatype with its own element tree (HumanName, Coding…).
    Complex(String),
    /// A full resource type; validated the same way as a complex type but
    /// kept distinct for reporting.
    Resource(String),
    /// Not resolvable; produces a warning, never a failure.
    Unknown(String),
}

/// Registry of element trees for complex and resource types.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    complex: BTreeMap<String, Vec<ElementNode>>,
    resources: BTreeMap<String, Vec<ElementNode>>,
}

impl TypeRegistry {
    pub fn new() -> TypeRegistry {
        TypeRegistry::default()
    }

    pub fn register_complex(&mut self, code: impl Into<String>, elements: Vec<ElementNode>) {
        self.complex.insert(code.into(), elements);
    }

    pub fn register_resource(&mut self, code: impl Into<String>, elements: Vec<ElementNode>) {
        self.resources.insert(code.into(), elements);
    }

    /// Classify a declared type code.
    pub fn classify(&self, code: &str) -> TypeCategory {
        if let Some(kind) = primitive_kind(code) {
            return TypeCategory::Primitive(kind);
        }
        if self.complex.contains_key(code) {
            return TypeCategory::Complex(code.to_string());
        }
        if self.resources.contains_key(code) {
            return TypeCategory::Resource(code.to_string());
        }
        TypeCategory::Unknown(code.to_string())
    }

    /// The element tree for a complex or resource type code.
    pub fn elements(&self, code: &str) -> Option<&[ElementNode]> {
        self.complex
            .get(code)
            .or_else(|| self.resources.get(code))
            .map(Vec::as_slice)
    }
}

/// Map a primitive type code to its kind. Codes follow the data-exchange
/// convention of lowercase primitive names.
pub fn primitive_kind(code: &str) -> Option<PrimitiveKind> {
    match code {
        "string" | "markdown" | "xhtml" => Some(PrimitiveKind::String),
        "code" => Some(PrimitiveKind::Code),
        "boolean" => Some(PrimitiveKind::Boolean),
        "integer" => Some(PrimitiveKind::Integer),
        "unsignedInt" => Some(PrimitiveKind::UnsignedInt),
        "positiveInt" => Some(PrimitiveKind::PositiveInt),
        "decimal" => Some(PrimitiveKind::Decimal),
        "date" => Some(PrimitiveKind::Date),
        "dateTime" => Some(PrimitiveKind::DateTime),
        "instant" => Some(PrimitiveKind::Instant),
        "time" => Some(PrimitiveKind::Time),
        "uri" | "url" | "canonical" | "oid" | "uuid" => Some(PrimitiveKind::Uri),
        "id" => Some(PrimitiveKind::Id),
        "base64Binary" => Some(PrimitiveKind::Base64),
        _ => None,
    }
}

/// Shape-check a JSON value against a primitive kind.
pub fn check_primitive(kind: PrimitiveKind, value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match kind {
        PrimitiveKind::String => value.is_string(),
        PrimitiveKind::Code => match value {
            // A code is a string with no leading/trailing/double whitespace.
            Value::String(s) => !s.is_empty() && s.trim() == s && !s.contains("  "),
            _ => false,
        },
        PrimitiveKind::Boolean => value.is_boolean(),
        PrimitiveKind::Integer => value.is_i64(),
        PrimitiveKind::UnsignedInt => value.as_u64().is_some(),
        PrimitiveKind::PositiveInt => value.as_u64().is_some_and(|n| n > 0),
        PrimitiveKind::Decimal => value.is_number(),
        PrimitiveKind::Date => value.as_str().is_some_and(is_date),
        PrimitiveKind::DateTime => value.as_str().is_some_and(is_date_time),
        PrimitiveKind::Instant => value.as_str().is_some_and(is_instant),
        PrimitiveKind::Time => value.as_str().is_some_and(is_time),
        PrimitiveKind::Uri => value.as_str().is_some_and(|s| !s.is_empty() && !s.contains(' ')),
        PrimitiveKind::Id => value.as_str().is_some_and(is_id),
        PrimitiveKind::Base64 => value.as_str().is_some_and(is_base64),
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `YYYY`, `YYYY-MM`, or `YYYY-MM-DD`.
fn is_date(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y] => y.len() == 4 && all_digits(y),
        [y, m] => y.len() == 4 && all_digits(y) && is_month(m),
        [y, m, d] => y.len() == 4 && all_digits(y) && is_month(m) && is_day(d),
        _ => false,
    }
}

fn is_month(s: &str) -> bool {
    s.len() == 2 && all_digits(s) && (1..=12).contains(&s.parse::<u32>().unwrap_or(0))
}

fn is_day(s: &str) -> bool {
    s.len() == 2 && all_digits(s) && (1..=31).contains(&s.parse::<u32>().unwrap_or(0))
}

/// A date, optionally followed by `T` and a time with zone offset.
fn is_date_time(s: &str) -> bool {
    match s.split_once('T') {
        None => is_date(s),
        Some((date, rest)) => is_date(date) && is_timed_suffix(rest),
    }
}

/// An instant requires full date, time, and zone.
fn is_instant(s: &str) -> bool {
    match s.split_once('T') {
        Some((date, rest)) => {
            date.split('-').count() == 3 && is_date(date) && is_timed_suffix(rest)
        }
        None => false,
    }
}

/// `hh:mm:ss` with optional fractional seconds.
fn is_time(s: &str) -> bool {
    let (hms, frac) = match s.split_once('.') {
        Some((hms, frac)) => (hms, Some(frac)),
        None => (s, None),
    };
    let parts: Vec<&str> = hms.split(':').collect();
    let shape_ok = parts.len() == 3
        && parts.iter().all(|p| p.len() == 2 && all_digits(p))
        && parts[0].parse::<u32>().unwrap_or(99) < 24
        && parts[1].parse::<u32>().unwrap_or(99) < 60
        && parts[2].parse::<u32>().unwrap_or(99) < 60;
    shape_ok && frac.is_none_or(all_digits)
}

/// Time-of-day plus mandatory zone: `Z`, `+hh:mm`, or `-hh:mm`.
fn is_timed_suffix(s: &str) -> bool {
    if let Some(time) = s.strip_suffix('Z') {
        return is_time(time);
    }
    for sign in ['+', '-'] {
        if let Some(idx) = s.rfind(sign) {
            let (time, zone) = s.split_at(idx);
            let zone = &zone[1..];
            if let Some((zh, zm)) = zone.split_once(':') {
                return is_time(time)
                    && zh.len() == 2
                    && zm.len() == 2
                    && all_digits(zh)
                    && all_digits(zm);
            }
        }
    }
    false
}

/// Letters, digits, `-` and `.`, 1..=64 characters.
fn is_id(s: &str) -> bool {
    (1..=64).contains(&s.len())
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
}

fn is_base64(s: &str) -> bool {
    !s.is_empty()
        && s.len() % 4 == 0
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
