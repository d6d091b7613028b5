//! Field validators: pure predicates over single values.
//!
//! Validators never panic on malformed input; malformed input is exactly the
//! condition being tested. The email/phone patterns mirror the front-end
//! checks so both sides of the wire agree on what a valid contact looks like.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email regex")
});

// Accepted phone shapes, after internal whitespace removal:
// 254XXXXXXXXX, +254XXXXXXXXX (Kenyan), 0XXXXXXXXX (domestic),
// +<7..15 digits> (generic international).
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:254\d{9}|\+254\d{9}|0\d{9}|\+\d{7,15})$").expect("phone regex")
});

// Payment references are interpolated into a gateway URL path; restricting
// them to this alphabet prevents path injection.
static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("reference regex"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_valid_phone(value: &str) -> bool {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&cleaned)
}

pub fn is_valid_reference(value: &str) -> bool {
    REFERENCE_RE.is_match(value)
}

pub fn is_valid_currency(value: &str) -> bool {
    value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn is_valid_package_type(value: &str) -> bool {
    matches!(value, "cv" | "cover" | "both")
}

/// Format check applied to a field after presence has been established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Email,
    Phone,
    /// URL-path-safe identifier (payment reference, gateway name).
    Reference,
    /// Positive JSON number.
    Amount,
    /// Three-letter currency code.
    Currency,
    PackageType,
    /// Free text, no format constraint.
    Text,
}

/// Declarative validation rule for one request field.
/// `max_len` is a character ceiling; `0` means no ceiling.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub format: FieldFormat,
    pub max_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldReason {
    Missing,
    InvalidFormat,
    TooLong,
}

/// A single failed validation: which field, and which rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: FieldReason,
}

impl FieldError {
    pub fn message(&self) -> String {
        match self.reason {
            FieldReason::Missing => format!("Missing required field: {}", self.field),
            FieldReason::InvalidFormat => format!("Invalid {}", self.field),
            FieldReason::TooLong => "Input too long".to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Validates `body` against `rules`, stopping at the first failure.
///
/// Checks run in phases across all fields, in declared field order within
/// each phase: presence first, then format, then length. Callers can rely on
/// this exact precedence (a missing field wins over another field's bad
/// format).
pub fn check_fields(rules: &[FieldRule], body: &Value) -> Result<(), FieldError> {
    for rule in rules {
        if !is_present(body.get(rule.name)) {
            return Err(FieldError {
                field: rule.name,
                reason: FieldReason::Missing,
            });
        }
    }

    for rule in rules {
        let value = &body[rule.name];
        if !format_ok(rule.format, value) {
            return Err(FieldError {
                field: rule.name,
                reason: FieldReason::InvalidFormat,
            });
        }
    }

    for rule in rules {
        if rule.max_len == 0 {
            continue;
        }
        if let Some(s) = body[rule.name].as_str() {
            if s.chars().count() > rule.max_len {
                return Err(FieldError {
                    field: rule.name,
                    reason: FieldReason::TooLong,
                });
            }
        }
    }

    Ok(())
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn format_ok(format: FieldFormat, value: &Value) -> bool {
    match format {
        FieldFormat::Amount => value.as_f64().is_some_and(|n| n > 0.0),
        FieldFormat::Text => value.is_string(),
        _ => {
            let Some(s) = value.as_str() else {
                return false;
            };
            let s = s.trim();
            match format {
                FieldFormat::Email => is_valid_email(s),
                FieldFormat::Phone => is_valid_phone(s),
                FieldFormat::Reference => is_valid_reference(s),
                FieldFormat::Currency => is_valid_currency(s),
                FieldFormat::PackageType => is_valid_package_type(s),
                FieldFormat::Amount | FieldFormat::Text => unreachable!(),
            }
        }
    }
}
