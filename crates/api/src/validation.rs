//! Validation utilities for API request data
use services::MonthDate;
use std::fmt;
use uuid::Uuid;

/// Minimum accepted length of a service name, in characters
pub const SERVICE_NAME_MIN_LEN: usize = 2;
/// Maximum accepted length of a service name, in characters
pub const SERVICE_NAME_MAX_LEN: usize = 255;

/// A single rule broken by one request field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every violation found in a request, in field order.
///
/// Renders as one line: `validation failed: price: ...; start_date: ...`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field` when `result` is an error
    pub fn check(&mut self, field: &'static str, result: Result<(), String>) {
        if let Err(message) = result {
            self.violations.push(FieldViolation::new(field, message));
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldViolation>> for ValidationErrors {
    fn from(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {details}")
    }
}

impl std::error::Error for ValidationErrors {}

/// Request payloads that check their own field rules
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Validates a user identifier.
///
/// The identifier must be a hyphenated, lowercase UUID (8-4-4-4-12 hex digits)
/// with version 4 and the RFC 4122 variant. Keys are compared as exact strings,
/// so uppercase spellings of the same UUID are refused rather than stored as a
/// second user.
///
/// # Examples
/// ```
/// use api::validation::validate_uuid_v4;
///
/// assert!(validate_uuid_v4("60601fee-2bf1-4721-ae6f-7636e79a0cba").is_ok());
/// assert!(validate_uuid_v4("60601fee2bf14721ae6f7636e79a0cba").is_err()); // not hyphenated
/// assert!(validate_uuid_v4("60601fee-2bf1-1721-ae6f-7636e79a0cba").is_err()); // version 1
/// assert!(validate_uuid_v4("60601FEE-2BF1-4721-AE6F-7636E79A0CBA").is_err()); // uppercase
/// ```
pub fn validate_uuid_v4(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("is required".to_string());
    }

    // Only the hyphenated form is exactly 36 characters long
    if value.len() != 36 {
        return Err("must be a UUID in 8-4-4-4-12 format".to_string());
    }

    let uuid = Uuid::try_parse(value).map_err(|_| "must be a UUID in 8-4-4-4-12 format")?;

    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("must use lowercase hex digits".to_string());
    }

    if uuid.get_version() != Some(uuid::Version::Random)
        || uuid.get_variant() != uuid::Variant::RFC4122
    {
        return Err("must be a version 4 UUID".to_string());
    }

    Ok(())
}

/// Validates a service name: required, 2 to 255 characters.
pub fn validate_service_name(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("is required".to_string());
    }

    let len = value.chars().count();
    if !(SERVICE_NAME_MIN_LEN..=SERVICE_NAME_MAX_LEN).contains(&len) {
        return Err(format!(
            "must be between {SERVICE_NAME_MIN_LEN} and {SERVICE_NAME_MAX_LEN} characters"
        ));
    }

    Ok(())
}

/// Validates a price. Zero is a valid price (free plans).
pub fn validate_price(price: i64) -> Result<(), String> {
    if price < 0 {
        return Err("must be greater than or equal to 0".to_string());
    }
    Ok(())
}

/// Validates that an end month, when given, is not before the start month.
pub fn validate_period(start_date: MonthDate, end_date: Option<MonthDate>) -> Result<(), String> {
    match end_date {
        Some(end) if end < start_date => Err(format!(
            "must not be before start_date ({start_date})"
        )),
        _ => Ok(()),
    }
}
