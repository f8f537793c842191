//! Configuration validation framework

use crate::{ConfigError, ConfigResult};

/// Trait for validating configuration values
pub trait Validate {
    /// Validate this configuration object
    ///
    /// # Errors
    /// Returns validation errors if the configuration is invalid
    fn validate(&self) -> ConfigResult<()>;
}

/// Validate a value is within a range
///
/// # Errors
/// Returns `ConfigError::OutOfRange` if value is outside the specified range
pub fn validate_range(value: u64, min: u64, max: u64, field_name: &str) -> ConfigResult<()> {
    if value < min || value > max {
        Err(ConfigError::OutOfRange {
            field: field_name.to_string(),
            value,
            min,
            max,
        })
    } else {
        Ok(())
    }
}

/// Validate that `lower <= upper` for two related fields
///
/// # Errors
/// Returns `ConfigError::Ordering` when `lower` exceeds `upper`
pub fn validate_ordering(
    lower: u64,
    lower_field: &str,
    upper: u64,
    upper_field: &str,
) -> ConfigResult<()> {
    if lower > upper {
        Err(ConfigError::Ordering {
            lower_field: lower_field.to_string(),
            lower,
            upper_field: upper_field.to_string(),
            upper,
        })
    } else {
        Ok(())
    }
}

/// Validate a string is not empty
///
/// # Errors
/// Returns `ConfigError::MissingField` if the string is empty or whitespace-only
pub fn validate_non_empty(value: &str, field_name: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingField {
            field: field_name.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Validate a float is finite (no NaN or infinities)
///
/// # Errors
/// Returns `ConfigError::Generic` naming the offending field
pub fn validate_finite(value: f64, field_name: &str) -> ConfigResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Generic {
            message: format!("{field_name} must be a finite number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds_are_inclusive() {
        assert!(validate_range(1, 1, 10, "x").is_ok());
        assert!(validate_range(10, 1, 10, "x").is_ok());
        assert!(matches!(
            validate_range(0, 1, 10, "x"),
            Err(ConfigError::OutOfRange { value: 0, .. })
        ));
    }

    #[test]
    fn test_ordering_allows_equal_values() {
        assert!(validate_ordering(450, "target_tokens", 450, "max_tokens").is_ok());
        let err = validate_ordering(500, "target_tokens", 450, "max_tokens");
        assert!(
            err.is_err_and(|e| e.to_string() == "target_tokens (500) must not exceed max_tokens (450)")
        );
    }

    #[test]
    fn test_non_empty_and_finite() {
        assert!(validate_non_empty("  ", "chunker_version").is_err());
        assert!(validate_non_empty("v1.2.0", "chunker_version").is_ok());
        assert!(validate_finite(f64::NAN, "section_boosts.Results").is_err());
        assert!(validate_finite(0.1, "section_boosts.Results").is_ok());
    }
}
