//! Validation system for configuration values
//!
//! Each config section implements [`ConfigSection`]; [`Validator`] holds the
//! shared field checks.

pub use crate::error::ValidationError;

/// A `[section]` of the config file
pub trait ConfigSection: Default {
    /// Returns every problem found; `Ok` means valid
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another config section into this one; values from `other` win
    fn merge(&mut self, other: Self);

    /// Returns the section name for error reporting
    fn section_name(&self) -> &'static str;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a value is within `min..=max`
    ///
    /// Values that do not compare (NaN) are rejected.
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        let below = value.partial_cmp(&min).is_none_or(|o| o.is_lt());
        let above = value.partial_cmp(&max).is_none_or(|o| o.is_gt());
        if below || above {
            Err(ValidationError::with_value(
                field,
                format!("must be between {} and {}", min, max),
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Validates that `low <= high`
    pub fn ordered<T>(low: T, high: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if low <= high {
            Ok(())
        } else {
            Err(ValidationError::with_value(
                field,
                format!("lower bound must not exceed {}", high),
                low,
            ))
        }
    }

    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validates that a string is usable as a single path component
    pub fn file_name(value: &str, field: &str) -> Result<(), ValidationError> {
        Self::not_empty(value, field)?;
        if value.contains(['/', '\\']) || value == "." || value == ".." {
            Err(ValidationError::with_value(
                field,
                "must be a plain name without separators",
                value,
            ))
        } else {
            Ok(())
        }
    }

    /// Collects multiple validation results into a single result
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_valid() {
        assert!(Validator::in_range(50, 0, 100, "test").is_ok());
        assert!(Validator::in_range(0, 0, 100, "test").is_ok());
        assert!(Validator::in_range(100, 0, 100, "test").is_ok());
    }

    #[test]
    fn test_in_range_invalid() {
        assert!(Validator::in_range(-1, 0, 100, "test").is_err());
        assert!(Validator::in_range(101, 0, 100, "test").is_err());
    }

    #[test]
    fn test_in_range_rejects_nan() {
        assert!(Validator::in_range(f32::NAN, 0.5, 3.0, "player.default_rate").is_err());
    }

    #[test]
    fn test_ordered() {
        assert!(Validator::ordered(0.5, 3.0, "player.min_rate").is_ok());
        assert!(Validator::ordered(2.0, 2.0, "player.min_rate").is_ok());
        assert!(Validator::ordered(3.0, 0.5, "player.min_rate").is_err());
    }

    #[test]
    fn test_not_empty() {
        assert!(Validator::not_empty("books", "test").is_ok());
        assert!(Validator::not_empty("   ", "test").is_err());
    }

    #[test]
    fn test_file_name() {
        assert!(Validator::file_name("books", "test").is_ok());
        assert!(Validator::file_name("a/b", "test").is_err());
        assert!(Validator::file_name("..", "test").is_err());
        assert!(Validator::file_name("", "test").is_err());
    }

    #[test]
    fn test_collect_errors() {
        let results = vec![
            Ok(()),
            Err(ValidationError::new("field1", "error1")),
            Ok(()),
            Err(ValidationError::new("field2", "error2")),
        ];

        let errors = Validator::collect_errors(results).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
