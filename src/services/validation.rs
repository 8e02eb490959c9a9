//! Field rules applied at the service entry.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

pub const NAME_MAX_LEN: usize = 20;

static LETTERS_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").expect("static pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Accumulates every field failure of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn not_blank(&mut self, field: &'static str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, "must not be blank");
            return false;
        }
        true
    }

    /// Person names and specialties: non-blank ASCII letters, bounded length.
    pub fn name(&mut self, field: &'static str, value: &str) {
        if !self.not_blank(field, value) {
            return;
        }
        if !LETTERS_ONLY.is_match(value) {
            self.add(field, "must contain letters only");
        }
        if value.chars().count() > NAME_MAX_LEN {
            self.add(field, format!("must be at most {NAME_MAX_LEN} characters"));
        }
    }

    pub fn non_negative(&mut self, field: &'static str, value: i64) {
        if value < 0 {
            self.add(field, "must not be negative");
        }
    }

    pub fn date_order(
        &mut self,
        field: &'static str,
        earlier: NaiveDate,
        later: NaiveDate,
        message: &str,
    ) {
        if later < earlier {
            self.add(field, message);
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", e.field, e.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_name_passes() {
        let mut errors = ValidationErrors::new();
        errors.name("first_name", "Gregory");
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn blank_name_reports_only_blank() {
        let mut errors = ValidationErrors::new();
        errors.name("first_name", "  ");
        assert_eq!(errors.fields().len(), 1);
        assert_eq!(errors.fields()[0].message, "must not be blank");
    }

    #[test]
    fn digits_and_spaces_are_rejected() {
        for bad in ["House2", "Mary Ann", "Zoë"] {
            let mut errors = ValidationErrors::new();
            errors.name("last_name", bad);
            assert!(!errors.is_empty(), "{bad} should be rejected");
        }
    }

    #[test]
    fn name_length_is_bounded() {
        let mut errors = ValidationErrors::new();
        errors.name("last_name", &"a".repeat(NAME_MAX_LEN));
        assert!(errors.is_empty());
        errors.name("last_name", &"a".repeat(NAME_MAX_LEN + 1));
        assert_eq!(errors.fields().len(), 1);
    }

    #[test]
    fn errors_accumulate_across_fields() {
        let mut errors = ValidationErrors::new();
        errors.name("first_name", "");
        errors.not_blank("description", "");
        errors.non_negative("sick_leave_days", -1);
        assert_eq!(errors.to_string().matches(';').count(), 2);
    }
}
