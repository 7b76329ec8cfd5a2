//! Field validation for write payloads.
//!
//! A [`Validator`] collects per-field messages and the accepted values at
//! the same time. Full writes (POST, PUT) require every field; PATCH only
//! checks the fields it carries.

use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::{DateTime, Document};

use crate::{
    action::Action,
    error::{ApiResult, FieldErrors},
};

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const MAX_NAME_LENGTH: usize = 255;
/// Upper bound for stored counts, the range of a 32-bit integer column.
pub const MAX_POSITIVE: i64 = 2_147_483_647;

#[derive(Debug)]
pub struct Validator {
    partial: bool,
    errors: FieldErrors,
    fields: Document,
}

impl Validator {
    pub fn new(action: Action) -> Self {
        Self {
            partial: action.is_partial(),
            errors: FieldErrors::new(),
            fields: Document::new(),
        }
    }

    fn present<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() && !self.partial {
            self.errors.add(field, REQUIRED);
        }
        value
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn text(&mut self, field: &str, value: Option<&str>, max_len: Option<usize>) {
        let Some(value) = self.present(field, value) else {
            return;
        };
        let value = value.trim();
        if value.is_empty() {
            self.errors.add(field, BLANK);
            return;
        }
        if let Some(max_len) = max_len {
            if value.chars().count() > max_len {
                self.errors
                    .add(field, format!("Ensure this field has no more than {max_len} characters."));
                return;
            }
        }
        self.fields.insert(field, value);
    }

    pub fn positive(&mut self, field: &str, value: Option<i64>) {
        let Some(value) = self.present(field, value) else {
            return;
        };
        if value < 1 {
            self.errors
                .add(field, "Ensure this value is greater than or equal to 1.");
            return;
        }
        if value > MAX_POSITIVE {
            self.errors
                .add(field, format!("Ensure this value is less than or equal to {MAX_POSITIVE}."));
            return;
        }
        self.fields.insert(field, value);
    }

    /// A reference to another object. Existence is checked by the caller.
    pub fn reference(&mut self, field: &str, value: Option<i64>) {
        if let Some(value) = self.present(field, value) {
            self.fields.insert(field, value);
        }
    }

    /// Many-to-many id lists default to empty on full writes.
    pub fn references(&mut self, field: &str, value: Option<&[i64]>) {
        match value {
            Some(ids) => {
                let mut ids = ids.to_vec();
                ids.sort_unstable();
                ids.dedup();
                self.fields.insert(field, ids);
            }
            None if !self.partial => {
                self.fields.insert(field, Vec::<i64>::new());
            }
            None => {}
        }
    }

    pub fn datetime(&mut self, field: &str, value: Option<ChronoDateTime<Utc>>) {
        if let Some(value) = self.present(field, value) {
            self.fields.insert(field, DateTime::from_chrono(value));
        }
    }

    /// Accepted fields, or every collected message.
    pub fn finish(self) -> ApiResult<Document> {
        self.errors.into_result()?;
        Ok(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn errors_of(result: ApiResult<Document>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_requires_every_field() {
        let mut v = Validator::new(Action::Create);
        v.text("name", None, Some(MAX_NAME_LENGTH));
        v.positive("rows", None);
        let errors = errors_of(v.finish());
        assert_eq!(errors.get("name"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("rows"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn patch_skips_missing_fields() {
        let mut v = Validator::new(Action::PartialUpdate);
        v.text("name", None, Some(MAX_NAME_LENGTH));
        v.positive("rows", Some(4));
        v.references("genres", None);
        let fields = v.finish().unwrap();
        assert!(!fields.contains_key("name"));
        assert!(!fields.contains_key("genres"));
        assert_eq!(fields.get_i64("rows").unwrap(), 4);
    }

    #[test]
    fn blank_and_long_text_rejected() {
        let mut v = Validator::new(Action::Create);
        v.text("name", Some("   "), Some(MAX_NAME_LENGTH));
        v.text("title", Some(&"x".repeat(256)), Some(MAX_NAME_LENGTH));
        let errors = errors_of(v.finish());
        assert_eq!(errors.get("name"), Some(&[BLANK.to_string()][..]));
        assert!(errors.get("title").unwrap()[0].contains("255"));
    }

    #[test]
    fn text_is_trimmed() {
        let mut v = Validator::new(Action::Update);
        v.text("name", Some("  Drama "), None);
        assert_eq!(v.finish().unwrap().get_str("name").unwrap(), "Drama");
    }

    #[test]
    fn non_positive_numbers_rejected() {
        let mut v = Validator::new(Action::Create);
        v.positive("rows", Some(0));
        v.positive("seats_in_row", Some(-3));
        let errors = errors_of(v.finish());
        assert!(errors.get("rows").is_some());
        assert!(errors.get("seats_in_row").is_some());
    }

    #[test]
    fn oversized_numbers_rejected() {
        let mut v = Validator::new(Action::Create);
        v.positive("rows", Some(i64::MAX / 2));
        v.positive("seats_in_row", Some(3));
        let errors = errors_of(v.finish());
        assert!(errors.get("rows").unwrap()[0].contains("2147483647"));
        assert!(errors.get("seats_in_row").is_none());

        let mut v = Validator::new(Action::Create);
        v.positive("rows", Some(MAX_POSITIVE));
        assert!(v.finish().is_ok());
    }

    #[test]
    fn references_are_deduplicated_and_default_empty() {
        let mut v = Validator::new(Action::Create);
        v.references("genres", Some(&[3, 1, 3]));
        v.references("actors", None);
        let fields = v.finish().unwrap();
        let genres: Vec<i64> = fields
            .get_array("genres")
            .unwrap()
            .iter()
            .filter_map(|b| b.as_i64())
            .collect();
        assert_eq!(genres, vec![1, 3]);
        assert!(fields.get_array("actors").unwrap().is_empty());
    }
}
