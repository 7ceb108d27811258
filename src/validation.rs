//! Field checks shared by request payloads. Each check records its message in
//! a [`FieldErrors`] so one response can report every bad field at once.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldErrors;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Records a "required" error when `value` is absent.
pub fn required<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, REQUIRED);
    }
    value
}

/// Length and blankness check for a char field.
pub fn text(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize, allow_blank: bool) {
    if !allow_blank && value.trim().is_empty() {
        errors.add(field, BLANK);
    } else if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        );
    }
}

pub fn min_len(errors: &mut FieldErrors, field: &str, value: &str, min: usize) {
    if value.chars().count() < min {
        errors.add(field, format!("Ensure this field has at least {min} characters."));
    }
}

pub fn email(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    } else if !is_valid_email(value.trim()) {
        errors.add(field, "Enter a valid email address.");
    }
}
