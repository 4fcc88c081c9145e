use lazy_static::lazy_static;
use regex::Regex;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Digits-only string with an inclusive length range; documents and phone
/// numbers are stored as numeric strings.
pub fn is_digits_between(value: &str, min: usize, max: usize) -> bool {
    lazy_static! {
        static ref DIGITS_RE: Regex = Regex::new(r"^\d+$").unwrap();
    }
    (min..=max).contains(&value.len()) && DIGITS_RE.is_match(value)
}

pub fn len_between(value: &str, min: usize, max: usize) -> bool {
    let chars = value.chars().count();
    (min..=max).contains(&chars)
}
