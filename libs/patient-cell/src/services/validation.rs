use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;

use crate::models::PatientError;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

// Indonesian mobile numbers: +62 / 62 / 0 prefix followed by 8xx.
static PHONE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\+62|62|0)8[1-9][0-9]{6,10}$").ok());

fn is_match(pattern: &Option<Regex>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

pub fn validate_email(email: &str) -> Result<(), PatientError> {
    if email.len() > 254 || !is_match(&EMAIL_PATTERN, email) {
        return Err(PatientError::ValidationError(format!("invalid email address: {}", email)));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), PatientError> {
    let compact: String = phone.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if !is_match(&PHONE_PATTERN, &compact) {
        return Err(PatientError::ValidationError(format!("invalid phone number: {}", phone)));
    }
    Ok(())
}

pub fn validate_name(field: &str, value: &str) -> Result<(), PatientError> {
    if value.trim().is_empty() {
        return Err(PatientError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub fn validate_date_of_birth(date_of_birth: NaiveDate) -> Result<(), PatientError> {
    let today = Utc::now().date_naive();
    if date_of_birth > today || today.years_since(date_of_birth).unwrap_or(0) > 150 {
        return Err(PatientError::InvalidDateOfBirth);
    }
    Ok(())
}
