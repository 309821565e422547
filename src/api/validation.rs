//! Input validation for API requests.
//!
//! This module provides validation functions for API request data,
//! ensuring all inputs meet the required format and constraints.
//!
//! For collecting multiple validation errors and returning them as an ApiError,
//! use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

lazy_static! {
    /// Regex for validating usernames (alphanumeric plus . _ -, must start
    /// and end alphanumeric)
    static ref USERNAME_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9._-]*[a-zA-Z0-9])?$"
    ).unwrap();

    /// Regex for validating email addresses
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?)+$"
    ).unwrap();

    /// Regex for validating service names (letters, digits, spaces and a
    /// few separators, starting with a letter)
    static ref SERVICE_NAME_REGEX: Regex = Regex::new(
        r"^[a-zA-Z][a-zA-Z0-9 &/-]*$"
    ).unwrap();
}

/// A field that clients may send as a JSON number or as a string.
///
/// The original clients were sloppy about this for pincodes, prices and
/// service ids, so the API accepts both forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumericField {
    /// Interpret the field as an integer, if it is one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumericField::Int(n) => Some(*n),
            NumericField::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            NumericField::Float(_) => None,
            NumericField::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Interpret the field as a float, if it is one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumericField::Int(n) => Some(*n as f64),
            NumericField::Float(f) => Some(*f),
            NumericField::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username is too short (min 3 characters)".to_string());
    }

    if username.len() > 32 {
        return Err("Username is too long (max 32 characters)".to_string());
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username may only contain letters, digits, dots, dashes and underscores, starting and ending with a letter or digit".to_string()
        );
    }

    Ok(())
}

/// Validate a password against the strength policy
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password is too short (min 8 characters)".to_string());
    }

    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit".to_string());
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a postal address
pub fn validate_address(address: &str) -> Result<(), String> {
    if address.trim().is_empty() {
        return Err("Address is required".to_string());
    }

    if address.len() > 255 {
        return Err("Address is too long (max 255 characters)".to_string());
    }

    Ok(())
}

/// Validate a pincode (area code)
pub fn validate_pincode(pincode: i64) -> Result<(), String> {
    if pincode < 1 {
        return Err("Pincode must be a positive number".to_string());
    }

    Ok(())
}

/// Validate a service name
pub fn validate_service_name(name: &str) -> Result<(), String> {
    let name = name.trim();

    if name.is_empty() {
        return Err("Service name is required".to_string());
    }

    if name.len() < 2 {
        return Err("Service name is too short (min 2 characters)".to_string());
    }

    if name.len() > 64 {
        return Err("Service name is too long (max 64 characters)".to_string());
    }

    if !SERVICE_NAME_REGEX.is_match(name) {
        return Err(
            "Service name must start with a letter and may only contain letters, digits, spaces, '&', '/' and '-'".to_string()
        );
    }

    Ok(())
}

/// Validate a service price
pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err("Price must be a number".to_string());
    }

    if price < 0.0 {
        return Err("Price cannot be negative".to_string());
    }

    Ok(())
}
