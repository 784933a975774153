//! Payload Validators
//!
//! Field-presence and format checks run on raw JSON payloads before they are
//! turned into typed requests. Every field is checked; a field reports at most
//! one message (the first rule it fails).

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::ValidateEmail;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 20;

/// Raw JSON object as received on the wire.
pub type Payload = Map<String, Value>;

/// Per-field validation outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: BTreeMap<String, String>,
    #[serde(rename = "isValid")]
    pub is_valid: bool,
}

impl ValidationReport {
    /// Report with no errors.
    pub const fn new() -> Self {
        Self {
            errors: BTreeMap::new(),
            is_valid: true,
        }
    }

    /// Record `message` for `field` unless the field already has one.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
        self.is_valid = false;
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// `Ok(())` when valid, otherwise the report itself.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Read a field as text. Absent, null and empty values read as `""`.
pub fn field_text(payload: &Payload, field: &str) -> String {
    match payload.get(field) {
        Some(value) if !is_blank(value) => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        _ => String::new(),
    }
}

/// Deserialize a payload into a typed request.
///
/// Blank values are dropped first so optional fields read as absent. A type
/// mismatch is reported under the `payload` key.
pub fn parse_payload<T: DeserializeOwned>(payload: Payload) -> Result<T, ValidationReport> {
    let cleaned: Payload = payload
        .into_iter()
        .filter(|(_, value)| !is_blank(value))
        .collect();

    serde_json::from_value(Value::Object(cleaned)).map_err(|e| {
        let mut report = ValidationReport::new();
        report.add("payload", e.to_string());
        report
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn require(report: &mut ValidationReport, payload: &Payload, field: &str, label: &str) -> String {
    let value = field_text(payload, field);
    if value.is_empty() {
        report.add(field, format!("{label} field is required"));
    }
    value
}

fn check_username(report: &mut ValidationReport, username: &str) {
    let len = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&len) {
        report.add(
            "username",
            format!(
                "Username must be between {USERNAME_MIN_LENGTH} and {USERNAME_MAX_LENGTH} characters"
            ),
        );
    } else if !username.chars().all(|c| c.is_ascii_alphabetic()) {
        report.add("username", "Username must only contain letters");
    }
}

fn check_email(report: &mut ValidationReport, email: &str) {
    if !email.validate_email() {
        report.add("email", "Email is invalid");
    }
}

fn check_password(report: &mut ValidationReport, password: &str, min_len: usize) {
    if password.chars().count() < min_len {
        report.add(
            "password",
            format!("Password must be at least {min_len} characters"),
        );
    }
}

/// Registration payload: username, email, password, confirmPassword.
pub fn validate_registration(payload: &Payload, min_password_len: usize) -> ValidationReport {
    let mut report = ValidationReport::new();

    let username = require(&mut report, payload, "username", "Username");
    if !report.has("username") {
        check_username(&mut report, &username);
    }

    let email = require(&mut report, payload, "email", "Email");
    if !report.has("email") {
        check_email(&mut report, &email);
    }

    let password = require(&mut report, payload, "password", "Password");
    if !report.has("password") {
        check_password(&mut report, &password, min_password_len);
    }

    let confirm = require(&mut report, payload, "confirmPassword", "Confirm password");
    if !report.has("confirmPassword") && confirm != password {
        report.add("confirmPassword", "Passwords must match");
    }

    report
}

/// Login payload: email and password.
pub fn validate_login(payload: &Payload) -> ValidationReport {
    let mut report = ValidationReport::new();
    require(&mut report, payload, "email", "Email");
    require(&mut report, payload, "password", "Password");
    report
}

/// Event creation payload: title, description, category and date.
pub fn validate_event(payload: &Payload) -> ValidationReport {
    let mut report = ValidationReport::new();
    require(&mut report, payload, "title", "Title");
    require(&mut report, payload, "description", "Description");
    require(&mut report, payload, "category", "Category");
    require(&mut report, payload, "date", "Date");
    report
}

/// Partial profile update. Only fields that are present are checked.
pub fn validate_profile_update(payload: &Payload, min_password_len: usize) -> ValidationReport {
    let mut report = ValidationReport::new();

    let username = field_text(payload, "username");
    if !username.is_empty() {
        check_username(&mut report, &username);
    }

    let email = field_text(payload, "email");
    if !email.is_empty() {
        check_email(&mut report, &email);
    }

    let password = field_text(payload, "password");
    if !password.is_empty() {
        check_password(&mut report, &password, min_password_len);
    }

    report
}
