//! Request Validation
//!
//! Field presence and format rules applied before a phone is saved. Each
//! rule maps to a stable numeric error code returned to clients.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::Value;

use crate::aside::CacheAsideOrchestrator;
use crate::error::ApiError;
use crate::models::Phone;

// == Error Code ==
/// Client-facing error codes of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NameRequired,
    NameInvalidCharacters,
    BrandRequired,
    BrandInvalidCharacters,
    ModelRequired,
    ModelInvalidCharacters,
    ShortNameRequired,
    ShortNameInvalidCharacters,
    CreatedAtRequired,
    PhoneNotFound,
    CreatedAtInvalidFormat,
    ImeiAlreadyExists,
    ImeiRequired,
    EmailInvalidFormat,
}

impl ErrorCode {
    pub fn code(self) -> &'static str {
        match self {
            ErrorCode::NameRequired => "1001",
            ErrorCode::NameInvalidCharacters => "1002",
            ErrorCode::BrandRequired => "1003",
            ErrorCode::BrandInvalidCharacters => "1004",
            ErrorCode::ModelRequired => "1005",
            ErrorCode::ModelInvalidCharacters => "1006",
            ErrorCode::ShortNameRequired => "1007",
            ErrorCode::ShortNameInvalidCharacters => "1008",
            ErrorCode::CreatedAtRequired => "1009",
            ErrorCode::PhoneNotFound => "1010",
            ErrorCode::CreatedAtInvalidFormat => "1011",
            ErrorCode::ImeiAlreadyExists => "1012",
            ErrorCode::ImeiRequired => "1013",
            ErrorCode::EmailInvalidFormat => "1014",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::NameRequired => "name is required",
            ErrorCode::NameInvalidCharacters => "name contains invalid characters",
            ErrorCode::BrandRequired => "brand is required",
            ErrorCode::BrandInvalidCharacters => "brand contains invalid characters",
            ErrorCode::ModelRequired => "model is required",
            ErrorCode::ModelInvalidCharacters => "model contains invalid characters",
            ErrorCode::ShortNameRequired => "shortName is required",
            ErrorCode::ShortNameInvalidCharacters => "shortName contains invalid characters",
            ErrorCode::CreatedAtRequired => "createdAt is required",
            ErrorCode::PhoneNotFound => "phone not found",
            ErrorCode::CreatedAtInvalidFormat => {
                "createdAt must look like 2024-01-31T13:45:00"
            }
            ErrorCode::ImeiAlreadyExists => "imei is already registered",
            ErrorCode::ImeiRequired => "imei is required",
            ErrorCode::EmailInvalidFormat => "supportEmail is not a valid address",
        }
    }
}

fn text_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\p{L}\p{N} ._-]+$").expect("static pattern"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static pattern"))
}

// == Parse ==
/// Turns a request body into a phone.
///
/// A `createdAt` that is present but not a local date-time is reported as
/// [`ErrorCode::CreatedAtInvalidFormat`] rather than a generic decode error.
pub fn parse_phone(body: Value) -> Result<Phone, ApiError> {
    if let Some(created_at) = body.get("createdAt").filter(|v| !v.is_null()) {
        let parses = created_at
            .as_str()
            .is_some_and(|s| s.parse::<NaiveDateTime>().is_ok());
        if !parses {
            return Err(ApiError::Validation(ErrorCode::CreatedAtInvalidFormat));
        }
    }
    serde_json::from_value(body).map_err(|err| ApiError::InvalidRequest(err.to_string()))
}

// == Field Rules ==
/// Checks presence and format of every field, in a fixed order.
pub fn check_fields(phone: &Phone) -> Result<(), ErrorCode> {
    check_text(&phone.name, ErrorCode::NameRequired, ErrorCode::NameInvalidCharacters)?;
    check_text(&phone.brand, ErrorCode::BrandRequired, ErrorCode::BrandInvalidCharacters)?;
    check_text(&phone.model, ErrorCode::ModelRequired, ErrorCode::ModelInvalidCharacters)?;
    check_text(
        &phone.short_name,
        ErrorCode::ShortNameRequired,
        ErrorCode::ShortNameInvalidCharacters,
    )?;

    if phone.created_at.is_none() {
        return Err(ErrorCode::CreatedAtRequired);
    }
    if phone.secondary_key().map(str::trim).unwrap_or_default().is_empty() {
        return Err(ErrorCode::ImeiRequired);
    }
    if let Some(email) = phone.support_email.as_deref().filter(|e| !e.is_empty()) {
        if !email_pattern().is_match(email) {
            return Err(ErrorCode::EmailInvalidFormat);
        }
    }
    Ok(())
}

fn check_text(value: &Option<String>, missing: ErrorCode, invalid: ErrorCode) -> Result<(), ErrorCode> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Err(missing),
        Some(text) if !text_pattern().is_match(text) => Err(invalid),
        Some(_) => Ok(()),
    }
}

// == Full Validation ==
/// Field rules plus IMEI uniqueness, checked through the cached lookup.
pub async fn validate_phone(
    registry: &CacheAsideOrchestrator,
    phone: &Phone,
) -> Result<(), ApiError> {
    check_fields(phone).map_err(ApiError::Validation)?;

    let imei = phone.secondary_key().unwrap_or_default();
    if let Some(existing) = registry.get_by_secondary_key(imei).await? {
        if existing.id != phone.id {
            return Err(ApiError::Validation(ErrorCode::ImeiAlreadyExists));
        }
    }
    Ok(())
}
