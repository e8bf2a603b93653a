use lazy_static::lazy_static;
use std::collections::HashSet;
use validator::ValidateEmail;

use super::interface::{AuthError, Result};

lazy_static! {
    static ref DISPOSABLE_DOMAINS: HashSet<&'static str> = [
        "10minutemail.com",
        "discard.email",
        "dispostable.com",
        "fakeinbox.com",
        "getnada.com",
        "guerrillamail.com",
        "guerrillamail.net",
        "maildrop.cc",
        "mailinator.com",
        "mailnesia.com",
        "mintemail.com",
        "mohmal.com",
        "sharklasers.com",
        "spamgourmet.com",
        "temp-mail.org",
        "tempmail.com",
        "tempmailo.com",
        "throwawaymail.com",
        "trashmail.com",
        "yopmail.com",
    ]
    .into_iter()
    .collect();
}

/// Emails are stored and compared lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_disposable(email: &str) -> bool {
    email
        .rsplit_once('@')
        .map(|(_, domain)| DISPOSABLE_DOMAINS.contains(domain))
        .unwrap_or(false)
}

/// Normalizes and checks shape and domain.
pub fn check_email(email: &str) -> Result<String> {
    let email = normalize_email(email);
    if !email.validate_email() || is_disposable(&email) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}

pub fn check_password(password: &str, min_length: usize) -> Result<()> {
    if password.trim().is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }
    if password.chars().count() < min_length {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            min_length
        )));
    }
    Ok(())
}

pub fn check_full_name(full_name: &str) -> Result<String> {
    let name = full_name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("Full name is required".to_string()));
    }
    Ok(name.to_string())
}
