//! Request header construction: content type, auth and custom headers.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderName, HeaderValue};

use crate::channels::AllowedHeaders;
use crate::config::Credential;
use crate::error::NotifierError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const APPLICATION_JSON: &str = "application/json";

/// Header name to value, as sent on the wire.
pub type Headers = BTreeMap<String, String>;

/// Parse a `key1=val1,key2=val2` string.
///
/// Every entry must contain exactly one `=` and a non-empty key; a single bad
/// entry rejects the whole string.
///
/// # Errors
/// Returns [`NotifierError::Config`] with the fixed remediation message.
pub fn parse_custom_headers(raw: &str) -> Result<Vec<(String, String)>, NotifierError> {
    raw.split(',')
        .map(|entry| {
            let mut parts = entry.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) if !key.trim().is_empty() => {
                    Ok((key.trim().to_string(), value.trim().to_string()))
                }
                _ => Err(NotifierError::malformed_headers()),
            }
        })
        .collect()
}

/// `Authorization` value derived from the credential, if any.
///
/// A token wins over username/password.
#[must_use]
pub fn auth_header(credential: &Credential) -> Option<String> {
    if let Some(token) = credential.token.as_deref() {
        return Some(format!("Bearer {token}"));
    }

    match (credential.username.as_deref(), credential.password.as_deref()) {
        (Some(user), Some(pass)) => Some(format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))),
        _ => None,
    }
}

/// Build the full header set for one request.
///
/// Custom headers are applied last and override earlier entries by
/// case-insensitive name. Anything not permitted by `allowed` is dropped.
///
/// # Errors
/// Returns [`NotifierError::Config`] if `custom` is malformed or any header
/// name or value cannot be sent over HTTP.
pub fn build_headers(
    custom: Option<&str>,
    credential: &Credential,
    allowed: AllowedHeaders,
) -> Result<Headers, NotifierError> {
    let custom = custom.map(parse_custom_headers).transpose()?;

    let mut headers = Headers::new();
    insert_header(&mut headers, CONTENT_TYPE, APPLICATION_JSON);

    if let Some(auth) = auth_header(credential) {
        insert_header(&mut headers, AUTHORIZATION, &auth);
    }

    for (key, value) in custom.into_iter().flatten() {
        insert_header(&mut headers, &key, &value);
    }

    headers.retain(|key, _| allowed.permits(key));

    for (key, value) in &headers {
        validate_header(key, value)?;
    }
    Ok(headers)
}

fn validate_header(key: &str, value: &str) -> Result<(), NotifierError> {
    HeaderName::from_bytes(key.as_bytes()).map_err(|_| NotifierError::Config {
        message: format!("Invalid header name '{key}' in message_headers"),
    })?;
    HeaderValue::from_str(value).map_err(|_| NotifierError::Config {
        message: format!("Invalid value for header '{key}'"),
    })?;
    Ok(())
}

fn insert_header(headers: &mut Headers, key: &str, value: &str) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(key));
    headers.insert(key.to_string(), value.to_string());
}
