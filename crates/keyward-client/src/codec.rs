//! JWT claims reader.
//!
//! Reads the `exp` claim out of a compact JWT. Signatures are never checked:
//! a successful decode says nothing about where the token came from.

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// base64url, accepting payloads with or without padding.
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the claims object of a `header.payload.signature` token.
pub fn decode_claims(token: &str) -> Option<Map<String, Value>> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return None;
    };

    let bytes = CLAIMS_ENGINE.decode(payload).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// Decode the token's expiry from its numeric `exp` claim (seconds since epoch).
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode_claims(token)?.get("exp")?.as_f64()?;
    if !exp.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((exp * 1000.0).round() as i64)
}
