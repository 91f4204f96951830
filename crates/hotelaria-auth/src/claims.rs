//! Access-token expiry claim decoding
//!
//! The backend issues JWTs whose payload carries an `exp` claim in seconds
//! since epoch. The expiry instant stored alongside the token is always
//! derived from this claim at save time, never set independently. The
//! signature is NOT verified here; the client only needs to know when the
//! token dies, and the server is the authority on validity.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{Error, Result};

/// Decode the `exp` claim of a JWT and return it as milliseconds since epoch.
///
/// Accepts any `header.payload.signature` token whose payload is base64url
/// JSON with a numeric `exp` in seconds. Returns `Error::Decode` for a
/// malformed token; callers must treat that as "nothing was saved".
pub fn decode_expiry_millis(token: &str) -> Result<u64> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
        _ => {
            return Err(Error::Decode(
                "token is not a three-segment JWT".to_string(),
            ));
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| Error::Decode(format!("payload is not base64url: {e}")))?;

    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Decode(format!("payload is not JSON: {e}")))?;

    let exp_seconds = claims
        .get("exp")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| Error::Decode("missing or non-numeric exp claim".to_string()))?;

    exp_seconds
        .checked_mul(1000)
        .ok_or_else(|| Error::Decode(format!("exp claim out of range: {exp_seconds}")))
}
