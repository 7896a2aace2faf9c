use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::AuthError;
use crate::types::{decode_segment, encode_segment, Claims, Header, ALG_HS256};

type HmacSha256 = Hmac<Sha256>;

/// Authorization scheme prefix expected in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization` header value.
///
/// A header without the literal `Bearer ` prefix carries no usable credential.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::Missing)?;
    let token = value.strip_prefix(BEARER_PREFIX).ok_or(AuthError::Missing)?;
    if token.is_empty() { return Err(AuthError::Missing); }
    Ok(token)
}

/// Verifies HS256 bearer tokens against a shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: Vec<u8>,
}

impl TokenVerifier {
    /// Create a verifier keyed by `secret`.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self { Self { secret: secret.into() } }

    /// Verify a raw token at time `now` (epoch seconds) and return its claims.
    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        verify(token, &self.secret, now)
    }

    /// Verify the token carried by an `Authorization` header value.
    pub fn verify_header(&self, header: Option<&str>, now: i64) -> Result<Claims, AuthError> {
        let token = bearer_token(header)?;
        self.verify(token, now)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

/// Verify `token` with `secret` at time `now`.
pub fn verify(token: &str, secret: &[u8], now: i64) -> Result<Claims, AuthError> {
    if token.is_empty() { return Err(AuthError::Missing); }

    // 1) Structure
    let segments: Vec<&str> = token.split('.').collect();
    let &[header_b64, payload_b64, sig_b64] = &segments[..] else {
        return Err(AuthError::Malformed(format!("expected 3 segments, got {}", segments.len())));
    };
    let header_bytes = decode_segment(header_b64).map_err(|e| AuthError::Malformed(format!("header base64: {e}")))?;
    let payload_bytes = decode_segment(payload_b64).map_err(|e| AuthError::Malformed(format!("payload base64: {e}")))?;
    let signature = decode_segment(sig_b64).map_err(|e| AuthError::Malformed(format!("signature base64: {e}")))?;
    if signature.is_empty() { return Err(AuthError::Malformed("empty signature".into())); }

    // 2) Algorithm
    let header: Header = serde_json::from_slice(&header_bytes).map_err(|e| AuthError::Malformed(format!("header json: {e}")))?;
    if header.alg != ALG_HS256 { return Err(AuthError::InvalidSignature); }

    // 3) Signature, compared in constant time
    let mut mac = new_mac(secret);
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature).map_err(|_| AuthError::InvalidSignature)?;

    // 4) Claims and expiry
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).map_err(|e| AuthError::Malformed(format!("payload json: {e}")))?;
    let claims = Claims::from_payload(payload).map_err(AuthError::Malformed)?;
    if now >= claims.expires_at { return Err(AuthError::Expired); }
    Ok(claims)
}

/// Issues HS256 tokens in the format `TokenVerifier` accepts.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self { Self { secret: secret.into() } }

    /// Sign `claims` into a compact token.
    ///
    /// Attributes named after a reserved claim would not survive verification, so they are refused.
    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        if let Some(key) = claims.reserved_attribute() {
            return Err(AuthError::Malformed(format!("attribute {key} collides with a reserved claim")));
        }
        let header = serde_json::to_vec(&Header::hs256()).expect("header serialization should not fail");
        let header = encode_segment(&header);
        let payload = encode_segment(claims.to_payload().to_string().as_bytes());
        let signing_input = format!("{header}.{payload}");
        let sig = sign(&self.secret, signing_input.as_bytes());
        Ok(format!("{signing_input}.{}", encode_segment(&sig)))
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

/// HMAC-SHA256 of `msg` under `secret`.
pub fn sign(secret: &[u8], msg: &[u8]) -> Vec<u8> {
    let mut mac = new_mac(secret);
    mac.update(msg);
    mac.finalize().into_bytes().to_vec()
}

fn new_mac(secret: &[u8]) -> HmacSha256 {
    <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC accepts keys of any length")
}
