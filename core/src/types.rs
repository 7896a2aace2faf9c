use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64URL;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::IntegrityError;

/// Signing algorithm accepted in token headers.
pub const ALG_HS256: &str = "HS256";

/// Token lifetime the ProtChain backend issues sessions with (7 days).
pub const DEFAULT_TOKEN_TTL: i64 = 7 * 24 * 60 * 60;

/// Payload keys owned by `Claims`; attributes under these names are not carried.
pub const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Token header segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Header {
    pub fn hs256() -> Self { Self { alg: ALG_HS256.into(), typ: Some("JWT".into()) } }
}

/// Claims carried by a verified token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub subject_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub attributes: BTreeMap<String, String>,
}

impl Claims {
    /// Claims for `subject_id` issued at `issued_at` and valid for `ttl` seconds.
    pub fn new(subject_id: impl Into<String>, issued_at: i64, ttl: i64) -> Self {
        Self {
            subject_id: subject_id.into(),
            issued_at,
            expires_at: issued_at.saturating_add(ttl),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute. Names in `RESERVED_CLAIMS` are ignored.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !is_reserved(&key) {
            self.attributes.insert(key, value.into());
        }
        self
    }

    /// First attribute whose name collides with a reserved claim, if any.
    pub fn reserved_attribute(&self) -> Option<&str> {
        self.attributes.keys().map(String::as_str).find(|k| is_reserved(k))
    }

    /// Map a decoded payload object onto claims.
    ///
    /// The subject comes from `sub`, falling back to the backend's numeric `user_id`.
    /// `exp` is required; `iat` defaults to zero. Remaining non-null fields become
    /// attributes, strings verbatim and everything else as compact JSON.
    pub fn from_payload(payload: Value) -> Result<Self, String> {
        let mut map = match payload {
            Value::Object(map) => map,
            _ => return Err("payload is not a JSON object".into()),
        };

        let subject_id = match map.remove("sub") {
            Some(v) if !v.is_null() => scalar_text(&v).ok_or("sub is not a string or number")?,
            _ => {
                let v = map.remove("user_id").ok_or("payload has no subject")?;
                scalar_text(&v).ok_or("user_id is not a string or number")?
            }
        };
        let expires_at = map
            .remove("exp")
            .ok_or("payload has no exp")?
            .as_i64()
            .ok_or("exp is not an integer")?;
        let issued_at = match map.remove("iat") {
            None | Some(Value::Null) => 0,
            Some(v) => v.as_i64().ok_or("iat is not an integer")?,
        };

        let attributes = map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect();

        Ok(Self { subject_id, issued_at, expires_at, attributes })
    }

    /// Render claims as a token payload object.
    pub fn to_payload(&self) -> Value {
        let mut map = Map::new();
        for (k, v) in &self.attributes {
            if is_reserved(k) { continue; }
            map.insert(k.clone(), Value::String(v.clone()));
        }
        map.insert("sub".into(), Value::String(self.subject_id.clone()));
        map.insert("iat".into(), Value::from(self.issued_at));
        map.insert("exp".into(), Value::from(self.expires_at));
        Value::Object(map)
    }
}

fn is_reserved(key: &str) -> bool { RESERVED_CLAIMS.contains(&key) }

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// SHA-256 content fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    pub fn from_bytes(bytes: [u8; 32]) -> Self { Self(bytes) }

    pub fn as_bytes(&self) -> &[u8; 32] { &self.0 }

    pub fn to_hex(&self) -> String { hex::encode(self.0) }

    /// Parse a 64-character hex digest.
    pub fn from_hex(s: &str) -> Result<Self, IntegrityError> {
        if s.len() != Self::HEX_LEN {
            return Err(IntegrityError::InvalidDigest(format!("expected {} hex chars, got {}", Self::HEX_LEN, s.len())));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out).map_err(|e| IntegrityError::InvalidDigest(e.to_string()))?;
        Ok(Self(out))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Digest({})", self.to_hex()) }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Outcome of comparing content against a reference digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationResult {
    Match,
    Mismatch,
}

impl VerificationResult {
    pub fn is_match(self) -> bool { self == VerificationResult::Match }
}

/// Position of a request in the combined boundary check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Unauthenticated,
    Authenticated,
    Verified,
    Tampered,
}

/// Encode bytes as an unpadded base64url token segment.
pub fn encode_segment(bytes: &[u8]) -> String { B64URL.encode(bytes) }

/// Decode an unpadded base64url token segment.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> { B64URL.decode(segment.as_bytes()) }
