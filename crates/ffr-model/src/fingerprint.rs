//! Content fingerprints for queries.
//!
//! A fingerprint is a deterministic digest of the *structure* of a value:
//! two values that serialize to the same tree get the same fingerprint no
//! matter in which order their map keys were inserted.
//!
//! # Derivation
//!
//! 1. Serialize the value into a `serde_json::Value` tree. Anything that is
//!    not a plain structure (maps with non-string keys, failing `Serialize`
//!    impls) is rejected with [`ModelError::InvalidArgument`].
//! 2. Render the tree as compact JSON with map keys sorted at every level.
//! 3. Hash the UTF-16 code units of that string with
//!    `h = (h * 33 + unit) & 0x7fff_ffff`, starting from [`FINGERPRINT_SEED`].
//!
//! # Collisions
//!
//! The digest space is 31 bits. Distinct queries can collide; that is an
//! accepted weakness of the scheme. A collision makes two different queries
//! look identical to the dedup and staleness checks, nothing more.
//! Non-finite floats serialize to `null` and therefore fingerprint like it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};

/// Initial accumulator value of the string hash.
pub const FINGERPRINT_SEED: u32 = 5381;

const HASH_MASK: u32 = 0x7fff_ffff;

/// Digest of a structural value, rendered as 8 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint(u32);

impl Fingerprint {
    /// Raw 31-bit digest.
    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Fingerprint as a string key (reconciliation key fallback).
    pub fn as_key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ModelError::InvalidArgument {
            reason: format!("'{s}' is not an 8 digit hex fingerprint"),
        };
        // Only the form `Display` produces: no sign, no upper case.
        let lower_hex = |b: &u8| b.is_ascii_digit() || (b'a'..=b'f').contains(b);
        if s.len() != 8 || !s.as_bytes().iter().all(lower_hex) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(s, 16).map_err(|_| invalid())?;
        if value > HASH_MASK {
            return Err(invalid());
        }
        Ok(Self(value))
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.to_string()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Compute the fingerprint of any serializable value.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<Fingerprint> {
    let canonical = canonical_string(value)?;
    Ok(fingerprint_str(&canonical))
}

/// Hash an already canonical string.
pub fn fingerprint_str(canonical: &str) -> Fingerprint {
    let digest = canonical.encode_utf16().fold(FINGERPRINT_SEED, |h, unit| {
        h.wrapping_mul(33).wrapping_add(u32::from(unit)) & HASH_MASK
    });
    Fingerprint(digest)
}

/// Render a value as compact JSON with map keys sorted recursively.
pub fn canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let tree = serde_json::to_value(value).map_err(|e| ModelError::InvalidArgument {
        reason: e.to_string(),
    })?;
    let mut out = String::new();
    write_canonical(&tree, &mut out);
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
