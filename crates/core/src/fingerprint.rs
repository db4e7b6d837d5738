//! Content fingerprints for submitted models.
//!
//! A [`Fingerprint`] is the SHA-256 digest of the raw model bytes rendered as
//! lowercase hex. It doubles as the job identifier and as the name of the
//! job's storage directory, so [`Fingerprint::parse`] only accepts strings of
//! exactly that shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Length of a rendered fingerprint in characters.
pub const FINGERPRINT_LEN: usize = 64;

/// Deterministic identifier derived from model text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of the given model text.
    pub fn of(model: &str) -> Self {
        let hash = Sha256::digest(model.as_bytes());
        Self(format!("{hash:x}"))
    }

    /// Validate an identifier received from outside (e.g. a URL segment).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let well_formed = raw.len() == FINGERPRINT_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));

        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(CoreError::InvalidFingerprint(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Fingerprint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}
