//! Content-addressed identifiers for draft actions.
//!
//! A draft's identifier is derived from its text and author only, so the same
//! author submitting the same text twice maps to the same pending entry.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Separator placed between text and author in the hash input.
const FIELD_SEPARATOR: &str = "|";

/// Leading digest bytes kept in an identifier.
const DIGEST_BYTES: usize = 16;

/// Length of an identifier in hex characters. Keeps `cancel|<id>` well
/// inside a 64-byte button payload.
pub const CONTENT_ID_LEN: usize = DIGEST_BYTES * 2;

/// Deterministic identifier of a draft action.
///
/// Always [`CONTENT_ID_LEN`] lowercase hex characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(String);

impl ContentId {
    /// Accept a token received from the wire if it has the shape of a digest.
    pub fn parse(token: &str) -> Option<Self> {
        let valid = token.len() == CONTENT_ID_LEN
            && token
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the content identifier for a draft written by `author`.
pub fn content_id(author: &str, text: &str) -> ContentId {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(FIELD_SEPARATOR.as_bytes());
    hasher.update(author.as_bytes());
    ContentId(hex::encode(&hasher.finalize()[..DIGEST_BYTES]))
}
