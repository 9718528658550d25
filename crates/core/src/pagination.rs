//! Cursor-based pagination for session listings.
//!
//! Listings are ordered `start_at DESC, id DESC`; the id tie-break keeps
//! pages stable when several sessions share a `start_at`. The cursor is the
//! `{id, start_at}` of the last item on a page, serialized as URL-safe
//! base64 over JSON so it round-trips through query strings opaquely.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Clamp a requested page size into `[1, MAX_LIMIT]`, defaulting absent or
/// non-positive values to [`DEFAULT_LIMIT`].
pub fn normalize_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(l) if l > 0 => l.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

/// A decoded pagination position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: DbId,
    pub start_at: Timestamp,
}

/// Why a cursor string failed to decode.
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    #[error("invalid cursor encoding")]
    Encoding(#[from] base64::DecodeError),

    #[error("malformed cursor payload")]
    Payload(#[from] serde_json::Error),
}

impl Cursor {
    /// Encode as an opaque URL-safe token.
    pub fn encode(&self) -> String {
        // Serialization of two plain fields cannot fail.
        let json = serde_json::to_vec(self).expect("cursor serialization");
        URL_SAFE.encode(json)
    }

    /// Decode a token from a query string.
    ///
    /// An empty string means "start from the first page" and decodes to
    /// `None`; anything else must be a token previously produced by
    /// [`Cursor::encode`].
    pub fn decode(encoded: &str) -> Result<Option<Self>, CursorError> {
        if encoded.is_empty() {
            return Ok(None);
        }
        let bytes = URL_SAFE.decode(encoded)?;
        let cursor = serde_json::from_slice(&bytes)?;
        Ok(Some(cursor))
    }
}
