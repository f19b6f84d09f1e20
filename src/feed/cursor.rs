//! Page cursor codec
//!
//! A cursor records the position of the last post handed out on a page so the
//! next request can resume right after it. On the wire it is a small protobuf
//! message encoded as unpadded URL-safe base64. It is neither signed nor
//! encrypted: a tampered cursor can only move the caller around their own
//! feed, so decoded values are never validated, only compared.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use prost::Message;

/// Protobuf shape of a page token.
#[derive(Clone, PartialEq, Message)]
struct PageToken {
    #[prost(uint64, tag = "1")]
    id: u64,
    #[prost(uint32, tag = "2")]
    page_size: u32,
    #[prost(int64, tag = "3")]
    updated_at: i64,
}

/// Resumption point for keyset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// `updated_at` of the last post returned
    pub last_seen_time: i64,
    /// `id` of the last post returned
    pub last_seen_id: u64,
    /// Page size in effect when the cursor was issued
    pub page_size: u32,
}

impl Cursor {
    pub fn new(last_seen_time: i64, last_seen_id: u64, page_size: u32) -> Self {
        Self {
            last_seen_time,
            last_seen_id,
            page_size,
        }
    }

    /// Encode to the opaque transport string.
    pub fn encode(&self) -> String {
        let token = PageToken {
            id: self.last_seen_id,
            page_size: self.page_size,
            updated_at: self.last_seen_time,
        };

        URL_SAFE_NO_PAD.encode(token.encode_to_vec())
    }

    /// Decode an opaque transport string.
    ///
    /// Returns `None` for the empty string, for anything that is not a valid
    /// token, and for a token with every field zero. Callers treat `None` as
    /// "start from the newest post".
    pub fn decode(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }

        let bytes = match URL_SAFE_NO_PAD.decode(raw) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::debug!(%error, "Ignoring page token with invalid base64");
                return None;
            }
        };

        let token = match PageToken::decode(bytes.as_slice()) {
            Ok(token) => token,
            Err(error) => {
                tracing::debug!(%error, "Ignoring undecodable page token");
                return None;
            }
        };

        if token == PageToken::default() {
            return None;
        }

        Some(Self::new(token.updated_at, token.id, token.page_size))
    }
}

/// Encode a resumption point without building a [`Cursor`] first.
pub fn encode(last_seen_time: i64, last_seen_id: u64, page_size: u32) -> String {
    Cursor::new(last_seen_time, last_seen_id, page_size).encode()
}

/// Decode a transport string; see [`Cursor::decode`].
pub fn decode(raw: &str) -> Option<Cursor> {
    Cursor::decode(raw)
}
