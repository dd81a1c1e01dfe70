//! Sync bookmarks
//!
//! A bookmark marks how far a client has read into the modification-ordered
//! stream of one record kind. Clients treat it as an opaque string and hand
//! it back unchanged on their next sync.
//!
//! # Encoding
//!
//! Bookmarks are URL-safe base64 (no padding) of a small versioned JSON
//! document holding the timestamp in microseconds (plus any sub-microsecond
//! remainder), the tiebreak id and the buffer width.

use crate::domain::{FieldsyncError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Default width of the clamp window behind "now", in milliseconds
///
/// Must exceed the worst-case commit latency of the store: a transaction
/// that commits later than this after stamping its rows can be missed.
pub const DEFAULT_BUFFER_MILLIS: i64 = 30_000;

/// Largest accepted buffer width, one day
pub const MAX_BUFFER_MILLIS: i64 = 86_400_000;

const BOOKMARK_VERSION: u8 = 1;

/// Position in the modification-ordered stream of one record kind
///
/// Everything strictly before `timestamp` has been delivered. If
/// `tiebreak_id` is set, records at exactly `timestamp` with an id up to and
/// including it have been delivered too; if it is `None`, nothing at
/// `timestamp` has been delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    timestamp: DateTime<Utc>,
    tiebreak_id: Option<String>,
    buffer_millis: Option<i64>,
}

#[derive(Serialize, Deserialize)]
struct BookmarkWire {
    v: u8,
    ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    buf: Option<i64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    ns: u32,
}

fn is_zero(nanos: &u32) -> bool {
    *nanos == 0
}

impl Bookmark {
    /// Creates a bookmark at `timestamp`
    pub fn new(timestamp: DateTime<Utc>, tiebreak_id: Option<String>) -> Self {
        Self {
            timestamp,
            tiebreak_id,
            buffer_millis: None,
        }
    }

    /// Sets the buffer width used when clamping
    pub fn with_buffer_millis(mut self, buffer_millis: i64) -> Self {
        self.buffer_millis = Some(buffer_millis);
        self
    }

    /// Timestamp boundary
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Id of the last record delivered at exactly `timestamp`
    pub fn tiebreak_id(&self) -> Option<&str> {
        self.tiebreak_id.as_deref()
    }

    /// Buffer width carried by this bookmark
    pub fn buffer_millis(&self) -> Option<i64> {
        self.buffer_millis
    }

    /// Buffer width in effect for clamping, capped at [`MAX_BUFFER_MILLIS`]
    pub fn effective_buffer(&self) -> Duration {
        let millis = self
            .buffer_millis
            .unwrap_or(DEFAULT_BUFFER_MILLIS)
            .clamp(0, MAX_BUFFER_MILLIS);
        Duration::milliseconds(millis)
    }

    /// Decodes a bookmark previously produced by [`Bookmark::serialize`]
    ///
    /// # Errors
    ///
    /// Returns `MalformedBookmark` if the string is not valid base64, not a
    /// bookmark document, of an unknown version, or holds an out-of-range time.
    pub fn from_store(raw: &str) -> Result<Self> {
        let malformed = |reason: &str| FieldsyncError::MalformedBookmark(reason.to_string());

        let bytes = URL_SAFE_NO_PAD
            .decode(raw.trim())
            .map_err(|_| malformed("not valid base64"))?;
        let wire: BookmarkWire =
            serde_json::from_slice(&bytes).map_err(|_| malformed("not a bookmark document"))?;

        if wire.v != BOOKMARK_VERSION {
            return Err(malformed("unsupported bookmark version"));
        }
        if wire.buf.is_some_and(|b| !(0..=MAX_BUFFER_MILLIS).contains(&b)) {
            return Err(malformed("buffer out of range"));
        }
        if wire.ns >= 1_000 {
            return Err(malformed("sub-microsecond part out of range"));
        }
        let timestamp = Utc
            .timestamp_micros(wire.ts)
            .single()
            .and_then(|t| t.checked_add_signed(Duration::nanoseconds(i64::from(wire.ns))))
            .ok_or_else(|| malformed("timestamp out of range"))?;

        Ok(Self {
            timestamp,
            tiebreak_id: wire.id,
            buffer_millis: wire.buf,
        })
    }

    /// Encodes the bookmark as an opaque, URL-safe string
    pub fn serialize(&self) -> String {
        let wire = BookmarkWire {
            v: BOOKMARK_VERSION,
            ts: self.timestamp.timestamp_micros(),
            id: self.tiebreak_id.clone(),
            buf: self.buffer_millis,
            ns: self.timestamp.timestamp_subsec_nanos() % 1_000,
        };
        // A struct of integers and strings always serializes
        let json = serde_json::to_vec(&wire).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Pulls the bookmark back to at most `now - buffer`
    ///
    /// Records stamped within the buffer window may still belong to
    /// uncommitted transactions, so the next sync re-reads that window. When
    /// the timestamp is pulled back the tiebreak is dropped: everything at the
    /// clamped instant is re-read.
    pub fn clamp_to_buffered_request_time(&self, now: DateTime<Utc>) -> Bookmark {
        let boundary = now
            .checked_sub_signed(self.effective_buffer())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        if self.timestamp <= boundary {
            return self.clone();
        }
        Bookmark {
            timestamp: boundary,
            tiebreak_id: None,
            buffer_millis: self.buffer_millis,
        }
    }

    /// Whether a record at `(date_modified, id)` lies after this position
    ///
    /// This is the scan predicate every change store applies.
    pub fn admits(&self, date_modified: DateTime<Utc>, id: &str) -> bool {
        if date_modified != self.timestamp {
            return date_modified > self.timestamp;
        }
        match &self.tiebreak_id {
            None => true,
            Some(tiebreak) => id > tiebreak.as_str(),
        }
    }
}
