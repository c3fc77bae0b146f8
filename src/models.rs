// src/models.rs
//! Data models for the SMS event stream.

use serde::{Deserialize, Serialize};

/// Sender placeholder when the OS reports no originating address.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// One raw message record embedded in a single OS delivery.
///
/// Address and body may be absent; the timestamp is always OS-supplied.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub address: Option<String>,
    pub body: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// One OS delivery. The OS may coalesce several incoming messages into a
/// single broadcast, so a delivery carries an ordered list of raw entries.
#[derive(Debug, Clone, Default)]
pub struct Delivery {
    pub entries: Vec<RawEntry>,
}

/// A received message as pushed to the subscriber.
///
/// Every field is always present; defaults are substituted for anything the
/// OS left out. Serialized with the keys `address`, `body`, `timestamp` when
/// crossing a process boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(rename = "address")]
    pub sender: String,
    pub body: String,
    #[serde(rename = "timestamp")]
    pub received_at_millis: i64,
}

impl MessageEvent {
    /// Builds an event from one raw entry, substituting defaults for missing
    /// fields.
    pub fn from_raw(entry: RawEntry) -> Self {
        Self {
            sender: entry.address.unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            body: entry.body.unwrap_or_default(),
            received_at_millis: entry.timestamp,
        }
    }

    /// Map encoding used when the event crosses a process boundary.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "address": self.sender,
            "body": self.body,
            "timestamp": self.received_at_millis,
        })
    }
}

impl From<RawEntry> for MessageEvent {
    fn from(entry: RawEntry) -> Self {
        Self::from_raw(entry)
    }
}
