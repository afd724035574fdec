//! Domain types: channel identifiers, message identifiers, message records.
//!
//! Message ids are decimal strings compared numerically. Upstream ids grow
//! monotonically per channel, but a plain string comparison would order
//! "10" before "9" once digit counts differ, so [`MessageId`] canonicalizes
//! to decimal digits (leading zeros stripped) and orders by digit count
//! first. Values that are not non-empty decimal strings canonicalize to
//! "0" and can never advance a cursor.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Channel identifier ───────────────────────────────────────────────

/// Opaque identifier of an upstream channel. Used as the pointer-store key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ── Message identifier ───────────────────────────────────────────────

/// Per-channel message identifier with a numeric total order.
///
/// The raw string is preserved as received; comparisons run over the
/// canonical decimal form. Ids can exceed 64-bit ranges, so the order is
/// digit-count first, then byte-wise — exact at arbitrary precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// The zero cursor, smaller than every real message id.
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical decimal digits: leading zeros stripped; anything that is
    /// not a non-empty decimal string collapses to "0".
    fn canonical(&self) -> &str {
        let s = self.0.as_str();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return "0";
        }
        let trimmed = s.trim_start_matches('0');
        if trimmed.is_empty() {
            "0"
        } else {
            trimmed
        }
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for MessageId {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for MessageId {}

impl PartialOrd for MessageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.canonical(), other.canonical());
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

// ── Cursor set ───────────────────────────────────────────────────────

/// Mapping from channel id to the highest acknowledged message id.
pub type CursorSet = BTreeMap<ChannelId, MessageId>;

// ── Message record ───────────────────────────────────────────────────

/// One message as returned by the fetcher.
///
/// Only `sourceChannelId` and `platformMessageId` are inspected; every
/// other payload field rides along untouched in `payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(rename = "sourceChannelId")]
    pub source_channel_id: ChannelId,
    #[serde(rename = "platformMessageId")]
    pub platform_message_id: MessageId,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_numeric_order() {
        assert!(MessageId::from("10") > MessageId::from("9"));
        assert!(MessageId::from("100") > MessageId::from("99"));
        assert!(MessageId::from("7") < MessageId::from("8"));
        assert_eq!(MessageId::from("5"), MessageId::from("5"));
    }

    #[test]
    fn test_message_id_leading_zeros() {
        assert_eq!(MessageId::from("007"), MessageId::from("7"));
        assert!(MessageId::from("010") > MessageId::from("9"));
        assert_eq!(MessageId::from("000"), MessageId::zero());
    }

    #[test]
    fn test_message_id_beyond_u64() {
        // 2^64 is 20 digits; these exceed it.
        let big = MessageId::from("36893488147419103232");
        let bigger = MessageId::from("36893488147419103233");
        assert!(bigger > big);
        assert!(big > MessageId::from("18446744073709551615"));
    }

    #[test]
    fn test_message_id_unparseable_is_zero() {
        assert_eq!(MessageId::from("abc"), MessageId::zero());
        assert_eq!(MessageId::from(""), MessageId::zero());
        assert_eq!(MessageId::from("12x"), MessageId::zero());
        assert_eq!(MessageId::from("-5"), MessageId::zero());
        assert!(MessageId::from("abc") < MessageId::from("1"));
    }

    #[test]
    fn test_message_id_preserves_raw_form() {
        let id = MessageId::from("007");
        assert_eq!(id.as_str(), "007");
        assert_eq!(id.to_string(), "007");
    }

    #[test]
    fn test_message_record_decode() {
        let json = r#"{
            "sourceChannelId": "chan-1",
            "platformMessageId": "42",
            "content": "hello",
            "userName": "alice"
        }"#;
        let record: MessageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source_channel_id.as_str(), "chan-1");
        assert_eq!(record.platform_message_id, MessageId::from("42"));
        assert_eq!(record.payload.get("content").unwrap(), "hello");
        assert_eq!(record.payload.get("userName").unwrap(), "alice");
    }

    #[test]
    fn test_message_record_missing_fields_rejected() {
        let json = r#"{"sourceChannelId": "chan-1"}"#;
        assert!(serde_json::from_str::<MessageRecord>(json).is_err());
    }

    #[test]
    fn test_cursor_set_serde_roundtrip() {
        let mut cursors = CursorSet::new();
        cursors.insert(ChannelId::from("A"), MessageId::from("7"));
        cursors.insert(ChannelId::from("B"), MessageId::from("3"));

        let json = serde_json::to_string(&cursors).unwrap();
        let parsed: CursorSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get(&ChannelId::from("A")), Some(&MessageId::from("7")));
        assert_eq!(parsed.get(&ChannelId::from("B")), Some(&MessageId::from("3")));
    }
}
