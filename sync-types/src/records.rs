//! Raw listing payloads, exactly as the service returns them.
//!
//! Every attribute except the nested `streams` list is optional on the wire;
//! identity checks and code parsing happen later, in normalization.

use serde::{Deserialize, Deserializer, Serialize};

use crate::NextCursor;

/// Decode `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A user record from the `users` or `users/userStreams` listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// User identity. Required; `None` makes the record malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_uuid: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Numeric role code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<i64>,
    /// Chat mute flag (0/1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute_chat: Option<i64>,
    /// Presence flag (1 = online, 0 = offline).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<i64>,
    /// Server-side update time of this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<u64>,
    /// Loosely-typed property bag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<serde_json::Map<String, serde_json::Value>>,
    /// Streams owned by this user at fetch time.
    #[serde(default, deserialize_with = "null_as_default")]
    pub streams: Vec<StreamRecord>,
}

impl UserRecord {
    /// Create a record carrying only an identity.
    pub fn with_uuid(user_uuid: impl Into<String>) -> Self {
        Self {
            user_uuid: Some(user_uuid.into()),
            ..Self::default()
        }
    }
}

/// A stream record, either nested in a [`UserRecord`] or from the flat
/// `users/streams` listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    /// Stream identity. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_uuid: Option<String>,
    /// Owning user. Nested records may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_uuid: Option<String>,
    /// Human-readable stream name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_name: Option<String>,
    /// Audio on/off (0/1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_state: Option<i64>,
    /// Video on/off (0/1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_state: Option<i64>,
    /// Audio source code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_source_type: Option<i64>,
    /// Video source code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_source_type: Option<i64>,
    /// Server-side update time of this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<u64>,
}

impl StreamRecord {
    /// Create a record carrying only an identity.
    pub fn with_uuid(stream_uuid: impl Into<String>) -> Self {
        Self {
            stream_uuid: Some(stream_uuid.into()),
            ..Self::default()
        }
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<R> {
    /// Records on this page, in server order.
    #[serde(
        default = "Vec::new",
        deserialize_with = "null_as_default",
        bound(deserialize = "R: Deserialize<'de>")
    )]
    pub list: Vec<R>,
    /// Cursor for the following page; `null` when this is the last page.
    #[serde(default)]
    pub next_id: NextCursor,
    /// Total number of records across all pages.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    /// Number of records on this page, as reported by the server.
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    /// Server timestamp of this page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ts: u64,
}
