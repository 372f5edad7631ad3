//! Normalization of raw listing records into canonical entities.
//!
//! Raw records carry numeric codes and a loosely-typed property bag. This
//! module turns them into [`User`] and [`Stream`], the shapes the rest of the
//! system consumes. Conversion is pure; the only failure is a record whose
//! required fields are missing or unparseable.

use roomsync_types::{StreamRecord, StreamUuid, UserRecord, UserUuid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A record that cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    /// A record whose fields do not have the expected JSON types.
    #[error("undecodable record: {0}")]
    Undecodable(String),

    /// A user record without `userUuid`.
    #[error("user record has no userUuid")]
    MissingUserUuid,

    /// A stream record without `streamUuid`.
    #[error("stream record has no streamUuid (owner: {owner:?})")]
    MissingStreamUuid {
        /// Owner of the offending stream, when known.
        owner: Option<String>,
    },

    /// A flat stream record without an owner.
    #[error("stream {stream} has no userUuid")]
    MissingOwner {
        /// The orphaned stream.
        stream: String,
    },

    /// A coded field holds a value outside its domain.
    #[error("{record} {id}: invalid {field} code {value}")]
    InvalidCode {
        /// "user" or "stream".
        record: &'static str,
        /// Identity of the offending record.
        id: String,
        /// Wire field name.
        field: &'static str,
        /// The rejected value.
        value: i64,
    },
}

/// Role of a user in the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Silent observer (recording bots, supervisors).
    #[default]
    Invisible,
    /// Class host.
    Teacher,
    /// Audience member.
    Student,
    /// Teaching assistant.
    Assistant,
}

impl Role {
    /// Decode a wire role code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Invisible),
            1 => Some(Self::Teacher),
            2 => Some(Self::Student),
            3 => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// On/off state of an audio or video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaState {
    /// Track muted or not published.
    #[default]
    Off,
    /// Track live.
    On,
}

impl MediaState {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::On),
            _ => None,
        }
    }

    /// Check if the track is live.
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

/// Where a stream's audio comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    /// No audio track.
    #[default]
    None,
    /// Microphone capture.
    Microphone,
}

impl AudioSource {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Microphone),
            _ => None,
        }
    }
}

/// Where a stream's video comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    /// No video track.
    #[default]
    None,
    /// Camera capture.
    Camera,
    /// Screen share.
    Screen,
}

impl VideoSource {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Camera),
            2 => Some(Self::Screen),
            _ => None,
        }
    }
}

/// Canonical user entity (attributes only; streams live in their own collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User identity.
    pub uuid: UserUuid,
    /// Display name (empty if the server sent none).
    pub name: String,
    /// Role in the room.
    pub role: Role,
    /// Whether the user is barred from chat.
    pub mute_chat: bool,
    /// Whether the user is currently in the room.
    pub online: bool,
    /// Server-side update time, when reported.
    pub update_time: Option<u64>,
    /// Property bag, key-ordered.
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl User {
    /// Normalize a raw user record, ignoring its nested streams.
    pub fn from_record(record: &UserRecord) -> Result<Self, MalformedRecord> {
        let uuid = record
            .user_uuid
            .clone()
            .and_then(UserUuid::new)
            .ok_or(MalformedRecord::MissingUserUuid)?;

        let invalid = |field: &'static str, value: i64| MalformedRecord::InvalidCode {
            record: "user",
            id: uuid.to_string(),
            field,
            value,
        };

        let role = match record.role {
            None => Role::default(),
            Some(code) => Role::from_code(code).ok_or_else(|| invalid("role", code))?,
        };
        let mute_chat = decode_flag(record.mute_chat).map_err(|v| invalid("muteChat", v))?;
        // Listings without an explicit state only contain present users
        let online = match record.state {
            None => true,
            Some(code) => decode_flag(Some(code)).map_err(|v| invalid("state", v))?,
        };

        let properties = record
            .user_properties
            .as_ref()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Ok(Self {
            uuid,
            name: record.user_name.clone().unwrap_or_default(),
            role,
            mute_chat,
            online,
            update_time: record.update_time,
            properties,
        })
    }
}

/// Canonical stream entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Stream identity.
    pub uuid: StreamUuid,
    /// Publishing user.
    pub owner: UserUuid,
    /// Human-readable name (empty if the server sent none).
    pub name: String,
    /// Audio track state.
    pub audio: MediaState,
    /// Video track state.
    pub video: MediaState,
    /// Audio source kind.
    pub audio_source: AudioSource,
    /// Video source kind.
    pub video_source: VideoSource,
    /// Server-side update time, when reported.
    pub update_time: Option<u64>,
}

impl Stream {
    /// Normalize a raw stream record.
    ///
    /// `parent` is the enclosing user when the record was nested; it is the
    /// owner whenever the record itself omits `userUuid`.
    pub fn from_record(
        record: &StreamRecord,
        parent: Option<&UserUuid>,
    ) -> Result<Self, MalformedRecord> {
        let uuid = record
            .stream_uuid
            .clone()
            .and_then(StreamUuid::new)
            .ok_or_else(|| MalformedRecord::MissingStreamUuid {
                owner: record
                    .user_uuid
                    .clone()
                    .or_else(|| parent.map(|p| p.to_string())),
            })?;

        let owner = match record.user_uuid.clone().and_then(UserUuid::new) {
            Some(owner) => owner,
            None => parent.cloned().ok_or_else(|| MalformedRecord::MissingOwner {
                stream: uuid.to_string(),
            })?,
        };

        let invalid = |field: &'static str, value: i64| MalformedRecord::InvalidCode {
            record: "stream",
            id: uuid.to_string(),
            field,
            value,
        };

        Ok(Self {
            name: record.stream_name.clone().unwrap_or_default(),
            audio: decode(record.audio_state, MediaState::from_code)
                .map_err(|v| invalid("audioState", v))?,
            video: decode(record.video_state, MediaState::from_code)
                .map_err(|v| invalid("videoState", v))?,
            audio_source: decode(record.audio_source_type, AudioSource::from_code)
                .map_err(|v| invalid("audioSourceType", v))?,
            video_source: decode(record.video_source_type, VideoSource::from_code)
                .map_err(|v| invalid("videoSourceType", v))?,
            update_time: record.update_time,
            uuid,
            owner,
        })
    }
}

/// Decode an optional code, defaulting when absent. Returns the bad value on failure.
fn decode<T: Default>(code: Option<i64>, parse: fn(i64) -> Option<T>) -> Result<T, i64> {
    match code {
        None => Ok(T::default()),
        Some(value) => parse(value).ok_or(value),
    }
}

fn decode_flag(code: Option<i64>) -> Result<bool, i64> {
    match code {
        None | Some(0) => Ok(false),
        Some(1) => Ok(true),
        Some(other) => Err(other),
    }
}
