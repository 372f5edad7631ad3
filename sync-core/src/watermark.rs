//! High-water-mark tracking for incremental resync.
//!
//! A watermark is the latest server timestamp observed across a complete
//! traversal. It is kept per (room, collection) pair and sent as the
//! `updateTimeOffset` of the next incremental traversal, so only records
//! changed since then are re-fetched.
//!
//! Watermarks only move forward: committing an older observation is a no-op.

use roomsync_types::RoomUuid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A server timestamp used as an incremental-sync bookmark.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(u64);

impl Watermark {
    /// Create a watermark with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Watermark meaning "nothing observed yet": fetch everything.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Get the numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Check if nothing has been observed yet.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Watermark({})", self.0)
    }
}

/// Which listing a watermark belongs to. Each is tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// `users/userStreams`: users with nested streams.
    UserStreams,
    /// `users`: flat user listing.
    Users,
    /// `users/streams`: flat stream listing.
    Streams,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UserStreams => "user_streams",
            Self::Users => "users",
            Self::Streams => "streams",
        };
        f.write_str(name)
    }
}

/// Watermarks for every (room, collection) pair.
///
/// Commits are max-merged, not last-writer-wins: when concurrent traversals
/// of one listing commit in either order, the store ends at the larger mark.
/// A slower traversal finishing last never overwrites a newer mark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatermarkStore {
    rooms: BTreeMap<RoomUuid, BTreeMap<CollectionKind, Watermark>>,
}

impl WatermarkStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current watermark, or zero if none was committed.
    pub fn get(&self, room: &RoomUuid, kind: CollectionKind) -> Watermark {
        self.rooms
            .get(room)
            .and_then(|marks| marks.get(&kind))
            .copied()
            .unwrap_or_default()
    }

    /// Commit an observed watermark, returning the stored value.
    ///
    /// The stored value never decreases, and a zero observation commits
    /// nothing.
    pub fn commit(
        &mut self,
        room: &RoomUuid,
        kind: CollectionKind,
        observed: Watermark,
    ) -> Watermark {
        let current = self.get(room, kind);
        if observed <= current {
            return current;
        }
        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(kind, observed);
        observed
    }

    /// Forget every watermark of a room.
    pub fn clear_room(&mut self, room: &RoomUuid) {
        self.rooms.remove(room);
    }

    /// Rooms with at least one committed watermark.
    pub fn rooms(&self) -> impl Iterator<Item = &RoomUuid> {
        self.rooms.keys()
    }

    /// Check if no watermark has been committed.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str) -> RoomUuid {
        RoomUuid::new(id).unwrap()
    }

    #[test]
    fn unknown_pair_reads_zero() {
        let store = WatermarkStore::new();
        assert_eq!(store.get(&room("r1"), CollectionKind::Users), Watermark::zero());
    }

    #[test]
    fn commit_advances_watermark() {
        let mut store = WatermarkStore::new();
        let r = room("r1");

        assert_eq!(
            store.commit(&r, CollectionKind::UserStreams, Watermark::new(100)),
            Watermark::new(100)
        );
        assert_eq!(
            store.commit(&r, CollectionKind::UserStreams, Watermark::new(150)),
            Watermark::new(150)
        );
        assert_eq!(store.get(&r, CollectionKind::UserStreams), Watermark::new(150));
    }

    #[test]
    fn older_observation_does_not_regress() {
        let mut store = WatermarkStore::new();
        let r = room("r1");
        store.commit(&r, CollectionKind::Users, Watermark::new(200));

        let stored = store.commit(&r, CollectionKind::Users, Watermark::new(120));
        assert_eq!(stored, Watermark::new(200));
    }

    #[test]
    fn zero_observation_commits_nothing() {
        let mut store = WatermarkStore::new();
        store.commit(&room("r1"), CollectionKind::Streams, Watermark::zero());
        assert!(store.is_empty());
    }

    #[test]
    fn collections_are_tracked_independently() {
        let mut store = WatermarkStore::new();
        let r = room("r1");
        store.commit(&r, CollectionKind::Users, Watermark::new(10));
        store.commit(&r, CollectionKind::Streams, Watermark::new(20));

        assert_eq!(store.get(&r, CollectionKind::Users), Watermark::new(10));
        assert_eq!(store.get(&r, CollectionKind::Streams), Watermark::new(20));
        assert_eq!(store.get(&r, CollectionKind::UserStreams), Watermark::zero());
        assert_eq!(store.get(&room("r2"), CollectionKind::Users), Watermark::zero());
    }

    #[test]
    fn clear_room_forgets_only_that_room() {
        let mut store = WatermarkStore::new();
        store.commit(&room("r1"), CollectionKind::Users, Watermark::new(10));
        store.commit(&room("r2"), CollectionKind::Users, Watermark::new(20));

        store.clear_room(&room("r1"));

        assert_eq!(store.get(&room("r1"), CollectionKind::Users), Watermark::zero());
        assert_eq!(store.get(&room("r2"), CollectionKind::Users), Watermark::new(20));
        assert_eq!(store.rooms().count(), 1);
    }

    #[test]
    fn store_persists_as_json() {
        let mut store = WatermarkStore::new();
        store.commit(&room("r1"), CollectionKind::UserStreams, Watermark::new(150));

        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"r1":{"user_streams":150}}"#);

        let restored: WatermarkStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, store);
    }
}
