//! Room session: the room being synchronized and its shared watermarks.

use std::sync::Arc;
use tokio::sync::Mutex;

use roomsync_core::{CollectionKind, Watermark, WatermarkStore};
use roomsync_types::RoomUuid;

/// A joined room.
///
/// Clones share the same store, so concurrent traversals of one room all see
/// each other's commits. Commits are monotone.
#[derive(Debug, Clone)]
pub struct RoomSession {
    room: RoomUuid,
    store: Arc<Mutex<WatermarkStore>>,
}

impl RoomSession {
    /// Join a room with no prior watermarks.
    pub fn enter(room: RoomUuid) -> Self {
        Self::with_store(room, WatermarkStore::new())
    }

    /// Join a room, resuming marks from a persisted store.
    pub fn with_store(room: RoomUuid, store: WatermarkStore) -> Self {
        Self::with_shared_store(room, Arc::new(Mutex::new(store)))
    }

    /// Join a room using a store shared with other sessions.
    pub fn with_shared_store(room: RoomUuid, store: Arc<Mutex<WatermarkStore>>) -> Self {
        Self { room, store }
    }

    /// The room this session synchronizes.
    pub fn room(&self) -> &RoomUuid {
        &self.room
    }

    /// Current mark for a listing of this room.
    pub async fn watermark(&self, kind: CollectionKind) -> Watermark {
        self.store.lock().await.get(&self.room, kind)
    }

    /// Commit an observed mark; returns the mark now stored.
    pub async fn commit(&self, kind: CollectionKind, observed: Watermark) -> Watermark {
        self.store.lock().await.commit(&self.room, kind, observed)
    }

    /// The shared store handle.
    pub fn store(&self) -> Arc<Mutex<WatermarkStore>> {
        Arc::clone(&self.store)
    }

    /// Copy of the store, for persistence.
    pub async fn snapshot_store(&self) -> WatermarkStore {
        self.store.lock().await.clone()
    }

    /// Leave the room, forgetting its marks. Returns the remaining store.
    pub async fn exit(self) -> WatermarkStore {
        let mut store = self.store.lock().await;
        store.clear_room(&self.room);
        store.clone()
    }
}
