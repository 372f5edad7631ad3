//! RoomSyncClient - the main interface for roomsync.
//!
//! This module provides [`RoomSyncClient`], which builds and refreshes a
//! room's user and stream collections from the paginated listings.
//!
//! # Architecture
//!
//! RoomSyncClient uses a pure state machine (from sync-core) for the paging
//! logic and interprets its requests to perform actual I/O via the Transport
//! trait.
//!
//! ```text
//! Application → RoomSyncClient → PageFetcher → Transport → Network
//!                      ↓
//!        sync-core (traversal state machine, mergers)
//! ```
//!
//! Pages are fetched strictly one after another; page N+1 is requested
//! only once page N is merged. A traversal that fails (or whose future is
//! dropped) commits nothing.
//!
//! # Example
//!
//! ```ignore
//! use roomsync_client::{MockTransport, RoomSession, RoomSyncClient, SyncConfig};
//!
//! let session = RoomSession::enter(room);
//! let client = RoomSyncClient::new(SyncConfig::default(), MockTransport::new(), session);
//!
//! let full = client.snapshot().await?;
//! let delta = client.incremental().await?;
//! ```

use roomsync_core::{
    decode_records, merge_flat_streams, merge_users, Accumulator, CollectionKind, MergeError,
    MergeStats, PageProjection, Stream, SyncMode, Traversal, TraversalError, TraversalPlan, User,
    Watermark, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
};
use roomsync_types::{StreamRecord, UserRecord, WireError};
use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroU32;
use thiserror::Error;

use crate::fetcher::PageFetcher;
use crate::session::RoomSession;
use crate::transport::{Transport, TransportError};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service answered with a non-success code.
    #[error("request rejected (code {code}): {message}")]
    Rejected {
        /// Service status code.
        code: i64,
        /// Service message.
        message: String,
    },

    /// A page carried a record that could not be merged.
    #[error("malformed page: {0}")]
    Malformed(#[from] MergeError),

    /// The server's paging misbehaved.
    #[error("protocol error: {0}")]
    Protocol(#[from] TraversalError),

    /// Payload could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Check if the request itself failed (network or service rejection).
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Rejected { .. })
    }

    /// Check if a page's content was rejected.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl From<WireError> for ClientError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::Rejected { code, message } => Self::Rejected { code, message },
            other => Self::Serialization(other.to_string()),
        }
    }
}

/// Configuration for RoomSyncClient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Records requested per page.
    pub page_size: NonZeroU32,
    /// Pages after which a traversal is abandoned.
    pub max_pages: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl SyncConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: NonZeroU32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the page cap.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Build the plan for one traversal.
    pub fn plan(&self, mode: SyncMode, kind: CollectionKind) -> TraversalPlan {
        TraversalPlan::new(mode, kind)
            .with_page_size(self.page_size)
            .with_max_pages(self.max_pages)
    }
}

/// Result of one traversal of the `users/userStreams` listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSnapshot {
    /// Users, in first-seen order.
    pub users: Vec<User>,
    /// Streams flattened out of the users' nested lists, in first-seen order.
    pub streams: Vec<Stream>,
    /// Pages fetched.
    pub pages: u32,
    /// Total reported by the server.
    pub total: u64,
    /// Mark stored after this traversal, if it committed one.
    pub watermark: Option<Watermark>,
    /// Users whose nested stream list was empty.
    pub empty_nestings: usize,
}

/// Bookkeeping of a finished traversal.
#[derive(Debug, Default)]
struct Outcome {
    pages: u32,
    total: u64,
    watermark: Option<Watermark>,
    stats: MergeStats,
}

/// The main sync client.
///
/// Drives traversals for one room. All traversals share the session's
/// watermark store.
pub struct RoomSyncClient<T: Transport> {
    config: SyncConfig,
    fetcher: PageFetcher<T>,
    session: RoomSession,
}

impl<T: Transport> RoomSyncClient<T> {
    /// Create a new RoomSyncClient.
    pub fn new(config: SyncConfig, transport: T, session: RoomSession) -> Self {
        Self {
            config,
            fetcher: PageFetcher::new(transport),
            session,
        }
    }

    /// Fetch the whole room from scratch. Commits nothing.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, ClientError> {
        self.sync_user_streams(SyncMode::Snapshot).await
    }

    /// Fetch everything changed since the last committed mark, offline users
    /// included, and commit the highest timestamp seen.
    pub async fn offline_since_last_check(&self) -> Result<RoomSnapshot, ClientError> {
        self.sync_user_streams(SyncMode::OfflineSinceLastCheck).await
    }

    /// Incremental refresh. The `since` filter is fixed for the whole
    /// traversal; the highest timestamp seen is committed at the end.
    pub async fn incremental(&self) -> Result<RoomSnapshot, ClientError> {
        self.sync_user_streams(SyncMode::Incremental).await
    }

    /// Incremental refresh of the flat user listing.
    pub async fn sync_user_list(&self) -> Result<Vec<User>, ClientError> {
        let mut users = Accumulator::new();
        self.traverse(SyncMode::Incremental, CollectionKind::Users, |entries: &[Value]| {
            merge_users(&mut users, &decode_records::<UserRecord>(entries)?)
        })
        .await?;
        Ok(users.into_vec())
    }

    /// Incremental refresh of the flat stream listing.
    pub async fn sync_stream_list(&self) -> Result<Vec<Stream>, ClientError> {
        let mut streams = Accumulator::new();
        self.traverse(SyncMode::Incremental, CollectionKind::Streams, |entries: &[Value]| {
            merge_flat_streams(&mut streams, &decode_records::<StreamRecord>(entries)?)
        })
        .await?;
        Ok(streams.into_vec())
    }

    /// The session this client commits to.
    pub fn session(&self) -> &RoomSession {
        &self.session
    }

    /// The active configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        self.fetcher.transport()
    }

    async fn sync_user_streams(&self, mode: SyncMode) -> Result<RoomSnapshot, ClientError> {
        let mut users = Accumulator::new();
        let mut streams = Accumulator::new();
        let outcome = self
            .traverse(mode, CollectionKind::UserStreams, |entries: &[Value]| {
                let records = decode_records::<UserRecord>(entries)?;
                Ok(PageProjection::from_records(&records)?.apply(&mut users, &mut streams))
            })
            .await?;

        Ok(RoomSnapshot {
            users: users.into_vec(),
            streams: streams.into_vec(),
            pages: outcome.pages,
            total: outcome.total,
            watermark: outcome.watermark,
            empty_nestings: outcome.stats.empty_nestings,
        })
    }

    /// Walk one listing to its terminal page, merging each page with `merge`
    /// before the next is requested.
    async fn traverse<F>(
        &self,
        mode: SyncMode,
        kind: CollectionKind,
        mut merge: F,
    ) -> Result<Outcome, ClientError>
    where
        F: FnMut(&[Value]) -> Result<MergeStats, MergeError>,
    {
        let room = self.session.room();
        let stored = self.session.watermark(kind).await;
        let mut traversal = Traversal::new(self.config.plan(mode, kind), stored);
        let mut outcome = Outcome::default();

        while let Some(request) = traversal.next_request() {
            let page = match self.fetcher.fetch_page(room, kind, &request).await {
                Ok(page) => page,
                Err(e) => {
                    traversal.fail();
                    tracing::warn!(
                        %room,
                        %kind,
                        %mode,
                        page = traversal.pages() + 1,
                        error = %e,
                        "traversal aborted"
                    );
                    return Err(e);
                }
            };
            tracing::debug!(
                %room,
                %kind,
                page = traversal.pages() + 1,
                records = page.list.len(),
                ts = page.ts,
                "page received"
            );

            outcome.total = outcome.total.max(page.total);
            if let Err(e) = traversal.page_received(page.next_id, page.ts) {
                tracing::warn!(%room, %kind, %mode, error = %e, "traversal aborted");
                return Err(e.into());
            }

            match merge(page.list.as_slice()) {
                Ok(stats) => outcome.stats = outcome.stats.merged(stats),
                Err(e) => {
                    traversal.fail();
                    tracing::warn!(
                        %room,
                        %kind,
                        %mode,
                        page = traversal.pages(),
                        error = %e,
                        "traversal aborted"
                    );
                    return Err(e.into());
                }
            }
            traversal.merge_completed()?;
        }

        outcome.pages = traversal.pages();
        if let Some(observed) = traversal.watermark_to_commit() {
            let stored = self.session.commit(kind, observed).await;
            outcome.watermark = Some(stored);
        }

        tracing::info!(
            %room,
            %kind,
            %mode,
            pages = outcome.pages,
            inserted = outcome.stats.inserted,
            replaced = outcome.stats.replaced,
            watermark = ?outcome.watermark,
            "traversal complete"
        );
        Ok(outcome)
    }
}
