//! # sync-client
//!
//! Client library for roomsync room roster synchronization.
//!
//! This is the main library that applications use to keep a room's users
//! and streams collections up to date.
//!
//! ## Features
//!
//! - **Cursor Pagination**: Walks `nextId` chains to the terminal page
//! - **Incremental Sync**: Per-listing high-water-marks, committed only on success
//! - **Transport Abstraction**: Pluggable transport layer (HTTPS, mock)
//! - **Pure State Machine**: Uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use roomsync_client::{
//!     HttpTransport, HttpTransportConfig, RoomSession, RoomSyncClient, SyncConfig,
//! };
//!
//! let transport = HttpTransport::new(HttpTransportConfig::new(base_url, app_id))?;
//! let client = RoomSyncClient::new(SyncConfig::default(), transport, RoomSession::enter(room));
//!
//! // Full listing, then deltas
//! let room_state = client.snapshot().await?;
//! let changes = client.incremental().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod fetcher;
pub mod session;
pub mod transport;

pub use client::{ClientError, RoomSnapshot, RoomSyncClient, SyncConfig};
pub use fetcher::PageFetcher;
pub use session::RoomSession;
pub use transport::{HttpTransport, HttpTransportConfig, MockTransport, Transport, TransportError};
