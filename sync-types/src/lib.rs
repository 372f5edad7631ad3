//! # sync-types
//!
//! Wire format types for roomsync, the room roster synchronization layer.
//!
//! This crate provides the foundational types used across all roomsync crates:
//! - [`RoomUuid`], [`UserUuid`], [`StreamUuid`] - Identity types
//! - [`PageCursor`], [`NextCursor`] - Pagination cursors (request and response side)
//! - [`UserRecord`], [`StreamRecord`], [`Page`] - Raw listing payloads
//! - [`ApiRequest`], [`ApiResponse`] - The request/response envelope
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cursor;
mod envelope;
mod error;
mod ids;
mod records;

pub use cursor::{NextCursor, PageCursor};
pub use envelope::{ApiRequest, ApiResponse, SUCCESS_CODE};
pub use error::WireError;
pub use ids::{RoomUuid, StreamUuid, UserUuid};
pub use records::{Page, StreamRecord, UserRecord};
