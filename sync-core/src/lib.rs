//! # sync-core
//!
//! Pure logic for roomsync (no I/O, instant tests).
//!
//! This crate implements the merge rules and the pagination state machine
//! without any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - [`normalize`] turns raw records into [`User`] and [`Stream`]
//! - [`accumulator`] keeps identity-unique, order-preserving collections
//! - [`merge`] projects pages into the user and stream accumulators
//! - [`traversal`] decides which page to request next and what to commit
//! - [`watermark`] stores the per-listing high-water-marks
//!
//! The actual I/O (page fetches) is performed by `sync-client`, which
//! reports progress back to the traversal state machine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod merge;
pub mod normalize;
pub mod traversal;
pub mod watermark;

pub use accumulator::{Accumulator, Keyed, Upsert};
pub use merge::{
    decode_records, merge_flat_streams, merge_streams, merge_users, MergeError, MergeStats,
    PageProjection,
};
pub use normalize::{AudioSource, MalformedRecord, MediaState, Role, Stream, User, VideoSource};
pub use traversal::{
    PageRequest, Phase, SyncMode, Traversal, TraversalError, TraversalPlan, DEFAULT_MAX_PAGES,
    DEFAULT_PAGE_SIZE,
};
pub use watermark::{CollectionKind, Watermark, WatermarkStore};
