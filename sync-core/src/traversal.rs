//! Traversal state machine for cursor-paginated listings.
//!
//! A traversal walks a listing from its first page to the terminal cursor:
//!
//! ```text
//! Start → (Fetching → Merging)* → Done
//!              ↓
//!            Failed
//! ```
//!
//! This module only tracks state: which cursor to request next, how many pages
//! were seen, and the highest server timestamp observed. The caller performs
//! the fetch and the merge and reports back. Nothing here does I/O.

use roomsync_types::{NextCursor, PageCursor};
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroU32;
use thiserror::Error;

use crate::watermark::{CollectionKind, Watermark};

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(1000) {
    Some(size) => size,
    None => unreachable!(),
};

/// Default cap on pages per traversal.
pub const DEFAULT_MAX_PAGES: u32 = 10_000;

/// How a traversal filters and whether it commits a watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncMode {
    /// Everyone currently online, full scan, nothing committed.
    Snapshot,
    /// Everyone including offline users, changed since the last check.
    OfflineSinceLastCheck,
    /// Periodic delta resync from the stored watermark.
    Incremental,
}

impl SyncMode {
    /// Whether offline users are requested.
    pub fn include_offline(&self) -> bool {
        !matches!(self, Self::Snapshot)
    }

    /// Whether the traversal filters by, and commits, a watermark.
    pub fn commits_watermark(&self) -> bool {
        !matches!(self, Self::Snapshot)
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Snapshot => "snapshot",
            Self::OfflineSinceLastCheck => "offline_since_last_check",
            Self::Incremental => "incremental",
        };
        f.write_str(name)
    }
}

/// Parameters of one traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalPlan {
    /// Filtering and commit behaviour.
    pub mode: SyncMode,
    /// Which listing, and so which watermark, is traversed.
    pub kind: CollectionKind,
    /// Records per page.
    pub page_size: NonZeroU32,
    /// Pages after which the traversal is abandoned.
    pub max_pages: u32,
}

impl TraversalPlan {
    /// Create a plan with default page size and page cap.
    pub fn new(mode: SyncMode, kind: CollectionKind) -> Self {
        Self {
            mode,
            kind,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
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
}

/// Parameters for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Where to resume.
    pub cursor: PageCursor,
    /// Records per page.
    pub count: NonZeroU32,
    /// Only records updated after this mark (zero = all records).
    pub since: Watermark,
    /// Whether offline users are included.
    pub include_offline: bool,
}

/// Phase of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet.
    Start,
    /// A page request is outstanding.
    Fetching,
    /// A page arrived and is being merged.
    Merging,
    /// The terminal cursor was reached and the last page merged.
    Done,
    /// The traversal was aborted.
    Failed,
}

/// Invalid progress reported to a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    /// The server returned `""` as the next cursor.
    #[error("server returned an empty cursor after page {page}")]
    EmptyCursor {
        /// Pages received so far.
        page: u32,
    },

    /// The server returned a cursor it had already handed out.
    #[error("server repeated cursor {cursor:?}")]
    RepeatedCursor {
        /// The repeated token.
        cursor: String,
    },

    /// The page cap was reached before the terminal cursor.
    #[error("traversal exceeded {limit} pages")]
    PageLimitExceeded {
        /// The configured cap.
        limit: u32,
    },

    /// An event arrived in a phase that does not accept it.
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition {
        /// Current phase.
        phase: Phase,
        /// Attempted step.
        action: &'static str,
    },
}

/// State of one traversal.
#[derive(Debug, Clone)]
pub struct Traversal {
    plan: TraversalPlan,
    since: Watermark,
    phase: Phase,
    next: Option<PageCursor>,
    seen: HashSet<String>,
    pages: u32,
    max_ts: Watermark,
}

impl Traversal {
    /// Start a traversal.
    ///
    /// `stored` is the watermark committed by the previous traversal of the
    /// same listing. It is ignored in [`SyncMode::Snapshot`], and otherwise
    /// fixed for every page of this traversal.
    pub fn new(plan: TraversalPlan, stored: Watermark) -> Self {
        let since = if plan.mode.commits_watermark() {
            stored
        } else {
            Watermark::zero()
        };
        Self {
            plan,
            since,
            phase: Phase::Start,
            next: Some(PageCursor::Start),
            seen: HashSet::new(),
            pages: 0,
            max_ts: Watermark::zero(),
        }
    }

    /// The request to issue next, or `None` once the traversal is over.
    ///
    /// Moves `Start` to `Fetching`.
    pub fn next_request(&mut self) -> Option<PageRequest> {
        match self.phase {
            Phase::Start | Phase::Fetching => {
                let cursor = self.next.clone()?;
                self.phase = Phase::Fetching;
                Some(PageRequest {
                    cursor,
                    count: self.plan.page_size,
                    since: self.since,
                    include_offline: self.plan.mode.include_offline(),
                })
            }
            Phase::Merging | Phase::Done | Phase::Failed => None,
        }
    }

    /// Record the arrival of a page. Moves `Fetching` to `Merging`.
    pub fn page_received(&mut self, next: NextCursor, ts: u64) -> Result<(), TraversalError> {
        if self.phase != Phase::Fetching {
            return Err(TraversalError::InvalidTransition {
                phase: self.phase,
                action: "receive a page",
            });
        }

        self.pages += 1;
        self.max_ts = self.max_ts.max(Watermark::new(ts));

        self.next = match next.into_token() {
            None => None,
            Some(token) if token.is_empty() => {
                return Err(self.abort(TraversalError::EmptyCursor { page: self.pages }));
            }
            Some(token) => {
                if !self.seen.insert(token.clone()) {
                    return Err(self.abort(TraversalError::RepeatedCursor { cursor: token }));
                }
                if self.pages >= self.plan.max_pages {
                    return Err(self.abort(TraversalError::PageLimitExceeded {
                        limit: self.plan.max_pages,
                    }));
                }
                Some(PageCursor::At(token))
            }
        };

        self.phase = Phase::Merging;
        Ok(())
    }

    /// Record that the current page was merged.
    ///
    /// Moves `Merging` to `Fetching` when more pages remain, else to `Done`.
    pub fn merge_completed(&mut self) -> Result<(), TraversalError> {
        if self.phase != Phase::Merging {
            return Err(TraversalError::InvalidTransition {
                phase: self.phase,
                action: "complete a merge",
            });
        }
        self.phase = if self.next.is_some() {
            Phase::Fetching
        } else {
            Phase::Done
        };
        Ok(())
    }

    /// Abort the traversal. Nothing will be committed.
    pub fn fail(&mut self) {
        self.phase = Phase::Failed;
        self.next = None;
    }

    fn abort(&mut self, error: TraversalError) -> TraversalError {
        self.fail();
        error
    }

    /// The watermark to commit, once the traversal is `Done`.
    ///
    /// `None` for snapshots, unfinished or failed traversals, and traversals
    /// that observed no server timestamp.
    pub fn watermark_to_commit(&self) -> Option<Watermark> {
        let committable = self.phase == Phase::Done
            && self.plan.mode.commits_watermark()
            && !self.max_ts.is_zero();
        committable.then_some(self.max_ts)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The plan this traversal runs.
    pub fn plan(&self) -> &TraversalPlan {
        &self.plan
    }

    /// The `since` filter sent with every page.
    pub fn since(&self) -> Watermark {
        self.since
    }

    /// Pages received so far.
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Highest server timestamp observed so far.
    pub fn max_ts(&self) -> Watermark {
        self.max_ts
    }

    /// Check if the traversal reached the terminal cursor.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}
