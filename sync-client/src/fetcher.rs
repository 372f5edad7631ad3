//! Page fetcher: one listing request per call, no retry.
//!
//! Turns a [`PageRequest`] into an [`ApiRequest`] for the right listing
//! endpoint and decodes the envelope into a typed [`Page`].

use roomsync_core::{CollectionKind, PageRequest};
use roomsync_types::{ApiRequest, Page, RoomUuid};
use serde_json::Value;

use crate::client::ClientError;
use crate::transport::Transport;

/// Path of a room's listing endpoint, relative to the service prefix.
pub fn listing_path(room: &RoomUuid, kind: CollectionKind) -> String {
    let suffix = match kind {
        CollectionKind::UserStreams => "users/userStreams",
        CollectionKind::Users => "users",
        CollectionKind::Streams => "users/streams",
    };
    format!("/v1/rooms/{room}/{suffix}")
}

/// Build the GET for one page.
///
/// `count` is always sent. `updateTimeOffset` only when `since` is non-zero,
/// `includeOffline=1` only when requested, `nextId` only past the first page.
pub fn build_request(path: String, page: &PageRequest) -> ApiRequest {
    let mut request = ApiRequest::get(path).with_param("count", page.count);
    if !page.since.is_zero() {
        request = request.with_param("updateTimeOffset", page.since.value());
    }
    if page.include_offline {
        request = request.with_param("includeOffline", 1);
    }
    if let Some(token) = page.cursor.as_query_value() {
        request = request.with_param("nextId", token);
    }
    request
}

/// Fetches listing pages through a [`Transport`].
#[derive(Debug)]
pub struct PageFetcher<T: Transport> {
    transport: T,
}

impl<T: Transport> PageFetcher<T> {
    /// Create a fetcher over the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch one page of a listing.
    ///
    /// Entries are left undecoded so a badly typed record can be reported
    /// with its position by the merge. A page without its own `ts` takes the
    /// envelope timestamp.
    pub async fn fetch_page(
        &self,
        room: &RoomUuid,
        kind: CollectionKind,
        page: &PageRequest,
    ) -> Result<Page<Value>, ClientError> {
        let request = build_request(listing_path(room, kind), page);
        let response = self.transport.get(&request).await?;
        let envelope_ts = response.ts;

        let mut decoded: Page<Value> = response.into_data()?;
        if decoded.ts == 0 {
            decoded.ts = envelope_ts.unwrap_or(0);
        }
        Ok(decoded)
    }
}
