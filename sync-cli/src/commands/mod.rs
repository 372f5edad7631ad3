//! CLI command implementations.

pub mod snapshot;
pub mod status;
pub mod sync;

use anyhow::{Context, Result};
use roomsync_client::{HttpTransport, RoomSession, RoomSyncClient};

use crate::config::Config;

/// Build a client for the configured room over HTTPS.
pub fn http_client(config: &Config, session: RoomSession) -> Result<RoomSyncClient<HttpTransport>> {
    let transport =
        HttpTransport::new(config.transport_config()).context("Failed to build HTTP transport")?;
    Ok(RoomSyncClient::new(config.sync_config()?, transport, session))
}
