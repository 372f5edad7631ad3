//! Fetch changes since the last committed mark.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use roomsync_client::{RoomSession, RoomSyncClient, Transport};

use crate::config::Config;
use crate::state::StateFile;

/// Which listing a sync round walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Listing {
    /// Users with their nested streams.
    #[default]
    UserStreams,
    /// Flat user listing.
    Users,
    /// Flat stream listing.
    Streams,
}

/// Counts reported by one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    /// Users changed.
    pub users: usize,
    /// Streams changed.
    pub streams: usize,
}

/// Run the sync command.
pub async fn run(config: &Config, data_dir: &Path, listing: Listing, watch: bool) -> Result<()> {
    let state = StateFile::in_dir(data_dir);
    let session = RoomSession::with_store(config.room()?, state.load().await?);
    let client = super::http_client(config, session)?;

    if !watch {
        let summary = round(&client, &state, listing).await?;
        print_summary(&summary);
        return Ok(());
    }

    watch_rounds(&client, &state, listing, config.interval(), interrupted()).await
}

/// Run a round every `interval` until `shutdown` resolves.
///
/// Shutdown also cancels a round in flight; its mark is then not persisted.
pub async fn watch_rounds<T, S>(
    client: &RoomSyncClient<T>,
    state: &StateFile,
    listing: Listing,
    interval: Duration,
    shutdown: S,
) -> Result<()>
where
    T: Transport,
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("interrupted, stopping");
                return Ok(());
            }
            outcome = async {
                ticker.tick().await;
                round(client, state, listing).await
            } => match outcome {
                Ok(summary) => print_summary(&summary),
                // The next round resumes from the same mark
                Err(e) => tracing::warn!("sync round failed: {:#}", e),
            },
        }
    }
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// One incremental round, persisting the store afterwards.
pub async fn round<T: Transport>(
    client: &RoomSyncClient<T>,
    state: &StateFile,
    listing: Listing,
) -> Result<RoundSummary> {
    let summary = match listing {
        Listing::UserStreams => {
            let snapshot = client.incremental().await.context("Sync failed")?;
            RoundSummary {
                users: snapshot.users.len(),
                streams: snapshot.streams.len(),
            }
        }
        Listing::Users => RoundSummary {
            users: client.sync_user_list().await.context("Sync failed")?.len(),
            streams: 0,
        },
        Listing::Streams => RoundSummary {
            users: 0,
            streams: client.sync_stream_list().await.context("Sync failed")?.len(),
        },
    };

    state.save(&client.session().snapshot_store().await).await?;
    Ok(summary)
}

fn print_summary(summary: &RoundSummary) {
    println!(
        "{} users, {} streams changed",
        summary.users, summary.streams
    );
}
