//! Fetch the whole room.

use anyhow::{Context, Result};
use roomsync_client::{RoomSession, RoomSnapshot};

use crate::config::Config;

/// Run the snapshot command.
pub async fn run(config: &Config, json: bool) -> Result<()> {
    let session = RoomSession::enter(config.room()?);
    let client = super::http_client(config, session)?;

    let snapshot = client.snapshot().await.context("Snapshot failed")?;
    println!("{}", render(&snapshot, json)?);
    Ok(())
}

/// Format a snapshot for the terminal.
pub fn render(snapshot: &RoomSnapshot, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(snapshot)?);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Users ({} of {} reported, {} pages):\n",
        snapshot.users.len(),
        snapshot.total,
        snapshot.pages
    ));
    for user in &snapshot.users {
        let presence = if user.online { "online" } else { "offline" };
        out.push_str(&format!(
            "  {}  {:<20} {:?} ({})\n",
            user.uuid, user.name, user.role, presence
        ));
    }

    out.push_str(&format!("Streams ({}):\n", snapshot.streams.len()));
    for stream in &snapshot.streams {
        out.push_str(&format!(
            "  {}  owner={} audio={:?} video={:?}\n",
            stream.uuid, stream.owner, stream.audio, stream.video
        ));
    }

    if snapshot.empty_nestings > 0 {
        out.push_str(&format!(
            "{} users reported no streams\n",
            snapshot.empty_nestings
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsync_client::{MockTransport, RoomSyncClient, SyncConfig};
    use roomsync_types::RoomUuid;
    use serde_json::json;

    async fn sample() -> RoomSnapshot {
        let transport = MockTransport::new();
        transport.queue_ok(json!({
            "list": [
                {"userUuid": "u1", "userName": "Ada", "role": 1,
                 "streams": [{"streamUuid": "s1", "audioState": 1}]},
                {"userUuid": "u2", "userName": "Bob", "role": 2}
            ],
            "nextId": null,
            "total": 2,
            "ts": 10
        }));
        let session = RoomSession::enter(RoomUuid::new("r1").unwrap());
        let client = RoomSyncClient::new(SyncConfig::default(), transport, session);
        client.snapshot().await.unwrap()
    }

    #[tokio::test]
    async fn render_text_lists_users_and_streams() {
        let text = render(&sample().await, false).unwrap();

        assert!(text.contains("Users (2 of 2 reported, 1 pages)"));
        assert!(text.contains("Ada"));
        assert!(text.contains("owner=u1 audio=On"));
        assert!(text.contains("1 users reported no streams"));
    }

    #[tokio::test]
    async fn render_json_is_parseable() {
        let text = render(&sample().await, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["users"][0]["uuid"], "u1");
        assert_eq!(value["streams"][0]["audio"], "on");
        assert!(value["watermark"].is_null());
    }
}
