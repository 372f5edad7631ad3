//! User and stream projection mergers.
//!
//! A `users/userStreams` page carries user records with their streams nested
//! inside. Merging projects each page into two accumulators:
//! - users, with the nested list stripped,
//! - streams, flattened across all users of the page.
//!
//! Both use the same rule: replace in place on identity match, append
//! otherwise. A page is validated as a whole before anything is applied, so a
//! malformed record leaves both accumulators untouched.

use roomsync_types::{StreamRecord, UserRecord, UserUuid};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::accumulator::{Accumulator, Upsert};
use crate::normalize::{MalformedRecord, Stream, User};

/// A page that could not be merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// A record failed validation.
    #[error("malformed record at position {position}: {source}")]
    Malformed {
        /// Position of the offending record within the page.
        position: usize,
        /// What was wrong with it.
        #[source]
        source: MalformedRecord,
    },
}

impl MergeError {
    fn at(position: usize) -> impl FnOnce(MalformedRecord) -> Self {
        move |source| Self::Malformed { position, source }
    }
}

/// Counters describing one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// New identities appended.
    pub inserted: usize,
    /// Existing identities replaced in place.
    pub replaced: usize,
    /// User records whose nested stream list was empty.
    pub empty_nestings: usize,
}

impl MergeStats {
    fn record(&mut self, outcome: Upsert) {
        match outcome {
            Upsert::Inserted(_) => self.inserted += 1,
            Upsert::Replaced(_) => self.replaced += 1,
        }
    }

    /// Combine two sets of counters.
    pub fn merged(self, other: Self) -> Self {
        Self {
            inserted: self.inserted + other.inserted,
            replaced: self.replaced + other.replaced,
            empty_nestings: self.empty_nestings + other.empty_nestings,
        }
    }
}

/// A validated, normalized page of user-with-streams records.
#[derive(Debug, Clone, PartialEq)]
pub struct PageProjection {
    users: Vec<User>,
    nested: Vec<(UserUuid, Vec<Stream>)>,
}

impl PageProjection {
    /// Validate and normalize every record of a page.
    pub fn from_records(records: &[UserRecord]) -> Result<Self, MergeError> {
        let mut users = Vec::with_capacity(records.len());
        let mut nested = Vec::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let user = User::from_record(record).map_err(MergeError::at(position))?;
            let streams = record
                .streams
                .iter()
                .map(|s| Stream::from_record(s, Some(&user.uuid)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(MergeError::at(position))?;
            nested.push((user.uuid.clone(), streams));
            users.push(user);
        }

        Ok(Self { users, nested })
    }

    /// Number of user records on the page.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if the page carried no records.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Fold the user attributes into an accumulator.
    pub fn apply_users(&self, acc: &mut Accumulator<User>) -> MergeStats {
        let mut stats = MergeStats::default();
        for user in &self.users {
            stats.record(acc.upsert(user.clone()));
        }
        stats
    }

    /// Fold the nested streams into an accumulator, in page order.
    ///
    /// The accumulator evolves item by item: a stream appended earlier in the
    /// page is replaced by a later record with the same identity.
    pub fn apply_streams(&self, acc: &mut Accumulator<Stream>) -> MergeStats {
        let mut stats = MergeStats::default();
        for (owner, streams) in &self.nested {
            if streams.is_empty() {
                tracing::warn!(user = %owner, "user record carries an empty stream list");
                stats.empty_nestings += 1;
                continue;
            }
            for stream in streams {
                stats.record(acc.upsert(stream.clone()));
            }
        }
        stats
    }

    /// Fold the page into both accumulators.
    pub fn apply(
        &self,
        users: &mut Accumulator<User>,
        streams: &mut Accumulator<Stream>,
    ) -> MergeStats {
        let user_stats = self.apply_users(users);
        let stream_stats = self.apply_streams(streams);
        user_stats.merged(stream_stats)
    }
}

/// Decode raw page entries into typed records.
///
/// Every entry is decoded before any is returned; the first entry with a
/// wrongly typed field fails the page with its position.
pub fn decode_records<R: DeserializeOwned>(
    entries: &[serde_json::Value],
) -> Result<Vec<R>, MergeError> {
    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            R::deserialize(entry)
                .map_err(|e| MalformedRecord::Undecodable(e.to_string()))
                .map_err(MergeError::at(position))
        })
        .collect()
}

/// Merge a page of user records into the user accumulator.
///
/// Nested streams are ignored. Fails without touching `acc` if any record
/// lacks an identity.
pub fn merge_users(
    acc: &mut Accumulator<User>,
    records: &[UserRecord],
) -> Result<MergeStats, MergeError> {
    Ok(PageProjection::from_records(records)?.apply_users(acc))
}

/// Merge the nested stream lists of a page into the stream accumulator.
pub fn merge_streams(
    acc: &mut Accumulator<Stream>,
    records: &[UserRecord],
) -> Result<MergeStats, MergeError> {
    Ok(PageProjection::from_records(records)?.apply_streams(acc))
}

/// Merge a page from the flat `users/streams` listing.
///
/// Every record must name its owner.
pub fn merge_flat_streams(
    acc: &mut Accumulator<Stream>,
    records: &[StreamRecord],
) -> Result<MergeStats, MergeError> {
    let streams = records
        .iter()
        .enumerate()
        .map(|(position, r)| Stream::from_record(r, None).map_err(MergeError::at(position)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut stats = MergeStats::default();
    for stream in streams {
        stats.record(acc.upsert(stream));
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::MediaState;
    use roomsync_types::StreamUuid;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<UserRecord> {
        serde_json::from_value(value).unwrap()
    }

    fn user_ids(acc: &Accumulator<User>) -> Vec<&str> {
        acc.iter().map(|u| u.uuid.as_str()).collect()
    }

    fn stream_ids(acc: &Accumulator<Stream>) -> Vec<&str> {
        acc.iter().map(|s| s.uuid.as_str()).collect()
    }

    fn sid(id: &str) -> StreamUuid {
        StreamUuid::new(id).unwrap()
    }

    // ===========================================
    // User Merger Tests
    // ===========================================

    #[test]
    fn users_append_in_page_order() {
        let mut acc = Accumulator::new();
        let stats = merge_users(
            &mut acc,
            &records(json!([{"userUuid": "u1"}, {"userUuid": "u2"}, {"userUuid": "u3"}])),
        )
        .unwrap();

        assert_eq!(user_ids(&acc), vec!["u1", "u2", "u3"]);
        assert_eq!(stats.inserted, 3);
        assert_eq!(stats.replaced, 0);
    }

    #[test]
    fn updated_user_keeps_its_position() {
        let mut acc = Accumulator::new();
        merge_users(
            &mut acc,
            &records(json!([{"userUuid": "u1", "userName": "old"}, {"userUuid": "u2"}])),
        )
        .unwrap();

        let stats = merge_users(
            &mut acc,
            &records(json!([{"userUuid": "u3"}, {"userUuid": "u1", "userName": "new"}])),
        )
        .unwrap();

        assert_eq!(user_ids(&acc), vec!["u1", "u2", "u3"]);
        assert_eq!(acc.as_slice()[0].name, "new");
        assert_eq!(stats.replaced, 1);
        assert_eq!(stats.inserted, 1);
    }

    #[test]
    fn user_merge_strips_nested_streams() {
        let mut users = Accumulator::new();
        merge_users(
            &mut users,
            &records(json!([{"userUuid": "u1", "streams": [{"streamUuid": "s1"}]}])),
        )
        .unwrap();
        // User entity has no stream field at all; only attributes survive
        let user = &users.as_slice()[0];
        assert_eq!(user.uuid.as_str(), "u1");
    }

    #[test]
    fn duplicate_user_within_page_is_deduplicated() {
        let mut acc = Accumulator::new();
        merge_users(
            &mut acc,
            &records(json!([
                {"userUuid": "u1", "userName": "first"},
                {"userUuid": "u2"},
                {"userUuid": "u1", "userName": "second"}
            ])),
        )
        .unwrap();

        assert_eq!(user_ids(&acc), vec!["u1", "u2"]);
        assert_eq!(acc.as_slice()[0].name, "second");
    }

    #[test]
    fn missing_user_uuid_rejects_whole_page() {
        let mut acc = Accumulator::new();
        merge_users(&mut acc, &records(json!([{"userUuid": "u0"}]))).unwrap();

        let err = merge_users(
            &mut acc,
            &records(json!([{"userUuid": "u1"}, {"userName": "nobody"}])),
        )
        .unwrap_err();

        assert_eq!(
            err,
            MergeError::Malformed {
                position: 1,
                source: MalformedRecord::MissingUserUuid
            }
        );
        // Nothing from the rejected page was applied
        assert_eq!(user_ids(&acc), vec!["u0"]);
    }

    // ===========================================
    // Stream Merger Tests
    // ===========================================

    #[test]
    fn nested_streams_flatten_across_users() {
        let mut acc = Accumulator::new();
        merge_streams(
            &mut acc,
            &records(json!([
                {"userUuid": "u1", "streams": [{"streamUuid": "s1"}, {"streamUuid": "s2"}]},
                {"userUuid": "u2", "streams": [{"streamUuid": "s3"}]}
            ])),
        )
        .unwrap();

        assert_eq!(stream_ids(&acc), vec!["s1", "s2", "s3"]);
        assert_eq!(acc.get(&sid("s3")).unwrap().owner.as_str(), "u2");
    }

    #[test]
    fn updated_stream_keeps_its_position() {
        let mut acc = Accumulator::new();
        merge_streams(
            &mut acc,
            &records(json!([
                {"userUuid": "u1",
                 "streams": [{"streamUuid": "s1", "audioState": 1}, {"streamUuid": "s2"}]}
            ])),
        )
        .unwrap();

        merge_streams(
            &mut acc,
            &records(json!([
                {"userUuid": "u1", "streams": [{"streamUuid": "s1", "audioState": 0}]}
            ])),
        )
        .unwrap();

        assert_eq!(stream_ids(&acc), vec!["s1", "s2"]);
        assert_eq!(acc.get(&sid("s1")).unwrap().audio, MediaState::Off);
    }

    #[test]
    fn later_duplicate_in_same_page_replaces_earlier() {
        let mut acc = Accumulator::new();
        merge_streams(
            &mut acc,
            &records(json!([
                {"userUuid": "u1", "streams": [{"streamUuid": "s1", "videoState": 1}]},
                {"userUuid": "u1",
                 "streams": [{"streamUuid": "s1", "videoState": 0}, {"streamUuid": "s2"}]}
            ])),
        )
        .unwrap();

        assert_eq!(stream_ids(&acc), vec!["s1", "s2"]);
        assert_eq!(acc.get(&sid("s1")).unwrap().video, MediaState::Off);
    }

    #[test]
    fn empty_nesting_is_counted_not_fatal() {
        let mut acc = Accumulator::new();
        let stats = merge_streams(
            &mut acc,
            &records(json!([
                {"userUuid": "u1", "streams": []},
                {"userUuid": "u2"},
                {"userUuid": "u3", "streams": [{"streamUuid": "s3"}]}
            ])),
        )
        .unwrap();

        assert_eq!(stats.empty_nestings, 2);
        assert_eq!(stream_ids(&acc), vec!["s3"]);
    }

    #[test]
    fn nested_stream_without_uuid_is_malformed() {
        let mut acc = Accumulator::new();
        let err = merge_streams(
            &mut acc,
            &records(json!([
                {"userUuid": "u1", "streams": [{"streamUuid": "s1"}]},
                {"userUuid": "u2", "streams": [{"streamName": "cam"}]}
            ])),
        )
        .unwrap_err();

        assert!(matches!(err, MergeError::Malformed { position: 1, .. }));
        assert!(acc.is_empty());
    }

    #[test]
    fn flat_streams_merge_by_identity() {
        let mut acc = Accumulator::new();
        let flat: Vec<StreamRecord> = serde_json::from_value(json!([
            {"streamUuid": "s1", "userUuid": "u1"},
            {"streamUuid": "s2", "userUuid": "u2"},
            {"streamUuid": "s1", "userUuid": "u1", "streamName": "renamed"}
        ]))
        .unwrap();

        let stats = merge_flat_streams(&mut acc, &flat).unwrap();
        assert_eq!(stream_ids(&acc), vec!["s1", "s2"]);
        assert_eq!(acc.get(&sid("s1")).unwrap().name, "renamed");
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.replaced, 1);
    }

    // ===========================================
    // Merge Property Tests
    // ===========================================

    fn sample_page() -> Vec<UserRecord> {
        records(json!([
            {"userUuid": "u1", "userName": "Ada", "role": 1,
             "streams": [{"streamUuid": "s1", "audioState": 1, "videoState": 1}]},
            {"userUuid": "u2", "userProperties": {"k": "v"},
             "streams": [{"streamUuid": "s2"}, {"streamUuid": "s3", "videoSourceType": 2}]},
            {"userUuid": "u3", "streams": []}
        ]))
    }

    #[test]
    fn merging_same_page_twice_is_idempotent() {
        let page = PageProjection::from_records(&sample_page()).unwrap();

        let mut users_once = Accumulator::new();
        let mut streams_once = Accumulator::new();
        page.apply(&mut users_once, &mut streams_once);

        let mut users_twice = users_once.clone();
        let mut streams_twice = streams_once.clone();
        let stats = page.apply(&mut users_twice, &mut streams_twice);

        assert_eq!(users_once, users_twice);
        assert_eq!(streams_once, streams_twice);
        assert_eq!(stats.inserted, 0);
        assert_eq!(stats.replaced, 6);
    }

    #[test]
    fn identities_stay_unique_across_overlapping_pages() {
        let mut users = Accumulator::new();
        let mut streams = Accumulator::new();
        let pages = [
            records(json!([{"userUuid": "a", "streams": [{"streamUuid": "x"}]},
                           {"userUuid": "b", "streams": [{"streamUuid": "y"}]}])),
            records(json!([{"userUuid": "b", "streams": [{"streamUuid": "y"}, {"streamUuid": "z"}]},
                           {"userUuid": "c", "streams": [{"streamUuid": "x"}]}])),
            records(json!([{"userUuid": "a", "streams": [{"streamUuid": "z"}]}])),
        ];

        for page in &pages {
            PageProjection::from_records(page)
                .unwrap()
                .apply(&mut users, &mut streams);
        }

        let mut seen = std::collections::HashSet::new();
        assert!(users.iter().all(|u| seen.insert(u.uuid.clone())));
        let mut seen = std::collections::HashSet::new();
        assert!(streams.iter().all(|s| seen.insert(s.uuid.clone())));
        assert_eq!(user_ids(&users), vec!["a", "b", "c"]);
        assert_eq!(stream_ids(&streams), vec!["x", "y", "z"]);
        // x was re-published by c on the second page
        assert_eq!(streams.get(&sid("x")).unwrap().owner.as_str(), "c");
    }

    // ===========================================
    // Record Decoding Tests
    // ===========================================

    #[test]
    fn decode_records_keeps_page_order() {
        let entries = vec![json!({"userUuid": "u1"}), json!({"userUuid": "u2"})];
        let decoded: Vec<UserRecord> = decode_records(&entries).unwrap();

        assert_eq!(decoded[1].user_uuid.as_deref(), Some("u2"));
    }

    #[test]
    fn non_string_user_uuid_is_malformed_at_its_position() {
        let entries = vec![json!({"userUuid": "u1"}), json!({"userUuid": 42})];

        let err = decode_records::<UserRecord>(&entries).unwrap_err();

        assert!(matches!(
            err,
            MergeError::Malformed {
                position: 1,
                source: MalformedRecord::Undecodable(_),
            }
        ));
    }

    #[test]
    fn wrongly_typed_nested_stream_fails_its_user() {
        let entries = vec![json!({
            "userUuid": "u1",
            "streams": [{"streamUuid": "s1", "audioState": "on"}]
        })];

        let err = decode_records::<UserRecord>(&entries).unwrap_err();
        assert!(matches!(err, MergeError::Malformed { position: 0, .. }));
    }

    #[test]
    fn non_object_stream_entry_is_malformed() {
        let entries = vec![json!({"streamUuid": "s1", "userUuid": "u1"}), json!("s2")];

        let err = decode_records::<StreamRecord>(&entries).unwrap_err();
        assert!(matches!(err, MergeError::Malformed { position: 1, .. }));
    }
}
