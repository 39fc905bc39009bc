//! Sync decision engine.
//!
//! Single authority for "should a transfer happen, and in which direction."
//! Both the Puller and the Pusher funnel every candidate document through
//! [`SyncEngine::sync_with`], which holds the entity's lock across
//! decide → transfer → commit. Two concurrent syncs for the same entity can
//! therefore never both apply based on the same stale baseline; fetch and
//! read I/O stays outside the lock.

use std::future::Future;

use tracing::{debug, info, warn};

use flowsync_types::{Decision, FlowDocument, Origin, SkipReason, TrackedEntity};

use crate::error::{SyncError, SyncResult};
use crate::store::EntityStore;

/// Owns the entity store and the comparison/decision algorithm.
pub struct SyncEngine {
    store: EntityStore,
}

impl SyncEngine {
    /// Create an engine over a fresh store.
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// The entity store (for diagnostics and startup registration).
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Pure decision on a locked record.
    ///
    /// - First observation (no confirmed-synced version) always applies.
    /// - Content-identical candidates skip, even if timestamps differ due to
    ///   clock skew or re-serialization.
    /// - Strictly newer candidates apply in the direction implied by origin.
    /// - Equal timestamps with differing content is an anomaly: skip.
    /// - Anything older skips as stale.
    pub fn decide(record: &TrackedEntity, candidate: &FlowDocument, origin: Origin) -> Decision {
        let (Some(last_hash), Some(last_modified)) =
            (&record.last_content_hash, record.last_known_modified)
        else {
            return Decision::Apply(origin);
        };

        if candidate.content_hash() == last_hash.as_str() {
            Decision::Skip(SkipReason::AlreadySynced)
        } else if candidate.modified_at > last_modified {
            Decision::Apply(origin)
        } else if candidate.modified_at == last_modified {
            Decision::Skip(SkipReason::TimestampTie)
        } else {
            Decision::Skip(SkipReason::Stale)
        }
    }

    /// Mark a candidate as the confirmed-synced version. Only called after
    /// the physical transfer fully succeeded.
    fn commit(record: &mut TrackedEntity, candidate: &FlowDocument, origin: Origin) {
        record.last_content_hash = Some(candidate.content_hash().to_string());
        record.last_known_modified = Some(candidate.modified_at);
        record.last_synced_direction = origin.direction();
    }

    /// Decide on `candidate`, run `transfer` if it applies, and commit on
    /// success, all under the entity's lock.
    ///
    /// A transfer failure propagates without committing, so the next natural
    /// trigger retries against the unchanged baseline.
    pub async fn sync_with<F, Fut>(
        &self,
        display_name: &str,
        candidate: FlowDocument,
        origin: Origin,
        transfer: F,
    ) -> SyncResult<Decision>
    where
        F: FnOnce(FlowDocument) -> Fut,
        Fut: Future<Output = SyncResult<()>>,
    {
        if candidate.modified_at.timestamp() < 0 {
            return Err(SyncError::Invariant(format!(
                "negative modification timestamp for {}: {}",
                candidate.entity_id, candidate.modified_at
            )));
        }

        let handle = self.store.entry(&candidate.entity_id, display_name);
        let mut record = handle.lock().await;

        let decision = Self::decide(&record, &candidate, origin);
        match decision {
            Decision::Apply(origin) => {
                transfer(candidate.clone()).await?;
                Self::commit(&mut record, &candidate, origin);
                info!(
                    "Synced {} ({}): {} at {}",
                    record.id,
                    record.display_name,
                    record.last_synced_direction,
                    candidate.modified_at
                );
            }
            Decision::Skip(SkipReason::TimestampTie) => {
                warn!(
                    "Timestamp tie for {} at {}: differing content with equal timestamps, \
                     refusing to apply",
                    candidate.entity_id, candidate.modified_at
                );
            }
            Decision::Skip(reason) => {
                debug!("Skipping {}: {:?}", candidate.entity_id, reason);
            }
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn doc(content: &str, secs: i64) -> FlowDocument {
        FlowDocument::new("bot-1", Bytes::copy_from_slice(content.as_bytes()), ts(secs))
    }

    fn engine() -> SyncEngine {
        SyncEngine::new(EntityStore::new())
    }

    async fn apply_ok(engine: &SyncEngine, d: FlowDocument, origin: Origin) -> Decision {
        engine
            .sync_with("support", d, origin, |_| async { Ok(()) })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_observation_always_applies() {
        let engine = engine();
        // Timestamp value is irrelevant on first observation.
        let decision = apply_ok(&engine, doc("v1", 5), Origin::Remote).await;
        assert_eq!(decision, Decision::Apply(Origin::Remote));

        let record = engine.store().get("bot-1").await.unwrap();
        assert_eq!(record.last_known_modified, Some(ts(5)));
    }

    #[tokio::test]
    async fn test_identical_candidate_is_idempotent() {
        let engine = engine();
        apply_ok(&engine, doc("v1", 100), Origin::Remote).await;

        let second = apply_ok(&engine, doc("v1", 100), Origin::Remote).await;
        assert_eq!(second, Decision::Skip(SkipReason::AlreadySynced));
    }

    #[tokio::test]
    async fn test_identical_content_skips_despite_newer_timestamp() {
        // Re-serialization can bump timestamps without changing content.
        let engine = engine();
        apply_ok(&engine, doc("v1", 100), Origin::Remote).await;

        let skewed = apply_ok(&engine, doc("v1", 200), Origin::Local).await;
        assert_eq!(skewed, Decision::Skip(SkipReason::AlreadySynced));
    }

    #[tokio::test]
    async fn test_stale_candidate_never_applies() {
        let engine = engine();
        apply_ok(&engine, doc("v2", 150), Origin::Local).await;

        for stale_ts in [100, 149] {
            let decision = apply_ok(&engine, doc("v1", stale_ts), Origin::Remote).await;
            assert_eq!(decision, Decision::Skip(SkipReason::Stale));
        }

        let record = engine.store().get("bot-1").await.unwrap();
        assert_eq!(record.last_known_modified, Some(ts(150)));
    }

    #[tokio::test]
    async fn test_timestamp_tie_with_differing_content_skips() {
        let engine = engine();
        apply_ok(&engine, doc("v1", 100), Origin::Remote).await;

        let tie = apply_ok(&engine, doc("v1-other", 100), Origin::Local).await;
        assert_eq!(tie, Decision::Skip(SkipReason::TimestampTie));
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_record_uncommitted() {
        let engine = engine();
        apply_ok(&engine, doc("v1", 100), Origin::Remote).await;

        let result = engine
            .sync_with("support", doc("v2", 150), Origin::Local, |_| async {
                Err(SyncError::Conflict { entity_id: "bot-1".into() })
            })
            .await;
        assert!(result.is_err());

        // Baseline unchanged; a retry with the same candidate applies.
        let record = engine.store().get("bot-1").await.unwrap();
        assert_eq!(record.last_known_modified, Some(ts(100)));

        let retry = apply_ok(&engine, doc("v2", 150), Origin::Local).await;
        assert_eq!(retry, Decision::Apply(Origin::Local));
    }

    #[tokio::test]
    async fn test_negative_timestamp_is_fatal() {
        let engine = engine();
        let result = engine
            .sync_with("support", doc("v1", -1), Origin::Remote, |_| async { Ok(()) })
            .await;
        assert!(matches!(result, Err(SyncError::Invariant(_))));
    }

    #[tokio::test]
    async fn test_no_lost_update_under_concurrency() {
        let transfers = Arc::new(AtomicUsize::new(0));

        // Older candidate A and newer candidate B race in both orders.
        for (first, second) in [(("v-a", 100), ("v-b", 200)), (("v-b", 200), ("v-a", 100))] {
            let engine = Arc::new(SyncEngine::new(EntityStore::new()));
            let t1 = {
                let engine = engine.clone();
                let transfers = transfers.clone();
                let d = doc(first.0, first.1);
                tokio::spawn(async move {
                    engine
                        .sync_with("support", d, Origin::Remote, |_| async move {
                            // Widen the race window inside the critical section.
                            tokio::task::yield_now().await;
                            transfers.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .await
                })
            };
            let t2 = {
                let engine = engine.clone();
                let transfers = transfers.clone();
                let d = doc(second.0, second.1);
                tokio::spawn(async move {
                    engine
                        .sync_with("support", d, Origin::Local, |_| async move {
                            tokio::task::yield_now().await;
                            transfers.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .await
                })
            };
            t1.await.unwrap().unwrap();
            t2.await.unwrap().unwrap();

            // Whichever order the tasks ran, B's state wins.
            let record = engine.store().get("bot-1").await.unwrap();
            assert_eq!(record.last_known_modified, Some(ts(200)));
            assert_eq!(
                record.last_content_hash.as_deref(),
                Some(doc("v-b", 200).content_hash())
            );
        }
    }

    #[tokio::test]
    async fn test_pull_edit_push_scenario() {
        // The full bot-1 walkthrough: pull v1, no-op push offer, local edit
        // to v2, push, then the next pull of v2 must not echo back.
        let engine = engine();

        let pulled = apply_ok(&engine, doc("v1", 100), Origin::Remote).await;
        assert_eq!(pulled, Decision::Apply(Origin::Remote));

        let offered = apply_ok(&engine, doc("v1", 100), Origin::Local).await;
        assert_eq!(offered, Decision::Skip(SkipReason::AlreadySynced));

        let edited = apply_ok(&engine, doc("v2", 150), Origin::Local).await;
        assert_eq!(edited, Decision::Apply(Origin::Local));

        let echoed = apply_ok(&engine, doc("v2", 150), Origin::Remote).await;
        assert_eq!(echoed, Decision::Skip(SkipReason::AlreadySynced));

        let record = engine.store().get("bot-1").await.unwrap();
        assert_eq!(record.last_known_modified, Some(ts(150)));
        assert_eq!(
            record.last_synced_direction,
            flowsync_types::SyncDirection::Pushed
        );
    }

    #[tokio::test]
    async fn test_empty_content_is_a_valid_candidate() {
        let engine = engine();
        let empty = FlowDocument::new("bot-1", Bytes::new(), ts(100));
        let decision = engine
            .sync_with("support", empty, Origin::Remote, |_| async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(decision, Decision::Apply(Origin::Remote));
    }
}
