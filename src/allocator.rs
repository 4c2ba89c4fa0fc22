//! Card number allocator: a bounded random-generate-and-check loop.
//!
//! A member card number is a 12-character numeric string laid out as
//! `[2-digit prefix][00000][last 5 digits of the member id]`. The prefix is
//! drawn uniformly from 01..=99 and each candidate is checked against the
//! external store before acceptance. The check-then-act sequence carries no
//! transactional guarantee: two concurrent invocations producing the same
//! candidate can both pass the check before either writes.

use rand::Rng;

use crate::ports::{RecordStore, UniquenessOracle};

/// Maximum number of generate-and-check attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 50;

/// Fixed middle segment of every card number.
pub const ZERO_FILL: &str = "00000";

/// Outcome of one allocation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationResult {
    /// The record already carries a card number; nothing was done.
    Skipped(String),
    /// The member identifier was missing or too short.
    Invalid(String),
    /// The attempt budget ran out without finding a free value.
    Exhausted(u32),
    /// A free value was found and persisted.
    Allocated {
        /// The accepted 12-character card number.
        card_number: String,
        /// 1-based count of oracle queries, including the accepting one.
        attempts_used: u32,
    },
    /// Persisting the accepted value failed.
    Failed(String),
}

/// Returns true when an existing card value is non-empty after trimming.
#[must_use]
pub fn already_assigned(existing_card_no: Option<&str>) -> bool {
    existing_card_no.is_some_and(|value| !value.trim().is_empty())
}

/// Returns the last five characters of `s`, or `None` when `s` is shorter.
#[must_use]
pub fn last_five(s: &str) -> Option<&str> {
    let start = s.char_indices().rev().nth(4).map(|(i, _)| i)?;
    Some(&s[start..])
}

/// Allocates and persists a unique member card number for one record.
///
/// Short-circuits when the record already has a value (idempotence guard) or
/// when the member id is missing or shorter than five characters. Otherwise
/// proposes up to [`MAX_ATTEMPTS`] candidates, asking `oracle` whether each
/// is taken. Oracle failures are tolerated: they consume the attempt and the
/// loop continues. The accepted candidate is written exactly once through
/// `store`, keyed by `record_id`.
pub async fn allocate<R: Rng>(
    member_id: Option<&str>,
    existing_card_no: Option<&str>,
    record_id: &str,
    field_name: &str,
    oracle: &dyn UniquenessOracle,
    store: &dyn RecordStore,
    rng: &mut R,
) -> AllocationResult {
    if let Some(existing) = existing_card_no {
        if !existing.trim().is_empty() {
            return AllocationResult::Skipped(existing.to_string());
        }
    }

    let Some(suffix) = member_id.and_then(last_five) else {
        return AllocationResult::Invalid(format!(
            "Invalid member_id: {}. Must be at least 5 digits.",
            member_id.unwrap_or("(missing)")
        ));
    };

    let mut attempts: u32 = 0;
    let mut accepted = None;
    while attempts < MAX_ATTEMPTS {
        let prefix: u32 = rng.gen_range(1..=99);
        let candidate = format!("{prefix:02}{ZERO_FILL}{suffix}");
        attempts += 1;
        match oracle.exists(&candidate).await {
            Ok(false) => {
                accepted = Some(candidate);
                break;
            }
            Ok(true) => eprintln!("duplicate found for {candidate}, attempt {attempts}"),
            // Transient oracle failures consume the attempt without aborting.
            Err(e) => eprintln!("uniqueness check failed on attempt {attempts}: {e}"),
        }
    }

    let Some(card_number) = accepted else {
        return AllocationResult::Exhausted(attempts);
    };

    match store.update_field(record_id, field_name, &card_number).await {
        Ok(()) => AllocationResult::Allocated { card_number, attempts_used: attempts },
        Err(e) => AllocationResult::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{allocate, already_assigned, last_five, AllocationResult, MAX_ATTEMPTS};
    use crate::ports::{ExistsFuture, RecordStore, UniquenessOracle, UpdateFuture};

    /// Oracle scripted to report "taken" for the first `taken` queries.
    struct ScriptedOracle {
        taken: u32,
        calls: AtomicU32,
    }

    impl ScriptedOracle {
        fn taken_for(taken: u32) -> Self {
            Self { taken, calls: AtomicU32::new(0) }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl UniquenessOracle for ScriptedOracle {
        fn exists(&self, _value: &str) -> ExistsFuture<'_> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let taken = n < self.taken;
            Box::pin(async move { Ok(taken) })
        }
    }

    /// Oracle whose every query fails with a transport error.
    struct FailingOracle {
        calls: AtomicU32,
    }

    impl FailingOracle {
        fn new() -> Self {
            Self { calls: AtomicU32::new(0) }
        }
    }

    impl UniquenessOracle for FailingOracle {
        fn exists(&self, _value: &str) -> ExistsFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err("search service unavailable".into()) })
        }
    }

    /// Store that records every update it receives.
    #[derive(Default)]
    struct RecordingStore {
        updates: Mutex<Vec<(String, String, String)>>,
    }

    impl RecordStore for RecordingStore {
        fn update_field(&self, record_id: &str, field_name: &str, value: &str) -> UpdateFuture<'_> {
            self.updates
                .lock()
                .unwrap()
                .push((record_id.into(), field_name.into(), value.into()));
            Box::pin(async { Ok(()) })
        }
    }

    /// Store whose every write is rejected.
    struct FailingStore;

    impl RecordStore for FailingStore {
        fn update_field(
            &self,
            _record_id: &str,
            _field_name: &str,
            _value: &str,
        ) -> UpdateFuture<'_> {
            Box::pin(async { Err("update rejected".into()) })
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[tokio::test]
    async fn skips_when_card_already_assigned() {
        let oracle = ScriptedOracle::taken_for(0);
        let store = RecordingStore::default();
        let result = allocate(
            Some("1234567890"),
            Some("990000067890"),
            "contact-1",
            "member_card_no",
            &oracle,
            &store,
            &mut rng(),
        )
        .await;
        assert_eq!(result, AllocationResult::Skipped("990000067890".into()));
        assert_eq!(oracle.calls(), 0);
        assert!(store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitespace_only_existing_value_is_not_assigned() {
        let oracle = ScriptedOracle::taken_for(0);
        let store = RecordingStore::default();
        let result = allocate(
            Some("1234567890"),
            Some("   "),
            "contact-1",
            "member_card_no",
            &oracle,
            &store,
            &mut rng(),
        )
        .await;
        assert!(matches!(result, AllocationResult::Allocated { .. }));
    }

    #[tokio::test]
    async fn rejects_short_member_id() {
        let oracle = ScriptedOracle::taken_for(0);
        let store = RecordingStore::default();
        let result = allocate(
            Some("1234"),
            None,
            "contact-1",
            "member_card_no",
            &oracle,
            &store,
            &mut rng(),
        )
        .await;
        match result {
            AllocationResult::Invalid(reason) => {
                assert!(reason.contains("Invalid member_id"));
                assert!(reason.contains("1234"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn rejects_missing_member_id() {
        let oracle = ScriptedOracle::taken_for(0);
        let store = RecordingStore::default();
        let result = allocate(
            None,
            None,
            "contact-1",
            "member_card_no",
            &oracle,
            &store,
            &mut rng(),
        )
        .await;
        assert!(matches!(result, AllocationResult::Invalid(_)));
    }

    #[tokio::test]
    async fn candidate_has_fixed_layout() {
        // Across several seeds: 12 chars, prefix in 01..=99, literal middle,
        // suffix equal to the last five digits of the member id.
        for seed in 0..20 {
            let oracle = ScriptedOracle::taken_for(0);
            let store = RecordingStore::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let result = allocate(
                Some("1234567890"),
                None,
                "contact-1",
                "member_card_no",
                &oracle,
                &store,
                &mut rng,
            )
            .await;
            let AllocationResult::Allocated { card_number, attempts_used } = result else {
                panic!("expected allocation for seed {seed}");
            };
            assert_eq!(attempts_used, 1);
            assert_eq!(card_number.len(), 12);
            let prefix: u32 = card_number[..2].parse().unwrap();
            assert!((1..=99).contains(&prefix), "prefix {prefix} out of range");
            assert_eq!(&card_number[2..7], "00000");
            assert_eq!(&card_number[7..], "67890");
        }
    }

    #[tokio::test]
    async fn five_char_member_id_uses_whole_value_as_suffix() {
        let oracle = ScriptedOracle::taken_for(0);
        let store = RecordingStore::default();
        let result = allocate(
            Some("54321"),
            None,
            "contact-1",
            "member_card_no",
            &oracle,
            &store,
            &mut rng(),
        )
        .await;
        let AllocationResult::Allocated { card_number, .. } = result else {
            panic!("expected allocation");
        };
        assert_eq!(&card_number[7..], "54321");
    }

    #[tokio::test]
    async fn attempts_used_counts_the_accepting_call() {
        let oracle = ScriptedOracle::taken_for(3);
        let store = RecordingStore::default();
        let result = allocate(
            Some("1234567890"),
            None,
            "contact-1",
            "member_card_no",
            &oracle,
            &store,
            &mut rng(),
        )
        .await;
        let AllocationResult::Allocated { attempts_used, .. } = result else {
            panic!("expected allocation");
        };
        assert_eq!(attempts_used, 4);
        assert_eq!(oracle.calls(), 4);
    }

    #[tokio::test]
    async fn exhausts_after_fifty_when_every_candidate_is_taken() {
        let oracle = ScriptedOracle::taken_for(u32::MAX);
        let store = RecordingStore::default();
        let result = allocate(
            Some("1234567890"),
            None,
            "contact-1",
            "member_card_no",
            &oracle,
            &store,
            &mut rng(),
        )
        .await;
        assert_eq!(result, AllocationResult::Exhausted(MAX_ATTEMPTS));
        assert_eq!(oracle.calls(), MAX_ATTEMPTS);
        assert!(store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oracle_errors_consume_attempts_without_aborting() {
        let oracle = FailingOracle::new();
        let store = RecordingStore::default();
        let result = allocate(
            Some("1234567890"),
            None,
            "contact-1",
            "member_card_no",
            &oracle,
            &store,
            &mut rng(),
        )
        .await;
        // Pure oracle failure ends in exhaustion, never in Failed.
        assert_eq!(result, AllocationResult::Exhausted(MAX_ATTEMPTS));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn persisted_value_matches_returned_value() {
        let oracle = ScriptedOracle::taken_for(2);
        let store = RecordingStore::default();
        let result = allocate(
            Some("1234567890"),
            None,
            "contact-42",
            "member_card_no",
            &oracle,
            &store,
            &mut rng(),
        )
        .await;
        let AllocationResult::Allocated { card_number, .. } = result else {
            panic!("expected allocation");
        };
        let updates = store.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0], ("contact-42".into(), "member_card_no".into(), card_number));
    }

    #[tokio::test]
    async fn failed_write_is_reported_as_failed() {
        let oracle = ScriptedOracle::taken_for(0);
        let result = allocate(
            Some("1234567890"),
            None,
            "contact-1",
            "member_card_no",
            &oracle,
            &FailingStore,
            &mut rng(),
        )
        .await;
        match result {
            AllocationResult::Failed(message) => assert!(message.contains("update rejected")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn already_assigned_trims_whitespace() {
        assert!(already_assigned(Some("990000012345")));
        assert!(already_assigned(Some("  x  ")));
        assert!(!already_assigned(Some("")));
        assert!(!already_assigned(Some("   ")));
        assert!(!already_assigned(None));
    }

    #[test]
    fn last_five_requires_five_characters() {
        assert_eq!(last_five("1234567890"), Some("67890"));
        assert_eq!(last_five("54321"), Some("54321"));
        assert_eq!(last_five("1234"), None);
        assert_eq!(last_five(""), None);
    }
}
