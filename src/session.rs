//! Visitor session state
//!
//! One [`SessionRecord`] exists per installation. It is created on the first
//! agent initialization, advanced on every later one, and rendered into the
//! `utmcc` cookie parameter of every beacon. The record is never deleted in
//! normal operation.

use rand::Rng;

use crate::beacon;
use crate::store::Store;

/// Domain hash slot of the cookie; the collector accepts a fixed value here.
const DOMAIN_HASH: &str = "999";

/// Upper bound (exclusive) for freshly drawn visitor ids.
const USER_ID_RANGE: u32 = 9_999_999;

/// Visitor identity and visit timestamps, persisted across restarts.
///
/// Invariant: `first_seen_at <= previous_at <= current_at` and
/// `visit_count >= 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Random visitor identifier, stable for the installation's lifetime
    pub user_id: u32,
    /// Unix seconds of the very first visit
    pub first_seen_at: i64,
    /// Unix seconds of the previous visit
    pub previous_at: i64,
    /// Unix seconds of the current visit
    pub current_at: i64,
    /// Number of visits, starting at 1
    pub visit_count: u32,
}

impl SessionRecord {
    /// Mint a record for an installation seen for the first time.
    fn first_visit(now: i64) -> Self {
        Self {
            user_id: rand::thread_rng().gen_range(0..USER_ID_RANGE),
            first_seen_at: now,
            previous_at: now,
            current_at: now,
            visit_count: 1,
        }
    }

    /// Advance the record for a returning visit.
    fn advance(&mut self, now: i64) {
        self.previous_at = self.current_at;
        self.current_at = now;
        self.visit_count += 1;
    }

    /// Render the `__utma` cookie token, encoded for the `utmcc` parameter.
    pub fn cookie(&self) -> String {
        beacon::encode(&format!(
            "__utma={}.{}.{}.{}.{}.{}",
            DOMAIN_HASH,
            self.user_id,
            self.first_seen_at,
            self.previous_at,
            self.current_at,
            self.visit_count
        ))
    }
}

/// Load the stored session and advance it for this visit, or mint a fresh one.
///
/// Either branch persists the result before returning. Store failures
/// degrade rather than escalate: a failed read counts as "no stored
/// session", a failed write keeps the in-memory record for this run only.
pub fn load_or_create(store: &dyn Store, now: i64) -> SessionRecord {
    let stored = match store.session() {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read session record, starting fresh");
            None
        }
    };

    let record = match stored {
        Some(mut record) => {
            record.advance(now);
            record
        }
        None => SessionRecord::first_visit(now),
    };

    if let Err(e) = store.save_session(&record) {
        tracing::warn!(error = %e, "failed to persist session record");
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    #[test]
    fn test_first_visit_invariants() {
        let record = SessionRecord::first_visit(1_000);
        assert_eq!(record.visit_count, 1);
        assert_eq!(record.first_seen_at, 1_000);
        assert_eq!(record.previous_at, 1_000);
        assert_eq!(record.current_at, 1_000);
        assert!(record.user_id < USER_ID_RANGE);
    }

    #[test]
    fn test_advance_shifts_timestamps() {
        let mut record = SessionRecord::first_visit(1_000);
        record.advance(2_000);
        assert_eq!(record.visit_count, 2);
        assert_eq!(record.first_seen_at, 1_000);
        assert_eq!(record.previous_at, 1_000);
        assert_eq!(record.current_at, 2_000);
    }

    #[test]
    fn test_cookie_rendering() {
        let record = SessionRecord {
            user_id: 12345,
            first_seen_at: 10,
            previous_at: 10,
            current_at: 20,
            visit_count: 2,
        };
        // '=' is escaped, '.' is in the safe set
        assert_eq!(record.cookie(), "__utma%3D999.12345.10.10.20.2");
    }

    #[test]
    fn test_load_or_create_persists_and_advances() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = load_or_create(&store, 1_000);
        assert_eq!(first.visit_count, 1);

        // same store, simulated restart
        let second = load_or_create(&store, 2_000);
        assert_eq!(second.visit_count, 2);
        assert_eq!(second.user_id, first.user_id);
        assert_eq!(second.previous_at, first.current_at);
        assert_eq!(second.current_at, 2_000);

        // the stored copy matches what was returned
        assert_eq!(store.session().unwrap().unwrap(), second);
    }
}
