//! Listing storage with row-level locking.
//!
//! Each listing lives behind its own mutex, so operations on different
//! listings never contend. An operation that cannot take a row lock within
//! the configured budget fails with `LockContention` rather than queueing
//! forever.
//!
//! Lock order is fixed: the row map is released before a row lock is
//! taken, and the seller/cooldown indexes are only locked while a row lock
//! is already held (or from `insert`, which takes no row lock). Ledger
//! locks nest strictly inside row locks. Nothing ever locks two rows.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tradepost_types::{
    ItemId, Listing, ListingId, ListingQuery, ListingStatus, MarketError, Page, Result, UserId,
};

/// Concurrent map of listings with per-row locks and guard indexes.
///
/// Rows are never deleted: terminal listings stay resident so history and
/// cursors keep resolving. The store maintains two derived indexes as rows
/// change hands: active listings per seller (for the listing cap) and the
/// last listing time per `(seller, item)` (for the relist cooldown).
pub struct ListingStore {
    rows: RwLock<HashMap<ListingId, Arc<Mutex<Listing>>>>,
    active_by_seller: RwLock<HashMap<UserId, usize>>,
    last_listed: RwLock<HashMap<(UserId, ItemId), DateTime<Utc>>>,
    lock_timeout: Duration,
}

impl ListingStore {
    /// Creates an empty store whose row locks give up after `lock_timeout`.
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            active_by_seller: RwLock::new(HashMap::new()),
            last_listed: RwLock::new(HashMap::new()),
            lock_timeout,
        }
    }

    /// Inserts a freshly created listing and updates the guard indexes.
    ///
    /// The caller guarantees a fresh ID; inserting an existing ID replaces
    /// the row and skews the indexes.
    pub fn insert(&self, listing: Listing) {
        let id = listing.id;
        let seller = listing.seller;
        let key = (seller, listing.item.clone());
        let created_at = listing.created_at;
        let active = listing.status == ListingStatus::Active;

        self.rows.write().insert(id, Arc::new(Mutex::new(listing)));
        if active {
            *self.active_by_seller.write().entry(seller).or_insert(0) += 1;
        }
        self.last_listed.write().insert(key, created_at);
    }

    /// Runs `f` against the listing under its row lock.
    ///
    /// `f` must perform every fallible step before mutating the listing;
    /// on `Err` the row is assumed unchanged. When `f` transitions the row
    /// out of `ACTIVE`, the seller's active count is updated before the
    /// row lock is released.
    pub fn update<R>(
        &self,
        id: ListingId,
        f: impl FnOnce(&mut Listing) -> Result<R>,
    ) -> Result<R> {
        let row = self
            .rows
            .read()
            .get(&id)
            .cloned()
            .ok_or(MarketError::ListingNotFound(id))?;

        let Some(mut listing) = row.try_lock_for(self.lock_timeout) else {
            return Err(MarketError::LockContention(id));
        };

        let was_active = listing.status == ListingStatus::Active;
        let out = f(&mut listing)?;

        if was_active && listing.status.is_terminal() {
            let mut counts = self.active_by_seller.write();
            if let Some(count) = counts.get_mut(&listing.seller) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    counts.remove(&listing.seller);
                }
            }
        }
        Ok(out)
    }

    /// Snapshot of one listing.
    #[must_use]
    pub fn get(&self, id: ListingId) -> Option<Listing> {
        let row = self.rows.read().get(&id).cloned()?;
        let listing = row.lock();
        Some(listing.clone())
    }

    /// Number of `ACTIVE` listings held by `seller`.
    #[must_use]
    pub fn active_count(&self, seller: UserId) -> usize {
        self.active_by_seller
            .read()
            .get(&seller)
            .copied()
            .unwrap_or(0)
    }

    /// When `seller` last listed `item`, if ever.
    #[must_use]
    pub fn last_listed_at(&self, seller: UserId, item: &ItemId) -> Option<DateTime<Utc>> {
        self.last_listed
            .read()
            .get(&(seller, item.clone()))
            .copied()
    }

    /// Pages through `ACTIVE` listings matching `query`.
    ///
    /// The cursor names the last listing of the previous page; results
    /// resume strictly after it in sort order. A cursor whose row no longer
    /// exists yields an empty page, signalling the caller to restart.
    #[must_use]
    pub fn browse(&self, query: &ListingQuery) -> Page<Listing> {
        let mut matched = self.snapshot_where(|listing| {
            listing.status == ListingStatus::Active && query.matches(listing)
        });
        matched.sort_by(|a, b| query.sort.ordering(a, b));

        let start = match query.cursor {
            None => 0,
            Some(cursor) => {
                let Some(cursor_row) = self.get(cursor) else {
                    return Page::empty();
                };
                matched.partition_point(|listing| {
                    query.sort.ordering(listing, &cursor_row) != std::cmp::Ordering::Greater
                })
            }
        };

        let rest = &matched[start..];
        let has_more = rest.len() > query.limit;
        let items: Vec<Listing> = rest.iter().take(query.limit).cloned().collect();
        let next_cursor = if has_more {
            items.last().map(|listing| listing.id)
        } else {
            None
        };

        Page {
            items,
            next_cursor,
            has_more,
        }
    }

    /// All of `seller`'s listings in any state, newest first.
    #[must_use]
    pub fn listings_for_seller(&self, seller: UserId) -> Vec<Listing> {
        let mut rows = self.snapshot_where(|listing| listing.seller == seller);
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows
    }

    /// IDs of `ACTIVE` listings past their deadline as of `now`.
    ///
    /// Rows without a recorded deadline age out `fallback_ttl` after
    /// creation. Candidates must be re-checked under their row lock before
    /// being transitioned; a concurrent buy or cancel may win the race.
    #[must_use]
    pub fn reap_candidates(
        &self,
        now: DateTime<Utc>,
        fallback_ttl: chrono::Duration,
    ) -> Vec<ListingId> {
        let rows: Vec<Arc<Mutex<Listing>>> = self.rows.read().values().cloned().collect();
        rows.iter()
            .filter_map(|row| {
                let listing = row.lock();
                (listing.status == ListingStatus::Active && listing.is_reapable(now, fallback_ttl))
                    .then_some(listing.id)
            })
            .collect()
    }

    /// Total rows, terminal included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Whether the store holds no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn snapshot_where(&self, predicate: impl Fn(&Listing) -> bool) -> Vec<Listing> {
        let rows: Vec<Arc<Mutex<Listing>>> = self.rows.read().values().cloned().collect();
        rows.iter()
            .filter_map(|row| {
                let listing = row.lock();
                predicate(&listing).then(|| listing.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tradepost_types::{Currency, ListingSort};

    fn store() -> ListingStore {
        ListingStore::new(Duration::from_millis(250))
    }

    #[test]
    fn insert_then_get_roundtrips() {
        let store = store();
        let listing = Listing::dummy(UserId::new(), "potion", 5, 10, Currency::Gold);
        let id = listing.id;

        store.insert(listing.clone());

        assert_eq!(store.get(id), Some(listing));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_unknown_returns_none() {
        assert_eq!(store().get(ListingId::new()), None);
    }

    #[test]
    fn update_unknown_returns_not_found() {
        let err = store()
            .update(ListingId::new(), |_| Ok(()))
            .expect_err("no row");
        assert!(matches!(err, MarketError::ListingNotFound(_)));
    }

    #[test]
    fn active_count_tracks_inserts_and_transitions() {
        let store = store();
        let seller = UserId::new();
        let a = Listing::dummy(seller, "potion", 5, 10, Currency::Gold);
        let b = Listing::dummy(seller, "elixir", 5, 10, Currency::Gold);
        let a_id = a.id;
        store.insert(a);
        store.insert(b);
        assert_eq!(store.active_count(seller), 2);

        store
            .update(a_id, Listing::mark_cancelled)
            .expect("cancel one");

        assert_eq!(store.active_count(seller), 1);
    }

    #[test]
    fn failed_update_leaves_active_count_alone() {
        let store = store();
        let seller = UserId::new();
        let listing = Listing::dummy(seller, "potion", 5, 10, Currency::Gold);
        let id = listing.id;
        store.insert(listing);

        let result: Result<()> = store.update(id, |_| Err(MarketError::SelfTrade));
        assert!(result.is_err());
        assert_eq!(store.active_count(seller), 1);
    }

    #[test]
    fn last_listed_at_records_creation_time() {
        let store = store();
        let seller = UserId::new();
        let listing = Listing::dummy(seller, "potion", 5, 10, Currency::Gold);
        let created_at = listing.created_at;
        store.insert(listing);

        assert_eq!(
            store.last_listed_at(seller, &ItemId::new("potion")),
            Some(created_at)
        );
        assert_eq!(store.last_listed_at(seller, &ItemId::new("elixir")), None);
    }

    #[test]
    fn contended_row_times_out_with_transient_error() {
        let store = Arc::new(ListingStore::new(Duration::from_millis(20)));
        let listing = Listing::dummy(UserId::new(), "potion", 5, 10, Currency::Gold);
        let id = listing.id;
        store.insert(listing);

        std::thread::scope(|scope| {
            let holder = Arc::clone(&store);
            scope.spawn(move || {
                holder
                    .update(id, |_| {
                        std::thread::sleep(Duration::from_millis(150));
                        Ok(())
                    })
                    .expect("holder keeps the lock");
            });

            // Let the holder win the row lock first.
            std::thread::sleep(Duration::from_millis(30));
            let err = store.update(id, |_| Ok(())).expect_err("lock is held");
            assert_eq!(err, MarketError::LockContention(id));
            assert!(err.is_retryable());
        });
    }

    #[test]
    fn browse_returns_only_active_rows() {
        let store = store();
        let keep = Listing::dummy(UserId::new(), "potion", 5, 10, Currency::Gold);
        let drop = Listing::dummy(UserId::new(), "potion", 5, 10, Currency::Gold);
        let drop_id = drop.id;
        store.insert(keep.clone());
        store.insert(drop);
        store
            .update(drop_id, Listing::mark_cancelled)
            .expect("cancel");

        let page = store.browse(&ListingQuery::default());

        assert_eq!(page.items, vec![keep]);
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn browse_applies_price_sort_and_filter() {
        let store = store();
        let cheap = Listing::dummy(UserId::new(), "potion", 5, 3, Currency::Gold);
        let mid = Listing::dummy(UserId::new(), "potion", 5, 7, Currency::Gold);
        let rich = Listing::dummy(UserId::new(), "potion", 5, 20, Currency::Gold);
        store.insert(mid.clone());
        store.insert(rich);
        store.insert(cheap.clone());

        let page = store.browse(&ListingQuery {
            max_price: Some(10),
            sort: ListingSort::PriceAsc,
            ..ListingQuery::default()
        });

        assert_eq!(page.items, vec![cheap, mid]);
    }

    #[test]
    fn browse_pages_with_cursor() {
        let store = store();
        let seller = UserId::new();
        for price in 1..=5u64 {
            store.insert(Listing::dummy(seller, "potion", 1, price, Currency::Gold));
        }

        let query = ListingQuery {
            sort: ListingSort::PriceAsc,
            limit: 2,
            ..ListingQuery::default()
        };
        let first = store.browse(&query);
        assert_eq!(
            first.items.iter().map(|l| l.price).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(first.has_more);

        let second = store.browse(&ListingQuery {
            cursor: first.next_cursor,
            ..query.clone()
        });
        assert_eq!(
            second.items.iter().map(|l| l.price).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert!(second.has_more);

        let third = store.browse(&ListingQuery {
            cursor: second.next_cursor,
            ..query
        });
        assert_eq!(
            third.items.iter().map(|l| l.price).collect::<Vec<_>>(),
            vec![5]
        );
        assert!(!third.has_more);
        assert_eq!(third.next_cursor, None);
    }

    #[test]
    fn browse_with_unknown_cursor_yields_empty_page() {
        let store = store();
        store.insert(Listing::dummy(UserId::new(), "potion", 1, 1, Currency::Gold));

        let page = store.browse(&ListingQuery {
            cursor: Some(ListingId::new()),
            ..ListingQuery::default()
        });

        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn cursor_still_resolves_after_row_goes_terminal() {
        let store = store();
        let seller = UserId::new();
        for price in 1..=3u64 {
            store.insert(Listing::dummy(seller, "potion", 1, price, Currency::Gold));
        }
        let query = ListingQuery {
            sort: ListingSort::PriceAsc,
            limit: 1,
            ..ListingQuery::default()
        };
        let first = store.browse(&query);
        let cursor = first.next_cursor.expect("more pages");

        // The cursor row sells out between pages; pagination continues
        // from its position without repeating rows.
        store.update(cursor, |l| l.mark_sold(UserId::new())).expect("sell");

        let second = store.browse(&ListingQuery {
            cursor: Some(cursor),
            ..query
        });
        assert_eq!(
            second.items.iter().map(|l| l.price).collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn seller_listings_include_terminal_rows_newest_first() {
        let store = store();
        let seller = UserId::new();
        let mut first = Listing::dummy(seller, "potion", 1, 1, Currency::Gold);
        first.created_at = Utc::now() - ChronoDuration::seconds(10);
        let first_id = first.id;
        let second = Listing::dummy(seller, "elixir", 1, 1, Currency::Gold);
        store.insert(first);
        store.insert(second);
        store
            .update(first_id, Listing::mark_cancelled)
            .expect("cancel");

        let rows = store.listings_for_seller(seller);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item, ItemId::new("elixir"));
        assert_eq!(rows[1].status, ListingStatus::Cancelled);
    }

    #[test]
    fn reap_candidates_match_expiry_predicate() {
        let store = store();
        let now = Utc::now();

        let mut stale = Listing::dummy(UserId::new(), "potion", 1, 1, Currency::Gold);
        stale.expires_at = Some(now - ChronoDuration::seconds(5));
        let stale_id = stale.id;

        let mut legacy = Listing::dummy(UserId::new(), "potion", 1, 1, Currency::Gold);
        legacy.expires_at = None;
        legacy.created_at = now - ChronoDuration::days(31);
        let legacy_id = legacy.id;

        let fresh = Listing::dummy(UserId::new(), "potion", 1, 1, Currency::Gold);

        store.insert(stale);
        store.insert(legacy);
        store.insert(fresh);

        let mut candidates = store.reap_candidates(now, ChronoDuration::days(30));
        candidates.sort_unstable();
        let mut expected = vec![stale_id, legacy_id];
        expected.sort_unstable();
        assert_eq!(candidates, expected);
    }
}
