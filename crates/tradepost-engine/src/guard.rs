//! Anti-exploit gates applied before a listing is created.
//!
//! Three independent checks, each a pure predicate over store or log state
//! at a caller-supplied instant:
//!
//! 1. Listing cap: a seller may hold at most N `ACTIVE` listings.
//! 2. Relist cooldown: the same seller may not relist the same item within
//!    a short window, which blunts listing-spam loops.
//! 3. Anti-flip: an item bought moments ago cannot be relisted until the
//!    flip window passes, which blunts buy-low-relist-high bots.
//!
//! The indexes these gates read are maintained outside any row lock, so a
//! gate may act on state one operation stale. That slack is accepted: the
//! authoritative inventory reservation still serializes the outcome.

use chrono::{DateTime, Utc};
use tradepost_market::{ListingStore, TradeLog};
use tradepost_types::{ItemId, MarketError, MarketRules, Result, UserId};

/// Stateless bundle of the pre-listing gates.
#[derive(Debug, Clone)]
pub struct AntiExploitGuard {
    rules: MarketRules,
}

impl AntiExploitGuard {
    /// Creates a guard enforcing `rules`.
    #[must_use]
    pub fn new(rules: MarketRules) -> Self {
        Self { rules }
    }

    /// Passes while `seller` holds fewer `ACTIVE` listings than the cap.
    pub fn capacity_ok(&self, store: &ListingStore, seller: UserId) -> Result<()> {
        let active = store.active_count(seller);
        if active >= self.rules.max_active_listings {
            return Err(MarketError::ListingCapReached {
                active,
                cap: self.rules.max_active_listings,
            });
        }
        Ok(())
    }

    /// Passes once the relist cooldown for `(seller, item)` has elapsed.
    pub fn cooldown_ok(
        &self,
        store: &ListingStore,
        seller: UserId,
        item: &ItemId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(listed_at) = store.last_listed_at(seller, item) {
            let ready_at = listed_at + self.rules.relist_cooldown();
            if now < ready_at {
                return Err(MarketError::RelistCooldown {
                    wait_ms: (ready_at - now).num_milliseconds(),
                });
            }
        }
        Ok(())
    }

    /// Passes unless `seller` bought `item` within the flip window.
    pub fn no_instant_flip(
        &self,
        log: &TradeLog,
        seller: UserId,
        item: &ItemId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(bought_at) = log.last_buy_at(seller, item) {
            let ready_at = bought_at + self.rules.flip_window();
            if now < ready_at {
                return Err(MarketError::FlipBlocked {
                    wait_ms: (ready_at - now).num_milliseconds(),
                });
            }
        }
        Ok(())
    }
}
