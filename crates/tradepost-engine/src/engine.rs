//! Marketplace operations.
//!
//! Each mutating operation runs its checks in a fixed order and reports
//! the first violation. Effects follow a strict discipline inside the
//! listing's row lock: every fallible step (checks, the single fallible
//! resource mutation) happens before any infallible one, so a rejected
//! operation leaves no partial state behind.
//!
//! Notifications go out after the row lock is released. They are
//! best-effort; a failed send is logged and dropped.

use std::sync::Arc;

use chrono::Utc;
use tradepost_market::{ListingStore, TradeLog};
use tradepost_types::{
    constants, CleanupReport, Currency, CurrencyPort, InventoryPort, ItemId, Listing, ListingId,
    ListingQuery, ListingStatus, MarketError, MarketRules, NotifyKind, NotifyPort, Page, Result,
    TradeReceipt, TradeRecord, UserId,
};

use crate::guard::AntiExploitGuard;

/// The marketplace engine.
///
/// Owns no resources itself: balances, inventory, and notification
/// delivery are injected ports, and listing rows and the trade log are
/// injected stores. One engine value is shared freely across threads.
pub struct MarketplaceEngine {
    rules: MarketRules,
    guard: AntiExploitGuard,
    currency: Arc<dyn CurrencyPort>,
    inventory: Arc<dyn InventoryPort>,
    store: Arc<ListingStore>,
    log: Arc<TradeLog>,
    notifier: Arc<dyn NotifyPort>,
}

impl MarketplaceEngine {
    /// Builds an engine over the given ports and stores.
    #[must_use]
    pub fn new(
        rules: MarketRules,
        currency: Arc<dyn CurrencyPort>,
        inventory: Arc<dyn InventoryPort>,
        store: Arc<ListingStore>,
        log: Arc<TradeLog>,
        notifier: Arc<dyn NotifyPort>,
    ) -> Self {
        let guard = AntiExploitGuard::new(rules.clone());
        Self {
            rules,
            guard,
            currency,
            inventory,
            store,
            log,
            notifier,
        }
    }

    /// Effective rules.
    #[must_use]
    pub fn rules(&self) -> &MarketRules {
        &self.rules
    }

    /// Creates a listing, escrowing `quantity` units of `item` at `price`
    /// per unit.
    ///
    /// Check order: bounds, listing cap, inventory, relist cooldown,
    /// anti-flip. The inventory reservation is the authoritative resource
    /// check; the listing only comes into existence once it succeeds.
    /// Creation notifies nobody.
    pub fn create_listing(
        &self,
        seller: UserId,
        item: ItemId,
        quantity: u64,
        price: u64,
        currency: Currency,
    ) -> Result<Listing> {
        let now = Utc::now();

        if quantity == 0 || quantity > self.rules.max_listing_quantity {
            return Err(MarketError::InvalidQuantity {
                given: quantity,
                min: 1,
                max: self.rules.max_listing_quantity,
            });
        }
        if price < self.rules.min_price || price > self.rules.max_price {
            return Err(MarketError::InvalidPrice {
                given: price,
                min: self.rules.min_price,
                max: self.rules.max_price,
            });
        }

        self.guard.capacity_ok(&self.store, seller)?;

        let available = self.inventory.quantity_of(seller, &item);
        if available < quantity {
            return Err(MarketError::InsufficientInventory {
                needed: quantity,
                available,
            });
        }
        if self.inventory.is_equipped(seller, &item) {
            return Err(MarketError::ItemEquipped(item));
        }

        self.guard.cooldown_ok(&self.store, seller, &item, now)?;
        self.guard.no_instant_flip(&self.log, seller, &item, now)?;

        // Authoritative reservation: a racing listing may have drained the
        // holding since the read above, so this can still reject.
        self.inventory.reserve(seller, &item, quantity)?;

        let listing = Listing::new(
            seller,
            item,
            quantity,
            price,
            currency,
            now,
            self.rules.listing_ttl(),
        );
        self.store.insert(listing.clone());

        tracing::info!(
            listing = %listing.id,
            %seller,
            item = %listing.item,
            quantity,
            price,
            %currency,
            "listing created"
        );
        Ok(listing)
    }

    /// Buys `quantity` units from a listing at its asking price.
    ///
    /// Check order: listing is `ACTIVE`, not expired, buyer is not the
    /// seller, enough units remain, buyer can pay. The currency settlement
    /// is the one fallible effect; once it lands, the row mutation, the
    /// item delivery, and the trade-log append are all infallible, so the
    /// whole fill commits or none of it does.
    pub fn buy_listing(
        &self,
        buyer: UserId,
        listing_id: ListingId,
        quantity: u64,
    ) -> Result<TradeReceipt> {
        if quantity == 0 {
            return Err(MarketError::InvalidQuantity {
                given: 0,
                min: 1,
                max: self.rules.max_listing_quantity,
            });
        }
        let now = Utc::now();

        let receipt = self.store.update(listing_id, |listing| {
            if listing.status != ListingStatus::Active {
                return Err(MarketError::ListingNotActive {
                    listing: listing_id,
                    status: listing.status,
                });
            }
            if listing.is_expired(now) {
                return Err(MarketError::ListingExpired(listing_id));
            }
            if buyer == listing.seller {
                return Err(MarketError::SelfTrade);
            }
            if quantity > listing.quantity {
                return Err(MarketError::Oversold {
                    requested: quantity,
                    remaining: listing.quantity,
                });
            }

            let total = listing.total_price(quantity)?;
            let (fee, proceeds) = self.rules.split_fee(total);

            self.currency
                .settle(buyer, listing.seller, listing.currency, total, proceeds)?;

            if quantity == listing.quantity {
                listing.mark_sold(buyer)?;
            } else {
                listing.record_partial_fill(quantity)?;
            }
            self.inventory.credit(buyer, &listing.item, quantity);
            let settlement = self.log.record_fill(listing, buyer, quantity, total, fee, now);

            Ok(TradeReceipt {
                settlement,
                item: listing.item.clone(),
                listing: listing.clone(),
                quantity,
                unit_price: listing.price,
                total_price: total,
                fee,
                seller_proceeds: proceeds,
                currency: listing.currency,
                executed_at: now,
            })
        })?;

        tracing::info!(
            settlement = %receipt.settlement,
            listing = %listing_id,
            %buyer,
            seller = %receipt.listing.seller,
            quantity,
            total = receipt.total_price,
            fee = receipt.fee,
            digest = %receipt.digest_hex(),
            "trade settled"
        );

        self.dispatch(
            receipt.listing.seller,
            NotifyKind::MarketSale,
            "Item sold",
            &format!(
                "{quantity}x {} sold for {} {}",
                receipt.item, receipt.total_price, receipt.currency
            ),
        );
        self.dispatch(
            buyer,
            NotifyKind::MarketPurchase,
            "Purchase complete",
            &format!(
                "You bought {quantity}x {} for {} {}",
                receipt.item, receipt.total_price, receipt.currency
            ),
        );

        Ok(receipt)
    }

    /// Cancels a listing and returns its remaining units to the seller.
    ///
    /// Only the listing's owner may cancel, and only while it is `ACTIVE`.
    pub fn cancel_listing(&self, listing_id: ListingId, requester: UserId) -> Result<()> {
        let restored = self.store.update(listing_id, |listing| {
            if listing.seller != requester {
                return Err(MarketError::NotListingOwner(listing_id));
            }
            if listing.status != ListingStatus::Active {
                return Err(MarketError::NotCancellable {
                    listing: listing_id,
                    status: listing.status,
                });
            }
            let quantity = listing.quantity;
            listing.mark_cancelled()?;
            self.inventory.release(listing.seller, &listing.item, quantity);
            Ok(quantity)
        })?;

        tracing::info!(listing = %listing_id, %requester, restored, "listing cancelled");
        Ok(())
    }

    /// Sweeps `ACTIVE` listings past their deadline, returning their units
    /// to their sellers.
    ///
    /// Each listing is swept atomically on its own; the sweep as a whole
    /// is not a transaction. Rows that lose a race to a buy or cancel, or
    /// whose lock cannot be taken in time, are skipped and picked up by
    /// the next run. Idempotent and safe to schedule at any cadence.
    pub fn cleanup_expired_listings(&self) -> CleanupReport {
        let now = Utc::now();
        let ttl = self.rules.listing_ttl();
        let candidates = self.store.reap_candidates(now, ttl);
        let scanned = candidates.len();

        let mut restored = 0usize;
        for id in candidates {
            let swept = self.store.update(id, |listing| {
                if listing.status != ListingStatus::Active || !listing.is_reapable(now, ttl) {
                    return Ok(false);
                }
                let quantity = listing.quantity;
                listing.mark_expired()?;
                self.inventory.release(listing.seller, &listing.item, quantity);
                Ok(true)
            });
            match swept {
                Ok(true) => restored += 1,
                Ok(false) => {}
                Err(err) => tracing::warn!(listing = %id, %err, "sweep skipped a listing"),
            }
        }

        if scanned > 0 {
            tracing::info!(scanned, restored, "expiry sweep complete");
        }
        CleanupReport { scanned, restored }
    }

    /// Snapshot of one listing in any state.
    #[must_use]
    pub fn get_listing(&self, id: ListingId) -> Option<Listing> {
        self.store.get(id)
    }

    /// Pages through `ACTIVE` listings matching `query`. The requested
    /// limit is clamped to the configured page-size bounds.
    #[must_use]
    pub fn list_listings(&self, query: &ListingQuery) -> Page<Listing> {
        self.store.browse(&query.clamped(self.rules.max_page_size))
    }

    /// All of `seller`'s listings in any state, newest first.
    #[must_use]
    pub fn seller_listings(&self, seller: UserId) -> Vec<Listing> {
        self.store.listings_for_seller(seller)
    }

    /// `user`'s trade rows, newest first, capped at the history limit.
    #[must_use]
    pub fn trade_history(&self, user: UserId, limit: usize) -> Vec<TradeRecord> {
        self.log
            .history_for(user, limit.min(constants::MAX_HISTORY_ROWS))
    }

    fn dispatch(&self, user: UserId, kind: NotifyKind, title: &str, body: &str) {
        if let Err(err) = self.notifier.notify(user, kind, title, body) {
            tracing::warn!(%user, %kind, %err, "notification dropped");
        }
    }
}
