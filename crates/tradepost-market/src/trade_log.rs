//! Append-only trade log.
//!
//! Every fill appends two rows under one settlement: a `SELL` row owned by
//! the seller and a `BUY` row owned by the buyer. Rows are never updated
//! or deleted. The anti-flip gate and per-user history views read from
//! here; reads taken outside a fill's critical section may trail it by
//! one append, which the gates tolerate.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tradepost_types::{
    Currency, ItemId, Listing, ListingId, SettlementId, TradeId, TradeRecord, TradeSide, UserId,
};

/// Append-only journal of settled fills.
#[derive(Default)]
pub struct TradeLog {
    rows: RwLock<Vec<TradeRecord>>,
    /// Fills recorded per listing, feeding settlement-ID derivation.
    fill_counts: RwLock<HashMap<ListingId, u64>>,
}

impl TradeLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one settled fill against `listing`, appending the sell-side
    /// and buy-side rows. Returns the settlement ID shared by both.
    pub fn record_fill(
        &self,
        listing: &Listing,
        buyer: UserId,
        quantity: u64,
        total_paid: u64,
        fee: u64,
        executed_at: DateTime<Utc>,
    ) -> SettlementId {
        let fill_seq = {
            let mut counts = self.fill_counts.write();
            let count = counts.entry(listing.id).or_insert(0);
            let seq = *count;
            *count += 1;
            seq
        };
        let settlement = SettlementId::derive(listing.id, fill_seq);

        let base = TradeRecord {
            id: TradeId::new(),
            settlement,
            listing: listing.id,
            side: TradeSide::Sell,
            seller: listing.seller,
            buyer,
            item: listing.item.clone(),
            quantity,
            unit_price: listing.price,
            currency: listing.currency,
            total_paid,
            fee,
            executed_at,
        };
        let buy_row = TradeRecord {
            id: TradeId::new(),
            side: TradeSide::Buy,
            ..base.clone()
        };

        self.rows.write().extend([base, buy_row]);
        tracing::debug!(%settlement, listing = %listing.id, %buyer, quantity, "fill recorded");
        settlement
    }

    /// When `user` last bought `item`, if ever.
    #[must_use]
    pub fn last_buy_at(&self, user: UserId, item: &ItemId) -> Option<DateTime<Utc>> {
        self.rows
            .read()
            .iter()
            .rev()
            .find(|row| row.side == TradeSide::Buy && row.buyer == user && row.item == *item)
            .map(|row| row.executed_at)
    }

    /// Rows owned by `user`, newest first, capped at `limit`.
    #[must_use]
    pub fn history_for(&self, user: UserId, limit: usize) -> Vec<TradeRecord> {
        self.rows
            .read()
            .iter()
            .rev()
            .filter(|row| row.owner() == user)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Both rows of one settlement.
    #[must_use]
    pub fn settlement_rows(&self, settlement: SettlementId) -> Vec<TradeRecord> {
        self.rows
            .read()
            .iter()
            .filter(|row| row.settlement == settlement)
            .cloned()
            .collect()
    }

    /// Total fees collected in `currency`, summed over sell-side rows.
    #[must_use]
    pub fn fees_collected(&self, currency: Currency) -> u64 {
        self.rows
            .read()
            .iter()
            .filter(|row| row.side == TradeSide::Sell && row.currency == currency)
            .map(|row| row.fee)
            .sum()
    }

    /// Total rows in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Whether the log holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}
