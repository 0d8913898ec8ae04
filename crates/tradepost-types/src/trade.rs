//! Trade-log rows.
//!
//! Every fill writes two rows sharing one [`SettlementId`]: a `SELL` row
//! owned by the seller and a `BUY` row owned by the buyer. Rows are
//! append-only; history views and the anti-flip gate read them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::ids::{ItemId, ListingId, SettlementId, TradeId, UserId};

/// Which side of the fill a trade row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// One side of a settled fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Unique row ID.
    pub id: TradeId,
    /// Settlement this row belongs to. Shared with the opposite side.
    pub settlement: SettlementId,
    /// Listing the fill executed against.
    pub listing: ListingId,
    /// Side recorded by this row.
    pub side: TradeSide,
    /// Seller of the fill.
    pub seller: UserId,
    /// Buyer of the fill.
    pub buyer: UserId,
    /// Item kind traded.
    pub item: ItemId,
    /// Units transferred.
    pub quantity: u64,
    /// Price per unit at execution.
    pub unit_price: u64,
    /// Settlement currency.
    pub currency: Currency,
    /// Gross amount the buyer paid.
    pub total_paid: u64,
    /// Platform fee withheld from the seller's proceeds.
    pub fee: u64,
    /// Execution time.
    pub executed_at: DateTime<Utc>,
}

impl TradeRecord {
    /// The user this row belongs to: the seller for `SELL` rows, the buyer
    /// for `BUY` rows.
    #[must_use]
    pub fn owner(&self) -> UserId {
        match self.side {
            TradeSide::Sell => self.seller,
            TradeSide::Buy => self.buyer,
        }
    }

    /// Whether `user` took part in this fill on either side.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.seller == user || self.buyer == user
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade[{}] {} {} x{} @ {} = {} {}",
            self.id, self.side, self.item, self.quantity, self.unit_price, self.total_paid, self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(side: TradeSide, seller: UserId, buyer: UserId) -> TradeRecord {
        let listing = ListingId::new();
        TradeRecord {
            id: TradeId::new(),
            settlement: SettlementId::derive(listing, 0),
            listing,
            side,
            seller,
            buyer,
            item: ItemId::new("potion"),
            quantity: 4,
            unit_price: 5,
            currency: Currency::Gold,
            total_paid: 20,
            fee: 1,
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn sell_row_belongs_to_seller() {
        let seller = UserId::new();
        let buyer = UserId::new();
        let row = make_row(TradeSide::Sell, seller, buyer);
        assert_eq!(row.owner(), seller);
    }

    #[test]
    fn buy_row_belongs_to_buyer() {
        let seller = UserId::new();
        let buyer = UserId::new();
        let row = make_row(TradeSide::Buy, seller, buyer);
        assert_eq!(row.owner(), buyer);
    }

    #[test]
    fn involves_matches_both_parties() {
        let seller = UserId::new();
        let buyer = UserId::new();
        let row = make_row(TradeSide::Sell, seller, buyer);

        assert!(row.involves(seller));
        assert!(row.involves(buyer));
        assert!(!row.involves(UserId::new()));
    }

    #[test]
    fn display_summarizes_fill() {
        let row = make_row(TradeSide::Buy, UserId::new(), UserId::new());
        let text = row.to_string();
        assert!(text.contains("BUY potion x4 @ 5 = 20 GOLD"));
    }
}
