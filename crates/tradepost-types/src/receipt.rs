//! Operation results returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::ids::{ItemId, SettlementId};
use crate::listing::Listing;

/// Result of a successful purchase.
///
/// `fee + seller_proceeds == total_price` holds for every receipt the
/// engine issues; the fee is floored and the seller absorbs the remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    /// Settlement shared by the two trade-log rows of this fill.
    pub settlement: SettlementId,
    /// Listing snapshot taken after the fill was applied.
    pub listing: Listing,
    /// Item kind purchased.
    pub item: ItemId,
    /// Units purchased.
    pub quantity: u64,
    /// Price per unit at execution.
    pub unit_price: u64,
    /// Gross amount debited from the buyer.
    pub total_price: u64,
    /// Platform fee withheld.
    pub fee: u64,
    /// Net amount credited to the seller.
    pub seller_proceeds: u64,
    /// Settlement currency.
    pub currency: Currency,
    /// Execution time.
    pub executed_at: DateTime<Utc>,
}

impl TradeReceipt {
    /// SHA-256 digest over the receipt's settlement-relevant fields.
    ///
    /// Logged at settlement time so an audit trail can detect tampered or
    /// divergent records without storing full receipts.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(b"tradepost:receipt:v1:");
        hasher.update(self.settlement.0.as_bytes());
        hasher.update(self.listing.id.0.as_bytes());
        hasher.update(self.quantity.to_le_bytes());
        hasher.update(self.unit_price.to_le_bytes());
        hasher.update(self.total_price.to_le_bytes());
        hasher.update(self.fee.to_le_bytes());
        hasher.finalize().into()
    }

    /// Hex form of [`TradeReceipt::digest`] for log lines.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

/// Summary of one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Listings that matched the expiry predicate when the sweep started.
    pub scanned: usize,
    /// Listings actually transitioned to `EXPIRED` with items restored.
    pub restored: usize,
}
