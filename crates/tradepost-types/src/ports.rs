//! Ports the engine is constructed over.
//!
//! The engine never owns balances, inventory, or delivery channels; it is
//! handed implementations of these traits and drives them. The reference
//! implementations live in `tradepost-ledger`; adapters over external
//! systems implement the same traits.

use crate::currency::Currency;
use crate::error::Result;
use crate::ids::{ItemId, UserId};

/// Currency balance operations the engine needs.
///
/// Mutations are expressed as signed deltas against per-user balances.
/// Implementations must apply [`CurrencyPort::settle`] atomically: either
/// the whole debit/credit/fee triple lands or none of it does.
pub trait CurrencyPort: Send + Sync {
    /// Removes `amount` from `user`'s balance.
    ///
    /// Fails with `InsufficientFunds` when the balance is short; the
    /// balance is untouched on failure.
    fn debit(&self, user: UserId, currency: Currency, amount: u64) -> Result<()>;

    /// Adds `amount` to `user`'s balance.
    fn credit(&self, user: UserId, currency: Currency, amount: u64);

    /// Settles one fill: debits `total` from `buyer`, credits `proceeds`
    /// to `seller`, and retains the difference as the platform fee.
    ///
    /// Fails with `InsufficientFunds` when the buyer cannot cover `total`,
    /// leaving every balance untouched.
    fn settle(
        &self,
        buyer: UserId,
        seller: UserId,
        currency: Currency,
        total: u64,
        proceeds: u64,
    ) -> Result<()>;

    /// Current balance, zero for unknown users.
    fn balance(&self, user: UserId, currency: Currency) -> u64;
}

/// Inventory operations the engine needs.
pub trait InventoryPort: Send + Sync {
    /// Moves `quantity` units out of `user`'s holdings into escrow.
    ///
    /// Fails with `InsufficientInventory` when the unequipped holding is
    /// short and `ItemEquipped` when the holding is equipped.
    fn reserve(&self, user: UserId, item: &ItemId, quantity: u64) -> Result<()>;

    /// Returns `quantity` previously reserved units to `user`.
    fn release(&self, user: UserId, item: &ItemId, quantity: u64);

    /// Delivers `quantity` purchased units to `user`.
    fn credit(&self, user: UserId, item: &ItemId, quantity: u64);

    /// Whether `user`'s holding of `item` is currently equipped.
    fn is_equipped(&self, user: UserId, item: &ItemId) -> bool;

    /// Units of `item` held by `user`, zero for unknown holdings.
    fn quantity_of(&self, user: UserId, item: &ItemId) -> u64;
}

/// Kind of notification emitted after a fill settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyKind {
    /// Sent to the seller.
    MarketSale,
    /// Sent to the buyer.
    MarketPurchase,
}

impl std::fmt::Display for NotifyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyKind::MarketSale => write!(f, "MARKET_SALE"),
            NotifyKind::MarketPurchase => write!(f, "MARKET_PURCHASE"),
        }
    }
}

/// Outbound notification channel.
///
/// Called outside every critical section, after state has committed.
/// Delivery is at-most-once: failures are logged and dropped, never
/// retried, and never roll the trade back.
pub trait NotifyPort: Send + Sync {
    /// Delivers one notification to `user`.
    fn notify(&self, user: UserId, kind: NotifyKind, title: &str, body: &str) -> Result<()>;
}
