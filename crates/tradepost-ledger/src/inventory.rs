//! In-memory inventory ledger.
//!
//! Holdings are keyed `(user, item)`. Listing an item moves units out of
//! the holding into a per-item reserved pool; cancellation and expiry move
//! them back, and purchases move them into the buyer's holding. Units never
//! appear or vanish in between: granted == held + reserved per item.

use std::collections::HashMap;

use parking_lot::RwLock;
use tradepost_types::{InventoryPort, ItemId, MarketError, Result, UserId};

/// One user's holding of one item kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Holding {
    /// Units held.
    pub quantity: u64,
    /// Whether the holding is equipped. Equipped holdings cannot be listed.
    pub equipped: bool,
}

#[derive(Default)]
struct InventoryBook {
    holdings: HashMap<(UserId, ItemId), Holding>,
    /// Units escrowed in listings, per item.
    reserved: HashMap<ItemId, u64>,
    /// Units ever granted, per item.
    granted: HashMap<ItemId, u64>,
}

/// Thread-safe ledger of per-user item holdings.
#[derive(Default)]
pub struct InventoryLedger {
    book: RwLock<InventoryBook>,
}

impl InventoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants new units to `user`, tracked against the granted total.
    pub fn grant(&self, user: UserId, item: &ItemId, quantity: u64) {
        let mut book = self.book.write();
        let holding = book.holdings.entry((user, item.clone())).or_default();
        holding.quantity = holding.quantity.saturating_add(quantity);
        let granted = book.granted.entry(item.clone()).or_insert(0);
        *granted = granted.saturating_add(quantity);
        tracing::debug!(%user, %item, quantity, "granted");
    }

    /// Marks `user`'s holding of `item` as equipped or not.
    pub fn set_equipped(&self, user: UserId, item: &ItemId, equipped: bool) {
        let mut book = self.book.write();
        book.holdings
            .entry((user, item.clone()))
            .or_default()
            .equipped = equipped;
    }

    /// Moves `quantity` units from `user`'s holding into escrow.
    pub fn reserve(&self, user: UserId, item: &ItemId, quantity: u64) -> Result<()> {
        let mut book = self.book.write();
        let Some(holding) = book.holdings.get_mut(&(user, item.clone())) else {
            return Err(MarketError::InsufficientInventory {
                needed: quantity,
                available: 0,
            });
        };
        if holding.quantity < quantity {
            return Err(MarketError::InsufficientInventory {
                needed: quantity,
                available: holding.quantity,
            });
        }
        if holding.equipped {
            return Err(MarketError::ItemEquipped(item.clone()));
        }
        holding.quantity -= quantity;

        let reserved = book.reserved.entry(item.clone()).or_insert(0);
        *reserved = reserved.saturating_add(quantity);
        tracing::debug!(%user, %item, quantity, "reserved");
        Ok(())
    }

    /// Returns `quantity` escrowed units to `user` after a cancel or sweep.
    pub fn release(&self, user: UserId, item: &ItemId, quantity: u64) {
        let mut book = self.book.write();
        let holding = book.holdings.entry((user, item.clone())).or_default();
        holding.quantity = holding.quantity.saturating_add(quantity);
        let reserved = book.reserved.entry(item.clone()).or_insert(0);
        *reserved = reserved.saturating_sub(quantity);
        tracing::debug!(%user, %item, quantity, "released");
    }

    /// Delivers `quantity` escrowed units to `user` after a purchase.
    pub fn credit(&self, user: UserId, item: &ItemId, quantity: u64) {
        let mut book = self.book.write();
        let holding = book.holdings.entry((user, item.clone())).or_default();
        holding.quantity = holding.quantity.saturating_add(quantity);
        let reserved = book.reserved.entry(item.clone()).or_insert(0);
        *reserved = reserved.saturating_sub(quantity);
        tracing::debug!(%user, %item, quantity, "delivered");
    }

    /// Units of `item` held by `user`.
    #[must_use]
    pub fn quantity_of(&self, user: UserId, item: &ItemId) -> u64 {
        self.holding(user, item).quantity
    }

    /// Whether `user`'s holding of `item` is equipped.
    #[must_use]
    pub fn is_equipped(&self, user: UserId, item: &ItemId) -> bool {
        self.holding(user, item).equipped
    }

    /// Snapshot of `user`'s holding of `item`, zeroed when absent.
    #[must_use]
    pub fn holding(&self, user: UserId, item: &ItemId) -> Holding {
        self.book
            .read()
            .holdings
            .get(&(user, item.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Units of `item` currently escrowed in listings.
    #[must_use]
    pub fn reserved(&self, item: &ItemId) -> u64 {
        self.book.read().reserved.get(item).copied().unwrap_or(0)
    }

    /// Units of `item` ever granted.
    #[must_use]
    pub fn granted(&self, item: &ItemId) -> u64 {
        self.book.read().granted.get(item).copied().unwrap_or(0)
    }

    /// Verifies that no units of `item` appeared or vanished.
    pub fn verify_conservation(&self, item: &ItemId) -> Result<()> {
        let book = self.book.read();
        let held: u64 = book
            .holdings
            .iter()
            .filter(|((_, i), _)| i == item)
            .map(|(_, holding)| holding.quantity)
            .sum();
        let reserved = book.reserved.get(item).copied().unwrap_or(0);
        let granted = book.granted.get(item).copied().unwrap_or(0);

        if held + reserved != granted {
            return Err(MarketError::ConservationBreached {
                reason: format!("{item}: granted {granted} but held {held} + reserved {reserved}"),
            });
        }
        Ok(())
    }
}

impl InventoryPort for InventoryLedger {
    fn reserve(&self, user: UserId, item: &ItemId, quantity: u64) -> Result<()> {
        InventoryLedger::reserve(self, user, item, quantity)
    }

    fn release(&self, user: UserId, item: &ItemId, quantity: u64) {
        InventoryLedger::release(self, user, item, quantity);
    }

    fn credit(&self, user: UserId, item: &ItemId, quantity: u64) {
        InventoryLedger::credit(self, user, item, quantity);
    }

    fn is_equipped(&self, user: UserId, item: &ItemId) -> bool {
        InventoryLedger::is_equipped(self, user, item)
    }

    fn quantity_of(&self, user: UserId, item: &ItemId) -> u64 {
        InventoryLedger::quantity_of(self, user, item)
    }
}
