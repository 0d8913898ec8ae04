//! In-memory currency ledger.
//!
//! Balances are keyed `(user, currency)` and only ever move by explicit
//! deltas. New money enters through [`CurrencyLedger::deposit`] and is
//! tracked against the minted total, so conservation can be verified at
//! any point: minted == circulating + fee pool.

use std::collections::HashMap;

use parking_lot::RwLock;
use tradepost_types::{Currency, CurrencyPort, MarketError, Result, UserId};

#[derive(Default)]
struct CurrencyBook {
    /// Spendable balance per user and currency.
    balances: HashMap<(UserId, Currency), u64>,
    /// Fees retained by the platform, per currency.
    fee_pool: HashMap<Currency, u64>,
    /// Total ever deposited, per currency.
    minted: HashMap<Currency, u64>,
}

/// Thread-safe ledger of per-user currency balances.
///
/// [`CurrencyLedger::settle`] applies a whole fill inside one critical
/// section, so a concurrent reader never observes the buyer debited without
/// the seller credited.
#[derive(Default)]
pub struct CurrencyLedger {
    book: RwLock<CurrencyBook>,
}

impl CurrencyLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposits new money into `user`'s balance and the minted total.
    pub fn deposit(&self, user: UserId, currency: Currency, amount: u64) {
        let mut book = self.book.write();
        let balance = book.balances.entry((user, currency)).or_insert(0);
        *balance = balance.saturating_add(amount);
        let minted = book.minted.entry(currency).or_insert(0);
        *minted = minted.saturating_add(amount);
        tracing::debug!(%user, %currency, amount, "deposit");
    }

    /// Adds `amount` to `user`'s balance without touching the minted total.
    /// The matching debit must happen elsewhere.
    pub fn credit(&self, user: UserId, currency: Currency, amount: u64) {
        let mut book = self.book.write();
        let balance = book.balances.entry((user, currency)).or_insert(0);
        *balance = balance.saturating_add(amount);
        tracing::debug!(%user, %currency, amount, "credit");
    }

    /// Removes `amount` from `user`'s balance.
    pub fn debit(&self, user: UserId, currency: Currency, amount: u64) -> Result<()> {
        let mut book = self.book.write();
        let Some(balance) = book.balances.get_mut(&(user, currency)) else {
            return Err(MarketError::InsufficientFunds {
                needed: amount,
                available: 0,
            });
        };
        if *balance < amount {
            return Err(MarketError::InsufficientFunds {
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        tracing::debug!(%user, %currency, amount, "debit");
        Ok(())
    }

    /// Settles one fill atomically.
    ///
    /// Debits `total` from the buyer, credits `proceeds` to the seller, and
    /// retains `total - proceeds` in the fee pool. Nothing moves if the
    /// buyer cannot cover `total`.
    pub fn settle(
        &self,
        buyer: UserId,
        seller: UserId,
        currency: Currency,
        total: u64,
        proceeds: u64,
    ) -> Result<()> {
        let fee = total
            .checked_sub(proceeds)
            .ok_or_else(|| MarketError::Internal("seller proceeds exceed gross amount".into()))?;

        let mut book = self.book.write();

        // Step 1: debit the buyer. The only step that can fail; everything
        // after it must succeed.
        {
            let Some(balance) = book.balances.get_mut(&(buyer, currency)) else {
                return Err(MarketError::InsufficientFunds {
                    needed: total,
                    available: 0,
                });
            };
            if *balance < total {
                return Err(MarketError::InsufficientFunds {
                    needed: total,
                    available: *balance,
                });
            }
            *balance -= total;
        }

        // Step 2: credit the seller.
        {
            let balance = book.balances.entry((seller, currency)).or_insert(0);
            *balance = balance.saturating_add(proceeds);
        }

        // Step 3: retain the fee.
        {
            let pool = book.fee_pool.entry(currency).or_insert(0);
            *pool = pool.saturating_add(fee);
        }

        tracing::debug!(%buyer, %seller, %currency, total, proceeds, fee, "settled");
        Ok(())
    }

    /// Current balance, zero for unknown users.
    #[must_use]
    pub fn balance(&self, user: UserId, currency: Currency) -> u64 {
        self.book
            .read()
            .balances
            .get(&(user, currency))
            .copied()
            .unwrap_or(0)
    }

    /// Fees retained so far in `currency`.
    #[must_use]
    pub fn fee_pool(&self, currency: Currency) -> u64 {
        self.book.read().fee_pool.get(&currency).copied().unwrap_or(0)
    }

    /// Total ever deposited in `currency`.
    #[must_use]
    pub fn minted(&self, currency: Currency) -> u64 {
        self.book.read().minted.get(&currency).copied().unwrap_or(0)
    }

    /// Sum of all user balances in `currency`.
    #[must_use]
    pub fn total_supply(&self, currency: Currency) -> u64 {
        self.book
            .read()
            .balances
            .iter()
            .filter(|((_, c), _)| *c == currency)
            .map(|(_, balance)| balance)
            .sum()
    }

    /// Verifies that no money appeared or vanished.
    ///
    /// Every unit ever minted must sit in a user balance or the fee pool.
    pub fn verify_conservation(&self, currency: Currency) -> Result<()> {
        let book = self.book.read();
        let circulating: u64 = book
            .balances
            .iter()
            .filter(|((_, c), _)| *c == currency)
            .map(|(_, balance)| balance)
            .sum();
        let pool = book.fee_pool.get(&currency).copied().unwrap_or(0);
        let minted = book.minted.get(&currency).copied().unwrap_or(0);

        if circulating + pool != minted {
            return Err(MarketError::ConservationBreached {
                reason: format!(
                    "{currency}: minted {minted} but circulating {circulating} + fee pool {pool}"
                ),
            });
        }
        Ok(())
    }
}

impl CurrencyPort for CurrencyLedger {
    fn debit(&self, user: UserId, currency: Currency, amount: u64) -> Result<()> {
        CurrencyLedger::debit(self, user, currency, amount)
    }

    fn credit(&self, user: UserId, currency: Currency, amount: u64) {
        CurrencyLedger::credit(self, user, currency, amount);
    }

    fn settle(
        &self,
        buyer: UserId,
        seller: UserId,
        currency: Currency,
        total: u64,
        proceeds: u64,
    ) -> Result<()> {
        CurrencyLedger::settle(self, buyer, seller, currency, total, proceeds)
    }

    fn balance(&self, user: UserId, currency: Currency) -> u64 {
        CurrencyLedger::balance(self, user, currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_then_balance() {
        let ledger = CurrencyLedger::new();
        let user = UserId::new();

        ledger.deposit(user, Currency::Gold, 100);

        assert_eq!(ledger.balance(user, Currency::Gold), 100);
        assert_eq!(ledger.balance(user, Currency::Diamonds), 0);
        assert_eq!(ledger.minted(Currency::Gold), 100);
    }

    #[test]
    fn debit_reduces_balance() {
        let ledger = CurrencyLedger::new();
        let user = UserId::new();
        ledger.deposit(user, Currency::Gold, 100);

        ledger.debit(user, Currency::Gold, 30).expect("covered");

        assert_eq!(ledger.balance(user, Currency::Gold), 70);
    }

    #[test]
    fn debit_rejects_short_balance() {
        let ledger = CurrencyLedger::new();
        let user = UserId::new();
        ledger.deposit(user, Currency::Gold, 10);

        let err = ledger.debit(user, Currency::Gold, 11).expect_err("short");
        assert_eq!(
            err,
            MarketError::InsufficientFunds {
                needed: 11,
                available: 10
            }
        );
        assert_eq!(ledger.balance(user, Currency::Gold), 10);
    }

    #[test]
    fn debit_of_unknown_user_reports_zero_available() {
        let ledger = CurrencyLedger::new();

        let err = ledger
            .debit(UserId::new(), Currency::Gold, 1)
            .expect_err("no account");
        assert_eq!(
            err,
            MarketError::InsufficientFunds {
                needed: 1,
                available: 0
            }
        );
    }

    #[test]
    fn settle_moves_total_and_retains_fee() {
        let ledger = CurrencyLedger::new();
        let buyer = UserId::new();
        let seller = UserId::new();
        ledger.deposit(buyer, Currency::Gold, 100);

        ledger
            .settle(buyer, seller, Currency::Gold, 20, 19)
            .expect("buyer covered");

        assert_eq!(ledger.balance(buyer, Currency::Gold), 80);
        assert_eq!(ledger.balance(seller, Currency::Gold), 19);
        assert_eq!(ledger.fee_pool(Currency::Gold), 1);
        ledger
            .verify_conservation(Currency::Gold)
            .expect("conserved");
    }

    #[test]
    fn failed_settle_leaves_everything_untouched() {
        let ledger = CurrencyLedger::new();
        let buyer = UserId::new();
        let seller = UserId::new();
        ledger.deposit(buyer, Currency::Gold, 10);

        let err = ledger
            .settle(buyer, seller, Currency::Gold, 20, 19)
            .expect_err("short");
        assert!(matches!(err, MarketError::InsufficientFunds { .. }));

        assert_eq!(ledger.balance(buyer, Currency::Gold), 10);
        assert_eq!(ledger.balance(seller, Currency::Gold), 0);
        assert_eq!(ledger.fee_pool(Currency::Gold), 0);
    }

    #[test]
    fn settle_rejects_proceeds_above_gross() {
        let ledger = CurrencyLedger::new();
        let buyer = UserId::new();
        ledger.deposit(buyer, Currency::Gold, 100);

        let err = ledger
            .settle(buyer, UserId::new(), Currency::Gold, 20, 21)
            .expect_err("bad split");
        assert!(matches!(err, MarketError::Internal(_)));
        assert_eq!(ledger.balance(buyer, Currency::Gold), 100);
    }

    #[test]
    fn total_supply_sums_users_per_currency() {
        let ledger = CurrencyLedger::new();
        let a = UserId::new();
        let b = UserId::new();
        ledger.deposit(a, Currency::Gold, 40);
        ledger.deposit(b, Currency::Gold, 60);
        ledger.deposit(b, Currency::Diamonds, 5);

        assert_eq!(ledger.total_supply(Currency::Gold), 100);
        assert_eq!(ledger.total_supply(Currency::Diamonds), 5);
    }

    #[test]
    fn conservation_detects_unbacked_credit() {
        let ledger = CurrencyLedger::new();
        let user = UserId::new();
        ledger.deposit(user, Currency::Gold, 50);

        // A credit with no matching debit anywhere breaks the books.
        ledger.credit(user, Currency::Gold, 7);

        let err = ledger
            .verify_conservation(Currency::Gold)
            .expect_err("drift");
        assert!(matches!(err, MarketError::ConservationBreached { .. }));
    }

    #[test]
    fn conservation_holds_per_currency() {
        let ledger = CurrencyLedger::new();
        let buyer = UserId::new();
        let seller = UserId::new();
        ledger.deposit(buyer, Currency::Gold, 100);
        ledger.deposit(buyer, Currency::Diamonds, 30);
        ledger
            .settle(buyer, seller, Currency::Gold, 40, 38)
            .expect("settle gold");
        ledger
            .settle(buyer, seller, Currency::Diamonds, 30, 29)
            .expect("settle diamonds");

        for currency in Currency::all() {
            ledger.verify_conservation(currency).expect("conserved");
        }
    }
}
