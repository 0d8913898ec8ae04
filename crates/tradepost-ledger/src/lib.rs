//! # tradepost-ledger
//!
//! Funds plane of the TradePost marketplace.
//!
//! Two in-memory ledgers implement the engine's resource ports:
//!
//! - [`CurrencyLedger`]: per-user currency balances, the retained fee pool,
//!   and minted-total tracking for conservation checks
//! - [`InventoryLedger`]: per-user item holdings with an escrow pool for
//!   units locked in listings
//!
//! Both apply mutations as explicit deltas inside short critical sections
//! and verify conservation on demand:
//!
//! ```text
//!   currency:  minted  == Σ balances + fee pool
//!   inventory: granted == Σ holdings + reserved
//! ```
//!
//! Deployments backed by an external store replace these with adapters
//! implementing the same port traits.

pub mod currency;
pub mod inventory;

pub use currency::CurrencyLedger;
pub use inventory::{Holding, InventoryLedger};
