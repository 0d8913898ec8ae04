//! # tradepost-types
//!
//! Shared type definitions for the TradePost marketplace exchange engine.
//!
//! This crate is dependency-light and carries no behavior beyond what the
//! types themselves enforce. Everything the other planes exchange lives
//! here:
//!
//! - Identifier newtypes ([`UserId`], [`ItemId`], [`ListingId`], [`TradeId`],
//!   [`SettlementId`])
//! - The listing lifecycle ([`Listing`], [`ListingStatus`])
//! - Trade-log rows ([`TradeRecord`], [`TradeSide`]) and operation results
//!   ([`TradeReceipt`], [`CleanupReport`])
//! - Browse queries ([`ListingQuery`], [`ListingSort`], [`Page`])
//! - The error taxonomy ([`MarketError`], [`ErrorClass`]) with stable
//!   `MP_ERR_` codes
//! - The ports the engine is constructed over ([`CurrencyPort`],
//!   [`InventoryPort`], [`NotifyPort`])
//! - Rules and constants ([`MarketRules`], [`constants`])

pub mod config;
pub mod constants;
pub mod currency;
pub mod error;
pub mod ids;
pub mod listing;
pub mod ports;
pub mod query;
pub mod receipt;
pub mod trade;

pub use config::MarketRules;
pub use currency::Currency;
pub use error::{ErrorClass, MarketError, Result};
pub use ids::{ItemId, ListingId, SettlementId, TradeId, UserId};
pub use listing::{Listing, ListingStatus};
pub use ports::{CurrencyPort, InventoryPort, NotifyKind, NotifyPort};
pub use query::{ListingQuery, ListingSort, Page};
pub use receipt::{CleanupReport, TradeReceipt};
pub use trade::{TradeRecord, TradeSide};
