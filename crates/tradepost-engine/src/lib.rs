//! # tradepost-engine
//!
//! Orchestration plane of the TradePost marketplace.
//!
//! The [`MarketplaceEngine`] drives every operation end to end:
//!
//! 1. Validate inputs and run the anti-exploit gates in a fixed order,
//!    reporting the first violation.
//! 2. Apply effects under the listing's row lock, fallible steps first,
//!    so a rejected operation leaves no partial state.
//! 3. Release the lock, then fire best-effort notifications.
//!
//! ```text
//!   create ──> cap │ inventory │ cooldown │ flip ──> reserve ──> insert
//!   buy    ──> active │ fresh │ not-self │ fits ──> settle ──> mutate row
//!                                                   ──> deliver ──> journal ──> notify
//!   cancel ──> owner │ active ──> mark cancelled ──> release units
//!   sweep  ──> scan deadline ──> re-check per row ──> mark expired ──> release units
//! ```
//!
//! The engine owns nothing: currency, inventory, and notification delivery
//! arrive as ports, listing rows and the trade journal as shared stores.

pub mod engine;
pub mod guard;
pub mod notify;

pub use engine::MarketplaceEngine;
pub use guard::AntiExploitGuard;
pub use notify::LogNotifier;
