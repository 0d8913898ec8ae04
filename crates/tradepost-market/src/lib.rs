//! # tradepost-market
//!
//! Market data plane of the TradePost marketplace.
//!
//! Two structures hold the market's state:
//!
//! - [`ListingStore`]: the live listing book. Each row sits behind its own
//!   lock so fills against different listings run in parallel, and lock
//!   acquisition is bounded so a stuck operation surfaces as a transient
//!   error instead of a hang. The store also maintains the guard indexes
//!   (active listings per seller, last listing time per seller and item).
//! - [`TradeLog`]: the append-only journal of settled fills, two rows per
//!   settlement. Feeds history views and the anti-flip gate.
//!
//! ```text
//!   engine op ──> ListingStore.update(id, op)   row lock, bounded wait
//!                   └─> op validates, settles, mutates the row
//!                   └─> TradeLog.record_fill()  sell + buy rows appended
//! ```

pub mod store;
pub mod trade_log;

pub use store::ListingStore;
pub use trade_log::TradeLog;
