//! Marketplace-wide constants.
//!
//! Defaults for every tunable live here; [`crate::config::MarketRules`]
//! carries the effective values at runtime.

/// Maximum `ACTIVE` listings a single seller may hold at once.
pub const DEFAULT_MAX_ACTIVE_LISTINGS: usize = 20;

/// Inclusive lower bound for a listing's unit price.
pub const MIN_PRICE: u64 = 1;

/// Inclusive upper bound for a listing's unit price.
pub const MAX_PRICE: u64 = 999_999;

/// Maximum units a single listing may escrow.
pub const MAX_LISTING_QUANTITY: u64 = 1000;

/// Platform fee in basis points (500 = 5%).
pub const DEFAULT_FEE_BPS: u32 = 500;

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Listing lifetime in days. Listings older than this are swept.
pub const DEFAULT_LISTING_TTL_DAYS: i64 = 30;

/// Cooldown between listings of the same item by the same seller, in ms.
pub const DEFAULT_RELIST_COOLDOWN_MS: i64 = 1_000;

/// Window after buying an item during which relisting it is blocked, in ms.
pub const DEFAULT_FLIP_WINDOW_MS: i64 = 60_000;

/// Budget for acquiring a listing row lock before the operation is
/// abandoned with a transient error, in ms.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 250;

/// Default page size for browse queries.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Upper bound on trade-history rows returned per user.
pub const MAX_HISTORY_ROWS: usize = 50;

/// Engine version, from Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "TradePost";
