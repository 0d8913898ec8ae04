//! Marketplace rule configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Tunable rules governing listings, fees, and anti-exploit windows.
///
/// One `MarketRules` value is handed to the engine at construction and
/// never changes afterwards. All durations are stored as plain integers so
/// the struct serializes cleanly; accessor methods convert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRules {
    /// Maximum `ACTIVE` listings per seller.
    pub max_active_listings: usize,
    /// Inclusive unit-price lower bound.
    pub min_price: u64,
    /// Inclusive unit-price upper bound.
    pub max_price: u64,
    /// Maximum units per listing.
    pub max_listing_quantity: u64,
    /// Platform fee in basis points.
    pub fee_bps: u32,
    /// Listing lifetime in days.
    pub listing_ttl_days: i64,
    /// Per-(seller, item) relist cooldown in ms.
    pub relist_cooldown_ms: i64,
    /// Buy-then-relist block window in ms.
    pub flip_window_ms: i64,
    /// Row-lock acquisition budget in ms.
    pub lock_timeout_ms: u64,
    /// Page size used when a browse query does not set one.
    pub default_page_size: usize,
    /// Largest page size a browse query may request.
    pub max_page_size: usize,
}

impl Default for MarketRules {
    fn default() -> Self {
        Self {
            max_active_listings: constants::DEFAULT_MAX_ACTIVE_LISTINGS,
            min_price: constants::MIN_PRICE,
            max_price: constants::MAX_PRICE,
            max_listing_quantity: constants::MAX_LISTING_QUANTITY,
            fee_bps: constants::DEFAULT_FEE_BPS,
            listing_ttl_days: constants::DEFAULT_LISTING_TTL_DAYS,
            relist_cooldown_ms: constants::DEFAULT_RELIST_COOLDOWN_MS,
            flip_window_ms: constants::DEFAULT_FLIP_WINDOW_MS,
            lock_timeout_ms: constants::DEFAULT_LOCK_TIMEOUT_MS,
            default_page_size: constants::DEFAULT_PAGE_SIZE,
            max_page_size: constants::MAX_PAGE_SIZE,
        }
    }
}

impl MarketRules {
    /// Default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules with both anti-exploit windows collapsed to zero.
    ///
    /// Intended for fixtures and load tests that churn listings faster than
    /// the production cooldowns allow.
    #[must_use]
    pub fn without_cooldowns() -> Self {
        Self {
            relist_cooldown_ms: 0,
            flip_window_ms: 0,
            ..Self::default()
        }
    }

    /// Listing lifetime.
    #[must_use]
    pub fn listing_ttl(&self) -> Duration {
        Duration::days(self.listing_ttl_days)
    }

    /// Relist cooldown window.
    #[must_use]
    pub fn relist_cooldown(&self) -> Duration {
        Duration::milliseconds(self.relist_cooldown_ms)
    }

    /// Buy-then-relist block window.
    #[must_use]
    pub fn flip_window(&self) -> Duration {
        Duration::milliseconds(self.flip_window_ms)
    }

    /// Row-lock acquisition budget.
    #[must_use]
    pub fn lock_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lock_timeout_ms)
    }

    /// Splits a gross amount into `(fee, seller_proceeds)`.
    ///
    /// The fee is floored; the seller receives the exact remainder, so the
    /// two parts always sum back to `total`.
    #[must_use]
    pub fn split_fee(&self, total: u64) -> (u64, u64) {
        let raw = u128::from(total) * u128::from(self.fee_bps) / u128::from(constants::BPS_DENOMINATOR);
        let fee = u64::try_from(raw).unwrap_or(total).min(total);
        (fee, total - fee)
    }
}
