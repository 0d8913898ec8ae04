//! Error types for the TradePost marketplace.
//!
//! Every error carries a stable `MP_ERR_` code so callers and adapters can
//! match on codes rather than message text. Codes are grouped by class:
//! 1xx validation, 2xx authorization, 3xx listing state, 4xx resources,
//! 5xx rate limits, 6xx transient faults, 7xx notification delivery,
//! 9xx internal invariants.

use thiserror::Error;

use crate::ids::{ItemId, ListingId};
use crate::listing::ListingStatus;

/// Convenience alias used throughout the marketplace crates.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Broad classification of a [`MarketError`].
///
/// Business rejections (everything except [`ErrorClass::Transient`]) are
/// final for the request that produced them; transient faults may be retried
/// verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Validation,
    Authorization,
    State,
    Resource,
    RateLimit,
    Transient,
    Notification,
    Internal,
}

/// All errors produced by the TradePost marketplace engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    // ========================================================================
    // Validation errors (100-199)
    // ========================================================================
    #[error("MP_ERR_100: Invalid quantity {given}: must be within [{min}, {max}]")]
    InvalidQuantity { given: u64, min: u64, max: u64 },

    #[error("MP_ERR_101: Invalid price {given}: must be within [{min}, {max}]")]
    InvalidPrice { given: u64, min: u64, max: u64 },

    #[error("MP_ERR_102: Arithmetic overflow computing trade total")]
    AmountOverflow,

    // ========================================================================
    // Authorization errors (200-299)
    // ========================================================================
    #[error("MP_ERR_200: Self-trade prevented: buyer and seller are the same user")]
    SelfTrade,

    #[error("MP_ERR_201: Not the listing owner: cancel denied for listing {0}")]
    NotListingOwner(ListingId),

    // ========================================================================
    // Listing state errors (300-399)
    // ========================================================================
    #[error("MP_ERR_300: Listing not found: {0}")]
    ListingNotFound(ListingId),

    #[error("MP_ERR_301: Listing {listing} is {status}, not ACTIVE")]
    ListingNotActive {
        listing: ListingId,
        status: ListingStatus,
    },

    #[error("MP_ERR_302: Listing {0} has expired")]
    ListingExpired(ListingId),

    #[error("MP_ERR_303: Oversold: requested {requested}, only {remaining} remaining")]
    Oversold { requested: u64, remaining: u64 },

    #[error("MP_ERR_304: Listing {listing} cannot be cancelled in state {status}")]
    NotCancellable {
        listing: ListingId,
        status: ListingStatus,
    },

    // ========================================================================
    // Resource errors (400-499)
    // ========================================================================
    #[error("MP_ERR_400: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("MP_ERR_401: Insufficient inventory: need {needed}, have {available}")]
    InsufficientInventory { needed: u64, available: u64 },

    #[error("MP_ERR_402: Item {0} is equipped and cannot be listed")]
    ItemEquipped(ItemId),

    // ========================================================================
    // Rate-limit errors (500-599)
    // ========================================================================
    #[error("MP_ERR_500: Active listing cap reached: {active} of {cap}")]
    ListingCapReached { active: usize, cap: usize },

    #[error("MP_ERR_501: Relist cooldown active: retry in {wait_ms}ms")]
    RelistCooldown { wait_ms: i64 },

    #[error("MP_ERR_502: Instant flip blocked: retry in {wait_ms}ms")]
    FlipBlocked { wait_ms: i64 },

    // ========================================================================
    // Transient errors (600-699)
    // ========================================================================
    #[error("MP_ERR_600: Lock acquisition timed out for listing {0}")]
    LockContention(ListingId),

    // ========================================================================
    // Notification errors (700-799)
    // ========================================================================
    #[error("MP_ERR_700: Notification delivery failed: {reason}")]
    NotifyFailed { reason: String },

    // ========================================================================
    // Internal invariant errors (900-999)
    // ========================================================================
    #[error("MP_ERR_900: Invalid listing transition: {from} -> {to}")]
    InvalidTransition {
        from: ListingStatus,
        to: ListingStatus,
    },

    #[error("MP_ERR_901: Conservation breached: {reason}")]
    ConservationBreached { reason: String },

    #[error("MP_ERR_902: Internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::InvalidQuantity { .. } => "MP_ERR_100",
            MarketError::InvalidPrice { .. } => "MP_ERR_101",
            MarketError::AmountOverflow => "MP_ERR_102",
            MarketError::SelfTrade => "MP_ERR_200",
            MarketError::NotListingOwner(_) => "MP_ERR_201",
            MarketError::ListingNotFound(_) => "MP_ERR_300",
            MarketError::ListingNotActive { .. } => "MP_ERR_301",
            MarketError::ListingExpired(_) => "MP_ERR_302",
            MarketError::Oversold { .. } => "MP_ERR_303",
            MarketError::NotCancellable { .. } => "MP_ERR_304",
            MarketError::InsufficientFunds { .. } => "MP_ERR_400",
            MarketError::InsufficientInventory { .. } => "MP_ERR_401",
            MarketError::ItemEquipped(_) => "MP_ERR_402",
            MarketError::ListingCapReached { .. } => "MP_ERR_500",
            MarketError::RelistCooldown { .. } => "MP_ERR_501",
            MarketError::FlipBlocked { .. } => "MP_ERR_502",
            MarketError::LockContention(_) => "MP_ERR_600",
            MarketError::NotifyFailed { .. } => "MP_ERR_700",
            MarketError::InvalidTransition { .. } => "MP_ERR_900",
            MarketError::ConservationBreached { .. } => "MP_ERR_901",
            MarketError::Internal(_) => "MP_ERR_902",
        }
    }

    /// Classifies this error for routing and retry decisions.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            MarketError::InvalidQuantity { .. }
            | MarketError::InvalidPrice { .. }
            | MarketError::AmountOverflow => ErrorClass::Validation,
            MarketError::SelfTrade | MarketError::NotListingOwner(_) => ErrorClass::Authorization,
            MarketError::ListingNotFound(_)
            | MarketError::ListingNotActive { .. }
            | MarketError::ListingExpired(_)
            | MarketError::Oversold { .. }
            | MarketError::NotCancellable { .. } => ErrorClass::State,
            MarketError::InsufficientFunds { .. }
            | MarketError::InsufficientInventory { .. }
            | MarketError::ItemEquipped(_) => ErrorClass::Resource,
            MarketError::ListingCapReached { .. }
            | MarketError::RelistCooldown { .. }
            | MarketError::FlipBlocked { .. } => ErrorClass::RateLimit,
            MarketError::LockContention(_) => ErrorClass::Transient,
            MarketError::NotifyFailed { .. } => ErrorClass::Notification,
            MarketError::InvalidTransition { .. }
            | MarketError::ConservationBreached { .. }
            | MarketError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_errors() -> Vec<MarketError> {
        let listing = ListingId::new();
        vec![
            MarketError::InvalidQuantity {
                given: 0,
                min: 1,
                max: 1000,
            },
            MarketError::InvalidPrice {
                given: 1_000_000,
                min: 1,
                max: 999_999,
            },
            MarketError::AmountOverflow,
            MarketError::SelfTrade,
            MarketError::NotListingOwner(listing),
            MarketError::ListingNotFound(listing),
            MarketError::ListingNotActive {
                listing,
                status: ListingStatus::Sold,
            },
            MarketError::ListingExpired(listing),
            MarketError::Oversold {
                requested: 10,
                remaining: 3,
            },
            MarketError::NotCancellable {
                listing,
                status: ListingStatus::Expired,
            },
            MarketError::InsufficientFunds {
                needed: 100,
                available: 20,
            },
            MarketError::InsufficientInventory {
                needed: 5,
                available: 2,
            },
            MarketError::ItemEquipped(ItemId::new("iron-sword")),
            MarketError::ListingCapReached { active: 20, cap: 20 },
            MarketError::RelistCooldown { wait_ms: 400 },
            MarketError::FlipBlocked { wait_ms: 30_000 },
            MarketError::LockContention(listing),
            MarketError::NotifyFailed {
                reason: "queue full".to_string(),
            },
            MarketError::InvalidTransition {
                from: ListingStatus::Sold,
                to: ListingStatus::Cancelled,
            },
            MarketError::ConservationBreached {
                reason: "supply drift".to_string(),
            },
            MarketError::Internal("test".to_string()),
        ]
    }

    #[test]
    fn all_errors_have_mp_err_prefix() {
        for err in sample_errors() {
            let msg = err.to_string();
            assert!(
                msg.starts_with("MP_ERR_"),
                "error message missing code prefix: {msg}"
            );
        }
    }

    #[test]
    fn display_matches_code_accessor() {
        for err in sample_errors() {
            let msg = err.to_string();
            assert!(
                msg.starts_with(err.code()),
                "code {} not the prefix of: {msg}",
                err.code()
            );
        }
    }

    #[test]
    fn codes_are_unique() {
        let errors = sample_errors();
        let mut codes: Vec<&str> = errors.iter().map(MarketError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn only_lock_contention_is_retryable() {
        for err in sample_errors() {
            let expected = matches!(err, MarketError::LockContention(_));
            assert_eq!(err.is_retryable(), expected, "{err}");
        }
    }

    #[test]
    fn class_groups_follow_code_ranges() {
        assert_eq!(MarketError::AmountOverflow.class(), ErrorClass::Validation);
        assert_eq!(MarketError::SelfTrade.class(), ErrorClass::Authorization);
        assert_eq!(
            MarketError::Oversold {
                requested: 2,
                remaining: 1
            }
            .class(),
            ErrorClass::State
        );
        assert_eq!(
            MarketError::InsufficientFunds {
                needed: 1,
                available: 0
            }
            .class(),
            ErrorClass::Resource
        );
        assert_eq!(
            MarketError::FlipBlocked { wait_ms: 1 }.class(),
            ErrorClass::RateLimit
        );
        assert_eq!(
            MarketError::LockContention(ListingId::new()).class(),
            ErrorClass::Transient
        );
        assert_eq!(
            MarketError::NotifyFailed {
                reason: String::new()
            }
            .class(),
            ErrorClass::Notification
        );
        assert_eq!(
            MarketError::Internal(String::new()).class(),
            ErrorClass::Internal
        );
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MarketError>();
    }
}
