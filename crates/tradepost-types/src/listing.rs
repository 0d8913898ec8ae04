//! Listings and their lifecycle.
//!
//! A listing escrows a seller's items at a fixed unit price until it is
//! bought out, cancelled, or expired. `ACTIVE` is the only state that
//! accepts further operations; the three terminal states are final.
//!
//! ```text
//!              ┌──────> SOLD       (last unit purchased)
//!   ACTIVE ────┼──────> CANCELLED  (seller withdrew it)
//!              └──────> EXPIRED    (reaper swept it)
//! ```

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::error::{MarketError, Result};
use crate::ids::{ItemId, ListingId, UserId};

// ---------------------------------------------------------------------------
// ListingStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingStatus {
    /// Open for purchase.
    Active,
    /// All units purchased.
    Sold,
    /// Withdrawn by the seller; remaining units returned.
    Cancelled,
    /// Swept after its lifetime elapsed; remaining units returned.
    Expired,
}

impl ListingStatus {
    /// Whether a transition from this state to `target` is allowed.
    ///
    /// Only `ACTIVE` has outgoing edges; terminal states accept nothing.
    #[must_use]
    pub fn can_transition_to(&self, target: ListingStatus) -> bool {
        matches!(
            (self, target),
            (
                ListingStatus::Active,
                ListingStatus::Sold | ListingStatus::Cancelled | ListingStatus::Expired
            )
        )
    }

    /// Whether this state is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ListingStatus::Active)
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingStatus::Active => write!(f, "ACTIVE"),
            ListingStatus::Sold => write!(f, "SOLD"),
            ListingStatus::Cancelled => write!(f, "CANCELLED"),
            ListingStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// A fixed-price listing escrowing a seller's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Unique listing ID.
    pub id: ListingId,
    /// User whose items are escrowed here.
    pub seller: UserId,
    /// Item kind on offer.
    pub item: ItemId,
    /// Units still held by the listing. Positive while `ACTIVE`.
    pub quantity: u64,
    /// Price per unit.
    pub price: u64,
    /// Currency the listing settles in.
    pub currency: Currency,
    /// Current lifecycle state.
    pub status: ListingStatus,
    /// Buyer who closed the listing, set on the transition to `SOLD`.
    pub buyer: Option<UserId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Expiry deadline. `None` on rows created before expiry tracking;
    /// the reaper falls back to `created_at` plus the configured lifetime.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Creates a new `ACTIVE` listing expiring `ttl` after `now`.
    #[must_use]
    pub fn new(
        seller: UserId,
        item: ItemId,
        quantity: u64,
        price: u64,
        currency: Currency,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: ListingId::new(),
            seller,
            item,
            quantity,
            price,
            currency,
            status: ListingStatus::Active,
            buyer: None,
            created_at: now,
            expires_at: Some(now + ttl),
        }
    }

    /// Total price for `quantity` units at this listing's unit price.
    pub fn total_price(&self, quantity: u64) -> Result<u64> {
        self.price
            .checked_mul(quantity)
            .ok_or(MarketError::AmountOverflow)
    }

    /// Whether the listing's deadline has passed.
    ///
    /// Rows without a deadline never report expired here; only the reaper's
    /// fallback ages them out.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| now > deadline)
    }

    /// Whether the reaper should sweep this listing.
    ///
    /// Uses the recorded deadline when present, otherwise ages the row out
    /// once `created_at + fallback_ttl` has passed.
    #[must_use]
    pub fn is_reapable(&self, now: DateTime<Utc>, fallback_ttl: Duration) -> bool {
        match self.expires_at {
            Some(deadline) => deadline < now,
            None => self.created_at + fallback_ttl < now,
        }
    }

    /// Closes the listing as fully purchased by `buyer`.
    pub fn mark_sold(&mut self, buyer: UserId) -> Result<()> {
        if !self.status.can_transition_to(ListingStatus::Sold) {
            return Err(MarketError::InvalidTransition {
                from: self.status,
                to: ListingStatus::Sold,
            });
        }
        self.status = ListingStatus::Sold;
        self.buyer = Some(buyer);
        self.quantity = 0;
        Ok(())
    }

    /// Closes the listing as withdrawn. Remaining quantity is left in place
    /// for the caller to restore to the seller.
    pub fn mark_cancelled(&mut self) -> Result<()> {
        if !self.status.can_transition_to(ListingStatus::Cancelled) {
            return Err(MarketError::InvalidTransition {
                from: self.status,
                to: ListingStatus::Cancelled,
            });
        }
        self.status = ListingStatus::Cancelled;
        Ok(())
    }

    /// Closes the listing as aged out. Remaining quantity is left in place
    /// for the caller to restore to the seller.
    pub fn mark_expired(&mut self) -> Result<()> {
        if !self.status.can_transition_to(ListingStatus::Expired) {
            return Err(MarketError::InvalidTransition {
                from: self.status,
                to: ListingStatus::Expired,
            });
        }
        self.status = ListingStatus::Expired;
        Ok(())
    }

    /// Records a partial fill of `quantity` units.
    ///
    /// The listing must stay open afterwards. A fill that drains the listing
    /// must go through [`Listing::mark_sold`] instead.
    pub fn record_partial_fill(&mut self, quantity: u64) -> Result<()> {
        if self.status != ListingStatus::Active {
            return Err(MarketError::ListingNotActive {
                listing: self.id,
                status: self.status,
            });
        }
        self.quantity = self
            .quantity
            .checked_sub(quantity)
            .filter(|remaining| *remaining > 0)
            .ok_or(MarketError::Oversold {
                requested: quantity,
                remaining: self.quantity,
            })?;
        Ok(())
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Listing[{}] {} x{} @ {} {} ({})",
            self.id, self.item, self.quantity, self.price, self.currency, self.status
        )
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "test-helpers"))]
impl Listing {
    /// Creates a populated `ACTIVE` listing expiring 30 days out.
    ///
    /// **Never use in production.** Tests tweak fields directly when they
    /// need back-dated or legacy rows.
    #[must_use]
    pub fn dummy(seller: UserId, item: &str, quantity: u64, price: u64, currency: Currency) -> Self {
        Self::new(
            seller,
            ItemId::new(item),
            quantity,
            price,
            currency,
            Utc::now(),
            Duration::days(30),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
