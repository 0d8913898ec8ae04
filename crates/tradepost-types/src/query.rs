//! Browse queries over active listings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::currency::Currency;
use crate::ids::{ItemId, ListingId, UserId};
use crate::listing::Listing;

/// Sort order for browse results.
///
/// Every order is total: price sorts break ties by listing ID, so cursor
/// pagination never skips or repeats rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Cheapest unit price first.
    PriceAsc,
    /// Highest unit price first.
    PriceDesc,
}

impl ListingSort {
    /// Comparator realizing this sort order.
    #[must_use]
    pub fn ordering(&self, a: &Listing, b: &Listing) -> Ordering {
        match self {
            ListingSort::Newest => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id)),
            ListingSort::Oldest => a
                .created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id)),
            ListingSort::PriceAsc => a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)),
            ListingSort::PriceDesc => b.price.cmp(&a.price).then_with(|| a.id.cmp(&b.id)),
        }
    }
}

/// Filter, sort, and pagination parameters for one browse call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    /// Restrict to one item kind.
    pub item: Option<ItemId>,
    /// Restrict to one seller.
    pub seller: Option<UserId>,
    /// Restrict to one settlement currency.
    pub currency: Option<Currency>,
    /// Inclusive unit-price lower bound.
    pub min_price: Option<u64>,
    /// Inclusive unit-price upper bound.
    pub max_price: Option<u64>,
    /// Sort order.
    pub sort: ListingSort,
    /// Resume strictly after this listing in sort order.
    pub cursor: Option<ListingId>,
    /// Maximum rows to return.
    pub limit: usize,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            item: None,
            seller: None,
            currency: None,
            min_price: None,
            max_price: None,
            sort: ListingSort::default(),
            cursor: None,
            limit: constants::DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListingQuery {
    /// Whether `listing` passes every filter. Status is not a filter here;
    /// the store only feeds `ACTIVE` rows through.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        if self.item.as_ref().is_some_and(|item| *item != listing.item) {
            return false;
        }
        if self.seller.is_some_and(|seller| seller != listing.seller) {
            return false;
        }
        if self.currency.is_some_and(|c| c != listing.currency) {
            return false;
        }
        if self.min_price.is_some_and(|min| listing.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| listing.price > max) {
            return false;
        }
        true
    }

    /// Copy of this query with `limit` clamped to `[1, max]`.
    #[must_use]
    pub fn clamped(&self, max: usize) -> Self {
        Self {
            limit: self.limit.clamp(1, max),
            ..self.clone()
        }
    }
}

/// One page of browse results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows in query order.
    pub items: Vec<T>,
    /// Cursor for the next page, set only when more rows exist.
    pub next_cursor: Option<ListingId>,
    /// Whether rows beyond this page exist.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// An empty page with no continuation.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }
}
