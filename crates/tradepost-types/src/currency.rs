//! Currencies accepted on the marketplace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Currency a listing is priced in.
///
/// Every listing is priced in exactly one currency and settles in that
/// currency. Balances of different currencies never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    /// Soft currency earned through normal play.
    Gold,
    /// Premium currency.
    Diamonds,
}

impl Currency {
    /// All supported currencies, for conservation sweeps and reporting.
    #[must_use]
    pub fn all() -> [Currency; 2] {
        [Currency::Gold, Currency::Diamonds]
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Gold => write!(f, "GOLD"),
            Currency::Diamonds => write!(f, "DIAMONDS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_upper_case() {
        assert_eq!(Currency::Gold.to_string(), "GOLD");
        assert_eq!(Currency::Diamonds.to_string(), "DIAMONDS");
    }

    #[test]
    fn all_lists_both_currencies() {
        let all = Currency::all();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&Currency::Gold));
        assert!(all.contains(&Currency::Diamonds));
    }
}
