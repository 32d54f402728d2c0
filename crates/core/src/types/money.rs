//! Money amounts and currency codes.
//!
//! Amounts are plain `rust_decimal::Decimal` values in the store's currency
//! (major units, e.g. riyals not halalas). The currency lives once on the
//! store settings rather than on every amount.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes supported by stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    SAR,
    AED,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Short display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::SAR => "ر.س",
            Self::AED => "د.إ",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// The ISO code as a string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SAR => "SAR",
            Self::AED => "AED",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    /// Format an amount for display, e.g. `149.00 ر.س`.
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        format!("{:.2} {}", round_money(amount), self.symbol())
    }
}

/// Round an amount to two decimal places, halves away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(Decimal::new(10_005, 3)), Decimal::new(1001, 2));
        assert_eq!(round_money(Decimal::new(-10_005, 3)), Decimal::new(-1001, 2));
        assert_eq!(round_money(Decimal::new(15, 0)), Decimal::new(15, 0));
    }

    #[test]
    fn test_default_currency_is_riyal() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::SAR);
        assert_eq!(CurrencyCode::SAR.code(), "SAR");
    }

    #[test]
    fn test_format() {
        assert_eq!(CurrencyCode::USD.format(Decimal::new(1999, 2)), "19.99 $");
    }
}
