//! # Money Module
//!
//! Currency and Money built on rust_decimal so platform balances (USDT)
//! and bank-side amounts (RUB) never touch binary floating point.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A currency with a fixed number of decimal places.
///
/// # Examples
/// ```
/// use advancepay_core::Currency;
///
/// let usdt = Currency::usdt();
/// assert_eq!(usdt.decimals, 6);
///
/// let rub = Currency::rub();
/// assert_eq!(rub.decimals, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    /// Currency code (ISO 4217 for fiat, ticker for crypto)
    pub code: String,
    /// Full name
    pub name: String,
    /// Number of decimal places (RUB=2, USDT=6)
    pub decimals: u8,
    /// Display symbol
    pub symbol: String,
}

impl Currency {
    /// Create a new Currency
    pub fn new(code: &str, name: &str, decimals: u8, symbol: &str) -> Self {
        Self {
            code: code.to_uppercase(),
            name: name.to_string(),
            decimals,
            symbol: symbol.to_string(),
        }
    }

    // === Preset currencies ===

    /// Tether USDT (6 decimals) - the platform settlement currency
    pub fn usdt() -> Self {
        Self::new("USDT", "Tether", 6, "₮")
    }

    /// Russian Ruble (2 decimals) - the bank-side currency
    pub fn rub() -> Self {
        Self::new("RUB", "Russian Ruble", 2, "₽")
    }

    /// US Dollar (2 decimals)
    pub fn usd() -> Self {
        Self::new("USD", "US Dollar", 2, "$")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// An amount paired with its currency.
///
/// Uses `rust_decimal::Decimal`, so arithmetic is exact: repeated top-ups
/// and conversions cannot drift the way f64 totals do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount (Decimal, serialized as String in JSON)
    pub amount: Decimal,
    /// Currency of the amount
    pub currency: Currency,
}

impl Money {
    /// Create new Money
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Create Money with amount = 0
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Check whether the amount is positive
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Check whether the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount == Decimal::ZERO
    }

    /// Check whether the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Add two Money values of the same currency
    ///
    /// # Panics
    /// Panics if the currencies differ
    pub fn add(&self, other: &Money) -> Money {
        assert_eq!(
            self.currency.code, other.currency.code,
            "Cannot add different currencies: {} vs {}",
            self.currency.code, other.currency.code
        );
        Money {
            amount: self.amount + other.amount,
            currency: self.currency.clone(),
        }
    }

    /// Subtract two Money values of the same currency
    ///
    /// # Panics
    /// Panics if the currencies differ
    pub fn sub(&self, other: &Money) -> Money {
        assert_eq!(
            self.currency.code, other.currency.code,
            "Cannot subtract different currencies: {} vs {}",
            self.currency.code, other.currency.code
        );
        Money {
            amount: self.amount - other.amount,
            currency: self.currency.clone(),
        }
    }

    /// Multiply by a scalar
    pub fn mul(&self, multiplier: Decimal) -> Money {
        Money {
            amount: self.amount * multiplier,
            currency: self.currency.clone(),
        }
    }

    /// Convert to another currency at the given rate (units of self per
    /// unit of target), rounding to the target currency's decimals.
    ///
    /// Returns `None` if the rate is not positive.
    pub fn convert(&self, rate: Decimal, target: Currency) -> Option<Money> {
        if rate <= Decimal::ZERO {
            return None;
        }
        let converted = (self.amount / rate).round_dp(target.decimals as u32);
        Some(Money::new(converted, target))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_presets() {
        let usdt = Currency::usdt();
        assert_eq!(usdt.code, "USDT");
        assert_eq!(usdt.decimals, 6);

        let rub = Currency::rub();
        assert_eq!(rub.code, "RUB");
        assert_eq!(rub.decimals, 2);
    }

    #[test]
    fn test_money_add() {
        let usdt = Currency::usdt();
        let a = Money::new(dec!(100.50), usdt.clone());
        let b = Money::new(dec!(50.25), usdt);
        let result = a.add(&b);
        assert_eq!(result.amount, dec!(150.75));
    }

    #[test]
    fn test_money_sub() {
        let usdt = Currency::usdt();
        let a = Money::new(dec!(100.00), usdt.clone());
        let b = Money::new(dec!(30.50), usdt);
        let result = a.sub(&b);
        assert_eq!(result.amount, dec!(69.50));
    }

    #[test]
    #[should_panic(expected = "Cannot add different currencies")]
    fn test_money_add_different_currencies_panics() {
        let usdt = Money::new(dec!(100), Currency::usdt());
        let rub = Money::new(dec!(100), Currency::rub());
        usdt.add(&rub);
    }

    #[test]
    fn test_rub_to_usdt_conversion() {
        // 9245 RUB at 92.45 RUB/USDT is exactly 100 USDT
        let rub = Money::new(dec!(9245), Currency::rub());
        let usdt = rub.convert(dec!(92.45), Currency::usdt()).unwrap();
        assert_eq!(usdt.amount, dec!(100));
        assert_eq!(usdt.currency.code, "USDT");
    }

    #[test]
    fn test_conversion_rounds_to_target_decimals() {
        let rub = Money::new(dec!(3500), Currency::rub());
        let usdt = rub.convert(dec!(92.45), Currency::usdt()).unwrap();
        // 3500 / 92.45 = 37.858301... -> 6 decimals
        assert_eq!(usdt.amount, dec!(37.858302));
    }

    #[test]
    fn test_conversion_rejects_non_positive_rate() {
        let rub = Money::new(dec!(100), Currency::rub());
        assert!(rub.convert(dec!(0), Currency::usdt()).is_none());
        assert!(rub.convert(dec!(-1), Currency::usdt()).is_none());
    }

    #[test]
    fn test_money_display() {
        let money = Money::new(dec!(1234.56), Currency::usdt());
        assert_eq!(format!("{}", money), "1234.56 USDT");
    }
}
