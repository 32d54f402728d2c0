//! Store operating settings: currency, shipping, payment, taxes.
//!
//! The shipping and tax rules used at checkout live here because they depend
//! on nothing but the settings document and the cart subtotal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ZoneId;
use super::money::{CurrencyCode, round_money};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    pub currency: CurrencyCode,
    pub language: String,
    pub timezone: String,
    pub shipping: ShippingSettings,
    pub payment: PaymentSettings,
    pub taxes: TaxSettings,
    pub notifications: NotificationSettings,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::SAR,
            language: "ar".to_owned(),
            timezone: "Asia/Riyadh".to_owned(),
            shipping: ShippingSettings::default(),
            payment: PaymentSettings::default(),
            taxes: TaxSettings::default(),
            notifications: NotificationSettings::default(),
        }
    }
}

/// Largest amount a setting may hold.
pub const MAX_SETTING_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Reasons a settings document is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} must be between 0 and 1000000000, got {value}")]
    Amount { field: String, value: Decimal },
    #[error("tax rate must be a percentage between 0 and 100, got {0}")]
    TaxRate(Decimal),
}

impl StoreSettings {
    /// Check shipping amounts and the tax rate.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let shipping = &self.shipping;
        check_amount("shipping.defaultCost", shipping.default_cost)?;
        check_amount(
            "shipping.freeShippingThreshold",
            shipping.free_shipping_threshold,
        )?;
        for zone in &shipping.zones {
            check_amount(&format!("shipping.zones[{}].cost", zone.id), zone.cost)?;
        }
        if !(Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&self.taxes.rate) {
            return Err(SettingsError::TaxRate(self.taxes.rate));
        }
        Ok(())
    }
}

fn check_amount(field: &str, value: Decimal) -> Result<(), SettingsError> {
    if value < Decimal::ZERO || value > MAX_SETTING_AMOUNT {
        return Err(SettingsError::Amount {
            field: field.to_owned(),
            value,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingZone {
    pub id: ZoneId,
    pub name: String,
    pub cities: Vec<String>,
    pub cost: Decimal,
    pub estimated_days: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingSettings {
    pub enabled: bool,
    pub free_shipping_threshold: Decimal,
    pub default_cost: Decimal,
    pub zones: Vec<ShippingZone>,
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            free_shipping_threshold: Decimal::from(200),
            default_cost: Decimal::from(25),
            zones: Vec::new(),
        }
    }
}

impl ShippingSettings {
    /// Shipping charged for an order.
    ///
    /// Free when shipping is disabled or the subtotal reaches the threshold.
    /// Otherwise a zone listing `city` (case-insensitive) sets the price,
    /// falling back to the default cost.
    #[must_use]
    pub fn cost_for(&self, subtotal: Decimal, city: Option<&str>) -> Decimal {
        if !self.enabled || subtotal >= self.free_shipping_threshold {
            return Decimal::ZERO;
        }
        city.and_then(|city| {
            let city = city.trim().to_lowercase();
            self.zones
                .iter()
                .find(|zone| zone.cities.iter().any(|c| c.trim().to_lowercase() == city))
        })
        .map_or(self.default_cost, |zone| zone.cost)
    }

    /// How much more the customer must spend for free shipping, if any.
    #[must_use]
    pub fn remaining_for_free(&self, subtotal: Decimal) -> Option<Decimal> {
        (self.enabled && subtotal < self.free_shipping_threshold)
            .then(|| self.free_shipping_threshold - subtotal)
    }
}

/// Payment methods a store can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    BankTransfer,
    CreditCard,
    Paypal,
    Stripe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PaymentSettings {
    pub cash_on_delivery: bool,
    pub bank_transfer: bool,
    pub credit_card: bool,
    pub paypal: bool,
    pub stripe: bool,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            cash_on_delivery: true,
            bank_transfer: false,
            credit_card: false,
            paypal: false,
            stripe: false,
        }
    }
}

impl PaymentSettings {
    #[must_use]
    pub const fn accepts(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::CashOnDelivery => self.cash_on_delivery,
            PaymentMethod::BankTransfer => self.bank_transfer,
            PaymentMethod::CreditCard => self.credit_card,
            PaymentMethod::Paypal => self.paypal,
            PaymentMethod::Stripe => self.stripe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxSettings {
    pub enabled: bool,
    /// Percentage, e.g. `15` for 15% VAT.
    pub rate: Decimal,
    pub include_in_price: bool,
}

impl TaxSettings {
    /// Tax added on top of `subtotal`. Zero when taxes are off or already
    /// included in prices.
    #[must_use]
    pub fn tax_for(&self, subtotal: Decimal) -> Decimal {
        if !self.enabled || self.include_in_price {
            return Decimal::ZERO;
        }
        round_money(subtotal * self.rate / Decimal::ONE_HUNDRED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn riyadh_zone() -> ShippingZone {
        ShippingZone {
            id: ZoneId::new("zone_riyadh"),
            name: "Riyadh".to_owned(),
            cities: vec!["Riyadh".to_owned(), "الرياض".to_owned()],
            cost: Decimal::from(10),
            estimated_days: "1-2".to_owned(),
        }
    }

    #[test]
    fn test_shipping_threshold() {
        let shipping = ShippingSettings::default();
        assert_eq!(shipping.cost_for(Decimal::from(199), None), Decimal::from(25));
        assert_eq!(shipping.cost_for(Decimal::from(200), None), Decimal::ZERO);
        assert_eq!(shipping.remaining_for_free(Decimal::from(150)), Some(Decimal::from(50)));
        assert_eq!(shipping.remaining_for_free(Decimal::from(250)), None);
    }

    #[test]
    fn test_shipping_zone_and_disabled() {
        let mut shipping = ShippingSettings {
            zones: vec![riyadh_zone()],
            ..ShippingSettings::default()
        };
        assert_eq!(shipping.cost_for(Decimal::from(50), Some(" riyadh ")), Decimal::from(10));
        assert_eq!(shipping.cost_for(Decimal::from(50), Some("Jeddah")), Decimal::from(25));

        shipping.enabled = false;
        assert_eq!(shipping.cost_for(Decimal::from(50), Some("Riyadh")), Decimal::ZERO);
    }

    #[test]
    fn test_tax() {
        let mut taxes = TaxSettings {
            enabled: true,
            rate: Decimal::from(15),
            include_in_price: false,
        };
        assert_eq!(taxes.tax_for(Decimal::new(9999, 2)), Decimal::new(1500, 2));
        taxes.include_in_price = true;
        assert_eq!(taxes.tax_for(Decimal::from(100)), Decimal::ZERO);
        assert_eq!(TaxSettings::default().tax_for(Decimal::from(100)), Decimal::ZERO);
    }

    #[test]
    fn test_validate_settings() {
        assert!(StoreSettings::default().validate().is_ok());

        let mut settings = StoreSettings::default();
        settings.shipping.default_cost = Decimal::from(-500);
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Amount { ref field, .. }) if field == "shipping.defaultCost"
        ));

        let mut settings = StoreSettings::default();
        settings.shipping.zones = vec![ShippingZone {
            cost: Decimal::from(-1),
            ..riyadh_zone()
        }];
        assert!(settings.validate().is_err());

        let mut settings = StoreSettings::default();
        settings.shipping.free_shipping_threshold = Decimal::MAX;
        assert!(settings.validate().is_err());

        let mut settings = StoreSettings::default();
        settings.taxes.rate = Decimal::MAX;
        assert_eq!(settings.validate(), Err(SettingsError::TaxRate(Decimal::MAX)));
        settings.taxes.rate = Decimal::ONE_HUNDRED;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_payment_defaults() {
        let payment = PaymentSettings::default();
        assert!(payment.accepts(PaymentMethod::CashOnDelivery));
        assert!(!payment.accepts(PaymentMethod::Stripe));
    }
}
