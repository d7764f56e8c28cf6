//! The cart total calculator.
//!
//! All monetary amounts are VAT-inclusive [`rust_decimal::Decimal`] values;
//! the calculator derives the full set of persisted cart aggregates as a pure
//! function of the line items plus a [`PricingConfig`]. Every cart mutation
//! path calls [`compute_cart_aggregates`] — there is exactly one place this
//! arithmetic lives.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::app_config::AppConfig;

/// Whether a cart line item is destined for home delivery or in-store pickup.
///
/// Only delivery items attract the flat delivery charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentType {
    ForDelivery,
    ForCollection,
}

impl FulfillmentType {
    /// The storage/wire form, matching the `cart_items.fulfillment` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FulfillmentType::ForDelivery => "for_delivery",
            FulfillmentType::ForCollection => "for_collection",
        }
    }

    /// Parses the storage form. Returns `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "for_delivery" => Some(FulfillmentType::ForDelivery),
            "for_collection" => Some(FulfillmentType::ForCollection),
            _ => None,
        }
    }
}

impl std::fmt::Display for FulfillmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cart line item joined with the pricing fields of its inventory's product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCartItem {
    pub quantity: i32,
    pub fulfillment: FulfillmentType,
    /// VAT-inclusive everyday price.
    pub retail_price: Option<Decimal>,
    /// VAT-inclusive offer price; wins over retail when present and non-zero.
    pub promotional_price: Option<Decimal>,
}

impl PricedCartItem {
    /// The effective unit price: promotional if present and non-zero, else
    /// retail, else zero.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.promotional_price
            .filter(|p| !p.is_zero())
            .or(self.retail_price)
            .unwrap_or(Decimal::ZERO)
    }

    /// `unit_price × quantity`, VAT-inclusive.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

/// Injected pricing constants: the VAT rate and the flat delivery fee.
///
/// These are configuration, not literals in the calculator, so tests and
/// regional deployments can vary them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    /// Fractional VAT rate, e.g. `0.20` for 20%.
    pub vat_rate: Decimal,
    /// Flat fee applied once when the cart holds any delivery item.
    pub delivery_flat_fee: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            vat_rate: Decimal::new(20, 2),          // 0.20
            delivery_flat_fee: Decimal::new(500, 2), // 5.00
        }
    }
}

impl PricingConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            vat_rate: config.vat_rate,
            delivery_flat_fee: config.delivery_fee,
        }
    }
}

/// The derived monetary aggregates persisted onto a cart after every item
/// mutation.
///
/// `delivery_vat` is the VAT on the delivery charge itself; it is folded into
/// `vat` and `total_with_vat` and carried here so callers (and tests) can see
/// the breakdown without re-deriving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartAggregates {
    pub delivery_total_with_vat: Decimal,
    pub delivery_total_without_vat: Decimal,
    pub collection_total_with_vat: Decimal,
    pub collection_total_without_vat: Decimal,
    pub sub_total_with_vat: Decimal,
    pub sub_total_without_vat: Decimal,
    pub delivery_charge: Decimal,
    pub delivery_vat: Decimal,
    pub vat: Decimal,
    pub total_with_vat: Decimal,
    pub total_without_vat: Decimal,
}

impl CartAggregates {
    /// All-zero aggregates, the state of a cart with no items.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            delivery_total_with_vat: Decimal::ZERO,
            delivery_total_without_vat: Decimal::ZERO,
            collection_total_with_vat: Decimal::ZERO,
            collection_total_without_vat: Decimal::ZERO,
            sub_total_with_vat: Decimal::ZERO,
            sub_total_without_vat: Decimal::ZERO,
            delivery_charge: Decimal::ZERO,
            delivery_vat: Decimal::ZERO,
            vat: Decimal::ZERO,
            total_with_vat: Decimal::ZERO,
            total_without_vat: Decimal::ZERO,
        }
    }
}

/// Converts a VAT-inclusive amount to its VAT-exclusive counterpart, rounded
/// to currency precision at the point of conversion.
fn ex_vat(with_vat: Decimal, vat_rate: Decimal) -> Decimal {
    (with_vat / (Decimal::ONE + vat_rate))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Recomputes the full aggregate set from the current line items.
///
/// The invariants the storefront depends on hold by construction:
/// `total_with_vat == sub_total_with_vat + delivery_charge + delivery_vat`,
/// `total_without_vat == sub_total_without_vat + delivery_charge`, and the
/// delivery charge is applied exactly when at least one item is for delivery.
#[must_use]
pub fn compute_cart_aggregates(items: &[PricedCartItem], pricing: &PricingConfig) -> CartAggregates {
    let mut delivery_total_with_vat = Decimal::ZERO;
    let mut collection_total_with_vat = Decimal::ZERO;
    let mut has_delivery_items = false;

    for item in items {
        match item.fulfillment {
            FulfillmentType::ForDelivery => {
                has_delivery_items = true;
                delivery_total_with_vat += item.line_total();
            }
            FulfillmentType::ForCollection => {
                collection_total_with_vat += item.line_total();
            }
        }
    }

    let delivery_charge = if has_delivery_items {
        pricing.delivery_flat_fee
    } else {
        Decimal::ZERO
    };
    let delivery_vat = (delivery_charge * pricing.vat_rate)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let delivery_total_without_vat = ex_vat(delivery_total_with_vat, pricing.vat_rate);
    let collection_total_without_vat = ex_vat(collection_total_with_vat, pricing.vat_rate);

    let sub_total_with_vat = delivery_total_with_vat + collection_total_with_vat;
    let sub_total_without_vat = delivery_total_without_vat + collection_total_without_vat;

    let vat = (sub_total_with_vat - sub_total_without_vat) + delivery_vat;
    let total_with_vat = sub_total_with_vat + delivery_charge + delivery_vat;
    let total_without_vat = sub_total_without_vat + delivery_charge;

    CartAggregates {
        delivery_total_with_vat,
        delivery_total_without_vat,
        collection_total_with_vat,
        collection_total_without_vat,
        sub_total_with_vat,
        sub_total_without_vat,
        delivery_charge,
        delivery_vat,
        vat,
        total_with_vat,
        total_without_vat,
    }
}
