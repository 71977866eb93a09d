use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    client::ClientId,
    loose_i64,
    product::{Product, ProductId},
    user::UserId,
};

/// Fixed validity term stamped on every quotation header.
pub const VALIDATION_TERM: &str = "15 días";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotationId(#[serde(deserialize_with = "loose_i64")] pub i64);

impl fmt::Display for QuotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemId(pub Uuid);

impl LineItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineItemId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub sku: String,
    pub description: String,
    pub final_price: Decimal,
    pub quantity: u32,
    pub discount_pct: Decimal,
}

impl LineItem {
    /// New lines start at the catalog list price, one unit, no discount.
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: LineItemId::new(),
            product_id: product.id,
            sku: product.sku.clone(),
            description: product.description.clone(),
            final_price: product.list_price(),
            quantity: 1,
            discount_pct: Decimal::ZERO,
        }
    }

    /// SKU when present, product id otherwise.
    pub fn label(&self) -> String {
        if self.sku.trim().is_empty() {
            self.product_id.to_string()
        } else {
            self.sku.clone()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyId(#[serde(deserialize_with = "loose_i64")] pub i64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentMethodId(#[serde(deserialize_with = "loose_i64")] pub i64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationHeader {
    pub client_id: ClientId,
    pub user_id: UserId,
    pub conditions: String,
    pub validation: String,
    pub currency_id: CurrencyId,
    pub payment_method_id: PaymentMethodId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationLineRecord {
    pub quotation_id: QuotationId,
    pub product_id: ProductId,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
}

impl QuotationLineRecord {
    pub fn for_line(quotation_id: QuotationId, line: &LineItem) -> Self {
        Self {
            quotation_id,
            product_id: line.product_id,
            final_price: line.final_price,
            quantity: line.quantity,
            discount: line.discount_pct,
        }
    }
}
