use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{loose_decimal, loose_i64, loose_i64_or_zero, loose_text};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(#[serde(deserialize_with = "loose_i64")] pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse::<i64>().map(Self)
    }
}

/// Catalog row as served by the backend `products` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub sku: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub data_technical: Option<String>,
    #[serde(default, deserialize_with = "loose_decimal")]
    pub sale: Option<Decimal>,
    #[serde(default, deserialize_with = "loose_text")]
    pub cfm: Option<String>,
}

impl Product {
    pub fn list_price(&self) -> Decimal {
        self.sale.unwrap_or(Decimal::ZERO)
    }

    pub fn technical_text(&self) -> &str {
        self.data_technical.as_deref().unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    #[serde(default, deserialize_with = "loose_i64_or_zero")]
    pub total_stock: i64,
    #[serde(rename = "almacenes", default)]
    pub warehouses: Vec<WarehouseStock>,
}

impl StockLevel {
    pub fn in_stock(&self) -> bool {
        self.total_stock > 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStock {
    #[serde(default)]
    pub warehouse_name: String,
    #[serde(default, deserialize_with = "loose_i64_or_zero")]
    pub stock: i64,
}
