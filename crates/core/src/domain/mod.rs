pub mod client;
pub mod product;
pub mod quotation;
pub mod user;

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Backend rows come from a PHP API that returns numeric columns either as
/// JSON numbers or as strings depending on the driver.
pub(crate) fn loose_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match LooseNumber::deserialize(deserializer)? {
        LooseNumber::Int(value) => Ok(value),
        LooseNumber::Float(value) => Ok(value.trunc() as i64),
        LooseNumber::Text(value) => {
            let trimmed = value.trim();
            trimmed
                .parse::<i64>()
                .or_else(|_| trimmed.parse::<f64>().map(|float| float.trunc() as i64))
                .map_err(|_| serde::de::Error::custom(format!("expected a number, got `{value}`")))
        }
    }
}

pub(crate) fn loose_i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LooseNumber>::deserialize(deserializer)?
        .and_then(|number| match number {
            LooseNumber::Int(value) => Some(value),
            LooseNumber::Float(value) => Some(value.trunc() as i64),
            LooseNumber::Text(value) => value.trim().parse::<f64>().ok().map(|v| v.trunc() as i64),
        })
        .unwrap_or(0))
}

pub(crate) fn loose_decimal<'de, D>(deserializer: D) -> Result<Option<rust_decimal::Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal::Decimal;

    Ok(Option::<LooseNumber>::deserialize(deserializer)?.and_then(|number| match number {
        LooseNumber::Int(value) => Some(Decimal::from(value)),
        LooseNumber::Float(value) => Decimal::from_f64(value),
        LooseNumber::Text(value) => value.trim().parse::<Decimal>().ok(),
    }))
}

pub(crate) fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LooseNumber>::deserialize(deserializer)?
        .map(|number| match number {
            LooseNumber::Int(value) => value.to_string(),
            LooseNumber::Float(value) => value.to_string(),
            LooseNumber::Text(value) => value.trim().to_owned(),
        })
        .filter(|value| !value.is_empty()))
}
