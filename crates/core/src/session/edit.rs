use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::quotation::{LineItem, LineItemId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditField {
    Quantity,
    Price,
    Discount,
}

impl fmt::Display for EditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quantity => "quantity",
            Self::Price => "price",
            Self::Discount => "discount",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Quantity(u32),
    Price(Decimal),
    Discount(Decimal),
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("`{field}` input is not valid")]
pub struct FieldInputError {
    pub field: EditField,
}

impl EditField {
    /// Parses a reply for this field. Prices accept a comma as the decimal
    /// separator; quantities must be whole numbers.
    pub fn parse(&self, input: &str) -> Result<FieldValue, FieldInputError> {
        let trimmed = input.trim();
        let invalid = FieldInputError { field: *self };
        match self {
            Self::Quantity => trimmed
                .parse::<u32>()
                .ok()
                .filter(|quantity| *quantity > 0)
                .map(FieldValue::Quantity)
                .ok_or(invalid),
            Self::Price => trimmed
                .replace(',', ".")
                .parse::<Decimal>()
                .ok()
                .filter(|price| *price > Decimal::ZERO)
                .map(FieldValue::Price)
                .ok_or(invalid),
            Self::Discount => trimmed
                .replace(',', ".")
                .parse::<Decimal>()
                .ok()
                .filter(|discount| *discount >= Decimal::ZERO && *discount <= Decimal::ONE_HUNDRED)
                .map(FieldValue::Discount)
                .ok_or(invalid),
        }
    }
}

impl FieldValue {
    pub fn apply_to(&self, line: &mut LineItem) {
        match *self {
            Self::Quantity(quantity) => line.quantity = quantity,
            Self::Price(price) => line.final_price = price,
            Self::Discount(discount) => line.discount_pct = discount,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditStep {
    Browsing,
    Awaiting(EditField),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub line_id: LineItemId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Previous,
    Next,
}

/// Cursor over the quotation lines while the user reviews them one by one.
///
/// The cursor is kept inside `0..len` by every mutation on
/// [`crate::session::QuotationSession`]; the selection remembers the line id
/// so a commit after the lines changed underneath is refused instead of
/// landing on a different product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
    pub step: EditStep,
    cursor: usize,
    selected: Option<Selection>,
}

impl EditSession {
    pub(crate) fn new(cursor: usize) -> Self {
        Self { step: EditStep::Browsing, cursor, selected: None }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<Selection> {
        self.selected
    }

    pub fn awaiting_field(&self) -> Option<EditField> {
        match self.step {
            EditStep::Awaiting(field) => Some(field),
            EditStep::Browsing => None,
        }
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    pub(crate) fn select(&mut self, selection: Selection) {
        self.cursor = selection.index;
        self.selected = Some(selection);
    }

    pub(crate) fn finish_field(&mut self) {
        self.step = EditStep::Browsing;
    }
}
