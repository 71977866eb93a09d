use serde::{Deserialize, Serialize};

use crate::domain::{
    client::ClientId,
    product::{Product, ProductId},
    quotation::{
        Currency, CurrencyId, LineItem, PaymentMethod, PaymentMethodId, QuotationHeader,
        QuotationId,
    },
    user::UserId,
};
use crate::errors::DomainError;
use crate::flows::HeaderStep;
use crate::session::browse::BrowseSession;
use crate::session::edit::{
    Direction, EditField, EditSession, EditStep, FieldInputError, FieldValue, Selection,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Emptied(LineItem),
    Remaining { removed: LineItem, cursor: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    #[error(transparent)]
    Input(#[from] FieldInputError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Quotation being assembled for one salesperson.
///
/// Line items are only reachable through methods so that the edit cursor
/// always points inside the list and a product appears at most once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationSession {
    pub owner: UserId,
    pub client_id: Option<ClientId>,
    pub client_name: Option<String>,
    lines: Vec<LineItem>,
    pub step: Option<HeaderStep>,
    pub free_search: bool,
    pub ruc: Option<String>,
    pub conditions: Option<String>,
    pub validation: Option<String>,
    pub currency_id: Option<CurrencyId>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub quotation_id: Option<QuotationId>,
    pub currency_options: Vec<Currency>,
    pub payment_method_options: Vec<PaymentMethod>,
    pub edit: Option<EditSession>,
    pub browse: Option<BrowseSession>,
}

impl QuotationSession {
    pub fn new(owner: UserId, free_search: bool) -> Self {
        Self {
            owner,
            client_id: None,
            client_name: None,
            lines: Vec::new(),
            step: None,
            free_search,
            ruc: None,
            conditions: None,
            validation: None,
            currency_id: None,
            payment_method_id: None,
            quotation_id: None,
            currency_options: Vec::new(),
            payment_method_options: Vec::new(),
            edit: None,
            browse: None,
        }
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.lines.iter().any(|line| line.product_id == product_id)
    }

    pub fn add_product(&mut self, product: &Product) -> Result<&LineItem, DomainError> {
        if self.contains_product(product.id) {
            return Err(DomainError::DuplicateProduct(product.id));
        }
        self.lines.push(LineItem::from_product(product));
        self.lines.last().ok_or(DomainError::NoLineItems)
    }

    pub fn line(&self, index: usize) -> Result<&LineItem, DomainError> {
        self.lines
            .get(index)
            .ok_or(DomainError::LineIndexOutOfRange { index, len: self.lines.len() })
    }

    /// Hands the conversation over to the header wizard at `step`.
    pub fn enter_wizard(&mut self, step: HeaderStep) {
        self.step = Some(step);
        self.free_search = false;
        self.edit = None;
        self.browse = None;
    }

    /// Leaves the wizard but keeps the collected lines.
    pub fn exit_wizard(&mut self) {
        self.step = None;
    }

    pub fn wizard_active(&self) -> bool {
        self.step.is_some_and(|step| !step.is_terminal())
    }

    pub fn begin_edit(&mut self, cursor: usize) -> Result<&EditSession, DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::NoLineItems);
        }
        let cursor = cursor.min(self.lines.len() - 1);
        self.free_search = false;
        self.browse = None;
        Ok(self.edit.insert(EditSession::new(cursor)))
    }

    pub fn current_line(&self) -> Option<(usize, &LineItem)> {
        let cursor = self.edit.as_ref()?.cursor();
        self.lines.get(cursor).map(|line| (cursor, line))
    }

    pub fn awaiting_field(&self) -> Option<EditField> {
        self.edit.as_ref().and_then(EditSession::awaiting_field)
    }

    /// Marks line `index` as the target of the next edit.
    pub fn select_line(&mut self, index: usize) -> Result<&LineItem, DomainError> {
        let line_id = self.line(index)?.id;
        let edit = self.edit.get_or_insert_with(|| EditSession::new(index));
        edit.select(Selection { index, line_id });
        self.line(index)
    }

    /// Selects line `index` and waits for a new value of `field`.
    pub fn select_field(&mut self, index: usize, field: EditField) -> Result<(), DomainError> {
        self.select_line(index)?;
        if let Some(edit) = self.edit.as_mut() {
            edit.step = EditStep::Awaiting(field);
        }
        Ok(())
    }

    /// Applies the user's reply to the field being edited.
    ///
    /// Invalid input leaves the session waiting for the same field. A
    /// selection that no longer matches the line at its index clears the
    /// edit session.
    pub fn commit_field(&mut self, input: &str) -> Result<(FieldValue, &LineItem), CommitError> {
        let edit = self.edit.as_ref().ok_or(DomainError::NoEditSession)?;
        let field = edit.awaiting_field().ok_or(DomainError::NoSelection)?;
        let selection = edit.selected().ok_or(DomainError::NoSelection)?;

        let index = match self.lines.get(selection.index) {
            Some(line) if line.id == selection.line_id => selection.index,
            _ => {
                self.edit = None;
                return Err(DomainError::StaleSelection.into());
            }
        };

        let value = field.parse(input)?;
        if let Some(edit) = self.edit.as_mut() {
            edit.finish_field();
        }
        let line = &mut self.lines[index];
        value.apply_to(line);
        Ok((value, &self.lines[index]))
    }

    /// Removes line `index` and clamps the cursor to what is left.
    pub fn delete_line(&mut self, index: usize) -> Result<DeleteOutcome, DomainError> {
        self.line(index)?;
        let removed = self.lines.remove(index);
        if self.lines.is_empty() {
            self.edit = None;
            return Ok(DeleteOutcome::Emptied(removed));
        }

        let cursor = index.min(self.lines.len() - 1);
        self.edit = Some(EditSession::new(cursor));
        Ok(DeleteOutcome::Remaining { removed, cursor })
    }

    /// Removes the line picked through `edit_{i}`.
    pub fn delete_selected(&mut self) -> Result<LineItem, DomainError> {
        let selection = self
            .edit
            .as_ref()
            .and_then(EditSession::selected)
            .ok_or(DomainError::NoSelection)?;
        match self.lines.get(selection.index) {
            Some(line) if line.id == selection.line_id => {}
            _ => {
                self.edit = None;
                return Err(DomainError::StaleSelection);
            }
        }
        let removed = self.lines.remove(selection.index);
        self.edit = None;
        Ok(removed)
    }

    /// Moves the edit cursor one step; refuses to leave the list.
    pub fn navigate(&mut self, direction: Direction) -> Result<usize, DomainError> {
        let len = self.lines.len();
        let edit = self.edit.as_mut().ok_or(DomainError::NoEditSession)?;
        let cursor = edit.cursor();
        let next = match direction {
            Direction::Previous if cursor > 0 => cursor - 1,
            Direction::Previous => return Err(DomainError::CursorAtBoundary("first")),
            Direction::Next if cursor + 1 < len => cursor + 1,
            Direction::Next => return Err(DomainError::CursorAtBoundary("last")),
        };
        edit.set_cursor(next);
        Ok(next)
    }

    pub fn pick_currency(&self, input: &str) -> Option<&Currency> {
        pick_option(&self.currency_options, input)
    }

    pub fn pick_payment_method(&self, input: &str) -> Option<&PaymentMethod> {
        pick_option(&self.payment_method_options, input)
    }

    pub fn header(&self) -> Result<QuotationHeader, DomainError> {
        Ok(QuotationHeader {
            client_id: self.client_id.ok_or(DomainError::MissingHeaderField("client_id"))?,
            user_id: self.owner,
            conditions: self
                .conditions
                .clone()
                .ok_or(DomainError::MissingHeaderField("conditions"))?,
            validation: self
                .validation
                .clone()
                .ok_or(DomainError::MissingHeaderField("validation"))?,
            currency_id: self.currency_id.ok_or(DomainError::MissingHeaderField("currency_id"))?,
            payment_method_id: self
                .payment_method_id
                .ok_or(DomainError::MissingHeaderField("payment_method_id"))?,
        })
    }
}

/// Resolves a 1-based numeric reply against a presented option list.
fn pick_option<'a, T>(options: &'a [T], input: &str) -> Option<&'a T> {
    let choice = input.trim().parse::<usize>().ok()?;
    choice.checked_sub(1).and_then(|index| options.get(index))
}
