use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use cotiza_core::domain::product::ProductId;

/// Every reply-button id the assistant emits or accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    FinalizeQuotation,
    ModifyQuotation,
    ConfirmQuotation,
    CancelQuotation,
    AddMore,
    ChangeSelectedQuantity,
    DeleteSelected,
    ShowSimilar,
    NextSimilar,
    CancelSimilar,
    PreviousLine,
    NextLine,
    BookAppointment,
    StartManualQuotation,
    EditQuantity(usize),
    EditPrice(usize),
    EditDiscount(usize),
    DeleteLine(usize),
    SelectLine(usize),
    QuoteProduct(ProductId),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("unknown action id `{0}`")]
    Unknown(String),
    #[error("action id `{0}` carries an invalid suffix")]
    InvalidSuffix(String),
}

const EXACT: &[(&str, Action)] = &[
    ("finalizar_cotizacion", Action::FinalizeQuotation),
    ("modificar_cotizacion", Action::ModifyQuotation),
    ("confirmar_cotizacion", Action::ConfirmQuotation),
    ("cancelar_cotizacion", Action::CancelQuotation),
    ("agregar_mas", Action::AddMore),
    ("editar_cantidad", Action::ChangeSelectedQuantity),
    ("eliminar_producto", Action::DeleteSelected),
    ("ver_similares", Action::ShowSimilar),
    ("ver_siguiente", Action::NextSimilar),
    ("cancelar_similares", Action::CancelSimilar),
    ("anterior_producto", Action::PreviousLine),
    ("siguiente_producto", Action::NextLine),
    ("option_1", Action::BookAppointment),
    ("option_4", Action::StartManualQuotation),
];

const INDEXED: &[(&str, fn(usize) -> Action)] = &[
    ("editar_cantidad_", Action::EditQuantity),
    ("editar_precio_", Action::EditPrice),
    ("editar_descuento_", Action::EditDiscount),
    ("eliminar_producto_", Action::DeleteLine),
    ("edit_", Action::SelectLine),
];

const QUOTE_PRODUCT_PREFIX: &str = "cotizar_";

impl Action {
    pub fn parse(id: &str) -> Result<Self, ActionParseError> {
        let id = id.trim();

        if let Some((_, action)) = EXACT.iter().find(|(exact, _)| *exact == id) {
            return Ok(*action);
        }

        for (prefix, build) in INDEXED {
            if let Some(suffix) = id.strip_prefix(prefix) {
                return suffix
                    .parse::<usize>()
                    .map(build)
                    .map_err(|_| ActionParseError::InvalidSuffix(id.to_owned()));
            }
        }

        if let Some(suffix) = id.strip_prefix(QUOTE_PRODUCT_PREFIX) {
            return suffix
                .parse::<ProductId>()
                .map(Action::QuoteProduct)
                .map_err(|_| ActionParseError::InvalidSuffix(id.to_owned()));
        }

        Err(ActionParseError::Unknown(id.to_owned()))
    }

    /// Wire id, as used in reply-button ids.
    pub fn id(&self) -> String {
        match self {
            Self::EditQuantity(index)
            | Self::EditPrice(index)
            | Self::EditDiscount(index)
            | Self::DeleteLine(index)
            | Self::SelectLine(index) => {
                let prefix = INDEXED
                    .iter()
                    .find(|(_, build)| build(*index) == *self)
                    .map(|(prefix, _)| *prefix)
                    .unwrap_or_default();
                format!("{prefix}{index}")
            }
            Self::QuoteProduct(product_id) => format!("{QUOTE_PRODUCT_PREFIX}{product_id}"),
            exact => EXACT
                .iter()
                .find(|(_, action)| action == exact)
                .map(|(id, _)| (*id).to_owned())
                .unwrap_or_default(),
        }
    }

    /// Line index carried by the id, for bounds checks before dispatch.
    pub fn line_index(&self) -> Option<usize> {
        match self {
            Self::EditQuantity(index)
            | Self::EditPrice(index)
            | Self::EditDiscount(index)
            | Self::DeleteLine(index)
            | Self::SelectLine(index) => Some(*index),
            _ => None,
        }
    }
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

#[cfg(test)]
mod tests {
    use cotiza_core::domain::product::ProductId;

    use super::{Action, ActionParseError, EXACT};

    #[test]
    fn exact_ids_win_over_prefixes() {
        assert_eq!(Action::parse("editar_cantidad"), Ok(Action::ChangeSelectedQuantity));
        assert_eq!(Action::parse("eliminar_producto"), Ok(Action::DeleteSelected));
        assert_eq!(Action::parse("editar_cantidad_2"), Ok(Action::EditQuantity(2)));
        assert_eq!(Action::parse("eliminar_producto_0"), Ok(Action::DeleteLine(0)));
    }

    #[test]
    fn parses_indexed_and_product_ids() {
        assert_eq!(Action::parse("editar_precio_1"), Ok(Action::EditPrice(1)));
        assert_eq!(Action::parse("editar_descuento_3"), Ok(Action::EditDiscount(3)));
        assert_eq!(Action::parse("edit_4"), Ok(Action::SelectLine(4)));
        assert_eq!(Action::parse("cotizar_118"), Ok(Action::QuoteProduct(ProductId(118))));
    }

    #[test]
    fn malformed_suffixes_are_rejected() {
        assert_eq!(
            Action::parse("editar_precio_x"),
            Err(ActionParseError::InvalidSuffix("editar_precio_x".to_owned()))
        );
        assert_eq!(
            Action::parse("eliminar_producto_-1"),
            Err(ActionParseError::InvalidSuffix("eliminar_producto_-1".to_owned()))
        );
        assert!(matches!(Action::parse("cotizar_"), Err(ActionParseError::InvalidSuffix(_))));
        assert_eq!(Action::parse("ayuda"), Err(ActionParseError::Unknown("ayuda".to_owned())));
    }

    #[test]
    fn rendered_ids_parse_back_to_the_same_action() {
        let mut actions: Vec<Action> = EXACT.iter().map(|(_, action)| *action).collect();
        actions.extend([
            Action::EditQuantity(0),
            Action::EditPrice(2),
            Action::EditDiscount(1),
            Action::DeleteLine(5),
            Action::SelectLine(3),
            Action::QuoteProduct(ProductId(77)),
        ]);

        for action in actions {
            assert_eq!(Action::parse(&action.id()), Ok(action), "{action:?}");
        }
    }

    #[test]
    fn line_index_is_exposed_for_indexed_actions_only() {
        assert_eq!(Action::DeleteLine(2).line_index(), Some(2));
        assert_eq!(Action::QuoteProduct(ProductId(1)).line_index(), None);
        assert_eq!(Action::NextLine.line_index(), None);
    }
}
