//! User-facing messages. Texts follow the wording the sales team already
//! knows from the WhatsApp assistant.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use cotiza_core::domain::client::{AgentContact, ClientRecord};
use cotiza_core::domain::product::{Product, StockLevel};
use cotiza_core::domain::quotation::{Currency, LineItem, PaymentMethod, QuotationId};
use cotiza_core::flows::HeaderStep;
use cotiza_core::session::{AppointmentRecord, AppointmentStep, EditField, FieldValue};
use cotiza_whatsapp::{Action, MessageBuilder, OutboundMessage};

static MOTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)potencia.+?hp").expect("motor pattern compiles"));
static TANK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)volumen.+?\d+.+?lts?").expect("tank pattern compiles")
});
static CFM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(\.\d+)?)\s*cfm").expect("cfm pattern compiles"));

pub const GENERIC_ERROR: &str = "❌ Ocurrió un error al procesar tu solicitud.";
pub const NO_LINES: &str = "❌ No hay productos en la cotización.";
pub const LINE_GONE: &str = "⚠️ Ese producto ya no existe en la cotización.";
pub const VOICE_ERROR: &str = "❌ Ocurrió un error al procesar tu mensaje de voz.";
pub const VOICE_EMPTY: &str = "❌ No pude transcribir tu audio. Intenta enviar un mensaje más claro.";

fn usd(amount: Decimal) -> String {
    format!("USD {:.2}", amount.round_dp(2))
}

fn percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}

pub fn unauthorized(number: &str) -> OutboundMessage {
    OutboundMessage::text(format!(
        "❌ Tu número *{number}* no está registrado como usuario autorizado.\nPor favor contacta al administrador para habilitar tu acceso."
    ))
}

pub fn welcome_menu() -> OutboundMessage {
    MessageBuilder::new("Elige una Opción")
        .button(Action::BookAppointment, "Agendar cita")
        .button(Action::StartManualQuotation, "Generar cotización")
        .build()
}

/// Engine power and tank volume phrases found in the technical sheet.
pub fn technical_highlights(product: &Product) -> (Option<String>, Option<String>) {
    let sheet = product.technical_text();
    let motor = MOTOR.find(sheet).map(|found| found.as_str().to_owned());
    let tank = TANK.find(sheet).map(|found| found.as_str().to_owned());
    (motor, tank)
}

fn cfm_value(product: &Product) -> Option<String> {
    product.cfm.clone().or_else(|| {
        CFM.captures(product.technical_text())
            .and_then(|captures| captures.get(1))
            .map(|found| found.as_str().to_owned())
    })
}

// search

pub fn already_quoted_single(clause: &str) -> OutboundMessage {
    OutboundMessage::text(format!(
        "✅ Ya agregaste el único producto que coincide con: *\"{clause}\"* a tu cotización.\nSi deseas ver otras opciones, intenta buscar por otro modelo o potencia."
    ))
}

pub fn nothing_similar(clause: &str) -> OutboundMessage {
    OutboundMessage::text(format!("❌ No encontré productos similares a: *\"{clause}\"*."))
}

pub fn no_exact_match(clause: &str) -> OutboundMessage {
    OutboundMessage::text(format!(
        "❌ No encontré productos que coincidan con: *\"{clause}\"*.\nPero puedo sugerirte algunos similares."
    ))
}

pub fn offer_similar() -> OutboundMessage {
    MessageBuilder::new("¿Deseas ver compresores similares?")
        .button(Action::ShowSimilar, "Ver similares")
        .button(Action::CancelSimilar, "No, gracias")
        .build()
}

/// Product card for an exact match; `stock` is `None` when it could not be read.
pub fn product_card(product: &Product, stock: Option<&StockLevel>) -> OutboundMessage {
    let mut body = format!("🔍 *Producto:*\n*{}*\nSKU: *{}*", product.description, product.sku);
    if let Some(price) = product.sale {
        body.push_str(&format!("\n💲 Precio: *{}*", usd(price)));
    }
    if let Some(cfm) = &product.cfm {
        body.push_str(&format!("\n🔧 CFM: *{cfm}*"));
    }
    let (motor, tank) = technical_highlights(product);
    if let Some(motor) = motor {
        body.push_str(&format!("\n⚙️ {motor}"));
    }
    if let Some(tank) = tank {
        body.push_str(&format!("\n🛢️ {tank}"));
    }

    match stock {
        Some(stock) if stock.in_stock() => {
            body.push_str("\n\n✅ *¡Sí tenemos stock!*");
            body.push_str(&format!("\nTotal: *{}* unidades", stock.total_stock));
            for warehouse in &stock.warehouses {
                body.push_str(&format!("\n🏢 {}: {}", warehouse.warehouse_name, warehouse.stock));
            }
        }
        Some(_) => body
            .push_str("\n\n⚠️ El producto está registrado pero *no tiene stock disponible*."),
        None => body.push_str("\n\n⚠️ No pude consultar el stock en este momento."),
    }
    OutboundMessage::text(body)
}

pub fn offer_quote(product: &Product) -> OutboundMessage {
    MessageBuilder::new("¿Deseas cotizar este producto?")
        .button(Action::QuoteProduct(product.id), "🛒 Cotizar este")
        .build()
}

// similarity browse

pub fn similar_card(product: &Product, stock: Option<&StockLevel>, has_next: bool) -> OutboundMessage {
    let mut body = format!("🔄 Producto similar:\n*{}*\nSKU: *{}*", product.description, product.sku);
    let (motor, tank) = technical_highlights(product);
    if let Some(motor) = motor {
        body.push_str(&format!("\n⚙️ {motor}"));
    }
    if let Some(tank) = tank {
        body.push_str(&format!("\n🛢️ {tank}"));
    }
    if let Some(price) = product.sale {
        body.push_str(&format!("\n💰 Precio: *{}*", usd(price)));
    }
    if let Some(cfm) = cfm_value(product) {
        body.push_str(&format!("\n🌬️ CFM: *{cfm}*"));
    }
    match stock {
        Some(stock) if stock.in_stock() => {
            body.push_str(&format!("\n✅ Stock: *{}* unidades", stock.total_stock));
        }
        Some(_) => body.push_str("\n⚠️ Sin stock disponible."),
        None => body.push_str("\n⚠️ No pude consultar el stock en este momento."),
    }

    MessageBuilder::new(body)
        .button(Action::QuoteProduct(product.id), "🛒 Cotizar este")
        .button_if(has_next, Action::NextSimilar, "⏭️ Ver siguiente")
        .button_if(!has_next, Action::CancelSimilar, "Cancelar")
        .build()
}

pub const NO_SIMILAR_AVAILABLE: &str =
    "❌ No tengo productos similares para mostrarte en este momento.";
pub const SIMILAR_EXHAUSTED: &str = "✅ No hay más productos similares.";
pub const SIMILAR_ALL_QUOTED: &str = "✅ Ya has agregado todos los productos similares sugeridos.";
pub const SIMILAR_CANCELLED: &str = "✅ Entendido. No mostraré compresores similares.";

// quotation lines

pub fn product_added(line: &LineItem) -> OutboundMessage {
    OutboundMessage::text(format!(
        "✅ Producto agregado:\n*{}*\nSKU: {}\n💰 Precio de lista: {}\nCantidad: {}\nDescuento: {}",
        line.description,
        line.sku,
        usd(line.final_price),
        line.quantity,
        percent(line.discount_pct),
    ))
}

pub fn product_already_added(product: &Product) -> OutboundMessage {
    OutboundMessage::text(format!(
        "✅ *{}* ya está en tu cotización.",
        product.description
    ))
}

pub fn add_more_or_finish() -> OutboundMessage {
    MessageBuilder::new("¿Deseas agregar más productos o finalizar la cotización?")
        .button(Action::AddMore, "➕ Agregar más")
        .button(Action::FinalizeQuotation, "✅ Finalizar")
        .build()
}

pub const PRODUCT_NOT_FOUND: &str = "❌ Producto no encontrado.";
pub const ADD_MORE_PROMPT: &str =
    "✏️ Escribe la descripción o SKU del nuevo producto que deseas agregar.";

pub fn quotation_summary(lines: &[LineItem]) -> OutboundMessage {
    let mut body = String::from("🧾 *Resumen de productos:*");
    for (index, line) in lines.iter().enumerate() {
        body.push_str(&format!("\n{}. *{}*\nSKU: {}", index + 1, line.description, line.sku));
    }
    OutboundMessage::text(body)
}

pub fn before_confirm() -> OutboundMessage {
    MessageBuilder::new("¿Qué deseas hacer antes de generar la cotización?")
        .button(Action::ConfirmQuotation, "✅ Confirmar")
        .button(Action::ModifyQuotation, "✏️ Modificar")
        .button(Action::AddMore, "➕ Agregar más")
        .build()
}

pub const NO_LINES_TO_MODIFY: &str = "❌ No hay productos en la cotización para modificar.";
pub const NO_ACTIVE_QUOTATION: &str =
    "❌ No tienes una cotización activa. Busca un producto para empezar.";
pub const QUOTATION_CANCELLED: &str = "🗑️ Cotización cancelada.";

// edit sub-flow

/// Detail card plus the field and navigation prompts for line `index`.
pub fn line_editor(lines: &[LineItem], index: usize) -> Vec<OutboundMessage> {
    let Some(line) = lines.get(index) else {
        return vec![OutboundMessage::text(LINE_GONE)];
    };

    let detail = format!(
        "🧾 *Producto {} de {}*\n📦 *{}*\nSKU: *{}*\n💰 Precio actual: *{}*\n🔢 Cantidad: *{}*\n🔻 Descuento: *{}*",
        index + 1,
        lines.len(),
        line.description,
        line.sku,
        usd(line.final_price),
        line.quantity,
        percent(line.discount_pct),
    );

    let fields = MessageBuilder::new("¿Qué deseas modificar?")
        .button(Action::EditPrice(index), "💰 Precio")
        .button(Action::EditQuantity(index), "✏️ Cantidad")
        .button(Action::EditDiscount(index), "🔻 Descuento")
        .build();

    let navigation = MessageBuilder::new("Opciones adicionales:")
        .button_if(index > 0, Action::PreviousLine, "⏮️ Anterior")
        .button_if(index + 1 < lines.len(), Action::NextLine, "⏭️ Siguiente")
        .button(Action::DeleteLine(index), "🗑️ Eliminar")
        .build();

    vec![OutboundMessage::text(detail), fields, navigation]
}

pub fn field_prompt(field: EditField) -> OutboundMessage {
    OutboundMessage::text(match field {
        EditField::Quantity => "✏️ Ingresa la nueva cantidad para el producto seleccionado:",
        EditField::Price => "💰 Ingresa el nuevo precio para este producto:",
        EditField::Discount => "🔻 Ingresa el descuento en porcentaje (por ejemplo, 10):",
    })
}

pub fn field_invalid(field: EditField) -> OutboundMessage {
    OutboundMessage::text(match field {
        EditField::Quantity => "⚠️ Ingresa una cantidad válida (número entero mayor a 0).",
        EditField::Price => "⚠️ Ingresa un precio válido mayor a 0.",
        EditField::Discount => "⚠️ Ingresa un descuento válido entre 0 y 100.",
    })
}

pub fn field_updated(value: FieldValue) -> OutboundMessage {
    OutboundMessage::text(match value {
        FieldValue::Quantity(quantity) => format!("✅ Cantidad actualizada a *{quantity}* unidad(es)."),
        FieldValue::Price(price) => format!("✅ Precio actualizado a {}.", usd(price)),
        FieldValue::Discount(discount) => format!("✅ Descuento actualizado a *{}*.", percent(discount)),
    })
}

pub fn modify_or_confirm() -> OutboundMessage {
    MessageBuilder::new("¿Deseas modificar otro producto o finalizar?")
        .button(Action::ModifyQuotation, "✏️ Modificar")
        .button(Action::ConfirmQuotation, "✅ Confirmar")
        .build()
}

pub fn selected_line_options() -> OutboundMessage {
    MessageBuilder::new("¿Qué deseas hacer con este producto?")
        .button(Action::ChangeSelectedQuantity, "✏️ Cambiar cantidad")
        .button(Action::DeleteSelected, "🗑️ Eliminar")
        .build()
}

pub const LINE_DELETED_LAST: &str = "🗑️ Producto eliminado. No hay más productos en la cotización.";
pub const LINE_DELETED_CONTINUE: &str = "🗑️ Producto eliminado. Continuemos con el siguiente:";
pub const SELECTED_LINE_DELETED: &str = "🗑️ Producto eliminado de la cotización.";
pub const NO_SELECTION: &str = "⚠️ Primero elige un producto de la cotización.";
pub const STALE_SELECTION: &str =
    "⚠️ El producto seleccionado cambió. Vuelve a elegirlo desde *Modificar*.";
pub const NOT_EDITING: &str = "⚠️ No estás editando la cotización.";

// header wizard

pub const START_HEADER: &str =
    "🎉 Vamos a iniciar la cotización. Por favor ingresa el RUC del cliente.";
pub const CLIENT_NAME_PROMPT: &str = "Vamos a crear una cotización. ¿Cuál es el nombre del cliente?";
pub const CONDITIONS_PROMPT: &str = "✍️ Ingresa las *condiciones* de la cotización:";
pub const CONDITIONS_EMPTY: &str = "⚠️ Las condiciones no pueden estar vacías.";
pub const ANOTHER_RUC_PROMPT: &str = "Por favor, ingresa **otro RUC**:";
pub const AUTO_REGISTERING: &str = "🆕 Cliente no estaba registrado. Registrándolo automáticamente…";
pub const RUC_UNVERIFIED: &str = "⚠️ No pude validar el RUC. Intenta nuevamente con otro RUC.";
pub const RUC_INVALID: &str = "❌ Debes enviar un *RUC* y *número* válidos.";
pub const RUC_CHECK_FAILED: &str = "❌ Error verificando el RUC. Intenta nuevamente.";
pub const SENDER_NOT_AUTHORIZED: &str = "❌ Tu número no está registrado como usuario autorizado.";
pub const CURRENCY_INVALID: &str = "⚠️ Selección inválida. Intenta con el número de la moneda.";
pub const PAYMENT_INVALID: &str = "⚠️ Selección inválida. Intenta con el número del método.";
pub const CURRENCIES_UNAVAILABLE: &str = "❌ No pude obtener las monedas. Intenta nuevamente.";
pub const PAYMENT_METHODS_UNAVAILABLE: &str =
    "❌ No pude obtener los métodos de pago. Intenta nuevamente.";
pub const HEADER_FAILED: &str = "❌ No pude generar la cabecera de la cotización.";
pub const NO_LINES_TO_SUBMIT: &str = "⚠️ No hay productos para agregar a la cotización.";
pub const FINISH_HEADER_FIRST: &str =
    "⚠️ Primero termina la cabecera de la cotización o cancélala.";

pub fn tax_id_prompt() -> OutboundMessage {
    MessageBuilder::new(
        "📄 Vamos a continuar con la creación de la cabecera de la cotización. Por favor, envíame el RUC del cliente.",
    )
    .button(Action::CancelQuotation, "❌ Cancelar")
    .build()
}

pub fn start_header() -> OutboundMessage {
    MessageBuilder::new(START_HEADER).button(Action::CancelQuotation, "❌ Cancelar").build()
}

fn with_address(mut body: String, client: &ClientRecord) -> String {
    if let Some(address) = client.address.as_deref().filter(|address| !address.is_empty()) {
        body.push_str(&format!("\n📍 {address}"));
    }
    body
}

pub fn client_found(client: &ClientRecord) -> OutboundMessage {
    OutboundMessage::text(with_address(
        format!("✅ Cliente encontrado:\n*{}*\nRUC: {}", client.name, client.ruc),
        client,
    ))
}

pub fn client_auto_registered(client: &ClientRecord) -> OutboundMessage {
    OutboundMessage::text(with_address(
        format!("✅ Cliente registrado automáticamente:\n*{}*\nRUC: {}", client.name, client.ruc),
        client,
    ))
}

pub fn client_registered_as(client: &ClientRecord) -> OutboundMessage {
    OutboundMessage::text(with_address(
        format!("✅ Cliente registrado como:\n*{}*\nRUC: {}", client.name, client.ruc),
        client,
    ))
}

pub fn owned_by_other_agent(agent: Option<&AgentContact>) -> OutboundMessage {
    let first = agent.and_then(|agent| agent.first_name.as_deref()).unwrap_or("-");
    let last = agent.and_then(|agent| agent.last_name.as_deref()).unwrap_or_default();
    let phone = agent.and_then(|agent| agent.phone.as_deref()).unwrap_or("-");
    OutboundMessage::text(format!("⛔ Este RUC pertenece al asesor *{first} {last}* 📞 {phone}."))
}

pub fn registration_failed_retry(upstream: &str) -> OutboundMessage {
    OutboundMessage::text(format!("❌ {upstream} Por favor ingresa **otro RUC**:"))
}

pub fn registration_error(upstream: &str) -> OutboundMessage {
    OutboundMessage::text(format!("❌ Error: {upstream}"))
}

pub fn currency_menu(currencies: &[Currency]) -> OutboundMessage {
    let mut body = String::from("💱 Elige la moneda para la cotización:\n");
    for (index, currency) in currencies.iter().enumerate() {
        body.push_str(&format!("{}. {} ({})\n", index + 1, currency.name, currency.code));
    }
    OutboundMessage::text(body)
}

pub fn payment_method_menu(methods: &[PaymentMethod]) -> OutboundMessage {
    let mut body = String::from("💳 Elige el método de pago:\n");
    for (index, method) in methods.iter().enumerate() {
        body.push_str(&format!("{}. {}\n", index + 1, method.name));
    }
    OutboundMessage::text(body)
}

pub fn generating_quotation(client_name: Option<&str>) -> OutboundMessage {
    OutboundMessage::text(format!(
        "🧾 Generando cotización para *{}*...",
        client_name.unwrap_or("tu cliente")
    ))
}

pub fn line_submission_failed(line: &LineItem) -> OutboundMessage {
    OutboundMessage::text(format!(
        "⚠️ Error al agregar el producto *{}* a la cotización.",
        line.label()
    ))
}

pub fn quotation_document(url: &str, quotation_id: QuotationId, client_name: Option<&str>) -> OutboundMessage {
    OutboundMessage::document(
        url,
        format!("🧾 Cotización #{quotation_id} para *{}*.", client_name.unwrap_or("tu cliente")),
    )
}

/// Prompt that re-opens the given wizard step.
pub fn step_prompt(step: HeaderStep, currencies: &[Currency], methods: &[PaymentMethod]) -> OutboundMessage {
    match step {
        HeaderStep::AwaitingTaxId => tax_id_prompt(),
        HeaderStep::AwaitingClientName => OutboundMessage::text(CLIENT_NAME_PROMPT),
        HeaderStep::AwaitingConditions => OutboundMessage::text(CONDITIONS_PROMPT),
        HeaderStep::AwaitingCurrency => currency_menu(currencies),
        HeaderStep::AwaitingPaymentMethod => payment_method_menu(methods),
        HeaderStep::Completed | HeaderStep::Abandoned => OutboundMessage::text(NO_ACTIVE_QUOTATION),
    }
}

// appointments

pub fn appointment_prompt(step: AppointmentStep) -> OutboundMessage {
    OutboundMessage::text(match step {
        AppointmentStep::OwnerName => "Por favor, ingresa tu nombre:",
        AppointmentStep::PetName => "Gracias, ¿Cuál es el nombre de tu Mascota?",
        AppointmentStep::PetType => "¿Qué tipo de mascota es? (perro, gato, etc.)",
        AppointmentStep::Reason => "¿Cuál es el motivo de la consulta?",
    })
}

pub fn appointment_summary(record: &AppointmentRecord) -> OutboundMessage {
    OutboundMessage::text(format!(
        "Gracias por agendar tu cita.\nResumen:\n- Nombre: {}\n- Mascota: {}\n- Tipo: {}\n- Motivo: {}",
        record.owner_name, record.pet_name, record.pet_type, record.reason
    ))
}

pub const APPOINTMENT_BLOCKED: &str =
    "⚠️ Tienes una cotización en curso. Finalízala o cancélala antes de agendar una cita.";

// client registration command

pub fn registration_instructions() -> OutboundMessage {
    OutboundMessage::text(
        "📋 Para registrar un cliente, indícame al menos el *RUC*.\nEjemplo:\nRegistrar cliente\nRUC: 20123456789\nContacto: Ana Vega\nEmail: ana@empresa.com\nTeléfono: +51999...\nDirección: (opcional)",
    )
}

pub fn client_already_registered(client: &ClientRecord, agent: Option<&AgentContact>) -> OutboundMessage {
    let mut body = format!(
        "⚠️ Este cliente ya está registrado como *{}* (RUC {}).",
        client.name, client.ruc
    );
    if let Some(agent) = agent {
        body.push_str(&format!(
            "\nPertenece al asesor *{} {}* 📞 {}",
            agent.first_name.as_deref().unwrap_or("-"),
            agent.last_name.as_deref().unwrap_or_default(),
            agent.phone.as_deref().unwrap_or("-"),
        ));
    }
    OutboundMessage::text(body)
}

pub fn client_registered(client: &ClientRecord) -> OutboundMessage {
    OutboundMessage::text(format!(
        "✅ Cliente registrado correctamente:\n\n*{}*\nRUC: {}\n📍 {}",
        client.name,
        client.ruc,
        client.address.as_deref().unwrap_or("Sin dirección SUNAT"),
    ))
}

pub fn registration_rejected(upstream: &str) -> OutboundMessage {
    OutboundMessage::text(format!("⚠️ {upstream}"))
}

pub const REGISTRATION_ERROR: &str = "❌ Ocurrió un error al registrar el cliente.";

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use cotiza_core::domain::product::{Product, ProductId, StockLevel, WarehouseStock};
    use cotiza_core::domain::quotation::LineItem;
    use cotiza_whatsapp::OutboundMessage;

    use super::{line_editor, product_card, similar_card, technical_highlights};

    fn compressor() -> Product {
        Product {
            id: ProductId(8),
            sku: "1001.2000-1".to_owned(),
            description: "Compresor 20HP".to_owned(),
            data_technical: Some("Potencia del motor: 20 HP\nVolumen del tanque: 300 lts\n75 CFM".to_owned()),
            sale: Some(Decimal::new(1_500_5, 1)),
            cfm: None,
        }
    }

    #[test]
    fn technical_sheet_highlights_are_extracted() {
        let (motor, tank) = technical_highlights(&compressor());
        assert_eq!(motor.as_deref(), Some("Potencia del motor: 20 HP"));
        assert_eq!(tank.as_deref(), Some("Volumen del tanque: 300 lts"));
    }

    #[test]
    fn product_card_lists_warehouses_or_no_stock() {
        let stock = StockLevel {
            total_stock: 3,
            warehouses: vec![WarehouseStock { warehouse_name: "Lima".to_owned(), stock: 3 }],
        };
        let card = product_card(&compressor(), Some(&stock));
        assert!(card.body().contains("💲 Precio: *USD 1500.50*"));
        assert!(card.body().contains("🏢 Lima: 3"));

        let empty = product_card(&compressor(), Some(&StockLevel::default()));
        assert!(empty.body().contains("no tiene stock disponible"));
    }

    #[test]
    fn similar_card_offers_next_only_when_more_remain() {
        let with_next = similar_card(&compressor(), None, true);
        assert_eq!(with_next.button_ids(), vec!["cotizar_8", "ver_siguiente"]);
        assert!(with_next.body().contains("🌬️ CFM: *75*"));

        let last = similar_card(&compressor(), None, false);
        assert_eq!(last.button_ids(), vec!["cotizar_8", "cancelar_similares"]);
    }

    #[test]
    fn line_editor_hides_navigation_at_the_ends() {
        let lines = vec![LineItem::from_product(&compressor()), LineItem::from_product(&compressor())];

        let first = line_editor(&lines, 0);
        assert_eq!(first.len(), 3);
        assert!(first[0].body().starts_with("🧾 *Producto 1 de 2*"));
        assert_eq!(first[1].button_ids(), vec!["editar_precio_0", "editar_cantidad_0", "editar_descuento_0"]);
        assert_eq!(first[2].button_ids(), vec!["siguiente_producto", "eliminar_producto_0"]);

        let last = line_editor(&lines, 1);
        assert_eq!(last[2].button_ids(), vec!["anterior_producto", "eliminar_producto_1"]);

        assert!(matches!(line_editor(&lines, 5).as_slice(), [OutboundMessage::Text { .. }]));
    }
}
