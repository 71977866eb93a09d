#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use cotiza_agent::{
    AppointmentBook, Collaborators, DialogueEngine, InMemoryAppointmentBook,
    KeywordIntentClassifier, KeywordProductMatcher, Route, Transcriber, TranscriptionError,
};
use cotiza_core::audit::InMemoryAuditSink;
use cotiza_core::backend::{
    BackendError, CatalogGateway, ClientGateway, QuotationGateway, ReferenceDataGateway,
    UserDirectory,
};
use cotiza_core::domain::client::{ClientId, ClientLookup, ClientRecord, NewClient, OwnershipCheck};
use cotiza_core::domain::product::{Product, ProductId, StockLevel, WarehouseStock};
use cotiza_core::domain::quotation::{
    Currency, CurrencyId, PaymentMethod, PaymentMethodId, QuotationHeader, QuotationId,
    QuotationLineRecord,
};
use cotiza_core::domain::user::{User, UserId};
use cotiza_core::session::{QuotationSession, SessionKey, SessionState, SessionStore};
use cotiza_whatsapp::{InboundMessage, MessageKind, RecordingMessenger};

pub const AGENT_NUMBER: &str = "51987654321";
pub const AGENT_ID: UserId = UserId(42);

pub fn product(id: i64, sku: &str, description: &str, technical: &str, price: i64) -> Product {
    Product {
        id: ProductId(id),
        sku: sku.to_owned(),
        description: description.to_owned(),
        data_technical: Some(technical.to_owned()),
        sale: Some(Decimal::new(price, 0)),
        cfm: None,
    }
}

pub fn catalog() -> Vec<Product> {
    vec![
        product(1, "1001.2000-1", "Compresor de pistón 20 HP", "Potencia del motor: 20 HP", 2500),
        product(2, "2002.0100-4", "Tanque vertical 100 litros", "Volumen del tanque: 100 lts", 400),
        product(3, "1001.2500-1", "Compresor de tornillo 25 HP", "Potencia del motor: 25 HP", 7800),
        product(4, "1001.1500-2", "Compresor de pistón 15 HP", "Potencia del motor: 15 HP", 1900),
        product(5, "3003.0001-1", "Secador refrigerativo", "Caudal 75 CFM", 1200),
    ]
}

pub fn client(id: i64, name: &str, ruc: &str) -> ClientRecord {
    ClientRecord { id: ClientId(id), name: name.to_owned(), ruc: ruc.to_owned(), address: None }
}

pub fn status(code: u16, body: Value) -> BackendError {
    BackendError::Status { status: code, body }
}

#[derive(Default)]
struct Script {
    users: HashMap<String, User>,
    catalog: Vec<Product>,
    catalog_down: bool,
    stock: HashMap<ProductId, StockLevel>,
    ownership: HashMap<String, Result<OwnershipCheck, BackendError>>,
    register_result: Option<Result<ClientRecord, BackendError>>,
    registrations: Vec<NewClient>,
    by_ruc: HashMap<String, ClientLookup>,
    currencies: Vec<Currency>,
    payment_methods: Vec<PaymentMethod>,
    header_result: Option<Result<Option<QuotationId>, BackendError>>,
    failing_lines: HashSet<ProductId>,
    headers: Vec<QuotationHeader>,
    lines: Vec<QuotationLineRecord>,
    catalog_calls: usize,
}

/// Every backend port answered from an in-memory script.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    /// One authorised agent, the sample catalog with stock, two currencies
    /// and two payment methods.
    pub fn standard() -> Self {
        let backend = Self::default();
        backend.with(|script| {
            script.users.insert(
                AGENT_NUMBER.to_owned(),
                User {
                    id: AGENT_ID,
                    name: Some("Rosa".to_owned()),
                    lastname: Some("Quispe".to_owned()),
                    number: Some(AGENT_NUMBER.to_owned()),
                },
            );
            script.catalog = catalog();
            for product in &script.catalog {
                script.stock.insert(
                    product.id,
                    StockLevel {
                        total_stock: 4,
                        warehouses: vec![WarehouseStock {
                            warehouse_name: "Lima".to_owned(),
                            stock: 4,
                        }],
                    },
                );
            }
            script.currencies = vec![
                Currency { id: CurrencyId(1), name: "Soles".to_owned(), code: "PEN".to_owned() },
                Currency { id: CurrencyId(2), name: "Dólares".to_owned(), code: "USD".to_owned() },
            ];
            script.payment_methods = vec![
                PaymentMethod { id: PaymentMethodId(10), name: "Contado".to_owned() },
                PaymentMethod { id: PaymentMethodId(11), name: "Crédito 30 días".to_owned() },
            ];
            script.header_result = Some(Ok(Some(QuotationId(900))));
        });
        backend
    }

    fn with<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        match self.script.lock() {
            Ok(mut script) => f(&mut script),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    pub fn set_catalog_down(&self, down: bool) {
        self.with(|script| script.catalog_down = down);
    }

    pub fn remove_stock(&self, product_id: ProductId) {
        self.with(|script| script.stock.remove(&product_id));
    }

    pub fn set_ownership(&self, ruc: &str, result: Result<OwnershipCheck, BackendError>) {
        self.with(|script| script.ownership.insert(ruc.to_owned(), result));
    }

    pub fn set_register_result(&self, result: Result<ClientRecord, BackendError>) {
        self.with(|script| script.register_result = Some(result));
    }

    pub fn set_existing_client(&self, ruc: &str, lookup: ClientLookup) {
        self.with(|script| script.by_ruc.insert(ruc.to_owned(), lookup));
    }

    pub fn set_currencies(&self, currencies: Vec<Currency>) {
        self.with(|script| script.currencies = currencies);
    }

    pub fn set_header_result(&self, result: Result<Option<QuotationId>, BackendError>) {
        self.with(|script| script.header_result = Some(result));
    }

    pub fn fail_line(&self, product_id: ProductId) {
        self.with(|script| script.failing_lines.insert(product_id));
    }

    pub fn registrations(&self) -> Vec<NewClient> {
        self.with(|script| script.registrations.clone())
    }

    pub fn headers(&self) -> Vec<QuotationHeader> {
        self.with(|script| script.headers.clone())
    }

    pub fn submitted_lines(&self) -> Vec<QuotationLineRecord> {
        self.with(|script| script.lines.clone())
    }

    pub fn catalog_calls(&self) -> usize {
        self.with(|script| script.catalog_calls)
    }
}

#[async_trait]
impl UserDirectory for ScriptedBackend {
    async fn find_by_number(&self, number: &str) -> Result<Option<User>, BackendError> {
        Ok(self.with(|script| script.users.get(number).cloned()))
    }
}

#[async_trait]
impl CatalogGateway for ScriptedBackend {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        self.with(|script| {
            script.catalog_calls += 1;
            if script.catalog_down {
                Err(BackendError::Transport("catalog offline".to_owned()))
            } else {
                Ok(script.catalog.clone())
            }
        })
    }

    async fn stock(&self, product_id: ProductId) -> Result<StockLevel, BackendError> {
        self.with(|script| script.stock.get(&product_id).cloned())
            .ok_or_else(|| status(404, Value::Null))
    }
}

#[async_trait]
impl ClientGateway for ScriptedBackend {
    async fn verify_ownership(&self, ruc: &str, _number: &str) -> Result<OwnershipCheck, BackendError> {
        self.with(|script| script.ownership.get(ruc).cloned())
            .unwrap_or_else(|| Err(status(500, Value::Null)))
    }

    async fn register(&self, client: &NewClient) -> Result<ClientRecord, BackendError> {
        self.with(|script| {
            script.registrations.push(client.clone());
            script.register_result.clone().unwrap_or_else(|| {
                Ok(ClientRecord {
                    id: ClientId(77),
                    name: client.name.clone().unwrap_or_else(|| "CLIENTE SUNAT SAC".to_owned()),
                    ruc: client.ruc.clone(),
                    address: Some("Av. Argentina 123".to_owned()),
                })
            })
        })
    }

    async fn find_by_ruc(&self, ruc: &str) -> Result<Option<ClientLookup>, BackendError> {
        Ok(self.with(|script| script.by_ruc.get(ruc).cloned()))
    }
}

#[async_trait]
impl ReferenceDataGateway for ScriptedBackend {
    async fn currencies(&self) -> Result<Vec<Currency>, BackendError> {
        Ok(self.with(|script| script.currencies.clone()))
    }

    async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, BackendError> {
        Ok(self.with(|script| script.payment_methods.clone()))
    }
}

#[async_trait]
impl QuotationGateway for ScriptedBackend {
    async fn create_header(&self, header: &QuotationHeader) -> Result<Option<QuotationId>, BackendError> {
        self.with(|script| {
            script.headers.push(header.clone());
            script.header_result.clone().unwrap_or(Ok(None))
        })
    }

    async fn add_line(&self, line: &QuotationLineRecord) -> Result<(), BackendError> {
        self.with(|script| {
            script.lines.push(line.clone());
            if script.failing_lines.contains(&line.product_id) {
                Err(status(500, serde_json::json!({"message": "fallo"})))
            } else {
                Ok(())
            }
        })
    }

    fn document_url(&self, quotation_id: QuotationId) -> String {
        format!("https://backend.test/pdf/quotation/{quotation_id}")
    }
}

/// Transcriber that returns a fixed transcript.
pub struct FixedTranscriber(pub Result<String, TranscriptionError>);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>) -> Result<String, TranscriptionError> {
        self.0.clone()
    }
}

pub struct Harness {
    pub engine: DialogueEngine,
    pub backend: Arc<ScriptedBackend>,
    pub messenger: Arc<RecordingMessenger>,
    pub audit: Arc<InMemoryAuditSink>,
    pub appointments: Arc<InMemoryAppointmentBook>,
    next_id: AtomicUsize,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(ScriptedBackend::standard(), RecordingMessenger::new(), FixedTranscriber(Ok(String::new())))
    }

    pub fn with_transcriber(transcriber: FixedTranscriber) -> Self {
        let messenger = RecordingMessenger::new().with_media("media-1", vec![0x4f, 0x67, 0x67]);
        Self::build(ScriptedBackend::standard(), messenger, transcriber)
    }

    fn build(backend: ScriptedBackend, messenger: RecordingMessenger, transcriber: FixedTranscriber) -> Self {
        let backend = Arc::new(backend);
        let messenger = Arc::new(messenger);
        let audit = Arc::new(InMemoryAuditSink::default());
        let appointments = Arc::new(InMemoryAppointmentBook::default());
        let appointment_book: Arc<dyn AppointmentBook> = appointments.clone();

        let ports = Collaborators {
            messenger: messenger.clone(),
            users: backend.clone(),
            catalog: backend.clone(),
            clients: backend.clone(),
            reference: backend.clone(),
            quotations: backend.clone(),
            classifier: Arc::new(KeywordIntentClassifier),
            matcher: Arc::new(KeywordProductMatcher),
            transcriber: Arc::new(transcriber),
            appointments: appointment_book,
            audit: audit.clone(),
        };
        let engine = DialogueEngine::new(ports, Arc::new(SessionStore::new()));

        Self { engine, backend, messenger, audit, appointments, next_id: AtomicUsize::new(1) }
    }

    fn message(&self, from: &str, kind: MessageKind) -> InboundMessage {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        InboundMessage {
            message_id: format!("wamid.{id}"),
            from: from.to_owned(),
            profile_name: Some("Rosa".to_owned()),
            kind,
        }
    }

    pub async fn text(&self, body: &str) -> Route {
        self.engine.handle(&self.message(AGENT_NUMBER, MessageKind::Text(body.to_owned()))).await
    }

    pub async fn text_from(&self, from: &str, body: &str) -> Route {
        self.engine.handle(&self.message(from, MessageKind::Text(body.to_owned()))).await
    }

    pub async fn press(&self, option_id: &str) -> Route {
        let kind = MessageKind::Interactive { option_id: option_id.to_owned() };
        self.engine.handle(&self.message(AGENT_NUMBER, kind)).await
    }

    pub async fn voice(&self, media_id: &str) -> Route {
        let kind = MessageKind::Audio { media_id: media_id.to_owned() };
        self.engine.handle(&self.message(AGENT_NUMBER, kind)).await
    }

    pub async fn state(&self) -> Option<SessionState> {
        self.engine.sessions().snapshot(&SessionKey::from_address(AGENT_NUMBER)).await
    }

    pub async fn quotation(&self) -> Option<QuotationSession> {
        self.state().await.and_then(|state| state.quotation().cloned())
    }

    /// Quotes products by id through the `cotizar_{id}` button.
    pub async fn quote(&self, product_ids: &[i64]) {
        for id in product_ids {
            self.press(&format!("cotizar_{id}")).await;
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.messenger.bodies()
    }

    pub fn last_body(&self) -> String {
        self.messenger.last().map(|message| message.body().to_owned()).unwrap_or_default()
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.bodies().iter().any(|body| body.contains(needle))
    }

    pub fn clear_outbox(&self) {
        self.messenger.clear();
    }
}
