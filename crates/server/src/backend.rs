//! REST adapter for the quotation backend.
//!
//! Every port from `cotiza_core::backend` is served by one [`HttpBackend`]
//! sharing a pooled `reqwest` client. Non-2xx answers keep their JSON body so
//! the dialogue can classify ownership and registration failures.

use std::time::Duration;

use async_trait::async_trait;
use cotiza_core::backend::{
    BackendError, CatalogGateway, ClientGateway, QuotationGateway, ReferenceDataGateway,
    UserDirectory,
};
use cotiza_core::config::BackendConfig;
use cotiza_core::domain::client::{
    normalize_ruc, ClientLookup, ClientRecord, NewClient, OwnershipCheck,
};
use cotiza_core::domain::product::{Product, ProductId, StockLevel};
use cotiza_core::domain::quotation::{
    Currency, PaymentMethod, QuotationHeader, QuotationId, QuotationLineRecord,
};
use cotiza_core::domain::user::User;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

/// Collections arrive either bare or wrapped in a `data` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

#[derive(Deserialize)]
struct CreatedQuotation {
    #[serde(default)]
    id: Option<QuotationId>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        debug!(event_name = "integration.backend.request", method = "GET", path, "backend call");
        let response = self.client.get(self.url(path)).send().await.map_err(transport)?;
        decode(response).await
    }

    /// Like [`Self::get`] but a 404 means "no such record".
    async fn find<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, BackendError> {
        debug!(event_name = "integration.backend.request", method = "GET", path, "backend call");
        let response = self.client.get(self.url(path)).send().await.map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(event_name = "integration.backend.request", method = "POST", path, "backend call");
        let response =
            self.client.post(self.url(path)).json(body).send().await.map_err(transport)?;
        decode(response).await
    }
}

fn transport(error: reqwest::Error) -> BackendError {
    BackendError::Transport(error.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(transport)?;

    if !status.is_success() {
        let body = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);
        return Err(BackendError::Status { status: status.as_u16(), body });
    }

    // Some endpoints answer 200 with an empty body.
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) { &b"null"[..] } else { &bytes[..] };
    serde_json::from_slice(bytes).map_err(|error| BackendError::Decode(error.to_string()))
}

#[async_trait]
impl UserDirectory for HttpBackend {
    async fn find_by_number(&self, number: &str) -> Result<Option<User>, BackendError> {
        let found: Option<Option<User>> = self.find(&format!("users/number/{number}")).await?;
        Ok(found.flatten())
    }
}

#[async_trait]
impl CatalogGateway for HttpBackend {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        self.get::<Listing<Product>>("products").await.map(Listing::into_vec)
    }

    async fn stock(&self, product_id: ProductId) -> Result<StockLevel, BackendError> {
        self.get(&format!("products/{product_id}/stock")).await
    }
}

#[async_trait]
impl ClientGateway for HttpBackend {
    async fn verify_ownership(
        &self,
        ruc: &str,
        number: &str,
    ) -> Result<OwnershipCheck, BackendError> {
        let body = json!({ "ruc": ruc.trim(), "number": number.trim() });
        self.post("clients/verificar-ownership", &body).await
    }

    async fn register(&self, client: &NewClient) -> Result<ClientRecord, BackendError> {
        self.post("clients", client).await
    }

    async fn find_by_ruc(&self, ruc: &str) -> Result<Option<ClientLookup>, BackendError> {
        let found: Option<Option<ClientLookup>> =
            self.find(&format!("clients/by-ruc/{}", normalize_ruc(ruc))).await?;
        Ok(found.flatten())
    }
}

#[async_trait]
impl ReferenceDataGateway for HttpBackend {
    async fn currencies(&self) -> Result<Vec<Currency>, BackendError> {
        self.get::<Listing<Currency>>("currencies").await.map(Listing::into_vec)
    }

    async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, BackendError> {
        self.get::<Listing<PaymentMethod>>("payment-methods").await.map(Listing::into_vec)
    }
}

#[async_trait]
impl QuotationGateway for HttpBackend {
    async fn create_header(
        &self,
        header: &QuotationHeader,
    ) -> Result<Option<QuotationId>, BackendError> {
        let created: Option<CreatedQuotation> = self.post("quotations", header).await?;
        Ok(created.and_then(|created| created.id))
    }

    async fn add_line(&self, line: &QuotationLineRecord) -> Result<(), BackendError> {
        let _: Value = self.post("quotations/products", line).await?;
        Ok(())
    }

    fn document_url(&self, quotation_id: QuotationId) -> String {
        self.url(&format!("pdf/quotation/{quotation_id}"))
    }
}

#[cfg(test)]
mod tests {
    use cotiza_core::backend::{
        BackendError, CatalogGateway, ClientGateway, QuotationGateway, ReferenceDataGateway,
        UserDirectory,
    };
    use cotiza_core::config::BackendConfig;
    use cotiza_core::domain::client::{ClientId, NewClient};
    use cotiza_core::domain::product::ProductId;
    use cotiza_core::domain::quotation::{
        CurrencyId, PaymentMethodId, QuotationHeader, QuotationId, QuotationLineRecord,
    };
    use cotiza_core::domain::user::UserId;
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::HttpBackend;

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&BackendConfig { base_url: format!("{}/api/", server.uri()), timeout_secs: 5 })
            .expect("client builds")
    }

    #[tokio::test]
    async fn unknown_number_is_none_and_known_number_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/number/51999888777"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": "3", "name": "Ana", "lastname": "Ríos", "number": "51999888777"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/users/number/51000000000"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let user = backend.find_by_number("51999888777").await.expect("lookup succeeds");
        assert_eq!(user.map(|user| user.id), Some(UserId(3)));
        assert_eq!(backend.find_by_number("51000000000").await, Ok(None));
    }

    #[tokio::test]
    async fn listings_accept_bare_and_wrapped_arrays() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "sku": "100.0001-1", "descripcion": "Compresor 20HP", "sale": "1500.00"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/currencies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"data": [{"id": 1, "name": "Soles", "code": "PEN"}]}),
            ))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let products = backend.list_products().await.expect("catalog decodes");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].sale, Some(Decimal::new(150_000, 2)));

        let currencies = backend.currencies().await.expect("currencies decode");
        assert_eq!(currencies[0].code, "PEN");
    }

    #[tokio::test]
    async fn stock_reads_warehouse_breakdown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/7/stock"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_stock": 4,
                "almacenes": [{"warehouse_name": "Lima", "stock": 3}, {"warehouse_name": "Arequipa", "stock": "1"}]
            })))
            .mount(&server)
            .await;

        let stock = backend(&server).stock(ProductId(7)).await.expect("stock decodes");
        assert_eq!(stock.total_stock, 4);
        assert_eq!(stock.warehouses.len(), 2);
        assert_eq!(stock.warehouses[1].stock, 1);
    }

    #[tokio::test]
    async fn rejected_ownership_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/clients/verificar-ownership"))
            .and(body_json(json!({"ruc": "20523408292", "number": "51999888777"})))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"messages": {"ruc": ["El RUC no es válido"]}})),
            )
            .mount(&server)
            .await;

        let error = backend(&server)
            .verify_ownership(" 20523408292 ", "51999888777")
            .await
            .expect_err("422 is an error");
        assert_eq!(error.status(), Some(422));
        assert_eq!(error.upstream_message(), "El RUC no es válido");
    }

    #[tokio::test]
    async fn undecodable_error_body_becomes_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/payment-methods"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let error = backend(&server).payment_methods().await.expect_err("502 is an error");
        assert_eq!(error, BackendError::Status { status: 502, body: serde_json::Value::Null });
    }

    #[tokio::test]
    async fn registration_posts_only_present_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/clients"))
            .and(body_json(json!({"ruc": "20523408292", "assigned_user_id": 3})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 41, "ruc": "20523408292", "name": "ACME SAC", "address": "Av. Lima 123"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/clients/by-ruc/20523408292"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let record = backend
            .register(&NewClient::new("20523408292", UserId(3)))
            .await
            .expect("registration succeeds");
        assert_eq!(record.id, ClientId(41));
        assert_eq!(record.name, "ACME SAC");
        assert_eq!(backend.find_by_ruc("20-523408292").await, Ok(None));
    }

    #[tokio::test]
    async fn header_id_is_optional_and_lines_ignore_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/quotations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "88"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/quotations/products"))
            .and(body_json(json!({
                "quotation_id": 88, "product_id": 7, "final_price": 1500.5, "quantity": 2, "discount": 0.0
            })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let backend = backend(&server);
        let header = QuotationHeader {
            client_id: ClientId(41),
            user_id: UserId(3),
            conditions: "Entrega inmediata".to_string(),
            validation: "15 días".to_string(),
            currency_id: CurrencyId(1),
            payment_method_id: PaymentMethodId(2),
        };
        let id = backend.create_header(&header).await.expect("header accepted");
        assert_eq!(id, Some(QuotationId(88)));

        let line = QuotationLineRecord {
            quotation_id: QuotationId(88),
            product_id: ProductId(7),
            final_price: Decimal::new(15005, 1),
            quantity: 2,
            discount: Decimal::ZERO,
        };
        backend.add_line(&line).await.expect("line accepted");

        assert_eq!(
            backend.document_url(QuotationId(88)),
            format!("{}/api/pdf/quotation/88", server.uri())
        );
    }
}
