//! # REST Client
//!
//! The `/caja` endpoints behind a trait, so the store can run against the
//! real backend or an in-memory fake.
//!
//! ```text
//!   ShiftStore ──► Arc<dyn CajaApi>
//!                      │
//!                      ├── HttpCajaApi (reqwest, this file)
//!                      │     • base URL + endpoint path
//!                      │     • Authorization: Bearer <token>   (optional)
//!                      │     • X-Request-Id: <RequestToken.id>
//!                      │     • per-request timeout → ClientError::Timeout
//!                      │
//!                      └── test fakes
//! ```
//!
//! Retries are NOT built in: the operator re-triggers.

use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use caja_core::control::{CloseShiftRequest, OpenShiftRequest};
use caja_core::{HistoryFilter, HistoryQuery, Page, ShiftMovement, ShiftStatusSnapshot};

use crate::config::ApiSettings;
use crate::error::{ClientError, ClientResult};
use crate::protocol::{
    date_range_params, AbrirCajaRequest, CerrarCajaRequest, Envelope, ErrorBody, EstadoCajaWire,
    HistorialWire, MovementReceipt, ReconciliationSummary, WIRE_DATE_FORMAT,
};

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

// =============================================================================
// Endpoint Paths
// =============================================================================

pub const PATH_OPEN: &str = "/caja/abrir";
pub const PATH_CLOSE: &str = "/caja/cerrar";
pub const PATH_STATUS: &str = "/caja/estado";
pub const PATH_HISTORY: &str = "/caja/historial";
pub const PATH_RECONCILIATION: &str = "/caja/arqueo";
pub const PATH_EXPORT: &str = "/caja/arqueo-exportar";

// =============================================================================
// Trait
// =============================================================================

/// Calls the store makes against the backend.
///
/// Every method receives the id to send as `X-Request-Id`.
#[async_trait]
pub trait CajaApi: Send + Sync {
    /// `GET /caja/estado`
    async fn fetch_status(&self, request_id: Uuid) -> ClientResult<ShiftStatusSnapshot>;

    /// `POST /caja/abrir`
    async fn open_shift(
        &self,
        request_id: Uuid,
        request: &OpenShiftRequest,
    ) -> ClientResult<MovementReceipt>;

    /// `POST /caja/cerrar`
    async fn close_shift(
        &self,
        request_id: Uuid,
        request: &CloseShiftRequest,
    ) -> ClientResult<MovementReceipt>;

    /// `GET /caja/historial`
    async fn fetch_history(
        &self,
        request_id: Uuid,
        query: &HistoryQuery,
    ) -> ClientResult<Page<ShiftMovement>>;

    /// `GET /caja/arqueo`
    async fn fetch_reconciliation(
        &self,
        request_id: Uuid,
        filter: &HistoryFilter,
    ) -> ClientResult<ReconciliationSummary>;

    /// `GET /caja/arqueo-exportar`, raw spreadsheet bytes.
    async fn export_reconciliation(
        &self,
        request_id: Uuid,
        filter: &HistoryFilter,
    ) -> ClientResult<Vec<u8>>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

#[derive(Debug, Clone)]
pub struct HttpCajaApi {
    client: Client,
    base_url: String,
    timeout_secs: u64,
    naive_offset: FixedOffset,
}

impl HttpCajaApi {
    /// Builds the client from validated settings.
    pub fn new(settings: &ApiSettings) -> ClientResult<Self> {
        let parsed = url::Url::parse(&settings.base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(settings.base_url.clone()));
        }

        let naive_offset = settings.naive_offset()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = settings.token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ClientError::InvalidConfig("token has invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(settings.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpCajaApi {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.request_timeout_secs,
            naive_offset,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and maps transport failures and error statuses.
    async fn send(
        &self,
        request: RequestBuilder,
        request_id: Uuid,
        operation: &'static str,
    ) -> ClientResult<Response> {
        debug!(%request_id, operation, "Sending request");

        let response = request
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await
            .map_err(|e| {
                warn!(%request_id, operation, error = %e, "Request failed");
                ClientError::from_reqwest(e, self.timeout_secs)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%request_id, operation, status = status.as_u16(), "Error status from server");
        Err(status_error(status, &body))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> ClientResult<Envelope<T>> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_secs))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turns an error status into a client error, preferring the envelope message.
fn status_error(status: StatusCode, body: &str) -> ClientError {
    let envelope_message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    let message = envelope_message.unwrap_or_else(|| match status.as_u16() {
        401 => "Sesión expirada o token inválido".to_string(),
        403 => "No autorizado para operar la caja".to_string(),
        404 => "Recurso no encontrado".to_string(),
        s if s >= 500 => format!("Error del servidor (HTTP {s})"),
        s => format!("Respuesta inesperada del servidor (HTTP {s})"),
    });

    ClientError::Http {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CajaApi for HttpCajaApi {
    async fn fetch_status(&self, request_id: Uuid) -> ClientResult<ShiftStatusSnapshot> {
        let response = self
            .send(self.client.get(self.url(PATH_STATUS)), request_id, "fetch_status")
            .await?;
        let wire = self.decode::<EstadoCajaWire>(response).await?.into_data()?;
        wire.into_snapshot(self.naive_offset)
    }

    async fn open_shift(
        &self,
        request_id: Uuid,
        request: &OpenShiftRequest,
    ) -> ClientResult<MovementReceipt> {
        let body = AbrirCajaRequest::from(request);
        let response = self
            .send(self.client.post(self.url(PATH_OPEN)).json(&body), request_id, "open_shift")
            .await?;
        Ok(self
            .decode::<MovementReceipt>(response)
            .await?
            .into_ack()?
            .unwrap_or_default())
    }

    async fn close_shift(
        &self,
        request_id: Uuid,
        request: &CloseShiftRequest,
    ) -> ClientResult<MovementReceipt> {
        let body = CerrarCajaRequest::from(request);
        let response = self
            .send(self.client.post(self.url(PATH_CLOSE)).json(&body), request_id, "close_shift")
            .await?;
        Ok(self
            .decode::<MovementReceipt>(response)
            .await?
            .into_ack()?
            .unwrap_or_default())
    }

    async fn fetch_history(
        &self,
        request_id: Uuid,
        query: &HistoryQuery,
    ) -> ClientResult<Page<ShiftMovement>> {
        let request = self.client.get(self.url(PATH_HISTORY)).query(&[
            ("page", query.page.to_string()),
            ("limit", query.page_size.to_string()),
            (
                "fechaInicio",
                query.filter.date_from.format(WIRE_DATE_FORMAT).to_string(),
            ),
            (
                "fechaFin",
                query.filter.date_to.format(WIRE_DATE_FORMAT).to_string(),
            ),
        ]);
        let response = self.send(request, request_id, "fetch_history").await?;
        let wire = self.decode::<HistorialWire>(response).await?.into_data()?;
        wire.into_page(query.page, query.page_size, self.naive_offset)
    }

    async fn fetch_reconciliation(
        &self,
        request_id: Uuid,
        filter: &HistoryFilter,
    ) -> ClientResult<ReconciliationSummary> {
        let request = self
            .client
            .get(self.url(PATH_RECONCILIATION))
            .query(&date_range_params(filter.date_from, filter.date_to));
        let response = self.send(request, request_id, "fetch_reconciliation").await?;
        self.decode::<ReconciliationSummary>(response)
            .await?
            .into_data()
    }

    async fn export_reconciliation(
        &self,
        request_id: Uuid,
        filter: &HistoryFilter,
    ) -> ClientResult<Vec<u8>> {
        let request = self
            .client
            .get(self.url(PATH_EXPORT))
            .query(&date_range_params(filter.date_from, filter.date_to));
        let response = self.send(request, request_id, "export_reconciliation").await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_secs))?;

        // A JSON body here is an envelope explaining why there is no file.
        if is_json {
            let envelope: Envelope<serde_json::Value> = serde_json::from_slice(&bytes)?;
            envelope.into_ack()?;
            return Err(ClientError::Decode("expected a spreadsheet, got JSON".into()));
        }

        Ok(bytes.to_vec())
    }
}
