//! # Wire Protocol
//!
//! JSON shapes of the `/caja` REST endpoints and their conversion into
//! domain types.
//!
//! ## Envelope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  { "code": 1, "message": "Caja abierta", "data": { ... } }             │
//! │                                                                         │
//! │  code == 1           → success, data (if any) is the payload           │
//! │  code != 1           → Server { code, message } (message verbatim)      │
//! │  code missing (GET)  → success when data is present                    │
//! │  code missing (POST) → Decode error                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names stay in the backend's Spanish camelCase; amounts go through
//! [`caja_core::money::decimal`] so both `150.5` and `"150.50"` decode to
//! exact cents. Timestamps without an offset are wall-clock times of the
//! backend and are read in the configured `utc_offset`.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use caja_core::control::{CloseShiftRequest, OpenShiftRequest};
use caja_core::money::{self, Money};
use caja_core::{
    DailySalesSummary, MovementType, OperatorRef, Page, Pagination, PaymentBreakdown,
    ShiftMovement, ShiftStatus, ShiftStatusSnapshot,
};

use crate::error::{ClientError, ClientResult};

/// Value of `code` that signals success.
pub const SUCCESS_CODE: i64 = 1;

/// Date format of the `fechaInicio` / `fechaFin` query parameters.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Envelope
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    /// Plain `Option` so payloads need not implement `Default`.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps a GET response: the payload is mandatory, `code` optional.
    pub fn into_data(self) -> ClientResult<T> {
        match self.code {
            Some(SUCCESS_CODE) | None => self
                .data
                .ok_or_else(|| ClientError::Decode(missing(self.message.as_deref(), "data"))),
            Some(code) => Err(rejected(code, self.message)),
        }
    }

    /// Unwraps a POST response: `code` must be present and equal to 1; the
    /// payload is optional.
    pub fn into_ack(self) -> ClientResult<Option<T>> {
        match self.code {
            Some(SUCCESS_CODE) => Ok(self.data),
            Some(code) => Err(rejected(code, self.message)),
            None => Err(ClientError::Decode(missing(self.message.as_deref(), "code"))),
        }
    }
}

fn rejected(code: i64, message: Option<String>) -> ClientError {
    ClientError::Server {
        code,
        message: message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Operación rechazada por el servidor".to_string()),
    }
}

fn missing(message: Option<&str>, field: &str) -> String {
    match message {
        Some(m) => format!("response has no '{}' ({})", field, m),
        None => format!("response has no '{}'", field),
    }
}

/// Body of an error status, when the backend sends one.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

// =============================================================================
// Requests
// =============================================================================

/// `POST /caja/abrir`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbrirCajaRequest {
    #[serde(with = "money::decimal")]
    pub monto_inicial: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

impl From<&OpenShiftRequest> for AbrirCajaRequest {
    fn from(request: &OpenShiftRequest) -> Self {
        AbrirCajaRequest {
            monto_inicial: request.opening_amount,
            observaciones: request.notes.clone(),
        }
    }
}

/// `POST /caja/cerrar`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CerrarCajaRequest {
    #[serde(with = "money::decimal")]
    pub monto_efectivo: Money,
    #[serde(with = "money::decimal")]
    pub monto_yape: Money,
    #[serde(with = "money::decimal")]
    pub monto_plin: Money,
    #[serde(with = "money::decimal")]
    pub monto_transferencia: Money,
    #[serde(with = "money::decimal")]
    pub monto_tarjeta: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

impl From<&CloseShiftRequest> for CerrarCajaRequest {
    fn from(request: &CloseShiftRequest) -> Self {
        let counted = &request.counted;
        CerrarCajaRequest {
            monto_efectivo: counted.cash,
            monto_yape: counted.yape,
            monto_plin: counted.plin,
            monto_transferencia: counted.transfer,
            monto_tarjeta: counted.card,
            observaciones: request.notes.clone(),
        }
    }
}

/// `fechaInicio` / `fechaFin` query pair.
pub fn date_range_params(from: NaiveDate, to: NaiveDate) -> [(&'static str, String); 2] {
    [
        ("fechaInicio", from.format(WIRE_DATE_FORMAT).to_string()),
        ("fechaFin", to.format(WIRE_DATE_FORMAT).to_string()),
    ]
}

// =============================================================================
// Mutation Receipt
// =============================================================================

/// `data` of a successful open/close.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementReceipt {
    #[serde(default, alias = "movimientoId", deserialize_with = "opt_id")]
    pub id: Option<String>,

    /// Server-computed variance (close only).
    #[serde(
        default,
        rename = "diferencia",
        with = "money::decimal_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub variance: Option<Money>,
}

// =============================================================================
// Status
// =============================================================================

/// `data` of `GET /caja/estado`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstadoCajaWire {
    pub estado: String,
    #[serde(default)]
    pub movimiento: Option<MovimientoWire>,
    #[serde(default, alias = "ventasDelDia", alias = "resumenVentas")]
    pub ventas_hoy: Option<VentasHoyWire>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentasHoyWire {
    #[serde(default, with = "money::decimal_opt")]
    pub total_ingresos: Option<Money>,
    #[serde(default)]
    pub medios_pago: MediosPagoWire,
    #[serde(default)]
    pub comprobantes_formales: u32,
    #[serde(default)]
    pub comprobantes_informales: u32,
    #[serde(default)]
    pub pagos: u32,
}

/// Sales per payment method, keyed by wire name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MediosPagoWire {
    #[serde(default, with = "money::decimal_opt")]
    pub efectivo: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub yape: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub plin: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub transferencia: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub tarjeta: Option<Money>,
}

impl From<MediosPagoWire> for PaymentBreakdown {
    fn from(wire: MediosPagoWire) -> Self {
        PaymentBreakdown {
            cash: wire.efectivo.unwrap_or_default(),
            yape: wire.yape.unwrap_or_default(),
            plin: wire.plin.unwrap_or_default(),
            transfer: wire.transferencia.unwrap_or_default(),
            card: wire.tarjeta.unwrap_or_default(),
        }
    }
}

impl From<VentasHoyWire> for DailySalesSummary {
    fn from(wire: VentasHoyWire) -> Self {
        let payment_breakdown = PaymentBreakdown::from(wire.medios_pago);
        DailySalesSummary {
            // Older backends omit the total; the buckets always add up to it.
            total_income: wire
                .total_ingresos
                .unwrap_or_else(|| payment_breakdown.total()),
            payment_breakdown,
            formal_vouchers: wire.comprobantes_formales,
            informal_vouchers: wire.comprobantes_informales,
            payments: wire.pagos,
        }
    }
}

impl EstadoCajaWire {
    pub fn into_snapshot(self, naive_offset: FixedOffset) -> ClientResult<ShiftStatusSnapshot> {
        let status: ShiftStatus = self
            .estado
            .parse()
            .map_err(|e: caja_core::ValidationError| ClientError::Decode(e.to_string()))?;

        Ok(ShiftStatusSnapshot {
            status,
            movement: self
                .movimiento
                .map(|m| m.into_movement(naive_offset))
                .transpose()?,
            daily_sales: self.ventas_hoy.unwrap_or_default().into(),
        })
    }
}

// =============================================================================
// Movements
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovimientoWire {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Missing on the active movement of some backends; it is always the aperture.
    #[serde(default)]
    pub tipo_movimiento: Option<String>,
    #[serde(alias = "fechaApertura", alias = "createdAt")]
    pub fecha: String,
    #[serde(default, with = "money::decimal_opt")]
    pub monto_inicial: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub monto_final: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub monto_efectivo: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub monto_yape: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub monto_plin: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub monto_transferencia: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub monto_tarjeta: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub total_ventas: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub diferencia: Option<Money>,
    #[serde(default, with = "money::decimal_opt")]
    pub monto: Option<Money>,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub usuario: Option<UsuarioWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsuarioWire {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(alias = "name", alias = "nombreCompleto")]
    pub nombre: String,
}

impl MovimientoWire {
    fn counted(&self) -> Option<PaymentBreakdown> {
        let buckets = [
            self.monto_efectivo,
            self.monto_yape,
            self.monto_plin,
            self.monto_transferencia,
            self.monto_tarjeta,
        ];
        if buckets.iter().all(Option::is_none) {
            return None;
        }
        Some(PaymentBreakdown {
            cash: self.monto_efectivo.unwrap_or_default(),
            yape: self.monto_yape.unwrap_or_default(),
            plin: self.monto_plin.unwrap_or_default(),
            transfer: self.monto_transferencia.unwrap_or_default(),
            card: self.monto_tarjeta.unwrap_or_default(),
        })
    }
}

impl MovimientoWire {
    pub fn into_movement(self, naive_offset: FixedOffset) -> ClientResult<ShiftMovement> {
        let movement_type = match self.tipo_movimiento.as_deref() {
            Some(kind) => kind
                .parse::<MovementType>()
                .map_err(|e| ClientError::Decode(e.to_string()))?,
            None => MovementType::Aperture,
        };
        let counted = self.counted();

        Ok(ShiftMovement {
            id: self.id,
            movement_type,
            timestamp: parse_timestamp(&self.fecha, naive_offset)?,
            opening_amount: self.monto_inicial,
            closing_amount: self.monto_final,
            counted,
            total_sales: self.total_ventas,
            variance: self.diferencia,
            amount: self.monto,
            notes: self.observaciones.filter(|n| !n.trim().is_empty()),
            operator: self.usuario.map(|u| OperatorRef {
                id: u.id,
                name: u.nombre,
            }),
        })
    }
}

/// Parses a backend timestamp. Values without an offset are read in
/// `naive_offset`.
pub fn parse_timestamp(text: &str, naive_offset: FixedOffset) -> ClientResult<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, WIRE_DATE_FORMAT)
                .ok()
                .map(|day| day.and_time(chrono::NaiveTime::MIN))
        })
        .ok_or_else(|| ClientError::Decode(format!("invalid timestamp '{}'", text)))?;

    // Fixed offsets have no gaps or folds.
    naive_offset
        .from_local_datetime(&naive)
        .single()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| ClientError::Decode(format!("invalid timestamp '{}'", text)))
}

// =============================================================================
// History
// =============================================================================

/// `data` of `GET /caja/historial`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistorialWire {
    #[serde(default)]
    pub movimientos: Vec<MovimientoWire>,
    #[serde(default)]
    pub pagination: Option<PaginationWire>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationWire {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl HistorialWire {
    /// Converts into a page; a missing pagination block describes exactly the
    /// items received.
    pub fn into_page(
        self,
        requested_page: u32,
        requested_limit: u32,
        naive_offset: FixedOffset,
    ) -> ClientResult<Page<ShiftMovement>> {
        let items = self
            .movimientos
            .into_iter()
            .map(|m| m.into_movement(naive_offset))
            .collect::<ClientResult<Vec<_>>>()?;

        let pagination = match self.pagination {
            Some(p) => {
                let limit = if p.limit == 0 { requested_limit } else { p.limit };
                Pagination {
                    page: if p.page == 0 { requested_page } else { p.page },
                    limit,
                    total: p.total,
                    total_pages: p
                        .total_pages
                        .unwrap_or_else(|| total_pages(p.total, limit)),
                }
            }
            None => Pagination {
                page: requested_page,
                limit: requested_limit,
                total: items.len() as u64,
                total_pages: total_pages(items.len() as u64, requested_limit),
            },
        };

        Ok(Page { items, pagination })
    }
}

fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
}

// =============================================================================
// Reconciliation
// =============================================================================

/// `data` of `GET /caja/arqueo`. Read-only; unknown fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_inicio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_fin: Option<String>,
    #[serde(default, with = "money::decimal_opt", skip_serializing_if = "Option::is_none")]
    pub monto_inicial: Option<Money>,
    #[serde(default, with = "money::decimal_opt", skip_serializing_if = "Option::is_none")]
    pub total_ingresos: Option<Money>,
    #[serde(default, with = "money::decimal_opt", skip_serializing_if = "Option::is_none")]
    pub efectivo_esperado: Option<Money>,
    /// Totals keyed by wire payment method (`EFECTIVO`, `YAPE`…).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub medios_pago: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cierres: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ReconciliationSummary {
    /// Per-method totals as money, skipping unknown keys and non-numeric values.
    pub fn method_totals(&self) -> PaymentBreakdown {
        let mut totals = PaymentBreakdown::default();
        for (key, value) in &self.medios_pago {
            let Ok(method) = key.parse::<caja_core::PaymentMethod>() else {
                continue;
            };
            let amount = match value {
                serde_json::Value::Number(n) => n.as_f64().map(Money::from_wire_number),
                serde_json::Value::String(s) => Money::parse(s).ok(),
                _ => None,
            };
            if let Some(amount) = amount {
                totals.set(method, amount);
            }
        }
        totals
    }
}

// =============================================================================
// Id helpers
// =============================================================================

/// Ids arrive as numbers or strings depending on the backend version.
fn id_string<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn opt_id<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}
