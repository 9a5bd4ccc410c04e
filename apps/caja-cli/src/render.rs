//! Plain-text rendering of the view-models for the terminal.

use std::fmt::Write;

use caja_client::{ClientConfig, ReconciliationSummary};
use caja_core::control::{CloseFormView, ControlView};
use caja_core::format;
use caja_core::history::{HistoryRow, HistoryView, RowDetail};
use caja_core::{DailySalesSummary, PaymentMethod};

const RULE: &str = "────────────────────────────────────────";

/// Status badge, opening float, today's sales and the available action.
pub fn control(view: &ControlView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.badge);
    let _ = writeln!(out, "{RULE}");

    if let Some(opening) = view.opening_amount {
        let _ = writeln!(out, "{:<22}{}", "Monto inicial", format::currency(opening));
    }
    if let Some(sales) = &view.daily_sales {
        out.push_str(&daily_sales(sales));
    }
    if let Some(form) = &view.close_form {
        let _ = writeln!(out, "{RULE}");
        out.push_str(&close_preview(form));
    }

    let _ = writeln!(out, "{RULE}");
    match &view.action {
        Some(button) if button.enabled => {
            let _ = writeln!(out, "Acción disponible: {}", button.label);
        }
        Some(button) => {
            let _ = writeln!(out, "Acción disponible: {} (espere…)", button.label);
        }
        None if view.status.is_some() => {
            let _ = writeln!(out, "Sin acciones disponibles");
        }
        None => {}
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {}", error);
    }
    out
}

fn daily_sales(sales: &DailySalesSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<22}{}",
        "Ventas del día",
        format::currency(sales.total_income)
    );
    for (method, amount) in sales.payment_breakdown.iter() {
        let _ = writeln!(out, "  {:<20}{}", format::method_label(method), format::currency(amount));
    }
    let _ = writeln!(
        out,
        "Comprobantes: {} formales, {} informales · {} pagos",
        sales.formal_vouchers, sales.informal_vouchers, sales.payments
    );
    out
}

/// Counted amounts against the system total, as shown before submitting.
pub fn close_preview(form: &CloseFormView) -> String {
    let mut out = String::new();
    for field in &form.fields {
        let _ = writeln!(
            out,
            "  {:<20}{:>12}   (esperado {})",
            field.label,
            field.text,
            format::currency(field.expected)
        );
    }
    let _ = writeln!(out, "{:<22}{}", "Total declarado", format::currency(form.declared_total));
    let _ = writeln!(out, "{:<22}{}", "Total sistema", format::currency(form.system_total));
    let _ = writeln!(
        out,
        "{:<22}{} ({})",
        "Diferencia",
        format::signed_currency(form.variance),
        format::variance_label(form.variance_sign)
    );
    out
}

/// Movement table, or the empty-range message.
pub fn history(view: &HistoryView) -> String {
    match view {
        HistoryView::Empty { message } => format!("{}\n", message),
        HistoryView::Table { rows, pagination } => {
            let mut out = String::new();
            for row in rows {
                out.push_str(&history_row(row));
            }
            let _ = writeln!(out, "{RULE}");
            let _ = writeln!(
                out,
                "Página {} de {} · {} movimientos",
                pagination.page, pagination.total_pages, pagination.total
            );
            out
        }
    }
}

fn history_row(row: &HistoryRow) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}  {:<9}", row.timestamp, row.label);
    if let Some(operator) = &row.operator {
        let _ = write!(out, "  {}", operator);
    }
    out.push('\n');

    match &row.detail {
        RowDetail::Aperture { opening_amount } => {
            if let Some(amount) = opening_amount {
                let _ = writeln!(out, "    Monto inicial: {}", format::currency(*amount));
            }
        }
        RowDetail::Closure {
            closing_amount,
            total_sales,
            breakdown,
            variance,
        } => {
            if let Some(amount) = closing_amount {
                let _ = writeln!(out, "    Monto final: {}", format::currency(*amount));
            }
            if let Some(amount) = total_sales {
                let _ = writeln!(out, "    Total ventas: {}", format::currency(*amount));
            }
            for line in breakdown.iter().flatten() {
                let _ = writeln!(out, "      {:<18}{}", line.label, format::currency(line.amount));
            }
            if let Some(line) = variance {
                let _ = writeln!(
                    out,
                    "    {}: {}",
                    line.label,
                    format::signed_currency(line.amount)
                );
            }
        }
        RowDetail::Cash { amount } => {
            if let Some(amount) = amount {
                let _ = writeln!(out, "    Monto: {}", format::currency(*amount));
            }
        }
    }

    if let Some(notes) = &row.notes {
        let _ = writeln!(out, "    Obs.: {}", notes);
    }
    out
}

/// Reconciliation totals for a date range.
pub fn reconciliation(summary: &ReconciliationSummary) -> String {
    let mut out = String::new();
    if let (Some(from), Some(to)) = (&summary.fecha_inicio, &summary.fecha_fin) {
        let _ = writeln!(out, "Arqueo del {} al {}", from, to);
        let _ = writeln!(out, "{RULE}");
    }
    let amounts = [
        ("Monto inicial", summary.monto_inicial),
        ("Total ingresos", summary.total_ingresos),
        ("Efectivo esperado", summary.efectivo_esperado),
    ];
    for (label, amount) in amounts {
        if let Some(amount) = amount {
            let _ = writeln!(out, "{:<22}{}", label, format::currency(amount));
        }
    }

    let totals = summary.method_totals();
    if totals.any_nonzero() {
        for method in PaymentMethod::ALL {
            let _ = writeln!(
                out,
                "  {:<20}{}",
                format::method_label(method),
                format::currency(totals.get(method))
            );
        }
    }
    if !summary.cierres.is_empty() {
        let _ = writeln!(out, "Cierres en el rango: {}", summary.cierres.len());
    }
    out
}

/// Effective settings. The token is never printed.
pub fn config(config: &ClientConfig) -> String {
    let mut out = String::new();
    let api = &config.api;
    let _ = writeln!(out, "{:<22}{}", "API", api.base_url);
    let _ = writeln!(
        out,
        "{:<22}{}",
        "Token",
        if api.token.is_some() { "configurado" } else { "no configurado" }
    );
    let _ = writeln!(out, "{:<22}{} s", "Tiempo de espera", api.request_timeout_secs);
    let _ = writeln!(
        out,
        "{:<22}{}",
        "Zona horaria backend",
        api.utc_offset.as_deref().unwrap_or("UTC")
    );
    let _ = writeln!(out, "{:<22}{} s", "Mensajes de error", config.store.error_clear_secs);
    let _ = writeln!(out, "{:<22}{}", "Filas por página", config.store.history_page_size);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use caja_core::control::ShiftControl;
    use caja_core::history::ShiftHistory;
    use caja_core::{
        DailySalesSummary, Money, MovementType, Page, Pagination, PaymentBreakdown, ShiftMovement,
        ShiftStatus, ShiftStatusSnapshot,
    };
    use chrono::{NaiveDate, TimeZone, Utc};

    fn soles(major: i64) -> Money {
        Money::from_major_minor(major, 0)
    }

    fn open_snapshot() -> ShiftStatusSnapshot {
        let sales = PaymentBreakdown {
            cash: soles(300),
            yape: soles(50),
            card: soles(20),
            ..PaymentBreakdown::default()
        };
        ShiftStatusSnapshot {
            status: ShiftStatus::Open,
            movement: Some(ShiftMovement {
                id: "1".into(),
                movement_type: MovementType::Aperture,
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
                opening_amount: Some(soles(200)),
                closing_amount: None,
                counted: None,
                total_sales: None,
                variance: None,
                amount: None,
                notes: None,
                operator: None,
            }),
            daily_sales: DailySalesSummary {
                total_income: soles(370),
                payment_breakdown: sales,
                formal_vouchers: 4,
                informal_vouchers: 2,
                payments: 6,
            },
        }
    }

    #[test]
    fn test_control_open_register() {
        let snapshot = open_snapshot();
        let text = control(&ShiftControl::new().view(Some(&snapshot), None, false));
        assert!(text.starts_with("Caja abierta"));
        assert!(text.contains("S/ 200.00"));
        assert!(text.contains("S/ 370.00"));
        assert!(text.contains("Acción disponible: Cerrar caja"));
    }

    #[test]
    fn test_control_before_first_fetch() {
        let text = control(&ShiftControl::new().view(None, Some("Sin conexión"), true));
        assert!(text.starts_with("Consultando estado…"));
        assert!(!text.contains("Acción disponible"));
        assert!(text.contains("Error: Sin conexión"));
    }

    #[test]
    fn test_close_preview_shows_surplus() {
        let snapshot = open_snapshot();
        let mut control = ShiftControl::new();
        control
            .begin_close(&snapshot)
            .unwrap()
            .set_field(PaymentMethod::Cash, "480");

        let view = control.view(Some(&snapshot), None, false);
        let text = close_preview(view.close_form.as_ref().unwrap());
        assert!(text.contains("S/ 550.00"));
        assert!(text.contains("+S/ 180.00"));
        assert!(text.contains("Sobrante"));
    }

    #[test]
    fn test_history_empty_and_table() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history = ShiftHistory::new(day, 10).unwrap();

        let empty = Page {
            items: Vec::new(),
            pagination: Pagination::default(),
        };
        assert_eq!(
            super::history(&history.view(&empty)),
            "No hay movimientos en el rango seleccionado\n"
        );

        let page = Page {
            items: vec![open_snapshot().movement.unwrap()],
            pagination: Pagination {
                page: 1,
                limit: 10,
                total: 1,
                total_pages: 1,
            },
        };
        let text = super::history(&history.view(&page));
        assert!(text.contains("01/01/2024 08:00"));
        assert!(text.contains("Apertura"));
        assert!(text.contains("Página 1 de 1"));
    }

    #[test]
    fn test_config_hides_token() {
        let mut settings = ClientConfig::default();
        settings.api.token = Some("secreto".to_string());
        settings.api.utc_offset = Some("-05:00".to_string());

        let text = config(&settings);
        assert!(text.contains("http://localhost:3000/api"));
        assert!(text.contains("configurado"));
        assert!(!text.contains("secreto"));
        assert!(text.contains("-05:00"));
        assert!(text.contains("Filas por página"));
    }

    #[test]
    fn test_reconciliation_lists_methods() {
        let summary: ReconciliationSummary = serde_json::from_value(serde_json::json!({
            "fechaInicio": "2024-01-01",
            "fechaFin": "2024-01-31",
            "totalIngresos": 1200,
            "mediosPago": {"EFECTIVO": 1000, "YAPE": 200}
        }))
        .unwrap();
        let text = reconciliation(&summary);
        assert!(text.starts_with("Arqueo del 2024-01-01 al 2024-01-31"));
        assert!(text.contains("S/ 1,200.00"));
        assert!(text.contains("Yape"));
    }
}
