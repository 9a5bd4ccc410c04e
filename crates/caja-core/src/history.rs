//! # Shift History
//!
//! View-model for the paginated movement list.
//!
//! ```text
//!   draft range ──set_date_from/set_date_to──► draft range
//!        │
//!        └── apply() ── ordered? ──► applied range ──► HistoryQuery { page: 1 }
//!                          │
//!                          └── no ──► InvalidDateRange (applied range untouched)
//!
//!   go_to_page(n) ── 1 <= n <= total_pages ──► HistoryQuery { page: n }
//! ```
//!
//! Nothing here fetches. The caller hands each query to the store exactly
//! once, so partially typed dates never hit the network.
//!
//! Row times are rendered in the UTC offset given by
//! [`ShiftHistory::with_utc_offset`], UTC unless the caller sets one.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::format;
use crate::money::Money;
use crate::types::{
    HistoryFilter, HistoryQuery, MovementType, Page, Pagination, ShiftMovement, VarianceSign,
};
use crate::validation::validate_page_size;

/// Text shown instead of the table when a range has no movements.
pub const EMPTY_HISTORY_MESSAGE: &str = "No hay movimientos en el rango seleccionado";

// =============================================================================
// Shift History
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftHistory {
    draft: HistoryFilter,
    applied: HistoryFilter,
    page_size: u32,
    page: u32,
    offset: FixedOffset,
}

impl ShiftHistory {
    /// Starts on today's range, page 1.
    pub fn new(today: NaiveDate, page_size: u32) -> CoreResult<Self> {
        validate_page_size(page_size)?;
        let range = HistoryFilter::single_day(today);
        Ok(ShiftHistory {
            draft: range,
            applied: range,
            page_size,
            page: 1,
            offset: Utc.fix(),
        })
    }

    /// Renders row times on the operator's wall clock.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Query for the current applied range and page. Used for the first load.
    pub fn current_query(&self) -> HistoryQuery {
        HistoryQuery {
            page: self.page,
            page_size: self.page_size,
            filter: self.applied,
        }
    }

    pub fn draft(&self) -> &HistoryFilter {
        &self.draft
    }

    pub fn applied(&self) -> &HistoryFilter {
        &self.applied
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_date_from(&mut self, day: NaiveDate) {
        self.draft.date_from = day;
    }

    pub fn set_date_to(&mut self, day: NaiveDate) {
        self.draft.date_to = day;
    }

    /// Commits the draft range and resets to page 1.
    pub fn apply(&mut self) -> CoreResult<HistoryQuery> {
        if !self.draft.is_ordered() {
            return Err(CoreError::InvalidDateRange {
                from: self.draft.date_from.to_string(),
                to: self.draft.date_to.to_string(),
            });
        }
        self.applied = self.draft;
        self.page = 1;
        Ok(self.current_query())
    }

    /// Moves to page `page` of the applied range.
    pub fn go_to_page(&mut self, page: u32, pagination: &Pagination) -> CoreResult<HistoryQuery> {
        if page == 0 || page > pagination.total_pages {
            return Err(CoreError::PageOutOfRange {
                requested: page,
                total_pages: pagination.total_pages,
            });
        }
        self.page = page;
        Ok(self.current_query())
    }

    /// Render model for a fetched page.
    pub fn view(&self, page: &Page<ShiftMovement>) -> HistoryView {
        if page.is_empty() {
            return HistoryView::Empty {
                message: EMPTY_HISTORY_MESSAGE.to_string(),
            };
        }
        HistoryView::Table {
            rows: page
                .items
                .iter()
                .map(|movement| HistoryRow::new(movement, self.offset))
                .collect(),
            pagination: page.pagination,
        }
    }
}

// =============================================================================
// Render Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryView {
    Empty { message: String },
    Table {
        rows: Vec<HistoryRow>,
        pagination: Pagination,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryRow {
    pub id: String,
    pub movement_type: MovementType,
    pub label: String,
    /// `dd/mm/yyyy HH:MM`
    pub timestamp: String,
    pub operator: Option<String>,
    pub notes: Option<String>,
    pub detail: RowDetail,
}

/// Per-type content of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowDetail {
    Aperture {
        opening_amount: Option<Money>,
    },
    Closure {
        closing_amount: Option<Money>,
        total_sales: Option<Money>,
        /// Present only when at least one bucket is nonzero.
        breakdown: Option<Vec<BreakdownLine>>,
        variance: Option<VarianceLine>,
    },
    /// INCOME and EXPENSE.
    Cash { amount: Option<Money> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BreakdownLine {
    pub label: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VarianceLine {
    pub amount: Money,
    pub sign: VarianceSign,
    pub label: String,
}

impl HistoryRow {
    pub fn new(movement: &ShiftMovement, offset: FixedOffset) -> Self {
        let detail = match movement.movement_type {
            MovementType::Aperture => RowDetail::Aperture {
                opening_amount: movement.opening_amount,
            },
            MovementType::Closure => RowDetail::Closure {
                closing_amount: movement.closing_amount,
                total_sales: movement.total_sales,
                breakdown: movement
                    .counted
                    .filter(|counted| counted.any_nonzero())
                    .map(|counted| {
                        counted
                            .iter()
                            .map(|(method, amount)| BreakdownLine {
                                label: format::method_label(method).to_string(),
                                amount,
                            })
                            .collect()
                    }),
                variance: movement.variance.map(|amount| {
                    let sign = VarianceSign::of(amount);
                    VarianceLine {
                        amount,
                        sign,
                        label: format::variance_label(sign).to_string(),
                    }
                }),
            },
            MovementType::Income | MovementType::Expense => RowDetail::Cash {
                amount: movement.amount,
            },
        };

        HistoryRow {
            id: movement.id.clone(),
            movement_type: movement.movement_type,
            label: format::movement_label(movement.movement_type).to_string(),
            timestamp: format::datetime(movement.timestamp, offset),
            operator: movement.operator.as_ref().map(|op| op.name.clone()),
            notes: movement.notes.clone(),
            detail,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OperatorRef, PaymentBreakdown, PaymentMethod};
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn movement(kind: MovementType) -> ShiftMovement {
        ShiftMovement {
            id: format!("mov-{}", kind.wire_name()),
            movement_type: kind,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 19, 30, 0).unwrap(),
            opening_amount: None,
            closing_amount: None,
            counted: None,
            total_sales: None,
            variance: None,
            amount: None,
            notes: None,
            operator: Some(OperatorRef {
                id: "u1".to_string(),
                name: "Rosa".to_string(),
            }),
        }
    }

    fn page_of(items: Vec<ShiftMovement>, total_pages: u32) -> Page<ShiftMovement> {
        let total = items.len() as u64;
        Page {
            items,
            pagination: Pagination {
                page: 1,
                limit: 10,
                total,
                total_pages,
            },
        }
    }

    #[test]
    fn test_defaults_to_today() {
        let today = day(2024, 3, 15);
        let history = ShiftHistory::new(today, 10).unwrap();
        let query = history.current_query();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);
        assert_eq!(query.filter, HistoryFilter::single_day(today));
    }

    #[test]
    fn test_rejects_bad_page_size() {
        assert!(ShiftHistory::new(day(2024, 1, 1), 0).is_err());
    }

    #[test]
    fn test_draft_edits_do_not_touch_applied_range() {
        let today = day(2024, 3, 15);
        let mut history = ShiftHistory::new(today, 10).unwrap();
        history.set_date_from(day(2024, 3, 1));
        assert_eq!(history.applied(), &HistoryFilter::single_day(today));
        assert_eq!(history.draft().date_from, day(2024, 3, 1));
    }

    #[test]
    fn test_apply_resets_to_first_page() {
        let mut history = ShiftHistory::new(day(2024, 3, 15), 10).unwrap();
        let pagination = Pagination {
            page: 1,
            limit: 10,
            total: 35,
            total_pages: 4,
        };
        history.go_to_page(3, &pagination).unwrap();

        history.set_date_from(day(2024, 3, 1));
        let query = history.apply().unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.filter.date_from, day(2024, 3, 1));
        assert_eq!(query.filter.date_to, day(2024, 3, 15));
        assert_eq!(history.page(), 1);
    }

    #[test]
    fn test_apply_rejects_reversed_range() {
        let today = day(2024, 3, 15);
        let mut history = ShiftHistory::new(today, 10).unwrap();
        history.set_date_from(day(2024, 3, 20));

        assert!(matches!(
            history.apply(),
            Err(CoreError::InvalidDateRange { .. })
        ));
        assert_eq!(history.applied(), &HistoryFilter::single_day(today));
    }

    #[test]
    fn test_go_to_page_bounds() {
        let mut history = ShiftHistory::new(day(2024, 3, 15), 10).unwrap();
        let pagination = Pagination {
            page: 1,
            limit: 10,
            total: 25,
            total_pages: 3,
        };

        assert_eq!(history.go_to_page(3, &pagination).unwrap().page, 3);
        assert_eq!(
            history.go_to_page(4, &pagination),
            Err(CoreError::PageOutOfRange {
                requested: 4,
                total_pages: 3
            })
        );
        assert!(history.go_to_page(0, &pagination).is_err());
        assert_eq!(history.page(), 3);
    }

    #[test]
    fn test_empty_range_shows_empty_state() {
        let mut history = ShiftHistory::new(day(2024, 1, 5), 10).unwrap();
        history.set_date_from(day(2024, 1, 1));
        history.set_date_to(day(2024, 1, 1));
        let query = history.apply().unwrap();
        assert_eq!(query.filter, HistoryFilter::single_day(day(2024, 1, 1)));

        let view = history.view(&page_of(Vec::new(), 0));
        assert_eq!(
            view,
            HistoryView::Empty {
                message: EMPTY_HISTORY_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn test_rows_render_by_type() {
        let history = ShiftHistory::new(day(2024, 1, 1), 10).unwrap();

        let mut aperture = movement(MovementType::Aperture);
        aperture.opening_amount = Some(Money::from_major_minor(200, 0));

        let mut closure = movement(MovementType::Closure);
        let mut counted = PaymentBreakdown::default();
        counted.set(PaymentMethod::Cash, Money::from_major_minor(480, 0));
        counted.set(PaymentMethod::Card, Money::from_major_minor(20, 0));
        closure.counted = Some(counted);
        closure.closing_amount = Some(Money::from_major_minor(500, 0));
        closure.total_sales = Some(Money::from_major_minor(505, 0));
        closure.variance = Some(Money::from_major_minor(-5, 0));

        let mut expense = movement(MovementType::Expense);
        expense.amount = Some(Money::from_major_minor(15, 0));
        expense.notes = Some("pago de delivery".to_string());

        let HistoryView::Table { rows, pagination } =
            history.view(&page_of(vec![aperture, closure, expense], 1))
        else {
            panic!("expected a table");
        };
        assert_eq!(pagination.total, 3);
        assert_eq!(rows[0].label, "Apertura");
        assert_eq!(rows[0].timestamp, "01/01/2024 19:30");
        assert_eq!(rows[0].operator.as_deref(), Some("Rosa"));
        assert_eq!(
            rows[0].detail,
            RowDetail::Aperture {
                opening_amount: Some(Money::from_major_minor(200, 0))
            }
        );

        let RowDetail::Closure {
            breakdown, variance, ..
        } = &rows[1].detail
        else {
            panic!("expected a closure row");
        };
        let breakdown = breakdown.as_ref().unwrap();
        assert_eq!(breakdown.len(), 5);
        assert_eq!(breakdown[0].label, "Efectivo");
        let variance = variance.as_ref().unwrap();
        assert_eq!(variance.sign, VarianceSign::Shortage);
        assert_eq!(variance.label, "Faltante");

        assert_eq!(rows[2].notes.as_deref(), Some("pago de delivery"));
        assert_eq!(
            rows[2].detail,
            RowDetail::Cash {
                amount: Some(Money::from_major_minor(15, 0))
            }
        );
    }

    #[test]
    fn test_rows_use_the_operator_offset() {
        let lima = FixedOffset::west_opt(5 * 3600).unwrap();
        let history = ShiftHistory::new(day(2024, 1, 1), 10)
            .unwrap()
            .with_utc_offset(lima);

        // Aperture at 20:00 in Lima, stored as 01:00 UTC on Jan 2.
        let mut aperture = movement(MovementType::Aperture);
        aperture.timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();

        let HistoryView::Table { rows, .. } = history.view(&page_of(vec![aperture], 1)) else {
            panic!("expected a table");
        };
        assert_eq!(rows[0].timestamp, "01/01/2024 20:00");
    }

    #[test]
    fn test_closure_with_all_zero_buckets_hides_breakdown() {
        let history = ShiftHistory::new(day(2024, 1, 1), 10).unwrap();
        let mut closure = movement(MovementType::Closure);
        closure.counted = Some(PaymentBreakdown::default());
        closure.variance = Some(Money::zero());

        let HistoryView::Table { rows, .. } = history.view(&page_of(vec![closure], 1)) else {
            panic!("expected a table");
        };
        let RowDetail::Closure {
            breakdown, variance, ..
        } = &rows[0].detail
        else {
            panic!("expected a closure row");
        };
        assert!(breakdown.is_none());
        assert_eq!(variance.as_ref().unwrap().sign, VarianceSign::Balanced);
    }
}
