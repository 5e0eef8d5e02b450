//! Offline pre-import checks over the Orders and Sales exports.
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt::Write as _;

use super::columns::{orders, sales};
use super::csv_loader::{field, CsvRow};
use crate::normalization::money::is_valid_amount;
use crate::normalization::{decimal_to_cents, normalize_str, parse_datetime, split_date_time};

/// Sales totals may legitimately drift from summed orders (refund timing,
/// aggregation across instances); only flag beyond this share.
pub const MAX_VARIANCE_PCT: f64 = 5.0;

const ORDER_AMOUNT_FIELDS: [&str; 5] = [
    orders::GROSS_SALES,
    orders::NET_SALES,
    orders::SERVICE_FEE,
    orders::PROCESSING_FEE,
    orders::TICKET_REVENUE,
];
const SALES_AMOUNT_FIELDS: [&str; 3] = [sales::GROSS_SALES, sales::NET_SALES, sales::TICKETS_SOLD];

const ERRORS_SHOWN: usize = 10;
const DISCREPANCIES_SHOWN: usize = 5;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MissingFields {
    pub order_id: usize,
    pub event_id: usize,
    pub event_location: usize,
    pub buyer_email: usize,
    pub net_sales: usize,
}

#[derive(Debug, Default, Clone)]
pub struct OrdersReport {
    pub total: usize,
    pub valid: usize,
    pub with_venue: usize,
    /// `(order id, row number)` for every repeat after the first.
    pub duplicates: Vec<(String, usize)>,
    pub missing: MissingFields,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct SalesReport {
    pub total: usize,
    pub valid: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountKind {
    Gross,
    Net,
}

impl std::fmt::Display for AmountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountKind::Gross => f.write_str("Gross Sales"),
            AmountKind::Net => f.write_str("Net Sales"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    pub event_name: String,
    pub kind: AmountKind,
    pub sales_cents: i64,
    pub orders_cents: i64,
    pub variance_pct: f64,
}

#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    pub orders: OrdersReport,
    pub sales: Option<SalesReport>,
    /// Number of distinct events seen in the orders export.
    pub events_compared: usize,
    pub discrepancies: Vec<Discrepancy>,
}

impl ValidationReport {
    pub fn critical_errors(&self) -> usize {
        self.orders.errors.len() + self.sales.as_ref().map_or(0, |s| s.errors.len())
    }

    pub fn passed(&self) -> bool {
        self.critical_errors() == 0
    }

    /// Human-readable report for the operator.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let o = &self.orders;
        let venue_pct = if o.total > 0 {
            o.with_venue as f64 * 100.0 / o.total as f64
        } else {
            0.0
        };
        let _ = writeln!(out, "ORDERS CSV:");
        let _ = writeln!(out, "  Total rows: {}", o.total);
        let _ = writeln!(out, "  Valid rows: {}", o.valid);
        let _ = writeln!(out, "  Orders with venue: {} ({venue_pct:.1}%)", o.with_venue);
        let _ = writeln!(out, "  Duplicates: {}", o.duplicates.len());
        let _ = writeln!(out, "  Errors: {}", o.errors.len());
        let _ = writeln!(out, "  Warnings: {}", o.warnings.len());

        if let Some(s) = &self.sales {
            let _ = writeln!(out, "SALES CSV:");
            let _ = writeln!(out, "  Total rows: {}", s.total);
            let _ = writeln!(out, "  Valid rows: {}", s.valid);
            let _ = writeln!(out, "  Errors: {}", s.errors.len());
            let _ = writeln!(out, "  Warnings: {}", s.warnings.len());
            let _ = writeln!(out, "CROSS-VALIDATION:");
            let _ = writeln!(out, "  Events compared: {}", self.events_compared);
            let _ = writeln!(
                out,
                "  Financial discrepancies (>{MAX_VARIANCE_PCT}%): {}",
                self.discrepancies.len()
            );
        }

        if !self.passed() {
            let _ = writeln!(out, "\nCRITICAL ERRORS:");
            write_capped(&mut out, "Orders CSV errors", &o.errors, ERRORS_SHOWN);
            if let Some(s) = &self.sales {
                write_capped(&mut out, "Sales CSV errors", &s.errors, ERRORS_SHOWN);
            }
        }

        if !self.discrepancies.is_empty() {
            let _ = writeln!(out, "\nFINANCIAL DISCREPANCIES >{MAX_VARIANCE_PCT}%:");
            for d in self.discrepancies.iter().take(DISCREPANCIES_SHOWN) {
                let _ = writeln!(out, "  Event: {}", d.event_name);
                let _ = writeln!(out, "  Type: {}", d.kind);
                let _ = writeln!(out, "  Sales CSV: {}", format_cents(d.sales_cents));
                let _ = writeln!(out, "  Orders total: {}", format_cents(d.orders_cents));
                let _ = writeln!(
                    out,
                    "  Difference: {} ({:.2}%)\n",
                    format_cents((d.sales_cents - d.orders_cents).abs()),
                    d.variance_pct
                );
            }
            if self.discrepancies.len() > DISCREPANCIES_SHOWN {
                let _ = writeln!(
                    out,
                    "  ... and {} more",
                    self.discrepancies.len() - DISCREPANCIES_SHOWN
                );
            }
        }

        let verdict = if self.passed() {
            "VALIDATION PASSED"
        } else {
            "VALIDATION FAILED"
        };
        let _ = writeln!(out, "\n{verdict}");
        out
    }
}

fn write_capped(out: &mut String, title: &str, lines: &[String], cap: usize) {
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "{title} (showing first {cap}):");
    for line in lines.iter().take(cap) {
        let _ = writeln!(out, "  - {line}");
    }
    if lines.len() > cap {
        let _ = writeln!(out, "  ... and {} more", lines.len() - cap);
    }
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

fn is_valid_date_time(raw: &str) -> bool {
    let (date, time) = split_date_time(raw.trim());
    parse_datetime(Some(date), time, None).is_some()
}

/// Validate the orders export and, when given, the sales export plus the
/// orders-vs-sales financial cross-check.
pub fn validate_exports(order_rows: &[CsvRow], sales_rows: Option<&[CsvRow]>) -> ValidationReport {
    let mut report = ValidationReport {
        orders: validate_orders(order_rows),
        ..Default::default()
    };
    if let Some(sales_rows) = sales_rows {
        report.sales = Some(validate_sales(sales_rows));
        let (compared, discrepancies) = cross_validate(order_rows, sales_rows);
        report.events_compared = compared;
        report.discrepancies = discrepancies;
    }
    report
}

pub fn validate_orders(rows: &[CsvRow]) -> OrdersReport {
    let mut report = OrdersReport {
        total: rows.len(),
        ..Default::default()
    };
    let mut seen: HashSet<String> = HashSet::new();

    for (index, row) in rows.iter().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let mut has_error = false;
        let present = |column: &str| normalize_str(field(row, column));

        match present(orders::ORDER_ID) {
            None => {
                report.missing.order_id += 1;
                report.errors.push(format!("Row {line}: Missing Order ID"));
                has_error = true;
            }
            Some(order_id) => {
                if seen.contains(&order_id) {
                    report
                        .errors
                        .push(format!("Row {line}: Duplicate Order ID {order_id}"));
                    report.duplicates.push((order_id, line));
                    has_error = true;
                } else {
                    seen.insert(order_id);
                }
            }
        }

        if present(orders::EVENT_ID).is_none() {
            report.missing.event_id += 1;
            report.warnings.push(format!("Row {line}: Missing Event ID"));
        }
        if present(orders::EVENT_LOCATION).is_some() {
            report.with_venue += 1;
        } else {
            report.missing.event_location += 1;
            report
                .warnings
                .push(format!("Row {line}: Missing Event location (venue)"));
        }
        if present(orders::BUYER_EMAIL).is_none() {
            report.missing.buyer_email += 1;
            report.warnings.push(format!("Row {line}: Missing Buyer email"));
        }

        if let Some(order_date) = present(orders::ORDER_DATE) {
            if !is_valid_date_time(&order_date) {
                report
                    .errors
                    .push(format!("Row {line}: Invalid Order date format: {order_date}"));
                has_error = true;
            }
        }
        if let Some(start) = present(orders::EVENT_START_DATE) {
            if !is_valid_date_time(&start) {
                report
                    .warnings
                    .push(format!("Row {line}: Invalid Event start date format: {start}"));
            }
        }

        for column in ORDER_AMOUNT_FIELDS {
            if let Some(value) = present(column) {
                if !is_valid_amount(&value) {
                    report
                        .errors
                        .push(format!("Row {line}: Invalid {column} format: {value}"));
                    has_error = true;
                }
            }
        }

        if present(orders::NET_SALES).is_none() {
            report.missing.net_sales += 1;
            report.warnings.push(format!("Row {line}: Missing Net sales"));
        }

        if !has_error {
            report.valid += 1;
        }
    }

    report
}

pub fn validate_sales(rows: &[CsvRow]) -> SalesReport {
    let mut report = SalesReport {
        total: rows.len(),
        ..Default::default()
    };
    for (index, row) in rows.iter().enumerate() {
        let line = index + 2;
        let mut has_error = false;

        if normalize_str(field(row, sales::EVENT_NAME)).is_none() {
            report.warnings.push(format!("Row {line}: Missing Event name"));
        }
        for column in SALES_AMOUNT_FIELDS {
            if let Some(value) = normalize_str(field(row, column)) {
                if !is_valid_amount(&value) {
                    report
                        .errors
                        .push(format!("Row {line}: Invalid {column} format: {value}"));
                    has_error = true;
                }
            }
        }
        if !has_error {
            report.valid += 1;
        }
    }
    report
}

struct EventTotals {
    name: Option<String>,
    gross: i64,
    net: i64,
}

/// Sum order money per Event ID and compare with the sales export, which is
/// keyed by event name only. Returns the number of events summed.
pub fn cross_validate(order_rows: &[CsvRow], sales_rows: &[CsvRow]) -> (usize, Vec<Discrepancy>) {
    let mut totals: IndexMap<String, EventTotals> = IndexMap::new();
    for row in order_rows {
        let Some(event_id) = normalize_str(field(row, orders::EVENT_ID)) else {
            continue;
        };
        let entry = totals.entry(event_id).or_insert_with(|| EventTotals {
            name: normalize_str(field(row, orders::EVENT_NAME)),
            gross: 0,
            net: 0,
        });
        entry.gross += decimal_to_cents(field(row, orders::GROSS_SALES).map(strip_currency));
        entry.net += decimal_to_cents(field(row, orders::NET_SALES).map(strip_currency));
    }

    let mut discrepancies = Vec::new();
    for row in sales_rows {
        let Some(name) = normalize_str(field(row, sales::EVENT_NAME)) else {
            continue;
        };
        // A sales row may aggregate several dated instances; an unmatched name is fine.
        let Some(event) = totals.values().find(|t| t.name.as_deref() == Some(name.as_str())) else {
            continue;
        };
        let pairs = [
            (
                AmountKind::Gross,
                decimal_to_cents(field(row, sales::GROSS_SALES).map(strip_currency)),
                event.gross,
            ),
            (
                AmountKind::Net,
                decimal_to_cents(field(row, sales::NET_SALES).map(strip_currency)),
                event.net,
            ),
        ];
        for (kind, sales_cents, orders_cents) in pairs {
            let variance_pct = if sales_cents > 0 {
                (sales_cents - orders_cents).abs() as f64 * 100.0 / sales_cents as f64
            } else {
                0.0
            };
            if variance_pct > MAX_VARIANCE_PCT {
                discrepancies.push(Discrepancy {
                    event_name: name.clone(),
                    kind,
                    sales_cents,
                    orders_cents,
                    variance_pct,
                });
            }
        }
    }
    (totals.len(), discrepancies)
}

fn strip_currency(value: &str) -> &str {
    value.trim().trim_start_matches('$')
}
