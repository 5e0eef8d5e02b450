use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

use super::columns::{attendees, orders};
use super::csv_loader::{field, CsvRow};
use super::records::{
    EventRecord, OrderRecord, SessionRecord, SessionSourceLink, TicketRecord, SOURCE,
};
use crate::normalization::{
    decimal_to_cents, join_name, normalize_str, parse_datetime, safe_int, split_date_time,
};

fn norm(row: &CsvRow, column: &str) -> Option<String> {
    normalize_str(field(row, column))
}

fn cents(row: &CsvRow, column: &str) -> i64 {
    decimal_to_cents(field(row, column))
}

/// Events, their mirror sessions and the session links, one of each per
/// distinct Event ID.
#[derive(Debug, Default)]
pub struct EventBuild {
    pub events: Vec<EventRecord>,
    pub sessions: Vec<SessionRecord>,
    pub session_sources: Vec<SessionSourceLink>,
}

/// What the ticket builder needs to know about an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRef {
    pub event_id: String,
    pub currency: Option<String>,
    pub ordered_at: Option<String>,
}

#[derive(Debug, Default)]
pub struct OrderBuild {
    pub orders: Vec<OrderRecord>,
    pub lookup: HashMap<String, OrderRef>,
    /// Latest order time seen; feeds the sync watermark.
    pub latest_order_at: Option<DateTime<Utc>>,
}

/// Build event/session/link records from the orders export.
///
/// The first row seen for an Event ID defines all three records; later rows
/// for that event are ignored even when their event columns differ.
pub fn build_event_records(order_rows: &[CsvRow], ingested_at: &str) -> EventBuild {
    let mut by_event: IndexMap<String, (EventRecord, SessionRecord, SessionSourceLink)> =
        IndexMap::new();

    for row in order_rows {
        let Some(event_id) = norm(row, orders::EVENT_ID) else {
            continue;
        };
        if by_event.contains_key(&event_id) {
            continue;
        }

        let name = norm(row, orders::EVENT_NAME).unwrap_or_default();
        let timezone = norm(row, orders::EVENT_TIMEZONE);
        let start = parse_datetime(
            norm(row, orders::EVENT_START_DATE).as_deref(),
            norm(row, orders::EVENT_START_TIME).as_deref(),
            timezone.as_deref(),
        );
        let start_utc = start.as_ref().map(|ts| ts.utc_iso.clone());
        let start_local = start.map(|ts| ts.local_iso);
        let venue_name = norm(row, orders::EVENT_LOCATION);

        let event = EventRecord {
            source: SOURCE,
            source_id: event_id.clone(),
            name: name.clone(),
            description: None,
            slug: None,
            url: None,
            start_date: start_utc.clone(),
            end_date: None,
            timezone: timezone.clone(),
            status: None,
            total_capacity: safe_int(field(row, orders::TICKET_QUANTITY)),
            public: None,
            published: None,
            venue_name: venue_name.clone(),
            venue_address: None,
            venue_city: None,
            venue_country: norm(row, orders::PURCHASER_COUNTRY),
            currency: norm(row, orders::CURRENCY),
            created_at: start_utc.clone(),
            updated_at: start_utc.clone(),
            ingested_at: ingested_at.to_string(),
            updated_at_api: start_utc.clone(),
            raw: row.clone(),
        };

        let session = SessionRecord {
            source: SOURCE,
            source_id: event_id.clone(),
            event_source_id: event_id.clone(),
            name,
            start_date: start_utc.clone(),
            end_date: None,
            start_date_local: start_local.clone(),
            end_date_local: start_local,
            timezone,
            venue_name,
            created_at: start_utc.clone(),
            updated_at: start_utc.clone(),
            ingested_at: ingested_at.to_string(),
            updated_at_api: start_utc,
            raw: row.clone(),
        };

        let link = SessionSourceLink {
            canonical_source: SOURCE,
            canonical_session_source_id: event_id.clone(),
            source: SOURCE,
            source_session_id: event_id.clone(),
            source_event_id: event_id.clone(),
        };

        by_event.insert(event_id, (event, session, link));
    }

    let mut out = EventBuild::default();
    for (_, (event, session, link)) in by_event {
        out.events.push(event);
        out.sessions.push(session);
        out.session_sources.push(link);
    }
    out
}

/// Build order records plus the lookup the ticket builder joins against.
///
/// Rows without an Order ID or Event ID are skipped. A repeated Order ID keeps
/// its first row so a single upsert batch never hits the same key twice.
pub fn build_order_records(order_rows: &[CsvRow], ingested_at: &str) -> OrderBuild {
    let mut out = OrderBuild::default();

    for row in order_rows {
        let (Some(order_id), Some(event_id)) =
            (norm(row, orders::ORDER_ID), norm(row, orders::EVENT_ID))
        else {
            continue;
        };
        if out.lookup.contains_key(&order_id) {
            debug!(order_id = %order_id, "duplicate order row ignored");
            continue;
        }

        let currency = norm(row, orders::CURRENCY);
        let order_date = norm(row, orders::ORDER_DATE);
        let ordered = order_date.as_deref().and_then(|raw| {
            let (date, time) = split_date_time(raw);
            parse_datetime(Some(date), time, norm(row, orders::EVENT_TIMEZONE).as_deref())
        });
        if let Some(ts) = &ordered {
            if out.latest_order_at.map_or(true, |latest| ts.utc > latest) {
                out.latest_order_at = Some(ts.utc);
            }
        }
        let ordered_at = ordered.map(|ts| ts.utc_iso);

        let gross = cents(row, orders::GROSS_SALES);
        let net = cents(row, orders::NET_SALES);
        let subtotal = decimal_to_cents(
            field(row, orders::TICKET_ADDONS_REVENUE)
                .filter(|v| !v.is_empty())
                .or_else(|| field(row, orders::TICKET_REVENUE)),
        );
        let fees = cents(row, orders::SERVICE_FEE)
            + cents(row, orders::PROCESSING_FEE)
            + cents(row, orders::ROYALTY);
        let taxes = cents(row, orders::EVENTBRITE_TAX) + cents(row, orders::ORGANISER_TAX);

        let purchaser_name = join_name(&[
            norm(row, orders::BUYER_FIRST_NAME),
            norm(row, orders::BUYER_LAST_NAME),
        ]);

        out.orders.push(OrderRecord {
            source: SOURCE,
            source_id: order_id.clone(),
            event_source_id: event_id.clone(),
            session_source_id: event_id.clone(),
            status: norm(row, orders::PAYMENT_STATUS),
            financial_status: norm(row, orders::PAYMENT_TYPE),
            total_cents: gross,
            subtotal_cents: subtotal,
            net_sales_cents: net,
            gross_sales_cents: gross,
            discounts_cents: discounts_cents(gross, subtotal, taxes, fees),
            taxes_cents: taxes,
            fees_cents: fees,
            purchaser_email: norm(row, orders::BUYER_EMAIL),
            purchaser_name,
            ordered_at: ordered_at.clone(),
            updated_at: ordered_at.clone(),
            currency: currency.clone(),
            additional_fields: None,
            raw: row.clone(),
            ingested_at: ingested_at.to_string(),
            updated_at_api: ordered_at.clone(),
        });
        out.lookup.insert(
            order_id,
            OrderRef {
                event_id,
                currency,
                ordered_at,
            },
        );
    }

    out
}

/// Whatever gross is not explained by subtotal, taxes and fees, floored at 0.
pub fn discounts_cents(gross: i64, subtotal: i64, taxes: i64, fees: i64) -> i64 {
    (gross - subtotal - taxes - fees).max(0)
}

/// Build one ticket per attendee row that belongs to an accepted order.
///
/// Tickets without a barcode get `{order}-ticket-{index}`, where `index` is the
/// zero-based row position in the attendee export.
pub fn build_ticket_records(
    attendee_rows: &[CsvRow],
    lookup: &HashMap<String, OrderRef>,
    ingested_at: &str,
) -> Vec<TicketRecord> {
    let mut tickets: IndexMap<String, TicketRecord> = IndexMap::new();

    for (index, row) in attendee_rows.iter().enumerate() {
        let (Some(order_id), Some(event_id)) =
            (norm(row, attendees::ORDER_ID), norm(row, attendees::EVENT_ID))
        else {
            continue;
        };
        let Some(order) = lookup.get(&order_id) else {
            continue;
        };

        let ticket_id = norm(row, attendees::BARCODE)
            .unwrap_or_else(|| format!("{order_id}-ticket-{index}"));
        if tickets.contains_key(&ticket_id) {
            debug!(ticket_id = %ticket_id, "duplicate ticket row ignored");
            continue;
        }
        let price = cents(row, attendees::TICKET_PRICE);

        let ticket = TicketRecord {
            source: SOURCE,
            source_id: ticket_id.clone(),
            event_source_id: event_id.clone(),
            session_source_id: event_id,
            order_source_id: order_id,
            ticket_type_id: norm(row, attendees::TICKET_TIER),
            ticket_type_name: norm(row, attendees::TICKET_TYPE),
            status: None,
            price_cents: price,
            net_price_cents: price,
            total_cents: price,
            discount_cents: 0,
            taxes_cents: 0,
            fee_cents: 0,
            passed_on_fee_cents: 0,
            absorbed_fee_cents: 0,
            dgr_donation_cents: 0,
            currency: order.currency.clone(),
            first_name: norm(row, attendees::FIRST_NAME),
            last_name: norm(row, attendees::LAST_NAME),
            email: norm(row, attendees::EMAIL),
            created_at: order.ordered_at.clone(),
            updated_at: order.ordered_at.clone(),
            raw: row.clone(),
            ingested_at: ingested_at.to_string(),
            updated_at_api: order.ordered_at.clone(),
        };
        tickets.insert(ticket_id, ticket);
    }

    tickets.into_values().collect()
}
