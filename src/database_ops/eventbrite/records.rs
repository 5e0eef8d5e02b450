//! Row shapes written to the Supabase tables. Absent values serialize as
//! `null`; the nulls for columns this export cannot fill keep the payload
//! shape identical to the webhook-fed rows in the same tables.
use serde::Serialize;

use super::csv_loader::CsvRow;

pub const SOURCE: &str = "eventbrite";

pub const EVENTS_TABLE: &str = "events_htx";
pub const SESSIONS_TABLE: &str = "sessions_htx";
pub const SESSION_SOURCES_TABLE: &str = "session_sources";
pub const ORDERS_TABLE: &str = "orders_eventbrite";
pub const TICKETS_TABLE: &str = "tickets_eventbrite";

pub const EVENTS_CONFLICT: &str = "source,source_id";
pub const SESSIONS_CONFLICT: &str = "source,source_id";
pub const SESSION_SOURCES_CONFLICT: &str = "source,source_session_id";
pub const ORDERS_CONFLICT: &str = "source_id";
pub const TICKETS_CONFLICT: &str = "source_id";

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub source: &'static str,
    pub source_id: String,
    pub name: String,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub timezone: Option<String>,
    pub status: Option<String>,
    pub total_capacity: Option<i64>,
    pub public: Option<bool>,
    pub published: Option<bool>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub venue_city: Option<String>,
    pub venue_country: Option<String>,
    pub currency: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub ingested_at: String,
    pub updated_at_api: Option<String>,
    pub raw: CsvRow,
}

/// Eventbrite has no session concept, so each event doubles as its own session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub source: &'static str,
    pub source_id: String,
    pub event_source_id: String,
    pub name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_date_local: Option<String>,
    pub end_date_local: Option<String>,
    pub timezone: Option<String>,
    pub venue_name: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub ingested_at: String,
    pub updated_at_api: Option<String>,
    pub raw: CsvRow,
}

/// Join row pointing a canonical session at this source's identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSourceLink {
    pub canonical_source: &'static str,
    pub canonical_session_source_id: String,
    pub source: &'static str,
    pub source_session_id: String,
    pub source_event_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    pub source: &'static str,
    pub source_id: String,
    pub event_source_id: String,
    pub session_source_id: String,
    pub status: Option<String>,
    pub financial_status: Option<String>,
    pub total_cents: i64,
    pub subtotal_cents: i64,
    pub net_sales_cents: i64,
    pub gross_sales_cents: i64,
    pub discounts_cents: i64,
    pub taxes_cents: i64,
    pub fees_cents: i64,
    pub purchaser_email: Option<String>,
    pub purchaser_name: Option<String>,
    pub ordered_at: Option<String>,
    pub updated_at: Option<String>,
    pub currency: Option<String>,
    pub additional_fields: Option<serde_json::Value>,
    pub raw: CsvRow,
    pub ingested_at: String,
    pub updated_at_api: Option<String>,
}

/// The attendee export carries a single price per ticket, so the price is
/// repeated into the net/total columns and every breakdown column is zero.
#[derive(Debug, Clone, Serialize)]
pub struct TicketRecord {
    pub source: &'static str,
    pub source_id: String,
    pub event_source_id: String,
    pub session_source_id: String,
    pub order_source_id: String,
    pub ticket_type_id: Option<String>,
    pub ticket_type_name: Option<String>,
    pub status: Option<String>,
    pub price_cents: i64,
    pub net_price_cents: i64,
    pub total_cents: i64,
    pub discount_cents: i64,
    pub taxes_cents: i64,
    pub fee_cents: i64,
    pub passed_on_fee_cents: i64,
    pub absorbed_fee_cents: i64,
    pub dgr_donation_cents: i64,
    pub currency: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub raw: CsvRow,
    pub ingested_at: String,
    pub updated_at_api: Option<String>,
}
