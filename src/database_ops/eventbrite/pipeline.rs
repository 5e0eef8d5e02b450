use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::builders::{build_event_records, build_order_records, build_ticket_records};
use super::csv_loader::load_csv;
use super::records::{
    EVENTS_CONFLICT, EVENTS_TABLE, ORDERS_CONFLICT, ORDERS_TABLE, SESSIONS_CONFLICT,
    SESSIONS_TABLE, SESSION_SOURCES_CONFLICT, SESSION_SOURCES_TABLE, TICKETS_CONFLICT,
    TICKETS_TABLE,
};
use crate::database_ops::supabase_rest::{BatchWriter, UpsertClient};
use crate::database_ops::sync_state::update_sync_state;
use crate::normalization::to_utc_iso;

/// Linear run stages; a run never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Loading,
    Normalizing,
    Building,
    Upserting(&'static str),
    UpdatingWatermark,
    Done,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStage::Loading => f.write_str("loading"),
            ImportStage::Normalizing => f.write_str("normalizing"),
            ImportStage::Building => f.write_str("building"),
            ImportStage::Upserting(table) => write!(f, "upserting({table})"),
            ImportStage::UpdatingWatermark => f.write_str("updating_watermark"),
            ImportStage::Done => f.write_str("done"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportInputs {
    pub orders: PathBuf,
    pub attendees: PathBuf,
    /// Accepted for parity with the export bundle; the builders do not read it.
    pub sales: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub order_rows: usize,
    pub attendee_rows: usize,
    pub events: usize,
    pub sessions: usize,
    pub session_links: usize,
    pub orders: usize,
    pub tickets: usize,
    /// Watermark value written (or, in dry-run, the value it would get).
    pub watermark: Option<String>,
    pub dry_run: bool,
}

fn enter(stage: ImportStage) {
    debug!(stage = %stage, "import stage");
}

/// Load both exports, build every record set and upsert them in dependency
/// order, then advance the sync watermark. Any error aborts the run.
pub async fn run_import<W: BatchWriter>(
    inputs: &ImportInputs,
    client: &UpsertClient<W>,
    now: DateTime<Utc>,
) -> Result<ImportSummary> {
    enter(ImportStage::Loading);
    let order_rows = load_csv(&inputs.orders)?;
    let attendee_rows = load_csv(&inputs.attendees)?;
    if let Some(sales) = &inputs.sales {
        debug!(path = %sales.display(), "sales export accepted; not used by the importer");
    }
    info!(
        "Loaded {} order rows and {} attendee rows.",
        order_rows.len(),
        attendee_rows.len()
    );

    // Cells are normalized lazily by the builders; only the run clock is fixed here.
    enter(ImportStage::Normalizing);
    let ingested_at = to_utc_iso(&now);

    enter(ImportStage::Building);
    let events = build_event_records(&order_rows, &ingested_at);
    let orders = build_order_records(&order_rows, &ingested_at);
    let tickets = build_ticket_records(&attendee_rows, &orders.lookup, &ingested_at);
    info!(
        "Prepared {} events, {} sessions, {} session links, {} orders, {} tickets.",
        events.events.len(),
        events.sessions.len(),
        events.session_sources.len(),
        orders.orders.len(),
        tickets.len()
    );

    enter(ImportStage::Upserting(EVENTS_TABLE));
    client
        .upsert(EVENTS_TABLE, &events.events, EVENTS_CONFLICT)
        .await?;
    enter(ImportStage::Upserting(SESSIONS_TABLE));
    client
        .upsert(SESSIONS_TABLE, &events.sessions, SESSIONS_CONFLICT)
        .await?;
    enter(ImportStage::Upserting(SESSION_SOURCES_TABLE));
    client
        .upsert(
            SESSION_SOURCES_TABLE,
            &events.session_sources,
            SESSION_SOURCES_CONFLICT,
        )
        .await?;
    enter(ImportStage::Upserting(ORDERS_TABLE));
    client
        .upsert(ORDERS_TABLE, &orders.orders, ORDERS_CONFLICT)
        .await?;
    enter(ImportStage::Upserting(TICKETS_TABLE));
    client
        .upsert(TICKETS_TABLE, &tickets, TICKETS_CONFLICT)
        .await?;

    enter(ImportStage::UpdatingWatermark);
    let watermark = match orders.latest_order_at {
        Some(latest) => Some(update_sync_state(client, latest, now).await?),
        None => {
            warn!("no order timestamps detected; sync_state not updated");
            None
        }
    };

    enter(ImportStage::Done);
    Ok(ImportSummary {
        order_rows: order_rows.len(),
        attendee_rows: attendee_rows.len(),
        events: events.events.len(),
        sessions: events.sessions.len(),
        session_links: events.session_sources.len(),
        orders: orders.orders.len(),
        tickets: tickets.len(),
        watermark,
        dry_run: client.is_dry_run(),
    })
}
