use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::supabase_rest::{BatchWriter, UpsertClient};
use crate::normalization::to_utc_iso;

pub const SYNC_STATE_TABLE: &str = "sync_state";
pub const SYNC_STATE_CONFLICT: &str = "key";
/// Read by the incremental Eventbrite sync to bound its next fetch.
pub const SYNC_STATE_KEY: &str = "eventbrite:lastSync";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStateRow {
    pub key: &'static str,
    pub value: String,
    pub updated_at: String,
}

/// Persist `latest` as the Eventbrite watermark. Returns the stored value.
/// In dry-run mode nothing is written and the value is only reported.
pub async fn update_sync_state<W: BatchWriter>(
    client: &UpsertClient<W>,
    latest: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<String> {
    let value = to_utc_iso(&latest);
    let row = SyncStateRow {
        key: SYNC_STATE_KEY,
        value: value.clone(),
        updated_at: to_utc_iso(&now),
    };
    client
        .upsert_chunked(SYNC_STATE_TABLE, &[row], SYNC_STATE_CONFLICT, 1)
        .await?;
    if client.is_dry_run() {
        info!(watermark = %value, "[dry-run] sync_state would be set to {value}");
    } else {
        info!(watermark = %value, "Updated sync_state to {value}");
    }
    Ok(value)
}
