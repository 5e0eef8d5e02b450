use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::util::env as env_util;

pub const DEFAULT_CHUNK_SIZE: usize = 200;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 100;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Merge on conflict and skip echoing rows back.
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";
const ERROR_BODY_MAX: usize = 2000;

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

/// Sink for one upsert batch. A non-2xx answer must surface as `Err`.
#[async_trait::async_trait]
pub trait BatchWriter: Send + Sync {
    async fn write_batch(&self, table: &str, on_conflict: &str, batch: &[Value]) -> Result<()>;
}

/// PostgREST endpoint of a Supabase project, authenticated with the
/// service-role key.
pub struct SupabaseRest {
    base_url: String,
    api_key: String,
    http: Client,
}

impl SupabaseRest {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: Option<u64>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        url::Url::parse(&base_url).with_context(|| format!("invalid Supabase URL {base_url:?}"))?;
        let timeout_secs = timeout_secs.unwrap_or_else(|| {
            env_util::env_parse("SUPABASE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)
        });
        let http = Client::builder()
            .user_agent(concat!("ticketing-ingest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            http,
        })
    }

    /// `{base}/rest/v1/{table}?on_conflict={columns}`
    pub fn endpoint(&self, table: &str, on_conflict: &str) -> String {
        format!(
            "{}/rest/v1/{}?on_conflict={}",
            self.base_url,
            table,
            urlencoding::encode(on_conflict)
        )
    }
}

#[async_trait::async_trait]
impl BatchWriter for SupabaseRest {
    async fn write_batch(&self, table: &str, on_conflict: &str, batch: &[Value]) -> Result<()> {
        let url = self.endpoint(table, on_conflict);
        let resp = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", PREFER_UPSERT)
            .json(batch)
            .send()
            .await
            .with_context(|| format!("Supabase upsert request failed for {table}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), ERROR_BODY_MAX);
            bail!("Supabase upsert failed for {table}: {status} {body}");
        }
        Ok(())
    }
}

/// Outcome of one collection's upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertReport {
    pub table: String,
    pub rows: usize,
    pub batches: usize,
    pub sent: usize,
    pub dry_run: bool,
}

/// Splits records into fixed-size batches and hands them to a `BatchWriter`
/// one at a time, pausing between batches.
pub struct UpsertClient<W> {
    writer: W,
    chunk_size: usize,
    batch_delay: Duration,
    dry_run: bool,
}

impl<W: BatchWriter> UpsertClient<W> {
    pub fn new(writer: W, chunk_size: usize, dry_run: bool) -> Self {
        let delay_ms = env_util::env_parse("SUPABASE_BATCH_DELAY_MS", DEFAULT_BATCH_DELAY_MS);
        Self {
            writer,
            chunk_size: chunk_size.max(1),
            batch_delay: Duration::from_millis(delay_ms),
            dry_run,
        }
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn upsert<T: Serialize>(
        &self,
        table: &str,
        rows: &[T],
        on_conflict: &str,
    ) -> Result<UpsertReport> {
        self.upsert_chunked(table, rows, on_conflict, self.chunk_size)
            .await
    }

    /// Upsert with an explicit batch size. The first failing batch aborts the
    /// rest; batches already sent stay written.
    pub async fn upsert_chunked<T: Serialize>(
        &self,
        table: &str,
        rows: &[T],
        on_conflict: &str,
        chunk_size: usize,
    ) -> Result<UpsertReport> {
        let chunk_size = chunk_size.max(1);
        let total = rows.len();
        let batches = total.div_ceil(chunk_size);
        let mut report = UpsertReport {
            table: table.to_string(),
            rows: total,
            batches,
            sent: 0,
            dry_run: self.dry_run,
        };
        if rows.is_empty() {
            debug!(table, "nothing to upsert");
            return Ok(report);
        }

        if self.dry_run {
            info!(
                table,
                rows = total,
                batches,
                chunk_size,
                "[dry-run] Would upsert {total} rows into {table}"
            );
            return Ok(report);
        }

        for (idx, chunk) in rows.chunks(chunk_size).enumerate() {
            if idx > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            let batch = chunk
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<Value>, _>>()
                .with_context(|| format!("serialize batch {} for {table}", idx + 1))?;
            self.writer
                .write_batch(table, on_conflict, &batch)
                .await
                .with_context(|| {
                    format!(
                        "upsert into {table} aborted at batch {}/{batches} ({}/{total} rows sent)",
                        idx + 1,
                        report.sent
                    )
                })?;
            report.sent += chunk.len();
            debug!(table, batch = idx + 1, batches, sent = report.sent, "batch written");
        }

        info!(table, rows = total, batches, "Upserted {}/{total} rows into {table}", report.sent);
        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingWriter;
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({ "source_id": i.to_string() })).collect()
    }

    fn client(writer: RecordingWriter, chunk: usize, dry_run: bool) -> UpsertClient<RecordingWriter> {
        UpsertClient::new(writer, chunk, dry_run).with_batch_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn splits_into_fixed_batches() {
        let c = client(RecordingWriter::default(), 200, false);
        let report = c.upsert("orders_eventbrite", &rows(450), "source_id").await.unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(report.sent, 450);
        let calls = c.writer().calls.lock().unwrap().clone();
        let sizes: Vec<usize> = calls.iter().map(|(_, _, n)| *n).collect();
        assert_eq!(sizes, vec![200, 200, 50]);
        assert!(calls.iter().all(|(t, k, _)| t == "orders_eventbrite" && k == "source_id"));
    }

    #[tokio::test]
    async fn empty_is_a_noop() {
        let c = client(RecordingWriter::default(), 200, false);
        let report = c.upsert::<Value>("events_htx", &[], "source,source_id").await.unwrap();
        assert_eq!(report.batches, 0);
        assert!(c.writer().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dry_run_never_writes() {
        let c = client(RecordingWriter::default(), 100, true);
        let report = c.upsert("tickets_eventbrite", &rows(250), "source_id").await.unwrap();
        assert!(report.dry_run);
        assert_eq!(report.batches, 3);
        assert_eq!(report.sent, 0);
        assert!(c.writer().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_aborts_remaining_batches() {
        let writer = RecordingWriter {
            fail_from_call: Some(2),
            ..Default::default()
        };
        let c = client(writer, 10, false);
        let err = c.upsert("orders_eventbrite", &rows(35), "source_id").await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("aborted at batch 2/4"));
        assert!(msg.contains("409"));
        assert_eq!(c.writer().calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn endpoint_encodes_conflict_columns() {
        let rest = SupabaseRest::new("https://abc.supabase.co/", "key", Some(5)).unwrap();
        assert_eq!(
            rest.endpoint("events_htx", "source,source_id"),
            "https://abc.supabase.co/rest/v1/events_htx?on_conflict=source%2Csource_id"
        );
        assert!(SupabaseRest::new("not a url", "key", Some(5)).is_err());
    }

    #[test]
    fn truncates_on_char_boundary() {
        let s = truncate_for_log("ééé".to_string(), 3);
        assert_eq!(s, "é…");
    }
}
