use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

use crate::database_ops::eventbrite::{run_import, ImportInputs, ImportSummary};
use crate::database_ops::supabase_rest::{SupabaseRest, UpsertClient};
use crate::util::env as env_util;

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub orders: PathBuf,
    pub attendees: PathBuf,
    pub sales: Option<PathBuf>,
    /// Overrides SUPABASE_URL / SUPABASE_PROJECT_URL.
    pub supabase_url: Option<String>,
    /// Overrides SUPABASE_SERVICE_ROLE_KEY.
    pub supabase_key: Option<String>,
    pub chunk_size: usize,
    pub dry_run: bool,
}

/// A non-blank flag wins; otherwise fall through to the environment.
fn resolve_flag(flag: Option<&str>, env: impl FnOnce() -> Option<String>) -> Option<String> {
    flag.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(env)
}

pub async fn run(cfg: ImportConfig) -> Result<ImportSummary> {
    env_util::init_env();
    let supabase_url = resolve_flag(cfg.supabase_url.as_deref(), env_util::supabase_url);
    let supabase_key = resolve_flag(cfg.supabase_key.as_deref(), env_util::supabase_key);

    let chunk_size = cfg.chunk_size.to_string();
    let dry_run = cfg.dry_run.to_string();
    env_util::preflight_check(
        "eventbrite_import",
        &[
            ("supabase_url", supabase_url.as_deref()),
            ("supabase_key", supabase_key.as_deref()),
            ("chunk_size", Some(chunk_size.as_str())),
            ("dry_run", Some(dry_run.as_str())),
        ],
        &["supabase_url", "supabase_key"],
    )
    .map_err(|e| {
        anyhow::anyhow!(
            "Supabase URL and service role key are required (use --supabase-url/--supabase-key or SUPABASE_URL/SUPABASE_SERVICE_ROLE_KEY): {e}"
        )
    })?;
    let (Some(url), Some(key)) = (supabase_url, supabase_key) else {
        anyhow::bail!("Supabase URL and service role key are required");
    };

    let rest = SupabaseRest::new(&url, &key, None)?;
    let client = UpsertClient::new(rest, cfg.chunk_size, cfg.dry_run);
    let inputs = ImportInputs {
        orders: cfg.orders,
        attendees: cfg.attendees,
        sales: cfg.sales,
    };

    let summary = run_import(&inputs, &client, Utc::now()).await?;
    if summary.dry_run {
        info!("Dry run complete - no changes were written to Supabase.");
    }
    Ok(summary)
}
