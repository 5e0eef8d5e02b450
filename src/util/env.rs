//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each command (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Project URL keys, tried in order.
pub const SUPABASE_URL_KEYS: [&str; 2] = ["SUPABASE_URL", "SUPABASE_PROJECT_URL"];
pub const SUPABASE_KEY_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_err() {
            // Fallback to the crate root so `cargo run` from elsewhere still works.
            let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
            let _ = dotenv::from_filename(candidate);
        }
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// First populated value among `keys`, in order.
pub fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| env_opt(k))
}

/// Supabase project URL from the first populated env key.
pub fn supabase_url() -> Option<String> {
    env_first(&SUPABASE_URL_KEYS)
}

/// Service-role key used for PostgREST writes.
pub fn supabase_key() -> Option<String> {
    env_opt(SUPABASE_KEY_KEY)
}

pub(crate) fn redact_value(key: &str, val: &str) -> String {
    let k = key.to_ascii_uppercase();
    if k.contains("PASSWORD")
        || k.contains("SECRET")
        || k.contains("KEY")
        || k.contains("TOKEN")
    {
        return if val.trim().is_empty() {
            String::new()
        } else {
            "***".to_string()
        };
    }

    // Strip credentials embedded in URLs before they reach the log.
    let val_trim = val.trim();
    if let Ok(mut u) = url::Url::parse(val_trim) {
        if !u.username().is_empty() || u.password().is_some() {
            let _ = u.set_username("***");
            let _ = u.set_password(Some("***"));
            return u.to_string();
        }
    }

    val_trim.to_string()
}

/// Log a consolidated, redacted snapshot of the given `(name, value)` pairs.
/// Returns error naming every required entry that is missing.
pub fn preflight_check(
    title: &str,
    entries: &[(&str, Option<&str>)],
    required: &[&str],
) -> anyhow::Result<()> {
    let snapshot: Vec<(String, String)> = entries
        .iter()
        .map(|(k, v)| (k.to_string(), redact_value(k, v.unwrap_or_default())))
        .collect();
    info!(target: "preflight", title, snapshot = ?snapshot, "configuration snapshot");

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| {
            entries
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| *v)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .collect();
    if !missing.is_empty() {
        return Err(anyhow::anyhow!("missing required configuration: {:?}", missing));
    }
    Ok(())
}
