use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ticketing_ingest::cli::{import, validate};
use ticketing_ingest::database_ops::supabase_rest::DEFAULT_CHUNK_SIZE;
use ticketing_ingest::logging::init_tracing;
use ticketing_ingest::util::env as env_util;

#[derive(Parser, Debug)]
#[command(name = "ticketing", version, about = "Ticketing export ingest CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Import Eventbrite Orders/Attendees CSV exports into Supabase
    Import {
        /// Path to the Eventbrite Orders export
        #[arg(long, default_value = "EVENTBRITE - ORDERS.csv")]
        orders: PathBuf,
        /// Path to the Eventbrite Attendees export
        #[arg(long, default_value = "EVENTBRITE - ATTENDEES.csv")]
        attendees: PathBuf,
        /// Path to the Eventbrite Sales summary export (accepted, not imported)
        #[arg(long)]
        sales: Option<PathBuf>,
        /// Supabase project URL (env SUPABASE_URL / SUPABASE_PROJECT_URL fallback)
        #[arg(long)]
        supabase_url: Option<String>,
        /// Supabase service role key (env SUPABASE_SERVICE_ROLE_KEY fallback)
        #[arg(long)]
        supabase_key: Option<String>,
        /// Rows per upsert batch
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// Parse and summarise without writing
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Check Orders (and optionally Sales) exports before importing
    Validate {
        /// Path to the Eventbrite Orders export
        #[arg(long, default_value = "EVENTBRITE - ORDERS.csv")]
        orders: PathBuf,
        /// Path to the Eventbrite Sales summary export
        #[arg(long)]
        sales: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info")?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Import {
            orders,
            attendees,
            sales,
            supabase_url,
            supabase_key,
            chunk_size,
            dry_run,
        } => {
            import::run(import::ImportConfig {
                orders,
                attendees,
                sales,
                supabase_url,
                supabase_key,
                chunk_size,
                dry_run,
            })
            .await?;
        }
        Commands::Validate { orders, sales } => {
            validate::run(validate::ValidateConfig { orders, sales })?;
        }
    }
    Ok(())
}
