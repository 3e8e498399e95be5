use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use contact_sync::config::DatabaseConfig;
use contact_sync::db::ContactDb;
use contact_sync::error::SyncError;
use contact_sync::exit_codes::{self, EXIT_ERROR};
use contact_sync::reconcile::{RunSummary, UpsertStrategy};

#[derive(Parser, Debug)]
#[command(
    name = "contact-sync",
    about = "Insert or update email contacts from a CSV export in one transaction"
)]
struct Args {
    /// CSV export with `Reply-To Email`, `From Email`, `Name` and `Mobile Number` columns.
    #[arg(default_value = "FinalOutput.csv")]
    csv_path: PathBuf,

    /// Connection string; overrides `DATABASE_URL` and the `DB_*` variables.
    #[arg(long)]
    database_url: Option<String>,

    /// Upper bound on pooled connections; overrides `DB_POOL_MAX`.
    #[arg(long)]
    max_connections: Option<u32>,

    /// How each contact is written.
    #[arg(long, value_enum, default_value_t = UpsertStrategy::CheckThenWrite)]
    strategy: UpsertStrategy,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info,sqlx=warn"))
        .format_timestamp(None)
        .init();

    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            log::warn!("failed to load .env: {}", err);
        }
    }

    let args = Args::parse();
    log::info!("starting contact sync for {}", args.csv_path.display());

    let summary = match run(&args).await {
        Ok(summary) => summary,
        Err(err) => {
            log::error!("contact sync failed: {}", err);
            return ExitCode::from(exit_codes::for_error(&err));
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                log::error!("failed to serialize summary: {}", err);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        print!("{summary}");
    }

    ExitCode::SUCCESS
}

async fn run(args: &Args) -> Result<RunSummary, SyncError> {
    let mut config = DatabaseConfig::from_lookup(|key| match (key, &args.database_url) {
        ("DATABASE_URL", Some(url)) => Some(url.clone()),
        _ => std::env::var(key).ok(),
    })?;
    if let Some(max) = args.max_connections {
        config = config.with_max_connections(max);
    }

    let db = ContactDb::open(&config)?;
    let outcome = contact_sync::sync_file(&db, &args.csv_path, args.strategy).await;
    db.close().await;

    outcome
}
