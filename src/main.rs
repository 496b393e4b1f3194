use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memento::api;
use memento::config::MementoConfig;
use memento::db::Database;
use memento::memento::{render_time_map, NegotiationResponder};
use memento::models::{RevisionTimeline, Title};
use memento::store::WikiRevisionStore;

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "memento")]
#[command(about = "Memento (RFC 7089) TimeGate and TimeMap server for wiki revisions")]
struct Cli {
    /// Path to the SQLite database (defaults to the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Print the TimeMap of a stored page
    Timemap {
        /// Page title, e.g. "Main Page"
        title: String,
    },
    /// Run datetime negotiation for a page and print the outcome
    Negotiate {
        /// Page title, e.g. "Main Page"
        title: String,

        /// Accept-Datetime value, e.g. "Sat, 10 Aug 2013 00:00:00 GMT"
        #[arg(short = 'd', long)]
        datetime: Option<String>,
    },
}

/// Initialize tracing. Logs go to stderr so the one-shot commands keep
/// stdout for their output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "memento=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(path: Option<PathBuf>) -> anyhow::Result<Database> {
    let db = match path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(db: Database, port: u16) -> anyhow::Result<()> {
    let config = MementoConfig::from_env(port);
    tracing::info!(
        "Serving Mementos under {} ({:?} negotiation)",
        config.urls.base_url(),
        config.mode
    );

    let app = api::create_router(db, config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Memento server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Resolve a page for the one-shot commands.
fn lookup(
    db: Database,
    raw_title: &str,
) -> anyhow::Result<(WikiRevisionStore, Title, RevisionTimeline)> {
    let config = MementoConfig::from_env(DEFAULT_PORT);
    let store = WikiRevisionStore::from_config(db, &config);
    let title = Title::parse(raw_title)?;
    let (_, timeline) = store
        .lookup(&title)?
        .with_context(|| format!("Page {} not found or not included", title))?;
    Ok((store, title, timeline))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let db = open_database(cli.db)?;

    match cli.command {
        Some(Commands::Serve { port }) => serve(db, port).await?,
        Some(Commands::Timemap { title }) => {
            let (store, title, timeline) = lookup(db, &title)?;
            let original = store.original_resource(&title);
            print!("{}", render_time_map(&original, &timeline)?);
        }
        Some(Commands::Negotiate { title, datetime }) => {
            let (store, title, timeline) = lookup(db, &title)?;
            let original = store.original_resource(&title);
            let responder = NegotiationResponder::new(MementoConfig::from_env(DEFAULT_PORT).mode);
            let response = responder.respond(&original, &timeline, datetime.as_deref())?;

            println!("HTTP {}", response.status);
            for (name, value) in &response.headers {
                println!("{}: {}", name, value);
            }
        }
        None => serve(db, DEFAULT_PORT).await?,
    }

    Ok(())
}
