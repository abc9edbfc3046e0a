//! BotDesk CLI and REST API entry point.
//!
//! Binary name: `botdesk`
//!
//! Parses CLI arguments, initializes database and services, then starts the
//! REST API server or runs a management command.

mod http;
mod state;

use clap::{Parser, Subcommand};
use rand::RngCore;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use state::AppState;

#[derive(Parser)]
#[command(name = "botdesk", about = "Streaming chat relay and widget delivery server")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Generate a dashboard API key for a tenant (printed once)
    CreateKey {
        /// Tenant the key is scoped to
        #[arg(long)]
        tenant: Uuid,
        /// Display name for the key
        #[arg(long, default_value = "default")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,botdesk=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} BotDesk API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::CreateKey { tenant, name } => {
            let key = create_api_key(&state, tenant, &name).await?;
            println!();
            println!(
                "  {} API key for tenant {} (save this -- it won't be shown again):",
                console::style("🔑").bold(),
                console::style(tenant).cyan()
            );
            println!();
            println!("  {}", console::style(&key).yellow().bold());
            println!();
        }
    }

    Ok(())
}

/// Generate a new API key, store its SHA-256 hash, and return the plaintext.
async fn create_api_key(state: &AppState, tenant: Uuid, name: &str) -> anyhow::Result<String> {
    let mut key_bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key_bytes);
    let plaintext = format!(
        "bdsk_{}",
        key_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    );

    let key_hash = http::extractors::auth::hash_api_key(&plaintext);
    let id = Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO api_keys (id, tenant_id, name, key_hash, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(tenant.to_string())
    .bind(name)
    .bind(&key_hash)
    .bind(&now)
    .execute(&state.db_pool.writer)
    .await?;

    Ok(plaintext)
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
