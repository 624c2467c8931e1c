use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ward_core::{BackendKind, CoreConfig, InMemoryBackend, PatientStore, PatientsBackend};
use ward_postgrest::PostgrestBackend;

mod commands;

use commands::Cli;

/// Main entry point for the ward CLI
///
/// Resolves configuration once, builds the backend and the patient store, then runs a single
/// command against the store.
///
/// # Environment Variables
/// - `WARD_BACKEND`: `postgrest` (default) or `memory`
/// - `WARD_BACKEND_URL`: REST root of the hosted database (required for `postgrest`)
/// - `WARD_BACKEND_KEY`: API key sent with every request (required for `postgrest`)
/// - `WARD_DB_SCHEMA`: database schema (default: "public")
///
/// # Errors
/// Returns an error if configuration is invalid or the command's store operation fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("ward=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let store = PatientStore::new(build_backend()?);
    let _changes = store.subscribe(|| tracing::debug!("patient store changed"));

    commands::run(cli, &store).await
}

fn build_backend() -> anyhow::Result<Arc<dyn PatientsBackend>> {
    let kind: BackendKind = std::env::var("WARD_BACKEND")
        .unwrap_or_default()
        .parse()?;

    let backend: Arc<dyn PatientsBackend> = match kind {
        BackendKind::Memory => {
            tracing::warn!("-- Using in-memory backend, nothing will be persisted");
            Arc::new(InMemoryBackend::new())
        }
        BackendKind::Postgrest => {
            let url = std::env::var("WARD_BACKEND_URL").context("WARD_BACKEND_URL is not set")?;
            let key = std::env::var("WARD_BACKEND_KEY").context("WARD_BACKEND_KEY is not set")?;
            let schema = std::env::var("WARD_DB_SCHEMA").ok();

            let cfg = CoreConfig::new(&url, &key, schema.as_deref())?;
            tracing::info!("-- Using PostgREST backend at {}", cfg.backend_url());
            Arc::new(PostgrestBackend::new(&cfg))
        }
    };

    Ok(backend)
}
