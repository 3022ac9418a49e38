//! Bestiary Engine - Main entry point.
//!
//! Usage: `bestiary-engine <input.json> [output.json]`

use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bestiary_engine::use_cases::{BestiaryService, BestiaryServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bestiary_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Positional arguments override the environment
    let mut config = BestiaryServiceConfig::from_env();
    let mut args = std::env::args().skip(1);
    if let Some(input) = args.next() {
        config.input = Some(PathBuf::from(input));
    }
    if let Some(output) = args.next() {
        config.output = PathBuf::from(output);
    }

    let service = BestiaryService::new(config);
    let report = service.run().await?;

    for failure in &report.failures {
        tracing::warn!(
            index = failure.index,
            name = failure.name.as_deref().unwrap_or("unnamed"),
            "Skipped record: {}",
            failure.reason
        );
    }
    tracing::info!(
        "Mapped {} of {} creatures to {}",
        report.mapped,
        report.total,
        service.config().output.display()
    );

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides, then the working directory.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
    let _ = dotenvy::dotenv();
}
