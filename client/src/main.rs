//! Schranke Client – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Client.

use anyhow::Result;
use schranke_client::{config::ClientConfig, App};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("SCHRANKE_CONFIG").unwrap_or_else(|_| "schranke.toml".into());

    let config = ClientConfig::laden(&config_pfad)?;

    schranke_observability::logging_initialisieren(&config.logging.level, &config.logging.format)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Schranke Client wird initialisiert"
    );

    App::neu(config).starten().await
}
