//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable, die Vorrang vor der Konfiguration
//! hat:
//! - `SCHRANKE_LOG_LEVEL`: Filter-Direktive (z.B. `debug` oder
//!   `schranke_session=trace,info`), Standard: info
//! - `SCHRANKE_LOG_FORMAT`: Format (text/json), Standard: text

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_LEVEL: &str = "SCHRANKE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "SCHRANKE_LOG_FORMAT";

/// Fehler beim Initialisieren des Loggings
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Unbekanntes Log-Format: {0} (erlaubt: text, json)")]
    UnbekanntesFormat(String),

    #[error("Globaler Subscriber konnte nicht gesetzt werden: {0}")]
    Subscriber(String),
}

/// Ausgabeformat der Logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            andere => Err(LoggingError::UnbekanntesFormat(andere.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Initialisiert das Logging-System.
///
/// `level` und `format` stammen aus der Konfiguration; gesetzte
/// Umgebungsvariablen gewinnen. Ein ungueltiger Level faellt auf `info`
/// zurueck, ein ungueltiges Format ist ein Fehler.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<(), LoggingError> {
    let filter = filter_bauen(std::env::var(ENV_LOG_LEVEL).ok(), level);
    let direktive = filter.to_string();
    let format: LogFormat = std::env::var(ENV_LOG_FORMAT)
        .unwrap_or_else(|_| format.to_string())
        .parse()?;

    let ergebnis = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    ergebnis.map_err(|e| LoggingError::Subscriber(e.to_string()))?;
    tracing::debug!(format = %format, filter = %direktive, "Logging initialisiert");
    Ok(())
}

fn filter_bauen(aus_env: Option<String>, konfiguriert: &str) -> EnvFilter {
    aus_env
        .and_then(|direktive| EnvFilter::try_new(direktive).ok())
        .or_else(|| EnvFilter::try_new(konfiguriert).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Validiert ob ein Log-Level bzw. eine Filter-Direktive gueltig ist.
///
/// Akzeptiert alles, was auch `logging_initialisieren` ohne Rueckfall
/// uebernimmt, z.B. `debug` oder `schranke_session=trace,info`.
pub fn log_level_gueltig(level: &str) -> bool {
    !level.trim().is_empty() && EnvFilter::try_new(level).is_ok()
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level), "{level}");
        }
    }

    #[test]
    fn log_level_direktiven_sind_gueltig() {
        assert!(log_level_gueltig("schranke_session=trace,info"));
        assert!(log_level_gueltig("warn,schranke_stream=debug"));
    }

    #[test]
    fn log_level_ungueltige_werte() {
        assert!(!log_level_gueltig("schranke=laut"));
        assert!(!log_level_gueltig(""));
        assert!(!log_level_gueltig("   "));
    }

    #[test]
    fn log_format_parsen() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(LoggingError::UnbekanntesFormat(f)) if f == "xml"
        ));
        assert!(!log_format_gueltig("JSON"));
        assert_eq!(LogFormat::default().to_string(), "text");
    }

    #[test]
    fn umgebung_hat_vorrang() {
        let filter = filter_bauen(Some("debug".into()), "warn");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn konfiguration_ohne_umgebung() {
        let filter = filter_bauen(None, "schranke_session=trace,warn");
        assert!(filter.to_string().contains("schranke_session=trace"));
    }

    #[test]
    fn ungueltige_direktive_faellt_zurueck() {
        let filter = filter_bauen(Some("schranke=laut".into()), "schranke=sehr");
        assert_eq!(filter.to_string(), "info");
    }
}
