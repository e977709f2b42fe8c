//! Fehlertypen fuer den Stream-Client

use thiserror::Error;

/// Fehler beim Aufbau einer Stream-Verbindung
///
/// Laufzeitfehler der Verbindung selbst werden nicht als `Err` gemeldet,
/// sondern als `StreamNotification::TransportError`.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Endpunkt ist keine gueltige URL
    #[error("Ungueltiger Endpunkt '{url}': {grund}")]
    UngueltigeUrl { url: String, grund: String },

    /// URL-Schema wird nicht unterstuetzt (nur `ws`)
    #[error("Nicht unterstuetztes Schema '{0}' (erwartet: ws)")]
    NichtUnterstuetzt(String),
}

/// Result-Typ fuer den Stream-Client
pub type StreamResult<T> = Result<T, StreamError>;
