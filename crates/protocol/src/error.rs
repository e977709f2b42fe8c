//! Fehlertypen fuer den Codec

use thiserror::Error;

/// Warum eine Nutzlast nicht als Nachricht erkannt wurde
#[derive(Debug, Error)]
pub enum CodecError {
    /// Leere Eingabe (oder nur Whitespace)
    #[error("Leere Nachricht")]
    Leer,

    /// Top-Level ist gueltiges JSON, aber kein Objekt
    #[error("Kein JSON-Objekt")]
    KeinObjekt,

    /// Objekt ohne eines der bekannten Felder
    #[error("Unbekannte Nachrichtenstruktur")]
    UnbekannteStruktur,

    /// Kein gueltiges JSON
    #[error("Ungueltiges JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result-Typ fuer den Codec
pub type CodecResult<T> = Result<T, CodecError>;
