//! Fehlertypen fuer die Discovery

use std::net::SocketAddr;
use thiserror::Error;

/// Fehlertyp fuer Listener und Beacon
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket konnte nicht gebunden werden
    #[error("UDP-Bind auf {addr} fehlgeschlagen: {quelle}")]
    Bind {
        addr: SocketAddr,
        #[source]
        quelle: std::io::Error,
    },

    /// Sonstiger IO-Fehler
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

/// Result-Typ fuer die Discovery
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
