//! Fehlertypen fuer die Session

use schranke_stream::StreamError;
use thiserror::Error;

/// Fehlertyp fuer die Barrier-Session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Endpunkt wurde abgelehnt
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Session wurde bereits beendet
    #[error("Session ist beendet")]
    Beendet,
}

/// Result-Typ fuer die Session
pub type SessionResult<T> = Result<T, SessionError>;
