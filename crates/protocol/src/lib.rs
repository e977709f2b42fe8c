//! schranke-protocol – Nachrichten-Codec
//!
//! Dekodiert die beiden Nachrichtenformate des Schranken-Controllers:
//! - [`announcement`] – UDP-Broadcast mit dem WebSocket-Endpunkt
//! - [`event`] – Text-Frames auf dem Stream (`GATE_STATUS`, `GATE_UPDATE`)
//!
//! Alle Eingaben gelten als nicht vertrauenswuerdig. Jedes optionale Feld
//! faellt einzeln auf `None` zurueck, nur eine unbrauchbare Top-Level-Struktur
//! fuehrt zu einem [`CodecError`].

pub mod announcement;
pub mod error;
pub mod event;

mod felder;

pub use announcement::{decode_announcement, Announcement};
pub use error::{CodecError, CodecResult};
pub use event::{decode_stream_event, EventKind, GatePayload, StreamEvent};
