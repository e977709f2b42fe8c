//! schranke-stream – persistente WebSocket-Verbindung zum Controller
//!
//! Der [`StreamClient`] meldet alle Ereignisse als [`StreamNotification`]
//! ueber einen Kanal an seinen Besitzer. Es gibt keine eingebaute
//! Wiederverbindung: `Disconnected` ist rein informativ.

pub mod client;
pub mod error;

pub use client::{endpunkt_pruefen, StreamClient, StreamConfig, StreamNotification};
pub use error::{StreamError, StreamResult};
