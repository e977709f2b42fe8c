//! schranke-discovery – Geraetesuche per UDP-Broadcast
//!
//! ## Module
//! - [`listener`] – Empfaengt Ankuendigungen auf Port 30001
//! - [`beacon`] – Sendet Ankuendigungen periodisch (Geraeteseite, Emulation)

pub mod beacon;
pub mod error;
pub mod listener;

pub use beacon::{Beacon, BeaconConfig};
pub use error::{DiscoveryError, DiscoveryResult};
pub use listener::{BroadcastListener, ListenerConfig, DISCOVERY_PORT};
