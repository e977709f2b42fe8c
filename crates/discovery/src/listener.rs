//! Broadcast-Listener – empfaengt Ankuendigungen des Controllers
//!
//! Bindet einen UDP-Socket (mit Adress-/Port-Wiederverwendung), liest jedes
//! Datagramm als eine Nachricht und leitet erfolgreich dekodierte
//! Ankuendigungen an den Besitzer weiter.
//!
//! ## Ablauf
//!
//! ```text
//! UDP Socket (recv_from)
//!     |
//!     v
//! leer? -> verwerfen
//!     |
//!     v
//! decode_announcement()  <- Fehler: verwerfen (debug)
//!     |
//!     v
//! announce_tx (mpsc)     -> Besitzer (BarrierSession)
//! ```
//!
//! Der Empfang laeuft in einem eigenen Task. Der Besitzer darf keine Annahme
//! darueber treffen, auf welchem Kontext die Ankuendigung ankommt.

use parking_lot::Mutex;
use schranke_protocol::{decode_announcement, Announcement};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};

use crate::error::{DiscoveryError, DiscoveryResult};

/// Fester Discovery-Port des Controllers
pub const DISCOVERY_PORT: u16 = 30001;

/// Empfangspuffer; Ankuendigungen sind wenige hundert Byte gross
const UDP_BUFFER_SIZE: usize = 8192;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Konfiguration fuer den Broadcast-Listener
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind-Adresse (Standard: 0.0.0.0:30001)
    pub bind_addr: SocketAddr,
}

impl ListenerConfig {
    /// Erstellt eine Konfiguration fuer eine beliebige Bind-Adresse
    pub fn neu(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }

    /// Lauscht auf allen IPv4-Schnittstellen auf `port`
    pub fn auf_port(port: u16) -> Self {
        Self::neu(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::auf_port(DISCOVERY_PORT)
    }
}

// ---------------------------------------------------------------------------
// BroadcastListener
// ---------------------------------------------------------------------------

/// Laufender Empfangs-Task
struct ListenerHandle {
    lokale_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    _task: tokio::task::JoinHandle<()>,
}

/// Passiver UDP-Listener fuer Ankuendigungen
///
/// Haelt nur den Sender-Kanal zum Besitzer, keine Referenz auf ihn.
pub struct BroadcastListener {
    announce_tx: mpsc::UnboundedSender<Announcement>,
    aktiv: Mutex<Option<ListenerHandle>>,
}

impl BroadcastListener {
    /// Erstellt einen inaktiven Listener
    pub fn neu(announce_tx: mpsc::UnboundedSender<Announcement>) -> Self {
        Self {
            announce_tx,
            aktiv: Mutex::new(None),
        }
    }

    /// Bindet den Socket und startet den Empfangs-Task
    ///
    /// Muss innerhalb einer tokio-Runtime aufgerufen werden. Ein Bind-Fehler
    /// wird geloggt und zurueckgegeben; der Listener bleibt dann inaktiv.
    /// Laeuft der Listener bereits, wird die bestehende Adresse geliefert.
    pub fn start(&self, config: &ListenerConfig) -> DiscoveryResult<SocketAddr> {
        let mut aktiv = self.aktiv.lock();
        if let Some(handle) = aktiv.as_ref() {
            return Ok(handle.lokale_addr);
        }

        let socket = match bind_wiederverwendbar(config.bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(
                    addr = %config.bind_addr,
                    fehler = %e,
                    "Discovery-Socket konnte nicht gebunden werden, Listener bleibt inaktiv"
                );
                return Err(DiscoveryError::Bind {
                    addr: config.bind_addr,
                    quelle: e,
                });
            }
        };
        let lokale_addr = socket.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(empfangs_loop(
            socket,
            self.announce_tx.clone(),
            shutdown_rx,
        ));

        tracing::info!(addr = %lokale_addr, "Broadcast-Listener bereit");

        *aktiv = Some(ListenerHandle {
            lokale_addr,
            shutdown_tx,
            _task: task,
        });
        Ok(lokale_addr)
    }

    /// Stoppt den Empfang. Mehrfacher Aufruf ist unschaedlich.
    pub fn stop(&self) {
        if let Some(handle) = self.aktiv.lock().take() {
            let _ = handle.shutdown_tx.send(());
            tracing::info!(addr = %handle.lokale_addr, "Broadcast-Listener gestoppt");
        }
    }

    /// `true` solange der Empfangs-Task laeuft
    pub fn is_active(&self) -> bool {
        self.aktiv.lock().is_some()
    }

    /// Gebundene Adresse (None wenn inaktiv)
    pub fn lokale_adresse(&self) -> Option<SocketAddr> {
        self.aktiv.lock().as_ref().map(|h| h.lokale_addr)
    }
}

impl Drop for BroadcastListener {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Internes
// ---------------------------------------------------------------------------

/// Bindet einen UDP-Socket mit SO_REUSEADDR (und SO_REUSEPORT auf Unix),
/// damit ein Neustart nicht auf das Freiwerden des alten Binds warten muss.
fn bind_wiederverwendbar(addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port(true)?;
    socket.set_broadcast(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    UdpSocket::from_std(socket.into())
}

/// Empfangs-Loop: laeuft bis zum Shutdown-Signal oder bis der Besitzer
/// den Empfangskanal schliesst
async fn empfangs_loop(
    socket: UdpSocket,
    announce_tx: mpsc::UnboundedSender<Announcement>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut buf = [0u8; UDP_BUFFER_SIZE];

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, absender)) => {
                        let Some(announcement) = datagramm_verarbeiten(&buf[..len], absender) else {
                            continue;
                        };
                        if announce_tx.send(announcement).is_err() {
                            tracing::debug!("Besitzer nicht mehr erreichbar, Listener endet");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(fehler = %e, "UDP-Empfangsfehler");
                        // Busy-Loop bei persistentem Fehler vermeiden
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    }
                }
            }

            _ = &mut shutdown_rx => break,
        }
    }

    tracing::debug!("Discovery-Empfangs-Loop beendet");
}

/// Dekodiert ein Datagramm; leere und ungueltige werden verworfen
fn datagramm_verarbeiten(daten: &[u8], absender: SocketAddr) -> Option<Announcement> {
    if daten.is_empty() {
        tracing::debug!(absender = %absender, "Leeres Datagramm verworfen");
        return None;
    }

    match decode_announcement(daten) {
        Ok(announcement) => {
            tracing::debug!(
                absender = %absender,
                device_id = ?announcement.device_id,
                ws_host = ?announcement.ws_host,
                "Ankuendigung empfangen"
            );
            Some(announcement)
        }
        Err(e) => {
            tracing::debug!(
                absender = %absender,
                bytes = daten.len(),
                fehler = %e,
                "Ungueltiges Datagramm verworfen"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absender() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40000)
    }

    #[test]
    fn standard_port() {
        assert_eq!(ListenerConfig::default().bind_addr.port(), DISCOVERY_PORT);
        assert!(ListenerConfig::default().bind_addr.ip().is_unspecified());
    }

    #[test]
    fn leeres_datagramm_wird_verworfen() {
        assert!(datagramm_verarbeiten(b"", absender()).is_none());
    }

    #[test]
    fn rauschen_wird_verworfen() {
        assert!(datagramm_verarbeiten(b"M-SEARCH * HTTP/1.1", absender()).is_none());
        assert!(datagramm_verarbeiten(&[0u8; 16], absender()).is_none());
    }

    #[test]
    fn gueltige_ankuendigung_wird_weitergegeben() {
        let a = datagramm_verarbeiten(br#"{"ws_host":"ws://h:1"}"#, absender()).unwrap();
        assert_eq!(a.endpoint(), Some("ws://h:1"));
    }

    #[test]
    fn ankuendigung_ohne_endpunkt_wird_weitergegeben() {
        // Filtern nach Endpunkt ist Sache des Besitzers
        let a = datagramm_verarbeiten(br#"{"device_id":"d1"}"#, absender()).unwrap();
        assert!(a.endpoint().is_none());
    }
}
