//! Beacon – sendet die Ankuendigung periodisch per UDP-Broadcast
//!
//! Geraeteseite der Discovery. Wird fuer lokale Emulation und die
//! Integrationstests genutzt.

use schranke_protocol::Announcement;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

use crate::error::DiscoveryResult;
use crate::listener::DISCOVERY_PORT;

/// Konfiguration fuer den Beacon
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    /// Zieladresse (Standard: 255.255.255.255:30001)
    pub ziel: SocketAddr,
    /// Sendeintervall (Standard: 2 s)
    pub intervall: Duration,
    /// Zu versendende Ankuendigung
    pub announcement: Announcement,
}

impl BeaconConfig {
    /// Broadcast an alle auf dem Standard-Port, alle 2 Sekunden
    pub fn neu(announcement: Announcement) -> Self {
        Self {
            ziel: SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), DISCOVERY_PORT),
            intervall: Duration::from_secs(2),
            announcement,
        }
    }
}

/// Laufender Beacon; beim Drop wird das Senden beendet
pub struct Beacon {
    shutdown_tx: Option<oneshot::Sender<()>>,
    _task: tokio::task::JoinHandle<()>,
}

impl Beacon {
    /// Oeffnet einen Sende-Socket und startet die Sende-Loop
    pub async fn starten(config: BeaconConfig) -> DiscoveryResult<Self> {
        let bind_ip = if config.ziel.is_ipv4() {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        };
        let socket = UdpSocket::bind(SocketAddr::new(bind_ip, 0)).await?;
        socket.set_broadcast(true)?;

        tracing::info!(
            ziel = %config.ziel,
            intervall_ms = config.intervall.as_millis() as u64,
            "Beacon gestartet"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(sende_loop(socket, config, shutdown_rx));

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            _task: task,
        })
    }

    /// Beendet das Senden. Mehrfacher Aufruf ist unschaedlich.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Beacon {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sende_loop(
    socket: UdpSocket,
    config: BeaconConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let datagramm = config.announcement.to_datagram();
    let mut takt = tokio::time::interval(config.intervall);

    loop {
        tokio::select! {
            _ = takt.tick() => {
                match socket.send_to(&datagramm, config.ziel).await {
                    Ok(bytes) => tracing::trace!(bytes, ziel = %config.ziel, "Ankuendigung gesendet"),
                    Err(e) => tracing::warn!(fehler = %e, ziel = %config.ziel, "Senden der Ankuendigung fehlgeschlagen"),
                }
            }
            _ = &mut shutdown_rx => break,
        }
    }

    tracing::info!("Beacon beendet");
}
