//! schranke-client – Bibliotheks-Root
//!
//! Startet eine Barrier-Session, protokolliert jedes Session-Ereignis und
//! leitet Zeilen von stdin an den Controller weiter.

pub mod config;

use anyhow::Result;
use config::ClientConfig;
use schranke_session::{BarrierSession, KanalObserver, SessionEreignis};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Haelt den laufenden Client zusammen
pub struct App {
    pub config: ClientConfig,
}

impl App {
    /// Erstellt einen neuen Client aus der gegebenen Konfiguration
    pub fn neu(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Startet die Session und laeuft bis Ctrl-C oder stdin-EOF
    pub async fn starten(self) -> Result<()> {
        let session_config = self.config.session_config()?;
        let (observer, mut ereignisse) = KanalObserver::neu();
        let session = BarrierSession::start(session_config, Arc::new(observer))?;

        if let Some(addr) = session.discovery_addr() {
            tracing::info!(adresse = %addr, "Warte auf Ankuendigung des Controllers");
        }

        let mut zeilen = BufReader::new(tokio::io::stdin()).lines();
        let mut protokoll = Protokoll::default();

        loop {
            tokio::select! {
                Some(ereignis) = ereignisse.recv() => protokoll.ereignis(&session, ereignis),

                zeile = zeilen.next_line() => match zeile {
                    Ok(Some(zeile)) => {
                        let zeile = zeile.trim();
                        if !zeile.is_empty() {
                            session.send(zeile.to_string());
                        }
                    }
                    Ok(None) => {
                        tracing::info!("stdin geschlossen, Client wird beendet");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(fehler = %e, "stdin nicht lesbar, Client wird beendet");
                        break;
                    }
                },

                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    tracing::info!("Shutdown-Signal empfangen, Client wird beendet");
                    break;
                }
            }
        }

        session.shutdown();
        Ok(())
    }
}

/// Merkt sich, welche Nachrichten bereits ausgegeben wurden
#[derive(Debug, Default)]
struct Protokoll {
    ausgegeben: usize,
}

impl Protokoll {
    fn ereignis(&mut self, session: &BarrierSession, ereignis: SessionEreignis) {
        match ereignis {
            SessionEreignis::Handoff(a) => tracing::info!(
                device_id = a.device_id.as_deref().unwrap_or("-"),
                service = a.service_name.as_deref().unwrap_or("-"),
                endpunkt = a.endpoint().unwrap_or("-"),
                "Controller gefunden"
            ),
            SessionEreignis::StatusChanged(verbunden) => {
                tracing::info!(verbunden, "Verbindungsstatus");
            }
            SessionEreignis::MessagesUpdated => {
                let zustand = session.snapshot();
                for nachricht in zustand.messages().iter().skip(self.ausgegeben) {
                    tracing::debug!(nachricht = %nachricht, "Nachricht empfangen");
                }
                self.ausgegeben = zustand.messages().len();
                tracing::info!(
                    offen = zustand.is_open(),
                    position = zustand.position(),
                    "Schrankenzustand"
                );
            }
        }
    }
}
