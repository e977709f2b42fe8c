//! Client-seitige WebSocket-Verbindung zum Schranken-Controller
//!
//! `connect` prueft die URL sofort und startet den Verbindungsaufbau in
//! einem eigenen Task; das Ergebnis kommt asynchron als Notification.
//!
//! ## Ablauf pro Verbindung
//!
//! ```text
//! connect_async (max. connect_timeout)
//!     |-- Fehler/Timeout --> TransportError
//!     v
//! Connected
//!     |
//!     +--> Text-Frame      --> Text(payload)
//!     +--> Lesefehler      --> TransportError, Ende
//!     +--> Close / EOF     --> Ende
//!     +--> disconnect()    --> Close-Frame, Ende
//!     v
//! Disconnected
//! ```
//!
//! Jede Verbindung traegt eine Generation. Wird sie durch ein neues
//! `connect` abgeloest, verwirft der Client ihre restlichen Meldungen, damit
//! ein spaetes `Disconnected` der alten Verbindung den Status der neuen
//! nicht ueberschreibt.

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::error::{StreamError, StreamResult};

// ---------------------------------------------------------------------------
// Oeffentliche Typen
// ---------------------------------------------------------------------------

/// Meldungen des Stream-Clients an seinen Besitzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamNotification {
    /// Verbindung steht
    Connected,
    /// Verbindung wurde getrennt (nur nach vorherigem `Connected`)
    Disconnected,
    /// Empfangener Text-Frame
    Text(String),
    /// Transportfehler in lesbarer Form (Verbindungsaufbau, Lesen, Schreiben)
    TransportError(String),
}

/// Konfiguration fuer den Stream-Client
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Zeitlimit fuer den Verbindungsaufbau
    pub connect_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Prueft einen Endpunkt vorab (Schema `ws`, Host vorhanden)
pub fn endpunkt_pruefen(endpoint: &str) -> StreamResult<Url> {
    let url = Url::parse(endpoint.trim()).map_err(|e| StreamError::UngueltigeUrl {
        url: endpoint.to_string(),
        grund: e.to_string(),
    })?;

    if url.scheme() != "ws" {
        return Err(StreamError::NichtUnterstuetzt(url.scheme().to_string()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(StreamError::UngueltigeUrl {
            url: endpoint.to_string(),
            grund: "kein Host angegeben".into(),
        });
    }
    Ok(url)
}

// ---------------------------------------------------------------------------
// StreamClient
// ---------------------------------------------------------------------------

/// Befehle an den Verbindungs-Task
enum Befehl {
    Text(String),
    Schliessen,
}

/// Eine aktive (oder im Aufbau befindliche) Verbindung
struct Verbindung {
    endpunkt: Url,
    verbunden: Arc<AtomicBool>,
    befehl_tx: mpsc::UnboundedSender<Befehl>,
    _task: tokio::task::JoinHandle<()>,
}

/// Meldekanal zum Besitzer, gefiltert nach Generation
struct Melder {
    notify_tx: mpsc::UnboundedSender<StreamNotification>,
    generation: Mutex<u64>,
}

impl Melder {
    fn naechste_generation(&self) -> u64 {
        let mut generation = self.generation.lock();
        *generation += 1;
        *generation
    }

    /// Leitet die Meldung weiter, solange `generation` die aktuelle ist
    fn melden(&self, generation: u64, meldung: StreamNotification) {
        let aktuell = self.generation.lock();
        if *aktuell != generation {
            tracing::debug!(
                generation,
                aktuell = *aktuell,
                meldung = ?meldung,
                "Meldung einer abgeloesten Verbindung verworfen"
            );
            return;
        }
        let _ = self.notify_tx.send(meldung);
    }
}

struct Inner {
    config: StreamConfig,
    melder: Arc<Melder>,
    verbindung: Mutex<Option<Verbindung>>,
}

/// Handle auf den Stream-Client
///
/// Klonbar; alle Klone teilen sich dieselbe Verbindung. Es ist hoechstens
/// eine Verbindung gleichzeitig aktiv.
#[derive(Clone)]
pub struct StreamClient {
    inner: Arc<Inner>,
}

impl StreamClient {
    /// Erstellt einen unverbundenen Client
    pub fn neu(config: StreamConfig, notify_tx: mpsc::UnboundedSender<StreamNotification>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                melder: Arc::new(Melder {
                    notify_tx,
                    generation: Mutex::new(0),
                }),
                verbindung: Mutex::new(None),
            }),
        }
    }

    /// Startet den Verbindungsaufbau zu `endpoint`
    ///
    /// Blockiert nicht. Eine ungueltige URL wird sofort abgelehnt, alle
    /// weiteren Fehler kommen als `TransportError`. Eine bestehende
    /// Verbindung wird vorher geschlossen.
    pub fn connect(&self, endpoint: &str) -> StreamResult<()> {
        let url = endpunkt_pruefen(endpoint)?;

        let mut verbindung = self.inner.verbindung.lock();
        if let Some(alt) = verbindung.take() {
            tracing::debug!(endpunkt = %alt.endpunkt, "Bestehende Verbindung wird ersetzt");
            let _ = alt.befehl_tx.send(Befehl::Schliessen);
        }

        // Ab hier gelten Meldungen der alten Verbindung als veraltet
        let generation = self.inner.melder.naechste_generation();
        tracing::info!(endpunkt = %url, generation, "Verbinde mit Controller");

        let verbunden = Arc::new(AtomicBool::new(false));
        let (befehl_tx, befehl_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(verbindungs_loop(
            url.clone(),
            self.inner.config.connect_timeout,
            Arc::clone(&verbunden),
            Arc::clone(&self.inner.melder),
            generation,
            befehl_rx,
        ));

        *verbindung = Some(Verbindung {
            endpunkt: url,
            verbunden,
            befehl_tx,
            _task: task,
        });
        Ok(())
    }

    /// Schliesst die Verbindung, falls vorhanden
    pub fn disconnect(&self) {
        if let Some(v) = self.inner.verbindung.lock().take() {
            tracing::info!(endpunkt = %v.endpunkt, "Verbindung wird getrennt");
            let _ = v.befehl_tx.send(Befehl::Schliessen);
        }
    }

    /// Sendet einen Text-Frame (best effort)
    ///
    /// Ohne bestehende Verbindung wird der Text verworfen, nicht gepuffert.
    pub fn send(&self, text: impl Into<String>) {
        let verbindung = self.inner.verbindung.lock();
        match verbindung.as_ref() {
            Some(v) if v.verbunden.load(Ordering::Acquire) => {
                let _ = v.befehl_tx.send(Befehl::Text(text.into()));
            }
            _ => tracing::debug!("Nicht verbunden, Nachricht verworfen"),
        }
    }

    /// `true` solange eine Verbindung steht
    pub fn is_connected(&self) -> bool {
        self.inner
            .verbindung
            .lock()
            .as_ref()
            .is_some_and(|v| v.verbunden.load(Ordering::Acquire))
    }

    /// Endpunkt der aktuellen Verbindung
    pub fn endpunkt(&self) -> Option<String> {
        self.inner
            .verbindung
            .lock()
            .as_ref()
            .map(|v| v.endpunkt.to_string())
    }
}

// ---------------------------------------------------------------------------
// Verbindungs-Task
// ---------------------------------------------------------------------------

async fn verbindungs_loop(
    url: Url,
    connect_timeout: Duration,
    verbunden: Arc<AtomicBool>,
    melder: Arc<Melder>,
    generation: u64,
    mut befehl_rx: mpsc::UnboundedReceiver<Befehl>,
) {
    let melden = |n: StreamNotification| melder.melden(generation, n);

    // Vor dem Connect kann nur `Schliessen` (oder ein gedroppter Sender) ankommen
    let aufbau = tokio::select! {
        ergebnis = tokio::time::timeout(connect_timeout, connect_async(url.as_str())) => ergebnis,
        _ = befehl_rx.recv() => {
            tracing::debug!(endpunkt = %url, "Verbindungsaufbau abgebrochen");
            return;
        }
    };

    let ws = match aufbau {
        Ok(Ok((ws, _antwort))) => ws,
        Ok(Err(e)) => {
            tracing::warn!(endpunkt = %url, fehler = %e, "Verbindungsaufbau fehlgeschlagen");
            melden(StreamNotification::TransportError(e.to_string()));
            return;
        }
        Err(_) => {
            tracing::warn!(
                endpunkt = %url,
                timeout_ms = connect_timeout.as_millis() as u64,
                "Zeitlimit beim Verbindungsaufbau"
            );
            melden(StreamNotification::TransportError(format!(
                "Zeitlimit beim Verbindungsaufbau ueberschritten ({} ms)",
                connect_timeout.as_millis()
            )));
            return;
        }
    };

    tracing::info!(endpunkt = %url, "WebSocket-Verbindung hergestellt");
    verbunden.store(true, Ordering::Release);
    melden(StreamNotification::Connected);

    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            befehl = befehl_rx.recv() => match befehl {
                Some(Befehl::Text(text)) => {
                    if let Err(e) = ws_tx.send(Message::text(text)).await {
                        tracing::warn!(endpunkt = %url, fehler = %e, "Senden fehlgeschlagen");
                        melden(StreamNotification::TransportError(e.to_string()));
                        break;
                    }
                }
                Some(Befehl::Schliessen) | None => {
                    let _ = ws_tx.close().await;
                    break;
                }
            },

            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    melden(StreamNotification::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(grund))) => {
                    tracing::debug!(endpunkt = %url, grund = ?grund, "Close-Frame empfangen");
                    break;
                }
                // Binary, Ping, Pong: Pongs beantwortet tungstenite selbst
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(endpunkt = %url, fehler = %e, "Lesefehler auf dem Stream");
                    melden(StreamNotification::TransportError(e.to_string()));
                    break;
                }
                None => break,
            },
        }
    }

    verbunden.store(false, Ordering::Release);
    tracing::info!(endpunkt = %url, "WebSocket-Verbindung getrennt");
    melden(StreamNotification::Disconnected);
}
