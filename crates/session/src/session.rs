//! Barrier-Session – besitzt Listener und Stream-Client
//!
//! ## Concurrency-Modell
//! Listener, Stream-Client und die oeffentliche API melden alles ueber
//! Kanaele an einen einzigen Dispatch-Task. Nur dieser Task schreibt den
//! [`SessionState`]; damit wird jede Meldung einzeln und vollstaendig
//! verarbeitet, und die Uebergabe kann nur einmal stattfinden, auch wenn
//! mehrere Ankuendigungen kurz hintereinander eintreffen.
//!
//! ```text
//! BroadcastListener --Announcement-------+
//! StreamClient ------StreamNotification--+--> Dispatch-Task --> SessionState
//! BarrierSession ----Befehl--------------+         |
//!                                                  +--> SessionObserver
//! ```
//!
//! Reihenfolge bei der Uebergabe: Listener stoppen, dann verbinden, dann
//! `on_handoff`.

use parking_lot::RwLock;
use schranke_discovery::{BroadcastListener, ListenerConfig};
use schranke_protocol::Announcement;
use schranke_stream::{endpunkt_pruefen, StreamClient, StreamConfig, StreamNotification};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{SessionError, SessionResult};
use crate::observer::SessionObserver;
use crate::state::SessionState;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Wie die Session zu ihrem Endpunkt kommt
#[derive(Debug, Clone)]
pub enum Modus {
    /// Auf eine Broadcast-Ankuendigung warten
    Discovery(ListenerConfig),
    /// Sofort zu einem bekannten Endpunkt verbinden
    Direkt(String),
}

/// Konfiguration der Barrier-Session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub modus: Modus,
    pub stream: StreamConfig,
}

impl SessionConfig {
    /// Discovery auf dem Standard-Port 30001
    pub fn discovery() -> Self {
        Self {
            modus: Modus::Discovery(ListenerConfig::default()),
            stream: StreamConfig::default(),
        }
    }

    /// Direktverbindung ohne Discovery
    pub fn direkt(endpunkt: impl Into<String>) -> Self {
        Self {
            modus: Modus::Direkt(endpunkt.into()),
            stream: StreamConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// BarrierSession
// ---------------------------------------------------------------------------

/// Befehle der oeffentlichen API an den Dispatch-Task
#[derive(Debug)]
enum Befehl {
    Connect(String),
    Disconnect,
    Shutdown,
}

/// Phase der Session; es gibt keinen Weg zurueck zu `Discovering`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Discovering,
    Streaming,
}

/// Orchestriert Discovery, Uebergabe und Stream-Verarbeitung
pub struct BarrierSession {
    state: Arc<RwLock<SessionState>>,
    stream: StreamClient,
    listener: Arc<BroadcastListener>,
    befehl_tx: mpsc::UnboundedSender<Befehl>,
    _task: tokio::task::JoinHandle<()>,
}

impl BarrierSession {
    /// Startet die Session
    ///
    /// Muss innerhalb einer tokio-Runtime aufgerufen werden. Im
    /// Discovery-Modus ist ein Bind-Fehler nicht fatal: er wird geloggt und
    /// die Session wartet dann vergeblich. Im Direkt-Modus wird ein
    /// ungueltiger Endpunkt sofort abgelehnt.
    pub fn start(
        config: SessionConfig,
        observer: Arc<dyn SessionObserver>,
    ) -> SessionResult<Self> {
        let (announce_tx, announce_rx) = mpsc::unbounded_channel();
        let (stream_tx, stream_rx) = mpsc::unbounded_channel();
        let (befehl_tx, befehl_rx) = mpsc::unbounded_channel();

        let listener = Arc::new(BroadcastListener::neu(announce_tx));
        let stream = StreamClient::neu(config.stream, stream_tx);

        let phase = match &config.modus {
            Modus::Discovery(listener_config) => {
                // Fehler ist bereits geloggt, Listener bleibt inaktiv
                let _ = listener.start(listener_config);
                Phase::Discovering
            }
            Modus::Direkt(endpunkt) => {
                stream.connect(endpunkt)?;
                Phase::Streaming
            }
        };

        let state = Arc::new(RwLock::new(SessionState::default()));
        let treiber = Treiber {
            state: Arc::clone(&state),
            observer,
            listener: Arc::clone(&listener),
            stream: stream.clone(),
            phase,
        };
        let task = tokio::spawn(treiber.dispatch_loop(announce_rx, stream_rx, befehl_rx));

        tracing::info!(modus = ?config.modus, "Barrier-Session gestartet");

        Ok(Self {
            state,
            stream,
            listener,
            befehl_tx,
            _task: task,
        })
    }

    /// Sendet einen Text an den Controller (best effort)
    pub fn send(&self, text: impl Into<String>) {
        self.stream.send(text);
    }

    /// Verbindet direkt zu `endpunkt`
    ///
    /// Laeuft noch die Discovery, wird sie beendet; `on_handoff` wird
    /// dabei nicht ausgeloest, da keine Ankuendigung vorliegt.
    pub fn connect(&self, endpunkt: &str) -> SessionResult<()> {
        endpunkt_pruefen(endpunkt)?;
        self.befehl(Befehl::Connect(endpunkt.to_string()))
    }

    /// Trennt die Stream-Verbindung; es wird nicht neu verbunden
    pub fn disconnect(&self) {
        let _ = self.befehl(Befehl::Disconnect);
    }

    /// Beendet Listener, Stream und Dispatch-Task
    pub fn shutdown(&self) {
        let _ = self.befehl(Befehl::Shutdown);
    }

    fn befehl(&self, befehl: Befehl) -> SessionResult<()> {
        self.befehl_tx.send(befehl).map_err(|_| SessionError::Beendet)
    }

    /// Kopie des aktuellen Zustands
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.state.read().messages().to_vec()
    }

    pub fn is_open(&self) -> bool {
        self.state.read().is_open()
    }

    pub fn position(&self) -> i64 {
        self.state.read().position()
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().is_connected()
    }

    /// `true` solange der Broadcast-Listener laeuft
    pub fn is_discovering(&self) -> bool {
        self.listener.is_active()
    }

    /// Adresse, auf der die Discovery lauscht
    ///
    /// None sobald der Listener nicht (mehr) laeuft: im Direkt-Modus, nach
    /// Bind-Fehler und nach der Uebergabe.
    pub fn discovery_addr(&self) -> Option<SocketAddr> {
        self.listener.lokale_adresse()
    }
}

impl Drop for BarrierSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Dispatch-Task
// ---------------------------------------------------------------------------

/// Einziger Schreiber des Session-Zustands
struct Treiber {
    state: Arc<RwLock<SessionState>>,
    observer: Arc<dyn SessionObserver>,
    listener: Arc<BroadcastListener>,
    stream: StreamClient,
    phase: Phase,
}

impl Treiber {
    async fn dispatch_loop(
        mut self,
        mut announce_rx: mpsc::UnboundedReceiver<Announcement>,
        mut stream_rx: mpsc::UnboundedReceiver<StreamNotification>,
        mut befehl_rx: mpsc::UnboundedReceiver<Befehl>,
    ) {
        loop {
            tokio::select! {
                Some(announcement) = announce_rx.recv() => self.ankuendigung(announcement),
                Some(meldung) = stream_rx.recv() => self.stream_meldung(meldung),
                befehl = befehl_rx.recv() => match befehl {
                    Some(Befehl::Connect(endpunkt)) => self.verbinden(&endpunkt),
                    Some(Befehl::Disconnect) => self.stream.disconnect(),
                    Some(Befehl::Shutdown) | None => break,
                },
            }
        }

        self.listener.stop();
        self.stream.disconnect();
        tracing::info!("Barrier-Session beendet");
    }

    /// Uebergabe bei der ersten Ankuendigung mit gueltigem Endpunkt
    fn ankuendigung(&mut self, announcement: Announcement) {
        if self.phase != Phase::Discovering {
            tracing::debug!(
                device_id = ?announcement.device_id,
                "Ankuendigung nach Uebergabe ignoriert"
            );
            return;
        }

        let Some(endpunkt) = announcement.endpoint() else {
            tracing::debug!(
                device_id = ?announcement.device_id,
                "Ankuendigung ohne Endpunkt ignoriert"
            );
            return;
        };

        if let Err(e) = endpunkt_pruefen(endpunkt) {
            tracing::warn!(fehler = %e, "Ankuendigung mit unbrauchbarem Endpunkt ignoriert");
            return;
        }

        tracing::info!(
            device_id = ?announcement.device_id,
            service = ?announcement.service_name,
            endpunkt = %endpunkt,
            "Geraet gefunden, Uebergabe an Stream"
        );

        self.listener.stop();
        self.phase = Phase::Streaming;
        if let Err(e) = self.stream.connect(endpunkt) {
            tracing::error!(fehler = %e, "Verbindungsaufbau nach Uebergabe abgelehnt");
        }
        self.observer.on_handoff(&announcement);
    }

    fn verbinden(&mut self, endpunkt: &str) {
        if self.phase == Phase::Discovering {
            self.listener.stop();
            self.phase = Phase::Streaming;
        }
        if let Err(e) = self.stream.connect(endpunkt) {
            tracing::warn!(fehler = %e, "Direktverbindung abgelehnt");
        }
    }

    fn stream_meldung(&mut self, meldung: StreamNotification) {
        match meldung {
            StreamNotification::Connected => self.verbindung(true),
            StreamNotification::Disconnected => self.verbindung(false),
            StreamNotification::Text(text) => {
                self.state.write().nachricht_aufnehmen(text);
                self.observer.on_messages_updated();
            }
            StreamNotification::TransportError(beschreibung) => {
                self.state
                    .write()
                    .diagnose_aufnehmen(format!("Fehler: {beschreibung}"));
                self.observer.on_messages_updated();
            }
        }
    }

    fn verbindung(&mut self, is_connected: bool) {
        self.state.write().verbindung_setzen(is_connected);
        tracing::info!(verbunden = is_connected, "Verbindungsstatus geaendert");
        self.observer.on_status_changed(is_connected);
    }
}
