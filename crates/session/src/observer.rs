//! Observer-Schnittstelle fuer die Praesentationsschicht
//!
//! Alle Callbacks laufen im Dispatch-Task der Session, nachdem der Zustand
//! bereits konsistent ist. Wer einen bestimmten Ausfuehrungskontext braucht
//! (UI-Thread o.ae.), nutzt den [`KanalObserver`] und konsumiert die
//! Ereignisse dort, wo es passt.

use schranke_protocol::Announcement;
use tokio::sync::mpsc;

/// Callbacks der Session (push-only, kein Rueckgabewert)
pub trait SessionObserver: Send + Sync + 'static {
    /// Nach jedem Anhaengen an das Nachrichten-Log (auch ohne Event)
    fn on_messages_updated(&self) {}

    /// Bei jeder Meldung des Transports ueber die Verbindung
    fn on_status_changed(&self, _is_connected: bool) {}

    /// Genau einmal: Discovery abgeschlossen, Verbindungsaufbau gestartet
    fn on_handoff(&self, _announcement: &Announcement) {}
}

/// Observer ohne Wirkung
#[derive(Debug, Default, Clone, Copy)]
pub struct KeinObserver;

impl SessionObserver for KeinObserver {}

/// Ereignisse in Kanal-Form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEreignis {
    MessagesUpdated,
    StatusChanged(bool),
    Handoff(Announcement),
}

/// Leitet alle Callbacks als [`SessionEreignis`] in einen Kanal weiter
pub struct KanalObserver {
    tx: mpsc::UnboundedSender<SessionEreignis>,
}

impl KanalObserver {
    /// Erstellt Observer und zugehoerigen Empfaenger
    pub fn neu() -> (Self, mpsc::UnboundedReceiver<SessionEreignis>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn senden(&self, ereignis: SessionEreignis) {
        // Empfaenger weg: niemand hoert mehr zu
        let _ = self.tx.send(ereignis);
    }
}

impl SessionObserver for KanalObserver {
    fn on_messages_updated(&self) {
        self.senden(SessionEreignis::MessagesUpdated);
    }

    fn on_status_changed(&self, is_connected: bool) {
        self.senden(SessionEreignis::StatusChanged(is_connected));
    }

    fn on_handoff(&self, announcement: &Announcement) {
        self.senden(SessionEreignis::Handoff(announcement.clone()));
    }
}
