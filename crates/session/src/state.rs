//! Abgeleiteter Session-Zustand
//!
//! Wird ausschliesslich vom Dispatch-Task geschrieben. `is_open` und
//! `position` aendern sich nur durch erfolgreich dekodierte Events, ein
//! Verbindungsverlust setzt sie nicht zurueck. `messages` waechst nur.

use schranke_protocol::{decode_stream_event, EventKind, StreamEvent};

/// Zustand einer Barrier-Session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    messages: Vec<String>,
    is_open: bool,
    position: i64,
    is_connected: bool,
}

impl SessionState {
    /// Alle empfangenen Rohnachrichten in Empfangsreihenfolge
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// `true` wenn der letzte `GATE_STATUS` exakt `"Open"` meldete
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Letzte gemeldete Armposition in Prozent
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Verbindungsstatus laut Transport
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Haengt einen Text-Frame an und wendet ihn an, falls er ein Event ist
    ///
    /// Nicht dekodierbare Frames werden nur protokolliert.
    pub(crate) fn nachricht_aufnehmen(&mut self, raw: String) -> Option<StreamEvent> {
        let event = match decode_stream_event(&raw) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(fehler = %e, bytes = raw.len(), "Nachricht ist kein Event");
                None
            }
        };
        self.messages.push(raw);

        if let Some(event) = &event {
            self.event_anwenden(event);
        }
        event
    }

    /// Haengt eine Diagnosezeile an, ohne sie zu dekodieren
    pub(crate) fn diagnose_aufnehmen(&mut self, text: String) {
        self.messages.push(text);
    }

    pub(crate) fn verbindung_setzen(&mut self, is_connected: bool) {
        self.is_connected = is_connected;
    }

    fn event_anwenden(&mut self, event: &StreamEvent) {
        match event.kind {
            EventKind::Status => {
                self.is_open = event.meldet_offen();
            }
            EventKind::Update => {
                if let Some(position) = event.position() {
                    self.position = position;
                }
            }
            EventKind::Unknown(ref name) => {
                tracing::trace!(event = ?name, "Unbekanntes Event ignoriert");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFEN: &str = r#"{"event":"GATE_STATUS","data":{"state":"Open"},"timestamp":1}"#;

    #[test]
    fn status_offen() {
        let mut s = SessionState::default();
        s.nachricht_aufnehmen(OFFEN.into());
        assert!(s.is_open());
        assert_eq!(s.messages(), [OFFEN.to_string()]);
    }

    #[test]
    fn status_anderer_wert_oder_fehlend_schliesst() {
        for raw in [
            r#"{"event":"GATE_STATUS","data":{"state":"Closed"}}"#,
            r#"{"event":"GATE_STATUS","data":{"state":"open"}}"#,
            r#"{"event":"GATE_STATUS","data":{}}"#,
            r#"{"event":"GATE_STATUS"}"#,
        ] {
            let mut s = SessionState::default();
            s.nachricht_aufnehmen(OFFEN.into());
            s.nachricht_aufnehmen(raw.into());
            assert!(!s.is_open(), "{raw} muss schliessen");
        }
    }

    #[test]
    fn update_setzt_position_und_laesst_status() {
        let mut s = SessionState::default();
        s.nachricht_aufnehmen(OFFEN.into());
        s.nachricht_aufnehmen(r#"{"event":"GATE_UPDATE","data":{"position":42}}"#.into());
        assert_eq!(s.position(), 42);
        assert!(s.is_open());
    }

    #[test]
    fn update_ohne_position_aendert_nichts() {
        let mut s = SessionState::default();
        s.nachricht_aufnehmen(r#"{"event":"GATE_UPDATE","data":{"position":42}}"#.into());
        s.nachricht_aufnehmen(r#"{"event":"GATE_UPDATE","data":{}}"#.into());
        s.nachricht_aufnehmen(r#"{"event":"GATE_UPDATE"}"#.into());
        assert_eq!(s.position(), 42);
    }

    #[test]
    fn kein_json_wird_nur_protokolliert() {
        let mut s = SessionState::default();
        s.nachricht_aufnehmen(OFFEN.into());
        s.nachricht_aufnehmen(r#"{"event":"GATE_UPDATE","data":{"position":7}}"#.into());
        s.verbindung_setzen(true);
        let vorher = s.clone();

        assert!(s.nachricht_aufnehmen("not json".into()).is_none());
        assert_eq!(s.messages().len(), vorher.messages().len() + 1);
        assert_eq!(s.is_open(), vorher.is_open());
        assert_eq!(s.position(), vorher.position());
        assert_eq!(s.is_connected(), vorher.is_connected());
    }

    #[test]
    fn unbekanntes_event_aendert_nichts() {
        let mut s = SessionState::default();
        s.nachricht_aufnehmen(r#"{"event":"GATE_RESET","data":{"state":"Open","position":99}}"#.into());
        assert!(!s.is_open());
        assert_eq!(s.position(), 0);
        assert_eq!(s.messages().len(), 1);
    }

    #[test]
    fn log_waechst_um_genau_eins_pro_nachricht() {
        let mut s = SessionState::default();
        let eingaben = [OFFEN, "not json", "", "{}", r#"{"event":"X"}"#, "[]"];
        for (i, raw) in eingaben.iter().enumerate() {
            s.nachricht_aufnehmen((*raw).to_string());
            assert_eq!(s.messages().len(), i + 1);
        }
        assert_eq!(s.messages()[1], "not json");
    }

    #[test]
    fn verbindungsverlust_setzt_zustand_nicht_zurueck() {
        let mut s = SessionState::default();
        s.verbindung_setzen(true);
        s.nachricht_aufnehmen(OFFEN.into());
        s.nachricht_aufnehmen(r#"{"event":"GATE_UPDATE","data":{"position":80}}"#.into());
        s.verbindung_setzen(false);
        assert!(s.is_open());
        assert_eq!(s.position(), 80);
        assert!(!s.is_connected());
    }

    #[test]
    fn diagnose_wird_nicht_dekodiert() {
        let mut s = SessionState::default();
        s.diagnose_aufnehmen(format!("Fehler: {OFFEN}"));
        assert!(!s.is_open());
        assert_eq!(s.messages().len(), 1);
    }
}
