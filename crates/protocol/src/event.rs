//! Stream-Events (WebSocket-Text-Frames)
//!
//! ```text
//! { "event": "GATE_STATUS", "data": { "state": "Open" }, "timestamp": 1735200000 }
//! { "event": "GATE_UPDATE", "data": { "position": 42 }, "timestamp": 1735200001 }
//! ```
//!
//! Unbekannte `event`-Werte werden als [`EventKind::Unknown`] dekodiert und
//! loesen beim Aufrufer keine Zustandsaenderung aus.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CodecError, CodecResult};
use crate::felder::{json_objekt, tolerant};

/// Event-Name fuer Statusmeldungen (offen/geschlossen)
pub const GATE_STATUS: &str = "GATE_STATUS";
/// Event-Name fuer Positionsmeldungen des Schrankenarms
pub const GATE_UPDATE: &str = "GATE_UPDATE";

/// Art eines Stream-Events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `GATE_STATUS`
    Status,
    /// `GATE_UPDATE`
    Update,
    /// Jeder andere oder fehlende Event-Name
    Unknown(Option<String>),
}

impl EventKind {
    fn aus_name(name: Option<String>) -> Self {
        match name.as_deref() {
            Some(GATE_STATUS) => Self::Status,
            Some(GATE_UPDATE) => Self::Update,
            _ => Self::Unknown(name),
        }
    }

    /// Name auf dem Draht (None fuer fehlenden Event-Namen)
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Status => Some(GATE_STATUS),
            Self::Update => Some(GATE_UPDATE),
            Self::Unknown(name) => name.as_deref(),
        }
    }
}

/// Nutzdaten eines Events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePayload {
    /// Zustand der Schranke, `"Open"` bedeutet offen
    #[serde(default, deserialize_with = "tolerant", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Position des Arms in Prozent
    #[serde(default, deserialize_with = "tolerant", skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

/// Ein dekodiertes Stream-Event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub kind: EventKind,
    pub data: Option<GatePayload>,
    pub timestamp: Option<i64>,
}

/// Drahtform, nur fuer serde
#[derive(Deserialize)]
struct RohEvent {
    #[serde(default, deserialize_with = "tolerant")]
    event: Option<String>,
    #[serde(default, deserialize_with = "tolerant")]
    data: Option<GatePayload>,
    #[serde(default, deserialize_with = "tolerant")]
    timestamp: Option<i64>,
}

impl StreamEvent {
    /// Statusmeldung mit aktuellem Zeitstempel
    pub fn status(state: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Status,
            data: Some(GatePayload {
                state: Some(state.into()),
                position: None,
            }),
            timestamp: Some(unix_sekunden()),
        }
    }

    /// Positionsmeldung mit aktuellem Zeitstempel
    pub fn update(position: i64) -> Self {
        Self {
            kind: EventKind::Update,
            data: Some(GatePayload {
                state: None,
                position: Some(position),
            }),
            timestamp: Some(unix_sekunden()),
        }
    }

    /// `true` wenn das Event den Zustand "offen" meldet
    ///
    /// Nur das exakte Literal `"Open"` zaehlt, alles andere (auch `None`) ist geschlossen.
    pub fn meldet_offen(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.state.as_deref())
            .is_some_and(|state| state == "Open")
    }

    /// Gemeldete Position, falls vorhanden
    pub fn position(&self) -> Option<i64> {
        self.data.as_ref().and_then(|d| d.position)
    }

    /// Serialisiert das Event in die Drahtform
    pub fn to_json(&self) -> String {
        let mut objekt = Map::new();
        if let Some(name) = self.kind.name() {
            objekt.insert("event".into(), Value::String(name.to_owned()));
        }
        if let Some(data) = &self.data {
            objekt.insert(
                "data".into(),
                serde_json::to_value(data).unwrap_or(Value::Null),
            );
        }
        if let Some(ts) = self.timestamp {
            objekt.insert("timestamp".into(), Value::from(ts));
        }
        Value::Object(objekt).to_string()
    }
}

/// Dekodiert einen Text-Frame
///
/// Ein Fehler bedeutet "kein Event": der Aufrufer protokolliert den Rohtext
/// trotzdem, aendert aber keinen Zustand.
pub fn decode_stream_event(raw: &str) -> CodecResult<StreamEvent> {
    let objekt = json_objekt(raw.as_bytes())?;
    if !["event", "data", "timestamp"]
        .iter()
        .any(|feld| objekt.contains_key(*feld))
    {
        return Err(CodecError::UnbekannteStruktur);
    }

    let roh: RohEvent = serde_json::from_value(Value::Object(objekt))?;
    Ok(StreamEvent {
        kind: EventKind::aus_name(roh.event),
        data: roh.data,
        timestamp: roh.timestamp,
    })
}

fn unix_sekunden() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_offen() {
        let e = decode_stream_event(r#"{"event":"GATE_STATUS","data":{"state":"Open"},"timestamp":1}"#)
            .unwrap();
        assert_eq!(e.kind, EventKind::Status);
        assert!(e.meldet_offen());
        assert_eq!(e.timestamp, Some(1));
    }

    #[test]
    fn status_nur_exaktes_literal_ist_offen() {
        for state in [r#""Closed""#, r#""open""#, r#""OPEN""#, r#"" Open""#, "null", "1"] {
            let raw = format!(r#"{{"event":"GATE_STATUS","data":{{"state":{state}}}}}"#);
            let e = decode_stream_event(&raw).unwrap();
            assert!(!e.meldet_offen(), "state={state} darf nicht offen sein");
        }
        let e = decode_stream_event(r#"{"event":"GATE_STATUS"}"#).unwrap();
        assert!(!e.meldet_offen());
    }

    #[test]
    fn update_mit_und_ohne_position() {
        let e = decode_stream_event(r#"{"event":"GATE_UPDATE","data":{"position":42}}"#).unwrap();
        assert_eq!(e.kind, EventKind::Update);
        assert_eq!(e.position(), Some(42));

        let e = decode_stream_event(r#"{"event":"GATE_UPDATE","data":{}}"#).unwrap();
        assert_eq!(e.position(), None);

        let e = decode_stream_event(r#"{"event":"GATE_UPDATE","data":{"position":"42"}}"#).unwrap();
        assert_eq!(e.position(), None);
    }

    #[test]
    fn unbekanntes_event() {
        let e = decode_stream_event(r#"{"event":"GATE_RESET","data":{"state":"Open"}}"#).unwrap();
        assert_eq!(e.kind, EventKind::Unknown(Some("GATE_RESET".into())));

        let e = decode_stream_event(r#"{"timestamp":5}"#).unwrap();
        assert_eq!(e.kind, EventKind::Unknown(None));
    }

    #[test]
    fn kein_event() {
        assert!(matches!(decode_stream_event("not json"), Err(CodecError::Json(_))));
        assert!(matches!(decode_stream_event(""), Err(CodecError::Leer)));
        assert!(matches!(decode_stream_event("[1,2]"), Err(CodecError::KeinObjekt)));
        assert!(matches!(
            decode_stream_event(r#"{"foo":1}"#),
            Err(CodecError::UnbekannteStruktur)
        ));
    }

    #[test]
    fn konstruktoren_ergeben_drahtform() {
        let json = StreamEvent::status("Open").to_json();
        let e = decode_stream_event(&json).unwrap();
        assert_eq!(e.kind, EventKind::Status);
        assert!(e.meldet_offen());
        assert!(e.timestamp.is_some());

        let e = decode_stream_event(&StreamEvent::update(77).to_json()).unwrap();
        assert_eq!(e.position(), Some(77));
    }
}
