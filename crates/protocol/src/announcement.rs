//! Broadcast-Ankuendigung (UDP)
//!
//! Der Controller sendet periodisch ein JSON-Datagramm auf Port 30001:
//!
//! ```text
//! { "device_id": "0", "service_name": "Schranke", "ws_host": "ws://10.0.0.5:8081/ws" }
//! ```
//!
//! Zusaetzliche Felder werden ignoriert, fehlende oder falsch typisierte
//! Felder werden zu `None`.

use serde::{Deserialize, Serialize};

use crate::error::CodecResult;
use crate::felder::{json_objekt, tolerant};

/// Eine per Broadcast empfangene Ankuendigung
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Kennung des Geraets
    #[serde(default, deserialize_with = "tolerant", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Anzeigename des Dienstes
    #[serde(default, deserialize_with = "tolerant", skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    /// WebSocket-Endpunkt, zu dem nach der Uebergabe verbunden wird
    #[serde(default, deserialize_with = "tolerant", skip_serializing_if = "Option::is_none")]
    pub ws_host: Option<String>,
}

impl Announcement {
    /// Erstellt eine vollstaendige Ankuendigung
    pub fn neu(
        device_id: impl Into<String>,
        service_name: impl Into<String>,
        ws_host: impl Into<String>,
    ) -> Self {
        Self {
            device_id: Some(device_id.into()),
            service_name: Some(service_name.into()),
            ws_host: Some(ws_host.into()),
        }
    }

    /// Gibt den Endpunkt zurueck, sofern vorhanden und nicht leer
    pub fn endpoint(&self) -> Option<&str> {
        self.ws_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
    }

    /// Serialisiert die Ankuendigung so, wie der Beacon sie versendet
    /// (JSON mit abschliessendem Zeilenumbruch)
    pub fn to_datagram(&self) -> Vec<u8> {
        // Serialisierung von drei Option<String> kann nicht fehlschlagen
        let mut bytes = serde_json::to_vec(self).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }
}

/// Dekodiert ein empfangenes Datagramm
///
/// Leere Eingaben und alles, was kein JSON-Objekt ist, ergeben einen Fehler.
/// Der Aufrufer verwirft solche Datagramme.
pub fn decode_announcement(raw: &[u8]) -> CodecResult<Announcement> {
    let objekt = json_objekt(raw)?;
    Ok(serde_json::from_value(serde_json::Value::Object(objekt))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodecError;

    #[test]
    fn vollstaendige_ankuendigung() {
        let raw = br#"{"device_id":"d1","service_name":"gate","ws_host":"ws://10.0.0.5:8080"}"#;
        let a = decode_announcement(raw).unwrap();
        assert_eq!(a.device_id.as_deref(), Some("d1"));
        assert_eq!(a.service_name.as_deref(), Some("gate"));
        assert_eq!(a.endpoint(), Some("ws://10.0.0.5:8080"));
    }

    #[test]
    fn zeilenumbruch_und_zusatzfelder_erlaubt() {
        let raw = b"{\"ws_host\":\"ws://h:1\",\"api_port\":8081}\n";
        let a = decode_announcement(raw).unwrap();
        assert_eq!(a.endpoint(), Some("ws://h:1"));
        assert!(a.device_id.is_none());
    }

    #[test]
    fn falscher_feldtyp_wird_none() {
        let raw = br#"{"device_id":0,"service_name":null,"ws_host":"ws://h:1"}"#;
        let a = decode_announcement(raw).unwrap();
        assert!(a.device_id.is_none());
        assert!(a.service_name.is_none());
        assert_eq!(a.endpoint(), Some("ws://h:1"));
    }

    #[test]
    fn leerer_oder_blanker_endpunkt() {
        let a = decode_announcement(br#"{"ws_host":"  "}"#).unwrap();
        assert_eq!(a.endpoint(), None);
        let a = decode_announcement(br#"{"device_id":"x"}"#).unwrap();
        assert_eq!(a.endpoint(), None);
    }

    #[test]
    fn leere_eingabe_ist_fehler() {
        assert!(matches!(decode_announcement(b""), Err(CodecError::Leer)));
        assert!(matches!(decode_announcement(b" \n"), Err(CodecError::Leer)));
    }

    #[test]
    fn kein_objekt_ist_fehler() {
        assert!(matches!(
            decode_announcement(br#"["d1","gate","ws://h:1"]"#),
            Err(CodecError::KeinObjekt)
        ));
        assert!(matches!(decode_announcement(b"42"), Err(CodecError::KeinObjekt)));
    }

    #[test]
    fn rauschen_ist_fehler() {
        assert!(matches!(
            decode_announcement(&[0xff, 0x00, 0x13]),
            Err(CodecError::Json(_))
        ));
        assert!(matches!(
            decode_announcement(br#"{"ws_host":"ws://h"#),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn datagramm_ist_wieder_lesbar() {
        let a = Announcement::neu("0", "Schranke", "ws://localhost:8081/ws");
        let bytes = a.to_datagram();
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(decode_announcement(&bytes).unwrap(), a);
    }
}
