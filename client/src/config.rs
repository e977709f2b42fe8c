//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Client ohne Konfigurationsdatei
//! per Discovery auf Port 30001 startet.

use anyhow::{bail, Context};
use schranke_discovery::{ListenerConfig, DISCOVERY_PORT};
use schranke_observability::{log_format_gueltig, log_level_gueltig};
use schranke_session::{Modus, SessionConfig};
use schranke_stream::StreamConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Broadcast-Discovery
    pub discovery: DiscoveryEinstellungen,
    /// Stream-Verbindung zum Controller
    pub verbindung: VerbindungsEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Broadcast-Discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryEinstellungen {
    /// Auf Ankuendigungen lauschen
    pub aktiviert: bool,
    /// Bind-Adresse des UDP-Sockets
    pub bind_adresse: String,
    /// UDP-Port der Ankuendigungen
    pub port: u16,
}

impl Default for DiscoveryEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            bind_adresse: "0.0.0.0".into(),
            port: DISCOVERY_PORT,
        }
    }
}

/// Stream-Verbindung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    /// Fester Endpunkt (`ws://host:port/pfad`); gesetzt = keine Discovery
    pub endpunkt: Option<String>,
    /// Zeitlimit fuer den Verbindungsaufbau in Sekunden
    pub connect_timeout_sek: u64,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        Self {
            endpunkt: None,
            connect_timeout_sek: 5,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level oder Filter-Direktive
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .with_context(|| format!("Konfigurationsfehler in '{pfad}'"))?;
                config
                    .validieren()
                    .with_context(|| format!("Ungueltige Konfiguration in '{pfad}'"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => {
                Err(e).with_context(|| format!("Konfigurationsdatei '{pfad}' nicht lesbar"))
            }
        }
    }

    /// Prueft die Logging-Einstellungen
    pub fn validieren(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            bail!("Ungueltiger Log-Level '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!(
                "Ungueltiges Log-Format '{}' (erlaubt: text, json)",
                self.logging.format
            );
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse fuer die Discovery zurueck
    pub fn discovery_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .discovery
            .bind_adresse
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{}'", self.discovery.bind_adresse))?;
        Ok(SocketAddr::new(ip, self.discovery.port))
    }

    /// Leitet die Session-Konfiguration ab
    ///
    /// Ein gesetzter Endpunkt hat Vorrang vor der Discovery.
    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let modus = match self.verbindung.endpunkt.as_deref().map(str::trim) {
            Some(endpunkt) if !endpunkt.is_empty() => Modus::Direkt(endpunkt.to_string()),
            _ if self.discovery.aktiviert => {
                Modus::Discovery(ListenerConfig::neu(self.discovery_bind_adresse()?))
            }
            _ => bail!("Discovery ist deaktiviert und kein Endpunkt konfiguriert"),
        };

        Ok(SessionConfig {
            modus,
            stream: StreamConfig {
                connect_timeout: Duration::from_secs(self.verbindung.connect_timeout_sek),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ClientConfig::default();
        assert!(cfg.discovery.aktiviert);
        assert_eq!(cfg.discovery.port, 30001);
        assert_eq!(cfg.verbindung.connect_timeout_sek, 5);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.discovery_bind_adresse().unwrap().to_string(), "0.0.0.0:30001");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [discovery]
            port = 31000

            [logging]
            format = "json"
        "#;
        let cfg: ClientConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.discovery.port, 31000);
        assert_eq!(cfg.logging.format, "json");
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.discovery.bind_adresse, "0.0.0.0");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.verbindung.endpunkt.is_none());
    }

    #[test]
    fn standard_ist_discovery() {
        let session = ClientConfig::default().session_config().unwrap();
        match session.modus {
            Modus::Discovery(l) => assert_eq!(l.bind_addr.port(), 30001),
            andere => panic!("Erwartet Discovery, erhalten: {andere:?}"),
        }
        assert_eq!(session.stream.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn endpunkt_hat_vorrang() {
        let toml = r#"
            [verbindung]
            endpunkt = "ws://10.0.0.5:8080"
            connect_timeout_sek = 2
        "#;
        let cfg: ClientConfig = toml::from_str(toml).unwrap();
        let session = cfg.session_config().unwrap();
        assert!(matches!(session.modus, Modus::Direkt(ref e) if e == "ws://10.0.0.5:8080"));
        assert_eq!(session.stream.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn ohne_discovery_und_endpunkt_fehler() {
        let mut cfg = ClientConfig::default();
        cfg.discovery.aktiviert = false;
        cfg.verbindung.endpunkt = Some("  ".into());
        assert!(cfg.session_config().is_err());
    }

    #[test]
    fn ungueltige_bind_adresse() {
        let mut cfg = ClientConfig::default();
        cfg.discovery.bind_adresse = "irgendwo".into();
        assert!(cfg.session_config().is_err());
    }

    #[test]
    fn logging_validierung() {
        let mut cfg = ClientConfig::default();
        assert!(cfg.validieren().is_ok());

        cfg.logging.level = "schranke_session=trace,info".into();
        assert!(cfg.validieren().is_ok());

        cfg.logging.level = "schranke=laut".into();
        assert!(cfg.validieren().is_err());

        cfg.logging.level = "info".into();
        cfg.logging.format = "xml".into();
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn ungueltiges_log_format_in_datei_ist_fehler() {
        let pfad = std::env::temp_dir().join(format!(
            "schranke-test-format-{}.toml",
            std::process::id()
        ));
        std::fs::write(&pfad, "[logging]\nformat = \"xml\"\n").unwrap();
        let ergebnis = ClientConfig::laden(pfad.to_str().unwrap());
        std::fs::remove_file(&pfad).unwrap();
        assert!(ergebnis.is_err());
    }

    #[test]
    fn fehlende_datei_liefert_standard() {
        let cfg = ClientConfig::laden("/nicht/vorhanden/schranke.toml").unwrap();
        assert_eq!(cfg.discovery.port, 30001);
    }

    #[test]
    fn kaputte_datei_ist_fehler() {
        let pfad = std::env::temp_dir().join(format!("schranke-test-{}.toml", std::process::id()));
        std::fs::write(&pfad, "[discovery\nport = ").unwrap();
        let ergebnis = ClientConfig::laden(pfad.to_str().unwrap());
        std::fs::remove_file(&pfad).unwrap();
        assert!(ergebnis.is_err());
    }
}
