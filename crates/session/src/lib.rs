//! schranke-session – Orchestrierung von Discovery und Stream
//!
//! Die [`BarrierSession`] besitzt einen Broadcast-Listener und einen
//! Stream-Client. Die erste Ankuendigung mit Endpunkt loest die einmalige
//! Uebergabe aus (Listener stoppen, verbinden, Observer benachrichtigen).
//! Danach werden die Text-Frames dekodiert und der abgeleitete Zustand
//! (offen/geschlossen, Armposition, Verbindung, Nachrichten-Log) gepflegt.
//!
//! ## Zustandsmaschine
//! ```text
//! DISCOVERING --(Ankuendigung mit Endpunkt)--> STREAMING (connected/disconnected)
//!                                                  |
//!                    kein Weg zurueck  <-----------+
//! ```

pub mod error;
pub mod observer;
pub mod session;
pub mod state;

pub use error::{SessionError, SessionResult};
pub use observer::{KanalObserver, KeinObserver, SessionEreignis, SessionObserver};
pub use session::{BarrierSession, Modus, SessionConfig};
pub use state::SessionState;
