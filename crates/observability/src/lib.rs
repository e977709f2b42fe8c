//! # schranke-observability
//!
//! Structured Logging fuer Schranke via tracing-subscriber
//! (Text oder JSON, Level per Umgebungsvariable ueberschreibbar).

pub mod logging;

pub use logging::{
    log_format_gueltig, log_level_gueltig, logging_initialisieren, LogFormat, LoggingError,
    ENV_LOG_FORMAT, ENV_LOG_LEVEL,
};
