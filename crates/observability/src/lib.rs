//! # klausur-observability
//!
//! Structured Logging via tracing-subscriber fuer Server-CLI und
//! Pruefungsort-Werkzeuge. Level und Format kommen aus dem Abschnitt
//! `[logging]` der Konfiguration und koennen per Umgebung ueberschrieben
//! werden.

pub mod logging;

pub use logging::{
    logging_initialisieren, LogEinstellungen, LogFormat, LoggingFehler, ENV_LOG_FORMAT,
    ENV_LOG_LEVEL,
};
