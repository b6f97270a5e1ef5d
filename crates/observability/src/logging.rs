//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (ueberschreibt den Abschnitt
//! `[logging]` der Konfigurationsdatei):
//! - `KLAUSUR_LOG_LEVEL`: Filter-Direktive (z.B. `info`, `klausur_db=debug`)
//! - `KLAUSUR_LOG_FORMAT`: Format (`text`/`json`)
//!
//! Geheimnisse und Klartext-Antworten werden nie geloggt; Felder sind
//! Slugs, Benutzernamen und Fragenummern.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "KLAUSUR_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "KLAUSUR_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum LoggingFehler {
    #[error("Ungueltiger Log-Filter '{0}'")]
    UngueltigerFilter(String),

    #[error("Ungueltiges Log-Format '{0}' (erwartet: text, json)")]
    UngueltigesFormat(String),

    #[error("Logging bereits initialisiert")]
    BereitsInitialisiert,
}

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            andere => Err(LoggingFehler::UngueltigesFormat(andere.to_string())),
        }
    }
}

/// Abschnitt `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEinstellungen {
    /// Filter-Direktive im `EnvFilter`-Format
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

impl LogEinstellungen {
    /// Uebernimmt `KLAUSUR_LOG_LEVEL` / `KLAUSUR_LOG_FORMAT`, falls gesetzt
    pub fn aus_umgebung(self) -> Result<Self, LoggingFehler> {
        self.ueberschreiben(
            std::env::var(ENV_LOG_LEVEL).ok(),
            std::env::var(ENV_LOG_FORMAT).ok(),
        )
    }

    fn ueberschreiben(
        mut self,
        level: Option<String>,
        format: Option<String>,
    ) -> Result<Self, LoggingFehler> {
        if let Some(level) = level.filter(|l| !l.trim().is_empty()) {
            self.level = level;
        }
        if let Some(format) = format.filter(|f| !f.trim().is_empty()) {
            self.format = format.trim().parse()?;
        }
        Ok(self)
    }

    fn filter(&self) -> Result<EnvFilter, LoggingFehler> {
        EnvFilter::try_new(&self.level)
            .map_err(|_| LoggingFehler::UngueltigerFilter(self.level.clone()))
    }
}

/// Initialisiert den globalen Subscriber.
///
/// Ein zweiter Aufruf liefert `BereitsInitialisiert` statt zu paniken.
pub fn logging_initialisieren(einstellungen: &LogEinstellungen) -> Result<(), LoggingFehler> {
    let filter = einstellungen.filter()?;

    let ergebnis = match einstellungen.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.map_err(|_| LoggingFehler::BereitsInitialisiert)
}
