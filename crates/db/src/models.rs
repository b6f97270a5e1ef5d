//! Datenbank-spezifische Eingabe- und Ergebnis-Typen
//!
//! Die fachlichen Modelle (Pruefung, Frage, Teilnahme, ...) liegen in
//! `klausur-core`. Hier stehen nur Typen, die der Speicher zusaetzlich braucht.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use klausur_core::EventSlug;

/// Eingabe zum Anlegen einer Pruefung
#[derive(Debug, Clone)]
pub struct NeuePruefung {
    pub slug: EventSlug,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Eine gespeicherte Antwort eines Teilnehmers auf eine Frage.
///
/// `answer` ist Hex-Ciphertext, solange die Pruefung nicht dauerhaft
/// entschluesselt wurde, danach Klartext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abgabe {
    pub username: String,
    pub question_number: u32,
    pub answer: String,
    pub submitted_at: DateTime<Utc>,
}
