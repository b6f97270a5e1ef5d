//! Repository-Traits des zentralen Pruefungsspeichers
//!
//! Jeder Trait deckt eine Tabelle bzw. einen Aspekt ab. `SqliteDb`
//! implementiert alle; `KlausurSpeicher` fasst sie fuer den
//! `PruefungsDienst` zusammen.
//!
//! Mehrschrittige Aenderungen (Bundle anwenden, dauerhaft entschluesseln)
//! laufen jeweils in genau einer Transaktion.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use klausur_core::{
    Benutzer, EventSlug, Frage, Pruefung, Pruefungsort, SynchronizationBundle, Teilnahme,
    TeilnahmeStatus, VenueId,
};

use crate::error::DbError;
use crate::models::Abgabe;

/// Result-Alias fuer Datenbankoperationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://klausur.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://klausur.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait VenueRepository: Send + Sync {
    /// Legt einen Ort an oder aktualisiert seinen Namen
    async fn venue_speichern(&self, venue: &Pruefungsort) -> DbResult<()>;

    async fn venue_laden(&self, id: VenueId) -> DbResult<Option<Pruefungsort>>;

    async fn venues_auflisten(&self) -> DbResult<Vec<Pruefungsort>>;
}

#[allow(async_fn_in_trait)]
pub trait EventRepository: Send + Sync {
    /// Legt eine neue Pruefung an einem bestehenden Ort an
    async fn event_anlegen(&self, event: &Pruefung, venue_id: VenueId) -> DbResult<()>;

    async fn event_laden(&self, slug: &EventSlug) -> DbResult<Option<Pruefung>>;

    /// Ort, dem die Pruefung zugeordnet ist
    async fn event_venue(&self, slug: &EventSlug) -> DbResult<Option<Pruefungsort>>;

    async fn events_auflisten(&self) -> DbResult<Vec<Pruefung>>;

    /// Ersetzt Fragen und Antworten durch ihre entschluesselte Form und
    /// setzt `is_decrypted`, alles in einer Transaktion.
    ///
    /// `false`, wenn die Pruefung inzwischen schon entschluesselt ist; dann
    /// wird nichts geschrieben.
    async fn entschluesselung_uebernehmen(
        &self,
        slug: &EventSlug,
        fragen: &[Frage],
        abgaben: &[Abgabe],
        jetzt: DateTime<Utc>,
    ) -> DbResult<bool>;
}

#[allow(async_fn_in_trait)]
pub trait UserRepository: Send + Sync {
    /// Legt einen Benutzer an oder aktualisiert ihn (Schluessel: username)
    async fn benutzer_speichern(&self, benutzer: &Benutzer) -> DbResult<()>;

    async fn benutzer_laden(&self, username: &str) -> DbResult<Option<Benutzer>>;

    /// Alle Benutzer mit einer Teilnahme an der Pruefung
    async fn benutzer_der_pruefung(&self, slug: &EventSlug) -> DbResult<Vec<Benutzer>>;
}

#[allow(async_fn_in_trait)]
pub trait QuestionRepository: Send + Sync {
    /// Haengt eine Frage hinten an; `number` wird vom Speicher vergeben
    async fn frage_anhaengen(&self, slug: &EventSlug, frage: &Frage) -> DbResult<Frage>;

    /// Alle Fragen in Nummernfolge
    async fn fragen_laden(&self, slug: &EventSlug) -> DbResult<Vec<Frage>>;

    async fn frage_laden(&self, slug: &EventSlug, nummer: u32) -> DbResult<Option<Frage>>;
}

#[allow(async_fn_in_trait)]
pub trait ParticipationRepository: Send + Sync {
    /// Legt eine Teilnahme an oder ersetzt ihren Pruefwert
    async fn teilnahme_speichern(&self, slug: &EventSlug, teilnahme: &Teilnahme) -> DbResult<()>;

    async fn teilnahme_laden(
        &self,
        slug: &EventSlug,
        username: &str,
    ) -> DbResult<Option<Teilnahme>>;

    async fn teilnahmen_laden(&self, slug: &EventSlug) -> DbResult<Vec<Teilnahme>>;

    async fn als_verifiziert_markieren(
        &self,
        slug: &EventSlug,
        username: &str,
        jetzt: DateTime<Utc>,
    ) -> DbResult<()>;

    /// Verifikationszeit und Anzahl beantworteter Fragen pro Teilnehmer
    async fn teilnahme_status(&self, slug: &EventSlug) -> DbResult<Vec<TeilnahmeStatus>>;
}

#[allow(async_fn_in_trait)]
pub trait SubmissionRepository: Send + Sync {
    /// Speichert eine Antwort; eine fruehere Antwort auf dieselbe Frage
    /// wird ueberschrieben
    async fn antwort_speichern(
        &self,
        slug: &EventSlug,
        username: &str,
        nummer: u32,
        answer: &str,
        jetzt: DateTime<Utc>,
    ) -> DbResult<()>;

    /// Antworten eines Teilnehmers (Fragennummer -> Antwort)
    async fn antworten_laden(
        &self,
        slug: &EventSlug,
        username: &str,
    ) -> DbResult<HashMap<u32, String>>;

    async fn alle_abgaben(&self, slug: &EventSlug) -> DbResult<Vec<Abgabe>>;
}

#[allow(async_fn_in_trait)]
pub trait SynchronisationRepository: Send + Sync {
    /// Schnappschuss der Pruefung mit Ort, Fragen, Benutzern und Teilnahmen
    async fn bundle_erfassen(&self, slug: &EventSlug) -> DbResult<Option<SynchronizationBundle>>;

    /// Ueberschreibt den Stand der Pruefung mit dem Bundle.
    ///
    /// Fragen und Teilnahmen werden ersetzt, bisherige Antworten verworfen,
    /// `last_synchronization` auf `jetzt` gesetzt. Letzter Schreiber gewinnt.
    async fn bundle_anwenden(
        &self,
        bundle: &SynchronizationBundle,
        jetzt: DateTime<Utc>,
    ) -> DbResult<()>;
}

/// Alle Repositories, die der `PruefungsDienst` braucht
pub trait KlausurSpeicher:
    VenueRepository
    + EventRepository
    + UserRepository
    + QuestionRepository
    + ParticipationRepository
    + SubmissionRepository
    + SynchronisationRepository
{
}

impl<T> KlausurSpeicher for T where
    T: VenueRepository
        + EventRepository
        + UserRepository
        + QuestionRepository
        + ParticipationRepository
        + SubmissionRepository
        + SynchronisationRepository
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_konfiguration() {
        let cfg = DatabaseConfig::default();
        assert!(cfg.sqlite_wal);
        assert_eq!(cfg.max_verbindungen, 5);
        assert!(cfg.url.starts_with("sqlite://"));
    }

    #[test]
    fn fehlende_felder_bekommen_standardwerte() {
        let cfg: DatabaseConfig = serde_json::from_str(r#"{ "url": "sqlite::memory:" }"#).unwrap();
        assert_eq!(cfg.url, "sqlite::memory:");
        assert_eq!(cfg.max_verbindungen, 5);
    }
}
