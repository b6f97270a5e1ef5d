//! Fehlertypen fuer Klausur
//!
//! Zentraler Fehler-Enum fuer alle Grenzoperationen (Verifikation,
//! Entschluesselung, Abgabe, Synchronisation). Untermodule definieren eigene
//! Fehler und konvertieren via `From` in diesen Typ.

use thiserror::Error;

/// Globaler Result-Alias fuer Klausur
pub type Result<T> = std::result::Result<T, KlausurError>;

/// Alle moeglichen Fehler im Klausur-System
#[derive(Debug, Error)]
pub enum KlausurError {
    // --- Verifikation ---
    /// Der Fingerprint passte nicht; das Geheimnis wird nicht uebernommen
    #[error("Verifikation abgelehnt fuer Pruefung '{slug}'")]
    VerifikationAbgelehnt { slug: String },

    // --- Entschluesselung ---
    /// Frage bereits entschluesselt oder Auswahl-Blob fehlerhaft
    #[error("Ungueltiger Entschluesselungszustand: {0}")]
    EntschluesselungsZustand(String),

    #[error("Kein verifiziertes Geheimnis fuer Pruefung '{0}'")]
    KeinGeheimnis(String),

    #[error("Kryptografie-Fehler: {0}")]
    Krypto(String),

    // --- Transport ---
    /// Netzwerk- oder Serverfehler einer Grenzoperation (opak)
    #[error("Transportfehler: {0}")]
    Transport(String),

    // --- Ressourcen ---
    #[error("Pruefung nicht gefunden: {0}")]
    PruefungNichtGefunden(String),

    #[error("Frage {nummer} in Pruefung '{slug}' nicht gefunden")]
    FrageNichtGefunden { slug: String, nummer: u32 },

    #[error("Teilnahme von '{username}' an Pruefung '{slug}' nicht gefunden")]
    TeilnahmeNichtGefunden { slug: String, username: String },

    #[error("Pruefung '{0}' hat noch nicht begonnen")]
    PruefungNichtGestartet(String),

    #[error("Pruefung '{0}' existiert bereits")]
    PruefungExistiert(String),

    // --- Berechtigung ---
    #[error("Keine Berechtigung: {0}")]
    KeineBerechtigung(String),

    // --- Synchronisation ---
    #[error("Synchronisations-Bundle ungueltig: {}", .0.join("; "))]
    BundleUngueltig(Vec<String>),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl KlausurError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Erstellt einen Transportfehler aus einer beliebigen Nachricht
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler wiederholbar sein koennte.
    ///
    /// Nur Transportfehler kommen in Frage; ueber Wiederholung und Backoff
    /// entscheidet der Aufrufer.
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = KlausurError::VerifikationAbgelehnt {
            slug: "ujian-fisika".into(),
        };
        assert_eq!(
            e.to_string(),
            "Verifikation abgelehnt fuer Pruefung 'ujian-fisika'"
        );
    }

    #[test]
    fn wiederholbar_erkennung() {
        assert!(KlausurError::Transport("timeout".into()).ist_wiederholbar());
        assert!(!KlausurError::EntschluesselungsZustand("x".into()).ist_wiederholbar());
        assert!(!KlausurError::VerifikationAbgelehnt { slug: "a".into() }.ist_wiederholbar());
    }

    #[test]
    fn bundle_fehler_listet_alle_probleme() {
        let e = KlausurError::BundleUngueltig(vec![
            "Titel fehlt".into(),
            "Ort ohne Namen".into(),
        ]);
        let text = e.to_string();
        assert!(text.contains("Titel fehlt"));
        assert!(text.contains("Ort ohne Namen"));
    }

    #[test]
    fn frage_nicht_gefunden_anzeige() {
        let e = KlausurError::FrageNichtGefunden {
            slug: "ujian".into(),
            nummer: 3,
        };
        assert!(e.to_string().contains("Frage 3"));
    }
}
