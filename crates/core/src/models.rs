//! Datenmodelle einer Pruefung
//!
//! Diese Typen sind reine Datenuebertragungsobjekte. Sie werden zwischen
//! zentralem Speicher, Pruefungsort-Kopie und Client unveraendert
//! ausgetauscht; die JSON-Feldnamen folgen dem Wire-Format (camelCase).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EventSlug, VenueId};

// ---------------------------------------------------------------------------
// Pruefung (Event)
// ---------------------------------------------------------------------------

/// Eine Pruefungsveranstaltung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pruefung {
    pub slug: EventSlug,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Doppelt gehashter Fingerprint des Pruefungsgeheimnisses.
    /// Enthaelt nie das Geheimnis selbst.
    #[serde(default)]
    pub key_check: String,
    /// Ob der zentrale Speicher die Inhalte dauerhaft entschluesselt hat
    #[serde(default)]
    pub is_decrypted: bool,
    #[serde(default)]
    pub last_synchronization: Option<DateTime<Utc>>,
}

impl Pruefung {
    /// Gibt true zurueck wenn die Pruefung zum Zeitpunkt `jetzt` begonnen hat
    pub fn hat_begonnen(&self, jetzt: DateTime<Utc>) -> bool {
        self.starts_at <= jetzt
    }
}

// ---------------------------------------------------------------------------
// Fragen
// ---------------------------------------------------------------------------

/// Darstellungszustand einer Frage. Teilzustaende gibt es nicht.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Darstellung {
    /// `content`, `choices[0]` und ggf. `answer` sind Ciphertext
    #[default]
    Encrypted,
    /// Alle Felder sind Klartext, `choices` enthaelt die echten Auswahlen
    Decrypted,
}

impl Darstellung {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Encrypted => "encrypted",
            Self::Decrypted => "decrypted",
        }
    }
}

impl std::str::FromStr for Darstellung {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "encrypted" => Ok(Self::Encrypted),
            "decrypted" => Ok(Self::Decrypted),
            other => Err(format!("Unbekannte Darstellung: {other}")),
        }
    }
}

/// Eine Pruefungsfrage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frage {
    /// 1-basierte Position innerhalb der Pruefung
    pub number: u32,
    pub content: String,
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default)]
    pub representation: Darstellung,
}

impl Frage {
    pub fn ist_verschluesselt(&self) -> bool {
        self.representation == Darstellung::Encrypted
    }
}

// ---------------------------------------------------------------------------
// Pruefungsort
// ---------------------------------------------------------------------------

/// Pruefungsort (Venue)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pruefungsort {
    pub id: VenueId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Benutzer & Teilnahmen
// ---------------------------------------------------------------------------

/// Rolle eines Benutzers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rolle {
    Admin,
    Organizer,
    Local,
    Participant,
}

impl Rolle {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Organizer => "organizer",
            Self::Local => "local",
            Self::Participant => "participant",
        }
    }
}

impl std::str::FromStr for Rolle {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "organizer" => Ok(Self::Organizer),
            "local" => Ok(Self::Local),
            "participant" => Ok(Self::Participant),
            other => Err(format!("Unbekannte Rolle: {other}")),
        }
    }
}

/// Benutzer wie er im Bundle transportiert wird
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Benutzer {
    pub username: String,
    pub name: String,
    pub role: Rolle,
    #[serde(default)]
    pub password_hash: String,
}

/// Teilnahme eines Benutzers an einer Pruefung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teilnahme {
    pub username: String,
    /// sha256hex(sha256hex(geheimnis))
    pub key_hashed_twice: String,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
}

/// Status einer Teilnahme fuer die Aufsicht vor Ort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeilnahmeStatus {
    pub username: String,
    pub verified_at: Option<DateTime<Utc>>,
    /// Anzahl abgegebener Antworten
    pub answered: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn beispiel_pruefung() -> Pruefung {
        let jetzt = Utc::now();
        Pruefung {
            slug: EventSlug::from("ujian-fisika"),
            title: "Ujian Fisika".into(),
            description: String::new(),
            starts_at: jetzt - Duration::hours(1),
            ends_at: jetzt + Duration::hours(1),
            key_check: "ab".repeat(32),
            is_decrypted: false,
            last_synchronization: None,
        }
    }

    #[test]
    fn pruefung_hat_begonnen() {
        let p = beispiel_pruefung();
        assert!(p.hat_begonnen(Utc::now()));
        assert!(!p.hat_begonnen(p.starts_at - Duration::seconds(1)));
    }

    #[test]
    fn pruefung_json_ist_camel_case() {
        let json = serde_json::to_value(beispiel_pruefung()).unwrap();
        assert!(json.get("startsAt").is_some());
        assert!(json.get("isDecrypted").is_some());
        assert!(json.get("lastSynchronization").is_some());
    }

    #[test]
    fn frage_ohne_antwort_laesst_feld_weg() {
        let f = Frage {
            number: 1,
            content: "abc".into(),
            choices: vec!["xyz".into()],
            answer: None,
            representation: Darstellung::Encrypted,
        };
        let json = serde_json::to_value(&f).unwrap();
        assert!(json.get("answer").is_none());
        assert_eq!(json["representation"], "encrypted");
    }

    #[test]
    fn darstellung_aus_string() {
        assert_eq!("encrypted".parse::<Darstellung>().unwrap(), Darstellung::Encrypted);
        assert_eq!("decrypted".parse::<Darstellung>().unwrap(), Darstellung::Decrypted);
        assert!("halb".parse::<Darstellung>().is_err());
    }

    #[test]
    fn rolle_roundtrip_ueber_string() {
        for rolle in [Rolle::Admin, Rolle::Organizer, Rolle::Local, Rolle::Participant] {
            assert_eq!(rolle.als_str().parse::<Rolle>().unwrap(), rolle);
        }
    }
}
