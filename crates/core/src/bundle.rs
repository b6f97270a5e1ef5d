//! Synchronisations-Bundle
//!
//! Ein unveraenderlicher Schnappschuss einer Pruefung fuer den Transport
//! zwischen zentralem Speicher und einer getrennten Pruefungsort-Kopie.
//! Das Bundle ist reine Datensammlung; Fragen liegen darin in der
//! Darstellung, in der sie gespeichert sind (ueblicherweise verschluesselt).
//!
//! ## Wire-Format (JSON)
//! ```text
//! { "event": {..}, "venue": {..}, "questions": [..],
//!   "users": [..], "participations": [..] }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{KlausurError, Result};
use crate::models::{Benutzer, Frage, Pruefung, Pruefungsort, Teilnahme};
use crate::types::EventSlug;

/// Schnappschuss {Pruefung, Ort, Fragen, Benutzer, Teilnahmen}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynchronizationBundle {
    pub event: Pruefung,
    pub venue: Pruefungsort,
    pub questions: Vec<Frage>,
    pub users: Vec<Benutzer>,
    pub participations: Vec<Teilnahme>,
}

impl SynchronizationBundle {
    /// Slug der Pruefung, die dieses Bundle abbildet
    pub fn slug(&self) -> &EventSlug {
        &self.event.slug
    }

    /// Prueft das Bundle vor dem Anwenden.
    ///
    /// Sammelt alle Probleme statt beim ersten abzubrechen, damit die
    /// Aufsicht ein bearbeitetes Bundle in einem Durchgang korrigieren kann.
    pub fn validieren(&self) -> Result<()> {
        let mut probleme = Vec::new();

        if !self.event.slug.ist_gueltig() {
            probleme.push(format!("Ungueltiger Slug '{}'", self.event.slug));
        }
        if self.event.title.trim().is_empty() {
            probleme.push("Pruefung ohne Titel".to_string());
        }
        if self.event.ends_at < self.event.starts_at {
            probleme.push("Pruefung endet vor ihrem Beginn".to_string());
        }
        if self.venue.name.trim().is_empty() {
            probleme.push("Pruefungsort ohne Namen".to_string());
        }

        for (index, frage) in self.questions.iter().enumerate() {
            if frage.content.is_empty() {
                probleme.push(format!("Frage an Position {} ohne Inhalt", index + 1));
            }
        }

        let mut namen = HashSet::new();
        for benutzer in &self.users {
            if !namen.insert(benutzer.username.as_str()) {
                probleme.push(format!("Benutzer '{}' doppelt", benutzer.username));
            }
        }

        let teilnehmer: HashSet<&str> = self
            .participations
            .iter()
            .map(|t| t.username.as_str())
            .collect();
        for benutzer in &self.users {
            if !teilnehmer.contains(benutzer.username.as_str()) {
                probleme.push(format!(
                    "Benutzer '{}' ohne Teilnahme-Schluessel",
                    benutzer.username
                ));
            }
        }
        for teilnahme in &self.participations {
            if !namen.contains(teilnahme.username.as_str()) {
                probleme.push(format!(
                    "Teilnahme fuer unbekannten Benutzer '{}'",
                    teilnahme.username
                ));
            }
        }

        if probleme.is_empty() {
            Ok(())
        } else {
            Err(KlausurError::BundleUngueltig(probleme))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Darstellung, Rolle};
    use crate::types::VenueId;
    use chrono::{Duration, Utc};

    fn bundle() -> SynchronizationBundle {
        let jetzt = Utc::now();
        SynchronizationBundle {
            event: Pruefung {
                slug: EventSlug::from("ujian-fisika"),
                title: "Ujian Fisika".into(),
                description: "Semester 1".into(),
                starts_at: jetzt,
                ends_at: jetzt + Duration::hours(2),
                key_check: String::new(),
                is_decrypted: false,
                last_synchronization: None,
            },
            venue: Pruefungsort {
                id: VenueId::new(),
                name: "Aula".into(),
            },
            questions: vec![Frage {
                number: 1,
                content: "Y2lwaGVy".into(),
                choices: vec!["Y2hvaWNlcw==".into()],
                answer: None,
                representation: Darstellung::Encrypted,
            }],
            users: vec![Benutzer {
                username: "budi".into(),
                name: "Budi".into(),
                role: Rolle::Participant,
                password_hash: "hash".into(),
            }],
            participations: vec![Teilnahme {
                username: "budi".into(),
                key_hashed_twice: "00".repeat(32),
                verified_at: None,
            }],
        }
    }

    #[test]
    fn gueltiges_bundle() {
        assert!(bundle().validieren().is_ok());
    }

    #[test]
    fn fehlende_felder_werden_gesammelt() {
        let mut b = bundle();
        b.event.title = "  ".into();
        b.venue.name = String::new();
        b.questions[0].content = String::new();

        match b.validieren() {
            Err(KlausurError::BundleUngueltig(probleme)) => assert_eq!(probleme.len(), 3),
            other => panic!("BundleUngueltig erwartet, erhalten: {other:?}"),
        }
    }

    #[test]
    fn benutzer_ohne_teilnahme_ist_ungueltig() {
        let mut b = bundle();
        b.participations.clear();
        assert!(matches!(b.validieren(), Err(KlausurError::BundleUngueltig(_))));
    }

    #[test]
    fn doppelte_benutzer_sind_ungueltig() {
        let mut b = bundle();
        let doppelt = b.users[0].clone();
        b.users.push(doppelt);
        assert!(matches!(b.validieren(), Err(KlausurError::BundleUngueltig(_))));
    }

    #[test]
    fn json_feldnamen() {
        let json = serde_json::to_value(bundle()).unwrap();
        for feld in ["event", "venue", "questions", "users", "participations"] {
            assert!(json.get(feld).is_some(), "Feld '{feld}' fehlt");
        }
        assert!(json["participations"][0].get("keyHashedTwice").is_some());
    }
}
