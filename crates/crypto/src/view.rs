//! Fluechtige Entschluesselung von Fragen zur Anzeige
//!
//! `reveal` erzeugt aus verschluesselten Fragen eine entschluesselte Kopie.
//! Die Eingabe bleibt unveraendert, nichts wird zurueckgeschrieben. Die
//! dauerhafte Entschluesselung im zentralen Speicher ist eine eigene,
//! privilegierte Aktion (siehe `klausur-db`).
//!
//! Kodierungen pro Feld:
//! - `content`     Base64 (vom Speicher erzeugt)
//! - `choices[0]`  Base64 (vom Speicher erzeugt, `|`-verbunden)
//! - `answer`      Hex (vom Client erzeugt)

use klausur_core::{Darstellung, EventSlug, Frage};

use crate::choices::ChoiceSetCodec;
use crate::cipher::{AbgeleiteterSchluessel, CipherCodec};
use crate::error::{CryptoError, CryptoResult};
use crate::secret_store::SecretStore;
use crate::submission::SubmissionCodec;
use crate::types::WireCiphertext;

#[derive(Debug, Clone, Default)]
pub struct ContentDecryptionView {
    cipher: CipherCodec,
    choices: ChoiceSetCodec,
    antworten: SubmissionCodec,
}

impl ContentDecryptionView {
    pub fn new(cipher: CipherCodec) -> Self {
        Self {
            choices: ChoiceSetCodec::new(cipher.clone()),
            antworten: SubmissionCodec::new(cipher.clone()),
            cipher,
        }
    }

    /// Entschluesselt alle Fragen oder keine.
    ///
    /// Schlaegt fehl, sobald eine Frage bereits entschluesselt ist oder
    /// nicht genau einen Auswahl-Ciphertext traegt.
    pub fn reveal(&self, questions: &[Frage], secret: &str) -> CryptoResult<Vec<Frage>> {
        let schluessel = self.cipher.schluessel(secret)?;
        let ergebnis = questions
            .iter()
            .map(|frage| self.frage_entschluesseln(frage, &schluessel))
            .collect::<CryptoResult<Vec<_>>>()?;

        tracing::trace!(anzahl = ergebnis.len(), "Fragen zur Anzeige entschluesselt");
        Ok(ergebnis)
    }

    /// Wie `reveal`, mit dem verifizierten Geheimnis der Pruefung
    pub fn reveal_fuer(
        &self,
        store: &SecretStore,
        slug: &EventSlug,
        questions: &[Frage],
    ) -> CryptoResult<Vec<Frage>> {
        let geheimnis = store.geheimnis(slug)?;
        self.reveal(questions, geheimnis.offenlegen())
    }

    pub fn frage_entschluesseln(
        &self,
        frage: &Frage,
        schluessel: &AbgeleiteterSchluessel,
    ) -> CryptoResult<Frage> {
        if !frage.ist_verschluesselt() {
            return Err(CryptoError::BereitsEntschluesselt {
                nummer: frage.number,
            });
        }

        let [auswahl] = frage.choices.as_slice() else {
            return Err(CryptoError::UngueltigeAuswahl(format!(
                "Frage {} traegt {} Auswahl-Ciphertexte statt genau einem",
                frage.number,
                frage.choices.len()
            )));
        };

        let content = self
            .cipher
            .decrypt_mit(&WireCiphertext::base64(frage.content.as_str()), schluessel)?;
        let choices = self
            .choices
            .unpack_mit(&WireCiphertext::base64(auswahl.as_str()), schluessel)?;
        let answer = frage
            .answer
            .as_deref()
            .map(|a| {
                self.antworten
                    .decode_submission_mit(&WireCiphertext::hex(a), schluessel)
            })
            .transpose()?;

        Ok(Frage {
            number: frage.number,
            content,
            choices,
            answer,
            representation: Darstellung::Decrypted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Encoding, ParticipationSecret};

    const GEHEIMNIS: &str = "s3cr3t";

    fn verschluesselte_frage(nummer: u32, antwort: Option<&str>) -> Frage {
        let cipher = CipherCodec::default();
        let choices = ChoiceSetCodec::new(cipher.clone());
        let auswahl: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        Frage {
            number: nummer,
            content: cipher
                .encrypt("Ibu kota Indonesia?", GEHEIMNIS, Encoding::Base64)
                .unwrap()
                .into_text(),
            choices: vec![choices
                .pack(&auswahl, GEHEIMNIS, Encoding::Base64)
                .unwrap()
                .into_text()],
            answer: antwort.map(|a| {
                SubmissionCodec::default()
                    .encode_submission(a, GEHEIMNIS)
                    .unwrap()
                    .into_text()
            }),
            representation: Darstellung::Encrypted,
        }
    }

    #[test]
    fn reveal_entschluesselt_alle_felder() {
        let view = ContentDecryptionView::default();
        let fragen = vec![verschluesselte_frage(1, None), verschluesselte_frage(2, Some("C"))];

        let sicht = view.reveal(&fragen, GEHEIMNIS).unwrap();
        assert_eq!(sicht.len(), 2);
        assert_eq!(sicht[0].content, "Ibu kota Indonesia?");
        assert_eq!(sicht[0].choices, vec!["A", "B", "C", "D"]);
        assert_eq!(sicht[0].answer, None);
        assert_eq!(sicht[1].answer.as_deref(), Some("C"));
        assert!(sicht.iter().all(|f| f.representation == Darstellung::Decrypted));
    }

    #[test]
    fn reveal_veraendert_eingabe_nicht() {
        let view = ContentDecryptionView::default();
        let fragen = vec![verschluesselte_frage(1, Some("A"))];
        let vorher = fragen.clone();
        view.reveal(&fragen, GEHEIMNIS).unwrap();
        assert_eq!(fragen, vorher);
    }

    #[test]
    fn zweimal_reveal_schlaegt_fehl() {
        let view = ContentDecryptionView::default();
        let sicht = view.reveal(&[verschluesselte_frage(1, None)], GEHEIMNIS).unwrap();
        assert!(matches!(
            view.reveal(&sicht, GEHEIMNIS),
            Err(CryptoError::BereitsEntschluesselt { nummer: 1 })
        ));
    }

    #[test]
    fn mehrere_auswahl_ciphertexte_sind_ungueltig() {
        let view = ContentDecryptionView::default();
        let mut frage = verschluesselte_frage(3, None);
        frage.choices.push(frage.choices[0].clone());
        assert!(matches!(
            view.reveal(&[frage], GEHEIMNIS),
            Err(CryptoError::UngueltigeAuswahl(_))
        ));
    }

    #[test]
    fn hex_inhalt_wird_nicht_als_base64_gelesen() {
        let view = ContentDecryptionView::default();
        let mut frage = verschluesselte_frage(1, None);
        // Base64 im Antwortfeld ist ein Kodierungsfehler
        frage.answer = Some(
            CipherCodec::default()
                .encrypt("A", GEHEIMNIS, Encoding::Base64)
                .unwrap()
                .into_text(),
        );
        assert!(view.reveal(&[frage], GEHEIMNIS).is_err());
    }

    #[test]
    fn reveal_nur_mit_hinterlegtem_geheimnis() {
        let view = ContentDecryptionView::default();
        let store = SecretStore::new();
        let slug = EventSlug::from("ujian-fisika");
        let fragen = vec![verschluesselte_frage(1, None)];

        assert!(matches!(
            view.reveal_fuer(&store, &slug, &fragen),
            Err(CryptoError::KeinGeheimnis(_))
        ));

        store.hinterlegen(slug.clone(), ParticipationSecret::new(GEHEIMNIS));
        let sicht = view.reveal_fuer(&store, &slug, &fragen).unwrap();
        assert_eq!(sicht[0].choices.len(), 4);
    }
}
