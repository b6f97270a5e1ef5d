//! Fachliche Operationen des zentralen Pruefungsspeichers
//!
//! `PruefungsDienst` verbindet die Repositories mit der Kryptografie:
//! Fragen werden beim Verfassen verschluesselt, Fingerprints gegen den
//! gespeicherten Pruefwert geprueft und die dauerhafte Entschluesselung
//! als eine Transaktion ausgefuehrt. Das Geheimnis selbst wird nie
//! gespeichert.

use chrono::{DateTime, Utc};

use klausur_core::{
    Benutzer, Darstellung, EventSlug, Frage, KlausurError, Pruefung, Pruefungsort, Result, Rolle,
    SynchronizationBundle, Teilnahme, TeilnahmeStatus,
};
use klausur_crypto::{
    fingerprint, fingerprint_pruefen, pruefwert_berechnen, AbgeleiteterSchluessel,
    ChoiceSetCodec, CipherCodec, ContentDecryptionView, Encoding, SubmissionCodec,
    WireCiphertext,
};

use crate::models::{Abgabe, NeuePruefung};
use crate::repository::KlausurSpeicher;

/// Wer eine Anfrage stellt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anfrager {
    pub username: String,
    pub rolle: Rolle,
}

impl Anfrager {
    pub fn new(username: impl Into<String>, rolle: Rolle) -> Self {
        Self {
            username: username.into(),
            rolle,
        }
    }

    pub fn teilnehmer(username: impl Into<String>) -> Self {
        Self::new(username, Rolle::Participant)
    }

    /// Aufsicht am Pruefungsort
    pub fn lokal(username: impl Into<String>) -> Self {
        Self::new(username, Rolle::Local)
    }

    /// Admin und Organisator sehen Fragen auch vor Beginn
    fn ist_verwaltung(&self) -> bool {
        matches!(self.rolle, Rolle::Admin | Rolle::Organizer)
    }

    /// Nur Aufsicht und Admin; sonst `KeineBerechtigung(grund)`
    fn aufsicht_verlangen(&self, grund: &str) -> Result<()> {
        if matches!(self.rolle, Rolle::Local | Rolle::Admin) {
            Ok(())
        } else {
            Err(KlausurError::KeineBerechtigung(grund.into()))
        }
    }
}

/// Zentraler Pruefungsdienst ueber einem beliebigen Speicher
#[derive(Debug, Clone)]
pub struct PruefungsDienst<S> {
    speicher: S,
    cipher: CipherCodec,
}

impl<S: KlausurSpeicher> PruefungsDienst<S> {
    pub fn new(speicher: S, cipher: CipherCodec) -> Self {
        Self { speicher, cipher }
    }

    pub fn speicher(&self) -> &S {
        &self.speicher
    }

    pub fn cipher(&self) -> &CipherCodec {
        &self.cipher
    }

    // -----------------------------------------------------------------------
    // Verfassen
    // -----------------------------------------------------------------------

    /// Legt eine Pruefung an. Gespeichert wird nur der Pruefwert des Geheimnisses.
    pub async fn pruefung_anlegen(
        &self,
        neue: NeuePruefung,
        venue: &Pruefungsort,
        secret: &str,
    ) -> Result<Pruefung> {
        if !neue.slug.ist_gueltig() {
            return Err(KlausurError::Konfiguration(format!(
                "Ungueltiger Slug '{}'",
                neue.slug
            )));
        }
        // Schluesselmaterial frueh pruefen, nicht erst beim ersten Verschluesseln
        self.cipher.schluessel(secret)?;

        let pruefung = Pruefung {
            slug: neue.slug,
            title: neue.title,
            description: neue.description,
            starts_at: neue.starts_at,
            ends_at: neue.ends_at,
            key_check: pruefwert_berechnen(&fingerprint(secret)),
            is_decrypted: false,
            last_synchronization: None,
        };

        self.speicher.venue_speichern(venue).await?;
        self.speicher
            .event_anlegen(&pruefung, venue.id)
            .await
            .map_err(|e| {
                if e.ist_eindeutigkeit() {
                    KlausurError::PruefungExistiert(pruefung.slug.to_string())
                } else {
                    e.into()
                }
            })?;

        tracing::info!(slug = %pruefung.slug, venue = %venue.id, "Pruefung angelegt");
        Ok(pruefung)
    }

    /// Verschluesselt Inhalt und Auswahl mit dem Pruefungsgeheimnis und
    /// haengt die Frage an
    pub async fn frage_verfassen(
        &self,
        slug: &EventSlug,
        content: &str,
        choices: &[String],
        secret: &str,
    ) -> Result<Frage> {
        let pruefung = self.pruefung_laden(slug).await?;
        geheimnis_pruefen(&pruefung, secret)?;

        let frage = if pruefung.is_decrypted {
            Frage {
                number: 0,
                content: content.to_string(),
                choices: choices.iter().filter(|c| !c.is_empty()).cloned().collect(),
                answer: None,
                representation: Darstellung::Decrypted,
            }
        } else {
            let schluessel = self.cipher.schluessel(secret)?;
            let auswahl = ChoiceSetCodec::new(self.cipher.clone()).pack_mit(
                choices,
                &schluessel,
                Encoding::Base64,
            )?;
            Frage {
                number: 0,
                content: self
                    .cipher
                    .encrypt_mit(content, &schluessel, Encoding::Base64)?
                    .into_text(),
                choices: vec![auswahl.into_text()],
                answer: None,
                representation: Darstellung::Encrypted,
            }
        };

        let gespeichert = self.speicher.frage_anhaengen(slug, &frage).await?;
        tracing::debug!(slug = %slug, nummer = gespeichert.number, "Frage verfasst");
        Ok(gespeichert)
    }

    /// Registriert einen Benutzer als Teilnehmer. Sein Pruefwert ist der
    /// der Pruefung, da Verifikation und Entschluesselung dasselbe
    /// Geheimnis verwenden.
    pub async fn teilnahme_registrieren(
        &self,
        slug: &EventSlug,
        benutzer: &Benutzer,
    ) -> Result<Teilnahme> {
        let pruefung = self.pruefung_laden(slug).await?;
        self.speicher.benutzer_speichern(benutzer).await?;

        let teilnahme = Teilnahme {
            username: benutzer.username.clone(),
            key_hashed_twice: pruefung.key_check,
            verified_at: None,
        };
        self.speicher.teilnahme_speichern(slug, &teilnahme).await?;

        tracing::info!(slug = %slug, username = %benutzer.username, "Teilnahme registriert");
        Ok(teilnahme)
    }

    // -----------------------------------------------------------------------
    // Lesen
    // -----------------------------------------------------------------------

    pub async fn pruefung_laden(&self, slug: &EventSlug) -> Result<Pruefung> {
        self.speicher
            .event_laden(slug)
            .await?
            .ok_or_else(|| KlausurError::PruefungNichtGefunden(slug.to_string()))
    }

    pub async fn pruefungen_auflisten(&self) -> Result<Vec<Pruefung>> {
        Ok(self.speicher.events_auflisten().await?)
    }

    /// Fragen in gespeicherter Darstellung.
    ///
    /// Teilnehmer und Aufsicht erhalten sie erst ab Beginn der Pruefung;
    /// Teilnehmer bekommen ihre eigenen Antworten mitgeliefert.
    pub async fn fragen_abrufen(
        &self,
        slug: &EventSlug,
        anfrager: &Anfrager,
    ) -> Result<Vec<Frage>> {
        self.zugang_pruefen(slug, anfrager, Utc::now()).await?;
        let mut fragen = self.speicher.fragen_laden(slug).await?;

        if anfrager.rolle == Rolle::Participant {
            let mut antworten = self
                .speicher
                .antworten_laden(slug, &anfrager.username)
                .await?;
            for frage in &mut fragen {
                frage.answer = antworten.remove(&frage.number);
            }
        }
        Ok(fragen)
    }

    pub async fn frage_abrufen(
        &self,
        slug: &EventSlug,
        nummer: u32,
        anfrager: &Anfrager,
    ) -> Result<Frage> {
        self.zugang_pruefen(slug, anfrager, Utc::now()).await?;
        let mut frage = self
            .speicher
            .frage_laden(slug, nummer)
            .await?
            .ok_or_else(|| KlausurError::FrageNichtGefunden {
                slug: slug.to_string(),
                nummer,
            })?;

        if anfrager.rolle == Rolle::Participant {
            frage.answer = self
                .speicher
                .antworten_laden(slug, &anfrager.username)
                .await?
                .remove(&nummer);
        }
        Ok(frage)
    }

    pub async fn teilnahme_status(
        &self,
        slug: &EventSlug,
        anfrager: &Anfrager,
    ) -> Result<Vec<TeilnahmeStatus>> {
        anfrager.aufsicht_verlangen("Teilnahmestatus nur fuer die Aufsicht")?;
        self.pruefung_laden(slug).await?;
        Ok(self.speicher.teilnahme_status(slug).await?)
    }

    // -----------------------------------------------------------------------
    // Verifikation & Abgabe
    // -----------------------------------------------------------------------

    /// Prueft den Fingerprint eines Teilnehmers gegen seinen Pruefwert.
    ///
    /// Bei Erfolg wird der Zeitpunkt vermerkt; bei Misserfolg bleibt
    /// alles unveraendert.
    pub async fn fingerprint_verifizieren(
        &self,
        slug: &EventSlug,
        username: &str,
        fingerprint: &str,
    ) -> Result<()> {
        let teilnahme = self
            .speicher
            .teilnahme_laden(slug, username)
            .await?
            .ok_or_else(|| KlausurError::TeilnahmeNichtGefunden {
                slug: slug.to_string(),
                username: username.to_string(),
            })?;

        if !fingerprint_pruefen(fingerprint, &teilnahme.key_hashed_twice) {
            tracing::warn!(slug = %slug, username, "Fingerprint abgelehnt");
            return Err(KlausurError::VerifikationAbgelehnt {
                slug: slug.to_string(),
            });
        }

        self.speicher
            .als_verifiziert_markieren(slug, username, Utc::now())
            .await?;
        tracing::info!(slug = %slug, username, "Teilnahme verifiziert");
        Ok(())
    }

    /// Speichert eine vom Client verschluesselte Antwort (Hex-Form) und
    /// liefert die Frage mit dieser Antwort zurueck
    pub async fn antwort_einreichen(
        &self,
        slug: &EventSlug,
        anfrager: &Anfrager,
        nummer: u32,
        answer: &WireCiphertext,
    ) -> Result<Frage> {
        if anfrager.rolle != Rolle::Participant {
            return Err(KlausurError::KeineBerechtigung(
                "Nur Teilnehmer geben Antworten ab".into(),
            ));
        }
        if answer.encoding != Encoding::Hex {
            return Err(klausur_crypto::CryptoError::FalscheKodierung {
                erwartet: Encoding::Hex,
                erhalten: answer.encoding,
            }
            .into());
        }

        let pruefung = self.zugang_pruefen(slug, anfrager, Utc::now()).await?;
        if pruefung.is_decrypted {
            return Err(KlausurError::EntschluesselungsZustand(format!(
                "Pruefung '{slug}' ist bereits dauerhaft entschluesselt"
            )));
        }
        if self
            .speicher
            .teilnahme_laden(slug, &anfrager.username)
            .await?
            .is_none()
        {
            return Err(KlausurError::TeilnahmeNichtGefunden {
                slug: slug.to_string(),
                username: anfrager.username.clone(),
            });
        }

        let mut frage = self
            .speicher
            .frage_laden(slug, nummer)
            .await?
            .ok_or_else(|| KlausurError::FrageNichtGefunden {
                slug: slug.to_string(),
                nummer,
            })?;

        self.speicher
            .antwort_speichern(slug, &anfrager.username, nummer, answer.as_str(), Utc::now())
            .await?;

        frage.answer = Some(answer.as_str().to_string());
        Ok(frage)
    }

    // -----------------------------------------------------------------------
    // Dauerhafte Entschluesselung
    // -----------------------------------------------------------------------

    /// Entschluesselt Fragen und Antworten der Pruefung dauerhaft.
    ///
    /// Liefert `false`, wenn die Pruefung bereits entschluesselt war. Das
    /// Geheimnis wird vorher gegen den Pruefwert geprueft; schlaegt ein
    /// Schritt fehl, bleibt der Speicher unveraendert.
    pub async fn dauerhaft_entschluesseln(
        &self,
        slug: &EventSlug,
        anfrager: &Anfrager,
        secret: &str,
    ) -> Result<bool> {
        anfrager.aufsicht_verlangen("Dauerhafte Entschluesselung nur durch die Aufsicht")?;

        let pruefung = self.pruefung_laden(slug).await?;
        geheimnis_pruefen(&pruefung, secret)?;
        if pruefung.is_decrypted {
            tracing::debug!(slug = %slug, "Pruefung bereits entschluesselt");
            return Ok(false);
        }

        let schluessel = self.cipher.schluessel(secret)?;
        let (fragen, abgaben) = match self.klartext_vorbereiten(slug, &schluessel).await {
            Ok(klartext) => klartext,
            Err(e) => {
                // Eine parallele Entschluesselung kann zwischen Flag und
                // Fragen gelaufen sein
                if self.pruefung_laden(slug).await?.is_decrypted {
                    tracing::debug!(slug = %slug, fehler = %e, "Pruefung parallel entschluesselt");
                    return Ok(false);
                }
                return Err(e);
            }
        };

        let neu = self
            .speicher
            .entschluesselung_uebernehmen(slug, &fragen, &abgaben, Utc::now())
            .await?;
        if !neu {
            tracing::debug!(slug = %slug, "Pruefung parallel entschluesselt");
            return Ok(false);
        }

        tracing::info!(
            slug = %slug,
            fragen = fragen.len(),
            abgaben = abgaben.len(),
            "Pruefung dauerhaft entschluesselt"
        );
        Ok(true)
    }

    /// Entschluesselt alle gespeicherten Fragen und Antworten im Speicher
    /// des Prozesses, ohne etwas zurueckzuschreiben
    async fn klartext_vorbereiten(
        &self,
        slug: &EventSlug,
        schluessel: &AbgeleiteterSchluessel,
    ) -> Result<(Vec<Frage>, Vec<Abgabe>)> {
        let view = ContentDecryptionView::new(self.cipher.clone());
        let antworten = SubmissionCodec::new(self.cipher.clone());

        let fragen = self
            .speicher
            .fragen_laden(slug)
            .await?
            .iter()
            .map(|f| view.frage_entschluesseln(f, schluessel))
            .collect::<klausur_crypto::CryptoResult<Vec<_>>>()?;

        let abgaben = self
            .speicher
            .alle_abgaben(slug)
            .await?
            .into_iter()
            .map(|a| -> Result<Abgabe> {
                let klartext = antworten
                    .decode_submission_mit(&WireCiphertext::hex(a.answer.as_str()), schluessel)?;
                Ok(Abgabe {
                    answer: klartext,
                    ..a
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((fragen, abgaben))
    }

    // -----------------------------------------------------------------------
    // Synchronisation
    // -----------------------------------------------------------------------

    pub async fn synchronisation_erfassen(
        &self,
        slug: &EventSlug,
        anfrager: &Anfrager,
    ) -> Result<SynchronizationBundle> {
        anfrager.aufsicht_verlangen("Bundle-Export nur durch die Aufsicht")?;
        let bundle = self
            .speicher
            .bundle_erfassen(slug)
            .await?
            .ok_or_else(|| KlausurError::PruefungNichtGefunden(slug.to_string()))?;

        tracing::info!(
            slug = %slug,
            fragen = bundle.questions.len(),
            benutzer = bundle.users.len(),
            "Synchronisations-Bundle erfasst"
        );
        Ok(bundle)
    }

    /// Prueft und wendet ein Bundle an; liefert den Synchronisationszeitpunkt
    pub async fn synchronisation_anwenden(
        &self,
        bundle: &SynchronizationBundle,
        anfrager: &Anfrager,
    ) -> Result<DateTime<Utc>> {
        anfrager.aufsicht_verlangen("Bundle-Import nur durch die Aufsicht")?;
        bundle.validieren()?;
        let jetzt = Utc::now();
        self.speicher.bundle_anwenden(bundle, jetzt).await?;
        Ok(jetzt)
    }

    /// Laedt die Pruefung und wendet die Startzeit-Sperre an
    async fn zugang_pruefen(
        &self,
        slug: &EventSlug,
        anfrager: &Anfrager,
        jetzt: DateTime<Utc>,
    ) -> Result<Pruefung> {
        let pruefung = self.pruefung_laden(slug).await?;
        if !anfrager.ist_verwaltung() && !pruefung.hat_begonnen(jetzt) {
            return Err(KlausurError::PruefungNichtGestartet(slug.to_string()));
        }
        Ok(pruefung)
    }
}

fn geheimnis_pruefen(pruefung: &Pruefung, secret: &str) -> Result<()> {
    if fingerprint_pruefen(&fingerprint(secret), &pruefung.key_check) {
        Ok(())
    } else {
        Err(KlausurError::VerifikationAbgelehnt {
            slug: pruefung.slug.to_string(),
        })
    }
}
