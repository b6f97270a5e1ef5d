//! Grenzoperationen zwischen Client und zentralem Speicher
//!
//! `Transport` ist die einzige Stelle, an der Daten die Vertrauensgrenze
//! ueberqueren. Jede Operation ist genau eine Anfrage mit einer Antwort;
//! Wiederholung und Backoff sind Sache des Aufrufers.
//!
//! `LokalerTransport` spricht direkt mit einem `PruefungsDienst` im selben
//! Prozess (Pruefungsort-Kopie, Tests, Operator-Werkzeug).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use klausur_core::{
    EventSlug, Frage, KlausurError, Pruefung, Result, SynchronizationBundle, TeilnahmeStatus,
};
use klausur_crypto::WireCiphertext;
use klausur_db::{Anfrager, KlausurSpeicher, PruefungsDienst};

#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync {
    async fn pruefung_abrufen(&self, slug: &EventSlug) -> Result<Pruefung>;

    /// Fragen in gespeicherter Darstellung, ggf. mit eigener Antwort
    async fn fragen_abrufen(&self, slug: &EventSlug) -> Result<Vec<Frage>>;

    /// Reicht den Fingerprint (nie das Geheimnis) zur Verifikation ein
    async fn fingerprint_verifizieren(&self, slug: &EventSlug, fingerprint: &str) -> Result<()>;

    /// Privilegiert: uebergibt das Geheimnis zur dauerhaften Entschluesselung
    async fn dauerhaft_entschluesseln(&self, slug: &EventSlug, secret: &str) -> Result<bool>;

    async fn antwort_einreichen(
        &self,
        slug: &EventSlug,
        nummer: u32,
        answer: &WireCiphertext,
    ) -> Result<Frage>;

    async fn teilnahme_status(&self, slug: &EventSlug) -> Result<Vec<TeilnahmeStatus>>;

    async fn bundle_erfassen(&self, slug: &EventSlug) -> Result<SynchronizationBundle>;

    /// Liefert den vom Speicher gesetzten Synchronisationszeitpunkt
    async fn bundle_anwenden(&self, bundle: &SynchronizationBundle) -> Result<DateTime<Utc>>;
}

/// Transport gegen einen `PruefungsDienst` im selben Prozess
#[derive(Debug)]
pub struct LokalerTransport<S> {
    dienst: Arc<PruefungsDienst<S>>,
    anfrager: Anfrager,
}

impl<S> Clone for LokalerTransport<S> {
    fn clone(&self) -> Self {
        Self {
            dienst: Arc::clone(&self.dienst),
            anfrager: self.anfrager.clone(),
        }
    }
}

impl<S: KlausurSpeicher> LokalerTransport<S> {
    pub fn new(dienst: Arc<PruefungsDienst<S>>, anfrager: Anfrager) -> Self {
        Self { dienst, anfrager }
    }

    pub fn anfrager(&self) -> &Anfrager {
        &self.anfrager
    }

    /// Derselbe Dienst, anderer Anfrager
    pub fn als(&self, anfrager: Anfrager) -> Self {
        Self::new(Arc::clone(&self.dienst), anfrager)
    }
}

/// Speicherfehler sind fuer den Client opake Transportfehler
fn grenze(e: KlausurError) -> KlausurError {
    match e {
        KlausurError::Datenbank(msg) => KlausurError::Transport(msg),
        andere => andere,
    }
}

impl<S: KlausurSpeicher> Transport for LokalerTransport<S> {
    async fn pruefung_abrufen(&self, slug: &EventSlug) -> Result<Pruefung> {
        self.dienst.pruefung_laden(slug).await.map_err(grenze)
    }

    async fn fragen_abrufen(&self, slug: &EventSlug) -> Result<Vec<Frage>> {
        self.dienst
            .fragen_abrufen(slug, &self.anfrager)
            .await
            .map_err(grenze)
    }

    async fn fingerprint_verifizieren(&self, slug: &EventSlug, fingerprint: &str) -> Result<()> {
        self.dienst
            .fingerprint_verifizieren(slug, &self.anfrager.username, fingerprint)
            .await
            .map_err(grenze)
    }

    async fn dauerhaft_entschluesseln(&self, slug: &EventSlug, secret: &str) -> Result<bool> {
        self.dienst
            .dauerhaft_entschluesseln(slug, &self.anfrager, secret)
            .await
            .map_err(grenze)
    }

    async fn antwort_einreichen(
        &self,
        slug: &EventSlug,
        nummer: u32,
        answer: &WireCiphertext,
    ) -> Result<Frage> {
        self.dienst
            .antwort_einreichen(slug, &self.anfrager, nummer, answer)
            .await
            .map_err(grenze)
    }

    async fn teilnahme_status(&self, slug: &EventSlug) -> Result<Vec<TeilnahmeStatus>> {
        self.dienst
            .teilnahme_status(slug, &self.anfrager)
            .await
            .map_err(grenze)
    }

    async fn bundle_erfassen(&self, slug: &EventSlug) -> Result<SynchronizationBundle> {
        self.dienst
            .synchronisation_erfassen(slug, &self.anfrager)
            .await
            .map_err(grenze)
    }

    async fn bundle_anwenden(&self, bundle: &SynchronizationBundle) -> Result<DateTime<Utc>> {
        self.dienst
            .synchronisation_anwenden(bundle, &self.anfrager)
            .await
            .map_err(grenze)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datenbankfehler_wird_transportfehler() {
        let e = grenze(KlausurError::Datenbank("locked".into()));
        assert!(matches!(e, KlausurError::Transport(ref m) if m == "locked"));
        assert!(e.ist_wiederholbar());
    }

    #[test]
    fn fachliche_fehler_bleiben_erhalten() {
        let e = grenze(KlausurError::VerifikationAbgelehnt {
            slug: "ujian".into(),
        });
        assert!(matches!(e, KlausurError::VerifikationAbgelehnt { .. }));
    }
}
