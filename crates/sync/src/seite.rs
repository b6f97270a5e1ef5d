//! Orchestrierung einer Pruefungsseite im Client
//!
//! `EventSeite` verbindet Transport, Geheimnisspeicher, Cache und Bus:
//!
//! ```text
//! geheimnis_verifizieren -> SecretStore
//! fragen_anzeigen        -> Cache/Transport -> ContentDecryptionView
//! antwort_abgeben        -> SubmissionCodec -> Transport
//! bundle_anwenden        -> Transport -> Cache invalidieren -> Bus
//! abmelden               -> SecretStore leeren
//! ```
//!
//! Schlaegt eine Grenzoperation fehl, bleiben Geheimnisse und Cache
//! unveraendert.

use std::sync::Arc;

use klausur_core::{
    CacheBereich, Darstellung, EventBus, EventEmpfaenger, EventSlug, Frage, KlausurEvent,
    Pruefung, SynchronizationBundle, TeilnahmeStatus,
};
use klausur_crypto::{
    fingerprint, CipherCodec, ContentDecryptionView, ParticipationSecret, SecretStore,
    SubmissionCodec,
};

use crate::bundle::BundleAck;
use crate::cache::EventCache;
use crate::error::SyncResult;
use crate::transport::Transport;

pub struct EventSeite<T> {
    transport: T,
    geheimnisse: Arc<SecretStore>,
    cache: Arc<EventCache>,
    bus: Arc<dyn EventBus>,
    view: ContentDecryptionView,
    antworten: SubmissionCodec,
}

impl<T: Transport> EventSeite<T> {
    pub fn new(transport: T, cipher: CipherCodec, bus: Arc<dyn EventBus>) -> Self {
        Self {
            transport,
            geheimnisse: Arc::new(SecretStore::new()),
            cache: Arc::new(EventCache::new()),
            bus,
            view: ContentDecryptionView::new(cipher.clone()),
            antworten: SubmissionCodec::new(cipher),
        }
    }

    /// Teilt Geheimnisspeicher und Cache mit anderen Seiten derselben Sitzung
    pub fn mit_sitzung(mut self, geheimnisse: Arc<SecretStore>, cache: Arc<EventCache>) -> Self {
        self.geheimnisse = geheimnisse;
        self.cache = cache;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn geheimnisse(&self) -> &Arc<SecretStore> {
        &self.geheimnisse
    }

    pub fn cache(&self) -> &Arc<EventCache> {
        &self.cache
    }

    // -----------------------------------------------------------------------
    // Verifikation
    // -----------------------------------------------------------------------

    /// Schickt den Fingerprint des Geheimnisses zur Verifikation.
    ///
    /// Nur bei Erfolg wird das Geheimnis fuer diese Pruefung hinterlegt.
    pub async fn geheimnis_verifizieren(
        &self,
        slug: &EventSlug,
        geheimnis: ParticipationSecret,
    ) -> SyncResult<()> {
        let fp = fingerprint(geheimnis.offenlegen());
        self.transport.fingerprint_verifizieren(slug, &fp).await?;

        self.geheimnisse.hinterlegen(slug.clone(), geheimnis);
        self.bus
            .senden(KlausurEvent::GeheimnisHinterlegt { slug: slug.clone() })?;
        Ok(())
    }

    pub fn ist_verifiziert(&self, slug: &EventSlug) -> bool {
        self.geheimnisse.enthaelt(slug)
    }

    // -----------------------------------------------------------------------
    // Lesen
    // -----------------------------------------------------------------------

    pub async fn pruefung(&self, slug: &EventSlug) -> SyncResult<Pruefung> {
        if let Some(pruefung) = self.cache.pruefung(slug) {
            return Ok(pruefung);
        }
        let pruefung = self.transport.pruefung_abrufen(slug).await?;
        self.cache.pruefung_setzen(pruefung.clone());
        Ok(pruefung)
    }

    /// Fragen in gespeicherter Darstellung
    pub async fn fragen(&self, slug: &EventSlug) -> SyncResult<Vec<Frage>> {
        if let Some(fragen) = self.cache.fragen(slug) {
            return Ok(fragen);
        }
        let fragen = self.transport.fragen_abrufen(slug).await?;
        self.cache.fragen_setzen(slug, fragen.clone());
        Ok(fragen)
    }

    /// Fragen zur Anzeige.
    ///
    /// Verschluesselte Fragen werden mit dem verifizierten Geheimnis
    /// fluechtig entschluesselt; dauerhaft entschluesselte kommen
    /// unveraendert zurueck.
    pub async fn fragen_anzeigen(&self, slug: &EventSlug) -> SyncResult<Vec<Frage>> {
        let fragen = self.fragen(slug).await?;
        if fragen
            .iter()
            .all(|f| f.representation == Darstellung::Decrypted)
        {
            return Ok(fragen);
        }
        Ok(self.view.reveal_fuer(&self.geheimnisse, slug, &fragen)?)
    }

    pub async fn teilnahme_status(&self, slug: &EventSlug) -> SyncResult<Vec<TeilnahmeStatus>> {
        if let Some(status) = self.cache.teilnahmen(slug) {
            return Ok(status);
        }
        let status = self.transport.teilnahme_status(slug).await?;
        self.cache.teilnahmen_setzen(slug, status.clone());
        Ok(status)
    }

    // -----------------------------------------------------------------------
    // Schreiben
    // -----------------------------------------------------------------------

    /// Verschluesselt die gewaehlte Antwort lokal und reicht sie ein.
    ///
    /// Liefert die Frage so, wie der Speicher sie zurueckgibt (mit der
    /// verschluesselten Antwort).
    pub async fn antwort_abgeben(
        &self,
        slug: &EventSlug,
        nummer: u32,
        answer: &str,
    ) -> SyncResult<Frage> {
        let wire = self.antworten.encode_fuer(&self.geheimnisse, slug, answer)?;
        let frage = self.transport.antwort_einreichen(slug, nummer, &wire).await?;

        self.cache
            .invalidieren(slug, &[CacheBereich::Fragen, CacheBereich::Teilnahmen]);
        Ok(frage)
    }

    /// Privilegiert: uebergibt das verifizierte Geheimnis zur dauerhaften
    /// Entschluesselung im Speicher
    pub async fn dauerhaft_entschluesseln(&self, slug: &EventSlug) -> SyncResult<bool> {
        let geheimnis = self.geheimnisse.geheimnis(slug)?;
        self.dauerhaft_entschluesseln_mit(slug, &geheimnis).await
    }

    /// Wie `dauerhaft_entschluesseln`, aber mit einem Geheimnis, das nicht
    /// in der Sitzung liegt. Der Speicher prueft es gegen den Pruefwert;
    /// hinterlegt wird es nie.
    pub async fn dauerhaft_entschluesseln_mit(
        &self,
        slug: &EventSlug,
        geheimnis: &ParticipationSecret,
    ) -> SyncResult<bool> {
        let neu = self
            .transport
            .dauerhaft_entschluesseln(slug, geheimnis.offenlegen())
            .await?;

        self.cache.invalidieren(slug, &CacheBereich::ALLE);
        if neu {
            self.bus
                .senden(KlausurEvent::PruefungEntschluesselt { slug: slug.clone() })?;
        }
        Ok(neu)
    }

    // -----------------------------------------------------------------------
    // Synchronisation
    // -----------------------------------------------------------------------

    pub async fn bundle_erfassen(&self, slug: &EventSlug) -> SyncResult<SynchronizationBundle> {
        Ok(self.transport.bundle_erfassen(slug).await?)
    }

    /// Wendet ein Bundle an und erklaert alle Sichten der Pruefung fuer
    /// veraltet, lokal und fuer alle Abonnenten des Bus
    pub async fn bundle_anwenden(&self, bundle: &SynchronizationBundle) -> SyncResult<BundleAck> {
        bundle.validieren()?;
        let zeitpunkt = self.transport.bundle_anwenden(bundle).await?;

        let ack = BundleAck::new(bundle.slug().clone(), zeitpunkt);
        self.cache.invalidieren(&ack.slug, &ack.invalidiert);
        self.bus.senden(KlausurEvent::CacheInvalidiert {
            slug: ack.slug.clone(),
            bereiche: ack.invalidiert.clone(),
        })?;

        tracing::info!(slug = %ack.slug, "Bundle angewendet, Sichten invalidiert");
        Ok(ack)
    }

    // -----------------------------------------------------------------------
    // Sitzung
    // -----------------------------------------------------------------------

    /// Wendet anstehende Ereignisse anderer Seiten auf den eigenen Cache an
    pub fn ereignisse_verarbeiten(&self, empfaenger: &mut dyn EventEmpfaenger) -> usize {
        let mut angewendet = 0;
        while let Some(event) = empfaenger.empfangen() {
            if self.cache.ereignis_anwenden(&event) {
                angewendet += 1;
            }
        }
        angewendet
    }

    /// Verwirft alle Geheimnisse der Sitzung
    pub fn abmelden(&self) -> SyncResult<()> {
        self.geheimnisse.leeren();
        self.cache.leeren();
        self.bus.senden(KlausurEvent::SitzungBeendet)?;
        Ok(())
    }
}
