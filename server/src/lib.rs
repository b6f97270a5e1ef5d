//! klausur-server – Bibliotheks-Root
//!
//! Verbindet Konfiguration, SQLite-Speicher und `EventSeite` zu den
//! Betriebsbefehlen der CLI. Die Befehle laufen als Aufsicht des
//! Pruefungsorts ueber den In-Process-Transport.

pub mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use klausur_core::{EventBus, EventSlug, Frage, Pruefung};
use klausur_crypto::{CipherCodec, ParticipationSecret};
use klausur_db::{Anfrager, PruefungsDienst, SqliteDb};
use klausur_sync::{
    bundle_laden, bundle_speichern, BroadcastBus, BundleAck, EventSeite, LokalerTransport,
};

use config::KlausurConfig;

pub type Seite = EventSeite<LokalerTransport<SqliteDb>>;

/// Haelt Konfiguration, Speicher und Seite einer CLI-Sitzung zusammen
pub struct Anwendung {
    pub config: KlausurConfig,
    dienst: Arc<PruefungsDienst<SqliteDb>>,
    seite: Seite,
}

impl Anwendung {
    /// Oeffnet die konfigurierte Datenbank und fuehrt Migrationen aus
    pub async fn oeffnen(config: KlausurConfig) -> Result<Self> {
        let db = SqliteDb::oeffnen(&config.datenbank)
            .await
            .with_context(|| format!("Datenbank '{}' nicht nutzbar", config.datenbank.url))?;
        Ok(Self::mit_speicher(config, db))
    }

    pub fn mit_speicher(config: KlausurConfig, db: SqliteDb) -> Self {
        let cipher = CipherCodec::new(config.krypto.clone());
        let dienst = Arc::new(PruefungsDienst::new(db, cipher.clone()));

        let bus: Arc<dyn EventBus> = Arc::new(BroadcastBus::default());
        let transport = LokalerTransport::new(
            Arc::clone(&dienst),
            Anfrager::lokal(config.synchronisation.aufsicht.clone()),
        );
        let seite = EventSeite::new(transport, cipher, bus);

        Self {
            config,
            dienst,
            seite,
        }
    }

    pub fn dienst(&self) -> &Arc<PruefungsDienst<SqliteDb>> {
        &self.dienst
    }

    pub fn seite(&self) -> &Seite {
        &self.seite
    }

    pub async fn pruefungen(&self) -> Result<Vec<Pruefung>> {
        Ok(self.dienst.pruefungen_auflisten().await?)
    }

    /// Fragen in gespeicherter Darstellung
    pub async fn fragen(&self, slug: &EventSlug) -> Result<Vec<Frage>> {
        Ok(self.seite.fragen(slug).await?)
    }

    /// Erfasst ein Bundle und schreibt es als JSON-Datei.
    ///
    /// Ohne `ausgabe` landet die Datei im Export-Verzeichnis.
    pub async fn exportieren(&self, slug: &EventSlug, ausgabe: Option<&Path>) -> Result<PathBuf> {
        let bundle = self.seite.bundle_erfassen(slug).await?;

        let pfad = match ausgabe {
            Some(p) => p.to_path_buf(),
            None => self.config.export_pfad(slug),
        };
        if let Some(verzeichnis) = pfad.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(verzeichnis).await?;
        }
        bundle_speichern(&bundle, &pfad).await?;

        tracing::info!(
            slug = %slug,
            fragen = bundle.questions.len(),
            teilnahmen = bundle.participations.len(),
            "Bundle exportiert"
        );
        Ok(pfad)
    }

    /// Liest ein Bundle und ersetzt damit den Stand der Pruefung
    pub async fn importieren(&self, pfad: &Path) -> Result<BundleAck> {
        let bundle = bundle_laden(pfad)
            .await
            .with_context(|| format!("Bundle '{}' nicht importierbar", pfad.display()))?;
        Ok(self.seite.bundle_anwenden(&bundle).await?)
    }

    /// Entschluesselt alle Fragen und Antworten dauerhaft.
    ///
    /// `false`, wenn die Pruefung schon entschluesselt war.
    /// Das Geheimnis wird nur an den Speicher weitergereicht und landet
    /// nicht im Geheimnisspeicher der Sitzung.
    pub async fn entschluesseln(&self, slug: &EventSlug, geheimnis: &str) -> Result<bool> {
        let geheimnis = ParticipationSecret::new(geheimnis);
        Ok(self
            .seite
            .dauerhaft_entschluesseln_mit(slug, &geheimnis)
            .await?)
    }

    pub async fn schliessen(&self) {
        self.dienst.speicher().schliessen().await;
    }
}
