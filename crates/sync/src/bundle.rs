//! Bundle-Dateien fuer den Transport ohne Netz
//!
//! Ein Bundle wird als JSON-Datei geschrieben, auf einem Datentraeger zum
//! Pruefungsort gebracht und dort wieder eingelesen. Geschrieben wird in
//! eine Nachbardatei mit anschliessendem Umbenennen, damit nie eine halb
//! geschriebene Datei unter dem Zielnamen liegt.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use klausur_core::{CacheBereich, EventSlug, SynchronizationBundle};

use crate::error::SyncResult;

/// Bestaetigung eines angewendeten Bundles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleAck {
    pub slug: EventSlug,
    pub angewendet_am: DateTime<Utc>,
    /// Sichten, die nach dem Anwenden neu geladen werden muessen
    pub invalidiert: Vec<CacheBereich>,
}

impl BundleAck {
    pub fn new(slug: EventSlug, angewendet_am: DateTime<Utc>) -> Self {
        Self {
            slug,
            angewendet_am,
            invalidiert: CacheBereich::ALLE.to_vec(),
        }
    }
}

/// Schreibt ein geprueftes Bundle als JSON-Datei
pub async fn bundle_speichern(bundle: &SynchronizationBundle, pfad: &Path) -> SyncResult<()> {
    bundle.validieren()?;

    let json = serde_json::to_vec_pretty(bundle)?;
    let temp = temp_pfad(pfad);
    tokio::fs::write(&temp, &json).await?;
    tokio::fs::rename(&temp, pfad).await?;

    tracing::info!(
        slug = %bundle.slug(),
        pfad = %pfad.display(),
        bytes = json.len(),
        "Bundle gespeichert"
    );
    Ok(())
}

/// Liest und prueft ein Bundle aus einer JSON-Datei
pub async fn bundle_laden(pfad: &Path) -> SyncResult<SynchronizationBundle> {
    let bytes = tokio::fs::read(pfad).await?;
    let bundle: SynchronizationBundle = serde_json::from_slice(&bytes)?;
    bundle.validieren()?;

    tracing::info!(slug = %bundle.slug(), pfad = %pfad.display(), "Bundle geladen");
    Ok(bundle)
}

fn temp_pfad(pfad: &Path) -> PathBuf {
    let mut name = pfad
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    pfad.with_file_name(name)
}
