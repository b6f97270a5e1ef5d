//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass die CLI ohne Konfigurationsdatei
//! lauffaehig ist.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use klausur_core::EventSlug;
use klausur_crypto::KryptoEinstellungen;
use klausur_db::DatabaseConfig;
use klausur_observability::LogEinstellungen;

/// Vollstaendige Konfiguration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KlausurConfig {
    /// Datenbank-Einstellungen
    pub datenbank: DatabaseConfig,
    /// Logging-Einstellungen
    pub logging: LogEinstellungen,
    /// Schluesselableitung und Integritaetsschutz
    pub krypto: KryptoEinstellungen,
    /// Bundle-Export
    pub synchronisation: SynchronisationEinstellungen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynchronisationEinstellungen {
    /// Zielverzeichnis fuer exportierte Bundles
    pub export_verzeichnis: PathBuf,
    /// Benutzername der Aufsicht, unter dem die CLI arbeitet
    pub aufsicht: String,
}

impl Default for SynchronisationEinstellungen {
    fn default() -> Self {
        Self {
            export_verzeichnis: PathBuf::from("bundles"),
            aufsicht: "pengawas".into(),
        }
    }
}

impl KlausurConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt).map_err(|e| {
                    anyhow::anyhow!("Konfigurationsfehler in '{}': {e}", pfad.display())
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = %pfad.display(),
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{}' nicht lesbar: {e}",
                pfad.display()
            )),
        }
    }

    /// Standard-Dateiname eines exportierten Bundles
    pub fn export_pfad(&self, slug: &EventSlug) -> PathBuf {
        self.synchronisation
            .export_verzeichnis
            .join(format!("{slug}.json"))
    }
}
