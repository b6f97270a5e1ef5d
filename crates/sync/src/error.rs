//! Fehlertypen fuer das Sync-Crate

use klausur_core::KlausurError;
use klausur_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Klausur(#[from] KlausurError),

    #[error(transparent)]
    Krypto(#[from] CryptoError),

    #[error("Bundle-Datei nicht lesbar/schreibbar: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bundle-Datei ist kein gueltiges JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Der Fingerprint wurde vom Speicher abgelehnt
    pub fn ist_verifikation_abgelehnt(&self) -> bool {
        matches!(
            self,
            Self::Klausur(KlausurError::VerifikationAbgelehnt { .. })
        )
    }

    /// Nur Transportfehler kommen fuer eine Wiederholung in Frage
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(self, Self::Klausur(e) if e.ist_wiederholbar())
    }
}

impl From<SyncError> for KlausurError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Klausur(e) => e,
            SyncError::Krypto(e) => e.into(),
            SyncError::Io(e) => KlausurError::Transport(e.to_string()),
            SyncError::Json(e) => KlausurError::BundleUngueltig(vec![e.to_string()]),
        }
    }
}
