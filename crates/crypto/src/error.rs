//! Fehlertypen fuer das Kryptografie-Subsystem

use klausur_core::KlausurError;
use thiserror::Error;

use crate::types::Encoding;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),

    #[error("Integritaetspruefung fehlgeschlagen")]
    Integritaet,

    #[error("Falsche Kodierung: erwartet {erwartet}, erhalten {erhalten}")]
    FalscheKodierung { erwartet: Encoding, erhalten: Encoding },

    #[error("Ungueltige Antwortauswahl: {0}")]
    UngueltigeAuswahl(String),

    #[error("Frage {nummer} ist bereits entschluesselt")]
    BereitsEntschluesselt { nummer: u32 },

    #[error("Kein verifiziertes Geheimnis fuer Pruefung '{0}'")]
    KeinGeheimnis(String),

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Hex-Dekodierung fehlgeschlagen: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

impl From<CryptoError> for KlausurError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::BereitsEntschluesselt { .. } | CryptoError::UngueltigeAuswahl(_) => {
                KlausurError::EntschluesselungsZustand(e.to_string())
            }
            CryptoError::KeinGeheimnis(slug) => KlausurError::KeinGeheimnis(slug),
            andere => KlausurError::Krypto(andere.to_string()),
        }
    }
}
