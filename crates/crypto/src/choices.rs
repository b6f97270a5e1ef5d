//! Verschluesselung der Antwortauswahl einer Frage
//!
//! Die gesamte Auswahl wird als ein Ciphertext gespeichert: Eintraege mit
//! `|` verbunden, dann verschluesselt. Leere Eintraege fallen beim
//! Verpacken und beim Entpacken weg.

use crate::cipher::{AbgeleiteterSchluessel, CipherCodec};
use crate::error::{CryptoError, CryptoResult};
use crate::types::{Encoding, WireCiphertext};

/// Trennzeichen zwischen den Auswahl-Eintraegen im Klartext
pub const TRENNER: char = '|';

/// Packt eine Antwortauswahl in genau einen Ciphertext und zurueck
#[derive(Debug, Clone, Default)]
pub struct ChoiceSetCodec {
    cipher: CipherCodec,
}

impl ChoiceSetCodec {
    pub fn new(cipher: CipherCodec) -> Self {
        Self { cipher }
    }

    pub fn pack(
        &self,
        choices: &[String],
        secret: &str,
        encoding: Encoding,
    ) -> CryptoResult<WireCiphertext> {
        let schluessel = self.cipher.schluessel(secret)?;
        self.pack_mit(choices, &schluessel, encoding)
    }

    pub fn unpack(&self, wire: &WireCiphertext, secret: &str) -> CryptoResult<Vec<String>> {
        let schluessel = self.cipher.schluessel(secret)?;
        self.unpack_mit(wire, &schluessel)
    }

    /// Eintraege mit `|` sind nicht darstellbar und werden abgelehnt
    pub fn pack_mit(
        &self,
        choices: &[String],
        schluessel: &AbgeleiteterSchluessel,
        encoding: Encoding,
    ) -> CryptoResult<WireCiphertext> {
        if let Some(eintrag) = choices.iter().find(|c| c.contains(TRENNER)) {
            return Err(CryptoError::UngueltigeAuswahl(format!(
                "Eintrag '{eintrag}' enthaelt das Trennzeichen '{TRENNER}'"
            )));
        }

        let verbunden = choices
            .iter()
            .filter(|c| !c.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&TRENNER.to_string());

        self.cipher.encrypt_mit(&verbunden, schluessel, encoding)
    }

    pub fn unpack_mit(
        &self,
        wire: &WireCiphertext,
        schluessel: &AbgeleiteterSchluessel,
    ) -> CryptoResult<Vec<String>> {
        let klartext = self.cipher.decrypt_mit(wire, schluessel)?;
        Ok(aufteilen(&klartext))
    }
}

fn aufteilen(klartext: &str) -> Vec<String> {
    klartext
        .split(TRENNER)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
