//! Verschluesselung eingereichter Antworten
//!
//! Antworten werden immer clientseitig verschluesselt und immer als Hex
//! uebertragen. Das Gegenstueck dekodiert ausschliesslich Hex; ein
//! Base64-Ciphertext an dieser Stelle ist ein Fehler, keine Heuristik.

use klausur_core::EventSlug;

use crate::cipher::{AbgeleiteterSchluessel, CipherCodec};
use crate::error::{CryptoError, CryptoResult};
use crate::secret_store::SecretStore;
use crate::types::{Encoding, WireCiphertext};

#[derive(Debug, Clone, Default)]
pub struct SubmissionCodec {
    cipher: CipherCodec,
}

impl SubmissionCodec {
    pub fn new(cipher: CipherCodec) -> Self {
        Self { cipher }
    }

    /// Verschluesselt eine gewaehlte Antwort als Hex-Ciphertext
    pub fn encode_submission(&self, answer: &str, secret: &str) -> CryptoResult<WireCiphertext> {
        self.cipher.encrypt(answer, secret, Encoding::Hex)
    }

    pub fn decode_submission(&self, wire: &WireCiphertext, secret: &str) -> CryptoResult<String> {
        nur_hex(wire)?;
        self.cipher.decrypt(wire, secret)
    }

    pub fn decode_submission_mit(
        &self,
        wire: &WireCiphertext,
        schluessel: &AbgeleiteterSchluessel,
    ) -> CryptoResult<String> {
        nur_hex(wire)?;
        self.cipher.decrypt_mit(wire, schluessel)
    }

    /// Wie `encode_submission`, aber nur mit einem verifizierten Geheimnis
    pub fn encode_fuer(
        &self,
        store: &SecretStore,
        slug: &EventSlug,
        answer: &str,
    ) -> CryptoResult<WireCiphertext> {
        let geheimnis = store.geheimnis(slug)?;
        self.encode_submission(answer, geheimnis.offenlegen())
    }

    pub fn decode_fuer(
        &self,
        store: &SecretStore,
        slug: &EventSlug,
        wire: &WireCiphertext,
    ) -> CryptoResult<String> {
        let geheimnis = store.geheimnis(slug)?;
        self.decode_submission(wire, geheimnis.offenlegen())
    }
}

fn nur_hex(wire: &WireCiphertext) -> CryptoResult<()> {
    if wire.encoding != Encoding::Hex {
        return Err(CryptoError::FalscheKodierung {
            erwartet: Encoding::Hex,
            erhalten: wire.encoding,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParticipationSecret;

    #[test]
    fn antwort_ist_immer_hex() {
        let codec = SubmissionCodec::default();
        let wire = codec.encode_submission("9,8 m/s²", "s3cr3t").unwrap();
        assert_eq!(wire.encoding, Encoding::Hex);
        assert!(hex::decode(&wire.text).is_ok());
        assert_eq!(codec.decode_submission(&wire, "s3cr3t").unwrap(), "9,8 m/s²");
    }

    #[test]
    fn base64_antwort_wird_abgelehnt() {
        let codec = SubmissionCodec::default();
        let base64 = CipherCodec::default()
            .encrypt("A", "s3cr3t", Encoding::Base64)
            .unwrap();
        assert!(matches!(
            codec.decode_submission(&base64, "s3cr3t"),
            Err(CryptoError::FalscheKodierung {
                erwartet: Encoding::Hex,
                erhalten: Encoding::Base64
            })
        ));
    }

    #[test]
    fn ohne_verifiziertes_geheimnis_keine_antwort() {
        let codec = SubmissionCodec::default();
        let store = SecretStore::new();
        let slug = EventSlug::from("ujian-fisika");
        assert!(matches!(
            codec.encode_fuer(&store, &slug, "A"),
            Err(CryptoError::KeinGeheimnis(_))
        ));

        store.hinterlegen(slug.clone(), ParticipationSecret::new("s3cr3t"));
        let wire = codec.encode_fuer(&store, &slug, "A").unwrap();
        assert_eq!(codec.decode_fuer(&store, &slug, &wire).unwrap(), "A");
    }
}
