//! Symmetrische Ver-/Entschluesselung von Textfeldern
//!
//! AES im CFB-Modus (volle Blockbreite, ohne Padding), damit beliebig
//! lange Klartexte ohne Blockausrichtung verschluesselt werden koennen.
//!
//! ## Format
//! ```text
//! [iv(16)] [ciphertext(n)] [hmac_sha256(32), nur im authentifizierten Modus]
//! ```
//!
//! Hex-Form (vom Client erzeugt):    `hex(iv) || hex(ciphertext)`
//! Base64-Form (vom Speicher erzeugt): `base64(iv || ciphertext)`
//!
//! Welche Form vorliegt, entscheidet der Aufrufer ueber `Encoding`; es
//! wird nie aus dem Inhalt geraten.

use aes::cipher::{AsyncStreamCipher, InvalidLength, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use argon2::Argon2;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{Encoding, KryptoEinstellungen, SchluesselAbleitung, SecretBytes, WireCiphertext};

/// Laenge des Initialisierungsvektors in Bytes
pub const IV_LAENGE: usize = 16;

/// Laenge des HMAC-SHA256-Tags im authentifizierten Modus
const TAG_LAENGE: usize = 32;

/// Zulaessige AES-Schluessellaengen (AES-128/192/256)
const SCHLUESSEL_LAENGEN: [usize; 3] = [16, 24, 32];

type HmacSha256 = Hmac<Sha256>;

/// Aus einem Geheimnis abgeleiteter AES-Schluessel
#[derive(Debug, Clone)]
pub struct AbgeleiteterSchluessel(SecretBytes);

impl AbgeleiteterSchluessel {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ver-/Entschluesselt Textfelder mit einem Geheimnis als Schluesselmaterial
#[derive(Debug, Clone, Default)]
pub struct CipherCodec {
    einstellungen: KryptoEinstellungen,
}

impl CipherCodec {
    pub fn new(einstellungen: KryptoEinstellungen) -> Self {
        Self { einstellungen }
    }

    pub fn einstellungen(&self) -> &KryptoEinstellungen {
        &self.einstellungen
    }

    /// Leitet den AES-Schluessel aus dem Geheimnis ab.
    ///
    /// Fuer viele Felder mit demselben Geheimnis einmal aufrufen und
    /// `encrypt_mit`/`decrypt_mit` verwenden (Argon2 ist bewusst langsam).
    pub fn schluessel(&self, secret: &str) -> CryptoResult<AbgeleiteterSchluessel> {
        let bytes = match &self.einstellungen.ableitung {
            SchluesselAbleitung::Roh => roh_schluessel(secret)?,
            SchluesselAbleitung::Argon2 { salz } => argon2_schluessel(secret, salz)?,
        };
        Ok(AbgeleiteterSchluessel(SecretBytes::new(bytes)))
    }

    /// Verschluesselt `plaintext` mit frischem IV in der gewuenschten Kodierung
    pub fn encrypt(
        &self,
        plaintext: &str,
        secret: &str,
        encoding: Encoding,
    ) -> CryptoResult<WireCiphertext> {
        let schluessel = self.schluessel(secret)?;
        self.encrypt_mit(plaintext, &schluessel, encoding)
    }

    /// Entschluesselt einen Ciphertext in der Kodierung, die er mitbringt.
    ///
    /// Ohne authentifizierten Modus liefert ein falsches Geheimnis keinen
    /// Fehler, sondern unbrauchbaren Klartext.
    pub fn decrypt(&self, wire: &WireCiphertext, secret: &str) -> CryptoResult<String> {
        let schluessel = self.schluessel(secret)?;
        self.decrypt_mit(wire, &schluessel)
    }

    pub fn encrypt_mit(
        &self,
        plaintext: &str,
        schluessel: &AbgeleiteterSchluessel,
        encoding: Encoding,
    ) -> CryptoResult<WireCiphertext> {
        let mut iv = [0u8; IV_LAENGE];
        OsRng.fill_bytes(&mut iv);

        let mut puffer = plaintext.as_bytes().to_vec();
        cfb_verschluesseln(schluessel.as_bytes(), &iv, &mut puffer)?;

        let mut bytes = Vec::with_capacity(IV_LAENGE + puffer.len() + TAG_LAENGE);
        bytes.extend_from_slice(&iv);
        bytes.extend_from_slice(&puffer);

        if self.einstellungen.authentifiziert {
            let tag = tag_berechnen(schluessel.as_bytes(), &bytes)?;
            bytes.extend_from_slice(&tag);
        }

        let text = match encoding {
            Encoding::Hex => hex::encode(&bytes),
            Encoding::Base64 => STANDARD.encode(&bytes),
        };
        Ok(WireCiphertext::new(encoding, text))
    }

    pub fn decrypt_mit(
        &self,
        wire: &WireCiphertext,
        schluessel: &AbgeleiteterSchluessel,
    ) -> CryptoResult<String> {
        let bytes = match wire.encoding {
            Encoding::Hex => hex::decode(wire.as_str())?,
            Encoding::Base64 => STANDARD.decode(wire.as_str())?,
        };

        let authentifiziert = self.einstellungen.authentifiziert;
        let minimum = IV_LAENGE + if authentifiziert { TAG_LAENGE } else { 0 };
        if bytes.len() < minimum {
            return Err(CryptoError::UngueltigeDaten(format!(
                "Ciphertext zu kurz: {} Bytes, mindestens {minimum} erwartet",
                bytes.len()
            )));
        }

        let nutzdaten = if authentifiziert {
            let (nutzdaten, tag) = bytes.split_at(bytes.len() - TAG_LAENGE);
            tag_pruefen(schluessel.as_bytes(), nutzdaten, tag)?;
            nutzdaten
        } else {
            bytes.as_slice()
        };

        let (iv, ciphertext) = nutzdaten.split_at(IV_LAENGE);
        let mut puffer = ciphertext.to_vec();
        cfb_entschluesseln(schluessel.as_bytes(), iv, &mut puffer)?;

        Ok(String::from_utf8_lossy(&puffer).into_owned())
    }
}

/// Rohes Geheimnis als Schluessel, mit Nullbytes auf die naechste
/// AES-Schluessellaenge aufgefuellt
fn roh_schluessel(secret: &str) -> CryptoResult<Vec<u8>> {
    let bytes = secret.as_bytes();
    if bytes.is_empty() {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: SCHLUESSEL_LAENGEN[0],
            erhalten: 0,
        });
    }

    let Some(ziel) = SCHLUESSEL_LAENGEN.iter().copied().find(|&l| bytes.len() <= l) else {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: SCHLUESSEL_LAENGEN[2],
            erhalten: bytes.len(),
        });
    };

    let mut schluessel = bytes.to_vec();
    schluessel.resize(ziel, 0);
    Ok(schluessel)
}

fn argon2_schluessel(secret: &str, salz: &str) -> CryptoResult<Vec<u8>> {
    let mut schluessel = vec![0u8; SCHLUESSEL_LAENGEN[2]];
    Argon2::default()
        .hash_password_into(secret.as_bytes(), salz.as_bytes(), &mut schluessel)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(schluessel)
}

fn cfb_verschluesseln(schluessel: &[u8], iv: &[u8], puffer: &mut [u8]) -> CryptoResult<()> {
    let fehler = |e: InvalidLength| CryptoError::Verschluesselung(e.to_string());
    match schluessel.len() {
        16 => cfb_mode::Encryptor::<Aes128>::new_from_slices(schluessel, iv)
            .map_err(fehler)?
            .encrypt(puffer),
        24 => cfb_mode::Encryptor::<Aes192>::new_from_slices(schluessel, iv)
            .map_err(fehler)?
            .encrypt(puffer),
        32 => cfb_mode::Encryptor::<Aes256>::new_from_slices(schluessel, iv)
            .map_err(fehler)?
            .encrypt(puffer),
        n => {
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: SCHLUESSEL_LAENGEN[2],
                erhalten: n,
            })
        }
    }
    Ok(())
}

fn cfb_entschluesseln(schluessel: &[u8], iv: &[u8], puffer: &mut [u8]) -> CryptoResult<()> {
    let fehler = |e: InvalidLength| CryptoError::Entschluesselung(e.to_string());
    match schluessel.len() {
        16 => cfb_mode::Decryptor::<Aes128>::new_from_slices(schluessel, iv)
            .map_err(fehler)?
            .decrypt(puffer),
        24 => cfb_mode::Decryptor::<Aes192>::new_from_slices(schluessel, iv)
            .map_err(fehler)?
            .decrypt(puffer),
        32 => cfb_mode::Decryptor::<Aes256>::new_from_slices(schluessel, iv)
            .map_err(fehler)?
            .decrypt(puffer),
        n => {
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: SCHLUESSEL_LAENGEN[2],
                erhalten: n,
            })
        }
    }
    Ok(())
}

fn tag_berechnen(schluessel: &[u8], daten: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(schluessel)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;
    mac.update(daten);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn tag_pruefen(schluessel: &[u8], daten: &[u8], tag: &[u8]) -> CryptoResult<()> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(schluessel)
        .map_err(|e| CryptoError::Entschluesselung(e.to_string()))?;
    mac.update(daten);
    mac.verify_slice(tag).map_err(|_| CryptoError::Integritaet)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec() -> CipherCodec {
        CipherCodec::default()
    }

    fn authentifiziert() -> CipherCodec {
        CipherCodec::new(KryptoEinstellungen {
            ableitung: SchluesselAbleitung::Roh,
            authentifiziert: true,
        })
    }

    #[test]
    fn roundtrip_hex_jakarta() {
        let wire = codec().encrypt("Jakarta", "s3cr3t", Encoding::Hex).unwrap();
        assert_eq!(wire.encoding, Encoding::Hex);
        assert_eq!(codec().decrypt(&wire, "s3cr3t").unwrap(), "Jakarta");
    }

    #[test]
    fn roundtrip_base64() {
        let text = "Berapakah percepatan gravitasi bumi? ✓";
        let wire = codec().encrypt(text, "s3cr3t", Encoding::Base64).unwrap();
        assert_eq!(codec().decrypt(&wire, "s3cr3t").unwrap(), text);
    }

    #[test]
    fn hex_format_iv_und_ciphertext_ohne_trenner() {
        let wire = codec().encrypt("Jakarta", "s3cr3t", Encoding::Hex).unwrap();
        // 16 Bytes IV + 7 Bytes Ciphertext, je zwei Hex-Ziffern
        assert_eq!(wire.text.len(), 2 * (IV_LAENGE + 7));
        assert!(wire
            .text
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn base64_kodiert_rohe_bytes() {
        let wire = codec().encrypt("Jakarta", "s3cr3t", Encoding::Base64).unwrap();
        let bytes = STANDARD.decode(&wire.text).unwrap();
        assert_eq!(bytes.len(), IV_LAENGE + 7);
    }

    #[test]
    fn frischer_iv_pro_aufruf() {
        let a = codec().encrypt("Jakarta", "s3cr3t", Encoding::Hex).unwrap();
        let b = codec().encrypt("Jakarta", "s3cr3t", Encoding::Hex).unwrap();
        assert_ne!(a.text, b.text);
        assert_ne!(a.text[..2 * IV_LAENGE], b.text[..2 * IV_LAENGE]);
        assert_eq!(codec().decrypt(&a, "s3cr3t").unwrap(), "Jakarta");
        assert_eq!(codec().decrypt(&b, "s3cr3t").unwrap(), "Jakarta");
    }

    #[test]
    fn falsches_geheimnis_liefert_unbrauchbaren_klartext() {
        let wire = codec().encrypt("Jakarta", "s3cr3t", Encoding::Hex).unwrap();
        let ergebnis = codec().decrypt(&wire, "falsch").unwrap();
        assert_ne!(ergebnis, "Jakarta");
    }

    #[test]
    fn authentifiziert_erkennt_falsches_geheimnis() {
        let wire = authentifiziert()
            .encrypt("Jakarta", "s3cr3t", Encoding::Base64)
            .unwrap();
        assert_eq!(authentifiziert().decrypt(&wire, "s3cr3t").unwrap(), "Jakarta");
        assert!(matches!(
            authentifiziert().decrypt(&wire, "falsch"),
            Err(CryptoError::Integritaet)
        ));
    }

    #[test]
    fn authentifiziert_erkennt_manipulation() {
        let wire = authentifiziert()
            .encrypt("Jakarta", "s3cr3t", Encoding::Hex)
            .unwrap();
        let mut bytes = hex::decode(&wire.text).unwrap();
        bytes[IV_LAENGE] ^= 0xFF;
        let manipuliert = WireCiphertext::hex(hex::encode(bytes));
        assert!(matches!(
            authentifiziert().decrypt(&manipuliert, "s3cr3t"),
            Err(CryptoError::Integritaet)
        ));
    }

    #[test]
    fn leerer_klartext() {
        let wire = codec().encrypt("", "s3cr3t", Encoding::Hex).unwrap();
        assert_eq!(wire.text.len(), 2 * IV_LAENGE);
        assert_eq!(codec().decrypt(&wire, "s3cr3t").unwrap(), "");
    }

    #[test]
    fn zu_kurzer_ciphertext() {
        let wire = WireCiphertext::hex("00ff");
        assert!(matches!(
            codec().decrypt(&wire, "s3cr3t"),
            Err(CryptoError::UngueltigeDaten(_))
        ));
    }

    #[test]
    fn ungueltige_kodierung() {
        assert!(matches!(
            codec().decrypt(&WireCiphertext::hex("xyz"), "s3cr3t"),
            Err(CryptoError::Hex(_))
        ));
        assert!(matches!(
            codec().decrypt(&WireCiphertext::base64("@@@"), "s3cr3t"),
            Err(CryptoError::Base64(_))
        ));
    }

    #[test]
    fn roh_schluessel_laengen() {
        assert_eq!(roh_schluessel("s3cr3t").unwrap().len(), 16);
        assert_eq!(roh_schluessel(&"a".repeat(20)).unwrap().len(), 24);
        assert_eq!(roh_schluessel(&"a".repeat(32)).unwrap().len(), 32);
        assert!(matches!(
            roh_schluessel(""),
            Err(CryptoError::UngueltigeSchluesselLaenge { erhalten: 0, .. })
        ));
        assert!(matches!(
            roh_schluessel(&"a".repeat(33)),
            Err(CryptoError::UngueltigeSchluesselLaenge { erhalten: 33, .. })
        ));
    }

    #[test]
    fn roh_schluessel_fuellt_mit_nullbytes() {
        let k = roh_schluessel("s3cr3t").unwrap();
        assert_eq!(&k[..6], b"s3cr3t");
        assert!(k[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn zentraler_32_zeichen_schluessel() {
        let geheimnis = "AbCdEfGhIjKlMnOpQrStUvWxYz012345";
        let wire = codec().encrypt("Soal 1", geheimnis, Encoding::Base64).unwrap();
        assert_eq!(codec().decrypt(&wire, geheimnis).unwrap(), "Soal 1");
    }

    #[test]
    fn argon2_ableitung() {
        let codec = CipherCodec::new(KryptoEinstellungen {
            ableitung: SchluesselAbleitung::Argon2 {
                salz: "klausur-salz".into(),
            },
            authentifiziert: false,
        });
        let schluessel = codec.schluessel("s3cr3t").unwrap();
        assert_eq!(schluessel.len(), 32);

        let wire = codec.encrypt("Jakarta", "s3cr3t", Encoding::Hex).unwrap();
        assert_eq!(codec.decrypt(&wire, "s3cr3t").unwrap(), "Jakarta");
        // Rohe Ableitung kann Argon2-Ciphertext nicht lesen
        assert_ne!(CipherCodec::default().decrypt(&wire, "s3cr3t").unwrap(), "Jakarta");
    }

    #[test]
    fn argon2_zu_kurzes_salz() {
        let codec = CipherCodec::new(KryptoEinstellungen {
            ableitung: SchluesselAbleitung::Argon2 { salz: "kurz".into() },
            authentifiziert: false,
        });
        assert!(matches!(
            codec.schluessel("s3cr3t"),
            Err(CryptoError::KeyDerivation(_))
        ));
    }

    #[test]
    fn cfb128_nist_testvektor() {
        // NIST SP 800-38A, F.3.13 CFB128-AES128, Block 1
        let schluessel = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let mut puffer = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        cfb_verschluesseln(&schluessel, &iv, &mut puffer).unwrap();
        assert_eq!(hex::encode(&puffer), "3b3fd92eb72dad20333449f8e83cfb4a");

        cfb_entschluesseln(&schluessel, &iv, &mut puffer).unwrap();
        assert_eq!(hex::encode(&puffer), "6bc1bee22e409f96e93d7e117393172a");
    }

    proptest! {
        #[test]
        fn roundtrip_beliebiger_klartext(
            klartext in any::<String>(),
            geheimnis in "[ -~]{1,32}",
            hex in any::<bool>(),
        ) {
            let encoding = if hex { Encoding::Hex } else { Encoding::Base64 };
            let wire = codec().encrypt(&klartext, &geheimnis, encoding).unwrap();
            prop_assert_eq!(wire.encoding, encoding);
            prop_assert_eq!(codec().decrypt(&wire, &geheimnis).unwrap(), klartext);
        }

        #[test]
        fn roundtrip_authentifiziert(klartext in any::<String>(), geheimnis in "[ -~]{1,32}") {
            let wire = authentifiziert().encrypt(&klartext, &geheimnis, Encoding::Base64).unwrap();
            prop_assert_eq!(authentifiziert().decrypt(&wire, &geheimnis).unwrap(), klartext);
        }

        #[test]
        fn iv_ist_pro_aufruf_frisch(klartext in "\\PC{0,64}", geheimnis in "[ -~]{1,32}") {
            let a = codec().encrypt(&klartext, &geheimnis, Encoding::Hex).unwrap();
            let b = codec().encrypt(&klartext, &geheimnis, Encoding::Hex).unwrap();
            prop_assert_ne!(&a.text[..2 * IV_LAENGE], &b.text[..2 * IV_LAENGE]);
            prop_assert_eq!(a.text.len(), 2 * (IV_LAENGE + klartext.len()));
        }
    }
}
