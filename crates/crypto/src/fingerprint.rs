//! Fingerprint eines Teilnahme-Geheimnisses
//!
//! Der Client schickt nie das Geheimnis selbst, sondern dessen
//! SHA-256-Fingerprint (Hex, Kleinbuchstaben). Der Speicher haelt
//! seinerseits nur den Fingerprint des Fingerprints (`key_hashed_twice`).

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// SHA-256 des Geheimnisses als Hex-String (64 Zeichen, Kleinbuchstaben)
pub fn fingerprint(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Pruefwert, den der Speicher zu einem Fingerprint ablegt
pub fn pruefwert_berechnen(fingerprint: &str) -> String {
    hex::encode(Sha256::digest(fingerprint.as_bytes()))
}

/// Vergleicht einen eingereichten Fingerprint mit dem gespeicherten Pruefwert.
///
/// Zeitkonstant ueber den Inhalt; ungleiche Laengen sind sofort `false`.
pub fn fingerprint_pruefen(fingerprint: &str, pruefwert: &str) -> bool {
    let erwartet = pruefwert_berechnen(fingerprint);
    let gespeichert = pruefwert.to_ascii_lowercase();
    erwartet.as_bytes().ct_eq(gespeichert.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bekannter_sha256_wert() {
        assert_eq!(
            fingerprint("s3cr3t"),
            "4e738ca5563c06cfd0018299933d58db1dd8bf97f6973dc99bf6cdc64b5550bd"
        );
    }

    #[test]
    fn fingerprint_ist_hex_klein() {
        let fp = fingerprint("AbCdEfGhIjKlMnOpQrStUvWxYz012345");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn pruefen_mit_doppeltem_hash() {
        let fp = fingerprint("s3cr3t");
        let pruefwert = pruefwert_berechnen(&fp);
        assert!(fingerprint_pruefen(&fp, &pruefwert));
        assert!(fingerprint_pruefen(&fp, &pruefwert.to_uppercase()));
        assert!(!fingerprint_pruefen(&fingerprint("falsch"), &pruefwert));
        // Der einfache Fingerprint ist kein gueltiger Pruefwert
        assert!(!fingerprint_pruefen(&fp, &fp));
    }

    #[test]
    fn abgeschnittener_pruefwert_passt_nicht() {
        let fp = fingerprint("s3cr3t");
        let pruefwert = pruefwert_berechnen(&fp);
        assert!(!fingerprint_pruefen(&fp, &pruefwert[..63]));
        assert!(!fingerprint_pruefen(&fp, &format!("{pruefwert}0")));
        assert!(!fingerprint_pruefen(&fp, ""));
    }

    proptest! {
        #[test]
        fn verschiedene_geheimnisse_verschiedene_fingerprints(
            a in "[ -~]{1,32}",
            b in "[ -~]{1,32}",
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(fingerprint(&a), fingerprint(&b));
            prop_assert!(!fingerprint_pruefen(&fingerprint(&b), &pruefwert_berechnen(&fingerprint(&a))));
        }

        #[test]
        fn eigener_fingerprint_passt_immer(geheimnis in "\\PC{1,32}") {
            let fp = fingerprint(&geheimnis);
            prop_assert!(fingerprint_pruefen(&fp, &pruefwert_berechnen(&fp)));
        }
    }
}
