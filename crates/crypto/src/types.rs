//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use serde::{Deserialize, Serialize};

/// Kodierung eines Ciphertext-Feldes auf der Leitung.
///
/// Zwei Erzeuger, zwei Formate: der Client erzeugt Antworten als Hex,
/// der zentrale Speicher erzeugt Inhalte und Auswahlen als Base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// `hex(IV) || hex(ciphertext)`, Kleinbuchstaben, ohne Trennzeichen
    Hex,
    /// `base64(IV || ciphertext)` (Standard-Alphabet mit Padding)
    Base64,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hex => write!(f, "hex"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// Ciphertext mitsamt seiner Kodierung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCiphertext {
    pub encoding: Encoding,
    pub text: String,
}

impl WireCiphertext {
    pub fn new(encoding: Encoding, text: impl Into<String>) -> Self {
        Self {
            encoding,
            text: text.into(),
        }
    }

    /// Vom Client erzeugter Ciphertext (Antworten)
    pub fn hex(text: impl Into<String>) -> Self {
        Self::new(Encoding::Hex, text)
    }

    /// Vom zentralen Speicher erzeugter Ciphertext (Inhalte, Auswahlen)
    pub fn base64(text: impl Into<String>) -> Self {
        Self::new(Encoding::Base64, text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Wie aus dem Geheimnis der AES-Schluessel wird
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "modus", rename_all = "lowercase")]
pub enum SchluesselAbleitung {
    /// Die UTF-8-Bytes des Geheimnisses sind der Schluessel (wire-kompatibel
    /// mit bestehendem Ciphertext). Kurze Geheimnisse werden mit Nullbytes
    /// auf 16/24/32 Bytes aufgefuellt.
    #[default]
    Roh,
    /// Argon2id leitet einen 32-Byte-Schluessel aus Geheimnis und Salz ab
    Argon2 { salz: String },
}

/// Einstellungen fuer `CipherCodec`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KryptoEinstellungen {
    pub ableitung: SchluesselAbleitung,
    /// Haengt einen HMAC-SHA256-Tag an und prueft ihn beim Entschluesseln.
    /// Aus: falsches Geheimnis liefert stillschweigend falschen Klartext.
    pub authentifiziert: bool,
}

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(pub Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ein verifiziertes Teilnahme-Geheimnis.
///
/// Existiert nur clientseitig und nur fuer die Dauer der Sitzung.
#[derive(Clone)]
pub struct ParticipationSecret(String);

impl ParticipationSecret {
    pub fn new(geheimnis: impl Into<String>) -> Self {
        Self(geheimnis.into())
    }

    /// Gibt das Geheimnis zur lokalen Verwendung als Schluesselmaterial frei
    pub fn offenlegen(&self) -> &str {
        &self.0
    }
}

impl Drop for ParticipationSecret {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        bytes.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for ParticipationSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParticipationSecret([REDACTED])")
    }
}
