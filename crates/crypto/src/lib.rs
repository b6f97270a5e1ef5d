//! # klausur-crypto
//!
//! Schutz von Pruefungsinhalten fuer Klausur.
//!
//! ## Module
//! - `cipher` - AES-CFB Ver-/Entschluesselung mit Hex- und Base64-Wire-Format
//! - `choices` - Packen/Entpacken der Antwortauswahl in ein Ciphertext-Feld
//! - `fingerprint` - Einweg-Fingerprint zur Verifikation ohne Geheimnis-Preisgabe
//! - `submission` - Verschluesselung abgegebener Antworten (Hex-Form)
//! - `view` - Transiente Entschluesselung einer Fragenliste zur Anzeige
//! - `secret_store` - Sitzungsgebundene Ablage verifizierter Geheimnisse
//! - `types` - Gemeinsame Typen (Encoding, WireCiphertext, Einstellungen)
//! - `error` - Fehlertypen

pub mod choices;
pub mod cipher;
pub mod error;
pub mod fingerprint;
pub mod secret_store;
pub mod submission;
pub mod types;
pub mod view;

// Bequeme Re-Exports
pub use choices::ChoiceSetCodec;
pub use cipher::{AbgeleiteterSchluessel, CipherCodec, IV_LAENGE};
pub use error::{CryptoError, CryptoResult};
pub use fingerprint::{fingerprint, fingerprint_pruefen, pruefwert_berechnen};
pub use secret_store::SecretStore;
pub use submission::SubmissionCodec;
pub use types::{
    Encoding, KryptoEinstellungen, ParticipationSecret, SchluesselAbleitung, SecretBytes,
    WireCiphertext,
};
pub use view::ContentDecryptionView;
