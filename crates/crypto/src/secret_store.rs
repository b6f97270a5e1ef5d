//! Sitzungsspeicher fuer verifizierte Geheimnisse
//!
//! Haelt pro Pruefung das Geheimnis, dessen Fingerprint der zentrale
//! Speicher akzeptiert hat. Nur in diesem Speicher liegende Geheimnisse
//! werden fuer Anzeige und Antworten verwendet. Beim Logout wird der
//! Speicher geleert.

use dashmap::DashMap;
use std::sync::Arc;

use klausur_core::EventSlug;

use crate::error::{CryptoError, CryptoResult};
use crate::types::ParticipationSecret;

/// Verifizierte Geheimnisse der laufenden Sitzung (slug -> Geheimnis)
#[derive(Debug, Default)]
pub struct SecretStore {
    geheimnisse: DashMap<EventSlug, Arc<ParticipationSecret>>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hinterlegt ein Geheimnis nach erfolgreicher Verifikation.
    ///
    /// Ein bereits vorhandenes Geheimnis fuer dieselbe Pruefung wird ersetzt.
    pub fn hinterlegen(&self, slug: EventSlug, geheimnis: ParticipationSecret) {
        tracing::debug!(slug = %slug, "Geheimnis hinterlegt");
        self.geheimnisse.insert(slug, Arc::new(geheimnis));
    }

    pub fn geheimnis(&self, slug: &EventSlug) -> CryptoResult<Arc<ParticipationSecret>> {
        self.geheimnisse
            .get(slug)
            .map(|eintrag| Arc::clone(&*eintrag))
            .ok_or_else(|| CryptoError::KeinGeheimnis(slug.to_string()))
    }

    pub fn enthaelt(&self, slug: &EventSlug) -> bool {
        self.geheimnisse.contains_key(slug)
    }

    pub fn verwerfen(&self, slug: &EventSlug) -> bool {
        self.geheimnisse.remove(slug).is_some()
    }

    /// Verwirft alle Geheimnisse (Logout)
    pub fn leeren(&self) {
        let anzahl = self.geheimnisse.len();
        self.geheimnisse.clear();
        tracing::debug!(anzahl, "Alle Geheimnisse verworfen");
    }

    pub fn anzahl(&self) -> usize {
        self.geheimnisse.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hinterlegen_und_abrufen() {
        let store = SecretStore::new();
        let slug = EventSlug::from("ujian-fisika");
        assert!(!store.enthaelt(&slug));

        store.hinterlegen(slug.clone(), ParticipationSecret::new("s3cr3t"));
        assert!(store.enthaelt(&slug));
        assert_eq!(store.geheimnis(&slug).unwrap().offenlegen(), "s3cr3t");
    }

    #[test]
    fn unbekannte_pruefung_ohne_geheimnis() {
        let store = SecretStore::new();
        assert!(matches!(
            store.geheimnis(&EventSlug::from("ujian-kimia")),
            Err(CryptoError::KeinGeheimnis(ref s)) if s == "ujian-kimia"
        ));
    }

    #[test]
    fn leeren_verwirft_alles() {
        let store = SecretStore::new();
        store.hinterlegen("a".into(), ParticipationSecret::new("1"));
        store.hinterlegen("b".into(), ParticipationSecret::new("2"));
        assert_eq!(store.anzahl(), 2);

        assert!(store.verwerfen(&"a".into()));
        assert!(!store.verwerfen(&"a".into()));
        store.leeren();
        assert_eq!(store.anzahl(), 0);
    }

    #[tokio::test]
    async fn gleichzeitiger_zugriff() {
        let store = Arc::new(SecretStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let slug = EventSlug::new(format!("ujian-{i}"));
                store.hinterlegen(slug.clone(), ParticipationSecret::new(format!("geheim-{i}")));
                store.geheimnis(&slug).unwrap().offenlegen().to_string()
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), format!("geheim-{i}"));
        }
        assert_eq!(store.anzahl(), 8);
    }
}
