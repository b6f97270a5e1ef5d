//! Event-Bus Trait-Definitionen
//!
//! Definiert die Schnittstelle fuer Signale an den Rest der Anwendung,
//! vor allem die Cache-Invalidierung nach dem Anwenden eines Bundles.
//! Die Implementierung erfolgt im Sync-Crate via tokio-Kanaelen.

use serde::{Deserialize, Serialize};

use crate::types::EventSlug;

/// Zwischengespeicherte Sicht, die nach einem Bundle-Apply veraltet ist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBereich {
    /// Die Pruefung selbst (Metadaten, Flags)
    Pruefung,
    /// Die Fragen der Pruefung
    Fragen,
    /// Die Teilnahmen der Pruefung
    Teilnahmen,
}

impl CacheBereich {
    /// Alle Bereiche, die ein Bundle-Apply ungueltig macht
    pub const ALLE: [CacheBereich; 3] = [Self::Pruefung, Self::Fragen, Self::Teilnahmen];
}

/// Alle systemweiten Ereignisse die ueber den Event-Bus fliessen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KlausurEvent {
    /// Zwischengespeicherte Sichten einer Pruefung sind veraltet und
    /// muessen beim naechsten Lesen neu geladen werden
    CacheInvalidiert {
        slug: EventSlug,
        bereiche: Vec<CacheBereich>,
    },
    /// Der zentrale Speicher hat die Pruefung dauerhaft entschluesselt
    PruefungEntschluesselt { slug: EventSlug },
    /// Ein Geheimnis wurde nach erfolgreicher Verifikation hinterlegt
    GeheimnisHinterlegt { slug: EventSlug },
    /// Alle Geheimnisse der Sitzung wurden verworfen (Logout)
    SitzungBeendet,
}

/// Trait fuer den Event-Bus
pub trait EventBus: Send + Sync + 'static {
    /// Sendet ein Ereignis an alle Abonnenten
    fn senden(&self, event: KlausurEvent) -> crate::Result<()>;

    /// Abonniert alle zukuenftigen Ereignisse
    fn abonnieren(&self) -> Box<dyn EventEmpfaenger + Send>;
}

/// Empfaenger-Seite eines Event-Bus-Abonnements
pub trait EventEmpfaenger {
    /// Liefert das naechste bereits anstehende Ereignis, sonst `None`
    fn empfangen(&mut self) -> Option<KlausurEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_ist_serde_kompatibel() {
        let event = KlausurEvent::CacheInvalidiert {
            slug: EventSlug::from("ujian-fisika"),
            bereiche: CacheBereich::ALLE.to_vec(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let zurueck: KlausurEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(zurueck, event);
    }

    #[test]
    fn alle_bereiche_vollstaendig() {
        assert!(CacheBereich::ALLE.contains(&CacheBereich::Pruefung));
        assert!(CacheBereich::ALLE.contains(&CacheBereich::Fragen));
        assert!(CacheBereich::ALLE.contains(&CacheBereich::Teilnahmen));
    }
}
