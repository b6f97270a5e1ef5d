//! Zwischenspeicher der Client-Sichten pro Pruefung
//!
//! Jede Pruefung hat drei unabhaengig invalidierbare Bereiche. Nach einem
//! Bundle-Apply werden alle drei verworfen; der naechste Lesezugriff holt
//! sie neu vom Speicher. Zusammengefuehrt wird nichts.

use dashmap::DashMap;

use klausur_core::{CacheBereich, EventSlug, Frage, KlausurEvent, Pruefung, TeilnahmeStatus};

#[derive(Debug, Default, Clone)]
struct Eintrag {
    pruefung: Option<Pruefung>,
    fragen: Option<Vec<Frage>>,
    teilnahmen: Option<Vec<TeilnahmeStatus>>,
}

impl Eintrag {
    fn ist_leer(&self) -> bool {
        self.pruefung.is_none() && self.fragen.is_none() && self.teilnahmen.is_none()
    }
}

#[derive(Debug, Default)]
pub struct EventCache {
    eintraege: DashMap<EventSlug, Eintrag>,
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pruefung(&self, slug: &EventSlug) -> Option<Pruefung> {
        self.eintraege.get(slug).and_then(|e| e.pruefung.clone())
    }

    pub fn pruefung_setzen(&self, pruefung: Pruefung) {
        let slug = pruefung.slug.clone();
        self.eintraege.entry(slug).or_default().pruefung = Some(pruefung);
    }

    /// Fragen in gespeicherter Darstellung (nie die entschluesselte Sicht)
    pub fn fragen(&self, slug: &EventSlug) -> Option<Vec<Frage>> {
        self.eintraege.get(slug).and_then(|e| e.fragen.clone())
    }

    pub fn fragen_setzen(&self, slug: &EventSlug, fragen: Vec<Frage>) {
        self.eintraege.entry(slug.clone()).or_default().fragen = Some(fragen);
    }

    pub fn teilnahmen(&self, slug: &EventSlug) -> Option<Vec<TeilnahmeStatus>> {
        self.eintraege.get(slug).and_then(|e| e.teilnahmen.clone())
    }

    pub fn teilnahmen_setzen(&self, slug: &EventSlug, teilnahmen: Vec<TeilnahmeStatus>) {
        self.eintraege.entry(slug.clone()).or_default().teilnahmen = Some(teilnahmen);
    }

    /// Verwirft die genannten Bereiche einer Pruefung
    pub fn invalidieren(&self, slug: &EventSlug, bereiche: &[CacheBereich]) {
        let leer = match self.eintraege.get_mut(slug) {
            Some(mut eintrag) => {
                for bereich in bereiche {
                    match bereich {
                        CacheBereich::Pruefung => eintrag.pruefung = None,
                        CacheBereich::Fragen => eintrag.fragen = None,
                        CacheBereich::Teilnahmen => eintrag.teilnahmen = None,
                    }
                }
                eintrag.ist_leer()
            }
            None => false,
        };
        if leer {
            self.eintraege.remove(slug);
        }
        tracing::debug!(slug = %slug, ?bereiche, "Cache invalidiert");
    }

    /// Wendet ein Ereignis vom Bus an; liefert true, wenn es den Cache betraf
    pub fn ereignis_anwenden(&self, event: &KlausurEvent) -> bool {
        match event {
            KlausurEvent::CacheInvalidiert { slug, bereiche } => {
                self.invalidieren(slug, bereiche);
                true
            }
            KlausurEvent::PruefungEntschluesselt { slug } => {
                self.invalidieren(slug, &CacheBereich::ALLE);
                true
            }
            KlausurEvent::GeheimnisHinterlegt { .. } | KlausurEvent::SitzungBeendet => false,
        }
    }

    pub fn leeren(&self) {
        self.eintraege.clear();
    }

    /// Anzahl Pruefungen mit mindestens einem gefuellten Bereich
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}
