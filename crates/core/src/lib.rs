//! klausur-core – Gemeinsame Typen, Modelle und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Klausur-Crates gemeinsam genutzt werden: Identifikationstypen,
//! die Datenmodelle einer Pruefung (Event, Fragen, Teilnahmen), das
//! Synchronisations-Bundle und die Cache-Invalidierungs-Ereignisse.

pub mod bundle;
pub mod error;
pub mod event;
pub mod models;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use bundle::SynchronizationBundle;
pub use error::{KlausurError, Result};
pub use event::{CacheBereich, EventBus, EventEmpfaenger, KlausurEvent};
pub use models::{
    Benutzer, Darstellung, Frage, Pruefung, Pruefungsort, Rolle, Teilnahme, TeilnahmeStatus,
};
pub use types::{EventSlug, VenueId};
