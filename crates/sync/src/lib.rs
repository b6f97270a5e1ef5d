//! klausur-sync – Client-Orchestrierung und Offline-Synchronisation
//!
//! ## Module
//! - `seite` - `EventSeite`: Verifikation, Anzeige, Abgabe, Bundle-Apply
//! - `transport` - Grenzoperationen zum zentralen Speicher
//! - `cache` - Zwischengespeicherte Sichten pro Pruefung
//! - `bus` - Event-Bus fuer Cache-Invalidierung
//! - `bundle` - Bundle-Dateien und Apply-Bestaetigung
//! - `error` - Fehlertypen

pub mod bundle;
pub mod bus;
pub mod cache;
pub mod error;
pub mod seite;
pub mod transport;

pub use bundle::{bundle_laden, bundle_speichern, BundleAck};
pub use bus::BroadcastBus;
pub use cache::EventCache;
pub use error::{SyncError, SyncResult};
pub use seite::EventSeite;
pub use transport::{LokalerTransport, Transport};
