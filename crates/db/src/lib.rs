//! klausur-db – Zentraler Pruefungsspeicher
//!
//! Dieses Crate stellt das Repository-Pattern fuer Pruefungen, Orte,
//! Benutzer, Fragen, Teilnahmen und Antworten bereit (SQLite via sqlx),
//! sowie den `PruefungsDienst`, der die fachlichen Grenzoperationen
//! (Verifikation, Abgabe, dauerhafte Entschluesselung, Synchronisation)
//! darauf abbildet.

pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod sqlite;

pub use error::DbError;
pub use models::{Abgabe, NeuePruefung};
pub use repository::{
    DatabaseConfig, DbResult, EventRepository, KlausurSpeicher, ParticipationRepository,
    QuestionRepository, SubmissionRepository, SynchronisationRepository, UserRepository,
    VenueRepository,
};
pub use service::{Anfrager, PruefungsDienst};
pub use sqlite::SqliteDb;
