//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod events;
pub mod participations;
pub mod pool;
pub mod questions;
pub mod submissions;
pub mod sync;
pub mod users;
pub mod venues;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::repository::DbResult;

/// Liest einen RFC3339-Zeitstempel aus einer Textspalte
pub(crate) fn zeit_lesen(wert: &str, feld: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(wert)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltiger Zeitstempel {feld} '{wert}': {e}")))
}

pub(crate) fn zeit_lesen_opt(wert: Option<String>, feld: &str) -> DbResult<Option<DateTime<Utc>>> {
    wert.as_deref().map(|s| zeit_lesen(s, feld)).transpose()
}

/// Fragennummern liegen als INTEGER vor, fachlich sind sie u32
pub(crate) fn nummer_lesen(wert: i64) -> DbResult<u32> {
    u32::try_from(wert).map_err(|_| DbError::intern(format!("Ungueltige Fragennummer {wert}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeitstempel_roundtrip() {
        let jetzt = Utc::now();
        let gelesen = zeit_lesen(&jetzt.to_rfc3339(), "created_at").unwrap();
        assert_eq!(gelesen, jetzt);
        assert!(zeit_lesen("gestern", "created_at").is_err());
        assert_eq!(zeit_lesen_opt(None, "verified_at").unwrap(), None);
    }

    #[test]
    fn negative_nummer_ist_ungueltig() {
        assert_eq!(nummer_lesen(3).unwrap(), 3);
        assert!(nummer_lesen(-1).is_err());
    }
}
