//! SQLite-Implementierung des VenueRepository

use chrono::Utc;
use sqlx::Row as _;
use uuid::Uuid;

use klausur_core::{Pruefungsort, VenueId};

use crate::error::DbError;
use crate::repository::{DbResult, VenueRepository};
use crate::sqlite::pool::SqliteDb;

impl VenueRepository for SqliteDb {
    async fn venue_speichern(&self, venue: &Pruefungsort) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO venues (id, name, created_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(venue.id.inner().to_string())
        .bind(&venue.name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn venue_laden(&self, id: VenueId) -> DbResult<Option<Pruefungsort>> {
        let row = sqlx::query("SELECT id, name FROM venues WHERE id = ?")
            .bind(id.inner().to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_venue(&r)).transpose()
    }

    async fn venues_auflisten(&self) -> DbResult<Vec<Pruefungsort>> {
        let rows = sqlx::query("SELECT id, name FROM venues ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_venue).collect()
    }
}

pub(crate) fn row_to_venue(row: &sqlx::sqlite::SqliteRow) -> DbResult<Pruefungsort> {
    let id_str: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DbError::intern(format!("Ungueltige UUID '{id_str}': {e}")))?;

    Ok(Pruefungsort {
        id: VenueId(id),
        name: row.try_get("name")?,
    })
}
