//! SQLite-Implementierung des EventRepository

use chrono::{DateTime, Utc};
use sqlx::Row as _;
use sqlx::SqliteConnection;

use klausur_core::{Darstellung, EventSlug, Frage, Pruefung, Pruefungsort, VenueId};

use crate::error::DbError;
use crate::models::Abgabe;
use crate::repository::{DbResult, EventRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::venues::row_to_venue;
use crate::sqlite::{zeit_lesen, zeit_lesen_opt};

const EVENT_SPALTEN: &str = "slug, title, description, starts_at, ends_at, key_check, \
     is_decrypted, last_synchronization";

impl EventRepository for SqliteDb {
    async fn event_anlegen(&self, event: &Pruefung, venue_id: VenueId) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO events (slug, title, description, starts_at, ends_at, key_check,
                                 is_decrypted, last_synchronization, venue_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.slug.as_str())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.starts_at.to_rfc3339())
        .bind(event.ends_at.to_rfc3339())
        .bind(&event.key_check)
        .bind(event.is_decrypted as i64)
        .bind(event.last_synchronization.map(|t| t.to_rfc3339()))
        .bind(venue_id.inner().to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!("Pruefung '{}' existiert bereits", event.slug))
            } else {
                DbError::Sqlx(e)
            }
        })?;
        Ok(())
    }

    async fn event_laden(&self, slug: &EventSlug) -> DbResult<Option<Pruefung>> {
        let sql = format!("SELECT {EVENT_SPALTEN} FROM events WHERE slug = ?");
        let row = sqlx::query(&sql)
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_event(&r)).transpose()
    }

    async fn event_venue(&self, slug: &EventSlug) -> DbResult<Option<Pruefungsort>> {
        let row = sqlx::query(
            "SELECT venues.id, venues.name FROM venues
             INNER JOIN events ON events.venue_id = venues.id
             WHERE events.slug = ?",
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_venue(&r)).transpose()
    }

    async fn events_auflisten(&self) -> DbResult<Vec<Pruefung>> {
        let sql = format!("SELECT {EVENT_SPALTEN} FROM events ORDER BY starts_at, slug");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_event).collect()
    }

    async fn entschluesselung_uebernehmen(
        &self,
        slug: &EventSlug,
        fragen: &[Frage],
        abgaben: &[Abgabe],
        jetzt: DateTime<Utc>,
    ) -> DbResult<bool> {
        if let Some(frage) = fragen.iter().find(|f| f.ist_verschluesselt()) {
            return Err(DbError::UngueltigeDaten(format!(
                "Frage {} ist noch verschluesselt",
                frage.number
            )));
        }

        let mut tx = self.pool.begin().await?;

        let betroffen = sqlx::query(
            "UPDATE events SET is_decrypted = 1, decrypted_at = ? WHERE slug = ? AND is_decrypted = 0",
        )
        .bind(jetzt.to_rfc3339())
        .bind(slug.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if betroffen == 0 {
            let bereits: Option<i64> =
                sqlx::query_scalar("SELECT is_decrypted FROM events WHERE slug = ?")
                    .bind(slug.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return match bereits {
                Some(_) => Ok(false),
                None => Err(DbError::nicht_gefunden(format!("Pruefung '{slug}'"))),
            };
        }

        for frage in fragen {
            sqlx::query(
                "UPDATE questions SET content = ?, choices = ?, representation = ?
                 WHERE event_slug = ? AND number = ?",
            )
            .bind(&frage.content)
            .bind(serde_json::to_string(&frage.choices)?)
            .bind(Darstellung::Decrypted.als_str())
            .bind(slug.as_str())
            .bind(i64::from(frage.number))
            .execute(&mut *tx)
            .await?;
        }

        for abgabe in abgaben {
            sqlx::query(
                "UPDATE submissions SET answer = ?
                 WHERE event_slug = ? AND username = ? AND question_number = ?",
            )
            .bind(&abgabe.answer)
            .bind(slug.as_str())
            .bind(&abgabe.username)
            .bind(i64::from(abgabe.question_number))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

/// Legt die Pruefung an oder ueberschreibt sie (innerhalb einer Transaktion)
pub(crate) async fn event_upsert(
    conn: &mut SqliteConnection,
    event: &Pruefung,
    venue_id: VenueId,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO events (slug, title, description, starts_at, ends_at, key_check,
                             is_decrypted, last_synchronization, venue_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(slug) DO UPDATE SET
             title = excluded.title,
             description = excluded.description,
             starts_at = excluded.starts_at,
             ends_at = excluded.ends_at,
             key_check = excluded.key_check,
             is_decrypted = excluded.is_decrypted,
             last_synchronization = excluded.last_synchronization,
             venue_id = excluded.venue_id",
    )
    .bind(event.slug.as_str())
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.starts_at.to_rfc3339())
    .bind(event.ends_at.to_rfc3339())
    .bind(&event.key_check)
    .bind(event.is_decrypted as i64)
    .bind(event.last_synchronization.map(|t| t.to_rfc3339()))
    .bind(venue_id.inner().to_string())
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> DbResult<Pruefung> {
    let slug: String = row.try_get("slug")?;
    let starts_at: String = row.try_get("starts_at")?;
    let ends_at: String = row.try_get("ends_at")?;
    let is_decrypted: i64 = row.try_get("is_decrypted")?;

    Ok(Pruefung {
        slug: EventSlug::new(slug),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        starts_at: zeit_lesen(&starts_at, "starts_at")?,
        ends_at: zeit_lesen(&ends_at, "ends_at")?,
        key_check: row.try_get("key_check")?,
        is_decrypted: is_decrypted != 0,
        last_synchronization: zeit_lesen_opt(
            row.try_get("last_synchronization")?,
            "last_synchronization",
        )?,
    })
}
