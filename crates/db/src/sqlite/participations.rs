//! SQLite-Implementierung des ParticipationRepository

use chrono::{DateTime, Utc};
use sqlx::Row as _;
use sqlx::SqliteConnection;

use klausur_core::{EventSlug, Teilnahme, TeilnahmeStatus};

use crate::error::DbError;
use crate::repository::{DbResult, ParticipationRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zeit_lesen_opt;

impl ParticipationRepository for SqliteDb {
    async fn teilnahme_speichern(&self, slug: &EventSlug, teilnahme: &Teilnahme) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        teilnahme_upsert(&mut *conn, slug, teilnahme).await
    }

    async fn teilnahme_laden(
        &self,
        slug: &EventSlug,
        username: &str,
    ) -> DbResult<Option<Teilnahme>> {
        let row = sqlx::query(
            "SELECT username, key_hashed_twice, verified_at FROM participations
             WHERE event_slug = ? AND username = ?",
        )
        .bind(slug.as_str())
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_teilnahme(&r)).transpose()
    }

    async fn teilnahmen_laden(&self, slug: &EventSlug) -> DbResult<Vec<Teilnahme>> {
        let rows = sqlx::query(
            "SELECT username, key_hashed_twice, verified_at FROM participations
             WHERE event_slug = ? ORDER BY username",
        )
        .bind(slug.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_teilnahme).collect()
    }

    async fn als_verifiziert_markieren(
        &self,
        slug: &EventSlug,
        username: &str,
        jetzt: DateTime<Utc>,
    ) -> DbResult<()> {
        let betroffen = sqlx::query(
            "UPDATE participations SET verified_at = ? WHERE event_slug = ? AND username = ?",
        )
        .bind(jetzt.to_rfc3339())
        .bind(slug.as_str())
        .bind(username)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if betroffen == 0 {
            return Err(DbError::nicht_gefunden(format!(
                "Teilnahme {username}@{slug}"
            )));
        }
        Ok(())
    }

    async fn teilnahme_status(&self, slug: &EventSlug) -> DbResult<Vec<TeilnahmeStatus>> {
        let rows = sqlx::query(
            "SELECT participations.username, participations.verified_at,
                    COUNT(submissions.question_number) AS answered
             FROM participations
             LEFT JOIN submissions
                    ON submissions.event_slug = participations.event_slug
                   AND submissions.username = participations.username
             WHERE participations.event_slug = ?
             GROUP BY participations.username, participations.verified_at
             ORDER BY participations.username",
        )
        .bind(slug.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_status).collect()
    }
}

pub(crate) async fn teilnahme_upsert(
    conn: &mut SqliteConnection,
    slug: &EventSlug,
    teilnahme: &Teilnahme,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO participations (event_slug, username, key_hashed_twice, verified_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(event_slug, username) DO UPDATE SET
             key_hashed_twice = excluded.key_hashed_twice,
             verified_at = excluded.verified_at",
    )
    .bind(slug.as_str())
    .bind(&teilnahme.username)
    .bind(&teilnahme.key_hashed_twice)
    .bind(teilnahme.verified_at.map(|t| t.to_rfc3339()))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn row_to_teilnahme(row: &sqlx::sqlite::SqliteRow) -> DbResult<Teilnahme> {
    Ok(Teilnahme {
        username: row.try_get("username")?,
        key_hashed_twice: row.try_get("key_hashed_twice")?,
        verified_at: zeit_lesen_opt(row.try_get("verified_at")?, "verified_at")?,
    })
}

fn row_to_status(row: &sqlx::sqlite::SqliteRow) -> DbResult<TeilnahmeStatus> {
    let answered: i64 = row.try_get("answered")?;
    Ok(TeilnahmeStatus {
        username: row.try_get("username")?,
        verified_at: zeit_lesen_opt(row.try_get("verified_at")?, "verified_at")?,
        answered: u32::try_from(answered).unwrap_or(u32::MAX),
    })
}
