//! SQLite-Implementierung des SubmissionRepository

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::Row as _;

use klausur_core::EventSlug;

use crate::models::Abgabe;
use crate::repository::{DbResult, SubmissionRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{nummer_lesen, zeit_lesen};

impl SubmissionRepository for SqliteDb {
    async fn antwort_speichern(
        &self,
        slug: &EventSlug,
        username: &str,
        nummer: u32,
        answer: &str,
        jetzt: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO submissions (event_slug, username, question_number, answer, submitted_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(event_slug, username, question_number) DO UPDATE SET
                 answer = excluded.answer,
                 submitted_at = excluded.submitted_at",
        )
        .bind(slug.as_str())
        .bind(username)
        .bind(i64::from(nummer))
        .bind(answer)
        .bind(jetzt.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn antworten_laden(
        &self,
        slug: &EventSlug,
        username: &str,
    ) -> DbResult<HashMap<u32, String>> {
        let rows = sqlx::query(
            "SELECT question_number, answer FROM submissions
             WHERE event_slug = ? AND username = ?",
        )
        .bind(slug.as_str())
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        let mut antworten = HashMap::with_capacity(rows.len());
        for row in &rows {
            let nummer: i64 = row.try_get("question_number")?;
            antworten.insert(nummer_lesen(nummer)?, row.try_get("answer")?);
        }
        Ok(antworten)
    }

    async fn alle_abgaben(&self, slug: &EventSlug) -> DbResult<Vec<Abgabe>> {
        let rows = sqlx::query(
            "SELECT username, question_number, answer, submitted_at FROM submissions
             WHERE event_slug = ? ORDER BY username, question_number",
        )
        .bind(slug.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_abgabe).collect()
    }
}

fn row_to_abgabe(row: &sqlx::sqlite::SqliteRow) -> DbResult<Abgabe> {
    let nummer: i64 = row.try_get("question_number")?;
    let submitted_at: String = row.try_get("submitted_at")?;

    Ok(Abgabe {
        username: row.try_get("username")?,
        question_number: nummer_lesen(nummer)?,
        answer: row.try_get("answer")?,
        submitted_at: zeit_lesen(&submitted_at, "submitted_at")?,
    })
}
