//! SQLite-Implementierung des QuestionRepository
//!
//! `choices` wird als JSON-Array in einer Textspalte gespeichert. Im
//! verschluesselten Zustand enthaelt es genau einen Ciphertext.

use sqlx::Row as _;
use sqlx::SqliteConnection;

use klausur_core::{Darstellung, EventSlug, Frage};

use crate::error::DbError;
use crate::repository::{DbResult, QuestionRepository};
use crate::sqlite::nummer_lesen;
use crate::sqlite::pool::SqliteDb;

impl QuestionRepository for SqliteDb {
    async fn frage_anhaengen(&self, slug: &EventSlug, frage: &Frage) -> DbResult<Frage> {
        let mut tx = self.pool.begin().await?;

        let naechste: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(number), 0) + 1 FROM questions WHERE event_slug = ?",
        )
        .bind(slug.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let gespeichert = Frage {
            number: nummer_lesen(naechste)?,
            answer: None,
            ..frage.clone()
        };
        frage_einfuegen(&mut *tx, slug, &gespeichert).await?;

        tx.commit().await?;
        Ok(gespeichert)
    }

    async fn fragen_laden(&self, slug: &EventSlug) -> DbResult<Vec<Frage>> {
        let rows = sqlx::query(
            "SELECT number, content, choices, representation FROM questions
             WHERE event_slug = ? ORDER BY number ASC",
        )
        .bind(slug.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_frage).collect()
    }

    async fn frage_laden(&self, slug: &EventSlug, nummer: u32) -> DbResult<Option<Frage>> {
        let row = sqlx::query(
            "SELECT number, content, choices, representation FROM questions
             WHERE event_slug = ? AND number = ?",
        )
        .bind(slug.as_str())
        .bind(i64::from(nummer))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_frage(&r)).transpose()
    }
}

/// Fuegt eine Frage mit vorgegebener Nummer ein (innerhalb einer Transaktion)
pub(crate) async fn frage_einfuegen(
    conn: &mut SqliteConnection,
    slug: &EventSlug,
    frage: &Frage,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO questions (event_slug, number, content, choices, representation)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(slug.as_str())
    .bind(i64::from(frage.number))
    .bind(&frage.content)
    .bind(serde_json::to_string(&frage.choices)?)
    .bind(frage.representation.als_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) fn row_to_frage(row: &sqlx::sqlite::SqliteRow) -> DbResult<Frage> {
    let number: i64 = row.try_get("number")?;
    let choices: String = row.try_get("choices")?;
    let representation: String = row.try_get("representation")?;

    Ok(Frage {
        number: nummer_lesen(number)?,
        content: row.try_get("content")?,
        choices: serde_json::from_str(&choices)?,
        answer: None,
        representation: representation
            .parse::<Darstellung>()
            .map_err(DbError::UngueltigeDaten)?,
    })
}
