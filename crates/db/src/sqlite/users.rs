//! SQLite-Implementierung des UserRepository

use sqlx::Row as _;
use sqlx::SqliteConnection;

use klausur_core::{Benutzer, EventSlug, Rolle};

use crate::error::DbError;
use crate::repository::{DbResult, UserRepository};
use crate::sqlite::pool::SqliteDb;

impl UserRepository for SqliteDb {
    async fn benutzer_speichern(&self, benutzer: &Benutzer) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        benutzer_upsert(&mut *conn, benutzer).await
    }

    async fn benutzer_laden(&self, username: &str) -> DbResult<Option<Benutzer>> {
        let row = sqlx::query(
            "SELECT username, name, role, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn benutzer_der_pruefung(&self, slug: &EventSlug) -> DbResult<Vec<Benutzer>> {
        let rows = sqlx::query(
            "SELECT users.username, users.name, users.role, users.password_hash
             FROM users
             INNER JOIN participations ON participations.username = users.username
             WHERE participations.event_slug = ?
             ORDER BY users.username",
        )
        .bind(slug.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_benutzer).collect()
    }
}

/// Legt den Benutzer an oder ueberschreibt Name, Rolle und Passwort-Hash
pub(crate) async fn benutzer_upsert(
    conn: &mut SqliteConnection,
    benutzer: &Benutzer,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO users (username, name, role, password_hash) VALUES (?, ?, ?, ?)
         ON CONFLICT(username) DO UPDATE SET
             name = excluded.name,
             role = excluded.role,
             password_hash = excluded.password_hash",
    )
    .bind(&benutzer.username)
    .bind(&benutzer.name)
    .bind(benutzer.role.als_str())
    .bind(&benutzer.password_hash)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<Benutzer> {
    let role: String = row.try_get("role")?;

    Ok(Benutzer {
        username: row.try_get("username")?,
        name: row.try_get("name")?,
        role: role.parse::<Rolle>().map_err(DbError::UngueltigeDaten)?,
        password_hash: row.try_get("password_hash")?,
    })
}
