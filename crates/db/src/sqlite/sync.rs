//! SQLite-Implementierung des SynchronisationRepository
//!
//! Erfassen liest mehrere Tabellen nacheinander; Anwenden schreibt alles
//! in einer Transaktion, sodass ein fehlgeschlagenes Anwenden keinen
//! Teilstand hinterlaesst.

use chrono::{DateTime, Utc};

use klausur_core::{EventSlug, SynchronizationBundle};

use crate::error::DbError;
use crate::repository::{
    DbResult, EventRepository, ParticipationRepository, QuestionRepository,
    SynchronisationRepository, UserRepository,
};
use crate::sqlite::events::event_upsert;
use crate::sqlite::participations::teilnahme_upsert;
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::questions::frage_einfuegen;
use crate::sqlite::users::benutzer_upsert;

impl SynchronisationRepository for SqliteDb {
    async fn bundle_erfassen(&self, slug: &EventSlug) -> DbResult<Option<SynchronizationBundle>> {
        let Some(event) = self.event_laden(slug).await? else {
            return Ok(None);
        };
        let venue = self
            .event_venue(slug)
            .await?
            .ok_or_else(|| DbError::intern(format!("Pruefung '{slug}' ohne Ort")))?;

        Ok(Some(SynchronizationBundle {
            event,
            venue,
            questions: self.fragen_laden(slug).await?,
            users: self.benutzer_der_pruefung(slug).await?,
            participations: self.teilnahmen_laden(slug).await?,
        }))
    }

    async fn bundle_anwenden(
        &self,
        bundle: &SynchronizationBundle,
        jetzt: DateTime<Utc>,
    ) -> DbResult<()> {
        let slug = bundle.slug();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO venues (id, name, created_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(bundle.venue.id.inner().to_string())
        .bind(&bundle.venue.name)
        .bind(jetzt.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let mut event = bundle.event.clone();
        event.last_synchronization = Some(jetzt);
        event_upsert(&mut *tx, &event, bundle.venue.id).await?;

        for benutzer in &bundle.users {
            benutzer_upsert(&mut *tx, benutzer).await?;
        }

        // Antworten haengen an Fragen und Teilnahmen und fallen per Kaskade mit
        sqlx::query("DELETE FROM questions WHERE event_slug = ?")
            .bind(slug.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM participations WHERE event_slug = ?")
            .bind(slug.as_str())
            .execute(&mut *tx)
            .await?;

        for (index, frage) in bundle.questions.iter().enumerate() {
            let nummeriert = klausur_core::Frage {
                number: u32::try_from(index + 1)
                    .map_err(|_| DbError::UngueltigeDaten("Zu viele Fragen".into()))?,
                answer: None,
                ..frage.clone()
            };
            frage_einfuegen(&mut *tx, slug, &nummeriert).await?;
        }

        for teilnahme in &bundle.participations {
            teilnahme_upsert(&mut *tx, slug, teilnahme).await?;
        }

        tx.commit().await?;

        tracing::info!(
            slug = %slug,
            fragen = bundle.questions.len(),
            teilnahmen = bundle.participations.len(),
            "Synchronisations-Bundle angewendet"
        );
        Ok(())
    }
}
