//! SQLite-Pool fuer den zentralen Speicher und die Kopie am Pruefungsort
//!
//! Dateibasierte Speicher laufen im WAL-Modus mit mehreren Verbindungen.
//! Eine In-Memory-Kopie lebt nur in ihrer einen Verbindung; der Pool
//! haelt sie deshalb fest und baut sie nie ab.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::DbError;
use crate::repository::DatabaseConfig;

/// Wartezeit auf eine Schreibsperre, bevor SQLite `SQLITE_BUSY` meldet
const SPERR_WARTEZEIT: Duration = Duration::from_secs(5);

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Pruefungsspeicher auf SQLite
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Oeffnet den konfigurierten Speicher und bringt das Schema auf Stand.
    ///
    /// Eine In-Memory-URL ergibt unabhaengig von `max_verbindungen` einen
    /// Pool mit genau einer dauerhaften Verbindung.
    pub async fn oeffnen(config: &DatabaseConfig) -> Result<Self, DbError> {
        let im_speicher = ist_im_speicher(&config.url);

        let mut opts = SqliteConnectOptions::from_str(&config.url)?
            .foreign_keys(true)
            .busy_timeout(SPERR_WARTEZEIT);
        if !im_speicher {
            opts = opts.create_if_missing(true).journal_mode(if config.sqlite_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            });
        }

        let pool_opts = if im_speicher {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_verbindungen.max(1))
        };
        let pool = pool_opts.connect_with(opts).await?;

        info!(
            url = %config.url,
            im_speicher,
            wal = config.sqlite_wal && !im_speicher,
            "SQLite-Speicher geoeffnet"
        );

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    /// Leere Kopie im Arbeitsspeicher (Pruefungsort ohne Datei, Tests)
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::oeffnen(&DatabaseConfig {
            url: IN_MEMORY_URL.into(),
            ..DatabaseConfig::default()
        })
        .await
    }

    /// Fuehrt ausstehende Migrationen aus; bereits angewendete bleiben unberuehrt
    pub async fn migrationen_ausfuehren(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Datenbank-Migrationen abgeschlossen");
        Ok(())
    }

    /// Schliesst den Pool; eine In-Memory-Kopie ist danach verloren
    pub async fn schliessen(&self) {
        self.pool.close().await;
    }
}

fn ist_im_speicher(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
