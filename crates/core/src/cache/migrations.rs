//! Database schema migrations.
//!
//! A `_migrations` table records the highest applied version. Each pending
//! migration runs inside its own transaction together with its bookkeeping row.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Migration list: (version, description, SQL). Applied in ascending order.
const MIGRATIONS: &[(i64, &str, &str)] = &[
    (1, "cache partitions and entries", include_str!("../../migrations/001_partitions.sql")),
    (2, "offline action queue", include_str!("../../migrations/002_offline_actions.sql")),
    (3, "entry access recency", include_str!("../../migrations/003_entry_access.sql")),
];

/// Apply every migration newer than the recorded version.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the version whose SQL failed.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    let applied = conn
        .call(|conn| -> Result<Vec<i64>, Error> {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at TEXT NOT NULL
                )",
                [],
            )?;

            let current: i64 =
                conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

            let mut applied = Vec::new();
            for (version, description, sql) in MIGRATIONS {
                if *version <= current {
                    continue;
                }
                let tx = conn.transaction()?;
                tx.execute_batch(sql)
                    .map_err(|e| Error::MigrationFailed(format!("v{version} ({description}): {e}")))?;
                tx.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version, chrono::Utc::now().to_rfc3339()],
                )?;
                tx.commit()?;
                applied.push(*version);
            }

            Ok(applied)
        })
        .await
        .map_err(Error::from)?;

    if !applied.is_empty() {
        tracing::info!(?applied, "applied cache migrations");
    }

    Ok(())
}
