//! Durable storage for pending offline actions.

use super::OfflineAction;
use crate::Error;
use crate::cache::CacheDb;
use crate::http::Headers;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;

/// Prefix of every action's storage key.
pub const ACTION_KEY_PREFIX: &str = "/offline-action-";

struct ActionRow {
    id: String,
    url: String,
    method: String,
    headers_json: String,
    body: Vec<u8>,
    enqueued_at: String,
}

impl ActionRow {
    fn decode(self) -> Result<OfflineAction, Error> {
        let headers: Headers = serde_json::from_str(&self.headers_json)?;
        let enqueued_at = DateTime::parse_from_rfc3339(&self.enqueued_at)
            .map_err(|e| Error::CorruptEntry(format!("enqueued_at {}: {e}", self.enqueued_at)))?
            .with_timezone(&Utc);
        Ok(OfflineAction {
            id: self.id,
            url: self.url,
            method: self.method,
            headers,
            body: Bytes::from(self.body),
            enqueued_at,
        })
    }
}

impl CacheDb {
    /// Append an action to the queue.
    ///
    /// An action whose storage key is already pending is replaced and moves
    /// to the back of the queue.
    pub async fn insert_action(&self, action: &OfflineAction) -> Result<(), Error> {
        let key = action.storage_key();
        let id = action.id.clone();
        let url = action.url.clone();
        let method = action.method.clone();
        let headers_json = serde_json::to_string(&action.headers)?;
        let body = action.body.to_vec();
        let enqueued_at = action.enqueued_at.to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM offline_actions WHERE storage_key = ?1", params![&key])?;
                tx.execute(
                    "INSERT INTO offline_actions (storage_key, id, url, method, headers_json, body, enqueued_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![key, id, url, method, headers_json, body, enqueued_at],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Every pending action in enqueue order.
    pub async fn pending_actions(&self) -> Result<Vec<OfflineAction>, Error> {
        let pattern = format!("{ACTION_KEY_PREFIX}%");
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<ActionRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, url, method, headers_json, body, enqueued_at
                    FROM offline_actions WHERE storage_key LIKE ?1 ORDER BY seq ASC",
                )?;
                let rows = stmt
                    .query_map(params![pattern], |row| {
                        Ok(ActionRow {
                            id: row.get(0)?,
                            url: row.get(1)?,
                            method: row.get(2)?,
                            headers_json: row.get(3)?,
                            body: row.get(4)?,
                            enqueued_at: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter().map(ActionRow::decode).collect()
    }

    /// Remove the action stored under `key`. Returns whether it was pending.
    pub async fn remove_action(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM offline_actions WHERE storage_key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
