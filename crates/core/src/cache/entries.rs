//! Cached entry CRUD operations.
//!
//! Entries are never patched in place: every write replaces the whole row for
//! its `(partition, request_key)` pair, so concurrent writers to one key end in
//! last-writer-wins.
//!
//! Each write and each hit bumps the row's `last_access` counter; trimming
//! evicts the smallest counters first, which makes bounded partitions LRU.

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use crate::http::{Headers, Response};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// Next value of the store-wide recency counter.
const NEXT_ACCESS: &str = "(SELECT COALESCE(MAX(last_access), 0) + 1 FROM entries)";

/// A response stored in one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub url: Url,
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
    pub stored_at: DateTime<Utc>,
}

impl CachedEntry {
    /// Capture a response for `url` at `stored_at`.
    pub fn from_response(url: &Url, response: &Response, stored_at: DateTime<Utc>) -> Self {
        Self {
            url: url.clone(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at,
        }
    }

    /// Rebuild the response handed to the page on a cache hit.
    pub fn to_response(&self) -> Response {
        Response { status: self.status, headers: self.headers.clone(), body: self.body.clone() }
    }
}

/// Raw row shape, decoded outside the connection thread.
struct EntryRow {
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl EntryRow {
    fn decode(self) -> Result<CachedEntry, Error> {
        let url = Url::parse(&self.url).map_err(|e| Error::CorruptEntry(format!("url {}: {e}", self.url)))?;
        let headers: Headers = serde_json::from_str(&self.headers_json)?;
        let stored_at = DateTime::parse_from_rfc3339(&self.stored_at)
            .map_err(|e| Error::CorruptEntry(format!("stored_at {}: {e}", self.stored_at)))?
            .with_timezone(&Utc);
        let status = u16::try_from(self.status).map_err(|e| Error::CorruptEntry(format!("status: {e}")))?;
        Ok(CachedEntry { url, status, headers, body: Bytes::from(self.body), stored_at })
    }
}

impl CacheDb {
    /// Store `entry` in `partition`, replacing any previous entry for the same GET request.
    pub async fn put_entry(&self, partition: &str, entry: &CachedEntry) -> Result<(), Error> {
        let partition = partition.to_string();
        let key = request_key("GET", &entry.url);
        let url = entry.url.to_string();
        let status = i64::from(entry.status);
        let headers_json = serde_json::to_string(&entry.headers)?;
        let body = entry.body.to_vec();
        let stored_at = entry.stored_at.to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![&partition, &stored_at],
                )?;
                conn.execute(
                    &format!(
                        "INSERT INTO entries (partition, request_key, url, status, headers_json, body, stored_at, last_access)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, {NEXT_ACCESS})
                        ON CONFLICT(partition, request_key) DO UPDATE SET
                            url = excluded.url,
                            status = excluded.status,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            stored_at = excluded.stored_at,
                            last_access = excluded.last_access"
                    ),
                    params![partition, key, url, status, headers_json, body, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for a GET of `url` in `partition`.
    pub async fn match_entry(&self, partition: &str, url: &Url) -> Result<Option<CachedEntry>, Error> {
        let partition = partition.to_string();
        let key = request_key("GET", url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    "SELECT url, status, headers_json, body, stored_at
                    FROM entries WHERE partition = ?1 AND request_key = ?2",
                    params![&partition, &key],
                    |row| {
                        Ok(EntryRow {
                            url: row.get(0)?,
                            status: row.get(1)?,
                            headers_json: row.get(2)?,
                            body: row.get(3)?,
                            stored_at: row.get(4)?,
                        })
                    },
                );

                match result {
                    Ok(row) => {
                        conn.execute(
                            &format!(
                                "UPDATE entries SET last_access = {NEXT_ACCESS}
                                WHERE partition = ?1 AND request_key = ?2"
                            ),
                            params![partition, key],
                        )?;
                        Ok(Some(row))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::decode).transpose()
    }

    /// URLs stored in `partition`, least recently used first.
    pub async fn entry_urls(&self, partition: &str) -> Result<Vec<String>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT url FROM entries WHERE partition = ?1 ORDER BY last_access ASC, rowid ASC")?;
                let urls = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Evict the least recently used entries of `partition` until at most
    /// `max_entries` remain.
    ///
    /// Returns the number of deleted entries.
    pub async fn trim_partition(&self, partition: &str, max_entries: usize) -> Result<u64, Error> {
        let partition = partition.to_string();
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![&partition], |row| {
                        row.get(0)
                    })?;
                if count <= max {
                    return Ok(0);
                }

                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND request_key IN (
                        SELECT request_key FROM entries WHERE partition = ?1
                        ORDER BY last_access ASC, rowid ASC LIMIT ?2
                    )",
                    params![partition, count - max],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
