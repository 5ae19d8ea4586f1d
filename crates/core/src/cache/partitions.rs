//! Versioned cache partitions and their lifecycle.
//!
//! Exactly four partitions are current at any time: `static-v{N}`,
//! `dynamic-v{N}`, `api-v{N}` and `images-v{N}`. Any other partition found in
//! storage is a leftover from an earlier deploy and is deleted on activation.

use std::collections::BTreeSet;

use super::connection::CacheDb;
use super::entries::CachedEntry;
use crate::Error;
use tokio_rusqlite::params;
use url::Url;

/// Resource class owning one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionKind {
    Static,
    Dynamic,
    Api,
    Images,
}

impl PartitionKind {
    /// Lookup order used by `CacheNamespaces::match_any`.
    pub const ALL: [PartitionKind; 4] =
        [PartitionKind::Static, PartitionKind::Dynamic, PartitionKind::Api, PartitionKind::Images];

    fn prefix(self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Dynamic => "dynamic",
            PartitionKind::Api => "api",
            PartitionKind::Images => "images",
        }
    }
}

/// The four current partition names for one deploy version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    version: String,
}

impl PartitionSet {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into() }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Full partition name, e.g. `api-v3`.
    pub fn name(&self, kind: PartitionKind) -> String {
        format!("{}-v{}", kind.prefix(), self.version)
    }

    /// The allow-list consulted during activation.
    pub fn current(&self) -> BTreeSet<String> {
        PartitionKind::ALL.iter().map(|k| self.name(*k)).collect()
    }
}

/// Handle to one opened partition.
#[derive(Debug, Clone)]
pub struct Partition {
    db: CacheDb,
    name: String,
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, url: &Url) -> Result<Option<CachedEntry>, Error> {
        self.db.match_entry(&self.name, url).await
    }

    pub async fn put(&self, entry: &CachedEntry) -> Result<(), Error> {
        self.db.put_entry(&self.name, entry).await
    }

    pub async fn urls(&self) -> Result<Vec<String>, Error> {
        self.db.entry_urls(&self.name).await
    }

    /// Evict least recently used entries beyond `max_entries`.
    pub async fn trim(&self, max_entries: usize) -> Result<u64, Error> {
        self.db.trim_partition(&self.name, max_entries).await
    }
}

impl CacheDb {
    /// Create the partition if it does not exist yet.
    pub async fn create_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Every partition name present in storage.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY name")?;
                let names = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and, by cascade, all of its entries.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

/// Owner of the four current partitions.
#[derive(Debug, Clone)]
pub struct CacheNamespaces {
    db: CacheDb,
    set: PartitionSet,
}

impl CacheNamespaces {
    pub fn new(db: CacheDb, set: PartitionSet) -> Self {
        Self { db, set }
    }

    pub fn set(&self) -> &PartitionSet {
        &self.set
    }

    /// Open the current partition for `kind`, creating it when missing.
    pub async fn open(&self, kind: PartitionKind) -> Result<Partition, Error> {
        self.open_named(&self.set.name(kind)).await
    }

    /// Open a partition by its full name.
    pub async fn open_named(&self, name: &str) -> Result<Partition, Error> {
        self.db.create_partition(name).await?;
        Ok(Partition { db: self.db.clone(), name: name.to_string() })
    }

    /// Delete every partition whose name is not in `current`.
    ///
    /// Returns the deleted names. Partitions in `current` are left untouched.
    pub async fn evict_superseded(&self, current: &BTreeSet<String>) -> Result<Vec<String>, Error> {
        let mut evicted = Vec::new();
        for name in self.db.partition_names().await? {
            if current.contains(&name) {
                continue;
            }
            if self.db.delete_partition(&name).await? {
                tracing::info!(partition = %name, "deleted superseded cache partition");
                evicted.push(name);
            }
        }
        Ok(evicted)
    }

    /// Find a GET of `url` in any current partition.
    pub async fn match_any(&self, url: &Url) -> Result<Option<CachedEntry>, Error> {
        for kind in PartitionKind::ALL {
            if let Some(entry) = self.db.match_entry(&self.set.name(kind), url).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}
