//! Leaderboard table, held in memory and optionally mirrored to a JSON file

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: u64,
    pub username: String,
    pub difficulty: String,
    pub wave: u32,
    pub enemies_defeated: u32,
    pub turret: String,
    /// ISO-8601 submission time, compared as text
    pub date_time: String,
}

/// Validated row for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub username: String,
    pub difficulty: String,
    pub wave: u32,
    pub enemies_defeated: u32,
    pub turret: String,
    pub date_time: String,
}

#[derive(Debug)]
struct Table {
    entries: Vec<LeaderboardEntry>,
    next_id: u64,
}

/// Leaderboard store operations
#[derive(Clone)]
pub struct LeaderboardStore {
    table: Arc<RwLock<Table>>,
    path: Option<PathBuf>,
    /// Serializes file rewrites so an older table never lands last
    persist_lock: Arc<Mutex<()>>,
}

impl LeaderboardStore {
    /// Table that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                entries: Vec::new(),
                next_id: 1,
            })),
            path: None,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load the table from `path` if given. A missing file starts empty.
    pub async fn open(path: Option<PathBuf>) -> Result<Self, StoreError> {
        let Some(path) = path else {
            return Ok(Self::in_memory());
        };

        let entries: Vec<LeaderboardEntry> = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        info!(path = %path.display(), entries = entries.len(), "Leaderboard loaded");

        Ok(Self {
            table: Arc::new(RwLock::new(Table { entries, next_id })),
            path: Some(path),
            persist_lock: Arc::new(Mutex::new(())),
        })
    }

    /// All entries, best run first
    pub fn list(&self) -> Vec<LeaderboardEntry> {
        let mut entries = self.table.read().entries.clone();
        entries.sort_by(|a, b| {
            b.wave
                .cmp(&a.wave)
                .then_with(|| b.enemies_defeated.cmp(&a.enemies_defeated))
                .then_with(|| a.date_time.cmp(&b.date_time))
        });
        entries
    }

    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a row. If the file rewrite fails the row is rolled back.
    pub async fn insert(&self, new: NewEntry) -> Result<LeaderboardEntry, StoreError> {
        let _guard = self.persist_lock.lock().await;

        let entry = {
            let mut table = self.table.write();
            let entry = LeaderboardEntry {
                id: table.next_id,
                username: new.username,
                difficulty: new.difficulty,
                wave: new.wave,
                enemies_defeated: new.enemies_defeated,
                turret: new.turret,
                date_time: new.date_time,
            };
            table.next_id += 1;
            table.entries.push(entry.clone());
            entry
        };

        if let Err(e) = self.persist().await {
            self.table.write().entries.retain(|row| row.id != entry.id);
            return Err(e);
        }

        debug!(id = entry.id, wave = entry.wave, "Leaderboard entry stored");
        Ok(entry)
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = {
            let table = self.table.read();
            serde_json::to_string_pretty(&table.entries)?
        };
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

/// Leaderboard storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Leaderboard file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Leaderboard data error: {0}")]
    Serialize(#[from] serde_json::Error),
}
