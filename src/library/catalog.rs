//! Catalog index of course cards.
//!
//! The whole index is one JSON array snapshot. Loading never fails (a missing
//! or corrupt snapshot reads as empty); saving replaces the snapshot atomically.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, warn};

use crate::domain::{CatalogEntry, Role};

/// Errors persisting the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to acquire catalog write lock {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Ordered collection of all catalog entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogIndex {
    pub entries: Vec<CatalogEntry>,
}

impl CatalogIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index from existing entries
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Highest id in the index, 0 if empty
    pub fn max_id(&self) -> u64 {
        self.entries.iter().map(|e| e.id).max().unwrap_or(0)
    }

    /// Id for the next entry (max + 1)
    pub fn next_id(&self) -> u64 {
        self.max_id() + 1
    }

    /// Check if a slug has an entry
    pub fn contains_slug(&self, slug: &str) -> bool {
        self.entries.iter().any(|e| e.slug == slug)
    }

    /// Get an entry by slug
    pub fn get(&self, slug: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.slug == slug)
    }

    /// Get a mutable entry by slug
    pub fn get_mut(&mut self, slug: &str) -> Option<&mut CatalogEntry> {
        self.entries.iter_mut().find(|e| e.slug == slug)
    }

    /// Append an entry
    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    /// Remove every entry for a slug, returning the first removed
    pub fn remove(&mut self, slug: &str) -> Option<CatalogEntry> {
        let pos = self.entries.iter().position(|e| e.slug == slug)?;
        let removed = self.entries.remove(pos);
        self.entries.retain(|e| e.slug != slug);
        Some(removed)
    }

    /// Entries with the given role
    pub fn filter_by_role(&self, role: Role) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|e| e.role == role).collect()
    }

    /// Search entries by query (case-insensitive substring match)
    pub fn search(&self, query: &str) -> Vec<&CatalogEntry> {
        let query_lower = query.to_lowercase();

        self.entries
            .iter()
            .filter(|e| {
                e.title.to_lowercase().contains(&query_lower)
                    || e.slug.to_lowercase().contains(&query_lower)
                    || e.description.to_lowercase().contains(&query_lower)
            })
            .collect()
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Held while a writer runs its load-modify-save cycle; released on drop
pub struct WriterGuard {
    _local: Option<OwnedMutexGuard<()>>,
    _file: Option<std::fs::File>,
}

impl WriterGuard {
    /// A guard that holds nothing
    pub fn unlocked() -> Self {
        Self {
            _local: None,
            _file: None,
        }
    }
}

/// Persistence of the catalog snapshot
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Load the index; missing or unreadable snapshots load as empty
    async fn load(&self) -> CatalogIndex;

    /// Replace the snapshot with `index`
    async fn save(&self, index: &CatalogIndex) -> Result<(), CatalogError>;

    /// Serialize writers; hold the guard across load-modify-save
    async fn acquire_writer(&self) -> Result<WriterGuard, CatalogError> {
        Ok(WriterGuard::unlocked())
    }
}

/// JSON file catalog store
#[derive(Debug, Clone)]
pub struct JsonCatalogStore {
    /// Snapshot file
    path: PathBuf,

    /// In-process writer serialization
    writers: Arc<Mutex<()>>,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writers: Arc::new(Mutex::new(())),
        }
    }

    /// Get the snapshot path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the advisory lock file path (`<snapshot>.lock`)
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write to a temp file next to `path`, then rename over it
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CatalogError> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CatalogError::Io(e.error))?;

    Ok(())
}

fn lock_file(path: &Path) -> Result<std::fs::File, CatalogError> {
    let lock_err = |source: std::io::Error| CatalogError::Lock {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(parent_dir(path)).map_err(lock_err)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(lock_err)?;
    file.lock_exclusive().map_err(lock_err)?;

    Ok(file)
}

fn join_error(e: tokio::task::JoinError) -> CatalogError {
    CatalogError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}

#[async_trait]
impl CatalogStore for JsonCatalogStore {
    async fn load(&self) -> CatalogIndex {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No catalog snapshot, starting empty");
                return CatalogIndex::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Catalog snapshot unreadable, starting empty");
                return CatalogIndex::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(index) => index,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Catalog snapshot corrupt, starting empty");
                CatalogIndex::new()
            }
        }
    }

    async fn save(&self, index: &CatalogIndex) -> Result<(), CatalogError> {
        let content = serde_json::to_string_pretty(index)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, content.as_bytes()))
            .await
            .map_err(join_error)??;

        debug!(path = %self.path.display(), entries = index.len(), "Catalog saved");
        Ok(())
    }

    async fn acquire_writer(&self) -> Result<WriterGuard, CatalogError> {
        let local = self.writers.clone().lock_owned().await;
        let lock_path = self.lock_path();

        let file = tokio::task::spawn_blocking(move || lock_file(&lock_path))
            .await
            .map_err(join_error)??;

        Ok(WriterGuard {
            _local: Some(local),
            _file: Some(file),
        })
    }
}

/// In-memory catalog store for tests and embedding.
///
/// Holds the raw snapshot text so corrupt snapshots can be staged, and can be
/// told to fail saves.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    snapshot: RwLock<Option<String>>,
    writers: Arc<Mutex<()>>,
    fail_saves: AtomicBool,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a raw snapshot text
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            snapshot: RwLock::new(Some(raw.into())),
            ..Default::default()
        }
    }

    /// Start from existing entries
    pub fn with_entries(entries: Vec<CatalogEntry>) -> Self {
        let raw = serde_json::to_string(&CatalogIndex::from_entries(entries)).unwrap_or_default();
        Self::with_raw(raw)
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Current raw snapshot, if any was saved
    pub async fn raw(&self) -> Option<String> {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn load(&self) -> CatalogIndex {
        self.snapshot
            .read()
            .await
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    async fn save(&self, index: &CatalogIndex) -> Result<(), CatalogError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CatalogError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "catalog is read-only",
            )));
        }
        let raw = serde_json::to_string(index)?;
        *self.snapshot.write().await = Some(raw);
        Ok(())
    }

    async fn acquire_writer(&self) -> Result<WriterGuard, CatalogError> {
        let local = self.writers.clone().lock_owned().await;
        Ok(WriterGuard {
            _local: Some(local),
            _file: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(id: u64, slug: &str, role: Role) -> CatalogEntry {
        CatalogEntry {
            id,
            title: format!("Curso {}", slug),
            image: format!("/assets/images/{}.png", slug),
            slug: slug.to_string(),
            description: "Descrição".to_string(),
            role,
        }
    }

    #[test]
    fn test_next_id() {
        let mut index = CatalogIndex::new();
        assert_eq!(index.max_id(), 0);
        assert_eq!(index.next_id(), 1);

        index.push(entry(3, "a", Role::Sus));
        index.push(entry(1, "b", Role::Saude));
        assert_eq!(index.next_id(), 4);
    }

    #[test]
    fn test_get_and_remove() {
        let mut index = CatalogIndex::from_entries(vec![
            entry(1, "glpi", Role::Sus),
            entry(2, "pronto", Role::Saude),
        ]);

        assert!(index.contains_slug("glpi"));
        assert_eq!(index.get("pronto").map(|e| e.id), Some(2));

        let removed = index.remove("glpi");
        assert_eq!(removed.map(|e| e.id), Some(1));
        assert!(!index.contains_slug("glpi"));
        assert!(index.remove("glpi").is_none());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_filter_and_search() {
        let index = CatalogIndex::from_entries(vec![
            entry(1, "glpi", Role::Sus),
            entry(2, "umdoc", Role::Sus),
            entry(3, "pronto", Role::Saude),
        ]);

        assert_eq!(index.filter_by_role(Role::Sus).len(), 2);
        assert_eq!(index.filter_by_role(Role::Saude).len(), 1);
        assert_eq!(index.search("GLPI").len(), 1);
        assert_eq!(index.search("descrição").len(), 3);
        assert!(index.search("python").is_empty());
    }

    #[test]
    fn test_snapshot_is_bare_array() {
        let index = CatalogIndex::from_entries(vec![entry(1, "glpi", Role::Sus)]);
        let json = serde_json::to_string(&index).unwrap();
        assert!(json.starts_with('['));

        let parsed: CatalogIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, index);
    }

    #[tokio::test]
    async fn test_json_store_missing_and_corrupt_load_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        let store = JsonCatalogStore::new(&path);

        assert!(store.load().await.is_empty());

        std::fs::write(&path, "{ definitely not a catalog").unwrap();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_json_store_save_creates_parent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("data").join("catalog.json");
        let store = JsonCatalogStore::new(&path);

        let index = CatalogIndex::from_entries(vec![
            entry(1, "glpi", Role::Sus),
            entry(2, "pronto", Role::Saude),
        ]);
        store.save(&index).await.unwrap();

        assert!(path.exists());
        assert_eq!(store.load().await, index);

        // Full overwrite, no leftovers
        store.save(&CatalogIndex::new()).await.unwrap();
        assert!(store.load().await.is_empty());
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_writer_guard_serializes_writers() {
        let temp = TempDir::new().unwrap();
        let store = JsonCatalogStore::new(temp.path().join("catalog.json"));

        let guard = store.acquire_writer().await.unwrap();
        assert!(store.lock_path().exists());

        let second = store.clone();
        let pending = tokio::spawn(async move { second.acquire_writer().await.map(|_| ()) });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!pending.is_finished());

        drop(guard);
        pending.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_failures() {
        let store = MemoryCatalogStore::with_raw("not json");
        assert!(store.load().await.is_empty());

        store.fail_saves(true);
        assert!(store.save(&CatalogIndex::new()).await.is_err());

        store.fail_saves(false);
        store.save(&CatalogIndex::new()).await.unwrap();
        assert_eq!(store.raw().await.as_deref(), Some("[]"));
    }
}
