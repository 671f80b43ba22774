//! Content store: one JSON document per slug.
//!
//! The filesystem store keeps `<slug>.json` files in a single directory and
//! creates that directory on first access.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::core::limits::SyncLimits;
use crate::domain::{validate_slug, ContentDocument};
use crate::error::PortalError;

/// File extension of content documents
pub const DOCUMENT_EXTENSION: &str = "json";

/// Access to whole content documents keyed by slug
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// List every document slug, in store order.
    ///
    /// Only slugs that `read` accepts are listed.
    async fn list(&self) -> Result<Vec<String>, PortalError>;

    /// Read and parse one document
    async fn read(&self, slug: &str) -> Result<ContentDocument, PortalError>;

    /// Write (create or replace) a document under its `id`
    async fn write(&self, doc: &ContentDocument) -> Result<(), PortalError>;

    /// Delete a document, returning whether it existed
    async fn delete(&self, slug: &str) -> Result<bool, PortalError>;

    /// Check if a document exists
    async fn exists(&self, slug: &str) -> Result<bool, PortalError>;
}

fn checked_slug(slug: &str) -> Result<&str, PortalError> {
    validate_slug(slug).map_err(PortalError::InvalidSlug)?;
    Ok(slug)
}

/// Directory-backed content store
#[derive(Debug, Clone)]
pub struct FsContentStore {
    /// Directory holding the documents
    dir: PathBuf,

    /// Size limit applied on read
    limits: SyncLimits,
}

impl FsContentStore {
    /// Open a store rooted at `dir` (created lazily)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            limits: SyncLimits::default(),
        }
    }

    /// Use custom limits
    pub fn with_limits(mut self, limits: SyncLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Get the content directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the file path for a slug
    pub fn document_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", slug, DOCUMENT_EXTENSION))
    }

    /// Ensure the content directory exists
    async fn ensure_dir(&self) -> Result<(), PortalError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PortalError::ContentList {
                path: self.dir.clone(),
                source,
            })
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn list(&self) -> Result<Vec<String>, PortalError> {
        if !self.dir.exists() {
            debug!(dir = %self.dir.display(), "Creating content directory");
            self.ensure_dir().await?;
            return Ok(Vec::new());
        }

        let list_err = |source: std::io::Error| PortalError::ContentList {
            path: self.dir.clone(),
            source,
        };

        let mut slugs = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await.map_err(list_err)?;

        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if !entry.file_type().await.map_err(list_err)?.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "Skipping document with non UTF-8 name");
                continue;
            };
            if let Err(problem) = validate_slug(stem) {
                warn!(path = %path.display(), %problem, "Skipping document with unusable slug");
                continue;
            }
            slugs.push(stem.to_string());
        }

        Ok(slugs)
    }

    async fn read(&self, slug: &str) -> Result<ContentDocument, PortalError> {
        let slug = checked_slug(slug)?;
        let path = self.document_path(slug);

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PortalError::NotFound(slug.to_string()));
            }
            Err(source) => {
                return Err(PortalError::ContentRead {
                    slug: slug.to_string(),
                    source,
                })
            }
        };
        self.limits.validate_document(slug, metadata.len())?;

        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| PortalError::ContentRead {
                slug: slug.to_string(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| PortalError::DocumentParse {
            slug: slug.to_string(),
            source,
        })
    }

    async fn write(&self, doc: &ContentDocument) -> Result<(), PortalError> {
        let slug = checked_slug(&doc.id)?;
        self.ensure_dir().await?;

        let write_err = |source: std::io::Error| PortalError::ContentWrite {
            slug: slug.to_string(),
            source,
        };

        let content = serde_json::to_string_pretty(doc)
            .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        fs::write(self.document_path(slug), content)
            .await
            .map_err(write_err)?;

        Ok(())
    }

    async fn delete(&self, slug: &str) -> Result<bool, PortalError> {
        let slug = checked_slug(slug)?;

        match fs::remove_file(self.document_path(slug)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(PortalError::ContentWrite {
                slug: slug.to_string(),
                source,
            }),
        }
    }

    async fn exists(&self, slug: &str) -> Result<bool, PortalError> {
        let slug = checked_slug(slug)?;
        Ok(self.document_path(slug).is_file())
    }
}

/// In-memory content store for tests and embedding.
///
/// Documents are kept as raw JSON so malformed content can be staged; listing
/// follows insertion order.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    documents: RwLock<Vec<(String, String)>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with `(slug, raw_json)` pairs
    pub fn with_raw(documents: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let documents = documents
            .into_iter()
            .map(|(slug, raw)| (slug.into(), raw.into()))
            .collect();
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Insert or replace raw JSON for a slug
    pub async fn put_raw(&self, slug: impl Into<String>, raw: impl Into<String>) {
        let slug = slug.into();
        let raw = raw.into();
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|(s, _)| *s == slug) {
            Some(existing) => existing.1 = raw,
            None => documents.push((slug, raw)),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn list(&self) -> Result<Vec<String>, PortalError> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .map(|(slug, _)| slug.clone())
            .collect())
    }

    async fn read(&self, slug: &str) -> Result<ContentDocument, PortalError> {
        let documents = self.documents.read().await;
        let (_, raw) = documents
            .iter()
            .find(|(s, _)| s == slug)
            .ok_or_else(|| PortalError::NotFound(slug.to_string()))?;

        serde_json::from_str(raw).map_err(|source| PortalError::DocumentParse {
            slug: slug.to_string(),
            source,
        })
    }

    async fn write(&self, doc: &ContentDocument) -> Result<(), PortalError> {
        let slug = checked_slug(&doc.id)?;
        let raw = serde_json::to_string(doc).map_err(|source| PortalError::DocumentParse {
            slug: slug.to_string(),
            source,
        })?;
        self.put_raw(slug, raw).await;
        Ok(())
    }

    async fn delete(&self, slug: &str) -> Result<bool, PortalError> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|(s, _)| s != slug);
        Ok(documents.len() < before)
    }

    async fn exists(&self, slug: &str) -> Result<bool, PortalError> {
        Ok(self.documents.read().await.iter().any(|(s, _)| s == slug))
    }
}
