//! Read-only sync status over the content store and catalog index.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::PortalError;
use crate::library::{CatalogStore, ContentStore};

use super::limits::{SyncLimits, SyncViolation};

/// Snapshot of how far the catalog lags the content store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Number of content documents
    pub documents_found: usize,

    /// Number of catalog entries
    pub catalog_entries: usize,

    /// Documents without a card, in store order
    pub unmatched: Vec<String>,

    /// Cards whose document no longer exists
    pub orphaned: Vec<String>,

    /// When the status was computed
    pub checked_at: DateTime<Utc>,
}

impl StatusReport {
    /// True when every document has a card
    pub fn is_in_sync(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Reports sync status without mutating either store
#[derive(Clone)]
pub struct StatusReporter {
    content: Arc<dyn ContentStore>,
    catalog: Arc<dyn CatalogStore>,
    limits: SyncLimits,
}

impl StatusReporter {
    pub fn new(content: Arc<dyn ContentStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            content,
            catalog,
            limits: SyncLimits::default(),
        }
    }

    /// Use custom limits
    pub fn with_limits(mut self, limits: SyncLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Compute the current status
    #[instrument(skip(self))]
    pub async fn status(&self) -> Result<StatusReport, PortalError> {
        let slugs = tokio::time::timeout(self.limits.timeout(), self.content.list())
            .await
            .map_err(|_| SyncViolation::Timeout {
                limit_seconds: self.limits.timeout_seconds,
            })??;
        let index = self.catalog.load().await;

        let documents: HashSet<&str> = slugs.iter().map(String::as_str).collect();
        let unmatched: Vec<String> = slugs
            .iter()
            .filter(|slug| !index.contains_slug(slug))
            .cloned()
            .collect();
        let orphaned: Vec<String> = index
            .entries
            .iter()
            .filter(|e| !documents.contains(e.slug.as_str()))
            .map(|e| e.slug.clone())
            .collect();

        debug!(
            documents = slugs.len(),
            entries = index.len(),
            unmatched = unmatched.len(),
            "Status computed"
        );

        Ok(StatusReport {
            documents_found: slugs.len(),
            catalog_entries: index.len(),
            unmatched,
            orphaned,
            checked_at: Utc::now(),
        })
    }
}
