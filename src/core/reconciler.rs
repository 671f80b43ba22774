//! Reconciliation of content documents into the catalog index.
//!
//! Every document in the content store must end up with a card. Missing cards
//! are synthesized from the document itself; existing cards are never touched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::domain::CatalogEntry;
use crate::error::PortalError;
use crate::library::{CatalogIndex, CatalogStore, ContentStore};

use super::derive::{synthesize_entry, DerivationRules};
use super::limits::{SyncLimits, SyncViolation};

/// Result of one reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Cards synthesized by this run
    #[serde(rename = "newEntriesCreated")]
    pub new_entries_created: usize,

    /// Cards in the index after the run
    #[serde(rename = "totalCursos")]
    pub total_entries: usize,

    /// The full resulting index
    #[serde(rename = "cursos")]
    pub entries: Vec<CatalogEntry>,
}

/// Synthesizes missing catalog entries from the content store
#[derive(Clone)]
pub struct Reconciler {
    content: Arc<dyn ContentStore>,
    catalog: Arc<dyn CatalogStore>,
    rules: DerivationRules,
    limits: SyncLimits,
}

impl Reconciler {
    /// Create a reconciler with default rules and limits
    pub fn new(content: Arc<dyn ContentStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            content,
            catalog,
            rules: DerivationRules::default(),
            limits: SyncLimits::default(),
        }
    }

    /// Use custom derivation rules
    pub fn with_rules(mut self, rules: DerivationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Use custom limits
    pub fn with_limits(mut self, limits: SyncLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Bring the catalog index in line with the content store.
    ///
    /// Runs under the catalog writer lock. Nothing is persisted unless every
    /// unmatched document was read and parsed within the deadline.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ReconcileReport, PortalError> {
        let _writer = self.catalog.acquire_writer().await?;

        let mut index = self.catalog.load().await;
        debug!(entries = index.len(), "Catalog loaded");

        let created = tokio::time::timeout(self.limits.timeout(), self.fill_missing(&mut index))
            .await
            .map_err(|_| SyncViolation::Timeout {
                limit_seconds: self.limits.timeout_seconds,
            })??;

        self.catalog.save(&index).await?;

        info!(
            created,
            total = index.len(),
            "Reconciliation complete"
        );

        Ok(ReconcileReport {
            new_entries_created: created,
            total_entries: index.len(),
            entries: index.entries,
        })
    }

    /// Append a synthesized entry for every unmatched document
    async fn fill_missing(&self, index: &mut CatalogIndex) -> Result<usize, PortalError> {
        let slugs = self.content.list().await?;
        debug!(documents = slugs.len(), "Content listed");

        let mut created = 0;
        for slug in slugs {
            if index.contains_slug(&slug) {
                debug!(%slug, "Card already exists");
                continue;
            }

            let doc = self.content.read(&slug).await?;
            let entry = synthesize_entry(index.next_id(), &slug, &doc, &self.rules);
            info!(%slug, id = entry.id, role = %entry.role, "Creating card");

            index.push(entry);
            created += 1;
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::library::{MemoryCatalogStore, MemoryContentStore};

    fn raw_doc(slug: &str, title: &str, text: &str) -> String {
        serde_json::json!({
            "id": slug,
            "titulo": title,
            "capitulos": [{
                "id": "c1",
                "titulo": "Intro",
                "conteudo": [{ "tipo": "paragrafo", "texto": text }]
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_empty_stores() {
        let catalog = Arc::new(MemoryCatalogStore::new());
        let reconciler = Reconciler::new(Arc::new(MemoryContentStore::new()), catalog.clone());

        let report = reconciler.reconcile().await.unwrap();
        assert_eq!(report.new_entries_created, 0);
        assert_eq!(report.total_entries, 0);
        assert_eq!(catalog.raw().await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_creates_in_listing_order() {
        let content = Arc::new(MemoryContentStore::with_raw([
            ("b", raw_doc("b", "Bee", "Texto do sus.")),
            ("a", raw_doc("a", "Ay", "Texto qualquer")),
        ]));
        let reconciler = Reconciler::new(content, Arc::new(MemoryCatalogStore::new()));

        let report = reconciler.reconcile().await.unwrap();
        assert_eq!(report.new_entries_created, 2);
        assert_eq!(report.entries[0].slug, "b");
        assert_eq!(report.entries[0].id, 1);
        assert_eq!(report.entries[0].role, Role::Sus);
        assert_eq!(report.entries[1].slug, "a");
        assert_eq!(report.entries[1].id, 2);
        assert_eq!(report.entries[1].description, "Texto qualquer...");
    }

    #[tokio::test]
    async fn test_parse_failure_persists_nothing() {
        let content = Arc::new(MemoryContentStore::with_raw([
            ("good", raw_doc("good", "Good", "ok.")),
            ("bad", "{ nope".to_string()),
        ]));
        let catalog = Arc::new(MemoryCatalogStore::new());
        let reconciler = Reconciler::new(content, catalog.clone());

        let err = reconciler.reconcile().await.unwrap_err();
        assert!(matches!(err, PortalError::DocumentParse { ref slug, .. } if slug == "bad"));
        assert!(catalog.raw().await.is_none());
    }

    #[tokio::test]
    async fn test_save_failure_surfaces() {
        let content = Arc::new(MemoryContentStore::with_raw([("a", raw_doc("a", "A", "x"))]));
        let catalog = Arc::new(MemoryCatalogStore::new());
        catalog.fail_saves(true);
        let reconciler = Reconciler::new(content, catalog.clone());

        assert!(matches!(
            reconciler.reconcile().await,
            Err(PortalError::Catalog(_))
        ));

        catalog.fail_saves(false);
        let report = reconciler.reconcile().await.unwrap();
        assert_eq!(report.new_entries_created, 1);
    }

    #[tokio::test]
    async fn test_custom_rules_apply() {
        let content = Arc::new(MemoryContentStore::with_raw([("a", raw_doc("a", "A", "abcdef"))]));
        let rules = DerivationRules {
            description_chars: 3,
            image_candidates: vec!["/img/{slug}.webp".to_string()],
            ..Default::default()
        };
        let reconciler =
            Reconciler::new(content, Arc::new(MemoryCatalogStore::new())).with_rules(rules);

        let report = reconciler.reconcile().await.unwrap();
        assert_eq!(report.entries[0].description, "abc...");
        assert_eq!(report.entries[0].image, "/img/a.webp");
    }

    #[test]
    fn test_report_json_keys() {
        let report = ReconcileReport {
            new_entries_created: 0,
            total_entries: 0,
            entries: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["newEntriesCreated"], 0);
        assert_eq!(json["totalCursos"], 0);
        assert!(json["cursos"].as_array().unwrap().is_empty());
    }
}
