//! Wiring of stores, reconciler, status reporter and authoring.

use std::sync::Arc;

use crate::config::ResolvedConfig;
use crate::library::{CatalogStore, ContentStore, FsContentStore, JsonCatalogStore};

use super::authoring::Authoring;
use super::derive::DerivationRules;
use super::limits::SyncLimits;
use super::reconciler::Reconciler;
use super::status::StatusReporter;

/// Entry point bundling the store handles shared by every operation
#[derive(Clone)]
pub struct Portal {
    content: Arc<dyn ContentStore>,
    catalog: Arc<dyn CatalogStore>,
    rules: DerivationRules,
    limits: SyncLimits,
}

impl Portal {
    /// Build a portal over arbitrary stores
    pub fn new(content: Arc<dyn ContentStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            content,
            catalog,
            rules: DerivationRules::default(),
            limits: SyncLimits::default(),
        }
    }

    /// Build a portal over the filesystem stores named by the configuration
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let content = FsContentStore::new(&config.content_dir).with_limits(config.limits.clone());
        let catalog = JsonCatalogStore::new(&config.catalog_path);

        Self::new(Arc::new(content), Arc::new(catalog))
            .with_rules(config.rules.clone())
            .with_limits(config.limits.clone())
    }

    pub fn with_rules(mut self, rules: DerivationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_limits(mut self, limits: SyncLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.content.clone(), self.catalog.clone())
            .with_rules(self.rules.clone())
            .with_limits(self.limits.clone())
    }

    pub fn status_reporter(&self) -> StatusReporter {
        StatusReporter::new(self.content.clone(), self.catalog.clone())
            .with_limits(self.limits.clone())
    }

    pub fn authoring(&self) -> Authoring {
        Authoring::new(self.content.clone(), self.catalog.clone())
    }
}
