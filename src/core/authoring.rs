//! Authoring operations: create, update and delete courses.
//!
//! A course is a card plus its content document. Every write runs under the
//! catalog writer lock and reloads the index first.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::domain::{validate_slug, CardData, CatalogEntry, ContentDocument};
use crate::error::PortalError;
use crate::library::{CatalogIndex, CatalogStore, ContentStore};

/// A new course as submitted by an author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSubmission {
    #[serde(rename = "cardData")]
    pub card: CardData,

    #[serde(rename = "tutorialContent")]
    pub content: ContentDocument,
}

/// Partial update of an existing course
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseUpdate {
    #[serde(rename = "cardData", default)]
    pub card: Option<CardData>,

    #[serde(rename = "tutorialContent", default)]
    pub content: Option<ContentDocument>,
}

/// What a deletion removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub slug: String,
    pub removed_document: bool,
    pub removed_entry: bool,
}

/// Course authoring over the content and catalog stores
#[derive(Clone)]
pub struct Authoring {
    content: Arc<dyn ContentStore>,
    catalog: Arc<dyn CatalogStore>,
}

/// Force a document's id to the slug it is stored under
fn bind_document(mut doc: ContentDocument, slug: &str) -> ContentDocument {
    if doc.id != slug {
        warn!(document_id = %doc.id, %slug, "Document id differs from slug, using slug");
        doc.id = slug.to_string();
    }
    doc
}

impl Authoring {
    pub fn new(content: Arc<dyn ContentStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { content, catalog }
    }

    /// All catalog entries
    pub async fn list_entries(&self) -> CatalogIndex {
        self.catalog.load().await
    }

    /// Card for a slug
    pub async fn get_entry(&self, slug: &str) -> Option<CatalogEntry> {
        self.catalog.load().await.get(slug).cloned()
    }

    /// Content document for a slug
    pub async fn read_document(&self, slug: &str) -> Result<ContentDocument, PortalError> {
        self.content.read(slug).await
    }

    /// Return the document, writing a placeholder first if it does not exist.
    ///
    /// The boolean is true when the placeholder was created.
    #[instrument(skip(self))]
    pub async fn scaffold_document(&self, slug: &str) -> Result<(ContentDocument, bool), PortalError> {
        match self.content.read(slug).await {
            Ok(doc) => Ok((doc, false)),
            Err(PortalError::NotFound(_)) => {
                let doc = ContentDocument::placeholder(slug);
                self.content.write(&doc).await?;
                info!(%slug, "Placeholder document created");
                Ok((doc, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Create a course: write its document and append its card
    #[instrument(skip(self, submission), fields(slug = %submission.card.slug))]
    pub async fn create_course(&self, submission: CourseSubmission) -> Result<CatalogEntry, PortalError> {
        let CourseSubmission { card, content } = submission;
        card.validate().map_err(PortalError::InvalidCard)?;

        let _writer = self.catalog.acquire_writer().await?;
        let mut index = self.catalog.load().await;

        if index.contains_slug(&card.slug) || self.content.exists(&card.slug).await? {
            return Err(PortalError::AlreadyExists(card.slug));
        }

        let content = bind_document(content, &card.slug);
        self.content.write(&content).await?;

        let entry = card.into_entry(index.next_id());
        index.push(entry.clone());
        self.catalog.save(&index).await?;

        info!(id = entry.id, title = %entry.title, "Course created");
        Ok(entry)
    }

    /// Update a course's card and/or document.
    ///
    /// Card data updates the existing card, or adds one when the slug has
    /// none. Returns the slug's card after the update, if it has one.
    #[instrument(skip(self, update))]
    pub async fn update_course(
        &self,
        slug: &str,
        update: CourseUpdate,
    ) -> Result<Option<CatalogEntry>, PortalError> {
        validate_slug(slug).map_err(PortalError::InvalidSlug)?;

        let CourseUpdate { card, content } = update;
        let card = match card {
            Some(mut card) => {
                card.slug = slug.to_string();
                card.validate().map_err(PortalError::InvalidCard)?;
                Some(card)
            }
            None => None,
        };

        let _writer = self.catalog.acquire_writer().await?;
        let mut index = self.catalog.load().await;

        if content.is_none() && !index.contains_slug(slug) && !self.content.exists(slug).await? {
            return Err(PortalError::NotFound(slug.to_string()));
        }

        if let Some(content) = content {
            let content = bind_document(content, slug);
            self.content.write(&content).await?;
            info!(%slug, "Document updated");
        }

        if let Some(card) = card {
            match index.get_mut(slug) {
                Some(existing) => existing.apply(&card),
                None => {
                    let id = index.next_id();
                    index.push(card.into_entry(id));
                }
            }
            self.catalog.save(&index).await?;
            info!(%slug, "Card updated");
        }

        Ok(index.get(slug).cloned())
    }

    /// Delete a course's card and, optionally, its document.
    ///
    /// A kept document gets a fresh card on the next reconciliation.
    #[instrument(skip(self))]
    pub async fn delete_course(
        &self,
        slug: &str,
        remove_document: bool,
    ) -> Result<DeleteOutcome, PortalError> {
        validate_slug(slug).map_err(PortalError::InvalidSlug)?;

        let _writer = self.catalog.acquire_writer().await?;
        let mut index = self.catalog.load().await;

        let removed_document = if remove_document {
            self.content.delete(slug).await?
        } else {
            false
        };

        let removed_entry = index.remove(slug).is_some();
        if removed_entry {
            self.catalog.save(&index).await?;
        }

        if !removed_document && !removed_entry {
            return Err(PortalError::NotFound(slug.to_string()));
        }

        info!(%slug, removed_document, removed_entry, "Course deleted");
        Ok(DeleteOutcome {
            slug: slug.to_string(),
            removed_document,
            removed_entry,
        })
    }
}
