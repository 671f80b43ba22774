//! Error types surfaced by the catalog operations.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::core::limits::SyncViolation;
use crate::library::catalog::CatalogError;

/// Errors returned by reconciliation, status and authoring
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Failed to list content directory {path}: {source}")]
    ContentList {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read document '{slug}': {source}")]
    ContentRead {
        slug: String,
        source: std::io::Error,
    },

    #[error("Failed to parse document '{slug}': {source}")]
    DocumentParse {
        slug: String,
        source: serde_json::Error,
    },

    #[error("Failed to write document '{slug}': {source}")]
    ContentWrite {
        slug: String,
        source: std::io::Error,
    },

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Course already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid card data: {}", .0.join("; "))]
    InvalidCard(Vec<String>),

    #[error(transparent)]
    Limit(#[from] SyncViolation),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl PortalError {
    /// Short machine-friendly error category
    pub fn kind(&self) -> &'static str {
        match self {
            PortalError::ContentList { .. } => "content_list",
            PortalError::ContentRead { .. } => "content_read",
            PortalError::DocumentParse { .. } => "document_parse",
            PortalError::ContentWrite { .. } => "content_write",
            PortalError::InvalidSlug(_) => "invalid_slug",
            PortalError::NotFound(_) => "not_found",
            PortalError::AlreadyExists(_) => "already_exists",
            PortalError::InvalidCard(_) => "invalid_card",
            PortalError::Limit(_) => "limit",
            PortalError::Catalog(_) => "catalog",
        }
    }
}

/// Structured error payload handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub kind: String,
    pub details: String,
}

impl ErrorPayload {
    /// Build a payload from any error chain, classifying portal errors
    pub fn from_anyhow(summary: &str, err: &anyhow::Error) -> Self {
        let kind = err
            .chain()
            .find_map(|e| e.downcast_ref::<PortalError>())
            .map(|e| e.kind())
            .unwrap_or("internal");

        Self {
            error: summary.to_string(),
            kind: kind.to_string(),
            details: format!("{:#}", err),
        }
    }
}
