//! Limits enforced while reconciling the content directory.
//!
//! The number of documents is unbounded and every unmatched one requires a
//! full read, so the scan runs under a deadline and oversized documents are
//! refused before parsing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Limits applied to one reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLimits {
    /// Deadline for listing + reading documents (default: 30s)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Maximum size of a single document file (default: 5MB)
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}
fn default_max_document_bytes() -> u64 {
    5 * 1024 * 1024
} // 5MB

impl Default for SyncLimits {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

impl SyncLimits {
    /// Deadline for the scan phase
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Refuse documents larger than the configured size
    pub fn validate_document(&self, slug: &str, size: u64) -> Result<(), SyncViolation> {
        if size > self.max_document_bytes {
            return Err(SyncViolation::DocumentTooLarge {
                slug: slug.to_string(),
                actual: size,
                limit: self.max_document_bytes,
            });
        }
        Ok(())
    }
}

/// Limit violations
#[derive(Debug, Clone, Error)]
pub enum SyncViolation {
    #[error("Content scan timed out after {limit_seconds}s")]
    Timeout { limit_seconds: u64 },

    #[error("Document '{slug}' is too large: {actual} > {limit} bytes")]
    DocumentTooLarge { slug: String, actual: u64, limit: u64 },
}
