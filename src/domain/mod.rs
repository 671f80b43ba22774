//! Domain types for the portal catalog.
//!
//! This module contains the core data structures:
//! - ContentDocument: Full tutorial body (chapters and blocks)
//! - CatalogEntry: Summary card shown in listings
//! - CardData: Card fields submitted by authors

pub mod card;
pub mod document;

// Re-export commonly used types
pub use card::{validate_slug, CardData, CatalogEntry, Role};
pub use document::{BlockKind, Chapter, ContentBlock, ContentDocument};
