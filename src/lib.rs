//! portal - Tutorial catalog for the content portal
//!
//! Course content lives as one JSON document per slug; the listing shown to
//! users is a separate catalog index of cards. This crate keeps the two in
//! sync and provides the authoring operations that write them.
//!
//! # Architecture
//!
//! - The content store is authoritative for which courses exist
//! - The catalog index is derived: missing cards are synthesized from the
//!   document (role by keywords, default image, description from the text)
//! - Every operation reloads both stores; writers hold a single-writer lock
//!
//! # Modules
//!
//! - `domain`: Data structures (ContentDocument, CatalogEntry, CardData)
//! - `library`: Content store and catalog index persistence
//! - `core`: Reconciler, status reporter, authoring
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Create cards for documents that have none
//! portal sync
//!
//! # Show documents without a card
//! portal status
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod library;

// Re-export main types at crate root for convenience
pub use crate::core::{Portal, ReconcileReport, Reconciler, StatusReport, StatusReporter};
pub use domain::{CardData, CatalogEntry, ContentDocument, Role};
pub use error::PortalError;
pub use library::{CatalogIndex, CatalogStore, ContentStore};
