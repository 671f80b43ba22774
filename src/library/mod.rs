//! Storage for content documents and the catalog index.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.portal/
//! ├── catalog.json              # Catalog index (JSON array of cards)
//! ├── catalog.json.lock         # Advisory writer lock
//! └── tutorials/
//!     └── <slug>.json           # One content document per slug
//! ```

pub mod catalog;
pub mod content;

pub use catalog::{CatalogError, CatalogIndex, CatalogStore, JsonCatalogStore, MemoryCatalogStore, WriterGuard};
pub use content::{ContentStore, FsContentStore, MemoryContentStore};
