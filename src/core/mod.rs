//! Core catalog logic.
//!
//! This module contains:
//! - Derive: Card field synthesis (role, image, description)
//! - Limits: Scan deadline and document size limits
//! - Reconciler: Synthesizes missing cards from content documents
//! - Status: Read-only sync status
//! - Authoring: Course create/update/delete
//! - Portal: Wiring of stores and operations

pub mod authoring;
pub mod derive;
pub mod limits;
pub mod portal;
pub mod reconciler;
pub mod status;

// Re-export commonly used types
pub use authoring::{Authoring, CourseSubmission, CourseUpdate, DeleteOutcome};
pub use derive::{classify_role, default_image, describe, synthesize_entry, DerivationRules};
pub use limits::{SyncLimits, SyncViolation};
pub use portal::Portal;
pub use reconciler::{ReconcileReport, Reconciler};
pub use status::{StatusReport, StatusReporter};
