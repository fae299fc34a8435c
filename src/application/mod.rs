//! Application layer: loading, live replacement and batch use cases
//!
//! This layer orchestrates domain logic and owns file I/O.

pub mod batch;
pub mod error;
pub mod error_ext;
pub mod loader;
pub mod provider;

pub use batch::resolve_all;
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use loader::{load_evidence, load_evidence_records, load_tree, EvidenceRecord};
pub use provider::TreeProvider;
