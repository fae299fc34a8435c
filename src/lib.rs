//! proftree: resolve measured device evidence to a profile id by walking a
//! published decision tree.
//!
//! The tree arrives as a compact JSON document (`Version`, `PublishDate`,
//! `Data`), is decoded once by [`domain::TreeBuilder`] into an immutable
//! [`domain::ProfileTree`], and is then walked by [`domain::Evaluator`]
//! for any number of evidence sets.
//!
//! ```
//! use std::collections::HashMap;
//! use proftree::domain::{Evaluator, TreeBuilder};
//!
//! let tree = TreeBuilder::new()
//!     .build_from_str(r#"{"Version": "1", "PublishDate": "2024-01-01",
//!         "Data": [{"n": [1]}, {"m": "screenwidth", "r": [[300, 400]], "x": 42}]}"#)
//!     .unwrap();
//! let evidence = HashMap::from([("screenwidth".to_string(), "350".to_string())]);
//!
//! assert_eq!(Evaluator::default().evaluate(&tree, &evidence), Some(42));
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

pub use application::{ApplicationError, TreeProvider};
pub use domain::{Evaluator, EvidenceSource, EvidenceValue, ProfileTree, Resolution, TreeBuilder, TreeError};
