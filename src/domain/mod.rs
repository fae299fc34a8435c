//! Domain layer: tree model, decoding and evaluation
//!
//! This layer is independent of external concerns (no files, no CLI, no config loading).

pub mod builder;
pub(crate) mod descriptor;
pub mod error;
pub mod evaluator;
pub mod evidence;
pub mod node;
pub mod tree;

pub use builder::TreeBuilder;
pub use error::{TreeError, TreeResult};
pub use evaluator::{Evaluator, KeyPolicy, MatchOptions, NoMatchReason, Resolution};
pub use evidence::{from_fn, keys, parse_pairs, EvidenceSource, EvidenceValue, FromFn};
pub use node::{CaseSensitivity, Node, NodeIndex, NodeKind, ProfileId};
pub use tree::{ProfileTree, TreeIterator, MAX_RENDER_DEPTH};
