//! Live tree holder with atomic whole-tree replacement.
//!
//! Readers take a snapshot (`Arc<ProfileTree>`) with a single atomic load and
//! keep it for the duration of their evaluation, so a concurrent reload never
//! changes a tree that is in use. Reloads build the new tree completely before
//! swapping it in; a failed reload leaves the previous tree in place.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{info, instrument, warn};

use crate::application::loader::load_tree;
use crate::application::ApplicationResult;
use crate::domain::{Evaluator, EvidenceSource, MatchOptions, ProfileId, ProfileTree, Resolution};

/// Shareable handle to the currently loaded tree.
#[derive(Clone, Default)]
pub struct TreeProvider {
    current: Arc<ArcSwapOption<ProfileTree>>,
    evaluator: Evaluator,
}

impl TreeProvider {
    pub fn new(options: MatchOptions) -> Self {
        Self {
            current: Arc::new(ArcSwapOption::empty()),
            evaluator: Evaluator::new(options),
        }
    }

    pub fn with_tree(tree: ProfileTree, options: MatchOptions) -> Self {
        let provider = Self::new(options);
        provider.replace(tree);
        provider
    }

    /// Snapshot of the current tree, if any.
    pub fn current(&self) -> Option<Arc<ProfileTree>> {
        self.current.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Swap in a new tree, returning the previous one.
    pub fn replace(&self, tree: ProfileTree) -> Option<Arc<ProfileTree>> {
        info!(version = tree.version(), publish_date = tree.publish_date(), "profile tree replaced");
        self.current.swap(Some(Arc::new(tree)))
    }

    /// Build a tree from `path` and swap it in. On failure the previously
    /// loaded tree (if any) stays active and the error is returned.
    #[instrument(level = "debug", skip(self))]
    pub fn reload_from_path(&self, path: &Path) -> ApplicationResult<Arc<ProfileTree>> {
        match load_tree(path) {
            Ok(tree) => {
                let tree = Arc::new(tree);
                self.current.store(Some(Arc::clone(&tree)));
                info!(version = tree.version(), "profile tree reloaded");
                Ok(tree)
            }
            Err(e) => {
                if self.is_loaded() {
                    warn!(error = %e, "reload failed, keeping previous tree");
                } else {
                    warn!(error = %e, "reload failed, no tree loaded");
                }
                Err(e)
            }
        }
    }

    pub fn resolve<E: EvidenceSource + ?Sized>(&self, evidence: &E) -> Resolution {
        match self.current.load_full() {
            Some(tree) => self.evaluator.resolve(&tree, evidence),
            None => Resolution::no_tree(),
        }
    }

    pub fn evaluate<E: EvidenceSource + ?Sized>(&self, evidence: &E) -> Option<ProfileId> {
        self.resolve(evidence).profile_id
    }
}
