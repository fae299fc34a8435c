//! Tree traversal: resolve evidence to the most specific reachable profile.
//!
//! Policy:
//! - children are tried in declared order and the first match is followed
//!   (decision list; never more than one branch),
//! - a profile id on a deeper node overrides one on a shallower node,
//! - children whose evidence is unavailable are skipped, never an error.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::domain::evidence::EvidenceSource;
use crate::domain::node::{CaseSensitivity, Node, NodeIndex, ProfileId};
use crate::domain::tree::ProfileTree;

/// Which evidence key a node without its own `m` field reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// Use the nearest ancestor's key on the followed path.
    #[default]
    Inherit,
    /// Nodes must name their key; nodes without one are skipped.
    Explicit,
}

/// Evaluation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub case_sensitive: bool,
    pub key_policy: KeyPolicy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            key_policy: KeyPolicy::Inherit,
        }
    }
}

impl MatchOptions {
    fn case(&self) -> CaseSensitivity {
        if self.case_sensitive {
            CaseSensitivity::Sensitive
        } else {
            CaseSensitivity::Insensitive
        }
    }
}

/// Why no profile was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    /// No tree is loaded.
    NoTree,
    /// Traversal stopped because evidence needed by the next branches was missing.
    MissingEvidence,
    /// Evidence was present but no branch matched it.
    NoMatchingBranch,
    /// Branches matched, but no node on the followed path carries a profile.
    NoProfileOnPath,
}

impl fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoTree => "no tree loaded",
            Self::MissingEvidence => "missing evidence",
            Self::NoMatchingBranch => "no matching branch",
            Self::NoProfileOnPath => "no profile on matched path",
        };
        f.write_str(text)
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub profile_id: Option<ProfileId>,
    /// Node indices followed from the root, root first
    pub path: Vec<NodeIndex>,
    /// Set exactly when `profile_id` is absent
    pub reason: Option<NoMatchReason>,
}

impl Resolution {
    pub fn no_tree() -> Self {
        Self {
            profile_id: None,
            path: Vec::new(),
            reason: Some(NoMatchReason::NoTree),
        }
    }

    pub fn is_match(&self) -> bool {
        self.profile_id.is_some()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.profile_id, self.reason) {
            (Some(id), _) => write!(f, "{id}")?,
            (None, Some(reason)) => write!(f, "no match ({reason})")?,
            (None, None) => write!(f, "no match")?,
        }
        if !self.path.is_empty() {
            write!(f, " [path: {}]", self.path.iter().join(" -> "))?;
        }
        Ok(())
    }
}

/// How a single child fared against the evidence.
enum Outcome {
    Matched,
    Rejected,
    Skipped,
}

/// Walks a [`ProfileTree`] against an [`EvidenceSource`].
///
/// Stateless apart from its options; one evaluator can serve any number of
/// threads and trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    options: MatchOptions,
}

impl Evaluator {
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Most specific profile id, or `None`.
    pub fn evaluate<E: EvidenceSource + ?Sized>(&self, tree: &ProfileTree, evidence: &E) -> Option<ProfileId> {
        self.resolve(tree, evidence).profile_id
    }

    /// Full resolution including the followed path and the no-match reason.
    #[instrument(level = "debug", skip_all, fields(version = tree.version()))]
    pub fn resolve<E: EvidenceSource + ?Sized>(&self, tree: &ProfileTree, evidence: &E) -> Resolution {
        let mut current = tree.root();
        let mut key = current.evidence_key();
        let mut best = current.profile_id();
        let mut path = vec![current.index()];

        let stop = loop {
            let mut skipped = 0usize;
            let mut rejected = 0usize;
            let mut next = None;

            for child in tree.children(current) {
                match self.try_child(child, key, evidence) {
                    Outcome::Matched => {
                        next = Some(child);
                        break;
                    }
                    Outcome::Rejected => rejected += 1,
                    Outcome::Skipped => skipped += 1,
                }
            }

            match next {
                Some(child) => {
                    trace!(node = child.index(), "descending");
                    if child.evidence_key().is_some() {
                        key = child.evidence_key();
                    }
                    if child.profile_id().is_some() {
                        best = child.profile_id();
                    }
                    path.push(child.index());
                    current = child;
                }
                None if skipped > 0 && rejected == 0 => break Some(NoMatchReason::MissingEvidence),
                None if rejected > 0 => break Some(NoMatchReason::NoMatchingBranch),
                None => break None,
            }
        };

        let reason = match best {
            Some(_) => None,
            None => Some(stop.unwrap_or(NoMatchReason::NoProfileOnPath)),
        };
        Resolution {
            profile_id: best,
            path,
            reason,
        }
    }

    fn try_child<E: EvidenceSource + ?Sized>(
        &self,
        child: &Node,
        inherited: Option<&str>,
        evidence: &E,
    ) -> Outcome {
        let key = match (child.evidence_key(), self.options.key_policy) {
            (Some(own), _) => own,
            (None, KeyPolicy::Inherit) => match inherited {
                Some(k) => k,
                None => return Outcome::Skipped,
            },
            (None, KeyPolicy::Explicit) => return Outcome::Skipped,
        };
        let Some(value) = evidence.evidence(key) else {
            trace!(node = child.index(), key, "no evidence, skipping");
            return Outcome::Skipped;
        };
        if child.matches(&value, self.options.case()) {
            Outcome::Matched
        } else {
            Outcome::Rejected
        }
    }
}
