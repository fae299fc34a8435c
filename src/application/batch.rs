//! Resolve many evidence records against one tree in parallel.

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::domain::{Evaluator, EvidenceSource, ProfileTree, Resolution};

/// Resolve every record, preserving input order.
///
/// The tree is shared read-only across worker threads.
#[instrument(level = "debug", skip_all, fields(records = records.len()))]
pub fn resolve_all<E>(tree: &ProfileTree, evaluator: &Evaluator, records: &[E]) -> Vec<Resolution>
where
    E: EvidenceSource + Sync,
{
    let resolutions: Vec<Resolution> = records
        .par_iter()
        .map(|record| evaluator.resolve(tree, record))
        .collect();
    debug!(
        matched = resolutions.iter().filter(|r| r.is_match()).count(),
        "batch resolved"
    );
    resolutions
}
