//! Loading tree data and evidence documents from files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{ProfileTree, TreeBuilder};

/// Evidence record as read from JSON: key to string/number/bool.
pub type EvidenceRecord = Map<String, Value>;

/// Decode the tree data file at `path`.
///
/// Failing to open the file is reported with the path; read failures during
/// decoding surface as the domain's stream error, unchanged.
#[instrument(level = "debug")]
pub fn load_tree(path: &Path) -> ApplicationResult<ProfileTree> {
    let file = File::open(path).with_path_context("open tree data", path)?;
    let tree = TreeBuilder::new().build_from_reader(BufReader::new(file))?;
    info!(
        path = %path.display(),
        version = tree.version(),
        publish_date = tree.publish_date(),
        nodes = tree.len(),
        "loaded profile tree"
    );
    Ok(tree)
}

/// Read a single evidence object, e.g. `{"screenwidth": 350, "hash3d": "abc"}`.
#[instrument(level = "debug")]
pub fn load_evidence(path: &Path) -> ApplicationResult<EvidenceRecord> {
    match read_json(path)? {
        Value::Object(map) => Ok(map),
        other => Err(invalid(path, format!("expected an object, found {}", kind_of(&other)))),
    }
}

/// Read an array of evidence objects for batch resolution.
#[instrument(level = "debug")]
pub fn load_evidence_records(path: &Path) -> ApplicationResult<Vec<EvidenceRecord>> {
    let Value::Array(items) = read_json(path)? else {
        return Err(invalid(path, "expected an array of objects".to_string()));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(invalid(path, format!("record {i}: expected an object, found {}", kind_of(&other)))),
        })
        .collect()
}

fn read_json(path: &Path) -> ApplicationResult<Value> {
    let file = File::open(path).with_path_context("open evidence", path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| invalid(path, e.to_string()))
}

fn invalid(path: &Path, message: String) -> ApplicationError {
    ApplicationError::InvalidEvidence {
        path: path.to_path_buf(),
        message,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
