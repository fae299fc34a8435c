//! Tree builder: decodes the compact positional encoding into a linked tree.

use std::io::Read;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::descriptor::{scalar_text, RawDescriptor, RawDocument};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::node::{Node, NodeIndex};
use crate::domain::tree::ProfileTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Constructs profile trees from encoded documents.
///
/// One builder may decode many documents in sequence; it must not be shared
/// across threads while a build is in progress.
pub struct TreeBuilder {
    marks: Vec<Mark>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    /// Decode a tree from a byte stream. The stream is read to the end once;
    /// read failures are returned unchanged as [`TreeError::Read`].
    #[instrument(level = "debug", skip_all)]
    pub fn build_from_reader<R: Read>(&mut self, mut reader: R) -> TreeResult<ProfileTree> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.build_from_slice(&bytes)
    }

    pub fn build_from_str(&mut self, document: &str) -> TreeResult<ProfileTree> {
        self.build_from_slice(document.as_bytes())
    }

    #[instrument(level = "debug", skip_all, fields(bytes = bytes.len()))]
    pub fn build_from_slice(&mut self, bytes: &[u8]) -> TreeResult<ProfileTree> {
        let document: RawDocument = serde_json::from_slice(bytes)
            .map_err(|e| TreeError::malformed(format!("invalid document: {e}")))?;
        self.build_from_document(document)
    }

    fn build_from_document(&mut self, document: RawDocument) -> TreeResult<ProfileTree> {
        let version = required_text(document.version.as_ref(), "Version")?;
        let publish_date = required_text(document.publish_date.as_ref(), "PublishDate")?;
        let data = document
            .data
            .ok_or_else(|| TreeError::malformed("missing Data"))?;
        if data.is_empty() {
            return Err(TreeError::malformed("Data holds no root node"));
        }

        let (mut nodes, child_lists) = decode_descriptors(&data)?;
        self.check_acyclic(&child_lists)?;

        for (node, children) in nodes.iter_mut().zip(child_lists) {
            for child in children {
                node.add_child(child);
            }
        }

        let tree = ProfileTree::new(version, publish_date, nodes);
        let reachable = tree.reachable();
        if reachable < tree.len() {
            debug!(unreachable = tree.len() - reachable, "descriptors not reachable from root");
        }
        debug!(version = tree.version(), nodes = tree.len(), "tree built");
        Ok(tree)
    }

    /// Depth-first walk from the root, then from any node the root does not
    /// reach, so that no node anywhere in the table is its own descendant.
    fn check_acyclic(&mut self, child_lists: &[Vec<NodeIndex>]) -> TreeResult<()> {
        self.marks.clear();
        self.marks.resize(child_lists.len(), Mark::Unvisited);

        for start in 0..child_lists.len() {
            if self.marks[start] != Mark::Unvisited {
                continue;
            }
            let mut stack: Vec<(NodeIndex, usize)> = vec![(start, 0)];
            self.marks[start] = Mark::OnPath;

            while let Some(top) = stack.last_mut() {
                let (current, next_child) = *top;
                match child_lists[current].get(next_child) {
                    Some(&child) => {
                        top.1 += 1;
                        match self.marks[child] {
                            Mark::OnPath => {
                                return Err(TreeError::malformed(format!(
                                    "cycle detected: node {child} is its own descendant (via node {current})"
                                )))
                            }
                            Mark::Done => {}
                            Mark::Unvisited => {
                                self.marks[child] = Mark::OnPath;
                                stack.push((child, 0));
                            }
                        }
                    }
                    None => {
                        self.marks[current] = Mark::Done;
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }
}

/// Classify and construct every descriptor; child indices are bounds-checked
/// but not linked yet.
fn decode_descriptors(data: &[Value]) -> TreeResult<(Vec<Node>, Vec<Vec<NodeIndex>>)> {
    let mut nodes = Vec::with_capacity(data.len());
    let mut child_lists = Vec::with_capacity(data.len());

    for (index, source) in data.iter().enumerate() {
        let (node, children) = RawDescriptor::parse(source)?.into_node(index, source)?;
        if let Some(&bad) = children.iter().find(|&&child| child >= data.len()) {
            return Err(TreeError::malformed_descriptor(
                format!("node {index}: child index {bad} out of bounds (table has {} nodes)", data.len()),
                source.to_string(),
            ));
        }
        nodes.push(node);
        child_lists.push(children);
    }
    Ok((nodes, child_lists))
}

fn required_text(value: Option<&Value>, field: &str) -> TreeResult<String> {
    value
        .and_then(scalar_text)
        .ok_or_else(|| TreeError::malformed(format!("missing {field}")))
}

impl ProfileTree {
    /// Decode a tree from a byte stream with a fresh builder.
    pub fn from_reader<R: Read>(reader: R) -> TreeResult<Self> {
        TreeBuilder::new().build_from_reader(reader)
    }
}
