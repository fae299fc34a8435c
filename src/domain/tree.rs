//! Profile tree: flat node table plus publish metadata.

use chrono::{DateTime, NaiveDate};
use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::domain::node::{Node, NodeIndex, ProfileId};

/// Immutable decision tree built from one data source.
///
/// Nodes live in a contiguous table; children are referenced by table
/// position. Index 0 is always the root. A tree is never mutated after the
/// builder hands it out; refreshing data means building a new tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTree {
    version: String,
    publish_date: String,
    nodes: Vec<Node>,
}

impl ProfileTree {
    /// Builder guarantees a non-empty table with a root at index 0.
    pub(crate) fn new(version: String, publish_date: String, nodes: Vec<Node>) -> Self {
        debug_assert!(nodes.first().is_some_and(Node::is_root));
        Self {
            version,
            publish_date,
            nodes,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn publish_date(&self) -> &str {
        &self.publish_date
    }

    /// Publish date as a calendar date, when it is in ISO-8601 form.
    pub fn published_on(&self) -> Option<NaiveDate> {
        let raw = self.publish_date.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
            .or_else(|| {
                raw.get(..10)
                    .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            })
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `node` in declared order.
    pub fn children<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        node.children().iter().filter_map(move |&idx| self.get(idx))
    }

    /// Pre-order walk from the root. Shared children are yielded once.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Number of distinct nodes reachable from the root.
    pub fn reachable(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels on the longest root-to-leaf path.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        // levels below each node, filled in post-order
        let mut levels: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut stack = vec![(0, false)];

        while let Some((idx, expanded)) = stack.pop() {
            let Some(node) = self.get(idx) else { continue };
            if levels[idx].is_some() {
                continue;
            }
            if expanded {
                let below = node
                    .children()
                    .iter()
                    .filter_map(|&child| levels.get(child).copied().flatten())
                    .max()
                    .unwrap_or(0);
                levels[idx] = Some(below + 1);
            } else {
                stack.push((idx, true));
                stack.extend(
                    node.children()
                        .iter()
                        .filter(|&&child| levels.get(child).is_some_and(Option::is_none))
                        .map(|&child| (child, false)),
                );
            }
        }
        levels.first().copied().flatten().unwrap_or(0)
    }

    /// Indices of reachable nodes without children.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<NodeIndex> {
        self.iter()
            .filter(|node| node.is_leaf())
            .map(Node::index)
            .collect()
    }

    /// Distinct profile ids reachable from the root, ascending.
    pub fn profile_ids(&self) -> Vec<ProfileId> {
        self.iter()
            .filter_map(Node::profile_id)
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Render the reachable tree for display.
    ///
    /// A shared child is expanded where it is first reached and referenced
    /// afterwards. Only the first [`MAX_RENDER_DEPTH`] levels are expanded.
    pub fn to_tree_string(&self) -> Tree<String> {
        struct Frame {
            index: NodeIndex,
            next: usize,
            leaves: Vec<Tree<String>>,
        }

        let mut shown = vec![false; self.nodes.len()];
        shown[0] = true;
        let mut stack = vec![Frame {
            index: 0,
            next: 0,
            leaves: Vec::new(),
        }];
        let mut rendered = None;

        loop {
            let level = stack.len();
            let Some(top) = stack.last_mut() else { break };
            let children = self.nodes[top.index].children();
            if level >= MAX_RENDER_DEPTH && top.next == 0 && !children.is_empty() {
                top.leaves.push(Tree::new(format!("... {} children not shown", children.len())));
                top.next = children.len();
                continue;
            }
            match children.get(top.next).copied() {
                Some(child) => {
                    top.next += 1;
                    if shown[child] {
                        top.leaves.push(Tree::new(format!("#{child} (shared, shown above)")));
                    } else {
                        shown[child] = true;
                        stack.push(Frame {
                            index: child,
                            next: 0,
                            leaves: Vec::new(),
                        });
                    }
                }
                None => {
                    let Some(done) = stack.pop() else { break };
                    let label = if done.index == 0 {
                        format!("{} (v{}, {})", self.root(), self.version, self.publish_date)
                    } else {
                        self.nodes[done.index].to_string()
                    };
                    let subtree = Tree::new(label).with_leaves(done.leaves);
                    match stack.last_mut() {
                        Some(parent) => parent.leaves.push(subtree),
                        None => rendered = Some(subtree),
                    }
                }
            }
        }
        rendered.unwrap_or_else(|| Tree::new(self.root().to_string()))
    }
}

/// Number of levels `to_tree_string` expands before summarising.
pub const MAX_RENDER_DEPTH: usize = 64;

/// Pre-order iterator over the reachable nodes, each visited once.
pub struct TreeIterator<'a> {
    tree: &'a ProfileTree,
    stack: Vec<NodeIndex>,
    visited: Vec<bool>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a ProfileTree) -> Self {
        Self {
            tree,
            stack: vec![0],
            visited: vec![false; tree.len()],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(idx) = self.stack.pop() {
            let Some(node) = self.tree.get(idx) else { continue };
            if std::mem::replace(&mut self.visited[idx], true) {
                continue;
            }
            // Push children in reverse order for left-to-right traversal
            self.stack.extend(
                node.children()
                    .iter()
                    .rev()
                    .filter(|&&child| !self.visited.get(child).copied().unwrap_or(true)),
            );
            return Some(node);
        }
        None
    }
}
