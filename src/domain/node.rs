//! Decision nodes: the atomic matching unit of a profile tree.

use std::fmt;

use crate::domain::evidence::EvidenceValue;

/// Stable position of a node in the tree's node table.
pub type NodeIndex = usize;

/// Identifier of a pre-classified profile.
pub type ProfileId = u32;

/// Literal comparison options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

/// Matching criterion of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Traversal entry point; never evaluated against evidence.
    Root,
    /// Exact literal equality.
    Value(String),
    /// Inclusive numeric interval `[min, max]`.
    Range { min: f64, max: f64 },
}

/// One decision point in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Position in the node table
    pub(crate) index: NodeIndex,
    pub(crate) kind: NodeKind,
    /// Evidence item inspected by this node's criterion
    pub(crate) evidence_key: Option<String>,
    /// Conclusive outcome, absent on intermediate nodes
    pub(crate) profile_id: Option<ProfileId>,
    /// Child positions in declared order
    pub(crate) children: Vec<NodeIndex>,
}

impl Node {
    pub(crate) fn new(
        index: NodeIndex,
        kind: NodeKind,
        evidence_key: Option<String>,
        profile_id: Option<ProfileId>,
    ) -> Self {
        Self {
            index,
            kind,
            evidence_key,
            profile_id,
            children: Vec::new(),
        }
    }

    /// Used by the builder only; trees are immutable once published.
    pub(crate) fn add_child(&mut self, child: NodeIndex) {
        self.children.push(child);
    }

    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    pub fn evidence_key(&self) -> Option<&str> {
        self.evidence_key.as_deref()
    }

    pub fn profile_id(&self) -> Option<ProfileId> {
        self.profile_id
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Literal equality for Value nodes. Root matches anything, Range never
    /// matches a bare string here.
    pub fn matches_text(&self, value: &str, case: CaseSensitivity) -> bool {
        match &self.kind {
            NodeKind::Root => true,
            NodeKind::Value(literal) => match case {
                CaseSensitivity::Sensitive => literal == value,
                CaseSensitivity::Insensitive => literal.to_lowercase() == value.to_lowercase(),
            },
            NodeKind::Range { .. } => false,
        }
    }

    /// Inclusive containment for Range nodes. NaN never matches.
    pub fn matches_number(&self, value: f64) -> bool {
        match &self.kind {
            NodeKind::Root => true,
            NodeKind::Range { min, max } => *min <= value && value <= *max,
            NodeKind::Value(_) => false,
        }
    }

    /// Evaluate this node's criterion against one evidence value.
    pub fn matches(&self, value: &EvidenceValue, case: CaseSensitivity) -> bool {
        match &self.kind {
            NodeKind::Root => true,
            NodeKind::Value(_) => self.matches_text(&value.as_text(), case),
            NodeKind::Range { .. } => value
                .as_number()
                .is_some_and(|n| self.matches_number(n)),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)?;
        let key = self.evidence_key.as_deref().unwrap_or("?");
        match &self.kind {
            NodeKind::Root => write!(f, " root")?,
            NodeKind::Value(literal) => write!(f, " {key} == {literal:?}")?,
            NodeKind::Range { min, max } => write!(f, " {key} in [{min}, {max}]")?,
        }
        if let Some(id) = self.profile_id {
            write!(f, " => {id}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn range(min: f64, max: f64) -> Node {
        Node::new(1, NodeKind::Range { min, max }, Some("screenwidth".into()), None)
    }

    fn value(literal: &str) -> Node {
        Node::new(1, NodeKind::Value(literal.into()), Some("hash3d".into()), None)
    }

    #[rstest]
    #[case(10.1, true)]
    #[case(20.2, true)]
    #[case(15.0, true)]
    #[case(10.09, false)]
    #[case(20.21, false)]
    #[case(f64::NAN, false)]
    fn given_range_node_when_matching_then_bounds_are_inclusive(
        #[case] input: f64,
        #[case] expected: bool,
    ) {
        assert_eq!(range(10.1, 20.2).matches_number(input), expected);
    }

    #[test]
    fn given_textual_number_when_matching_range_then_parses_it() {
        let node = range(300.0, 400.0);
        assert!(node.matches(&EvidenceValue::from("350"), CaseSensitivity::Sensitive));
        assert!(!node.matches(&EvidenceValue::from("wide"), CaseSensitivity::Sensitive));
    }

    #[test]
    fn given_value_node_when_matching_then_compares_exactly() {
        let node = value("abc123");
        assert!(node.matches(&EvidenceValue::from("abc123"), CaseSensitivity::Sensitive));
        assert!(!node.matches(&EvidenceValue::from("ABC123"), CaseSensitivity::Sensitive));
        assert!(node.matches(&EvidenceValue::from("ABC123"), CaseSensitivity::Insensitive));
    }

    #[test]
    fn given_numeric_evidence_when_matching_value_then_uses_text_form() {
        let node = value("5");
        assert!(node.matches(&EvidenceValue::Number(5.0), CaseSensitivity::Sensitive));
        assert!(!node.matches(&EvidenceValue::Number(5.5), CaseSensitivity::Sensitive));
    }

    #[test]
    fn given_root_when_matching_then_always_true() {
        let root = Node::new(0, NodeKind::Root, None, None);
        assert!(root.matches(&EvidenceValue::from("anything"), CaseSensitivity::Sensitive));
        assert!(root.is_root());
    }

    #[test]
    fn given_node_when_displayed_then_shows_criterion_and_profile() {
        let mut node = Node::new(3, NodeKind::Range { min: 300.0, max: 400.0 }, Some("screenwidth".into()), Some(42));
        node.add_child(4);
        assert_eq!(node.to_string(), "#3 screenwidth in [300, 400] => 42");
        assert_eq!(node.children(), &[4]);
    }
}
