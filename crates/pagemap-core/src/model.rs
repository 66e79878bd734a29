use crate::error::{EditError, InvalidReason};
use crate::node::Node;
use crate::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanKind {
    #[default]
    Plain,
    Subdomain,
}

/// A top-level tree that is not connected to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orphan {
    pub node: Arc<Node>,
    #[serde(default)]
    pub kind: OrphanKind,
}

impl Orphan {
    pub fn new(node: Node, kind: OrphanKind) -> Self {
        Self {
            node: Arc::new(node),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Flow,
    Crosslink,
}

/// Directed relationship drawn independently of the tree shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

/// Which top-level tree a node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeSlot {
    Root,
    Orphan(usize),
}

/// Address of a node: its top-level tree plus the child indices leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation {
    pub slot: TreeSlot,
    pub path: Vec<usize>,
}

impl NodeLocation {
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn is_top_level(&self) -> bool {
        self.path.is_empty()
    }

    pub fn parent(&self) -> Option<NodeLocation> {
        let (_, rest) = self.path.split_last()?;
        Some(NodeLocation {
            slot: self.slot,
            path: rest.to_vec(),
        })
    }

    pub fn index_in_parent(&self) -> Option<usize> {
        self.path.last().copied()
    }

    /// True when `self` is `other` or lies beneath it.
    pub fn is_within(&self, other: &NodeLocation) -> bool {
        self.slot == other.slot && self.path.starts_with(&other.path)
    }
}

/// Serialized form of a [`TreeModel`]. Deserializing a model goes through this
/// type so id uniqueness is checked at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDocument {
    pub root: Node,
    #[serde(default)]
    pub orphans: Vec<Orphan>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// The aggregate root of a diagram.
///
/// A value of this type is never mutated once handed out: every edit in
/// [`crate::mutation`] returns a new model sharing untouched subtrees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeDocument", into = "TreeDocument")]
pub struct TreeModel {
    pub(crate) root: Arc<Node>,
    pub(crate) orphans: Vec<Orphan>,
    pub(crate) edges: Vec<EdgeRecord>,
}

impl TryFrom<TreeDocument> for TreeModel {
    type Error = EditError;

    fn try_from(doc: TreeDocument) -> Result<Self, Self::Error> {
        TreeModel::from_parts(doc.root, doc.orphans, doc.edges)
    }
}

impl From<TreeModel> for TreeDocument {
    fn from(model: TreeModel) -> Self {
        TreeDocument {
            root: Arc::unwrap_or_clone(model.root),
            orphans: model.orphans,
            edges: model.edges,
        }
    }
}

impl TreeModel {
    /// A blank diagram holding only a root page.
    pub fn blank(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            root: Arc::new(Node::new(id, title, url)),
            orphans: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Builds a model from producer output, rejecting duplicate ids.
    pub fn from_parts(
        root: Node,
        orphans: Vec<Orphan>,
        edges: Vec<EdgeRecord>,
    ) -> Result<Self, EditError> {
        let mut seen = HashSet::new();
        let tops = std::iter::once(&root).chain(orphans.iter().map(|o| o.node.as_ref()));
        for top in tops {
            for (node, _) in top.descendants() {
                if !seen.insert(&node.id) {
                    return Err(InvalidReason::DuplicateId(node.id.clone()).into());
                }
            }
        }
        let mut edge_ids = HashSet::new();
        for edge in &edges {
            if !edge_ids.insert(&edge.id) {
                return Err(InvalidReason::DuplicateEdge(edge.id.clone()).into());
            }
        }

        Ok(Self {
            root: Arc::new(root),
            orphans,
            edges,
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root.id
    }

    pub fn orphans(&self) -> &[Orphan] {
        &self.orphans
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    /// The root tree followed by every orphan tree, in order.
    pub fn tops(&self) -> impl Iterator<Item = (TreeSlot, &Node)> {
        std::iter::once((TreeSlot::Root, self.root.as_ref())).chain(
            self.orphans
                .iter()
                .enumerate()
                .map(|(i, o)| (TreeSlot::Orphan(i), o.node.as_ref())),
        )
    }

    pub fn top(&self, slot: TreeSlot) -> Option<&Node> {
        match slot {
            TreeSlot::Root => Some(self.root.as_ref()),
            TreeSlot::Orphan(i) => self.orphans.get(i).map(|o| o.node.as_ref()),
        }
    }

    pub fn locate(&self, id: &NodeId) -> Option<NodeLocation> {
        self.tops().find_map(|(slot, top)| {
            locate_in(top, id).map(|path| NodeLocation { slot, path })
        })
    }

    pub fn node_at(&self, location: &NodeLocation) -> Option<&Node> {
        let mut node = self.top(location.slot)?;
        for &i in &location.path {
            node = node.children.get(i)?.as_ref();
        }
        Some(node)
    }

    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        self.locate(id).and_then(|loc| self.node_at(&loc))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.locate(id).is_some()
    }

    /// Parent of `id`, or `None` for missing nodes, the root, and orphan heads.
    pub fn parent_of(&self, id: &NodeId) -> Option<&Node> {
        let parent = self.locate(id)?.parent()?;
        self.node_at(&parent)
    }

    /// Depth within the node's own top-level tree (heads are depth 0).
    pub fn depth_of(&self, id: &NodeId) -> Option<usize> {
        self.locate(id).map(|loc| loc.depth())
    }

    pub fn subtree_ids(&self, id: &NodeId) -> Option<Vec<NodeId>> {
        self.find(id).map(Node::subtree_ids)
    }

    /// True when `candidate` lies strictly beneath `ancestor`.
    pub fn is_descendant(&self, ancestor: &NodeId, candidate: &NodeId) -> bool {
        match (self.locate(ancestor), self.locate(candidate)) {
            (Some(a), Some(c)) => a != c && c.is_within(&a),
            _ => false,
        }
    }

    pub fn all_ids(&self) -> BTreeSet<NodeId> {
        self.tops()
            .flat_map(|(_, top)| top.descendants())
            .map(|(node, _)| node.id.clone())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.tops().map(|(_, top)| top.subtree_len()).sum()
    }

    pub fn orphan_index(&self, id: &NodeId) -> Option<usize> {
        self.orphans.iter().position(|o| &o.node.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&EdgeRecord> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// Edges whose endpoints both still exist.
    pub fn renderable_edges(&self) -> Vec<&EdgeRecord> {
        let ids = self.all_ids();
        self.edges
            .iter()
            .filter(|e| ids.contains(&e.from) && ids.contains(&e.to))
            .collect()
    }

    // ========================================================================
    // Copy-on-write access used by the mutation layer
    // ========================================================================

    pub(crate) fn top_mut(&mut self, slot: TreeSlot) -> Option<&mut Arc<Node>> {
        match slot {
            TreeSlot::Root => Some(&mut self.root),
            TreeSlot::Orphan(i) => self.orphans.get_mut(i).map(|o| &mut o.node),
        }
    }

    /// Unshares every node on the path to `location` and returns the target.
    pub(crate) fn node_mut(&mut self, location: &NodeLocation) -> Option<&mut Node> {
        let mut node = Arc::make_mut(self.top_mut(location.slot)?);
        for &i in &location.path {
            node = Arc::make_mut(node.children.get_mut(i)?);
        }
        Some(node)
    }
}

/// Child-index path from `top` to `id`, found without recursion.
fn locate_in(top: &Node, id: &NodeId) -> Option<Vec<usize>> {
    if &top.id == id {
        return Some(Vec::new());
    }

    let mut path = Vec::new();
    let mut stack: Vec<(&Node, usize)> = vec![(top, 0)];
    while let Some(frame) = stack.last_mut() {
        let node = frame.0;
        let next = frame.1;
        if let Some(child) = node.children.get(next) {
            frame.1 += 1;
            path.push(next);
            if &child.id == id {
                return Some(path);
            }
            stack.push((child.as_ref(), 0));
        } else {
            stack.pop();
            path.pop();
        }
    }
    None
}
