//! Validated structural edits over a [`TreeModel`].
//!
//! Every operation borrows the current model and either returns a new one or
//! reports why it refused. The input model is never touched, so values held by
//! the undo history stay valid.

use crate::error::{EditError, InvalidReason};
use crate::ids::IdGenerator;
use crate::model::{EdgeRecord, NodeLocation, Orphan, OrphanKind, TreeModel, TreeSlot};
use crate::node::{Node, NodePatch};
use crate::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Result of an accepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The model changed; here is the new version.
    Applied(TreeModel),
    /// The request was well-formed but would not change anything.
    NoOp,
}

impl EditOutcome {
    pub fn into_model(self) -> Option<TreeModel> {
        match self {
            EditOutcome::Applied(model) => Some(model),
            EditOutcome::NoOp => None,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, EditOutcome::NoOp)
    }
}

/// Classification of a prospective move, shared by the mutation layer and the
/// drag controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
    NoOp,
    Move {
        from: NodeLocation,
        new_parent: NodeId,
        /// Insertion index, already compensated for same-list removal.
        index: usize,
    },
}

/// A named edit, as carried by scripts and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    AddChild {
        parent: NodeId,
        node: Node,
    },
    Delete {
        id: NodeId,
    },
    Edit {
        id: NodeId,
        patch: NodePatch,
    },
    Duplicate {
        id: NodeId,
    },
    Move {
        id: NodeId,
        parent: NodeId,
        index: usize,
    },
    AddOrphan {
        node: Node,
        #[serde(default)]
        kind: OrphanKind,
    },
    SetOrphanKind {
        id: NodeId,
        kind: OrphanKind,
    },
    DetachToOrphan {
        id: NodeId,
    },
    AddEdge {
        edge: EdgeRecord,
    },
    RemoveEdge {
        id: EdgeId,
    },
}

impl Mutation {
    pub fn apply(
        &self,
        model: &TreeModel,
        ids: &mut dyn IdGenerator,
    ) -> Result<EditOutcome, EditError> {
        match self {
            Mutation::AddChild { parent, node } => model.add_child(parent, node.clone()),
            Mutation::Delete { id } => model.delete(id),
            Mutation::Edit { id, patch } => model.edit(id, patch),
            Mutation::Duplicate { id } => model.duplicate(id, ids),
            Mutation::Move { id, parent, index } => model.move_node(id, parent, *index),
            Mutation::AddOrphan { node, kind } => model.add_orphan(node.clone(), *kind),
            Mutation::SetOrphanKind { id, kind } => model.set_orphan_kind(id, *kind),
            Mutation::DetachToOrphan { id } => model.detach_to_orphan(id),
            Mutation::AddEdge { edge } => model.add_edge(edge.clone()),
            Mutation::RemoveEdge { id } => model.remove_edge(id),
        }
    }

    /// Short description shown for undo/redo.
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::AddChild { .. } => "Add page",
            Mutation::Delete { .. } => "Delete page",
            Mutation::Edit { .. } => "Edit page",
            Mutation::Duplicate { .. } => "Duplicate page",
            Mutation::Move { .. } => "Move page",
            Mutation::AddOrphan { .. } => "Add orphan",
            Mutation::SetOrphanKind { .. } => "Change orphan kind",
            Mutation::DetachToOrphan { .. } => "Detach page",
            Mutation::AddEdge { .. } => "Add link",
            Mutation::RemoveEdge { .. } => "Remove link",
        }
    }
}

impl TreeModel {
    /// Appends `node` (with its subtree) to the children of `parent`.
    pub fn add_child(&self, parent: &NodeId, node: Node) -> Result<EditOutcome, EditError> {
        let location = self
            .locate(parent)
            .ok_or_else(|| EditError::NotFound(parent.clone()))?;
        self.ensure_fresh(&node)?;

        let mut next = self.clone();
        next.node_mut(&location)
            .ok_or_else(|| EditError::NotFound(parent.clone()))?
            .children
            .push(Arc::new(node));
        Ok(EditOutcome::Applied(next))
    }

    /// Removes `id` and its whole subtree, wherever it lives.
    pub fn delete(&self, id: &NodeId) -> Result<EditOutcome, EditError> {
        if id == self.root_id() {
            return Err(InvalidReason::RootImmutable.into());
        }
        let location = self
            .locate(id)
            .ok_or_else(|| EditError::NotFound(id.clone()))?;

        let mut next = self.clone();
        next.detach(&location, id)?;
        Ok(EditOutcome::Applied(next))
    }

    pub fn edit(&self, id: &NodeId, patch: &NodePatch) -> Result<EditOutcome, EditError> {
        let location = self
            .locate(id)
            .ok_or_else(|| EditError::NotFound(id.clone()))?;
        if self.node_at(&location).is_some_and(|node| patch.is_noop_for(node)) {
            return Ok(EditOutcome::NoOp);
        }

        let mut next = self.clone();
        let node = next
            .node_mut(&location)
            .ok_or_else(|| EditError::NotFound(id.clone()))?;
        patch.apply(node);
        Ok(EditOutcome::Applied(next))
    }

    /// Copies the subtree at `id` with fresh ids and inserts the copy right
    /// after the original. Heads without a parent are copied into a new orphan.
    pub fn duplicate(
        &self,
        id: &NodeId,
        ids: &mut dyn IdGenerator,
    ) -> Result<EditOutcome, EditError> {
        let location = self
            .locate(id)
            .ok_or_else(|| EditError::NotFound(id.clone()))?;
        let original = self
            .node_at(&location)
            .ok_or_else(|| EditError::NotFound(id.clone()))?;

        let mut taken = self.all_ids();
        let copy = copy_with_fresh_ids(original, ids, &mut taken);

        let mut next = self.clone();
        match location.parent() {
            Some(parent) => {
                let index = location.index_in_parent().unwrap_or(0) + 1;
                next.node_mut(&parent)
                    .ok_or_else(|| EditError::NotFound(id.clone()))?
                    .children
                    .insert(index, Arc::new(copy));
            }
            None => {
                let (index, kind) = match location.slot {
                    TreeSlot::Root => (0, OrphanKind::Plain),
                    TreeSlot::Orphan(i) => (i + 1, self.orphans[i].kind),
                };
                next.orphans.insert(index, Orphan::new(copy, kind));
            }
        }
        Ok(EditOutcome::Applied(next))
    }

    /// Decides what moving `id` under `new_parent` at `index` would do, without
    /// doing it. This is the single definition of a no-op move.
    pub fn plan_move(
        &self,
        id: &NodeId,
        new_parent: &NodeId,
        index: usize,
    ) -> Result<MovePlan, EditError> {
        if id == self.root_id() {
            return Err(InvalidReason::RootImmutable.into());
        }
        if id == new_parent {
            return Err(InvalidReason::SelfParent.into());
        }
        let from = self
            .locate(id)
            .ok_or_else(|| EditError::NotFound(id.clone()))?;
        let to = self
            .locate(new_parent)
            .ok_or_else(|| EditError::NotFound(new_parent.clone()))?;
        if to.is_within(&from) {
            return Err(InvalidReason::Cycle.into());
        }

        let target_len = self.node_at(&to).map_or(0, |n| n.children.len());
        let mut index = index.min(target_len);

        let same_list = from.parent().as_ref() == Some(&to);
        if same_list && let Some(current) = from.index_in_parent() {
            if current < index {
                index -= 1;
            }
            if current == index {
                return Ok(MovePlan::NoOp);
            }
        }

        Ok(MovePlan::Move {
            from,
            new_parent: new_parent.clone(),
            index,
        })
    }

    /// Reparents `id` under `new_parent` at `index`.
    pub fn move_node(
        &self,
        id: &NodeId,
        new_parent: &NodeId,
        index: usize,
    ) -> Result<EditOutcome, EditError> {
        let (from, index) = match self.plan_move(id, new_parent, index)? {
            MovePlan::NoOp => return Ok(EditOutcome::NoOp),
            MovePlan::Move { from, index, .. } => (from, index),
        };

        let mut next = self.clone();
        let subtree = next.detach(&from, id)?;
        // Removal may have shifted sibling indices on the way to the target.
        let to = next
            .locate(new_parent)
            .ok_or_else(|| EditError::NotFound(new_parent.clone()))?;
        let parent = next
            .node_mut(&to)
            .ok_or_else(|| EditError::NotFound(new_parent.clone()))?;
        let index = index.min(parent.children.len());
        parent.children.insert(index, subtree);
        Ok(EditOutcome::Applied(next))
    }

    pub fn add_orphan(&self, node: Node, kind: OrphanKind) -> Result<EditOutcome, EditError> {
        self.ensure_fresh(&node)?;
        let mut next = self.clone();
        next.orphans.push(Orphan::new(node, kind));
        Ok(EditOutcome::Applied(next))
    }

    pub fn set_orphan_kind(&self, id: &NodeId, kind: OrphanKind) -> Result<EditOutcome, EditError> {
        let Some(index) = self.orphan_index(id) else {
            if self.contains(id) {
                return Err(InvalidReason::NotAnOrphan(id.clone()).into());
            }
            return Err(EditError::NotFound(id.clone()));
        };
        if self.orphans[index].kind == kind {
            return Ok(EditOutcome::NoOp);
        }
        let mut next = self.clone();
        next.orphans[index].kind = kind;
        Ok(EditOutcome::Applied(next))
    }

    /// Cuts the subtree at `id` loose and appends it as a plain orphan.
    pub fn detach_to_orphan(&self, id: &NodeId) -> Result<EditOutcome, EditError> {
        if id == self.root_id() {
            return Err(InvalidReason::RootImmutable.into());
        }
        let location = self
            .locate(id)
            .ok_or_else(|| EditError::NotFound(id.clone()))?;
        if location.is_top_level() {
            return Ok(EditOutcome::NoOp);
        }

        let mut next = self.clone();
        let subtree = next.detach(&location, id)?;
        next.orphans.push(Orphan {
            node: subtree,
            kind: OrphanKind::Plain,
        });
        Ok(EditOutcome::Applied(next))
    }

    pub fn add_edge(&self, edge: EdgeRecord) -> Result<EditOutcome, EditError> {
        for endpoint in [&edge.from, &edge.to] {
            if !self.contains(endpoint) {
                return Err(EditError::NotFound(endpoint.clone()));
            }
        }
        if self.edge(&edge.id).is_some() {
            return Err(InvalidReason::DuplicateEdge(edge.id).into());
        }
        let mut next = self.clone();
        next.edges.push(edge);
        Ok(EditOutcome::Applied(next))
    }

    pub fn remove_edge(&self, id: &EdgeId) -> Result<EditOutcome, EditError> {
        let index = self
            .edges
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| EditError::EdgeNotFound(id.clone()))?;
        let mut next = self.clone();
        next.edges.remove(index);
        Ok(EditOutcome::Applied(next))
    }

    fn ensure_fresh(&self, node: &Node) -> Result<(), EditError> {
        let existing = self.all_ids();
        let mut incoming = BTreeSet::new();
        for (n, _) in node.descendants() {
            if existing.contains(&n.id) || !incoming.insert(&n.id) {
                return Err(InvalidReason::DuplicateId(n.id.clone()).into());
            }
        }
        Ok(())
    }

    /// Unlinks the subtree at `location` (the node `id`) and hands it back.
    fn detach(&mut self, location: &NodeLocation, id: &NodeId) -> Result<Arc<Node>, EditError> {
        match (location.parent(), location.index_in_parent()) {
            (Some(parent), Some(index)) => {
                let parent = self
                    .node_mut(&parent)
                    .ok_or_else(|| EditError::NotFound(id.clone()))?;
                if index < parent.children.len() {
                    Ok(parent.children.remove(index))
                } else {
                    Err(EditError::NotFound(id.clone()))
                }
            }
            _ => match location.slot {
                TreeSlot::Orphan(i) if i < self.orphans.len() => Ok(self.orphans.remove(i).node),
                _ => Err(InvalidReason::RootImmutable.into()),
            },
        }
    }
}

/// Deep copy of `original` where every node receives an id not in `taken`.
fn copy_with_fresh_ids(
    original: &Node,
    ids: &mut dyn IdGenerator,
    taken: &mut BTreeSet<NodeId>,
) -> Node {
    let mut copy = original.clone();
    let mut stack: Vec<&mut Node> = vec![&mut copy];
    while let Some(node) = stack.pop() {
        node.id = fresh_id(ids, taken);
        for child in node.children.iter_mut().rev() {
            stack.push(Arc::make_mut(child));
        }
    }
    copy
}

fn fresh_id(ids: &mut dyn IdGenerator, taken: &mut BTreeSet<NodeId>) -> NodeId {
    loop {
        let candidate = ids.next_id();
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        tracing::debug!("Skipping generated id {} already in use", candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn child_ids(node: &Node) -> Vec<&str> {
        node.children.iter().map(|c| c.id.as_str()).collect()
    }

    fn applied(result: Result<EditOutcome, EditError>) -> TreeModel {
        match result {
            Ok(EditOutcome::Applied(model)) => model,
            other => panic!("expected an applied edit, got {other:?}"),
        }
    }

    fn sample() -> TreeModel {
        let root = Node::new("r", "Home", "/")
            .with_child(
                Node::new("a", "A", "/a")
                    .with_child(Node::new("a1", "A1", "/a/1"))
                    .with_child(Node::new("a2", "A2", "/a/2")),
            )
            .with_child(Node::new("b", "B", "/b"))
            .with_child(Node::new("c", "C", "/c"));
        let orphans = vec![Orphan::new(
            Node::new("o", "Lost", "/lost").with_child(Node::new("o1", "Lost 1", "/lost/1")),
            OrphanKind::Plain,
        )];
        TreeModel::from_parts(root, orphans, Vec::new()).unwrap()
    }

    #[test]
    fn test_add_then_reorder_touches_only_root_children() {
        let model = TreeModel::blank("r", "Home", "/");
        let model = applied(model.add_child(&"r".into(), Node::new("a", "A", "/a")));
        let model = applied(model.add_child(&"r".into(), Node::new("b", "B", "/b")));
        assert_eq!(child_ids(model.root()), vec!["a", "b"]);

        let moved = applied(model.move_node(&"a".into(), &"r".into(), 2));
        assert_eq!(child_ids(moved.root()), vec!["b", "a"]);
        assert_eq!(moved.root_id().as_str(), "r");
        assert_eq!(moved.root().title, "Home");

        // Moving "a" under "b" nests it and leaves the root alone.
        let nested = applied(model.move_node(&"a".into(), &"b".into(), 0));
        assert_eq!(child_ids(nested.root()), vec!["b"]);
        assert_eq!(child_ids(nested.find(&"b".into()).unwrap()), vec!["a"]);
    }

    #[test]
    fn test_add_child_missing_parent() {
        let err = sample()
            .add_child(&"nope".into(), Node::new("x", "X", "/x"))
            .unwrap_err();
        assert_eq!(err, EditError::NotFound("nope".into()));
    }

    #[test]
    fn test_add_child_rejects_existing_id() {
        let err = sample()
            .add_child(&"b".into(), Node::new("a1", "Again", "/again"))
            .unwrap_err();
        assert_eq!(err, InvalidReason::DuplicateId("a1".into()).into());
    }

    #[test]
    fn test_add_child_into_orphan() {
        let model = applied(sample().add_child(&"o1".into(), Node::new("o2", "O2", "/lost/1/2")));
        assert_eq!(model.depth_of(&"o2".into()), Some(2));
    }

    #[test]
    fn test_delete_root_refused() {
        let err = sample().delete(&"r".into()).unwrap_err();
        assert_eq!(err, InvalidReason::RootImmutable.into());
    }

    #[test]
    fn test_delete_removes_subtree_and_keeps_original() {
        let model = sample();
        let next = applied(model.delete(&"a".into()));
        assert!(!next.contains(&"a".into()));
        assert!(!next.contains(&"a1".into()));
        assert!(!next.contains(&"a2".into()));
        assert!(model.contains(&"a1".into()), "input model must stay intact");
    }

    #[test]
    fn test_delete_orphan_head_drops_orphan() {
        let next = applied(sample().delete(&"o".into()));
        assert!(next.orphans().is_empty());
        assert!(!next.contains(&"o1".into()));
    }

    #[test]
    fn test_edit_patch_and_noop() {
        let model = sample();
        let next = applied(model.edit(&"o1".into(), &NodePatch::title("Found")));
        assert_eq!(next.find(&"o1".into()).unwrap().title, "Found");
        assert_eq!(
            model.edit(&"b".into(), &NodePatch::url("/b")),
            Ok(EditOutcome::NoOp)
        );
        assert_eq!(
            model.edit(&"zz".into(), &NodePatch::title("x")),
            Err(EditError::NotFound("zz".into()))
        );
    }

    #[test]
    fn test_duplicate_inserts_sibling_after_original() {
        let mut ids = SequentialIds::new("dup-");
        let next = applied(sample().duplicate(&"a".into(), &mut ids));
        assert_eq!(child_ids(next.root()), vec!["a", "dup-1", "b", "c"]);
        let copy = next.find(&"dup-1".into()).unwrap();
        assert_eq!(child_ids(copy), vec!["dup-2", "dup-3"]);
        assert_eq!(copy.title, "A");
    }

    #[test]
    fn test_duplicate_skips_taken_ids() {
        struct Replay(Vec<&'static str>);
        impl IdGenerator for Replay {
            fn next_id(&mut self) -> NodeId {
                NodeId::from(self.0.remove(0))
            }
        }
        let mut ids = Replay(vec!["b", "a1", "fresh"]);
        let next = applied(sample().duplicate(&"c".into(), &mut ids));
        assert_eq!(child_ids(next.root()), vec!["a", "b", "c", "fresh"]);
    }

    #[test]
    fn test_duplicate_parentless_becomes_orphan() {
        let mut ids = SequentialIds::new("dup-");
        let next = applied(sample().duplicate(&"o".into(), &mut ids));
        assert_eq!(next.orphans().len(), 2);
        assert_eq!(next.orphans()[1].node.id.as_str(), "dup-1");

        let from_root = applied(sample().duplicate(&"r".into(), &mut ids));
        assert_eq!(from_root.orphans()[0].kind, OrphanKind::Plain);
        assert_eq!(from_root.node_count(), sample().node_count() * 2 - 2);
    }

    #[test]
    fn test_move_rejections() {
        let model = sample();
        assert_eq!(
            model.move_node(&"r".into(), &"b".into(), 0),
            Err(InvalidReason::RootImmutable.into())
        );
        assert_eq!(
            model.move_node(&"a".into(), &"a".into(), 0),
            Err(InvalidReason::SelfParent.into())
        );
        assert_eq!(
            model.move_node(&"a".into(), &"a2".into(), 0),
            Err(InvalidReason::Cycle.into())
        );
        assert_eq!(
            model.move_node(&"a".into(), &"missing".into(), 0),
            Err(EditError::NotFound("missing".into()))
        );
    }

    #[test]
    fn test_move_same_position_is_noop() {
        let model = sample();
        // Index 0 and index 1 both leave "a" first among root's children.
        assert_eq!(model.move_node(&"a".into(), &"r".into(), 0), Ok(EditOutcome::NoOp));
        assert_eq!(model.move_node(&"a".into(), &"r".into(), 1), Ok(EditOutcome::NoOp));
        assert_eq!(model.move_node(&"c".into(), &"r".into(), 99), Ok(EditOutcome::NoOp));
    }

    #[test]
    fn test_same_parent_forward_move_compensates_index() {
        let next = applied(sample().move_node(&"a".into(), &"r".into(), 2));
        assert_eq!(child_ids(next.root()), vec!["b", "a", "c"]);

        let back = applied(sample().move_node(&"c".into(), &"r".into(), 0));
        assert_eq!(child_ids(back.root()), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_move_across_trees() {
        let model = sample();
        let next = applied(model.move_node(&"a2".into(), &"o".into(), 0));
        assert_eq!(child_ids(next.find(&"o".into()).unwrap()), vec!["a2", "o1"]);
        assert_eq!(child_ids(next.find(&"a".into()).unwrap()), vec!["a1"]);

        // An orphan head moved under the root stops being an orphan.
        let adopted = applied(model.move_node(&"o".into(), &"b".into(), 0));
        assert!(adopted.orphans().is_empty());
        assert_eq!(adopted.parent_of(&"o".into()).unwrap().id.as_str(), "b");
    }

    #[test]
    fn test_move_into_later_sibling_subtree() {
        // Removing "a" shifts "c" from index 2 to 1; the target must still resolve.
        let next = applied(sample().move_node(&"a".into(), &"c".into(), 0));
        assert_eq!(child_ids(next.root()), vec!["b", "c"]);
        assert_eq!(child_ids(next.find(&"c".into()).unwrap()), vec!["a"]);
    }

    #[test]
    fn test_detach_and_orphan_kind() {
        let model = applied(sample().detach_to_orphan(&"a".into()));
        assert_eq!(model.orphans().len(), 2);
        assert_eq!(model.orphans()[1].node.id.as_str(), "a");
        assert_eq!(model.detach_to_orphan(&"a".into()), Ok(EditOutcome::NoOp));

        let model = applied(model.set_orphan_kind(&"a".into(), OrphanKind::Subdomain));
        assert_eq!(model.orphans()[1].kind, OrphanKind::Subdomain);
        assert_eq!(
            model.set_orphan_kind(&"b".into(), OrphanKind::Subdomain),
            Err(InvalidReason::NotAnOrphan("b".into()).into())
        );
    }

    #[test]
    fn test_edges_survive_endpoint_deletion() {
        let edge = EdgeRecord {
            id: "e1".into(),
            from: "b".into(),
            to: "o1".into(),
            kind: crate::EdgeKind::Crosslink,
        };
        let model = applied(sample().add_edge(edge.clone()));
        assert_eq!(
            model.add_edge(edge.clone()),
            Err(InvalidReason::DuplicateEdge("e1".into()).into())
        );

        let model = applied(model.delete(&"o".into()));
        assert_eq!(model.edges().len(), 1);
        assert!(model.renderable_edges().is_empty());

        let model = applied(model.remove_edge(&"e1".into()));
        assert!(model.edges().is_empty());
        assert_eq!(
            model.remove_edge(&"e1".into()),
            Err(EditError::EdgeNotFound("e1".into()))
        );
    }

    #[test]
    fn test_mutation_script_round_trip() {
        let script = r#"[
            {"op": "add_child", "parent": "r", "node": {"id": "n", "title": "New"}},
            {"op": "move", "id": "n", "parent": "b", "index": 0},
            {"op": "edit", "id": "n", "patch": {"url": "/b/new"}}
        ]"#;
        let ops: Vec<Mutation> = serde_json::from_str(script).unwrap();
        let mut ids = SequentialIds::new("x");
        let mut model = sample();
        for op in &ops {
            model = op.apply(&model, &mut ids).unwrap().into_model().unwrap();
        }
        assert_eq!(model.find(&"n".into()).unwrap().url, "/b/new");
        assert_eq!(model.parent_of(&"n".into()).unwrap().id.as_str(), "b");
        assert_eq!(ops[1].label(), "Move page");
    }
}
