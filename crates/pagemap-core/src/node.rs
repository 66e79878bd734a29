use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Metadata carried alongside a page. The engine never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Producer-specific extras, passed through untouched.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

/// One diagram entry.
///
/// Children sit behind `Arc` so a model can be cloned in constant time and
/// edits only copy the path they touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "is_default_meta")]
    pub meta: NodeMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Node>>,
}

fn is_default_meta(meta: &NodeMeta) -> bool {
    *meta == NodeMeta::default()
}

impl Node {
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: NodeId(id.into()),
            title: title.into(),
            url: url.into(),
            meta: NodeMeta::default(),
            children: Vec::new(),
        }
    }

    /// Builder-style helper used by producers and tests.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_meta(mut self, meta: NodeMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order walk over this node and everything beneath it.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![(self, 0)],
        }
    }

    pub fn subtree_len(&self) -> usize {
        self.descendants().count()
    }

    pub fn subtree_ids(&self) -> Vec<NodeId> {
        self.descendants().map(|(node, _)| node.id.clone()).collect()
    }
}

/// Tears subtrees down with an explicit stack so deep chains cannot overflow
/// the call stack. Shared children are left to their other owners.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(child) {
                pending.append(&mut node.children);
            }
        }
    }
}

/// Iterative pre-order traversal yielding `(node, depth relative to start)`.
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (&'a Node, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push((child.as_ref(), depth + 1));
        }
        Some((node, depth))
    }
}

/// Shallow field patch applied by the edit operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub meta: Option<NodeMeta>,
}

impl NodePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// True when applying the patch to `node` would leave it unchanged.
    pub fn is_noop_for(&self, node: &Node) -> bool {
        self.title.as_ref().is_none_or(|t| *t == node.title)
            && self.url.as_ref().is_none_or(|u| *u == node.url)
            && self.meta.as_ref().is_none_or(|m| *m == node.meta)
    }

    pub fn apply(&self, node: &mut Node) {
        if let Some(title) = &self.title {
            node.title = title.clone();
        }
        if let Some(url) = &self.url {
            node.url = url.clone();
        }
        if let Some(meta) = &self.meta {
            node.meta = meta.clone();
        }
    }
}
