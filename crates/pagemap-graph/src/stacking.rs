use pagemap_core::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Thresholds deciding when a run of siblings collapses into a stack.
///
/// The defaults are empirically tuned; callers may override every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackingRules {
    /// Minimum number of children before stacking is considered.
    pub min_children: usize,
    /// Share of children whose URLs start with the same top-level section.
    pub url_prefix_ratio: f32,
    /// Share of children whose slug or title follows the same pattern.
    pub pattern_ratio: f32,
}

impl Default for StackingRules {
    fn default() -> Self {
        Self {
            min_children: 5,
            url_prefix_ratio: 0.8,
            pattern_ratio: 0.7,
        }
    }
}

impl StackingRules {
    /// True when `children` look repetitive enough to collapse.
    ///
    /// Depth is the caller's concern: heads never stack their row.
    pub fn should_stack(&self, children: &[Arc<Node>]) -> bool {
        if children.len() < self.min_children.max(1) {
            return false;
        }

        let total = children.len() as f32;
        let url_share = dominant_count(children.iter().map(|c| url_prefix(&c.url))) as f32 / total;
        if url_share >= self.url_prefix_ratio {
            return true;
        }

        let slug_share = dominant_count(children.iter().map(|c| slug_pattern(&c.url))) as f32 / total;
        if slug_share >= self.pattern_ratio {
            return true;
        }

        let title_share =
            dominant_count(children.iter().map(|c| text_pattern(&c.title))) as f32 / total;
        title_share >= self.pattern_ratio
    }
}

/// Size of the largest group of equal keys. `None` keys never group.
fn dominant_count<I>(keys: I) -> usize
where
    I: Iterator<Item = Option<String>>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for key in keys.flatten() {
        *counts.entry(key).or_default() += 1;
    }
    counts.into_values().max().unwrap_or(0)
}

/// Path component of a URL without scheme, host, query or fragment.
fn url_path(url: &str) -> &str {
    let url = url.split(['?', '#']).next().unwrap_or("");
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            rest.find('/').map_or("", |slash| &rest[slash..])
        }
        None => url,
    }
}

/// Leading section of a nested path: `/blog/2020/alpha` -> `/blog`.
/// Pages directly under the site root have no section to share.
fn url_prefix(url: &str) -> Option<String> {
    let mut segments = url_path(url).split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    segments.next()?;
    Some(format!("/{}", first.to_ascii_lowercase()))
}

fn slug_pattern(url: &str) -> Option<String> {
    let path = url_path(url).trim_end_matches('/');
    let slug = path.rsplit('/').next().unwrap_or("");
    text_pattern(slug)
}

/// Lowercases and folds every digit run into `#`, so `Post 12` and `post 3`
/// share a pattern.
fn text_pattern(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut pattern = String::with_capacity(text.len());
    let mut in_digits = false;
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            if !in_digits {
                pattern.push('#');
            }
            in_digits = true;
        } else {
            pattern.extend(ch.to_lowercase());
            in_digits = false;
        }
    }
    Some(pattern)
}

/// Parents whose stacked children the user asked to see in full.
///
/// Passed explicitly into layout so the engine itself keeps no state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackExpansion {
    expanded: BTreeSet<NodeId>,
}

impl StackExpansion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, parent: &NodeId) -> bool {
        self.expanded.contains(parent)
    }

    pub fn expand(&mut self, parent: NodeId) -> bool {
        self.expanded.insert(parent)
    }

    pub fn collapse(&mut self, parent: &NodeId) -> bool {
        self.expanded.remove(parent)
    }

    /// Flips the state and returns whether the stack is now expanded.
    pub fn toggle(&mut self, parent: &NodeId) -> bool {
        if self.expanded.remove(parent) {
            false
        } else {
            self.expanded.insert(parent.clone());
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.expanded.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// Drops entries for parents that no longer exist.
    pub fn retain_existing(&mut self, ids: &BTreeSet<NodeId>) {
        self.expanded.retain(|id| ids.contains(id));
    }
}

impl FromIterator<NodeId> for StackExpansion {
    fn from_iter<T: IntoIterator<Item = NodeId>>(iter: T) -> Self {
        Self {
            expanded: iter.into_iter().collect(),
        }
    }
}
