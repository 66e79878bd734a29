//! Tree layout: turns a [`TreeModel`] into absolute boxes and orthogonal
//! connector segments.
//!
//! Heads (the root, and orphans laid out root-style) place their children in a
//! single horizontal row joined by a bus line. Everything below the row hangs
//! as an indented vertical list with a spine and one tick per child.

use crate::geometry::{Rect, Vec2};
use crate::settings::{DisplayMode, LayoutOptions, LayoutSettings, OrphanMode, OrphanStyle};
use crate::stacking::StackExpansion;
use pagemap_core::{Node, NodeId, Orphan, OrphanKind, TreeModel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Collapsed-stack marker on the representative child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackBadge {
    /// Number of siblings hidden behind the representative.
    pub hidden: usize,
    /// Display text, e.g. `+5 more`.
    pub label: String,
}

impl StackBadge {
    fn new(hidden: usize) -> Self {
        Self {
            hidden,
            label: format!("+{hidden} more"),
        }
    }
}

/// Placed box for one rendered node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    /// Left edge in diagram coordinates
    pub x: f32,
    /// Top edge in diagram coordinates
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Depth below the head of the tree the box belongs to
    pub depth: usize,
    /// Hierarchical label such as `0`, `2`, `2.1` or `S1.3`
    pub display_number: String,
    /// Rendered parent, `None` for the root and orphan heads
    pub parent_id: Option<NodeId>,
    /// Index among the parent's children in the model.
    pub child_index: Option<usize>,
    /// True for members of a head's horizontal row.
    pub in_row: bool,
    /// Set on the representative of a collapsed stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackBadge>,
    /// First and last child of an expanded stack carry the collapse control.
    #[serde(default)]
    pub show_collapse_control: bool,
}

impl NodePosition {
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(Vec2::new(self.x, self.y), Vec2::new(self.width, self.height))
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    /// Vertical line down a parent's left margin
    Spine,
    /// Horizontal stub from the spine into one child
    Tick,
    /// Horizontal line joining a head's row
    Bus,
    /// Vertical line from the bus into a row member
    Drop,
    /// Vertical line from a head down to its bus
    RootDrop,
}

/// One orthogonal line segment from `(x1, y1)` to `(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub kind: ConnectorKind,
}

impl Connector {
    fn new(from: Vec2, to: Vec2, kind: ConnectorKind) -> Self {
        Self {
            x1: from.x,
            y1: from.y,
            x2: to.x,
            y2: to.y,
            kind,
        }
    }
}

/// One run of siblings that qualified for stacking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRecord {
    pub parent_id: NodeId,
    /// First child, the one drawn while collapsed.
    pub representative: NodeId,
    /// Number of children in the run.
    pub total: usize,
    pub expanded: bool,
}

/// Everything a renderer needs to draw one diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    /// Boxes for rendered nodes only; hidden stack members are absent.
    pub positions: BTreeMap<NodeId, NodePosition>,
    pub connectors: Vec<Connector>,
    /// Stacks in placement order.
    pub stacks: Vec<StackRecord>,
    /// Extent of every box, padded by the layout margin.
    pub bounds: Rect,
}

impl LayoutResult {
    pub fn position(&self, id: &NodeId) -> Option<&NodePosition> {
        self.positions.get(id)
    }

    pub fn is_rendered(&self, id: &NodeId) -> bool {
        self.positions.contains_key(id)
    }

    /// Rendered children of `parent`, in model order.
    pub fn rendered_children(&self, parent: &NodeId) -> Vec<(&NodeId, &NodePosition)> {
        let mut children: Vec<_> = self
            .positions
            .iter()
            .filter(|(_, pos)| pos.parent_id.as_ref() == Some(parent))
            .collect();
        children.sort_by_key(|(_, pos)| pos.child_index);
        children
    }

    pub fn connectors_of(&self, kind: ConnectorKind) -> impl Iterator<Item = &Connector> {
        self.connectors.iter().filter(move |c| c.kind == kind)
    }
}

/// Lays out whole diagrams with a fixed set of geometry settings.
#[derive(Debug, Clone, Default)]
pub struct TreeLayouter {
    pub settings: LayoutSettings,
    pub options: LayoutOptions,
}

impl TreeLayouter {
    /// Maximum depth walked below a head before a subtree is truncated
    pub const MAX_LAYOUT_DEPTH: usize = 128;

    pub fn new(settings: LayoutSettings, options: LayoutOptions) -> Self {
        Self { settings, options }
    }

    pub fn execute(
        &self,
        model: &TreeModel,
        mode: DisplayMode,
        expanded: &StackExpansion,
    ) -> LayoutResult {
        let mut pass = Pass::new(&self.settings, mode, expanded);

        let root = model.root();
        let root_span = pass.row_span(root, true);
        pass.place_head(root, Vec2::new(0.0, 0.0), "0".to_string(), true);

        if !model.orphans().is_empty() {
            let anchor = match self.options.orphan_mode {
                OrphanMode::AfterRoot if pass.orphans_stay_on_root_line(model, self.options) => {
                    0.0
                }
                OrphanMode::AfterRoot | OrphanMode::AfterTree => root_span.0,
            };
            pass.place_orphans(model, anchor, self.options);
        }

        pass.finish()
    }
}

/// Lays out `model` with default geometry.
pub fn compute_layout(
    model: &TreeModel,
    mode: DisplayMode,
    expanded: &StackExpansion,
    options: LayoutOptions,
) -> LayoutResult {
    TreeLayouter::new(LayoutSettings::default(), options).execute(model, mode, expanded)
}

// ============================================================================
// Layout pass
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Extent {
    footprint: f32,
    height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackState {
    Plain,
    Collapsed,
    Expanded,
}

/// Children that will actually be drawn under a node.
struct Visible<'a> {
    nodes: &'a [Arc<Node>],
    stack: StackState,
}

/// Everything a node box carries apart from its coordinates.
struct Placement {
    number: String,
    parent: Option<NodeId>,
    index: Option<usize>,
    in_row: bool,
    badge: Option<StackBadge>,
    collapse_control: bool,
    hide_children: bool,
}

impl Placement {
    fn head(number: String, hide_children: bool) -> Self {
        Self {
            number,
            parent: None,
            index: None,
            in_row: false,
            badge: None,
            collapse_control: false,
            hide_children,
        }
    }
}

struct Pass<'a> {
    settings: &'a LayoutSettings,
    expanded: &'a StackExpansion,
    width: f32,
    height: f32,
    extents: HashMap<&'a NodeId, Extent>,
    positions: BTreeMap<NodeId, NodePosition>,
    connectors: Vec<Connector>,
    stacks: Vec<StackRecord>,
}

impl<'a> Pass<'a> {
    fn new(settings: &'a LayoutSettings, mode: DisplayMode, expanded: &'a StackExpansion) -> Self {
        Self {
            settings,
            expanded,
            width: settings.node_width,
            height: settings.node_height(mode),
            extents: HashMap::new(),
            positions: BTreeMap::new(),
            connectors: Vec::new(),
            stacks: Vec::new(),
        }
    }

    fn visible(&self, node: &'a Node, depth: usize, hide: bool) -> Visible<'a> {
        if hide || node.children.is_empty() || depth >= TreeLayouter::MAX_LAYOUT_DEPTH {
            return Visible {
                nodes: &[],
                stack: StackState::Plain,
            };
        }
        if depth >= 1 && self.settings.stacking.should_stack(&node.children) {
            if self.expanded.contains(&node.id) {
                return Visible {
                    nodes: &node.children,
                    stack: StackState::Expanded,
                };
            }
            return Visible {
                nodes: &node.children[..1],
                stack: StackState::Collapsed,
            };
        }
        Visible {
            nodes: &node.children,
            stack: StackState::Plain,
        }
    }

    /// Footprint and height of a vertically listed subtree.
    fn measure(&mut self, node: &'a Node, depth: usize, hide: bool) -> Extent {
        if let Some(extent) = self.extents.get(&node.id) {
            return *extent;
        }
        if depth >= TreeLayouter::MAX_LAYOUT_DEPTH && !hide && !node.children.is_empty() {
            tracing::warn!(
                "Subtree of {} exceeds max layout depth {}, drawing it collapsed",
                node.id,
                TreeLayouter::MAX_LAYOUT_DEPTH
            );
        }

        let visible = self.visible(node, depth, hide);
        let hide_below = visible.stack == StackState::Collapsed;
        let mut widest_child = 0.0f32;
        let mut height = self.height;
        for child in visible.nodes {
            let extent = self.measure(child, depth + 1, hide_below);
            widest_child = widest_child.max(extent.footprint);
            height += self.settings.vertical_gap + extent.height;
        }

        let footprint = if visible.nodes.is_empty() {
            self.width
        } else {
            self.width.max(self.settings.indent + widest_child)
        };
        let extent = Extent { footprint, height };
        self.extents.insert(&node.id, extent);
        extent
    }

    /// Horizontal extent of a head and its row, relative to the head's left edge.
    fn row_span(&mut self, head: &'a Node, render_children: bool) -> (f32, f32) {
        let total = self.row_width(head, render_children);
        if total <= 0.0 {
            return (0.0, self.width);
        }
        let half = self.width / 2.0;
        ((half - total / 2.0).min(0.0), (half + total / 2.0).max(self.width))
    }

    fn row_width(&mut self, head: &'a Node, render_children: bool) -> f32 {
        let visible = self.visible(head, 0, !render_children);
        if visible.nodes.is_empty() {
            return 0.0;
        }
        let gaps = self.settings.sibling_gap * (visible.nodes.len() - 1) as f32;
        visible
            .nodes
            .iter()
            .map(|child| self.measure(child, 1, false).footprint)
            .sum::<f32>()
            + gaps
    }

    /// A head box at depth 0 with its children in one row beneath it.
    fn place_head(&mut self, head: &'a Node, at: Vec2, number: String, render_children: bool) {
        let row_number = number.clone();
        self.push(head, at, 0, Placement::head(number, !render_children));

        let visible = self.visible(head, 0, !render_children);
        if visible.nodes.is_empty() {
            return;
        }

        let total = self.row_width(head, render_children);
        let center_x = at.x + self.width / 2.0;
        let bottom = at.y + self.height;
        let bus_y = bottom + self.settings.level_gap / 2.0;
        let row_y = bottom + self.settings.level_gap;

        let mut lefts = Vec::with_capacity(visible.nodes.len());
        let mut left = center_x - total / 2.0;
        for child in visible.nodes {
            lefts.push(left);
            left += self.measure(child, 1, false).footprint + self.settings.sibling_gap;
        }

        let first_center = lefts[0] + self.width / 2.0;
        let last_center = lefts[lefts.len() - 1] + self.width / 2.0;
        self.connectors.push(Connector::new(
            Vec2::new(center_x, bottom),
            Vec2::new(center_x, bus_y),
            ConnectorKind::RootDrop,
        ));
        self.connectors.push(Connector::new(
            Vec2::new(first_center.min(center_x), bus_y),
            Vec2::new(last_center.max(center_x), bus_y),
            ConnectorKind::Bus,
        ));

        for (i, (child, x)) in visible.nodes.iter().zip(lefts).enumerate() {
            let child_center = x + self.width / 2.0;
            self.connectors.push(Connector::new(
                Vec2::new(child_center, bus_y),
                Vec2::new(child_center, row_y),
                ConnectorKind::Drop,
            ));
            let placement = Placement {
                number: child_number(&row_number, i),
                parent: Some(head.id.clone()),
                index: Some(i),
                in_row: true,
                badge: None,
                collapse_control: false,
                hide_children: false,
            };
            self.place_list(child, Vec2::new(x, row_y), 1, placement);
        }
    }

    /// A node with its visible children listed vertically below it.
    fn place_list(&mut self, node: &'a Node, at: Vec2, depth: usize, placement: Placement) {
        let hide = placement.hide_children;
        let number = placement.number.clone();
        self.push(node, at, depth, placement);

        let visible = self.visible(node, depth, hide);
        if visible.nodes.is_empty() {
            return;
        }
        if visible.stack != StackState::Plain {
            self.stacks.push(StackRecord {
                parent_id: node.id.clone(),
                representative: visible.nodes[0].id.clone(),
                total: node.children.len(),
                expanded: visible.stack == StackState::Expanded,
            });
        }

        let collapsed = visible.stack == StackState::Collapsed;
        let extents: Vec<Extent> = visible
            .nodes
            .iter()
            .map(|child| self.measure(child, depth + 1, collapsed))
            .collect();

        let spine_x = at.x + self.settings.indent / 2.0;
        let child_x = at.x + self.settings.indent;
        let mut tops = Vec::with_capacity(extents.len());
        let mut cursor = at.y + self.height + self.settings.vertical_gap;
        for extent in &extents {
            tops.push(cursor);
            cursor += extent.height + self.settings.vertical_gap;
        }
        let last_mid = tops[tops.len() - 1] + self.height / 2.0;
        self.connectors.push(Connector::new(
            Vec2::new(spine_x, at.y + self.height),
            Vec2::new(spine_x, last_mid),
            ConnectorKind::Spine,
        ));

        let last = visible.nodes.len() - 1;
        for (i, (child, top)) in visible.nodes.iter().zip(tops).enumerate() {
            let mid = top + self.height / 2.0;
            self.connectors.push(Connector::new(
                Vec2::new(spine_x, mid),
                Vec2::new(child_x, mid),
                ConnectorKind::Tick,
            ));
            let placement = Placement {
                number: child_number(&number, i),
                parent: Some(node.id.clone()),
                index: Some(i),
                in_row: false,
                badge: collapsed.then(|| StackBadge::new(node.children.len() - 1)),
                collapse_control: visible.stack == StackState::Expanded && (i == 0 || i == last),
                hide_children: collapsed,
            };
            self.place_list(child, Vec2::new(child_x, top), depth + 1, placement);
        }
    }

    /// True when every orphan draws only its head box at y = 0, so the block can
    /// sit beside the root without reaching the main level-1 row.
    fn orphans_stay_on_root_line(
        &mut self,
        model: &'a TreeModel,
        options: LayoutOptions,
    ) -> bool {
        if options.orphan_style == OrphanStyle::Level1 {
            return false;
        }
        model.orphans().iter().all(|orphan| {
            self.row_width(orphan.node.as_ref(), options.render_orphan_children) <= 0.0
        })
    }

    /// Places orphan trees right to left, starting `orphan_gap` left of
    /// `anchor`. Each tree reserves its full horizontal extent and the next one
    /// ends `orphan_gap` before it begins, so the box pitch across every
    /// boundary is `node_width + orphan_gap`.
    fn place_orphans(&mut self, model: &'a TreeModel, anchor: f32, options: LayoutOptions) {
        let orphans: Vec<(usize, &'a Orphan)> = model.orphans().iter().enumerate().collect();
        let in_group = |kind: OrphanKind, orphan: &Orphan| {
            options.orphan_style == OrphanStyle::Subdomain || orphan.kind == kind
        };
        // Subdomains sit nearest the tree; within a group the last orphan is nearest.
        let order = orphans
            .iter()
            .rev()
            .filter(|(_, o)| in_group(OrphanKind::Subdomain, o))
            .chain(
                orphans
                    .iter()
                    .rev()
                    .filter(|(_, o)| !in_group(OrphanKind::Subdomain, o)),
            );

        let level_one_count = model.root().children.len();
        let row_y = self.height + self.settings.level_gap;
        let render = options.render_orphan_children;
        let mut right_edge = anchor - self.settings.orphan_gap;

        for &(input_index, orphan) in order {
            let head = orphan.node.as_ref();
            match options.orphan_style {
                OrphanStyle::Level1 => {
                    let span = self.measure(head, 1, !render).footprint;
                    let x = right_edge - span;
                    let number = (level_one_count + input_index + 1).to_string();
                    self.place_list(head, Vec2::new(x, row_y), 1, Placement::head(number, !render));
                    right_edge = x - self.settings.orphan_gap;
                }
                OrphanStyle::Root | OrphanStyle::Subdomain => {
                    let (left, right) = self.row_span(head, render);
                    let x = right_edge - right;
                    let number = match options.orphan_style {
                        OrphanStyle::Subdomain => format!("S{}", input_index + 1),
                        _ => "0".to_string(),
                    };
                    self.place_head(head, Vec2::new(x, 0.0), number, render);
                    right_edge = x + left - self.settings.orphan_gap;
                }
            }
        }
    }

    fn push(&mut self, node: &Node, at: Vec2, depth: usize, placement: Placement) {
        self.positions.insert(
            node.id.clone(),
            NodePosition {
                x: at.x,
                y: at.y,
                width: self.width,
                height: self.height,
                depth,
                display_number: placement.number,
                parent_id: placement.parent,
                child_index: placement.index,
                in_row: placement.in_row,
                stack: placement.badge,
                show_collapse_control: placement.collapse_control,
            },
        );
    }

    fn finish(self) -> LayoutResult {
        let bounds = self
            .positions
            .values()
            .map(NodePosition::rect)
            .reduce(|acc, rect| acc.union(&rect))
            .unwrap_or_default()
            .expand(self.settings.margin);
        LayoutResult {
            positions: self.positions,
            connectors: self.connectors,
            stacks: self.stacks,
            bounds,
        }
    }
}

/// Children of a depth-0 box are numbered `1..n`; deeper ones append `.i`.
fn child_number(parent: &str, index: usize) -> String {
    if parent == "0" {
        (index + 1).to_string()
    } else {
        format!("{parent}.{}", index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(model: &TreeModel) -> LayoutResult {
        compute_layout(
            model,
            DisplayMode::Compact,
            &StackExpansion::new(),
            LayoutOptions::default(),
        )
    }

    fn blog(id: &str, count: usize) -> Node {
        (1..=count).fold(Node::new(id, "Blog", "/blog"), |node, i| {
            node.with_child(Node::new(
                format!("{id}-post-{i}"),
                format!("Post about topic {}", (b'a' + i as u8) as char),
                format!("/blog/post-{i}"),
            ))
        })
    }

    fn pos<'r>(result: &'r LayoutResult, id: &str) -> &'r NodePosition {
        result.position(&NodeId::from(id)).unwrap()
    }

    #[test]
    fn test_empty_root_yields_single_box() {
        let model = TreeModel::blank("r", "Home", "/");
        let result = layout(&model);
        let settings = LayoutSettings::default();

        assert_eq!(result.positions.len(), 1);
        let root = pos(&result, "r");
        assert_eq!((root.x, root.y), (0.0, 0.0));
        assert_eq!(root.display_number, "0");
        assert!(result.connectors.is_empty());
        assert_eq!(result.bounds, root.rect().expand(settings.margin));
    }

    #[test]
    fn test_level_one_row_is_centered_and_packed() {
        let root = Node::new("r", "Home", "/")
            .with_child(
                Node::new("a", "A", "/a")
                    .with_child(Node::new("a1", "A1", "/a/1"))
                    .with_child(Node::new("a2", "A2", "/a/2")),
            )
            .with_child(Node::new("b", "B", "/b"))
            .with_child(Node::new("c", "C", "/c"));
        let model = TreeModel::from_parts(root, Vec::new(), Vec::new()).unwrap();
        let result = layout(&model);
        let s = LayoutSettings::default();

        let a_footprint = s.indent + s.node_width;
        let total = a_footprint + 2.0 * s.node_width + 2.0 * s.sibling_gap;
        let a = pos(&result, "a");
        let b = pos(&result, "b");
        let c = pos(&result, "c");
        assert_eq!(a.x, s.node_width / 2.0 - total / 2.0);
        assert_eq!(b.x, a.x + a_footprint + s.sibling_gap);
        assert_eq!(c.x, b.x + s.node_width + s.sibling_gap);
        assert_eq!(a.y, s.compact_height + s.level_gap);
        assert!(a.in_row && b.in_row && c.in_row);

        let a2 = pos(&result, "a2");
        assert_eq!(a2.x, a.x + s.indent);
        assert_eq!(a2.display_number, "1.2");
        assert_eq!(a2.depth, 2);
        assert_eq!(c.display_number, "3");
    }

    #[test]
    fn test_connectors_follow_bus_and_spine_pattern() {
        let root = Node::new("r", "Home", "/")
            .with_child(Node::new("a", "A", "/a").with_child(Node::new("a1", "A1", "/a/1")))
            .with_child(Node::new("b", "B", "/b"));
        let model = TreeModel::from_parts(root, Vec::new(), Vec::new()).unwrap();
        let result = layout(&model);
        let s = LayoutSettings::default();

        assert_eq!(result.connectors_of(ConnectorKind::RootDrop).count(), 1);
        assert_eq!(result.connectors_of(ConnectorKind::Bus).count(), 1);
        assert_eq!(result.connectors_of(ConnectorKind::Drop).count(), 2);
        assert_eq!(result.connectors_of(ConnectorKind::Spine).count(), 1);
        assert_eq!(result.connectors_of(ConnectorKind::Tick).count(), 1);

        let bus = result.connectors_of(ConnectorKind::Bus).next().unwrap();
        assert_eq!(bus.y1, s.compact_height + s.level_gap / 2.0);
        assert_eq!(bus.x1, pos(&result, "a").center().x);
        assert_eq!(bus.x2, pos(&result, "b").center().x);

        let tick = result.connectors_of(ConnectorKind::Tick).next().unwrap();
        assert_eq!(tick.x2, pos(&result, "a1").x);
        assert_eq!(tick.y1, pos(&result, "a1").center().y);
    }

    #[test]
    fn test_blog_children_stack_below_level_one_only() {
        let root = Node::new("r", "Home", "/").with_child(blog("blog", 6));
        let model = TreeModel::from_parts(root, Vec::new(), Vec::new()).unwrap();
        let result = layout(&model);

        let first = pos(&result, "blog-post-1");
        assert_eq!(
            first.stack,
            Some(StackBadge {
                hidden: 5,
                label: "+5 more".to_string()
            })
        );
        for i in 2..=6 {
            assert!(!result.is_rendered(&NodeId(format!("blog-post-{i}"))));
        }
        assert_eq!(
            result.stacks,
            vec![StackRecord {
                parent_id: "blog".into(),
                representative: "blog-post-1".into(),
                total: 6,
                expanded: false,
            }]
        );

        // The same children directly under the root never stack.
        let flat = TreeModel::from_parts(blog("r", 6), Vec::new(), Vec::new()).unwrap();
        let result = layout(&flat);
        assert_eq!(result.positions.len(), 7);
        assert!(result.positions.values().all(|p| p.stack.is_none()));
        assert!(result.stacks.is_empty());
    }

    #[test]
    fn test_expanded_stack_marks_first_and_last() {
        let root = Node::new("r", "Home", "/").with_child(blog("blog", 6));
        let model = TreeModel::from_parts(root, Vec::new(), Vec::new()).unwrap();
        let expanded: StackExpansion = std::iter::once(NodeId::from("blog")).collect();
        let result = compute_layout(
            &model,
            DisplayMode::Compact,
            &expanded,
            LayoutOptions::default(),
        );

        assert_eq!(result.positions.len(), 8);
        let flagged: Vec<_> = result
            .positions
            .iter()
            .filter(|(_, p)| p.show_collapse_control)
            .map(|(id, _)| id.as_str())
            .collect();
        assert_eq!(flagged, vec!["blog-post-1", "blog-post-6"]);
        assert!(result.stacks[0].expanded);
    }

    #[test]
    fn test_collapsed_representative_hides_its_subtree() {
        let mut parent = blog("blog", 5);
        let first = Arc::make_mut(&mut parent.children[0]);
        first.children.push(Arc::new(Node::new("deep", "Deep", "/blog/post-1/deep")));
        let root = Node::new("r", "Home", "/").with_child(parent);
        let model = TreeModel::from_parts(root, Vec::new(), Vec::new()).unwrap();
        let result = layout(&model);

        assert!(result.is_rendered(&"blog-post-1".into()));
        assert!(!result.is_rendered(&"deep".into()));
    }

    #[test]
    fn test_thumbnail_mode_uses_taller_boxes() {
        let model = TreeModel::from_parts(blog("r", 2), Vec::new(), Vec::new()).unwrap();
        let result = compute_layout(
            &model,
            DisplayMode::Thumbnail,
            &StackExpansion::new(),
            LayoutOptions::default(),
        );
        let s = LayoutSettings::default();
        assert!(result.positions.values().all(|p| p.height == s.thumbnail_height));
        assert_eq!(pos(&result, "r-post-1").y, s.thumbnail_height + s.level_gap);
    }

    #[test]
    fn test_orphans_are_spaced_right_to_left() {
        let root = Node::new("r", "Home", "/");
        let orphans = vec![
            Orphan::new(Node::new("p1", "P1", "/p1"), OrphanKind::Plain),
            Orphan::new(Node::new("s1", "S1", "/s1"), OrphanKind::Subdomain),
            Orphan::new(Node::new("p2", "P2", "/p2"), OrphanKind::Plain),
            Orphan::new(Node::new("s2", "S2", "/s2"), OrphanKind::Subdomain),
        ];
        let model = TreeModel::from_parts(root, orphans, Vec::new()).unwrap();
        let result = layout(&model);
        let s = LayoutSettings::default();
        let step = s.node_width + s.orphan_gap;

        let xs: Vec<f32> = ["s2", "s1", "p2", "p1"]
            .iter()
            .map(|id| pos(&result, id).x)
            .collect();
        assert_eq!(xs[0], -step);
        for pair in xs.windows(2) {
            assert_eq!(pair[0] - pair[1], step);
        }
        assert!(result.positions.values().all(|p| p.display_number == "0"));
    }

    #[test]
    fn test_after_tree_clears_main_tree_extent() {
        let root = blog("r", 4);
        let orphans = vec![Orphan::new(Node::new("o", "O", "/o"), OrphanKind::Plain)];
        let model = TreeModel::from_parts(root, orphans, Vec::new()).unwrap();
        let s = LayoutSettings::default();

        let after_tree = layout(&model);
        let leftmost = pos(&after_tree, "r-post-1").x;
        assert_eq!(pos(&after_tree, "o").x, leftmost - s.orphan_gap - s.node_width);

        let options = LayoutOptions {
            orphan_mode: OrphanMode::AfterRoot,
            ..LayoutOptions::default()
        };
        let after_root =
            compute_layout(&model, DisplayMode::Compact, &StackExpansion::new(), options);
        assert_eq!(pos(&after_root, "o").x, -s.orphan_gap - s.node_width);
    }

    #[test]
    fn test_after_root_orphan_rows_clear_the_level_one_row() {
        let root = (0..4).fold(Node::new("r", "Home", "/"), |node, i| {
            node.with_child(Node::new(format!("c{i}"), format!("C{i}"), format!("/c{i}")))
        });
        let orphans = vec![Orphan::new(
            Node::new("o", "O", "/o")
                .with_child(Node::new("oa", "OA", "/o/a"))
                .with_child(Node::new("ob", "OB", "/o/b")),
            OrphanKind::Plain,
        )];
        let model = TreeModel::from_parts(root, orphans, Vec::new()).unwrap();
        let options = LayoutOptions {
            orphan_mode: OrphanMode::AfterRoot,
            ..LayoutOptions::default()
        };
        let result = compute_layout(&model, DisplayMode::Compact, &StackExpansion::new(), options);
        let s = LayoutSettings::default();

        let c0 = pos(&result, "c0");
        let ob = pos(&result, "ob");
        assert_eq!(ob.y, c0.y);
        assert_eq!(ob.x + s.node_width, c0.x - s.orphan_gap);
        for id in ["o", "oa", "ob"] {
            let orphan_box = pos(&result, id).rect();
            for main in ["r", "c0", "c1", "c2", "c3"] {
                assert!(!orphan_box.intersects(&pos(&result, main).rect()));
            }
        }
    }

    #[test]
    fn test_orphan_styles_number_heads() {
        let root = blog("r", 2);
        let orphans = vec![
            Orphan::new(
                Node::new("o", "O", "/o").with_child(Node::new("o1", "O1", "/o/1")),
                OrphanKind::Plain,
            ),
            Orphan::new(Node::new("q", "Q", "/q"), OrphanKind::Plain),
        ];
        let model = TreeModel::from_parts(root, orphans, Vec::new()).unwrap();
        let run = |style| {
            let options = LayoutOptions {
                orphan_style: style,
                ..LayoutOptions::default()
            };
            compute_layout(&model, DisplayMode::Compact, &StackExpansion::new(), options)
        };

        let level1 = run(OrphanStyle::Level1);
        assert_eq!(pos(&level1, "o").display_number, "3");
        assert_eq!(pos(&level1, "o").depth, 1);
        assert_eq!(pos(&level1, "o1").display_number, "3.1");
        assert_eq!(pos(&level1, "q").display_number, "4");
        assert_eq!(pos(&level1, "o").y, pos(&level1, "r-post-1").y);

        let subdomain = run(OrphanStyle::Subdomain);
        assert_eq!(pos(&subdomain, "o").display_number, "S1");
        assert_eq!(pos(&subdomain, "o1").display_number, "S1.1");
        assert_eq!(pos(&subdomain, "q").display_number, "S2");

        let root_style = run(OrphanStyle::Root);
        assert_eq!(pos(&root_style, "o1").display_number, "1");
        assert!(pos(&root_style, "o1").in_row);
    }

    #[test]
    fn test_orphan_children_can_be_suppressed() {
        let orphans = vec![Orphan::new(blog("o", 3), OrphanKind::Plain)];
        let model =
            TreeModel::from_parts(Node::new("r", "Home", "/"), orphans, Vec::new()).unwrap();
        let options = LayoutOptions {
            render_orphan_children: false,
            ..LayoutOptions::default()
        };
        let result = compute_layout(&model, DisplayMode::Compact, &StackExpansion::new(), options);
        assert_eq!(result.positions.len(), 2);
        assert!(result.connectors.is_empty());
    }

    #[test]
    fn test_deep_chain_is_truncated() {
        let mut node = Node::new("n199", "Leaf", "/leaf");
        for i in (0..199).rev() {
            node = Node::new(format!("n{i}"), format!("N{i}"), format!("/n/{i}")).with_child(node);
        }
        let model = TreeModel::from_parts(node, Vec::new(), Vec::new()).unwrap();
        let result = layout(&model);
        assert_eq!(result.positions.len(), TreeLayouter::MAX_LAYOUT_DEPTH + 1);
    }
}
