use crate::geometry::{Rect, Vec2};
use crate::layout::{LayoutResult, NodePosition};
use pagemap_core::{MovePlan, NodeId, TreeModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropZoneKind {
    /// Insert as a sibling of `anchor_id`.
    Sibling,
    /// Insert as the first child of `anchor_id`.
    Child,
}

/// A region a dragged node may be released onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropZone {
    pub kind: DropZoneKind,
    /// Parent the dragged node is moved under.
    pub parent_id: NodeId,
    /// Insertion slot in the parent's children, counted before removal.
    pub index: usize,
    /// Hit area in diagram coordinates.
    pub rect: Rect,
    /// The rendered node the zone was derived from.
    pub anchor_id: NodeId,
}

/// Builds the candidate drop zones for dragging `dragged` over `layout`.
///
/// Row members get vertical strips left and right of their box, listed members
/// get horizontal strips above and below. Zones that would not move the node
/// are left out.
pub fn collect_drop_zones(
    model: &TreeModel,
    layout: &LayoutResult,
    dragged: &NodeId,
    thickness: f32,
) -> Vec<DropZone> {
    let mut last_rendered: HashMap<&NodeId, usize> = HashMap::new();
    for pos in layout.positions.values() {
        if let (Some(parent), Some(index)) = (&pos.parent_id, pos.child_index) {
            let last = last_rendered.entry(parent).or_insert(index);
            *last = (*last).max(index);
        }
    }

    let mut zones = Vec::new();
    for (id, pos) in &layout.positions {
        if let (Some(parent), Some(index)) = (&pos.parent_id, pos.child_index) {
            zones.push(DropZone {
                kind: DropZoneKind::Sibling,
                parent_id: parent.clone(),
                index,
                rect: before_strip(pos, thickness),
                anchor_id: id.clone(),
            });
            if last_rendered.get(parent) == Some(&index) {
                zones.push(DropZone {
                    kind: DropZoneKind::Sibling,
                    parent_id: parent.clone(),
                    index: index + 1,
                    rect: after_strip(pos, thickness),
                    anchor_id: id.clone(),
                });
            }
        }

        let childless = model.find(id).is_some_and(|node| node.is_leaf());
        if childless {
            zones.push(DropZone {
                kind: DropZoneKind::Child,
                parent_id: id.clone(),
                index: 0,
                rect: child_strip(pos, thickness),
                anchor_id: id.clone(),
            });
        }
    }

    zones.retain(|zone| {
        matches!(
            model.plan_move(dragged, &zone.parent_id, zone.index),
            Ok(MovePlan::Move { .. })
        )
    });
    zones
}

fn before_strip(pos: &NodePosition, thickness: f32) -> Rect {
    if pos.in_row {
        Rect::from_pos_size(
            Vec2::new(pos.x - thickness, pos.y),
            Vec2::new(thickness, pos.height),
        )
    } else {
        Rect::from_pos_size(
            Vec2::new(pos.x, pos.y - thickness),
            Vec2::new(pos.width, thickness),
        )
    }
}

fn after_strip(pos: &NodePosition, thickness: f32) -> Rect {
    if pos.in_row {
        Rect::from_pos_size(
            Vec2::new(pos.x + pos.width, pos.y),
            Vec2::new(thickness, pos.height),
        )
    } else {
        Rect::from_pos_size(
            Vec2::new(pos.x, pos.y + pos.height),
            Vec2::new(pos.width, thickness),
        )
    }
}

/// Indented strip below the box, where a first child would appear.
fn child_strip(pos: &NodePosition, thickness: f32) -> Rect {
    let inset = thickness.min(pos.width / 2.0);
    Rect::from_pos_size(
        Vec2::new(pos.x + inset, pos.y + pos.height),
        Vec2::new(pos.width - inset, thickness),
    )
}

/// Nearest-zone lookup over a fixed zone set.
#[derive(Debug, Clone, Default)]
pub struct DropZoneHitTester {
    zones: Vec<DropZone>,
}

impl DropZoneHitTester {
    pub fn new(zones: Vec<DropZone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[DropZone] {
        &self.zones
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// The zone closest to `point` within `threshold`.
    ///
    /// A child strip lies inside the sibling strip under the same box, so on
    /// equal distance a child zone beats a sibling zone. Otherwise the earliest
    /// zone wins ties.
    pub fn nearest(&self, point: Vec2, threshold: f32) -> Option<&DropZone> {
        let mut best: Option<(&DropZone, f32)> = None;
        for zone in &self.zones {
            let distance = zone.rect.distance_to(point);
            if distance > threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, d)) => {
                    distance < d
                        || (distance == d
                            && zone.kind == DropZoneKind::Child
                            && current.kind == DropZoneKind::Sibling)
                }
            };
            if better {
                best = Some((zone, distance));
            }
        }
        best.map(|(zone, _)| zone)
    }
}
