//! Turns a continuous drag gesture into at most one validated move.

use pagemap_core::{EditOutcome, MovePlan, NodeId, TreeModel};
use pagemap_graph::{DropZone, DropZoneHitTester, LayoutResult, Vec2, collect_drop_zones};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    /// Maximum pointer distance to a zone for it to become active.
    pub threshold: f32,
    /// Thickness of the strips generated around each box.
    pub zone_thickness: f32,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            threshold: 24.0,
            zone_thickness: 12.0,
        }
    }
}

/// State kept between drag-start and drag-end.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub dragged: NodeId,
    /// Pointer position relative to the dragged box's top-left corner.
    pub offset: Vec2,
    pub pointer: Vec2,
    zones: DropZoneHitTester,
    active: Option<DropZone>,
}

impl DragSession {
    pub fn zones(&self) -> &[DropZone] {
        self.zones.zones()
    }

    pub fn active(&self) -> Option<&DropZone> {
        self.active.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    pub settings: DragSettings,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(settings: DragSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn active_zone(&self) -> Option<&DropZone> {
        self.session.as_ref().and_then(DragSession::active)
    }

    /// Begins dragging `id`. Returns false, staying idle, for the root and for
    /// nodes that are not on screen.
    pub fn start(
        &mut self,
        model: &TreeModel,
        layout: &LayoutResult,
        id: &NodeId,
        pointer: Vec2,
    ) -> bool {
        self.session = None;
        if id == model.root_id() {
            tracing::debug!("Ignoring drag of root {}", id);
            return false;
        }
        let Some(pos) = layout.position(id) else {
            tracing::debug!("Ignoring drag of unrendered node {}", id);
            return false;
        };

        let zones = collect_drop_zones(model, layout, id, self.settings.zone_thickness);
        tracing::debug!("Drag of {} started with {} drop zones", id, zones.len());
        self.session = Some(DragSession {
            dragged: id.clone(),
            offset: pointer - Vec2::new(pos.x, pos.y),
            pointer,
            zones: DropZoneHitTester::new(zones),
            active: None,
        });
        true
    }

    /// Tracks the pointer and returns the single active zone, if any.
    pub fn update(&mut self, model: &TreeModel, pointer: Vec2) -> Option<&DropZone> {
        let threshold = self.settings.threshold;
        let session = self.session.as_mut()?;
        session.pointer = pointer;
        session.active = session
            .zones
            .nearest(pointer, threshold)
            .filter(|zone| is_effective(model, &session.dragged, zone))
            .cloned();
        session.active.as_ref()
    }

    /// Finishes the gesture. Returns the new model when the drop moved
    /// something; the controller is idle afterwards either way.
    pub fn end(&mut self, model: &TreeModel) -> Option<TreeModel> {
        let session = self.session.take()?;
        let zone = session.active?;
        match model.move_node(&session.dragged, &zone.parent_id, zone.index) {
            Ok(EditOutcome::Applied(next)) => Some(next),
            Ok(EditOutcome::NoOp) => None,
            Err(err) => {
                tracing::debug!("Drop of {} rejected: {}", session.dragged, err);
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!("Drag of {} cancelled", session.dragged);
        }
    }
}

/// Re-checks a zone against the live model before it is shown.
fn is_effective(model: &TreeModel, dragged: &NodeId, zone: &DropZone) -> bool {
    matches!(
        model.plan_move(dragged, &zone.parent_id, zone.index),
        Ok(MovePlan::Move { .. })
    )
}
