use crate::drag::{DragController, DragSettings};
use crate::history::HistoryManager;
use pagemap_core::{EditError, EditOutcome, IdGenerator, Mutation, NodeId, TreeModel, UuidIds};
use pagemap_events::{ChangeOrigin, Event, EventBus, EventListener};
use pagemap_graph::{
    DisplayMode, DropZone, LayoutOptions, LayoutResult, LayoutSettings, StackExpansion,
    TreeLayouter, Vec2,
};

/// Owns the live model and drives it from gestures and commands.
///
/// Every settled change is recorded in history (unless it came from history),
/// laid out again, and announced on the outgoing bus when one is attached.
pub struct EditorSession {
    model: TreeModel,
    history: HistoryManager,
    drag: DragController,
    layouter: TreeLayouter,
    mode: DisplayMode,
    expanded: StackExpansion,
    layout: LayoutResult,
    viewport: Vec2,
    ids: Box<dyn IdGenerator>,
    bus: Option<EventBus>,
}

impl EditorSession {
    pub fn new(model: TreeModel) -> Self {
        Self::with_settings(
            model,
            LayoutSettings::default(),
            LayoutOptions::default(),
            DragSettings::default(),
        )
    }

    pub fn with_settings(
        model: TreeModel,
        settings: LayoutSettings,
        options: LayoutOptions,
        drag: DragSettings,
    ) -> Self {
        let layouter = TreeLayouter::new(settings, options);
        let expanded = StackExpansion::new();
        let mode = DisplayMode::default();
        let layout = layouter.execute(&model, mode, &expanded);
        let mut history = HistoryManager::new();
        history.record(model.clone(), "Open");

        Self {
            model,
            history,
            drag: DragController::new(drag),
            layouter,
            mode,
            expanded,
            layout,
            viewport: Vec2::default(),
            ids: Box::new(UuidIds),
            bus: None,
        }
    }

    /// Replaces the id source used by duplicate.
    pub fn with_ids(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Attaches the bus notifications are published on.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn model(&self) -> &TreeModel {
        &self.model
    }

    pub fn layout(&self) -> &LayoutResult {
        &self.layout
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn expanded_stacks(&self) -> &StackExpansion {
        &self.expanded
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn active_drop_zone(&self) -> Option<&DropZone> {
        self.drag.active_zone()
    }

    pub fn into_model(self) -> TreeModel {
        self.model
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Applies `mutation` and records it. Returns whether the model changed.
    ///
    /// Commands are ignored while a drag is in progress.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<bool, EditError> {
        if self.drag.is_dragging() {
            tracing::debug!("Ignoring {} during drag", mutation.label());
            return Ok(false);
        }
        match mutation.apply(&self.model, self.ids.as_mut())? {
            EditOutcome::Applied(next) => {
                self.commit(next, mutation.label(), ChangeOrigin::User);
                Ok(true)
            }
            EditOutcome::NoOp => Ok(false),
        }
    }

    pub fn undo(&mut self) -> bool {
        if self.drag.is_dragging() {
            return false;
        }
        match self.history.undo().cloned() {
            Some(snapshot) => {
                self.commit(snapshot, "Undo", ChangeOrigin::History);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.drag.is_dragging() {
            return false;
        }
        match self.history.redo().cloned() {
            Some(snapshot) => {
                self.commit(snapshot, "Redo", ChangeOrigin::History);
                true
            }
            None => false,
        }
    }

    /// Expands or collapses the stack under `parent`. Not an edit, so it never
    /// enters history.
    pub fn toggle_stack(&mut self, parent: &NodeId) -> bool {
        let expanded = self.expanded.toggle(parent);
        self.relayout();
        expanded
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if self.mode != mode {
            self.mode = mode;
            self.relayout();
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        self.relayout();
    }

    // ========================================================================
    // Drag gestures
    // ========================================================================

    pub fn drag_start(&mut self, id: &NodeId, pointer: Vec2) -> bool {
        self.drag.start(&self.model, &self.layout, id, pointer)
    }

    pub fn drag_move(&mut self, pointer: Vec2) -> Option<DropZone> {
        let before = self.drag.active_zone().cloned();
        let active = self.drag.update(&self.model, pointer).cloned();
        if active != before {
            self.publish(Event::DropIndicatorChanged {
                zone: active.clone(),
            });
        }
        active
    }

    /// Drops the dragged node on the active zone. Returns whether it moved.
    pub fn drag_end(&mut self) -> bool {
        let had_indicator = self.drag.active_zone().is_some();
        let moved = self.drag.end(&self.model);
        if had_indicator {
            self.publish(Event::DropIndicatorChanged { zone: None });
        }
        match moved {
            Some(next) => {
                self.commit(next, "Move page", ChangeOrigin::User);
                true
            }
            None => false,
        }
    }

    pub fn drag_cancel(&mut self) {
        let had_indicator = self.drag.active_zone().is_some();
        self.drag.cancel();
        if had_indicator {
            self.publish(Event::DropIndicatorChanged { zone: None });
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn commit(&mut self, next: TreeModel, label: &str, origin: ChangeOrigin) {
        if origin == ChangeOrigin::User {
            self.history.record(next.clone(), label);
        }
        tracing::debug!("{} applied ({:?})", label, origin);
        self.model = next;
        self.publish(Event::ModelChanged {
            origin,
            node_count: self.model.node_count(),
        });
        self.publish(Event::UndoStackChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            undo_description: self.history.undo_description().map(str::to_string),
            redo_description: self.history.redo_description().map(str::to_string),
        });
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = self.layouter.execute(&self.model, self.mode, &self.expanded);
        self.publish(Event::LayoutChanged {
            bounds: self.layout.bounds,
            node_count: self.layout.positions.len(),
        });
    }

    fn publish(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}

impl EventListener for EditorSession {
    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::DragStart { id, x, y } => {
                self.drag_start(id, Vec2::new(*x, *y));
            }
            Event::DragMove { x, y } => {
                self.drag_move(Vec2::new(*x, *y));
            }
            Event::DragEnd => {
                self.drag_end();
            }
            Event::DragCancel => self.drag_cancel(),
            Event::Apply(mutation) => {
                if let Err(err) = self.apply(mutation) {
                    tracing::debug!("{} rejected: {}", mutation.label(), err);
                }
            }
            Event::Undo => {
                self.undo();
            }
            Event::Redo => {
                self.redo();
            }
            Event::ToggleStack { parent } => {
                self.toggle_stack(parent);
            }
            Event::SetDisplayMode(mode) => self.set_display_mode(*mode),
            Event::Resize { width, height } => self.resize(*width, *height),
            Event::ModelChanged { .. }
            | Event::UndoStackChanged { .. }
            | Event::DropIndicatorChanged { .. }
            | Event::LayoutChanged { .. } => {}
        }
    }
}
