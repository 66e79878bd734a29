use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};
use pagemap_core::{Mutation, NodeId};
use pagemap_graph::{DisplayMode, DropZone, Rect};
use serde::{Deserialize, Serialize};

/// Where a model change came from. History replays are never re-recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeOrigin {
    User,
    History,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    // ========================================================================
    // Pointer gestures
    // ========================================================================
    DragStart {
        id: NodeId,
        x: f32,
        y: f32,
    },
    DragMove {
        x: f32,
        y: f32,
    },
    DragEnd,
    /// Pointer capture lost or the gesture was aborted.
    DragCancel,

    // ========================================================================
    // Commands
    // ========================================================================
    Apply(Mutation),
    Undo,
    Redo,
    ToggleStack {
        parent: NodeId,
    },
    SetDisplayMode(DisplayMode),
    /// The hosting viewport changed size; only the layout is refreshed.
    Resize {
        width: f32,
        height: f32,
    },

    // ========================================================================
    // Notifications
    // ========================================================================
    ModelChanged {
        origin: ChangeOrigin,
        node_count: usize,
    },
    UndoStackChanged {
        can_undo: bool,
        can_redo: bool,
        undo_description: Option<String>,
        redo_description: Option<String>,
    },
    DropIndicatorChanged {
        zone: Option<DropZone>,
    },
    LayoutChanged {
        bounds: Rect,
        node_count: usize,
    },
}

impl Event {
    /// True for events that report state rather than request a change.
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            Event::ModelChanged { .. }
                | Event::UndoStackChanged { .. }
                | Event::DropIndicatorChanged { .. }
                | Event::LayoutChanged { .. }
        )
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        if let Err(TrySendError::Disconnected(event)) = self.tx.try_send(event) {
            tracing::warn!("Dropping event with no receiver: {:?}", event);
        }
    }

    /// Dispatch all pending events to a listener, on the caller's thread.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }

    /// Removes and returns every pending event.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

/// Trait for components that respond to events.
/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
