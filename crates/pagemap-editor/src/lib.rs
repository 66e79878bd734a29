pub mod drag;
pub mod history;
pub mod session;

pub use drag::{DragController, DragSession, DragSettings};
pub use history::{HistoryEntry, HistoryManager};
pub use pagemap_events::ChangeOrigin;
pub use session::EditorSession;
