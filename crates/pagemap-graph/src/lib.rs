pub mod geometry;
pub mod hit_tester;
pub mod layout;
pub mod settings;
pub mod stacking;

pub use geometry::{Rect, Vec2};
pub use hit_tester::{DropZone, DropZoneHitTester, DropZoneKind, collect_drop_zones};
pub use layout::{
    Connector, ConnectorKind, LayoutResult, NodePosition, StackBadge, StackRecord, TreeLayouter,
    compute_layout,
};
pub use settings::{DisplayMode, LayoutOptions, LayoutSettings, OrphanMode, OrphanStyle};
pub use stacking::{StackExpansion, StackingRules};
