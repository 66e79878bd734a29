use crate::stacking::StackingRules;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Compact,
    Thumbnail,
}

/// Where orphan columns start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrphanMode {
    /// Immediately left of the root box while orphans are lone heads;
    /// otherwise clear of the main tree like `AfterTree`.
    AfterRoot,
    /// Left of the main tree's full horizontal extent.
    #[default]
    AfterTree,
}

/// Numbering and indent convention applied to orphan trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrphanStyle {
    /// Each orphan is laid out and numbered like the main root.
    #[default]
    Root,
    /// Orphan heads continue the main level-1 numbering and stack their
    /// children vertically.
    Level1,
    /// Every orphan is grouped as a subdomain and numbered `S<k>`.
    Subdomain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub orphan_mode: OrphanMode,
    pub orphan_style: OrphanStyle,
    /// When false only each orphan's head box is produced.
    pub render_orphan_children: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            orphan_mode: OrphanMode::default(),
            orphan_style: OrphanStyle::default(),
            render_orphan_children: true,
        }
    }
}

/// Geometry constants of the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Width of every box.
    pub node_width: f32,
    /// Box height in compact mode.
    pub compact_height: f32,
    /// Box height when thumbnails are shown.
    pub thumbnail_height: f32,
    /// Horizontal gap between level-1 footprints.
    pub sibling_gap: f32,
    /// Horizontal indent per depth below level 1.
    pub indent: f32,
    /// Vertical gap between stacked siblings.
    pub vertical_gap: f32,
    /// Distance from the bottom of a root box to the top of its level-1 row.
    pub level_gap: f32,
    /// Gap between adjacent orphan columns.
    pub orphan_gap: f32,
    /// Padding added around the bounds.
    pub margin: f32,
    /// Thresholds for collapsing repetitive siblings.
    pub stacking: StackingRules,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            node_width: 220.0,
            compact_height: 56.0,
            thumbnail_height: 196.0,
            sibling_gap: 40.0,
            indent: 32.0,
            vertical_gap: 16.0,
            level_gap: 80.0,
            orphan_gap: 60.0,
            margin: 40.0,
            stacking: StackingRules::default(),
        }
    }
}

impl LayoutSettings {
    pub fn node_height(&self, mode: DisplayMode) -> f32 {
        match mode {
            DisplayMode::Compact => self.compact_height,
            DisplayMode::Thumbnail => self.thumbnail_height,
        }
    }

    /// Reads settings from a JSON file; missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading layout settings {}", path.display()))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("parsing layout settings {}", path.display()))?;
        Ok(settings)
    }
}
