//! Engine settings and the grid options the engine consults

use serde::{Deserialize, Serialize};

/// Tuning knobs for the navigation engine itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// How far (in pixels) a row may overhang the bottom of the viewport
    /// before it is considered not visible. Zoomed pages round row offsets,
    /// so an exact comparison would scroll on every step.
    pub vertical_scroll_tolerance: f64,

    /// Park held-down (repeating) keys and replay them on the next tick
    pub debounce_key_repeat: bool,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            vertical_scroll_tolerance: 5.0,
            debounce_key_repeat: true,
        }
    }
}

/// Selection mode for cells, rows or columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridSelectionMode {
    None,
    Single,
    #[default]
    Multiple,
}

/// How per-column filtering is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    QuickFilter,
    ExcelStyleFilter,
}

/// Grid configuration that changes navigation decisions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Row-level edit sessions (and therefore row adding) are enabled
    pub row_editable: bool,

    /// Space toggles row selection
    pub row_selectable: bool,

    pub cell_selection: GridSelectionMode,
    pub column_selection: GridSelectionMode,

    pub filter_mode: FilterMode,
    pub allow_filtering: bool,
    pub allow_advanced_filtering: bool,

    /// Grouped columns disappear from the column list
    pub hide_grouped_columns: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_editable: false,
            row_selectable: false,
            cell_selection: GridSelectionMode::Multiple,
            column_selection: GridSelectionMode::None,
            filter_mode: FilterMode::QuickFilter,
            allow_filtering: false,
            allow_advanced_filtering: false,
            hide_grouped_columns: false,
        }
    }
}
