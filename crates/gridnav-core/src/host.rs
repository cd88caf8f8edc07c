//! The collaborator contract a grid must satisfy to be navigated
//!
//! The engine never owns the grid. Every navigation entry point borrows a
//! [`GridHost`] for the duration of the call; everything the engine wants
//! done (scrolling, editing, selecting, sorting) is requested through these
//! traits and carried out by the host.

use serde::{Deserialize, Serialize};

use crate::columns::{ColumnArena, ColumnId};
use crate::navigation::{ActiveNode, TargetType};
use crate::settings::GridOptions;

/// What a data-view record is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A plain data record
    Data,
    /// A group-level summary record
    Summary,
    /// A group-by header record
    GroupBy,
    /// A master-detail record
    Detail,
    /// A record carrying child-grid data (hierarchical grids)
    ChildGrid,
}

/// Shape of a resolved row object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Flat,
    Tree,
    GroupBy,
    Detail,
}

/// Primary key of a row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey(pub String);

impl From<&str> for RowKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// A rendered row as returned by the host's row lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHandle {
    pub index: isize,
    pub kind: RowKind,
    /// `None` for ad hoc rows (group-by rows) that have no stable key
    pub key: Option<RowKey>,
    pub selected: bool,
    pub expanded: bool,
    /// Row was added during the current edit session
    pub added: bool,
}

/// A rendered cell as returned by the host's cell lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellHandle {
    pub row: isize,
    pub visible_column_index: isize,
    pub editable: bool,
}

/// A cell coordinate returned by neighbour queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPosition {
    pub row_index: isize,
    pub visible_column_index: isize,
}

/// Snapshot of the edit service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditState {
    /// Cell that owns the current edit session, if any
    pub cell: Option<CellPosition>,
    pub cell_in_edit_mode: bool,
    pub row_in_edit_mode: bool,
    /// A row edit is pending and may not be abandoned by navigation
    pub row_editing_blocked: bool,
    /// An IME composition is in progress
    pub composing: bool,
}

/// Which row-edit tab stop to focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTab {
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    None,
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Next,
    Previous,
}

/// A rectangular cell range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub row_start: isize,
    pub row_end: isize,
    pub column_start: isize,
    pub column_end: isize,
}

/// What an activation lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationTarget {
    pub row: isize,
    /// `None` when the target is a whole row (group-by or child-grid rows)
    pub column: Option<isize>,
    pub target_type: TargetType,
}

/// Payload of the cancelable grid keydown notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridKeydownArgs {
    pub target_type: TargetType,
    pub row: isize,
    pub column: isize,
    pub key: String,
    pub cancel: bool,
}

/// The ordered data view and its virtualization window
pub trait DataView {
    /// Number of materialized records
    fn view_len(&self) -> usize;

    /// Kind of the materialized record at `index`
    fn record_kind(&self, index: usize) -> Option<RecordKind>;

    /// Index of the first materialized record within the whole view
    fn virtualization_start(&self) -> usize {
        0
    }

    /// Total logical row count for remote data
    fn total_item_count(&self) -> Option<usize> {
        None
    }

    /// Data is paged in from a remote source
    fn is_remote(&self) -> bool {
        false
    }

    /// Pinned rows are always rendered and never scrolled to
    fn is_record_pinned_by_view_index(&self, _index: isize) -> bool {
        false
    }

    /// Number of rows pinned to the top of the body
    fn pinned_top_count(&self) -> usize {
        0
    }

    /// Indices of the body rows currently rendered
    fn rendered_rows(&self) -> Vec<isize>;

    /// Number of summary rows currently rendered
    fn rendered_summary_rows(&self) -> usize {
        0
    }

    fn has_summarized_columns(&self) -> bool {
        false
    }

    /// Resolve the row object at `index`
    fn row_at(&self, index: isize) -> Option<RowHandle>;

    /// Resolve the cell at `row` × `visible column`
    fn cell_at(&self, row: isize, column: isize) -> Option<CellHandle>;
}

/// The column tree
pub trait ColumnSource {
    fn columns(&self) -> &ColumnArena;

    /// Expand or collapse a header group
    fn set_column_expanded(&mut self, column: ColumnId, expanded: bool);
}

/// Scroll containers and their geometry
pub trait Viewport {
    /// Rendered `offsetTop` of a body row, `None` when it is not rendered
    fn row_offset_top(&self, index: isize) -> Option<f64>;

    /// Height of the row at a scroll-container index
    fn row_size_at(&self, index: usize) -> f64;

    /// Vertical offset of the rendered chunk inside the container
    fn container_top_offset(&self) -> f64;

    /// Visible body height, 0 when the grid sizes to its content
    fn container_height(&self) -> f64;

    fn scroll_vertical_to(&mut self, index: usize);

    fn scroll_page(&mut self, direction: PageDirection);

    /// Left edge of the horizontal item at `index`
    fn column_scroll_left(&self, index: usize) -> f64;

    fn display_container_width(&self) -> f64;

    fn display_container_scroll_left(&self) -> f64;

    /// Client width of the horizontal scrollbar, 0 when nothing scrolls
    fn horizontal_client_width(&self) -> f64;

    fn scroll_horizontal_to(&mut self, index: usize);
}

/// The CRUD/edit service
pub trait EditService {
    fn edit_state(&self) -> EditState;

    fn enter_edit_mode(&mut self, cell: CellHandle);

    fn end_edit(&mut self, commit: bool);

    fn enter_add_row_mode(&mut self, row: &RowHandle, as_child: bool);

    /// Commit the edited cell value; `false` when a validator cancelled it
    fn update_cell(&mut self) -> bool;

    /// Next cell after `row` × `column`, optionally restricted to editable columns
    fn next_cell(&self, row: isize, column: isize, editable_only: bool) -> CellPosition;

    fn previous_cell(&self, row: isize, column: isize, editable_only: bool) -> CellPosition;

    fn first_editable_column_index(&self) -> isize;

    fn last_editable_column_index(&self) -> isize;

    /// Number of row-edit tab stops (Done/Cancel buttons) rendered
    fn row_edit_tab_count(&self) -> usize {
        0
    }

    fn focus_row_edit_tab(&mut self, _tab: EditTab) {}
}

/// The selection service
pub trait SelectionService {
    fn select_row(&mut self, key: &RowKey);

    fn deselect_row(&mut self, key: &RowKey);

    fn select_columns(&mut self, fields: &[String], clear_others: bool);

    fn deselect_columns(&mut self, fields: &[String]);

    fn clear_selection(&mut self);

    fn set_keyboard_selection_active(&mut self);

    fn keyboard_state_on_keydown(&mut self, node: &ActiveNode, shift: bool, shift_tab: bool);

    fn clear_cell_selection(&mut self);

    fn select_range(&mut self, range: CellRange);
}

/// Requests and notifications the grid exposes
pub trait GridCommands {
    fn options(&self) -> &GridOptions;

    fn sort_direction(&self, field: &str) -> Option<SortDirection>;

    fn sort(&mut self, field: &str, direction: SortDirection);

    fn group_by(&mut self, field: &str, direction: SortDirection);

    fn clear_grouping(&mut self, field: &str);

    fn set_row_expansion_state(&mut self, key: &RowKey, expanded: bool);

    /// Toggle an ad hoc row (one without a key)
    fn toggle_row(&mut self, index: isize);

    fn group_selector_click(&mut self, index: isize);

    fn open_advanced_filtering(&mut self);

    fn toggle_filter_dropdown(&mut self, column: ColumnId);

    fn show_filter_row(&mut self, column: ColumnId);

    /// Emit the cancelable grid keydown notification
    fn emit_keydown(&mut self, args: &mut GridKeydownArgs);

    /// Activate a row or cell once it is scrolled into view
    fn activate(&mut self, target: NavigationTarget);

    /// Move DOM focus to the table body
    fn focus_body(&mut self);

    /// Ask the grid to re-render
    fn notify_changes(&mut self);
}

/// Everything a navigable grid provides
pub trait GridHost: DataView + ColumnSource + Viewport + EditService + SelectionService + GridCommands {}

impl<T> GridHost for T where T: DataView + ColumnSource + Viewport + EditService + SelectionService + GridCommands {}

/// Row-dimension header containers of a pivot grid
pub trait PivotHost: GridHost {
    /// Number of visible row dimensions
    fn row_dimension_count(&self) -> usize;

    /// Number of header items in a row dimension's scroll container
    fn row_dimension_len(&self, dimension: usize) -> usize;

    /// Scroll offset at which `index` starts in a row dimension
    fn row_dimension_scroll_for_index(&self, dimension: usize, index: usize) -> f64;

    /// Index found at `offset` in a row dimension
    fn row_dimension_index_at_scroll(&self, dimension: usize, offset: f64) -> usize;

    fn row_dimension_index_outside_view(&self, dimension: usize, index: usize) -> bool;

    fn row_dimension_scroll_to(&mut self, dimension: usize, index: usize);
}
