//! In-memory grid host
//!
//! Rows and columns live in plain vectors. The vertical and horizontal
//! scroll containers are simulated from item sizes: a scroll request moves
//! the scroll position immediately and queues a chunk load, which the
//! driver delivers to the navigation service afterwards, like a browser
//! rendering the next frame.

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};
use tracing::{debug, trace};

use gridnav_core::columns::{Column, ColumnArena, ColumnId};
use gridnav_core::host::{
    CellHandle, CellPosition, CellRange, ColumnSource, DataView, EditService, EditState, EditTab,
    GridCommands, GridKeydownArgs, NavigationTarget, PageDirection, PivotHost, RecordKind, RowHandle,
    RowKey, RowKind, SelectionService, SortDirection, Viewport,
};
use gridnav_core::navigation::{ActiveNode, ScrollAxis, TargetType};
use gridnav_core::settings::{GridOptions, NavigationSettings};

use crate::config::{ColumnSpec, GridFixture, RecordSpec, RowDimensionSpec};
use crate::{FixtureError, Result};

/// Everything the grid was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    ScrollVertical(usize),
    ScrollPage(PageDirection),
    ScrollHorizontal(usize),
    EnterEditMode { row: isize, column: isize },
    EndEdit { commit: bool },
    EnterAddRowMode { row: isize, as_child: bool },
    UpdateCell,
    FocusRowEditTab(EditTab),
    SelectRow(String),
    DeselectRow(String),
    SelectColumns { fields: Vec<String>, clear_others: bool },
    DeselectColumns(Vec<String>),
    ClearSelection,
    KeyboardSelectionActive,
    KeyboardState { row: isize, column: isize, shift: bool, shift_tab: bool },
    ClearCellSelection,
    SelectRange(CellRange),
    Sort { field: String, direction: SortDirection },
    GroupBy { field: String, direction: SortDirection },
    ClearGrouping(String),
    SetRowExpansion { key: String, expanded: bool },
    ToggleRow(isize),
    GroupSelectorClick(isize),
    OpenAdvancedFiltering,
    ToggleFilterDropdown(String),
    ShowFilterRow(String),
    SetColumnExpanded { field: String, expanded: bool },
    Keydown { target_type: TargetType, row: isize, column: isize, key: String },
    Activate(NavigationTarget),
    FocusBody,
    NotifyChanges,
    RowDimensionScroll { dimension: usize, index: usize },
}

#[derive(Debug, Clone)]
struct MemoryRecord {
    kind: RecordKind,
    key: Option<RowKey>,
    tree: bool,
    expanded: bool,
    added: bool,
    height: Option<f64>,
}

#[derive(Debug, Clone)]
struct RowDimension {
    len: usize,
    item_height: f64,
    scroll_top: f64,
}

/// A grid held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryGrid {
    columns: ColumnArena,
    widths: AHashMap<ColumnId, f64>,
    records: Vec<MemoryRecord>,
    options: GridOptions,
    navigation: NavigationSettings,

    // vertical container
    row_height: f64,
    container_height: f64,
    scroll_top: f64,
    pinned_top: usize,
    total_item_count: Option<usize>,
    summaries: bool,

    // horizontal container
    column_width: f64,
    display_width: f64,
    scroll_left: f64,

    // services
    edit: EditState,
    update_cell_succeeds: bool,
    row_edit_tabs: usize,
    selected_rows: AHashSet<RowKey>,
    selected_range: Option<CellRange>,
    sorting: AHashMap<String, SortDirection>,
    grouping: Vec<String>,
    cancel_keydown: AHashSet<TargetType>,
    activated: Option<NavigationTarget>,

    row_dimensions: Vec<RowDimension>,
    dimension_height: f64,

    chunk_loads: VecDeque<ScrollAxis>,
    calls: Vec<HostCall>,
}

impl MemoryGrid {
    /// Create a grid over `columns` with one record per kind
    pub fn new(columns: ColumnArena, records: Vec<RecordKind>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(index, kind)| MemoryRecord::new(index, RecordSpec::from(kind)))
            .collect();

        Self {
            columns,
            widths: AHashMap::new(),
            records,
            options: GridOptions::default(),
            navigation: NavigationSettings::default(),
            row_height: 50.0,
            container_height: 0.0,
            scroll_top: 0.0,
            pinned_top: 0,
            total_item_count: None,
            summaries: false,
            column_width: 100.0,
            display_width: 0.0,
            scroll_left: 0.0,
            edit: EditState::default(),
            update_cell_succeeds: true,
            row_edit_tabs: 0,
            selected_rows: AHashSet::new(),
            selected_range: None,
            sorting: AHashMap::new(),
            grouping: Vec::new(),
            cancel_keydown: AHashSet::new(),
            activated: None,
            row_dimensions: Vec::new(),
            dimension_height: 0.0,
            chunk_loads: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    /// A flat grid of data rows over leaf columns `c0`, `c1`, ...
    pub fn flat(rows: usize, columns: usize) -> Self {
        let mut arena = ColumnArena::new();
        for i in 0..columns {
            arena.push(Column::new(format!("c{i}")));
        }
        Self::new(arena, vec![RecordKind::Data; rows])
    }

    /// Build a grid from a fixture
    pub fn from_fixture(fixture: &GridFixture) -> Result<Self> {
        fixture.validate()?;

        let mut arena = ColumnArena::new();
        let mut widths = AHashMap::new();
        for spec in &fixture.columns {
            let id = arena.push(column_from_spec(spec));
            add_children(&mut arena, &mut widths, id, spec)?;
            if let Some(width) = spec.width {
                widths.insert(id, width);
            }
        }

        let mut grid = Self::new(arena, Vec::new());
        grid.widths = widths;
        for (index, entry) in fixture.records.iter().cloned().enumerate() {
            let spec = RecordSpec::from(entry);
            let selected = spec.selected;
            let record = MemoryRecord::new(index, spec);
            if selected {
                if let Some(key) = record.key.clone() {
                    grid.selected_rows.insert(key);
                }
            }
            grid.records.push(record);
        }

        grid.options = fixture.options.clone();
        grid.navigation = fixture.navigation.clone();
        grid.row_height = fixture.viewport.row_height;
        grid.column_width = fixture.viewport.column_width;
        grid.container_height = fixture.viewport.height;
        grid.display_width = fixture.viewport.width;
        grid.pinned_top = fixture.pinned_top.min(grid.records.len());
        grid.total_item_count = fixture.total_item_count;
        grid.summaries = fixture.summaries;
        grid.set_row_dimensions(&fixture.row_dimensions, fixture.viewport.height);

        debug!(
            rows = grid.records.len(),
            columns = grid.columns.len(),
            "grid built from fixture"
        );
        Ok(grid)
    }

    /// Settings the fixture asked the navigation service to use
    pub fn navigation_settings(&self) -> &NavigationSettings {
        &self.navigation
    }

    pub fn with_options(mut self, options: GridOptions) -> Self {
        self.options = options;
        self
    }

    /// Body viewport size; 0 disables scrolling in that direction
    pub fn with_viewport(mut self, height: f64, width: f64) -> Self {
        self.container_height = height;
        self.display_width = width;
        self
    }

    pub fn with_row_height(mut self, height: f64) -> Self {
        self.row_height = height;
        self
    }

    pub fn with_column_width(mut self, width: f64) -> Self {
        self.column_width = width;
        self
    }

    pub fn with_pinned_top(mut self, rows: usize) -> Self {
        self.pinned_top = rows.min(self.records.len());
        self
    }

    /// Treat the records as the materialized window of a remote source
    pub fn with_remote_total(mut self, total: usize) -> Self {
        self.total_item_count = Some(total);
        self
    }

    pub fn with_summaries(mut self) -> Self {
        self.summaries = true;
        self
    }

    /// Pivot row dimensions, all scrolling in containers of `height`
    pub fn with_row_dimensions(mut self, dimensions: &[RowDimensionSpec], height: f64) -> Self {
        self.set_row_dimensions(dimensions, height);
        self
    }

    fn set_row_dimensions(&mut self, dimensions: &[RowDimensionSpec], height: f64) {
        self.row_dimensions = dimensions
            .iter()
            .map(|spec| RowDimension {
                len: spec.len,
                item_height: spec.item_height,
                scroll_top: 0.0,
            })
            .collect();
        self.dimension_height = height;
    }

    /// Set a record's key and tree flag
    pub fn set_record(&mut self, index: usize, key: Option<&str>, tree: bool) {
        if let Some(record) = self.records.get_mut(index) {
            record.key = key.map(RowKey::from);
            record.tree = tree;
        }
    }

    pub fn set_record_height(&mut self, index: usize, height: f64) {
        if let Some(record) = self.records.get_mut(index) {
            record.height = Some(height);
        }
    }

    pub fn set_record_expanded(&mut self, index: usize, expanded: bool) {
        if let Some(record) = self.records.get_mut(index) {
            record.expanded = expanded;
        }
    }

    pub fn set_record_added(&mut self, index: usize, added: bool) {
        if let Some(record) = self.records.get_mut(index) {
            record.added = added;
        }
    }

    pub fn set_edit_state(&mut self, edit: EditState) {
        self.edit = edit;
    }

    /// What `update_cell` reports; `false` simulates a cancelling validator
    pub fn set_update_cell_result(&mut self, succeeds: bool) {
        self.update_cell_succeeds = succeeds;
    }

    pub fn set_row_edit_tabs(&mut self, count: usize) {
        self.row_edit_tabs = count;
    }

    /// Cancel every keydown notification for rows of `target_type`
    pub fn cancel_keydown_for(&mut self, target_type: TargetType) {
        self.cancel_keydown.insert(target_type);
    }

    pub fn columns_mut(&mut self) -> &mut ColumnArena {
        &mut self.columns
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }

    /// The last row or cell activated
    pub fn activated(&self) -> Option<NavigationTarget> {
        self.activated
    }

    pub fn selected_range(&self) -> Option<CellRange> {
        self.selected_range
    }

    pub fn is_row_selected(&self, key: &str) -> bool {
        self.selected_rows.contains(&RowKey::from(key))
    }

    pub fn is_record_expanded(&self, index: usize) -> bool {
        self.records.get(index).is_some_and(|record| record.expanded)
    }

    pub fn grouping(&self) -> &[String] {
        &self.grouping
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    /// Set the vertical scroll position without queueing a chunk load
    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        self.scroll_top = scroll_top.clamp(0.0, self.max_scroll_top());
    }

    /// Set the horizontal scroll position without queueing a chunk load
    pub fn set_scroll_left(&mut self, scroll_left: f64) {
        self.scroll_left = scroll_left.clamp(0.0, self.max_scroll_left());
    }

    /// Whether a scroll is waiting for its chunk to render
    pub fn has_pending_chunk_load(&self) -> bool {
        !self.chunk_loads.is_empty()
    }

    /// Next chunk load to deliver to the navigation service
    pub fn take_chunk_load(&mut self) -> Option<ScrollAxis> {
        self.chunk_loads.pop_front()
    }

    pub fn row_dimension_scroll_top(&self, dimension: usize) -> Option<f64> {
        self.row_dimensions.get(dimension).map(|d| d.scroll_top)
    }

    fn record(&self, index: isize) -> Option<&MemoryRecord> {
        usize::try_from(index).ok().and_then(|index| self.records.get(index))
    }

    fn log(&mut self, call: HostCall) {
        trace!(?call, "host call");
        self.calls.push(call);
    }

    // Vertical geometry. Scroll-container index `k` is record `k + pinned_top`.

    fn scroll_len(&self) -> usize {
        self.records.len().saturating_sub(self.pinned_top)
    }

    fn scroll_item_height(&self, index: usize) -> f64 {
        self.records
            .get(index + self.pinned_top)
            .and_then(|record| record.height)
            .unwrap_or(self.row_height)
    }

    fn scroll_item_top(&self, index: usize) -> f64 {
        (0..index.min(self.scroll_len())).map(|k| self.scroll_item_height(k)).sum()
    }

    fn max_scroll_top(&self) -> f64 {
        (self.scroll_item_top(self.scroll_len()) - self.container_height).max(0.0)
    }

    fn rendered_scroll_items(&self) -> Vec<usize> {
        let all = 0..self.scroll_len();
        if self.container_height <= 0.0 {
            return all.collect();
        }
        let bottom = self.scroll_top + self.container_height;
        all.filter(|&k| {
            let top = self.scroll_item_top(k);
            top < bottom && top + self.scroll_item_height(k) > self.scroll_top
        })
        .collect()
    }

    fn chunk_top(&self) -> f64 {
        self.rendered_scroll_items()
            .first()
            .map_or(0.0, |&k| self.scroll_item_top(k))
    }

    // Horizontal geometry. Items are the unpinned leaves, or the unpinned
    // top-level columns while only a grouped header is rendered.

    fn header_only(&self) -> bool {
        self.rendered_rows().is_empty() && self.rendered_summary_rows() == 0 && self.columns.has_column_groups()
    }

    fn leaf_width(&self, id: ColumnId) -> f64 {
        self.widths.get(&id).copied().unwrap_or(self.column_width)
    }

    fn horizontal_items(&self) -> Vec<f64> {
        let mut leaves: Vec<(usize, ColumnId)> = self
            .columns
            .visible()
            .filter(|(_, column)| !column.is_group() && !column.pinned)
            .filter_map(|(id, column)| column.visible_index.map(|index| (index, id)))
            .collect();
        leaves.sort_unstable();

        if !self.header_only() {
            return leaves.into_iter().map(|(_, id)| self.leaf_width(id)).collect();
        }

        let mut roots: Vec<(usize, ColumnId)> = Vec::new();
        for (index, id) in leaves {
            let Some(root) = self.columns.top_level(id) else {
                continue;
            };
            if !roots.iter().any(|&(_, r)| r == root) {
                roots.push((index, root));
            }
        }
        roots
            .into_iter()
            .map(|(_, root)| {
                self.columns
                    .visible_leaves(root)
                    .into_iter()
                    .map(|id| self.leaf_width(id))
                    .sum()
            })
            .collect()
    }

    fn total_width(&self) -> f64 {
        self.horizontal_items().iter().sum()
    }

    fn max_scroll_left(&self) -> f64 {
        (self.total_width() - self.display_width).max(0.0)
    }
}

impl MemoryRecord {
    fn new(index: usize, spec: RecordSpec) -> Self {
        let key = match (spec.key, spec.kind) {
            (Some(key), _) => Some(RowKey(key)),
            (None, RecordKind::Data) => Some(RowKey(format!("row-{index}"))),
            (None, _) => None,
        };
        Self {
            kind: spec.kind,
            key,
            tree: spec.tree,
            expanded: spec.expanded,
            added: spec.added,
            height: spec.height,
        }
    }
}

fn column_from_spec(spec: &ColumnSpec) -> Column {
    let mut column = Column::new(spec.field.clone())
        .pinned(spec.pinned)
        .hidden(spec.hidden)
        .editable(spec.editable)
        .collapsible(spec.collapsible);
    column.selectable = spec.selectable;
    column.sortable = spec.sortable;
    column.groupable = spec.groupable;
    column.filterable = spec.filterable;
    column.expanded = spec.expanded;
    column.layout = spec.layout;
    column
}

fn add_children(
    arena: &mut ColumnArena,
    widths: &mut AHashMap<ColumnId, f64>,
    parent: ColumnId,
    spec: &ColumnSpec,
) -> Result<()> {
    if spec.width.is_some() && !spec.children.is_empty() {
        return Err(FixtureError::InvalidColumn(format!(
            "group '{}' cannot have a width",
            spec.field
        )));
    }
    for child in &spec.children {
        let id = arena
            .push_child(parent, column_from_spec(child))
            .ok_or_else(|| FixtureError::InvalidColumn(format!("'{}' has no parent", child.field)))?;
        if let Some(width) = child.width {
            widths.insert(id, width);
        }
        add_children(arena, widths, id, child)?;
    }
    Ok(())
}

impl DataView for MemoryGrid {
    fn view_len(&self) -> usize {
        self.records.len()
    }

    fn record_kind(&self, index: usize) -> Option<RecordKind> {
        self.records.get(index).map(|record| record.kind)
    }

    fn total_item_count(&self) -> Option<usize> {
        self.total_item_count
    }

    fn is_remote(&self) -> bool {
        self.total_item_count.is_some()
    }

    fn is_record_pinned_by_view_index(&self, index: isize) -> bool {
        usize::try_from(index).is_ok_and(|index| index < self.pinned_top)
    }

    fn pinned_top_count(&self) -> usize {
        self.pinned_top
    }

    fn rendered_rows(&self) -> Vec<isize> {
        let pinned = (0..self.pinned_top).map(|index| index as isize);
        let scrolled = self
            .rendered_scroll_items()
            .into_iter()
            .map(|k| (k + self.pinned_top) as isize);
        pinned.chain(scrolled).collect()
    }

    fn rendered_summary_rows(&self) -> usize {
        usize::from(self.summaries)
    }

    fn has_summarized_columns(&self) -> bool {
        self.summaries
    }

    fn row_at(&self, index: isize) -> Option<RowHandle> {
        let record = self.record(index)?;
        let kind = match record.kind {
            RecordKind::Data | RecordKind::ChildGrid if record.tree => RowKind::Tree,
            RecordKind::Data | RecordKind::ChildGrid => RowKind::Flat,
            RecordKind::GroupBy => RowKind::GroupBy,
            RecordKind::Detail => RowKind::Detail,
            RecordKind::Summary => return None,
        };
        Some(RowHandle {
            index,
            kind,
            key: record.key.clone(),
            selected: record.key.as_ref().is_some_and(|key| self.selected_rows.contains(key)),
            expanded: record.expanded,
            added: record.added,
        })
    }

    fn cell_at(&self, row: isize, column: isize) -> Option<CellHandle> {
        if self.record(row)?.kind != RecordKind::Data {
            return None;
        }
        let leaf = self.columns.leaf_at(usize::try_from(column).ok()?)?;
        Some(CellHandle {
            row,
            visible_column_index: column,
            editable: self.columns.get(leaf)?.editable,
        })
    }
}

impl ColumnSource for MemoryGrid {
    fn columns(&self) -> &ColumnArena {
        &self.columns
    }

    fn set_column_expanded(&mut self, column: ColumnId, expanded: bool) {
        let Some(target) = self.columns.get_mut(column) else {
            return;
        };
        target.expanded = expanded;
        let field = target.field.clone();
        self.log(HostCall::SetColumnExpanded { field, expanded });
    }
}

impl Viewport for MemoryGrid {
    fn row_offset_top(&self, index: isize) -> Option<f64> {
        if self.is_record_pinned_by_view_index(index) {
            return Some(0.0);
        }
        let k = usize::try_from(index).ok()?.checked_sub(self.pinned_top)?;
        if !self.rendered_scroll_items().contains(&k) {
            return None;
        }
        Some(self.scroll_item_top(k) - self.chunk_top())
    }

    fn row_size_at(&self, index: usize) -> f64 {
        self.scroll_item_height(index)
    }

    fn container_top_offset(&self) -> f64 {
        self.chunk_top() - self.scroll_top
    }

    fn container_height(&self) -> f64 {
        self.container_height
    }

    fn scroll_vertical_to(&mut self, index: usize) {
        self.scroll_top = self.scroll_item_top(index).min(self.max_scroll_top());
        self.chunk_loads.push_back(ScrollAxis::Vertical);
        self.log(HostCall::ScrollVertical(index));
    }

    fn scroll_page(&mut self, direction: PageDirection) {
        let delta = match direction {
            PageDirection::Next => self.container_height,
            PageDirection::Previous => -self.container_height,
        };
        self.scroll_top = (self.scroll_top + delta).clamp(0.0, self.max_scroll_top());
        self.chunk_loads.push_back(ScrollAxis::Vertical);
        self.log(HostCall::ScrollPage(direction));
    }

    fn column_scroll_left(&self, index: usize) -> f64 {
        self.horizontal_items().iter().take(index).sum()
    }

    fn display_container_width(&self) -> f64 {
        self.display_width
    }

    fn display_container_scroll_left(&self) -> f64 {
        self.scroll_left
    }

    fn horizontal_client_width(&self) -> f64 {
        if self.display_width > 0.0 && self.total_width() > self.display_width {
            self.display_width
        } else {
            0.0
        }
    }

    fn scroll_horizontal_to(&mut self, index: usize) {
        self.scroll_left = self.column_scroll_left(index).min(self.max_scroll_left());
        self.chunk_loads.push_back(ScrollAxis::Horizontal);
        self.log(HostCall::ScrollHorizontal(index));
    }
}

impl MemoryGrid {
    fn editable_columns(&self, editable_only: bool) -> Vec<isize> {
        let mut indices: Vec<isize> = self
            .columns
            .visible()
            .filter(|(_, column)| !column.is_group() && (!editable_only || column.editable))
            .filter_map(|(_, column)| column.visible_index.map(|index| index as isize))
            .collect();
        indices.sort_unstable();
        indices
    }

    fn is_data(&self, row: isize) -> bool {
        self.record(row).is_some_and(|record| record.kind == RecordKind::Data)
    }
}

impl EditService for MemoryGrid {
    fn edit_state(&self) -> EditState {
        self.edit
    }

    fn enter_edit_mode(&mut self, cell: CellHandle) {
        self.edit.cell = Some(CellPosition {
            row_index: cell.row,
            visible_column_index: cell.visible_column_index,
        });
        self.edit.cell_in_edit_mode = true;
        self.edit.row_in_edit_mode = self.options.row_editable;
        self.log(HostCall::EnterEditMode {
            row: cell.row,
            column: cell.visible_column_index,
        });
    }

    fn end_edit(&mut self, commit: bool) {
        self.edit = EditState::default();
        self.log(HostCall::EndEdit { commit });
    }

    fn enter_add_row_mode(&mut self, row: &RowHandle, as_child: bool) {
        self.log(HostCall::EnterAddRowMode { row: row.index, as_child });
    }

    fn update_cell(&mut self) -> bool {
        self.log(HostCall::UpdateCell);
        self.update_cell_succeeds
    }

    fn next_cell(&self, row: isize, column: isize, editable_only: bool) -> CellPosition {
        let columns = self.editable_columns(editable_only);
        let same_row = columns.iter().copied().find(|&c| c > column);
        let position = match (same_row, columns.first()) {
            (Some(c), _) => Some((row, c)),
            (None, Some(&first)) => ((row + 1)..self.records.len() as isize)
                .find(|&r| self.is_data(r))
                .map(|r| (r, first)),
            (None, None) => None,
        };
        let (row_index, visible_column_index) = position.unwrap_or((row, column));
        CellPosition { row_index, visible_column_index }
    }

    fn previous_cell(&self, row: isize, column: isize, editable_only: bool) -> CellPosition {
        let columns = self.editable_columns(editable_only);
        let same_row = columns.iter().rev().copied().find(|&c| c < column);
        let position = match (same_row, columns.last()) {
            (Some(c), _) => Some((row, c)),
            (None, Some(&last)) => (0..row).rev().find(|&r| self.is_data(r)).map(|r| (r, last)),
            (None, None) => None,
        };
        let (row_index, visible_column_index) = position.unwrap_or((row, column));
        CellPosition { row_index, visible_column_index }
    }

    fn first_editable_column_index(&self) -> isize {
        self.editable_columns(true).first().copied().unwrap_or(-1)
    }

    fn last_editable_column_index(&self) -> isize {
        self.editable_columns(true).last().copied().unwrap_or(-1)
    }

    fn row_edit_tab_count(&self) -> usize {
        self.row_edit_tabs
    }

    fn focus_row_edit_tab(&mut self, tab: EditTab) {
        self.log(HostCall::FocusRowEditTab(tab));
    }
}

impl SelectionService for MemoryGrid {
    fn select_row(&mut self, key: &RowKey) {
        self.selected_rows.insert(key.clone());
        self.log(HostCall::SelectRow(key.0.clone()));
    }

    fn deselect_row(&mut self, key: &RowKey) {
        self.selected_rows.remove(key);
        self.log(HostCall::DeselectRow(key.0.clone()));
    }

    fn select_columns(&mut self, fields: &[String], clear_others: bool) {
        let ids: Vec<ColumnId> = (0..self.columns.len()).collect();
        for id in ids {
            if let Some(column) = self.columns.get_mut(id) {
                if fields.contains(&column.field) {
                    column.selected = true;
                } else if clear_others {
                    column.selected = false;
                }
            }
        }
        self.log(HostCall::SelectColumns {
            fields: fields.to_vec(),
            clear_others,
        });
    }

    fn deselect_columns(&mut self, fields: &[String]) {
        for field in fields {
            if let Some(column) = self.columns.by_field(field).and_then(|id| self.columns.get_mut(id)) {
                column.selected = false;
            }
        }
        self.log(HostCall::DeselectColumns(fields.to_vec()));
    }

    fn clear_selection(&mut self) {
        self.selected_rows.clear();
        self.selected_range = None;
        self.log(HostCall::ClearSelection);
    }

    fn set_keyboard_selection_active(&mut self) {
        self.log(HostCall::KeyboardSelectionActive);
    }

    fn keyboard_state_on_keydown(&mut self, node: &ActiveNode, shift: bool, shift_tab: bool) {
        self.log(HostCall::KeyboardState {
            row: node.row,
            column: node.column,
            shift,
            shift_tab,
        });
    }

    fn clear_cell_selection(&mut self) {
        self.selected_range = None;
        self.log(HostCall::ClearCellSelection);
    }

    fn select_range(&mut self, range: CellRange) {
        self.selected_range = Some(range);
        self.log(HostCall::SelectRange(range));
    }
}

impl GridCommands for MemoryGrid {
    fn options(&self) -> &GridOptions {
        &self.options
    }

    fn sort_direction(&self, field: &str) -> Option<SortDirection> {
        self.sorting.get(field).copied()
    }

    fn sort(&mut self, field: &str, direction: SortDirection) {
        match direction {
            SortDirection::None => self.sorting.remove(field),
            _ => self.sorting.insert(field.to_string(), direction),
        };
        self.log(HostCall::Sort {
            field: field.to_string(),
            direction,
        });
    }

    fn group_by(&mut self, field: &str, direction: SortDirection) {
        if !self.grouping.iter().any(|f| f == field) {
            self.grouping.push(field.to_string());
        }
        self.sorting.insert(field.to_string(), direction);
        if self.options.hide_grouped_columns {
            if let Some(column) = self.columns.by_field(field).and_then(|id| self.columns.get_mut(id)) {
                column.hidden = true;
            }
            self.columns.reindex();
        }
        self.log(HostCall::GroupBy {
            field: field.to_string(),
            direction,
        });
    }

    fn clear_grouping(&mut self, field: &str) {
        self.grouping.retain(|f| f != field);
        if self.options.hide_grouped_columns {
            if let Some(column) = self.columns.by_field(field).and_then(|id| self.columns.get_mut(id)) {
                column.hidden = false;
            }
            self.columns.reindex();
        }
        self.log(HostCall::ClearGrouping(field.to_string()));
    }

    fn set_row_expansion_state(&mut self, key: &RowKey, expanded: bool) {
        if let Some(record) = self.records.iter_mut().find(|r| r.key.as_ref() == Some(key)) {
            record.expanded = expanded;
        }
        self.log(HostCall::SetRowExpansion {
            key: key.0.clone(),
            expanded,
        });
    }

    fn toggle_row(&mut self, index: isize) {
        if let Some(record) = usize::try_from(index).ok().and_then(|i| self.records.get_mut(i)) {
            record.expanded = !record.expanded;
        }
        self.log(HostCall::ToggleRow(index));
    }

    fn group_selector_click(&mut self, index: isize) {
        self.log(HostCall::GroupSelectorClick(index));
    }

    fn open_advanced_filtering(&mut self) {
        self.log(HostCall::OpenAdvancedFiltering);
    }

    fn toggle_filter_dropdown(&mut self, column: ColumnId) {
        let field = self.columns.get(column).map(|c| c.field.clone()).unwrap_or_default();
        self.log(HostCall::ToggleFilterDropdown(field));
    }

    fn show_filter_row(&mut self, column: ColumnId) {
        let field = self.columns.get(column).map(|c| c.field.clone()).unwrap_or_default();
        self.log(HostCall::ShowFilterRow(field));
    }

    fn emit_keydown(&mut self, args: &mut GridKeydownArgs) {
        if self.cancel_keydown.contains(&args.target_type) {
            args.cancel = true;
        }
        self.log(HostCall::Keydown {
            target_type: args.target_type,
            row: args.row,
            column: args.column,
            key: args.key.clone(),
        });
    }

    fn activate(&mut self, target: NavigationTarget) {
        self.activated = Some(target);
        self.log(HostCall::Activate(target));
    }

    fn focus_body(&mut self) {
        self.log(HostCall::FocusBody);
    }

    fn notify_changes(&mut self) {
        self.log(HostCall::NotifyChanges);
    }
}

impl PivotHost for MemoryGrid {
    fn row_dimension_count(&self) -> usize {
        self.row_dimensions.len()
    }

    fn row_dimension_len(&self, dimension: usize) -> usize {
        self.row_dimensions.get(dimension).map_or(0, |d| d.len)
    }

    fn row_dimension_scroll_for_index(&self, dimension: usize, index: usize) -> f64 {
        self.row_dimensions
            .get(dimension)
            .map_or(0.0, |d| index as f64 * d.item_height)
    }

    fn row_dimension_index_at_scroll(&self, dimension: usize, offset: f64) -> usize {
        let Some(d) = self.row_dimensions.get(dimension) else {
            return 0;
        };
        if d.len == 0 || d.item_height <= 0.0 {
            return 0;
        }
        ((offset / d.item_height).floor().max(0.0) as usize).min(d.len - 1)
    }

    fn row_dimension_index_outside_view(&self, dimension: usize, index: usize) -> bool {
        let Some(d) = self.row_dimensions.get(dimension) else {
            return false;
        };
        if self.dimension_height <= 0.0 {
            return false;
        }
        let top = index as f64 * d.item_height;
        top < d.scroll_top || top + d.item_height > d.scroll_top + self.dimension_height
    }

    fn row_dimension_scroll_to(&mut self, dimension: usize, index: usize) {
        let height = self.dimension_height;
        let Some(d) = self.row_dimensions.get_mut(dimension) else {
            return;
        };
        let max = (d.len as f64 * d.item_height - height).max(0.0);
        d.scroll_top = (index as f64 * d.item_height).min(max);
        self.log(HostCall::RowDimensionScroll { dimension, index });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_window_follows_scroll() {
        let mut grid = MemoryGrid::flat(10, 2).with_viewport(120.0, 0.0);
        assert_eq!(grid.rendered_rows(), vec![0, 1, 2]);

        grid.set_scroll_top(75.0);
        assert_eq!(grid.rendered_rows(), vec![1, 2, 3]);
        assert_eq!(grid.container_top_offset(), -25.0);
        assert_eq!(grid.row_offset_top(2), Some(50.0));
        assert_eq!(grid.row_offset_top(7), None);
    }

    #[test]
    fn test_pinned_rows_always_rendered() {
        let mut grid = MemoryGrid::flat(10, 2).with_viewport(100.0, 0.0).with_pinned_top(1);
        grid.set_scroll_top(200.0);
        let rendered = grid.rendered_rows();
        assert_eq!(rendered.first(), Some(&0));
        assert!(rendered.contains(&5));
        assert!(grid.is_record_pinned_by_view_index(0));
    }

    #[test]
    fn test_scroll_requests_queue_chunk_loads() {
        let mut grid = MemoryGrid::flat(10, 6).with_viewport(100.0, 250.0);
        grid.scroll_vertical_to(4);
        grid.scroll_horizontal_to(2);
        assert_eq!(grid.scroll_top(), 200.0);
        assert_eq!(grid.scroll_left(), 200.0);
        assert_eq!(grid.take_chunk_load(), Some(ScrollAxis::Vertical));
        assert_eq!(grid.take_chunk_load(), Some(ScrollAxis::Horizontal));
        assert_eq!(grid.take_chunk_load(), None);
    }

    #[test]
    fn test_scrolling_clamps_at_the_end() {
        let mut grid = MemoryGrid::flat(5, 2).with_viewport(240.0, 0.0);
        grid.scroll_vertical_to(4);
        assert_eq!(grid.scroll_top(), 10.0);
    }

    #[test]
    fn test_horizontal_scroll_only_when_overflowing() {
        let grid = MemoryGrid::flat(3, 2).with_viewport(0.0, 500.0);
        assert_eq!(grid.horizontal_client_width(), 0.0);

        let grid = MemoryGrid::flat(3, 8).with_viewport(0.0, 500.0);
        assert_eq!(grid.horizontal_client_width(), 500.0);
        assert_eq!(grid.column_scroll_left(3), 300.0);
    }

    #[test]
    fn test_neighbour_cells_skip_read_only_columns() {
        let mut grid = MemoryGrid::flat(3, 4);
        if let Some(column) = grid.columns_mut().get_mut(2) {
            column.editable = false;
        }

        let next = grid.next_cell(0, 1, true);
        assert_eq!((next.row_index, next.visible_column_index), (0, 3));
        let wrapped = grid.next_cell(0, 3, true);
        assert_eq!((wrapped.row_index, wrapped.visible_column_index), (1, 0));
        let stuck = grid.next_cell(2, 3, true);
        assert_eq!((stuck.row_index, stuck.visible_column_index), (2, 3));
        let back = grid.previous_cell(1, 0, true);
        assert_eq!((back.row_index, back.visible_column_index), (0, 3));
        assert_eq!(grid.last_editable_column_index(), 3);
    }

    #[test]
    fn test_row_handles() {
        let mut grid = MemoryGrid::new(
            ColumnArena::new(),
            vec![RecordKind::GroupBy, RecordKind::Data, RecordKind::Summary],
        );
        grid.set_record(1, Some("a"), true);

        let group = grid.row_at(0).unwrap();
        assert_eq!(group.kind, RowKind::GroupBy);
        assert!(group.key.is_none());

        let tree = grid.row_at(1).unwrap();
        assert_eq!(tree.kind, RowKind::Tree);
        assert_eq!(tree.key, Some(RowKey::from("a")));

        assert!(grid.row_at(2).is_none());
    }

    #[test]
    fn test_fixture_builds_widths_and_records() {
        let fixture = GridFixture::from_json(
            r#"{
                "columns": [
                    {"field": "id", "width": 40},
                    {"field": "g", "children": [{"field": "a", "width": 60}, {"field": "b"}]}
                ],
                "records": ["data", {"kind": "data", "key": "x", "selected": true}],
                "viewport": {"width": 150}
            }"#,
        )
        .unwrap();
        let grid = MemoryGrid::from_fixture(&fixture).unwrap();

        assert_eq!(grid.column_scroll_left(1), 40.0);
        assert_eq!(grid.column_scroll_left(3), 200.0);
        assert_eq!(grid.horizontal_client_width(), 150.0);
        assert!(grid.is_row_selected("x"));
        assert!(!grid.is_row_selected("row-0"));
    }

    #[test]
    fn test_group_width_rejected() {
        let mut fixture = GridFixture::flat(1, 1);
        let mut group = ColumnSpec::group("g", vec![ColumnSpec::leaf("a")]);
        group.width = Some(10.0);
        fixture.columns.push(group);
        assert!(matches!(
            MemoryGrid::from_fixture(&fixture),
            Err(FixtureError::InvalidColumn(_))
        ));
    }
}
