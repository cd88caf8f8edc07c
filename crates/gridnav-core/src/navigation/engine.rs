//! Navigation service implementation

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::classify::{
    find_first_data_row_index, find_last_data_row_index, is_data_row, is_full_width_row,
    is_group_row, keydown_target_type, node_target_type,
};
use super::keys::{self, KeyEvent};
use super::scroll::{AfterScroll, ScrollState};
use super::{
    ActiveNode, ActiveNodeChange, ColumnGroupsCache, KeyboardNavigation, LayoutNode, NavigationSubscriber,
    NextPosition, NodePatch, TargetType,
};
use crate::host::{
    CellRange, DataView, GridHost, GridKeydownArgs, NavigationTarget, PageDirection,
};
use crate::settings::{GridSelectionMode, NavigationSettings};

/// Keyboard navigation for one grid
///
/// Owns the active node and the remembered last active node. The grid is
/// borrowed per call and only ever asked to do things; it never writes the
/// cursor itself.
pub struct NavigationService {
    pub(super) active: Option<ActiveNode>,
    pub(super) last_active: Option<ActiveNode>,
    pub(super) scroll: ScrollState,
    /// Row of the cell being edited when a page scroll started
    pub(super) page_watch: Option<isize>,
    /// Held-down key waiting to be replayed on the next tick
    pub(super) deferred: Option<KeyEvent>,
    pub(super) settings: NavigationSettings,
    subscribers: Arc<RwLock<Vec<Weak<dyn NavigationSubscriber>>>>,
}

impl Default for NavigationService {
    fn default() -> Self {
        Self::new(NavigationSettings::default())
    }
}

impl NavigationService {
    /// Create a service with no active node
    pub fn new(settings: NavigationSettings) -> Self {
        Self {
            active: None,
            last_active: None,
            scroll: ScrollState::Idle,
            page_watch: None,
            deferred: None,
            settings,
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// The live cursor, if focus has entered the grid
    pub fn active_node(&self) -> Option<&ActiveNode> {
        self.active.as_ref()
    }

    /// The cursor remembered when focus last left the body
    pub fn last_active_node(&self) -> Option<&ActiveNode> {
        self.last_active.as_ref()
    }

    /// Whether a scroll started by navigation is still running
    pub fn pending_navigation(&self) -> bool {
        !matches!(self.scroll, ScrollState::Idle)
    }

    pub fn scroll_state(&self) -> &ScrollState {
        &self.scroll
    }

    /// A held-down key is parked for the next tick
    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn NavigationSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    /// Notify all subscribers of an active-node change
    fn notify_subscribers(&self, change: &ActiveNodeChange) {
        let mut subscribers = self.subscribers.write();

        // Remove any dead weak references
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_active_node_change(change);
            }
        }
    }

    /// Merge `patch` into the active node
    ///
    /// Subscribers hear about it only when something actually changed.
    /// Returns whether it did.
    pub fn set_active_node<H: DataView + ?Sized>(&mut self, host: &H, patch: NodePatch) -> bool {
        if !patch.differs_from(self.active.as_ref()) {
            return false;
        }

        let node = self.active.get_or_insert_with(ActiveNode::default);
        node.apply(&patch);
        let change = ActiveNodeChange {
            row: node.row,
            column: node.column,
            level: node.level,
            tag: node_target_type(host, patch.row.unwrap_or(node.row)),
        };

        trace!(?change, "active node changed");
        self.notify_subscribers(&change);
        true
    }

    pub fn is_active_node(&self, row: isize, column: isize) -> bool {
        self.active.as_ref().is_some_and(|node| node.is_at(row, column))
    }

    /// Highest visible column index, -1 without columns
    pub fn last_column_index<H: GridHost + ?Sized>(&self, host: &H) -> isize {
        host.columns()
            .last_column_index()
            .map_or(-1, |index| index as isize)
    }

    /// Handle a keydown on the grid body
    pub fn handle_navigation<H: GridHost + ?Sized>(&mut self, host: &mut H, event: &mut KeyEvent) {
        let key = event.normalized();
        if keys::is_navigation_key(&key) {
            event.stop_propagation();
        }

        let edit = host.edit_state();
        // The editor owns navigation keys while a cell is being edited
        if edit.cell.is_some() && keys::is_navigation_key(&key) {
            return;
        }

        if (event.repeat && keys::is_supported_key(&key)) || (key == "tab" && edit.cell.is_some()) {
            event.prevent_default();
        }

        if event.repeat && self.settings.debounce_key_repeat {
            trace!(%key, "parking repeated key");
            self.deferred = Some(event.clone());
            return;
        }

        self.dispatch_event(host, event);
    }

    /// Replay a parked repeating key; the host calls this on its next tick
    pub fn flush_deferred<H: GridHost + ?Sized>(&mut self, host: &mut H) -> Option<KeyEvent> {
        let mut event = self.deferred.take()?;
        self.dispatch_event(host, &mut event);
        Some(event)
    }

    /// Run a body keydown through the dispatch pipeline
    pub fn dispatch_event<H: GridHost + ?Sized>(&mut self, host: &mut H, event: &mut KeyEvent) {
        let key = event.normalized();
        let edit = host.edit_state();
        let Some(node) = self.active.clone() else {
            return;
        };

        let handled = keys::is_supported_key(&key) || (key == "tab" && edit.cell.is_some());
        if !handled && !edit.row_editing_blocked && !edit.row_in_edit_mode {
            return;
        }

        if keys::is_navigation_key(&key) && self.pending_navigation() {
            debug!(%key, "navigation pending, dropping key");
            event.prevent_default();
            return;
        }

        let target_type = keydown_target_type(host, node.row);
        let cancelled = Self::emit_keydown(host, target_type, node.row, node.column, &key) == Some(true);
        if cancelled && target_type == TargetType::DataCell {
            host.clear_selection();
            host.set_keyboard_selection_active();
            return;
        }

        if event.alt {
            self.handle_alt(host, &key, event);
            return;
        }

        if !keys::is_space_key(&key) {
            host.keyboard_state_on_keydown(&node, event.shift, event.shift && key == "tab");
        }

        let shift = event.shift;
        let ctrl = event.ctrl;
        let position = self.get_next_position(host, node.row, node.column, &key, shift, ctrl, event);
        if keys::is_navigation_key(&key) {
            event.prevent_default();
            if let Some(position) = position {
                self.navigate_in_body(host, position.row_index, position.col_index, true);
            }
        }
    }

    /// Emit the grid keydown for `row`
    ///
    /// `None` when the row is not rendered (nothing to emit against),
    /// otherwise whether a listener cancelled it.
    pub(super) fn emit_keydown<H: GridHost + ?Sized>(
        host: &mut H,
        target_type: TargetType,
        row: isize,
        column: isize,
        key: &str,
    ) -> Option<bool> {
        let rendered = host.rendered_rows().contains(&row)
            || (row == host.view_len() as isize && host.rendered_summary_rows() > 0);
        if !rendered {
            return None;
        }

        let mut args = GridKeydownArgs {
            target_type,
            row,
            column,
            key: key.to_string(),
            cancel: false,
        };
        host.emit_keydown(&mut args);
        Some(args.cancel)
    }

    /// Compute the next cursor position for `key`
    ///
    /// `None` means the key is not a navigation key at all. Some keys
    /// (paging, tab, enter, escape, space) act through the host and return
    /// the position unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn get_next_position<H: GridHost + ?Sized>(
        &mut self,
        host: &mut H,
        row: isize,
        column: isize,
        key: &str,
        shift: bool,
        ctrl: bool,
        event: &mut KeyEvent,
    ) -> Option<NextPosition> {
        // Ctrl jumps only make sense from data and summary rows
        if !is_data_row(host, row, true) && !keys::is_vertical_key(key) && ctrl {
            return Some(NextPosition::new(row, column));
        }

        let mut row_index = row;
        let mut col_index = column;
        match key {
            "pagedown" | "pageup" => {
                event.prevent_default();
                let direction = if key == "pagedown" {
                    PageDirection::Next
                } else {
                    PageDirection::Previous
                };
                host.scroll_page(direction);
                self.page_watch = host.edit_state().cell.map(|cell| cell.row_index);
            }
            "tab" => self.handle_editing(host, shift, event),
            "end" => {
                if ctrl {
                    row_index = find_last_data_row_index(host).unwrap_or(-1);
                }
                col_index = self.last_column_index(host);
            }
            "home" => {
                if ctrl {
                    row_index = find_first_data_row_index(host).unwrap_or(-1);
                }
                col_index = 0;
            }
            "arrowleft" | "left" => {
                col_index = if ctrl { 0 } else { column - 1 };
            }
            "arrowright" | "right" => {
                col_index = if ctrl { self.last_column_index(host) } else { column + 1 };
            }
            "arrowup" | "up" | "arrowdown" | "down" => {
                let blocked = host.options().row_editable && host.edit_state().row_editing_blocked;
                if (ctrl && !is_data_row(host, row, false)) || blocked {
                    return Some(NextPosition::new(row_index, col_index));
                }
                row_index = match (key.contains("up"), ctrl) {
                    (true, true) => find_first_data_row_index(host).unwrap_or(-1),
                    (true, false) => row - 1,
                    (false, true) => find_last_data_row_index(host).unwrap_or(-1),
                    (false, false) => row + 1,
                };
            }
            "enter" | "f2" => {
                if is_data_row(host, row, false) {
                    if let Some(cell) = host.cell_at(row, column).filter(|cell| cell.editable) {
                        host.enter_edit_mode(cell);
                    }
                }
            }
            "escape" | "esc" => {
                if is_data_row(host, row, false) {
                    let edit = host.edit_state();
                    if edit.composing {
                        return None;
                    }
                    if edit.cell_in_edit_mode || edit.row_in_edit_mode {
                        host.end_edit(false);
                        host.focus_body();
                    }
                }
            }
            " " | "spacebar" | "space" => {
                if let Some(handle) = host.row_at(row).filter(|_| host.options().row_selectable) {
                    if is_data_row(host, row, false) {
                        if let Some(row_key) = handle.key.as_ref() {
                            if handle.selected {
                                host.deselect_row(row_key);
                            } else {
                                host.select_row(row_key);
                            }
                        }
                    }
                    if is_group_row(host, row) {
                        host.group_selector_click(row);
                    }
                }
            }
            _ => return None,
        }

        Some(NextPosition::new(row_index, col_index))
    }

    /// Whether the body may move to `row` × `column`
    ///
    /// Lateral moves are only allowed on data and summary rows.
    pub(super) fn is_valid_position<H: GridHost + ?Sized>(&self, host: &H, row: isize, column: isize) -> bool {
        let length = host.total_item_count().unwrap_or_else(|| host.view_len()) as isize;
        if row < 0 || column < 0 || row > length - 1 || column > self.last_column_index(host) {
            return false;
        }
        let same_column = self.active.as_ref().is_some_and(|node| node.column == column);
        same_column || is_data_row(host, row, true)
    }

    /// Move the body cursor, scrolling first when needed
    pub fn navigate_in_body<H: GridHost + ?Sized>(&mut self, host: &mut H, row: isize, column: isize, activate: bool) {
        if !self.is_valid_position(host, row, column) || self.is_active_node(row, column) {
            return;
        }
        debug!(row, column, "navigating in body");
        self.navigate_to(host, row, column, activate);
    }

    /// Commit the cursor on a scrolled-in target and activate it on the host
    pub(super) fn execute_activation<H: GridHost + ?Sized>(&mut self, host: &mut H, row: isize, column: isize) {
        let target_type = node_target_type(&*host, row);

        if is_full_width_row(&*host, row) || column < 0 {
            let mut patch = NodePatch::new().row(row);
            if column >= 0 {
                patch = patch.column(column);
            }
            self.set_active_node(&*host, patch);
            host.activate(NavigationTarget { row, column: None, target_type });
            return;
        }

        let patch = {
            let columns = host.columns();
            match columns.leaf_at(column as usize).and_then(|id| columns.get(id)) {
                Some(leaf) => NodePatch::at(row, column)
                    .level(leaf.level)
                    .mch_cache(Some(ColumnGroupsCache { level: leaf.level, visible_index: column }))
                    .layout(leaf.layout.map(|span| LayoutNode {
                        row_start: span.row_start,
                        col_start: span.col_start,
                        row_end: span.row_end,
                        col_end: span.col_end,
                        column_visible_index: column as usize,
                    })),
                None => NodePatch::at(row, column),
            }
        };
        self.set_active_node(&*host, patch);
        host.activate(NavigationTarget { row, column: Some(column), target_type });
    }

    /// The node to land on when focus enters a region with no usable cursor
    pub(super) fn first_visible_node<H: GridHost + ?Sized>(&self, host: &H, row: Option<isize>) -> ActiveNode {
        let columns = host.columns();
        let column_index = match self.last_active.as_ref() {
            Some(last) => Some(last.column),
            None => {
                let mut indices: Vec<usize> = columns.visible().filter_map(|(_, c)| c.visible_index).collect();
                indices.sort_unstable();
                indices.dedup();
                indices
                    .into_iter()
                    .find(|&index| self.is_column_fully_visible(host, index as isize))
                    .map(|index| index as isize)
            }
        };

        let column = column_index
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| columns.first_at(index))
            .and_then(|id| columns.get(id));

        let row = row.unwrap_or_else(|| {
            let scroll_column = column_index.unwrap_or(0);
            host.rendered_rows()
                .into_iter()
                .find(|&index| !self.should_perform_vertical_scroll(host, index, scroll_column))
                .unwrap_or(0)
        });

        match column {
            Some(column) => {
                let visible_index = column.visible_index.map_or(0, |index| index as isize);
                ActiveNode {
                    row,
                    column: visible_index,
                    level: column.level,
                    mch_cache: Some(ColumnGroupsCache { level: column.level, visible_index }),
                    layout: column.layout.map(|span| LayoutNode {
                        row_start: span.row_start,
                        col_start: span.col_start,
                        row_end: span.row_end,
                        col_end: span.col_end,
                        column_visible_index: visible_index as usize,
                    }),
                }
            }
            None => ActiveNode::new(row, 0),
        }
    }

    /// Focus entered the table body
    pub fn focus_tbody<H: GridHost + ?Sized>(&mut self, host: &mut H) {
        let rows = host.total_item_count().unwrap_or_else(|| host.view_len()) as isize;
        if rows < 1 {
            self.active = None;
            return;
        }

        let in_range = |node: &ActiveNode| node.row >= 0 && node.row < rows;
        if self.active.as_ref().is_some_and(in_range) {
            return;
        }

        let last_in_range = self.last_active.as_ref().map(in_range);
        let should_clear_selection = last_in_range == Some(false);
        let start_row = match (last_in_range, self.last_active.as_ref()) {
            (Some(true), Some(last)) => Some(last.row),
            _ => None,
        };

        let node = self.first_visible_node(host, start_row);
        debug!(row = node.row, column = node.column, "body focused");
        self.set_active_node(&*host, NodePatch::from(&node));

        if should_clear_selection || host.options().cell_selection != GridSelectionMode::Multiple {
            host.clear_cell_selection();
            self.navigate_to(host, node.row, node.column, true);
        } else {
            host.select_range(CellRange {
                row_start: node.row,
                row_end: node.row,
                column_start: node.column,
                column_end: node.column,
            });
            host.notify_changes();
        }
    }

    /// Put the cursor on the first header cell, or the first summary cell
    /// when `header` is false
    pub fn focus_first_cell<H: GridHost + ?Sized>(&mut self, host: &mut H, header: bool) {
        let len = host.view_len() as isize;
        let already_there = self.active.as_ref().is_some_and(|node| {
            node.row == -1 || node.row == len || (!header && !host.has_summarized_columns())
        });
        if (header || len > 0) && already_there {
            return;
        }

        let last_row = self.last_active.as_ref().map(|node| node.row);
        let should_scroll_into_view = if header {
            last_row != Some(-1)
        } else {
            last_row != Some(len)
        };

        let node = self.first_visible_node(host, Some(if header { -1 } else { len }));
        self.set_active_node(&*host, NodePatch::from(&node));
        if should_scroll_into_view {
            self.perform_horizontal_scroll_to_cell(host, node.column, AfterScroll::Nothing);
        }
    }

    /// Focus left the body: remember where the cursor was
    pub fn blur_body(&mut self) {
        if let Some(node) = self.active.take() {
            trace!(row = node.row, column = node.column, "remembering last active node");
            self.last_active = Some(node);
        }
    }

    /// Keydown on the summary row
    pub fn summary_nav<H: GridHost + ?Sized>(&mut self, host: &mut H, event: &mut KeyEvent) {
        if host.has_summarized_columns() {
            let key = event.normalized();
            let row = host.view_len() as isize;
            self.horizontal_nav(host, event, &key, row);
        }
    }
}

impl<H: GridHost + ?Sized> KeyboardNavigation<H> for NavigationService {
    fn handle_navigation(&mut self, host: &mut H, event: &mut KeyEvent) {
        NavigationService::handle_navigation(self, host, event);
    }

    fn focus_tbody(&mut self, host: &mut H) {
        NavigationService::focus_tbody(self, host);
    }
}
