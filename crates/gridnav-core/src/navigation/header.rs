//! Header row navigation
//!
//! Flat headers and the summary row move along one row. With column groups
//! the header is a tree: the cursor also moves between levels and
//! remembers, in `mch_cache`, which leaf position and level it came from so
//! that going down and back up lands where the user expects.

use tracing::{debug, trace};

use super::engine::NavigationService;
use super::keys::{self, KeyEvent};
use super::scroll::AfterScroll;
use super::{ColumnGroupsCache, NodePatch, TargetType};
use crate::columns::ColumnId;
use crate::host::{GridHost, SortDirection};
use crate::settings::{FilterMode, GridSelectionMode};

impl NavigationService {
    /// Keydown on the header row
    pub fn header_navigation<H: GridHost + ?Sized>(&mut self, host: &mut H, event: &mut KeyEvent) {
        let key = event.normalized();
        if !keys::is_header_key(&key) {
            return;
        }
        event.prevent_default();

        let Some(active) = self.active.clone() else {
            return;
        };
        let (ctrl, shift, alt) = (event.ctrl, event.shift, event.alt);

        let current = usize::try_from(active.column)
            .ok()
            .and_then(|index| host.columns().at_level(index, active.level));
        if let Some(column) = current {
            self.perform_header_key_combination(host, column, &key, shift, ctrl, alt);
        }

        if shift || alt || (ctrl && keys::is_vertical_key(&key)) {
            return;
        }

        if host.columns().has_column_groups() {
            self.handle_mc_header_nav(host, &key, ctrl);
        } else {
            self.horizontal_nav(host, event, &key, -1);
        }
    }

    /// Move along the header (`row` -1) or the summary row
    pub(super) fn horizontal_nav<H: GridHost + ?Sized>(
        &mut self,
        host: &mut H,
        event: &mut KeyEvent,
        key: &str,
        row: isize,
    ) {
        if !keys::is_horizontal_nav_key(key) {
            return;
        }
        event.prevent_default();

        let Some(mut column) = self.active.as_ref().map(|node| node.column) else {
            return;
        };

        if row > 0 && Self::emit_keydown(host, TargetType::SummaryCell, row, column, key) == Some(true) {
            trace!(row, "summary keydown cancelled");
            return;
        }

        let ctrl = event.ctrl;
        let last = self.last_column_index(&*host);
        if (key.contains("left") || key == "home") && column > 0 {
            column = if ctrl || key == "home" { 0 } else { column - 1 };
        }
        if (key.contains("right") || key == "end") && column < last {
            column = if ctrl || key == "end" { last } else { column + 1 };
        }

        let mut patch = NodePatch::at(row, column);
        let columns = host.columns();
        if let Some(leaf) = usize::try_from(column)
            .ok()
            .and_then(|index| columns.leaf_at(index))
            .and_then(|id| columns.get(id))
        {
            patch = patch.mch_cache(Some(ColumnGroupsCache {
                level: leaf.level,
                visible_index: column,
            }));
        }

        self.set_active_node(&*host, patch);
        self.perform_horizontal_scroll_to_cell(host, column, AfterScroll::Nothing);
    }

    /// Header cell on `level` (or the nearest level above) over the leaf at
    /// `visible_index`
    pub fn next_column_mch<H: GridHost + ?Sized>(
        &self,
        host: &H,
        visible_index: isize,
        level: usize,
    ) -> Option<ColumnId> {
        let columns = host.columns();
        let mut id = columns.leaf_at(usize::try_from(visible_index).ok()?)?;
        loop {
            let column = columns.get(id)?;
            match column.parent {
                Some(parent) if column.level > level => id = parent,
                _ => return Some(id),
            }
        }
    }

    /// Move through a multi-level header
    pub fn handle_mc_header_nav<H: GridHost + ?Sized>(&mut self, host: &mut H, key: &str, ctrl: bool) {
        let Some(active) = self.active.clone() else {
            return;
        };
        let mut cache = active.mch_cache.unwrap_or(ColumnGroupsCache {
            level: active.level,
            visible_index: active.column,
        });

        let columns = host.columns();
        let Some(active_id) = usize::try_from(active.column)
            .ok()
            .and_then(|index| columns.at_level(index, active.level))
        else {
            return;
        };
        let Some(active_column) = columns.get(active_id) else {
            return;
        };
        let active_index = active_column.visible_index.map_or(0, |index| index as isize);
        let last_group_index = columns
            .visible()
            .filter(|(_, column)| column.level <= active.level)
            .filter_map(|(_, column)| column.visible_index)
            .max()
            .map_or(0, |index| index as isize);

        let mut next = active_id;

        if (key.contains("left") || key == "home") && active.column > 0 {
            let index = if ctrl || key == "home" { 0 } else { active.column - 1 };
            if let Some(id) = self.next_column_mch(&*host, index, cache.level) {
                next = id;
                cache.visible_index = visible_index_of(host, id);
            }
        }

        if (key.contains("right") || key == "end") && active_index < last_group_index {
            let target = if ctrl || key == "end" {
                self.last_column_index(&*host)
            } else if active_column.is_group() {
                columns
                    .visible_leaves(active_id)
                    .into_iter()
                    .filter_map(|id| columns.get(id).and_then(|c| c.visible_index))
                    .max()
                    .map_or(active_index, |index| index as isize)
                    + 1
            } else {
                active_index + 1
            };
            if let Some(id) = self.next_column_mch(&*host, target, cache.level) {
                next = id;
                cache.visible_index = visible_index_of(host, id);
            }
        }

        if !ctrl && key.contains("up") && active.level > 0 {
            if let Some(parent) = active_column.parent {
                next = parent;
                cache.level = columns.get(parent).map_or(0, |column| column.level);
            }
        }

        if !ctrl && key.contains("down") && active_column.is_group() {
            let children: Vec<(ColumnId, isize)> = active_column
                .children
                .iter()
                .filter_map(|&id| {
                    columns
                        .get(id)
                        .and_then(|c| c.visible_index)
                        .map(|index| (id, index as isize))
                })
                .collect();

            let exact = children.iter().find(|(_, index)| *index == cache.visible_index);
            let before = children
                .iter()
                .filter(|(_, index)| *index < cache.visible_index)
                .max_by_key(|(_, index)| *index);

            match exact.or(before) {
                Some(&(id, _)) => {
                    next = id;
                    cache.level = columns.get(id).map_or(0, |column| column.level);
                }
                None => debug!(visible_index = cache.visible_index, "no child header under the cached position"),
            }
        }

        let Some(next_column) = columns.get(next) else {
            return;
        };
        let column = next_column.visible_index.map_or(0, |index| index as isize);
        let level = next_column.level;

        self.set_active_node(
            &*host,
            NodePatch::at(active.row, column).level(level).mch_cache(Some(cache)),
        );
        self.perform_horizontal_scroll_to_cell(host, column, AfterScroll::Nothing);
    }

    /// Sorting, grouping, group expansion, selection and filtering shortcuts
    /// on a header cell
    pub fn perform_header_key_combination<H: GridHost + ?Sized>(
        &mut self,
        host: &mut H,
        column: ColumnId,
        key: &str,
        shift: bool,
        ctrl: bool,
        alt: bool,
    ) {
        let Some(target) = host.columns().get(column).cloned() else {
            return;
        };
        let is_leaf = !target.is_group();
        let direction = host.sort_direction(&target.field).unwrap_or(SortDirection::None);

        if ctrl && key.contains("up") && target.sortable && is_leaf {
            let next = if direction == SortDirection::Asc {
                SortDirection::None
            } else {
                SortDirection::Asc
            };
            debug!(field = %target.field, ?next, "sorting from header");
            host.sort(&target.field, next);
            return;
        }

        if ctrl && key.contains("down") && target.sortable && is_leaf {
            let next = if direction == SortDirection::Desc {
                SortDirection::None
            } else {
                SortDirection::Desc
            };
            debug!(field = %target.field, ?next, "sorting from header");
            host.sort(&target.field, next);
            return;
        }

        if shift && alt && keys::is_toggle_key(key) && is_leaf && target.groupable {
            let grouping = key.contains("right");
            let last = self.last_column_index(&*host);
            if grouping {
                let direction = match direction {
                    SortDirection::None => SortDirection::Asc,
                    other => other,
                };
                host.group_by(&target.field, direction);
            } else {
                host.clear_grouping(&target.field);
            }

            let hides_last = grouping
                && host.options().hide_grouped_columns
                && target.visible_index.map(|index| index as isize) == Some(last);
            if hides_last {
                self.set_active_node(&*host, NodePatch::new().column(last - 1));
            }
            return;
        }

        if alt && keys::is_toggle_key(key) {
            self.handle_mch_expand_collapse(host, key, column);
            return;
        }

        if keys::is_space_key(key) {
            self.handle_column_selection(host, column);
        }

        if alt && (key == "l" || key == "¬") && host.options().allow_advanced_filtering {
            host.open_advanced_filtering();
        }

        if ctrl && shift && key == "l" && host.options().allow_filtering && is_leaf && target.filterable {
            match host.options().filter_mode {
                FilterMode::ExcelStyleFilter => host.toggle_filter_dropdown(column),
                FilterMode::QuickFilter => {
                    let index = target.visible_index.map_or(-1, |index| index as isize);
                    self.perform_horizontal_scroll_to_cell(host, index, AfterScroll::Nothing);
                    host.show_filter_row(column);
                }
            }
        }
    }

    /// Alt + arrow on a collapsible header group
    pub fn handle_mch_expand_collapse<H: GridHost + ?Sized>(&mut self, host: &mut H, key: &str, column: ColumnId) {
        let Some(target) = host.columns().get(column) else {
            return;
        };
        if !target.is_group() || !target.collapsible {
            return;
        }

        let expanded = target.expanded;
        if !expanded && keys::is_row_expand_key(key) {
            host.set_column_expanded(column, true);
        } else if expanded && keys::is_row_collapse_key(key) {
            host.set_column_expanded(column, false);
        }
    }

    /// Space on a header cell toggles selection of the column or of every
    /// selectable leaf under the group
    pub fn handle_column_selection<H: GridHost + ?Sized>(&mut self, host: &mut H, column: ColumnId) {
        let mode = host.options().column_selection;
        let columns = host.columns();
        let Some(target) = columns.get(column) else {
            return;
        };
        if !target.selectable || mode == GridSelectionMode::None {
            return;
        }

        let fields: Vec<String> = if target.is_group() {
            columns
                .visible_leaves(column)
                .into_iter()
                .filter_map(|id| columns.get(id))
                .filter(|leaf| leaf.selectable)
                .map(|leaf| leaf.field.clone())
                .collect()
        } else {
            vec![target.field.clone()]
        };

        if columns.is_selected(column) {
            host.deselect_columns(&fields);
        } else {
            host.select_columns(&fields, mode == GridSelectionMode::Single);
        }
    }
}

fn visible_index_of<H: GridHost + ?Sized>(host: &H, id: ColumnId) -> isize {
    host.columns()
        .get(id)
        .and_then(|column| column.visible_index)
        .map_or(0, |index| index as isize)
}
