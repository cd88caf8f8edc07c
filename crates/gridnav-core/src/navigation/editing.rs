//! Tab traversal while editing and the Alt key combinations

use tracing::{trace, warn};

use super::engine::NavigationService;
use super::keys::{self, KeyEvent};
use crate::host::{EditTab, GridHost, RowKind};

impl NavigationService {
    /// Tab inside the body: move to the next or previous editable cell
    ///
    /// In row edit mode leaving the row commits the cell and hands focus to
    /// the row-edit buttons (Done/Cancel) when they exist; without them the
    /// cursor wraps inside the edited row.
    pub(super) fn handle_editing<H: GridHost + ?Sized>(&mut self, host: &mut H, shift: bool, event: &mut KeyEvent) {
        let Some(active) = self.active.clone() else {
            return;
        };
        let edit = host.edit_state();

        let next = if shift {
            host.previous_cell(active.row, active.column, true)
        } else {
            host.next_cell(active.row, active.column, true)
        };
        let stays_put = next.row_index == active.row && next.visible_column_index == active.column;

        if !edit.row_in_edit_mode && stays_put {
            // nowhere left to tab to
            host.end_edit(true);
            host.focus_body();
            return;
        }

        event.prevent_default();

        let mut target = next;
        if edit.row_in_edit_mode {
            if host.row_edit_tab_count() > 0 {
                if active.row != next.row_index || stays_put {
                    if !host.update_cell() {
                        trace!("cell update cancelled, staying in cell");
                        return;
                    }
                    host.focus_row_edit_tab(if shift { EditTab::Last } else { EditTab::First });
                    return;
                }
            } else if stays_put {
                target.visible_column_index = if shift {
                    host.last_editable_column_index()
                } else {
                    host.first_editable_column_index()
                };
            } else {
                target.row_index = active.row;
            }
        }

        self.navigate_in_body(host, target.row_index, target.visible_column_index, true);
    }

    /// Alt + key on a body row: expand, collapse or add rows
    pub(super) fn handle_alt<H: GridHost + ?Sized>(&mut self, host: &mut H, key: &str, event: &mut KeyEvent) {
        event.prevent_default();

        let Some(active) = self.active.as_ref() else {
            return;
        };
        let row = host.row_at(active.row);
        let Some(row) = row.filter(|_| keys::is_toggle_key(key) || keys::is_row_add_key(key)) else {
            return;
        };

        if keys::is_row_add_key(key) {
            if !host.options().row_editable {
                warn!("the grid must have row editing enabled to add rows from the keyboard");
                return;
            }
            if event.shift && row.kind == RowKind::Tree {
                host.enter_add_row_mode(&row, true);
            } else if !event.shift {
                host.enter_add_row_mode(&row, false);
            }
        } else if !row.added {
            let collapse = row.expanded && keys::is_row_collapse_key(key);
            let expand = !row.expanded && keys::is_row_expand_key(key);

            match row.key.as_ref().filter(|_| row.kind != RowKind::GroupBy) {
                None => host.toggle_row(row.index),
                Some(row_key) => {
                    if collapse {
                        host.set_row_expansion_state(row_key, false);
                    } else if expand {
                        host.set_row_expansion_state(row_key, true);
                    }
                }
            }
        }
        host.notify_changes();
    }
}
