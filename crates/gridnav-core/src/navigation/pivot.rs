//! Pivot grid navigation
//!
//! A pivot grid has a second cursor region: the row-dimension headers to
//! the left of the body. Each row dimension is its own vertically scrolling
//! container, so while the cursor is there `column` is the dimension index
//! and `row` the index inside that dimension's container.

use std::ops::{Deref, DerefMut};

use tracing::{debug, trace};

use super::engine::NavigationService;
use super::keys::{self, KeyEvent};
use super::{ColumnGroupsCache, KeyboardNavigation, NodePatch};
use crate::host::PivotHost;
use crate::settings::NavigationSettings;

/// Navigation service for pivot grids
///
/// Behaves like [`NavigationService`] (which it derefs to) until the host
/// reports that focus is on the row-dimension headers.
#[derive(Default)]
pub struct PivotNavigationService {
    base: NavigationService,
    row_header_active: bool,
    row_dimension_header_active: bool,
}

impl PivotNavigationService {
    pub fn new(settings: NavigationSettings) -> Self {
        Self {
            base: NavigationService::new(settings),
            row_header_active: false,
            row_dimension_header_active: false,
        }
    }

    pub fn is_row_header_active(&self) -> bool {
        self.row_header_active
    }

    pub fn is_row_dimension_header_active(&self) -> bool {
        self.row_dimension_header_active
    }

    /// Focus entered or left the row-dimension headers
    pub fn set_row_header_active(&mut self, active: bool) {
        self.row_header_active = active;
    }

    /// Focus entered or left the row-dimension header bar
    pub fn set_row_dimension_header_active(&mut self, active: bool) {
        self.row_dimension_header_active = active;
    }

    pub fn focus_out_row_header(&mut self) {
        trace!("focus left row headers");
        self.row_header_active = false;
        self.row_dimension_header_active = false;
    }

    /// Handle a keydown; row-header keys are handled here, everything else
    /// goes to the body engine
    pub fn handle_navigation<H: PivotHost + ?Sized>(&mut self, host: &mut H, event: &mut KeyEvent) {
        if self.row_header_active {
            self.handle_row_header_navigation(host, event);
        } else {
            self.base.handle_navigation(host, event);
        }
    }

    fn handle_row_header_navigation<H: PivotHost + ?Sized>(&mut self, host: &mut H, event: &mut KeyEvent) {
        let key = event.normalized();
        if !keys::is_header_key(&key) {
            return;
        }
        event.prevent_default();

        let Some(active) = self.base.active.clone() else {
            return;
        };
        let ctrl = event.ctrl;
        let last_dimension = host.row_dimension_count() as isize - 1;

        let mut row = active.row;
        let mut column = active.column;
        let mut mch_cache = None;

        if (key.contains("left") || key == "home") && active.column > 0 {
            column = if ctrl || key == "home" { 0 } else { active.column - 1 };
        }
        if (key.contains("right") || key == "end") && active.column < last_dimension {
            column = if ctrl || key == "end" { last_dimension } else { active.column + 1 };
        }

        let Ok(dimension) = usize::try_from(column) else {
            return;
        };
        let dimension_len = host.row_dimension_len(dimension) as isize;

        if key.contains("up") && active.row > 0 {
            row = if ctrl { 0 } else { active.row - 1 };
        }
        if key.contains("down") && active.row < dimension_len - 1 {
            row = if ctrl {
                dimension_len - 1
            } else {
                (active.row + 1).min(dimension_len - 1)
            };
        }

        if key.contains("left") || key.contains("right") {
            // dimensions have their own item sizes, so carry the scroll
            // offset across instead of the index
            row = match active.mch_cache {
                Some(cache) if cache.level as isize == column => cache.visible_index,
                _ => {
                    let previous = usize::try_from(active.column).unwrap_or(0);
                    let offset = host.row_dimension_scroll_for_index(previous, usize::try_from(active.row).unwrap_or(0));
                    host.row_dimension_index_at_scroll(dimension, offset) as isize
                }
            };
            mch_cache = usize::try_from(active.column).ok().map(|level| ColumnGroupsCache {
                level,
                visible_index: active.row,
            });
        }

        self.base.set_active_node(
            &*host,
            NodePatch::at(row, column).level(0).mch_cache(mch_cache).layout(None),
        );

        let Ok(index) = usize::try_from(row) else {
            return;
        };
        if host.row_dimension_index_outside_view(dimension, index) {
            debug!(dimension, index, "scrolling row dimension");
            host.row_dimension_scroll_to(dimension, index);
        }
    }

    /// Focus entered the body; a missing cursor is restored from the last
    /// remembered node rather than recomputed
    pub fn focus_tbody<H: PivotHost + ?Sized>(&mut self, host: &mut H) {
        let remembered = match self.base.active {
            None => self.base.last_active.clone(),
            Some(_) => None,
        };
        match remembered {
            Some(last) => {
                trace!(row = last.row, column = last.column, "restoring pivot cursor");
                self.base.set_active_node(&*host, NodePatch::from(&last));
            }
            None => self.base.focus_tbody(host),
        }
    }
}

impl Deref for PivotNavigationService {
    type Target = NavigationService;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for PivotNavigationService {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl<H: PivotHost + ?Sized> KeyboardNavigation<H> for PivotNavigationService {
    fn handle_navigation(&mut self, host: &mut H, event: &mut KeyEvent) {
        PivotNavigationService::handle_navigation(self, host, event);
    }

    fn focus_tbody(&mut self, host: &mut H) {
        PivotNavigationService::focus_tbody(self, host);
    }

    fn focus_out_row_header(&mut self) {
        PivotNavigationService::focus_out_row_header(self);
    }
}
