use serde::{Deserialize, Serialize};

pub mod classify;
mod editing;
mod engine;
mod header;
pub mod keys;
mod node;
mod pivot;
mod scroll;
mod subscriber;

pub use engine::NavigationService;
pub use keys::KeyEvent;
pub use node::{ActiveNode, ColumnGroupsCache, LayoutNode, NodePatch};
pub use pivot::PivotNavigationService;
pub use scroll::{AfterScroll, PendingScroll, ScrollAxis, ScrollCompletion, ScrollState};
pub use subscriber::NavigationSubscriber;

use crate::host::GridHost;

/// Semantic kind of the row under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetType {
    DataCell,
    SummaryCell,
    GroupRow,
    MasterDetailRow,
    HeaderCell,
}

/// Result of the movement engine for a recognized key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPosition {
    pub row_index: isize,
    pub col_index: isize,
}

impl NextPosition {
    pub fn new(row_index: isize, col_index: isize) -> Self {
        Self { row_index, col_index }
    }
}

/// Payload of the active-node change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveNodeChange {
    pub row: isize,
    pub column: isize,
    pub level: usize,
    pub tag: TargetType,
}

/// Entry points a grid calls on its navigation service
///
/// The pivot service overrides body navigation and body focus; everything
/// else is shared.
pub trait KeyboardNavigation<H: GridHost + ?Sized> {
    /// Handle a keydown on the grid body
    fn handle_navigation(&mut self, host: &mut H, event: &mut KeyEvent);

    /// Focus entered the table body
    fn focus_tbody(&mut self, host: &mut H);

    /// Focus left the row-dimension headers
    fn focus_out_row_header(&mut self) {}
}
