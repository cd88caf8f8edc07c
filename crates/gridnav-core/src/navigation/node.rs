use serde::{Deserialize, Serialize};

/// Header position remembered while moving between header levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnGroupsCache {
    pub level: usize,
    pub visible_index: isize,
}

/// Multi-row-layout block of the active column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutNode {
    pub row_start: usize,
    pub col_start: usize,
    pub row_end: usize,
    pub col_end: usize,
    pub column_visible_index: usize,
}

/// The keyboard cursor
///
/// `row` indexes the data view; `-1` is the header row and the view length
/// is the summary row. `column` is a visible column index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveNode {
    pub row: isize,
    pub column: isize,
    pub level: usize,
    pub mch_cache: Option<ColumnGroupsCache>,
    pub layout: Option<LayoutNode>,
}

impl ActiveNode {
    pub fn new(row: isize, column: isize) -> Self {
        Self {
            row,
            column,
            ..Default::default()
        }
    }

    /// Merge `patch` into this node, field by field
    pub fn apply(&mut self, patch: &NodePatch) {
        if let Some(row) = patch.row {
            self.row = row;
        }
        if let Some(column) = patch.column {
            self.column = column;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(cache) = patch.mch_cache {
            self.mch_cache = cache;
        }
        if let Some(layout) = patch.layout {
            self.layout = layout;
        }
    }

    pub fn is_at(&self, row: isize, column: isize) -> bool {
        self.row == row && self.column == column
    }
}

/// A partial candidate for the active node
///
/// `None` leaves a field untouched. The object fields are doubly optional
/// so that a patch can clear them (`Some(None)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodePatch {
    pub row: Option<isize>,
    pub column: Option<isize>,
    pub level: Option<usize>,
    pub mch_cache: Option<Option<ColumnGroupsCache>>,
    pub layout: Option<Option<LayoutNode>>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A patch that sets row and column only
    pub fn at(row: isize, column: isize) -> Self {
        Self::new().row(row).column(column)
    }

    pub fn row(mut self, row: isize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn column(mut self, column: isize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    pub fn mch_cache(mut self, cache: Option<ColumnGroupsCache>) -> Self {
        self.mch_cache = Some(cache);
        self
    }

    pub fn layout(mut self, layout: Option<LayoutNode>) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Whether merging this patch would change `current`
    ///
    /// Only the fields present in the patch are compared. Object fields are
    /// compared key by key against the same key of the current value; a
    /// missing value on either side counts as a difference.
    pub fn differs_from(&self, current: Option<&ActiveNode>) -> bool {
        let Some(current) = current else {
            return true;
        };

        self.row.is_some_and(|row| row != current.row)
            || self.column.is_some_and(|column| column != current.column)
            || self.level.is_some_and(|level| level != current.level)
            || self.mch_cache.is_some_and(|cache| cache != current.mch_cache)
            || self.layout.is_some_and(|layout| layout != current.layout)
    }

    /// A complete node built from this patch over a default node
    pub fn to_node(&self) -> ActiveNode {
        let mut node = ActiveNode::default();
        node.apply(self);
        node
    }
}

impl From<&ActiveNode> for NodePatch {
    fn from(node: &ActiveNode) -> Self {
        Self {
            row: Some(node.row),
            column: Some(node.column),
            level: Some(node.level),
            mch_cache: Some(node.mch_cache),
            layout: Some(node.layout),
        }
    }
}
