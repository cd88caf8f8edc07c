//! Column tree storage
//!
//! Columns live in a flat arena and refer to each other by index. Leaf
//! columns receive a visible index in render order (pinned roots first);
//! a group takes the visible index of its first visible leaf.

use serde::{Deserialize, Serialize};

/// Index of a column inside a [`ColumnArena`]
pub type ColumnId = usize;

/// Multi-row-layout placement of a column block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSpan {
    pub row_start: usize,
    pub col_start: usize,
    pub row_end: usize,
    pub col_end: usize,
}

/// A single column or column group
#[derive(Debug, Clone)]
pub struct Column {
    /// Data field (or header text for groups)
    pub field: String,

    /// Depth in the header tree, 0 for top-level columns
    pub level: usize,

    /// Position among visible leaf columns, `None` when not rendered
    pub visible_index: Option<usize>,

    pub pinned: bool,
    pub hidden: bool,
    pub selectable: bool,
    pub selected: bool,
    pub sortable: bool,
    pub groupable: bool,
    pub filterable: bool,
    pub editable: bool,

    /// Groups only: whether the group may be collapsed from the keyboard
    pub collapsible: bool,
    /// Groups only: current expansion state
    pub expanded: bool,

    pub layout: Option<LayoutSpan>,

    pub parent: Option<ColumnId>,
    pub children: Vec<ColumnId>,
}

impl Column {
    /// Create a leaf column bound to `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            level: 0,
            visible_index: None,
            pinned: false,
            hidden: false,
            selectable: true,
            selected: false,
            sortable: true,
            groupable: true,
            filterable: true,
            editable: true,
            collapsible: false,
            expanded: true,
            layout: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn collapsible(mut self, collapsible: bool) -> Self {
        self.collapsible = collapsible;
        self
    }

    pub fn with_layout(mut self, layout: LayoutSpan) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Whether this column is a header group
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Flat storage for the column tree
#[derive(Debug, Clone, Default)]
pub struct ColumnArena {
    columns: Vec<Column>,
    roots: Vec<ColumnId>,
}

impl ColumnArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level leaf column
    pub fn push(&mut self, column: Column) -> ColumnId {
        let id = self.columns.len();
        self.columns.push(column);
        self.roots.push(id);
        self.reindex();
        id
    }

    /// Add a top-level group owning `children`
    pub fn push_group(&mut self, group: Column, children: Vec<Column>) -> ColumnId {
        let id = self.push(group);
        for child in children {
            self.push_child(id, child);
        }
        id
    }

    /// Attach `column` under `parent`; `None` if there is no such parent
    pub fn push_child(&mut self, parent: ColumnId, mut column: Column) -> Option<ColumnId> {
        let id = self.columns.len();
        column.parent = Some(parent);
        self.columns.get_mut(parent)?.children.push(id);
        self.columns.push(column);
        self.reindex();
        Some(id)
    }

    /// Recompute levels and visible indices after any structural change
    pub fn reindex(&mut self) {
        for column in &mut self.columns {
            column.visible_index = None;
        }

        let (pinned, unpinned): (Vec<ColumnId>, Vec<ColumnId>) = self
            .roots
            .iter()
            .copied()
            .partition(|&id| self.columns[id].pinned);

        let mut next = 0;
        for root in pinned.into_iter().chain(unpinned) {
            let pinned = self.columns[root].pinned;
            self.assign(root, 0, pinned, false, &mut next);
        }
    }

    fn assign(&mut self, id: ColumnId, level: usize, pinned: bool, hidden: bool, next: &mut usize) {
        let hidden = hidden || self.columns[id].hidden;
        {
            let column = &mut self.columns[id];
            column.level = level;
            column.pinned = pinned;
        }

        let children = self.columns[id].children.clone();
        if children.is_empty() {
            if !hidden {
                self.columns[id].visible_index = Some(*next);
                *next += 1;
            }
            return;
        }

        for child in children.iter().copied() {
            self.assign(child, level + 1, pinned, hidden, next);
        }
        self.columns[id].visible_index = children
            .iter()
            .filter_map(|&child| self.columns[child].visible_index)
            .min();
    }

    pub fn get(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id)
    }

    pub fn get_mut(&mut self, id: ColumnId) -> Option<&mut Column> {
        self.columns.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Every rendered column, groups included, in arena order
    pub fn visible(&self) -> impl Iterator<Item = (ColumnId, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.visible_index.is_some())
    }

    /// The highest visible index, i.e. the last navigable column
    pub fn last_column_index(&self) -> Option<usize> {
        self.visible().filter_map(|(_, c)| c.visible_index).max()
    }

    /// Whether any column group is present
    pub fn has_column_groups(&self) -> bool {
        self.columns.iter().any(Column::is_group)
    }

    /// Leaf column rendered at `visible_index`
    pub fn leaf_at(&self, visible_index: usize) -> Option<ColumnId> {
        self.visible()
            .find(|(_, c)| !c.is_group() && c.visible_index == Some(visible_index))
            .map(|(id, _)| id)
    }

    /// Column rendered at `visible_index` on header `level`
    pub fn at_level(&self, visible_index: usize, level: usize) -> Option<ColumnId> {
        self.visible()
            .find(|(_, c)| c.visible_index == Some(visible_index) && c.level == level)
            .map(|(id, _)| id)
    }

    /// First column (in arena order) rendered at `visible_index`, whatever its level
    pub fn first_at(&self, visible_index: usize) -> Option<ColumnId> {
        self.visible()
            .find(|(_, c)| c.visible_index == Some(visible_index) && c.layout.is_none())
            .map(|(id, _)| id)
    }

    /// Every descendant of `id`, depth first
    pub fn all_children(&self, id: ColumnId) -> Vec<ColumnId> {
        let mut out = Vec::new();
        let mut stack: Vec<ColumnId> = self
            .get(id)
            .map(|column| column.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(column) = self.get(next) {
                stack.extend(column.children.iter().rev().copied());
            }
        }
        out
    }

    /// Visible leaf descendants of a group, or the column itself for a leaf
    pub fn visible_leaves(&self, id: ColumnId) -> Vec<ColumnId> {
        let Some(column) = self.get(id) else {
            return Vec::new();
        };
        if !column.is_group() {
            return if column.visible_index.is_some() { vec![id] } else { Vec::new() };
        }
        self.all_children(id)
            .into_iter()
            .filter(|&c| {
                self.get(c)
                    .is_some_and(|leaf| !leaf.is_group() && leaf.visible_index.is_some())
            })
            .collect()
    }

    /// Walk parent links up to the top-level ancestor
    pub fn top_level(&self, mut id: ColumnId) -> Option<ColumnId> {
        while let Some(parent) = self.get(id)?.parent {
            id = parent;
        }
        Some(id)
    }

    /// Position of a top-level column among the unpinned top-level columns
    /// (the items of the horizontal virtualization container)
    pub fn horizontal_item_index(&self, root: ColumnId) -> Option<usize> {
        let mut items: Vec<(usize, ColumnId)> = self
            .roots
            .iter()
            .copied()
            .filter(|&r| !self.columns[r].pinned)
            .filter_map(|r| self.columns[r].visible_index.map(|vi| (vi, r)))
            .collect();
        items.sort_unstable();
        items.iter().position(|&(_, r)| r == root)
    }

    /// Number of pinned leaf columns currently rendered
    pub fn pinned_leaf_count(&self) -> usize {
        self.visible()
            .filter(|(_, c)| c.pinned && !c.is_group())
            .count()
    }

    /// Index of a leaf among unpinned leaves, which is what the horizontal
    /// scroll container is indexed by
    pub fn unpinned_index(&self, visible_index: usize) -> Option<usize> {
        let pinned = self.pinned_leaf_count();
        if pinned == 0 {
            return Some(visible_index);
        }
        visible_index.checked_sub(pinned)
    }

    /// Whether the column is selected; a group
    /// counts as selected once every selectable visible leaf under it is
    pub fn is_selected(&self, id: ColumnId) -> bool {
        let Some(column) = self.get(id) else {
            return false;
        };
        if !column.is_group() {
            return column.selected;
        }
        let leaves: Vec<&Column> = self
            .visible_leaves(id)
            .into_iter()
            .filter_map(|c| self.get(c))
            .filter(|c| c.selectable)
            .collect();
        !leaves.is_empty() && leaves.iter().all(|c| c.selected)
    }

    /// Look a column up by field name
    pub fn by_field(&self, field: &str) -> Option<ColumnId> {
        self.columns.iter().position(|c| c.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouped() -> ColumnArena {
        // ID | [Name, [City, Zip]] | Phone
        let mut arena = ColumnArena::new();
        arena.push(Column::new("ID"));
        let person = arena.push(Column::new("Person").collapsible(true));
        arena.push_child(person, Column::new("Name"));
        let address = arena.push_child(person, Column::new("Address")).unwrap();
        arena.push_child(address, Column::new("City"));
        arena.push_child(address, Column::new("Zip"));
        arena.push(Column::new("Phone"));
        arena
    }

    #[test]
    fn test_levels_and_visible_indices() {
        let arena = grouped();
        let vi = |f: &str| arena.get(arena.by_field(f).unwrap()).unwrap().visible_index;
        let level = |f: &str| arena.get(arena.by_field(f).unwrap()).unwrap().level;

        assert_eq!(vi("ID"), Some(0));
        assert_eq!(vi("Person"), Some(1));
        assert_eq!(vi("Name"), Some(1));
        assert_eq!(vi("Address"), Some(2));
        assert_eq!(vi("City"), Some(2));
        assert_eq!(vi("Zip"), Some(3));
        assert_eq!(vi("Phone"), Some(4));
        assert_eq!(level("Address"), 1);
        assert_eq!(level("City"), 2);
        assert_eq!(arena.last_column_index(), Some(4));
        assert!(arena.has_column_groups());
    }

    #[test]
    fn test_pinned_roots_come_first() {
        let mut arena = ColumnArena::new();
        arena.push(Column::new("A"));
        arena.push(Column::new("B").pinned(true));
        arena.push(Column::new("C"));

        let b = arena.by_field("B").unwrap();
        let a = arena.by_field("A").unwrap();
        assert_eq!(arena.get(b).unwrap().visible_index, Some(0));
        assert_eq!(arena.get(a).unwrap().visible_index, Some(1));
        assert_eq!(arena.pinned_leaf_count(), 1);
        assert_eq!(arena.unpinned_index(2), Some(1));
        assert_eq!(arena.unpinned_index(0), None);
    }

    #[test]
    fn test_hidden_leaves_are_skipped() {
        let mut arena = ColumnArena::new();
        arena.push(Column::new("A"));
        arena.push(Column::new("B").hidden(true));
        arena.push(Column::new("C"));

        assert_eq!(arena.get(1).unwrap().visible_index, None);
        assert_eq!(arena.get(2).unwrap().visible_index, Some(1));
        assert_eq!(arena.leaf_at(1), Some(2));
    }

    #[test]
    fn test_tree_walks() {
        let arena = grouped();
        let person = arena.by_field("Person").unwrap();
        let zip = arena.by_field("Zip").unwrap();

        assert_eq!(arena.top_level(zip), Some(person));
        assert_eq!(arena.all_children(person).len(), 4);
        assert_eq!(arena.visible_leaves(person).len(), 3);
        assert_eq!(arena.at_level(2, 1), arena.by_field("Address"));
        assert_eq!(arena.horizontal_item_index(person), Some(1));
    }

    #[test]
    fn test_group_selection_requires_every_leaf() {
        let mut arena = grouped();
        let person = arena.by_field("Person").unwrap();
        for field in ["Name", "City"] {
            let id = arena.by_field(field).unwrap();
            arena.get_mut(id).unwrap().selected = true;
        }
        assert!(!arena.is_selected(person));

        let zip = arena.by_field("Zip").unwrap();
        arena.get_mut(zip).unwrap().selected = true;
        assert!(arena.is_selected(person));
    }

    #[test]
    fn test_unknown_ids_are_tolerated() {
        let mut arena = grouped();
        let missing = arena.len() + 10;

        assert_eq!(arena.push_child(missing, Column::new("Orphan")), None);
        assert_eq!(arena.by_field("Orphan"), None);
        assert_eq!(arena.top_level(missing), None);
        assert!(arena.all_children(missing).is_empty());
        assert!(arena.visible_leaves(missing).is_empty());
        assert!(!arena.is_selected(missing));
    }
}
