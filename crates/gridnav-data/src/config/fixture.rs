//! JSON description of a grid

use std::path::Path;

use serde::{Deserialize, Serialize};

use gridnav_core::columns::LayoutSpan;
use gridnav_core::host::RecordKind;
use gridnav_core::settings::{GridOptions, NavigationSettings};

use crate::{FixtureError, Result};

/// A column or column group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Field name, unique across the fixture
    pub field: String,

    #[serde(default)]
    pub pinned: bool,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default = "default_true")]
    pub selectable: bool,

    #[serde(default = "default_true")]
    pub sortable: bool,

    #[serde(default = "default_true")]
    pub groupable: bool,

    #[serde(default = "default_true")]
    pub filterable: bool,

    #[serde(default = "default_true")]
    pub editable: bool,

    #[serde(default)]
    pub collapsible: bool,

    #[serde(default = "default_true")]
    pub expanded: bool,

    /// Width in pixels; leaves only, defaults to the viewport column width
    #[serde(default)]
    pub width: Option<f64>,

    #[serde(default)]
    pub layout: Option<LayoutSpan>,

    /// Non-empty for column groups
    #[serde(default)]
    pub children: Vec<ColumnSpec>,
}

impl ColumnSpec {
    /// A plain leaf column
    pub fn leaf(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            pinned: false,
            hidden: false,
            selectable: true,
            sortable: true,
            groupable: true,
            filterable: true,
            editable: true,
            collapsible: false,
            expanded: true,
            width: None,
            layout: None,
            children: Vec::new(),
        }
    }

    /// A column group over `children`
    pub fn group(field: impl Into<String>, children: Vec<ColumnSpec>) -> Self {
        Self {
            children,
            ..Self::leaf(field)
        }
    }
}

/// A data-view record with everything spelled out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSpec {
    pub kind: RecordKind,

    /// Primary key; data rows without one get `row-<index>`
    #[serde(default)]
    pub key: Option<String>,

    /// Row belongs to a tree grid
    #[serde(default)]
    pub tree: bool,

    #[serde(default)]
    pub expanded: bool,

    #[serde(default)]
    pub selected: bool,

    /// Row was added in the current edit session
    #[serde(default)]
    pub added: bool,

    /// Height in pixels, defaults to the viewport row height
    #[serde(default)]
    pub height: Option<f64>,
}

impl From<RecordKind> for RecordSpec {
    fn from(kind: RecordKind) -> Self {
        Self {
            kind,
            key: None,
            tree: false,
            expanded: false,
            selected: false,
            added: false,
            height: None,
        }
    }
}

/// A record given either as its bare kind (`"data"`) or in full
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordEntry {
    Kind(RecordKind),
    Full(RecordSpec),
}

impl From<RecordEntry> for RecordSpec {
    fn from(entry: RecordEntry) -> Self {
        match entry {
            RecordEntry::Kind(kind) => kind.into(),
            RecordEntry::Full(spec) => spec,
        }
    }
}

/// Scroll container geometry
///
/// A zero height or width means the grid sizes to its content in that
/// direction and never scrolls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSpec {
    pub height: f64,
    pub width: f64,
    pub row_height: f64,
    pub column_width: f64,
}

impl Default for ViewportSpec {
    fn default() -> Self {
        Self {
            height: 0.0,
            width: 0.0,
            row_height: 50.0,
            column_width: 100.0,
        }
    }
}

/// One row-dimension container of a pivot grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowDimensionSpec {
    /// Number of header items in the container
    pub len: usize,

    /// Item height in pixels
    #[serde(default = "default_item_height")]
    pub item_height: f64,
}

/// A complete grid description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridFixture {
    pub columns: Vec<ColumnSpec>,

    #[serde(default)]
    pub records: Vec<RecordEntry>,

    #[serde(default)]
    pub options: GridOptions,

    #[serde(default)]
    pub navigation: NavigationSettings,

    #[serde(default)]
    pub viewport: ViewportSpec,

    /// Rows pinned to the top of the body
    #[serde(default)]
    pub pinned_top: usize,

    /// Total row count of a remote data source
    #[serde(default)]
    pub total_item_count: Option<usize>,

    /// The grid renders a summary row below the data
    #[serde(default)]
    pub summaries: bool,

    /// Pivot row dimensions, left to right
    #[serde(default)]
    pub row_dimensions: Vec<RowDimensionSpec>,
}

impl GridFixture {
    /// Parse a fixture from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Self = serde_json::from_str(json)?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Load a fixture from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// A flat grid of `rows` data rows over `columns` leaf columns named
    /// `c0`, `c1`, ...
    pub fn flat(rows: usize, columns: usize) -> Self {
        Self {
            columns: (0..columns).map(|i| ColumnSpec::leaf(format!("c{i}"))).collect(),
            records: vec![RecordEntry::Kind(RecordKind::Data); rows],
            options: GridOptions::default(),
            navigation: NavigationSettings::default(),
            viewport: ViewportSpec::default(),
            pinned_top: 0,
            total_item_count: None,
            summaries: false,
            row_dimensions: Vec::new(),
        }
    }

    /// Check the column tree: at least one column, non-empty unique fields
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(FixtureError::Empty);
        }

        let mut seen = ahash::AHashSet::new();
        let mut stack: Vec<&ColumnSpec> = self.columns.iter().collect();
        while let Some(column) = stack.pop() {
            if column.field.trim().is_empty() {
                return Err(FixtureError::InvalidColumn("empty field name".to_string()));
            }
            if !seen.insert(column.field.as_str()) {
                return Err(FixtureError::InvalidColumn(format!("duplicate field '{}'", column.field)));
            }
            stack.extend(column.children.iter());
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_item_height() -> f64 {
    50.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_fixture() {
        let fixture = GridFixture::from_json(
            r#"{
                "columns": [{"field": "id"}, {"field": "name", "editable": false}],
                "records": ["data", "group_by", {"kind": "data", "key": "k7", "tree": true}]
            }"#,
        )
        .unwrap();

        assert_eq!(fixture.columns.len(), 2);
        assert!(!fixture.columns[1].editable);
        assert!(fixture.columns[0].selectable);
        assert_eq!(fixture.records.len(), 3);

        let last: RecordSpec = fixture.records[2].clone().into();
        assert_eq!(last.key.as_deref(), Some("k7"));
        assert!(last.tree);
        assert_eq!(fixture.viewport.row_height, 50.0);
    }

    #[test]
    fn test_options_and_groups() {
        let fixture = GridFixture::from_json(
            r#"{
                "columns": [
                    {"field": "id", "pinned": true},
                    {"field": "person", "collapsible": true, "children": [{"field": "name"}, {"field": "age"}]}
                ],
                "options": {"row_editable": true, "filter_mode": "excel_style_filter"},
                "viewport": {"height": 200, "width": 150}
            }"#,
        )
        .unwrap();

        assert_eq!(fixture.columns[1].children.len(), 2);
        assert!(fixture.options.row_editable);
        assert_eq!(fixture.options.filter_mode, gridnav_core::FilterMode::ExcelStyleFilter);
        assert_eq!(fixture.viewport.column_width, 100.0);
    }

    #[test]
    fn test_rejects_bad_columns() {
        let empty = GridFixture::from_json(r#"{"columns": []}"#);
        assert!(matches!(empty, Err(FixtureError::Empty)));

        let duplicate = GridFixture::from_json(
            r#"{"columns": [{"field": "a"}, {"field": "g", "children": [{"field": "a"}]}]}"#,
        );
        assert!(matches!(duplicate, Err(FixtureError::InvalidColumn(_))));

        let malformed = GridFixture::from_json("{");
        assert!(matches!(malformed, Err(FixtureError::Json(_))));
    }
}
