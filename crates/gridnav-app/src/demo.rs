//! Built-in demo grid
//!
//! An orders grid grouped by region: every group has a group-by row, a few
//! data rows and a group summary, and the columns carry two header levels.
//! The viewport is small enough that most moves scroll.

use gridnav_core::host::RecordKind;
use gridnav_core::settings::{GridOptions, GridSelectionMode};
use gridnav_data::{ColumnSpec, GridFixture, RecordEntry, ViewportSpec};

const REGIONS: usize = 4;
const ORDERS_PER_REGION: usize = 6;

/// Script played by `gridnav demo` when none is given
pub const DEMO_SCRIPT: &str = "@body, down, down, ctrl+down, ctrl+up, end, home, space, \
    @header, up, right, down, @summary, right, right, @blur, @body";

pub fn demo_fixture() -> GridFixture {
    let mut id = ColumnSpec::leaf("order_id");
    id.pinned = true;
    id.editable = false;

    let mut customer = ColumnSpec::group(
        "customer",
        vec![ColumnSpec::leaf("name"), ColumnSpec::leaf("city"), ColumnSpec::leaf("zip")],
    );
    customer.collapsible = true;

    let amounts = ColumnSpec::group(
        "amounts",
        vec![ColumnSpec::leaf("quantity"), ColumnSpec::leaf("price"), ColumnSpec::leaf("total")],
    );

    let mut records = Vec::with_capacity(REGIONS * (ORDERS_PER_REGION + 2));
    for _ in 0..REGIONS {
        records.push(RecordEntry::Kind(RecordKind::GroupBy));
        records.extend((0..ORDERS_PER_REGION).map(|_| RecordEntry::Kind(RecordKind::Data)));
        records.push(RecordEntry::Kind(RecordKind::Summary));
    }

    let mut fixture = GridFixture::flat(0, 0);
    fixture.columns = vec![id, customer, amounts];
    fixture.records = records;
    fixture.options = GridOptions {
        row_selectable: true,
        column_selection: GridSelectionMode::Multiple,
        allow_filtering: true,
        ..Default::default()
    };
    fixture.viewport = ViewportSpec {
        height: 300.0,
        width: 450.0,
        ..Default::default()
    };
    fixture.summaries = true;
    fixture
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridnav_data::MemoryGrid;

    #[test]
    fn test_demo_fixture_is_valid() {
        let fixture = demo_fixture();
        assert!(fixture.validate().is_ok());
        assert_eq!(fixture.records.len(), REGIONS * (ORDERS_PER_REGION + 2));
        assert!(MemoryGrid::from_fixture(&fixture).is_ok());
    }

    #[test]
    fn test_demo_fixture_survives_json() {
        let json = serde_json::to_string(&demo_fixture()).unwrap();
        let fixture = GridFixture::from_json(&json).unwrap();
        assert_eq!(fixture.columns.len(), 3);
        assert!(fixture.summaries);
    }
}
