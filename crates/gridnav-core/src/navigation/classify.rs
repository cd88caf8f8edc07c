//! Row classification against the data view
//!
//! Nothing here is cached: the view changes on every sort, filter or page,
//! so each question is answered from the current records.

use crate::host::{DataView, RecordKind};

use super::TargetType;

fn record_at<H: DataView + ?Sized>(host: &H, row: isize) -> Option<RecordKind> {
    usize::try_from(row).ok().and_then(|index| host.record_kind(index))
}

/// Whether `row` holds a data record (or a summary, when `include_summary`)
///
/// Rows outside the materialized window are looked up relative to the
/// window start; if they are still not materialized, a remote grid assumes
/// they are data rows as long as they lie within the total count.
pub fn is_data_row<H: DataView + ?Sized>(host: &H, row: isize, include_summary: bool) -> bool {
    let len = host.view_len() as isize;
    let record = if row < 0 || row >= len {
        let shifted = row - host.virtualization_start() as isize;
        match record_at(host, shifted) {
            Some(kind) if shifted < len => Some(kind),
            _ => {
                return host.is_remote()
                    && row >= 0
                    && host.total_item_count().is_some_and(|total| row < total as isize);
            }
        }
    } else {
        record_at(host, row)
    };

    match record {
        Some(RecordKind::Data) => true,
        Some(RecordKind::Summary) => include_summary,
        _ => false,
    }
}

/// Whether `row` holds a group-by record
pub fn is_group_row<H: DataView + ?Sized>(host: &H, row: isize) -> bool {
    record_at(host, row) == Some(RecordKind::GroupBy)
}

/// Whether `row` holds a summary record
pub fn is_summary_row<H: DataView + ?Sized>(host: &H, row: isize) -> bool {
    record_at(host, row) == Some(RecordKind::Summary)
}

/// Whether `row` holds a master-detail record
pub fn is_detail_row<H: DataView + ?Sized>(host: &H, row: isize) -> bool {
    record_at(host, row) == Some(RecordKind::Detail)
}

/// Group-by and child-grid rows span the full width and have no column
pub fn is_full_width_row<H: DataView + ?Sized>(host: &H, row: isize) -> bool {
    matches!(
        record_at(host, row),
        Some(RecordKind::GroupBy) | Some(RecordKind::ChildGrid)
    )
}

/// First data row by forward scan
pub fn find_first_data_row_index<H: DataView + ?Sized>(host: &H) -> Option<isize> {
    (0..host.view_len())
        .find(|&index| host.record_kind(index) == Some(RecordKind::Data))
        .map(|index| index as isize)
}

/// Last data row: the end of the total count for remote data, otherwise
/// the last data row by reverse scan
pub fn find_last_data_row_index<H: DataView + ?Sized>(host: &H) -> Option<isize> {
    if let Some(total) = host.total_item_count().filter(|&total| total > 0) {
        return Some(total as isize - 1);
    }
    (0..host.view_len() as isize)
        .rev()
        .find(|&index| is_data_row(host, index, false))
}

/// Classification used to tag active-node changes
pub fn node_target_type<H: DataView + ?Sized>(host: &H, row: isize) -> TargetType {
    if row < 0 {
        return TargetType::HeaderCell;
    }
    match record_at(host, row) {
        Some(RecordKind::GroupBy) => TargetType::GroupRow,
        Some(RecordKind::Detail) => TargetType::MasterDetailRow,
        _ if is_data_row(host, row, false) => TargetType::DataCell,
        _ => TargetType::SummaryCell,
    }
}

/// Classification used for the keydown notification in the body
pub fn keydown_target_type<H: DataView + ?Sized>(host: &H, row: isize) -> TargetType {
    if is_data_row(host, row, false) {
        TargetType::DataCell
    } else if is_data_row(host, row, true) {
        TargetType::SummaryCell
    } else {
        TargetType::GroupRow
    }
}
