use crate::schema::{Table, Value};
use log::debug;

/// Constant source tag prepended to every breakdown row.
pub const SOURCE_TAG: &str = "LOADSHARE";

pub const SOURCE_COLUMN: &str = "Source";
pub const REFERENCE_COLUMN: &str = "Reference ID/Waybill No";
pub const BRAND_COLUMN: &str = "Brand/Customer Name";
pub const AMOUNT_COLUMN: &str = "COD Amount/Amount payable";

/// Source column names the pivot builder reads before remapping.
pub const BRAND_SOURCE: &str = "Customer Name";
pub const CREATED_DATE_SOURCE: &str = "Created Date";
pub const WAYBILL_SOURCE: &str = "Waybill No";

/// Fixed mapping from dump field names to canonical breakdown field names.
pub const COLUMN_MAPPING: [(&str, &str); 11] = [
    ("Customer Name", "Brand/Customer Name"),
    ("Created Date", "Creation Date"),
    ("Location", "Partner Name/Location"),
    ("Employee Name", "Rider Name/Employee Name"),
    ("Employee Number", "Rider ID/Employee Number"),
    ("Amount payable", "COD Amount/Amount payable"),
    ("Status", "Fulfillment Status/Status"),
    ("POD Date", "Terminal Time/POD Date"),
    ("Delivery Payment type", "Delivery Payment type"),
    ("Pincode", "Pincode"),
    ("Order Category", "Order Category"),
];

/// Selects the mapped fields from a source table and renames them to their
/// canonical names. Fields absent from the source are omitted from the
/// output. Pure and deterministic.
pub fn remap_columns(source: &Table) -> Table {
    let present: Vec<(usize, &str)> = COLUMN_MAPPING
        .iter()
        .filter_map(|(from, to)| source.column_index(from).map(|idx| (idx, *to)))
        .collect();

    debug!(
        "Remapping {} of {} source columns to canonical names",
        present.len(),
        source.columns().len()
    );

    let mut out = Table::new(present.iter().map(|(_, to)| to.to_string()).collect());
    for row in source.rows() {
        out.push_row(
            present
                .iter()
                .map(|(idx, _)| row.get(*idx).cloned().unwrap_or(Value::Empty))
                .collect(),
        );
    }
    out
}
