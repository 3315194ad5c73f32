//! Tabular snapshot document built from the application's record sets.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Point-in-time aggregate of every record set mirrored to the spreadsheet.
///
/// Fields hold raw JSON so malformed or missing inputs degrade to empty tables.
pub struct MirrorSnapshot {
    /// Company profile object.
    pub company_info: Value,
    /// Client rows.
    pub clients: Value,
    /// Work item rows.
    pub work_items: Value,
    /// Invoice rows.
    pub invoices: Value,
    /// Estimate rows.
    pub estimates: Value,
    /// Unit lookup values.
    pub units: Value,
    /// Category lookup values.
    pub categories: Value,
}

#[derive(Debug, Clone, PartialEq)]
/// One typed spreadsheet cell.
pub enum CellValue {
    /// Blank cell.
    Empty,
    /// Text cell.
    Text(String),
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
}

impl CellValue {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => number
                .as_f64()
                .map(Self::Number)
                .unwrap_or_else(|| Self::Text(number.to_string())),
            Value::String(text) => Self::Text(text.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
/// One labeled table: a header row plus data rows aligned to `columns`.
pub struct SnapshotSheet {
    /// Sheet label.
    pub name: String,
    /// Header labels.
    pub columns: Vec<String>,
    /// Data rows, each exactly `columns.len()` cells wide.
    pub rows: Vec<Vec<CellValue>>,
}

impl SnapshotSheet {
    /// Returns `true` when the sheet has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Ordered set of sheets making up one spreadsheet export.
pub struct SnapshotDocument {
    /// Sheets in output order.
    pub sheets: Vec<SnapshotSheet>,
}

impl SnapshotDocument {
    /// Looks up a sheet by label.
    pub fn sheet(&self, name: &str) -> Option<&SnapshotSheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

const SCALAR_COLUMN: &str = "value";

/// Maps every record set of `snapshot` onto one sheet.
///
/// Sheets: `Company` (single row), `Clients`, `WorkItems`, `Invoices`, `Estimates`, `Units`
/// and `Categories`. Missing or non-array inputs produce empty sheets.
pub fn build_snapshot_document(snapshot: &MirrorSnapshot) -> SnapshotDocument {
    let company_rows: Vec<Value> = match &snapshot.company_info {
        Value::Object(company) => vec![Value::Object(company.clone())],
        _ => Vec::new(),
    };
    SnapshotDocument {
        sheets: vec![
            table_sheet("Company", &company_rows),
            table_sheet("Clients", rows_of(&snapshot.clients)),
            table_sheet("WorkItems", rows_of(&snapshot.work_items)),
            table_sheet("Invoices", rows_of(&snapshot.invoices)),
            table_sheet("Estimates", rows_of(&snapshot.estimates)),
            lookup_sheet("Units", "unit", rows_of(&snapshot.units)),
            lookup_sheet("Categories", "category", rows_of(&snapshot.categories)),
        ],
    }
}

fn rows_of(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or_default()
}

fn lookup_sheet(name: &str, column: &str, values: &[Value]) -> SnapshotSheet {
    let rows: Vec<Value> = values
        .iter()
        .map(|value| {
            let mut row = Map::new();
            row.insert(column.to_string(), value.clone());
            Value::Object(row)
        })
        .collect();
    table_sheet(name, &rows)
}

fn table_sheet(name: &str, rows: &[Value]) -> SnapshotSheet {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        match row {
            Value::Object(fields) => {
                for key in fields.keys() {
                    if !columns.iter().any(|column| column == key) {
                        columns.push(key.clone());
                    }
                }
            }
            _ => {
                if !columns.iter().any(|column| column == SCALAR_COLUMN) {
                    columns.push(SCALAR_COLUMN.to_string());
                }
            }
        }
    }

    let cells = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| match row {
                    Value::Object(fields) => fields
                        .get(column)
                        .map(CellValue::from_json)
                        .unwrap_or(CellValue::Empty),
                    scalar if column == SCALAR_COLUMN => CellValue::from_json(scalar),
                    _ => CellValue::Empty,
                })
                .collect()
        })
        .collect();

    SnapshotSheet {
        name: name.to_string(),
        columns,
        rows: cells,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_snapshot_yields_seven_empty_sheets() {
        let document = build_snapshot_document(&MirrorSnapshot::default());
        let names: Vec<&str> = document.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Company", "Clients", "WorkItems", "Invoices", "Estimates", "Units", "Categories"]
        );
        assert!(document.sheets.iter().all(SnapshotSheet::is_empty));
    }

    #[test]
    fn columns_follow_record_field_order_not_alphabet() {
        let snapshot = MirrorSnapshot {
            units: json!([{"zeta": "m2", "alpha": 1}]),
            ..MirrorSnapshot::default()
        };
        let document = build_snapshot_document(&snapshot);
        let units = document.sheet("Units").expect("units sheet");

        assert_eq!(units.columns, vec!["zeta", "alpha"]);
    }

    #[test]
    fn columns_are_union_in_first_seen_order() {
        let snapshot = MirrorSnapshot {
            clients: json!([
                {"id": 1, "name": "Kim"},
                {"id": 2, "phone": "010", "vip": true, "tags": ["a"]},
            ]),
            ..MirrorSnapshot::default()
        };
        let document = build_snapshot_document(&snapshot);
        let clients = document.sheet("Clients").expect("clients sheet");

        assert_eq!(clients.columns, vec!["id", "name", "phone", "vip", "tags"]);
        assert_eq!(
            clients.rows,
            vec![
                vec![
                    CellValue::Number(1.0),
                    CellValue::Text("Kim".into()),
                    CellValue::Empty,
                    CellValue::Empty,
                    CellValue::Empty,
                ],
                vec![
                    CellValue::Number(2.0),
                    CellValue::Empty,
                    CellValue::Text("010".into()),
                    CellValue::Bool(true),
                    CellValue::Text("[\"a\"]".into()),
                ],
            ]
        );
    }

    #[test]
    fn lookups_and_company_shapes() {
        let snapshot = MirrorSnapshot {
            company_info: json!({"name": "ACME"}),
            units: json!(["m2", "ea"]),
            categories: json!(["Labor"]),
            invoices: json!({"not": "an array"}),
            ..MirrorSnapshot::default()
        };
        let document = build_snapshot_document(&snapshot);

        let company = document.sheet("Company").expect("company");
        assert_eq!(company.columns, vec!["name"]);
        assert_eq!(company.rows.len(), 1);

        let units = document.sheet("Units").expect("units");
        assert_eq!(units.columns, vec!["unit"]);
        assert_eq!(units.rows[1], vec![CellValue::Text("ea".into())]);

        let categories = document.sheet("Categories").expect("categories");
        assert_eq!(categories.columns, vec!["category"]);

        assert!(document.sheet("Invoices").expect("invoices").is_empty());
    }

    #[test]
    fn scalar_rows_use_value_column() {
        let snapshot = MirrorSnapshot {
            work_items: json!([{"id": 1}, "loose", null]),
            ..MirrorSnapshot::default()
        };
        let document = build_snapshot_document(&snapshot);
        let sheet = document.sheet("WorkItems").expect("work items");
        assert_eq!(sheet.columns, vec!["id", "value"]);
        assert_eq!(
            sheet.rows[1],
            vec![CellValue::Empty, CellValue::Text("loose".into())]
        );
        assert_eq!(sheet.rows[2], vec![CellValue::Empty, CellValue::Empty]);
    }

    #[test]
    fn snapshot_deserializes_from_camel_case_state() {
        let snapshot: MirrorSnapshot =
            serde_json::from_value(json!({"companyInfo": {"a": 1}, "workItems": []}))
                .expect("snapshot");
        assert_eq!(snapshot.company_info, json!({"a": 1}));
        assert_eq!(snapshot.work_items, json!([]));
        assert_eq!(snapshot.clients, Value::Null);
    }
}
