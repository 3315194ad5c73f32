//! xlsx encoding of snapshot documents.

use platform_host::StorageError;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::snapshot::{CellValue, SnapshotDocument, SnapshotSheet};

const MAX_CELL_CHARS: usize = 32_767;

/// Encodes `document` as xlsx bytes, one worksheet per sheet with a bold header row.
///
/// # Errors
///
/// Returns [`StorageError::Encode`] when the workbook cannot be assembled.
pub fn encode_workbook(document: &SnapshotDocument) -> Result<Vec<u8>, StorageError> {
    build_workbook(document).map_err(|err| StorageError::Encode(err.to_string()))
}

fn build_workbook(document: &SnapshotDocument) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    for sheet in &document.sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet, &header)?;
    }
    workbook.save_to_buffer()
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &SnapshotSheet,
    header: &Format,
) -> Result<(), XlsxError> {
    worksheet.set_name(&sheet.name)?;
    for (col, column) in sheet.columns.iter().enumerate() {
        let col = column_index(col)?;
        worksheet.write_string_with_format(0, col, clamp_text(column), header)?;
    }
    for (index, row) in sheet.rows.iter().enumerate() {
        let row_num = u32::try_from(index + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, cell) in row.iter().enumerate() {
            let col = column_index(col)?;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(text) => {
                    worksheet.write_string(row_num, col, clamp_text(text))?;
                }
                CellValue::Number(number) => {
                    worksheet.write_number(row_num, col, *number)?;
                }
                CellValue::Bool(flag) => {
                    worksheet.write_boolean(row_num, col, *flag)?;
                }
            }
        }
    }
    Ok(())
}

fn column_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

// Cells reject strings longer than the xlsx limit.
fn clamp_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::snapshot::{build_snapshot_document, MirrorSnapshot};

    #[test]
    fn encodes_zip_container() {
        let snapshot = MirrorSnapshot {
            clients: json!([{"id": 1, "name": "Kim", "active": true}]),
            units: json!(["m2"]),
            ..MirrorSnapshot::default()
        };
        let bytes = encode_workbook(&build_snapshot_document(&snapshot)).expect("encode");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_document_still_encodes() {
        let bytes =
            encode_workbook(&build_snapshot_document(&MirrorSnapshot::default())).expect("encode");
        assert!(!bytes.is_empty());
    }

    #[test]
    fn duplicate_sheet_names_are_encode_errors() {
        let sheet = SnapshotSheet {
            name: "Clients".to_string(),
            ..SnapshotSheet::default()
        };
        let document = SnapshotDocument {
            sheets: vec![sheet.clone(), sheet],
        };
        assert!(matches!(
            encode_workbook(&document),
            Err(StorageError::Encode(_))
        ));
    }

    #[test]
    fn long_text_is_clamped_on_char_boundary() {
        let long = "é".repeat(MAX_CELL_CHARS + 5);
        assert_eq!(clamp_text(&long).chars().count(), MAX_CELL_CHARS);
        assert_eq!(clamp_text("short"), "short");
    }
}
