// Reading comparison tables from Excel workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::ahp::{io_common::LabeledTable, *};

pub fn read_excel_table(path: &str, src: &MatrixSource) -> AhpResult<LabeledTable> {
    let first_row = src.first_row_index()?;
    let first_col = src.first_column_index()?;
    let wrange = get_range(path, src)?;

    // The range only covers the cells in use: positions are shifted by its start.
    let (row0, col0) = wrange
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .context(EmptyTableSnafu { path })?;
    if first_col < col0 {
        whatever!("{}: no labels found in column {}", path, first_col + 1)
    }
    let label_col = first_col - col0;

    let mut iter = wrange
        .rows()
        .enumerate()
        .filter(|(idx, _)| row0 + idx >= first_row)
        .map(|(_, row)| row);

    let header = iter.next().context(EmptyTableSnafu { path })?;
    debug!("read_excel_table: {}: header: {:?}", path, header);
    let mut column_labels: Vec<String> = Vec::new();
    for cell in header.iter().skip(label_col + 1) {
        column_labels.push(cell_text(path, cell)?);
    }

    let mut rows: Vec<(String, Vec<String>)> = Vec::new();
    for row in iter {
        debug!("read_excel_table: row: {:?}", row);
        let label = match row.get(label_col) {
            Some(cell) => cell_text(path, cell)?,
            None => "".to_string(),
        };
        let mut cells: Vec<String> = Vec::new();
        for cell in row.iter().skip(label_col + 1) {
            cells.push(cell_text(path, cell)?);
        }
        rows.push((label, cells));
    }
    Ok(LabeledTable {
        path: path.to_string(),
        column_labels,
        rows,
    })
}

fn get_range(path: &str, src: &MatrixSource) -> AhpResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    match &src.excel_worksheet_name {
        Some(worksheet) => workbook
            .worksheet_range(worksheet)
            .context(MissingWorksheetSnafu {
                path,
                worksheet: worksheet.clone(),
            })?
            .context(OpeningExcelSnafu { path }),
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyTableSnafu { path })?
            .context(OpeningExcelSnafu { path }),
    }
}

fn cell_text(path: &str, cell: &DataType) -> AhpResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Empty => Ok("".to_string()),
        _ => whatever!("{}: unexpected content in cell: {:?}", path, cell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cells() {
        assert_eq!(cell_text("t.xlsx", &DataType::Float(0.25)).unwrap(), "0.25");
        assert_eq!(cell_text("t.xlsx", &DataType::Int(3)).unwrap(), "3");
        assert_eq!(
            cell_text("t.xlsx", &DataType::String(" Cost ".to_string())).unwrap(),
            "Cost"
        );
        assert_eq!(cell_text("t.xlsx", &DataType::Empty).unwrap(), "");
        assert!(cell_text("t.xlsx", &DataType::Bool(true)).is_err());
    }

    fn fixture() -> String {
        format!("{}/tests/data/judgments.xlsx", env!("CARGO_MANIFEST_DIR"))
    }

    fn source(js: serde_json::Value) -> MatrixSource {
        serde_json::from_value(js).unwrap()
    }

    fn items(labels: &[&str]) -> ItemSet {
        let v: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        ItemSet::new("criteria", &v).unwrap()
    }

    #[test]
    fn first_worksheet_by_default() {
        let src = source(json!({"provider": "xlsx", "filePath": "judgments.xlsx"}));
        let t = read_excel_table(&fixture(), &src).unwrap();
        assert_eq!(t.column_labels, vec!["A", "B"]);
        assert_eq!(
            t.rows,
            vec![
                ("A".to_string(), vec!["1".to_string(), "3".to_string()]),
                ("B".to_string(), vec!["".to_string(), "1".to_string()]),
            ]
        );
        let m = io_common::table_to_matrix("criteria", &items(&["A", "B"]), &t).unwrap();
        let (weights, consistency) = derive_weights(&m).unwrap();
        assert!((weights.get("A").unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(consistency.cr, 0.0);
    }

    #[test]
    fn offset_table_on_named_worksheet() {
        // The table starts at B3, below a title in B1.
        let src = source(json!({
            "provider": "xlsx",
            "filePath": "judgments.xlsx",
            "excelWorksheetName": "Criteria",
            "firstRowIndex": 3,
            "firstColumnIndex": "B"
        }));
        let t = read_excel_table(&fixture(), &src).unwrap();
        assert_eq!(t.column_labels, vec!["Cost", "Reliability", "Sustainability"]);
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.rows[0].0, "Cost");
        assert_eq!(t.rows[0].1, vec!["1", "2", "4"]);
        assert_eq!(t.rows[1].1, vec!["1/2", "1", "3"]);
        assert_eq!(t.rows[2].1, vec!["", "", "1"]);

        let criteria = items(&["Cost", "Reliability", "Sustainability"]);
        let m = io_common::table_to_matrix("criteria", &criteria, &t).unwrap();
        let (weights, consistency) = derive_weights(&m).unwrap();
        assert!((weights.weights()[0] - 0.5571428571428572).abs() < 1e-12);
        assert!((weights.weights()[1] - 0.32023809523809527).abs() < 1e-12);
        assert!((weights.weights()[2] - 0.12261904761904763).abs() < 1e-12);
        assert!((consistency.cr - 0.015797236327215806).abs() < 1e-12);
    }

    #[test]
    fn label_column_outside_the_table() {
        // Nothing is written in column A of this worksheet.
        let src = source(json!({
            "provider": "xlsx",
            "filePath": "judgments.xlsx",
            "excelWorksheetName": "Criteria",
            "firstRowIndex": 3,
            "firstColumnIndex": "A"
        }));
        assert!(matches!(
            read_excel_table(&fixture(), &src),
            Err(AhpError::Whatever { .. })
        ));
    }

    #[test]
    fn missing_worksheet() {
        let src = MatrixSource::from_file("xlsx", &fixture(), Some("Weights".to_string()));
        assert!(matches!(
            read_excel_table(&fixture(), &src),
            Err(AhpError::MissingWorksheet { .. })
        ));
    }

    #[test]
    fn missing_workbook() {
        let src = MatrixSource::from_file("xlsx", "does_not_exist.xlsx", None);
        assert!(matches!(
            read_excel_table("does_not_exist.xlsx", &src),
            Err(AhpError::OpeningExcel { .. })
        ));
    }
}
