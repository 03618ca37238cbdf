use crate::ahp::*;

/// A comparison table as read from a spreadsheet, before any interpretation of the cells.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LabeledTable {
    pub path: String,
    pub column_labels: Vec<String>,
    /// Row label and the cells of the row.
    pub rows: Vec<(String, Vec<String>)>,
}

/// Reads a judgment cell. Blank cells are unset judgments (0).
/// Fractions such as `1/3` are accepted.
pub fn parse_cell(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    if let Some((num, den)) = s.split_once('/') {
        let num = num.trim().parse::<f64>().ok()?;
        let den = den.trim().parse::<f64>().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    s.parse::<f64>().ok()
}

/// Places the cells of a table in the order of the item set.
///
/// Rows and columns may come in any order, but each label must appear exactly once.
pub fn table_to_matrix(
    name: &str,
    items: &ItemSet,
    table: &LabeledTable,
) -> AhpResult<ComparisonMatrix> {
    let n = items.len();
    let mut column_labels: Vec<&str> = table.column_labels.iter().map(|s| s.trim()).collect();
    while column_labels.last() == Some(&"") {
        column_labels.pop();
    }
    if column_labels.len() != n {
        return Err(AhpError::Engine {
            source: AhpErrors::InputShapeMismatch {
                what: format!("column labels in {}", table.path),
                expected: n,
                found: column_labels.len(),
            },
        });
    }
    let col_pos: Vec<usize> = positions(items, &column_labels, &table.path)?;

    let rows: Vec<&(String, Vec<String>)> = table
        .rows
        .iter()
        .filter(|(label, cells)| {
            !(label.trim().is_empty() && cells.iter().all(|c| c.trim().is_empty()))
        })
        .collect();
    if rows.len() != n {
        return Err(AhpError::Engine {
            source: AhpErrors::InputShapeMismatch {
                what: format!("rows in {}", table.path),
                expected: n,
                found: rows.len(),
            },
        });
    }
    let row_labels: Vec<&str> = rows.iter().map(|(label, _)| label.trim()).collect();
    let row_pos: Vec<usize> = positions(items, &row_labels, &table.path)?;

    let mut values: Vec<Vec<f64>> = vec![vec![0.0; n]; n];
    for ((label, cells), r) in rows.iter().zip(row_pos.iter()) {
        if let Some(extra) = cells.iter().skip(n).find(|c| !c.trim().is_empty()) {
            whatever!(
                "{}: row {:?} has more cells than there are columns: {:?}",
                table.path,
                label,
                extra
            )
        }
        for (c, col) in col_pos.iter().enumerate() {
            let content = cells.get(c).map(|s| s.as_str()).unwrap_or("");
            let v = parse_cell(content).context(CellNotANumberSnafu {
                path: table.path.clone(),
                row: label.clone(),
                column: column_labels[c].to_string(),
                content: content.to_string(),
            })?;
            values[*r][*col] = v;
        }
    }
    resolve_file_order(&col_pos, &mut values);
    debug!("table_to_matrix: {}: {:?}", name, values);
    ComparisonMatrix::from_rows(name, items, &values).context(EngineSnafu {})
}

// Moves the judgments of the file's upper triangle (in its column order) to the upper
// triangle in item order. A pair only filled below the file's diagonal keeps that judgment.
fn resolve_file_order(col_pos: &[usize], values: &mut [Vec<f64>]) {
    let n = values.len();
    let mut file_rank: Vec<usize> = vec![0; n];
    for (c, pos) in col_pos.iter().enumerate() {
        file_rank[*pos] = c;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            let upper = values[i][j];
            let lower = values[j][i];
            let from_lower = if lower != 0.0 { 1.0 / lower } else { 0.0 };
            values[i][j] = if file_rank[i] < file_rank[j] {
                if upper != 0.0 {
                    upper
                } else {
                    from_lower
                }
            } else if lower != 0.0 {
                from_lower
            } else {
                upper
            };
        }
    }
}

fn positions(items: &ItemSet, labels: &[&str], path: &str) -> AhpResult<Vec<usize>> {
    let mut seen: Vec<bool> = vec![false; items.len()];
    let mut res: Vec<usize> = Vec::new();
    for label in labels.iter() {
        let pos = match items.position(label) {
            Some(p) => p,
            None => {
                return Err(AhpError::Engine {
                    source: AhpErrors::UnknownItem {
                        what: format!("declared items (table {})", path),
                        item: label.to_string(),
                    },
                })
            }
        };
        if seen[pos] {
            return Err(AhpError::Engine {
                source: AhpErrors::DuplicateItem {
                    what: format!("labels of table {}", path),
                    item: label.to_string(),
                },
            });
        }
        seen[pos] = true;
        res.push(pos);
    }
    Ok(res)
}

/// A file-name friendly version of a matrix name.
pub fn slug(name: &str) -> String {
    let s: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    s.split('_')
        .filter(|p| !p.is_empty())
        .collect::<Vec<&str>>()
        .join("_")
}

/// The provider to use for a file given on the command line without `--input-type`.
pub fn guess_provider(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("xlsx") | Some("xlsm") => "xlsx",
        Some("json") => "json",
        _ => "csv",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(header: &[&str], rows: &[(&str, &[&str])]) -> LabeledTable {
        LabeledTable {
            path: "test.csv".to_string(),
            column_labels: header.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|(l, cells)| (l.to_string(), cells.iter().map(|s| s.to_string()).collect()))
                .collect(),
        }
    }

    fn items(labels: &[&str]) -> ItemSet {
        let v: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        ItemSet::new("criteria", &v).unwrap()
    }

    #[test]
    fn cells() {
        assert_eq!(parse_cell(""), Some(0.0));
        assert_eq!(parse_cell(" 3 "), Some(3.0));
        assert_eq!(parse_cell("0.25"), Some(0.25));
        assert_eq!(parse_cell("1/4"), Some(0.25));
        assert_eq!(parse_cell(" 1 / 2"), Some(0.5));
        assert_eq!(parse_cell("1/0"), None);
        assert_eq!(parse_cell("high"), None);
    }

    #[test]
    fn reorders_rows_and_columns() {
        let t = table(
            &["B", "A"],
            &[("A", &["2", "1"]), ("B", &["1", ""]), ("", &["", ""])],
        );
        let m = table_to_matrix("criteria", &items(&["A", "B"]), &t).unwrap();
        assert_eq!(m.rows(), vec![vec![1.0, 2.0], vec![0.0, 1.0]]);
        assert_eq!(m.name(), "criteria");
    }

    #[test]
    fn judgments_follow_the_file_order() {
        // The file lists B first: its upper triangle holds B compared to A.
        let t = table(&["B", "A"], &[("B", &["1", "3"]), ("A", &["", "1"])]);
        let m = table_to_matrix("criteria", &items(&["A", "B"]), &t).unwrap();
        assert!((m.get(0, 1) - 1.0 / 3.0).abs() < 1e-15);
        let (weights, _) = derive_weights(&m).unwrap();
        assert!((weights.get("B").unwrap() - 0.75).abs() < 1e-12);

        // When both triangles are filled, the upper triangle of the file wins.
        let t = table(&["B", "A"], &[("B", &["1", "4"]), ("A", &["2", "1"])]);
        let m = table_to_matrix("criteria", &items(&["A", "B"]), &t).unwrap();
        assert_eq!(m.get(0, 1), 0.25);

        // A pair only filled below the diagonal of the file is kept.
        let t = table(&["B", "A"], &[("B", &["1", ""]), ("A", &["2", "1"])]);
        let m = table_to_matrix("criteria", &items(&["A", "B"]), &t).unwrap();
        assert_eq!(m.get(0, 1), 2.0);
    }

    #[test]
    fn rejects_bad_tables() {
        let s = items(&["A", "B"]);
        let unknown = table(&["A", "C"], &[("A", &["1", "2"]), ("C", &["", "1"])]);
        assert!(matches!(
            table_to_matrix("m", &s, &unknown),
            Err(AhpError::Engine {
                source: AhpErrors::UnknownItem { .. }
            })
        ));
        let dup = table(&["A", "B"], &[("A", &["1", "2"]), ("A", &["", "1"])]);
        assert!(matches!(
            table_to_matrix("m", &s, &dup),
            Err(AhpError::Engine {
                source: AhpErrors::DuplicateItem { .. }
            })
        ));
        let text = table(&["A", "B"], &[("A", &["1", "lots"]), ("B", &["", "1"])]);
        assert!(matches!(
            table_to_matrix("m", &s, &text),
            Err(AhpError::CellNotANumber { .. })
        ));
        let short = table(&["A", "B"], &[("A", &["1", "2"])]);
        assert!(matches!(
            table_to_matrix("m", &s, &short),
            Err(AhpError::Engine {
                source: AhpErrors::InputShapeMismatch { .. }
            })
        ));
    }

    #[test]
    fn slugs_and_providers() {
        assert_eq!(slug("alternatives under Cost / Price"), "alternatives_under_cost_price");
        assert_eq!(guess_provider("a/b/judgments.XLSX"), "xlsx");
        assert_eq!(guess_provider("judgments.csv"), "csv");
        assert_eq!(guess_provider("judgments"), "csv");
    }
}
