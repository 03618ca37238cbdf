// Primitives for reading and writing CSV files.

use std::fs::File;

use crate::ahp::{io_common::LabeledTable, *};

pub fn read_csv_table(path: &str, src: &MatrixSource) -> AhpResult<LabeledTable> {
    let first_col = src.first_column_index()?;
    let (mut records, row_offset) = get_records(path, src)?;

    let header = records
        .next()
        .context(EmptyTableSnafu { path })?
        .context(CsvLineParseSnafu {
            path,
            lineno: row_offset + 1,
        })?;
    let column_labels: Vec<String> = header
        .iter()
        .skip(first_col + 1)
        .map(|s| s.trim().to_string())
        .collect();
    debug!("read_csv_table: {}: columns: {:?}", path, column_labels);

    let mut rows: Vec<(String, Vec<String>)> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let label = line.get(first_col).unwrap_or("").trim().to_string();
        let cells: Vec<String> = line.iter().skip(first_col + 1).map(|s| s.to_string()).collect();
        debug!("read_csv_table: lineno: {:?} row: {:?} {:?}", lineno, label, cells);
        rows.push((label, cells));
    }
    Ok(LabeledTable {
        path: path.to_string(),
        column_labels,
        rows,
    })
}

fn get_records(
    path: &str,
    src: &MatrixSource,
) -> AhpResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = src.first_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    for _ in 0..first_row {
        records.next();
    }
    Ok((records, first_row))
}

/// Writes the comparison matrix, the normalized matrix, the weights and the
/// consistency figures of one computation.
pub fn write_priorities(dir: &Path, p: &PriorityResult) -> AhpResult<()> {
    let prefix = io_common::slug(&p.name);
    let labels: Vec<String> = p.weights.items().labels().to_vec();
    let mut header: Vec<String> = vec![String::new()];
    header.extend(labels.iter().cloned());

    let labeled = |table: &[Vec<f64>]| -> Vec<Vec<String>> {
        labels
            .iter()
            .zip(table.iter())
            .map(|(l, row)| {
                let mut r = vec![l.clone()];
                r.extend(row.iter().map(|x| x.to_string()));
                r
            })
            .collect()
    };

    write_table(
        &dir.join(format!("{}_comparison.csv", prefix)),
        &header,
        &labeled(&p.matrix.rows()),
    )?;
    write_table(
        &dir.join(format!("{}_normalized.csv", prefix)),
        &header,
        &labeled(&p.normalized),
    )?;
    write_table(
        &dir.join(format!("{}_weights.csv", prefix)),
        &["item".to_string(), "weight".to_string()],
        &p.weights
            .iter()
            .map(|(l, w)| vec![l.to_string(), w.to_string()])
            .collect::<Vec<Vec<String>>>(),
    )?;
    let c = p.consistency;
    write_table(
        &dir.join(format!("{}_consistency.csv", prefix)),
        &["lambda_max", "ci", "ri", "cr", "consistent"].map(|s| s.to_string()),
        &[vec![
            c.lambda_max.to_string(),
            c.ci.to_string(),
            c.ri.to_string(),
            c.cr.to_string(),
            p.consistent.to_string(),
        ]],
    )
}

/// Writes the weighted table and the final ranking.
pub fn write_ranking(dir: &Path, r: &RankingResult) -> AhpResult<()> {
    let mut header: Vec<String> = vec!["alternative".to_string()];
    header.extend(r.criteria.labels().iter().cloned());
    header.push("score".to_string());
    let weighted: Vec<Vec<String>> = r
        .alternatives
        .labels()
        .iter()
        .zip(r.weighted.iter().zip(r.scores.iter()))
        .map(|(l, (row, score))| {
            let mut line = vec![l.clone()];
            line.extend(row.iter().map(|x| x.to_string()));
            line.push(score.to_string());
            line
        })
        .collect();
    write_table(&dir.join("weighted.csv"), &header, &weighted)?;

    let ranking: Vec<Vec<String>> = r
        .ranking
        .iter()
        .map(|ra| vec![ra.rank.to_string(), ra.name.clone(), ra.score.to_string()])
        .collect();
    write_table(
        &dir.join("ranking.csv"),
        &["rank", "alternative", "score"].map(|s| s.to_string()),
        &ranking,
    )
}

fn write_table(path: &Path, header: &[String], rows: &[Vec<String>]) -> AhpResult<()> {
    let p = path.display().to_string();
    debug!("write_table: {}", p);
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path: p.clone() })?;
    wtr.write_record(header)
        .context(CsvWriteSnafu { path: p.clone() })?;
    for row in rows {
        wtr.write_record(row)
            .context(CsvWriteSnafu { path: p.clone() })?;
    }
    wtr.flush().context(WritingOutputSnafu { path: p })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn reads_template_layout() {
        let src = MatrixSource::from_file("csv", &fixture("criteria.csv"), None);
        let t = read_csv_table(&fixture("criteria.csv"), &src).unwrap();
        assert_eq!(t.column_labels, vec!["Cost", "Reliability", "Sustainability"]);
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.rows[0].0, "Cost");
        assert_eq!(t.rows[0].1, vec!["1", "2", "4"]);
        assert_eq!(t.rows[2].1, vec!["", "", "1"]);
    }

    #[test]
    fn missing_file() {
        let src = MatrixSource::from_file("csv", &fixture("nope.csv"), None);
        assert!(matches!(
            read_csv_table(&fixture("nope.csv"), &src),
            Err(AhpError::CsvOpen { .. })
        ));
    }
}
