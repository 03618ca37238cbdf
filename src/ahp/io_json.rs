use ahp_priority::builder::Builder;

use crate::ahp::*;

/// Reads the judgments written directly in the configuration: either a full matrix
/// or a list of pairwise judgments.
pub fn read_inline(
    name: &str,
    items: &ItemSet,
    src: &MatrixSource,
    rules: &AhpRules,
) -> AhpResult<ComparisonMatrix> {
    match (&src.matrix, &src.judgments) {
        (Some(rows), None) => {
            ComparisonMatrix::from_rows(name, items, rows).context(EngineSnafu {})
        }
        (None, Some(judgments)) => {
            let mut builder = Builder::new(name, items.labels(), rules).context(EngineSnafu {})?;
            for j in judgments.iter() {
                builder
                    .judgment(&j.a, &j.b, j.value)
                    .context(EngineSnafu {})?;
            }
            Ok(builder.build())
        }
        (Some(_), Some(_)) => whatever!(
            "matrix {}: provide either a matrix or judgments, not both",
            name
        ),
        (None, None) => whatever!("matrix {}: the json provider needs a matrix or judgments", name),
    }
}

/// Reads a matrix source stored in its own JSON file.
pub fn read_json_file(path: &str) -> AhpResult<MatrixSource> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let src: MatrixSource = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_json_file: {}: {:?}", path, src);
    Ok(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items() -> ItemSet {
        ItemSet::new("criteria", &["A".to_string(), "B".to_string()]).unwrap()
    }

    fn source(js: serde_json::Value) -> MatrixSource {
        serde_json::from_value(js).unwrap()
    }

    #[test]
    fn inline_matrix_and_judgments() {
        let m = read_inline(
            "criteria",
            &items(),
            &source(json!({"provider": "json", "matrix": [[1, 4], [0, 1]]})),
            &AhpRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(m.get(0, 1), 4.0);

        let m = read_inline(
            "criteria",
            &items(),
            &source(json!({"provider": "json", "judgments": [{"a": "B", "b": "A", "value": 4}]})),
            &AhpRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.get(0, 1), 0.25);
    }

    #[test]
    fn inline_errors() {
        let out_of_scale = source(json!({
            "provider": "json",
            "judgments": [{"a": "A", "b": "B", "value": 12}]
        }));
        assert!(matches!(
            read_inline("criteria", &items(), &out_of_scale, &AhpRules::DEFAULT_RULES),
            Err(AhpError::Engine {
                source: AhpErrors::JudgmentOutOfScale { .. }
            })
        ));
        let empty = source(json!({"provider": "json"}));
        assert!(read_inline("criteria", &items(), &empty, &AhpRules::DEFAULT_RULES).is_err());
    }
}
