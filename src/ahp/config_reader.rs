use crate::ahp::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "modelName")]
    pub model_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub model: String,
    pub date: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "consistencyThreshold")]
    pub consistency_threshold: f64,
}

/// One pairwise judgment: `a` compared to `b`.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentEntry {
    pub a: String,
    pub b: String,
    pub value: f64,
}

/// Where the judgments of one comparison matrix come from.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MatrixSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    /// For alternative matrices: the criterion they belong to.
    pub criterion: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "firstRowIndex")]
    _first_row_index: Option<JSValue>,
    #[serde(rename = "firstColumnIndex")]
    _first_column_index: Option<JSValue>,
    pub matrix: Option<Vec<Vec<f64>>>,
    pub judgments: Option<Vec<JudgmentEntry>>,
}

impl MatrixSource {
    /// A file source as given on the command line.
    pub fn from_file(provider: &str, file_path: &str, worksheet: Option<String>) -> MatrixSource {
        MatrixSource {
            provider: provider.to_string(),
            file_path: Some(file_path.to_string()),
            criterion: None,
            excel_worksheet_name: worksheet,
            _first_row_index: None,
            _first_column_index: None,
            matrix: None,
            judgments: None,
        }
    }

    /// The row holding the column labels, 0-based.
    pub fn first_row_index(&self) -> AhpResult<usize> {
        read_js_index(&self._first_row_index)
    }

    /// The column holding the row labels, 0-based.
    pub fn first_column_index(&self) -> AhpResult<usize> {
        read_js_index(&self._first_column_index)
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ModelRules {
    #[serde(rename = "consistencyThreshold")]
    pub consistency_threshold: Option<f64>,
    #[serde(rename = "judgmentScale")]
    pub judgment_scale: Option<String>,
}

impl ModelRules {
    pub fn to_rules(&self) -> AhpResult<AhpRules> {
        let consistency_threshold = match self.consistency_threshold {
            None => CONSISTENCY_THRESHOLD,
            Some(x) if x.is_finite() && x >= 0.0 => x,
            Some(x) => whatever!("consistencyThreshold must be a non-negative number, got {}", x),
        };
        let judgment_scale = match self.judgment_scale.as_deref() {
            None | Some("saaty") => JudgmentScale::Saaty,
            Some("unbounded") => JudgmentScale::Unbounded,
            Some(x) => whatever!("unknown judgment scale: {}", x),
        };
        Ok(AhpRules {
            consistency_threshold,
            judgment_scale,
        })
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub criteria: Vec<String>,
    /// Empty when only the criteria weights are needed.
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(rename = "criteriaSource")]
    pub criteria_source: Option<MatrixSource>,
    #[serde(rename = "alternativeSources", default)]
    pub alternative_sources: Vec<MatrixSource>,
    pub rules: Option<ModelRules>,
}

impl ModelConfig {
    pub fn rules(&self) -> AhpResult<AhpRules> {
        match &self.rules {
            Some(r) => r.to_rules(),
            None => Ok(AhpRules::DEFAULT_RULES),
        }
    }

    /// The source of the alternative matrix for the criterion at position `idx`.
    ///
    /// Sources naming their criterion are matched by name, the others by position.
    pub fn alternative_source(&self, idx: usize, criterion: &str) -> AhpResult<&MatrixSource> {
        if let Some(src) = self
            .alternative_sources
            .iter()
            .find(|s| s.criterion.as_deref() == Some(criterion))
        {
            return Ok(src);
        }
        match self.alternative_sources.get(idx) {
            Some(src) if src.criterion.is_none() => Ok(src),
            _ => whatever!(
                "no alternative comparison source for criterion {:?}",
                criterion
            ),
        }
    }
}

pub fn read_config(path: &str) -> AhpResult<ModelConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ModelConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> AhpResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

// 1-based index, as a number or as Excel column letters. Missing means the first one.
fn read_js_index(x: &Option<JSValue>) -> AhpResult<usize> {
    let one_based: usize = match x {
        None => 1,
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {})?,
        // Excel-style columns: A = 1, Z = 26, AA = 27
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            s.to_ascii_uppercase()
                .chars()
                .fold(0, |acc, c| acc * 26 + (c as usize - 'A' as usize + 1))
        }
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu {})?,
        _ => return None.context(ParsingJsonNumberSnafu {}),
    };
    if one_based == 0 {
        return None.context(ParsingJsonNumberSnafu {});
    }
    Ok(one_based - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indexes() {
        assert_eq!(read_js_index(&None).unwrap(), 0);
        assert_eq!(read_js_index(&Some(json!(3))).unwrap(), 2);
        assert_eq!(read_js_index(&Some(json!("2"))).unwrap(), 1);
        assert_eq!(read_js_index(&Some(json!("a"))).unwrap(), 0);
        assert_eq!(read_js_index(&Some(json!("AA"))).unwrap(), 26);
        assert!(read_js_index(&Some(json!(0))).is_err());
        assert!(read_js_index(&Some(json!(true))).is_err());
    }

    #[test]
    fn rules() {
        let r = ModelRules {
            consistency_threshold: Some(0.2),
            judgment_scale: Some("unbounded".to_string()),
        };
        assert_eq!(
            r.to_rules().unwrap(),
            AhpRules {
                consistency_threshold: 0.2,
                judgment_scale: JudgmentScale::Unbounded
            }
        );
        let r = ModelRules {
            consistency_threshold: None,
            judgment_scale: Some("likert".to_string()),
        };
        assert!(r.to_rules().is_err());
    }

    #[test]
    fn alternative_sources_by_name_then_position() {
        let config: ModelConfig = serde_json::from_value(json!({
            "outputSettings": {"modelName": "m"},
            "criteria": ["Cost", "Quality"],
            "alternatives": ["X", "Y"],
            "criteriaSource": {"provider": "json", "matrix": [[1, 2], [0, 1]]},
            "alternativeSources": [
                {"provider": "csv", "filePath": "quality.csv", "criterion": "Quality"},
                {"provider": "csv", "filePath": "cost.csv"}
            ]
        }))
        .unwrap();
        let q = config.alternative_source(1, "Quality").unwrap();
        assert_eq!(q.file_path.as_deref(), Some("quality.csv"));
        let c = config.alternative_source(1, "Cost").unwrap();
        assert_eq!(c.file_path.as_deref(), Some("cost.csv"));
        assert!(config.alternative_source(0, "Cost").is_err());
        assert_eq!(config.rules().unwrap(), AhpRules::DEFAULT_RULES);
    }
}
