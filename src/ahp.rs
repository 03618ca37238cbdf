use log::{debug, info, warn};

use ahp_priority::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::ahp::config_reader::*;
use crate::ahp::io_common::guess_provider;
use crate::args::Args;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_json;

#[derive(Debug, Snafu)]
pub enum AhpError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {worksheet} not found in {path}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display("No table found in {path}"))]
    EmptyTable { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing json"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive index (a number or Excel column letters)"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("{path}: cell ({row:?}, {column:?}) is not a number: {content:?}"))]
    CellNotANumber {
        path: String,
        row: String,
        column: String,
        content: String,
    },
    #[snafu(display("Error creating directory {path}"))]
    CreatingDirectory {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot access the current directory"))]
    CurrentDir { source: std::io::Error },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("{source}"))]
    Engine { source: AhpErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AhpResult<T> = Result<T, AhpError>;

/// What a run computed: either the criteria weights alone or the full hierarchy.
enum ModelOutcome {
    Criteria(PriorityResult),
    Hierarchy(HierarchyResult),
}

fn item_set(what: &str, labels: &[String]) -> AhpResult<ItemSet> {
    let labels: Vec<String> = labels
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if labels.len() < 2 {
        return Err(AhpError::Engine {
            source: AhpErrors::InsufficientItems {
                what: what.to_string(),
                found: labels.len(),
            },
        });
    }
    ItemSet::new(what, &labels).context(EngineSnafu {})
}

fn read_matrix(
    root: &Path,
    name: &str,
    items: &ItemSet,
    src: &MatrixSource,
    rules: &AhpRules,
) -> AhpResult<ComparisonMatrix> {
    let path: Option<String> = src.file_path.as_ref().map(|p| {
        let pb: PathBuf = root.join(p);
        pb.display().to_string()
    });
    info!(
        "Reading matrix {} (provider {}, file {:?})",
        name, src.provider, path
    );
    match (src.provider.as_str(), path) {
        ("csv", Some(p)) => {
            io_common::table_to_matrix(name, items, &io_csv::read_csv_table(&p, src)?)
        }
        ("xlsx" | "excel", Some(p)) => {
            io_common::table_to_matrix(name, items, &io_excel::read_excel_table(&p, src)?)
        }
        ("json", None) => io_json::read_inline(name, items, src, rules),
        ("json", Some(p)) => {
            io_json::read_inline(name, items, &io_json::read_json_file(&p)?, rules)
        }
        ("csv" | "xlsx" | "excel", None) => {
            whatever!("matrix {}: provider {} needs a filePath", name, src.provider)
        }
        (x, _) => whatever!("matrix {}: provider not implemented: {:?}", name, x),
    }
}

/// Merges the command line options into the configuration. Options given on the
/// command line win.
fn config_from_args(args: &Args, base: Option<ModelConfig>) -> AhpResult<ModelConfig> {
    let mut config = match base {
        Some(c) => c,
        None => ModelConfig {
            output_settings: OutputSettings {
                model_name: "ahpp".to_string(),
                output_directory: None,
                date: None,
                description: None,
            },
            criteria: Vec::new(),
            alternatives: Vec::new(),
            criteria_source: None,
            alternative_sources: Vec::new(),
            rules: None,
        },
    };
    if let Some(s) = &args.criteria {
        config.criteria = parse_labels("criteria", s)
            .context(EngineSnafu {})?
            .labels()
            .to_vec();
    }
    if let Some(s) = &args.alternatives {
        config.alternatives = parse_labels("alternatives", s)
            .context(EngineSnafu {})?
            .labels()
            .to_vec();
    }

    // Paths of the command line are relative to the working directory, not to the configuration.
    let cwd = std::env::current_dir().context(CurrentDirSnafu {})?;
    let source = |p: &str| -> MatrixSource {
        let provider = args
            .input_type
            .clone()
            .unwrap_or_else(|| guess_provider(p).to_string());
        MatrixSource::from_file(
            &provider,
            &cwd.join(p).display().to_string(),
            args.excel_worksheet_name.clone(),
        )
    };
    if let Some(p) = &args.criteria_input {
        config.criteria_source = Some(source(p));
    }
    if let Some(ps) = &args.alternative_input {
        config.alternative_sources = ps.iter().map(|p| source(p)).collect();
    }
    Ok(config)
}

fn evaluate(config: &ModelConfig, root: &Path, rules: &AhpRules) -> AhpResult<ModelOutcome> {
    let criteria = item_set("criteria", &config.criteria)?;
    let criteria_src = match &config.criteria_source {
        Some(src) => src,
        None => whatever!("no source for the criteria matrix (--criteria-input or criteriaSource)"),
    };
    let criteria_matrix = read_matrix(root, "criteria", &criteria, criteria_src, rules)?;

    if config.alternatives.is_empty() {
        let p = derive_priorities(&criteria_matrix, rules).context(EngineSnafu {})?;
        return Ok(ModelOutcome::Criteria(p));
    }

    let alternatives = item_set("alternatives", &config.alternatives)?;
    let mut matrices: Vec<ComparisonMatrix> = Vec::new();
    for (idx, criterion) in criteria.labels().iter().enumerate() {
        let src = config.alternative_source(idx, criterion)?;
        let name = format!("alternatives under {}", criterion);
        matrices.push(read_matrix(root, &name, &alternatives, src, rules)?);
    }
    let h = evaluate_hierarchy(&criteria_matrix, &matrices, rules).context(EngineSnafu {})?;
    Ok(ModelOutcome::Hierarchy(h))
}

fn priorities_to_json(p: &PriorityResult) -> JSValue {
    let weights: Vec<JSValue> = p
        .weights
        .iter()
        .map(|(item, weight)| json!({"item": item, "weight": weight}))
        .collect();
    let c = p.consistency;
    json!({
        "name": p.name,
        "weights": weights,
        "consistency": {
            "lambdaMax": c.lambda_max,
            "ci": c.ci,
            "ri": c.ri,
            "cr": c.cr,
            "consistent": p.consistent
        }
    })
}

fn ranking_to_json(r: &RankingResult) -> Vec<JSValue> {
    r.ranking
        .iter()
        .map(|ra| json!({"rank": ra.rank, "alternative": ra.name, "score": ra.score}))
        .collect()
}

fn build_summary_js(config: &ModelConfig, rules: &AhpRules, outcome: &ModelOutcome) -> JSValue {
    let c = OutputConfig {
        model: config.output_settings.model_name.clone(),
        date: config.output_settings.date.clone(),
        description: config.output_settings.description.clone(),
        consistency_threshold: rules.consistency_threshold,
    };
    match outcome {
        ModelOutcome::Criteria(p) => json!({
            "config": c,
            "criteria": priorities_to_json(p),
        }),
        ModelOutcome::Hierarchy(h) => json!({
            "config": c,
            "criteria": priorities_to_json(&h.criteria),
            "alternatives": h.alternatives.iter().map(priorities_to_json).collect::<Vec<JSValue>>(),
            "ranking": ranking_to_json(&h.ranking),
            "best": h.ranking.best().map(|b| b.name.clone()),
        }),
    }
}

fn log_priorities(p: &PriorityResult) {
    info!("{}:", p.name);
    for (item, weight) in p.weights.iter() {
        info!("  {:<24} {:.4}", item, weight);
    }
    let c = p.consistency;
    let mark = if p.consistent { "✓" } else { "⚠" };
    info!(
        "  lambda max {:.4}  CI {:.4}  RI {:.2}  CR {:.4} {}",
        c.lambda_max, c.ci, c.ri, c.cr, mark
    );
}

fn log_report(outcome: &ModelOutcome) {
    match outcome {
        ModelOutcome::Criteria(p) => log_priorities(p),
        ModelOutcome::Hierarchy(h) => {
            log_priorities(&h.criteria);
            for p in h.alternatives.iter() {
                log_priorities(p);
            }
            info!("Ranking:");
            for ra in h.ranking.ranking.iter() {
                info!("  {}. {:<24} {:.4}", ra.rank, ra.name, ra.score);
            }
            if let Some(best) = h.ranking.best() {
                info!("Best alternative: {}", best.name);
            }
        }
    }
}

fn export_tables(dir: &Path, outcome: &ModelOutcome) -> AhpResult<()> {
    let d = dir.display().to_string();
    info!("Exporting tables to {}", d);
    fs::create_dir_all(dir).context(CreatingDirectorySnafu { path: d })?;
    match outcome {
        ModelOutcome::Criteria(p) => io_csv::write_priorities(dir, p),
        ModelOutcome::Hierarchy(h) => {
            io_csv::write_priorities(dir, &h.criteria)?;
            for p in h.alternatives.iter() {
                io_csv::write_priorities(dir, p)?;
            }
            io_csv::write_ranking(dir, &h.ranking)
        }
    }
}

fn check_reference(path: &str, pretty_js: &str) -> AhpResult<()> {
    let summary_ref = read_summary(path)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference {}", path);
    Ok(())
}

/// Runs a full computation as described by the command line, and returns the summary.
pub fn run_model(args: &Args) -> AhpResult<JSValue> {
    let (base, root) = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            let root = Path::new(p)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (Some(config), root)
        }
        None => (None, PathBuf::new()),
    };
    let config = config_from_args(args, base)?;
    info!("config: {:?}", config);
    let rules = config.rules()?;

    let outcome = evaluate(&config, &root, &rules)?;
    log_report(&outcome);

    let result_js = build_summary_js(&config, &rules, &outcome);
    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js),
        Some(p) => {
            info!("Writing summary to {}", p);
            fs::write(p, &pretty_js).context(WritingOutputSnafu { path: p })?;
        }
        None => {}
    }

    let export_dir: Option<PathBuf> = match &args.export_dir {
        Some(d) => Some(PathBuf::from(d)),
        None => config
            .output_settings
            .output_directory
            .as_ref()
            .map(|d| root.join(d)),
    };
    if let Some(dir) = export_dir {
        export_tables(&dir, &outcome)?;
    }

    if let Some(ref_path) = &args.reference {
        check_reference(ref_path, &pretty_js)?;
    }
    Ok(result_js)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn fixture(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let d = std::env::temp_dir().join(format!("ahpp_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&d);
        fs::create_dir_all(&d).unwrap();
        d
    }

    fn close(js: &JSValue, expected: f64) -> bool {
        (js.as_f64().unwrap() - expected).abs() < 1e-12
    }

    #[test]
    fn criteria_only_from_args() {
        init();
        let args = Args {
            criteria: Some("Cost, Reliability, Sustainability".to_string()),
            criteria_input: Some(fixture("criteria.csv")),
            ..Args::default()
        };
        let js = run_model(&args).unwrap();
        let weights = &js["criteria"]["weights"];
        assert_eq!(weights[0]["item"], "Cost");
        assert!(close(&weights[0]["weight"], 0.5571428571428572));
        assert!(close(&weights[1]["weight"], 0.32023809523809527));
        assert!(close(&weights[2]["weight"], 0.12261904761904763));
        assert!(close(&js["criteria"]["consistency"]["cr"], 0.015797236327215806));
        assert_eq!(js["criteria"]["consistency"]["consistent"], true);
        assert!(js.get("ranking").is_none());
    }

    #[test]
    fn file_order_of_the_items_is_respected() {
        init();
        // Same judgments as criteria.csv, with the items listed in another order.
        let args = Args {
            criteria: Some("Cost, Reliability, Sustainability".to_string()),
            criteria_input: Some(fixture("reordered.csv")),
            ..Args::default()
        };
        let js = run_model(&args).unwrap();
        let weights = &js["criteria"]["weights"];
        assert_eq!(weights[0]["item"], "Cost");
        assert!(close(&weights[0]["weight"], 0.5571428571428572));
        assert!(close(&weights[1]["weight"], 0.32023809523809527));
        assert!(close(&weights[2]["weight"], 0.12261904761904763));
        assert!(close(&js["criteria"]["consistency"]["cr"], 0.015797236327215806));
    }

    #[test]
    fn hierarchy_from_config() {
        init();
        let args = Args {
            config: Some(fixture("microgrid.json")),
            ..Args::default()
        };
        let js = run_model(&args).unwrap();
        assert_eq!(js["config"]["model"], "Microgrid site");
        assert_eq!(js["best"], "Site A");
        let ranking = js["ranking"].as_array().unwrap();
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking[0]["rank"], 1);
        let total: f64 = ranking.iter().map(|r| r["score"].as_f64().unwrap()).sum();
        assert!((total - 1.0).abs() < 1e-9);
        let alternatives = js["alternatives"].as_array().unwrap();
        assert_eq!(alternatives[1]["name"], "alternatives under Reliability");
        // Fully consistent judgments: 4/7, 2/7, 1/7
        assert!(close(&alternatives[1]["weights"][0]["weight"], 4.0 / 7.0));
        assert!(close(&alternatives[1]["consistency"]["cr"], 0.0));
    }

    #[test]
    fn inconsistent_judgments_still_produce_weights() {
        init();
        let args = Args {
            criteria: Some("A,B,C".to_string()),
            criteria_input: Some(fixture("cyclic.csv")),
            ..Args::default()
        };
        let js = run_model(&args).unwrap();
        assert_eq!(js["criteria"]["consistency"]["consistent"], false);
        assert!(js["criteria"]["consistency"]["cr"].as_f64().unwrap() > 0.1);
    }

    #[test]
    fn missing_judgment_is_reported() {
        init();
        let args = Args {
            criteria: Some("A,B,C".to_string()),
            criteria_input: Some(fixture("incomplete.csv")),
            ..Args::default()
        };
        assert!(matches!(
            run_model(&args),
            Err(AhpError::Engine {
                source: AhpErrors::MissingJudgment { .. }
            })
        ));
    }

    #[test]
    fn unknown_provider() {
        init();
        let args = Args {
            criteria: Some("A,B,C".to_string()),
            criteria_input: Some(fixture("cyclic.csv")),
            input_type: Some("ods".to_string()),
            ..Args::default()
        };
        assert!(matches!(run_model(&args), Err(AhpError::Whatever { .. })));
    }

    #[test]
    fn reference_check() {
        init();
        let dir = scratch_dir("reference");
        let summary = dir.join("summary.json").display().to_string();
        let args = Args {
            config: Some(fixture("microgrid.json")),
            out: Some(summary.clone()),
            export_dir: Some(dir.join("tables").display().to_string()),
            ..Args::default()
        };
        run_model(&args).unwrap();
        assert!(dir.join("tables").join("ranking.csv").exists());
        assert!(dir.join("tables").join("criteria_weights.csv").exists());
        assert!(dir
            .join("tables")
            .join("alternatives_under_cost_normalized.csv")
            .exists());

        // Same inputs: the summary matches itself.
        let check = Args {
            config: Some(fixture("microgrid.json")),
            reference: Some(summary.clone()),
            ..Args::default()
        };
        assert!(run_model(&check).is_ok());

        // Any change in the reference is detected.
        let altered = fs::read_to_string(&summary)
            .unwrap()
            .replace("Microgrid site", "Other site");
        let altered_path = dir.join("altered.json").display().to_string();
        fs::write(&altered_path, altered).unwrap();
        let check = Args {
            config: Some(fixture("microgrid.json")),
            reference: Some(altered_path),
            ..Args::default()
        };
        assert!(run_model(&check).is_err());
    }
}
