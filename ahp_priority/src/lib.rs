/*!
Priorities from pairwise comparisons, using the Analytic Hierarchy Process.

The engine is a set of pure functions:
- [`repair`] turns raw judgments into a reciprocal comparison matrix,
- [`derive_weights`] and [`derive_priorities`] compute the priority vector and its consistency,
- [`aggregate`] combines the criteria weights with the alternative weights of every criterion,
- [`evaluate_hierarchy`] runs all of the above for a two-level hierarchy.

```
use ahp_priority::*;
# fn main() -> Result<(), AhpErrors> {
let criteria = ItemSet::new("criteria", &["Cost".to_string(), "Quality".to_string()])?;
let m = ComparisonMatrix::from_rows("criteria", &criteria, &[vec![1.0, 4.0], vec![0.0, 1.0]])?;
let (weights, consistency) = derive_weights(&m)?;
assert!((weights.get("Cost").unwrap() - 0.8).abs() < 1e-12);
assert_eq!(consistency.cr, 0.0);
# Ok(())
# }
```

See the [manual] for the input formats of the command line program.
*/
mod config;
pub mod builder;
pub mod manual;

use log::{debug, info, warn};

pub use crate::config::*;

/// Produces a reciprocal copy of a comparison matrix.
///
/// - the diagonal is set to 1,
/// - for every pair i < j with a non-zero upper entry v, the lower entry becomes 1/v,
///   overwriting whatever was there,
/// - a zero upper entry is an unset judgment and both entries are left untouched.
///
/// The input is not modified. Values are not clamped to the judgment scale.
pub fn repair(matrix: &ComparisonMatrix) -> Result<ComparisonMatrix, AhpErrors> {
    let n = matrix.size();
    if n < 2 {
        return Err(AhpErrors::InsufficientItems {
            what: format!("items in matrix {}", matrix.name()),
            found: n,
        });
    }
    let mut res = matrix.clone();
    for i in 0..n {
        res.set(i, i, 1.0);
        for j in (i + 1)..n {
            let v = matrix.get(i, j);
            if v != 0.0 {
                res.set(j, i, 1.0 / v);
            } else {
                debug!(
                    "repair: {}: no judgment for ({}, {}) yet",
                    matrix.name(),
                    matrix.label(i),
                    matrix.label(j)
                );
            }
        }
    }
    Ok(res)
}

// Every off-diagonal entry must be a positive finite judgment before derivation.
fn check_entries(matrix: &ComparisonMatrix) -> Result<(), AhpErrors> {
    let n = matrix.size();
    for i in 0..n {
        for j in 0..n {
            let v = matrix.get(i, j);
            if i != j && v == 0.0 {
                return Err(AhpErrors::MissingJudgment {
                    matrix: matrix.name().to_string(),
                    row: matrix.label(i.min(j)),
                    column: matrix.label(i.max(j)),
                });
            }
            if !(v.is_finite() && v > 0.0) {
                return Err(AhpErrors::DegenerateMatrix {
                    matrix: matrix.name().to_string(),
                    reason: format!(
                        "entry ({}, {}) is {}",
                        matrix.label(i),
                        matrix.label(j),
                        v
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Column normalization followed by row averages.
///
/// Returns the weights (in item order) and the normalized matrix.
fn priority_vector(matrix: &ComparisonMatrix) -> Result<(Vec<f64>, Vec<Vec<f64>>), AhpErrors> {
    let n = matrix.size();
    let col_sums: Vec<f64> = (0..n)
        .map(|j| (0..n).map(|i| matrix.get(i, j)).sum())
        .collect();
    debug!("priority_vector: {}: col_sums: {:?}", matrix.name(), col_sums);
    for (j, s) in col_sums.iter().enumerate() {
        if !(s.is_finite() && *s > 0.0) {
            return Err(AhpErrors::DegenerateMatrix {
                matrix: matrix.name().to_string(),
                reason: format!("column {} sums to {}", matrix.label(j), s),
            });
        }
    }

    let normalized: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| matrix.get(i, j) / col_sums[j]).collect())
        .collect();
    debug!(
        "priority_vector: {}: normalized: {:?}",
        matrix.name(),
        normalized
    );

    let raw: Vec<f64> = normalized
        .iter()
        .map(|row| row.iter().sum::<f64>() / n as f64)
        .collect();
    // Already close to 1, this removes the accumulated drift.
    let total: f64 = raw.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(AhpErrors::DegenerateMatrix {
            matrix: matrix.name().to_string(),
            reason: format!("weights sum to {}", total),
        });
    }
    let weights = raw.iter().map(|w| w / total).collect();
    Ok((weights, normalized))
}

/// Computes λmax, CI and CR of a matrix against the weights derived from it.
///
/// A single item needs no comparison: n = 1 gives CI = CR = 0.
pub fn evaluate_consistency(
    matrix: &ComparisonMatrix,
    weights: &[f64],
) -> Result<ConsistencyResult, AhpErrors> {
    let n = matrix.size();
    if weights.len() != n {
        return Err(AhpErrors::InputShapeMismatch {
            what: format!("weights for matrix {}", matrix.name()),
            expected: n,
            found: weights.len(),
        });
    }
    if let Some((idx, w)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !(w.is_finite() && **w > 0.0))
    {
        return Err(AhpErrors::DegenerateMatrix {
            matrix: matrix.name().to_string(),
            reason: format!("weight of {} is {}", matrix.label(idx), w),
        });
    }

    let weighted_sum: Vec<f64> = (0..n)
        .map(|i| {
            matrix
                .row(i)
                .iter()
                .zip(weights.iter())
                .map(|(a, w)| a * w)
                .sum()
        })
        .collect();
    let consistency_vector: Vec<f64> = weighted_sum
        .iter()
        .zip(weights.iter())
        .map(|(aw, w)| aw / w)
        .collect();
    debug!(
        "evaluate_consistency: {}: consistency vector: {:?}",
        matrix.name(),
        consistency_vector
    );
    let lambda_max = consistency_vector.iter().sum::<f64>() / n as f64;

    let ci = if n > 1 {
        clamp_noise((lambda_max - n as f64) / (n - 1) as f64)
    } else {
        0.0
    };
    let ri = random_index(n);
    let cr = if ri != 0.0 { clamp_noise(ci / ri) } else { 0.0 };
    Ok(ConsistencyResult {
        lambda_max,
        ci,
        ri,
        cr,
    })
}

fn clamp_noise(x: f64) -> f64 {
    if (-CONSISTENCY_EPSILON..=0.0).contains(&x) {
        0.0
    } else {
        x
    }
}

/// Derives the weight vector and the consistency diagnostic of a comparison matrix.
///
/// The matrix is repaired first (see [`repair`]); unset judgments are rejected.
pub fn derive_weights(
    matrix: &ComparisonMatrix,
) -> Result<(WeightVector, ConsistencyResult), AhpErrors> {
    let p = derive_priorities(matrix, &AhpRules::DEFAULT_RULES)?;
    Ok((p.weights, p.consistency))
}

/// Same as [`derive_weights`], keeping the intermediate tables and applying the
/// consistency threshold of the given rules.
pub fn derive_priorities(
    matrix: &ComparisonMatrix,
    rules: &AhpRules,
) -> Result<PriorityResult, AhpErrors> {
    let repaired = repair(matrix)?;
    check_entries(&repaired)?;
    let (weights, normalized) = priority_vector(&repaired)?;
    let consistency = evaluate_consistency(&repaired, &weights)?;
    let consistent = consistency.is_consistent_with(rules.consistency_threshold);

    info!(
        "{}: weights {:?}, lambda_max {:.4}, CI {:.4}, CR {:.4}",
        matrix.name(),
        weights,
        consistency.lambda_max,
        consistency.ci,
        consistency.cr
    );
    if !consistent {
        warn!(
            "{}: judgments are inconsistent (CR {:.4} > {})",
            matrix.name(),
            consistency.cr,
            rules.consistency_threshold
        );
    }

    Ok(PriorityResult {
        name: matrix.name().to_string(),
        weights: WeightVector::new(repaired.items(), &weights)?,
        matrix: repaired,
        normalized,
        consistency,
        consistent,
    })
}

/// Combines the criteria weights with the alternative weights of each criterion.
///
/// Arguments:
/// * `criteria_weights` the weight of every criterion
/// * `alternative_weights` the weights of the alternatives under each criterion, in
///   criteria order. All of them must cover the same alternatives; they are aligned
///   by label on the alternative order of the first one.
pub fn aggregate(
    criteria_weights: &WeightVector,
    alternative_weights: &[WeightVector],
) -> Result<RankingResult, AhpErrors> {
    let k = criteria_weights.len();
    if alternative_weights.len() != k {
        return Err(AhpErrors::InputShapeMismatch {
            what: "alternative weight vectors (one per criterion)".to_string(),
            expected: k,
            found: alternative_weights.len(),
        });
    }
    let alternatives: ItemSet = match alternative_weights.first() {
        Some(wv) => wv.items().clone(),
        None => {
            return Err(AhpErrors::InsufficientItems {
                what: "criteria".to_string(),
                found: 0,
            })
        }
    };
    let m = alternatives.len();

    // local[i][c]: weight of alternative i under criterion c
    let mut local: Vec<Vec<f64>> = vec![vec![0.0; k]; m];
    for (c, wv) in alternative_weights.iter().enumerate() {
        let criterion = criteria_weights.items().label(c).unwrap_or_default();
        if wv.len() != m {
            return Err(AhpErrors::InputShapeMismatch {
                what: format!("alternative weights under criterion {}", criterion),
                expected: m,
                found: wv.len(),
            });
        }
        for (name, w) in wv.iter() {
            let i = alternatives
                .position(name)
                .ok_or_else(|| AhpErrors::UnknownItem {
                    what: format!("alternatives (criterion {})", criterion),
                    item: name.to_string(),
                })?;
            local[i][c] = w;
        }
    }

    let weighted: Vec<Vec<f64>> = local
        .iter()
        .map(|row| {
            row.iter()
                .zip(criteria_weights.weights().iter())
                .map(|(w, cw)| w * cw)
                .collect()
        })
        .collect();
    let scores: Vec<f64> = weighted.iter().map(|row| row.iter().sum()).collect();
    debug!("aggregate: scores: {:?}", scores);

    let mut ranked: Vec<(String, f64)> = alternatives
        .labels()
        .iter()
        .cloned()
        .zip(scores.iter().cloned())
        .collect();
    // Stable: ties keep the input order.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let ranking: Vec<RankedAlternative> = ranked
        .into_iter()
        .enumerate()
        .map(|(idx, (name, score))| RankedAlternative {
            name,
            score,
            rank: idx + 1,
        })
        .collect();
    for ra in ranking.iter() {
        info!("Rank {}: {} ({:.4})", ra.rank, ra.name, ra.score);
    }

    Ok(RankingResult {
        criteria: criteria_weights.items().clone(),
        alternatives,
        scores,
        weighted,
        ranking,
    })
}

/// Runs a complete two-level hierarchy.
///
/// Arguments:
/// * `criteria` the comparison matrix of the criteria
/// * `alternatives` one comparison matrix of the alternatives per criterion, in criteria order
/// * `rules` the rules that govern this computation
///
/// Every matrix is evaluated on its own: a failure in one of them does not prevent
/// the others from being computed. If exactly one computation fails its error is
/// returned, otherwise all the errors are returned together.
pub fn evaluate_hierarchy(
    criteria: &ComparisonMatrix,
    alternatives: &[ComparisonMatrix],
    rules: &AhpRules,
) -> Result<HierarchyResult, AhpErrors> {
    info!(
        "Processing {} criteria and {} alternative matrices, rules: {:?}",
        criteria.size(),
        alternatives.len(),
        rules
    );
    if alternatives.len() != criteria.size() {
        return Err(AhpErrors::InputShapeMismatch {
            what: "alternative matrices (one per criterion)".to_string(),
            expected: criteria.size(),
            found: alternatives.len(),
        });
    }

    let mut failures: Vec<AhpErrors> = Vec::new();
    let criteria_res = derive_priorities(criteria, rules)
        .map_err(|e| failures.push(e))
        .ok();

    let mut alt_results: Vec<PriorityResult> = Vec::new();
    for m in alternatives.iter() {
        if let Some(first) = alternatives.first() {
            if m.size() != first.size() {
                failures.push(AhpErrors::InputShapeMismatch {
                    what: format!("alternatives in matrix {}", m.name()),
                    expected: first.size(),
                    found: m.size(),
                });
                continue;
            }
            let unknown = m
                .items()
                .labels()
                .iter()
                .find(|l| first.items().position(l).is_none());
            if let Some(label) = unknown {
                failures.push(AhpErrors::UnknownItem {
                    what: format!("alternatives of matrix {}", first.name()),
                    item: label.clone(),
                });
                continue;
            }
        }
        match derive_priorities(m, rules) {
            Ok(p) => alt_results.push(p),
            Err(e) => {
                warn!("evaluate_hierarchy: {}", e);
                failures.push(e)
            }
        }
    }

    let criteria_res = match (criteria_res, failures.len()) {
        (Some(c), 0) => c,
        _ if failures.len() == 1 => return Err(failures.remove(0)),
        _ => return Err(AhpErrors::HierarchyFailed(failures)),
    };

    let alt_weights: Vec<WeightVector> = alt_results.iter().map(|p| p.weights.clone()).collect();
    let ranking = aggregate(&criteria_res.weights, &alt_weights)?;
    if let Some(best) = ranking.best() {
        info!("Best alternative: {} ({:.4})", best.name, best.score);
    }

    Ok(HierarchyResult {
        criteria: criteria_res,
        alternatives: alt_results,
        ranking,
    })
}

/// Splits a comma-separated list of labels, trimming each one and dropping the empty ones.
///
/// `what` names the labels in the error messages. At least 2 distinct labels are required.
pub fn parse_labels(what: &str, text: &str) -> Result<ItemSet, AhpErrors> {
    let labels: Vec<String> = text
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if labels.len() < 2 {
        return Err(AhpErrors::InsufficientItems {
            what: what.to_string(),
            found: labels.len(),
        });
    }
    ItemSet::new(what, &labels)
}
