// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// Judgments with a consistency ratio above this value are flagged as inconsistent.
///
/// The flag is advisory: weights are still computed and returned.
pub const CONSISTENCY_THRESHOLD: f64 = 0.10;

/// Lower bound of the pairwise judgment scale (1/9).
pub const MIN_JUDGMENT: f64 = 1.0 / 9.0;

/// Upper bound of the pairwise judgment scale.
pub const MAX_JUDGMENT: f64 = 9.0;

// Judgment forms usually store 1/9 rounded to 0.111.
pub(crate) const SCALE_TOLERANCE: f64 = 1e-3;

/// CI and CR values in [-CONSISTENCY_EPSILON, 0] are rounding noise and reported as 0.
pub const CONSISTENCY_EPSILON: f64 = 1e-9;

/// Largest accepted distance between the sum of a weight vector and 1.
pub const WEIGHT_SUM_TOLERANCE: f64 = CONSISTENCY_EPSILON;

// Random Index for n = 1..=10.
const RANDOM_INDEX: [f64; 10] = [0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49];

/// The Random Index (expected CI of a random reciprocal matrix) for `n` items.
///
/// The table stops at n = 10. Larger matrices reuse the n = 10 value, which is an
/// approximation ceiling and not an extrapolation.
pub fn random_index(n: usize) -> f64 {
    match n {
        0 => 0.0,
        n => RANDOM_INDEX[n.min(RANDOM_INDEX.len()) - 1],
    }
}

/// An ordered set of unique labels: the criteria, or the alternatives.
///
/// The position of a label is the row and column index it occupies in every
/// matrix and vector built over this set.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ItemSet {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl ItemSet {
    /// Builds an item set. `what` names the set in error messages ("criteria", "alternatives").
    pub fn new(what: &str, labels: &[String]) -> Result<ItemSet, AhpErrors> {
        if labels.is_empty() {
            return Err(AhpErrors::InsufficientItems {
                what: what.to_string(),
                found: 0,
            });
        }
        let mut index: HashMap<String, usize> = HashMap::new();
        for (idx, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), idx).is_some() {
                return Err(AhpErrors::DuplicateItem {
                    what: what.to_string(),
                    item: label.clone(),
                });
            }
        }
        Ok(ItemSet {
            labels: labels.to_vec(),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(|s| s.as_str())
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).cloned()
    }
}

/// A square table of pairwise judgments over an item set.
///
/// Entry (i, j) reads "item i compared to item j". The upper triangle is the
/// authoritative input; see [`crate::repair`] for how the rest is filled in.
/// A zero entry means the judgment has not been provided yet.
#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonMatrix {
    name: String,
    items: ItemSet,
    // Row-major, items.len() * items.len()
    values: Vec<f64>,
}

impl ComparisonMatrix {
    /// A matrix with every judgment set to 1 (all items equally important).
    pub fn ones(name: &str, items: &ItemSet) -> ComparisonMatrix {
        let n = items.len();
        ComparisonMatrix {
            name: name.to_string(),
            items: items.clone(),
            values: vec![1.0; n * n],
        }
    }

    /// Builds a matrix from rows listed in item order.
    pub fn from_rows(
        name: &str,
        items: &ItemSet,
        rows: &[Vec<f64>],
    ) -> Result<ComparisonMatrix, AhpErrors> {
        let n = items.len();
        if rows.len() != n {
            return Err(AhpErrors::InputShapeMismatch {
                what: format!("rows of matrix {}", name),
                expected: n,
                found: rows.len(),
            });
        }
        let mut values: Vec<f64> = Vec::with_capacity(n * n);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(AhpErrors::InputShapeMismatch {
                    what: format!(
                        "columns in row {} of matrix {}",
                        items.label(idx).unwrap_or_default(),
                        name
                    ),
                    expected: n,
                    found: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(ComparisonMatrix {
            name: name.to_string(),
            items: items.clone(),
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.size() + col]
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: f64) {
        let n = self.size();
        self.values[row * n + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.size();
        &self.values[row * n..(row + 1) * n]
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.size()).map(|i| self.row(i).to_vec()).collect()
    }

    pub(crate) fn label(&self, idx: usize) -> String {
        self.items.label(idx).unwrap_or_default().to_string()
    }
}

/// The judgment scale accepted when judgments are entered one pair at a time.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum JudgmentScale {
    /// The 1/9 .. 9 scale of relative importance.
    Saaty,
    /// Any positive value. The results remain mathematically valid but the
    /// consistency table was calibrated on the bounded scale.
    Unbounded,
}

impl JudgmentScale {
    pub fn accepts(&self, value: f64) -> bool {
        if !(value.is_finite() && value > 0.0) {
            return false;
        }
        match self {
            JudgmentScale::Saaty => {
                value >= MIN_JUDGMENT - SCALE_TOLERANCE && value <= MAX_JUDGMENT + SCALE_TOLERANCE
            }
            JudgmentScale::Unbounded => true,
        }
    }
}

// ********* Configuration **********

#[derive(PartialEq, Debug, Clone)]
pub struct AhpRules {
    pub consistency_threshold: f64,
    pub judgment_scale: JudgmentScale,
}

impl AhpRules {
    pub const DEFAULT_RULES: AhpRules = AhpRules {
        consistency_threshold: CONSISTENCY_THRESHOLD,
        judgment_scale: JudgmentScale::Saaty,
    };
}

impl Default for AhpRules {
    fn default() -> Self {
        AhpRules::DEFAULT_RULES
    }
}

// ******** Output data structures *********

/// Normalized weights over an item set, summing to 1.
#[derive(PartialEq, Debug, Clone)]
pub struct WeightVector {
    items: ItemSet,
    weights: Vec<f64>,
}

impl WeightVector {
    /// Wraps weights computed elsewhere. The weights are listed in item order.
    ///
    /// Every weight must be finite and non-negative, and the weights must sum to 1
    /// (within [`WEIGHT_SUM_TOLERANCE`]).
    pub fn new(items: &ItemSet, weights: &[f64]) -> Result<WeightVector, AhpErrors> {
        if weights.len() != items.len() {
            return Err(AhpErrors::InputShapeMismatch {
                what: "weights".to_string(),
                expected: items.len(),
                found: weights.len(),
            });
        }
        if let Some((idx, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
        {
            return Err(AhpErrors::InvalidWeights {
                what: format!("{:?}", items.labels()),
                reason: format!(
                    "weight of {} is {}",
                    items.label(idx).unwrap_or_default(),
                    w
                ),
            });
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AhpErrors::InvalidWeights {
                what: format!("{:?}", items.labels()),
                reason: format!("weights sum to {}", total),
            });
        }
        Ok(WeightVector {
            items: items.clone(),
            weights: weights.to_vec(),
        })
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.items.position(label).map(|idx| self.weights[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.items
            .labels()
            .iter()
            .map(|s| s.as_str())
            .zip(self.weights.iter().cloned())
    }
}

/// The consistency diagnostic of one comparison matrix.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ConsistencyResult {
    pub lambda_max: f64,
    /// Consistency Index
    pub ci: f64,
    /// Random Index used for the ratio
    pub ri: f64,
    /// Consistency Ratio
    pub cr: f64,
}

impl ConsistencyResult {
    pub fn is_consistent(&self) -> bool {
        self.is_consistent_with(CONSISTENCY_THRESHOLD)
    }

    pub fn is_consistent_with(&self, threshold: f64) -> bool {
        self.cr <= threshold
    }
}

/// Everything derived from one comparison matrix.
#[derive(PartialEq, Debug, Clone)]
pub struct PriorityResult {
    /// The name of the matrix these priorities come from.
    pub name: String,
    /// The repaired matrix the priorities were derived from.
    pub matrix: ComparisonMatrix,
    /// Column-normalized matrix, row-major over the item set.
    pub normalized: Vec<Vec<f64>>,
    pub weights: WeightVector,
    pub consistency: ConsistencyResult,
    /// False when the consistency ratio exceeds the threshold of the rules in use.
    pub consistent: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RankedAlternative {
    pub name: String,
    pub score: f64,
    /// 1 for the best alternative.
    pub rank: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RankingResult {
    pub criteria: ItemSet,
    pub alternatives: ItemSet,
    /// Global score of each alternative, in alternative order.
    pub scores: Vec<f64>,
    /// Local weight times criterion weight, one row per alternative and one
    /// column per criterion.
    pub weighted: Vec<Vec<f64>>,
    /// Alternatives by decreasing score. Ties keep the input order.
    pub ranking: Vec<RankedAlternative>,
}

impl RankingResult {
    pub fn best(&self) -> Option<&RankedAlternative> {
        self.ranking.first()
    }

    pub fn score(&self, alternative: &str) -> Option<f64> {
        self.alternatives
            .position(alternative)
            .map(|idx| self.scores[idx])
    }
}

/// A complete two-level run: criteria, alternatives under each criterion, ranking.
#[derive(PartialEq, Debug, Clone)]
pub struct HierarchyResult {
    pub criteria: PriorityResult,
    /// One entry per criterion, in criteria order.
    pub alternatives: Vec<PriorityResult>,
    pub ranking: RankingResult,
}

/// Errors that prevent a computation from completing.
///
/// Each error names the matrix or item set involved so that the source of the
/// judgments can be asked for a correction.
#[derive(PartialEq, Debug, Clone)]
pub enum AhpErrors {
    /// Fewer than 2 criteria or alternatives.
    InsufficientItems { what: String, found: usize },
    DuplicateItem { what: String, item: String },
    UnknownItem { what: String, item: String },
    /// A judgment was never provided (the cell is still 0).
    MissingJudgment {
        matrix: String,
        row: String,
        column: String,
    },
    JudgmentOutOfScale {
        matrix: String,
        row: String,
        column: String,
        value: f64,
    },
    /// Zero column sum, zero weight or an entry that is negative or not finite.
    DegenerateMatrix { matrix: String, reason: String },
    /// A weight vector with a negative or non-finite weight, or that does not sum to 1.
    /// `what` lists the labels of the vector.
    InvalidWeights { what: String, reason: String },
    InputShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    /// Several independent computations of a hierarchy failed.
    HierarchyFailed(Vec<AhpErrors>),
}

impl Error for AhpErrors {}

impl Display for AhpErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AhpErrors::InsufficientItems { what, found } => {
                write!(f, "at least 2 {} are required, found {}", what, found)
            }
            AhpErrors::DuplicateItem { what, item } => {
                write!(f, "{} contain {:?} more than once", what, item)
            }
            AhpErrors::UnknownItem { what, item } => {
                write!(f, "{:?} is not one of the {}", item, what)
            }
            AhpErrors::MissingJudgment {
                matrix,
                row,
                column,
            } => write!(
                f,
                "matrix {}: no judgment for {:?} compared to {:?}",
                matrix, row, column
            ),
            AhpErrors::JudgmentOutOfScale {
                matrix,
                row,
                column,
                value,
            } => write!(
                f,
                "matrix {}: judgment {} for {:?} compared to {:?} is outside the judgment scale",
                matrix, value, row, column
            ),
            AhpErrors::DegenerateMatrix { matrix, reason } => {
                write!(f, "matrix {} is degenerate: {}", matrix, reason)
            }
            AhpErrors::InvalidWeights { what, reason } => {
                write!(f, "invalid weights over {}: {}", what, reason)
            }
            AhpErrors::InputShapeMismatch {
                what,
                expected,
                found,
            } => write!(f, "expected {} {}, found {}", expected, what, found),
            AhpErrors::HierarchyFailed(errors) => {
                write!(f, "{} computations failed:", errors.len())?;
                for e in errors {
                    write!(f, " [{}]", e)?;
                }
                Ok(())
            }
        }
    }
}
