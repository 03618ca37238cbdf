pub use crate::config::*;

/// A builder for entering judgments one pair at a time.
///
/// All the judgments start at 1 (equal importance). Each judgment sets one cell
/// and its reciprocal, so the order in which the pairs are entered does not matter.
///
/// ```
/// pub use ahp_priority::builder::Builder;
/// pub use ahp_priority::AhpRules;
/// # use ahp_priority::AhpErrors;
///
/// let mut builder = Builder::new(
///     "criteria",
///     &["Cost".to_string(), "Reliability".to_string(), "Sustainability".to_string()],
///     &AhpRules::DEFAULT_RULES,
/// )?;
///
/// builder.judgment("Cost", "Reliability", 2.0)?;
/// builder.judgment("Cost", "Sustainability", 4.0)?;
/// builder.judgment("Reliability", "Sustainability", 3.0)?;
///
/// let (weights, consistency) = ahp_priority::derive_weights(&builder.build())?;
/// assert!(consistency.is_consistent());
/// assert!(weights.get("Cost").unwrap() > weights.get("Reliability").unwrap());
///
/// # Ok::<(), AhpErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AhpRules,
    pub(crate) _matrix: ComparisonMatrix,
}

impl Builder {
    /// Starts a matrix named `name` over the given labels. At least 2 labels are required.
    pub fn new(name: &str, labels: &[String], rules: &AhpRules) -> Result<Builder, AhpErrors> {
        if labels.len() < 2 {
            return Err(AhpErrors::InsufficientItems {
                what: format!("items in matrix {}", name),
                found: labels.len(),
            });
        }
        let items = ItemSet::new(name, labels)?;
        Ok(Builder {
            _rules: rules.clone(),
            _matrix: ComparisonMatrix::ones(name, &items),
        })
    }

    /// Records how much more important `a` is compared to `b`.
    ///
    /// A value below 1 means that `b` is the more important one.
    pub fn judgment(&mut self, a: &str, b: &str, value: f64) -> Result<(), AhpErrors> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        self.judgment_at(i, j, value)
    }

    /// Same as [`Builder::judgment`], with the items given by position.
    pub fn judgment_at(&mut self, i: usize, j: usize, value: f64) -> Result<(), AhpErrors> {
        let n = self._matrix.size();
        if i >= n || j >= n {
            return Err(AhpErrors::InputShapeMismatch {
                what: format!("items in matrix {}", self._matrix.name()),
                expected: n,
                found: i.max(j) + 1,
            });
        }
        if !self._rules.judgment_scale.accepts(value) {
            return Err(AhpErrors::JudgmentOutOfScale {
                matrix: self._matrix.name().to_string(),
                row: self._matrix.label(i),
                column: self._matrix.label(j),
                value,
            });
        }
        if i == j {
            // The diagonal is always 1.
            return Ok(());
        }
        self._matrix.set(i, j, value);
        self._matrix.set(j, i, 1.0 / value);
        Ok(())
    }

    pub fn build(self) -> ComparisonMatrix {
        self._matrix
    }

    fn position(&self, label: &str) -> Result<usize, AhpErrors> {
        self._matrix
            .items()
            .position(label)
            .ok_or_else(|| AhpErrors::UnknownItem {
                what: format!("items of matrix {}", self._matrix.name()),
                item: label.to_string(),
            })
    }
}
