//! Statistical result types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The dependent variable of a test, bound by name.
///
/// Tests take the response explicitly instead of looking up a column, so the
/// same long table serves every parameter without being renamed.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<'a> {
    /// Name of the dependent variable (the parameter).
    pub name: &'a str,
    /// One value per observation.
    pub values: Vec<f64>,
}

/// A between-subject factor: one label per observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorColumn<'a> {
    /// Factor name.
    pub name: &'a str,
    /// One label per observation.
    pub labels: Vec<&'a str>,
}

/// One row of an ANOVA table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaRow {
    /// Effect name: a factor, an interaction `A * B`, or the residual.
    pub source: String,
    /// Sum of squares (Type II for effects).
    pub ss: f64,
    /// Degrees of freedom.
    pub df: usize,
    /// Mean square (SS / df), NaN when df is 0.
    pub ms: f64,
    /// F-ratio against the residual mean square.
    pub f: Option<f64>,
    /// Uncorrected p-value of the F test.
    pub p_unc: Option<f64>,
    /// Partial eta squared, SS / (SS + SS_residual).
    pub np2: Option<f64>,
}

/// Full-factorial ANOVA for one parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaTable {
    /// The parameter (dependent variable) analysed.
    pub parameter: String,
    /// Main effects, then interactions by increasing order.
    pub effects: Vec<AnovaRow>,
    /// Residual (within-cell) row.
    pub residual: AnovaRow,
    /// Number of observations used.
    pub observations: usize,
}

impl AnovaTable {
    /// Effect rows followed by the residual row.
    pub fn rows(&self) -> impl Iterator<Item = &AnovaRow> {
        self.effects.iter().chain(std::iter::once(&self.residual))
    }

    /// Look up an effect row by its source name.
    #[must_use]
    pub fn effect(&self, source: &str) -> Option<&AnovaRow> {
        self.effects.iter().find(|row| row.source == source)
    }
}

/// One pairwise comparison of a Tukey HSD test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TukeyRow {
    /// First level.
    pub a: String,
    /// Second level.
    pub b: String,
    /// Mean of the first level.
    pub mean_a: f64,
    /// Mean of the second level.
    pub mean_b: f64,
    /// `mean_a - mean_b`.
    pub diff: f64,
    /// Standard error of the difference.
    pub se: f64,
    /// `diff / se`.
    pub t: f64,
    /// Tukey-adjusted p-value.
    pub p_tukey: f64,
    /// Hedges' g effect size.
    pub hedges: f64,
}

/// Tukey HSD results for one group of a grouping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PostHocTable {
    /// The parameter (dependent variable) compared.
    pub parameter: String,
    /// Held-fixed factors and their level in this group, in factor order.
    pub held: Vec<(String, String)>,
    /// The factor whose levels are compared.
    pub excluded: String,
    /// One row per level pair.
    pub rows: Vec<TukeyRow>,
}
