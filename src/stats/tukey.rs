//! Tukey's honestly significant difference test.

use std::f64::consts::SQRT_2;

use super::distribution::studentized_range_sf;
use super::types::{FactorColumn, Response, TukeyRow};
use crate::error::{Error, Result};
use crate::table::sorted_levels;

/// Per-level summary used by the pairwise comparisons.
#[derive(Debug, Clone)]
struct LevelSummary<'a> {
    label: &'a str,
    n: usize,
    mean: f64,
    /// Sample variance (ddof = 1), NaN for a single observation.
    var: f64,
}

/// Pairwise Tukey HSD comparisons of `response` across the levels of `between`.
///
/// Levels are sorted (numeric-aware) and compared in `(i, j), i < j` order.
/// The error variance is the within-level mean square of the one-way ANOVA,
/// and p-values come from the studentized range distribution with `k` levels
/// and `N − k` degrees of freedom.
///
/// # Errors
///
/// Computation errors for designs the test cannot handle:
/// - [`Error::TooFewLevels`] if fewer than two levels are present
/// - [`Error::InsufficientDf`] if every level has a single observation
/// - [`Error::ZeroVariance`] if the within-level variance is zero
/// - [`Error::Degenerate`] if a response value is infinite or NaN
pub fn pairwise_tukey(
    response: &Response<'_>,
    between: &FactorColumn<'_>,
) -> Result<Vec<TukeyRow>> {
    if between.labels.len() != response.values.len() {
        return Err(Error::LengthMismatch {
            name: between.name.to_string(),
            expected: response.values.len(),
            actual: between.labels.len(),
        });
    }
    if let Some(bad) = response.values.iter().find(|v| !v.is_finite()) {
        return Err(Error::degenerate(format!(
            "non-finite value {bad} in '{}'",
            response.name
        )));
    }

    let levels = summarize(response, between);
    let k = levels.len();
    if k < 2 {
        return Err(Error::TooFewLevels {
            factor: between.name.to_string(),
            levels: k,
        });
    }

    let n_total: usize = levels.iter().map(|l| l.n).sum();
    let df = n_total - k;
    if df == 0 {
        return Err(Error::InsufficientDf {
            observations: n_total,
            levels: k,
        });
    }

    let within_ss: f64 = levels
        .iter()
        .filter(|l| l.n > 1)
        .map(|l| l.var * (l.n - 1) as f64)
        .sum();
    let mse = within_ss / df as f64;
    if mse.is_nan() || mse <= 0.0 {
        return Err(Error::ZeroVariance {
            dv: response.name.to_string(),
        });
    }

    let mut rows = Vec::with_capacity(k * (k - 1) / 2);
    for i in 0..k {
        for j in i + 1..k {
            let (a, b) = (&levels[i], &levels[j]);
            let diff = a.mean - b.mean;
            let se = (mse / a.n as f64 + mse / b.n as f64).sqrt();
            let t = diff / se;
            let p_tukey = studentized_range_sf(SQRT_2 * t.abs(), k, df as f64);

            rows.push(TukeyRow {
                a: a.label.to_string(),
                b: b.label.to_string(),
                mean_a: a.mean,
                mean_b: b.mean,
                diff,
                se,
                t,
                p_tukey,
                hedges: hedges_g(a, b),
            });
        }
    }

    Ok(rows)
}

fn summarize<'a>(response: &Response<'_>, between: &FactorColumn<'a>) -> Vec<LevelSummary<'a>> {
    sorted_levels(between.labels.iter().copied())
        .into_iter()
        .map(|label| {
            let values: Vec<f64> = between
                .labels
                .iter()
                .zip(&response.values)
                .filter(|(l, _)| **l == label)
                .map(|(_, &v)| v)
                .collect();
            let n = values.len();
            let mean = values.iter().sum::<f64>() / n as f64;
            let var = if n > 1 {
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
            } else {
                f64::NAN
            };
            LevelSummary {
                label,
                n,
                mean,
                var,
            }
        })
        .collect()
}

/// Hedges' g: Cohen's d on the pooled standard deviation, bias corrected.
fn hedges_g(a: &LevelSummary<'_>, b: &LevelSummary<'_>) -> f64 {
    let (na, nb) = (a.n as f64, b.n as f64);
    let dof = na + nb - 2.0;
    let pooled_sd = (((na - 1.0) * a.var + (nb - 1.0) * b.var) / dof).sqrt();
    let d = (a.mean - b.mean) / pooled_sd;
    d * (1.0 - 3.0 / (4.0 * (na + nb) - 9.0))
}
