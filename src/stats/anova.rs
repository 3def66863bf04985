//! Full-factorial ANOVA.
//!
//! Calculates Type II sums of squares, F-ratios, p-values and partial eta
//! squared for every main effect and interaction of a set of between-subject
//! factors.

use std::collections::HashMap;

use ndarray::Array1;

use super::distribution::f_distribution_p_value;
use super::linear::{FactorialDesign, LeastSquares};
use super::types::{AnovaRow, AnovaTable, FactorColumn, Response};
use crate::design::combinations;
use crate::error::{Error, Result};

/// Separator between factor names in an interaction's source label.
pub const INTERACTION_SEPARATOR: &str = " * ";

/// Every non-empty subset of `0..k`, by increasing size, each size in
/// lexicographic order.
#[must_use]
pub fn factorial_terms(k: usize) -> Vec<Vec<usize>> {
    (1..=k).flat_map(|size| combinations(k, size)).collect()
}

/// Calculate a full-factorial ANOVA table.
///
/// # Arguments
/// * `response` - Dependent variable, one value per observation
/// * `factors` - Between-subject factors, one label per observation each
///
/// # Returns
/// * `AnovaTable` with one row per main effect and interaction, plus the
///   residual. Statistics that cannot be computed (zero residual degrees of
///   freedom, aliased terms) are `None`.
///
/// # Errors
/// * [`Error::NoFactors`] if `factors` is empty
/// * [`Error::LengthMismatch`] if a factor and the response differ in length
///
/// # Algorithm
/// 1. Code factors with sum-to-zero contrasts
/// 2. For each term T, fit the model of every term not containing T, with
///    and without T
/// 3. SS(T) = RSS(without T) − RSS(with T), df(T) = difference in rank
/// 4. Residual SS and df from the full model
/// 5. F = MS(T) / MS(residual), p from the F-distribution
pub fn anova(response: &Response<'_>, factors: &[FactorColumn<'_>]) -> Result<AnovaTable> {
    if factors.is_empty() {
        return Err(Error::NoFactors);
    }
    for factor in factors {
        if factor.labels.len() != response.values.len() {
            return Err(Error::LengthMismatch {
                name: factor.name.to_string(),
                expected: response.values.len(),
                actual: factor.labels.len(),
            });
        }
    }

    let design = FactorialDesign::new(factors);
    let y = Array1::from(response.values.clone());
    let terms = factorial_terms(factors.len());

    let mut fits: HashMap<Vec<usize>, LeastSquares> = HashMap::new();
    let mut fit = |selected: Vec<usize>| -> LeastSquares {
        *fits.entry(selected.clone()).or_insert_with(|| {
            let model: Vec<Vec<usize>> = selected.iter().map(|&t| terms[t].clone()).collect();
            design.fit(&model, &y)
        })
    };

    let full = fit((0..terms.len()).collect());
    let n = design.observations();
    let residual_df = n.saturating_sub(full.rank);
    let residual_ss = full.rss;
    let residual_ms = if residual_df > 0 {
        residual_ss / residual_df as f64
    } else {
        f64::NAN
    };

    let mut effects = Vec::with_capacity(terms.len());
    for (t, term) in terms.iter().enumerate() {
        // terms that do not contain T
        let without: Vec<usize> = (0..terms.len())
            .filter(|&s| !term.iter().all(|f| terms[s].contains(f)))
            .collect();
        let mut with = without.clone();
        with.push(t);
        with.sort_unstable();

        let reduced = fit(without);
        let augmented = fit(with);

        let df = augmented.rank.saturating_sub(reduced.rank);
        let ss = if df > 0 {
            (reduced.rss - augmented.rss).max(0.0)
        } else {
            0.0
        };

        effects.push(effect_row(
            source_label(term, factors),
            ss,
            df,
            residual_ss,
            residual_df,
            residual_ms,
        ));
    }

    let residual_label = if factors.len() == 1 {
        "Within"
    } else {
        "Residual"
    };

    Ok(AnovaTable {
        parameter: response.name.to_string(),
        effects,
        residual: AnovaRow {
            source: residual_label.to_string(),
            ss: residual_ss,
            df: residual_df,
            ms: residual_ms,
            f: None,
            p_unc: None,
            np2: None,
        },
        observations: n,
    })
}

fn source_label(term: &[usize], factors: &[FactorColumn<'_>]) -> String {
    term.iter()
        .map(|&f| factors[f].name)
        .collect::<Vec<_>>()
        .join(INTERACTION_SEPARATOR)
}

fn effect_row(
    source: String,
    ss: f64,
    df: usize,
    residual_ss: f64,
    residual_df: usize,
    residual_ms: f64,
) -> AnovaRow {
    let ms = if df > 0 { ss / df as f64 } else { f64::NAN };

    let (f, p_unc) = if df > 0 && residual_df > 0 && residual_ms > 0.0 {
        let f = ms / residual_ms;
        (Some(f), Some(f_distribution_p_value(f, df, residual_df)))
    } else {
        (None, None)
    };

    let np2 = if df > 0 && ss + residual_ss > 0.0 {
        Some(ss / (ss + residual_ss))
    } else {
        None
    };

    AnovaRow {
        source,
        ss,
        df,
        ms,
        f,
        p_unc,
        np2,
    }
}
