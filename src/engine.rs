//! Statistical testing engine.
//!
//! For every parameter of a [`LongTable`]:
//! 1. one full-factorial ANOVA over the between factors
//! 2. for every [`GroupingSpec`], one Tukey HSD per combination of the
//!    held-fixed factors' levels
//!
//! Post-hoc groups that cannot be tested are logged, recorded as
//! [`PostHocFailure`]s and left out of the tables; they never remove a
//! parameter or its ANOVA.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::design::{generate_groupings, GroupingSpec};
use crate::error::{Error, Result};
use crate::stats::{anova, pairwise_tukey, AnovaTable, FactorColumn, PostHocTable, Response};
use crate::table::{validate_factor_names, LongTable};

/// A post-hoc group whose test could not be computed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PostHocFailure {
    /// Parameter being analysed.
    pub parameter: String,
    /// Factor whose levels were to be compared.
    pub excluded: String,
    /// Held-fixed factors and their levels in the failed group.
    pub held: Vec<(String, String)>,
    /// Why the test failed.
    pub reason: String,
}

/// All results for one parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParameterResults {
    /// Full-factorial ANOVA.
    pub anova: AnovaTable,
    /// Post-hoc tables of every grouping, in grouping then group order.
    pub posthoc: Vec<PostHocTable>,
    /// Groups skipped because their test could not be computed.
    pub failures: Vec<PostHocFailure>,
}

/// Results keyed by parameter name.
pub type StatsResults = BTreeMap<String, ParameterResults>;

/// Run the ANOVA and every post-hoc breakdown for each parameter.
///
/// # Arguments
/// * `long` - Long-form data, see [`transpose`](crate::table::transpose)
/// * `betweens` - Factors of the full-factorial ANOVA
/// * `grouping_factors` - Factors from which post-hoc groupings are generated
///
/// # Returns
/// * One [`ParameterResults`] per distinct parameter of `long`
///
/// # Errors
/// * Input errors if a factor list is empty, repeats a name, or names a
///   factor absent from `long`. Computation errors inside post-hoc groups are
///   recorded in [`ParameterResults::failures`] instead.
///
/// # Example
///
/// ```rust
/// use factorstats::engine::run_analysis;
/// use factorstats::table::{transpose, WideTable};
///
/// let wide = WideTable::new()
///     .with_factor("Group", ["A", "A", "A", "B", "B", "B"])?
///     .with_numeric("X", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
/// let long = transpose(&wide, &["Group"])?;
///
/// let results = run_analysis(&long, &["Group"], &["Group"])?;
/// assert_eq!(results["X"].posthoc.len(), 1);
/// assert!(results["X"].failures.is_empty());
/// # Ok::<(), factorstats::Error>(())
/// ```
pub fn run_analysis<B, G>(
    long: &LongTable,
    betweens: &[B],
    grouping_factors: &[G],
) -> Result<StatsResults>
where
    B: AsRef<str>,
    G: AsRef<str>,
{
    let betweens = validate_factor_names(betweens)?;
    for name in &betweens {
        long.factor(name)?;
    }
    let groupings = generate_groupings(grouping_factors)?;
    if let Some(spec) = groupings.first() {
        for name in spec.held.iter().chain(std::iter::once(&spec.excluded)) {
            long.factor(name)?;
        }
    }

    let mut results = StatsResults::new();
    for (parameter, mut rows) in long.rows_by_parameter() {
        let before = rows.len();
        rows.retain(|&r| !long.values()[r].is_nan());
        if rows.len() < before {
            debug!(
                parameter,
                dropped = before - rows.len(),
                "removed missing values"
            );
        }

        let bundle = analyse_parameter(long, parameter, &rows, &betweens, &groupings)?;
        info!(
            parameter,
            observations = rows.len(),
            posthoc_tables = bundle.posthoc.len(),
            failures = bundle.failures.len(),
            "parameter analysed"
        );
        results.insert(parameter.to_string(), bundle);
    }

    Ok(results)
}

fn analyse_parameter(
    long: &LongTable,
    parameter: &str,
    rows: &[usize],
    betweens: &[String],
    groupings: &[GroupingSpec],
) -> Result<ParameterResults> {
    let labelled = long.complete_rows(rows, betweens)?;
    if labelled.len() < rows.len() {
        debug!(
            parameter,
            dropped = rows.len() - labelled.len(),
            "removed rows with missing factor labels"
        );
    }
    let response = bind_response(long, parameter, &labelled);
    let factors = betweens
        .iter()
        .map(|name| factor_column(long, name, &labelled))
        .collect::<Result<Vec<_>>>()?;
    let anova = anova(&response, &factors)?;

    let mut posthoc = Vec::new();
    let mut failures = Vec::new();
    for spec in groupings {
        for (key, members) in long.group_rows(rows, &spec.held)? {
            let held: Vec<(String, String)> = spec.held.iter().cloned().zip(key).collect();
            let members = long.complete_rows(&members, std::slice::from_ref(&spec.excluded))?;
            let response = bind_response(long, parameter, &members);
            let between = factor_column(long, &spec.excluded, &members)?;

            match pairwise_tukey(&response, &between) {
                Ok(comparisons) => posthoc.push(PostHocTable {
                    parameter: parameter.to_string(),
                    held,
                    excluded: spec.excluded.clone(),
                    rows: comparisons,
                }),
                Err(err) if err.is_recoverable() => {
                    warn!(
                        parameter,
                        excluded = %spec.excluded,
                        held = ?held,
                        error = %err,
                        "post-hoc test skipped"
                    );
                    failures.push(PostHocFailure {
                        parameter: parameter.to_string(),
                        excluded: spec.excluded.clone(),
                        held,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(ParameterResults {
        anova,
        posthoc,
        failures,
    })
}

/// Bind the selected rows' values to the parameter name.
fn bind_response<'a>(long: &LongTable, parameter: &'a str, rows: &[usize]) -> Response<'a> {
    Response {
        name: parameter,
        values: rows.iter().map(|&r| long.values()[r]).collect(),
    }
}

/// Labels of `name` at the selected rows, which must all be labelled.
fn factor_column<'a>(long: &'a LongTable, name: &'a str, rows: &[usize]) -> Result<FactorColumn<'a>> {
    let labels = long.factor(name)?;
    let labels = rows
        .iter()
        .map(|&r| labels[r].as_deref())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Error::invalid_params(format!("factor '{name}' has missing labels")))?;
    Ok(FactorColumn { name, labels })
}
