//! Wide-to-long reshaping.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{compare_labels, validate_factor_names, Column, WideTable};
use crate::error::{Error, Result};

/// Name of the field holding the parameter label.
pub const PARAMETER_FIELD: &str = "Parameter";

/// Name of the field holding the measured value.
pub const VALUE_FIELD: &str = "Value";

/// A long-format table: one row per (unit, parameter) pair.
///
/// Rows are stored column-wise. The table is immutable once built.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LongTable {
    factor_names: Vec<String>,
    factors: Vec<Vec<Option<String>>>,
    parameters: Vec<String>,
    values: Vec<f64>,
}

impl LongTable {
    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.len()
    }

    /// Factor column names, in the order they were requested.
    #[must_use]
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Labels of one factor column; `None` marks a missing label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumn`] if `name` is not a factor of this table.
    pub fn factor(&self, name: &str) -> Result<&[Option<String>]> {
        self.factor_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.factors[i].as_slice())
            .ok_or_else(|| Error::missing_column(name))
    }

    /// The parameter label of every row.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// The value of every row.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Distinct parameter names, sorted.
    #[must_use]
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parameters.iter().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Row indices belonging to each parameter, keyed by parameter name.
    #[must_use]
    pub fn rows_by_parameter(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut rows: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, p) in self.parameters.iter().enumerate() {
            rows.entry(p.as_str()).or_default().push(i);
        }
        rows
    }

    /// The subset of `rows` labelled in every one of the `by` factors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumn`] if a factor is unknown.
    pub fn complete_rows<S: AsRef<str>>(&self, rows: &[usize], by: &[S]) -> Result<Vec<usize>> {
        let columns = by
            .iter()
            .map(|name| self.factor(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(rows
            .iter()
            .copied()
            .filter(|&row| columns.iter().all(|c| c[row].is_some()))
            .collect())
    }

    /// Partition `rows` by the labels of the `by` factors.
    ///
    /// Groups come back ordered by their labels (numeric-aware), and rows
    /// keep their relative order within a group. Rows missing a label in
    /// any `by` factor belong to no group. With no `by` factors the whole
    /// selection is one group with an empty key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumn`] if a factor is unknown.
    pub fn group_rows<S: AsRef<str>>(
        &self,
        rows: &[usize],
        by: &[S],
    ) -> Result<Vec<(Vec<String>, Vec<usize>)>> {
        let columns = by
            .iter()
            .map(|name| self.factor(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut groups: Vec<(Vec<String>, Vec<usize>)> = Vec::new();
        for &row in rows {
            let Some(key) = columns
                .iter()
                .map(|c| c[row].as_deref())
                .collect::<Option<Vec<&str>>>()
            else {
                continue;
            };
            match groups
                .iter_mut()
                .find(|(k, _)| k.iter().map(String::as_str).eq(key.iter().copied()))
            {
                Some((_, members)) => members.push(row),
                None => groups.push((
                    key.iter().map(|s| (*s).to_string()).collect(),
                    vec![row],
                )),
            }
        }

        groups.sort_by(|(a, _), (b, _)| {
            a.iter()
                .zip(b.iter())
                .map(|(x, y)| compare_labels(x, y))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(groups)
    }
}

/// Reshape a wide table into long form.
///
/// Every column not named in `factor_columns` is a parameter column. For each
/// parameter column, in table order, one block of rows is emitted holding the
/// factor labels, the parameter name and the cell value; rows keep their
/// original order within a block.
///
/// # Errors
///
/// - [`Error::NoFactors`] / [`Error::DuplicateFactor`] for a bad factor list
/// - [`Error::MissingColumn`] if a factor column is absent
/// - [`Error::ColumnType`] if a factor column is numeric or a parameter
///   column is categorical
///
/// # Example
///
/// ```
/// use factorstats::table::{transpose, WideTable};
///
/// let wide = WideTable::new()
///     .with_factor("Group", ["A", "B"])?
///     .with_numeric("X", vec![1.0, 2.0])?
///     .with_numeric("Y", vec![3.0, 4.0])?;
///
/// let long = transpose(&wide, &["Group"])?;
/// assert_eq!(long.n_rows(), 4);
/// assert_eq!(long.parameters(), &["X", "X", "Y", "Y"]);
/// assert_eq!(long.values(), &[1.0, 2.0, 3.0, 4.0]);
/// # Ok::<(), factorstats::Error>(())
/// ```
pub fn transpose<S: AsRef<str>>(wide: &WideTable, factor_columns: &[S]) -> Result<LongTable> {
    let factor_names = validate_factor_names(factor_columns)?;
    let factor_data = factor_names
        .iter()
        .map(|name| wide.factor(name))
        .collect::<Result<Vec<_>>>()?;

    let parameter_columns: Vec<(&str, &[f64])> = wide
        .iter()
        .filter(|(name, _)| !factor_names.iter().any(|f| f == *name))
        .map(|(name, column)| match column {
            Column::Numeric(values) => Ok((name, values.as_slice())),
            other => Err(Error::ColumnType {
                name: name.to_string(),
                expected: "a numeric column",
                actual: other.kind(),
            }),
        })
        .collect::<Result<_>>()?;

    let n = wide.n_rows();
    let total = n * parameter_columns.len();

    let mut factors: Vec<Vec<Option<String>>> =
        vec![Vec::with_capacity(total); factor_names.len()];
    let mut parameters = Vec::with_capacity(total);
    let mut values = Vec::with_capacity(total);

    for (name, column) in parameter_columns {
        for (f, labels) in factor_data.iter().enumerate() {
            factors[f].extend(labels.iter().cloned());
        }
        parameters.extend(std::iter::repeat(name.to_string()).take(n));
        values.extend_from_slice(column);
    }

    Ok(LongTable {
        factor_names,
        factors,
        parameters,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> WideTable {
        WideTable::new()
            .with_factor("Group", ["A", "A", "B", "B"])
            .unwrap()
            .with_factor("Time", ["1", "2", "1", "2"])
            .unwrap()
            .with_numeric("X", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
    }

    #[test]
    fn test_transpose_single_parameter() {
        let long = transpose(&scenario_a(), &["Group", "Time"]).unwrap();

        assert_eq!(long.n_rows(), 4);
        assert!(long.parameters().iter().all(|p| p == "X"));
        assert_eq!(long.values(), &[1.0, 2.0, 3.0, 4.0]);
        let time: Vec<Option<&str>> = long.factor("Time").unwrap().iter().map(Option::as_deref).collect();
        assert_eq!(time, vec![Some("1"), Some("2"), Some("1"), Some("2")]);
        assert_eq!(long.parameter_names(), vec!["X"]);
    }

    #[test]
    fn test_transpose_row_count_is_product() {
        let wide = scenario_a()
            .with_numeric("Y", vec![5.0, 6.0, 7.0, 8.0])
            .unwrap()
            .with_numeric("Z", vec![9.0, 10.0, 11.0, 12.0])
            .unwrap();

        let long = transpose(&wide, &["Group", "Time"]).unwrap();
        assert_eq!(long.n_rows(), 3 * 4);

        // each (unit, parameter) pair appears exactly once, in block order
        for (p, name) in ["X", "Y", "Z"].iter().enumerate() {
            let expected = wide.numeric(name).unwrap();
            for unit in 0..4 {
                let row = p * 4 + unit;
                assert_eq!(long.parameters()[row], *name);
                assert_eq!(long.values()[row], expected[unit]);
                assert_eq!(
                    long.factor("Group").unwrap()[row],
                    wide.factor("Group").unwrap()[unit]
                );
            }
        }
    }

    #[test]
    fn test_transpose_missing_factor() {
        let err = transpose(&scenario_a(), &["Group", "Heart"]).unwrap_err();
        assert_eq!(err, Error::missing_column("Heart"));
    }

    #[test]
    fn test_transpose_rejects_categorical_parameter() {
        let err = transpose(&scenario_a(), &["Group"]).unwrap_err();
        assert!(matches!(err, Error::ColumnType { ref name, .. } if name == "Time"));
    }

    #[test]
    fn test_transpose_no_factors() {
        let empty: [&str; 0] = [];
        assert_eq!(transpose(&scenario_a(), &empty).unwrap_err(), Error::NoFactors);
    }

    #[test]
    fn test_group_rows() {
        let wide = WideTable::new()
            .with_factor("Time", ["10", "2", "10", "2", "2"])
            .unwrap()
            .with_numeric("X", vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap();
        let long = transpose(&wide, &["Time"]).unwrap();
        let all: Vec<usize> = (0..long.n_rows()).collect();

        let groups = long.group_rows(&all, &["Time"]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, vec!["2".to_string()]);
        assert_eq!(groups[0].1, vec![1, 3, 4]);
        assert_eq!(groups[1].1, vec![0, 2]);

        let none: [&str; 0] = [];
        let groups = long.group_rows(&all, &none).unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].0.is_empty());
        assert_eq!(groups[0].1, all);
    }

    #[test]
    fn test_group_rows_skips_missing_labels() {
        let wide = WideTable::new()
            .with_sparse_factor("Group", [Some("A"), None, Some("B"), Some("A")])
            .unwrap()
            .with_factor("Time", ["1", "1", "2", "2"])
            .unwrap()
            .with_numeric("X", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        let long = transpose(&wide, &["Group", "Time"]).unwrap();
        let all: Vec<usize> = (0..long.n_rows()).collect();

        assert_eq!(long.factor("Group").unwrap()[1], None);
        assert_eq!(long.complete_rows(&all, &["Group"]).unwrap(), vec![0, 2, 3]);
        assert_eq!(long.complete_rows(&all, &["Time"]).unwrap(), all);

        let groups = long.group_rows(&all, &["Group"]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1, vec![0, 3]);
        assert_eq!(groups[1].1, vec![2]);

        // the unlabelled row still groups on a factor it has
        let groups = long.group_rows(&all, &["Time"]).unwrap();
        assert_eq!(groups[0].1, vec![0, 1]);
    }
}
