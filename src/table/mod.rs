//! Typed tables.
//!
//! This module provides the two table shapes the analysis works with:
//!
//! - [`WideTable`]: one row per experimental unit, factor columns plus one
//!   numeric column per measured parameter
//! - [`LongTable`]: one row per (unit, parameter) pair, produced by
//!   [`transpose`]
//!
//! Columns are looked up by name and checked for their kind, so a typo in a
//! factor name surfaces as [`Error::MissingColumn`] rather than an empty
//! result.

mod long;

pub use long::{transpose, LongTable, PARAMETER_FIELD, VALUE_FIELD};

use std::cmp::Ordering;
use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single named column's data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Column {
    /// Categorical labels. Missing labels are `None`.
    Factor(Vec<Option<String>>),
    /// Numeric measurements. Missing cells are NaN.
    Numeric(Vec<f64>),
}

impl Column {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Factor(v) => v.len(),
            Self::Numeric(v) => v.len(),
        }
    }

    /// Whether the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable kind, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Factor(_) => "a factor column",
            Self::Numeric(_) => "a numeric column",
        }
    }

    fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Factor(v) => Self::Factor(rows.iter().map(|&r| v[r].clone()).collect()),
            Self::Numeric(v) => Self::Numeric(rows.iter().map(|&r| v[r]).collect()),
        }
    }
}

/// A wide-format table: an ordered list of named, typed columns of equal length.
///
/// # Example
///
/// ```
/// use factorstats::table::WideTable;
///
/// let table = WideTable::new()
///     .with_factor("Group", ["A", "A", "B", "B"])?
///     .with_factor("Time", ["1", "2", "1", "2"])?
///     .with_numeric("X", vec![1.0, 2.0, 3.0, 4.0])?;
///
/// assert_eq!(table.n_rows(), 4);
/// assert_eq!(table.numeric("X")?[2], 3.0);
/// # Ok::<(), factorstats::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WideTable {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl WideTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from named columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is repeated or the columns differ in length.
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        columns
            .into_iter()
            .try_fold(Self::new(), |table, (name, column)| table.push(name, column))
    }

    /// Append a factor column.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the length differs.
    pub fn with_factor<I, S>(self, name: impl Into<String>, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = labels.into_iter().map(|l| Some(l.into())).collect();
        self.push(name.into(), Column::Factor(labels))
    }

    /// Append a factor column in which some labels may be missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the length differs.
    pub fn with_sparse_factor<I, S>(self, name: impl Into<String>, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let labels = labels.into_iter().map(|l| l.map(Into::into)).collect();
        self.push(name.into(), Column::Factor(labels))
    }

    /// Append a numeric column.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the length differs.
    pub fn with_numeric(self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.push(name.into(), Column::Numeric(values))
    }

    fn push(mut self, name: String, column: Column) -> Result<Self> {
        if self.names.contains(&name) {
            return Err(Error::DuplicateColumn(name));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(Error::LengthMismatch {
                    name,
                    expected: first.len(),
                    actual: column.len(),
                });
            }
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(self)
    }

    /// Number of rows (experimental units).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in table order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over `(name, column)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Whether a column with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Look up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumn`] if no such column exists.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| Error::missing_column(name))
    }

    /// Look up a factor column by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is absent or numeric.
    pub fn factor(&self, name: &str) -> Result<&[Option<String>]> {
        match self.column(name)? {
            Column::Factor(v) => Ok(v),
            other => Err(Error::ColumnType {
                name: name.to_string(),
                expected: "a factor column",
                actual: other.kind(),
            }),
        }
    }

    /// Look up a numeric column by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is absent or categorical.
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            other => Err(Error::ColumnType {
                name: name.to_string(),
                expected: "a numeric column",
                actual: other.kind(),
            }),
        }
    }

    /// Keep only the named columns, in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is absent or repeated.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        names.iter().try_fold(Self::new(), |table, name| {
            let name = name.as_ref();
            let column = self.column(name)?.clone();
            table.push(name.to_string(), column)
        })
    }

    /// Keep only the rows whose label in factor `name` satisfies `keep`.
    ///
    /// `keep` sees `None` for a missing label.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a factor column.
    pub fn filter_rows<F>(&self, name: &str, mut keep: F) -> Result<Self>
    where
        F: FnMut(Option<&str>) -> bool,
    {
        let labels = self.factor(name)?;
        let rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| keep(label.as_deref()))
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(&rows)).collect(),
        })
    }

    /// Drop the named columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumn`] if a name is absent.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        for name in names {
            self.column(name.as_ref())?;
        }
        let keep: Vec<&str> = self
            .names
            .iter()
            .map(String::as_str)
            .filter(|n| !names.iter().any(|d| d.as_ref() == *n))
            .collect();
        self.select(&keep)
    }
}

/// Validate a list of factor names: non-empty and free of duplicates.
///
/// # Errors
///
/// Returns [`Error::NoFactors`] or [`Error::DuplicateFactor`].
pub fn validate_factor_names<S: AsRef<str>>(factors: &[S]) -> Result<Vec<String>> {
    if factors.is_empty() {
        return Err(Error::NoFactors);
    }
    let mut seen = BTreeSet::new();
    for f in factors {
        if !seen.insert(f.as_ref()) {
            return Err(Error::DuplicateFactor(f.as_ref().to_string()));
        }
    }
    Ok(factors.iter().map(|f| f.as_ref().to_string()).collect())
}

/// Compare two factor labels.
///
/// Labels that both parse as numbers compare numerically ("2" < "10"),
/// everything else compares as text.
#[must_use]
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Distinct labels in sorted order (see [`compare_labels`]).
#[must_use]
pub fn sorted_levels<'a, I>(labels: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut levels: Vec<&str> = labels.into_iter().collect();
    levels.sort_by(|a, b| compare_labels(a, b));
    levels.dedup();
    levels
}
