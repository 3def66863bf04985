//! Spreadsheet report assembly.
//!
//! Results are first turned into plain [`Table`]s of [`Cell`]s, then laid out
//! into sheets by [`ReportLayout`], and finally written by [`ReportWriter`].
//! The layout is usable on its own, without touching the filesystem.
//!
//! ## Sheet layout
//!
//! Each parameter gets two sheets, `<parameter>_ANOVA` and
//! `<parameter>_POSTHOC`. Tables are stacked from row 0 at column 0, each
//! drawn as a header row followed by one row per record with the record
//! index in the first column. The next table starts `rows + spacer_rows`
//! below the previous start.

mod layout;
mod xlsx;

pub use layout::{
    sanitize_sheet_name, sheet_name, PlacedTable, ReportLayout, SheetLayout, MAX_SHEET_NAME_LEN,
};
pub use xlsx::{write_report, ReportWriter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::stats::{AnovaTable, PostHocTable};
use crate::table::{PARAMETER_FIELD, VALUE_FIELD};

/// Row offset added after each table's data rows.
pub const DEFAULT_SPACER_ROWS: u32 = 3;

/// Suffix of the report file name.
pub const STATS_SUFFIX: &str = "_Stats.xlsx";

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cell {
    /// Nothing written.
    Empty,
    /// Text.
    Text(String),
    /// A number. NaN is written as an empty cell.
    Number(f64),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<usize> for Cell {
    fn from(v: usize) -> Self {
        Self::Number(v as f64)
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Empty, Self::Number)
    }
}

/// A rectangular table with a header and an index column.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Table {
    /// Column headers, excluding the index column.
    pub columns: Vec<String>,
    /// One index cell per row.
    pub index: Vec<Cell>,
    /// Rows of cells, each as wide as `columns`.
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Number of data rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of data columns (the index column not included).
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column by header.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// The two result kinds a parameter is reported with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SheetKind {
    /// The full-factorial ANOVA.
    Anova,
    /// The stacked post-hoc tables.
    PostHoc,
}

impl SheetKind {
    /// Both kinds, in sheet order.
    pub const ALL: [Self; 2] = [Self::Anova, Self::PostHoc];

    /// Suffix appended to the parameter name.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Anova => "ANOVA",
            Self::PostHoc => "POSTHOC",
        }
    }
}

/// Report options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportConfig {
    /// Rows between the start of the next table and the end of the previous
    /// table's data (default: 3).
    pub spacer_rows: u32,
    /// Whether to save the workbook immediately (default: true).
    pub save: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            spacer_rows: DEFAULT_SPACER_ROWS,
            save: true,
        }
    }
}

impl From<&AnovaTable> for Table {
    /// Effect rows, the residual row, then two descriptive rows naming the
    /// parameter in trailing `Index` / `Value` columns.
    fn from(anova: &AnovaTable) -> Self {
        let columns: Vec<String> = [
            "Source", "SS", "DF", "MS", "F", "p-unc", "np2", "Index", VALUE_FIELD,
        ]
        .iter()
        .map(|s| (*s).to_string())
        .collect();

        let mut rows: Vec<Vec<Cell>> = anova
            .rows()
            .map(|row| {
                vec![
                    row.source.as_str().into(),
                    row.ss.into(),
                    row.df.into(),
                    row.ms.into(),
                    row.f.into(),
                    row.p_unc.into(),
                    row.np2.into(),
                    Cell::Empty,
                    Cell::Empty,
                ]
            })
            .collect();
        let mut index: Vec<Cell> = (0..rows.len()).map(Cell::from).collect();

        let mut label = vec![Cell::Empty; columns.len()];
        label[7] = PARAMETER_FIELD.into();
        label[8] = anova.parameter.as_str().into();
        rows.push(label);
        rows.push(vec![Cell::Empty; columns.len()]);
        index.push(Cell::from(0usize));
        index.push(Cell::from(1usize));

        Self {
            columns,
            index,
            rows,
        }
    }
}

impl From<&PostHocTable> for Table {
    /// Held-fixed values and the parameter name on every row, followed by the
    /// pairwise statistics.
    fn from(posthoc: &PostHocTable) -> Self {
        let mut columns: Vec<String> = posthoc.held.iter().map(|(f, _)| f.clone()).collect();
        columns.push(PARAMETER_FIELD.to_string());
        columns.extend(
            [
                "A", "B", "mean(A)", "mean(B)", "diff", "se", "T", "p-tukey", "hedges",
            ]
            .iter()
            .map(|s| (*s).to_string()),
        );

        let rows = posthoc
            .rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Cell> = posthoc
                    .held
                    .iter()
                    .map(|(_, level)| level.as_str().into())
                    .collect();
                cells.push(posthoc.parameter.as_str().into());
                cells.extend([
                    row.a.as_str().into(),
                    row.b.as_str().into(),
                    row.mean_a.into(),
                    row.mean_b.into(),
                    row.diff.into(),
                    row.se.into(),
                    row.t.into(),
                    row.p_tukey.into(),
                    row.hedges.into(),
                ]);
                cells
            })
            .collect::<Vec<_>>();

        Self {
            columns,
            index: (0..rows.len()).map(Cell::from).collect(),
            rows,
        }
    }
}
