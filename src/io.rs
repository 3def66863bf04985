//! Loading wide tables from delimited text.
//!
//! Named factor columns are read as categorical labels; every other selected
//! column must be numeric. Blank cells and the usual missing-value markers
//! (`NA`, `N/A`, `NaN`, `null`) become NaN in numeric columns and missing
//! labels in factor columns. Either way the engine drops those rows later.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::table::{Column, WideTable};

const MISSING_MARKERS: [&str; 4] = ["na", "n/a", "nan", "null"];

/// Options for [`read_csv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter (default: comma).
    pub delimiter: u8,
    /// Columns read as categorical factors.
    pub factor_columns: Vec<String>,
    /// Numeric columns to keep; all non-factor columns when `None`.
    pub keep: Option<Vec<String>>,
}

impl CsvOptions {
    /// Comma-delimited input with the given factor columns.
    #[must_use]
    pub fn new<I, S>(factor_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            delimiter: b',',
            factor_columns: factor_columns.into_iter().map(Into::into).collect(),
            keep: None,
        }
    }

    /// Use a different field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Keep only these numeric columns.
    #[must_use]
    pub fn keep<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

/// Read a delimited file into a [`WideTable`].
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a requested column is
/// missing, or a numeric cell cannot be parsed.
pub fn read_csv(path: &Path, options: &CsvOptions) -> Result<WideTable> {
    let file = File::open(path)
        .map_err(|e| Error::invalid_params(format!("cannot open '{}': {e}", path.display())))?;
    let table = read_csv_from(file, options)?;
    debug!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_columns(),
        "loaded table"
    );
    Ok(table)
}

/// Read delimited text from any reader into a [`WideTable`].
///
/// # Errors
///
/// See [`read_csv`].
pub fn read_csv_from<R: Read>(reader: R, options: &CsvOptions) -> Result<WideTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::missing_column(name))
    };

    let selected: Vec<String> = match &options.keep {
        Some(keep) => options
            .factor_columns
            .iter()
            .chain(keep.iter())
            .cloned()
            .collect(),
        None => headers.clone(),
    };
    for name in &options.factor_columns {
        position(name)?;
    }

    let mut columns: Vec<(String, usize, Column)> = selected
        .into_iter()
        .map(|name| {
            let index = position(&name)?;
            let column = if options.factor_columns.contains(&name) {
                Column::Factor(Vec::new())
            } else {
                Column::Numeric(Vec::new())
            };
            Ok((name, index, column))
        })
        .collect::<Result<_>>()?;

    for record in reader.records() {
        let record = record?;
        let line = record
            .position()
            .map_or(0, |p| usize::try_from(p.line()).unwrap_or(usize::MAX));
        for (name, index, column) in &mut columns {
            let cell = record.get(*index).unwrap_or("");
            match column {
                Column::Factor(labels) => {
                    labels.push((!is_missing(cell)).then(|| cell.to_string()));
                }
                Column::Numeric(values) => values.push(parse_number(cell, line, name)?),
            }
        }
    }

    WideTable::from_columns(
        columns
            .into_iter()
            .map(|(name, _, column)| (name, column))
            .collect(),
    )
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_MARKERS.iter().any(|m| cell.eq_ignore_ascii_case(m))
}

fn parse_number(cell: &str, line: usize, column: &str) -> Result<f64> {
    if is_missing(cell) {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>().map_err(|_| Error::Parse {
        line,
        column: column.to_string(),
        value: cell.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const OXYGRAPH: &str = "\
Sheep,Group,Time,CI_OXPHOS,LEAK
1,BSD,2,10.5,1.2
2,BSD,8,,1.4
3,SHAM,2,12.0,NA
4,SHAM,8,11.1,1.0
";

    #[test]
    fn test_read_all_columns() {
        let options = CsvOptions::new(["Sheep", "Group", "Time"]);
        let table = read_csv_from(OXYGRAPH.as_bytes(), &options).unwrap();

        assert_eq!(table.n_rows(), 4);
        assert_eq!(
            table.column_names(),
            &["Sheep", "Group", "Time", "CI_OXPHOS", "LEAK"]
        );
        let time: Vec<&str> = table
            .factor("Time")
            .unwrap()
            .iter()
            .filter_map(Option::as_deref)
            .collect();
        assert_eq!(time, vec!["2", "8", "2", "8"]);

        let oxphos = table.numeric("CI_OXPHOS").unwrap();
        assert!(oxphos[1].is_nan());
        assert!(table.numeric("LEAK").unwrap()[2].is_nan());
    }

    #[test]
    fn test_keep_selects_columns() {
        let options = CsvOptions::new(["Group", "Time"]).keep(["LEAK"]);
        let table = read_csv_from(OXYGRAPH.as_bytes(), &options).unwrap();
        assert_eq!(table.column_names(), &["Group", "Time", "LEAK"]);
    }

    #[test]
    fn test_missing_factor_column() {
        let options = CsvOptions::new(["Heart"]);
        let err = read_csv_from(OXYGRAPH.as_bytes(), &options).unwrap_err();
        assert_eq!(err, Error::missing_column("Heart"));
    }

    #[test]
    fn test_unparseable_cell() {
        let data = "Group,X\nA,1.0\nB,high\n";
        let err = read_csv_from(data.as_bytes(), &CsvOptions::new(["Group"])).unwrap_err();
        assert_eq!(
            err,
            Error::Parse {
                line: 3,
                column: "X".into(),
                value: "high".into(),
            }
        );
    }

    #[test]
    fn test_blank_factor_cells_are_missing() {
        let data = "Group,Time,X
A,1,1.0
,2,2.0
NA,1,3.0
B, ,4.0
";
        let table = read_csv_from(data.as_bytes(), &CsvOptions::new(["Group", "Time"])).unwrap();

        let group = table.factor("Group").unwrap();
        assert_eq!(group[0].as_deref(), Some("A"));
        assert_eq!(group[1], None);
        assert_eq!(group[2], None);
        assert_eq!(group[3].as_deref(), Some("B"));
        // whitespace-only cells trim to blank
        assert_eq!(table.factor("Time").unwrap()[3], None);
        assert_eq!(table.numeric("X").unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_semicolon_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Group;X\nA;1\nB;2\n").unwrap();

        let options = CsvOptions::new(["Group"]).with_delimiter(b';');
        let table = read_csv(file.path(), &options).unwrap();
        assert_eq!(table.numeric("X").unwrap(), &[1.0, 2.0]);
    }
}
