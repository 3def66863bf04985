//! Workbook persistence with `rust_xlsxwriter`.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, info};

use super::layout::{PlacedTable, ReportLayout};
use super::{Cell, ReportConfig};
use crate::engine::StatsResults;
use crate::error::{Error, Result};

/// Writes a [`ReportLayout`] into an xlsx workbook.
///
/// The workbook lives in memory until [`ReportWriter::save`] is called, which
/// may happen at most once.
pub struct ReportWriter {
    workbook: Workbook,
    header: Format,
    saved: bool,
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReportWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportWriter")
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

impl ReportWriter {
    /// Create an empty workbook.
    #[must_use]
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            header: Format::new().set_bold(),
            saved: false,
        }
    }

    /// Whether the workbook has been written to disk.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Add every sheet of `layout`, in order.
    ///
    /// # Errors
    ///
    /// [`Error::Persistence`] if a sheet cannot be created or a cell falls
    /// outside the worksheet.
    pub fn write_layout(&mut self, layout: &ReportLayout) -> Result<()> {
        for sheet in &layout.sheets {
            let worksheet = self.workbook.add_worksheet();
            worksheet.set_name(sheet.name.as_str())?;
            for placed in &sheet.tables {
                write_table(worksheet, placed, &self.header)?;
            }
            debug!(sheet = %sheet.name, tables = sheet.tables.len(), "Wrote sheet");
        }
        Ok(())
    }

    /// Save the workbook to `path`.
    ///
    /// # Errors
    ///
    /// [`Error::Persistence`] if the workbook was already saved or the file
    /// cannot be written.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if self.saved {
            return Err(Error::persistence("workbook has already been saved"));
        }
        self.workbook.save(path)?;
        self.saved = true;
        info!(path = %path.display(), "Saved {}", path.display());
        Ok(())
    }
}

fn column(start: u16, offset: usize) -> Result<u16> {
    u16::try_from(offset)
        .ok()
        .and_then(|o| start.checked_add(o))
        .ok_or_else(|| Error::persistence("table is too wide for a worksheet"))
}

fn row(start: u32, offset: usize) -> Result<u32> {
    u32::try_from(offset)
        .ok()
        .and_then(|o| start.checked_add(o))
        .ok_or_else(|| Error::persistence("table is too long for a worksheet"))
}

/// Header row with a blank index header, then one row per record.
fn write_table(worksheet: &mut Worksheet, placed: &PlacedTable, header: &Format) -> Result<()> {
    let table = &placed.table;
    let top = placed.start_row;
    let left = placed.start_col;

    for (j, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(top, column(left, j + 1)?, name.as_str(), header)?;
    }

    for (i, (index, cells)) in table.index.iter().zip(&table.rows).enumerate() {
        let r = row(top, i + 1)?;
        write_cell(worksheet, r, left, index, Some(header))?;
        for (j, cell) in cells.iter().enumerate() {
            write_cell(worksheet, r, column(left, j + 1)?, cell, None)?;
        }
    }
    Ok(())
}

/// NaN stays blank; infinities are written as `inf` / `-inf` text.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> Result<()> {
    match (cell, format) {
        (Cell::Empty, _) => {}
        (Cell::Number(v), _) if v.is_nan() => {}
        (Cell::Number(v), _) if v.is_infinite() => {
            let text = if *v > 0.0 { "inf" } else { "-inf" };
            worksheet.write_string(row, col, text)?;
        }
        (Cell::Number(v), Some(format)) => {
            worksheet.write_number_with_format(row, col, *v, format)?;
        }
        (Cell::Number(v), None) => {
            worksheet.write_number(row, col, *v)?;
        }
        (Cell::Text(s), Some(format)) => {
            worksheet.write_string_with_format(row, col, s.as_str(), format)?;
        }
        (Cell::Text(s), None) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
    }
    Ok(())
}

/// Lay out `results`, build the workbook and, when `config.save` is set,
/// write it to `path`.
///
/// # Arguments
/// * `results` - Analysis results keyed by parameter
/// * `path` - Destination workbook
/// * `config` - Spacer rows and whether to save
///
/// # Returns
/// * The layout and the populated writer. An unsaved writer can still be
///   saved later with [`ReportWriter::save`].
///
/// # Errors
/// * [`Error::SheetNameCollision`] if two sheet names collide
/// * [`Error::Persistence`] if the workbook cannot be written
pub fn write_report(
    results: &StatsResults,
    path: &Path,
    config: &ReportConfig,
) -> Result<(ReportLayout, ReportWriter)> {
    let layout = ReportLayout::from_results(results, config.spacer_rows)?;
    let mut writer = ReportWriter::new();
    writer.write_layout(&layout)?;
    if config.save {
        writer.save(path)?;
    }
    Ok((layout, writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ParameterResults;
    use crate::stats::{AnovaRow, AnovaTable, PostHocTable, TukeyRow};

    fn results() -> StatsResults {
        let effect = AnovaRow {
            source: "Group".into(),
            ss: 13.5,
            df: 1,
            ms: 13.5,
            f: Some(13.5),
            p_unc: Some(0.021),
            np2: Some(0.77),
        };
        let residual = AnovaRow {
            source: "Within".into(),
            ss: 4.0,
            df: 4,
            ms: 1.0,
            f: None,
            p_unc: None,
            np2: None,
        };
        let tukey = TukeyRow {
            a: "a".into(),
            b: "b".into(),
            mean_a: 2.0,
            mean_b: 5.0,
            diff: -3.0,
            se: 0.8165,
            t: -3.674,
            p_tukey: 0.021,
            hedges: f64::NAN,
        };
        let mut out = StatsResults::new();
        out.insert(
            "CI/CII".into(),
            ParameterResults {
                anova: AnovaTable {
                    parameter: "CI/CII".into(),
                    effects: vec![effect],
                    residual,
                    observations: 6,
                },
                posthoc: vec![PostHocTable {
                    parameter: "CI/CII".into(),
                    held: vec![("Time".into(), "1".into())],
                    excluded: "Group".into(),
                    rows: vec![tukey],
                }],
                failures: Vec::new(),
            },
        );
        out
    }

    #[test]
    fn test_write_report_saves_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_Stats.xlsx");

        let (layout, writer) = write_report(&results(), &path, &ReportConfig::default()).unwrap();
        assert_eq!(layout.sheets.len(), 2);
        assert!(writer.is_saved());

        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip archive
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_write_report_without_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unsaved_Stats.xlsx");
        let config = ReportConfig {
            save: false,
            ..ReportConfig::default()
        };

        let (layout, mut writer) = write_report(&results(), &path, &config).unwrap();
        assert!(layout.sheet("CI_CII_POSTHOC").is_some());
        assert!(!path.exists());
        assert!(!writer.is_saved());

        // the returned workbook is complete and can be saved later
        writer.save(&path).unwrap();
        assert!(writer.is_saved());
        assert_eq!(&std::fs::read(&path).unwrap()[..2], b"PK");
    }

    #[test]
    fn test_save_twice_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.xlsx");
        let layout = ReportLayout::from_results(&results(), 3).unwrap();

        let mut writer = ReportWriter::new();
        writer.write_layout(&layout).unwrap();
        writer.save(&path).unwrap();
        assert!(writer.is_saved());

        let err = writer.save(&path).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }

    #[test]
    fn test_save_to_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xlsx");
        let err = write_report(&results(), &path, &ReportConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }
}
