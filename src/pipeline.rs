//! End-to-end analysis: reshape, test, report.
//!
//! [`StatsBuilder`] collects the factors and report options, then
//! [`StatsBuilder::run`] transposes a [`WideTable`], runs the engine and lays
//! out (and by default saves) the workbook. [`do_stats`] is the one-call form.
//!
//! # Example
//!
//! ```no_run
//! use factorstats::pipeline::StatsBuilder;
//! use factorstats::table::WideTable;
//!
//! let wide = WideTable::new()
//!     .with_factor("Group", ["A", "A", "A", "B", "B", "B"])?
//!     .with_numeric("X", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
//!
//! let output = StatsBuilder::new()
//!     .betweens(["Group"])
//!     .grouping_factors(["Group"])
//!     .output("run")
//!     .run(&wide)?;
//!
//! assert_eq!(output.path.to_str(), Some("run_Stats.xlsx"));
//! # Ok::<(), factorstats::Error>(())
//! ```

use std::path::PathBuf;

use tracing::info;

use crate::engine::{run_analysis, StatsResults};
use crate::error::{Error, Result};
use crate::report::{write_report, ReportConfig, ReportLayout, ReportWriter, STATS_SUFFIX};
use crate::table::{transpose, WideTable};

/// Which factors the analysis uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Factors of the full-factorial ANOVA.
    pub betweens: Vec<String>,
    /// Factors the post-hoc groupings are generated from.
    pub grouping_factors: Vec<String>,
}

impl AnalysisConfig {
    /// Every factor column, grouping factors first, without repeats.
    #[must_use]
    pub fn factor_columns(&self) -> Vec<String> {
        let mut columns = self.grouping_factors.clone();
        for name in &self.betweens {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        columns
    }
}

/// What a pipeline run produced.
#[derive(Debug)]
pub struct StatsOutput {
    /// Results keyed by parameter.
    pub results: StatsResults,
    /// Workbook layout of `results`.
    pub layout: ReportLayout,
    /// Workbook path, `<stem>_Stats.xlsx`.
    pub path: PathBuf,
    /// The populated workbook, saved or not.
    pub writer: ReportWriter,
}

impl StatsOutput {
    /// Whether the workbook has been written to `path`.
    #[must_use]
    pub fn saved(&self) -> bool {
        self.writer.is_saved()
    }

    /// Write the workbook to `path` after a run with saving turned off.
    ///
    /// # Errors
    ///
    /// [`Error::Persistence`] if the workbook was already saved or the file
    /// cannot be written.
    pub fn save(&mut self) -> Result<()> {
        self.writer.save(&self.path)
    }
}

/// Builder for an analysis run.
#[derive(Debug, Clone, Default)]
pub struct StatsBuilder {
    betweens: Option<Vec<String>>,
    grouping_factors: Option<Vec<String>>,
    output: Option<String>,
    report: ReportConfig,
}

impl StatsBuilder {
    /// Create a new builder with default report options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ANOVA factors.
    #[must_use]
    pub fn betweens<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.betweens = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the post-hoc grouping factors.
    ///
    /// Defaults to the ANOVA factors when not set.
    #[must_use]
    pub fn grouping_factors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grouping_factors = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the output file stem; `_Stats.xlsx` is appended.
    #[must_use]
    pub fn output(mut self, stem: impl Into<String>) -> Self {
        self.output = Some(stem.into());
        self
    }

    /// Set the row advance between stacked tables.
    #[must_use]
    pub fn spacer_rows(mut self, rows: u32) -> Self {
        self.report.spacer_rows = rows;
        self
    }

    /// Set whether the workbook is saved.
    #[must_use]
    pub fn save(mut self, save: bool) -> Self {
        self.report.save = save;
        self
    }

    /// Resolve the analysis settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if no ANOVA factors were given.
    pub fn config(&self) -> Result<AnalysisConfig> {
        let betweens = self
            .betweens
            .clone()
            .ok_or_else(|| Error::invalid_params("betweens must be specified"))?;
        let grouping_factors = self
            .grouping_factors
            .clone()
            .unwrap_or_else(|| betweens.clone());
        Ok(AnalysisConfig {
            betweens,
            grouping_factors,
        })
    }

    /// Run the analysis on `wide`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No ANOVA factors or output stem were given
    /// - A factor is missing from `wide` or not categorical
    /// - A sheet name collides or the workbook cannot be saved
    pub fn run(self, wide: &WideTable) -> Result<StatsOutput> {
        let config = self.config()?;
        let stem = self
            .output
            .ok_or_else(|| Error::invalid_params("output must be specified"))?;
        if stem.is_empty() {
            return Err(Error::invalid_params("output must not be empty"));
        }

        info!(
            factors = ?config.betweens,
            "Performing {}-way ANOVA...",
            config.betweens.len()
        );

        let long = transpose(wide, &config.factor_columns())?;
        let results = run_analysis(&long, &config.betweens, &config.grouping_factors)?;

        let path = PathBuf::from(format!("{stem}{STATS_SUFFIX}"));
        let (layout, writer) = write_report(&results, &path, &self.report)?;

        Ok(StatsOutput {
            results,
            layout,
            path,
            writer,
        })
    }
}

/// Run the full analysis with default report options.
///
/// # Arguments
/// * `wide` - One row per experimental unit
/// * `betweens` - Factors of the full-factorial ANOVA
/// * `grouping_factors` - Factors the post-hoc groupings are generated from
/// * `filename_stem` - Workbook path without the `_Stats.xlsx` suffix
/// * `save` - Whether to write the workbook
///
/// # Errors
/// * See [`StatsBuilder::run`]
pub fn do_stats<B, G>(
    wide: &WideTable,
    betweens: &[B],
    grouping_factors: &[G],
    filename_stem: &str,
    save: bool,
) -> Result<StatsOutput>
where
    B: AsRef<str>,
    G: AsRef<str>,
{
    StatsBuilder::new()
        .betweens(betweens.iter().map(|s| s.as_ref().to_string()))
        .grouping_factors(grouping_factors.iter().map(|s| s.as_ref().to_string()))
        .output(filename_stem)
        .save(save)
        .run(wide)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SheetKind;

    fn oxygraph() -> WideTable {
        WideTable::new()
            .with_factor("Group", ["A", "A", "A", "A", "B", "B", "B", "B"])
            .unwrap()
            .with_factor("Time", ["1", "1", "2", "2", "1", "1", "2", "2"])
            .unwrap()
            .with_numeric("CI/CII", vec![1.0, 3.0, 5.0, 7.0, 2.0, 4.0, 10.0, 12.0])
            .unwrap()
            .with_numeric("LEAK", vec![0.5, 0.7, 0.4, 0.9, 1.1, 1.0, 1.6, 1.2])
            .unwrap()
    }

    #[test]
    fn test_factor_columns_union() {
        let config = AnalysisConfig {
            betweens: vec!["Group".into(), "Time".into()],
            grouping_factors: vec!["Sheep".into(), "Group".into()],
        };
        assert_eq!(config.factor_columns(), vec!["Sheep", "Group", "Time"]);
    }

    #[test]
    fn test_builder_requires_betweens_and_output() {
        let err = StatsBuilder::new().output("x").run(&oxygraph()).unwrap_err();
        assert!(matches!(err, Error::InvalidParams { .. }));

        let err = StatsBuilder::new()
            .betweens(["Group"])
            .run(&oxygraph())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParams { .. }));
    }

    #[test]
    fn test_grouping_defaults_to_betweens() {
        let config = StatsBuilder::new().betweens(["Group", "Time"]).config().unwrap();
        assert_eq!(config.grouping_factors, config.betweens);
    }

    #[test]
    fn test_do_stats_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("two-way");
        let stem = stem.to_str().unwrap();

        let output = do_stats(&oxygraph(), &["Group", "Time"], &["Group", "Time"], stem, false)
            .unwrap();
        assert!(!output.saved());
        assert!(!output.path.exists());
        assert!(output.path.to_string_lossy().ends_with("two-way_Stats.xlsx"));

        let keys: Vec<&str> = output.results.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["CI/CII", "LEAK"]);

        let names: Vec<&str> = output.layout.sheet_names().collect();
        assert_eq!(
            names,
            vec!["CI_CII_ANOVA", "CI_CII_POSTHOC", "LEAK_ANOVA", "LEAK_POSTHOC"]
        );
        let posthoc = output.layout.sheet("CI_CII_POSTHOC").unwrap();
        assert_eq!(posthoc.kind, SheetKind::PostHoc);
        // two groupings with two groups each
        assert_eq!(posthoc.tables.len(), 4);
    }

    #[test]
    fn test_do_stats_saves_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("saved");

        let output = StatsBuilder::new()
            .betweens(["Group", "Time"])
            .output(stem.to_string_lossy())
            .spacer_rows(4)
            .run(&oxygraph())
            .unwrap();
        assert!(output.saved());
        assert!(output.path.exists());

        let starts: Vec<u32> = output
            .layout
            .sheet("LEAK_POSTHOC")
            .unwrap()
            .tables
            .iter()
            .map(|t| t.start_row)
            .collect();
        // one pair per table
        assert_eq!(starts, vec![0, 5, 10, 15]);
    }

    #[test]
    fn test_deferred_save() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("later");

        let mut output = do_stats(
            &oxygraph(),
            &["Group", "Time"],
            &["Group", "Time"],
            &stem.to_string_lossy(),
            false,
        )
        .unwrap();
        assert!(!output.path.exists());

        output.save().unwrap();
        assert!(output.saved());
        assert!(output.path.exists());

        let err = output.save().unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }

    #[test]
    fn test_missing_factor_is_input_error() {
        let err = do_stats(&oxygraph(), &["Group", "Heart"], &["Group"], "x", false).unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Input);
    }
}
