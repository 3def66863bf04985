//! Python bindings for factorstats.
//!
//! Exposes the CSV-to-workbook pipeline through PyO3. Enable the `python`
//! feature to use this.

use std::path::PathBuf;

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::error::{Error, ErrorCategory};
use crate::io::{read_csv, CsvOptions};
use crate::pipeline::{AnalysisConfig, StatsBuilder, StatsOutput};

fn to_py_err(err: Error) -> PyErr {
    match err.category() {
        ErrorCategory::Persistence => PyIOError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Python wrapper for a finished analysis.
#[pyclass(name = "StatsReport", unsendable)]
pub struct PyStatsReport {
    inner: StatsOutput,
}

#[pymethods]
impl PyStatsReport {
    /// Workbook path.
    #[getter]
    fn path(&self) -> String {
        self.inner.path.to_string_lossy().into_owned()
    }

    /// Whether the workbook was written.
    #[getter]
    fn saved(&self) -> bool {
        self.inner.saved()
    }

    /// Write the workbook if the run did not.
    fn save(&mut self) -> PyResult<()> {
        self.inner.save().map_err(to_py_err)
    }

    /// Analysed parameters, sorted.
    #[getter]
    fn parameters(&self) -> Vec<String> {
        self.inner.results.keys().cloned().collect()
    }

    /// Sheet names in workbook order.
    #[getter]
    fn sheet_names(&self) -> Vec<String> {
        self.inner.layout.sheet_names().map(String::from).collect()
    }

    /// Skipped post-hoc groups as `(parameter, excluded, reason)`.
    fn failures(&self) -> Vec<(String, String, String)> {
        self.inner
            .results
            .values()
            .flat_map(|r| &r.failures)
            .map(|f| (f.parameter.clone(), f.excluded.clone(), f.reason.clone()))
            .collect()
    }
}

/// Load `path`, run the analysis and write `<filename>_Stats.xlsx`.
#[pyfunction]
#[pyo3(signature = (path, factors, betweens, filename, keep=None, save=true))]
fn do_stats(
    path: PathBuf,
    factors: Vec<String>,
    betweens: Vec<String>,
    filename: String,
    keep: Option<Vec<String>>,
    save: bool,
) -> PyResult<PyStatsReport> {
    let config = AnalysisConfig {
        betweens: betweens.clone(),
        grouping_factors: factors.clone(),
    };
    let mut options = CsvOptions::new(config.factor_columns());
    if let Some(keep) = keep {
        options = options.keep(keep);
    }

    let wide = read_csv(&path, &options).map_err(to_py_err)?;
    let output = StatsBuilder::new()
        .betweens(betweens)
        .grouping_factors(factors)
        .output(filename)
        .save(save)
        .run(&wide)
        .map_err(to_py_err)?;

    Ok(PyStatsReport { inner: output })
}

/// The factorstats Python module.
#[pymodule]
fn factorstats(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyStatsReport>()?;
    m.add_function(wrap_pyfunction!(do_stats, m)?)?;
    Ok(())
}
