//! # factorstats
//!
//! Multi-factor ANOVA with drop-one-factor post-hoc breakdowns, reported as
//! an xlsx workbook.
//!
//! ## Overview
//!
//! Starting from a wide table (one row per experimental unit, factor columns
//! plus one numeric column per measured parameter), the library:
//! - Reshapes it into long form, one row per (unit, parameter)
//! - Runs a full-factorial ANOVA per parameter across the between factors
//! - For every way of leaving one grouping factor out, runs Tukey HSD across
//!   that factor's levels within each combination of the others
//! - Writes `<parameter>_ANOVA` and `<parameter>_POSTHOC` sheets, tables
//!   stacked top to bottom
//!
//! ## Quick Start
//!
//! ```rust
//! use factorstats::prelude::*;
//!
//! let wide = WideTable::new()
//!     .with_factor("Group", ["A", "A", "A", "A", "B", "B", "B", "B"])?
//!     .with_factor("Time", ["1", "1", "2", "2", "1", "1", "2", "2"])?
//!     .with_numeric("X", vec![1.0, 3.0, 5.0, 7.0, 2.0, 4.0, 10.0, 12.0])?;
//!
//! // Nothing is written with save = false
//! let output = do_stats(&wide, &["Group", "Time"], &["Group", "Time"], "run", false)?;
//!
//! let x = &output.results["X"];
//! assert_eq!(x.anova.effects.len(), 3);
//! assert_eq!(x.posthoc.len(), 4);
//! assert_eq!(
//!     output.layout.sheet_names().collect::<Vec<_>>(),
//!     ["X_ANOVA", "X_POSTHOC"]
//! );
//! # Ok::<(), factorstats::Error>(())
//! ```
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of result types
//! - `cli`: Build the `factorstats` binary (default)
//! - `python`: Enable Python bindings via PyO3

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod design;
pub mod engine;
pub mod error;
pub mod io;
pub mod pipeline;
#[cfg(feature = "python")]
pub mod python;
pub mod report;
pub mod stats;
pub mod table;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::design::{generate_groupings, GroupingSpec, FACTORS_EXCLUDED_PER_GROUPING};
    pub use crate::engine::{run_analysis, ParameterResults, PostHocFailure, StatsResults};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::io::{read_csv, CsvOptions};
    pub use crate::pipeline::{do_stats, AnalysisConfig, StatsBuilder, StatsOutput};
    pub use crate::report::{
        write_report, ReportConfig, ReportLayout, ReportWriter, DEFAULT_SPACER_ROWS, STATS_SUFFIX,
    };
    pub use crate::stats::{anova, pairwise_tukey, AnovaRow, AnovaTable, PostHocTable, TukeyRow};
    pub use crate::table::{transpose, Column, LongTable, WideTable};
}

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use pipeline::{do_stats, StatsBuilder};
