//! Statistical tests.
//!
//! This module provides the two fixed tests the engine runs:
//! - Full-factorial ANOVA with Type II sums of squares ([`anova`])
//! - Tukey HSD pairwise comparisons ([`pairwise_tukey`])
//!
//! Both take the dependent variable as an explicit [`Response`] and the
//! grouping columns as [`FactorColumn`]s, one label per observation.
//!
//! ## Quick Start
//!
//! ```rust
//! use factorstats::stats::{anova, pairwise_tukey, FactorColumn, Response};
//!
//! let response = Response {
//!     name: "X",
//!     values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
//! };
//! let group = FactorColumn {
//!     name: "Group",
//!     labels: vec!["A", "A", "A", "B", "B", "B"],
//! };
//!
//! let table = anova(&response, &[group.clone()])?;
//! assert_eq!(table.effects.len(), 1);
//!
//! let pairs = pairwise_tukey(&response, &group)?;
//! assert_eq!(pairs.len(), 1);
//! assert!(pairs[0].p_tukey < 0.05);
//! # Ok::<(), factorstats::Error>(())
//! ```

mod anova;
mod distribution;
mod linear;
mod tukey;
mod types;

pub use anova::{anova, factorial_terms, INTERACTION_SEPARATOR};
pub use distribution::{f_distribution_p_value, studentized_range_cdf, studentized_range_sf};
pub use linear::{least_squares, FactorialDesign, LeastSquares};
pub use tukey::pairwise_tukey;
pub use types::{AnovaRow, AnovaTable, FactorColumn, PostHocTable, Response, TukeyRow};
