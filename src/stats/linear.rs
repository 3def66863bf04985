//! Least-squares model comparison for factorial designs.
//!
//! Factors are sum-to-zero coded; an interaction term's columns are the
//! products of its factors' contrast columns. Residual sums of squares are
//! computed by projecting the response on an orthonormal basis of the model
//! columns, built with modified Gram–Schmidt. Columns that fall inside the
//! span of earlier ones are dropped, so empty cells and aliased terms reduce
//! the rank instead of failing.

use ndarray::{Array1, Array2};

use crate::table::sorted_levels;

use super::types::FactorColumn;

/// Relative norm below which an orthogonalized column counts as dependent.
const RANK_TOLERANCE: f64 = 1e-9;

/// Residual sum of squares and rank of a least-squares fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeastSquares {
    /// Residual sum of squares.
    pub rss: f64,
    /// Rank of the model matrix.
    pub rank: usize,
}

/// Level-coded factors of one data set.
#[derive(Debug, Clone)]
pub struct FactorialDesign {
    observations: usize,
    codes: Vec<Vec<usize>>,
    levels: Vec<usize>,
}

impl FactorialDesign {
    /// Code each factor's labels as level indices (numeric-aware sort order).
    #[must_use]
    pub fn new(factors: &[FactorColumn<'_>]) -> Self {
        let observations = factors.first().map_or(0, |f| f.labels.len());
        let mut codes = Vec::with_capacity(factors.len());
        let mut levels = Vec::with_capacity(factors.len());

        for factor in factors {
            let order = sorted_levels(factor.labels.iter().copied());
            codes.push(
                factor
                    .labels
                    .iter()
                    .map(|label| order.iter().position(|l| l == label).unwrap_or(0))
                    .collect(),
            );
            levels.push(order.len());
        }

        Self {
            observations,
            codes,
            levels,
        }
    }

    /// Number of observations.
    #[must_use]
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Number of distinct levels of each factor.
    #[must_use]
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Contrast columns of one term (a set of factor indices).
    fn term_columns(&self, term: &[usize]) -> Vec<Array1<f64>> {
        let mut columns = vec![Array1::<f64>::ones(self.observations)];
        for &factor in term {
            let n_levels = self.levels[factor];
            let codes = &self.codes[factor];
            let mut next = Vec::with_capacity(columns.len() * n_levels.saturating_sub(1));
            for column in &columns {
                for contrast in 0..n_levels.saturating_sub(1) {
                    let coded = Array1::from_iter(codes.iter().map(|&level| {
                        if level == contrast {
                            1.0
                        } else if level + 1 == n_levels {
                            -1.0
                        } else {
                            0.0
                        }
                    }));
                    next.push(column * &coded);
                }
            }
            columns = next;
        }
        columns
    }

    /// Model matrix: intercept followed by the columns of every term.
    #[must_use]
    pub fn model_matrix(&self, terms: &[Vec<usize>]) -> Array2<f64> {
        let mut columns = vec![Array1::<f64>::ones(self.observations)];
        for term in terms {
            columns.extend(self.term_columns(term));
        }
        Array2::from_shape_fn((self.observations, columns.len()), |(i, j)| columns[j][i])
    }

    /// Fit the model made of `terms` (plus intercept) to `y`.
    #[must_use]
    pub fn fit(&self, terms: &[Vec<usize>], y: &Array1<f64>) -> LeastSquares {
        least_squares(&self.model_matrix(terms), y)
    }
}

/// Residual sum of squares of `y` after projection on the columns of `x`.
#[must_use]
pub fn least_squares(x: &Array2<f64>, y: &Array1<f64>) -> LeastSquares {
    let mut basis: Vec<Array1<f64>> = Vec::with_capacity(x.ncols());

    for column in x.columns() {
        let mut v = column.to_owned();
        let norm0 = v.dot(&v).sqrt();
        if norm0 == 0.0 {
            continue;
        }
        // two passes keep the basis orthogonal to working precision
        for _ in 0..2 {
            for q in &basis {
                let proj = q.dot(&v);
                v.scaled_add(-proj, q);
            }
        }
        let norm = v.dot(&v).sqrt();
        if norm <= RANK_TOLERANCE * norm0 {
            continue;
        }
        v /= norm;
        basis.push(v);
    }

    let mut residual = y.clone();
    for q in &basis {
        let proj = q.dot(&residual);
        residual.scaled_add(-proj, q);
    }

    LeastSquares {
        rss: residual.dot(&residual),
        rank: basis.len(),
    }
}
