//! Post-hoc grouping generation.
//!
//! For a factor set of size k, every factor in turn is taken out and compared
//! pairwise while the other k − 1 factors are held at each of their level
//! combinations.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::validate_factor_names;

/// How many factors each grouping leaves out of the held-fixed set.
pub const FACTORS_EXCLUDED_PER_GROUPING: usize = 1;

/// One post-hoc breakdown: compare levels of `excluded` within every
/// combination of the `held` factors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupingSpec {
    /// Factors held fixed, in factor-set order.
    pub held: Vec<String>,
    /// Factor whose levels are compared.
    pub excluded: String,
}

/// Generate one [`GroupingSpec`] per factor.
///
/// The specs follow the order of the (k − 1)-element combinations of
/// `factors` taken in lexicographic index order, so the excluded factor runs
/// from the last factor to the first. The output is identical for identical
/// input.
///
/// # Errors
///
/// Returns [`Error::NoFactors`](crate::Error::NoFactors) for an empty list
/// and [`Error::DuplicateFactor`](crate::Error::DuplicateFactor) if a name
/// repeats.
///
/// # Example
///
/// ```
/// use factorstats::design::generate_groupings;
///
/// let specs = generate_groupings(&["Group", "Time"])?;
/// assert_eq!(specs.len(), 2);
/// assert_eq!(specs[0].held, vec!["Group"]);
/// assert_eq!(specs[0].excluded, "Time");
/// assert_eq!(specs[1].held, vec!["Time"]);
/// assert_eq!(specs[1].excluded, "Group");
/// # Ok::<(), factorstats::Error>(())
/// ```
pub fn generate_groupings<S: AsRef<str>>(factors: &[S]) -> Result<Vec<GroupingSpec>> {
    let factors = validate_factor_names(factors)?;
    let k = factors.len();
    let held_size = k - FACTORS_EXCLUDED_PER_GROUPING;

    Ok(combinations(k, held_size)
        .into_iter()
        .map(|held_idx| {
            let excluded = (0..k)
                .find(|i| !held_idx.contains(i))
                .map_or_else(String::new, |i| factors[i].clone());
            GroupingSpec {
                held: held_idx.iter().map(|&i| factors[i].clone()).collect(),
                excluded,
            }
        })
        .collect())
}

/// All `r`-element index combinations of `0..n`, in lexicographic order.
pub(crate) fn combinations(n: usize, r: usize) -> Vec<Vec<usize>> {
    if r > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..r).collect();
    loop {
        out.push(idx.clone());

        // rightmost position that can still advance
        let Some(i) = (0..r).rev().find(|&i| idx[i] != i + n - r) else {
            return out;
        };
        idx[i] += 1;
        for j in i + 1..r {
            idx[j] = idx[j - 1] + 1;
        }
    }
}
