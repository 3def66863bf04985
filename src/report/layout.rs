//! Sheet naming and table placement.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{SheetKind, Table};
use crate::engine::StatsResults;
use crate::error::{Error, Result};

/// Excel's limit on sheet name length, in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters Excel rejects in sheet names.
const ILLEGAL_SHEET_CHARS: [char; 7] = ['/', '\\', '?', '*', '[', ']', ':'];

/// Make a sheet name acceptable to Excel.
///
/// Forbidden characters become `_`, as does an apostrophe at either end, and
/// the result is cut to [`MAX_SHEET_NAME_LEN`] characters.
///
/// # Examples
///
/// ```
/// use factorstats::report::sanitize_sheet_name;
///
/// assert_eq!(sanitize_sheet_name("CI/CII_ANOVA"), "CI_CII_ANOVA");
/// ```
#[must_use]
pub fn sanitize_sheet_name(raw: &str) -> String {
    let mut chars: Vec<char> = raw
        .chars()
        .map(|c| if ILLEGAL_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    if chars.is_empty() {
        return "_".to_string();
    }
    if chars[0] == '\'' {
        chars[0] = '_';
    }
    if let Some(last) = chars.last_mut() {
        if *last == '\'' {
            *last = '_';
        }
    }
    chars.into_iter().collect()
}

/// Sheet name for one parameter's results of `kind`.
///
/// The parameter part is sanitized and shortened so that the `_ANOVA` /
/// `_POSTHOC` suffix always survives the [`MAX_SHEET_NAME_LEN`] limit.
///
/// # Examples
///
/// ```
/// use factorstats::report::{sheet_name, SheetKind};
///
/// let name = sheet_name("CI_CII_OXPHOS_normalised_to_CS", SheetKind::PostHoc);
/// assert_eq!(name, "CI_CII_OXPHOS_normalise_POSTHOC");
/// ```
#[must_use]
pub fn sheet_name(parameter: &str, kind: SheetKind) -> String {
    let suffix = kind.suffix();
    let room = MAX_SHEET_NAME_LEN - suffix.len() - 1;
    let stem: String = sanitize_sheet_name(parameter).chars().take(room).collect();
    format!("{stem}_{suffix}")
}

/// A table anchored at a cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacedTable {
    /// Row of the header.
    pub start_row: u32,
    /// Column of the index.
    pub start_col: u16,
    /// The table.
    pub table: Table,
}

/// One sheet and its tables, top to bottom.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SheetLayout {
    /// Sanitized sheet name.
    pub name: String,
    /// Parameter the sheet reports on.
    pub parameter: String,
    /// Which result kind the sheet holds.
    pub kind: SheetKind,
    /// Tables in placement order.
    pub tables: Vec<PlacedTable>,
}

impl SheetLayout {
    /// Stack `tables` from row 0, each `rows + spacer_rows` below the last start.
    fn stack(
        name: String,
        parameter: &str,
        kind: SheetKind,
        tables: Vec<Table>,
        spacer_rows: u32,
    ) -> Result<Self> {
        let mut row: u32 = 0;
        let mut placed = Vec::with_capacity(tables.len());
        for table in tables {
            let advance = u32::try_from(table.n_rows())
                .ok()
                .and_then(|n| n.checked_add(spacer_rows))
                .ok_or_else(|| Error::persistence(format!("sheet '{name}' has too many rows")))?;
            placed.push(PlacedTable {
                start_row: row,
                start_col: 0,
                table,
            });
            row = row
                .checked_add(advance)
                .ok_or_else(|| Error::persistence(format!("sheet '{name}' has too many rows")))?;
        }
        Ok(Self {
            name,
            parameter: parameter.to_string(),
            kind,
            tables: placed,
        })
    }
}

/// The full workbook plan: every sheet, in order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportLayout {
    /// Sheets in workbook order.
    pub sheets: Vec<SheetLayout>,
}

impl ReportLayout {
    /// Lay out every parameter's results.
    ///
    /// Parameters are visited in key order; each contributes an ANOVA sheet
    /// holding one table and a post-hoc sheet holding every post-hoc table,
    /// possibly none.
    ///
    /// # Errors
    ///
    /// [`Error::SheetNameCollision`] if two sheets sanitize to the same name
    /// (compared case-insensitively, as Excel does).
    pub fn from_results(results: &StatsResults, spacer_rows: u32) -> Result<Self> {
        let mut claimed: HashMap<String, &str> = HashMap::new();
        let mut sheets = Vec::with_capacity(results.len() * SheetKind::ALL.len());

        for (parameter, result) in results {
            for kind in SheetKind::ALL {
                let name = sheet_name(parameter, kind);
                if let Some(first) = claimed.insert(name.to_lowercase(), parameter) {
                    return Err(Error::SheetNameCollision {
                        sheet: name,
                        first: first.to_string(),
                        second: parameter.clone(),
                    });
                }

                let tables = match kind {
                    SheetKind::Anova => vec![Table::from(&result.anova)],
                    SheetKind::PostHoc => result.posthoc.iter().map(Table::from).collect(),
                };
                sheets.push(SheetLayout::stack(name, parameter, kind, tables, spacer_rows)?);
            }
        }

        Ok(Self { sheets })
    }

    /// Look up a sheet by its sanitized name.
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&SheetLayout> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ParameterResults;
    use crate::stats::{AnovaRow, AnovaTable, PostHocTable, TukeyRow};

    fn anova(parameter: &str) -> AnovaTable {
        let row = |source: &str| AnovaRow {
            source: source.to_string(),
            ss: 1.0,
            df: 1,
            ms: 1.0,
            f: None,
            p_unc: None,
            np2: None,
        };
        AnovaTable {
            parameter: parameter.to_string(),
            effects: vec![row("Group")],
            residual: row("Within"),
            observations: 4,
        }
    }

    fn posthoc(parameter: &str, level: &str, pairs: usize) -> PostHocTable {
        let tukey = TukeyRow {
            a: "a".into(),
            b: "b".into(),
            mean_a: 0.0,
            mean_b: 0.0,
            diff: 0.0,
            se: 1.0,
            t: 0.0,
            p_tukey: 1.0,
            hedges: 0.0,
        };
        PostHocTable {
            parameter: parameter.to_string(),
            held: vec![("Group".into(), level.into())],
            excluded: "Time".into(),
            rows: vec![tukey; pairs],
        }
    }

    fn results(entries: Vec<(&str, Vec<PostHocTable>)>) -> StatsResults {
        entries
            .into_iter()
            .map(|(p, posthoc)| {
                (
                    p.to_string(),
                    ParameterResults {
                        anova: anova(p),
                        posthoc,
                        failures: Vec::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("CI/CII_ANOVA"), "CI_CII_ANOVA");
        assert_eq!(sanitize_sheet_name(r"a\b?c*d[e]f:g"), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_sheet_name("'quoted'"), "_quoted_");
        assert_eq!(sanitize_sheet_name(""), "_");

        let long = "A".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_layout_single_table_sheet() {
        // Scenario: a lone ANOVA table sits at row 0
        let layout = ReportLayout::from_results(&results(vec![("X", vec![])]), 3).unwrap();
        let names: Vec<&str> = layout.sheet_names().collect();
        assert_eq!(names, vec!["X_ANOVA", "X_POSTHOC"]);

        let sheet = layout.sheet("X_ANOVA").unwrap();
        assert_eq!(sheet.tables.len(), 1);
        assert_eq!(sheet.tables[0].start_row, 0);
        assert_eq!(sheet.tables[0].start_col, 0);

        // no post-hoc tables still yields the sheet
        assert!(layout.sheet("X_POSTHOC").unwrap().tables.is_empty());
    }

    #[test]
    fn test_layout_stacks_posthoc_tables() {
        let tables = vec![
            posthoc("X", "BSD", 3),
            posthoc("X", "SD", 1),
            posthoc("X", "WD", 2),
        ];
        let layout = ReportLayout::from_results(&results(vec![("X", tables)]), 3).unwrap();
        let starts: Vec<u32> = layout
            .sheet("X_POSTHOC")
            .unwrap()
            .tables
            .iter()
            .map(|t| t.start_row)
            .collect();
        assert_eq!(starts, vec![0, 6, 10]);
    }

    #[test]
    fn test_layout_custom_spacer() {
        let tables = vec![posthoc("X", "a", 2), posthoc("X", "b", 2)];
        let layout = ReportLayout::from_results(&results(vec![("X", tables)]), 5).unwrap();
        assert_eq!(layout.sheet("X_POSTHOC").unwrap().tables[1].start_row, 7);
    }

    #[test]
    fn test_layout_slash_in_parameter() {
        let layout = ReportLayout::from_results(&results(vec![("CI/CII", vec![])]), 3).unwrap();
        let names: Vec<&str> = layout.sheet_names().collect();
        assert_eq!(names, vec!["CI_CII_ANOVA", "CI_CII_POSTHOC"]);
        assert_eq!(layout.sheets[0].parameter, "CI/CII");
    }

    #[test]
    fn test_layout_collision_is_error() {
        let err =
            ReportLayout::from_results(&results(vec![("a/b", vec![]), ("a_b", vec![])]), 3)
                .unwrap_err();
        assert_eq!(
            err,
            Error::SheetNameCollision {
                sheet: "a_b_ANOVA".into(),
                first: "a/b".into(),
                second: "a_b".into(),
            }
        );
    }

    #[test]
    fn test_layout_truncation_collision() {
        let a = format!("{}1", "P".repeat(31));
        let b = format!("{}2", "P".repeat(31));
        let err = ReportLayout::from_results(&results(vec![(&a, vec![]), (&b, vec![])]), 3)
            .unwrap_err();
        assert!(matches!(err, Error::SheetNameCollision { .. }));
    }

    #[test]
    fn test_layout_long_parameter_keeps_suffix() {
        let parameter = "CI_CII_OXPHOS_normalised_to_CS";
        assert_eq!(parameter.len(), 30);

        let layout = ReportLayout::from_results(&results(vec![(parameter, vec![])]), 3).unwrap();
        let names: Vec<&str> = layout.sheet_names().collect();
        assert_eq!(
            names,
            vec!["CI_CII_OXPHOS_normalised__ANOVA", "CI_CII_OXPHOS_normalise_POSTHOC"]
        );
        assert!(names.iter().all(|n| n.chars().count() <= MAX_SHEET_NAME_LEN));
        assert_eq!(layout.sheets[1].parameter, parameter);
    }

    #[test]
    fn test_sheet_name_sanitizes_parameter() {
        assert_eq!(sheet_name("CI/CII", SheetKind::Anova), "CI_CII_ANOVA");
        assert_eq!(sheet_name("'LEAK", SheetKind::PostHoc), "_LEAK_POSTHOC");
        assert_eq!(sheet_name("", SheetKind::Anova), "__ANOVA");
    }

    #[test]
    fn test_layout_deterministic() {
        let build = || {
            ReportLayout::from_results(
                &results(vec![
                    ("Y", vec![posthoc("Y", "a", 1), posthoc("Y", "b", 3)]),
                    ("X", vec![posthoc("X", "a", 2)]),
                ]),
                3,
            )
            .unwrap()
        };
        assert_eq!(build(), build());
        assert_eq!(build().sheets[0].parameter, "X");
    }
}
