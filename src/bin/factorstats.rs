//! factorstats CLI

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use factorstats::io::{read_csv, CsvOptions};
use factorstats::pipeline::{AnalysisConfig, StatsBuilder};
use factorstats::report::DEFAULT_SPACER_ROWS;
use factorstats::table::WideTable;

#[derive(Parser)]
#[command(name = "factorstats")]
#[command(about = "Multi-factor ANOVA and drop-one-factor Tukey post-hoc reports")]
#[command(version)]
struct Cli {
    /// Input table (one row per experimental unit)
    input: PathBuf,

    /// Factor columns the post-hoc groupings are generated from
    #[arg(long, value_delimiter = ',', required = true)]
    factors: Vec<String>,

    /// ANOVA factors. Defaults to `--factors`.
    #[arg(long, value_delimiter = ',')]
    betweens: Vec<String>,

    /// Parameter columns to analyse. Defaults to every non-factor column.
    #[arg(long, value_delimiter = ',')]
    keep: Vec<String>,

    /// Columns to drop before the analysis
    #[arg(long, value_delimiter = ',')]
    drop: Vec<String>,

    /// Keep rows where COLUMN equals LEVEL (repeatable)
    #[arg(long = "where", value_name = "COLUMN=LEVEL")]
    where_eq: Vec<String>,

    /// Drop rows where COLUMN equals LEVEL (repeatable)
    #[arg(long = "where-not", value_name = "COLUMN=LEVEL")]
    where_ne: Vec<String>,

    /// Output file stem; `_Stats.xlsx` is appended. Defaults to the input stem.
    #[arg(short, long)]
    output: Option<String>,

    /// Run the analysis without writing the workbook
    #[arg(long)]
    no_save: bool,

    /// Row advance between stacked tables, on top of each table's rows
    #[arg(long, default_value_t = DEFAULT_SPACER_ROWS)]
    spacer_rows: u32,

    /// Field delimiter
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Also write the results as pretty JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    let betweens = if cli.betweens.is_empty() { cli.factors.clone() } else { cli.betweens.clone() };
    let config = AnalysisConfig { betweens, grouping_factors: cli.factors.clone() };

    let wide = load_table(&cli, &config)?;
    let stem = match &cli.output {
        Some(stem) => stem.clone(),
        None => default_stem(&cli.input)?,
    };

    let output = StatsBuilder::new()
        .betweens(config.betweens.clone())
        .grouping_factors(config.grouping_factors.clone())
        .output(stem)
        .spacer_rows(cli.spacer_rows)
        .save(!cli.no_save)
        .run(&wide)
        .context("analysis failed")?;

    let failures: usize = output.results.values().map(|r| r.failures.len()).sum();
    if failures > 0 {
        warn!(failures, "some post-hoc groups could not be tested");
    }
    info!(
        parameters = output.results.len(),
        sheets = output.layout.sheets.len(),
        saved = output.saved(),
        "done"
    );

    if let Some(path) = &cli.json {
        std::fs::write(path, serde_json::to_string_pretty(&output.results)?)
            .with_context(|| format!("cannot write {}", path.display()))?;
    }
    Ok(())
}

fn load_table(cli: &Cli, config: &AnalysisConfig) -> Result<WideTable> {
    let delimiter = u8::try_from(cli.delimiter).context("delimiter must be a single byte")?;
    let mut options = CsvOptions::new(config.factor_columns()).with_delimiter(delimiter);
    if !cli.keep.is_empty() {
        options = options.keep(cli.keep.clone());
    }

    let mut wide = read_csv(&cli.input, &options)
        .with_context(|| format!("cannot load {}", cli.input.display()))?;

    for filter in &cli.where_eq {
        let (column, level) = split_filter(filter)?;
        wide = wide.filter_rows(column, |l| l == Some(level))?;
    }
    for filter in &cli.where_ne {
        let (column, level) = split_filter(filter)?;
        wide = wide.filter_rows(column, |l| l != Some(level))?;
    }
    if !cli.drop.is_empty() {
        wide = wide.drop_columns(&cli.drop)?;
    }
    if wide.n_rows() == 0 {
        bail!("no rows left after filtering");
    }
    Ok(wide)
}

fn split_filter(filter: &str) -> Result<(&str, &str)> {
    filter
        .split_once('=')
        .with_context(|| format!("filter '{filter}' must look like COLUMN=LEVEL"))
}

fn default_stem(input: &Path) -> Result<String> {
    let stem = input.with_extension("");
    match stem.to_str() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => bail!("cannot derive an output name from {}", input.display()),
    }
}
