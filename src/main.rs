use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use tablearray::{Config, Table};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
    /// Text lines split by --delimiter
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "tablearray")]
#[command(about = "Select, group, aggregate and reorder tabular JSON or CSV data", long_about = None)]
struct Args {
    /// Input file (JSON, CSV or text lines)
    input: PathBuf,

    /// Input format (guessed from the file extension if omitted)
    #[arg(long, value_enum)]
    input_format: Option<InputFormat>,

    /// Key path to the rows inside a JSON document (e.g. "result.items")
    #[arg(long)]
    path: Option<String>,

    /// Column delimiter for the lines format
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// First CSV line holds the column names
    #[arg(long)]
    title: bool,

    /// Columns and aliased function terms (e.g. "id, UPPER(name) AS name")
    #[arg(long)]
    select: Option<String>,

    /// Keep rows where a column equals a value (e.g. --filter-equal city=Paris)
    #[arg(long = "filter-equal", value_name = "COLUMN=VALUE")]
    filter_equal: Vec<String>,

    /// Comma-separated group columns
    #[arg(long)]
    group_by: Option<String>,

    /// Aggregate a column (e.g. --aggregate price=sum)
    #[arg(long = "aggregate", value_name = "COLUMN=FUNCTION")]
    aggregates: Vec<String>,

    /// Separator for concat aggregates
    #[arg(long, default_value = ",")]
    concat_delimiter: String,

    /// Sort terms (e.g. "likes DESC, name NATURAL")
    #[arg(long)]
    order_by: Option<String>,

    /// Drop repeated rows, optionally comparing only the given columns
    #[arg(long, num_args = 0..=1, default_missing_value = "", value_name = "COLUMNS")]
    unique: Option<String>,

    /// Skip rows
    #[arg(long)]
    offset: Option<usize>,

    /// Keep rows (negative keeps the last rows)
    #[arg(long, allow_hyphen_values = true)]
    limit: Option<i64>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Configuration file
    #[arg(long, default_value = "./tablearray.toml")]
    config: PathBuf,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tablearray=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if args.title {
        config.csv.title = true;
    }

    let mut table = load(&args, &config)?;
    tracing::info!("Loaded {} row(s) from {}", table.count(), args.input.display());

    if let Some(select) = &args.select {
        table.select(select)?;
    }

    if !args.filter_equal.is_empty() {
        let conditions = args
            .filter_equal
            .iter()
            .map(|c| split_pair(c, "--filter-equal"))
            .collect::<anyhow::Result<Vec<(String, String)>>>()?;
        table.filter_equal(&conditions);
    }

    if args.group_by.is_some() || !args.aggregates.is_empty() {
        let groups = split_list(args.group_by.as_deref().unwrap_or(""));
        let aggregates = args
            .aggregates
            .iter()
            .map(|a| split_pair(a, "--aggregate"))
            .collect::<anyhow::Result<Vec<(String, String)>>>()?;
        table.filter_group_aggregate(aggregates, &groups, &args.concat_delimiter)?;
    }

    if let Some(order) = &args.order_by {
        table.order_by(order)?;
    }

    if let Some(unique) = &args.unique {
        let columns = split_list(unique);
        if columns.is_empty() {
            table.filter_unique::<&str>(None)?;
        } else {
            table.filter_unique(Some(&columns[..]))?;
        }
    }

    if let Some(offset) = args.offset {
        table.offset(offset);
    }

    if let Some(limit) = args.limit {
        table.limit(limit);
    }

    let out = match args.output {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(&table)?;
            text.push('\n');
            text
        }
        OutputFormat::Csv => {
            table.set_csv_options(config.csv.clone());
            table.fetch_all_as_csv()?
        }
    };
    std::io::stdout().lock().write_all(out.as_bytes())?;
    Ok(())
}

fn load(args: &Args, config: &Config) -> anyhow::Result<Table> {
    let format = match args.input_format {
        Some(format) => format,
        None => guess_format(&args.input),
    };

    let table = match format {
        InputFormat::Csv => Table::from_csv_file(&args.input, &config.csv)?,
        InputFormat::Json => {
            let text = std::fs::read_to_string(&args.input)
                .with_context(|| format!("reading {}", args.input.display()))?;
            match &args.path {
                Some(path) => {
                    let data: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
                    Table::with_path(data, path)?
                }
                None => Table::from_json(&text)?,
            }
        }
        InputFormat::Lines => {
            let text = std::fs::read_to_string(&args.input)
                .with_context(|| format!("reading {}", args.input.display()))?;
            Table::from_string(&text, &args.delimiter, None)?
        }
    };
    Ok(table)
}

fn guess_format(path: &Path) -> InputFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("csv") | Some("tsv") => InputFormat::Csv,
        Some("txt") | Some("log") => InputFormat::Lines,
        _ => InputFormat::Json,
    }
}

fn split_pair(text: &str, flag: &str) -> anyhow::Result<(String, String)> {
    match text.split_once('=') {
        Some((left, right)) if !left.trim().is_empty() => {
            Ok((left.trim().to_string(), right.trim().to_string()))
        }
        _ => bail!("{} expects COLUMN=VALUE, got '{}'", flag, text),
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
