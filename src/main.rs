use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use visualbind::data::Dataset;
use visualbind::filter::Filter;
use visualbind::registry::registry;
use visualbind::runtime::{resolve_report, resolve_visual, Report, Theme, Visual};

#[derive(Parser, Debug)]
#[command(name = "visualbind")]
#[command(about = "Resolve bound visuals against tabular data into chart specifications", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one visual document and print its chart specification
    Visual {
        /// Visual JSON document
        #[arg(long)]
        visual: PathBuf,
        #[command(flatten)]
        data: DataArgs,
        /// Extra filter expression (e.g. "region = 'North'"), may be repeated
        #[arg(long = "filter")]
        filters: Vec<String>,
        #[arg(long)]
        pretty: bool,
    },
    /// Resolve every visual of a report
    Report {
        /// Report JSON document
        #[arg(long)]
        report: PathBuf,
        #[command(flatten)]
        data: DataArgs,
        /// Only resolve the page with this id
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the field-well schema of a visual type
    Schema {
        visual_type: String,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the inferred columns of a dataset
    Infer {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(clap::Args, Debug)]
struct DataArgs {
    /// Data file; read from stdin when omitted
    #[arg(long)]
    data: Option<PathBuf>,
    /// Data format; defaults to the file extension, else CSV
    #[arg(long, value_enum)]
    format: Option<DataFormat>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DataFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Visual {
            visual,
            data,
            filters,
            pretty,
        } => {
            let mut visual: Visual = read_document(&visual)?;
            for expr in &filters {
                let filter: Filter = expr
                    .parse()
                    .with_context(|| format!("Invalid filter expression '{}'", expr))?;
                visual.filters.push(filter);
            }
            let dataset = load_dataset(&data)?;
            let output = resolve_visual(&visual, &dataset, &[], &Theme::default());
            print_json(&output, pretty)
        }
        Command::Report {
            report,
            data,
            page,
            pretty,
        } => {
            let report: Report = read_document(&report)?;
            if let Some(id) = page.as_deref() {
                report.page(id).ok_or_else(|| anyhow!("Report has no page '{}'", id))?;
            }
            let dataset = load_dataset(&data)?;
            let pages = resolve_report(&report, &dataset, page.as_deref());
            print_json(&pages, pretty)
        }
        Command::Schema { visual_type, pretty } => {
            let entry = registry().lookup(&visual_type);
            print_json(&entry.schema, pretty)
        }
        Command::Infer { data, pretty } => {
            let dataset = load_dataset(&data)?;
            print_json(&dataset.columns, pretty)
        }
    }
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn load_dataset(args: &DataArgs) -> Result<Dataset> {
    let (name, text) = match &args.data {
        Some(path) => {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "data".to_string());
            let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            (name, text)
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read data from stdin")?;
            ("stdin".to_string(), text)
        }
    };

    let format = args.format.unwrap_or_else(|| match &args.data {
        Some(path) if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) => DataFormat::Json,
        _ => DataFormat::Csv,
    });

    let dataset = match format {
        DataFormat::Csv => Dataset::from_csv_str(name, &text)?,
        DataFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(&text).context("Failed to parse JSON data")?;
            Dataset::from_json(name, &value)?
        }
    };
    log::debug!("Loaded {} rows, {} columns", dataset.rows.len(), dataset.columns.len());
    Ok(dataset)
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
