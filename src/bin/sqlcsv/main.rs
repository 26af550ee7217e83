//! Binary entry point for the `sqlcsv` exporter.
#![forbid(unsafe_code)]

mod config;
mod ui;

use std::error::Error;
use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};
use sqlcsv::cli::{
    load_query, parse_delimiter, run_query_export, OutputTarget, QueryExportConfig,
};
use sqlcsv::export::{
    ExportConfig, ExportSummary, LineEnding, QuoteMode, DEFAULT_BUFFER_CAPACITY,
};
use tracing_subscriber::{fmt, EnvFilter};

use config::{CliConfig, ConfigError};
use ui::{format_duration, ColorChoice, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "sqlcsv",
    version,
    about = "Stream the result of a SQL query into a CSV file"
)]
#[command(group(ArgGroup::new("source").required(true).args(["query", "input"])))]
struct Cli {
    #[arg(
        value_name = "DB",
        help = "SQLite database file (defaults to the profile or config database)"
    )]
    db_path: Option<PathBuf>,

    #[arg(short, long, help = "SQL query to run")]
    query: Option<String>,

    #[arg(short, long, value_name = "FILE", help = "File containing the SQL query")]
    input: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "CSV output file, truncated if it exists ('-' for stdout)"
    )]
    output: String,

    #[arg(long, value_name = "CHAR", help = "Field delimiter [default: ,] ('\\t' for tab)")]
    delimiter: Option<String>,

    #[arg(long, overrides_with = "crlf", help = "End records with LF")]
    lf: bool,

    #[arg(long, overrides_with = "lf", help = "End records with CRLF [default]")]
    crlf: bool,

    #[arg(
        long,
        overrides_with = "no_headers",
        help = "Write the column names as the first record"
    )]
    headers: bool,

    #[arg(long, overrides_with = "headers", help = "Omit the header record [default]")]
    no_headers: bool,

    #[arg(long, value_enum, help = "Field quoting policy [default: always]")]
    quote: Option<QuoteArg>,

    #[arg(long, value_name = "BYTES", help = "Output buffer size [default: 10 MiB]")]
    buffer_size: Option<usize>,

    #[arg(short, long, help = "Echo arguments and columns, enable debug logs")]
    verbose: bool,

    #[arg(long, help = "Suppress everything but warnings and errors")]
    quiet: bool,

    #[arg(long, value_enum, default_value_t = ColorArg::Auto, help = "When to use colors")]
    color: ColorArg,

    #[arg(long, env = "SQLCSV_CONFIG", value_name = "FILE", help = "Config file path")]
    config: Option<PathBuf>,

    #[arg(long, env = "SQLCSV_PROFILE", help = "Config profile to apply")]
    profile: Option<String>,

    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for the export summary"
    )]
    format: OutputFormat,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum QuoteArg {
    Always,
    NonNumeric,
}

impl From<QuoteArg> for QuoteMode {
    fn from(arg: QuoteArg) -> Self {
        match arg {
            QuoteArg::Always => QuoteMode::Always,
            QuoteArg::NonNumeric => QuoteMode::NonNumeric,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => ColorChoice::Auto,
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
        }
    }
}

/// Reads a `--flag`/`--no-flag` pair; `None` when neither was given.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_config = CliConfig::load(cli.config.clone())?;
    let cfg = build_export_config(&cli, &file_config)?;
    let to_stdout = cfg.output.is_stdout();
    let ui = Ui::new(cli.color.into(), cli.quiet || to_stdout);

    if cli.verbose {
        let config_path = file_config
            .path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "-".into());
        let profile = file_config
            .active_profile(cli.profile.as_deref())?
            .map(|profile| profile.name.clone())
            .unwrap_or_else(|| "-".into());
        ui.section(
            "Export",
            [
                ("database", cfg.db_path.display().to_string()),
                ("query", cfg.query.trim().to_string()),
                ("output", cfg.output.to_string()),
                ("delimiter", format!("{:?}", char::from(cfg.export.delimiter))),
                ("line ending", format!("{:?}", cfg.export.line_ending.as_str())),
                ("headers", cfg.export.headers.to_string()),
                ("quote", format!("{:?}", cfg.export.quote_mode)),
                ("config", config_path),
                ("profile", profile),
            ],
        );
    }

    let mut task = ui.task(format!("Exporting to {}", cfg.output));
    let summary = run_query_export(&cfg, &mut task)?;
    task.finish();

    if let Some(err) = &summary.flush_error {
        ui.warn(&format!("output may be incomplete: {err}"));
    }
    if to_stdout {
        return Ok(());
    }
    emit(&cli.format, &summary, |_| {
        if cli.verbose {
            print_columns(&ui, &summary);
        }
        ui.success(&format!(
            "Exported {} rows ({} columns, {} bytes) to {} in {}",
            summary.rows,
            summary.columns.len(),
            summary.bytes_written,
            cfg.output,
            format_duration(summary.elapsed())
        ));
    })
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "sqlcsv=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_export_config(cli: &Cli, file: &CliConfig) -> Result<QueryExportConfig, Box<dyn Error>> {
    let profile = file.active_profile(cli.profile.as_deref())?;
    let defaults = file.export_defaults();

    let db_path = cli
        .db_path
        .clone()
        .or_else(|| profile.and_then(|p| p.database.clone()))
        .or_else(|| file.default_db_path().cloned())
        .ok_or("a database path is required (pass DB or configure a default)")?;
    let query = load_query(cli.query.as_deref(), cli.input.as_deref())?;

    let delimiter = match cli
        .delimiter
        .as_deref()
        .or_else(|| profile.and_then(|p| p.delimiter.as_deref()))
        .or(defaults.delimiter.as_deref())
    {
        Some(value) => parse_delimiter(value)?,
        None => b',',
    };
    let lf = flag_pair(cli.lf, cli.crlf)
        .or_else(|| profile.and_then(|p| p.lf))
        .or(defaults.lf)
        .unwrap_or(false);
    let headers = flag_pair(cli.headers, cli.no_headers)
        .or_else(|| profile.and_then(|p| p.headers))
        .or(defaults.headers)
        .unwrap_or(false);
    let quote = cli
        .quote
        .or_else(|| profile.and_then(|p| p.quote))
        .or(defaults.quote)
        .unwrap_or(QuoteArg::Always);
    let buffer_size = cli
        .buffer_size
        .or(defaults.buffer_size)
        .unwrap_or(DEFAULT_BUFFER_CAPACITY);
    if buffer_size == 0 {
        return Err(Box::new(ConfigError::InvalidBufferSize));
    }

    let export = ExportConfig::default()
        .delimiter(delimiter)
        .line_ending(if lf { LineEnding::Lf } else { LineEnding::Crlf })
        .headers(headers)
        .quote_mode(quote.into())
        .buffer_capacity(buffer_size);

    Ok(QueryExportConfig {
        db_path,
        query,
        output: OutputTarget::from_arg(&cli.output),
        export,
    })
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_columns(ui: &Ui, summary: &ExportSummary) {
    let rows: Vec<(String, String)> = summary
        .columns
        .iter()
        .map(|column| {
            (
                column.name.clone(),
                format!("{} ({})", column.type_name, column.kind.as_str()),
            )
        })
        .collect();
    ui.section(
        "Columns",
        rows.iter().map(|(name, ty)| (name.as_str(), ty.as_str())),
    );
}
