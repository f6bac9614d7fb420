// Command-line entry point.
//
// - `report` loads a CSV/spreadsheet, runs the engine, prints previews and
//   exports the three tables.
// - `classify` and `columns` expose the classifier and column resolver on
//   their own, for checking rule and alias edits.
// - `feedback` and `events` append to / read the diagnostic log.
// - `config` prints the built-in configuration as TOML.
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sales_report::diagnostics::{read_events, Tee};
use sales_report::logging::{init_logging, LogConfig, LogFormat};
use sales_report::output::{self, ExportFormat};
use sales_report::util::{format_int, format_number};
use sales_report::{
    loader, Category, ColumnOverrides, Config, Dataset, DiagnosticEvent, DiagnosticSink, Engine,
    EventKind, EventLog, JsonLinesSink, Role,
};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

#[derive(Parser, Debug)]
#[command(name = "sales_report", version, about = "Categorized product sales reports")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[arg(long, value_enum, default_value_t = LogFormatArg::Pretty, global = true)]
    log_format: LogFormatArg,

    /// TOML file with column aliases and classification rules
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the summary, price drilldown and top-products reports
    Report {
        /// Sales file (.csv, .xlsx, .xls, .ods)
        input: PathBuf,

        /// Worksheet to read (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Directory for exported files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = ExportFormatArg::Xlsx)]
        format: ExportFormatArg,

        /// Skip writing export files
        #[arg(long)]
        no_export: bool,

        /// Keep only the N best-selling products
        #[arg(long)]
        top: Option<usize>,

        /// Rows shown per preview table
        #[arg(long, default_value_t = 10)]
        preview: usize,

        /// Append diagnostic events to this JSON Lines file
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Classify product names with the active rule table
    Classify {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show which columns a file's headers resolve to
    Columns {
        input: PathBuf,

        #[arg(long)]
        sheet: Option<String>,
    },

    /// Record a misclassification reported by an operator
    Feedback {
        #[arg(long)]
        product: String,

        /// The category the product should have received
        #[arg(long)]
        expected: String,

        #[arg(long)]
        note: Option<String>,

        #[arg(long)]
        log: PathBuf,
    },

    /// Show events from a diagnostic log
    Events {
        #[arg(long)]
        log: PathBuf,

        /// Only this kind (data_quality, uncategorized_batch, unexpected_failure, misclassification)
        #[arg(long)]
        kind: Option<String>,

        /// Show only the most recent N events
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the built-in configuration as TOML
    Config,
}

#[derive(clap::Args, Debug, Default)]
struct ColumnArgs {
    /// Column holding the product name
    #[arg(long)]
    name_col: Option<String>,

    /// Column holding the unit price
    #[arg(long)]
    cost_col: Option<String>,

    /// Column holding the quantity sold
    #[arg(long)]
    qty_col: Option<String>,

    /// Column holding the sale date
    #[arg(long)]
    date_col: Option<String>,
}

impl From<ColumnArgs> for ColumnOverrides {
    fn from(a: ColumnArgs) -> Self {
        ColumnOverrides {
            name: a.name_col,
            cost: a.cost_col,
            quantity: a.qty_col,
            date: a.date_col,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportFormatArg {
    Xlsx,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    init_logging(
        &LogConfig::from_verbosity(cli.verbose)
            .quiet(cli.quiet)
            .with_format(format),
    );

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Report {
            input,
            sheet,
            columns,
            out_dir,
            format,
            no_export,
            top,
            preview,
            log,
        } => {
            let mut config = config;
            if top.is_some() {
                config.top_products_limit = top;
            }
            let format = match format {
                ExportFormatArg::Xlsx => ExportFormat::Xlsx,
                ExportFormatArg::Csv => ExportFormat::Csv,
            };
            let export_to = (!no_export).then_some((out_dir.as_path(), format));
            handle_report(
                Engine::new(config),
                &input,
                sheet.as_deref(),
                columns.into(),
                export_to,
                preview,
                log.as_deref(),
            )
        }
        Command::Classify { names } => handle_classify(&Engine::new(config), &names),
        Command::Columns { input, sheet } => {
            handle_columns(&Engine::new(config), &input, sheet.as_deref())
        }
        Command::Feedback {
            product,
            expected,
            note,
            log,
        } => handle_feedback(&Engine::new(config), product, expected, note, &log),
        Command::Events { log, kind, limit } => handle_events(&log, kind.as_deref(), limit),
        Command::Config => {
            print!("{}", Config::default().to_toml()?);
            Ok(())
        }
    }
}

fn load_dataset(input: &Path, sheet: Option<&str>) -> Result<Dataset> {
    if !input.exists() {
        bail!("input not found: {}", input.display());
    }
    let (dataset, report) =
        loader::load(input, sheet).with_context(|| format!("loading {}", input.display()))?;
    println!(
        "Processing dataset... ({} rows loaded, {} blank rows skipped)\n",
        format_int(dataset.rows.len() as u64),
        format_int(report.blank_rows as u64)
    );
    Ok(dataset)
}

/// Load, run and export. On a column-resolution failure the available
/// column names are listed so the user can pick them with `--*-col`.
fn handle_report(
    engine: Engine,
    input: &Path,
    sheet: Option<&str>,
    overrides: ColumnOverrides,
    export_to: Option<(&Path, ExportFormat)>,
    preview: usize,
    log: Option<&Path>,
) -> Result<()> {
    let dataset = load_dataset(input, sheet)?;

    let mut events = EventLog::new();
    let result = match log {
        Some(path) => {
            let mut file_sink = JsonLinesSink::open(path)?;
            let mut tee = Tee::new(&mut events, &mut file_sink);
            engine.run(&dataset, &overrides, &mut tee)
        }
        None => engine.run(&dataset, &overrides, &mut events),
    };

    let tables = match result {
        Ok(t) => t,
        Err(e) if e.is_configuration() => {
            bail!(
                "{}\navailable columns: {}",
                e,
                dataset.columns.join(", ")
            );
        }
        Err(e) => return Err(e.into()),
    };

    let stats = &tables.stats;
    println!("Total Quantity Sold: {}", format_number(stats.total_quantity, 0));
    println!("Total Revenue: TK {}", format_number(stats.total_revenue, 2));
    if stats.data_quality.total() > 0 {
        println!(
            "Note: {} data quality issue(s) recovered (see --log for details).",
            format_int(stats.data_quality.total() as u64)
        );
    }
    if stats.uncategorized_rows > 0 {
        println!(
            "Info: {} row(s) fell into Others.",
            format_int(stats.uncategorized_rows as u64)
        );
    }
    println!();

    output::preview_table("Report 1: Summary by Category", None, &tables.summary, preview);
    output::preview_table(
        "Report 2: Detailed Price-wise Report",
        Some("Grouped by Category and Price"),
        &tables.drilldown,
        preview,
    );
    output::preview_table(
        "Report 3: Top Products",
        Some("Ranked by Total Amount"),
        &tables.top_products,
        preview,
    );

    if let Some((dir, format)) = export_to {
        let files = output::export(&tables, dir, format)?;
        for f in files {
            println!("Report exported to {}", f.display());
        }
    }
    Ok(())
}

#[derive(Tabled)]
struct ClassifiedName {
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Category")]
    category: Category,
}

fn handle_classify(engine: &Engine, names: &[String]) -> Result<()> {
    let rows: Vec<ClassifiedName> = names
        .iter()
        .map(|n| ClassifiedName {
            product: n.clone(),
            category: engine.classifier().classify(n),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::markdown()));
    Ok(())
}

#[derive(Tabled)]
struct ResolvedColumn {
    #[tabled(rename = "Role")]
    role: Role,
    #[tabled(rename = "Column")]
    column: String,
}

fn handle_columns(engine: &Engine, input: &Path, sheet: Option<&str>) -> Result<()> {
    let dataset = load_dataset(input, sheet)?;
    let map = sales_report::resolve(&dataset.columns, &engine.config().columns);
    let rows: Vec<ResolvedColumn> = Role::ALL
        .into_iter()
        .map(|role| ResolvedColumn {
            role,
            column: map
                .get(role)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "(unresolved)".to_string()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::markdown()));
    let missing = map.missing_required();
    if !missing.is_empty() {
        println!(
            "\nRequired role(s) unresolved: {}. Available columns: {}",
            missing.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", "),
            dataset.columns.join(", ")
        );
    }
    Ok(())
}

fn handle_feedback(
    engine: &Engine,
    product: String,
    expected: String,
    note: Option<String>,
    log: &Path,
) -> Result<()> {
    let Some(expected_label) = Category::from_label(&expected) else {
        bail!(
            "unknown category '{}'; expected one of: {}",
            expected,
            Category::ALL.map(|c| c.as_str()).join(", ")
        );
    };
    let assigned = engine.classifier().classify(&product);
    if assigned == expected_label {
        println!("'{}' is already classified as {}; nothing recorded.", product, assigned);
        return Ok(());
    }
    let mut sink = JsonLinesSink::open(log)?;
    sink.record(DiagnosticEvent::now(EventKind::Misclassification {
        product: product.clone(),
        assigned,
        expected: expected_label,
        note,
    }));
    println!(
        "Recorded: '{}' classified as {}, expected {} ({})",
        product,
        assigned,
        expected_label,
        log.display()
    );
    Ok(())
}

#[derive(Tabled)]
struct EventLine {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Details")]
    details: String,
}

fn handle_events(log: &Path, kind: Option<&str>, limit: Option<usize>) -> Result<()> {
    let mut events = read_events(log)?;
    if let Some(k) = kind {
        events.retain(|e| e.kind.name() == k);
    }
    if let Some(n) = limit {
        let skip = events.len().saturating_sub(n);
        events.drain(..skip);
    }
    if events.is_empty() {
        println!("(no events)");
        return Ok(());
    }
    let rows: Vec<EventLine> = events
        .iter()
        .map(|e| EventLine {
            time: e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: e.kind.name(),
            details: e.kind.describe(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::markdown()));
    Ok(())
}
