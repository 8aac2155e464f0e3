//! CLI entry point for the sales data ETL.

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use sales_etl::config::{
    DEFAULT_CONNECTION_STRING, DEFAULT_ENCODING, DEFAULT_INPUT_PATH, DEFAULT_LOG_FILE,
    DEFAULT_TABLE_NAME,
};
use sales_etl::{
    EtlConfig, EtlPipeline, GridView, LoggingConfig, PipelineStage, RunReport, fetch_table,
    init_logging,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Load a sales CSV export, clean it and store it in SQLite",
    long_about = "Load a sales CSV export, clean it and replace a SQLite table with the result.\n\n\
                  Every option can also be set through a SALES_ETL_* environment variable,\n\
                  including from a .env file in the working directory.\n\n\
                  EXAMPLES:\n  \
                  # Run with the defaults (sales_data_sample.csv -> sqlite:///example.db)\n  \
                  sales-etl\n\n  \
                  # Store elsewhere and browse the result sorted by SALES, descending\n  \
                  sales-etl -i export.csv -d sqlite:///out/sales.db --view --sort SALES --sort SALES\n\n  \
                  # Machine-readable summary\n  \
                  sales-etl --json | jq .cleaning.rows_removed"
)]
struct Args {
    /// Path to the CSV file to load
    #[arg(short, long, env = "SALES_ETL_INPUT", default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Text encoding of the input file (WHATWG label)
    #[arg(short, long, env = "SALES_ETL_ENCODING", default_value = DEFAULT_ENCODING)]
    encoding: String,

    /// Database connection string, e.g. sqlite:///example.db
    #[arg(short, long, env = "SALES_ETL_DATABASE", default_value = DEFAULT_CONNECTION_STRING)]
    database: String,

    /// Destination table, fully replaced on every run
    #[arg(short, long, env = "SALES_ETL_TABLE", default_value = DEFAULT_TABLE_NAME)]
    table: String,

    /// Append-only log file
    #[arg(long, env = "SALES_ETL_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SALES_ETL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Number of cleaned rows to preview
    #[arg(long, env = "SALES_ETL_PREVIEW_ROWS", default_value = "5")]
    preview_rows: usize,

    /// Read the stored table back and show it as a grid
    #[arg(long, env = "SALES_ETL_VIEW")]
    view: bool,

    /// Click a column header in the grid; repeat to toggle or chain sorts
    #[arg(long = "sort", value_name = "COLUMN")]
    sort: Vec<String>,

    /// Maximum rows shown in the grid
    #[arg(long, env = "SALES_ETL_MAX_ROWS")]
    max_rows: Option<usize>,

    /// Print the run summary as JSON instead of human-readable output
    #[arg(long)]
    json: bool,

    /// Suppress the preview and console warnings
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<ExitCode> {
    // Environment first so .env values reach the SALES_ETL_* flags
    dotenv().ok();
    let args = Args::parse();

    let config = EtlConfig::builder()
        .input_path(&args.input)
        .encoding(&args.encoding)
        .connection_string(&args.database)
        .table_name(&args.table)
        .log_file(&args.log_file)
        .log_level(&args.log_level)
        .preview_rows(args.preview_rows)
        .build()?;

    let logging = LoggingConfig::from(&config).console(!args.quiet && !args.json);
    if let Err(e) = init_logging(&logging) {
        eprintln!("Warning: {}", e);
    }

    let pipeline = EtlPipeline::builder().config(config).build()?;
    let report = pipeline.run();
    let preview_rows = pipeline.config().preview_rows;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
        return Ok(exit_code(&report));
    }

    let Some(cleaned) = &report.cleaned else {
        match report.summary.failed_stage {
            Some(PipelineStage::Loading) => {
                println!("No data was loaded. Please check the log for details.")
            }
            _ => println!("Error processing data. Please check the log for details."),
        }
        return Ok(ExitCode::FAILURE);
    };

    if !args.quiet && preview_rows > 0 {
        println!("{}", cleaned.head(Some(preview_rows)));
    }

    if report.summary.saved {
        println!("Data successfully updated in the SQL table.");
    } else {
        println!("Data update failed.");
    }

    if args.view {
        show_grid(&args);
    }

    info!("Run finished in {} ms", report.summary.duration_ms);
    Ok(exit_code(&report))
}

fn show_grid(args: &Args) {
    let snapshot = match fetch_table(&args.database, &args.table) {
        Ok(snapshot) if snapshot.row_count() > 0 => snapshot,
        Ok(_) => {
            println!("No data found in the database.");
            return;
        }
        Err(e) => {
            warn!("Could not read table '{}': {}", args.table, e);
            println!("No data found in the database.");
            return;
        }
    };

    let mut grid = GridView::new(snapshot);
    for column in &args.sort {
        if let Err(e) = grid.click_header(column) {
            warn!("Cannot sort: {}", e);
        }
    }
    println!("{}", grid.render(args.max_rows));
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.summary.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
