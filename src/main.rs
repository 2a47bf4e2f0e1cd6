//! Tradeflow CLI - Reconcile bilateral trade data and query its views
//!
//! # Main Commands
//!
//! ```bash
//! tradeflow serve trade.csv countries.csv commodities.csv   # Start HTTP server
//! tradeflow run trade.csv countries.csv commodities.csv     # Run the pipeline
//! tradeflow view trade.csv countries.csv commodities.csv yearly
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! tradeflow parse trade.csv --kind trade    # Just parse one table to JSON
//! tradeflow validate reconciled.json        # Validate records against schema
//! ```

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tradeflow::{
    run_pipeline, validate_reconciled_record, write_reconciled, Flow, PipelineOptions,
    PipelineOutput,
};

#[derive(Parser)]
#[command(name = "tradeflow")]
#[command(about = "Reconcile bilateral trade data against reference tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single input table and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Table kind: trade, countries or commodities
        #[arg(short, long, default_value = "trade")]
        kind: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full pipeline: load, reconcile, validate, write the reconciled dataset
    Run {
        /// Trade records CSV
        trade: PathBuf,

        /// Country reference CSV
        countries: PathBuf,

        /// Commodity reference CSV
        commodities: PathBuf,

        /// Output file for the reconciled CSV (default: stdout summary only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum tolerated share of rejected rows (0.0 - 1.0)
        #[arg(long, default_value = "0.1")]
        tolerance: f64,

        /// Skip output schema validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Run the pipeline and print one view as JSON
    View {
        /// Trade records CSV
        trade: PathBuf,

        /// Country reference CSV
        countries: PathBuf,

        /// Commodity reference CSV
        commodities: PathBuf,

        #[command(subcommand)]
        view: ViewCommand,
    },

    /// Validate JSON records against the reconciled-record schema
    Validate {
        /// Input JSON file (array of records)
        input: PathBuf,
    },

    /// Start HTTP server over a completed pipeline run
    Serve {
        /// Trade records CSV
        trade: PathBuf,

        /// Country reference CSV
        countries: PathBuf,

        /// Commodity reference CSV
        commodities: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Maximum tolerated share of rejected rows (0.0 - 1.0)
        #[arg(long, default_value = "0.1")]
        tolerance: f64,

        /// Skip output schema validation
        #[arg(long)]
        no_validate: bool,
    },
}

#[derive(Subcommand)]
enum ViewCommand {
    /// Yearly totals per flow
    Yearly,

    /// Top commodities for one flow
    Commodities {
        /// Flow code (X/E for exports, M/I for imports)
        #[arg(short, long, default_value = "X")]
        flow: String,

        /// Number of rows to keep
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Sector structure with shares
    Sectors {
        /// Number of rows to keep
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Top partners pivot over a year range
    Partners {
        /// First year (inclusive)
        #[arg(long, default_value = "2019")]
        from: i32,

        /// Last year (inclusive)
        #[arg(long, default_value = "2023")]
        to: i32,

        /// Number of rows to keep
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Time series for one partner
    Partner {
        /// Reconciled partner name (exact match)
        name: String,
    },

    /// Structural change between two years
    Structure {
        /// Base year
        #[arg(long, default_value = "2013")]
        base: i32,

        /// Comparison year
        #[arg(long, default_value = "2023")]
        compare: i32,

        /// Number of rows to keep
        #[arg(short, long, default_value = "10")]
        top: usize,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            kind,
            output,
        } => cmd_parse(&input, &kind, output.as_deref()),

        Commands::Run {
            trade,
            countries,
            commodities,
            output,
            tolerance,
            no_validate,
        } => cmd_run(
            &trade,
            &countries,
            &commodities,
            output.as_deref(),
            tolerance,
            no_validate,
        ),

        Commands::View {
            trade,
            countries,
            commodities,
            view,
        } => cmd_view(&trade, &countries, &commodities, view),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Serve {
            trade,
            countries,
            commodities,
            port,
            tolerance,
            no_validate,
        } => cmd_serve(&trade, &countries, &commodities, port, tolerance, no_validate).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(
    input: &Path,
    kind: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing {}: {}", kind, input.display());

    let json = match kind {
        "trade" => table_to_json(tradeflow::load_trade_table(input)?)?,
        "countries" => table_to_json(tradeflow::load_country_table(input)?)?,
        "commodities" => table_to_json(tradeflow::load_commodity_table(input)?)?,
        other => return Err(format!("Unknown table kind: {}", other).into()),
    };

    write_output(&json, output)?;
    Ok(())
}

fn table_to_json<T: serde::Serialize>(
    table: tradeflow::LoadedTable<T>,
) -> Result<String, Box<dyn std::error::Error>> {
    eprintln!("   Encoding: {}", table.encoding);
    eprintln!(
        "   Delimiter: '{}'",
        match table.delimiter {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        }
    );
    eprintln!("   Rows: {}", table.rows.len());
    if !table.skipped.is_empty() {
        eprintln!("   Skipped: {} rows", table.skipped.len());
        for (line, reason) in table.skipped.iter().take(5) {
            eprintln!("     line {}: {}", line, reason);
        }
    }

    Ok(serde_json::to_string_pretty(&table.rows)?)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

fn cmd_run(
    trade: &Path,
    countries: &Path,
    commodities: &Path,
    output: Option<&Path>,
    tolerance: f64,
    no_validate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = PipelineOptions {
        reject_tolerance: tolerance,
        skip_validation: no_validate,
        ..Default::default()
    };

    let result = run_pipeline(trade, countries, commodities, options)?;
    print_summary(&result);

    if let Some(path) = output {
        write_reconciled(&result.dataset, path)?;
        eprintln!("Reconciled dataset written to: {}", path.display());
    }

    Ok(())
}

fn cmd_view(
    trade: &Path,
    countries: &Path,
    commodities: &Path,
    view: ViewCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = run_pipeline(trade, countries, commodities, PipelineOptions::default())?;
    let dataset = &result.dataset;

    let json = match view {
        ViewCommand::Yearly => serde_json::to_string_pretty(&dataset.yearly_trend())?,
        ViewCommand::Commodities { flow, top } => {
            let flow = Flow::from_code(&flow)
                .ok_or_else(|| format!("Unknown flow code: {}", flow))?;
            serde_json::to_string_pretty(&dataset.top_commodities(flow, top))?
        }
        ViewCommand::Sectors { top } => {
            serde_json::to_string_pretty(&dataset.sector_structure(top))?
        }
        ViewCommand::Partners { from, to, top } => {
            serde_json::to_string_pretty(&dataset.top_partners(from, to, top))?
        }
        ViewCommand::Partner { name } => {
            serde_json::to_string_pretty(&dataset.partner_series(&name))?
        }
        ViewCommand::Structure { base, compare, top } => {
            serde_json::to_string_pretty(&dataset.structural_change(base, compare, top))?
        }
    };

    println!("{}", json);
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Validating: {}", input.display());

    let content = fs::read_to_string(input)?;
    let records: Vec<Value> = serde_json::from_str(&content)?;

    let mut valid = 0;
    let mut invalid = 0;

    for (i, record) in records.iter().enumerate() {
        match validate_reconciled_record(record) {
            Ok(()) => valid += 1,
            Err(errors) => {
                invalid += 1;
                if invalid <= 5 {
                    eprintln!("\nRecord {} invalid:", i);
                    for err in errors.iter().take(3) {
                        eprintln!("   - {}", err);
                    }
                }
            }
        }
    }

    eprintln!("\nResults: {} valid, {} invalid", valid, invalid);

    if invalid > 0 {
        std::process::exit(1);
    }

    Ok(())
}

async fn cmd_serve(
    trade: &Path,
    countries: &Path,
    commodities: &Path,
    port: u16,
    tolerance: f64,
    no_validate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = PipelineOptions {
        reject_tolerance: tolerance,
        skip_validation: no_validate,
        ..Default::default()
    };

    let result = run_pipeline(trade, countries, commodities, options)?;
    print_summary(&result);

    tradeflow::server::start_server(port, result).await
}

fn print_summary(output: &PipelineOutput) {
    eprintln!("\nRun {} summary:", output.run_id);
    eprintln!("   Reconciled: {} of {} rows", output.summary.reconciled_rows, output.summary.input_rows);
    eprintln!(
        "   Unresolved: {} partners, {} commodities",
        output.summary.unresolved_partners, output.summary.unresolved_commodities
    );
    if output.summary.rejected_rows > 0 {
        eprintln!(
            "   Rejected: {} rows (flow codes {:?})",
            output.summary.rejected_rows, output.summary.rejected_flow_samples
        );
    }
}
