use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use rptheft_analysis::batch::{
    process_directory, process_file, DatasetOutcome, DatasetReport, ProcessOptions,
};
use rptheft_analysis::pipeline::EnrichOptions;
use rptheft_analysis::relay::RELAY_ALIASES;
use rptheft_analysis::theft::SMOOTHING_POOL_ADDRESS;
use rptheft_data::types::{FlagStyle, OutputOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Env file holding `SOURCE_PATH` / `PROCESSED_PATH`, loaded from the working directory.
const ENV_FILE: &str = "local_paths.env";

#[derive(Parser, Debug)]
#[command(name = "rptheft")]
#[command(about = "Classify Rocket Pool slots for vanilla blocks and MEV theft")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enrich every slot CSV of a source directory.
    Process(ProcessArgs),
    /// Enrich a single slot CSV.
    Classify(ClassifyArgs),
    /// Print the relay alias table and the smoothing pool address.
    Relays,
}

/// Switches shared by `process` and `classify`.
#[derive(Args, Debug)]
struct EnrichmentArgs {
    /// Write flags as `TRUE` / empty instead of `true` / `false`.
    #[arg(long)]
    legacy_flags: bool,

    /// Append `surrounding_max_bid`, the max bid averaged over two slots each side.
    #[arg(long)]
    surrounding_mev: bool,
}

impl EnrichmentArgs {
    fn options(&self, jobs: usize) -> ProcessOptions {
        let flag_style = if self.legacy_flags {
            FlagStyle::Legacy
        } else {
            FlagStyle::Boolean
        };

        ProcessOptions {
            jobs,
            enrich: EnrichOptions {
                surrounding_mev: self.surrounding_mev,
            },
            output: OutputOptions {
                flag_style,
                surrounding_max_bid: self.surrounding_mev,
            },
        }
    }
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Directory holding the raw slot CSV files.
    #[arg(long, env = "SOURCE_PATH")]
    source_path: PathBuf,

    /// Directory receiving the `processed_*.csv` files.
    #[arg(long, env = "PROCESSED_PATH")]
    processed_path: PathBuf,

    /// Datasets processed concurrently.
    #[arg(long, default_value_t = 4)]
    jobs: usize,

    #[command(flatten)]
    enrichment: EnrichmentArgs,

    /// Summary format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    enrichment: EnrichmentArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Must run before parsing so env-backed arguments can see the file.
    let env_file = dotenvy::from_filename(ENV_FILE).ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    match env_file {
        Some(path) => debug!(path = %path.display(), "loaded environment file"),
        None => debug!(file = ENV_FILE, "no environment file loaded"),
    }

    match cli.command {
        Commands::Process(args) => handle_process(args, cli.quiet).await,
        Commands::Classify(args) => handle_classify(args),
        Commands::Relays => handle_relays(),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn handle_process(args: ProcessArgs, quiet: bool) -> Result<()> {
    let format = args.output.to_lowercase();
    if format != "table" && format != "json" {
        return Err(eyre!(
            "unknown output format '{}'; use 'table' or 'json'",
            args.output
        ));
    }
    if args.jobs == 0 {
        return Err(eyre!("--jobs must be at least 1"));
    }

    info!(
        source = %args.source_path.display(),
        destination = %args.processed_path.display(),
        jobs = args.jobs,
        "processing slot datasets"
    );

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} datasets")
            .wrap_err("failed to create progress style")?,
    );

    let options = args.enrichment.options(args.jobs);
    let reports = process_directory(&args.source_path, &args.processed_path, options, &pb)
        .await
        .wrap_err("failed to process source directory")?;

    match format.as_str() {
        "json" => print_reports_json(&reports)?,
        _ => print_reports_table(&reports),
    }

    let failed = reports.iter().filter(|report| report.is_failed()).count();
    if failed > 0 {
        return Err(eyre!("{} of {} datasets failed", failed, reports.len()));
    }

    info!(datasets = reports.len(), "process command completed");
    Ok(())
}

fn handle_classify(args: ClassifyArgs) -> Result<()> {
    if let Some(parent) = args.output.parent() {
        ensure_dir(parent)?;
    }

    let options = args.enrichment.options(1);
    let summary = process_file(&args.input, &args.output, &options)
        .wrap_err_with(|| format!("failed to classify {}", args.input.display()))?;

    print_reports_table(&[DatasetReport {
        source: args.input,
        destination: args.output,
        outcome: DatasetOutcome::Processed(summary),
    }]);
    Ok(())
}

fn handle_relays() -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Alias", "Canonical Relay"]);
    for (alias, canonical) in RELAY_ALIASES {
        table.add_row(vec![alias, canonical]);
    }

    println!("{}\n", table);
    println!("Smoothing pool: {}", SMOOTHING_POOL_ADDRESS);
    Ok(())
}

fn print_reports_table(reports: &[DatasetReport]) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        "Dataset",
        "Rows",
        "Vanilla",
        "SP Theft",
        "Reg Theft",
        "Status",
    ]);

    let mut totals = [0usize; 4];
    for report in reports {
        let name = report
            .source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match &report.outcome {
            DatasetOutcome::Processed(summary) => {
                totals[0] += summary.rows;
                totals[1] += summary.vanilla_blocks;
                totals[2] += summary.sp_thefts;
                totals[3] += summary.reg_thefts;
                table.add_row(vec![
                    name,
                    summary.rows.to_string(),
                    summary.vanilla_blocks.to_string(),
                    summary.sp_thefts.to_string(),
                    summary.reg_thefts.to_string(),
                    "ok".to_string(),
                ]);
            }
            DatasetOutcome::Failed { error } => {
                table.add_row(vec![
                    name,
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    format!("failed: {error}"),
                ]);
            }
        }
    }

    println!("{}\n", table);
    println!("Summary (datasets: {}):", reports.len());
    println!("  Slots:                {}", totals[0]);
    println!("  Vanilla blocks:       {}", totals[1]);
    println!("  Smoothing pool theft: {}", totals[2]);
    println!("  Regular theft:        {}\n", totals[3]);
}

fn print_reports_json(reports: &[DatasetReport]) -> Result<()> {
    let json_str = serde_json::to_string_pretty(reports).wrap_err("failed to serialize JSON")?;
    println!("{}", json_str);
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(path)
        .wrap_err_with(|| format!("failed to create output directory {}", path.display()))?;
    Ok(())
}
