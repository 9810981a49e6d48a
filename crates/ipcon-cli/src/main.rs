use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ipcon_cidr::SubnetDetails;
use ipcon_core::config::Config;
use ipcon_engine::{complement_blocks, consolidate_report, parse_block};
use ipcon_server::{IpconServer, StdioTransport};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

mod batch;
mod input;

use batch::{BatchProcessor, BatchResult};
use input::{collect_lines, read_source};

/// Consolidate IPv4 addresses into minimal CIDR blocks
#[derive(Parser)]
#[command(name = "ipcon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine addresses and CIDR blocks into the fewest CIDR blocks
    Consolidate(ConsolidateArgs),
    /// List the CIDR blocks not covered by the given blocks
    Complement(ComplementArgs),
    /// Show details for a single CIDR block
    Subnet(SubnetArgs),
    /// Consolidate several files in parallel
    Batch(BatchArgs),
    /// Serve JSON-RPC requests on stdin/stdout
    Serve,
}

#[derive(Parser)]
struct ConsolidateArgs {
    /// Input file, one address or CIDR per line (use '-' for stdin)
    #[arg(short, long, value_name = "FILE")]
    file: Option<String>,

    /// Also save the ranges to a file (default name from IPCON_DOWNLOAD_FILENAME)
    #[arg(short, long, value_name = "PATH", num_args = 0..=1)]
    download: Option<Option<PathBuf>>,
}

#[derive(Parser)]
struct ComplementArgs {
    /// CIDR blocks to complement
    #[arg(value_name = "CIDR")]
    cidrs: Vec<String>,

    /// Read CIDR blocks from a file as well (use '-' for stdin)
    #[arg(short, long, value_name = "FILE")]
    file: Option<String>,
}

#[derive(Parser)]
struct SubnetArgs {
    /// CIDR block or single address
    #[arg(value_name = "CIDR")]
    cidr: String,
}

#[derive(Parser)]
struct BatchArgs {
    /// Input files
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output (pretty-printed)
    Json,
    /// JSON output (compact)
    JsonCompact,
    /// CSV output
    Csv,
}

#[derive(Serialize)]
struct ConsolidateResult {
    original_count: usize,
    rejected_count: usize,
    ranges_count: usize,
    ranges: Vec<String>,
}

#[derive(Serialize)]
struct ComplementResult {
    subnets: Vec<SubnetDetails>,
    complementary: Vec<String>,
}

#[derive(Serialize)]
struct BatchEntry {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranges: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Consolidate(args) => handle_consolidate(args, cli.output, &config)?,
        Commands::Complement(args) => handle_complement(args, cli.output, &config)?,
        Commands::Subnet(args) => handle_subnet(args, cli.output)?,
        Commands::Batch(args) => handle_batch(args, cli.output, &config)?,
        Commands::Serve => handle_serve(config)?,
    }

    Ok(())
}

/// Install the stderr subscriber; `IPCON_LOG` wins over `--verbose`
fn init_logging(verbose: bool, config: &Config) {
    let level = config
        .log_level
        .as_deref()
        .and_then(|l| l.parse::<Level>().ok())
        .unwrap_or(if verbose { Level::DEBUG } else { Level::WARN });

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_consolidate(args: ConsolidateArgs, format: OutputFormat, config: &Config) -> Result<()> {
    let content = read_source(args.file.as_deref())?;
    let lines = collect_lines(&content, config.max_input_lines)?;
    if lines.is_empty() {
        bail!("No valid IP addresses found in input");
    }

    let report = consolidate_report(&lines);
    let result = ConsolidateResult {
        original_count: report.original_count,
        rejected_count: report.rejected,
        ranges_count: report.ranges.len(),
        ranges: report.range_strings(),
    };

    if let Some(target) = args.download {
        let path = target.unwrap_or_else(|| PathBuf::from(&config.download_filename));
        save_ranges(&path, &result.ranges)?;
        eprintln!(
            "{} Saved {} ranges to {}",
            "›".blue(),
            result.ranges_count,
            path.display()
        );
    }

    match format {
        OutputFormat::Human => print_consolidate_human(&result),
        OutputFormat::Json => print_json(&result, true)?,
        OutputFormat::JsonCompact => print_json(&result, false)?,
        OutputFormat::Csv => write_ranges_csv(std::io::stdout(), &result.ranges)?,
    }
    Ok(())
}

fn handle_complement(args: ComplementArgs, format: OutputFormat, config: &Config) -> Result<()> {
    let file_content = match args.file.as_deref() {
        Some(file) => Some(read_source(Some(file))?),
        None => None,
    };
    let lines = complement_input(
        &args.cidrs,
        file_content.as_deref(),
        config.max_input_lines,
    )?;
    if lines.is_empty() {
        bail!("At least one CIDR notation required");
    }

    let subnets = lines
        .iter()
        .map(|line| {
            parse_block(line)
                .map(|block| SubnetDetails {
                    cidr: line.clone(),
                    ..block.details()
                })
                .with_context(|| format!("Invalid CIDR notation: {}", line))
        })
        .collect::<Result<Vec<_>>>()?;

    let result = ComplementResult {
        subnets,
        complementary: complement_blocks(&lines)
            .iter()
            .map(|b| b.to_string())
            .collect(),
    };

    match format {
        OutputFormat::Human => print_complement_human(&result),
        OutputFormat::Json => print_json(&result, true)?,
        OutputFormat::JsonCompact => print_json(&result, false)?,
        OutputFormat::Csv => write_ranges_csv(std::io::stdout(), &result.complementary)?,
    }
    Ok(())
}

/// Positional CIDRs followed by file lines, limited as one input
fn complement_input(
    cidrs: &[String],
    file_content: Option<&str>,
    limit: usize,
) -> Result<Vec<String>> {
    let mut content = cidrs.join("\n");
    if let Some(extra) = file_content {
        content.push('\n');
        content.push_str(extra);
    }
    collect_lines(&content, limit)
}

fn handle_subnet(args: SubnetArgs, format: OutputFormat) -> Result<()> {
    let block = parse_block(&args.cidr)
        .with_context(|| format!("Invalid CIDR notation: {}", args.cidr))?;
    let details = block.details();

    match format {
        OutputFormat::Human => {
            println!();
            println!("{}", "Subnet Details".bold().cyan());
            println!("{}", "─".repeat(50).dimmed());
            println!("{:>15}: {}", "CIDR".bold(), details.cidr.green());
            println!("{:>15}: {}", "Network".bold(), details.network);
            println!("{:>15}: {}", "Netmask".bold(), details.netmask);
            println!("{:>15}: {}", "Binary mask".bold(), block.binary_netmask());
            println!("{:>15}: {}", "Broadcast".bold(), details.broadcast);
            println!("{:>15}: {}", "First usable".bold(), details.first_ip);
            println!("{:>15}: {}", "Last usable".bold(), details.last_ip);
            println!("{:>15}: {}", "Usable hosts".bold(), details.total_hosts);
            println!("{:>15}: {}", "Class".bold(), details.class);
            println!();
        }
        OutputFormat::Json => print_json(&details, true)?,
        OutputFormat::JsonCompact => print_json(&details, false)?,
        OutputFormat::Csv => write_details_csv(std::io::stdout(), &[details])?,
    }
    Ok(())
}

fn handle_batch(args: BatchArgs, format: OutputFormat, config: &Config) -> Result<()> {
    let processor = BatchProcessor::new(args.workers, config.max_input_lines)?;
    tracing::debug!(
        workers = processor.thread_count(),
        files = args.files.len(),
        "starting batch"
    );

    let results = processor.process_files(args.files);

    match format {
        OutputFormat::Human => print_batch_human(&results),
        OutputFormat::Json => print_json(&batch_entries(&results), true)?,
        OutputFormat::JsonCompact => print_json(&batch_entries(&results), false)?,
        OutputFormat::Csv => write_batch_csv(std::io::stdout(), &results)?,
    }

    let failed = results.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        bail!("{} of {} files failed", failed, results.len());
    }
    Ok(())
}

fn handle_serve(config: Config) -> Result<()> {
    let server = Arc::new(IpconServer::new(config));
    StdioTransport::new(server).run_blocking()?;
    Ok(())
}

/// Write ranges one per line, the downloadable form of a result
fn save_ranges(path: &std::path::Path, ranges: &[String]) -> Result<()> {
    std::fs::write(path, ranges.join("\n"))
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn batch_entries(results: &[BatchResult]) -> Vec<BatchEntry> {
    results
        .iter()
        .map(|r| match &r.result {
            Ok(report) => BatchEntry {
                file: r.input.clone(),
                ranges: Some(report.range_strings()),
                error: None,
            },
            Err(e) => BatchEntry {
                file: r.input.clone(),
                ranges: None,
                error: Some(e.clone()),
            },
        })
        .collect()
}

fn print_consolidate_human(result: &ConsolidateResult) {
    println!();
    println!("{}", "Consolidated Ranges".bold().cyan());
    println!("{}", "─".repeat(50).dimmed());
    println!("{:>15}: {}", "Input lines".bold(), result.original_count);
    if result.rejected_count > 0 {
        println!(
            "{:>15}: {}",
            "Skipped".bold(),
            result.rejected_count.to_string().yellow()
        );
    }
    println!("{:>15}: {}", "Ranges".bold(), result.ranges_count);
    println!();
    for range in &result.ranges {
        println!("  {}", range.green());
    }
    println!();
}

fn print_complement_human(result: &ComplementResult) {
    println!();
    println!("{}", "Subnets".bold().cyan());
    println!("{}", "─".repeat(50).dimmed());
    for subnet in &result.subnets {
        println!(
            "  {:<20} {} - {} ({} hosts)",
            subnet.cidr.green(),
            subnet.first_ip,
            subnet.last_ip,
            subnet.total_hosts
        );
    }
    println!();
    println!("{}", "Complementary Ranges".bold().cyan());
    println!("{}", "─".repeat(50).dimmed());
    if result.complementary.is_empty() {
        println!("  {}", "(none, the whole address space is covered)".dimmed());
    }
    for range in &result.complementary {
        println!("  {}", range);
    }
    println!();
}

fn print_batch_human(results: &[BatchResult]) {
    for r in results {
        println!();
        println!("{}", r.input.bold().cyan());
        println!("{}", "─".repeat(50).dimmed());
        match &r.result {
            Ok(report) => {
                for range in report.range_strings() {
                    println!("  {}", range.green());
                }
            }
            Err(e) => println!("  {}", e.red()),
        }
    }
    println!();
}

fn print_json<T: Serialize>(result: &T, pretty: bool) -> Result<()> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", serde_json::to_string(result)?);
    }
    Ok(())
}

fn write_ranges_csv<W: Write>(out: W, ranges: &[String]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["cidr"])?;
    for range in ranges {
        wtr.write_record([range])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_details_csv<W: Write>(out: W, subnets: &[SubnetDetails]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "cidr",
        "network",
        "netmask",
        "broadcast",
        "first_ip",
        "last_ip",
        "total_hosts",
        "class",
    ])?;
    for s in subnets {
        let total_hosts = s.total_hosts.to_string();
        let class = s.class.to_string();
        wtr.write_record([
            s.cidr.as_str(),
            s.network.as_str(),
            s.netmask.as_str(),
            s.broadcast.as_str(),
            s.first_ip.as_str(),
            s.last_ip.as_str(),
            total_hosts.as_str(),
            class.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_batch_csv<W: Write>(out: W, results: &[BatchResult]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["file", "cidr", "error"])?;
    for r in results {
        match &r.result {
            Ok(report) => {
                for range in report.range_strings() {
                    wtr.write_record([r.input.as_str(), range.as_str(), ""])?;
                }
            }
            Err(e) => wtr.write_record([r.input.as_str(), "", e.as_str()])?,
        }
    }
    wtr.flush()?;
    Ok(())
}
