use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagecarve::io::ImageSource;
use pagecarve::{
    CarvedFile, Carver, DispatchPolicy, ScanConfig, ScanReport, SignatureRegistry, Variant,
};

#[derive(Parser, Debug)]
#[command(name = "pagecarve")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Finds page-structured database files in a raw disk image")]
struct Cli {
    /// Disk image or block device to scan
    image: PathBuf,

    /// JSON scan configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Candidate alignment in bytes (1 = every byte)
    #[arg(short, long)]
    alignment: Option<usize>,

    /// first-accepted or first-fitting
    #[arg(long)]
    policy: Option<DispatchPolicy>,

    /// Variants to enable, in dispatch order (bdb, dat)
    #[arg(long = "variant", value_name = "EXT")]
    variants: Vec<Variant>,

    /// Scan on a single thread
    #[arg(long)]
    sequential: bool,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Add a SHA-256 of each carved byte range
    #[arg(long)]
    digest: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", env = "PAGECARVE_LOG_LEVEL")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = load_config(&cli)?;
    let registry = SignatureRegistry::with_variants(&config.variants);

    let source = ImageSource::open(&cli.image)
        .with_context(|| format!("Failed to open {}", cli.image.display()))?;
    info!(path = %source.path().display(), size = source.size(), "scanning image");

    let mut report = Carver::new(&registry, config).scan(source.as_slice());

    if cli.digest {
        for file in &mut report.files {
            file.compute_digest(source.as_slice());
        }
    }

    if cli.json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{out}");
    } else {
        print_report(&report);
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<ScanConfig> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ScanConfig::default(),
    };

    if let Some(alignment) = cli.alignment {
        config = config.with_alignment(alignment);
    }
    if let Some(policy) = cli.policy {
        config = config.with_policy(policy);
    }
    if !cli.variants.is_empty() {
        config = config.with_variants(cli.variants.clone());
    }
    if cli.sequential {
        config = config.sequential();
    }

    config.validate().context("Invalid scan configuration")?;
    Ok(config)
}

fn print_report(report: &ScanReport) {
    println!("{:<16} {:<4} {:>16} {:<12} SHA-256", "OFFSET", "EXT", "LENGTH", "NOTES");
    println!("{}", "-".repeat(61));

    for file in &report.files {
        println!(
            "{:<16} {:<4} {:>16} {:<12} {}",
            format!("{:#x}", file.offset),
            file.extension,
            file.length,
            notes(file),
            file.sha256.as_deref().unwrap_or("-")
        );
    }

    let stats = &report.stats;
    println!();
    println!("Candidates: {}", stats.candidates);
    println!("Unaligned:  {}", stats.unaligned);
    println!("Rejected:   {}", stats.rejected);
    println!("Dropped:    {}", stats.dropped);
    println!("Carved:     {}", stats.carved);
}

fn notes(file: &CarvedFile) -> &'static str {
    match file.header {
        Some(h) if h.is_encrypted() => "encrypted",
        Some(h) if h.is_partitioned() => "partitioned",
        _ => "-",
    }
}
