//! bidtab CLI: parse bid tabulation files and report on them.
//!
//! Commands:
//! - `parse`: print parsed records as JSON
//! - `list`: filtered, sorted table of records
//! - `summary`: portfolio statistics and top bidders
//! - `show`: per-project bid statistics for one record
//! - `export`: write a JSON snapshot of records and statistics

use anyhow::{bail, Context, Result};
use bidtab_analysis::{
    summarize, summarize_project, FilterCriteria, FilterSortEngine, SortDirection, SortKey,
    SortSpec,
};
use bidtab_core::{BidRecord, Config, RecordSet};
use bidtab_export::{build_snapshot, default_export_filename, write_snapshot};
use bidtab_ingestion::{collect_bid_files, into_record_set, parse_files, BidFileParser};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "bidtab", about = "Bid tabulation parser and analyzer")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse bid files and print the records as JSON.
    Parse {
        /// Bid files or directories of bid files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List records as a table.
    List {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// County contains (case-insensitive).
        #[arg(long)]
        county: Option<String>,

        /// Project type contains (case-insensitive).
        #[arg(long)]
        project_type: Option<String>,

        /// Contract number contains (case-sensitive).
        #[arg(long)]
        contract: Option<String>,

        /// Any bidder name contains (case-insensitive).
        #[arg(long)]
        bidder: Option<String>,

        /// Sort key: date, county, projectType, contractNumber,
        /// engineerEstimate, lowestBid, diffFromEstimate.
        #[arg(long)]
        sort: Option<String>,

        /// Sort ascending.
        #[arg(long, default_value_t = false, conflicts_with = "desc")]
        asc: bool,

        /// Sort descending.
        #[arg(long, default_value_t = false)]
        desc: bool,
    },
    /// Portfolio statistics and the bidder ledger.
    Summary {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Number of bidders to show. Defaults to the configured value.
        #[arg(long)]
        top: Option<usize>,
    },
    /// Bid statistics for one record.
    Show {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Record id or contract number.
        #[arg(long)]
        id: String,
    },
    /// Write a JSON snapshot of the records and their statistics.
    Export {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output file. Defaults to `<prefix>-YYYY-MM-DD.json`.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write compact JSON.
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Parse { paths } => run_parse(&config, &paths),
        Commands::List {
            paths,
            county,
            project_type,
            contract,
            bidder,
            sort,
            asc,
            desc,
        } => {
            let criteria = FilterCriteria {
                county,
                project_type,
                contract_number: contract,
                bidder_name: bidder,
            };
            let spec = sort_spec(&config, sort.as_deref(), asc, desc)?;
            run_list(&config, &paths, criteria, spec)
        }
        Commands::Summary { paths, top } => {
            run_summary(&config, &paths, top.unwrap_or(config.view.top_bidders))
        }
        Commands::Show { paths, id } => run_show(&config, &paths, &id),
        Commands::Export {
            paths,
            out,
            compact,
        } => run_export(&config, &paths, out, compact),
    }
}

fn load_records(config: &Config, paths: &[PathBuf]) -> Result<RecordSet> {
    let parser = BidFileParser::new(&config.parser).context("failed to build bid file parser")?;
    let files = collect_bid_files(paths, &config.parser).context("failed to collect bid files")?;
    if files.is_empty() {
        bail!("no .{} files found", config.parser.file_extension);
    }

    let (records, failures) = into_record_set(parse_files(&parser, &files));
    info!(
        files = files.len(),
        records = records.len(),
        failed = failures.len(),
        "loaded bid files"
    );
    Ok(records)
}

fn sort_spec(config: &Config, sort: Option<&str>, asc: bool, desc: bool) -> Result<SortSpec> {
    let mut spec = SortSpec::from_config(&config.view).context("invalid view.sort_key")?;
    if let Some(key) = sort {
        spec.key = key.parse::<SortKey>()?;
    }
    if asc {
        spec.direction = SortDirection::Asc;
    } else if desc {
        spec.direction = SortDirection::Desc;
    }
    Ok(spec)
}

fn run_parse(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let records = load_records(config, paths)?;
    let json = serde_json::to_string_pretty(records.records())
        .context("failed to serialize records")?;
    println!("{json}");
    Ok(())
}

fn run_list(
    config: &Config,
    paths: &[PathBuf],
    criteria: FilterCriteria,
    spec: SortSpec,
) -> Result<()> {
    let records = load_records(config, paths)?;
    let engine = FilterSortEngine::new(criteria, spec);
    let listed = engine.apply_refs(records.records());

    println!(
        "{:<10} {:<16} {:<24} {:<16} {:>16} {:>16} {:>9}",
        "DATE", "COUNTY", "TYPE", "CONTRACT", "ESTIMATE", "LOW BID", "DIFF"
    );
    for record in &listed {
        println!("{}", table_row(record));
    }
    println!("{} of {} records", listed.len(), records.len());
    Ok(())
}

fn run_summary(config: &Config, paths: &[PathBuf], top: usize) -> Result<()> {
    let records = load_records(config, paths)?;
    let stats = summarize(records.records());

    println!("Projects:               {}", records.len());
    println!("Total bids:             {}", stats.total_bidders);
    println!("Total estimate value:   {}", format_money(stats.total_estimate_value));
    println!("Total low-bid value:    {}", format_money(stats.total_bid_value));
    println!("Avg engineer estimate:  {}", format_money(stats.avg_engineer_estimate));
    println!("Avg lowest bid:         {}", format_money(stats.avg_lowest_bid));
    println!("Avg diff from estimate: {}", format_percent(stats.avg_diff_from_estimate));
    println!("Counties:               {}", stats.counties_covered.join(", "));
    println!("Project types:          {}", stats.project_types.join(", "));
    println!();

    println!(
        "{:<32} {:>6} {:>6} {:>8} {:>18}",
        "BIDDER", "BIDS", "WINS", "WIN %", "AVG BID"
    );
    for entry in stats.top_bidders(top) {
        println!(
            "{:<32} {:>6} {:>6} {:>7.1}% {:>18}",
            truncate(&entry.name, 32),
            entry.bid_count,
            entry.win_count,
            entry.win_rate() * 100.0,
            format_money(entry.avg_bid_amount)
        );
    }
    Ok(())
}

fn run_show(config: &Config, paths: &[PathBuf], id: &str) -> Result<()> {
    let records = load_records(config, paths)?;
    let record = records
        .get(id)
        .or_else(|| records.iter().find(|r| r.contract_number() == id))
        .with_context(|| format!("no record with id or contract number '{id}'"))?;
    let summary = summarize_project(record);

    println!("Contract:   {}", record.contract_number());
    println!("File:       {}", record.filename());
    println!("County:     {}", record.county());
    println!("Type:       {}", record.project_type());
    println!("Date:       {}", record.date());
    println!("Estimate:   {}", format_money(record.engineer_estimate()));
    println!("Low bid:    {}", format_money(record.lowest_bid()));
    println!("Diff:       {}", format_percent(record.diff_from_estimate()));
    println!("Bids:       {}", summary.bid_count);
    println!("Average:    {}", format_money(summary.average_bid));
    println!("Median:     {}", format_money(summary.median_bid));
    println!("Range:      {}", format_money(summary.bid_range));
    println!("Dispersion: {}", format_percent(summary.bid_dispersion));
    println!();

    println!(
        "{:<6} {:<32} {:>18} {:>10} {:>10}",
        "NO.", "BIDDER", "AMOUNT", "VS LOW", "VS EST"
    );
    for bid in &summary.comparisons {
        let marker = if bid.is_lowest { "*" } else { "" };
        println!(
            "{:<6} {:<32} {:>18} {:>10} {:>10}",
            bid.number,
            format!("{}{}", truncate(&bid.name, 31), marker),
            format_money(bid.amount),
            bid.diff_from_lowest.map(format_percent).unwrap_or_default(),
            bid.diff_from_estimate.map(format_percent).unwrap_or_default()
        );
    }
    Ok(())
}

fn run_export(
    config: &Config,
    paths: &[PathBuf],
    out: Option<PathBuf>,
    compact: bool,
) -> Result<()> {
    let records = load_records(config, paths)?;
    let snapshot = build_snapshot(records.records());
    let path = out.unwrap_or_else(|| {
        PathBuf::from(default_export_filename(
            &config.export.filename_prefix,
            snapshot.exported_at.date_naive(),
        ))
    });
    let pretty = config.export.pretty && !compact;

    write_snapshot(&path, &snapshot, pretty)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    println!("Exported {} projects to {}", snapshot.total_projects, path.display());
    Ok(())
}

fn table_row(record: &BidRecord) -> String {
    let diff = if record.has_estimate() {
        format_percent(record.diff_from_estimate())
    } else {
        "-".to_string()
    };
    format!(
        "{:<10} {:<16} {:<24} {:<16} {:>16} {:>16} {:>9}",
        record.date(),
        truncate(record.county(), 16),
        truncate(record.project_type(), 24),
        truncate(record.contract_number(), 16),
        format_money(record.engineer_estimate()),
        format_money(record.lowest_bid()),
        diff
    )
}

/// `$1,234,567.89`, with a leading minus for negatives.
fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

fn format_percent(value: f64) -> String {
    format!("{value:+.2}%")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}
