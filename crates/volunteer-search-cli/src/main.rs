//! volunteer-search CLI: search volunteer records or inspect a day window.
//!
//! Results are written to stdout as JSON. Logs go to stderr; set
//! `RUST_LOG=volunteer_search=debug` (or pass `--verbose`) to see pipeline stages.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use volunteer_search::temporal::utc_offset_on;
use volunteer_search::{
    Catalog, ClockTime, DayIndex, Endpoint, Localizer, MemoryStore, PlaceTable, RawSearchParams,
    SearchConfig, SearchContext, SearchError, SearchOrchestrator, TimeWindowResolver, Volunteer,
};

/// Exit status for rejected search parameters.
const EXIT_REJECTED: u8 = 2;

#[derive(Parser)]
#[command(name = "volunteer-search", version, about = "Search volunteers by program, weekday availability and distance")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON message catalog overriding the built-in English strings
    #[arg(long, global = true)]
    locale: Option<PathBuf>,

    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Search volunteer records
    Search(SearchArgs),
    /// Show the UTC intervals a local day window resolves to
    Window(WindowArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// JSON file holding an array of volunteer records
    #[arg(long)]
    data: PathBuf,

    /// JSON file mapping addresses to coordinates
    #[arg(long)]
    places: Option<PathBuf>,

    /// IANA timezone of the day and time filters
    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// Caller's address, for distance filtering and "closest" ordering
    #[arg(long)]
    address: Option<String>,

    /// Comma-separated program ids
    #[arg(long)]
    program: Option<String>,

    /// Comma-separated day indices (0 = Monday)
    #[arg(long)]
    day: Option<String>,

    /// Local start time, e.g. 09:00
    #[arg(long)]
    start: Option<String>,

    /// Local end time, e.g. 17:30
    #[arg(long)]
    end: Option<String>,

    /// Radius in miles
    #[arg(long)]
    distance: Option<String>,

    /// One of: highest, newest, closest, last
    #[arg(long)]
    order: Option<String>,

    /// Page number, starting at 1
    #[arg(long)]
    page: Option<String>,
}

#[derive(Args)]
struct WindowArgs {
    /// Day index (0 = Monday)
    #[arg(long)]
    day: String,

    /// IANA timezone
    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// Local start time
    #[arg(long)]
    start: Option<String>,

    /// Local end time
    #[arg(long)]
    end: Option<String>,
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    page: u32,
    per_page: u32,
    total_entries: usize,
    total_pages: usize,
    volunteers: Vec<&'a Volunteer>,
}

#[derive(Serialize)]
struct WindowOutput {
    day: DayIndex,
    day_name: String,
    timezone: String,
    utc_offset: String,
    intervals: Vec<IntervalOutput>,
}

/// `None` marks an unbounded end.
#[derive(Serialize)]
struct IntervalOutput {
    start: Option<String>,
    end: Option<String>,
}

fn endpoint_to_string(endpoint: Endpoint) -> Option<String> {
    endpoint.instant().map(|dt| dt.to_rfc3339())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose => debug; else warn
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "volunteer_search=debug"
        } else {
            "volunteer_search=warn"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let catalog = match load_catalog(cli.locale.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &catalog) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<SearchError>() {
            Some(search_err) if search_err.kind().is_user_error() => {
                eprintln!("error: {}", catalog.render(search_err));
                ExitCode::from(EXIT_REJECTED)
            }
            _ => {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(command: Command, catalog: &Catalog) -> Result<()> {
    match command {
        Command::Search(args) => run_search(args),
        Command::Window(args) => run_window(args, catalog),
    }
}

fn run_search(args: SearchArgs) -> Result<()> {
    let records: Vec<Volunteer> = read_json(&args.data)?;
    let places: PlaceTable = match &args.places {
        Some(path) => read_json(path)?,
        None => PlaceTable::new(),
    };
    tracing::debug!(records = records.len(), places = places.len(), "loaded data");

    let store = MemoryStore::new(records);
    let raw = RawSearchParams {
        program: args.program,
        day: args.day,
        start_time: args.start,
        end_time: args.end,
        distance: args.distance,
        order: args.order,
        page: args.page,
    };
    let ctx = SearchContext::new(&args.timezone).with_address(args.address.as_deref());

    let orchestrator = SearchOrchestrator::new(SearchConfig::default(), &places);
    let page = orchestrator.search_raw(store.query(), &raw, &ctx)?;

    let output = SearchOutput {
        page: page.page,
        per_page: page.per_page,
        total_entries: page.total_entries,
        total_pages: page.total_pages,
        volunteers: page.entries,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_window(args: WindowArgs, catalog: &Catalog) -> Result<()> {
    let day: DayIndex = args.day.parse()?;
    let start = args.start.as_deref().map(str::parse::<ClockTime>).transpose()?;
    let end = args.end.as_deref().map(str::parse::<ClockTime>).transpose()?;

    let resolver = TimeWindowResolver::for_timezone(&args.timezone)?;
    let query = resolver.resolve(day, start, end)?;

    let output = WindowOutput {
        day,
        day_name: catalog.day_name(day).into_owned(),
        utc_offset: utc_offset_on(&resolver.timezone(), day),
        timezone: args.timezone,
        intervals: query
            .intervals
            .iter()
            .map(|i| IntervalOutput {
                start: endpoint_to_string(i.start()),
                end: endpoint_to_string(i.end()),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => read_json(path),
        None => Ok(Catalog::english()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}
