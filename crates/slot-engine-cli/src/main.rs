use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use slot_engine::{
    find_slots_into, plan_slots, BusinessHours, DurationSource, LogSink, ReservationBook,
    ReservationSource, Schedule, SchedulerConfig, ServiceCatalog, SlotPlan, SlotRequest,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slots", version, about = "Compute free appointment slots for a day")]
struct Cli {
    /// Log gap evaluation and planning decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the start times at which a new appointment fits
    Find(FindArgs),
    /// Print the summed duration of services, in minutes
    Duration {
        /// Service catalog JSON (array or {"results": [...]})
        #[arg(long)]
        catalog: PathBuf,
        /// Comma-separated service ids
        #[arg(long, value_delimiter = ',', required = true)]
        services: Vec<u32>,
    },
}

#[derive(Args)]
struct FindArgs {
    /// Day to search (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,

    /// Reservations JSON; read from stdin when omitted or "-"
    #[arg(long)]
    reservations: Option<PathBuf>,

    /// Requested duration in minutes
    #[arg(long, conflicts_with = "services")]
    duration: Option<i64>,

    /// Comma-separated service ids, summed through --catalog
    #[arg(long, value_delimiter = ',', requires = "catalog")]
    services: Vec<u32>,

    /// Service catalog JSON
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Start (epoch seconds) of the reservation being rescheduled
    #[arg(long)]
    edit_start: Option<i64>,

    /// Scheduler config JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Opening time (HH:MM), overrides config
    #[arg(long)]
    open: Option<String>,

    /// Closing time (HH:MM), overrides config
    #[arg(long)]
    close: Option<String>,

    /// Step between candidate starts in minutes, overrides config
    #[arg(long)]
    granularity: Option<i64>,

    /// IANA timezone of the business, overrides config
    #[arg(long)]
    timezone: Option<String>,

    /// Print the plan as JSON
    #[arg(long, conflicts_with = "log_only")]
    json: bool,

    /// Report slots through the log only and print their count
    #[arg(long, conflicts_with = "edit_start")]
    log_only: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Find(args) => find(args),
        Command::Duration { catalog, services } => {
            let catalog = load_catalog(&catalog)?;
            println!("{}", catalog.total_minutes(&services)?);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("slot_engine=debug,slots=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slot_engine=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn find(args: FindArgs) -> Result<()> {
    let schedule = resolve_schedule(&args)?;
    let duration = resolve_duration(&args)?;
    let request = SlotRequest::new(args.date, duration);

    let book = ReservationBook::from_json(&read_input(args.reservations.as_deref())?)
        .context("failed to decode reservations")?;
    let day = book.reservations_on(args.date);
    debug!(total = book.len(), on_day = day.len(), "loaded reservations");

    if args.log_only {
        let mut sink = LogSink::new(schedule.timezone());
        let n = find_slots_into(&schedule, &request, &day, &mut sink)?;
        println!("{n} slots");
        return Ok(());
    }

    let editing = match args.edit_start {
        Some(start) => Some(
            book.find_by_start(start)
                .with_context(|| format!("no reservation starts at {start}"))?,
        ),
        None => None,
    };

    let plan = plan_slots(&schedule, &request, &day, editing)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &SlotPlan) {
    match plan {
        SlotPlan::Choices { choices } => {
            for choice in choices {
                println!("{}", choice.label);
            }
        }
        SlotPlan::NoneAvailable => println!("no slots available"),
        SlotPlan::ManualEntry { prefill: Some(time) } => println!("manual entry {time}"),
        SlotPlan::ManualEntry { prefill: None } => println!("manual entry"),
    }
}

/// Config file first, then single-field flag overrides.
fn resolve_schedule(args: &FindArgs) -> Result<Schedule> {
    let mut config = match &args.config {
        Some(path) => SchedulerConfig::load(path)?,
        None => SchedulerConfig::default(),
    };
    if let Some(open) = &args.open {
        config.open = open.clone();
    }
    if let Some(close) = &args.close {
        config.close = close.clone();
    }
    if let Some(granularity) = args.granularity {
        config.granularity_minutes = granularity;
    }
    if let Some(timezone) = &args.timezone {
        config.timezone = timezone.clone();
    }

    let schedule = config.schedule()?;
    let BusinessHours {
        open_offset_minutes,
        close_offset_minutes,
    } = schedule.hours();
    debug!(
        open_offset_minutes,
        close_offset_minutes,
        granularity = schedule.granularity_minutes(),
        timezone = schedule.timezone().name(),
        "schedule"
    );
    Ok(schedule)
}

fn resolve_duration(args: &FindArgs) -> Result<i64> {
    if let Some(minutes) = args.duration {
        return Ok(minutes);
    }
    match &args.catalog {
        Some(path) if !args.services.is_empty() => {
            Ok(load_catalog(path)?.total_minutes(&args.services)?)
        }
        _ => bail!("either --duration or --services with --catalog is required"),
    }
}

fn load_catalog(path: &Path) -> Result<ServiceCatalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    ServiceCatalog::from_json(&text).context("failed to decode service catalog")
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => fs::read_to_string(p)
            .with_context(|| format!("failed to read reservations {}", p.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read reservations from stdin")?;
            Ok(buf)
        }
    }
}
