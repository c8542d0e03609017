use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::{RATE_ENV_VAR, TripConfig, TripService};
use crate::domain::{
    Booking, BookingKind, Currency, ExchangeRate, NewExpense, NewLocation, format_amount,
    parse_amount,
};

/// BusanGo - Trip planner for Busan
#[derive(Parser)]
#[command(name = "busango")]
#[command(about = "A local-first trip planner: itinerary, shared expenses and bookings")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, global = true, default_value = "busango.db")]
    pub database: String,

    /// KRW -> TWD exchange rate (e.g., 0.024)
    #[arg(long, global = true, env = RATE_ENV_VAR)]
    pub rate: Option<f64>,

    /// Currency balances are reported in: KRW or TWD
    #[arg(long, global = true, default_value = "TWD")]
    pub reference: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new trip database
    Init,

    /// Shared expense commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Show each participant's net balance
    Balances,

    /// Show total trip spend in both currencies
    Total,

    /// Show who should pay whom to settle up
    Settle,

    /// Day-by-day plan commands
    #[command(subcommand)]
    Itinerary(ItineraryCommands),

    /// Flight and hotel reservations
    #[command(subcommand)]
    Booking(BookingCommands),

    /// Export data to CSV or JSON
    Export {
        /// What to export: expenses, balances, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record a shared expense
    Add {
        /// What was paid for (e.g., "Seafood dinner")
        description: String,

        /// Amount paid (e.g., "90000" or "90,000")
        amount: String,

        /// Currency: KRW or TWD
        #[arg(short, long, default_value = "KRW")]
        currency: String,

        /// Who paid (name or id, defaults to the first participant)
        #[arg(long)]
        paid_by: Option<String>,

        /// Who shares the cost, comma separated (defaults to everyone)
        #[arg(long, value_delimiter = ',')]
        split: Vec<String>,

        /// Date of the expense (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List recorded expenses, newest first
    List {
        /// Maximum number of expenses to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only expenses this participant paid for or shares (name or id)
        #[arg(short, long)]
        participant: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ItineraryCommands {
    /// Show the plan for one day or the whole trip
    Show {
        /// Day number (omit for all days)
        day: Option<u32>,
    },

    /// List every stop of the trip with its coordinates
    Stops,

    /// Add a day after the last planned one
    AddDay {
        /// First day of the trip, required when nothing is planned yet (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
    },

    /// Add a stop to a day
    AddStop {
        /// Day number
        day: u32,

        /// Place name
        name: String,

        /// Time of the visit (HH:MM)
        time: String,

        /// Latitude (defaults to central Busan)
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude (defaults to central Busan)
        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,

        /// Notes for the stop
        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a stop from a day
    RemoveStop {
        /// Day number
        day: u32,

        /// Stop ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BookingCommands {
    /// List reservations
    List,

    /// Add a reservation
    Add {
        /// Booking kind: flight, hotel, other
        #[arg(short, long)]
        kind: String,

        /// Title (e.g., "TPE -> PUS")
        title: String,

        /// Details (flight number, address, ...)
        #[arg(long, default_value = "")]
        details: String,

        /// Confirmation code
        #[arg(long)]
        code: Option<String>,

        /// Local date and time (YYYY-MM-DD HH:MM)
        #[arg(long)]
        date: String,
    },
}

/// Install the tracing subscriber. `RUST_LOG` wins over the verbose flag.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "busango=debug" } else { "busango=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    /// Build the trip configuration from flags and environment.
    pub fn config(&self) -> Result<TripConfig> {
        let rate = match self.rate {
            Some(rate) => ExchangeRate::new(rate).context("Invalid --rate")?,
            None => ExchangeRate::default(),
        };
        let reference = Currency::from_str(&self.reference).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid reference currency '{}'. Valid currencies: KRW, TWD",
                self.reference
            )
        })?;
        Ok(TripConfig::new(rate).with_reference(reference))
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config()?;

        match self.command {
            Commands::Init => {
                TripService::init(&self.database, config).await?;
                println!("Database initialized: {}", self.database);
            }
            Commands::Expense(cmd) => {
                let service = connect(&self.database, config).await?;
                run_expense_command(&service, cmd).await?;
            }
            Commands::Balances => {
                let service = connect(&self.database, config).await?;
                run_balances_command(&service).await?;
            }
            Commands::Total => {
                let service = connect(&self.database, config).await?;
                run_total_command(&service).await?;
            }
            Commands::Settle => {
                let service = connect(&self.database, config).await?;
                run_settle_command(&service).await?;
            }
            Commands::Itinerary(cmd) => {
                let service = connect(&self.database, config).await?;
                run_itinerary_command(&service, cmd).await?;
            }
            Commands::Booking(cmd) => {
                let service = connect(&self.database, config).await?;
                run_booking_command(&service, cmd).await?;
            }
            Commands::Export {
                export_type,
                output,
            } => {
                let service = connect(&self.database, config).await?;
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }
        }
        Ok(())
    }
}

async fn connect(database: &str, config: TripConfig) -> Result<TripService> {
    TripService::connect(database, config)
        .await
        .with_context(|| format!("Could not open {}. Run 'busango init' first", database))
}

async fn run_expense_command(service: &TripService, cmd: ExpenseCommands) -> Result<()> {
    match cmd {
        ExpenseCommands::Add {
            description,
            amount,
            currency,
            paid_by,
            split,
            date,
        } => {
            let amount = parse_amount(&amount)
                .with_context(|| format!("Invalid amount '{}'. Use '90000' or '12.5'", amount))?;
            let currency = Currency::from_str(&currency).ok_or_else(|| {
                anyhow::anyhow!("Invalid currency '{}'. Valid currencies: KRW, TWD", currency)
            })?;

            let payer = match paid_by {
                Some(key) => service.get_participant(&key)?.clone(),
                None => service
                    .participants()
                    .first()
                    .cloned()
                    .context("The trip has no participants")?,
            };

            let mut new_expense = NewExpense::new(description, amount, currency, payer.id.clone());
            if !split.is_empty() {
                let ids = split
                    .iter()
                    .map(|key| service.get_participant(key).map(|p| p.id.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                new_expense = new_expense.split_between(ids);
            }
            if let Some(date_str) = date {
                new_expense = new_expense.on(parse_date(&date_str).with_context(|| {
                    format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)
                })?);
            }

            let expense = service.add_expense(new_expense).await?;
            println!(
                "Recorded expense: {} {} paid by {}, split {} ways ({})",
                expense.description,
                expense.currency.format(expense.amount),
                payer.name,
                expense.participant_ids.len(),
                expense.id
            );
        }

        ExpenseCommands::List { limit, participant } => {
            let expenses = match participant {
                Some(key) => service.list_expenses_involving(&key, limit).await?,
                None => service.list_expenses(limit).await?,
            };
            if expenses.is_empty() {
                println!("No expenses recorded.");
                return Ok(());
            }

            println!(
                "{:<12} {:<24} {:>14} {:<10} SPLIT",
                "DATE", "DESCRIPTION", "AMOUNT", "PAID BY"
            );
            println!("{}", "-".repeat(70));
            for expense in expenses {
                let split = if expense.is_solo() {
                    "solo".to_string()
                } else {
                    expense.participant_ids.len().to_string()
                };
                let payer = service
                    .get_participant(&expense.paid_by_id)
                    .map(|p| p.name.as_str())
                    .unwrap_or("?");
                println!(
                    "{:<12} {:<24} {:>14} {:<10} {}",
                    expense.date.format("%Y-%m-%d"),
                    truncate(&expense.description, 24),
                    expense.currency.format(expense.amount),
                    truncate(payer, 10),
                    split
                );
            }
        }
    }
    Ok(())
}

async fn run_balances_command(service: &TripService) -> Result<()> {
    let summary = service.expense_summary().await?;
    let reference = summary.reference;

    println!("{:<16} {:>16}", "PARTICIPANT", "BALANCE");
    println!("{}", "-".repeat(33));
    for entry in &summary.balances {
        let label = if entry.is_owed() { "gets back" } else { "owes" };
        println!(
            "{:<16} {:>16}  {}",
            truncate(&entry.participant.name, 16),
            reference.format(entry.balance.abs()),
            label
        );
    }
    Ok(())
}

async fn run_total_command(service: &TripService) -> Result<()> {
    let totals = service.total_spend().await?;
    let count = service.list_expenses(None).await?.len();

    println!("Total trip spend ({} expenses)", count);
    println!("  {}", Currency::Krw.format(totals.total_krw));
    println!("  ≈ {}", Currency::Twd.format(totals.total_twd));
    println!(
        "  (1 KRW = {} TWD)",
        service.config().rate.krw_to_twd()
    );
    Ok(())
}

async fn run_settle_command(service: &TripService) -> Result<()> {
    let summary = service.expense_summary().await?;

    if summary.settlement.is_empty() {
        println!("Everyone is settled up.");
        return Ok(());
    }

    for transfer in &summary.settlement {
        let from = service
            .get_participant(&transfer.from)
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        let to = service
            .get_participant(&transfer.to)
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        println!(
            "{} pays {} {} {}",
            from,
            to,
            summary.reference.symbol(),
            format_amount(transfer.amount, 0)
        );
    }
    Ok(())
}

async fn run_itinerary_command(service: &TripService, cmd: ItineraryCommands) -> Result<()> {
    match cmd {
        ItineraryCommands::Show { day } => {
            let itinerary = service.load_itinerary().await?;
            let days: Vec<_> = match day {
                Some(n) => vec![
                    itinerary
                        .day(n)
                        .with_context(|| format!("Day {} is not in the itinerary", n))?,
                ],
                None => itinerary.days().iter().collect(),
            };

            if days.is_empty() {
                println!("Nothing planned yet.");
            }
            for day in days {
                println!("Day {} - {}", day.day_number, day.date.format("%a %Y-%m-%d"));
                if day.locations.is_empty() {
                    println!("  (no stops)");
                }
                for loc in &day.locations {
                    println!("  {}  {}", loc.time.format("%H:%M"), loc.name);
                    if let Some(desc) = &loc.description {
                        println!("         {}", desc);
                    }
                    println!("         {:.4}, {:.4}  [{}]", loc.lat, loc.lng, loc.id);
                }
                println!();
            }
        }

        ItineraryCommands::Stops => {
            let stops = service.list_stops().await?;
            if stops.is_empty() {
                println!("No stops planned.");
                return Ok(());
            }

            println!(
                "{:<5} {:<6} {:<28} {:>10} {:>10}",
                "DAY", "TIME", "NAME", "LAT", "LNG"
            );
            println!("{}", "-".repeat(63));
            for (day_number, loc) in stops {
                println!(
                    "{:<5} {:<6} {:<28} {:>10.4} {:>10.4}",
                    day_number,
                    loc.time.format("%H:%M"),
                    truncate(&loc.name, 28),
                    loc.lat,
                    loc.lng
                );
            }
        }

        ItineraryCommands::AddDay { start } => {
            let start = start
                .map(|s| {
                    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", s))
                })
                .transpose()?;
            let (day_number, date) = service.add_day(start).await?;
            println!("Added day {} ({})", day_number, date);
        }

        ItineraryCommands::AddStop {
            day,
            name,
            time,
            lat,
            lng,
            description,
        } => {
            let location = service
                .add_location(
                    day,
                    NewLocation {
                        name,
                        time,
                        lat,
                        lng,
                        description,
                    },
                )
                .await?;
            println!(
                "Added stop to day {}: {} {} ({})",
                day,
                location.time.format("%H:%M"),
                location.name,
                location.id
            );
        }

        ItineraryCommands::RemoveStop { day, id } => {
            let id = Uuid::parse_str(&id).context("Invalid stop ID format")?;
            let removed = service.remove_location(day, id).await?;
            println!("Removed stop from day {}: {}", day, removed.name);
        }
    }
    Ok(())
}

async fn run_booking_command(service: &TripService, cmd: BookingCommands) -> Result<()> {
    match cmd {
        BookingCommands::List => {
            let bookings = service.list_bookings().await?;
            if bookings.is_empty() {
                println!("No bookings.");
            }
            for booking in bookings {
                println!("[{}] {}", booking.kind, booking.title);
                println!("  When:    {}", booking.date.format("%Y-%m-%d %H:%M"));
                if !booking.details.is_empty() {
                    println!("  Details: {}", booking.details);
                }
                if let Some(code) = &booking.confirmation_code {
                    println!("  Code:    {}", code);
                }
            }
        }

        BookingCommands::Add {
            kind,
            title,
            details,
            code,
            date,
        } => {
            let kind = BookingKind::from_str(&kind).ok_or_else(|| {
                anyhow::anyhow!("Invalid booking kind '{}'. Valid kinds: flight, hotel, other", kind)
            })?;
            let date = NaiveDateTime::parse_from_str(&date, "%Y-%m-%d %H:%M")
                .with_context(|| format!("Invalid date '{}'. Use 'YYYY-MM-DD HH:MM'", date))?;

            let mut booking = Booking::new(kind, title, details, date);
            if let Some(code) = code {
                booking = booking.with_confirmation_code(code);
            }
            let booking = service.add_booking(booking).await?;
            println!("Added {} booking: {}", booking.kind, booking.title);
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &TripService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "expenses" => {
            let count = exporter.export_expenses_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        "balances" => {
            let count = exporter.export_balances_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} balances", count);
            }
        }
        "full" => {
            exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!("Exported full trip snapshot");
            }
        }
        other => anyhow::bail!(
            "Unknown export type '{}'. Valid types: expenses, balances, full",
            other
        ),
    }
    Ok(())
}

/// Shorten to `max_len` characters, marking the cut with "...".
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .context("Date must be in YYYY-MM-DD format")?;

    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;

    Ok(DateTime::from_naive_utc_and_offset(naive_datetime, Utc))
}
