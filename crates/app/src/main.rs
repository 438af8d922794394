use std::{error::Error, path::PathBuf, sync::Arc, time::Duration};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use engine::{
    Engine, FileStore, HttpRateSource, KvStore, LocationSample, MemoryStore, MoneyMinor,
    SlimCurrency,
};
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "viatico")]
#[command(about = "Track travel expenses across currencies, straight from the terminal")]
struct Cli {
    /// Directory for the document store (also read from `VIATICO_STORE`).
    #[arg(long, env = "VIATICO_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Trip(Trip),
    Expense(Expense),
    /// Sum of the current trip's ledger, converted into its base currency.
    Total,
    Currencies(Currencies),
    Shortlist(Shortlist),
    Backup(Backup),
    /// Current trip's ledger as CSV.
    Csv(CsvArgs),
    /// Raw store keys, for debugging.
    Keys,
}

#[derive(Args, Debug)]
struct Trip {
    #[command(subcommand)]
    command: TripCommand,
}

#[derive(Subcommand, Debug)]
enum TripCommand {
    New(TripNewArgs),
    Edit(TripEditArgs),
    List,
    Switch(TripSwitchArgs),
    Delete(TripDeleteArgs),
}

#[derive(Args, Debug)]
struct TripNewArgs {
    #[arg(long)]
    name: String,
    /// Base currency code; defaults to the catalog's first entry.
    #[arg(long)]
    base: Option<String>,
    /// Local currency code; defaults to the catalog's first entry.
    #[arg(long)]
    local: Option<String>,
    /// Extra short-list codes, repeatable.
    #[arg(long = "currency")]
    currencies: Vec<String>,
}

#[derive(Args, Debug)]
struct TripEditArgs {
    #[arg(long)]
    id: Uuid,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    base: Option<String>,
    #[arg(long)]
    local: Option<String>,
    /// Replacement short-list codes, repeatable. Omit to keep the current list.
    #[arg(long = "currency")]
    currencies: Vec<String>,
}

#[derive(Args, Debug)]
struct TripSwitchArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct TripDeleteArgs {
    #[arg(long = "id", required = true)]
    ids: Vec<Uuid>,
}

#[derive(Args, Debug)]
struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add(ExpenseAddArgs),
    List(ExpenseListArgs),
    Edit(ExpenseEditArgs),
    Rm(ExpenseRmArgs),
}

#[derive(Args, Debug)]
struct ExpenseAddArgs {
    /// Amount in major units, e.g. `12.50`.
    #[arg(long)]
    amount: String,
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Currency code; defaults to the trip's local currency.
    #[arg(long)]
    currency: Option<String>,
}

#[derive(Args, Debug)]
struct ExpenseListArgs {
    /// Show the whole ledger instead of the ten most recent entries.
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct ExpenseEditArgs {
    #[arg(long)]
    id: Uuid,
    #[arg(long)]
    amount: String,
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    currency: Option<String>,
}

#[derive(Args, Debug)]
struct ExpenseRmArgs {
    #[arg(long = "id", required = true)]
    ids: Vec<Uuid>,
}

#[derive(Args, Debug)]
struct Currencies {
    #[command(subcommand)]
    command: CurrenciesCommand,
}

#[derive(Subcommand, Debug)]
enum CurrenciesCommand {
    List,
    Refresh,
}

#[derive(Args, Debug)]
struct Shortlist {
    #[command(subcommand)]
    command: ShortlistCommand,
}

#[derive(Subcommand, Debug)]
enum ShortlistCommand {
    Add(ShortlistAddArgs),
    Locate(ShortlistLocateArgs),
    Rm(ShortlistRmArgs),
}

#[derive(Args, Debug)]
struct ShortlistAddArgs {
    /// Country name, e.g. `Hungary`.
    #[arg(long)]
    country: String,
}

/// Feed a location fix from an external geolocation tool. Unlike `add`,
/// an unmapped or stale fix is skipped quietly.
#[derive(Args, Debug)]
struct ShortlistLocateArgs {
    /// Reverse-geocoded country, when the fix resolved to one.
    #[arg(long)]
    country: Option<String>,
    /// Age of the fix in minutes; anything older than an hour is ignored.
    #[arg(long, default_value_t = 0)]
    age_minutes: i64,
}

#[derive(Args, Debug)]
struct ShortlistRmArgs {
    #[arg(long = "code", required = true)]
    codes: Vec<String>,
}

#[derive(Args, Debug)]
struct Backup {
    #[command(subcommand)]
    command: BackupCommand,
}

#[derive(Subcommand, Debug)]
enum BackupCommand {
    Export(BackupExportArgs),
    Import(BackupImportArgs),
}

#[derive(Args, Debug)]
struct BackupExportArgs {
    /// Write to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BackupImportArgs {
    #[arg(long)]
    file: PathBuf,
}

#[derive(Args, Debug)]
struct CsvArgs {
    /// Write to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_amount(raw: &str) -> Result<MoneyMinor, String> {
    raw.parse()
        .map_err(|err: engine::EngineError| err.to_string())
}

fn slim_for(engine: &Engine, code: &str) -> SlimCurrency {
    SlimCurrency::new(code, &engine.lookup_symbol(code))
}

fn build_store(flag: Option<PathBuf>, configured: Option<settings::Store>) -> Arc<dyn KvStore> {
    if let Some(path) = flag {
        return Arc::new(FileStore::new(path));
    }
    match configured {
        Some(settings::Store::Memory) => {
            tracing::debug!("using the in-memory store, nothing will persist");
            Arc::new(MemoryStore::new())
        }
        Some(settings::Store::Path(path)) => Arc::new(FileStore::new(path)),
        None => Arc::new(FileStore::new("viatico_data")),
    }
}

async fn require_current_trip(engine: &Engine) -> Result<engine::Trip, Box<dyn Error + Send + Sync>> {
    match engine.current_trip().await? {
        Some(trip) => Ok(trip),
        None => {
            eprintln!("no current trip; create one with `viatico trip new`");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "viatico={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let store = build_store(cli.store, settings.store);
    let url = settings
        .rates
        .url
        .unwrap_or_else(|| HttpRateSource::DEFAULT_URL.to_string());
    let timeout = Duration::from_secs(settings.rates.timeout_seconds.unwrap_or(10));
    let rates = Arc::new(HttpRateSource::new(url, timeout)?);

    let engine = Engine::builder()
        .store(store)
        .rate_source(rates)
        .build()
        .await?;

    match cli.command {
        Command::Trip(Trip {
            command: TripCommand::New(args),
        }) => {
            let template = engine.new_trip_template(Utc::now()).await?;
            let base = match args.base.as_deref() {
                Some(code) => slim_for(&engine, code),
                None => template.base_currency,
            };
            let local = match args.local.as_deref() {
                Some(code) => slim_for(&engine, code),
                None => template.local_currency,
            };
            let currencies = args
                .currencies
                .iter()
                .map(|code| slim_for(&engine, code))
                .collect();

            let trip = engine
                .create_or_update_trip(None, &args.name, base, local, currencies, Utc::now())
                .await?;
            println!("created trip: {} ({})", trip.name, trip.id);
        }
        Command::Trip(Trip {
            command: TripCommand::Edit(args),
        }) => {
            let trips = engine.all_trips().await?;
            let Some(existing) = trips.into_iter().find(|t| t.id == args.id) else {
                eprintln!("trip not found: {}", args.id);
                std::process::exit(1);
            };
            let name = args.name.unwrap_or_else(|| existing.name.clone());
            let base = match args.base.as_deref() {
                Some(code) => slim_for(&engine, code),
                None => existing.base_currency.clone(),
            };
            let local = match args.local.as_deref() {
                Some(code) => slim_for(&engine, code),
                None => existing.local_currency.clone(),
            };
            let currencies = if args.currencies.is_empty() {
                existing.currencies.clone()
            } else {
                args.currencies
                    .iter()
                    .map(|code| slim_for(&engine, code))
                    .collect()
            };

            let trip = engine
                .create_or_update_trip(Some(existing.id), &name, base, local, currencies, Utc::now())
                .await?;
            println!("updated trip: {} ({})", trip.name, trip.id);
        }
        Command::Trip(Trip {
            command: TripCommand::List,
        }) => {
            let current = engine.current_trip().await?.map(|t| t.id);
            let trips = engine.all_trips().await?;
            if trips.is_empty() {
                println!("no trips yet");
            }
            for trip in trips {
                let marker = if current == Some(trip.id) { "*" } else { " " };
                println!(
                    "{marker} {}  {}  (base {}, local {}, {} expenses)",
                    trip.id,
                    trip.name,
                    trip.base_currency.code,
                    trip.local_currency.code,
                    trip.expenses.len()
                );
            }
        }
        Command::Trip(Trip {
            command: TripCommand::Switch(args),
        }) => {
            let trip = engine.switch_trip(args.id).await?;
            println!("current trip: {} ({})", trip.name, trip.id);
        }
        Command::Trip(Trip {
            command: TripCommand::Delete(args),
        }) => {
            engine.delete_trips(&args.ids).await?;
            println!("deleted {} trip(s)", args.ids.len());
        }
        Command::Expense(Expense {
            command: ExpenseCommand::Add(args),
        }) => {
            let amount = match parse_amount(&args.amount) {
                Ok(v) => v,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let currency = match args.currency {
                Some(code) => code,
                None => require_current_trip(&engine).await?.local_currency.code,
            };

            let expense = engine
                .add_expense(amount, &args.description, &args.category, &currency, Utc::now())
                .await?;
            println!(
                "added {}{}  {}",
                engine.lookup_symbol(&expense.currency),
                expense.amount,
                expense.description
            );
        }
        Command::Expense(Expense {
            command: ExpenseCommand::List(args),
        }) => {
            let trip = require_current_trip(&engine).await?;
            let expenses = if args.all {
                engine.display_expenses(&trip)
            } else {
                engine.recent_expenses(&trip, None)
            };
            if expenses.is_empty() {
                println!("no expenses on {}", trip.name);
            }
            for expense in expenses {
                println!(
                    "{}  {}  {}{}  {}  {}",
                    expense.id,
                    expense.created_at.format("%Y-%m-%d"),
                    expense.symbol,
                    expense.amount,
                    expense.category,
                    expense.description
                );
            }
        }
        Command::Expense(Expense {
            command: ExpenseCommand::Edit(args),
        }) => {
            let amount = match parse_amount(&args.amount) {
                Ok(v) => v,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let currency = match args.currency {
                Some(code) => code,
                None => require_current_trip(&engine).await?.local_currency.code,
            };

            let expense = engine
                .edit_expense(args.id, amount, &args.description, &args.category, &currency)
                .await?;
            println!("updated expense {}", expense.id);
        }
        Command::Expense(Expense {
            command: ExpenseCommand::Rm(args),
        }) => {
            engine.remove_expenses(&args.ids).await?;
            println!("removed {} expense(s)", args.ids.len());
        }
        Command::Total => {
            engine.refresh_rates_if_stale(Utc::now()).await?;
            let trip = require_current_trip(&engine).await?;
            let total = engine.compute_total(&trip).await?;
            println!(
                "{}: {}{} ({})",
                trip.name, trip.base_currency.symbol, total, trip.base_currency.code
            );
        }
        Command::Currencies(Currencies {
            command: CurrenciesCommand::List,
        }) => {
            engine.refresh_rates_if_stale(Utc::now()).await?;
            for currency in engine.list_currencies().await? {
                println!(
                    "{}  {}  {}  (1 USD = {} {})",
                    currency.code, currency.symbol, currency.name, currency.rate, currency.code
                );
            }
        }
        Command::Currencies(Currencies {
            command: CurrenciesCommand::Refresh,
        }) => {
            if engine.refresh_rates_if_stale(Utc::now()).await? {
                println!("exchange rates refreshed");
            } else {
                println!("exchange rates are fresh enough, kept as-is");
            }
        }
        Command::Shortlist(Shortlist {
            command: ShortlistCommand::Add(args),
        }) => {
            if engine.add_currency_for_country(&args.country).await? {
                println!("added the currency for {}", args.country.trim());
            } else {
                println!("the currency for {} is already listed", args.country.trim());
            }
        }
        Command::Shortlist(Shortlist {
            command: ShortlistCommand::Locate(args),
        }) => {
            let sample = LocationSample {
                country: args.country,
                age_minutes: args.age_minutes,
            };
            if engine.add_currency_from_location(&sample).await? {
                println!("added the local currency to the short-list");
            } else {
                println!("short-list unchanged");
            }
        }
        Command::Shortlist(Shortlist {
            command: ShortlistCommand::Rm(args),
        }) => {
            engine.remove_currencies(&args.codes).await?;
            println!("removed from the short-list: {}", args.codes.join(", "));
        }
        Command::Backup(Backup {
            command: BackupCommand::Export(args),
        }) => {
            let data = engine.export_trips().await?;
            match args.out {
                Some(path) => {
                    tokio::fs::write(&path, &data).await?;
                    println!("exported trips to {}", path.display());
                }
                None => println!("{data}"),
            }
        }
        Command::Backup(Backup {
            command: BackupCommand::Import(args),
        }) => {
            let data = tokio::fs::read_to_string(&args.file).await?;
            let trips = engine.import_trips(&data).await?;
            println!("imported; {} trips stored", trips.len());
        }
        Command::Csv(args) => {
            let trip = require_current_trip(&engine).await?;
            let csv = engine.export_csv(&trip)?;
            match args.out {
                Some(path) => {
                    tokio::fs::write(&path, &csv).await?;
                    println!("exported {} to {}", trip.name, path.display());
                }
                None => print!("{csv}"),
            }
        }
        Command::Keys => {
            for key in engine.stored_keys().await? {
                println!("{key}");
            }
        }
    }

    Ok(())
}
