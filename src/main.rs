// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use bank_etl::{run_pipeline, EtlConfig, ExtractFailurePolicy, FileProgressLog, HttpFetcher};

#[derive(Parser, Debug)]
#[command(name = "bank-etl", version, about = "Largest banks by market cap: extract, convert, load, report")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the batch job (default)
    Run(RunArgs),
    /// Browse the stored table
    View {
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        table: Option<String>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    rates: Option<PathBuf>,
    #[arg(long)]
    db: Option<PathBuf>,
    #[arg(long)]
    table: Option<String>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    log: Option<PathBuf>,
    /// Abort instead of continuing with an empty dataset when extraction fails
    #[arg(long)]
    fail_fast: bool,
}

impl RunArgs {
    fn apply(self, config: &mut EtlConfig) {
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(rates) = self.rates {
            config.rates_path = rates;
        }
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(table) = self.table {
            config.table_name = table;
        }
        if let Some(output) = self.output {
            config.output_csv = output;
        }
        if let Some(log) = self.log {
            config.log_path = log;
        }
        if self.fail_fast {
            config.on_extract_failure = ExtractFailurePolicy::FailFast;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => EtlConfig::from_file(path)?,
        None => EtlConfig::default(),
    };

    match cli.command {
        Some(Command::View { db, table }) => {
            if let Some(db) = db {
                config.db_path = db;
            }
            if let Some(table) = table {
                config.table_name = table;
            }
            run_view(&config)
        }
        Some(Command::Run(args)) => {
            args.apply(&mut config);
            run_job(&config)
        }
        None => run_job(&config),
    }
}

fn run_job(config: &EtlConfig) -> Result<()> {
    println!("🏦 Bank ETL: {} → {}", config.url, config.db_path.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let fetcher = HttpFetcher::new(config.http_timeout())?;
    let log = FileProgressLog::new(&config.log_path);
    let summary = {
        let mut stdout = io::stdout().lock();
        run_pipeline(config, &fetcher, &log, &mut stdout)?
    };

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Extracted: {} banks", summary.extracted);
    println!("✓ Loaded: {} rows into {}", summary.loaded, config.table_name);
    println!("✓ Dataset saved to {}", config.output_csv.display());
    println!("✓ Run id: {}", summary.run_id);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_view(config: &EtlConfig) -> Result<()> {
    use bank_etl::get_stored_banks;
    use rusqlite::Connection;

    if !config.db_path.exists() {
        eprintln!("❌ Database not found: {}", config.db_path.display());
        eprintln!("   Run: bank-etl run");
        eprintln!("   to build it first.");
        std::process::exit(1);
    }

    let conn = Connection::open(&config.db_path)?;
    let banks = get_stored_banks(&conn, &config.table_name)?;

    let mut app = ui::App::new(config.table_name.clone(), banks);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_view(_config: &EtlConfig) -> Result<()> {
    eprintln!("❌ Table viewer not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
