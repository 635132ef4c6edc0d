use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, Months, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::{epoch_floor, LedgerService, TransactionFilter};
use crate::domain::{
    format_cents, parse_cents, parse_date, NewTransaction, Transaction, TransactionId,
    TransactionKind,
};
use crate::io::{ExchangeFormat, Exporter, ImportOptions, Importer};

/// MoneyList - personal income and expense ledger
#[derive(Parser)]
#[command(name = "moneylist")]
#[command(about = "Record dated income and expense entries and summarize them")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "MONEYLIST_DB", default_value = "moneylist.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a new transaction
    Add {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Type: income or expense (收入 / 支出 also accepted)
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Date of the transaction (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Edit a transaction; omitted fields keep their current value
    Edit {
        /// Transaction ID
        id: TransactionId,

        /// New amount
        #[arg(short, long)]
        amount: Option<String>,

        /// New type: income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: TransactionId,
    },

    /// Show a single transaction
    Show {
        /// Transaction ID
        id: TransactionId,
    },

    /// List transactions in a date range, newest first
    List {
        /// Start date (YYYY-MM-DD, defaults to three months ago)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Only show one type: income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show balance, total income and total expense for the whole ledger
    Summary {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show the running balance over the full history
    Trend {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export all transactions to a CSV or JSON file
    Export {
        /// Output file; the extension selects the format unless --format is given
        path: PathBuf,

        /// Format: csv, json
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Import transactions from a CSV or JSON file
    Import {
        /// Input file; the extension selects the format unless --format is given
        path: PathBuf,

        /// Format: csv, json
        #[arg(short, long)]
        format: Option<String>,

        /// Validate the file without importing
        #[arg(long)]
        dry_run: bool,
    },
}

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// the verbosity flag.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "moneylist=debug"
    } else {
        "moneylist=warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if matches!(self.command, Commands::Init) {
            let service = LedgerService::init(&self.database).await?;
            service.close().await;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = LedgerService::connect(&self.database)
            .await
            .with_context(|| {
                format!(
                    "Failed to open {} (run `moneylist init` first)",
                    self.database
                )
            })?;
        let result = run_command(&service, self.command).await;
        service.close().await;
        result
    }
}

async fn run_command(service: &LedgerService, command: Commands) -> Result<()> {
    match command {
        // Handled in `Cli::run` before a connection exists
        Commands::Init => {}

        Commands::Add {
            amount,
            kind,
            date,
            description,
        } => {
            let date = match date {
                Some(date) => date,
                None => Local::now().date_naive().to_string(),
            };
            let fields = NewTransaction::parse(&date, &kind, &amount, description)?;
            let id = service.create_transaction(fields).await?;
            let transaction = service.get_transaction(id).await?;
            println!("Recorded transaction {}", describe(&transaction));
        }

        Commands::Edit {
            id,
            amount,
            kind,
            date,
            description,
        } => {
            let mut fields = service.get_transaction(id).await?.fields();
            if let Some(amount) = amount {
                fields.amount_cents = parse_cents(&amount)
                    .with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", amount))?;
            }
            if let Some(kind) = kind {
                fields.kind = kind.parse()?;
            }
            if let Some(date) = date {
                fields.date = parse_date(&date)?;
            }
            if let Some(description) = description {
                fields.description = description;
            }

            let updated = service.update_transaction(id, fields).await?;
            println!("Updated transaction {}", describe(&updated));
        }

        Commands::Delete { id } => {
            let deleted = service.delete_transaction(id).await?;
            println!("Deleted transaction {}", describe(&deleted));
        }

        Commands::Show { id } => {
            let t = service.get_transaction(id).await?;
            println!("Transaction: {}", t.id);
            println!("  Date:        {}", t.date);
            println!("  Type:        {} ({})", t.kind.name(), t.kind);
            println!("  Amount:      {}", format_cents(t.amount_cents));
            if !t.description.is_empty() {
                println!("  Description: {}", t.description);
            }
        }

        Commands::List {
            from,
            to,
            kind,
            format,
        } => {
            let today = Local::now().date_naive();
            let from_date = match from {
                Some(date) => parse_date(&date)?,
                None => three_months_before(today),
            };
            let to_date = match to {
                Some(date) => parse_date(&date)?,
                None => today,
            };

            let mut filter = TransactionFilter::between(from_date, to_date);
            if let Some(kind) = kind {
                filter = filter.with_kind(kind.parse::<TransactionKind>()?);
            }
            let transactions = service.list_transactions(filter).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&transactions)?),
                _ => print_transactions(&transactions),
            }
        }

        Commands::Summary { format } => {
            let summary = service.summary().await?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
                _ => {
                    println!("Balance:       {:>12}", format_cents(summary.balance));
                    println!(
                        "Total income:  {:>12} ({:.1}%)",
                        format_cents(summary.total_income),
                        summary.income_share()
                    );
                    println!(
                        "Total expense: {:>12} ({:.1}%)",
                        format_cents(summary.total_expense),
                        summary.expense_share()
                    );
                    println!("Transactions:  {:>12}", summary.transaction_count);
                }
            }
        }

        Commands::Trend { format } => {
            let points = service.balance_trend().await?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&points)?),
                _ if points.is_empty() => println!("No transactions found."),
                _ => {
                    println!("{:>6} {:<10} {:>12}", "#", "DATE", "BALANCE");
                    println!("{}", "-".repeat(30));
                    for point in points {
                        println!(
                            "{:>6} {:<10} {:>12}",
                            point.index,
                            point.date,
                            format_cents(point.balance)
                        );
                    }
                }
            }
        }

        Commands::Export { path, format } => {
            let format = resolve_format(&path, format.as_deref())?;
            let count = Exporter::new(service).export_file_as(&path, format).await?;
            println!(
                "Exported {} transactions to {} ({})",
                count,
                path.display(),
                format.as_str()
            );
        }

        Commands::Import {
            path,
            format,
            dry_run,
        } => {
            let format = resolve_format(&path, format.as_deref())?;
            let result = Importer::new(service)
                .import_file_as(&path, format, ImportOptions { dry_run })
                .await
                .with_context(|| format!("Import of {} failed", path.display()))?;

            if dry_run {
                println!("Dry run - no changes made");
                println!("  Valid records: {}", result.imported);
            } else {
                println!("Imported {} transactions", result.imported);
            }
        }
    }

    Ok(())
}

fn resolve_format(path: &std::path::Path, format: Option<&str>) -> Result<ExchangeFormat> {
    Ok(match format {
        Some(f) => f.parse()?,
        None => ExchangeFormat::from_path(path)?,
    })
}

/// Default start of the listing window, matching the three months the
/// ledger view shows by default.
fn three_months_before(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(3))
        .unwrap_or_else(epoch_floor)
}

fn describe(t: &Transaction) -> String {
    format!(
        "#{}: {} {} {}{}",
        t.id,
        t.date,
        t.kind.name(),
        format_cents(t.amount_cents),
        if t.description.is_empty() {
            String::new()
        } else {
            format!(" ({})", t.description)
        }
    )
}

fn print_transactions(transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:>6} {:<10} {:<8} {:>12}  {}",
        "ID", "DATE", "TYPE", "AMOUNT", "DESCRIPTION"
    );
    println!("{}", "-".repeat(60));
    for t in transactions {
        println!(
            "{:>6} {:<10} {:<8} {:>12}  {}",
            t.id,
            t.date,
            t.kind.name(),
            format_cents(t.amount_cents),
            truncate(&t.description, 30)
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
