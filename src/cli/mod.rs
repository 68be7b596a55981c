use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::WalletService;
use crate::domain::{format_money, parse_money, AccountId, Money, Payment};
use crate::io::{Exporter, Importer};
use crate::storage::{with_service, LedgerStore, Repository};

/// Purse - minimal personal wallet ledger
#[derive(Parser)]
#[command(name = "purse")]
#[command(about = "A minimal personal-wallet ledger: accounts, payments, refunds and favorites")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(
        short,
        long,
        global = true,
        env = "PURSE_DATABASE",
        default_value = "purse.db"
    )]
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

    /// Register a new account by phone number
    Register {
        /// Phone number (must be unique)
        phone: String,
    },

    /// Top up an account
    Deposit {
        /// Account ID
        account_id: AccountId,

        /// Amount to deposit (e.g., "10.00" or "10")
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Pay from an account balance
    Pay {
        /// Account ID
        account_id: AccountId,

        /// Amount to pay (e.g., "1.00" or "1")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Payment category (e.g., "fun", "mobile")
        #[arg(short, long, default_value = "other")]
        category: String,
    },

    /// Reject a payment and refund its amount
    Reject {
        /// Payment ID
        id: String,
    },

    /// Make a new payment with the parameters of an earlier one
    Repeat {
        /// Payment ID
        id: String,
    },

    /// Save a payment as a named favorite
    Favorite {
        /// Payment ID
        payment_id: String,

        /// Display name for the favorite
        #[arg(short, long)]
        name: String,
    },

    /// Pay using a saved favorite
    PayFavorite {
        /// Favorite ID
        favorite_id: String,
    },

    /// Show an account and its payments
    Account {
        /// Account ID
        id: AccountId,
    },

    /// List all accounts
    Accounts,

    /// List payments
    Payments {
        /// Only payments of this account
        #[arg(long)]
        account: Option<AccountId>,
    },

    /// List favorites
    Favorites,

    /// Verify ledger integrity
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export: accounts, payments, favorites, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replace the ledger with a full JSON snapshot
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    /// Log filter used when RUST_LOG is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose { "purse=debug" } else { "purse=warn" }
    }

    pub async fn run(self) -> Result<()> {
        let database = self.database;

        match self.command {
            Commands::Init => {
                Repository::init(&Repository::sqlite_url(&database, true)).await?;
                println!("Database initialized: {}", database);
            }

            Commands::Register { phone } => {
                let repo = open(&database).await?;
                let account = with_service(&repo, |service| service.register_account(phone)).await?;
                println!("Registered account {} ({})", account.id, account.phone);
            }

            Commands::Deposit { account_id, amount } => {
                let repo = open(&database).await?;
                let amount = parse_amount(&amount)?;
                let balance = with_service(&repo, |service| {
                    service.deposit(account_id, amount)?;
                    Ok(service.find_account_by_id(account_id)?.balance)
                })
                .await?;
                println!(
                    "Deposited {} to account {}, balance {}",
                    format_money(amount),
                    account_id,
                    format_money(balance)
                );
            }

            Commands::Pay {
                account_id,
                amount,
                category,
            } => {
                let repo = open(&database).await?;
                let amount = parse_amount(&amount)?;
                let payment =
                    with_service(&repo, |service| service.pay(account_id, amount, category))
                        .await?;
                print_payment_made("Paid", &payment);
            }

            Commands::Reject { id } => {
                let repo = open(&database).await?;
                let payment_id = parse_id(&id, "payment")?;
                let (payment, balance) = with_service(&repo, |service| {
                    service.reject(payment_id)?;
                    let payment = service.find_payment_by_id(payment_id)?.clone();
                    let balance = service.find_account_by_id(payment.account_id)?.balance;
                    Ok((payment, balance))
                })
                .await?;
                println!(
                    "Rejected payment {}: refunded {} to account {}, balance {}",
                    payment.id,
                    format_money(payment.amount),
                    payment.account_id,
                    format_money(balance)
                );
            }

            Commands::Repeat { id } => {
                let repo = open(&database).await?;
                let payment_id = parse_id(&id, "payment")?;
                let payment = with_service(&repo, |service| service.repeat(payment_id)).await?;
                print_payment_made("Repeated", &payment);
            }

            Commands::Favorite { payment_id, name } => {
                let repo = open(&database).await?;
                let payment_id = parse_id(&payment_id, "payment")?;
                let favorite =
                    with_service(&repo, |service| service.favorite_payment(payment_id, name))
                        .await?;
                println!(
                    "Saved favorite '{}': {} {} from account {} ({})",
                    favorite.name,
                    format_money(favorite.amount),
                    favorite.category,
                    favorite.account_id,
                    favorite.id
                );
            }

            Commands::PayFavorite { favorite_id } => {
                let repo = open(&database).await?;
                let favorite_id = parse_id(&favorite_id, "favorite")?;
                let payment =
                    with_service(&repo, |service| service.pay_from_favorite(favorite_id)).await?;
                print_payment_made("Paid", &payment);
            }

            Commands::Account { id } => {
                let service = load(&database).await?;
                run_account_command(&service, id)?;
            }

            Commands::Accounts => {
                let service = load(&database).await?;
                run_accounts_command(&service);
            }

            Commands::Payments { account } => {
                let service = load(&database).await?;
                let payments: Vec<&Payment> = match account {
                    Some(account_id) => {
                        service.find_account_by_id(account_id)?;
                        service.payments_for_account(account_id).collect()
                    }
                    None => service.payments().iter().collect(),
                };
                print_payments(&payments);
            }

            Commands::Favorites => {
                let service = load(&database).await?;
                run_favorites_command(&service);
            }

            Commands::Check => {
                let repo = open(&database).await?;
                run_check_command(&repo).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = load(&database).await?;
                run_export_command(&service, &export_type, output.as_deref())?;
            }

            Commands::Import { input, dry_run } => {
                run_import_command(&database, input.as_deref(), dry_run).await?;
            }
        }

        Ok(())
    }
}

async fn open(database: &str) -> Result<Repository> {
    Repository::connect(&Repository::sqlite_url(database, false))
        .await
        .with_context(|| format!("Cannot open {} (run `purse init` first)", database))
}

async fn load(database: &str) -> Result<WalletService> {
    let repo = open(database).await?;
    Ok(WalletService::from_state(repo.load().await?))
}

fn parse_amount(amount: &str) -> Result<Money> {
    parse_money(amount).with_context(|| format!("Invalid amount '{}'. Use '10.00' or '10'", amount))
}

fn parse_id(id: &str, kind: &str) -> Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("Invalid {} ID format (expected UUID)", kind))
}

fn print_payment_made(verb: &str, payment: &Payment) {
    println!(
        "{} {} ({}) from account {} ({})",
        verb,
        format_money(payment.amount),
        payment.category,
        payment.account_id,
        payment.id
    );
}

fn run_account_command(service: &WalletService, account_id: AccountId) -> Result<()> {
    let account = service.find_account_by_id(account_id)?;

    println!("Account: {}", account.id);
    println!("  Phone:      {}", account.phone);
    println!("  Balance:    {}", format_money(account.balance));
    println!(
        "  Registered: {}",
        account.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();

    let payments: Vec<&Payment> = service.payments_for_account(account_id).collect();
    print_payments(&payments);
    Ok(())
}

fn run_accounts_command(service: &WalletService) {
    let accounts = service.accounts();
    if accounts.is_empty() {
        println!("No accounts found.");
        return;
    }

    println!("{:>6} {:<18} {:>12}", "ID", "PHONE", "BALANCE");
    println!("{}", "-".repeat(38));
    for account in accounts {
        println!(
            "{:>6} {:<18} {:>12}",
            account.id,
            account.phone,
            format_money(account.balance)
        );
    }
}

fn print_payments(payments: &[&Payment]) {
    if payments.is_empty() {
        println!("No payments found.");
        return;
    }

    println!(
        "{:<36} {:>7} {:>10} {:<10} {:<12} CATEGORY",
        "ID", "ACCOUNT", "AMOUNT", "STATUS", "DATE"
    );
    println!("{}", "-".repeat(95));
    for payment in payments {
        println!(
            "{:<36} {:>7} {:>10} {:<10} {:<12} {}",
            payment.id,
            payment.account_id,
            format_money(payment.amount),
            payment.status,
            payment.created_at.format("%Y-%m-%d"),
            truncate(&payment.category, 20)
        );
    }
}

fn run_favorites_command(service: &WalletService) {
    let favorites = service.favorites();
    if favorites.is_empty() {
        println!("No favorites found.");
        return;
    }

    println!(
        "{:<36} {:<20} {:>7} {:>10} CATEGORY",
        "ID", "NAME", "ACCOUNT", "AMOUNT"
    );
    println!("{}", "-".repeat(90));
    for favorite in favorites {
        println!(
            "{:<36} {:<20} {:>7} {:>10} {}",
            favorite.id,
            truncate(&favorite.name, 20),
            favorite.account_id,
            format_money(favorite.amount),
            truncate(&favorite.category, 20)
        );
    }
}

async fn run_check_command(repo: &Repository) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = repo.load().await?.check_integrity();

    println!("Accounts:  {}", report.account_count);
    println!(
        "Payments:  {} ({} rejected)",
        report.payment_count, report.rejected_count
    );
    println!("Favorites: {}", report.favorite_count);
    match report.total_balance {
        Some(total) => println!("Total balance: {}", format_money(total)),
        None => println!("Total balance: overflow"),
    }
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

fn run_export_command(
    service: &WalletService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
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
        "accounts" => {
            let count = exporter.export_accounts_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} accounts", count);
            }
        }
        "payments" => {
            let count = exporter.export_payments_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} payments", count);
            }
        }
        "favorites" => {
            let count = exporter.export_favorites_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} favorites", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer)?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} accounts, {} payments, {} favorites",
                    snapshot.state.accounts.len(),
                    snapshot.state.payments.len(),
                    snapshot.state.favorites.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: accounts, payments, favorites, full",
                export_type
            );
        }
    }

    Ok(())
}

async fn run_import_command(database: &str, input: Option<&str>, dry_run: bool) -> Result<()> {
    use std::fs::File;
    use std::io::{Read, stdin};

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let result = Importer::import_full_json(reader)?;
    let report = &result.report;

    if dry_run {
        println!(
            "Snapshot is valid: {} accounts, {} payments, {} favorites (dry run, nothing imported)",
            report.account_count, report.payment_count, report.favorite_count
        );
        return Ok(());
    }

    let repo = Repository::init(&Repository::sqlite_url(database, true)).await?;
    repo.save(&result.state).await?;
    println!(
        "Imported {} accounts, {} payments, {} favorites into {}",
        report.account_count, report.payment_count, report.favorite_count, database
    );
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("fun", 20), "fun");
        assert_eq!(truncate("utilities and bills", 10), "utiliti...");
        assert_eq!(truncate("связь мобильная", 8), "связь...");
    }

    #[test]
    fn test_parse_pay_command() {
        let cli = Cli::try_parse_from([
            "purse", "-d", "test.db", "pay", "1", "1.50", "--category", "fun",
        ])
        .unwrap();

        assert_eq!(cli.database, "test.db");
        match cli.command {
            Commands::Pay {
                account_id,
                amount,
                category,
            } => {
                assert_eq!(account_id, 1);
                assert_eq!(amount, "1.50");
                assert_eq!(category, "fun");
            }
            _ => panic!("expected pay command"),
        }
    }

    #[test]
    fn test_negative_amount_reaches_the_ledger() {
        let cli = Cli::try_parse_from(["purse", "deposit", "1", "-5"]).unwrap();
        match cli.command {
            Commands::Deposit { amount, .. } => assert_eq!(parse_amount(&amount).unwrap(), -500),
            _ => panic!("expected deposit command"),
        }
    }

    #[test]
    fn test_verbose_raises_log_level() {
        let cli = Cli::try_parse_from(["purse", "-v", "accounts"]).unwrap();
        assert_eq!(cli.default_log_filter(), "purse=debug");

        let cli = Cli::try_parse_from(["purse", "accounts"]).unwrap();
        assert_eq!(cli.default_log_filter(), "purse=warn");
    }

    #[test]
    fn test_invalid_payment_id() {
        let err = parse_id("not-a-uuid", "payment").unwrap_err();
        assert!(err.to_string().contains("Invalid payment ID"));
    }
}
