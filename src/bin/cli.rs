use zakupy::{BudgetGroup, DateRange, Purchase, Summary, Tracker,
    backend::migrate_file};

use std::path::PathBuf;
use anyhow::Context;
use colored::Colorize;
use clap::{Args, Parser, Subcommand};
use serde_json::json;

#[derive(Parser, Debug)]
#[clap(version, about, propagate_version = true)]
struct Cli {
    /// Path to the data file to operate on
    #[clap(value_parser)]
    path: PathBuf,

    /// Action to perform
    #[clap(subcommand)]
    action: Subcommands,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// List purchases, optionally within a date range
    List(Range),
    /// List budget groups
    Groups,
    /// Record a new purchase
    AddPurchase(AddPurchase),
    /// Record a new budget group
    AddGroup(AddGroup),
    /// Show spending per category and per month
    Summary(Range),
    /// Rewrite amounts stored as text into numbers
    Migrate,
}

#[derive(Args, Debug)]
struct Range {
    /// First day to include, YYYY-MM-DD
    #[clap(short, long, value_parser)]
    from: Option<String>,

    /// Last day to include, YYYY-MM-DD
    #[clap(short, long, value_parser)]
    to: Option<String>,
}

impl Range {
    fn parse(&self) -> anyhow::Result<DateRange> {
        Ok(DateRange::parse(self.from.as_deref(), self.to.as_deref())?)
    }
}

#[derive(Args, Debug)]
struct AddPurchase {
    /// Shop the purchase was made in
    #[clap(short, long, value_parser)]
    store: String,

    #[clap(short, long, value_parser)]
    category: String,

    /// Amount, "12,34" and "12.34" are both accepted
    #[clap(short, long, value_parser)]
    amount: String,
}

#[derive(Args, Debug)]
struct AddGroup {
    /// Month label, e.g. "maj-2024"
    #[clap(short, long, value_parser)]
    month: String,

    #[clap(short, long, value_parser)]
    category: String,

    #[clap(short, long, value_parser)]
    amount: String,
}

fn print_purchases(purchases: &[Purchase]) {
    for purchase in purchases {
        println!("{} {} [{}] {}", purchase.entry_date.dimmed(), purchase.store,
            purchase.category, purchase.amount.to_string().bold());
    }
}

fn print_groups(groups: &[BudgetGroup]) {
    for group in groups {
        println!("{} [{}] {}", group.month, group.category, group.amount.to_string().bold());
    }
}

fn print_summary(summary: &Summary) {
    println!("{}: {}", "Total".bold(), summary.total);
    println!("{}: {}, {}: {}", "Purchases".bold(), summary.count, "Average".bold(), summary.average);

    println!("{}", "By category".bold());
    for category in &summary.by_category {
        println!("  {}: {} ({:.1}%)", category.category, category.total, category.share);
    }

    println!("{}", "By month".bold());
    for month in &summary.by_month {
        let total = month.total.to_string();
        let total = if summary.best_month.as_ref() == Some(month) {
            total.bright_red()
        } else if summary.worst_month.as_ref() == Some(month) {
            total.green()
        } else {
            total.normal()
        };
        println!("  {}: {}", month.month, total);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = Cli::parse();
    let tracker = Tracker::open(&args.path);

    match args.action {
        Subcommands::List(range) => {
            print_purchases(&tracker.list_purchases(&range.parse()?).await?);
        },
        Subcommands::Groups => {
            print_groups(&tracker.list_budget_groups().await?);
        },
        Subcommands::AddPurchase(add) => {
            let payload = json!({"sklep": add.store, "kategoria": add.category, "wartość": add.amount});
            let purchase = tracker.append_purchase(&payload).await
                .with_context(|| "failed to add purchase")?;
            println!("{} {}", "Added".green(), purchase);
        },
        Subcommands::AddGroup(add) => {
            let payload = json!({"month": add.month, "kategoria": add.category, "kwota": add.amount});
            let group = tracker.append_budget_group(&payload).await
                .with_context(|| "failed to add budget group")?;
            println!("{} {}", "Added".green(), group);
        },
        Subcommands::Summary(range) => {
            print_summary(&tracker.summary(&range.parse()?).await?);
        },
        Subcommands::Migrate => {
            let report = migrate_file(&args.path).await
                .with_context(|| format!("failed to migrate {}", args.path.display()))?;
            println!("{} {}", "Migrated".green(), report);
        },
    }

    Ok(())
}
