use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rule_domain::{BudgetBucket, MonthKey, TransactionKind};
use rust_decimal::Decimal;

#[derive(Debug, Parser)]
#[command(
    name = "budget_rule_cli",
    version,
    about = "Track income and expenses against a needs/wants/savings allocation rule",
    long_about = "Budget Rule records income and expenses, classifies expenses into \
                  needs, wants and savings buckets, and reports how each bucket is \
                  tracking against the configured percentage split."
)]
pub struct Cli {
    /// Directory holding transactions, the allocation rule and config.json
    #[arg(long, global = true, env = "BUDGET_RULE_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true, env = "BUDGET_RULE_TODAY", hide = true)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show totals, allocation status and recent activity
    Status(StatusArgs),

    /// Show monthly income and expense for the trailing months
    Trend {
        /// Number of months, ending with the current one
        #[arg(short, long)]
        months: Option<usize>,
    },

    /// List transactions in a window, newest first
    #[command(alias = "ls")]
    List(WindowArgs),

    /// Record a new transaction
    Add(AddArgs),

    /// Change fields of an existing transaction
    Edit(EditArgs),

    /// Delete a transaction
    #[command(alias = "rm")]
    Delete {
        /// Transaction id
        id: String,
    },

    /// Show or change the allocation rule
    #[command(subcommand)]
    Rule(RuleCommand),

    /// Show or change preferences
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Show build metadata
    Version,
}

#[derive(Debug, Clone, Default, Args)]
pub struct WindowArgs {
    /// Restrict to a calendar month (YYYY-MM)
    #[arg(long, value_name = "YYYY-MM", value_parser = parse_month, conflicts_with = "all")]
    pub month: Option<MonthKey>,

    /// Cover every transaction
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// `income` or `expense`
    #[arg(value_parser = parse_kind)]
    pub kind: TransactionKind,

    pub category: String,

    pub amount: Decimal,

    /// Defaults to today (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    #[arg(short, long)]
    pub note: Option<String>,

    /// `needs`, `wants` or `savings`; expenses only
    #[arg(short, long, value_parser = parse_bucket)]
    pub bucket: Option<BudgetBucket>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Transaction id
    pub id: String,

    #[arg(long, value_parser = parse_kind)]
    pub kind: Option<TransactionKind>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub amount: Option<Decimal>,

    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub note: Option<String>,

    #[arg(long, value_parser = parse_bucket, conflicts_with = "clear_bucket")]
    pub bucket: Option<BudgetBucket>,

    /// Mark the expense as unclassified
    #[arg(long)]
    pub clear_bucket: bool,
}

#[derive(Debug, Subcommand)]
pub enum RuleCommand {
    /// Print the current percentages
    Show,
    /// Replace the percentages; they must add up to 100
    Set {
        #[arg(long)]
        needs: Decimal,
        #[arg(long)]
        wants: Decimal,
        #[arg(long)]
        savings: Decimal,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print every setting
    Show,
    /// Change one setting
    Set { key: String, value: String },
}

fn parse_kind(value: &str) -> Result<TransactionKind, String> {
    TransactionKind::parse(value)
        .ok_or_else(|| format!("expected `income` or `expense`, got `{value}`"))
}

fn parse_bucket(value: &str) -> Result<BudgetBucket, String> {
    BudgetBucket::parse(value)
        .ok_or_else(|| format!("expected `needs`, `wants` or `savings`, got `{value}`"))
}

fn parse_month(value: &str) -> Result<MonthKey, String> {
    MonthKey::parse(value).ok_or_else(|| format!("expected YYYY-MM, got `{value}`"))
}
