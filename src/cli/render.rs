//! Text rendering for reports. Nothing here computes totals.

use std::fmt::Write as _;

use colored::Colorize;
use rule_config::Config;
use rule_core::{
    AllocationOutcome, BucketStatus, CategoryTotal, DashboardReport, MonthlyPoint, TimeWindow,
};
use rule_domain::{AllocationRule, Transaction};
use rust_decimal::Decimal;

use crate::utils::build_info::BuildMetadata;

/// Formats an amount with two decimals, sign before the symbol.
pub fn money(symbol: &str, amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    if rounded < Decimal::ZERO {
        format!("-{}{:.2}", symbol, rounded.abs())
    } else {
        format!("{}{:.2}", symbol, rounded)
    }
}

pub fn percent(value: Decimal) -> String {
    format!("{}%", value.round_dp(1).normalize())
}

fn heading(out: &mut String, title: impl std::fmt::Display) {
    let _ = writeln!(out, "\n{}", format!("=== {} ===", title).bold());
}

pub fn status(report: &DashboardReport, symbol: &str) -> String {
    let mut out = String::new();
    let totals = &report.totals;

    heading(&mut out, "Overview");
    let _ = writeln!(out, "{:<10}{:>14}", "Income", money(symbol, totals.income));
    let _ = writeln!(out, "{:<10}{:>14}", "Expense", money(symbol, totals.expense));
    let _ = writeln!(out, "{:<10}{:>14}", "Balance", money(symbol, totals.balance));

    heading(&mut out, window_title(report.window));
    let period = &report.period;
    let _ = writeln!(out, "{:<10}{:>14}", "Income", money(symbol, period.income_total));
    let _ = writeln!(out, "{:<10}{:>14}", "Expense", money(symbol, period.expense_total));
    if period.unclassified_total > Decimal::ZERO {
        let _ = writeln!(
            out,
            "{} of spending has no bucket and is left out of the allocation.",
            money(symbol, period.unclassified_total)
        );
    }

    out.push_str(&allocation(&report.allocation, symbol));
    out.push_str(&categories(&report.categories, symbol));

    heading(&mut out, "Recent");
    if report.recent.is_empty() {
        let _ = writeln!(out, "No transactions yet.");
    }
    for txn in &report.recent {
        let _ = writeln!(out, "{}", transaction_line(txn, symbol));
    }
    out
}

fn window_title(window: TimeWindow) -> String {
    match window {
        TimeWindow::All => "All time".into(),
        TimeWindow::Month(month) => month.label(),
    }
}

pub fn allocation(outcome: &AllocationOutcome, symbol: &str) -> String {
    let mut out = String::new();
    match outcome {
        AllocationOutcome::RuleInvalid { rule, total } => {
            heading(&mut out, format!("Allocation ({})", rule_split(rule)));
            let _ = writeln!(
                out,
                "{}",
                format!(
                    "Rule is inactive: shares add up to {}, not 100%.",
                    percent(*total)
                )
                .bright_yellow()
            );
        }
        AllocationOutcome::Active(status) => {
            heading(&mut out, format!("Allocation ({})", rule_split(&status.rule)));
            let _ = writeln!(
                out,
                "{:<8}{:>6}{:>14}{:>14}{:>9}{:>14}",
                "Bucket", "Share", "Limit", "Spent", "Used", "Remaining"
            );
            for bucket in status.buckets() {
                let _ = writeln!(out, "{}", bucket_line(bucket, symbol));
            }
        }
    }
    out
}

fn bucket_line(bucket: &BucketStatus, symbol: &str) -> String {
    let line = format!(
        "{:<8}{:>6}{:>14}{:>14}{:>9}{:>14}",
        bucket.bucket.label(),
        percent(bucket.percent),
        money(symbol, bucket.limit),
        money(symbol, bucket.spent),
        percent(bucket.percent_used),
        money(symbol, bucket.remaining),
    );
    if bucket.is_off_track() {
        line.bright_red().to_string()
    } else {
        line
    }
}

fn categories(categories: &[CategoryTotal], symbol: &str) -> String {
    let mut out = String::new();
    if categories.is_empty() {
        return out;
    }
    heading(&mut out, "Spending by category");
    for entry in categories {
        let _ = writeln!(out, "{:<20}{:>14}", entry.category, money(symbol, entry.amount));
    }
    out
}

pub fn rule_split(rule: &AllocationRule) -> String {
    format!(
        "{}/{}/{}",
        rule.needs.normalize(),
        rule.wants.normalize(),
        rule.savings.normalize()
    )
}

pub fn rule(rule: &AllocationRule) -> String {
    let mut out = String::new();
    heading(&mut out, "Allocation rule");
    let _ = writeln!(out, "{:<10}{:>8}", "Needs", percent(rule.needs));
    let _ = writeln!(out, "{:<10}{:>8}", "Wants", percent(rule.wants));
    let _ = writeln!(out, "{:<10}{:>8}", "Savings", percent(rule.savings));
    if !rule.is_complete() {
        let _ = writeln!(
            out,
            "{}",
            format!("Shares add up to {}; reports stay inactive.", percent(rule.total()))
                .bright_yellow()
        );
    }
    out
}

pub fn trend(points: &[MonthlyPoint], symbol: &str) -> String {
    let mut out = String::new();
    heading(&mut out, format!("Last {} months", points.len()));
    let _ = writeln!(out, "{:<10}{:>14}{:>14}", "Month", "Income", "Expense");
    for point in points {
        let _ = writeln!(
            out,
            "{:<10}{:>14}{:>14}",
            point.label,
            money(symbol, point.income_total),
            money(symbol, point.expense_total)
        );
    }
    out
}

pub fn transaction_line(txn: &Transaction, symbol: &str) -> String {
    let bucket = txn.bucket.map(|bucket| bucket.label()).unwrap_or("-");
    let mut line = format!(
        "{}  {:<8}{:<18}{:<9}{:>14}  {}",
        txn.occurred_on.format("%Y-%m-%d"),
        txn.kind.label(),
        txn.category,
        bucket,
        money(symbol, txn.signed_amount()),
        txn.id.dimmed()
    );
    if !txn.note.is_empty() {
        let _ = write!(line, "  {}", txn.note);
    }
    line
}

pub fn transactions(title: &str, list: &[&Transaction], symbol: &str) -> String {
    let mut out = String::new();
    heading(&mut out, title);
    if list.is_empty() {
        let _ = writeln!(out, "No transactions in this window.");
    }
    for txn in list {
        let _ = writeln!(out, "{}", transaction_line(txn, symbol));
    }
    out
}

pub fn config(config: &Config) -> String {
    let mut out = String::new();
    heading(&mut out, "Configuration");
    for key in Config::KEYS {
        let value = config.get(key).unwrap_or_default();
        let _ = writeln!(out, "{:<18}{}", key, value);
    }
    out
}

pub fn version(meta: &BuildMetadata) -> String {
    let mut out = String::new();
    heading(&mut out, format!("Budget Rule {}", meta.version));
    let _ = writeln!(out, "  Build hash   : {} ({})", meta.git_hash, meta.git_status);
    let _ = writeln!(out, "  Built at     : {}", meta.timestamp);
    let _ = writeln!(out, "  Target       : {}", meta.target);
    let _ = writeln!(out, "  Profile      : {}", meta.profile);
    let _ = writeln!(out, "  Rustc        : {}", meta.rustc);
    out
}
