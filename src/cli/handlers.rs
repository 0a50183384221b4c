use std::path::Path;

use rule_config::{Config, ConfigManager};
use rule_core::{
    BalanceCheck, Clock, CoreError, FixedClock, RuleUpdate, SubmitOutcome, SystemClock,
    TimeWindow, TransactionDraft, WindowService, MAX_TRAILING_MONTHS,
};
use rule_domain::{AllocationRule, Transaction, TransactionKind};
use rule_storage_json::{open_stores, StoragePaths};
use tracing::debug;

use super::args::{
    AddArgs, Cli, Command, ConfigCommand, EditArgs, RuleCommand, StatusArgs, WindowArgs,
};
use super::{output, render};
use crate::errors::CliError;
use crate::session::{DashboardSession, SessionOptions};
use crate::utils::build_info;

struct Context {
    config: Config,
    session: DashboardSession,
}

impl Context {
    fn symbol(&self) -> &str {
        &self.config.currency_symbol
    }

    /// Refreshes the session and surfaces normalization warnings.
    fn refresh(&mut self) -> Result<(), CliError> {
        self.session.refresh()?;
        for warning in self.session.warnings() {
            output::warning(warning);
        }
        Ok(())
    }
}

/// Runs one parsed command line.
pub fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        data_dir,
        no_color,
        today,
        command,
    } = cli;

    if let Command::Version = command {
        print!("{}", render::version(&build_info::current()));
        return Ok(());
    }

    let data_root = data_dir.unwrap_or_else(Config::default_data_root);
    debug!(root = %data_root.display(), "using data directory");
    let manager = ConfigManager::with_base_dir(&data_root)?;
    let config = manager.load()?;
    output::set_color_enabled(config.ui_color_enabled && !no_color);

    let clock: Box<dyn Clock> = match today {
        Some(day) => Box::new(FixedClock(day)),
        None => Box::new(SystemClock),
    };

    match command {
        Command::Config(command) => config_command(&manager, config, command),
        Command::Version => Ok(()),
        command => {
            let mut context = open_context(&data_root, config, clock)?;
            match command {
                Command::Status(args) => status(&mut context, args),
                Command::Trend { months } => trend(&mut context, months),
                Command::List(args) => list(&mut context, args),
                Command::Add(args) => add(&mut context, args),
                Command::Edit(args) => edit(&mut context, args),
                Command::Delete { id } => delete(&mut context, &id),
                Command::Rule(command) => rule(&mut context, command),
                Command::Config(_) | Command::Version => Ok(()),
            }
        }
    }
}

fn open_context(
    data_root: &Path,
    config: Config,
    clock: Box<dyn Clock>,
) -> Result<Context, CliError> {
    let (transactions, rules) = open_stores(&StoragePaths::new(data_root))?;
    let options = SessionOptions::from_config(&config);
    let session = DashboardSession::new(Box::new(transactions), Box::new(rules), clock, options);
    Ok(Context { config, session })
}

/// Window requested on the command line, if any.
fn window_override(args: &WindowArgs) -> Option<TimeWindow> {
    if args.all {
        Some(TimeWindow::All)
    } else {
        args.month.map(TimeWindow::Month)
    }
}

fn apply_window(context: &mut Context, args: &WindowArgs) {
    if let Some(window) = window_override(args) {
        let mut options = context.session.options();
        options.window = Some(window);
        context.session.set_options(options);
    }
}

fn status(context: &mut Context, args: StatusArgs) -> Result<(), CliError> {
    apply_window(context, &args.window);
    context.refresh()?;
    let Some(report) = context.session.report() else {
        return Ok(());
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render::status(report, context.symbol()));
    }
    Ok(())
}

fn trend(context: &mut Context, months: Option<usize>) -> Result<(), CliError> {
    let months = months.unwrap_or(context.config.trailing_months);
    if !(1..=MAX_TRAILING_MONTHS).contains(&months) {
        return Err(CliError::InvalidInput(format!(
            "--months must be between 1 and {MAX_TRAILING_MONTHS}"
        )));
    }
    let mut options = context.session.options();
    options.trailing_months = months;
    context.session.set_options(options);
    context.refresh()?;
    if let Some(report) = context.session.report() {
        print!("{}", render::trend(&report.trend, context.symbol()));
    }
    Ok(())
}

fn list(context: &mut Context, args: WindowArgs) -> Result<(), CliError> {
    apply_window(context, &args);
    context.refresh()?;
    let Some(window) = context.session.report().map(|report| report.window) else {
        return Ok(());
    };
    let mut selected = WindowService::select(context.session.transactions(), window);
    selected.sort_by(|a, b| b.occurred_on.cmp(&a.occurred_on));
    print!(
        "{}",
        render::transactions(&window.to_string(), &selected, context.symbol())
    );
    Ok(())
}

fn add(context: &mut Context, args: AddArgs) -> Result<(), CliError> {
    if args.kind == TransactionKind::Income && args.bucket.is_some() {
        output::warning("Income is never bucketed; ignoring --bucket.");
    }
    context.refresh()?;
    let draft = TransactionDraft {
        kind: args.kind,
        category: args.category,
        amount: args.amount,
        date: args.date.unwrap_or_else(|| context.session.today()),
        note: args.note,
        bucket: args.bucket,
    };
    submit(context, &draft, None)
}

fn edit(context: &mut Context, args: EditArgs) -> Result<(), CliError> {
    context.refresh()?;
    let existing = context
        .session
        .transaction(&args.id)
        .cloned()
        .ok_or_else(|| CoreError::TransactionNotFound(args.id.clone()))?;
    let draft = merge_edit(&existing, &args)?;
    submit(context, &draft, Some(&args.id))
}

fn merge_edit(existing: &Transaction, args: &EditArgs) -> Result<TransactionDraft, CliError> {
    // stored amounts can be normalized down to zero, which a draft never accepts
    if args.amount.is_none() && existing.amount.is_zero() {
        return Err(CliError::InvalidInput(format!(
            "transaction {} has no amount; pass --amount to edit it",
            existing.id
        )));
    }
    let bucket = if args.clear_bucket {
        None
    } else {
        args.bucket.or(existing.bucket)
    };
    Ok(TransactionDraft {
        kind: args.kind.unwrap_or(existing.kind),
        category: args
            .category
            .clone()
            .unwrap_or_else(|| existing.category.clone()),
        amount: args.amount.unwrap_or(existing.amount),
        date: args.date.unwrap_or(existing.occurred_on),
        note: args.note.clone().or_else(|| Some(existing.note.clone())),
        bucket,
    })
}

fn submit(
    context: &mut Context,
    draft: &TransactionDraft,
    editing: Option<&str>,
) -> Result<(), CliError> {
    if editing.is_none() {
        if let Some(remaining) = context.session.live_remaining(draft.amount, draft.kind) {
            output::info(format!(
                "Balance after this expense: {}",
                render::money(context.symbol(), remaining)
            ));
        }
    }
    match context.session.submit(draft, editing)? {
        SubmitOutcome::Created => {
            output::success(format!(
                "Recorded {} of {} in {}.",
                draft.kind.label().to_lowercase(),
                render::money(context.symbol(), draft.amount),
                draft.category.trim()
            ));
        }
        SubmitOutcome::Updated { id } => output::success(format!("Updated transaction {id}.")),
        SubmitOutcome::Rejected(check) => return Err(rejection(context.symbol(), check)),
    }
    if let Some(report) = context.session.report() {
        output::info(format!(
            "Balance: {}",
            render::money(context.symbol(), report.totals.balance)
        ));
    }
    Ok(())
}

fn rejection(symbol: &str, check: BalanceCheck) -> CliError {
    match check {
        BalanceCheck::Rejected { balance, requested } => CliError::Rejected(format!(
            "Expense of {} exceeds the available balance of {}.",
            render::money(symbol, requested),
            render::money(symbol, balance)
        )),
        BalanceCheck::Allowed => CliError::Rejected("Transaction was not recorded.".into()),
    }
}

fn delete(context: &mut Context, id: &str) -> Result<(), CliError> {
    context.session.delete(id)?;
    output::success(format!("Deleted transaction {id}."));
    Ok(())
}

fn rule(context: &mut Context, command: RuleCommand) -> Result<(), CliError> {
    match command {
        RuleCommand::Show => {
            print!("{}", render::rule(&context.session.rule()?));
            Ok(())
        }
        RuleCommand::Set {
            needs,
            wants,
            savings,
        } => match context.session.apply_rule(AllocationRule::new(needs, wants, savings))? {
            RuleUpdate::Persisted(rule) => {
                output::success(format!(
                    "Allocation rule set to {}.",
                    render::rule_split(&rule)
                ));
                Ok(())
            }
            RuleUpdate::Rejected { total, .. } => Err(CliError::Rejected(format!(
                "Shares must add up to 100%, got {}. The rule was not saved.",
                render::percent(total)
            ))),
        },
    }
}

fn config_command(
    manager: &ConfigManager,
    mut config: Config,
    command: ConfigCommand,
) -> Result<(), CliError> {
    match command {
        ConfigCommand::Show => {
            print!("{}", render::config(&config));
            output::info(format!("Stored at {}", manager.config_path().display()));
        }
        ConfigCommand::Set { key, value } => {
            config.set(&key, &value)?;
            if manager.config_path().exists() {
                let backup = manager.backup(&manager.load()?)?;
                debug!(%backup, "previous config backed up");
            }
            manager.save(&config)?;
            output::success(format!(
                "{} set to {}.",
                key,
                config.get(&key).unwrap_or_default()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rule_domain::BudgetBucket;
    use rust_decimal_macros::dec;

    fn edit_args(id: &str) -> EditArgs {
        EditArgs {
            id: id.into(),
            kind: None,
            category: None,
            amount: None,
            date: None,
            note: None,
            bucket: None,
            clear_bucket: false,
        }
    }

    #[test]
    fn edit_keeps_unspecified_fields() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let existing = Transaction::expense("Rent", dec!(900), day, Some(BudgetBucket::Needs))
            .with_id("r1");

        let mut args = edit_args("r1");
        args.amount = Some(dec!(950));
        let draft = merge_edit(&existing, &args).unwrap();
        assert_eq!(draft.amount, dec!(950));
        assert_eq!(draft.category, "Rent");
        assert_eq!(draft.bucket, Some(BudgetBucket::Needs));

        args.clear_bucket = true;
        assert_eq!(merge_edit(&existing, &args).unwrap().bucket, None);
    }

    #[test]
    fn edit_of_zero_amount_record_needs_new_amount() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let existing = Transaction::expense("Refund", dec!(0), day, None).with_id("z1");

        let mut args = edit_args("z1");
        args.category = Some("Groceries".into());
        let err = merge_edit(&existing, &args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("--amount"));

        args.amount = Some(dec!(12));
        let draft = merge_edit(&existing, &args).unwrap();
        assert_eq!(draft.amount, dec!(12));
        assert_eq!(draft.category, "Groceries");
    }

    #[test]
    fn window_flags_override_default() {
        assert_eq!(window_override(&WindowArgs::default()), None);
        let all = WindowArgs {
            month: None,
            all: true,
        };
        assert_eq!(window_override(&all), Some(TimeWindow::All));
    }
}
