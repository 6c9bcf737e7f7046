//! Following the active budget as other members change it

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use tracing::debug;

use crate::currency::format_money;
use crate::error::BudgetResult;
use crate::models::Currency;
use crate::storage::StoreEvent;
use crate::sync::{subscribe_all, unsubscribe_all, BudgetChanges, LiveState, LiveUpdate};

use super::context::CliContext;

#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between checks of the data directory
    #[arg(short, long, default_value = "2")]
    pub interval: u64,
    /// Stop after this many seconds (runs until interrupted when omitted)
    #[arg(long)]
    pub duration: Option<u64>,
}

pub fn handle_watch(ctx: &CliContext, args: WatchArgs) -> BudgetResult<()> {
    let user = ctx.user()?;
    let budget = ctx.active_budget(&user)?;
    let storage = ctx.storage();
    let currency = budget.currency;

    let (tx, rx) = mpsc::channel::<StoreEvent>();
    let subscriptions = subscribe_all(storage, budget.id, move |event: &StoreEvent| {
        let _ = tx.send(event.clone());
    })?;

    let mut live = LiveState::new(budget.id);
    println!("Watching '{}'. Press Ctrl+C to stop.", budget.name);

    let started = Instant::now();
    let interval = Duration::from_secs(args.interval.max(1));
    loop {
        for event in rx.try_iter() {
            report(&live.apply(&event), &live, currency);
        }

        if args
            .duration
            .is_some_and(|limit| started.elapsed() >= Duration::from_secs(limit))
        {
            break;
        }
        thread::sleep(interval);

        let reloaded = storage.refresh_if_changed()?;
        if !reloaded.is_empty() {
            debug!(collections = ?reloaded, "picked up changes");
        }
    }

    unsubscribe_all(storage, subscriptions)
}

fn report(update: &LiveUpdate, live: &LiveState, currency: Currency) {
    match update {
        LiveUpdate::Budget(changes) if changes.initial => {
            println!("Total balance: {}", format_money(live.total_balance(), currency));
        }
        LiveUpdate::Budget(changes) => report_budget(changes, live, currency),
        LiveUpdate::Transactions(changes) if !changes.initial && !changes.added.is_empty() => {
            for txn in live
                .transactions()
                .into_iter()
                .filter(|t| changes.added.contains(&t.id))
            {
                println!(
                    "New {}: {} {} by {}",
                    txn.kind,
                    format_money(txn.amount, currency),
                    txn.category,
                    txn.user_name
                );
            }
        }
        LiveUpdate::Categories(count) => debug!(count, "categories updated"),
        _ => {}
    }
}

fn report_budget(changes: &BudgetChanges, live: &LiveState, currency: Currency) {
    if changes.removed {
        println!("The budget was deleted.");
        return;
    }
    for member in &changes.joined {
        println!("{} joined the budget", member.name);
    }
    for member in &changes.left {
        println!("{} left the budget", member.name);
    }
    for change in &changes.balances {
        let delta = change.delta();
        let sign = if delta.is_negative() { "-" } else { "+" };
        println!(
            "{}: {} ({}{})",
            change.name,
            format_money(change.after, currency),
            sign,
            format_money(delta.abs(), currency)
        );
    }
    if !changes.is_empty() {
        println!("Total balance: {}", format_money(live.total_balance(), currency));
    }
}
