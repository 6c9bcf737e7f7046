//! Exchange rate CLI commands

use clap::Subcommand;

use crate::currency::{format_money, HttpRateSource, RateOrigin, RateUpdate};
use crate::display::format::relative_time;
use crate::error::BudgetResult;
use crate::validation::parse_amount;

use super::budget::parse_currency;
use super::context::CliContext;

#[derive(Subcommand)]
pub enum RatesCommands {
    /// Show the rate table in use
    Show,

    /// Fetch fresh rates from the configured endpoint
    Refresh,

    /// Convert an amount between currencies
    Convert {
        amount: String,
        from: String,
        to: String,
    },
}

pub fn handle_rates_command(ctx: &CliContext, cmd: RatesCommands) -> BudgetResult<()> {
    let mut currency = ctx.currency()?;

    match cmd {
        RatesCommands::Show => {
            let rates = currency.rates();
            match (rates.origin, rates.updated_at) {
                (RateOrigin::Remote, Some(at)) => {
                    println!("Rates per 1 PLN, fetched {}", relative_time(at, chrono::Utc::now()))
                }
                _ => println!("Rates per 1 PLN (built-in table)"),
            }
            for info in currency.available() {
                let marker = if info.currency == currency.currency() { "*" } else { " " };
                println!(
                    " {} {} {:>3}  {:>10.4}  {}",
                    marker,
                    info.currency,
                    info.symbol,
                    info.rate,
                    info.currency.name()
                );
            }
        }

        RatesCommands::Refresh => {
            let source = HttpRateSource::new(ctx.settings().rates_endpoint.clone())?;
            let store = ctx.local_store()?;
            match currency.update_rates(&source, Some(&store)) {
                RateUpdate::Updated => println!("Exchange rates updated from {}", source.endpoint()),
                RateUpdate::Fallback => {
                    println!("Could not reach {}; using the built-in rates.", source.endpoint())
                }
            }
        }

        RatesCommands::Convert { amount, from, to } => {
            let amount = parse_amount(&amount)?;
            let from = parse_currency(&from)?;
            let to = parse_currency(&to)?;
            let converted = currency.convert(amount, from, to);
            println!("{} = {}", format_money(amount, from), format_money(converted, to));
        }
    }

    Ok(())
}
