//! Operator CLI for inspecting and funding the exchange and the bots' ladders.
//!
//! Uses the same config file and credentials as the bot runner.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use lqbot_bot::{ctl, AppConfig, Application};
use lqbot_mm::{generate_ladder, BalanceSnapshot};
use rust_decimal::Decimal;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect exchange state and bot ladders", long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LQBOT_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List markets and their precisions
    Markets,
    /// Show balances of a configured user
    Balances {
        #[arg(long)]
        user: String,
    },
    /// Show resting orders of a user on a market
    Orders {
        #[arg(long)]
        user: String,
        #[arg(long)]
        market: String,
    },
    /// Cancel every resting order of a user on a market
    CancelAll {
        #[arg(long)]
        user: String,
        #[arg(long)]
        market: String,
    },
    /// Credit an asset to a user so its bot can fund a ladder
    Deposit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: Decimal,
        /// Unique id of this deposit (defaults to the current time in ms)
        #[arg(long)]
        business_id: Option<u64>,
    },
    /// Make the exchange reload its market definitions (admin only)
    ReloadMarkets {
        /// Configured user with the admin role
        #[arg(long)]
        admin: String,
        /// Re-read every definition instead of only new ones
        #[arg(long)]
        from_scratch: bool,
    },
    /// Compute a bot's ladder from live balances without submitting it
    PrintLadder {
        /// Bot name (`user:MARKET`) or market name
        #[arg(long)]
        bot: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    lqbot_telemetry::init_logging()?;

    let config = AppConfig::load(args.config)?;
    config.validate()?;
    let app = Application::new(config)?;
    let gateway = app.gateway();

    match args.command {
        Command::Markets => {
            app.connect().await?;
            println!("{:<16} {:>6} {:>6} {:>12}", "MARKET", "PRICE", "AMOUNT", "MIN_AMOUNT");
            for name in app.markets().market_names() {
                if let Some(m) = app.markets().get(&name) {
                    println!(
                        "{:<16} {:>6} {:>6} {:>12}",
                        m.name,
                        m.price_precision,
                        m.amount_precision,
                        m.min_amount.to_string()
                    );
                }
            }
        }

        Command::Balances { user } => {
            let sheet = gateway.balance_query(&user).await?;
            let mut rows: Vec<_> = sheet.iter().collect();
            rows.sort_by(|a, b| a.0.cmp(b.0));
            println!("{:<10} {:>24} {:>24} {:>24}", "ASSET", "AVAILABLE", "FROZEN", "TOTAL");
            for (asset, b) in rows {
                println!(
                    "{:<10} {:>24} {:>24} {:>24}",
                    asset,
                    b.available.to_string(),
                    b.frozen.to_string(),
                    b.total().to_string()
                );
            }
        }

        Command::Orders { user, market } => {
            let orders = gateway.order_query(&user, &market).await?;
            println!("{}", serde_json::to_string_pretty(&orders)?);
        }

        Command::CancelAll { user, market } => {
            let total = gateway.order_cancel_all(&user, &market).await?;
            println!("cancelled {total} orders for {user} on {market}");
        }

        Command::Deposit {
            user,
            asset,
            amount,
            business_id,
        } => {
            let business_id =
                business_id.unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64);
            let balance =
                ctl::deposit(gateway.as_ref(), &user, &asset, amount, business_id).await?;
            println!(
                "{user} {asset}: available {} frozen {} (business_id {business_id})",
                balance.available, balance.frozen
            );
        }

        Command::ReloadMarkets {
            admin,
            from_scratch,
        } => {
            app.connect().await?;
            let count =
                ctl::reload_markets(gateway.as_ref(), app.markets(), &admin, from_scratch).await?;
            println!("reloaded, {count} markets");
        }

        Command::PrintLadder { bot } => {
            let ladder = app
                .config()
                .find_bot(&bot)
                .ok_or_else(|| anyhow!("no bot matches {bot}"))?
                .clone();
            app.connect().await?;
            let market = app.markets().require(&ladder.market())?;
            let sheet = gateway.balance_query(&ladder.user_id).await?;
            let snapshot = BalanceSnapshot::from_sheet(&sheet, &ladder.quote, &ladder.base);

            println!(
                "{}: {} {} / {} {}",
                lqbot_bot::bot_name(&ladder),
                snapshot.quote_total,
                snapshot.quote_asset,
                snapshot.base_total,
                snapshot.base_asset
            );
            let orders =
                generate_ladder(&ladder, &market, snapshot.quote_total, snapshot.base_total)?;
            println!("{:<4} {:<4} {:>20} {:>20}", "TIER", "SIDE", "PRICE", "AMOUNT");
            for (i, order) in orders.iter().enumerate() {
                println!(
                    "{:<4} {:<4} {:>20} {:>20}",
                    i / 2,
                    order.side.to_string(),
                    order.price.to_string(),
                    order.amount.to_string()
                );
            }
        }
    }

    Ok(())
}
