use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use lobster_energy::backtest::{self, MarketScenario};
use lobster_energy::forecast::{accuracy, model};
use lobster_energy::server;
use lobster_energy::{demand, MarketService, Settings};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lobster-energy", version, about = "UK energy procurement signals from BMRS prices")]
struct Cli {
    /// Config file (defaults to ./lobster.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the JSON API
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Half-hourly market summary
    Market {
        #[arg(long, default_value_t = 7)]
        days: u32,
        #[arg(long, default_value = "baseload")]
        product: String,
    },
    /// Current BUY/WAIT/HOLD signal
    Signal {
        #[arg(long, default_value = "baseload")]
        product: String,
    },
    /// Daily price forecast
    Forecast {
        #[arg(long, default_value_t = model::DEFAULT_HORIZON)]
        horizon: u32,
        #[arg(long, default_value = "baseload")]
        product: String,
    },
    /// Signal strategy against buying every day
    Backtest {
        /// Replay a synthetic scenario instead of fetching BMRS prices
        #[arg(long, value_enum)]
        synthetic: Option<MarketScenario>,
        #[arg(long, default_value_t = 28)]
        days: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Rolling forecast accuracy
    Accuracy {
        #[arg(long, default_value_t = accuracy::DEFAULT_DAYS)]
        days: u32,
        #[arg(long, default_value_t = accuracy::DEFAULT_HORIZON)]
        horizon: u32,
    },
    /// Weather impact on prices
    Weather,
    /// Synthetic site demand profile
    Demand {
        /// Site baseload in MW
        #[arg(long, default_value_t = 1.0)]
        baseload: f64,
        #[arg(long, default_value_t = demand::DEFAULT_DAYS)]
        days: u32,
    },
    /// Procurement tranches for a volume
    Recommend {
        /// Volume to procure in MWh
        #[arg(long, default_value_t = 1000.0)]
        volume: f64,
        #[arg(long, default_value = "next-quarter")]
        delivery_period: String,
    },
    /// Fixed rate against flexible purchasing
    Compare {
        /// Offered fixed rate in £/MWh
        #[arg(long)]
        fixed_rate: f64,
        /// Annual volume in MWh
        #[arg(long, default_value_t = 1000.0)]
        volume: f64,
        #[arg(long, default_value_t = 30)]
        horizon: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    // Synthetic backtests never touch the network
    if let Command::Backtest {
        synthetic: Some(scenario),
        days,
        seed,
    } = cli.command
    {
        tracing::info!("Backtesting synthetic {:?} market over {} days", scenario, days);
        let report = backtest::run_scenario(scenario, days, seed, Utc::now().date_naive())?;
        return print_json(&report);
    }

    if let Command::Serve { port: Some(port) } = cli.command {
        settings.server.port = port;
    }

    let service = MarketService::new(settings)?;

    match cli.command {
        Command::Serve { .. } => {
            let addr = service.settings().server.socket_addr()?;
            tracing::info!("🦞 Lobster Energy API starting");
            server::run_server(service, addr).await?;
        }
        Command::Market { days, product } => print_json(&service.market(days, &product).await?)?,
        Command::Signal { product } => print_json(&service.signal(&product).await?)?,
        Command::Forecast { horizon, product } => {
            print_json(&service.forecast(horizon, &product).await?)?
        }
        Command::Backtest { .. } => print_json(&service.backtest().await?)?,
        Command::Accuracy { days, horizon } => {
            print_json(&service.accuracy(days, horizon).await?)?
        }
        Command::Weather => print_json(&service.weather().await?)?,
        Command::Demand { baseload, days } => print_json(&service.demand(baseload, days).await?)?,
        Command::Recommend {
            volume,
            delivery_period,
        } => print_json(&service.recommendations(volume, &delivery_period).await?)?,
        Command::Compare {
            fixed_rate,
            volume,
            horizon,
        } => print_json(&service.compare(fixed_rate, volume, horizon).await?)?,
    }

    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lobster_energy=info"));

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
