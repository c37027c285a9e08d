use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use pricewatch::core::log::init_logging;
use pricewatch::core::{AssetClass, Timeframe};
use pricewatch::{AppCommand, PortfolioCommand, WatchlistCommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Sign in as this user instead of the configured one
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct AssetArgs {
    /// Ticker symbol, e.g. AAPL or BTC
    symbol: String,

    /// Asset type: stock or crypto
    #[arg(short, long = "asset", default_value = "stock")]
    asset_class: AssetClass,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Look up the price of a stock or crypto asset
    Quote {
        #[command(flatten)]
        asset: AssetArgs,

        /// realtime, 1min, 5min, 15min, daily, weekly or monthly
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
    },
    /// Calculate stop-loss and sell-point around the current price
    Band {
        #[command(flatten)]
        asset: AssetArgs,

        /// realtime, 1min, 5min, 15min, daily, weekly or monthly
        #[arg(short, long)]
        timeframe: Option<Timeframe>,

        /// Volatility in percent
        #[arg(long)]
        volatility: f64,
    },
    /// Manage your portfolio
    #[command(subcommand)]
    Portfolio(PortfolioCommands),
    /// Manage your watchlist
    #[command(subcommand)]
    Watchlist(WatchlistCommands),
    /// Summarize recent news for a symbol
    Insight {
        #[command(flatten)]
        asset: AssetArgs,
    },
}

#[derive(Subcommand)]
enum PortfolioCommands {
    /// Show holdings valued at current prices
    List,
    /// Add a holding
    Add {
        #[command(flatten)]
        asset: AssetArgs,

        /// Number of units held
        #[arg(short, long)]
        quantity: f64,

        /// Purchase price per unit
        #[arg(short, long)]
        price: f64,
    },
    /// Remove a holding by id
    Remove { id: String },
}

#[derive(Subcommand)]
enum WatchlistCommands {
    /// Show watched symbols
    List,
    /// Watch a symbol
    Add {
        #[command(flatten)]
        asset: AssetArgs,
    },
    /// Stop watching a symbol by id
    Remove { id: String },
}

impl From<PortfolioCommands> for PortfolioCommand {
    fn from(cmd: PortfolioCommands) -> PortfolioCommand {
        match cmd {
            PortfolioCommands::List => PortfolioCommand::List,
            PortfolioCommands::Add {
                asset,
                quantity,
                price,
            } => PortfolioCommand::Add {
                symbol: asset.symbol,
                asset_class: asset.asset_class,
                quantity,
                purchase_price: price,
            },
            PortfolioCommands::Remove { id } => PortfolioCommand::Remove { id },
        }
    }
}

impl From<WatchlistCommands> for WatchlistCommand {
    fn from(cmd: WatchlistCommands) -> WatchlistCommand {
        match cmd {
            WatchlistCommands::List => WatchlistCommand::List,
            WatchlistCommands::Add { asset } => WatchlistCommand::Add {
                symbol: asset.symbol,
                asset_class: asset.asset_class,
            },
            WatchlistCommands::Remove { id } => WatchlistCommand::Remove { id },
        }
    }
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Quote { asset, timeframe } => AppCommand::Quote {
                symbol: asset.symbol,
                asset_class: asset.asset_class,
                timeframe,
            },
            Commands::Band {
                asset,
                timeframe,
                volatility,
            } => AppCommand::Band {
                symbol: asset.symbol,
                asset_class: asset.asset_class,
                timeframe,
                volatility,
            },
            Commands::Portfolio(cmd) => AppCommand::Portfolio(cmd.into()),
            Commands::Watchlist(cmd) => AppCommand::Watchlist(cmd.into()),
            Commands::Insight { asset } => AppCommand::Insight {
                symbol: asset.symbol,
                asset_class: asset.asset_class,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => pricewatch::cli::setup::setup_at_path(path),
            None => pricewatch::cli::setup::setup(),
        },
        Some(cmd) => {
            pricewatch::run_command(cmd.into(), cli.config_path.as_deref(), cli.user.as_deref())
                .await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
