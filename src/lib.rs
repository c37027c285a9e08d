pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{AssetClass, AssetRef, ItemId, NewPortfolioItem, Session, Timeframe, UserId};
use crate::providers::alphavantage::AlphaVantageProvider;
use crate::providers::gemini::GeminiProvider;
use crate::store::{DocumentStore, UserStore};
use anyhow::{Result, anyhow};
use tracing::{debug, info};

pub enum PortfolioCommand {
    List,
    Add {
        symbol: String,
        asset_class: AssetClass,
        quantity: f64,
        purchase_price: f64,
    },
    Remove {
        id: String,
    },
}

pub enum WatchlistCommand {
    List,
    Add {
        symbol: String,
        asset_class: AssetClass,
    },
    Remove {
        id: String,
    },
}

pub enum AppCommand {
    Quote {
        symbol: String,
        asset_class: AssetClass,
        timeframe: Option<Timeframe>,
    },
    Band {
        symbol: String,
        asset_class: AssetClass,
        timeframe: Option<Timeframe>,
        volatility: f64,
    },
    Portfolio(PortfolioCommand),
    Watchlist(WatchlistCommand),
    Insight {
        symbol: String,
        asset_class: AssetClass,
    },
}

/// Picks the requested timeframe, or the "current price" timeframe of the asset class.
fn resolve_timeframe(asset: &AssetRef, timeframe: Option<Timeframe>) -> Timeframe {
    timeframe.unwrap_or_else(|| Timeframe::current_for(asset.asset_class))
}

async fn require_user_store(
    store: &DocumentStore,
    session: &Session,
    action: &str,
) -> Result<UserStore> {
    store
        .for_session(session)
        .await?
        .ok_or_else(|| anyhow!("Please log in to {action}."))
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    user: Option<&str>,
) -> Result<()> {
    info!("pricewatch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        retries = config.retries,
        user = ?config.user,
        "Loaded config"
    );

    let session = Session::default();
    if let Some(user) = user.or(config.user.as_deref()) {
        session.sign_in(UserId::new(user)?);
    }

    let av = &config.providers.alphavantage;
    let resolver =
        AlphaVantageProvider::new(&av.base_url, &av.api_key).with_retries(config.retries);

    match command {
        AppCommand::Quote {
            symbol,
            asset_class,
            timeframe,
        } => {
            let asset = AssetRef::new(&symbol, asset_class)?;
            let timeframe = resolve_timeframe(&asset, timeframe);
            cli::quote::run(&resolver, &asset, timeframe).await
        }
        AppCommand::Band {
            symbol,
            asset_class,
            timeframe,
            volatility,
        } => {
            let asset = AssetRef::new(&symbol, asset_class)?;
            let timeframe = resolve_timeframe(&asset, timeframe);
            cli::quote::run_band(&resolver, &asset, timeframe, volatility).await
        }
        AppCommand::Insight {
            symbol,
            asset_class,
        } => {
            let asset = AssetRef::new(&symbol, asset_class)?;
            let gemini = &config.providers.gemini;
            let provider = GeminiProvider::new(&gemini.base_url, &gemini.model, &gemini.api_key)
                .with_retries(config.retries);
            cli::insight::run(&provider, &asset).await
        }
        AppCommand::Portfolio(command) => {
            let store = DocumentStore::open(&config.data_path()?)?;
            match command {
                PortfolioCommand::List => {
                    let user_store =
                        require_user_store(&store, &session, "view your portfolio").await?;
                    cli::portfolio::list(&user_store.portfolio, &resolver).await
                }
                PortfolioCommand::Add {
                    symbol,
                    asset_class,
                    quantity,
                    purchase_price,
                } => {
                    let user_store =
                        require_user_store(&store, &session, "add items to your portfolio")
                            .await?;
                    let draft =
                        NewPortfolioItem::new(&symbol, asset_class, quantity, purchase_price)?;
                    cli::portfolio::add(&user_store.portfolio, draft).await
                }
                PortfolioCommand::Remove { id } => {
                    let user_store =
                        require_user_store(&store, &session, "remove items from your portfolio")
                            .await?;
                    cli::portfolio::remove(&user_store.portfolio, &ItemId::from(id.as_str()))
                        .await
                }
            }
        }
        AppCommand::Watchlist(command) => {
            let store = DocumentStore::open(&config.data_path()?)?;
            match command {
                WatchlistCommand::List => {
                    let user_store =
                        require_user_store(&store, &session, "view your watchlist").await?;
                    cli::watchlist::list(&user_store.watchlist).await
                }
                WatchlistCommand::Add {
                    symbol,
                    asset_class,
                } => {
                    let user_store =
                        require_user_store(&store, &session, "add items to your watchlist")
                            .await?;
                    let asset = AssetRef::new(&symbol, asset_class)?;
                    cli::watchlist::add(&user_store.watchlist, asset).await
                }
                WatchlistCommand::Remove { id } => {
                    let user_store =
                        require_user_store(&store, &session, "remove items from your watchlist")
                            .await?;
                    cli::watchlist::remove(&user_store.watchlist, &ItemId::from(id.as_str()))
                        .await
                }
            }
        }
    }
}
