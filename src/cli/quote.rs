use super::ui;
use crate::core::band::{self, PriceBand};
use crate::core::{AssetRef, PriceQuote, PriceResolver, Timeframe};
use anyhow::Result;
use comfy_table::Cell;

/// Header and row cells for a quote, with its stop-loss and sell-point when a band was
/// computed.
fn quote_cells(quote: &PriceQuote, band: Option<(f64, PriceBand)>) -> (Vec<Cell>, Vec<Cell>) {
    let mut header = vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Type"),
        ui::header_cell("Timeframe"),
        ui::header_cell("As Of"),
        ui::header_cell("Price"),
    ];
    let mut row = vec![
        Cell::new(&quote.asset.symbol),
        Cell::new(quote.asset.asset_class.to_string()),
        Cell::new(quote.timeframe.to_string()),
        Cell::new(quote.as_of.as_deref().unwrap_or("latest")),
        ui::amount_cell(quote.price),
    ];

    if let Some((volatility, band)) = band {
        header.extend([
            ui::header_cell("Volatility"),
            ui::header_cell("Stop-Loss"),
            ui::header_cell("Sell-Point"),
        ]);
        row.extend([
            Cell::new(format!("{volatility}%")),
            ui::amount_cell(band.stop_loss),
            ui::amount_cell(band.sell_point),
        ]);
    }

    (header, row)
}

pub fn quote_table(quote: &PriceQuote, band: Option<(f64, PriceBand)>) -> String {
    let (header, row) = quote_cells(quote, band);
    let mut table = ui::new_styled_table();
    table.set_header(header);
    table.add_row(row);
    table.to_string()
}

async fn fetch_quote(
    resolver: &(dyn PriceResolver + Send + Sync),
    asset: &AssetRef,
    timeframe: Timeframe,
) -> Result<PriceQuote> {
    let spinner = ui::new_spinner(format!("Fetching {asset} price..."));
    let result = resolver.resolve_price(asset, timeframe).await;
    spinner.finish_and_clear();
    Ok(result?)
}

pub async fn run(
    resolver: &(dyn PriceResolver + Send + Sync),
    asset: &AssetRef,
    timeframe: Timeframe,
) -> Result<()> {
    let quote = fetch_quote(resolver, asset, timeframe).await?;
    println!("{}", quote_table(&quote, None));
    Ok(())
}

/// Looks up the price and places a stop-loss and sell-point `volatility` percent around it.
pub async fn run_band(
    resolver: &(dyn PriceResolver + Send + Sync),
    asset: &AssetRef,
    timeframe: Timeframe,
    volatility: f64,
) -> Result<()> {
    band::validate_volatility(volatility)?;

    let quote = fetch_quote(resolver, asset, timeframe).await?;
    band::validate_band_inputs(quote.price, volatility)?;
    let price_band = band::compute_band(quote.price, volatility);
    println!("{}", quote_table(&quote, Some((volatility, price_band))));
    Ok(())
}
