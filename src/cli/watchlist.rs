use super::ui;
use crate::core::AssetRef;
use crate::core::portfolio::{ItemId, WatchlistItem};
use crate::store::collection::UserCollection;
use anyhow::Result;
use comfy_table::Cell;

pub fn watchlist_table(items: &[WatchlistItem]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Symbol"),
        ui::header_cell("Type"),
        ui::header_cell("Added"),
    ]);

    for item in items {
        table.add_row(vec![
            Cell::new(item.id.as_str()),
            Cell::new(&item.symbol),
            Cell::new(item.asset_class.to_string()),
            Cell::new(item.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Watchlist", ui::StyleType::Title),
        table
    )
}

pub async fn list(watchlist: &UserCollection<WatchlistItem>) -> Result<()> {
    let items = watchlist.list().await?;
    if items.is_empty() {
        println!(
            "{}",
            ui::style_text("Your watchlist is empty.", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    println!("{}", watchlist_table(&items));
    Ok(())
}

pub async fn add(watchlist: &UserCollection<WatchlistItem>, asset: AssetRef) -> Result<()> {
    let item = watchlist.create(asset).await?;
    println!(
        "{} ({} {})",
        ui::style_text("Added to watchlist!", ui::StyleType::Success),
        item.symbol,
        item.id
    );
    Ok(())
}

pub async fn remove(watchlist: &UserCollection<WatchlistItem>, id: &ItemId) -> Result<()> {
    if !watchlist.delete(id).await? {
        anyhow::bail!("No watchlist item with id {id}");
    }
    println!(
        "{}",
        ui::style_text("Removed from watchlist.", ui::StyleType::Success)
    );
    Ok(())
}
