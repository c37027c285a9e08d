use super::ui;
use crate::core::PriceResolver;
use crate::core::portfolio::{ItemId, NewPortfolioItem, PortfolioItem};
use crate::core::valuation::{self, PortfolioValuation};
use crate::store::collection::UserCollection;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

impl PortfolioValuation {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("ID"),
            ui::header_cell("Symbol"),
            ui::header_cell("Type"),
            ui::header_cell("Quantity"),
            ui::header_cell("Purchase Price"),
            ui::header_cell("Current Price"),
            ui::header_cell("Value"),
            ui::header_cell("P/L"),
        ]);

        for result in &self.results {
            let item = &result.item;
            let current_price = if result.is_fallback() {
                Cell::new(format!("{:.2}*", result.current_price))
                    .set_alignment(CellAlignment::Right)
            } else {
                ui::amount_cell(result.current_price)
            };

            table.add_row(vec![
                Cell::new(item.id.as_str()),
                Cell::new(&item.symbol),
                Cell::new(item.asset_class.to_string()),
                Cell::new(format!("{}", item.quantity)),
                ui::amount_cell(item.purchase_price),
                current_price,
                ui::amount_cell(result.current_value),
                ui::profit_loss_cell(result.profit_loss),
            ]);
        }

        let mut output = format!("{}\n\n", ui::style_text("Portfolio", ui::StyleType::Title));
        output.push_str(&table.to_string());

        if self.results.iter().any(|r| r.is_fallback()) {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    "* price unavailable, valued at purchase price",
                    ui::StyleType::Subtle
                )
            ));
        }

        let total_profit_loss = self.total_profit_loss();
        let profit_loss_style = if total_profit_loss >= 0.0 {
            ui::StyleType::Success
        } else {
            ui::StyleType::Error
        };

        output.push_str(&format!(
            "\n\n{} {}",
            ui::style_text("Total Value:", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", self.total_value), ui::StyleType::TotalValue)
        ));
        output.push_str(&format!(
            "\n{} {:.2}",
            ui::style_text("Total Cost:", ui::StyleType::TotalLabel),
            self.total_cost
        ));
        output.push_str(&format!(
            "\n{} {}",
            ui::style_text("Total P/L:", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{total_profit_loss:.2}"), profit_loss_style)
        ));

        output
    }
}

pub async fn list(
    portfolio: &UserCollection<PortfolioItem>,
    resolver: &(dyn PriceResolver + Send + Sync),
) -> Result<()> {
    let items = portfolio.list().await?;
    if items.is_empty() {
        println!(
            "{}",
            ui::style_text("Your portfolio is empty.", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    let pb = ui::new_progress_bar(valuation::distinct_assets(&items).len() as u64);
    pb.set_message("Fetching prices...");
    let valuation = valuation::valuate(&items, resolver, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    println!("{}", valuation.display_as_table());
    Ok(())
}

pub async fn add(portfolio: &UserCollection<PortfolioItem>, draft: NewPortfolioItem) -> Result<()> {
    let item = portfolio.create(draft).await?;
    println!(
        "{} ({} {})",
        ui::style_text("Item added to portfolio!", ui::StyleType::Success),
        item.symbol,
        item.id
    );
    Ok(())
}

pub async fn remove(portfolio: &UserCollection<PortfolioItem>, id: &ItemId) -> Result<()> {
    if !portfolio.delete(id).await? {
        anyhow::bail!("No portfolio item with id {id}");
    }
    println!(
        "{}",
        ui::style_text("Item removed from portfolio.", ui::StyleType::Success)
    );
    Ok(())
}
