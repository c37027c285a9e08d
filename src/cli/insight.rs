use super::ui;
use crate::core::{AssetRef, InsightProvider};
use anyhow::Result;

pub async fn run(provider: &(dyn InsightProvider + Send + Sync), asset: &AssetRef) -> Result<()> {
    let spinner = ui::new_spinner(format!("Fetching insights for {}...", asset.symbol));
    let result = provider.request_insight(asset).await;
    spinner.finish_and_clear();
    let summary = result?;

    println!(
        "{}\n\n{}\n\n{}",
        ui::style_text(&format!("{} news", asset.symbol), ui::StyleType::Title),
        summary,
        ui::style_text("Insights updated!", ui::StyleType::Success)
    );
    Ok(())
}
