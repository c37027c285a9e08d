pub mod insight;
pub mod portfolio;
pub mod quote;
pub mod setup;
pub mod ui;
pub mod watchlist;
