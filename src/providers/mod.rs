pub mod alphavantage;
pub mod gemini;
pub mod util;
