pub mod series;
pub mod yahoo;

pub use series::PriceSeries;

use chrono::NaiveDate;

use crate::error::ForecastError;

/// External source of daily closing prices.
///
/// Implementations return an empty series for unknown or unavailable symbols;
/// the pipeline decides whether that is fatal (primary symbol) or skippable
/// (auxiliary symbol).
pub trait PriceSource {
    fn fetch_daily(&self, symbol: &str, start: NaiveDate) -> Result<PriceSeries, ForecastError>;
}

/// Fixed map of auxiliary symbols whose returns accompany the target's
/// features. Symbols without an entry train on their own history alone.
pub fn auxiliary_symbols(symbol: &str) -> &'static [&'static str] {
    match symbol {
        "USDRUB=X" => &["EURRUB=X", "BZ=F", "GC=F"],
        "AAPL" => &["SPY", "GC=F"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auxiliary_map_covers_known_symbols() {
        assert_eq!(auxiliary_symbols("AAPL"), &["SPY", "GC=F"]);
        assert_eq!(auxiliary_symbols("USDRUB=X").len(), 3);
        assert!(auxiliary_symbols("MSFT").is_empty());
    }
}
