pub mod rolling_max;
pub mod rolling_std;
pub mod rsi;
pub mod sma;

pub use rolling_max::RollingMax;
pub use rolling_std::RollingStd;
pub use rsi::Rsi;
pub use sma::Sma;
