pub mod pipeline;
pub mod simulate;

pub use pipeline::{
    clamp_horizon, run_forecast, Forecast, SeriesPoints, HISTORY_CONTEXT, MAX_HORIZON, MIN_HORIZON,
};
pub use simulate::SimulationState;
