//! Stock price forecasting service.
//!
//! Fetches daily close prices, derives technical indicator features,
//! trains a small recurrent network per request, and rolls the model
//! forward to produce a multi-day price forecast served over HTTP.

pub mod calendar;
pub mod config;
pub mod error;
pub mod feature;
pub mod forecast;
pub mod indicator;
pub mod market;
pub mod model;
pub mod server;
