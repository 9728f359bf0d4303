pub mod builder;
pub mod scaler;
pub mod window;

pub use builder::{build_table, FeatureRow, FeatureTable, MIN_CLEAN_ROWS};
pub use scaler::{Scaler, ScalerPair, TargetScaler};
pub use window::{build_training_set, TrainingSet, MIN_SAMPLES, WINDOW};
