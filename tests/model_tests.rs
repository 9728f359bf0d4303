use ndarray::{s, Array1, Array3};

use forecast_service::model::{GruRegressor, SequenceModel, EPOCHS};

const SAMPLES: usize = 48;
const STEPS: usize = 30;
const FEATURES: usize = 4;

/// Deterministic training set where the target is a smooth function of the
/// window's trailing rows, so a short fit can actually reduce the loss.
fn synthetic_training_set() -> (Array3<f64>, Array1<f64>) {
    let windows = Array3::from_shape_fn((SAMPLES, STEPS, FEATURES), |(i, t, f)| {
        ((i * 7 + t * 3 + f * 11) as f64 * 0.17).sin()
    });
    let targets = Array1::from_shape_fn(SAMPLES, |i| {
        let last = windows.slice(s![i, STEPS - 1, ..]);
        0.5 * last[0] - 0.25 * last[1]
    });
    (windows, targets)
}

fn mean_squared_error(model: &GruRegressor, windows: &Array3<f64>, targets: &Array1<f64>) -> f64 {
    let mut sum = 0.0;
    for i in 0..windows.shape()[0] {
        let diff = model.predict(windows.slice(s![i, .., ..])) - targets[i];
        sum += diff * diff;
    }
    sum / windows.shape()[0] as f64
}

#[test]
fn fit_runs_all_epochs_and_reports_finite_losses() {
    let (windows, targets) = synthetic_training_set();
    let mut model = GruRegressor::new(FEATURES);

    let report = model.fit(&windows, &targets).unwrap();

    assert_eq!(report.epochs, EPOCHS);
    assert!(report.train_loss.is_finite());
    assert!(report.val_loss.unwrap().is_finite());
}

#[test]
fn training_reduces_loss_over_initial_weights() {
    let (windows, targets) = synthetic_training_set();

    let untrained = GruRegressor::new(FEATURES);
    let before = mean_squared_error(&untrained, &windows, &targets);

    let mut model = GruRegressor::new(FEATURES);
    model.fit(&windows, &targets).unwrap();
    let after = mean_squared_error(&model, &windows, &targets);

    assert!(after < before, "loss did not improve: {before} -> {after}");
}

#[test]
fn same_seed_produces_identical_models() {
    let (windows, targets) = synthetic_training_set();

    let mut a = GruRegressor::new(FEATURES);
    let mut b = GruRegressor::new(FEATURES);
    a.fit(&windows, &targets).unwrap();
    b.fit(&windows, &targets).unwrap();

    for i in 0..SAMPLES {
        let pa = a.predict(windows.slice(s![i, .., ..]));
        let pb = b.predict(windows.slice(s![i, .., ..]));
        assert_eq!(pa, pb);
        assert!(pa.is_finite());
    }
}

#[test]
fn mismatched_sample_counts_are_rejected() {
    let (windows, _) = synthetic_training_set();
    let wrong = Array1::zeros(SAMPLES + 1);

    let mut model = GruRegressor::new(FEATURES);
    assert!(model.fit(&windows, &wrong).is_err());
}
