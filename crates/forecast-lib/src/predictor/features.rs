//! Feature preparation for model inference
//!
//! Trained models consume the trailing seven values either directly as a
//! sequence or as engineered lag and rolling-window statistics.

/// Number of trailing values both model layouts are built from
pub const SEQUENCE_LEN: usize = 7;

/// Number of engineered features for tabular models
pub const NUM_TABULAR_FEATURES: usize = 7;

/// Mean, maximum and population standard deviation over a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingStats {
    pub mean: f64,
    pub max: f64,
    pub std: f64,
}

/// Statistics over the last `window` values, `None` if there are fewer
pub fn rolling_stats(values: &[f64], window: usize) -> Option<RollingStats> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    let mean = tail.iter().sum::<f64>() / window as f64;
    let max = tail.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window as f64;

    Some(RollingStats {
        mean,
        max,
        std: variance.sqrt(),
    })
}

/// Engineered features from the last [`SEQUENCE_LEN`] values.
///
/// Order: lag 1, lag 3, lag 7, rolling mean 3, rolling mean 7,
/// rolling max 7, rolling std 7.
pub fn tabular_features(values: &[f64]) -> Option<[f64; NUM_TABULAR_FEATURES]> {
    if values.len() < SEQUENCE_LEN {
        return None;
    }
    let window = &values[values.len() - SEQUENCE_LEN..];
    let roll3 = rolling_stats(window, 3)?;
    let roll7 = rolling_stats(window, SEQUENCE_LEN)?;

    Some([
        window[SEQUENCE_LEN - 1],
        window[SEQUENCE_LEN - 3],
        window[0],
        roll3.mean,
        roll7.mean,
        roll7.max,
        roll7.std,
    ])
}
