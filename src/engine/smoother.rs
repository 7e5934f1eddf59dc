//! Exponential smoothing of the tracked joint angle.

/// Per-session exponential moving average over the raw elbow angle.
/// Suppresses single-frame jitter before the signal reaches the
/// hysteresis thresholds.
#[derive(Debug, Clone)]
pub struct AngleSmoother {
    alpha: f32,
    value: f32,
}

impl AngleSmoother {
    pub fn new(alpha: f32, seed: f32) -> Self {
        Self { alpha, value: seed }
    }

    /// Restart the average from a known rest angle. Called when a
    /// session locks in, so stale values from before lock-in never
    /// bleed into the counted signal.
    pub fn reseed(&mut self, value: f32) {
        self.value = value;
    }

    /// Fold one raw sample into the average and return the new value.
    pub fn push(&mut self, raw: f32) -> f32 {
        self.value = self.alpha * self.value + (1.0 - self.alpha) * raw;
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}
