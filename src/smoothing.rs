//! Optional smoothing of pose translations.
//!
//! Last-sample-wins calibration plus raw per-frame translations make the
//! direction signal sensitive to detector jitter. A small moving-average
//! window over the translation vector takes the edge off without adding
//! noticeable latency. Disabled by default.

use opencv::core::Vec3d;
use std::collections::VecDeque;

/// Moving-average smoother for pose translations
pub struct TranslationSmoother {
    window_size: usize,
    history: VecDeque<Vec3d>,
}

impl TranslationSmoother {
    /// Create a smoother with the given window size (clamped to at least 1)
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window_size,
            history: VecDeque::with_capacity(window_size),
        }
    }

    /// Push a translation and return the mean over the current window
    pub fn apply(&mut self, translation: Vec3d) -> Vec3d {
        if self.history.len() >= self.window_size {
            self.history.pop_front();
        }
        self.history.push_back(translation);

        let n = self.history.len() as f64;
        let mut mean = Vec3d::default();
        for sample in &self.history {
            for i in 0..3 {
                mean[i] += sample[i];
            }
        }
        for i in 0..3 {
            mean[i] /= n;
        }
        mean
    }

    /// Clear the window, e.g. on re-calibration
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_over_window() {
        let mut smoother = TranslationSmoother::new(3);

        let first = smoother.apply(Vec3d::from([10.0, 20.0, 30.0]));
        assert_eq!(first, Vec3d::from([10.0, 20.0, 30.0]));

        let second = smoother.apply(Vec3d::from([20.0, 30.0, 40.0]));
        assert_eq!(second, Vec3d::from([15.0, 25.0, 35.0]));

        smoother.apply(Vec3d::from([30.0, 40.0, 50.0]));
        // Window full: oldest sample drops out
        let fourth = smoother.apply(Vec3d::from([40.0, 50.0, 60.0]));
        assert_eq!(fourth, Vec3d::from([30.0, 40.0, 50.0]));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut smoother = TranslationSmoother::new(4);
        smoother.apply(Vec3d::from([100.0, 100.0, 100.0]));
        smoother.reset();

        let after = smoother.apply(Vec3d::from([2.0, 2.0, 2.0]));
        assert_eq!(after, Vec3d::from([2.0, 2.0, 2.0]));
    }

    #[test]
    fn test_zero_window_clamped() {
        let mut smoother = TranslationSmoother::new(0);
        let out = smoother.apply(Vec3d::from([1.0, 2.0, 3.0]));
        assert_eq!(out, Vec3d::from([1.0, 2.0, 3.0]));
    }
}
