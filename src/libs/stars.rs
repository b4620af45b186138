//! Star rating value rules: a bounded value snapped to a step grid, shown as
//! [`STAR_COUNT`] partially filled stars.

use super::numeric::NumberConfigError;

pub const STAR_COUNT: usize = 10;

/// Float noise left after snapping (`0.1 * 34.0`) is rounded away at this scale.
const SNAP_PRECISION: f64 = 1e9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarRating {
    min: f64,
    max: f64,
    step: f64,
}

impl Default for StarRating {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: STAR_COUNT as f64,
            step: 0.1,
        }
    }
}

impl StarRating {
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self, NumberConfigError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(NumberConfigError::InvalidStep(step));
        }
        for bound in [min, max] {
            if !bound.is_finite() {
                return Err(NumberConfigError::NonFiniteBound(bound));
            }
        }
        if min > max {
            return Err(NumberConfigError::InvertedBounds { min, max });
        }
        Ok(Self { min, max, step })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Nearest value on the step grid (anchored at `min`), clamped to the bounds.
    pub fn snap(&self, value: f64) -> f64 {
        let steps = ((value - self.min) / self.step).round();
        let snapped = self.min + steps * self.step;
        let snapped = (snapped * SNAP_PRECISION).round() / SNAP_PRECISION;
        snapped.clamp(self.min, self.max)
    }

    pub fn step_up(&self, value: f64) -> f64 {
        self.snap(value + self.step)
    }

    pub fn step_down(&self, value: f64) -> f64 {
        self.snap(value - self.step)
    }

    /// Fill of the star at `index`, in percent.
    pub fn fill_percent(value: f64, index: usize) -> u8 {
        ((value - index as f64).clamp(0.0, 1.0) * 100.0).round() as u8
    }

    pub fn fills(value: f64) -> [u8; STAR_COUNT] {
        std::array::from_fn(|i| Self::fill_percent(value, i))
    }
}
