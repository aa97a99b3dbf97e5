use cav_core::errors::{CavError, ErrorInfo, Stage};
use cav_harminv::BestMode;
use serde::{Deserialize, Serialize};

fn window_error(code: &str, message: impl Into<String>) -> CavError {
    CavError::InvalidInput(ErrorInfo::new(code, message).with_stage(Stage::SpectrumBuild))
}

fn default_points() -> usize {
    250
}

fn default_half_width_fraction() -> f64 {
    1.0 / 16.0
}

/// Frequency window shared by the reference and device runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxWindow {
    /// Window center in inverse solver length units.
    pub center: f64,
    /// Half of the window's full width.
    pub half_width: f64,
    /// Number of grid points.
    #[serde(default = "default_points")]
    pub points: usize,
}

impl FluxWindow {
    /// Creates a window and checks that it describes a usable grid.
    pub fn new(center: f64, half_width: f64, points: usize) -> Result<Self, CavError> {
        let window = Self {
            center,
            half_width,
            points,
        };
        window.validate()?;
        Ok(window)
    }

    /// Window centered on a best mode, `half_width = fraction * f_mode`.
    pub fn around(mode: &BestMode, fraction: f64, points: usize) -> Result<Self, CavError> {
        mode.validate()?;
        Self::new(mode.frequency, fraction * mode.frequency, points)
    }

    /// Window around a best mode with the default width (`f_mode / 16`) and 250 points.
    pub fn around_default(mode: &BestMode) -> Result<Self, CavError> {
        Self::around(mode, default_half_width_fraction(), default_points())
    }

    /// Checks the window parameters.
    pub fn validate(&self) -> Result<(), CavError> {
        if self.points == 0 {
            return Err(window_error("empty-grid", "flux window needs at least one point"));
        }
        if !self.center.is_finite() || !(self.center > 0.0) {
            return Err(window_error(
                "invalid-center",
                format!("flux window center must be positive, got {}", self.center),
            ));
        }
        if !self.half_width.is_finite() || self.half_width < 0.0 || self.half_width >= self.center
        {
            return Err(window_error(
                "invalid-half-width",
                format!(
                    "flux half-width must lie in [0, center), got {} for center {}",
                    self.half_width, self.center
                ),
            ));
        }
        Ok(())
    }

    /// Lowest grid frequency.
    pub fn min(&self) -> f64 {
        if self.points == 1 {
            self.center
        } else {
            self.center - self.half_width
        }
    }

    /// Highest grid frequency.
    pub fn max(&self) -> f64 {
        if self.points == 1 {
            self.center
        } else {
            self.center + self.half_width
        }
    }

    /// Frequency grid `f_i = center - half_width + i * 2 * half_width / (points - 1)`.
    pub fn grid(&self) -> Vec<f64> {
        if self.points == 1 {
            return vec![self.center];
        }
        let step = 2.0 * self.half_width / (self.points - 1) as f64;
        let start = self.center - self.half_width;
        (0..self.points).map(|i| start + i as f64 * step).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_spans_the_window_inclusively() {
        let window = FluxWindow::new(2.0, 0.5, 5).expect("window");
        assert_eq!(window.grid(), vec![1.5, 1.75, 2.0, 2.25, 2.5]);
    }

    #[test]
    fn single_point_grid_is_the_center() {
        let window = FluxWindow::new(1.6, 0.1, 1).expect("window");
        assert_eq!(window.grid(), vec![1.6]);
        assert_eq!(window.min(), window.max());
    }

    #[test]
    fn window_around_mode_uses_sixteenth_of_frequency() {
        let mode = BestMode {
            frequency: 1.6,
            q: 900.0,
            wavelength_nm: 625.0,
        };
        let window = FluxWindow::around_default(&mode).expect("window");
        assert!((window.half_width - 0.1).abs() < 1e-12);
        assert_eq!(window.points, 250);
    }
}
