use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};

use crate::error::{Result, invalid};

// ---------------------------------------------------------------------------
// Acceptance thresholds
// ---------------------------------------------------------------------------

/// Thresholds of the plateau rule and the three acceptance criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Max log-width of a segment that still counts as part of a noisy plateau.
    pub step_thres: f64,
    /// Min margin between the peak step and the higher of its two tails.
    pub amp_thres: f64,
    /// Max log-width between the inner edges of the two tails.
    pub wid_thres: f64,
    /// Min significance ratio k.
    pub k_thres: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            step_thres: 0.65,
            amp_thres: 0.27,
            wid_thres: 2.3,
            k_thres: 0.9,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("step_thres", self.step_thres),
            ("amp_thres", self.amp_thres),
            ("wid_thres", self.wid_thres),
            ("k_thres", self.k_thres),
        ] {
            if !v.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {v}")));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Significance window
// ---------------------------------------------------------------------------

/// Which samples feed the mean response and mean standard error of the
/// significance ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceWindow {
    /// Means over the whole curve; left and right ratios are identical.
    #[default]
    FullCurve,
    /// Means over the samples inside the left/right tail segments.
    Plateau,
}

// ---------------------------------------------------------------------------
// Full detection configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Cost-complexity pruning parameter of the regression tree.
    pub complexity: f64,
    /// Number of log-spaced points the fitted step function is sampled at.
    pub sample_count: usize,
    pub thresholds: Thresholds,
    pub significance: SignificanceWindow,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            complexity: 0.0003,
            sample_count: 300,
            thresholds: Thresholds::default(),
            significance: SignificanceWindow::FullCurve,
        }
    }
}

impl DetectionConfig {
    /// Read a (possibly partial) JSON config; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> AnyResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DetectionConfig = serde_json::from_str(&text).context("parsing config JSON")?;
        config.validate().context("validating config")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.complexity.is_finite() || self.complexity < 0.0 {
            return Err(invalid(format!(
                "complexity must be finite and non-negative, got {}",
                self.complexity
            )));
        }
        if self.sample_count < 2 {
            return Err(invalid(format!(
                "sample_count must be at least 2, got {}",
                self.sample_count
            )));
        }
        self.thresholds.validate()
    }
}
