use serde::Serialize;

use crate::config::{SignificanceWindow, Thresholds};
use crate::data::filter::mean;
use crate::error::{Result, degenerate, invalid};

use super::plateau::{Bound, grow_left, grow_right};
use super::segmenter::Segment;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Outcome of the three acceptance tests for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Criteria {
    pub amplitude: bool,
    pub width: bool,
    pub significance: bool,
}

impl Criteria {
    pub fn all(&self) -> bool {
        self.amplitude && self.width && self.significance
    }

    /// `[amplitude, width, significance]`.
    pub fn as_array(&self) -> [bool; 3] {
        [self.amplitude, self.width, self.significance]
    }
}

/// A local maximum of the step values, its tails and the acceptance verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakResult {
    /// Segment index of the left tail (`stepl`).
    pub left: Bound,
    /// Segment index of the peak step (`m`).
    pub peak: usize,
    /// Segment index of the right tail (`stepr`).
    pub right: Bound,
    pub criteria: Criteria,
    pub accepted: bool,
    /// `value[m] - max(value[stepl], value[stepr])`.
    pub amplitude_margin: f64,
    /// Right edge of the left tail (`Tl`).
    pub period_left: f64,
    /// Left edge of the right tail (`Tr`).
    pub period_right: f64,
    /// `ln(Tr) - ln(Tl)`.
    pub log_width: f64,
    pub k_left: f64,
    pub k_right: f64,
}

impl PeakResult {
    pub fn stepl(&self) -> usize {
        self.left.index
    }

    pub fn stepr(&self) -> usize {
        self.right.index
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Find every strict local maximum among the segment values and test it,
/// taking the significance means over the whole curve.
pub fn evaluate(
    periods: &[f64],
    responses: &[f64],
    standard_errors: &[f64],
    segments: &[Segment],
    thresholds: &Thresholds,
) -> Result<Vec<PeakResult>> {
    evaluate_with(
        periods,
        responses,
        standard_errors,
        segments,
        thresholds,
        SignificanceWindow::FullCurve,
    )
}

/// [`evaluate`] with a choice of significance window.
///
/// Candidates come out in ascending peak order. Overlapping tails of
/// neighbouring candidates are kept as they are.
pub fn evaluate_with(
    periods: &[f64],
    responses: &[f64],
    standard_errors: &[f64],
    segments: &[Segment],
    thresholds: &Thresholds,
    window: SignificanceWindow,
) -> Result<Vec<PeakResult>> {
    if periods.len() != responses.len() || periods.len() != standard_errors.len() {
        return Err(invalid(format!(
            "column lengths differ: period={}, response={}, standard_error={}",
            periods.len(),
            responses.len(),
            standard_errors.len()
        )));
    }
    thresholds.validate()?;
    if let Some(i) = standard_errors.iter().position(|&s| s < 0.0) {
        return Err(degenerate(format!(
            "row {i}: negative standard error {}",
            standard_errors[i]
        )));
    }

    if segments.len() < 3 {
        return Ok(Vec::new());
    }

    let full = WindowMeans::over(responses, standard_errors);

    let values: Vec<f64> = segments.iter().map(|s| s.value).collect();
    let log_widths: Vec<f64> = segments.iter().map(Segment::log_width).collect();

    let mut out = Vec::new();
    for m in 1..values.len() - 1 {
        let is_local_max = values[m - 1] < values[m] && values[m] > values[m + 1];
        if !is_local_max {
            continue;
        }

        let left = grow_left(&values, &log_widths, m, thresholds.step_thres);
        let right = grow_right(&values, &log_widths, m, thresholds.step_thres);

        let amplitude_margin = values[m] - values[left.index].max(values[right.index]);

        let period_left = segments[left.index].x2;
        let period_right = segments[right.index].x1;
        let log_width = period_right.ln() - period_left.ln();

        let (k_left, k_right) = match window {
            SignificanceWindow::FullCurve => {
                if full.standard_error.is_nan() || full.standard_error <= 0.0 {
                    return Err(degenerate(format!(
                        "mean standard error is {}, significance ratio undefined",
                        full.standard_error
                    )));
                }
                let k = full.k(values[m]);
                (k, k)
            }
            SignificanceWindow::Plateau => {
                let l = WindowMeans::within(periods, responses, standard_errors, &segments[left.index])?;
                let r = WindowMeans::within(periods, responses, standard_errors, &segments[right.index])?;
                (l.k(values[m]), r.k(values[m]))
            }
        };

        let criteria = Criteria {
            amplitude: amplitude_margin >= thresholds.amp_thres,
            width: log_width <= thresholds.wid_thres,
            // NaN (an empty window) fails.
            significance: k_left >= thresholds.k_thres && k_right >= thresholds.k_thres,
        };
        let accepted = criteria.all();

        log::debug!(
            "candidate m={m}: stepl={} ({:?}) stepr={} ({:?}) margin={amplitude_margin:.4} \
             width={log_width:.4} k=({k_left:.4}, {k_right:.4}) criteria={:?} accepted={accepted}",
            left.index,
            left.stop,
            right.index,
            right.stop,
            criteria.as_array(),
        );

        out.push(PeakResult {
            left,
            peak: m,
            right,
            criteria,
            accepted,
            amplitude_margin,
            period_left,
            period_right,
            log_width,
            k_left,
            k_right,
        });
    }

    Ok(out)
}

/// Mean response (eta) and mean standard error over a set of samples.
#[derive(Debug, Clone, Copy)]
struct WindowMeans {
    response: f64,
    standard_error: f64,
}

impl WindowMeans {
    fn over(responses: &[f64], standard_errors: &[f64]) -> Self {
        Self {
            response: mean(responses),
            standard_error: mean(standard_errors),
        }
    }

    /// Samples whose period lies in the closed interval `[x1, x2]`.
    ///
    /// An empty window gives NaN means; a window whose mean standard error is
    /// zero is an error.
    fn within(
        periods: &[f64],
        responses: &[f64],
        standard_errors: &[f64],
        segment: &Segment,
    ) -> Result<Self> {
        let (mut r, mut s) = (Vec::new(), Vec::new());
        for i in 0..periods.len() {
            if periods[i] >= segment.x1 && periods[i] <= segment.x2 {
                r.push(responses[i]);
                s.push(standard_errors[i]);
            }
        }
        let means = Self::over(&r, &s);
        if !s.is_empty() && means.standard_error <= 0.0 {
            return Err(degenerate(format!(
                "zero mean standard error over periods [{}, {}]",
                segment.x1, segment.x2
            )));
        }
        Ok(means)
    }

    fn k(&self, peak_value: f64) -> f64 {
        (peak_value - self.response) / self.standard_error
    }
}
