use serde::Serialize;

use crate::data::model::Curve;
use crate::peaks::evaluator::PeakResult;
use crate::peaks::segmenter::{Segment, Segmentation};

// ---------------------------------------------------------------------------
// Peak report
// ---------------------------------------------------------------------------

/// Everything computed for one curve, enough to plot the curve, the fitted
/// steps and the peak regions without re-running detection.
#[derive(Debug, Clone, Serialize)]
pub struct PeakReport {
    /// The curve after NaN screening.
    pub curve: Curve,
    pub segments: Vec<Segment>,
    /// Candidates in ascending peak order.
    pub candidates: Vec<PeakResult>,
    /// Whether any candidate was accepted.
    pub has_peak: bool,
}

impl PeakReport {
    pub fn new(curve: Curve, segmentation: Segmentation, candidates: Vec<PeakResult>) -> Self {
        let segments = segmentation.segments();
        let has_peak = candidates.iter().any(|c| c.accepted);
        Self {
            curve,
            segments,
            candidates,
            has_peak,
        }
    }

    /// Nodes and step values of the fitted segmentation.
    pub fn segmentation(&self) -> Segmentation {
        let mut nodes: Vec<f64> = self.segments.iter().map(|s| s.x1).collect();
        nodes.extend(self.segments.last().map(|s| s.x2));
        let values = self.segments.iter().map(|s| s.value).collect();
        Segmentation { nodes, values }
    }

    /// One verdict per candidate.
    pub fn peak_indicator(&self) -> Vec<bool> {
        self.candidates.iter().map(|c| c.accepted).collect()
    }

    pub fn accepted(&self) -> impl Iterator<Item = &PeakResult> {
        self.candidates.iter().filter(|c| c.accepted)
    }

    /// Period span `[x1 of stepl, x2 of stepr]` of every accepted peak.
    pub fn accepted_regions(&self) -> Vec<(f64, f64)> {
        self.accepted()
            .map(|c| (self.segments[c.stepl()].x1, self.segments[c.stepr()].x2))
            .collect()
    }

    /// One line for logs.
    pub fn summary(&self) -> String {
        let accepted = self.accepted().count();
        let mut s = format!(
            "{} samples, {} steps, {} candidates, {} accepted",
            self.curve.len(),
            self.segments.len(),
            self.candidates.len(),
            accepted
        );
        for c in self.accepted() {
            s.push_str(&format!(
                "; peak at T={:.3}-{:.3}s (margin {:.2}, k {:.2})",
                self.segments[c.peak].x1,
                self.segments[c.peak].x2,
                c.amplitude_margin,
                c.k_left.min(c.k_right)
            ));
        }
        s
    }
}
