use serde::{Deserialize, Serialize};

use crate::data::filter::MIN_SAMPLES;
use crate::error::{PeakError, Result, invalid};

use super::tree::RegressionTree;

/// Points the fitted step function is sampled at unless configured otherwise.
pub const DEFAULT_SAMPLE_COUNT: usize = 300;

// ---------------------------------------------------------------------------
// Step-function seam
// ---------------------------------------------------------------------------

/// A piecewise-constant function that can be evaluated anywhere.
pub trait StepFunction {
    fn value_at(&self, x: f64) -> f64;
}

/// Anything that can fit a [`StepFunction`] to `(x, y)` pairs.
///
/// Larger `complexity` must give fewer, coarser steps.
pub trait StepFunctionFitter {
    fn fit_step_function(
        &self,
        x: &[f64],
        y: &[f64],
        complexity: f64,
    ) -> Result<Box<dyn StepFunction>>;
}

impl StepFunction for RegressionTree {
    fn value_at(&self, x: f64) -> f64 {
        self.predict(x)
    }
}

/// Fits a pruned CART regression tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionTreeFitter;

impl StepFunctionFitter for RegressionTreeFitter {
    fn fit_step_function(
        &self,
        x: &[f64],
        y: &[f64],
        complexity: f64,
    ) -> Result<Box<dyn StepFunction>> {
        let tree = RegressionTree::fit(x, y, complexity)?;
        log::debug!(
            "regression tree: {} samples, {} leaves after pruning (ccp_alpha={complexity})",
            x.len(),
            tree.leaf_count()
        );
        Ok(Box::new(tree))
    }
}

// ---------------------------------------------------------------------------
// Segmentation – the reduced step function
// ---------------------------------------------------------------------------

/// One constant step of the fitted function over periods `[x1, x2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub x2: f64,
    pub value: f64,
}

impl Segment {
    /// Natural-log width of the segment.
    pub fn log_width(&self) -> f64 {
        self.x2.ln() - self.x1.ln()
    }
}

/// Breakpoints and per-segment values; `nodes.len() == values.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub nodes: Vec<f64>,
    pub values: Vec<f64>,
}

impl Segmentation {
    pub fn segments(&self) -> Vec<Segment> {
        self.nodes
            .windows(2)
            .zip(&self.values)
            .map(|(w, &value)| Segment {
                x1: w[0],
                x2: w[1],
                value,
            })
            .collect()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Segmenter
// ---------------------------------------------------------------------------

/// Fit a regression tree of `responses` on `periods` and reduce it to
/// segments, sampling at [`DEFAULT_SAMPLE_COUNT`] log-spaced periods.
pub fn segment(periods: &[f64], responses: &[f64], complexity: f64) -> Result<Segmentation> {
    segment_with(
        &RegressionTreeFitter,
        periods,
        responses,
        complexity,
        DEFAULT_SAMPLE_COUNT,
    )
}

/// [`segment`] with an explicit fitter and sample count.
///
/// The model is fitted on the raw periods, then evaluated at `sample_count`
/// log-spaced periods spanning `[min(period), max(period)]`. Runs of equal
/// predictions collapse into one segment starting at the run's first sample;
/// the last sample closes the final segment, so nodes are strictly increasing.
pub fn segment_with<F: StepFunctionFitter + ?Sized>(
    fitter: &F,
    periods: &[f64],
    responses: &[f64],
    complexity: f64,
    sample_count: usize,
) -> Result<Segmentation> {
    if periods.len() != responses.len() {
        return Err(invalid(format!(
            "periods has {} values but responses has {}",
            periods.len(),
            responses.len()
        )));
    }
    if periods.len() < MIN_SAMPLES {
        return Err(PeakError::InsufficientData {
            found: periods.len(),
            required: MIN_SAMPLES,
        });
    }
    if let Some(p) = periods.iter().find(|p| !p.is_finite() || **p <= 0.0) {
        return Err(invalid(format!("periods must be finite and positive, got {p}")));
    }
    if let Some(i) = periods.windows(2).position(|w| w[1] <= w[0]) {
        return Err(invalid(format!(
            "periods must be strictly ascending: period[{}]={} follows period[{i}]={}",
            i + 1,
            periods[i + 1],
            periods[i]
        )));
    }
    if responses.iter().any(|r| !r.is_finite()) {
        return Err(invalid("responses must be finite"));
    }
    if sample_count < 2 {
        return Err(invalid(format!("sample_count must be at least 2, got {sample_count}")));
    }

    let lo = periods.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = periods.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo >= hi {
        return Err(invalid("periods span an empty range"));
    }

    let model = fitter.fit_step_function(periods, responses, complexity)?;
    let grid = log_space(lo, hi, sample_count);

    let mut nodes = Vec::new();
    let mut values: Vec<f64> = Vec::new();
    for &x in &grid {
        let v = model.value_at(x);
        if values.last() != Some(&v) {
            nodes.push(x);
            values.push(v);
        }
    }
    // A run that only starts at the last sample has zero width.
    if values.len() > 1 && nodes.last() == Some(&hi) {
        nodes.pop();
        values.pop();
    }
    nodes.push(hi);

    log::debug!("segmented {} samples into {} steps", periods.len(), values.len());
    Ok(Segmentation { nodes, values })
}

/// `n` points evenly spaced in log10 between `lo` and `hi`, endpoints exact.
pub fn log_space(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let (a, b) = (lo.log10(), hi.log10());
            let step = (b - a) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| 10f64.powf(a + step * i as f64)).collect();
            out[0] = lo;
            out[n - 1] = hi;
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<f64> {
        log_space(0.01, 10.0, n)
    }

    #[test]
    fn log_space_endpoints_and_ratio() {
        let g = log_space(0.01, 10.0, 4);
        assert_eq!(g[0], 0.01);
        assert_eq!(g[3], 10.0);
        assert!((g[1] - 0.1).abs() < 1e-12);
        assert!((g[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn flat_curve_is_single_segment() {
        let p = grid(50);
        let s = segment(&p, &[0.0; 50], 0.0003).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.nodes, vec![0.01, 10.0]);
    }

    #[test]
    fn bump_yields_three_contiguous_segments() {
        let p = grid(80);
        let r: Vec<f64> = p.iter().map(|&t| if (0.3..=0.6).contains(&t) { 2.0 } else { 0.0 }).collect();
        let s = segment(&p, &r, 0.0003).unwrap();
        assert_eq!(s.values, vec![0.0, 2.0, 0.0]);
        assert_eq!(s.nodes.len(), s.values.len() + 1);
        assert!(s.nodes.windows(2).all(|w| w[0] < w[1]));

        let segs = s.segments();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].x1, 0.01);
        assert_eq!(segs[2].x2, 10.0);
        for w in segs.windows(2) {
            assert_eq!(w[0].x2, w[1].x1);
        }
        assert!(segs[1].x1 > 0.25 && segs[1].x1 <= 0.31);
        assert!(segs[1].x2 > 0.55 && segs[1].x2 < 0.7);
    }

    #[test]
    fn higher_complexity_gives_fewer_segments() {
        let p = grid(60);
        let r: Vec<f64> = p
            .iter()
            .enumerate()
            .map(|(i, &t)| t.ln().sin() + if i % 2 == 0 { 0.05 } else { -0.05 })
            .collect();
        let fine = segment(&p, &r, 0.0).unwrap();
        let coarse = segment(&p, &r, 0.05).unwrap();
        assert!(coarse.len() < fine.len());
    }

    #[test]
    fn rejects_short_and_invalid_inputs() {
        assert_eq!(
            segment(&[0.1, 0.2], &[0.0, 1.0], 0.0),
            Err(PeakError::InsufficientData { found: 2, required: 3 })
        );
        assert!(matches!(
            segment(&[0.1, 0.2, 0.3], &[0.0, 1.0], 0.0),
            Err(PeakError::InvalidInput(_))
        ));
        assert!(matches!(
            segment(&[0.1, -0.2, 0.3], &[0.0, 1.0, 0.0], 0.0),
            Err(PeakError::InvalidInput(_))
        ));
        assert!(matches!(
            segment(&[0.3, 0.1, 0.2, 0.05], &[0.0, 1.0, 0.0, 1.0], 0.0),
            Err(PeakError::InvalidInput(_))
        ));
        assert!(matches!(
            segment(&[0.1, 0.2, 0.2], &[0.0, 1.0, 0.0], 0.0),
            Err(PeakError::InvalidInput(_))
        ));
    }

    struct Constant(f64);

    impl StepFunction for Constant {
        fn value_at(&self, _x: f64) -> f64 {
            self.0
        }
    }

    struct ConstantFitter;

    impl StepFunctionFitter for ConstantFitter {
        fn fit_step_function(
            &self,
            _x: &[f64],
            y: &[f64],
            _complexity: f64,
        ) -> Result<Box<dyn StepFunction>> {
            Ok(Box::new(Constant(y.iter().sum::<f64>() / y.len() as f64)))
        }
    }

    #[test]
    fn fitter_is_substitutable() {
        let p = grid(10);
        let s = segment_with(&ConstantFitter, &p, &[1.0; 10], 0.0, 25).unwrap();
        assert_eq!(s.values, vec![1.0]);
        assert_eq!(s.nodes.len(), 2);
    }
}
