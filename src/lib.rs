//! Identification of resonance peaks in residual site-response curves.
//!
//! A curve (period, response, standard error) is approximated by a pruned
//! regression tree, reduced to constant steps over period, and every strict
//! local maximum among the steps is grown into left/right tails and tested
//! for amplitude, width and statistical significance.

pub mod config;
pub mod data;
pub mod error;
pub mod peaks;
pub mod report;

pub use config::{DetectionConfig, SignificanceWindow, Thresholds};
pub use data::filter::{clean, validate};
pub use data::model::{Curve, CurveSet, Sample, SiteCurve};
pub use error::{PeakError, Result};
pub use peaks::evaluator::{Criteria, PeakResult, evaluate, evaluate_with};
pub use peaks::segmenter::{
    RegressionTreeFitter, Segment, Segmentation, StepFunction, StepFunctionFitter, segment,
    segment_with,
};
pub use report::PeakReport;

/// Run the whole pipeline on one curve: NaN screening, validation,
/// segmentation and candidate evaluation.
pub fn identify_peaks(curve: &Curve, config: &DetectionConfig) -> Result<PeakReport> {
    identify_peaks_with(&RegressionTreeFitter, curve, config)
}

/// [`identify_peaks`] with a caller-supplied step-function fitter.
pub fn identify_peaks_with<F: StepFunctionFitter + ?Sized>(
    fitter: &F,
    curve: &Curve,
    config: &DetectionConfig,
) -> Result<PeakReport> {
    config.validate()?;
    let cleaned = data::filter::clean_curve(curve)?;
    validate(&cleaned)?;

    let segmentation = segment_with(
        fitter,
        &cleaned.period,
        &cleaned.response,
        config.complexity,
        config.sample_count,
    )?;
    let candidates = evaluate_with(
        &cleaned.period,
        &cleaned.response,
        &cleaned.standard_error,
        &segmentation.segments(),
        &config.thresholds,
        config.significance,
    )?;

    Ok(PeakReport::new(cleaned, segmentation, candidates))
}
