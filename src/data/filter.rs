use crate::error::{PeakError, Result, degenerate, invalid};

use super::model::Curve;

/// Fewest samples a regression tree is fitted on.
pub const MIN_SAMPLES: usize = 3;

// ---------------------------------------------------------------------------
// NaN screening
// ---------------------------------------------------------------------------

/// Drop every row in which any of the three columns is NaN.
///
/// Relative order of the surviving rows is preserved. Only the column lengths
/// are checked here; everything else is left to [`validate`].
pub fn clean(period: &[f64], response: &[f64], standard_error: &[f64]) -> Result<Curve> {
    check_lengths(period.len(), response.len(), standard_error.len())?;

    let mut out = Curve::default();
    for i in 0..period.len() {
        if period[i].is_nan() || response[i].is_nan() || standard_error[i].is_nan() {
            continue;
        }
        out.period.push(period[i]);
        out.response.push(response[i]);
        out.standard_error.push(standard_error[i]);
    }

    let dropped = period.len() - out.len();
    if dropped > 0 {
        log::warn!("dropped {dropped} of {} rows containing NaN", period.len());
    }
    Ok(out)
}

/// [`clean`] applied to an owned curve.
pub fn clean_curve(curve: &Curve) -> Result<Curve> {
    clean(&curve.period, &curve.response, &curve.standard_error)
}

// ---------------------------------------------------------------------------
// Fail-fast validation
// ---------------------------------------------------------------------------

/// Check a cleaned curve before anything is fitted.
///
/// * column lengths differ → `InvalidInput`
/// * fewer than [`MIN_SAMPLES`] rows → `InsufficientData`
/// * non-finite value, period ≤ 0, periods not strictly ascending → `InvalidInput`
/// * negative standard error → `DegenerateInput`
pub fn validate(curve: &Curve) -> Result<()> {
    check_lengths(curve.period.len(), curve.response.len(), curve.standard_error.len())?;

    if curve.len() < MIN_SAMPLES {
        return Err(PeakError::InsufficientData {
            found: curve.len(),
            required: MIN_SAMPLES,
        });
    }

    for (i, s) in curve.samples().enumerate() {
        if !s.period.is_finite() || !s.response.is_finite() || !s.standard_error.is_finite() {
            return Err(invalid(format!("row {i}: non-finite value {s:?}")));
        }
        if s.period <= 0.0 {
            return Err(invalid(format!("row {i}: period must be positive, got {}", s.period)));
        }
        if s.standard_error < 0.0 {
            return Err(degenerate(format!(
                "row {i}: negative standard error {}",
                s.standard_error
            )));
        }
    }

    if let Some(i) = curve.period.windows(2).position(|w| w[1] <= w[0]) {
        return Err(invalid(format!(
            "periods must be strictly ascending: period[{}]={} follows period[{i}]={}",
            i + 1,
            curve.period[i + 1],
            curve.period[i]
        )));
    }

    Ok(())
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn check_lengths(np: usize, nr: usize, ns: usize) -> Result<()> {
    if np != nr || np != ns {
        return Err(invalid(format!(
            "column lengths differ: period={np}, response={nr}, standard_error={ns}"
        )));
    }
    Ok(())
}
