use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sample / Curve – one residual site-response curve
// ---------------------------------------------------------------------------

/// A single (period, response, standard error) row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub period: f64,
    pub response: f64,
    pub standard_error: f64,
}

/// A residual site-response curve stored column-wise, sorted by period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Oscillation period in seconds (x).
    pub period: Vec<f64>,
    /// Residual site response (y) – same length as `period`.
    pub response: Vec<f64>,
    /// Standard error of `response` – same length as `period`.
    pub standard_error: Vec<f64>,
}

impl Curve {
    pub fn new(period: Vec<f64>, response: Vec<f64>, standard_error: Vec<f64>) -> Self {
        Self {
            period,
            response,
            standard_error,
        }
    }

    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut curve = Curve::default();
        for s in samples {
            curve.push(s);
        }
        curve
    }

    pub fn push(&mut self, s: Sample) {
        self.period.push(s.period);
        self.response.push(s.response);
        self.standard_error.push(s.standard_error);
    }

    /// Row view; stops at the shortest column.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.period
            .iter()
            .zip(&self.response)
            .zip(&self.standard_error)
            .map(|((&period, &response), &standard_error)| Sample {
                period,
                response,
                standard_error,
            })
    }

    pub fn len(&self) -> usize {
        self.period.len()
    }

    pub fn is_empty(&self) -> bool {
        self.period.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CurveSet – every curve read from one file
// ---------------------------------------------------------------------------

/// A curve tagged with the site it was recorded at.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteCurve {
    pub site: String,
    pub curve: Curve,
}

#[derive(Debug, Clone, Default)]
pub struct CurveSet {
    pub curves: Vec<SiteCurve>,
}

impl CurveSet {
    pub fn from_curves(curves: Vec<SiteCurve>) -> Self {
        CurveSet { curves }
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn get(&self, site: &str) -> Option<&SiteCurve> {
        self.curves.iter().find(|c| c.site == site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_round_trip_through_columns() {
        let rows = [
            Sample { period: 0.1, response: 0.2, standard_error: 0.05 },
            Sample { period: 0.2, response: -0.1, standard_error: 0.07 },
        ];
        let curve = Curve::from_samples(rows);
        assert_eq!(curve.len(), 2);
        assert_eq!(curve.period, vec![0.1, 0.2]);
        assert_eq!(curve.samples().collect::<Vec<_>>(), rows.to_vec());
    }

    #[test]
    fn curve_set_lookup_by_site() {
        let set = CurveSet::from_curves(vec![
            SiteCurve { site: "A".into(), curve: Curve::default() },
            SiteCurve { site: "B".into(), curve: Curve::new(vec![1.0], vec![0.0], vec![0.1]) },
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("B").map(|c| c.curve.len()), Some(1));
        assert!(set.get("C").is_none());
    }
}
