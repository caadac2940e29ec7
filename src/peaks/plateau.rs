//! Growth of a candidate peak step into its left and right tails.
//!
//! Each walk moves one segment at a time away from the peak and stops on the
//! first of: a rise in the step values, a segment wider than `step_thres`
//! (a stable tail in its own right), or the array boundary.
//!
//! The two walks are not mirror images. The left walk tests whether the
//! segment it steps onto is higher than the one it came from and never
//! inspects segment 0, whereas the right walk tests the segment beyond the
//! one it stands on and so does compare into the last segment.

use serde::Serialize;

/// Why a plateau walk terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stop {
    /// Values start rising again; the bound is the valley segment.
    Rise,
    /// The segment is wider than `step_thres`; the bound is that segment.
    WideStep,
    /// The walk ran into the first or last segment.
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bound {
    pub index: usize,
    pub stop: Stop,
}

/// Walk left from the peak at `m` (requires `1 <= m`).
pub fn grow_left(values: &[f64], log_widths: &[f64], m: usize, step_thres: f64) -> Bound {
    let mut i = m - 1;
    while i > 0 {
        if values[i] > values[i + 1] {
            return Bound {
                index: i + 1,
                stop: Stop::Rise,
            };
        }
        if log_widths[i] > step_thres {
            return Bound {
                index: i,
                stop: Stop::WideStep,
            };
        }
        i -= 1;
    }
    Bound {
        index: 0,
        stop: Stop::Boundary,
    }
}

/// Walk right from the peak at `m` (requires `m + 1 < values.len()`).
pub fn grow_right(values: &[f64], log_widths: &[f64], m: usize, step_thres: f64) -> Bound {
    let last = values.len() - 1;
    let mut i = m + 1;
    while i < last {
        if values[i] < values[i + 1] {
            return Bound {
                index: i,
                stop: Stop::Rise,
            };
        }
        if log_widths[i] > step_thres {
            return Bound {
                index: i,
                stop: Stop::WideStep,
            };
        }
        i += 1;
    }
    Bound {
        index: last,
        stop: Stop::Boundary,
    }
}
