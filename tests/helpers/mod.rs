use site_peaks::Curve;

/// `n` periods evenly spaced in log10 between `lo` and `hi`.
pub fn log_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let (a, b) = (lo.log10(), hi.log10());
    (0..n)
        .map(|i| 10f64.powf(a + (b - a) * i as f64 / (n - 1) as f64))
        .collect()
}

/// Zero response except `height` on periods within `[from, to]`.
pub fn boxcar_curve(n: usize, from: f64, to: f64, height: f64, se: f64) -> Curve {
    let period = log_grid(0.01, 10.0, n);
    let response = period
        .iter()
        .map(|&t| if t >= from && t <= to { height } else { 0.0 })
        .collect();
    Curve::new(period, response, vec![se; n])
}

/// Gaussian bumps in ln(period) plus deterministic jitter.
#[allow(dead_code)]
pub fn bumpy_curve(n: usize, bumps: &[(f64, f64, f64)], noise: f64, se: f64) -> Curve {
    let period = log_grid(0.01, 10.0, n);
    let response = period
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let signal: f64 = bumps
                .iter()
                .map(|&(c, s, a)| a * (-0.5 * ((t.ln() - c.ln()) / s).powi(2)).exp())
                .sum();
            signal + noise * jitter(i as u32)
        })
        .collect();
    let standard_error = (0..n).map(|i| se * (1.0 + 0.2 * jitter(i as u32 + 7919))).collect();
    Curve::new(period, response, standard_error)
}

/// Deterministic value in [-0.5, 0.5].
#[allow(dead_code)]
pub fn jitter(i: u32) -> f64 {
    let mut x = i.wrapping_mul(1664525).wrapping_add(1013904223);
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    (x as f64 / (u32::MAX as f64)) - 0.5
}
