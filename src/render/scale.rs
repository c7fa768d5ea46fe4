//! Axis scales: nice domains, tick placement, and value-to-pixel mapping.
//!
//! Tick selection follows the 1/2/5/10 step convention, with major ticks
//! subdivided into minor grid ticks. Log10 facets reuse the linear
//! machinery in log-transformed space.

const SQRT_50: f64 = 7.071_067_811_865_475_5;
const SQRT_10: f64 = 3.162_277_660_168_379_5;
const SQRT_2: f64 = 1.414_213_562_373_095_1;

/// Step between ticks for a domain and requested tick count, snapped to a
/// power of ten times 1, 2, or 5.
fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count.max(1) as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= SQRT_50 {
        10.0
    } else if error >= SQRT_10 {
        5.0
    } else if error >= SQRT_2 {
        2.0
    } else {
        1.0
    };
    factor * 10f64.powf(power)
}

/// Extend a domain outward to tick-friendly bounds.
pub fn nice_domain(mut start: f64, mut stop: f64, count: usize) -> (f64, f64) {
    if !start.is_finite() || !stop.is_finite() || start >= stop {
        return (start, stop);
    }
    // Two passes: the first step estimate can change once the bounds move.
    for _ in 0..2 {
        let step = tick_step(start, stop, count);
        if step <= 0.0 || !step.is_finite() {
            break;
        }
        start = (start / step).floor() * step;
        stop = (stop / step).ceil() * step;
    }
    (start, stop)
}

/// Major tick values covering a domain.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let step = tick_step(start, stop, count);
    if step <= 0.0 || !step.is_finite() {
        return vec![start, stop];
    }
    let first = (start / step).ceil() as i64;
    let last = (stop / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Largest subdivision factor that keeps the total grid tick count within
/// `minor_max`.
pub fn highest_minor_mod(major_count: usize, minor_max: usize) -> usize {
    if major_count < 2 {
        return 1;
    }
    ((minor_max - 1) / (major_count - 1)).max(1)
}

/// Interleave minor grid ticks between consecutive major ticks.
pub fn grid_ticks(major: &[f64], minor_mod: usize) -> Vec<f64> {
    if major.len() < 2 {
        return major.to_vec();
    }
    let mut grid = Vec::new();
    for window in major.windows(2) {
        grid.push(window[0]);
        let distance = window[1] - window[0];
        for i in 1..minor_mod {
            grid.push(window[0] + (i as f64 / minor_mod as f64) * distance);
        }
    }
    grid.push(major[major.len() - 1]);
    grid
}

/// A resolved axis: a niced domain mapped onto a pixel range.
///
/// The domain lives in *transformed* space: plain values for linear axes,
/// `log10(value)` for logarithmic ones. Callers transform data values
/// before asking for a position.
#[derive(Debug, Clone)]
pub struct AxisScale {
    domain: (f64, f64),
    range: (f64, f64),
    major: Vec<f64>,
    grid: Vec<f64>,
}

impl AxisScale {
    /// Build a scale over `domain`, niced to `tick_count` major ticks with
    /// at most `minor_max` grid ticks. A degenerate domain (empty or
    /// single-valued) is padded before nicing so every value maps inside
    /// the range.
    pub fn new(domain: (f64, f64), range: (f64, f64), tick_count: usize, minor_max: usize) -> Self {
        let (mut lo, mut hi) = domain;
        if !lo.is_finite() || !hi.is_finite() {
            lo = 0.0;
            hi = 1.0;
        }
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let (lo, hi) = nice_domain(lo, hi, tick_count);
        let major = ticks(lo, hi, tick_count);
        let minor_mod = highest_minor_mod(major.len(), minor_max);
        let grid = grid_ticks(&major, minor_mod);
        Self { domain: (lo, hi), range, major, grid }
    }

    /// Niced domain bounds, transformed space.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Major tick values.
    #[must_use]
    pub fn major_ticks(&self) -> &[f64] {
        &self.major
    }

    /// All grid tick values, majors included.
    #[must_use]
    pub fn all_grid_ticks(&self) -> &[f64] {
        &self.grid
    }

    /// True when `value` is one of the major ticks.
    #[must_use]
    pub fn is_major(&self, value: f64) -> bool {
        self.major.iter().any(|&tick| tick == value)
    }

    /// Pixel position of a transformed value, clamped into the range.
    ///
    /// Clamping is what makes fixed limits clip out-of-range data instead
    /// of erroring.
    #[must_use]
    pub fn position(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return r0;
        }
        let t = ((value - d0) / (d1 - d0)).clamp(0.0, 1.0);
        r0 + t * (r1 - r0)
    }
}
