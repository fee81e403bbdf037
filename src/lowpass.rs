//! Second-order recursive low-pass filter for the apparent-width signal.

/// Coefficients of a discrete two-pole Butterworth section.
///
/// Output is computed as
/// `y = (b0*x + b1*x1 + b2*x2 - a1*y1 - a2*y2) / a0`
/// over the two-sample input/output history.
#[derive(Clone, Copy, Debug)]
struct ButterworthCoefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a0: f64,
    a1: f64,
    a2: f64,
}

// Precomputed for a 5 Hz cutoff at a 25 Hz sample rate.
const COEFFICIENTS: ButterworthCoefficients = ButterworthCoefficients {
    b0: 1.0,
    b1: 2.0,
    b2: 1.0,
    a0: 6.881,
    a1: -4.617,
    a2: 1.736,
};

/// Two-pole recursive low-pass filter with two-sample history.
///
/// Each call to [`process`](Self::process) consumes exactly one sample and
/// shifts the history, so it must be called at the sample rate the
/// coefficients were designed for - once per frame per track.
#[derive(Clone, Debug, Default)]
pub struct SecondOrderFilter {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl SecondOrderFilter {
    /// Create a filter with zeroed history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter one input sample and return the filtered output.
    pub fn process(&mut self, input: f64) -> f64 {
        let c = COEFFICIENTS;
        let output =
            (c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2)
                / c.a0;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_sample() {
        let mut filter = SecondOrderFilter::new();
        // With zero history the first output is b0/a0 of the input
        let out = filter.process(10.0);
        assert_relative_eq!(out, 10.0 / 6.881, epsilon = 1e-9);
    }

    #[test]
    fn test_converges_to_dc_input() {
        let mut filter = SecondOrderFilter::new();
        let mut out = 0.0;
        for _ in 0..200 {
            out = filter.process(10.0);
        }
        // DC gain of the section: (b0+b1+b2)/(a0+a1+a2) = 4/4 = 1
        assert_relative_eq!(out, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_history_shifts() {
        let mut a = SecondOrderFilter::new();
        let mut b = SecondOrderFilter::new();

        let y1 = a.process(1.0);
        let y2 = a.process(1.0);
        // A filter fed the same two samples in a fresh instance agrees
        assert_relative_eq!(b.process(1.0), y1, epsilon = 1e-12);
        assert_relative_eq!(b.process(1.0), y2, epsilon = 1e-12);
        // And outputs differ between the first and second call
        assert!((y2 - y1).abs() > 1e-6);
    }
}
