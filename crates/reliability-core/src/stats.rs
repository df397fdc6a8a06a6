//! Summary statistics over a batch of iteration weights: mean, a 90%
//! confidence interval, relative error, and the zero-weight count. Spec'd
//! in terms of the original's (unkept) `sim_analysis_functions.py`, whose
//! role this module fills.

/// z-score for a 90% two-sided confidence interval.
const Z_90: f64 = 1.645;

#[derive(Clone, Debug)]
pub struct Samples {
    values: Vec<f64>,
}

impl Samples {
    pub fn new(values: Vec<f64>) -> Self {
        Samples { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn variance(&self) -> f64 {
        let n = self.values.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// `(low, high)` for a 90% confidence interval around the mean, using
    /// the normal approximation of the sample mean's distribution.
    pub fn conf_interval_90(&self) -> (f64, f64) {
        let n = self.values.len().max(1) as f64;
        let half_width = Z_90 * (self.std_dev() / n.sqrt());
        let mean = self.mean();
        (mean - half_width, mean + half_width)
    }

    /// Relative error of the mean estimate: `std_err / mean`.
    pub fn relative_error(&self) -> f64 {
        let mean = self.mean();
        if mean == 0.0 {
            return f64::INFINITY;
        }
        let n = self.values.len().max(1) as f64;
        (self.std_dev() / n.sqrt()) / mean
    }

    pub fn num_zeroes(&self) -> usize {
        self.values.iter().filter(|v| **v == 0.0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_constant_series() {
        let s = Samples::new(vec![2.0; 100]);
        assert!((s.mean() - 2.0).abs() < 1e-12);
        assert_eq!(s.variance(), 0.0);
    }

    #[test]
    fn relative_error_shrinks_with_sample_count() {
        let small = Samples::new(vec![0.0, 1.0, 0.0, 1.0]);
        let large = Samples::new(
            [0.0, 1.0]
                .iter()
                .cycle()
                .take(4000)
                .copied()
                .collect::<Vec<_>>(),
        );
        assert!(large.relative_error() < small.relative_error());
    }

    #[test]
    fn num_zeroes_counts_exact_zeroes_only() {
        let s = Samples::new(vec![0.0, 1.0, 0.0, 0.5]);
        assert_eq!(s.num_zeroes(), 2);
    }

    #[test]
    fn confidence_interval_widens_with_variance() {
        let tight = Samples::new(vec![1.0, 1.0, 1.0, 1.0]);
        let wide = Samples::new(vec![0.0, 2.0, 0.0, 2.0]);
        let (tl, th) = tight.conf_interval_90();
        let (wl, wh) = wide.conf_interval_90();
        assert!(th - tl <= wh - wl);
    }
}
