//! Three-parameter Weibull distribution (shape, scale, location), ported
//! from `smp_data_structures.py`'s `Weibull` class. `shape == 1` is the
//! Exponential distribution.

use rand::Rng;
use reliability_common::BigReal;

#[derive(Clone, Debug)]
pub struct Weibull {
    pub shape: f64,
    pub scale: f64,
    pub location: f64,
}

impl Weibull {
    pub fn new(shape: f64, scale: f64, location: f64) -> Self {
        Weibull {
            shape,
            scale,
            location,
        }
    }

    pub fn exponential(scale: f64) -> Self {
        Weibull::new(1.0, scale, 0.0)
    }

    fn is_exponential(&self) -> bool {
        self.shape == 1.0
    }

    pub fn pdf(&self, x: f64) -> BigReal {
        if x < 0.0 || x < self.location {
            return BigReal::zero();
        }
        let shape = BigReal::from_f64(self.shape);
        let scale = BigReal::from_f64(self.scale);
        let xm = BigReal::from_f64(x - self.location);
        let a = &shape / &scale;
        let b = (&xm / &scale).powf(&(shape.clone() - BigReal::one()));
        let c = (-(&xm / &scale).powf(&shape)).exp();
        &(&a * &b) * &c
    }

    pub fn cdf(&self, x: f64) -> BigReal {
        if x < self.location {
            return BigReal::zero();
        }
        let shape = BigReal::from_f64(self.shape);
        let scale = BigReal::from_f64(self.scale);
        let xm = BigReal::from_f64(x - self.location);
        BigReal::one() - (-(&xm / &scale).powf(&shape)).exp()
    }

    /// Instantaneous failure rate at `x`. Constant for all `x` when
    /// `shape == 1`.
    pub fn hazard_rate(&self, x: f64) -> BigReal {
        if x < self.location {
            return BigReal::zero();
        }
        if self.is_exponential() {
            return BigReal::one() / BigReal::from_f64(self.scale);
        }
        let pdf = self.pdf(x);
        let surv = BigReal::one() - self.cdf(x);
        if surv.is_zero() {
            return BigReal::zero();
        }
        let ratio = pdf / surv;
        if ratio.to_f64() < 0.0 {
            -ratio
        } else {
            ratio
        }
    }

    /// Maximum hazard rate over `[0, mission_time]`, sampled at ten evenly
    /// spaced points, matching the original's coarse scan.
    pub fn max_hazard_rate(&self, mission_time: f64) -> BigReal {
        if self.is_exponential() {
            return BigReal::one() / BigReal::from_f64(self.scale);
        }
        let mut max = BigReal::zero();
        let step = (0.1 * mission_time).max(1.0);
        let mut t = 1.0_f64;
        while t < mission_time {
            let h = self.hazard_rate(t);
            if h.is_finite() {
                max = max.max(&h);
            }
            t += step;
        }
        max
    }

    pub fn min_hazard_rate(&self, mission_time: f64) -> BigReal {
        if self.is_exponential() {
            return BigReal::one() / BigReal::from_f64(self.scale);
        }
        let mut min = BigReal::one();
        let step = (0.1 * mission_time).max(1.0);
        let mut t = 0.0;
        while t < mission_time {
            let h = self.hazard_rate(t);
            if h.is_finite() {
                min = min.min(&h);
            }
            t += step;
        }
        min
    }

    /// Draw a sample from this Weibull via the standard library's
    /// transform (`scale * (-ln U)^(1/shape) + location`).
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.random_range(f64::MIN_POSITIVE..1.0);
        self.scale * (-u.ln()).powf(1.0 / self.shape) + self.location
    }

    /// Inverse-transform draw of the waiting time until the next event,
    /// given the component has already survived to `curr_time` on its own
    /// clock. Ported from `draw_inverse_transform`.
    pub fn draw_inverse_transform<R: Rng + ?Sized>(&self, curr_time: f64, rng: &mut R) -> f64 {
        let u: f64 = rng.random_range(f64::EPSILON..1.0);
        let scale_to_shape = self.scale.powf(self.shape);
        let base = curr_time.powf(self.shape);
        let draw = (-scale_to_shape * u.ln() + base).powf(1.0 / self.shape) - curr_time;
        draw.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn exponential_hazard_is_constant() {
        let w = Weibull::exponential(100.0);
        assert!((w.hazard_rate(0.0).to_f64() - 0.01).abs() < 1e-9);
        assert!((w.hazard_rate(1000.0).to_f64() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn cdf_is_increasing_and_bounded() {
        let w = Weibull::new(2.0, 12.0, 6.0);
        let a = w.cdf(10.0).to_f64();
        let b = w.cdf(20.0).to_f64();
        assert!(a < b);
        assert!(b <= 1.0);
        assert_eq!(w.cdf(0.0).to_f64(), 0.0);
    }

    #[test]
    fn draw_is_nonnegative_and_varies() {
        let mut rng = SmallRng::seed_from_u64(42);
        let w = Weibull::new(1.12, 461386.0, 0.0);
        let mut samples = vec![];
        for _ in 0..50 {
            let v = w.draw(&mut rng);
            assert!(v >= 0.0);
            samples.push(v);
        }
        assert!(samples.iter().any(|v| (*v - samples[0]).abs() > 1.0));
    }

    #[test]
    fn inverse_transform_draw_is_nonnegative() {
        let mut rng = SmallRng::seed_from_u64(7);
        let w = Weibull::new(1.12, 461386.0, 0.0);
        for _ in 0..50 {
            assert!(w.draw_inverse_transform(1000.0, &mut rng) >= 0.0);
        }
    }

    #[test]
    fn max_hazard_rate_for_shape_one_matches_scale_inverse() {
        let w = Weibull::exponential(24.0);
        assert!((w.max_hazard_rate(1000.0).to_f64() - 1.0 / 24.0).abs() < 1e-9);
    }
}
