use rug::ops::Pow;
use rug::Float;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Working precision, in bits, for all arbitrary-precision quantities.
///
/// The original implementation ran under `mpmath` with `mp.prec += 100`
/// on top of the default 53-bit double precision, i.e. roughly 153 bits.
/// 256 bits gives headroom for the chained products of small hazard rates
/// that appear in long mission-time / high-component-count runs without
/// costing much more than `f64` arithmetic at this scale.
pub const PRECISION_BITS: u32 = 256;

/// A thin facade over `rug::Float` at a fixed precision.
///
/// Hazard rates for a Weibull with shape close to 1 and scale on the order
/// of 10^6 hours underflow `f64` when raised to small negative powers
/// inside the hazard formula; routing every rate, likelihood ratio, and
/// probability through `BigReal` instead of `f64` avoids that underflow.
/// Conversion to `f64` happens only at the statistics/reporting boundary
/// (`reliability_core::stats::Samples`).
#[derive(Clone, Debug)]
pub struct BigReal(Float);

impl BigReal {
    pub fn from_f64(v: f64) -> Self {
        BigReal(Float::with_val(PRECISION_BITS, v))
    }

    pub fn zero() -> Self {
        Self::from_f64(0.0)
    }

    pub fn one() -> Self {
        Self::from_f64(1.0)
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64()
    }

    pub fn powf(&self, exp: &BigReal) -> Self {
        BigReal(Float::with_val(PRECISION_BITS, self.0.pow_ref(&exp.0)))
    }

    pub fn ln(&self) -> Self {
        BigReal(Float::with_val(PRECISION_BITS, self.0.ln_ref()))
    }

    pub fn exp(&self) -> Self {
        BigReal(Float::with_val(PRECISION_BITS, self.0.exp_ref()))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    pub fn max(&self, other: &BigReal) -> BigReal {
        if self.0 >= other.0 {
            self.clone()
        } else {
            other.clone()
        }
    }

    pub fn min(&self, other: &BigReal) -> BigReal {
        if self.0 <= other.0 {
            self.clone()
        } else {
            other.clone()
        }
    }
}

impl From<f64> for BigReal {
    fn from(v: f64) -> Self {
        BigReal::from_f64(v)
    }
}

impl fmt::Display for BigReal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_f64())
    }
}

impl PartialEq for BigReal {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for BigReal {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Add for BigReal {
    type Output = BigReal;
    fn add(self, rhs: BigReal) -> BigReal {
        BigReal(Float::with_val(PRECISION_BITS, self.0 + rhs.0))
    }
}

impl<'a> Add<&'a BigReal> for &'a BigReal {
    type Output = BigReal;
    fn add(self, rhs: &'a BigReal) -> BigReal {
        BigReal(Float::with_val(PRECISION_BITS, &self.0 + &rhs.0))
    }
}

impl Sub for BigReal {
    type Output = BigReal;
    fn sub(self, rhs: BigReal) -> BigReal {
        BigReal(Float::with_val(PRECISION_BITS, self.0 - rhs.0))
    }
}

impl<'a> Sub<&'a BigReal> for &'a BigReal {
    type Output = BigReal;
    fn sub(self, rhs: &'a BigReal) -> BigReal {
        BigReal(Float::with_val(PRECISION_BITS, &self.0 - &rhs.0))
    }
}

impl Mul for BigReal {
    type Output = BigReal;
    fn mul(self, rhs: BigReal) -> BigReal {
        BigReal(Float::with_val(PRECISION_BITS, self.0 * rhs.0))
    }
}

impl<'a> Mul<&'a BigReal> for &'a BigReal {
    type Output = BigReal;
    fn mul(self, rhs: &'a BigReal) -> BigReal {
        BigReal(Float::with_val(PRECISION_BITS, &self.0 * &rhs.0))
    }
}

impl Div for BigReal {
    type Output = BigReal;
    fn div(self, rhs: BigReal) -> BigReal {
        BigReal(Float::with_val(PRECISION_BITS, self.0 / rhs.0))
    }
}

impl<'a> Div<&'a BigReal> for &'a BigReal {
    type Output = BigReal;
    fn div(self, rhs: &'a BigReal) -> BigReal {
        BigReal(Float::with_val(PRECISION_BITS, &self.0 / &rhs.0))
    }
}

impl Neg for BigReal {
    type Output = BigReal;
    fn neg(self) -> BigReal {
        BigReal(Float::with_val(PRECISION_BITS, -self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underflows_that_kill_f64_survive() {
        let shape = BigReal::from_f64(1.12);
        let tiny_base = BigReal::from_f64(1e-30);
        let r = tiny_base.powf(&shape);
        assert!(r.is_finite());
        assert!(!r.is_zero());
    }

    #[test]
    fn arithmetic_round_trips() {
        let a = BigReal::from_f64(2.5);
        let b = BigReal::from_f64(1.5);
        let sum = a.clone() + b.clone();
        assert!((sum.to_f64() - 4.0).abs() < 1e-9);
        let prod = a * b;
        assert!((prod.to_f64() - 3.75).abs() < 1e-9);
    }

    #[test]
    fn max_min() {
        let a = BigReal::from_f64(1.0);
        let b = BigReal::from_f64(2.0);
        assert_eq!(a.max(&b).to_f64(), 2.0);
        assert_eq!(a.min(&b).to_f64(), 1.0);
    }
}
