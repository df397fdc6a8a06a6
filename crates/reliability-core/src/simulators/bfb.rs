//! Balanced failure biasing (BFB) without uniformization. Ported from
//! `bfb_optimization.py`: a shared bias probability `fb_prob` is used to
//! choose between a failure and a repair once the array is degraded,
//! regardless of the true relative rates, and the likelihood ratio
//! corrects for the bias.

use rand::Rng;
use reliability_common::{BigReal, Error};

use crate::component::{Component, Event};
use crate::simulate::{EventDriver, IsParms};
use crate::state::{State, SysState};
use crate::weibull::Weibull;

pub struct BfbSimulator {
    components: Vec<Component>,
    state: State,
    fb_prob: f64,
    lr: BigReal,
    fail_shape: f64,
    fail_scale_to_shape: f64,
    repair_shape: f64,
    repair_scale_to_shape: f64,
}

impl BfbSimulator {
    pub fn new(
        fail_dists: Vec<Weibull>,
        repair_dists: Vec<Weibull>,
        is_parms: IsParms,
    ) -> Result<Self, Error> {
        let n = fail_dists.len();
        if n == 0 {
            return Err(Error::Precondition("need at least one component".into()));
        }
        let fail_shape = fail_dists[0].shape;
        let fail_scale = fail_dists[0].scale;
        let repair_shape = repair_dists[0].shape;
        let repair_scale = repair_dists[0].scale;

        for d in &fail_dists {
            if d.shape != fail_shape || d.scale != fail_scale {
                return Err(Error::Precondition(
                    "balanced failure biasing requires homogeneous failure distributions".into(),
                ));
            }
        }
        for d in &repair_dists {
            if d.shape != repair_shape || d.scale != repair_scale {
                return Err(Error::Precondition(
                    "balanced failure biasing requires homogeneous repair distributions".into(),
                ));
            }
        }

        let components = fail_dists
            .into_iter()
            .zip(repair_dists)
            .map(|(f, r)| Component::new(f, r))
            .collect();

        Ok(BfbSimulator {
            components,
            state: State::new(n),
            fb_prob: is_parms.fb_prob,
            lr: BigReal::one(),
            fail_shape,
            fail_scale_to_shape: fail_scale.powf(fail_shape),
            repair_shape,
            repair_scale_to_shape: repair_scale.powf(repair_shape),
        })
    }

    fn event_rate(&self) -> BigReal {
        self.components
            .iter()
            .fold(BigReal::zero(), |acc, c| acc + c.inst_rate_sum())
    }

    fn repair_rate(&self) -> BigReal {
        self.state
            .failed_components()
            .iter()
            .fold(BigReal::zero(), |acc, &i| acc + self.components[i].curr_repair_rate())
    }

    fn fail_rate(&self) -> BigReal {
        self.state
            .avail_components()
            .iter()
            .fold(BigReal::zero(), |acc, &i| acc + self.components[i].curr_fail_rate())
    }

    /// Draw the waiting time until the next "real" event (failure or
    /// repair) via the inverse-transform method, solving for the time at
    /// which the cumulative hazard of the whole system first reaches
    /// `-ln(U)`.
    fn draw_waiting_time<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.random_range(f64::EPSILON..1.0);
        let target = -u.ln();

        let avail_clocks: Vec<f64> = self
            .state
            .avail_components()
            .iter()
            .map(|&i| self.components[i].read_clock().max(0.0))
            .collect();
        let failed_clocks: Vec<f64> = self
            .state
            .failed_components()
            .iter()
            .map(|&i| self.components[i].read_repair_clock().max(0.0))
            .collect();

        let cumulative_hazard = |x: f64| -> f64 {
            let mut h = 0.0;
            for &clk in &avail_clocks {
                h += ((x + clk).powf(self.fail_shape) - clk.powf(self.fail_shape))
                    / self.fail_scale_to_shape;
            }
            for &clk in &failed_clocks {
                h += ((x + clk).powf(self.repair_shape) - clk.powf(self.repair_shape))
                    / self.repair_scale_to_shape;
            }
            h
        };

        solve_increasing(cumulative_hazard, target)
    }
}

/// Bisection root-finder for a monotonically increasing function `f`,
/// solving `f(x) = target` for `x >= 0`. The search bracket is doubled
/// until it contains the root; this stands in for the original's secant
/// solver with a widening retry on non-convergence.
fn solve_increasing(f: impl Fn(f64) -> f64, target: f64) -> f64 {
    let mut hi = 1.0_f64;
    while f(hi) < target && hi < 1e12 {
        hi *= 2.0;
    }
    let mut lo = 0.0_f64;
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if f(mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

impl EventDriver for BfbSimulator {
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let _ = rng;
        let n = self.components.len();
        self.state = State::new(n);
        self.lr = BigReal::one();
        for c in self.components.iter_mut() {
            c.init_clock(0.0);
            c.init_state();
        }
    }

    fn next_event<R: Rng + ?Sized>(
        &mut self,
        curr_time: f64,
        rng: &mut R,
    ) -> (f64, Option<Event>, Option<usize>) {
        if self.state.sys_state == SysState::Ok {
            let avail = self.state.avail_components();
            let mut best_idx = avail[0];
            let mut best_time =
                self.components[best_idx].fail_distr.draw_inverse_transform(
                    self.components[best_idx].read_clock(),
                    rng,
                ) + curr_time;
            for &i in &avail[1..] {
                let t = self.components[i]
                    .fail_distr
                    .draw_inverse_transform(self.components[i].read_clock(), rng)
                    + curr_time;
                if t < best_time {
                    best_time = t;
                    best_idx = i;
                }
            }
            self.components[best_idx].fail(best_time);
            super::update_all_clocks(&mut self.components, best_time);
            self.state.apply_event(Event::Fail, best_idx);
            return (best_time, Some(Event::Fail), Some(best_idx));
        }

        let next_event_time = self.draw_waiting_time(rng) + curr_time;
        let draw: f64 = rng.random();

        super::update_all_clocks(&mut self.components, next_event_time);

        let event_rate = self.event_rate();
        let bfb_fail_rate = event_rate.clone() * BigReal::from_f64(self.fb_prob);

        if draw <= (bfb_fail_rate / event_rate.clone()).to_f64() {
            let avail = self.state.avail_components();
            let comp_id = avail[rng.random_range(0..avail.len())];
            self.lr = self.lr.clone()
                * ((self.components[comp_id].curr_fail_rate() / event_rate.clone())
                    / (BigReal::from_f64(self.fb_prob) / BigReal::from_f64(avail.len() as f64)));
            self.components[comp_id].fail(next_event_time);
            self.state.apply_event(Event::Fail, comp_id);
            (next_event_time, Some(Event::Fail), Some(comp_id))
        } else {
            let total_repair_rate = self.repair_rate();
            let draw2: f64 = rng.random();
            let failed = self.state.failed_components();
            let mut comp_id = failed[0];
            let mut cum = BigReal::zero();
            for &i in &failed {
                cum = cum + (self.components[i].curr_repair_rate() / total_repair_rate.clone());
                if draw2 < cum.to_f64() {
                    comp_id = i;
                    break;
                }
            }
            self.lr = self.lr.clone()
                * ((self.components[comp_id].curr_repair_rate() / event_rate.clone())
                    / (BigReal::from_f64(1.0 - self.fb_prob)
                        * (self.components[comp_id].curr_repair_rate() / total_repair_rate)));
            self.components[comp_id].repair();
            self.state.apply_event(Event::Repair, comp_id);
            (next_event_time, Some(Event::Repair), Some(comp_id))
        }
    }

    fn lr(&self) -> BigReal {
        self.lr.clone()
    }

    fn components(&self) -> &[Component] {
        &self.components
    }

    fn state(&self) -> &State {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_heterogeneous_fail_distributions() {
        let fails = vec![Weibull::exponential(100.0), Weibull::exponential(200.0)];
        let repairs = vec![Weibull::exponential(10.0); 2];
        assert!(BfbSimulator::new(fails, repairs, IsParms::default()).is_err());
    }

    #[test]
    fn runs_without_panicking() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut sim = BfbSimulator::new(
            vec![Weibull::exponential(200.0); 4],
            vec![Weibull::exponential(10.0); 4],
            IsParms {
                forcing_prob: 0.8,
                fb_prob: 0.3,
            },
        )
        .unwrap();
        sim.reset(&mut rng);
        let mut t = 0.0;
        for _ in 0..200 {
            let (event_time, _, _) = sim.next_event(t, &mut rng);
            t = event_time;
        }
        assert!(sim.lr().to_f64().is_finite());
    }
}
