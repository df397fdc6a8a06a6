//! Uniformized balanced failure biasing: a dominating Poisson process at
//! rate `poisson_rate` generates candidate event times, a fraction
//! `fb_prob` of which are "real" forced failures and the rest "pseudo"
//! events that only update the likelihood ratio. Ported from
//! `unif_bfb_gen_repair.py`.

use rand_distr::{Distribution, Exp};

use rand::Rng;
use reliability_common::BigReal;

use crate::component::{Component, Event};
use crate::simulate::{EventDriver, IsParms};
use crate::state::{State, SysState};
use crate::weibull::Weibull;

pub struct UniformBfbSimulator {
    components: Vec<Component>,
    state: State,
    fb_prob: f64,
    lr: BigReal,
    poisson_rate: f64,
    component_repairs: Vec<f64>,
    component_repair_start: Vec<f64>,
}

impl UniformBfbSimulator {
    pub fn new(fail_dists: Vec<Weibull>, repair_dists: Vec<Weibull>, is_parms: IsParms) -> Self {
        let n = fail_dists.len();
        // Dominating rate: twice the maximum repair hazard seen over three
        // repair scales, matching the original's `get_max_hazard_rate` call
        // against `repair_distr.scale * 3`.
        let poisson_rate = repair_dists[0]
            .max_hazard_rate(repair_dists[0].scale * 3.0)
            .to_f64()
            * 2.0;

        let components = fail_dists
            .into_iter()
            .zip(repair_dists)
            .map(|(f, r)| Component::new(f, r))
            .collect();

        UniformBfbSimulator {
            components,
            state: State::new(n),
            fb_prob: is_parms.fb_prob,
            lr: BigReal::one(),
            poisson_rate,
            component_repairs: vec![0.0; n],
            component_repair_start: vec![0.0; n],
        }
    }

    fn fail_rate(&self) -> BigReal {
        self.components
            .iter()
            .fold(BigReal::zero(), |acc, c| acc + c.curr_fail_rate())
    }

    fn next_repair(&self, failed: &[usize]) -> Option<(f64, usize)> {
        failed
            .iter()
            .map(|&i| (self.component_repairs[i], i))
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
    }
}

impl EventDriver for UniformBfbSimulator {
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let _ = rng;
        let n = self.components.len();
        self.state = State::new(n);
        self.lr = BigReal::one();
        self.component_repairs = vec![0.0; n];
        self.component_repair_start = vec![0.0; n];
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
            self.component_repairs[best_idx] =
                self.components[best_idx].repair_distr.draw(rng) + best_time;
            self.component_repair_start[best_idx] = best_time;
            self.state.apply_event(Event::Fail, best_idx);
            return (best_time, Some(Event::Fail), Some(best_idx));
        }

        let exp = Exp::new(self.poisson_rate).expect("positive poisson rate");
        let next_event_time = exp.sample(rng) + curr_time;

        let failed = self.state.failed_components();
        if let Some((repair_time, comp_id)) = self.next_repair(&failed) {
            if repair_time < next_event_time {
                super::update_all_clocks(&mut self.components, repair_time);
                self.components[comp_id].repair();
                self.state.apply_event(Event::Repair, comp_id);
                return (repair_time, Some(Event::Repair), Some(comp_id));
            }
        }

        super::update_all_clocks(&mut self.components, next_event_time);
        let draw: f64 = rng.random();

        if draw > self.fb_prob {
            // Pseudo event: no state change, only the LR is corrected.
            let fail_rate = self.fail_rate();
            self.lr = self.lr.clone()
                * ((BigReal::one() - fail_rate / BigReal::from_f64(self.poisson_rate))
                    / BigReal::from_f64(1.0 - self.fb_prob));
            (next_event_time, None, None)
        } else {
            let avail = self.state.avail_components();
            let comp_id = avail[rng.random_range(0..avail.len())];
            self.lr = self.lr.clone()
                * ((self.components[comp_id].curr_fail_rate() / BigReal::from_f64(self.poisson_rate))
                    / (BigReal::from_f64(self.fb_prob) / BigReal::from_f64(avail.len() as f64)));
            self.components[comp_id].fail(next_event_time);
            self.component_repairs[comp_id] =
                self.components[comp_id].repair_distr.draw(rng) + next_event_time;
            self.component_repair_start[comp_id] = next_event_time;
            self.state.apply_event(Event::Fail, comp_id);
            (next_event_time, Some(Event::Fail), Some(comp_id))
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

    fn scheduled_repairs(&self) -> Option<(&[f64], &[f64])> {
        Some((&self.component_repairs, &self.component_repair_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn poisson_rate_is_positive_and_finite() {
        let sim = UniformBfbSimulator::new(
            vec![Weibull::new(1.12, 281257.0, 0.0); 8],
            vec![Weibull::new(2.0, 24.0, 12.0); 8],
            IsParms::default(),
        );
        assert!(sim.poisson_rate > 0.0);
        assert!(sim.poisson_rate.is_finite());
    }

    #[test]
    fn runs_without_panicking() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut sim = UniformBfbSimulator::new(
            vec![Weibull::new(1.12, 1000.0, 0.0); 6],
            vec![Weibull::new(2.0, 24.0, 12.0); 6],
            IsParms {
                forcing_prob: 0.8,
                fb_prob: 0.3,
            },
        );
        sim.reset(&mut rng);
        let mut t = 0.0;
        for _ in 0..500 {
            let (event_time, _, _) = sim.next_event(t, &mut rng);
            t = event_time;
            if t > 100_000.0 {
                break;
            }
        }
        assert!(sim.lr().to_f64().is_finite());
    }
}
