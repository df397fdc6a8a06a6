//! Direct (non-biased) simulation. Likelihood ratio is always 1; every
//! draw is taken straight from the component's own failure/repair
//! distribution. Ported from `regular_simulation.py`.

use rand::Rng;
use reliability_common::BigReal;

use crate::component::{Component, Event};
use crate::state::State;
use crate::weibull::Weibull;

use crate::simulate::EventDriver;

pub struct DirectSimulator {
    components: Vec<Component>,
    state: State,
    component_failures: Vec<f64>,
    component_repairs: Vec<f64>,
    component_repair_start: Vec<f64>,
}

impl DirectSimulator {
    pub fn new(fail_dists: Vec<Weibull>, repair_dists: Vec<Weibull>) -> Self {
        let n = fail_dists.len();
        let components = fail_dists
            .into_iter()
            .zip(repair_dists)
            .map(|(f, r)| Component::new(f, r))
            .collect();
        DirectSimulator {
            components,
            state: State::new(n),
            component_failures: vec![0.0; n],
            component_repairs: vec![0.0; n],
            component_repair_start: vec![0.0; n],
        }
    }

    fn next_failure(&self, avail: &[usize]) -> Option<(f64, usize)> {
        avail
            .iter()
            .map(|&i| (self.component_failures[i], i))
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
    }

    fn next_repair(&self, failed: &[usize]) -> Option<(f64, usize)> {
        failed
            .iter()
            .map(|&i| (self.component_repairs[i], i))
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
    }
}

impl EventDriver for DirectSimulator {
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.components.len();
        self.state = State::new(n);
        self.component_repairs = vec![0.0; n];
        self.component_repair_start = vec![0.0; n];
        for (i, c) in self.components.iter_mut().enumerate() {
            c.init_clock(0.0);
            c.init_state();
            self.component_failures[i] = c.fail_distr.draw(rng);
        }
    }

    fn next_event<R: Rng + ?Sized>(
        &mut self,
        curr_time: f64,
        rng: &mut R,
    ) -> (f64, Option<Event>, Option<usize>) {
        let failed = self.state.failed_components();
        let avail = self.state.avail_components();

        let (event_time, event, comp_id) = if failed.is_empty() {
            let (fail_time, comp_idx) = self.next_failure(&avail).expect("some component available");
            (fail_time, Event::Fail, comp_idx)
        } else {
            let (fail_time, fail_idx) = self.next_failure(&avail).unwrap_or((f64::INFINITY, 0));
            let (repair_time, repair_idx) = self.next_repair(&failed).unwrap();
            if fail_time < repair_time {
                (fail_time, Event::Fail, fail_idx)
            } else {
                (repair_time, Event::Repair, repair_idx)
            }
        };

        super::update_all_clocks(&mut self.components, event_time);

        match event {
            Event::Fail => {
                self.components[comp_id].fail(event_time);
                self.component_repairs[comp_id] =
                    self.components[comp_id].repair_distr.draw(rng) + event_time;
                self.component_repair_start[comp_id] = event_time;
            }
            Event::Repair => {
                self.components[comp_id].repair();
                self.component_failures[comp_id] =
                    self.components[comp_id].fail_distr.draw(rng) + event_time;
            }
        }
        self.state.apply_event(event, comp_id);

        (event_time, Some(event), Some(comp_id))
    }

    fn lr(&self) -> BigReal {
        BigReal::one()
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
    fn lr_is_always_one() {
        let sim = DirectSimulator::new(
            vec![Weibull::exponential(1000.0); 4],
            vec![Weibull::exponential(10.0); 4],
        );
        assert_eq!(sim.lr().to_f64(), 1.0);
    }

    #[test]
    fn runs_without_panicking_for_many_events() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut sim = DirectSimulator::new(
            vec![Weibull::exponential(100.0); 4],
            vec![Weibull::exponential(5.0); 4],
        );
        sim.reset(&mut rng);
        let mut t = 0.0;
        for _ in 0..200 {
            let (event_time, event, comp) = sim.next_event(t, &mut rng);
            assert!(event.is_some());
            assert!(comp.is_some());
            t = event_time;
        }
    }
}
