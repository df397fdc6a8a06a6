//! A single redundant-array component (disk) under simulation: its state
//! (OK/FAILED), its local clocks, and its failure/repair distributions.
//! Ported from `smp_data_structures.py`'s `Component`.

use crate::weibull::Weibull;
use reliability_common::BigReal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentState {
    Ok,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Fail,
    Repair,
}

#[derive(Clone, Debug)]
pub struct Component {
    pub state: ComponentState,
    last_time_update: f64,
    begin_time: f64,
    repair_clock: f64,
    clock: f64,
    repair_start: f64,
    pub fail_distr: Weibull,
    pub repair_distr: Weibull,
}

impl Component {
    pub fn new(fail_distr: Weibull, repair_distr: Weibull) -> Self {
        Component {
            state: ComponentState::Ok,
            last_time_update: 0.0,
            begin_time: 0.0,
            repair_clock: 0.0,
            clock: 0.0,
            repair_start: 0.0,
            fail_distr,
            repair_distr,
        }
    }

    /// Set `last_time_update`/`begin_time` to `curr_time` and zero both
    /// local clocks. Must be called before the component participates in
    /// an iteration.
    pub fn init_clock(&mut self, curr_time: f64) {
        self.last_time_update = curr_time;
        self.begin_time = curr_time;
        self.clock = 0.0;
        self.repair_clock = 0.0;
        self.repair_start = 0.0;
    }

    pub fn init_state(&mut self) {
        self.state = ComponentState::Ok;
    }

    /// Advance the component clock (and, if failed, the repair clock) to
    /// `curr_time`.
    pub fn update_clock(&mut self, curr_time: f64) {
        self.clock += curr_time - self.last_time_update;
        self.repair_clock = match self.state {
            ComponentState::Failed => curr_time - self.repair_start,
            ComponentState::Ok => 0.0,
        };
        self.last_time_update = curr_time;
    }

    pub fn read_clock(&self) -> f64 {
        self.clock
    }

    pub fn read_repair_clock(&self) -> f64 {
        self.repair_clock
    }

    pub fn fail(&mut self, curr_time: f64) {
        self.state = ComponentState::Failed;
        self.repair_clock = 0.0;
        self.repair_start = curr_time;
    }

    pub fn repair(&mut self) {
        self.begin_time = self.last_time_update;
        self.clock = 0.0;
        self.repair_clock = 0.0;
        self.state = ComponentState::Ok;
    }

    /// Instantaneous whole-component failure rate, as an arbitrary-
    /// precision value so that the likelihood ratio computed from it does
    /// not underflow `f64` for long mission times / near-unit shapes.
    pub fn curr_fail_rate(&self) -> BigReal {
        match self.state {
            ComponentState::Failed => BigReal::zero(),
            ComponentState::Ok => self.fail_distr.hazard_rate(self.clock),
        }
    }

    pub fn curr_repair_rate(&self) -> BigReal {
        match self.state {
            ComponentState::Ok => BigReal::zero(),
            ComponentState::Failed => self.repair_distr.hazard_rate(self.repair_clock),
        }
    }

    pub fn inst_rate_sum(&self) -> BigReal {
        self.curr_fail_rate() + self.curr_repair_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp() -> Component {
        Component::new(Weibull::exponential(100.0), Weibull::exponential(10.0))
    }

    #[test]
    fn starts_ok_with_zero_clocks() {
        let c = comp();
        assert_eq!(c.state, ComponentState::Ok);
        assert_eq!(c.read_clock(), 0.0);
    }

    #[test]
    fn fail_then_repair_round_trips_state() {
        let mut c = comp();
        c.init_clock(0.0);
        c.update_clock(5.0);
        assert_eq!(c.read_clock(), 5.0);
        c.fail(5.0);
        assert_eq!(c.state, ComponentState::Failed);
        c.update_clock(8.0);
        assert_eq!(c.read_repair_clock(), 3.0);
        c.repair();
        assert_eq!(c.state, ComponentState::Ok);
        assert_eq!(c.read_clock(), 0.0);
        assert_eq!(c.read_repair_clock(), 0.0);
    }

    #[test]
    fn rates_are_zero_in_the_wrong_state() {
        let mut c = comp();
        c.init_clock(0.0);
        assert!(c.curr_fail_rate().to_f64() > 0.0);
        assert_eq!(c.curr_repair_rate().to_f64(), 0.0);
        c.fail(0.0);
        assert_eq!(c.curr_fail_rate().to_f64(), 0.0);
        assert!(c.curr_repair_rate().to_f64() > 0.0);
    }
}
