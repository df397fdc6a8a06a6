//! Shared iteration driver for all three sampling strategies, and the
//! types that describe a single iteration's outcome. Ported from
//! `simulation.py`'s `Simulation.run_iteration`.

use rand::Rng;
use reliability_common::BigReal;

use crate::component::{Component, Event};
use crate::erasure_code::ErasureCode;
use crate::sector_model::SectorFailureModel;
use crate::state::State;

/// Importance-sampling tuning parameters shared by the BFB and
/// uniformized-BFB simulators. `forcing_prob` is accepted for CLI
/// compatibility but never consulted — see the crate-level docs.
#[derive(Clone, Copy, Debug)]
pub struct IsParms {
    pub forcing_prob: f64,
    pub fb_prob: f64,
}

impl Default for IsParms {
    fn default() -> Self {
        IsParms {
            forcing_prob: 0.8,
            fb_prob: 0.3,
        }
    }
}

/// `(num_failed_components, has_sector_loss)`, the same pattern key
/// `abl.py` formats as the string `"(n, s)"`.
pub type Pattern = (u32, u32);

#[derive(Clone, Debug)]
pub struct IterationOutcome {
    pub weight: BigReal,
    pub pattern: Pattern,
    pub critical_region: f64,
}

impl IterationOutcome {
    fn zero() -> Self {
        IterationOutcome {
            weight: BigReal::zero(),
            pattern: (0, 0),
            critical_region: 0.0,
        }
    }
}

/// Implemented by each sampling strategy to supply the next scheduled
/// event and to expose just enough of its internal schedule for the
/// shared critical-region computation below.
pub trait EventDriver {
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R);

    /// Returns `(event_time, event, component_id)`. `event` is `None` for
    /// a pseudo-event (uniformized BFB only), which still advances
    /// `curr_time` but otherwise changes no state.
    fn next_event<R: Rng + ?Sized>(
        &mut self,
        curr_time: f64,
        rng: &mut R,
    ) -> (f64, Option<Event>, Option<usize>);

    fn lr(&self) -> BigReal;
    fn components(&self) -> &[Component];
    fn state(&self) -> &State;

    /// `Some((repair_times, repair_start_times))` when this driver
    /// schedules repair completion times up front (regular simulation and
    /// uniformized BFB); `None` when repairs are drawn lazily at the
    /// moment they're needed (plain BFB), matching `component_repairs is
    /// None` in the original.
    fn scheduled_repairs(&self) -> Option<(&[f64], &[f64])> {
        None
    }
}

/// Run a single iteration to completion (either mission_time is exceeded,
/// or a data-loss event is observed) and return its weighted sample.
pub fn run_iteration<D: EventDriver, R: Rng + ?Sized>(
    driver: &mut D,
    erasure_code: &ErasureCode,
    sector_model: Option<&SectorFailureModel>,
    mission_time: f64,
    critical_region_check: bool,
    rng: &mut R,
) -> IterationOutcome {
    driver.reset(rng);
    let mut curr_time = 0.0;

    loop {
        let (event_time, event, _component_id) = driver.next_event(curr_time, rng);
        curr_time = event_time;

        if event_time > mission_time {
            break;
        }

        // Each driver applies the event to its own `State` inside
        // `next_event`; by the time control returns here the count already
        // reflects the event just processed.
        let num_failed = driver.state().num_failed();

        if event.is_none() || event == Some(Event::Repair) {
            continue;
        }

        if erasure_code.min_disk_failures <= num_failed as usize {
            let failed_comps = driver.state().failed_components();

            if erasure_code.is_failure(&failed_comps, &[], rng) {
                let critical_region = if critical_region_check {
                    critical_region_full(driver, &failed_comps, curr_time, sector_model)
                } else {
                    0.0
                };
                return IterationOutcome {
                    weight: driver.lr(),
                    pattern: (num_failed, 0),
                    critical_region,
                };
            }
        }

        if erasure_code.min_disk_failures.saturating_sub(1) <= num_failed as usize {
            if let Some(sector_model) = sector_model {
                let failed_comps = driver.state().failed_components();

                let critical_region = if critical_region_check {
                    critical_region_pre_failure(driver, &failed_comps, curr_time, sector_model)
                } else {
                    (sector_model.total_num_sectors.saturating_sub(1)) as f64
                };

                let avail = driver.state().avail_components();
                let mut sector_failures = vec![Vec::new(); driver.components().len()];
                for &comp in &avail {
                    let draw: f64 = rng.random();
                    if draw < sector_model.prob_of_bad_sector() {
                        let sector_index = rng.random_range(0..sector_model.total_num_sectors);
                        if (sector_index as f64) < critical_region {
                            sector_failures[comp].push(sector_index as usize);
                        }
                    }
                }

                if erasure_code.is_failure(&failed_comps, &sector_failures, rng) {
                    return IterationOutcome {
                        weight: driver.lr(),
                        pattern: (num_failed, 1),
                        critical_region,
                    };
                }
            }
        }
    }

    IterationOutcome::zero()
}

fn failed_with_min(failed_comps: &[usize], driver_len: usize) -> f64 {
    let n = failed_comps.len().max(1);
    (1.0 / (1u64 << (n - 1)) as f64) * driver_len as f64
}

/// Critical region (in sectors) once the array has already crossed the
/// erasure code's decodability threshold: the whole exposure window
/// is already compromised, weighted by the number of concurrent repairs.
fn critical_region_full<D: EventDriver>(
    driver: &D,
    failed_comps: &[usize],
    curr_time: f64,
    sector_model: Option<&SectorFailureModel>,
) -> f64 {
    let total_sectors = sector_model.map(|m| m.total_num_sectors as f64).unwrap_or(0.0);
    match driver.scheduled_repairs() {
        None => failed_with_min(failed_comps, total_sectors as usize).min(total_sectors),
        Some((repair_times, repair_start)) => {
            next_repair_fraction(failed_comps, repair_times, repair_start, curr_time) * total_sectors
        }
    }
}

/// Critical region computed one failure shy of the decodability
/// threshold, i.e. the exposure window for an in-flight rebuild.
fn critical_region_pre_failure<D: EventDriver>(
    driver: &D,
    failed_comps: &[usize],
    curr_time: f64,
    sector_model: &SectorFailureModel,
) -> f64 {
    let total_sectors = sector_model.total_num_sectors as f64;
    match driver.scheduled_repairs() {
        None => failed_with_min(failed_comps, total_sectors as usize),
        Some((repair_times, repair_start)) => {
            next_repair_fraction(failed_comps, repair_times, repair_start, curr_time) * total_sectors
        }
    }
}

fn next_repair_fraction(
    failed_comps: &[usize],
    repair_times: &[f64],
    repair_start: &[f64],
    curr_time: f64,
) -> f64 {
    if failed_comps.is_empty() {
        return 0.0;
    }
    let mut next_idx = failed_comps[0];
    let mut next_time = repair_times[next_idx];
    for &i in &failed_comps[1..] {
        if repair_times[i] < next_time {
            next_time = repair_times[i];
            next_idx = i;
        }
    }
    let denom = next_time - repair_start[next_idx];
    if denom.abs() < f64::EPSILON {
        0.0
    } else {
        (next_time - curr_time) / denom
    }
}
