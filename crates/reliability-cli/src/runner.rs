//! Drives `iterations` independent Monte Carlo iterations, optionally in
//! parallel via rayon, and folds the results into the same summary
//! `abl.py`'s `Simulate.run_simulation`/`do_it()` produce: a `Samples`
//! over the raw weights, a pattern histogram, and average bytes lost per
//! usable terabyte.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use reliability_common::Error;
use reliability_core::{
    run_iteration, ErasureCode, EventDriver, IsParms, Pattern, Samples, SectorFailureModel, Weibull,
};
use reliability_core::simulators::{BfbSimulator, DirectSimulator, UniformBfbSimulator};

use crate::cli::SimMode;

const BYTES_PER_SECTOR: f64 = 4096.0;

pub struct RunConfig {
    pub sim_mode: SimMode,
    pub mission_time: f64,
    pub iterations: u64,
    pub critical_region_check: bool,
    pub fail_dists: Vec<Weibull>,
    pub repair_dists: Vec<Weibull>,
    pub k_multiplier: f64,
    pub threads: Option<usize>,
}

pub struct RunReport {
    pub mean: f64,
    pub conf_interval_90: (f64, f64),
    pub relative_error_pct: f64,
    pub num_zeroes: usize,
    pub avg_bytes_lost: f64,
    pub avg_bytes_lost_per_usable_tb: f64,
    pub patterns: BTreeMap<Pattern, (u64, f64)>,
}

enum AnySimulator {
    Direct(DirectSimulator),
    Bfb(BfbSimulator),
    UniformBfb(UniformBfbSimulator),
}

fn build_simulator(
    sim_mode: &SimMode,
    fail_dists: Vec<Weibull>,
    repair_dists: Vec<Weibull>,
) -> Result<AnySimulator, Error> {
    let is_parms: IsParms = sim_mode.is_parms();
    Ok(match sim_mode {
        SimMode::Regular => AnySimulator::Direct(DirectSimulator::new(fail_dists, repair_dists)),
        SimMode::Bfb { .. } => AnySimulator::Bfb(BfbSimulator::new(fail_dists, repair_dists, is_parms)?),
        SimMode::UniformBfb { .. } => {
            AnySimulator::UniformBfb(UniformBfbSimulator::new(fail_dists, repair_dists, is_parms))
        }
    })
}

fn run_one(
    sim: &mut AnySimulator,
    erasure_code: &ErasureCode,
    sector_model: Option<&SectorFailureModel>,
    mission_time: f64,
    critical_region_check: bool,
    rng: &mut SmallRng,
) -> reliability_core::IterationOutcome {
    match sim {
        AnySimulator::Direct(s) => {
            run_iteration(s, erasure_code, sector_model, mission_time, critical_region_check, rng)
        }
        AnySimulator::Bfb(s) => {
            run_iteration(s, erasure_code, sector_model, mission_time, critical_region_check, rng)
        }
        AnySimulator::UniformBfb(s) => {
            run_iteration(s, erasure_code, sector_model, mission_time, critical_region_check, rng)
        }
    }
}

pub fn run(
    config: RunConfig,
    erasure_code: Arc<ErasureCode>,
    sector_model: Option<Arc<SectorFailureModel>>,
) -> Result<RunReport, Error> {
    if let Some(n) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| Error::Configuration(format!("failed to size thread pool: {e}")))?;
    }

    let outcomes: Vec<reliability_core::IterationOutcome> = (0..config.iterations)
        .into_par_iter()
        .map(|seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut sim = build_simulator(&config.sim_mode, config.fail_dists.clone(), config.repair_dists.clone())
                .expect("simulator preconditions already validated before the run began");
            run_one(
                &mut sim,
                &erasure_code,
                sector_model.as_deref(),
                config.mission_time,
                config.critical_region_check,
                &mut rng,
            )
        })
        .collect();

    let num_sectors_per_disk = sector_model
        .as_ref()
        .map(|m| m.total_num_sectors as f64)
        .unwrap_or(1_000_000_000.0);

    let mut patterns: BTreeMap<Pattern, (u64, f64)> = BTreeMap::new();
    let mut avg_bytes_lost = 0.0;
    let mut weights = Vec::with_capacity(outcomes.len());

    for outcome in &outcomes {
        let weight = outcome.weight.to_f64();
        weights.push(weight);

        let entry = patterns.entry(outcome.pattern).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += weight;

        if weight != 0.0 {
            let (_num_disks, num_sectors) = outcome.pattern;
            if sector_model.is_none() {
                avg_bytes_lost += num_sectors_per_disk;
            } else if num_sectors == 0 {
                avg_bytes_lost += outcome.critical_region * weight;
            } else {
                avg_bytes_lost += 1.0;
            }
        }
    }

    let n = config.iterations.max(1) as f64;
    avg_bytes_lost = (avg_bytes_lost * BYTES_PER_SECTOR) / n;

    let samples = Samples::new(weights);
    let (low_ci, high_ci) = samples.conf_interval_90();

    Ok(RunReport {
        mean: samples.mean(),
        conf_interval_90: (low_ci, high_ci),
        relative_error_pct: 100.0 * samples.relative_error(),
        num_zeroes: samples.num_zeroes(),
        avg_bytes_lost,
        avg_bytes_lost_per_usable_tb: avg_bytes_lost / config.k_multiplier,
        patterns,
    })
}
