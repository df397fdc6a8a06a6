//! Command-line surface for `relsim`, mirroring the flag table of the
//! original `abl.py` argument parser one-for-one.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use reliability_core::{FaultCheck, IsParms};

/// Error type for the hand-rolled `FromStr` impls below, so clap's derive
/// can wrap parse failures the same way it does for its own types.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ParseArgError(String);

impl From<String> for ParseArgError {
    fn from(s: String) -> Self {
        ParseArgError(s)
    }
}

#[derive(Clone, Debug)]
pub enum SimMode {
    Regular,
    Bfb { forcing_prob: f64, fb_prob: f64 },
    UniformBfb { forcing_prob: f64, fb_prob: f64 },
}

impl FromStr for SimMode {
    type Err = ParseArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "reg" {
            return Ok(SimMode::Regular);
        }

        let inner = s
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| format!("sim_mode '{s}' must be \"reg\" or \"(kind, forcing_prob, fb_prob)\""))?;

        let parts: Vec<&str> = inner.split(',').map(|p| p.trim().trim_matches('\'').trim_matches('"')).collect();
        if parts.len() != 3 {
            return Err(format!("sim_mode '{s}' needs exactly 3 components").into());
        }
        let forcing_prob: f64 = parts[1].parse().map_err(|_| format!("bad forcing_prob in '{s}'"))?;
        let fb_prob: f64 = parts[2].parse().map_err(|_| format!("bad fb_prob in '{s}'"))?;

        match parts[0] {
            "bfb" => Ok(SimMode::Bfb { forcing_prob, fb_prob }),
            "unif" => Ok(SimMode::UniformBfb { forcing_prob, fb_prob }),
            other => Err(format!("unknown sim_mode kind '{other}'").into()),
        }
    }
}

impl SimMode {
    pub fn is_parms(&self) -> IsParms {
        match self {
            SimMode::Regular => IsParms::default(),
            SimMode::Bfb { forcing_prob, fb_prob } | SimMode::UniformBfb { forcing_prob, fb_prob } => IsParms {
                forcing_prob: *forcing_prob,
                fb_prob: *fb_prob,
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum FaultCheckArg {
    Ftv,
    Mel,
    Rank,
    Dscft,
}

impl FromStr for FaultCheckArg {
    type Err = ParseArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ftv" => Ok(FaultCheckArg::Ftv),
            "mel" => Ok(FaultCheckArg::Mel),
            "rank" => Ok(FaultCheckArg::Rank),
            "dscft" => Ok(FaultCheckArg::Dscft),
            other => Err(format!("fault_check must be one of ftv/mel/rank/dscft, got '{other}'").into()),
        }
    }
}

impl From<FaultCheckArg> for FaultCheck {
    fn from(a: FaultCheckArg) -> FaultCheck {
        match a {
            FaultCheckArg::Ftv => FaultCheck::Ftv,
            FaultCheckArg::Mel => FaultCheck::Mel,
            FaultCheckArg::Rank => FaultCheck::Rank,
            FaultCheckArg::Dscft => FaultCheck::Dscft,
        }
    }
}

/// `(shape, scale, location)` parsed from `"(scale)"`, `"(shape, scale)"`
/// or `"(shape, scale, location)"`, matching `abl.py`'s own flexible
/// component-distribution flag shape.
#[derive(Clone, Copy, Debug)]
pub struct WeibullArg {
    pub shape: f64,
    pub scale: f64,
    pub location: f64,
}

impl FromStr for WeibullArg {
    type Err = ParseArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(s.trim());
        let parts: Vec<f64> = inner
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| format!("component distribution '{s}' must be numeric"))?;

        match parts.as_slice() {
            [scale] => Ok(WeibullArg {
                shape: 1.0,
                scale: *scale,
                location: 0.0,
            }),
            [shape, scale] => Ok(WeibullArg {
                shape: *shape,
                scale: *scale,
                location: 0.0,
            }),
            [shape, scale, location] => Ok(WeibullArg {
                shape: *shape,
                scale: *scale,
                location: *location,
            }),
            _ => Err(format!("component distribution '{s}' takes 1, 2 or 3 numbers").into()),
        }
    }
}

/// A parsed `-S/--sector_failure_model` value: either the 2-tuple BER
/// shorthand or the 7-tuple scrubbing form, matching `abl.py`'s own
/// flexible flag shape (a bare BER pair, or `(kind, ...)` for scrubbing).
#[derive(Clone, Copy, Debug)]
pub enum SectorModelArg {
    Ber { total_num_sectors: u64, sector_fail_prob: f64 },
    RandomScrub {
        total_num_sectors: u64,
        sector_fail_prob: f64,
        sectors_per_region: f64,
        scrub_interval: f64,
        request_rate: f64,
        write_ratio: f64,
    },
    DeterministicScrub {
        total_num_sectors: u64,
        sector_fail_prob: f64,
        sectors_per_region: f64,
        scrub_interval: f64,
        request_rate: f64,
        write_ratio: f64,
    },
}

impl FromStr for SectorModelArg {
    type Err = ParseArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| format!("sector_failure_model '{s}' must be parenthesized"))?;
        let parts: Vec<&str> = inner.split(',').map(|p| p.trim().trim_matches('\'').trim_matches('"')).collect();

        match parts.as_slice() {
            [total, prob] => Ok(SectorModelArg::Ber {
                total_num_sectors: total.parse().map_err(|_| format!("bad total_num_sectors in '{s}'"))?,
                sector_fail_prob: prob.parse().map_err(|_| format!("bad sector_fail_prob in '{s}'"))?,
            }),
            [kind, total, prob, sectors_per_region, scrub_interval, request_rate, write_ratio] => {
                let total_num_sectors: u64 =
                    total.parse().map_err(|_| format!("bad total_num_sectors in '{s}'"))?;
                let sector_fail_prob: f64 =
                    prob.parse().map_err(|_| format!("bad sector_fail_prob in '{s}'"))?;
                let sectors_per_region: f64 = sectors_per_region
                    .parse()
                    .map_err(|_| format!("bad sectors_per_region in '{s}'"))?;
                let scrub_interval: f64 =
                    scrub_interval.parse().map_err(|_| format!("bad scrub_interval in '{s}'"))?;
                let request_rate: f64 =
                    request_rate.parse().map_err(|_| format!("bad request_rate in '{s}'"))?;
                let write_ratio: f64 =
                    write_ratio.parse().map_err(|_| format!("bad write_ratio in '{s}'"))?;
                match *kind {
                    "random" => Ok(SectorModelArg::RandomScrub {
                        total_num_sectors,
                        sector_fail_prob,
                        sectors_per_region,
                        scrub_interval,
                        request_rate,
                        write_ratio,
                    }),
                    "deterministic" => Ok(SectorModelArg::DeterministicScrub {
                        total_num_sectors,
                        sector_fail_prob,
                        sectors_per_region,
                        scrub_interval,
                        request_rate,
                        write_ratio,
                    }),
                    other => Err(format!("unknown sector_failure_model kind '{other}'").into()),
                }
            }
            _ => Err(format!("sector_failure_model '{s}' needs 2 (BER) or 7 (scrubbing) fields").into()),
        }
    }
}

impl SectorModelArg {
    pub fn build(self) -> reliability_core::SectorFailureModel {
        use reliability_core::SectorFailureModel;
        match self {
            SectorModelArg::Ber { total_num_sectors, sector_fail_prob } => {
                SectorFailureModel::ber(total_num_sectors, sector_fail_prob)
            }
            SectorModelArg::RandomScrub {
                total_num_sectors,
                sector_fail_prob,
                sectors_per_region,
                scrub_interval,
                request_rate,
                write_ratio,
            } => SectorFailureModel::random_scrub(
                total_num_sectors,
                sectors_per_region,
                scrub_interval,
                sector_fail_prob,
                request_rate,
                write_ratio,
            ),
            SectorModelArg::DeterministicScrub {
                total_num_sectors,
                sector_fail_prob,
                sectors_per_region,
                scrub_interval,
                request_rate,
                write_ratio,
            } => SectorFailureModel::deterministic_scrub(
                total_num_sectors,
                sectors_per_region,
                scrub_interval,
                sector_fail_prob,
                request_rate,
                write_ratio,
            ),
        }
    }
}

/// Monte Carlo estimator of unrecoverable-data-loss probability for a
/// redundant disk array protected by an erasure code.
#[derive(Parser, Debug)]
#[command(name = "relsim", version, about)]
pub struct Args {
    /// Sampling strategy: "reg" for direct simulation, or
    /// "(bfb, forcing_prob, fb_prob)" / "(unif, forcing_prob, fb_prob)"
    /// for the two importance-sampling variants. forcing_prob is accepted
    /// for compatibility but has no effect on sampling.
    #[arg(short = 's', long = "sim_mode", default_value = "(unif, 0.8, 0.3)")]
    pub sim_mode: SimMode,

    /// Mission time in hours.
    #[arg(short = 'm', long = "mission_time", default_value_t = 35040.0)]
    pub mission_time: f64,

    /// Number of components (disks); must agree with the code file.
    #[arg(short = 'n', long = "num_components")]
    pub num_components: Option<usize>,

    /// Number of Monte Carlo iterations.
    #[arg(short = 'i', long = "iterations", default_value_t = 10_000)]
    pub iterations: u64,

    /// Data-loss bookkeeping strategy: ftv, mel, rank, or dscft.
    #[arg(short = 'f', long = "fault_check", default_value = "ftv")]
    pub fault_check: FaultCheckArg,

    /// Track the critical region (exposure window) during the fault check.
    /// On by default; pass `-c false` to disable.
    #[arg(short = 'c', long = "critical_check", default_value_t = true, action = clap::ArgAction::Set)]
    pub critical_check: bool,

    /// Code specification file name, resolved under `codes/`.
    #[arg(short = 'C', long = "code_file", default_value = "rs_10_4")]
    pub code_file: PathBuf,

    /// Sector failure model: "(total_num_sectors, sector_fail_prob)" for
    /// BER, or "(kind, total_num_sectors, sector_fail_prob,
    /// sectors_per_region, scrub_interval, request_rate, write_ratio)"
    /// where kind is "random" or "deterministic".
    #[arg(short = 'S', long = "sector_failure_model")]
    pub sector_failure_model: Option<SectorModelArg>,

    /// Component failure distribution: "(shape, scale)" or
    /// "(shape, scale, location)".
    #[arg(short = 'F', long = "component_fail_dist", default_value = "(1.12, 281257.0)")]
    pub component_fail_dist: WeibullArg,

    /// Component repair distribution: "(shape, scale)" or
    /// "(shape, scale, location)".
    #[arg(short = 'R', long = "component_repair_dist", default_value = "(2.0, 24.0, 12.0)")]
    pub component_repair_dist: WeibullArg,

    /// Usable-capacity multiplier used to convert total bytes lost into
    /// bytes lost per usable terabyte.
    #[arg(short = 'k', long = "k", default_value_t = 37.253)]
    pub k: f64,

    /// Number of worker threads for the iteration loop (rayon). Defaults
    /// to the number of logical CPUs.
    #[arg(long = "threads")]
    pub threads: Option<usize>,
}
