//! `relsim`: Monte Carlo estimator of unrecoverable-data-loss probability
//! for a redundant disk array protected by an erasure code. Ported from
//! `abl.py`'s `main()`/`do_it()`.

mod cli;
mod code_file;
mod runner;

use std::sync::Arc;

use clap::Parser;
use reliability_core::{ErasureCode, SectorFailureModel, Weibull};
use tracing_subscriber::EnvFilter;

use cli::{Args, SimMode};
use runner::RunConfig;

const DEFAULT_SECTOR_MODEL_TOTAL_SECTORS: u64 = 1_000_000_000;
const DEFAULT_SECTOR_MODEL_FAIL_PROB: f64 = 3.2768e-10;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    match run(Args::parse()) {
        Ok(()) => {}
        Err(e) => {
            tracing::error!("{e:#}");
            std::process::exit(2);
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if let SimMode::Bfb { forcing_prob, .. } | SimMode::UniformBfb { forcing_prob, .. } = args.sim_mode {
        tracing::info!(forcing_prob, "forcing_prob is accepted for compatibility but has no effect on sampling");
    }

    let code_path = resolve_code_path(&args.code_file);
    let desc = code_file::parse_code_file(&code_path).map_err(|e| {
        anyhow::anyhow!("failed to load code description {}: {e}", code_path.display())
    })?;

    let n = match args.num_components {
        Some(n) => {
            if n < desc.k + desc.m {
                anyhow::bail!(
                    "num_components ({n}) is smaller than k+m ({}) from {}",
                    desc.k + desc.m,
                    code_path.display()
                );
            }
            n
        }
        None => desc.k + desc.m,
    };

    let fault_check = args.fault_check.into();
    let erasure_code = Arc::new(
        ErasureCode::new(desc, fault_check)
            .map_err(|e| anyhow::anyhow!("invalid code description: {e}"))?,
    );

    let sector_model = Arc::new(args.sector_failure_model.map(cli::SectorModelArg::build).unwrap_or_else(|| {
        SectorFailureModel::ber(DEFAULT_SECTOR_MODEL_TOTAL_SECTORS, DEFAULT_SECTOR_MODEL_FAIL_PROB)
    }));

    let fail_dist = Weibull::new(
        args.component_fail_dist.shape,
        args.component_fail_dist.scale,
        args.component_fail_dist.location,
    );
    let repair_dist = Weibull::new(
        args.component_repair_dist.shape,
        args.component_repair_dist.scale,
        args.component_repair_dist.location,
    );

    let config = RunConfig {
        sim_mode: args.sim_mode,
        mission_time: args.mission_time,
        iterations: args.iterations,
        critical_region_check: args.critical_check,
        fail_dists: vec![fail_dist; n],
        repair_dists: vec![repair_dist; n],
        k_multiplier: args.k,
        threads: args.threads,
    };

    tracing::info!(
        iterations = config.iterations,
        mission_time = config.mission_time,
        components = n,
        "starting simulation"
    );

    let report = runner::run(config, erasure_code, Some(sector_model))
        .map_err(|e| anyhow::anyhow!("simulation failed: {e}"))?;

    print_report(&report);
    Ok(())
}

/// Resolve a bare code-file name under `codes/`, trying the current
/// working directory first and falling back to the crate's own shipped
/// fixtures (so `relsim` works whether invoked from the workspace root or
/// from `crates/reliability-cli/`). Explicit paths (anything with more
/// than one component, or absolute) are used as-is.
fn resolve_code_path(code_file: &std::path::Path) -> std::path::PathBuf {
    if code_file.is_absolute() || code_file.components().count() > 1 {
        return code_file.to_path_buf();
    }
    let cwd_relative = std::path::Path::new("codes").join(code_file);
    if cwd_relative.exists() {
        return cwd_relative;
    }
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("codes").join(code_file)
}

fn print_report(report: &runner::RunReport) {
    println!("mean P(loss)          = {:.6e}", report.mean);
    println!(
        "90% confidence int.   = [{:.6e}, {:.6e}]",
        report.conf_interval_90.0, report.conf_interval_90.1
    );
    println!("relative error        = {:.2}%", report.relative_error_pct);
    println!("non-loss iterations   = {}", report.num_zeroes);
    println!("avg bytes lost        = {:.3e}", report.avg_bytes_lost);
    println!("avg bytes lost/usable TB = {:.3e}", report.avg_bytes_lost_per_usable_tb);
    println!();
    println!("loss pattern histogram (num_failed_disks, has_sector_loss) -> (count, summed weight)");
    for (pattern, (count, weight)) in &report.patterns {
        println!("  ({}, {}) -> {} samples, weight {:.6e}", pattern.0, pattern.1, count, weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_bare_filename_under_codes_dir() {
        let p = resolve_code_path(std::path::Path::new("rs_10_4"));
        assert_eq!(p, std::path::Path::new("codes/rs_10_4"));
    }

    #[test]
    fn leaves_explicit_paths_alone() {
        let p = resolve_code_path(std::path::Path::new("custom/rs_10_4"));
        assert_eq!(p, std::path::Path::new("custom/rs_10_4"));
    }
}
