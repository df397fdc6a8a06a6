//! Sector-level failure models layered on top of the component-level
//! semi-Markov process. Ported from `sector_fail_model.py`.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrubKind {
    Ber,
    NoScrub,
    RandomScrub,
    DeterministicScrub,
}

#[derive(Clone, Debug)]
pub struct SectorFailureModel {
    kind: ScrubKind,
    pub total_num_sectors: u64,
    sector_fail_prob: f64,
    write_ratio: f64,
    request_rate: f64,
    disk_scrub_period: f64,
}

impl SectorFailureModel {
    /// Bit-error-rate model: sector failure probability independent of
    /// scrubbing.
    pub fn ber(total_num_sectors: u64, sector_fail_prob: f64) -> Self {
        SectorFailureModel {
            kind: ScrubKind::Ber,
            total_num_sectors,
            sector_fail_prob,
            write_ratio: 1.0,
            request_rate: 1.0,
            disk_scrub_period: 0.0,
        }
    }

    pub fn no_scrub(total_num_sectors: u64, sector_fail_prob: f64, write_ratio: f64) -> Self {
        SectorFailureModel {
            kind: ScrubKind::NoScrub,
            total_num_sectors,
            sector_fail_prob,
            write_ratio,
            request_rate: 1.0,
            disk_scrub_period: 0.0,
        }
    }

    pub fn random_scrub(
        total_num_sectors: u64,
        sectors_per_region: f64,
        scrub_interval: f64,
        sector_fail_prob: f64,
        request_rate: f64,
        write_ratio: f64,
    ) -> Self {
        let disk_scrub_period = (scrub_interval / sectors_per_region) * total_num_sectors as f64;
        SectorFailureModel {
            kind: ScrubKind::RandomScrub,
            total_num_sectors,
            sector_fail_prob,
            write_ratio,
            request_rate,
            disk_scrub_period,
        }
    }

    pub fn deterministic_scrub(
        total_num_sectors: u64,
        sectors_per_region: f64,
        scrub_interval: f64,
        sector_fail_prob: f64,
        request_rate: f64,
        write_ratio: f64,
    ) -> Self {
        let disk_scrub_period = (scrub_interval / sectors_per_region) * total_num_sectors as f64;
        SectorFailureModel {
            kind: ScrubKind::DeterministicScrub,
            total_num_sectors,
            sector_fail_prob,
            write_ratio,
            request_rate,
            disk_scrub_period,
        }
    }

    /// Probability that a disk access encounters at least one bad sector
    /// somewhere on the disk, over `total_num_sectors` sectors.
    pub fn prob_of_bad_sector(&self) -> f64 {
        let n = self.total_num_sectors as f64;
        match self.kind {
            ScrubKind::Ber => 1.0 - (1.0 - self.sector_fail_prob).powf(n),
            ScrubKind::NoScrub => {
                let p = self.write_ratio * self.sector_fail_prob;
                1.0 - (1.0 - p).powf(n)
            }
            ScrubKind::RandomScrub => {
                let rp = self.request_rate * self.disk_scrub_period;
                let p = (rp / (1.0 + rp)) * (self.sector_fail_prob * self.write_ratio);
                1.0 - (1.0 - p).powf(n)
            }
            ScrubKind::DeterministicScrub => {
                let rp = self.request_rate * self.disk_scrub_period;
                let p = (1.0 - (1.0 - (-rp).exp()) / rp) * (self.sector_fail_prob * self.write_ratio);
                1.0 - (1.0 - p).powf(n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ber_probability_increases_with_sector_count() {
        let small = SectorFailureModel::ber(1_000, 1e-9);
        let large = SectorFailureModel::ber(1_000_000_000, 1e-9);
        assert!(small.prob_of_bad_sector() < large.prob_of_bad_sector());
    }

    #[test]
    fn no_scrub_probability_is_in_unit_interval() {
        let m = SectorFailureModel::no_scrub(585_937_500, 4.096e-11, 1.0);
        let p = m.prob_of_bad_sector();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn random_and_deterministic_scrub_reduce_risk_relative_to_no_scrub() {
        let total = 585_937_500u64;
        let no_scrub = SectorFailureModel::no_scrub(total, 4.096e-11, 1.0).prob_of_bad_sector();
        let random = SectorFailureModel::random_scrub(
            total,
            total as f64,
            168.0,
            4.096e-11,
            0.0045,
            1.0,
        )
        .prob_of_bad_sector();
        assert!(random <= no_scrub + 1e-6);
    }
}
