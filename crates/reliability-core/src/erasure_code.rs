//! Erasure code description and the decodability predicate. Ported from
//! `erasure_code.py`'s `ErasureCode`.

use std::collections::BTreeMap;

use rand::Rng;
use reliability_common::Error;

use crate::bitset::{build_generator, BitMatrix, BitSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeType {
    Mds,
    FlatXor,
    ArrayXor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultCheck {
    Rank,
    Mel,
    Ftv,
    Dscft,
}

/// Parsed contents of a code description file, independent of how it was
/// read (the text-file parser lives in `reliability-cli`).
#[derive(Clone, Debug)]
pub struct CodeDescription {
    pub code_type: CodeType,
    pub k: usize,
    pub m: usize,
    pub hd: Option<usize>,
    pub min_disk_failures: usize,
    pub tanner_graph: Vec<Vec<usize>>,
    pub layout: Vec<Vec<usize>>,
    pub minimal_fault_sets: Vec<Vec<usize>>,
    /// `dsft[num_failed_disks][num_bad_sector_groups]`
    pub dsft: Vec<Vec<f64>>,
    pub ftv: Vec<f64>,
}

pub struct ErasureCode {
    pub code_type: CodeType,
    pub k: usize,
    pub m: usize,
    pub min_disk_failures: usize,
    fail_check: FaultCheck,
    layout: Vec<Vec<usize>>,
    mel_bm: Vec<BitSet>,
    dsft: Vec<Vec<f64>>,
    ftv: Vec<f64>,
    generator_matrix: Option<BitMatrix>,
    symbol_count: usize,
}

impl ErasureCode {
    pub fn new(desc: CodeDescription, fail_check: FaultCheck) -> Result<Self, Error> {
        let symbol_count = desc.k + desc.m;
        let generator_matrix = match desc.code_type {
            CodeType::FlatXor | CodeType::ArrayXor => {
                Some(build_generator(desc.k, desc.m, &desc.tanner_graph))
            }
            CodeType::Mds => None,
        };

        let mel_bm = desc
            .minimal_fault_sets
            .iter()
            .map(|idxs| BitSet::from_indices(symbol_count, idxs.iter().copied()))
            .collect();

        if matches!(fail_check, FaultCheck::Ftv) && desc.ftv.is_empty() && desc.code_type != CodeType::Mds {
            return Err(Error::Configuration(
                "fault_check=ftv requires a [fault tolerance vector] section".into(),
            ));
        }
        if matches!(fail_check, FaultCheck::Dscft) && desc.dsft.is_empty() && desc.code_type != CodeType::Mds {
            return Err(Error::Configuration(
                "fault_check=dscft requires a [Disk sector conditional fault tolerance] section".into(),
            ));
        }

        Ok(ErasureCode {
            code_type: desc.code_type,
            k: desc.k,
            m: desc.m,
            min_disk_failures: desc.min_disk_failures,
            fail_check,
            layout: desc.layout,
            mel_bm,
            dsft: desc.dsft,
            ftv: desc.ftv,
            generator_matrix,
            symbol_count,
        })
    }

    /// Determine whether `failed_disks` (with optional per-disk
    /// `failed_sectors`) results in unrecoverable data loss.
    pub fn is_failure<R: Rng + ?Sized>(
        &self,
        failed_disks: &[usize],
        failed_sectors: &[Vec<usize>],
        rng: &mut R,
    ) -> bool {
        let mut symbol_errors: Vec<usize> = Vec::new();
        let mut unique_sectors: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

        if failed_sectors.is_empty() {
            unique_sectors.insert(0, Vec::new());
        }

        match self.code_type {
            CodeType::Mds | CodeType::FlatXor => {
                symbol_errors = failed_disks.to_vec();
                for (comp, sectors) in failed_sectors.iter().enumerate() {
                    if failed_disks.contains(&comp) {
                        continue;
                    }
                    for &sector in sectors {
                        unique_sectors.entry(sector).or_default().push(comp);
                    }
                }
            }
            CodeType::ArrayXor => {
                for &disk in failed_disks {
                    symbol_errors.extend(self.layout[disk].iter().copied());
                }
                for (comp, sectors) in failed_sectors.iter().enumerate() {
                    if failed_disks.contains(&comp) {
                        continue;
                    }
                    let stripe_width = self.layout[comp].len();
                    for &sector in sectors {
                        let stripe_num = sector / stripe_width;
                        let sym = self.layout[comp][sector % stripe_width];
                        unique_sectors.entry(stripe_num).or_default().push(sym);
                    }
                }
            }
        }

        if self.code_type == CodeType::Mds {
            return unique_sectors
                .values()
                .any(|sectors| self.m < symbol_errors.len() + sectors.len());
        }

        match self.fail_check {
            FaultCheck::Rank => {
                let generator = self.generator_matrix.as_ref().expect("xor code has generator");
                for sectors in unique_sectors.values() {
                    let mut cols: Vec<usize> = symbol_errors.clone();
                    cols.extend(sectors.iter().copied());
                    let mut temp = generator.clone();
                    temp.zero_cols(&cols);
                    return self.k > temp.rank();
                }
                false
            }
            FaultCheck::Mel => {
                for sectors in unique_sectors.values() {
                    let mut cols: Vec<usize> = symbol_errors.clone();
                    cols.extend(sectors.iter().copied());
                    let errors_bm = BitSet::from_indices(self.symbol_count, cols);
                    for me_pattern in &self.mel_bm {
                        if &errors_bm.intersection(me_pattern) == me_pattern {
                            return true;
                        }
                    }
                }
                false
            }
            FaultCheck::Ftv => {
                for sectors in unique_sectors.values() {
                    let n = symbol_errors.len() + sectors.len();
                    if n == 0 {
                        continue;
                    }
                    let draw: f64 = rng.random();
                    if draw < self.ftv[n - 1] {
                        return true;
                    }
                }
                false
            }
            FaultCheck::Dscft => {
                if failed_disks.len() >= self.dsft.len() {
                    return true;
                }
                let draw: f64 = rng.random();
                if draw < self.dsft[failed_disks.len()][0] {
                    return true;
                }
                for sectors in unique_sectors.values() {
                    if sectors.is_empty() {
                        continue;
                    }
                    let draw: f64 = rng.random();
                    if draw < self.dsft[failed_disks.len()][sectors.len()] {
                        return true;
                    }
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn mds(k: usize, m: usize) -> ErasureCode {
        let desc = CodeDescription {
            code_type: CodeType::Mds,
            k,
            m,
            hd: Some(m + 1),
            min_disk_failures: m,
            tanner_graph: vec![],
            layout: vec![],
            minimal_fault_sets: vec![],
            dsft: vec![],
            ftv: vec![],
        };
        ErasureCode::new(desc, FaultCheck::Rank).unwrap()
    }

    #[test]
    fn mds_tolerates_up_to_m_failures() {
        let ec = mds(10, 4);
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(!ec.is_failure(&[0, 1, 2, 3], &[], &mut rng));
        assert!(ec.is_failure(&[0, 1, 2, 3, 4], &[], &mut rng));
    }

    #[test]
    fn flat_xor_rank_check_matches_generator() {
        let desc = CodeDescription {
            code_type: CodeType::FlatXor,
            k: 4,
            m: 1,
            hd: Some(2),
            min_disk_failures: 2,
            tanner_graph: vec![vec![0, 1, 2, 3]],
            layout: vec![],
            minimal_fault_sets: vec![],
            dsft: vec![],
            ftv: vec![],
        };
        let ec = ErasureCode::new(desc, FaultCheck::Rank).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(!ec.is_failure(&[0], &[], &mut rng));
        assert!(ec.is_failure(&[0, 1], &[], &mut rng));
    }

    #[test]
    fn ftv_without_vector_is_a_configuration_error() {
        let desc = CodeDescription {
            code_type: CodeType::FlatXor,
            k: 4,
            m: 1,
            hd: Some(2),
            min_disk_failures: 2,
            tanner_graph: vec![vec![0, 1, 2, 3]],
            layout: vec![],
            minimal_fault_sets: vec![],
            dsft: vec![],
            ftv: vec![],
        };
        assert!(ErasureCode::new(desc, FaultCheck::Ftv).is_err());
    }
}
