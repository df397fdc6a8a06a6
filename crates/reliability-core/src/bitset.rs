//! Packed bit-vectors and GF(2) bit-matrices used for erasure-code rank
//! checks and minimal-fault-set lookups.

const WORD_BITS: usize = 64;

/// A fixed-length vector of bits, packed into `u64` words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    pub fn new(len: usize) -> Self {
        let num_words = (len + WORD_BITS - 1) / WORD_BITS;
        BitSet {
            words: vec![0; num_words.max(1)],
            len,
        }
    }

    pub fn from_indices(len: usize, idxs: impl IntoIterator<Item = usize>) -> Self {
        let mut bs = BitSet::new(len);
        bs.set_bits(idxs);
        bs
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set_bits(&mut self, idxs: impl IntoIterator<Item = usize>) {
        for idx in idxs {
            self.words[idx / WORD_BITS] |= 1u64 << (idx % WORD_BITS);
        }
    }

    pub fn unset_bits(&mut self, idxs: impl IntoIterator<Item = usize>) {
        for idx in idxs {
            self.words[idx / WORD_BITS] &= !(1u64 << (idx % WORD_BITS));
        }
    }

    pub fn is_set(&self, idx: usize) -> bool {
        (self.words[idx / WORD_BITS] >> (idx % WORD_BITS)) & 1 == 1
    }

    pub fn set_all_ones(&mut self) {
        for w in self.words.iter_mut() {
            *w = u64::MAX;
        }
    }

    pub fn xor_store(&mut self, other: &BitSet) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a ^= b;
        }
    }

    pub fn and_store(&mut self, other: &BitSet) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= b;
        }
    }

    pub fn intersection(&self, other: &BitSet) -> BitSet {
        let mut result = self.clone();
        result.and_store(other);
        result
    }

    pub fn weight(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }
}

/// A matrix of bits stored row-major as [`BitSet`] rows.
///
/// Ported from `big_bm.py`/`bit_matrix.py`: rank is computed by Gaussian
/// elimination starting from the rightmost column, matching the erasure
/// code's convention of placing identity columns on the left
/// (`G = [I_k | P]`).
#[derive(Clone, Debug)]
pub struct BitMatrix {
    rows: Vec<BitSet>,
    num_cols: usize,
}

impl BitMatrix {
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        BitMatrix {
            rows: (0..num_rows).map(|_| BitSet::new(num_cols)).collect(),
            num_cols,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn set_row(&mut self, row_idx: usize, idxs: impl IntoIterator<Item = usize>) {
        self.rows[row_idx].set_bits(idxs);
    }

    pub fn row(&self, row_idx: usize) -> &BitSet {
        &self.rows[row_idx]
    }

    pub fn swap_rows(&mut self, r1: usize, r2: usize) {
        self.rows.swap(r1, r2);
    }

    pub fn zero_cols(&mut self, col_idxs: &[usize]) {
        let mut mask = BitSet::new(self.num_cols);
        mask.set_all_ones();
        mask.unset_bits(col_idxs.iter().copied());
        for row in self.rows.iter_mut() {
            row.and_store(&mask);
        }
    }

    fn xor_rows(&mut self, dst: usize, src: usize) {
        let src_row = self.rows[src].clone();
        self.rows[dst].xor_store(&src_row);
    }

    /// GF(2) rank via Gaussian elimination, column elimination proceeding
    /// from the rightmost column toward the left.
    pub fn rank(&self) -> usize {
        let mut m = self.clone();
        let mut rank = 0;
        let mut curr_col = m.num_cols as isize - 1;
        let mut i = 0;

        while i < m.num_rows() && curr_col >= 0 {
            let col = curr_col as usize;
            let mut swap = false;
            for j in i..m.num_rows() {
                if m.row(j).is_set(col) {
                    swap = true;
                    m.swap_rows(i, j);
                    rank += 1;
                    break;
                }
            }

            if swap {
                for j in i..m.num_rows() {
                    if j != i && m.row(j).is_set(col) {
                        m.xor_rows(j, i);
                    }
                }
                curr_col -= 1;
                i += 1;
            } else {
                curr_col -= 1;
            }
        }

        rank
    }
}

/// Build a systematic generator matrix `G = [I_k | P]` from a Tanner graph:
/// `parity_eqns[j]` lists the data-symbol indices that feed parity symbol
/// `j`.
pub fn build_generator(num_data: usize, num_parity: usize, parity_eqns: &[Vec<usize>]) -> BitMatrix {
    let mut g = BitMatrix::new(num_data, num_parity + num_data);
    for i in 0..num_data {
        let mut row_els = vec![i];
        for (j, eqn) in parity_eqns.iter().enumerate() {
            if eqn.contains(&i) {
                row_els.push(j + num_data);
            }
        }
        g.set_row(i, row_els);
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_test_bits() {
        let bs = BitSet::from_indices(50, [1, 47]);
        assert!(bs.is_set(1));
        assert!(bs.is_set(47));
        assert!(!bs.is_set(2));
    }

    #[test]
    fn rank_of_identity_is_full() {
        let mut m = BitMatrix::new(4, 4);
        for i in 0..4 {
            m.set_row(i, [i]);
        }
        assert_eq!(m.rank(), 4);
    }

    #[test]
    fn zeroing_all_parity_cols_drops_rank_below_k_for_no_redundancy() {
        // G = [I_4 | P] with a single parity column equal to the XOR of
        // all four data columns; zeroing that parity column alone must not
        // change the rank of the identity block.
        let g = build_generator(4, 1, &[vec![0, 1, 2, 3]]);
        assert_eq!(g.rank(), 4);
        let mut g2 = g.clone();
        g2.zero_cols(&[4]);
        assert_eq!(g2.rank(), 4);
    }

    #[test]
    fn zeroing_a_data_column_drops_rank() {
        let g = build_generator(4, 1, &[vec![0, 1, 2, 3]]);
        let mut g2 = g.clone();
        g2.zero_cols(&[0]);
        assert_eq!(g2.rank(), 3);
    }
}
