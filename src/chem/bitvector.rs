//! fixed-width bit vector backing the fingerprints

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<u64>,
    n_bits: usize,
}

impl BitVector {
    pub fn new(n_bits: usize) -> Self {
        Self {
            words: vec![0; n_bits.div_ceil(64)],
            n_bits,
        }
    }

    pub fn n_bits(&self) -> usize {
        self.n_bits
    }

    pub fn set(&mut self, bit: usize) {
        debug_assert!(bit < self.n_bits);
        self.words[bit / 64] |= 1 << (bit % 64);
    }

    pub fn get(&self, bit: usize) -> bool {
        debug_assert!(bit < self.n_bits);
        self.words[bit / 64] & (1 << (bit % 64)) != 0
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn intersection_count(&self, other: &Self) -> u32 {
        debug_assert_eq!(self.n_bits, other.n_bits);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones())
            .sum()
    }

    pub fn union_count(&self, other: &Self) -> u32 {
        debug_assert_eq!(self.n_bits, other.n_bits);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a | b).count_ones())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut bv = BitVector::new(128);
        bv.set(0);
        bv.set(63);
        bv.set(64);
        bv.set(127);
        assert!(bv.get(0) && bv.get(63) && bv.get(64) && bv.get(127));
        assert!(!bv.get(1));
        assert_eq!(bv.count_ones(), 4);
    }

    #[test]
    fn set_is_idempotent() {
        let mut bv = BitVector::new(64);
        bv.set(7);
        bv.set(7);
        assert_eq!(bv.count_ones(), 1);
    }

    #[test]
    fn counts() {
        let mut a = BitVector::new(64);
        let mut b = BitVector::new(64);
        a.set(1);
        a.set(2);
        b.set(2);
        b.set(3);
        assert_eq!(a.intersection_count(&b), 1);
        assert_eq!(a.union_count(&b), 3);
    }
}
