//! Morgan-style circular fingerprints and Tanimoto similarity.
//!
//! Each atom starts from a hash of its local invariants (element, charge,
//! hydrogen count, isotope, aromaticity, degree, ring membership) and is
//! rehashed per round together with its sorted neighbor environment, setting
//! one bit per atom per round. The hash is order-independent over atom input
//! order, so two SMILES spellings of the same graph produce the same bits.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::bitvector::BitVector;
use super::{BondOrder, Molecule};

/// defaults matching a Morgan generator with radius=2, fpSize=2048
pub const DEFAULT_RADIUS: u32 = 2;
pub const DEFAULT_N_BITS: usize = 2048;

fn bond_code(order: BondOrder) -> u8 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
    }
}

impl Molecule {
    /// a zero-width request yields an empty fingerprint rather than dividing
    /// by the bit count
    pub fn morgan_fingerprint(&self, radius: u32, n_bits: usize) -> BitVector {
        let mut fp = BitVector::new(n_bits);
        if self.atoms.is_empty() || n_bits == 0 {
            return fp;
        }

        let adj = self.adjacency();
        let in_ring = self.ring_atoms();

        let mut ids: Vec<u64> = self
            .atoms
            .iter()
            .enumerate()
            .map(|(i, atom)| {
                let mut h = DefaultHasher::new();
                (
                    atom.atomic_number,
                    atom.charge,
                    atom.hydrogens,
                    atom.isotope,
                    atom.aromatic,
                    adj[i].len() as u8,
                    in_ring[i],
                )
                    .hash(&mut h);
                h.finish()
            })
            .collect();

        for &id in &ids {
            fp.set((id % n_bits as u64) as usize);
        }

        for round in 1..=radius {
            let mut next = Vec::with_capacity(ids.len());
            for (i, &id) in ids.iter().enumerate() {
                let mut env: Vec<(u8, u64)> = adj[i]
                    .iter()
                    .map(|&(j, order)| (bond_code(order), ids[j]))
                    .collect();
                env.sort_unstable();

                let mut h = DefaultHasher::new();
                (round, id, env).hash(&mut h);
                let widened = h.finish();
                fp.set((widened % n_bits as u64) as usize);
                next.push(widened);
            }
            ids = next;
        }

        fp
    }
}

/// fraction of shared on-bits, in [0,1]. two all-zero fingerprints score 0.0
pub fn tanimoto(a: &BitVector, b: &BitVector) -> f64 {
    let union = a.union_count(b);
    if union == 0 {
        return 0.0;
    }
    a.intersection_count(b) as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn fp(smiles: &str) -> BitVector {
        Molecule::from_smiles(smiles)
            .unwrap()
            .morgan_fingerprint(DEFAULT_RADIUS, DEFAULT_N_BITS)
    }

    #[test]
    fn self_similarity_is_one() {
        for smiles in ["CCO", "c1ccccc1", "CC(=O)Oc1ccccc1C(=O)O"] {
            assert_abs_diff_eq!(tanimoto(&fp(smiles), &fp(smiles)), 1.0);
        }
    }

    #[test]
    fn spelling_invariance() {
        // same graph written from the other end
        assert_eq!(fp("CCO"), fp("OCC"));
        assert_eq!(fp("CC(=O)O"), fp("OC(C)=O"));
    }

    #[test]
    fn different_molecules_share_fewer_bits() {
        let ethanol = fp("CCO");
        let aspirin = fp("CC(=O)Oc1ccccc1C(=O)O");
        assert_ne!(ethanol.count_ones(), aspirin.count_ones());
        let t = tanimoto(&ethanol, &aspirin);
        assert!(t < 1.0);
    }

    #[test]
    fn bounded_in_unit_interval() {
        let pairs = [
            ("CCO", "CCN"),
            ("c1ccccc1", "Cc1ccccc1"),
            ("CC(=O)O", "CCCCCC"),
            ("[Na+].[Cl-]", "O"),
        ];
        for (a, b) in pairs {
            let t = tanimoto(&fp(a), &fp(b));
            assert!((0.0..=1.0).contains(&t), "{a} vs {b}: {t}");
        }
    }

    #[test]
    fn empty_fingerprints_score_zero() {
        let a = BitVector::new(DEFAULT_N_BITS);
        let b = BitVector::new(DEFAULT_N_BITS);
        assert_abs_diff_eq!(tanimoto(&a, &b), 0.0);
    }

    #[test]
    fn zero_width_fingerprint_is_empty() {
        let fp = Molecule::from_smiles("CCO")
            .unwrap()
            .morgan_fingerprint(DEFAULT_RADIUS, 0);
        assert_eq!(fp.n_bits(), 0);
        assert_eq!(fp.count_ones(), 0);
    }

    #[test]
    fn radius_zero_still_sets_bits() {
        let fp = Molecule::from_smiles("CCO")
            .unwrap()
            .morgan_fingerprint(0, 1024);
        assert!(fp.count_ones() > 0);
    }
}
