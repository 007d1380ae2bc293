//! a small molecular graph layer: SMILES parsing, ring perception, and Morgan
//! fingerprints. covers the subset of RDKit this crate actually calls,
//! without the native dependency

use smiles::SmilesError;

pub mod bitvector;
pub mod fingerprint;
pub mod smiles;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Atom {
    pub atomic_number: u8,

    /// lowercase in the input notation
    pub aromatic: bool,

    pub charge: i8,

    pub isotope: Option<u16>,

    /// total attached hydrogens: the bracket H count for bracket atoms,
    /// filled from default valences otherwise
    pub hydrogens: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
}

impl Molecule {
    pub fn from_smiles(smiles: &str) -> Result<Self, SmilesError> {
        smiles::parse(smiles)
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    /// adjacency list of `(neighbor, bond order)` pairs per atom
    pub(crate) fn adjacency(&self) -> Vec<Vec<(usize, BondOrder)>> {
        let mut adj = vec![Vec::new(); self.atoms.len()];
        for bond in &self.bonds {
            adj[bond.a].push((bond.b, bond.order));
            adj[bond.b].push((bond.a, bond.order));
        }
        adj
    }

    /// flags the atoms that sit on at least one cycle. a bond is part of a
    /// cycle iff it is not a bridge, so this runs one bridge-finding DFS
    pub fn ring_atoms(&self) -> Vec<bool> {
        let n = self.atoms.len();
        let mut adj = vec![Vec::new(); n];
        for (e, bond) in self.bonds.iter().enumerate() {
            adj[bond.a].push((bond.b, e));
            adj[bond.b].push((bond.a, e));
        }

        let mut disc = vec![usize::MAX; n];
        let mut low = vec![0; n];
        let mut bridge = vec![false; self.bonds.len()];
        let mut timer = 0;
        for start in 0..n {
            if disc[start] == usize::MAX {
                dfs_bridges(
                    start,
                    usize::MAX,
                    &adj,
                    &mut disc,
                    &mut low,
                    &mut bridge,
                    &mut timer,
                );
            }
        }

        let mut in_ring = vec![false; n];
        for (e, bond) in self.bonds.iter().enumerate() {
            if !bridge[e] {
                in_ring[bond.a] = true;
                in_ring[bond.b] = true;
            }
        }
        in_ring
    }
}

fn dfs_bridges(
    u: usize,
    parent_edge: usize,
    adj: &[Vec<(usize, usize)>],
    disc: &mut [usize],
    low: &mut [usize],
    bridge: &mut [bool],
    timer: &mut usize,
) {
    disc[u] = *timer;
    low[u] = *timer;
    *timer += 1;
    for &(v, e) in &adj[u] {
        if e == parent_edge {
            continue;
        }
        if disc[v] == usize::MAX {
            dfs_bridges(v, e, adj, disc, low, bridge, timer);
            low[u] = low[u].min(low[v]);
            if low[v] > disc[u] {
                bridge[e] = true;
            }
        } else {
            low[u] = low[u].min(disc[v]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_atoms_cyclohexane() {
        let mol = Molecule::from_smiles("C1CCCCC1").unwrap();
        assert_eq!(mol.ring_atoms(), vec![true; 6]);
    }

    #[test]
    fn ring_atoms_toluene() {
        // methyl carbon comes first and is the only acyclic atom
        let mol = Molecule::from_smiles("Cc1ccccc1").unwrap();
        let want = vec![false, true, true, true, true, true, true];
        assert_eq!(mol.ring_atoms(), want);
    }

    #[test]
    fn ring_atoms_chain() {
        let mol = Molecule::from_smiles("CCO").unwrap();
        assert_eq!(mol.ring_atoms(), vec![false; 3]);
    }
}
