//! SMILES parser covering the organic subset, bracket atoms, branches, ring
//! closures (including `%nn`), and dot-separated fragments. chirality marks
//! and directional bonds are accepted but not interpreted

use std::collections::HashMap;

use thiserror::Error;

use super::{Atom, Bond, BondOrder, Molecule};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SmilesError {
    #[error("empty SMILES")]
    Empty,

    #[error("unexpected character {0:?} at position {1}")]
    UnexpectedChar(char, usize),

    #[error("unknown element {0:?} at position {1}")]
    UnknownElement(String, usize),

    #[error("unbalanced branch parentheses")]
    UnbalancedBranch,

    #[error("unterminated bracket atom at position {0}")]
    UnterminatedBracket(usize),

    #[error("unclosed ring bond {0}")]
    UnclosedRing(u32),

    #[error("bond with no atom to attach to at position {0}")]
    DanglingBond(usize),
}

pub(crate) fn parse(smiles: &str) -> Result<Molecule, SmilesError> {
    let smiles = smiles.trim();
    if smiles.is_empty() {
        return Err(SmilesError::Empty);
    }
    let mut p = Parser {
        bytes: smiles.as_bytes(),
        pos: 0,
        mol: Molecule::default(),
        prev: None,
        pending: None,
        stack: Vec::new(),
        rings: HashMap::new(),
        organic: Vec::new(),
    };
    p.run()?;
    Ok(p.mol)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    mol: Molecule,
    /// atom new bonds attach to; None right after a dot
    prev: Option<usize>,
    /// bond symbol seen since the last atom
    pending: Option<BondOrder>,
    /// saved `prev` values for open branches
    stack: Vec<usize>,
    /// ring closure number -> (atom, bond symbol at the opening)
    rings: HashMap<u32, (usize, Option<BondOrder>)>,
    /// per atom, whether it was written without brackets. only these get
    /// implicit hydrogens; a bracket atom states its hydrogens outright
    organic: Vec<bool>,
}

impl Parser<'_> {
    fn run(&mut self) -> Result<(), SmilesError> {
        while self.pos < self.bytes.len() {
            let pos = self.pos;
            let c = self.bytes[pos];
            match c {
                b'(' => {
                    let Some(prev) = self.prev else {
                        return Err(SmilesError::UnexpectedChar('(', pos));
                    };
                    self.stack.push(prev);
                    self.pos += 1;
                }
                b')' => {
                    if self.pending.is_some() {
                        return Err(SmilesError::DanglingBond(pos));
                    }
                    let Some(prev) = self.stack.pop() else {
                        return Err(SmilesError::UnbalancedBranch);
                    };
                    self.prev = Some(prev);
                    self.pos += 1;
                }
                b'-' | b'/' | b'\\' => self.set_pending(BondOrder::Single, pos)?,
                b'=' => self.set_pending(BondOrder::Double, pos)?,
                b'#' => self.set_pending(BondOrder::Triple, pos)?,
                b':' => self.set_pending(BondOrder::Aromatic, pos)?,
                b'.' => {
                    if self.pending.is_some() {
                        return Err(SmilesError::DanglingBond(pos));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'0'..=b'9' => {
                    let n = (c - b'0') as u32;
                    self.pos += 1;
                    self.ring_closure(n, pos)?;
                }
                b'%' => {
                    let n = self.percent_ring_number(pos)?;
                    self.ring_closure(n, pos)?;
                }
                b'[' => {
                    let atom = self.bracket_atom(pos)?;
                    self.add_atom(atom, false);
                }
                _ => {
                    let atom = self.organic_atom(pos)?;
                    self.add_atom(atom, true);
                }
            }
        }
        if self.pending.is_some() {
            return Err(SmilesError::DanglingBond(self.bytes.len()));
        }
        if !self.stack.is_empty() {
            return Err(SmilesError::UnbalancedBranch);
        }
        if let Some(&n) = self.rings.keys().next() {
            return Err(SmilesError::UnclosedRing(n));
        }
        self.fill_implicit_hydrogens();
        Ok(())
    }

    fn set_pending(&mut self, order: BondOrder, pos: usize) -> Result<(), SmilesError> {
        if self.prev.is_none() || self.pending.is_some() {
            return Err(SmilesError::DanglingBond(pos));
        }
        self.pending = Some(order);
        self.pos += 1;
        Ok(())
    }

    fn add_atom(&mut self, atom: Atom, organic: bool) {
        let idx = self.mol.atoms.len();
        self.mol.atoms.push(atom);
        self.organic.push(organic);
        if let Some(prev) = self.prev {
            let pending = self.pending.take();
            let order = self.resolve_order(pending, prev, idx);
            self.mol.bonds.push(Bond { a: prev, b: idx, order });
        }
        self.prev = Some(idx);
    }

    /// an unwritten bond between two aromatic atoms is aromatic, otherwise
    /// single
    fn resolve_order(&self, explicit: Option<BondOrder>, a: usize, b: usize) -> BondOrder {
        match explicit {
            Some(order) => order,
            None if self.mol.atoms[a].aromatic && self.mol.atoms[b].aromatic => {
                BondOrder::Aromatic
            }
            None => BondOrder::Single,
        }
    }

    fn ring_closure(&mut self, n: u32, pos: usize) -> Result<(), SmilesError> {
        let Some(cur) = self.prev else {
            return Err(SmilesError::UnexpectedChar(self.bytes[pos] as char, pos));
        };
        match self.rings.remove(&n) {
            Some((other, opened_with)) => {
                if other == cur {
                    // a ring bond from an atom to itself
                    return Err(SmilesError::UnexpectedChar(self.bytes[pos] as char, pos));
                }
                let explicit = self.pending.take().or(opened_with);
                let order = self.resolve_order(explicit, other, cur);
                self.mol.bonds.push(Bond { a: other, b: cur, order });
            }
            None => {
                self.rings.insert(n, (cur, self.pending.take()));
            }
        }
        Ok(())
    }

    fn percent_ring_number(&mut self, pos: usize) -> Result<u32, SmilesError> {
        // %nn is always exactly two digits
        if self.pos + 2 >= self.bytes.len() {
            return Err(SmilesError::UnexpectedChar('%', pos));
        }
        let (d1, d2) = (self.bytes[self.pos + 1], self.bytes[self.pos + 2]);
        if !d1.is_ascii_digit() || !d2.is_ascii_digit() {
            return Err(SmilesError::UnexpectedChar('%', pos));
        }
        self.pos += 3;
        Ok(((d1 - b'0') * 10 + (d2 - b'0')) as u32)
    }

    fn organic_atom(&mut self, pos: usize) -> Result<Atom, SmilesError> {
        let c = self.bytes[pos];
        let next = self.bytes.get(pos + 1).copied();
        let (atomic_number, aromatic, len) = match (c, next) {
            (b'C', Some(b'l')) => (17, false, 2),
            (b'B', Some(b'r')) => (35, false, 2),
            (b'B', _) => (5, false, 1),
            (b'C', _) => (6, false, 1),
            (b'N', _) => (7, false, 1),
            (b'O', _) => (8, false, 1),
            (b'P', _) => (15, false, 1),
            (b'S', _) => (16, false, 1),
            (b'F', _) => (9, false, 1),
            (b'I', _) => (53, false, 1),
            (b'b', _) => (5, true, 1),
            (b'c', _) => (6, true, 1),
            (b'n', _) => (7, true, 1),
            (b'o', _) => (8, true, 1),
            (b'p', _) => (15, true, 1),
            (b's', _) => (16, true, 1),
            (b'*', _) => (0, false, 1),
            _ => return Err(SmilesError::UnexpectedChar(c as char, pos)),
        };
        self.pos += len;
        Ok(Atom {
            atomic_number,
            aromatic,
            charge: 0,
            isotope: None,
            hydrogens: 0,
        })
    }

    fn bracket_atom(&mut self, open: usize) -> Result<Atom, SmilesError> {
        let end = self.bytes[open..]
            .iter()
            .position(|&b| b == b']')
            .map(|i| open + i)
            .ok_or(SmilesError::UnterminatedBracket(open))?;
        let mut i = open + 1;

        let isotope = take_digits(self.bytes, &mut i, end)
            .map(|d| d as u16);

        let (atomic_number, aromatic) = self.bracket_symbol(&mut i, end)?;

        // chirality marks are parsed past, not recorded
        while i < end && self.bytes[i] == b'@' {
            i += 1;
        }

        let mut hydrogens = 0;
        if i < end && self.bytes[i] == b'H' {
            i += 1;
            hydrogens = take_digits(self.bytes, &mut i, end).unwrap_or(1) as u8;
        }

        let mut charge = 0i8;
        if i < end && (self.bytes[i] == b'+' || self.bytes[i] == b'-') {
            let sign = if self.bytes[i] == b'+' { 1i8 } else { -1 };
            let symbol = self.bytes[i];
            i += 1;
            charge = match take_digits(self.bytes, &mut i, end) {
                Some(d) => sign * d as i8,
                None => {
                    // ++ and -- style repetition
                    let mut count = 1i8;
                    while i < end && self.bytes[i] == symbol {
                        count += 1;
                        i += 1;
                    }
                    sign * count
                }
            };
        }

        // atom class, ignored
        if i < end && self.bytes[i] == b':' {
            i += 1;
            take_digits(self.bytes, &mut i, end);
        }

        if i != end {
            return Err(SmilesError::UnexpectedChar(self.bytes[i] as char, i));
        }
        self.pos = end + 1;
        Ok(Atom {
            atomic_number,
            aromatic,
            charge,
            isotope,
            hydrogens,
        })
    }

    fn bracket_symbol(&self, i: &mut usize, end: usize) -> Result<(u8, bool), SmilesError> {
        let bytes = self.bytes;
        if *i >= end {
            return Err(SmilesError::UnknownElement(String::new(), *i));
        }
        let c = bytes[*i];
        if c == b'*' {
            *i += 1;
            return Ok((0, false));
        }
        if c.is_ascii_lowercase() {
            // aromatic symbols: two-letter se/as, otherwise one letter
            if *i + 1 < end {
                let two = &bytes[*i..*i + 2];
                if two == b"se" || two == b"as" {
                    *i += 2;
                    return Ok((if two == b"se" { 34 } else { 33 }, true));
                }
            }
            let z = match c {
                b'b' => 5,
                b'c' => 6,
                b'n' => 7,
                b'o' => 8,
                b'p' => 15,
                b's' => 16,
                _ => {
                    return Err(SmilesError::UnknownElement(
                        (c as char).to_string(),
                        *i,
                    ))
                }
            };
            *i += 1;
            return Ok((z, true));
        }
        // try the two-letter symbol before falling back to one letter
        if *i + 1 < end && bytes[*i + 1].is_ascii_lowercase() {
            let two = std::str::from_utf8(&bytes[*i..*i + 2]).unwrap();
            if let Some(z) = atomic_number(two) {
                *i += 2;
                return Ok((z, false));
            }
        }
        let one = (c as char).to_string();
        match atomic_number(&one) {
            Some(z) => {
                *i += 1;
                Ok((z, false))
            }
            None => Err(SmilesError::UnknownElement(one, *i)),
        }
    }

    /// organic-subset atoms get the hydrogens their lowest fitting default
    /// valence implies. aromatic bonds count 1.5, rounded up over the atom
    fn fill_implicit_hydrogens(&mut self) {
        let mut doubled = vec![0u32; self.mol.atoms.len()];
        for bond in &self.mol.bonds {
            let w = match bond.order {
                BondOrder::Single => 2,
                BondOrder::Double => 4,
                BondOrder::Triple => 6,
                BondOrder::Aromatic => 3,
            };
            doubled[bond.a] += w;
            doubled[bond.b] += w;
        }
        let atoms = self.mol.atoms.iter_mut().zip(doubled).zip(&self.organic);
        for ((atom, doubled), &organic) in atoms {
            if !organic {
                continue;
            }
            let used = doubled.div_ceil(2) as u8;
            for &valence in default_valences(atom.atomic_number) {
                if valence >= used {
                    atom.hydrogens = valence - used;
                    break;
                }
            }
        }
    }
}

fn take_digits(bytes: &[u8], i: &mut usize, end: usize) -> Option<u32> {
    let start = *i;
    while *i < end && bytes[*i].is_ascii_digit() {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    bytes[start..*i]
        .iter()
        .fold(Some(0u32), |acc, &b| {
            acc.and_then(|n| n.checked_mul(10))
                .and_then(|n| n.checked_add((b - b'0') as u32))
        })
}

fn default_valences(atomic_number: u8) -> &'static [u8] {
    match atomic_number {
        5 => &[3],
        6 => &[4],
        7 => &[3, 5],
        8 => &[2],
        15 => &[3, 5],
        16 => &[2, 4, 6],
        9 | 17 | 35 | 53 => &[1],
        _ => &[],
    }
}

fn atomic_number(symbol: &str) -> Option<u8> {
    let z = match symbol {
        "H" => 1,
        "He" => 2,
        "Li" => 3,
        "Be" => 4,
        "B" => 5,
        "C" => 6,
        "N" => 7,
        "O" => 8,
        "F" => 9,
        "Ne" => 10,
        "Na" => 11,
        "Mg" => 12,
        "Al" => 13,
        "Si" => 14,
        "P" => 15,
        "S" => 16,
        "Cl" => 17,
        "Ar" => 18,
        "K" => 19,
        "Ca" => 20,
        "Ti" => 22,
        "Cr" => 24,
        "Mn" => 25,
        "Fe" => 26,
        "Co" => 27,
        "Ni" => 28,
        "Cu" => 29,
        "Zn" => 30,
        "Ga" => 31,
        "Ge" => 32,
        "As" => 33,
        "Se" => 34,
        "Br" => 35,
        "Rb" => 37,
        "Sr" => 38,
        "Mo" => 42,
        "Ag" => 47,
        "Cd" => 48,
        "Sn" => 50,
        "Sb" => 51,
        "Te" => 52,
        "I" => 53,
        "Cs" => 55,
        "Ba" => 56,
        "Pt" => 78,
        "Au" => 79,
        "Hg" => 80,
        "Pb" => 82,
        "Bi" => 83,
        _ => return None,
    };
    Some(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ethanol() {
        let mol = parse("CCO").unwrap();
        assert_eq!(mol.num_atoms(), 3);
        assert_eq!(mol.num_bonds(), 2);
        let hydrogens: Vec<_> = mol.atoms.iter().map(|a| a.hydrogens).collect();
        assert_eq!(hydrogens, vec![3, 2, 1]);
    }

    #[test]
    fn benzene() {
        let mol = parse("c1ccccc1").unwrap();
        assert_eq!(mol.num_atoms(), 6);
        assert_eq!(mol.num_bonds(), 6);
        assert!(mol.atoms.iter().all(|a| a.aromatic && a.hydrogens == 1));
        assert!(mol.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn acetic_acid() {
        let mol = parse("CC(=O)O").unwrap();
        assert_eq!(mol.num_atoms(), 4);
        assert_eq!(mol.num_bonds(), 3);
        assert_eq!(
            mol.bonds.iter().filter(|b| b.order == BondOrder::Double).count(),
            1
        );
        // carbonyl carbon has no hydrogens left, the hydroxyl oxygen has one
        assert_eq!(mol.atoms[1].hydrogens, 0);
        assert_eq!(mol.atoms[3].hydrogens, 1);
    }

    #[test]
    fn bracket_atoms() {
        let ammonium = parse("[NH4+]").unwrap();
        assert_eq!(ammonium.atoms[0].charge, 1);
        assert_eq!(ammonium.atoms[0].hydrogens, 4);

        let labeled = parse("[13CH4]").unwrap();
        assert_eq!(labeled.atoms[0].isotope, Some(13));
        assert_eq!(labeled.atoms[0].hydrogens, 4);

        let sulfate_end = parse("[O-]").unwrap();
        assert_eq!(sulfate_end.atoms[0].charge, -1);

        let doubly = parse("[Ca++]").unwrap();
        assert_eq!(doubly.atoms[0].charge, 2);
    }

    #[test]
    fn pyrrole_nitrogen_keeps_bracket_hydrogen() {
        let mol = parse("c1cc[nH]c1").unwrap();
        let n = mol.atoms.iter().find(|a| a.atomic_number == 7).unwrap();
        assert!(n.aromatic);
        assert_eq!(n.hydrogens, 1);
    }

    #[test]
    fn percent_ring_closure() {
        let mol = parse("C%12CCCCC%12").unwrap();
        assert_eq!(mol.num_atoms(), 6);
        assert_eq!(mol.num_bonds(), 6);
    }

    #[test]
    fn ring_bond_order_from_opening_side() {
        let mol = parse("C=1CCCCC=1").unwrap();
        assert!(mol.bonds.iter().any(|b| b.order == BondOrder::Double));
    }

    #[test]
    fn dot_separated_fragments() {
        let mol = parse("[Na+].[Cl-]").unwrap();
        assert_eq!(mol.num_atoms(), 2);
        assert_eq!(mol.num_bonds(), 0);
    }

    #[test]
    fn directional_bonds_read_as_single() {
        let mol = parse("F/C=C/F").unwrap();
        assert_eq!(mol.num_atoms(), 4);
        assert_eq!(mol.num_bonds(), 3);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(parse(""), Err(SmilesError::Empty));
        assert_eq!(parse("   "), Err(SmilesError::Empty));
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(parse("C("), Err(SmilesError::UnbalancedBranch)));
        assert!(matches!(parse("C)C"), Err(SmilesError::UnbalancedBranch)));
        assert!(matches!(parse("C1CC"), Err(SmilesError::UnclosedRing(1))));
        assert!(matches!(parse("C="), Err(SmilesError::DanglingBond(_))));
        assert!(matches!(parse("=C"), Err(SmilesError::DanglingBond(_))));
        assert!(matches!(
            parse("not a smiles"),
            Err(SmilesError::UnexpectedChar(..))
        ));
        assert!(matches!(
            parse("[Xx]"),
            Err(SmilesError::UnknownElement(..))
        ));
        assert!(matches!(
            parse("[CH4"),
            Err(SmilesError::UnterminatedBracket(0))
        ));
    }
}
