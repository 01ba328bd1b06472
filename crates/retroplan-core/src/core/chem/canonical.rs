use crate::core::models::molecule::IdentityKey;
use phf::{Set, phf_set};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors raised when a molecular string cannot be turned into a molecule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChemError {
    #[error("Unparsable molecule: '{0}'")]
    Unparsable(String),

    #[error("Cannot derive identity key for '{smiles}': {reason}")]
    IdentityKey { smiles: String, reason: String },
}

/// Normalizes molecular strings and derives identity keys.
///
/// Implementations must be pure: the same input always yields the same canonical
/// string and the same key.
pub trait Canonicalizer {
    /// Returns the canonical form of `smiles`, or `None` if it does not parse.
    fn canonicalize(&self, smiles: &str) -> Option<String>;

    /// Returns the identity key of `smiles`.
    ///
    /// # Errors
    ///
    /// Fails if the string is unparsable or no structural hash can be computed.
    fn identity_key(&self, smiles: &str) -> Result<IdentityKey, ChemError>;
}

static ORGANIC_SUBSET: Set<&'static str> = phf_set! {
    "B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I",
};

static AROMATIC_ORGANIC: Set<&'static str> = phf_set! {
    "b", "c", "n", "o", "p", "s",
};

static BRACKET_ELEMENTS: Set<&'static str> = phf_set! {
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga",
    "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd",
    "Ag", "Cd", "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm",
    "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os",
    "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa",
    "U", "Np", "Pu",
    "b", "c", "n", "o", "p", "s", "se", "as", "te", "si",
};

const BOND_SYMBOLS: &[char] = &['-', '=', '#', '$', ':', '/', '\\'];

/// A structural SMILES validator and normalizer.
///
/// The canonical form is the trimmed input with atom-map numbers removed from bracket
/// atoms; it is not a graph canonicalization, so two different spellings of one compound
/// keep different keys. The identity key is the first 14 uppercase hex characters of the
/// SHA-256 digest of the canonical form.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmilesCanonicalizer;

impl SmilesCanonicalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Canonicalizer for SmilesCanonicalizer {
    fn canonicalize(&self, smiles: &str) -> Option<String> {
        normalize(smiles)
    }

    fn identity_key(&self, smiles: &str) -> Result<IdentityKey, ChemError> {
        let canonical =
            normalize(smiles).ok_or_else(|| ChemError::Unparsable(smiles.to_string()))?;
        let digest = Sha256::digest(canonical.as_bytes());
        let hash = hex::encode_upper(digest);
        IdentityKey::from_hash(&hash).ok_or_else(|| ChemError::IdentityKey {
            smiles: canonical,
            reason: "structural hash is too short".to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Atom,
    Bond,
    Open,
    Close,
    Dot,
}

fn normalize(smiles: &str) -> Option<String> {
    let chars: Vec<char> = smiles.trim().chars().collect();
    if chars.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(chars.len());
    let mut prev = Prev::Start;
    let mut depth = 0usize;
    let mut open_rings: BTreeSet<u32> = BTreeSet::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '[' => {
                let close = chars[i + 1..].iter().position(|&ch| ch == ']')? + i + 1;
                let inner: String = chars[i + 1..close].iter().collect();
                out.push('[');
                out.push_str(&normalize_bracket_atom(&inner)?);
                out.push(']');
                prev = Prev::Atom;
                i = close + 1;
            }
            '(' => {
                if !matches!(prev, Prev::Atom | Prev::Close) {
                    return None;
                }
                depth += 1;
                out.push(c);
                prev = Prev::Open;
                i += 1;
            }
            ')' => {
                if depth == 0 || !matches!(prev, Prev::Atom | Prev::Close) {
                    return None;
                }
                depth -= 1;
                out.push(c);
                prev = Prev::Close;
                i += 1;
            }
            '.' => {
                if depth != 0 || !matches!(prev, Prev::Atom | Prev::Close) {
                    return None;
                }
                out.push(c);
                prev = Prev::Dot;
                i += 1;
            }
            '%' | '0'..='9' => {
                if !matches!(prev, Prev::Atom | Prev::Bond) {
                    return None;
                }
                let (ring, consumed) = if c == '%' {
                    let d1 = chars.get(i + 1)?.to_digit(10)?;
                    let d2 = chars.get(i + 2)?.to_digit(10)?;
                    (d1 * 10 + d2, 3)
                } else {
                    (c.to_digit(10)?, 1)
                };
                if !open_rings.remove(&ring) {
                    open_rings.insert(ring);
                }
                out.extend(&chars[i..i + consumed]);
                prev = Prev::Atom;
                i += consumed;
            }
            c if BOND_SYMBOLS.contains(&c) => {
                if !matches!(prev, Prev::Atom | Prev::Open | Prev::Close) {
                    return None;
                }
                out.push(c);
                prev = Prev::Bond;
                i += 1;
            }
            _ => {
                let consumed = organic_atom_len(&chars[i..])?;
                out.extend(&chars[i..i + consumed]);
                prev = Prev::Atom;
                i += consumed;
            }
        }
    }

    let complete = matches!(prev, Prev::Atom | Prev::Close) && depth == 0 && open_rings.is_empty();
    complete.then_some(out)
}

fn organic_atom_len(rest: &[char]) -> Option<usize> {
    if rest.first() == Some(&'*') {
        return Some(1);
    }
    if rest.len() >= 2 {
        let pair: String = rest[..2].iter().collect();
        if pair == "Cl" || pair == "Br" {
            return Some(2);
        }
    }
    let single = rest.first()?.to_string();
    (ORGANIC_SUBSET.contains(single.as_str()) || AROMATIC_ORGANIC.contains(single.as_str()))
        .then_some(1)
}

fn normalize_bracket_atom(inner: &str) -> Option<String> {
    let chars: Vec<char> = inner.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() && chars[i].is_ascii_digit() {
        out.push(chars[i]);
        i += 1;
    }

    if chars.get(i) == Some(&'*') {
        out.push('*');
        i += 1;
    } else {
        let two: String = chars.iter().skip(i).take(2).collect();
        let one: String = chars.iter().skip(i).take(1).collect();
        if two.chars().count() == 2 && BRACKET_ELEMENTS.contains(two.as_str()) {
            out.push_str(&two);
            i += 2;
        } else if !one.is_empty() && BRACKET_ELEMENTS.contains(one.as_str()) {
            out.push_str(&one);
            i += 1;
        } else {
            return None;
        }
    }

    while chars.get(i) == Some(&'@') {
        out.push('@');
        i += 1;
    }

    if chars.get(i) == Some(&'H') {
        out.push('H');
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
        }
    }

    while let Some(&sign) = chars.get(i).filter(|c| **c == '+' || **c == '-') {
        out.push(sign);
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            out.push(chars[i]);
            i += 1;
        }
    }

    // Atom-map numbers are annotations, not structure.
    if chars.get(i) == Some(&':') {
        i += 1;
        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return None;
        }
    }

    (i == chars.len()).then_some(out)
}
