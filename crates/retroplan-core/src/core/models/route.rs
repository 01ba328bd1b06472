use super::molecule::{IdentityKey, Molecule};
use rpds::List;

/// One single-step decomposition of a product into reactants.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionCandidate {
    /// Unique reactants, sorted by canonical SMILES.
    pub reactants: Vec<Molecule>,
    /// Length-normalized negative log10 probability; lower is more probable.
    pub cost: f64,
}

impl ReactionCandidate {
    pub fn new(reactants: Vec<Molecule>, cost: f64) -> Self {
        Self { reactants, cost }
    }
}

/// A branch of a partial route that still has to be decomposed.
///
/// The molecule awaiting decomposition is stored apart from its ancestors, which are
/// kept nearest-first in a persistent list so that opening a child branch is O(1).
#[derive(Debug, Clone)]
pub struct PendingExpansion {
    molecule: Molecule,
    ancestors: List<Molecule>,
    pub depth: usize,
}

impl PendingExpansion {
    pub fn root(target: Molecule) -> Self {
        Self {
            molecule: target,
            ancestors: List::new(),
            depth: 0,
        }
    }

    /// The molecule that has to be decomposed next on this branch.
    #[inline]
    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    /// Opens a branch for `reactant` one step deeper than this one.
    pub fn branch(&self, reactant: Molecule) -> Self {
        Self {
            molecule: reactant,
            ancestors: self.ancestors.push_front(self.molecule.clone()),
            depth: self.depth + 1,
        }
    }

    /// Number of molecules from the target down to this branch's molecule.
    pub fn path_len(&self) -> usize {
        self.ancestors.len() + 1
    }

}

/// A partial route in the search frontier.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Accumulated step costs plus value estimates of the still-open molecules.
    pub score: f64,
    /// Open branches; the head is expanded next.
    pub pending: List<PendingExpansion>,
    /// Purchasable materials collected so far, without duplicates.
    pub resolved_materials: List<Molecule>,
    /// Longest branch path opened while building this node.
    pub longest_path: usize,
}

impl SearchNode {
    pub fn root(target: Molecule, target_value: f64) -> Self {
        Self {
            score: target_value,
            pending: List::new().push_front(PendingExpansion::root(target)),
            resolved_materials: List::new(),
            longest_path: 1,
        }
    }
}

/// A full backward decomposition whose every leaf is purchasable.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRoute {
    pub score: f64,
    pub resolved_materials: Vec<Molecule>,
    pub longest_path: usize,
}

/// A deduplicated, reranked route ready for output.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub score: f64,
    pub rerank_score: f64,
    pub total_score: f64,
    /// Sorted identity keys of the starting materials; the deduplication key.
    pub identity_keys: Vec<IdentityKey>,
    /// Starting materials sorted by canonical SMILES.
    pub materials: Vec<Molecule>,
}

impl RankedCandidate {
    /// The `.`-joined starting materials, as shown to the route reranker.
    pub fn joined_materials(&self) -> String {
        join_smiles(&self.materials)
    }
}

pub(crate) fn join_smiles(molecules: &[Molecule]) -> String {
    molecules
        .iter()
        .map(Molecule::smiles)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::canonical::SmilesCanonicalizer;

    fn mol(smiles: &str) -> Molecule {
        Molecule::parse(smiles, &SmilesCanonicalizer::new()).unwrap()
    }

    #[test]
    fn root_expansion_has_depth_zero_and_single_element_path() {
        let root = PendingExpansion::root(mol("CCO"));
        assert_eq!(root.depth, 0);
        assert_eq!(root.path_len(), 1);
        assert_eq!(root.molecule().smiles(), "CCO");
    }

    #[test]
    fn branch_extends_path_and_depth() {
        let root = PendingExpansion::root(mol("CCOC(C)=O"));
        let child = root.branch(mol("CCO"));
        let grandchild = child.branch(mol("CC"));

        assert_eq!(grandchild.depth, 2);
        assert_eq!(grandchild.path_len(), 3);
        assert_eq!(grandchild.molecule().smiles(), "CC");
        assert_eq!(child.path_len(), 2);
        assert_eq!(root.path_len(), 1);
        assert_eq!(root.molecule().smiles(), "CCOC(C)=O");
    }

    #[test]
    fn search_node_root_holds_single_pending_branch() {
        let node = SearchNode::root(mol("c1ccccc1"), 2.5);
        assert_eq!(node.score, 2.5);
        assert_eq!(node.pending.len(), 1);
        assert!(node.resolved_materials.is_empty());
        assert_eq!(node.longest_path, 1);
    }

    #[test]
    fn joined_materials_uses_dot_separator() {
        let candidate = RankedCandidate {
            score: 0.0,
            rerank_score: 0.0,
            total_score: 0.0,
            identity_keys: vec![],
            materials: vec![mol("CC(=O)O"), mol("CCO")],
        };
        assert_eq!(candidate.joined_materials(), "CC(=O)O.CCO");
    }
}
