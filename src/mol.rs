use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use thiserror::Error;

use crate::atom::Atom;
use crate::element::Element;
use crate::formula::Composition;
use crate::graph_ops;

/// A bond named by its two atom indices, lower index first.
pub type BondPair = (usize, usize);

pub(crate) fn ordered(a: usize, b: usize) -> BondPair {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Error returned when assembling a [`MolGraph`] from raw atom and bond lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphBuildError {
    #[error("bond ({a}, {b}) references atom {missing}, but the graph has {atom_count} atoms")]
    AtomOutOfRange {
        a: usize,
        b: usize,
        missing: usize,
        atom_count: usize,
    },
    #[error("bond ({0}, {0}) connects an atom to itself")]
    SelfBond(usize),
}

/// Raised when removing bonds does not produce the requested split.
///
/// Callers enumerating candidate splits treat both variants as an expected
/// branch of the search and skip the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("removing the bonds leaves the molecule in one piece")]
    NotDisconnected,
    #[error("bond ({0}, {1}) is not present in the graph")]
    MissingBond(usize, usize),
}

/// Undirected bonding graph of a molecule.
///
/// Node indices are stable atom indices; removing bonds never renumbers
/// atoms, so indices from a parent stay valid after [`MolGraph::without_bonds`].
#[derive(Clone, Default)]
pub struct MolGraph {
    graph: UnGraph<Atom, ()>,
}

impl MolGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from an element list and bond list.
    pub fn from_parts(
        elements: impl IntoIterator<Item = Element>,
        bonds: &[BondPair],
    ) -> Result<Self, GraphBuildError> {
        let mut mol = Self::new();
        for element in elements {
            mol.add_atom(Atom::new(element));
        }
        let atom_count = mol.atom_count();
        for &(a, b) in bonds {
            if a == b {
                return Err(GraphBuildError::SelfBond(a));
            }
            if let Some(missing) = [a, b].into_iter().find(|&i| i >= atom_count) {
                return Err(GraphBuildError::AtomOutOfRange {
                    a,
                    b,
                    missing,
                    atom_count,
                });
            }
            mol.add_bond(NodeIndex::new(a), NodeIndex::new(b));
        }
        Ok(mol)
    }

    pub fn graph(&self) -> &UnGraph<Atom, ()> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &Atom {
        &self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.graph.add_node(atom)
    }

    /// Adds a bond, or returns the existing one: graphs never hold parallel bonds.
    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex) -> EdgeIndex {
        self.graph.update_edge(a, b, ())
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors(idx).count()
    }

    pub fn has_bond(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph.find_edge(a, b).is_some()
    }

    /// All bonds as sorted `(lo, hi)` atom pairs, in ascending order.
    pub fn bonds(&self) -> Vec<BondPair> {
        let mut bonds: Vec<BondPair> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| ordered(a.index(), b.index()))
            .collect();
        bonds.sort_unstable();
        bonds
    }

    pub fn species(&self) -> Vec<Element> {
        self.atoms().map(|idx| self.atom(idx).element).collect()
    }

    pub fn composition(&self) -> Composition {
        Composition::from_elements(self.atoms().map(|idx| self.atom(idx).element))
    }

    pub fn formula(&self) -> String {
        self.composition().alphabetical_formula()
    }

    pub fn is_connected(&self) -> bool {
        graph_ops::num_components(self) <= 1
    }

    /// Copy of the graph with the given bonds removed; atom indices are kept.
    pub fn without_bonds(&self, bonds: &[BondPair]) -> Result<MolGraph, SplitError> {
        let mut broken = self.clone();
        for &(a, b) in bonds {
            let edge = broken
                .graph
                .find_edge(NodeIndex::new(a), NodeIndex::new(b))
                .ok_or(SplitError::MissingBond(a, b))?;
            broken.graph.remove_edge(edge);
        }
        Ok(broken)
    }

    /// Removes `bonds` and returns the resulting fragments.
    ///
    /// Fragments are ordered by their lowest atom index. Fails with
    /// [`SplitError::NotDisconnected`] when the molecule stays in one piece,
    /// e.g. when a single ring bond is opened.
    pub fn split(&self, bonds: &[BondPair]) -> Result<Vec<graph_ops::Fragment>, SplitError> {
        let broken = self.without_bonds(bonds)?;
        let fragments = graph_ops::fragments(&broken);
        if fragments.len() < 2 {
            return Err(SplitError::NotDisconnected);
        }
        Ok(fragments)
    }
}

impl std::fmt::Debug for MolGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MolGraph")
            .field("formula", &self.formula())
            .field("bonds", &self.bonds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Element::{C, H, O};

    fn methanol() -> MolGraph {
        MolGraph::from_parts([C, O, H, H, H, H], &[(0, 1), (0, 2), (0, 3), (0, 4), (1, 5)])
            .unwrap()
    }

    #[test]
    fn from_parts_rejects_bad_bonds() {
        assert_eq!(
            MolGraph::from_parts([C, O], &[(0, 2)]).unwrap_err(),
            GraphBuildError::AtomOutOfRange {
                a: 0,
                b: 2,
                missing: 2,
                atom_count: 2
            }
        );
        assert_eq!(
            MolGraph::from_parts([C], &[(0, 0)]).unwrap_err(),
            GraphBuildError::SelfBond(0)
        );
    }

    #[test]
    fn duplicate_bonds_collapse() {
        let mol = MolGraph::from_parts([C, O], &[(0, 1), (1, 0)]).unwrap();
        assert_eq!(mol.bond_count(), 1);
    }

    #[test]
    fn bonds_are_sorted_pairs() {
        let mol = MolGraph::from_parts([C, O, H], &[(2, 0), (1, 0)]).unwrap();
        assert_eq!(mol.bonds(), vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn formula_and_connectivity() {
        let mol = methanol();
        assert_eq!(mol.formula(), "C1 H4 O1");
        assert!(mol.is_connected());
    }

    #[test]
    fn split_terminal_bond() {
        let frags = methanol().split(&[(1, 5)]).unwrap();
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].graph.formula(), "C1 H3 O1");
        assert_eq!(frags[1].graph.formula(), "H1");
        assert_eq!(frags[1].atoms, vec![NodeIndex::new(5)]);
    }

    #[test]
    fn split_ring_bond_is_not_disconnecting() {
        let ring = MolGraph::from_parts([C, C, O], &[(0, 1), (1, 2), (0, 2)]).unwrap();
        assert_eq!(ring.split(&[(0, 1)]).unwrap_err(), SplitError::NotDisconnected);
        let opened = ring.without_bonds(&[(0, 1)]).unwrap();
        assert!(opened.is_connected());
        assert_eq!(opened.bond_count(), 2);
    }

    #[test]
    fn split_missing_bond() {
        assert_eq!(
            methanol().split(&[(2, 3)]).unwrap_err(),
            SplitError::MissingBond(2, 3)
        );
    }
}
