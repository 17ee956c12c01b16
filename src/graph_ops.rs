use std::collections::VecDeque;

use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;

use crate::mol::{BondPair, MolGraph};

/// A connected piece of a parent graph.
///
/// `atoms[i]` is the parent index of fragment atom `i`; atoms keep their
/// parent order, so the mapping is ascending.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub graph: MolGraph,
    pub atoms: Vec<NodeIndex>,
}

impl Fragment {
    pub fn parent_index(&self, local: NodeIndex) -> NodeIndex {
        self.atoms[local.index()]
    }
}

/// Connected components in order of their lowest atom index.
pub fn connected_components(mol: &MolGraph) -> Vec<Vec<NodeIndex>> {
    let mut sets = UnionFind::<usize>::new(mol.atom_count());
    for (a, b) in mol.bonds() {
        sets.union(a, b);
    }
    let mut slot_of_root: Vec<Option<usize>> = vec![None; mol.atom_count()];
    let mut components: Vec<Vec<NodeIndex>> = Vec::new();
    for atom in mol.atoms() {
        let root = sets.find(atom.index());
        let slot = *slot_of_root[root].get_or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(atom);
    }
    components
}

pub fn num_components(mol: &MolGraph) -> usize {
    connected_components(mol).len()
}

/// Subgraph induced by `atoms`, renumbered in the order given.
pub fn induced_subgraph(mol: &MolGraph, atoms: &[NodeIndex]) -> Fragment {
    let mut sub = MolGraph::new();
    let mut index_map = vec![None; mol.atom_count()];
    for &old_idx in atoms {
        let new_idx = sub.add_atom(*mol.atom(old_idx));
        index_map[old_idx.index()] = Some(new_idx);
    }
    for &old_idx in atoms {
        for neighbor in mol.neighbors(old_idx) {
            if old_idx.index() >= neighbor.index() {
                continue;
            }
            if let (Some(a), Some(b)) = (index_map[old_idx.index()], index_map[neighbor.index()]) {
                sub.add_bond(a, b);
            }
        }
    }
    Fragment {
        graph: sub,
        atoms: atoms.to_vec(),
    }
}

pub fn fragments(mol: &MolGraph) -> Vec<Fragment> {
    connected_components(mol)
        .iter()
        .map(|component| induced_subgraph(mol, component))
        .collect()
}

/// Atoms within `radius` bonds of any endpoint of `bonds`, ascending.
///
/// Radius 0 gives just the endpoints. Endpoints outside the graph are ignored.
pub fn bond_environment(mol: &MolGraph, bonds: &[BondPair], radius: usize) -> Vec<NodeIndex> {
    let n = mol.atom_count();
    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::new();
    for &(a, b) in bonds {
        for idx in [a, b] {
            if idx < n && dist[idx] == usize::MAX {
                dist[idx] = 0;
                queue.push_back(NodeIndex::new(idx));
            }
        }
    }
    while let Some(current) = queue.pop_front() {
        let d = dist[current.index()];
        if d == radius {
            continue;
        }
        for neighbor in mol.neighbors(current) {
            if dist[neighbor.index()] == usize::MAX {
                dist[neighbor.index()] = d + 1;
                queue.push_back(neighbor);
            }
        }
    }
    (0..n)
        .filter(|&i| dist[i] != usize::MAX)
        .map(NodeIndex::new)
        .collect()
}

/// Induced subgraph of [`bond_environment`], used as a family key.
pub fn environment_graph(mol: &MolGraph, bonds: &[BondPair], radius: usize) -> MolGraph {
    induced_subgraph(mol, &bond_environment(mol, bonds, radius)).graph
}
