use petgraph::graph::NodeIndex;

use crate::mol::MolGraph;

/// Node correspondence `(a, b)` from the first graph onto the second.
pub type AtomMapping = Vec<(NodeIndex, NodeIndex)>;

/// Tests species-aware graph isomorphism and returns the node mapping `a -> b`.
///
/// Atoms match on element only. Graphs whose atom count, bond count or
/// composition differ are rejected before the search starts.
pub fn find_isomorphism(a: &MolGraph, b: &MolGraph) -> Option<AtomMapping> {
    if a.atom_count() != b.atom_count() || a.bond_count() != b.bond_count() {
        return None;
    }
    if a.composition() != b.composition() {
        return None;
    }
    Vf2::new(a, b).find_first()
}

pub fn is_isomorphic(a: &MolGraph, b: &MolGraph) -> bool {
    find_isomorphism(a, b).is_some()
}

struct Vf2<'a> {
    query: &'a MolGraph,
    target: &'a MolGraph,
    query_order: Vec<NodeIndex>,
    query_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
}

impl<'a> Vf2<'a> {
    fn new(query: &'a MolGraph, target: &'a MolGraph) -> Self {
        let mut query_order: Vec<NodeIndex> = query.atoms().collect();
        query_order.sort_by_key(|&a| std::cmp::Reverse(query.degree(a)));
        Self {
            query,
            target,
            query_order,
            query_map: vec![None; query.atom_count()],
            target_used: vec![false; target.atom_count()],
        }
    }

    fn find_first(&mut self) -> Option<AtomMapping> {
        if self.recurse(0) {
            let mut mapping = Vec::with_capacity(self.query_order.len());
            for q in self.query.atoms() {
                mapping.push((q, self.query_map[q.index()]?));
            }
            Some(mapping)
        } else {
            None
        }
    }

    fn recurse(&mut self, depth: usize) -> bool {
        if depth == self.query_order.len() {
            return true;
        }
        let query_node = self.query_order[depth];
        for t_idx in 0..self.target_used.len() {
            if self.target_used[t_idx] {
                continue;
            }
            let target_node = NodeIndex::new(t_idx);
            if !self.is_feasible(query_node, target_node) {
                continue;
            }
            self.query_map[query_node.index()] = Some(target_node);
            self.target_used[t_idx] = true;
            if self.recurse(depth + 1) {
                return true;
            }
            self.query_map[query_node.index()] = None;
            self.target_used[t_idx] = false;
        }
        false
    }

    // Bond counts are equal, so preserving every query bond makes the
    // mapping an isomorphism rather than a monomorphism.
    fn is_feasible(&self, query_node: NodeIndex, target_node: NodeIndex) -> bool {
        if self.query.atom(query_node).element != self.target.atom(target_node).element {
            return false;
        }
        if self.query.degree(query_node) != self.target.degree(target_node) {
            return false;
        }
        self.query.neighbors(query_node).all(|q_neighbor| {
            match self.query_map[q_neighbor.index()] {
                Some(t_mapped) => self.target.has_bond(target_node, t_mapped),
                None => true,
            }
        })
    }
}
