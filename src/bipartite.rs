//! Directed bipartite graph of species and reaction nodes.
//!
//! Species nodes are keyed by entry index. Each direction of a reaction gets
//! one reaction node per participant on its starting side, so a species can
//! enter a multi-reactant reaction on its own while the co-reactants are
//! marked as pass-through-required (`PR_`) in the node name:
//!
//! ```text
//! 3 -> "3+PR_7,1+4" -> 1, 4
//! 7 -> "7+PR_3,1+4" -> 1, 4
//! ```
//!
//! Adding a node or edge that already exists overwrites its attributes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use thiserror::Error;

use crate::entry::MoleculeEntry;
use crate::reaction::{Reaction, REFERENCE_TEMPERATURE};
use crate::weights::{exponent, rexp, softplus, WideWeight};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("no graph representation for {reactants} reactant(s) and {products} product(s)")]
    UnsupportedCardinality { reactants: usize, products: usize },
    #[error("free energy unavailable for reaction {reaction}")]
    MissingFreeEnergy { reaction: String },
}

/// Identity of a node in a [`ReactionGraph`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    Species(usize),
    Reaction(String),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Species(index) => write!(f, "{index}"),
            NodeKey::Reaction(name) => f.write_str(name),
        }
    }
}

/// Attributes of one directed reaction node.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionNode {
    pub name: String,
    pub rxn_type: &'static str,
    /// Hartree.
    pub energy: f64,
    /// eV.
    pub free_energy: f64,
    /// The node name spelled with entry ids instead of indices.
    pub entry_ids: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkNode {
    Species { index: usize },
    Reaction(ReactionNode),
}

impl NetworkNode {
    /// 0 for species, 1 for reactions.
    pub fn bipartite(&self) -> u8 {
        match self {
            NetworkNode::Species { .. } => 0,
            NetworkNode::Reaction(_) => 1,
        }
    }

    pub fn key(&self) -> NodeKey {
        match self {
            NetworkNode::Species { index } => NodeKey::Species(*index),
            NetworkNode::Reaction(node) => NodeKey::Reaction(node.name.clone()),
        }
    }

    pub fn as_reaction(&self) -> Option<&ReactionNode> {
        match self {
            NetworkNode::Reaction(node) => Some(node),
            NetworkNode::Species { .. } => None,
        }
    }
}

/// Edge attributes. Edges into a reaction node carry costs of that
/// direction's free energy; edges out of it are free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeWeights {
    pub softplus: f64,
    pub exponent: f64,
    pub rexp: WideWeight,
    pub weight: f64,
}

impl EdgeWeights {
    pub fn entry(free_energy: f64) -> Self {
        Self {
            softplus: softplus(free_energy),
            exponent: exponent(free_energy),
            rexp: rexp(free_energy),
            weight: 1.0,
        }
    }

    pub fn exit() -> Self {
        Self {
            softplus: 0.0,
            exponent: 0.0,
            rexp: WideWeight::ZERO,
            weight: 1.0,
        }
    }
}

/// Edge attribute used as path cost by [`ReactionGraph::shortest_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostFunction {
    Softplus,
    Exponent,
    Rexp,
    Unit,
}

impl CostFunction {
    fn cost(self, weights: &EdgeWeights) -> WideWeight {
        match self {
            CostFunction::Softplus => WideWeight::from_value(weights.softplus),
            CostFunction::Exponent => WideWeight::from_value(weights.exponent),
            CostFunction::Rexp => weights.rexp,
            CostFunction::Unit => WideWeight::from_value(weights.weight),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub cost: WideWeight,
    pub nodes: Vec<NodeKey>,
}

/// One direction of a reaction, seen from its starting side.
struct Direction<'a> {
    anchors: &'a [Arc<MoleculeEntry>],
    others: &'a [Arc<MoleculeEntry>],
    rxn_type: &'static str,
    energy: f64,
    free_energy: f64,
}

fn sorted_by_index(side: &[Arc<MoleculeEntry>]) -> Vec<&Arc<MoleculeEntry>> {
    let mut sorted: Vec<_> = side.iter().collect();
    sorted.sort_by_key(|e| e.index());
    sorted
}

fn join(side: &[&Arc<MoleculeEntry>], sep: &str) -> (String, String) {
    let names: Vec<String> = side.iter().map(|e| e.index().to_string()).collect();
    let ids: Vec<&str> = side.iter().map(|e| e.id()).collect();
    (names.join(sep), ids.join(sep))
}

fn supported(cardinality: (usize, usize)) -> bool {
    matches!(cardinality, (1, 1) | (1, 2) | (2, 1) | (2, 2) | (3, 2))
}

#[derive(Debug, Clone, Default)]
pub struct ReactionGraph {
    graph: DiGraph<NetworkNode, EdgeWeights>,
    nodes: HashMap<NodeKey, NodeIndex>,
}

impl ReactionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embeds every reaction at the given temperature.
    pub fn from_reactions<'a>(
        reactions: impl IntoIterator<Item = &'a Reaction>,
        temperature: f64,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for reaction in reactions {
            graph.add_reaction_at(reaction, temperature)?;
        }
        Ok(graph)
    }

    /// Embeds both directions of `reaction` at 298.15 K.
    pub fn add_reaction(&mut self, reaction: &Reaction) -> Result<(), GraphError> {
        self.add_reaction_at(reaction, REFERENCE_TEMPERATURE)
    }

    pub fn add_reaction_at(&mut self, reaction: &Reaction, temperature: f64) -> Result<(), GraphError> {
        let (reactants, products) = reaction.cardinality();
        if !supported((reactants, products)) {
            return Err(GraphError::UnsupportedCardinality { reactants, products });
        }
        let free_energy = reaction
            .free_energy(temperature)
            .ok_or_else(|| GraphError::MissingFreeEnergy {
                reaction: reaction.to_string(),
            })?;
        let energy = reaction.energy();
        let rxn_type = reaction.reaction_type();

        self.embed(Direction {
            anchors: reaction.reactants(),
            others: reaction.products(),
            rxn_type: rxn_type.a,
            energy: energy.a,
            free_energy: free_energy.a,
        });
        self.embed(Direction {
            anchors: reaction.products(),
            others: reaction.reactants(),
            rxn_type: rxn_type.b,
            energy: energy.b,
            free_energy: free_energy.b,
        });
        Ok(())
    }

    fn embed(&mut self, dir: Direction<'_>) {
        let (other_name, other_ids) = join(&sorted_by_index(dir.others), "+");
        for (k, anchor) in dir.anchors.iter().enumerate() {
            let mut name = anchor.index().to_string();
            let mut entry_ids = anchor.id().to_string();
            let co_members: Vec<_> = dir
                .anchors
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != k)
                .map(|(_, e)| Arc::clone(e))
                .collect();
            for co in sorted_by_index(&co_members) {
                name.push_str("+PR_");
                name.push_str(&co.index().to_string());
                entry_ids.push_str("+PR_");
                entry_ids.push_str(co.id());
            }
            name.push(',');
            name.push_str(&other_name);
            entry_ids.push(',');
            entry_ids.push_str(&other_ids);

            let node = self.upsert_node(NetworkNode::Reaction(ReactionNode {
                name,
                rxn_type: dir.rxn_type,
                energy: dir.energy,
                free_energy: dir.free_energy,
                entry_ids,
            }));
            let source = self.species_node(anchor.index());
            self.graph
                .update_edge(source, node, EdgeWeights::entry(dir.free_energy));
            for product in dir.others {
                let target = self.species_node(product.index());
                self.graph.update_edge(node, target, EdgeWeights::exit());
            }
        }
    }

    fn species_node(&mut self, index: usize) -> NodeIndex {
        let key = NodeKey::Species(index);
        match self.nodes.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(NetworkNode::Species { index });
                self.nodes.insert(key, idx);
                idx
            }
        }
    }

    fn upsert_node(&mut self, node: NetworkNode) -> NodeIndex {
        let key = node.key();
        match self.nodes.get(&key) {
            Some(&idx) => {
                self.graph[idx] = node;
                idx
            }
            None => {
                let idx = self.graph.add_node(node);
                self.nodes.insert(key, idx);
                idx
            }
        }
    }

    /// Merges another graph into this one, overwriting shared nodes and edges.
    pub fn extend(&mut self, other: &ReactionGraph) {
        for edge in other.graph.edge_references() {
            let source = self.upsert_node(other.graph[edge.source()].clone());
            let target = self.upsert_node(other.graph[edge.target()].clone());
            self.graph.update_edge(source, target, *edge.weight());
        }
        for node in other.graph.node_weights() {
            self.upsert_node(node.clone());
        }
    }

    pub fn graph(&self) -> &DiGraph<NetworkNode, EdgeWeights> {
        &self.graph
    }

    pub fn node_index(&self, key: &NodeKey) -> Option<NodeIndex> {
        self.nodes.get(key).copied()
    }

    pub fn node(&self, key: &NodeKey) -> Option<&NetworkNode> {
        self.node_index(key).map(|idx| &self.graph[idx])
    }

    pub fn reaction_node(&self, name: &str) -> Option<&ReactionNode> {
        self.node(&NodeKey::Reaction(name.to_string()))
            .and_then(NetworkNode::as_reaction)
    }

    pub fn edge(&self, from: &NodeKey, to: &NodeKey) -> Option<&EdgeWeights> {
        let edge = self
            .graph
            .find_edge(self.node_index(from)?, self.node_index(to)?)?;
        self.graph.edge_weight(edge)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn species_count(&self) -> usize {
        self.graph.node_weights().filter(|n| n.bipartite() == 0).count()
    }

    pub fn reaction_nodes(&self) -> impl Iterator<Item = &ReactionNode> + '_ {
        self.graph.node_weights().filter_map(NetworkNode::as_reaction)
    }

    /// Keys of the nodes reachable along one outgoing edge.
    pub fn successors(&self, key: &NodeKey) -> Vec<NodeKey> {
        let Some(idx) = self.node_index(key) else {
            return Vec::new();
        };
        let mut keys: Vec<NodeKey> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].key())
            .collect();
        keys.sort();
        keys
    }

    /// Cheapest path between two species under `cost`.
    ///
    /// Pass-through requirements are not enforced: a reaction node is
    /// entered from its anchor species alone.
    pub fn shortest_path(&self, from: usize, to: usize, cost: CostFunction) -> Option<GraphPath> {
        let start = self.node_index(&NodeKey::Species(from))?;
        let goal = self.node_index(&NodeKey::Species(to))?;
        let (total, path) = astar(
            &self.graph,
            start,
            |n| n == goal,
            |e| cost.cost(e.weight()),
            |_| WideWeight::ZERO,
        )?;
        Some(GraphPath {
            cost: total,
            nodes: path.into_iter().map(|n| self.graph[n].key()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element::{C, H, O};
    use crate::mol::MolGraph;

    fn species(index: usize, g: f64) -> Arc<MoleculeEntry> {
        // free energy at any temperature is 27.21139 * energy when H = S = 0
        let graph = MolGraph::from_parts([C, O, H], &[(0, 1), (0, 2)]).unwrap();
        Arc::new(
            MoleculeEntry::new(format!("m{index}"), graph, 0, g / 27.21139)
                .with_thermo(0.0, 0.0)
                .with_index(index),
        )
    }

    fn concerted(reactants: &[(usize, f64)], products: &[(usize, f64)]) -> Reaction {
        let side = |s: &[(usize, f64)]| s.iter().map(|&(i, g)| species(i, g)).collect();
        Reaction::concerted(side(reactants), side(products))
    }

    fn rname(s: &str) -> NodeKey {
        NodeKey::Reaction(s.to_string())
    }

    #[test]
    fn one_to_one_nodes_and_weights() {
        let r = Reaction::intramolecular(species(0, -1.0), species(1, -1.5));
        let g = r.graph_representation().unwrap();
        assert_eq!(g.reaction_nodes().count(), 2);
        assert_eq!(g.species_count(), 2);
        assert_eq!(g.edge_count(), 4);

        let a = g.reaction_node("0,1").unwrap();
        let b = g.reaction_node("1,0").unwrap();
        assert!((a.free_energy + 0.5).abs() < 1e-9);
        assert_eq!(a.free_energy, -b.free_energy);
        assert_eq!(a.entry_ids, "m0,m1");

        let into_a = g.edge(&NodeKey::Species(0), &rname("0,1")).unwrap();
        let dg = a.free_energy;
        assert!((into_a.softplus - (1.0 + 273.0 / 500.0 * dg.exp()).ln()).abs() < 1e-12);
        assert!((into_a.exponent - dg.exp()).abs() < 1e-12);
        assert!((into_a.rexp.to_f64() - dg.exp()).abs() < 1e-12);
        assert_eq!(into_a.weight, 1.0);

        let into_b = g.edge(&NodeKey::Species(1), &rname("1,0")).unwrap();
        assert!((into_b.rexp.ln() - 38.94 * 0.5).abs() < 1e-9);

        let out_a = g.edge(&rname("0,1"), &NodeKey::Species(1)).unwrap();
        assert_eq!(*out_a, EdgeWeights::exit());
    }

    #[test]
    fn one_to_two_names() {
        let r = Reaction::intermolecular(species(5, -3.0), [species(4, -1.0), species(2, -1.0)]);
        let g = r.graph_representation().unwrap();
        let mut names: Vec<&str> = g.reaction_nodes().map(|n| n.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["2+PR_4,5", "4+PR_2,5", "5,2+4"]);
        assert_eq!(g.reaction_node("5,2+4").unwrap().entry_ids, "m5,m2+m4");
        assert_eq!(g.reaction_node("4+PR_2,5").unwrap().entry_ids, "m4+PR_m2,m5");
        assert_eq!(
            g.successors(&rname("5,2+4")),
            vec![NodeKey::Species(2), NodeKey::Species(4)]
        );
        // 3 entry edges + 2 A exits + 2 B exits
        assert_eq!(g.edge_count(), 7);
    }

    #[test]
    fn two_to_one_mirrors_one_to_two() {
        let g = concerted(&[(3, -1.0), (1, -1.0)], &[(2, -2.5)])
            .graph_representation()
            .unwrap();
        let mut names: Vec<&str> = g.reaction_nodes().map(|n| n.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["1+PR_3,2", "2,1+3", "3+PR_1,2"]);
    }

    #[test]
    fn two_to_two_names() {
        let g = concerted(&[(3, -1.0), (1, -1.0)], &[(4, -1.2), (0, -1.2)])
            .graph_representation()
            .unwrap();
        let mut names: Vec<&str> = g.reaction_nodes().map(|n| n.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["0+PR_4,1+3", "1+PR_3,0+4", "3+PR_1,0+4", "4+PR_0,1+3"]);
    }

    #[test]
    fn three_to_two_names_and_weights() {
        let g = concerted(&[(5, -1.0), (2, -1.0), (7, -1.0)], &[(4, -1.6), (1, -1.6)])
            .graph_representation()
            .unwrap();
        let mut names: Vec<&str> = g.reaction_nodes().map(|n| n.name.as_str()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "1+PR_4,2+5+7",
                "2+PR_5+PR_7,1+4",
                "4+PR_1,2+5+7",
                "5+PR_2+PR_7,1+4",
                "7+PR_2+PR_5,1+4",
            ]
        );
        // B edges use the B free energy
        let b = g.edge(&NodeKey::Species(4), &rname("4+PR_1,2+5+7")).unwrap();
        assert!((b.rexp.ln() - 38.94 * 0.2).abs() < 1e-9);
        // every A node exits to both products
        for name in ["2+PR_5+PR_7,1+4", "5+PR_2+PR_7,1+4", "7+PR_2+PR_5,1+4"] {
            assert_eq!(g.successors(&rname(name)), vec![NodeKey::Species(1), NodeKey::Species(4)]);
        }
        assert_eq!(g.edge_count(), 3 * 3 + 2 * 4);
    }

    #[test]
    fn unsupported_cardinality() {
        let r = concerted(&[(0, 0.0), (1, 0.0)], &[(2, 0.0), (3, 0.0), (4, 0.0)]);
        assert_eq!(
            r.graph_representation().unwrap_err(),
            GraphError::UnsupportedCardinality { reactants: 2, products: 3 }
        );
    }

    #[test]
    fn missing_free_energy_is_reported() {
        let graph = MolGraph::from_parts([H], &[]).unwrap();
        let bare = |i: usize| Arc::new(MoleculeEntry::new(format!("h{i}"), graph.clone(), 0, -0.5).with_index(i));
        let r = Reaction::intramolecular(bare(0), bare(1));
        assert!(matches!(
            r.graph_representation(),
            Err(GraphError::MissingFreeEnergy { .. })
        ));
    }

    #[test]
    fn re_adding_updates_in_place() {
        let r = Reaction::intramolecular(species(0, -1.0), species(1, -1.5));
        let mut g = ReactionGraph::new();
        g.add_reaction(&r).unwrap();
        g.add_reaction_at(&r, 400.0).unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn extend_merges_graphs() {
        let r1 = Reaction::intramolecular(species(0, -1.0), species(1, -1.5));
        let r2 = Reaction::intramolecular(species(1, -1.5), species(2, -2.0));
        let mut g = r1.graph_representation().unwrap();
        g.extend(&r2.graph_representation().unwrap());
        assert_eq!(g.species_count(), 3);
        assert_eq!(g.reaction_nodes().count(), 4);
        assert_eq!(g.edge_count(), 8);
    }

    #[test]
    fn shortest_path_prefers_downhill() {
        let direct = Reaction::intramolecular(species(0, 0.0), species(2, 1.0));
        let via = [
            Reaction::intramolecular(species(0, 0.0), species(1, -0.5)),
            Reaction::intramolecular(species(1, -0.5), species(2, 1.0)),
        ];
        let g = ReactionGraph::from_reactions(
            std::iter::once(&direct).chain(via.iter()),
            REFERENCE_TEMPERATURE,
        )
        .unwrap();

        let path = g.shortest_path(0, 2, CostFunction::Unit).unwrap();
        assert_eq!(
            path.nodes,
            vec![NodeKey::Species(0), rname("0,2"), NodeKey::Species(2)]
        );
        assert!((path.cost.to_f64() - 2.0).abs() < 1e-9);

        // rexp: direct costs e^38.94, the detour e^-0.5 + e^(38.94*1.5)
        let path = g.shortest_path(0, 2, CostFunction::Rexp).unwrap();
        assert_eq!(path.nodes.len(), 3);

        assert!(g.shortest_path(2, 7, CostFunction::Softplus).is_none());
    }
}
