//! Atom-mapping numbers linking reactant atoms to product atoms.
//!
//! Reactant atom `i` always carries number `i`. A product atom carries the
//! number of the reactant atom it corresponds to, so equal numbers mark the
//! same atom on both sides.

use crate::graph_ops::Fragment;
use crate::isomorphism::{find_isomorphism, AtomMapping};
use crate::mol::MolGraph;

use super::ReactionError;

/// Mapping numbers per participant: `reactants[r][i]` and `products[p][j]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomMappings {
    pub reactants: Vec<Vec<usize>>,
    pub products: Vec<Vec<usize>>,
}

impl AtomMappings {
    pub(crate) fn swapped(self) -> Self {
        Self {
            reactants: self.products,
            products: self.reactants,
        }
    }
}

/// Mapping for a one-to-one reaction from an isomorphism `reactant -> product`.
pub fn one_to_one(node_mapping: &AtomMapping) -> AtomMappings {
    let n = node_mapping.len();
    let mut product = vec![0; n];
    for &(reactant_atom, product_atom) in node_mapping {
        product[product_atom.index()] = reactant_atom.index();
    }
    AtomMappings {
        reactants: vec![(0..n).collect()],
        products: vec![product],
    }
}

/// Mapping for a one-to-many reaction.
///
/// `pairs[p]` is product `p` together with the reactant fragment it was
/// matched against. Fragments retain parent atom indices, so each product
/// atom inherits the parent index of its image in the fragment.
pub fn one_to_many(
    reactant: &MolGraph,
    pairs: &[(&MolGraph, &Fragment)],
) -> Result<AtomMappings, ReactionError> {
    let products = pairs
        .iter()
        .enumerate()
        .map(|(p, (product, fragment))| {
            let mapping = find_isomorphism(product, &fragment.graph)
                .ok_or(ReactionError::AtomMapping { product: p })?;
            let mut numbers = vec![0; product.atom_count()];
            for (product_atom, fragment_atom) in mapping {
                numbers[product_atom.index()] = fragment.parent_index(fragment_atom).index();
            }
            Ok(numbers)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AtomMappings {
        reactants: vec![(0..reactant.atom_count()).collect()],
        products,
    })
}
