//! Decomposition of one molecule into two by breaking a single bond.

use std::sync::Arc;

use log::{trace, warn};

use crate::bucket::EntryIndex;
use crate::config::NetworkConfig;
use crate::entry::MoleculeEntry;
use crate::graph_ops::{environment_graph, Fragment};
use crate::isomorphism::is_isomorphic;

use super::{atom_mapping, ArchetypeOutput, Reaction};

/// First entry of the bucket whose graph is isomorphic to `fragment`.
pub(crate) fn first_match<'a>(
    candidates: &'a [Arc<MoleculeEntry>],
    fragment: &Fragment,
) -> Option<&'a Arc<MoleculeEntry>> {
    candidates
        .iter()
        .find(|e| is_isomorphic(&fragment.graph, e.graph()))
}

/// Breaks every bond of every bonded entry and looks for two entries whose
/// graphs match the fragments and whose charges add up to the parent's.
///
/// Fragment `i` becomes product `i`. For each charge split only the first
/// isomorphic entry of each bucket is taken.
pub fn generate(index: &EntryIndex, config: &NetworkConfig) -> ArchetypeOutput {
    let mut out = ArchetypeOutput::default();

    for formula in index.formulas() {
        for num_bonds in index.bond_counts(formula).filter(|&n| n > 0) {
            for charge in index.charges(formula, num_bonds) {
                for entry in index.get(formula, num_bonds, charge) {
                    decompose(entry, index, config, &mut out);
                }
            }
        }
    }
    out
}

fn decompose(
    entry: &Arc<MoleculeEntry>,
    index: &EntryIndex,
    config: &NetworkConfig,
    out: &mut ArchetypeOutput,
) {
    for &bond in entry.bonds() {
        let frags = match entry.graph().split(&[bond]) {
            Ok(frags) => frags,
            Err(err) => {
                trace!("{}: bond {:?} skipped: {err}", entry.id(), bond);
                continue;
            }
        };
        let [frag0, frag1] = frags.as_slice() else {
            continue;
        };
        let (formula0, nbonds0) = (frag0.graph.formula(), frag0.graph.bond_count());
        let (formula1, nbonds1) = (frag1.graph.formula(), frag1.graph.bond_count());
        if !index.has_bucket(&formula0, nbonds0) || !index.has_bucket(&formula1, nbonds1) {
            continue;
        }

        for charge0 in index.charges(&formula0, nbonds0) {
            let charge1 = entry.charge() - charge0;
            let bucket1 = index.get(&formula1, nbonds1, charge1);
            if bucket1.is_empty() {
                continue;
            }
            let Some(entry0) = first_match(index.get(&formula0, nbonds0, charge0), frag0) else {
                continue;
            };
            let Some(entry1) = first_match(bucket1, frag1) else {
                continue;
            };

            let mut reaction =
                Reaction::intermolecular(Arc::clone(entry), [Arc::clone(entry0), Arc::clone(entry1)])
                    .with_electron_free_energy(config.electron_free_energy);
            match atom_mapping::one_to_many(
                entry.graph(),
                &[(entry0.graph(), frag0), (entry1.graph(), frag1)],
            ) {
                Ok(mapping) => reaction = reaction.with_atom_mappings(mapping),
                Err(err) => warn!("{}: {err}", entry.id()),
            }
            let environment = environment_graph(entry.graph(), &[bond], config.environment_radius);
            out.push(reaction, environment, entry.charge());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element::{C, H, O};
    use crate::entry::index_entries;
    use crate::formula::Composition;
    use crate::mol::MolGraph;
    use crate::reaction::MOLECULAR_DECOMPOSITION;

    fn methanol() -> MolGraph {
        MolGraph::from_parts([C, O, H, H, H, H], &[(0, 1), (0, 2), (0, 3), (0, 4), (1, 5)]).unwrap()
    }

    fn methyl() -> MolGraph {
        MolGraph::from_parts([C, H, H, H], &[(0, 1), (0, 2), (0, 3)]).unwrap()
    }

    fn hydroxyl() -> MolGraph {
        MolGraph::from_parts([O, H], &[(0, 1)]).unwrap()
    }

    fn population() -> Vec<Arc<MoleculeEntry>> {
        index_entries([
            MoleculeEntry::new("meoh", methanol(), 0, -115.7),
            MoleculeEntry::new("ch3+", methyl(), 1, -39.5),
            MoleculeEntry::new("ch3", methyl(), 0, -39.8),
            MoleculeEntry::new("oh-", hydroxyl(), -1, -75.8),
            MoleculeEntry::new("oh", hydroxyl(), 0, -75.7),
        ])
    }

    #[test]
    fn c_o_cleavage_enumerates_charge_splits() {
        let out = generate(&EntryIndex::new(&population()), &NetworkConfig::default());
        let mut products: Vec<Vec<&str>> = out.reactions.iter().map(|r| r.product_ids()).collect();
        products.sort();
        assert_eq!(products, vec![vec!["ch3", "oh"], vec!["ch3+", "oh-"]]);
    }

    #[test]
    fn composition_and_charge_are_additive() {
        let out = generate(&EntryIndex::new(&population()), &NetworkConfig::default());
        for r in &out.reactions {
            let [p0, p1] = r.products() else { panic!("expected two products") };
            let sum: Composition = &p0.composition() + &p1.composition();
            assert_eq!(sum, r.reactants()[0].composition());
            assert_eq!(p0.charge() + p1.charge(), r.reactants()[0].charge());
            assert_eq!(r.reaction_type().a, MOLECULAR_DECOMPOSITION);
        }
    }

    #[test]
    fn fragments_pair_with_products_in_order() {
        let out = generate(&EntryIndex::new(&population()), &NetworkConfig::default());
        let r = &out.reactions[0];
        // the carbon fragment holds atom 0, so it comes first
        assert_eq!(r.products()[0].formula(), "C1 H3");
        let mapping = r.atom_mappings().unwrap();
        assert_eq!(mapping.products[0][0], 0);
        assert_eq!(mapping.products[1][0], 1);
        assert_eq!(mapping.products[1][1], 5);
    }

    #[test]
    fn unmatched_fragments_give_nothing() {
        let entries = index_entries([MoleculeEntry::new("meoh", methanol(), 0, -115.7)]);
        let out = generate(&EntryIndex::new(&entries), &NetworkConfig::default());
        assert!(out.reactions.is_empty());
        assert_eq!(out.classifier.num_templates(), 0);
    }
}
