//! Formation or breakage of one bond inside a single molecule.

use std::sync::Arc;

use crate::bucket::EntryIndex;
use crate::config::NetworkConfig;
use crate::graph_ops::environment_graph;
use crate::isomorphism::find_isomorphism;

use super::{atom_mapping, ArchetypeOutput, Reaction};

/// Finds entry pairs of one formula and charge whose bond counts differ by
/// one, where removing a bond from the larger graph leaves it connected and
/// isomorphic to the smaller one.
///
/// For every such bond only the first matching smaller entry is used. The
/// smaller entry is the reactant.
pub fn generate(index: &EntryIndex, config: &NetworkConfig) -> ArchetypeOutput {
    let mut out = ArchetypeOutput::default();

    for formula in index.formulas() {
        let bond_counts: Vec<usize> = index.bond_counts(formula).collect();
        for pair in bond_counts.windows(2) {
            let (nbonds0, nbonds1) = (pair[0], pair[1]);
            if nbonds1 - nbonds0 != 1 {
                continue;
            }
            for charge in index.charges(formula, nbonds0) {
                let lower = index.get(formula, nbonds0, charge);
                for entry1 in index.get(formula, nbonds1, charge) {
                    for &bond in entry1.bonds() {
                        let Ok(broken) = entry1.graph().without_bonds(&[bond]) else {
                            continue;
                        };
                        if !broken.is_connected() {
                            continue;
                        }
                        let matched = lower.iter().find_map(|entry0| {
                            find_isomorphism(entry0.graph(), &broken).map(|m| (entry0, m))
                        });
                        if let Some((entry0, mapping)) = matched {
                            let reaction = Reaction::intramolecular(Arc::clone(entry0), Arc::clone(entry1))
                                .with_atom_mappings(atom_mapping::one_to_one(&mapping))
                                .with_electron_free_energy(config.electron_free_energy);
                            let environment =
                                environment_graph(entry1.graph(), &[bond], config.environment_radius);
                            out.push(reaction, environment, charge);
                        }
                    }
                }
            }
        }
    }
    out
}
