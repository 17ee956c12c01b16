//! One-electron transfers between isomorphic entries.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::bucket::EntryIndex;
use crate::config::NetworkConfig;
use crate::isomorphism::find_isomorphism;

use super::{atom_mapping, Reaction};

/// `formula -> lower charge -> reaction indices`.
pub type RedoxFamilies = BTreeMap<String, BTreeMap<i32, Vec<usize>>>;

/// Pairs every two isomorphic entries of the same formula and bond count
/// whose charges are adjacent in the bucket and differ by one.
///
/// The lower-charge entry is the reactant, so direction `A` is always an
/// oxidation.
pub fn generate(index: &EntryIndex, config: &NetworkConfig) -> (Vec<Reaction>, RedoxFamilies) {
    let mut reactions = Vec::new();
    let mut families = RedoxFamilies::new();

    for formula in index.formulas() {
        for num_bonds in index.bond_counts(formula) {
            let charges: Vec<i32> = index.charges(formula, num_bonds).collect();
            for pair in charges.windows(2) {
                let (charge0, charge1) = (pair[0], pair[1]);
                if charge1 - charge0 != 1 {
                    continue;
                }
                for entry0 in index.get(formula, num_bonds, charge0) {
                    for entry1 in index.get(formula, num_bonds, charge1) {
                        let Some(mapping) = find_isomorphism(entry0.graph(), entry1.graph()) else {
                            continue;
                        };
                        let reaction = Reaction::redox(Arc::clone(entry0), Arc::clone(entry1))
                            .with_atom_mappings(atom_mapping::one_to_one(&mapping))
                            .with_electron_free_energy(config.electron_free_energy)
                            .with_redox_parameters(config.redox);
                        families
                            .entry(formula.to_string())
                            .or_default()
                            .entry(charge0)
                            .or_default()
                            .push(reactions.len());
                        reactions.push(reaction);
                    }
                }
            }
        }
    }
    (reactions, families)
}
