//! Release of a metal cation from a coordination complex.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{trace, warn};
use petgraph::graph::NodeIndex;

use crate::bucket::EntryIndex;
use crate::config::NetworkConfig;
use crate::element::Element;
use crate::entry::MoleculeEntry;
use crate::formula::parse_formula;
use crate::graph_ops::environment_graph;
use crate::mol::BondPair;

use super::intermol::first_match;
use super::{atom_mapping, ArchetypeOutput, Reaction};

/// Bare metal entries: `formula -> charge -> entry`.
type MetalEntries = BTreeMap<String, BTreeMap<i32, Arc<MoleculeEntry>>>;

fn metal_entries(index: &EntryIndex, metals: &[Element]) -> MetalEntries {
    let mut found = MetalEntries::new();
    for metal in metals {
        let formula = format!("{}1", metal.symbol());
        for charge in index.charges(&formula, 0) {
            let bucket = index.get(&formula, 0, charge);
            if bucket.len() > 1 {
                warn!(
                    "{} entries for {formula} with charge {charge}; using {}",
                    bucket.len(),
                    bucket[0].id()
                );
            }
            if let Some(first) = bucket.first() {
                found
                    .entry(formula.clone())
                    .or_default()
                    .insert(charge, Arc::clone(first));
            }
        }
    }
    found
}

/// Finds complexes that fall apart into a bare metal and a ligand when two
/// metal bonds are broken together.
///
/// Only formulas containing one of `metals` with more than two bonds are
/// searched, and only metal bonds that cannot split the molecule on their
/// own are paired. The ligand is the first isomorphic entry of its bucket.
pub fn generate(index: &EntryIndex, config: &NetworkConfig, metals: &[Element]) -> ArchetypeOutput {
    let mut out = ArchetypeOutput::default();
    let metal_entries = metal_entries(index, metals);
    if metal_entries.is_empty() {
        return out;
    }

    for formula in index.formulas() {
        let has_metal = parse_formula(formula)
            .is_some_and(|comp| metals.iter().any(|&m| comp.contains(m)));
        if !has_metal {
            continue;
        }
        for num_bonds in index.bond_counts(formula).filter(|&n| n > 2) {
            for charge in index.charges(formula, num_bonds) {
                for entry in index.get(formula, num_bonds, charge) {
                    release_metal(entry, index, config, &metal_entries, &mut out);
                }
            }
        }
    }
    out
}

/// Metal bonds whose removal alone leaves the molecule connected.
fn unsplittable_metal_bonds(entry: &MoleculeEntry, metal_entries: &MetalEntries) -> Vec<BondPair> {
    let graph = entry.graph();
    let is_metal = |i: usize| {
        let symbol = graph.atom(NodeIndex::new(i)).element.symbol();
        metal_entries.contains_key(&format!("{symbol}1"))
    };
    entry
        .bonds()
        .iter()
        .copied()
        .filter(|&(a, b)| is_metal(a) || is_metal(b))
        .filter(|&bond| graph.split(&[bond]).is_err())
        .collect()
}

fn release_metal(
    entry: &Arc<MoleculeEntry>,
    index: &EntryIndex,
    config: &NetworkConfig,
    metal_entries: &MetalEntries,
    out: &mut ArchetypeOutput,
) {
    let bonds = unsplittable_metal_bonds(entry, metal_entries);
    for (i, &first) in bonds.iter().enumerate() {
        for &second in &bonds[i + 1..] {
            let pair = [first, second];
            let frags = match entry.graph().split(&pair) {
                Ok(frags) => frags,
                Err(err) => {
                    trace!("{}: bonds {:?} skipped: {err}", entry.id(), pair);
                    continue;
                }
            };
            let Some((metal_pos, metal_formula)) = frags.iter().enumerate().find_map(|(i, f)| {
                let formula = f.graph.formula();
                metal_entries.contains_key(&formula).then_some((i, formula))
            }) else {
                continue;
            };
            let metal_frag = &frags[metal_pos];

            for (pos, ligand_frag) in frags.iter().enumerate() {
                if pos == metal_pos {
                    continue;
                }
                let ligand_formula = ligand_frag.graph.formula();
                let ligand_bonds = ligand_frag.graph.bond_count();
                for ligand_charge in index.charges(&ligand_formula, ligand_bonds) {
                    let Some(metal) = metal_entries
                        .get(&metal_formula)
                        .and_then(|by_charge| by_charge.get(&(entry.charge() - ligand_charge)))
                    else {
                        continue;
                    };
                    let candidates = index.get(&ligand_formula, ligand_bonds, ligand_charge);
                    let Some(ligand) = first_match(candidates, ligand_frag) else {
                        continue;
                    };

                    let mut reaction =
                        Reaction::coordination(Arc::clone(entry), Arc::clone(ligand), Arc::clone(metal))
                            .with_electron_free_energy(config.electron_free_energy);
                    match atom_mapping::one_to_many(
                        entry.graph(),
                        &[(ligand.graph(), ligand_frag), (metal.graph(), metal_frag)],
                    ) {
                        Ok(mapping) => reaction = reaction.with_atom_mappings(mapping),
                        Err(err) => warn!("{}: {err}", entry.id()),
                    }
                    let environment = environment_graph(entry.graph(), &pair, config.environment_radius);
                    out.push(reaction, environment, entry.charge());
                }
            }
        }
    }
}
