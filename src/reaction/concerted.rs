//! Concerted reactions supplied as candidate index groupings.
//!
//! Finding concerted candidates is left to an external search; this module
//! only turns its `"i_j"` index strings into reactions.

use std::str::FromStr;
use std::sync::Arc;

use crate::entry::MoleculeEntry;

use super::{Reaction, ReactionError};

/// Most entries allowed on either side of a concerted reaction.
pub const MAX_PER_SIDE: usize = 2;

/// Reactant and product entry indices of one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcertedCandidate {
    pub reactants: Vec<usize>,
    pub products: Vec<usize>,
}

fn parse_side(side: &str, raw: &str) -> Result<Vec<usize>, ReactionError> {
    let indices = side
        .split('_')
        .map(|tok| tok.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ReactionError::InvalidCandidate(raw.to_string()))?;
    if indices.is_empty() || indices.len() > MAX_PER_SIDE {
        return Err(ReactionError::InvalidCandidate(raw.to_string()));
    }
    Ok(indices)
}

impl ConcertedCandidate {
    /// Parses `"0_1"`-style strings for each side.
    pub fn parse(reactants: &str, products: &str) -> Result<Self, ReactionError> {
        let raw = format!("{reactants},{products}");
        Ok(Self {
            reactants: parse_side(reactants, &raw)?,
            products: parse_side(products, &raw)?,
        })
    }
}

impl FromStr for ConcertedCandidate {
    type Err = ReactionError;

    /// `"reactants,products"`, e.g. `"0_1,2_3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (reactants, products) = s
            .split_once(',')
            .ok_or_else(|| ReactionError::InvalidCandidate(s.to_string()))?;
        Self::parse(reactants, products)
    }
}

/// Builds one reaction per candidate whose total charge changes by at most
/// `allowed_charge_change`. Candidates referring to unknown entries fail the
/// whole batch.
pub fn generate(
    entries: &[Arc<MoleculeEntry>],
    candidates: &[ConcertedCandidate],
    allowed_charge_change: u32,
    electron_free_energy: Option<f64>,
) -> Result<Vec<Reaction>, ReactionError> {
    let lookup = |indices: &[usize], candidate: &ConcertedCandidate| {
        indices
            .iter()
            .map(|&i| {
                entries.get(i).cloned().ok_or_else(|| {
                    ReactionError::InvalidCandidate(format!(
                        "{:?} -> {:?}: no entry {i}",
                        candidate.reactants, candidate.products
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()
    };

    let mut reactions = Vec::new();
    for candidate in candidates {
        let reactants = lookup(&candidate.reactants, candidate)?;
        let products = lookup(&candidate.products, candidate)?;
        let charge = |side: &[Arc<MoleculeEntry>]| side.iter().map(|e| e.charge()).sum::<i32>();
        if (charge(&products) - charge(&reactants)).unsigned_abs() > allowed_charge_change {
            continue;
        }
        reactions.push(
            Reaction::concerted(reactants, products).with_electron_free_energy(electron_free_energy),
        );
    }
    Ok(reactions)
}
