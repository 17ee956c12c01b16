//! Molecule entries: a bonding graph plus the thermochemistry attached to it.
//!
//! Entries are immutable once built and are shared between buckets,
//! reactions and graph builders through [`Arc`].

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::element::Element;
use crate::formula::Composition;
use crate::isomorphism::is_isomorphic;
use crate::mol::{BondPair, GraphBuildError, MolGraph};

/// Hartree to eV.
pub const HARTREE_TO_EV: f64 = 27.21139;
/// kcal/mol to eV.
pub const KCAL_PER_MOL_TO_EV: f64 = 0.0433641;
/// cal/(mol K) to eV/K.
pub const CAL_PER_MOL_K_TO_EV_PER_K: f64 = 0.0000433641;

/// Error returned when an entry cannot be built from a molecule document.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("unable to construct molecule entry from molecule document; missing attribute `{field}`")]
    MissingField { field: &'static str },

    #[error("unknown element symbol `{symbol}` in molecule document")]
    UnknownElement { symbol: String },

    #[error("invalid bonding graph: {0}")]
    InvalidGraph(#[from] GraphBuildError),

    #[error("malformed molecule document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A molecular species with its energetics and bonding graph.
#[derive(Clone)]
pub struct MoleculeEntry {
    id: String,
    graph: MolGraph,
    charge: i32,
    uncorrected_energy: f64,
    correction: f64,
    enthalpy: Option<f64>,
    entropy: Option<f64>,
    index: usize,
    formula: String,
    bonds: Vec<BondPair>,
}

impl MoleculeEntry {
    /// Creates an entry with an electronic energy in Hartree and no thermochemistry.
    pub fn new(id: impl Into<String>, graph: MolGraph, charge: i32, energy: f64) -> Self {
        let formula = graph.formula();
        let bonds = graph.bonds();
        Self {
            id: id.into(),
            graph,
            charge,
            uncorrected_energy: energy,
            correction: 0.0,
            enthalpy: None,
            entropy: None,
            index: 0,
            formula,
            bonds,
        }
    }

    /// Sets enthalpy (kcal/mol) and entropy (cal/mol K).
    pub fn with_thermo(mut self, enthalpy: f64, entropy: f64) -> Self {
        self.enthalpy = Some(enthalpy);
        self.entropy = Some(entropy);
        self
    }

    pub fn with_correction(mut self, correction: f64) -> Self {
        self.correction = correction;
        self
    }

    /// Sets the position of this entry in the global species ordering.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Builds an entry from a raw molecule document.
    ///
    /// The document must carry `molecule` (species and charge), `mol_graph`
    /// (bond list), `energy_Ha`, `enthalpy_kcal/mol`, `entropy_cal/molK` and
    /// `task_id`. The first missing one is named in the error.
    pub fn from_document(doc: &serde_json::Value, correction: f64) -> Result<Self, EntryError> {
        let raw = MoleculeDocument::deserialize(doc)?;

        let molecule = raw.molecule.ok_or(EntryError::MissingField { field: "molecule" })?;
        let energy = raw.energy.ok_or(EntryError::MissingField { field: "energy_Ha" })?;
        let enthalpy = raw.enthalpy.ok_or(EntryError::MissingField {
            field: "enthalpy_kcal/mol",
        })?;
        let entropy = raw.entropy.ok_or(EntryError::MissingField {
            field: "entropy_cal/molK",
        })?;
        let id = raw.task_id.ok_or(EntryError::MissingField { field: "task_id" })?;
        let mol_graph = raw.mol_graph.ok_or(EntryError::MissingField { field: "mol_graph" })?;

        let elements = molecule
            .species
            .iter()
            .map(|s| {
                Element::from_symbol(s).ok_or_else(|| EntryError::UnknownElement { symbol: s.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let bonds: Vec<BondPair> = mol_graph.bonds.iter().map(|&[a, b]| (a, b)).collect();
        let graph = MolGraph::from_parts(elements, &bonds)?;

        Ok(Self::new(id.into_string(), graph, molecule.charge, energy)
            .with_thermo(enthalpy, entropy)
            .with_correction(correction))
    }

    /// Builds one entry per document; a bad document fails alone.
    pub fn from_documents(docs: &[serde_json::Value]) -> Vec<Result<Self, EntryError>> {
        docs.iter().map(|doc| Self::from_document(doc, 0.0)).collect()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn graph(&self) -> &MolGraph {
        &self.graph
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    /// Corrected electronic energy in Hartree.
    pub fn energy(&self) -> f64 {
        self.uncorrected_energy + self.correction
    }

    pub fn uncorrected_energy(&self) -> f64 {
        self.uncorrected_energy
    }

    pub fn correction(&self) -> f64 {
        self.correction
    }

    pub fn enthalpy(&self) -> Option<f64> {
        self.enthalpy
    }

    pub fn entropy(&self) -> Option<f64> {
        self.entropy
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn composition(&self) -> Composition {
        self.graph.composition()
    }

    pub fn species(&self) -> Vec<Element> {
        self.graph.species()
    }

    pub fn num_atoms(&self) -> usize {
        self.graph.atom_count()
    }

    pub fn bonds(&self) -> &[BondPair] {
        &self.bonds
    }

    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    /// Free energy in eV, or `None` without enthalpy and entropy.
    pub fn free_energy(&self, temperature: f64) -> Option<f64> {
        let enthalpy = self.enthalpy?;
        let entropy = self.entropy?;
        Some(
            self.energy() * HARTREE_TO_EV + KCAL_PER_MOL_TO_EV * enthalpy
                - temperature * entropy * CAL_PER_MOL_K_TO_EV_PER_K,
        )
    }

    /// Breaks every bond in turn.
    ///
    /// Each result holds two fragments, or one (the opened molecule) when the
    /// bond is part of a ring. Empty for molecules without bonds.
    pub fn fragments(&self) -> Vec<BondFragments> {
        self.bonds
            .iter()
            .filter_map(|&bond| {
                let fragments = match self.graph.split(&[bond]) {
                    Ok(frags) => frags.into_iter().map(|f| f.graph).collect(),
                    Err(_) => vec![self.graph.without_bonds(&[bond]).ok()?],
                };
                Some(BondFragments { bond, fragments })
            })
            .collect()
    }

    /// Groups bonds whose breakage gives isomorphic fragments.
    ///
    /// Each bond appears in exactly one group; groups are ordered by their
    /// first bond.
    pub fn isomorphic_bonds(&self) -> Vec<Vec<BondPair>> {
        let fragments = self.fragments();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (i, current) in fragments.iter().enumerate() {
            let existing = groups
                .iter_mut()
                .find(|group| same_fragments(&fragments[group[0]].fragments, &current.fragments));
            match existing {
                Some(group) => group.push(i),
                None => groups.push(vec![i]),
            }
        }
        groups
            .into_iter()
            .map(|group| group.into_iter().map(|i| fragments[i].bond).collect())
            .collect()
    }
}

fn same_fragments(a: &[MolGraph], b: &[MolGraph]) -> bool {
    match (a, b) {
        ([a0], [b0]) => is_isomorphic(a0, b0),
        ([a0, a1], [b0, b1]) => {
            (is_isomorphic(a0, b0) && is_isomorphic(a1, b1))
                || (is_isomorphic(a0, b1) && is_isomorphic(a1, b0))
        }
        _ => false,
    }
}

/// Fragments obtained by breaking one bond of an entry.
#[derive(Debug, Clone)]
pub struct BondFragments {
    pub bond: BondPair,
    pub fragments: Vec<MolGraph>,
}

/// Assigns each entry its position as its index and wraps it for sharing.
pub fn index_entries(entries: impl IntoIterator<Item = MoleculeEntry>) -> Vec<Arc<MoleculeEntry>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| Arc::new(e.with_index(i)))
        .collect()
}

impl fmt::Debug for MoleculeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoleculeEntry")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("formula", &self.formula)
            .field("bonds", &self.num_bonds())
            .field("charge", &self.charge)
            .finish()
    }
}

impl fmt::Display for MoleculeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "MoleculeEntry {} - {} - E{} - C{}",
            self.id,
            self.formula,
            self.num_bonds(),
            self.charge
        )?;
        writeln!(f, "Energy = {:.4} Hartree", self.uncorrected_energy)?;
        write!(f, "Correction = {:.4} Hartree", self.correction)?;
        if let (Some(h), Some(s)) = (self.enthalpy, self.entropy) {
            write!(f, "\nEnthalpy = {h:.4} kcal/mol\nEntropy = {s:.4} cal/mol.K")?;
        }
        if let Some(g) = self.free_energy(crate::REFERENCE_TEMPERATURE) {
            write!(f, "\nFree Energy (298.15 K) = {g:.4} eV")?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct MoleculeDocument {
    molecule: Option<MoleculeRecord>,
    mol_graph: Option<GraphRecord>,
    #[serde(rename = "energy_Ha")]
    energy: Option<f64>,
    #[serde(rename = "enthalpy_kcal/mol")]
    enthalpy: Option<f64>,
    #[serde(rename = "entropy_cal/molK")]
    entropy: Option<f64>,
    task_id: Option<TaskId>,
}

#[derive(Deserialize)]
struct MoleculeRecord {
    species: Vec<String>,
    #[serde(default)]
    charge: i32,
}

#[derive(Deserialize)]
struct GraphRecord {
    #[serde(default)]
    bonds: Vec<[usize; 2]>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskId {
    Text(String),
    Number(i64),
}

impl TaskId {
    fn into_string(self) -> String {
        match self {
            TaskId::Text(s) => s,
            TaskId::Number(n) => n.to_string(),
        }
    }
}
