//! Reactions between molecule entries and the generators that find them.
//!
//! Every reaction is one [`Reaction`] value tagged with the archetype that
//! produced it. Direction `A` runs reactants to products and direction `B`
//! runs back; each direction carries its own label, energy and free energy.

pub mod atom_mapping;
pub mod concerted;
pub mod coordination;
pub mod error;
pub mod intermol;
pub mod intramol;
pub mod redox;

use std::fmt;
use std::sync::{Arc, OnceLock};

pub use atom_mapping::AtomMappings;
pub use concerted::ConcertedCandidate;
pub use error::ReactionError;

use crate::bipartite::{GraphError, ReactionGraph};
use crate::entry::MoleculeEntry;
use crate::family::FamilyClassifier;
use crate::mol::MolGraph;
use crate::rates::{eyring_rate, redox_rate, RateModel, RedoxParameters, ReversedRate};

/// Temperature (K) at which reaction free energies are memoized.
pub const REFERENCE_TEMPERATURE: f64 = 298.15;

/// Structural archetype a reaction was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReactionKind {
    Redox,
    Intramolecular,
    Intermolecular,
    Coordination,
    Concerted,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        ReactionKind::Redox,
        ReactionKind::Intramolecular,
        ReactionKind::Intermolecular,
        ReactionKind::Coordination,
        ReactionKind::Concerted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReactionKind::Redox => "redox",
            ReactionKind::Intramolecular => "intramolecular single bond change",
            ReactionKind::Intermolecular => "intermolecular",
            ReactionKind::Coordination => "coordination bond change",
            ReactionKind::Concerted => "concerted",
        }
    }
}

pub const ONE_ELECTRON_REDUCTION: &str = "One electron reduction";
pub const ONE_ELECTRON_OXIDATION: &str = "One electron oxidation";
pub const INTRAMOL_BREAKAGE: &str = "Intramolecular single bond breakage";
pub const INTRAMOL_FORMATION: &str = "Intramolecular single bond formation";
pub const MOLECULAR_DECOMPOSITION: &str = "Molecular decomposition breaking one bond A -> B+C";
pub const MOLECULAR_FORMATION: &str = "Molecular formation from one new bond A+B -> C";
pub const COORDINATION_BREAKING: &str = "Coordination bond breaking AM -> A+M";
pub const COORDINATION_FORMING: &str = "Coordination bond forming A+M -> AM";
pub const CONCERTED: &str = "Concerted";

/// Reactions found by one structural archetype, with their families.
#[derive(Debug, Default)]
pub struct ArchetypeOutput {
    pub reactions: Vec<Reaction>,
    pub classifier: FamilyClassifier,
}

impl ArchetypeOutput {
    fn push(&mut self, reaction: Reaction, environment: MolGraph, charge: i32) {
        self.classifier
            .categorize(self.reactions.len(), environment, charge);
        self.reactions.push(reaction);
    }
}

/// A value for each direction: `a` is reactants to products, `b` the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directional<T> {
    pub a: T,
    pub b: T,
}

impl<T> Directional<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn get(&self, reverse: bool) -> &T {
        if reverse {
            &self.b
        } else {
            &self.a
        }
    }

    pub fn swapped(self) -> Self {
        Self { a: self.b, b: self.a }
    }
}

impl Directional<f64> {
    /// Forward value and its exact negation.
    pub fn antisymmetric(a: f64) -> Self {
        Self { a, b: -a }
    }
}

/// One reaction between entries, in both directions.
pub struct Reaction {
    kind: ReactionKind,
    reactants: Vec<Arc<MoleculeEntry>>,
    products: Vec<Arc<MoleculeEntry>>,
    rxn_type: Directional<&'static str>,
    electron_free_energy: Option<f64>,
    redox_parameters: RedoxParameters,
    rate_model: Option<Arc<dyn RateModel>>,
    atom_mappings: Option<AtomMappings>,
    reference_free_energy: OnceLock<Option<Directional<f64>>>,
}

impl Reaction {
    fn with_labels(
        kind: ReactionKind,
        reactants: Vec<Arc<MoleculeEntry>>,
        products: Vec<Arc<MoleculeEntry>>,
        rxn_type: Directional<&'static str>,
    ) -> Self {
        Self {
            kind,
            reactants,
            products,
            rxn_type,
            electron_free_energy: None,
            redox_parameters: RedoxParameters::default(),
            rate_model: None,
            atom_mappings: None,
            reference_free_energy: OnceLock::new(),
        }
    }

    /// One-electron transfer `reactant -> product`.
    pub fn redox(reactant: Arc<MoleculeEntry>, product: Arc<MoleculeEntry>) -> Self {
        let rxn_type = if product.charge() < reactant.charge() {
            Directional::new(ONE_ELECTRON_REDUCTION, ONE_ELECTRON_OXIDATION)
        } else {
            Directional::new(ONE_ELECTRON_OXIDATION, ONE_ELECTRON_REDUCTION)
        };
        Self::with_labels(ReactionKind::Redox, vec![reactant], vec![product], rxn_type)
    }

    /// Single bond change within one molecule, `reactant -> product`.
    pub fn intramolecular(reactant: Arc<MoleculeEntry>, product: Arc<MoleculeEntry>) -> Self {
        let rxn_type = if product.charge() < reactant.charge() {
            Directional::new(INTRAMOL_BREAKAGE, INTRAMOL_FORMATION)
        } else {
            Directional::new(INTRAMOL_FORMATION, INTRAMOL_BREAKAGE)
        };
        Self::with_labels(
            ReactionKind::Intramolecular,
            vec![reactant],
            vec![product],
            rxn_type,
        )
    }

    /// One bond broken, `reactant -> products[0] + products[1]`.
    pub fn intermolecular(reactant: Arc<MoleculeEntry>, products: [Arc<MoleculeEntry>; 2]) -> Self {
        Self::with_labels(
            ReactionKind::Intermolecular,
            vec![reactant],
            products.into(),
            Directional::new(MOLECULAR_DECOMPOSITION, MOLECULAR_FORMATION),
        )
    }

    /// Metal released from a complex, `reactant -> ligand + metal`.
    pub fn coordination(
        reactant: Arc<MoleculeEntry>,
        ligand: Arc<MoleculeEntry>,
        metal: Arc<MoleculeEntry>,
    ) -> Self {
        Self::with_labels(
            ReactionKind::Coordination,
            vec![reactant],
            vec![ligand, metal],
            Directional::new(COORDINATION_BREAKING, COORDINATION_FORMING),
        )
    }

    /// Concerted reaction between arbitrary groups of entries.
    pub fn concerted(reactants: Vec<Arc<MoleculeEntry>>, products: Vec<Arc<MoleculeEntry>>) -> Self {
        Self::with_labels(
            ReactionKind::Concerted,
            reactants,
            products,
            Directional::new(CONCERTED, CONCERTED),
        )
    }

    /// Free energy of an electron, eV. Required for redox free energies.
    pub fn with_electron_free_energy(mut self, electron_free_energy: Option<f64>) -> Self {
        self.electron_free_energy = electron_free_energy;
        self.reference_free_energy = OnceLock::new();
        self
    }

    pub fn with_redox_parameters(mut self, params: RedoxParameters) -> Self {
        self.redox_parameters = params;
        self
    }

    pub fn with_rate_model(mut self, model: Arc<dyn RateModel>) -> Self {
        self.rate_model = Some(model);
        self
    }

    pub fn with_atom_mappings(mut self, mappings: AtomMappings) -> Self {
        self.atom_mappings = Some(mappings);
        self
    }

    /// The same reaction written the other way round.
    ///
    /// An attached rate model is kept with its directions exchanged.
    pub fn reversed(&self) -> Self {
        Self {
            kind: self.kind,
            reactants: self.products.clone(),
            products: self.reactants.clone(),
            rxn_type: self.rxn_type.swapped(),
            electron_free_energy: self.electron_free_energy,
            redox_parameters: self.redox_parameters,
            rate_model: self
                .rate_model
                .clone()
                .map(|model| Arc::new(ReversedRate(model)) as Arc<dyn RateModel>),
            atom_mappings: self.atom_mappings.clone().map(AtomMappings::swapped),
            reference_free_energy: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> ReactionKind {
        self.kind
    }

    pub fn reactants(&self) -> &[Arc<MoleculeEntry>] {
        &self.reactants
    }

    pub fn products(&self) -> &[Arc<MoleculeEntry>] {
        &self.products
    }

    pub fn reactant_indices(&self) -> Vec<usize> {
        self.reactants.iter().map(|e| e.index()).collect()
    }

    pub fn product_indices(&self) -> Vec<usize> {
        self.products.iter().map(|e| e.index()).collect()
    }

    pub fn reactant_ids(&self) -> Vec<&str> {
        self.reactants.iter().map(|e| e.id()).collect()
    }

    pub fn product_ids(&self) -> Vec<&str> {
        self.products.iter().map(|e| e.id()).collect()
    }

    /// `(reactant count, product count)`.
    pub fn cardinality(&self) -> (usize, usize) {
        (self.reactants.len(), self.products.len())
    }

    pub fn reactant_charge(&self) -> i32 {
        self.reactants.iter().map(|e| e.charge()).sum()
    }

    pub fn product_charge(&self) -> i32 {
        self.products.iter().map(|e| e.charge()).sum()
    }

    pub fn atom_mappings(&self) -> Option<&AtomMappings> {
        self.atom_mappings.as_ref()
    }

    pub fn rate_model(&self) -> Option<&Arc<dyn RateModel>> {
        self.rate_model.as_ref()
    }

    pub fn reaction_type(&self) -> Directional<&'static str> {
        self.rxn_type
    }

    /// Electronic energy change in Hartree.
    pub fn energy(&self) -> Directional<f64> {
        let reactants: f64 = self.reactants.iter().map(|e| e.energy()).sum();
        let products: f64 = self.products.iter().map(|e| e.energy()).sum();
        Directional::antisymmetric(products - reactants)
    }

    /// Free energy change in eV at `temperature`.
    ///
    /// Includes `Δq` electron free energies when the total charge changes.
    /// `None` when a participant lacks thermochemistry, or for a redox
    /// reaction without an electron free energy. Values at
    /// [`REFERENCE_TEMPERATURE`] are computed once and reused.
    pub fn free_energy(&self, temperature: f64) -> Option<Directional<f64>> {
        if temperature == REFERENCE_TEMPERATURE {
            *self
                .reference_free_energy
                .get_or_init(|| self.compute_free_energy(temperature))
        } else {
            self.compute_free_energy(temperature)
        }
    }

    fn compute_free_energy(&self, temperature: f64) -> Option<Directional<f64>> {
        let electron = match (self.kind, self.electron_free_energy) {
            (ReactionKind::Redox, None) => return None,
            (_, efe) => efe.unwrap_or(0.0),
        };
        let reactants = sum_free_energy(&self.reactants, temperature)?;
        let products = sum_free_energy(&self.products, temperature)?;
        let charge_change = f64::from(self.product_charge() - self.reactant_charge());
        Some(Directional::antisymmetric(
            products - reactants + charge_change * electron,
        ))
    }

    pub fn free_energy_or_err(&self, temperature: f64) -> Result<Directional<f64>, ReactionError> {
        self.free_energy(temperature)
            .ok_or_else(|| ReactionError::MissingFreeEnergy {
                reaction: self.to_string(),
            })
    }

    /// Rate constants for both directions.
    ///
    /// An attached [`RateModel`] wins; otherwise redox reactions use
    /// [`redox_rate`] and all others [`eyring_rate`] on the free energy.
    pub fn rate_constant(&self, temperature: f64) -> Result<Directional<f64>, ReactionError> {
        if let Some(model) = &self.rate_model {
            return Ok(Directional::new(
                model.calculate_rate_constant(temperature, false),
                model.calculate_rate_constant(temperature, true),
            ));
        }
        let g = self.free_energy_or_err(temperature)?;
        let rate = |delta_g: f64| match self.kind {
            ReactionKind::Redox => redox_rate(delta_g, temperature, &self.redox_parameters),
            _ => eyring_rate(delta_g, temperature),
        };
        Ok(Directional::new(rate(g.a), rate(g.b)))
    }

    /// Standalone bipartite graph holding both directions of this reaction.
    pub fn graph_representation(&self) -> Result<ReactionGraph, GraphError> {
        let mut graph = ReactionGraph::new();
        graph.add_reaction(self)?;
        Ok(graph)
    }
}

fn sum_free_energy(side: &[Arc<MoleculeEntry>], temperature: f64) -> Option<f64> {
    side.iter().map(|e| e.free_energy(temperature)).sum()
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |side: &[Arc<MoleculeEntry>]| {
            side.iter()
                .map(|e| e.index().to_string())
                .collect::<Vec<_>>()
                .join(" + ")
        };
        write!(
            f,
            "{} -> {} ({})",
            join(&self.reactants),
            join(&self.products),
            self.kind.name()
        )
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("kind", &self.kind)
            .field("reactants", &self.reactant_indices())
            .field("products", &self.product_indices())
            .field("rxn_type", &self.rxn_type)
            .finish()
    }
}
