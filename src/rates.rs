//! Rate constants.
//!
//! A reaction may carry any [`RateModel`]. Without one, rates come from the
//! Eyring expression on the reaction free energy, or from its Marcus-style
//! variant for one-electron transfers.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::entry::{MoleculeEntry, HARTREE_TO_EV};

/// Boltzmann constant, J/K.
pub const BOLTZMANN: f64 = 1.380649e-23;
/// Planck constant, J s.
pub const PLANCK: f64 = 6.62607015e-34;
/// Molar gas constant, J/(mol K).
pub const GAS_CONSTANT: f64 = 8.314462618;
/// Faraday constant as used for eV to J/mol conversion.
pub const EV_TO_J_PER_MOL: f64 = 96487.0;

/// Pluggable thermodynamic or kinetic rate calculator.
pub trait RateModel: Send + Sync + fmt::Debug {
    /// Rate constant of the forward direction, or of the reverse one when
    /// `reverse` is set.
    fn calculate_rate_constant(&self, temperature: f64, reverse: bool) -> f64;
}

/// Prefactor `kB T / h`, in 1/s.
pub fn attempt_frequency(temperature: f64) -> f64 {
    BOLTZMANN * temperature / PLANCK
}

/// `exp(-ΔG / RT)` with ΔG in eV.
pub fn boltzmann_factor(delta_g: f64, temperature: f64) -> f64 {
    (-delta_g * EV_TO_J_PER_MOL / (GAS_CONSTANT * temperature)).exp()
}

/// Eyring estimate from a reaction free energy in eV.
///
/// Downhill reactions are barrierless and proceed at `kB T / h`.
pub fn eyring_rate(delta_g: f64, temperature: f64) -> f64 {
    if delta_g < 0.0 {
        attempt_frequency(temperature)
    } else {
        attempt_frequency(temperature) * boltzmann_factor(delta_g, temperature)
    }
}

/// Optional parameters for one-electron transfer rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedoxParameters {
    /// Inner-sphere reorganization energy λ in eV.
    #[serde(default)]
    pub inner_reorganization_energy: Option<f64>,
    /// Distance from the reacting species to the electrode, in Å.
    #[serde(default)]
    pub electrode_distance: Option<f64>,
}

impl RedoxParameters {
    fn tunneling_prefactor(&self) -> f64 {
        self.electrode_distance.map_or(1.0, |d| (-1.2 * d).exp())
    }
}

/// Rate of a one-electron transfer with free energy `delta_g` (eV).
///
/// With a reorganization energy the Marcus barrier `λ/4 (1 + ΔG/λ)²` is
/// always applied; without one the Eyring form is used, barrierless when
/// downhill. Both are scaled by `exp(-1.2 d)` for an electrode distance `d`.
pub fn redox_rate(delta_g: f64, temperature: f64, params: &RedoxParameters) -> f64 {
    let kappa = params.tunneling_prefactor();
    match params.inner_reorganization_energy {
        Some(lambda) => {
            let barrier = lambda / 4.0 * (1.0 + delta_g / lambda).powi(2);
            kappa * attempt_frequency(temperature) * boltzmann_factor(barrier, temperature)
        }
        None => kappa * eyring_rate(delta_g, temperature),
    }
}

fn side_free_energy(side: &[Arc<MoleculeEntry>], temperature: f64) -> f64 {
    side.iter()
        .map(|e| {
            e.free_energy(temperature)
                .unwrap_or_else(|| e.energy() * HARTREE_TO_EV)
        })
        .sum()
}

/// Eyring rate through an explicit transition-state entry.
///
/// The barrier is the transition state's free energy above the starting side.
/// Entries without thermochemistry contribute their electronic energy.
#[derive(Debug, Clone)]
pub struct TransitionStateRate {
    reactants: Vec<Arc<MoleculeEntry>>,
    products: Vec<Arc<MoleculeEntry>>,
    transition_state: Arc<MoleculeEntry>,
}

impl TransitionStateRate {
    pub fn new(
        reactants: Vec<Arc<MoleculeEntry>>,
        products: Vec<Arc<MoleculeEntry>>,
        transition_state: Arc<MoleculeEntry>,
    ) -> Self {
        Self {
            reactants,
            products,
            transition_state,
        }
    }

    pub fn activation_free_energy(&self, temperature: f64, reverse: bool) -> f64 {
        let start = if reverse { &self.products } else { &self.reactants };
        side_free_energy(std::slice::from_ref(&self.transition_state), temperature)
            - side_free_energy(start, temperature)
    }
}

impl RateModel for TransitionStateRate {
    fn calculate_rate_constant(&self, temperature: f64, reverse: bool) -> f64 {
        let barrier = self.activation_free_energy(temperature, reverse);
        attempt_frequency(temperature) * boltzmann_factor(barrier, temperature)
    }
}

/// Another model with its two directions exchanged.
#[derive(Debug, Clone)]
pub struct ReversedRate(pub Arc<dyn RateModel>);

impl RateModel for ReversedRate {
    fn calculate_rate_constant(&self, temperature: f64, reverse: bool) -> f64 {
        self.0.calculate_rate_constant(temperature, !reverse)
    }
}

/// Bell–Evans–Polanyi estimate anchored on a reference reaction.
///
/// The activation enthalpy shifts by `alpha` times the difference between
/// this reaction's enthalpy and the reference's; the activation entropy is
/// taken from the reference. All energies in eV, entropies in eV/K.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ExpandedBep {
    pub alpha: f64,
    pub reference_activation_enthalpy: f64,
    pub reference_activation_entropy: f64,
    pub reference_reaction_enthalpy: f64,
    pub reaction_enthalpy: f64,
}

impl ExpandedBep {
    pub fn activation_free_energy(&self, temperature: f64, reverse: bool) -> f64 {
        let delta_h = if reverse {
            -self.reaction_enthalpy
        } else {
            self.reaction_enthalpy
        };
        let activation_h = self.reference_activation_enthalpy
            + self.alpha * (delta_h - self.reference_reaction_enthalpy);
        activation_h - temperature * self.reference_activation_entropy
    }
}

impl RateModel for ExpandedBep {
    fn calculate_rate_constant(&self, temperature: f64, reverse: bool) -> f64 {
        let barrier = self.activation_free_energy(temperature, reverse);
        attempt_frequency(temperature) * boltzmann_factor(barrier, temperature)
    }
}
