//! Post-processing of kinetic Monte Carlo runs over an enumerated network.

pub mod analyze;
pub mod trajectory;

pub use analyze::{PathwayCollection, PathwayOutcome, PathwayRecord, SimulationAnalyzer, SpeciesConsumption};
pub use trajectory::{
    load_histories, load_initial_state, ReactionRecord, ReactionTable, SimulationHistory, StateVector,
    TrajectoryError,
};
