pub mod atom;
pub mod bipartite;
pub mod bucket;
pub mod config;
pub mod element;
pub mod entry;
pub mod enumerate;
pub mod family;
pub mod formula;
pub mod graph_ops;
pub mod isomorphism;
pub mod mol;
pub mod rates;
pub mod reaction;
pub mod stochastic;
pub mod weights;

pub use atom::Atom;
pub use bipartite::{CostFunction, EdgeWeights, GraphError, GraphPath, NetworkNode, NodeKey, ReactionGraph, ReactionNode};
pub use bucket::{bucket, unbucket, Bucket, BucketKey, BucketValue, EntryIndex};
pub use config::{ConfigError, NetworkConfig};
pub use element::Element;
pub use entry::{index_entries, EntryError, MoleculeEntry};
pub use enumerate::{Enumeration, ReactionEnumerator};
pub use family::{Families, FamilyClassifier};
pub use formula::{parse_formula, Composition};
pub use isomorphism::{find_isomorphism, is_isomorphic, AtomMapping};
pub use mol::{BondPair, GraphBuildError, MolGraph, SplitError};
pub use rates::{ExpandedBep, RateModel, RedoxParameters, ReversedRate, TransitionStateRate};
pub use reaction::{
    AtomMappings, ConcertedCandidate, Directional, Reaction, ReactionError, ReactionKind, REFERENCE_TEMPERATURE,
};
pub use stochastic::{
    PathwayCollection, PathwayOutcome, PathwayRecord, ReactionRecord, ReactionTable, SimulationAnalyzer,
    SimulationHistory, StateVector, TrajectoryError,
};
pub use weights::WideWeight;
