use thiserror::Error;

/// Error returned by reaction energetics and construction helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactionError {
    /// A participant lacks thermochemistry, or a redox reaction has no
    /// electron free energy.
    #[error("free energy unavailable for reaction {reaction}")]
    MissingFreeEnergy { reaction: String },

    /// A product graph does not match the reactant fragment it was paired with.
    #[error("product {product} is not isomorphic to its reactant fragment")]
    AtomMapping { product: usize },

    /// A concerted candidate string is not a `_`-separated list of indices.
    #[error("invalid concerted candidate `{0}`")]
    InvalidCandidate(String),
}
