//! Runs every reaction archetype over an entry population.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use rayon::prelude::*;

use crate::bipartite::{GraphError, ReactionGraph};
use crate::bucket::EntryIndex;
use crate::config::{ConfigError, NetworkConfig};
use crate::element::Element;
use crate::entry::MoleculeEntry;
use crate::family::Families;
use crate::mol::MolGraph;
use crate::reaction::redox::RedoxFamilies;
use crate::reaction::{
    concerted, coordination, intermol, intramol, redox, ArchetypeOutput, ConcertedCandidate, Reaction,
    ReactionError, ReactionKind,
};
use crate::stochastic::ReactionTable;

/// All reactions of a population, in archetype order.
#[derive(Debug)]
pub struct Enumeration {
    pub reactions: Vec<Reaction>,
    /// Families per structural archetype, indexing into `reactions`.
    pub families: BTreeMap<ReactionKind, Families>,
    pub templates: BTreeMap<ReactionKind, Vec<MolGraph>>,
    pub redox_families: RedoxFamilies,
    /// Kelvin; the configured temperature the enumeration ran with.
    pub temperature: f64,
}

impl Enumeration {
    fn new(temperature: f64) -> Self {
        Self {
            reactions: Vec::new(),
            families: BTreeMap::new(),
            templates: BTreeMap::new(),
            redox_families: RedoxFamilies::new(),
            temperature,
        }
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    pub fn of_kind(&self, kind: ReactionKind) -> impl Iterator<Item = &Reaction> + '_ {
        self.reactions.iter().filter(move |r| r.kind() == kind)
    }

    pub fn count(&self, kind: ReactionKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Bipartite graph of every reaction at the configured temperature.
    pub fn graph(&self) -> Result<ReactionGraph, GraphError> {
        self.graph_at(self.temperature)
    }

    /// Bipartite graph at `temperature`.
    ///
    /// Each archetype is embedded on its own and the graphs are merged in
    /// archetype order, so later archetypes overwrite shared reaction nodes.
    pub fn graph_at(&self, temperature: f64) -> Result<ReactionGraph, GraphError> {
        let parts = ReactionKind::ALL
            .par_iter()
            .map(|&kind| ReactionGraph::from_reactions(self.of_kind(kind), temperature))
            .collect::<Result<Vec<_>, _>>()?;
        let mut graph = ReactionGraph::new();
        for part in &parts {
            graph.extend(part);
        }
        Ok(graph)
    }

    pub fn reaction_table(&self) -> ReactionTable {
        self.reaction_table_at(self.temperature)
    }

    pub fn reaction_table_at(&self, temperature: f64) -> ReactionTable {
        ReactionTable::from_reactions(&self.reactions, temperature)
    }

    fn append(&mut self, kind: ReactionKind, output: ArchetypeOutput) {
        let ArchetypeOutput {
            reactions,
            mut classifier,
        } = output;
        info!("{}: {} reactions", kind.name(), reactions.len());
        classifier.offset_reactions(self.reactions.len());
        let (templates, families) = classifier.into_parts();
        self.families.insert(kind, families);
        self.templates.insert(kind, templates);
        self.reactions.extend(reactions);
    }
}

/// Enumerates reactions among entries according to a [`NetworkConfig`].
#[derive(Debug, Clone)]
pub struct ReactionEnumerator {
    config: NetworkConfig,
    metals: Vec<Element>,
}

impl ReactionEnumerator {
    pub fn new(config: NetworkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let metals = config.metals()?;
        Ok(Self { config, metals })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Finds every reaction of every archetype.
    ///
    /// Redox, intramolecular, intermolecular and coordination reactions are
    /// searched independently (in parallel unless disabled) and concatenated
    /// in that order, followed by the concerted `candidates`, whose indices
    /// refer to positions in `entries`.
    pub fn enumerate(
        &self,
        entries: &[Arc<MoleculeEntry>],
        candidates: &[ConcertedCandidate],
    ) -> Result<Enumeration, ReactionError> {
        let index = EntryIndex::new(entries);
        let config = &self.config;
        info!(
            "enumerating reactions among {} entries ({} formulas)",
            index.len(),
            index.formulas().count()
        );

        let run_redox = || redox::generate(&index, config);
        let run_intramol = || intramol::generate(&index, config);
        let run_intermol = || intermol::generate(&index, config);
        let run_coordination = || coordination::generate(&index, config, &self.metals);

        let ((redox, intramol), (intermol, coordination)) = if config.parallel {
            rayon::join(
                || rayon::join(run_redox, run_intramol),
                || rayon::join(run_intermol, run_coordination),
            )
        } else {
            (
                (run_redox(), run_intramol()),
                (run_intermol(), run_coordination()),
            )
        };

        let mut out = Enumeration::new(config.temperature);
        let (redox_reactions, redox_families) = redox;
        info!("{}: {} reactions", ReactionKind::Redox.name(), redox_reactions.len());
        out.reactions.extend(redox_reactions);
        out.redox_families = redox_families;

        out.append(ReactionKind::Intramolecular, intramol);
        out.append(ReactionKind::Intermolecular, intermol);
        out.append(ReactionKind::Coordination, coordination);

        let concerted = concerted::generate(
            entries,
            candidates,
            config.allowed_charge_change,
            config.electron_free_energy,
        )?;
        if !candidates.is_empty() {
            info!(
                "{}: {} of {} candidates kept",
                ReactionKind::Concerted.name(),
                concerted.len(),
                candidates.len()
            );
        }
        out.reactions.extend(concerted);

        info!("{} reactions in total", out.reactions.len());
        Ok(out)
    }
}
