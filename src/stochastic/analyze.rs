//! Formation pathways and species statistics from simulation histories.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::NetworkConfig;

use super::trajectory::{ReactionTable, SimulationHistory, StateVector, TrajectoryError};

/// Result of reconstructing how one trajectory formed the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathwayOutcome {
    /// Reactions in firing order, ending with the first one producing the target.
    Produced(Vec<usize>),
    NotProduced,
    /// Resolution stopped with precursors still missing.
    Unresolvable {
        partial: Vec<usize>,
        missing: Vec<usize>,
    },
}

/// A distinct pathway and how many trajectories followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathwayRecord {
    pub pathway: Vec<usize>,
    pub frequency: usize,
}

/// Pathways deduplicated by their set of reaction indices.
///
/// The first pathway seen for a set is kept as its representative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathwayCollection {
    records: Vec<PathwayRecord>,
    keys: HashMap<BTreeSet<usize>, usize>,
    pub not_produced: usize,
    pub unresolvable: usize,
}

impl PathwayCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_pathway(&mut self, pathway: Vec<usize>, frequency: usize) {
        let key: BTreeSet<usize> = pathway.iter().copied().collect();
        match self.keys.get(&key) {
            Some(&pos) => self.records[pos].frequency += frequency,
            None => {
                self.keys.insert(key, self.records.len());
                self.records.push(PathwayRecord { pathway, frequency });
            }
        }
    }

    pub fn add(&mut self, outcome: PathwayOutcome) {
        match outcome {
            PathwayOutcome::Produced(pathway) => self.add_pathway(pathway, 1),
            PathwayOutcome::NotProduced => self.not_produced += 1,
            PathwayOutcome::Unresolvable { .. } => self.unresolvable += 1,
        }
    }

    /// Folds `other` in after everything already collected.
    pub fn merge(mut self, other: PathwayCollection) -> Self {
        for record in other.records {
            self.add_pathway(record.pathway, record.frequency);
        }
        self.not_produced += other.not_produced;
        self.unresolvable += other.unresolvable;
        self
    }

    /// Distinct pathways in first-seen order.
    pub fn records(&self) -> &[PathwayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn frequency_of(&self, reactions: &[usize]) -> usize {
        let key: BTreeSet<usize> = reactions.iter().copied().collect();
        self.keys
            .get(&key)
            .map_or(0, |&pos| self.records[pos].frequency)
    }

    /// Pathways followed more than `min_frequency` times, most frequent first.
    pub fn sorted(&self, min_frequency: usize) -> Vec<PathwayRecord> {
        let mut sorted: Vec<PathwayRecord> = self
            .records
            .iter()
            .filter(|r| r.frequency > min_frequency)
            .cloned()
            .collect();
        sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        sorted
    }
}

impl FromIterator<PathwayOutcome> for PathwayCollection {
    fn from_iter<I: IntoIterator<Item = PathwayOutcome>>(iter: I) -> Self {
        let mut collection = Self::new();
        for outcome in iter {
            collection.add(outcome);
        }
        collection
    }
}

/// How a species was made and used across all trajectories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesConsumption {
    /// Reaction index to the number of target molecules it produced.
    pub producing: BTreeMap<usize, usize>,
    pub consuming: BTreeMap<usize, usize>,
    /// Count of the species at the end of each trajectory.
    pub final_counts: Vec<i64>,
}

/// Analysis over a set of simulation histories of one reaction table.
#[derive(Debug, Clone)]
pub struct SimulationAnalyzer {
    table: ReactionTable,
    initial_state: StateVector,
    histories: Vec<SimulationHistory>,
    config: NetworkConfig,
}

impl SimulationAnalyzer {
    /// Fails when a history fires a reaction missing from `table`.
    pub fn new(
        table: ReactionTable,
        initial_state: StateVector,
        histories: Vec<SimulationHistory>,
    ) -> Result<Self, TrajectoryError> {
        for history in &histories {
            if let Some(&reaction) = history.reactions.iter().find(|&&r| r >= table.len()) {
                return Err(TrajectoryError::UnknownReaction {
                    seed: history.seed.clone(),
                    reaction,
                    available: table.len(),
                });
            }
        }
        Ok(Self {
            table,
            initial_state,
            histories,
            config: NetworkConfig::default(),
        })
    }

    /// Takes the resolution cap and the parallel switch from `config`.
    pub fn with_config(mut self, config: &NetworkConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn number_of_simulations(&self) -> usize {
        self.histories.len()
    }

    pub fn histories(&self) -> &[SimulationHistory] {
        &self.histories
    }

    pub fn table(&self) -> &ReactionTable {
        &self.table
    }

    fn first_producer(&self, history: &SimulationHistory, species: usize) -> Option<usize> {
        history
            .reactions
            .iter()
            .copied()
            .find(|&r| self.table[r].produces(species))
    }

    /// Reconstructs the pathway by which `history` first formed `target`.
    ///
    /// The first reaction producing the target is applied to the initial
    /// state. Each species left negative is then resolved by prepending the
    /// first reaction in the history that produces it, until no species is
    /// negative or the resolution cap is exceeded.
    pub fn trace_pathway(&self, history: &SimulationHistory, target: usize) -> PathwayOutcome {
        let Some(last) = self.first_producer(history, target) else {
            return PathwayOutcome::NotProduced;
        };
        let mut pathway = vec![last];
        let mut state = self.initial_state.clone();
        state.apply(&self.table[last]);

        let cap = self.config.resolution_cap(history.len());
        let mut steps = 0;
        let mut negative = state.negative_species();
        while !negative.is_empty() {
            for &species in &negative {
                let producer = match self.first_producer(history, species) {
                    Some(r) if steps < cap => r,
                    _ => {
                        warn!(
                            "history {}: cannot resolve precursors {:?} of species {target}",
                            history.seed,
                            state.negative_species()
                        );
                        pathway.reverse();
                        return PathwayOutcome::Unresolvable {
                            partial: pathway,
                            missing: state.negative_species(),
                        };
                    }
                };
                state.apply(&self.table[producer]);
                pathway.push(producer);
                steps += 1;
            }
            negative = state.negative_species();
        }
        pathway.reverse();
        PathwayOutcome::Produced(pathway)
    }

    /// Traces every history and deduplicates the resulting pathways.
    pub fn extract_pathways(&self, target: usize) -> PathwayCollection {
        let outcomes: Vec<PathwayOutcome> = if self.config.parallel {
            self.histories
                .par_iter()
                .map(|h| self.trace_pathway(h, target))
                .collect()
        } else {
            self.histories
                .iter()
                .map(|h| self.trace_pathway(h, target))
                .collect()
        };
        for (history, outcome) in self.histories.iter().zip(&outcomes) {
            debug!("history {}: {:?}", history.seed, outcome);
        }
        let collection: PathwayCollection = outcomes.into_iter().collect();
        info!(
            "species {target}: {} distinct pathways, {} not produced, {} unresolvable",
            collection.len(),
            collection.not_produced,
            collection.unresolvable
        );
        collection
    }

    /// Distinct pathways to `target` followed more than `min_frequency`
    /// times, most frequent first.
    pub fn pathways_sorted(&self, target: usize, min_frequency: usize) -> Vec<PathwayRecord> {
        self.extract_pathways(target).sorted(min_frequency)
    }

    /// Tallies the reactions producing and consuming `target`.
    ///
    /// A reaction with the target twice on one side counts twice.
    pub fn species_consumption(&self, target: usize) -> SpeciesConsumption {
        let mut consumption = SpeciesConsumption::default();
        for history in &self.histories {
            let mut count = self.initial_state.get(target);
            for &r in &history.reactions {
                let record = &self.table[r];
                for _ in record.reactants.iter().filter(|&&s| s == target) {
                    count -= 1;
                    *consumption.consuming.entry(r).or_default() += 1;
                }
                for _ in record.products.iter().filter(|&&s| s == target) {
                    count += 1;
                    *consumption.producing.entry(r).or_default() += 1;
                }
            }
            consumption.final_counts.push(count);
        }
        consumption
    }

    /// How often each reaction fired across all histories, most frequent
    /// first, ties by reaction index.
    pub fn reaction_tally(&self) -> Vec<(usize, usize)> {
        let mut tally: BTreeMap<usize, usize> = BTreeMap::new();
        for history in &self.histories {
            for &r in &history.reactions {
                *tally.entry(r).or_default() += 1;
            }
        }
        let mut sorted: Vec<(usize, usize)> = tally.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stochastic::trajectory::ReactionRecord;

    fn chain_table() -> ReactionTable {
        // r0: 0 -> 1, r1: 1 -> 2, r2: 3 -> 1, r3: 2 -> 0
        ReactionTable::new(vec![
            ReactionRecord::new(vec![0], vec![1]),
            ReactionRecord::new(vec![1], vec![2]),
            ReactionRecord::new(vec![3], vec![1]),
            ReactionRecord::new(vec![2], vec![0]),
        ])
    }

    fn analyzer(histories: Vec<Vec<usize>>) -> SimulationAnalyzer {
        let histories = histories
            .into_iter()
            .enumerate()
            .map(|(i, r)| SimulationHistory::new(i.to_string(), r))
            .collect();
        SimulationAnalyzer::new(chain_table(), StateVector::new(vec![1, 0, 0, 1]), histories).unwrap()
    }

    #[test]
    fn two_step_pathway() {
        let a = analyzer(vec![vec![0, 1]]);
        let collection = a.extract_pathways(2);
        assert_eq!(
            collection.records(),
            &[PathwayRecord {
                pathway: vec![0, 1],
                frequency: 1
            }]
        );
    }

    #[test]
    fn target_never_produced() {
        let a = analyzer(vec![vec![0], vec![2]]);
        let collection = a.extract_pathways(2);
        assert!(collection.is_empty());
        assert_eq!(collection.not_produced, 2);
    }

    #[test]
    fn duplicates_are_merged_by_reaction_set() {
        let a = analyzer(vec![vec![0, 1], vec![2, 0, 1], vec![2, 1]]);
        let collection = a.extract_pathways(2);
        // the second history resolves species 1 through r2, the first producer
        assert_eq!(collection.frequency_of(&[2, 1]), 2);
        assert_eq!(collection.frequency_of(&[0, 1]), 1);
        assert_eq!(collection.records()[0].pathway, vec![0, 1]);

        let sorted = a.pathways_sorted(2, 0);
        assert_eq!(sorted[0].frequency, 2);
        assert_eq!(a.pathways_sorted(2, 1).len(), 1);
    }

    #[test]
    fn unproducible_precursor_is_unresolvable() {
        let table = ReactionTable::new(vec![ReactionRecord::new(vec![5], vec![2])]);
        let histories = vec![SimulationHistory::new("s", vec![0])];
        let a = SimulationAnalyzer::new(table, StateVector::zeros(6), histories).unwrap();
        assert_eq!(
            a.trace_pathway(&a.histories()[0], 2),
            PathwayOutcome::Unresolvable {
                partial: vec![0],
                missing: vec![5]
            }
        );
        assert_eq!(a.extract_pathways(2).unresolvable, 1);
    }

    #[test]
    fn resolution_is_capped() {
        // each species is made from two of the other, so the deficit only grows
        let table = ReactionTable::new(vec![
            ReactionRecord::new(vec![0, 0], vec![1]),
            ReactionRecord::new(vec![1, 1], vec![0]),
        ]);
        let histories = vec![SimulationHistory::new("loop", vec![1, 0])];
        let a = SimulationAnalyzer::new(table, StateVector::zeros(2), histories)
            .unwrap()
            .with_config(&NetworkConfig {
                max_resolution_steps: Some(8),
                parallel: false,
                ..NetworkConfig::default()
            });
        assert!(matches!(
            a.trace_pathway(&a.histories()[0], 0),
            PathwayOutcome::Unresolvable { .. }
        ));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let histories = vec![vec![0, 1], vec![2, 1], vec![0, 1], vec![2, 0, 1], vec![3]];
        let parallel = analyzer(histories.clone()).extract_pathways(2);
        let sequential = analyzer(histories)
            .with_config(&NetworkConfig {
                parallel: false,
                ..NetworkConfig::default()
            })
            .extract_pathways(2);
        assert_eq!(parallel.records(), sequential.records());
        assert_eq!(parallel.not_produced, sequential.not_produced);
    }

    #[test]
    fn merge_sums_frequencies() {
        let left: PathwayCollection = [
            PathwayOutcome::Produced(vec![0, 1]),
            PathwayOutcome::NotProduced,
        ]
        .into_iter()
        .collect();
        let right: PathwayCollection = [
            PathwayOutcome::Produced(vec![1, 0]),
            PathwayOutcome::Produced(vec![3]),
        ]
        .into_iter()
        .collect();
        let merged = left.merge(right);
        assert_eq!(merged.frequency_of(&[0, 1]), 2);
        assert_eq!(merged.records()[0].pathway, vec![0, 1]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.not_produced, 1);
    }

    #[test]
    fn consumption_and_tally() {
        let a = analyzer(vec![vec![0, 1, 3], vec![2, 1]]);
        let info = a.species_consumption(1);
        assert_eq!(info.producing, BTreeMap::from([(0, 1), (2, 1)]));
        assert_eq!(info.consuming, BTreeMap::from([(1, 2)]));
        assert_eq!(info.final_counts, vec![0, 0]);

        assert_eq!(a.reaction_tally(), vec![(1, 2), (0, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn unknown_reaction_is_rejected() {
        let histories = vec![SimulationHistory::new("bad", vec![0, 9])];
        assert!(matches!(
            SimulationAnalyzer::new(chain_table(), StateVector::zeros(4), histories),
            Err(TrajectoryError::UnknownReaction { reaction: 9, .. })
        ));
    }
}
