//! Reaction tables, species counts and recorded simulation histories.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use thiserror::Error;

use crate::reaction::Reaction;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}:{line}: cannot parse `{content}`")]
    Parse {
        file: PathBuf,
        line: usize,
        content: String,
    },
    #[error("reaction and time histories come from different seeds: {reactions:?} vs {times:?}")]
    SeedMismatch {
        reactions: Vec<String>,
        times: Vec<String>,
    },
    #[error("seed {seed}: {reactions} reactions but {times} times")]
    LengthMismatch {
        seed: String,
        reactions: usize,
        times: usize,
    },
    #[error("history {seed} refers to reaction {reaction}, but the table has {available}")]
    UnknownReaction {
        seed: String,
        reaction: usize,
        available: usize,
    },
}

/// One directed reaction in simulation (internal) species indices.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionRecord {
    pub reactants: Vec<usize>,
    pub products: Vec<usize>,
    pub free_energy: Option<f64>,
}

impl ReactionRecord {
    pub fn new(reactants: Vec<usize>, products: Vec<usize>) -> Self {
        Self {
            reactants,
            products,
            free_energy: None,
        }
    }

    pub fn produces(&self, species: usize) -> bool {
        self.products.contains(&species)
    }
}

/// Reactions as seen by a stochastic simulation.
///
/// Species are renumbered densely; the maps translate between these
/// internal indices and entry indices.
#[derive(Debug, Clone, Default)]
pub struct ReactionTable {
    records: Vec<ReactionRecord>,
    internal_to_mrnet: Vec<usize>,
    mrnet_to_internal: HashMap<usize, usize>,
}

impl ReactionTable {
    /// Table whose species indices are already internal ones.
    pub fn new(records: Vec<ReactionRecord>) -> Self {
        let species = records
            .iter()
            .flat_map(|r| r.reactants.iter().chain(&r.products))
            .map(|&s| s + 1)
            .max()
            .unwrap_or(0);
        Self {
            records,
            internal_to_mrnet: (0..species).collect(),
            mrnet_to_internal: (0..species).map(|s| (s, s)).collect(),
        }
    }

    /// Two records per reaction: `2i` runs it forward, `2i + 1` in reverse.
    ///
    /// Internal species indices follow ascending entry index.
    pub fn from_reactions(reactions: &[Reaction], temperature: f64) -> Self {
        let mut species: Vec<usize> = reactions
            .iter()
            .flat_map(|r| r.reactant_indices().into_iter().chain(r.product_indices()))
            .collect();
        species.sort_unstable();
        species.dedup();
        let mrnet_to_internal: HashMap<usize, usize> =
            species.iter().enumerate().map(|(i, &m)| (m, i)).collect();
        let internal = |side: Vec<usize>| -> Vec<usize> {
            side.iter().map(|m| mrnet_to_internal[m]).collect()
        };

        let mut records = Vec::with_capacity(2 * reactions.len());
        for reaction in reactions {
            let free_energy = reaction.free_energy(temperature);
            let reactants = internal(reaction.reactant_indices());
            let products = internal(reaction.product_indices());
            records.push(ReactionRecord {
                reactants: reactants.clone(),
                products: products.clone(),
                free_energy: free_energy.map(|g| g.a),
            });
            records.push(ReactionRecord {
                reactants: products,
                products: reactants,
                free_energy: free_energy.map(|g| g.b),
            });
        }
        info!(
            "reaction table: {} records over {} species",
            records.len(),
            species.len()
        );
        Self {
            records,
            internal_to_mrnet: species,
            mrnet_to_internal,
        }
    }

    pub fn get(&self, index: usize) -> Option<&ReactionRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn number_of_species(&self) -> usize {
        self.internal_to_mrnet.len()
    }

    pub fn internal_to_mrnet(&self, internal: usize) -> Option<usize> {
        self.internal_to_mrnet.get(internal).copied()
    }

    pub fn mrnet_to_internal(&self, mrnet: usize) -> Option<usize> {
        self.mrnet_to_internal.get(&mrnet).copied()
    }
}

impl std::ops::Index<usize> for ReactionTable {
    type Output = ReactionRecord;

    fn index(&self, index: usize) -> &ReactionRecord {
        &self.records[index]
    }
}

/// Molecule count per internal species index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateVector {
    counts: Vec<i64>,
}

impl StateVector {
    pub fn new(counts: Vec<i64>) -> Self {
        Self { counts }
    }

    pub fn zeros(species: usize) -> Self {
        Self::new(vec![0; species])
    }

    pub fn get(&self, species: usize) -> i64 {
        self.counts.get(species).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[i64] {
        &self.counts
    }

    /// Removes one of each reactant and adds one of each product.
    pub fn apply(&mut self, record: &ReactionRecord) {
        for &s in &record.reactants {
            *self.slot(s) -= 1;
        }
        for &s in &record.products {
            *self.slot(s) += 1;
        }
    }

    fn slot(&mut self, species: usize) -> &mut i64 {
        if species >= self.counts.len() {
            self.counts.resize(species + 1, 0);
        }
        &mut self.counts[species]
    }

    /// Species with a negative count, ascending.
    pub fn negative_species(&self) -> Vec<usize> {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c < 0)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Reactions fired by one simulation run, with the time of each.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationHistory {
    pub seed: String,
    pub reactions: Vec<usize>,
    pub times: Vec<f64>,
}

impl SimulationHistory {
    pub fn new(seed: impl Into<String>, reactions: Vec<usize>) -> Self {
        Self {
            seed: seed.into(),
            reactions,
            times: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }
}

fn parse_lines<T: FromStr>(path: &Path) -> Result<Vec<T>, TrajectoryError> {
    let text = fs::read_to_string(path).map_err(|source| TrajectoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.trim().parse().map_err(|_| TrajectoryError::Parse {
                file: path.to_path_buf(),
                line: i + 1,
                content: line.to_string(),
            })
        })
        .collect()
}

/// Reads one count per line.
pub fn load_initial_state(path: impl AsRef<Path>) -> Result<StateVector, TrajectoryError> {
    parse_lines(path.as_ref()).map(StateVector::new)
}

/// Files in `dir` starting with `prefix`, sorted by name, with their seeds.
fn seeded_files(dir: &Path, prefix: &str) -> Result<Vec<(String, PathBuf)>, TrajectoryError> {
    let io_err = |source| TrajectoryError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(seed) = name.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('_')) {
            files.push((seed.to_string(), path.clone()));
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

/// Loads every `reactions_<seed>` / `times_<seed>` pair in `dir`.
///
/// Both file sets must name the same seeds.
pub fn load_histories(dir: impl AsRef<Path>) -> Result<Vec<SimulationHistory>, TrajectoryError> {
    let dir = dir.as_ref();
    let reaction_files = seeded_files(dir, "reactions")?;
    let time_files = seeded_files(dir, "times")?;

    let reaction_seeds: Vec<String> = reaction_files.iter().map(|(s, _)| s.clone()).collect();
    let time_seeds: Vec<String> = time_files.iter().map(|(s, _)| s.clone()).collect();
    if reaction_seeds != time_seeds {
        return Err(TrajectoryError::SeedMismatch {
            reactions: reaction_seeds,
            times: time_seeds,
        });
    }

    let mut histories = Vec::with_capacity(reaction_files.len());
    for ((seed, reactions_path), (_, times_path)) in reaction_files.into_iter().zip(time_files) {
        let reactions: Vec<usize> = parse_lines(&reactions_path)?;
        let times: Vec<f64> = parse_lines(&times_path)?;
        if reactions.len() != times.len() {
            return Err(TrajectoryError::LengthMismatch {
                seed,
                reactions: reactions.len(),
                times: times.len(),
            });
        }
        histories.push(SimulationHistory {
            seed,
            reactions,
            times,
        });
    }
    info!("loaded {} simulation histories from {}", histories.len(), dir.display());
    Ok(histories)
}
