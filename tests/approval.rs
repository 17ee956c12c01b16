use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use rxnet::stochastic::{load_histories, load_initial_state};
use rxnet::{
    ConcertedCandidate, MoleculeEntry, NetworkConfig, NodeKey, ReactionEnumerator, ReactionKind,
    ReactionRecord, ReactionTable, SimulationAnalyzer,
};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn report(section: &str, failures: Vec<String>) {
    if !failures.is_empty() {
        panic!(
            "{} {section} failures:\n{}",
            failures.len(),
            failures.join("\n")
        );
    }
}

// ---------------------------------------------------------------------------
// 1. Reaction enumeration and graph embedding
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(default)]
struct Counts {
    redox: usize,
    intramolecular: usize,
    intermolecular: usize,
    coordination: usize,
    concerted: usize,
}

impl Counts {
    fn get(&self, kind: ReactionKind) -> usize {
        match kind {
            ReactionKind::Redox => self.redox,
            ReactionKind::Intramolecular => self.intramolecular,
            ReactionKind::Intermolecular => self.intermolecular,
            ReactionKind::Coordination => self.coordination,
            ReactionKind::Concerted => self.concerted,
        }
    }
}

#[derive(Deserialize)]
struct NetworkCase {
    name: String,
    electron_free_energy: Option<f64>,
    documents: Vec<serde_json::Value>,
    candidates: Vec<(String, String)>,
    counts: Counts,
    reaction_nodes: Vec<String>,
    entry_ids: Vec<String>,
    species: usize,
}

#[test]
fn approval_networks() {
    let data: Vec<NetworkCase> =
        serde_json::from_str(include_str!("approval_data/networks.json")).unwrap();

    let mut failures = Vec::new();
    for case in &data {
        let entries: Vec<Arc<MoleculeEntry>> = rxnet::index_entries(
            MoleculeEntry::from_documents(&case.documents)
                .into_iter()
                .map(|r| r.unwrap()),
        );
        let candidates: Vec<ConcertedCandidate> = case
            .candidates
            .iter()
            .map(|(r, p)| ConcertedCandidate::parse(r, p).unwrap())
            .collect();
        let config = NetworkConfig {
            electron_free_energy: case.electron_free_energy,
            ..NetworkConfig::default()
        };
        let out = ReactionEnumerator::new(config)
            .unwrap()
            .enumerate(&entries, &candidates)
            .unwrap();

        for kind in ReactionKind::ALL {
            let got = out.count(kind);
            let expected = case.counts.get(kind);
            if got != expected {
                failures.push(format!(
                    "[count] {} / {}: expected {expected}, got {got}",
                    case.name,
                    kind.name()
                ));
            }
        }

        let graph = match out.graph() {
            Ok(g) => g,
            Err(e) => {
                failures.push(format!("[graph] {}: {e}", case.name));
                continue;
            }
        };
        if graph.species_count() != case.species {
            failures.push(format!(
                "[species] {}: expected {}, got {}",
                case.name,
                case.species,
                graph.species_count()
            ));
        }
        let mut got_nodes: Vec<&str> = graph.reaction_nodes().map(|n| n.name.as_str()).collect();
        got_nodes.sort();
        let mut expected_nodes: Vec<&str> = case.reaction_nodes.iter().map(String::as_str).collect();
        expected_nodes.sort();
        if got_nodes != expected_nodes {
            failures.push(format!(
                "[nodes] {}: expected {:?}, got {:?}",
                case.name, expected_nodes, got_nodes
            ));
        }
        for ids in &case.entry_ids {
            if !graph.reaction_nodes().any(|n| &n.entry_ids == ids) {
                failures.push(format!("[entry_ids] {}: no node with ids {ids:?}", case.name));
            }
        }
        for node in graph.reaction_nodes() {
            let key = NodeKey::Reaction(node.name.clone());
            if graph.successors(&key).is_empty() {
                failures.push(format!("[edges] {}: {} has no products", case.name, node.name));
            }
        }
    }

    report("network", failures);
}

#[test]
fn approval_bad_documents_fail_alone() {
    let data: Vec<NetworkCase> =
        serde_json::from_str(include_str!("approval_data/networks.json")).unwrap();
    let mut documents = data[0].documents.clone();
    documents[1]
        .as_object_mut()
        .unwrap()
        .remove("energy_Ha");

    let results = MoleculeEntry::from_documents(&documents);
    assert_eq!(results.len(), documents.len());
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert!(err.to_string().contains("energy_Ha"));
    assert!(results[2..].iter().all(Result::is_ok));
}

// ---------------------------------------------------------------------------
// 2. Pathway reconstruction from trajectory files
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RecordEntry {
    reactants: Vec<usize>,
    products: Vec<usize>,
}

#[derive(Deserialize)]
struct PathwayEntry {
    pathway: Vec<usize>,
    frequency: usize,
}

#[derive(Deserialize)]
struct TargetEntry {
    species: usize,
    pathways: Vec<PathwayEntry>,
    not_produced: usize,
    unresolvable: usize,
    final_counts: Vec<i64>,
}

#[derive(Deserialize)]
struct PathwayCase {
    reactions: Vec<RecordEntry>,
    initial_state: Vec<i64>,
    histories: BTreeMap<String, Vec<usize>>,
    targets: Vec<TargetEntry>,
    tally: Vec<(usize, usize)>,
}

fn write_lines<T: ToString>(path: &std::path::Path, values: impl IntoIterator<Item = T>) {
    let text: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
    std::fs::write(path, text.join("\n") + "\n").unwrap();
}

#[test]
fn approval_pathways() {
    let case: PathwayCase =
        serde_json::from_str(include_str!("approval_data/pathways.json")).unwrap();

    let dir = tempfile::tempdir().unwrap();
    write_lines(&dir.path().join("initial_state"), &case.initial_state);
    for (seed, reactions) in &case.histories {
        write_lines(&dir.path().join(format!("reactions_{seed}")), reactions);
        write_lines(
            &dir.path().join(format!("times_{seed}")),
            (0..reactions.len()).map(|i| i as f64 * 0.5),
        );
    }

    let table = ReactionTable::new(
        case.reactions
            .iter()
            .map(|r| ReactionRecord::new(r.reactants.clone(), r.products.clone()))
            .collect(),
    );
    let initial = load_initial_state(dir.path().join("initial_state")).unwrap();
    let histories = load_histories(dir.path()).unwrap();
    assert_eq!(histories.len(), case.histories.len());

    let mut failures = Vec::new();
    for parallel in [true, false] {
        let config = NetworkConfig {
            parallel,
            ..NetworkConfig::default()
        };
        let analyzer = SimulationAnalyzer::new(table.clone(), initial.clone(), histories.clone())
            .unwrap()
            .with_config(&config);

        for target in &case.targets {
            let pathways = analyzer.extract_pathways(target.species);
            let got: Vec<(Vec<usize>, usize)> = pathways
                .records()
                .iter()
                .map(|r| (r.pathway.clone(), r.frequency))
                .collect();
            let expected: Vec<(Vec<usize>, usize)> = target
                .pathways
                .iter()
                .map(|p| (p.pathway.clone(), p.frequency))
                .collect();
            if got != expected {
                failures.push(format!(
                    "[pathways] species {} (parallel={parallel}): expected {:?}, got {:?}",
                    target.species, expected, got
                ));
            }
            if pathways.not_produced != target.not_produced
                || pathways.unresolvable != target.unresolvable
            {
                failures.push(format!(
                    "[outcomes] species {} (parallel={parallel}): expected {}/{}, got {}/{}",
                    target.species,
                    target.not_produced,
                    target.unresolvable,
                    pathways.not_produced,
                    pathways.unresolvable
                ));
            }

            let consumption = analyzer.species_consumption(target.species);
            if consumption.final_counts != target.final_counts {
                failures.push(format!(
                    "[final_counts] species {}: expected {:?}, got {:?}",
                    target.species, target.final_counts, consumption.final_counts
                ));
            }
        }

        if analyzer.reaction_tally() != case.tally {
            failures.push(format!(
                "[tally] expected {:?}, got {:?}",
                case.tally,
                analyzer.reaction_tally()
            ));
        }
    }

    report("pathway", failures);
}
