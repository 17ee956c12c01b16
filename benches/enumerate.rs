use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rxnet::element::Element::{C, H};
use rxnet::stochastic::{ReactionRecord, ReactionTable, SimulationAnalyzer, SimulationHistory, StateVector};
use rxnet::{index_entries, MolGraph, MoleculeEntry, NetworkConfig, ReactionEnumerator};

// linear CnH(2n+2), or the terminal radical CnH(2n+1) when `radical`
fn chain(n: usize, radical: bool) -> MolGraph {
    let mut elements = vec![C; n];
    let mut bonds: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
    for c in 0..n {
        let mut hydrogens = if n == 1 { 4 } else if c == 0 || c == n - 1 { 3 } else { 2 };
        if radical && c == 0 {
            hydrogens -= 1;
        }
        for _ in 0..hydrogens {
            bonds.push((c, elements.len()));
            elements.push(H);
        }
    }
    MolGraph::from_parts(elements, &bonds).unwrap()
}

fn alkanes(max_carbons: usize) -> Vec<Arc<MoleculeEntry>> {
    let mut entries = Vec::new();
    for n in 1..=max_carbons {
        for charge in [0, 1] {
            let e = -40.0 * n as f64 - 0.3 * f64::from(charge);
            entries.push(
                MoleculeEntry::new(format!("c{n}h{}_{charge}", 2 * n + 2), chain(n, false), charge, e)
                    .with_thermo(10.0 * n as f64, 40.0 + 5.0 * n as f64),
            );
            entries.push(
                MoleculeEntry::new(format!("c{n}h{}_{charge}", 2 * n + 1), chain(n, true), charge, e + 0.5)
                    .with_thermo(9.0 * n as f64, 38.0 + 5.0 * n as f64),
            );
        }
    }
    index_entries(entries)
}

fn config() -> NetworkConfig {
    NetworkConfig {
        electron_free_energy: Some(-1.4),
        ..NetworkConfig::default()
    }
}

fn bench_enumerate_alkanes(c: &mut Criterion) {
    let entries = alkanes(6);
    let enumerator = ReactionEnumerator::new(config()).unwrap();

    c.bench_function("enumerate_alkanes_c6", |b| {
        b.iter(|| black_box(enumerator.enumerate(&entries, &[]).unwrap()))
    });
}

fn bench_enumerate_sequential(c: &mut Criterion) {
    let entries = alkanes(6);
    let enumerator = ReactionEnumerator::new(NetworkConfig {
        parallel: false,
        ..config()
    })
    .unwrap();

    c.bench_function("enumerate_alkanes_c6_sequential", |b| {
        b.iter(|| black_box(enumerator.enumerate(&entries, &[]).unwrap()))
    });
}

fn bench_graph_build(c: &mut Criterion) {
    let entries = alkanes(6);
    let out = ReactionEnumerator::new(config())
        .unwrap()
        .enumerate(&entries, &[])
        .unwrap();

    c.bench_function("bipartite_graph_alkanes_c6", |b| {
        b.iter(|| black_box(out.graph().unwrap()))
    });
}

fn bench_pathways(c: &mut Criterion) {
    // a ring of 50 species, each step converting species i into i + 1
    let species = 50;
    let table = ReactionTable::new(
        (0..species)
            .map(|i| ReactionRecord::new(vec![i], vec![(i + 1) % species]))
            .collect(),
    );
    let mut initial = vec![0; species];
    initial[0] = 1;
    let histories: Vec<SimulationHistory> = (0..200)
        .map(|seed| SimulationHistory::new(seed.to_string(), (0..species - 1).collect()))
        .collect();
    let analyzer = SimulationAnalyzer::new(table, StateVector::new(initial), histories).unwrap();

    c.bench_function("pathways_chain_50x200", |b| {
        b.iter(|| black_box(analyzer.extract_pathways(species - 1)))
    });
}

criterion_group!(
    benches,
    bench_enumerate_alkanes,
    bench_enumerate_sequential,
    bench_graph_build,
    bench_pathways
);
criterion_main!(benches);
