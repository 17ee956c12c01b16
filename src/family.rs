//! Grouping of reactions by the local bonding environment of the changed bonds.

use std::collections::BTreeMap;

use log::debug;
use petgraph::algo::is_isomorphic_matching;

use crate::element::Element;
use crate::mol::MolGraph;

/// `charge -> template index -> reaction indices`.
pub type Families = BTreeMap<i32, BTreeMap<usize, Vec<usize>>>;

#[derive(Debug, Clone)]
struct Template {
    graph: MolGraph,
    species: Vec<Element>,
}

impl Template {
    fn new(graph: MolGraph) -> Self {
        let species = sorted_species(&graph);
        Self { graph, species }
    }

    fn matches(&self, environment: &MolGraph, species: &[Element]) -> bool {
        self.graph.bond_count() == environment.bond_count()
            && self.species == species
            && is_isomorphic_matching(
                self.graph.graph(),
                environment.graph(),
                |a, b| a.element == b.element,
                |_, _| true,
            )
    }
}

fn sorted_species(graph: &MolGraph) -> Vec<Element> {
    let mut species = graph.species();
    species.sort();
    species
}

/// Assigns reactions to families, creating templates as new environments appear.
///
/// Templates are only ever appended, so a template index stays valid for
/// the lifetime of the classifier.
#[derive(Debug, Clone, Default)]
pub struct FamilyClassifier {
    templates: Vec<Template>,
    families: Families,
}

impl FamilyClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `reaction` under the first template isomorphic to `environment`,
    /// or under a new template. Returns the template index.
    pub fn categorize(&mut self, reaction: usize, environment: MolGraph, charge: i32) -> usize {
        let species = sorted_species(&environment);
        let label = match self
            .templates
            .iter()
            .position(|t| t.matches(&environment, &species))
        {
            Some(label) => label,
            None => {
                debug!(
                    "new family template {} ({}, {} bonds)",
                    self.templates.len(),
                    environment.formula(),
                    environment.bond_count()
                );
                self.templates.push(Template::new(environment));
                self.templates.len() - 1
            }
        };
        self.families
            .entry(charge)
            .or_default()
            .entry(label)
            .or_default()
            .push(reaction);
        label
    }

    pub fn families(&self) -> &Families {
        &self.families
    }

    pub fn template(&self, label: usize) -> Option<&MolGraph> {
        self.templates.get(label).map(|t| &t.graph)
    }

    pub fn templates(&self) -> impl Iterator<Item = &MolGraph> + '_ {
        self.templates.iter().map(|t| &t.graph)
    }

    pub fn num_templates(&self) -> usize {
        self.templates.len()
    }

    /// Shifts every stored reaction index by `offset`.
    pub(crate) fn offset_reactions(&mut self, offset: usize) {
        for labels in self.families.values_mut() {
            for reactions in labels.values_mut() {
                for r in reactions.iter_mut() {
                    *r += offset;
                }
            }
        }
    }

    pub fn into_parts(self) -> (Vec<MolGraph>, Families) {
        (
            self.templates.into_iter().map(|t| t.graph).collect(),
            self.families,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element::{C, H, O};
    use crate::graph_ops::environment_graph;

    fn methanol() -> MolGraph {
        MolGraph::from_parts([C, O, H, H, H, H], &[(0, 1), (0, 2), (0, 3), (0, 4), (1, 5)]).unwrap()
    }

    #[test]
    fn equivalent_bonds_share_a_template() {
        let mol = methanol();
        let mut classifier = FamilyClassifier::new();
        let first = classifier.categorize(0, environment_graph(&mol, &[(0, 2)], 1), 0);
        let second = classifier.categorize(1, environment_graph(&mol, &[(0, 3)], 1), 0);
        assert_eq!(first, second);
        assert_eq!(classifier.num_templates(), 1);
        assert_eq!(classifier.families()[&0][&0], vec![0, 1]);
    }

    #[test]
    fn different_environment_starts_new_template() {
        let mol = methanol();
        let mut classifier = FamilyClassifier::new();
        classifier.categorize(0, environment_graph(&mol, &[(0, 2)], 1), 0);
        let oh = classifier.categorize(1, environment_graph(&mol, &[(1, 5)], 1), 0);
        assert_eq!(oh, 1);
        assert_eq!(classifier.num_templates(), 2);
        assert_eq!(classifier.template(1).unwrap().formula(), "C1 H1 O1");
    }

    #[test]
    fn families_are_split_by_charge() {
        let mol = methanol();
        let mut classifier = FamilyClassifier::new();
        classifier.categorize(0, environment_graph(&mol, &[(0, 2)], 1), 0);
        classifier.categorize(1, environment_graph(&mol, &[(0, 3)], 1), -1);
        assert_eq!(classifier.num_templates(), 1);
        assert_eq!(classifier.families()[&-1][&0], vec![1]);
    }

    #[test]
    fn offset_shifts_reaction_indices() {
        let mut classifier = FamilyClassifier::new();
        classifier.categorize(2, environment_graph(&methanol(), &[(0, 1)], 0), 0);
        classifier.offset_reactions(10);
        let (templates, families) = classifier.into_parts();
        assert_eq!(templates.len(), 1);
        assert_eq!(families[&0][&0], vec![12]);
    }
}
