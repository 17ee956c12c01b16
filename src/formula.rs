//! Elemental composition and alphabetical formulas.
//!
//! Formulas list element symbols alphabetically, each followed by its count
//! and separated by single spaces (`"C1 H4 O1"`, `"Li1"`). Formula strings
//! are used as bucket keys, so the format is fixed.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::ops::Add;

use crate::element::Element;

/// Multiset of elements, ordered alphabetically by symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Composition {
    counts: BTreeMap<&'static str, u32>,
}

impl Composition {
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut counts = BTreeMap::new();
        for element in elements {
            *counts.entry(element.symbol()).or_default() += 1;
        }
        Self { counts }
    }

    pub fn count(&self, element: Element) -> u32 {
        self.counts.get(element.symbol()).copied().unwrap_or(0)
    }

    pub fn contains(&self, element: Element) -> bool {
        self.count(element) > 0
    }

    pub fn total_atoms(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn alphabetical_formula(&self) -> String {
        let mut formula = String::new();
        for (symbol, count) in &self.counts {
            if !formula.is_empty() {
                formula.push(' ');
            }
            let _ = write!(formula, "{symbol}{count}");
        }
        formula
    }
}

impl Add for &Composition {
    type Output = Composition;

    fn add(self, rhs: &Composition) -> Composition {
        let mut counts = self.counts.clone();
        for (symbol, count) in &rhs.counts {
            *counts.entry(*symbol).or_default() += *count;
        }
        Composition { counts }
    }
}

/// Parses an alphabetical formula back into a composition.
///
/// Returns `None` for unknown symbols or malformed tokens.
pub fn parse_formula(formula: &str) -> Option<Composition> {
    let mut counts = BTreeMap::new();
    for token in formula.split_whitespace() {
        let split = token.find(|c: char| c.is_ascii_digit())?;
        let (symbol, count) = token.split_at(split);
        let element = Element::from_symbol(symbol)?;
        let count: u32 = count.parse().ok()?;
        *counts.entry(element.symbol()).or_default() += count;
    }
    Some(Composition { counts })
}
