//! Grouping of entries by formula, bond count and charge.
//!
//! Enumeration looks candidates up by exact key, so every archetype walks
//! the same [`EntryIndex`]. Maps are ordered by key; traversal order is
//! therefore sorted key order, while entries inside a leaf keep the order
//! they were given in.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entry::MoleculeEntry;

/// Attribute an entry can be bucketed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKey {
    Formula,
    NumBonds,
    Charge,
}

impl BucketKey {
    /// The default nesting: formula, then bond count, then charge.
    pub const DEFAULT: [BucketKey; 3] = [BucketKey::Formula, BucketKey::NumBonds, BucketKey::Charge];

    fn value_of(self, entry: &MoleculeEntry) -> BucketValue {
        match self {
            BucketKey::Formula => BucketValue::Text(entry.formula().to_string()),
            BucketKey::NumBonds => BucketValue::Int(entry.num_bonds() as i64),
            BucketKey::Charge => BucketValue::Int(i64::from(entry.charge())),
        }
    }
}

/// Key value at one nesting level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketValue {
    Int(i64),
    Text(String),
}

/// Nested mapping produced by [`bucket`].
#[derive(Debug, Clone)]
pub enum Bucket {
    Leaf(Vec<Arc<MoleculeEntry>>),
    Nested(BTreeMap<BucketValue, Bucket>),
}

impl Bucket {
    /// Follows `path` down the nesting; `None` when a key is absent.
    pub fn get(&self, path: &[BucketValue]) -> Option<&Bucket> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => match self {
                Bucket::Nested(map) => map.get(head)?.get(rest),
                Bucket::Leaf(_) => None,
            },
        }
    }

    pub fn leaf(&self) -> Option<&[Arc<MoleculeEntry>]> {
        match self {
            Bucket::Leaf(entries) => Some(entries),
            Bucket::Nested(_) => None,
        }
    }
}

/// Buckets `entries` on each key in turn.
///
/// With no keys the result is a single leaf holding every entry.
pub fn bucket(entries: &[Arc<MoleculeEntry>], keys: &[BucketKey]) -> Bucket {
    match keys.split_first() {
        None => Bucket::Leaf(entries.to_vec()),
        Some((&key, rest)) => {
            let mut groups: BTreeMap<BucketValue, Vec<Arc<MoleculeEntry>>> = BTreeMap::new();
            for entry in entries {
                groups
                    .entry(key.value_of(entry))
                    .or_default()
                    .push(Arc::clone(entry));
            }
            Bucket::Nested(
                groups
                    .into_iter()
                    .map(|(value, group)| (value, bucket(&group, rest)))
                    .collect(),
            )
        }
    }
}

/// Flattens a bucket back into a list.
///
/// Entries inside a leaf keep their relative order, but leaves are visited
/// in sorted key order, so the result is generally a permutation of the
/// list that was bucketed rather than that list itself.
pub fn unbucket(bucket: &Bucket) -> Vec<Arc<MoleculeEntry>> {
    let mut out = Vec::new();
    collect(bucket, &mut out);
    out
}

fn collect(bucket: &Bucket, out: &mut Vec<Arc<MoleculeEntry>>) {
    match bucket {
        Bucket::Leaf(entries) => out.extend(entries.iter().cloned()),
        Bucket::Nested(map) => {
            for child in map.values() {
                collect(child, out);
            }
        }
    }
}

type ChargeMap = BTreeMap<i32, Vec<Arc<MoleculeEntry>>>;

/// Typed form of the default `formula -> bond count -> charge` bucket.
#[derive(Debug, Clone, Default)]
pub struct EntryIndex {
    by_formula: BTreeMap<String, BTreeMap<usize, ChargeMap>>,
    len: usize,
}

impl EntryIndex {
    pub fn new(entries: &[Arc<MoleculeEntry>]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index
                .by_formula
                .entry(entry.formula().to_string())
                .or_default()
                .entry(entry.num_bonds())
                .or_default()
                .entry(entry.charge())
                .or_default()
                .push(Arc::clone(entry));
            index.len += 1;
        }
        index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn formulas(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_formula.keys().map(String::as_str)
    }

    /// Bond counts present for `formula`, ascending.
    pub fn bond_counts<'a>(&'a self, formula: &str) -> impl Iterator<Item = usize> + 'a {
        self.by_formula
            .get(formula)
            .into_iter()
            .flat_map(|m| m.keys().copied())
    }

    /// Charges present for `formula` and `num_bonds`, ascending.
    pub fn charges<'a>(&'a self, formula: &str, num_bonds: usize) -> impl Iterator<Item = i32> + 'a {
        self.charge_map(formula, num_bonds)
            .into_iter()
            .flat_map(|m| m.keys().copied())
    }

    pub fn has_bucket(&self, formula: &str, num_bonds: usize) -> bool {
        self.charge_map(formula, num_bonds).is_some()
    }

    /// Entries with the exact key, in input order. Empty when absent.
    pub fn get(&self, formula: &str, num_bonds: usize, charge: i32) -> &[Arc<MoleculeEntry>] {
        self.charge_map(formula, num_bonds)
            .and_then(|m| m.get(&charge))
            .map_or(&[][..], Vec::as_slice)
    }

    fn charge_map(&self, formula: &str, num_bonds: usize) -> Option<&ChargeMap> {
        self.by_formula.get(formula)?.get(&num_bonds)
    }

    /// Every entry, in key traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MoleculeEntry>> + '_ {
        self.by_formula
            .values()
            .flat_map(|m| m.values())
            .flat_map(|m| m.values())
            .flatten()
    }
}
