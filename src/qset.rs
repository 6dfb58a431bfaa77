use itertools::Itertools;
use std::collections::BTreeSet;

use crate::network::AnalyzerError;

/// A threshold structure over validator ids and nested quorum sets. This is
/// the declared form: element order is irrelevant, so both element kinds are
/// kept in ordered sets and two quorum sets compare equal exactly when their
/// thresholds and element sets do. The structure must be explicitly spelled
/// out (an inner entry cannot point at "some other validator's quorum set"),
/// so the tree is finite by construction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuorumSet {
    threshold: u32,
    validators: BTreeSet<String>,
    inner: BTreeSet<QuorumSet>,
}

enum Elem<'a> {
    Validator(&'a str),
    Inner(&'a QuorumSet),
}

impl QuorumSet {
    pub fn new(
        threshold: u32,
        validators: BTreeSet<String>,
        inner: BTreeSet<QuorumSet>,
    ) -> Result<Self, AnalyzerError> {
        let elems = validators.len() + inner.len();
        if elems == 0 {
            return Err(AnalyzerError::MalformedQuorumSet(
                "empty quorum set".to_string(),
            ));
        }
        if threshold < 1 {
            return Err(AnalyzerError::MalformedQuorumSet(format!(
                "threshold {} less than 1",
                threshold
            )));
        }
        if threshold as usize > elems {
            return Err(AnalyzerError::MalformedQuorumSet(format!(
                "threshold {} greater than number of elements in the quorum set ({})",
                threshold, elems
            )));
        }
        Ok(QuorumSet {
            threshold,
            validators,
            inner,
        })
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn validators(&self) -> &BTreeSet<String> {
        &self.validators
    }

    pub fn inner(&self) -> &BTreeSet<QuorumSet> {
        &self.inner
    }

    fn elems(&self) -> Vec<Elem<'_>> {
        self.validators
            .iter()
            .map(|v| Elem::Validator(v))
            .chain(self.inner.iter().map(Elem::Inner))
            .collect()
    }

    /// Union of leaf validator ids over the whole tree.
    pub fn members(&self) -> BTreeSet<String> {
        let mut members: BTreeSet<String> = self.validators.iter().cloned().collect();
        for q in &self.inner {
            members.append(&mut q.members());
        }
        members
    }

    /// All slices: pick `threshold` elements, recursively pick one slice of
    /// each picked inner set, and take the union of the picked validators.
    pub fn slices(&self) -> BTreeSet<BTreeSet<String>> {
        let families: Vec<Vec<BTreeSet<String>>> = self
            .elems()
            .into_iter()
            .map(|e| match e {
                Elem::Validator(v) => vec![BTreeSet::from([v.to_string()])],
                Elem::Inner(q) => q.slices().into_iter().collect(),
            })
            .collect();
        families
            .iter()
            .combinations(self.threshold as usize)
            .flat_map(one_of_each)
            .collect()
    }

    /// All blocking sets: any `|E| - threshold + 1` elements, recursively
    /// expanded via one blocking set of each picked inner element, unioned
    /// with the picked validators. Removing any member of the family makes
    /// the threshold unreachable.
    pub fn blocking(&self) -> BTreeSet<BTreeSet<String>> {
        let families: Vec<Vec<BTreeSet<String>>> = self
            .elems()
            .into_iter()
            .map(|e| match e {
                Elem::Validator(v) => vec![BTreeSet::from([v.to_string()])],
                Elem::Inner(q) => q.blocking().into_iter().collect(),
            })
            .collect();
        let need = families.len() - self.threshold as usize + 1;
        families
            .iter()
            .combinations(need)
            .flat_map(one_of_each)
            .collect()
    }

    /// The inclusion-minimal elements of `blocking`.
    pub fn minimal_blocking(&self) -> BTreeSet<BTreeSet<String>> {
        let family = self.blocking();
        family
            .iter()
            .filter(|b| {
                !family
                    .iter()
                    .any(|other| *other != **b && other.is_subset(b))
            })
            .cloned()
            .collect()
    }
}

/// One choice from each family, unioned. The unit for zero families is the
/// singleton containing the empty set.
fn one_of_each(families: Vec<&Vec<BTreeSet<String>>>) -> Vec<BTreeSet<String>> {
    if families.is_empty() {
        return vec![BTreeSet::new()];
    }
    families
        .into_iter()
        .map(|family| family.iter())
        .multi_cartesian_product()
        .map(|choice| choice.into_iter().flatten().cloned().collect())
        .collect()
}
