mod limits;
mod overlay;
mod parse;
mod tvl;

use std::collections::BTreeSet;

use crate::network::AnalyzerError;
use crate::qset::QuorumSet;

/// Shorthand for building quorum sets in tests.
pub(crate) fn qset(
    threshold: u32,
    validators: &[&str],
    inner: Vec<QuorumSet>,
) -> QuorumSet {
    QuorumSet::new(
        threshold,
        validators.iter().map(|v| v.to_string()).collect(),
        inner.into_iter().collect(),
    )
    .unwrap()
}

pub(crate) fn try_qset(
    threshold: u32,
    validators: &[&str],
    inner: Vec<QuorumSet>,
) -> Result<QuorumSet, AnalyzerError> {
    QuorumSet::new(
        threshold,
        validators.iter().map(|v| v.to_string()).collect(),
        inner.into_iter().collect(),
    )
}

pub(crate) fn set_of(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn family_of(sets: &[&[&str]]) -> BTreeSet<BTreeSet<String>> {
    sets.iter().map(|s| set_of(s)).collect()
}
