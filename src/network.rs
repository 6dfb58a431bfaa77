use log::trace;
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::qset::QuorumSet;

const QUORUM_SET_MAX_DEPTH: u32 = 16;

#[derive(Debug)]
pub enum AnalyzerError {
    /// A quorum set value violating its own construction invariants, not yet
    /// attributed to a validator.
    MalformedQuorumSet(String),
    /// A structurally broken network, attributed to the validator whose
    /// declaration carries the problem.
    Malformed { validator: String, reason: String },
    DuplicateValidator(String),
    UnknownValidator(String),
    Parse(String),
    Io(std::io::Error),
    Fetch(String),
    InternalError(&'static str),
}

impl std::error::Error for AnalyzerError {}

impl std::fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzerError::MalformedQuorumSet(reason) => {
                write!(f, "Malformed quorum set: {}", reason)
            }
            AnalyzerError::Malformed { validator, reason } => {
                write!(f, "Error in validator {}: {}", validator, reason)
            }
            AnalyzerError::DuplicateValidator(pk) => write!(f, "Duplicate validator: {}", pk),
            AnalyzerError::UnknownValidator(pk) => write!(f, "Unknown validator: {}", pk),
            AnalyzerError::Parse(msg) => write!(f, "Parse error: {}", msg),
            AnalyzerError::Io(e) => write!(f, "I/O error: {}", e),
            AnalyzerError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
            AnalyzerError::InternalError(msg) => {
                write!(f, "Internal error (likely a bug): {}", msg)
            }
        }
    }
}

impl From<std::io::Error> for AnalyzerError {
    fn from(e: std::io::Error) -> Self {
        AnalyzerError::Io(e)
    }
}

/// Interned form of a quorum set: elements are vertices of the trust graph.
/// Inner sets are interned depth-first before their parent, so equal subtrees
/// always resolve to the same vertex and this structure can be compared and
/// used as a dedup key directly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(crate) struct QsetVertex {
    pub threshold: u32,
    pub validators: BTreeSet<NodeIndex>,
    pub inner: BTreeSet<NodeIndex>,
}

#[derive(Debug)]
pub(crate) enum Vertex {
    Validator(String),
    QSet(QsetVertex),
}

/// A validated, immutable network of validators. `qsets` holds the declared
/// quorum set of each validator; `graph` holds the same structure with every
/// distinct quorum set interned into exactly one vertex, which is what the
/// formula builders key their caches on.
#[derive(Debug, Default)]
pub struct Network {
    pub(crate) graph: DiGraph<Vertex, ()>,
    pub(crate) validators: BTreeMap<String, NodeIndex>,
    pub(crate) qsets: BTreeMap<String, QuorumSet>,
    pub(crate) organizations: BTreeMap<String, BTreeSet<String>>,
}

impl Network {
    /// Builds a network and runs the sanity checks: unique validator ids,
    /// and every referenced validator known to the network.
    pub fn from_validators(
        validators: Vec<(String, QuorumSet)>,
    ) -> Result<Self, AnalyzerError> {
        Self::build(validators, BTreeMap::new(), true)
    }

    pub fn from_json_str(data: &str) -> Result<Self, AnalyzerError> {
        crate::json_parser::network_from_json_str(data)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, AnalyzerError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub(crate) fn build(
        validators: Vec<(String, QuorumSet)>,
        organizations: BTreeMap<String, BTreeSet<String>>,
        strict: bool,
    ) -> Result<Self, AnalyzerError> {
        let mut net = Network {
            organizations,
            ..Default::default()
        };

        // First pass: one vertex per validator.
        for (pk, _) in &validators {
            if net.validators.contains_key(pk) {
                return Err(AnalyzerError::DuplicateValidator(pk.clone()));
            }
            let idx = net.graph.add_node(Vertex::Validator(pk.clone()));
            net.validators.insert(pk.clone(), idx);
        }

        // Second pass: check each declaration, then intern it.
        let mut known_qsets: BTreeMap<QsetVertex, NodeIndex> = BTreeMap::new();
        for (pk, qset) in validators {
            net.sanity_check_qset(&qset, &pk, 0, strict)?;
            let q_idx = net.intern_qset(&qset, &mut known_qsets);
            let v_idx = net.validators[&pk];
            net.graph.add_edge(v_idx, q_idx, ());
            net.qsets.insert(pk, qset);
        }

        trace!(
            target: "FBA",
            "network built: {} validators, {} distinct quorum sets, {} graph edges",
            net.validators.len(),
            net.distinct_qset_count(),
            net.graph.edge_count()
        );
        Ok(net)
    }

    fn sanity_check_qset(
        &self,
        qset: &QuorumSet,
        pk: &str,
        depth: u32,
        strict: bool,
    ) -> Result<(), AnalyzerError> {
        if depth == QUORUM_SET_MAX_DEPTH {
            return Err(AnalyzerError::Malformed {
                validator: pk.to_string(),
                reason: format!("quorum set nesting deeper than {}", QUORUM_SET_MAX_DEPTH),
            });
        }
        if strict {
            for v in qset.validators() {
                if !self.validators.contains_key(v) {
                    return Err(AnalyzerError::Malformed {
                        validator: pk.to_string(),
                        reason: format!("unknown validator: {}", v),
                    });
                }
            }
        }
        for inner in qset.inner() {
            self.sanity_check_qset(inner, pk, depth + 1, strict)?;
        }
        Ok(())
    }

    fn intern_qset(
        &mut self,
        qset: &QuorumSet,
        known_qsets: &mut BTreeMap<QsetVertex, NodeIndex>,
    ) -> NodeIndex {
        let mut vx = QsetVertex {
            threshold: qset.threshold(),
            ..Default::default()
        };
        for v in qset.validators() {
            if let Some(&idx) = self.validators.get(v) {
                vx.validators.insert(idx);
            }
        }
        for inner in qset.inner() {
            let q_idx = self.intern_qset(inner, known_qsets);
            vx.inner.insert(q_idx);
        }

        if let Some(&idx) = known_qsets.get(&vx) {
            return idx;
        }
        let idx = self.graph.add_node(Vertex::QSet(vx.clone()));
        known_qsets.insert(vx.clone(), idx);
        for vi in &vx.validators {
            self.graph.update_edge(idx, *vi, ());
        }
        for qi in &vx.inner {
            self.graph.update_edge(idx, *qi, ());
        }
        idx
    }

    pub fn len(&self) -> usize {
        self.qsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qsets.is_empty()
    }

    pub fn validator_ids(&self) -> impl Iterator<Item = &String> + Clone {
        self.qsets.keys()
    }

    pub fn quorum_set(&self, pk: &str) -> Option<&QuorumSet> {
        self.qsets.get(pk)
    }

    pub fn contains(&self, pk: &str) -> bool {
        self.qsets.contains_key(pk)
    }

    /// Number of structurally distinct quorum sets in the network.
    pub fn distinct_qset_count(&self) -> usize {
        self.graph.node_count() - self.validators.len()
    }

    pub fn organizations(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.organizations
    }

    pub fn set_organizations(&mut self, organizations: BTreeMap<String, BTreeSet<String>>) {
        self.organizations = organizations;
    }

    pub(crate) fn qset_vertex_of(&self, v_idx: NodeIndex) -> Result<NodeIndex, AnalyzerError> {
        self.graph
            .neighbors(v_idx)
            .next()
            .ok_or(AnalyzerError::InternalError(
                "validator vertex has no quorum set",
            ))
    }

    pub(crate) fn qset_weight(&self, idx: NodeIndex) -> Result<&QsetVertex, AnalyzerError> {
        match self.graph.node_weight(idx) {
            Some(Vertex::QSet(q)) => Ok(q),
            _ => Err(AnalyzerError::InternalError("vertex is not a quorum set")),
        }
    }

    /// The quorum set declared by the largest number of validators. Ties go
    /// to the structurally smallest set, so the answer is deterministic.
    pub fn most_frequent_qset(&self) -> Option<&QuorumSet> {
        let mut counts: BTreeMap<&QuorumSet, usize> = BTreeMap::new();
        for qset in self.qsets.values() {
            *counts.entry(qset).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .max_by(|(qa, ca), (qb, cb)| ca.cmp(cb).then_with(|| qb.cmp(qa)))
            .map(|(qset, _)| qset)
    }

    /// The subnetwork over the members of the most frequent quorum set.
    /// Quorum sets are kept as declared, so they may still reference
    /// validators outside the tier; construction is therefore lenient.
    pub fn top_tier(&self) -> Result<Network, AnalyzerError> {
        let mfq = self
            .most_frequent_qset()
            .ok_or(AnalyzerError::InternalError("empty network"))?;
        let tier = mfq.members();
        let validators = tier
            .iter()
            .filter_map(|pk| self.qsets.get(pk).map(|q| (pk.clone(), q.clone())))
            .collect();
        let organizations = self
            .organizations
            .iter()
            .map(|(name, members)| {
                (
                    name.clone(),
                    members.intersection(&tier).cloned().collect::<BTreeSet<_>>(),
                )
            })
            .filter(|(_, members)| !members.is_empty())
            .collect();
        Network::build(validators, organizations, false)
    }

    /// An equivalent network with validator ids remapped to "1".."n" for
    /// readability in dumps. Ids are ordered numerically when they all parse
    /// as integers, which makes the rename idempotent.
    pub fn simplify_keys(&self) -> Result<Network, AnalyzerError> {
        let mut keys: Vec<&String> = self.qsets.keys().collect();
        keys.sort_by(|a, b| numeric_aware_cmp(a, b));
        let rename: BTreeMap<&str, String> = keys
            .iter()
            .enumerate()
            .map(|(i, pk)| (pk.as_str(), (i + 1).to_string()))
            .collect();

        let mut validators = Vec::with_capacity(keys.len());
        for pk in keys {
            let qset = rename_qset(&self.qsets[pk], &rename)?;
            validators.push((rename[pk.as_str()].clone(), qset));
        }
        let organizations = self
            .organizations
            .iter()
            .map(|(name, members)| {
                (
                    name.clone(),
                    members
                        .iter()
                        .filter_map(|pk| rename.get(pk.as_str()).cloned())
                        .collect(),
                )
            })
            .collect();
        Network::build(validators, organizations, true)
    }
}

fn rename_qset(
    qset: &QuorumSet,
    rename: &BTreeMap<&str, String>,
) -> Result<QuorumSet, AnalyzerError> {
    let validators = qset
        .validators()
        .iter()
        .map(|v| {
            rename
                .get(v.as_str())
                .cloned()
                .ok_or_else(|| AnalyzerError::UnknownValidator(v.clone()))
        })
        .collect::<Result<BTreeSet<_>, _>>()?;
    let inner = qset
        .inner()
        .iter()
        .map(|q| rename_qset(q, rename))
        .collect::<Result<BTreeSet<_>, _>>()?;
    QuorumSet::new(qset.threshold(), validators, inner)
}

fn numeric_aware_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb),
        _ => a.cmp(b),
    }
}
