//! Builds the closure axioms of a network as three-valued formulas and
//! decides intertwinedness by translating them to classical logic and asking
//! the solver for validity.
//!
//! Every entity (a validator, or a quorum set appearing as an inner element)
//! gets two axioms tying its symbol to the witnesses of its quorum set: if
//! every t-subset of the elements has a designated member, the entity is
//! designated, and dually for negations. Both axiom left-hand sides depend
//! only on the quorum set, so they are built once per interned quorum-set
//! vertex and shared across all entities declaring it.

use itertools::Itertools;
use log::trace;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::limits::Deadline;
use crate::network::{AnalyzerError, Network, Vertex};
use crate::prop::AtomTable;
use crate::solver::{self, ValidityResult};
use crate::tvl::{Tvl, TvlId};

/// Answer of an intertwinedness check. `Unknown` means the solver was
/// interrupted or gave up, not that the network is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    True,
    False,
    Unknown,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::True => write!(f, "true"),
            Verdict::False => write!(f, "false"),
            Verdict::Unknown => write!(f, "unknown"),
        }
    }
}

pub struct IntertwineAnalyzer {
    network: Network,
    deadline: Deadline,
}

impl IntertwineAnalyzer {
    pub fn new(network: Network, deadline: Deadline) -> Self {
        IntertwineAnalyzer { network, deadline }
    }

    pub fn from_json_path(path: &Path, deadline: Deadline) -> Result<Self, AnalyzerError> {
        Ok(Self::new(Network::from_json_path(path)?, deadline))
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Is every pair of validators intertwined?
    pub fn check_network_intertwined(&self) -> Result<Verdict, AnalyzerError> {
        let mut tvl = Tvl::new();
        let obligation = network_intertwined(&self.network, &mut tvl)?;
        self.decide(&tvl, obligation)
    }

    /// Are these two validators intertwined?
    pub fn check_intertwined(&self, p: &str, q: &str) -> Result<Verdict, AnalyzerError> {
        for pk in [p, q] {
            if !self.network.contains(pk) {
                return Err(AnalyzerError::UnknownValidator(pk.to_string()));
            }
        }
        let mut tvl = Tvl::new();
        let axioms = closed_ax(&self.network, &mut tvl)?;
        let pair = intertwined(&mut tvl, p, q);
        let obligation = tvl.dimp(axioms, pair);
        self.decide(&tvl, obligation)
    }

    fn decide(&self, tvl: &Tvl, obligation: TvlId) -> Result<Verdict, AnalyzerError> {
        let mut atoms = AtomTable::new();
        let classical = tvl.translate_for_validity(obligation, &mut atoms);
        trace!(
            target: "FBA",
            "deciding validity: {} three-valued nodes, {} classical atoms",
            tvl.len(),
            atoms.len()
        );
        Ok(
            match solver::is_valid(&classical, &atoms, &self.deadline) {
                ValidityResult::Valid => Verdict::True,
                ValidityResult::Invalid => Verdict::False,
                ValidityResult::Unknown => Verdict::Unknown,
            },
        )
    }
}

/// `(p ∧ q) ∨ (¬p ∧ ¬q)`: the two validators cannot be committed to
/// contradictory decisions.
pub(crate) fn intertwined(tvl: &mut Tvl, p: &str, q: &str) -> TvlId {
    let sp = tvl.var(&validator_sym(p));
    let sq = tvl.var(&validator_sym(q));
    let both = tvl.and(sp, sq);
    let np = tvl.not(sp);
    let nq = tvl.not(sq);
    let neither = tvl.and(np, nq);
    tvl.or(both, neither)
}

/// The whole-network obligation: trivially designated for a lone validator,
/// otherwise the closure axioms doubly imply every pairwise obligation.
pub(crate) fn network_intertwined(
    network: &Network,
    tvl: &mut Tvl,
) -> Result<TvlId, AnalyzerError> {
    if network.len() <= 1 {
        let f = tvl.constant_false();
        return Ok(tvl.not(f));
    }
    let axioms = closed_ax(network, tvl)?;
    let obligations: Vec<TvlId> = network
        .validator_ids()
        .tuple_combinations()
        .map(|(p, q)| intertwined(tvl, p, q))
        .collect();
    let all = tvl.and_all(&obligations);
    Ok(tvl.dimp(axioms, all))
}

/// Conjunction of the positive and negative closure axioms of every entity.
pub(crate) fn closed_ax(network: &Network, tvl: &mut Tvl) -> Result<TvlId, AnalyzerError> {
    let mut lhs_cache: BTreeMap<NodeIndex, (TvlId, TvlId)> = BTreeMap::new();
    let mut axioms = Vec::new();

    for (pk, &v_idx) in &network.validators {
        let q_idx = network.qset_vertex_of(v_idx)?;
        let (lhs_pos, lhs_neg) = witness_lhs(network, tvl, q_idx, &mut lhs_cache)?;
        let sym = tvl.var(&validator_sym(pk));
        axioms.push(tvl.dimp(lhs_pos, sym));
        let neg_sym = tvl.not(sym);
        axioms.push(tvl.dimp(lhs_neg, neg_sym));
    }

    // Quorum sets in inner position are entities of their own.
    let mut inner_entities: BTreeSet<NodeIndex> = BTreeSet::new();
    for idx in network.graph.node_indices() {
        if let Some(Vertex::QSet(q)) = network.graph.node_weight(idx) {
            inner_entities.extend(q.inner.iter().copied());
        }
    }
    for q_idx in inner_entities {
        let (lhs_pos, lhs_neg) = witness_lhs(network, tvl, q_idx, &mut lhs_cache)?;
        let sym = tvl.var(&qset_sym(q_idx));
        axioms.push(tvl.dimp(lhs_pos, sym));
        let neg_sym = tvl.not(sym);
        axioms.push(tvl.dimp(lhs_neg, neg_sym));
    }

    if axioms.is_empty() {
        return Err(AnalyzerError::InternalError("no closure axioms built"));
    }
    Ok(tvl.and_all(&axioms))
}

/// The two axiom left-hand sides of a quorum-set vertex: conjunction over
/// all size-t witnesses of the disjunction of element symbols (positive) or
/// negated element symbols (negative). Cached per vertex since the same
/// quorum set is typically shared by many validators.
fn witness_lhs(
    network: &Network,
    tvl: &mut Tvl,
    q_idx: NodeIndex,
    lhs_cache: &mut BTreeMap<NodeIndex, (TvlId, TvlId)>,
) -> Result<(TvlId, TvlId), AnalyzerError> {
    if let Some(&cached) = lhs_cache.get(&q_idx) {
        return Ok(cached);
    }
    let qset = network.qset_weight(q_idx)?;
    let elems: Vec<NodeIndex> = qset
        .validators
        .iter()
        .chain(qset.inner.iter())
        .copied()
        .collect();
    if (qset.threshold as usize) > elems.len() {
        return Err(AnalyzerError::InternalError(
            "quorum set threshold exceeds its known elements",
        ));
    }
    let elem_syms: Vec<TvlId> = elems
        .iter()
        .map(|&e| entity_sym(network, tvl, e))
        .collect::<Result<_, _>>()?;

    let mut pos_disjunctions = Vec::new();
    let mut neg_disjunctions = Vec::new();
    for witness in elem_syms
        .iter()
        .copied()
        .combinations(qset.threshold as usize)
    {
        pos_disjunctions.push(tvl.or_all(&witness));
        let negated: Vec<TvlId> = witness.iter().map(|&s| tvl.not(s)).collect();
        neg_disjunctions.push(tvl.or_all(&negated));
    }
    let lhs = (tvl.and_all(&pos_disjunctions), tvl.and_all(&neg_disjunctions));
    lhs_cache.insert(q_idx, lhs);
    Ok(lhs)
}

fn entity_sym(network: &Network, tvl: &mut Tvl, idx: NodeIndex) -> Result<TvlId, AnalyzerError> {
    match network.graph.node_weight(idx) {
        Some(Vertex::Validator(pk)) => Ok(tvl.var(&validator_sym(pk))),
        Some(Vertex::QSet(_)) => Ok(tvl.var(&qset_sym(idx))),
        None => Err(AnalyzerError::InternalError("dangling vertex index")),
    }
}

// The two namespaces are disjoint by prefix; the quorum-set name uses the
// interned vertex index, which is collision-free within a network.
fn validator_sym(pk: &str) -> String {
    format!("V:{}", pk)
}

fn qset_sym(idx: NodeIndex) -> String {
    format!("Q:{}", idx.index())
}
