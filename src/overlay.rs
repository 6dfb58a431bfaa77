//! Synthesizes a minimum-edge overlay graph for a network: every validator
//! must neighbour each minimal blocking set of its quorum set that it is not
//! itself part of, the graph must have diameter at most two, and the number
//! of edges is minimized as MaxSAT with one soft unit clause per edge.
//!
//! Blocking sets are enumerated here (and only here); the enumeration is
//! feasible on the top-tier-sized networks this is meant for.

use itertools::Itertools;
use log::{trace, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::limits::Deadline;
use crate::network::{AnalyzerError, Network};
use crate::prop::{Atom, AtomTable, Prop};
use crate::solver::{self, MaxSatResult};

#[derive(Debug, Clone)]
pub enum OverlayOutcome {
    /// A minimum-cardinality edge set, as ordered unordered pairs.
    Optimal(BTreeSet<(String, String)>),
    /// The coverage and diameter constraints cannot all hold.
    Unsatisfiable,
    Unknown,
}

/// One boolean variable per unordered validator pair, created on demand.
#[derive(Default)]
struct EdgeVars {
    atoms: AtomTable,
    edges: BTreeMap<(String, String), Atom>,
}

impl EdgeVars {
    fn get(&mut self, a: &str, b: &str) -> Atom {
        let key = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        if let Some(&atom) = self.edges.get(&key) {
            return atom;
        }
        let atom = self.atoms.atom(&format!("e:{}:{}", key.0, key.1));
        self.edges.insert(key, atom);
        atom
    }
}

pub fn find_optimal_overlay(
    network: &Network,
    deadline: &Deadline,
) -> Result<OverlayOutcome, AnalyzerError> {
    let ids: Vec<&String> = network.validator_ids().collect();
    let mut vars = EdgeVars::default();
    let mut hard = Vec::new();

    // Coverage: a neighbour in every minimal blocking set the validator is
    // not a member of.
    for pk in &ids {
        let qset = network
            .quorum_set(pk)
            .ok_or(AnalyzerError::InternalError("validator without quorum set"))?;
        for blocking in qset.minimal_blocking() {
            if blocking.contains(pk.as_str()) {
                continue;
            }
            let choices: Vec<Prop> = blocking
                .iter()
                .map(|w| Prop::var(vars.get(pk, w)))
                .collect();
            hard.push(Prop::Or(choices));
        }
    }

    // Diameter at most two: direct edge or a shared neighbour.
    for pair in ids.iter().combinations(2) {
        let (u, v) = (pair[0], pair[1]);
        let mut alternatives = vec![Prop::var(vars.get(u, v))];
        for w in &ids {
            if w == u || w == v {
                continue;
            }
            alternatives.push(Prop::And(vec![
                Prop::var(vars.get(u, w)),
                Prop::var(vars.get(w, v)),
            ]));
        }
        hard.push(Prop::Or(alternatives));
    }

    // Every edge costs one.
    let soft: Vec<Prop> = vars
        .edges
        .values()
        .map(|&atom| Prop::not(Prop::var(atom)))
        .collect();
    let weights = vec![1; soft.len()];

    trace!(
        target: "FBA",
        "overlay: {} validators, {} edge variables, {} hard constraints",
        ids.len(),
        vars.edges.len(),
        hard.len()
    );

    match solver::maximize(&hard, &soft, &weights, &vars.atoms, deadline) {
        MaxSatResult::Optimal(assignment) => {
            let edges = vars
                .edges
                .iter()
                .filter(|(_, &atom)| assignment.is_true(atom))
                .map(|(pair, _)| pair.clone())
                .collect();
            Ok(OverlayOutcome::Optimal(edges))
        }
        MaxSatResult::Unsat => {
            warn!(target: "FBA", "overlay constraints are unsatisfiable");
            Ok(OverlayOutcome::Unsatisfiable)
        }
        MaxSatResult::Unknown => Ok(OverlayOutcome::Unknown),
    }
}
