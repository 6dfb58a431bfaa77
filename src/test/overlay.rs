use std::collections::BTreeSet;

use crate::limits::Deadline;
use crate::network::Network;
use crate::overlay::{find_optimal_overlay, OverlayOutcome};
use crate::symmetric_network;

fn optimal_edges(network: &Network) -> BTreeSet<(String, String)> {
    match find_optimal_overlay(network, &Deadline::unlimited()).unwrap() {
        OverlayOutcome::Optimal(edges) => edges,
        other => panic!("expected an optimal overlay, got {:?}", other),
    }
}

fn edge(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Checks the two hard constraint families directly on a result.
fn assert_overlay_valid(network: &Network, edges: &BTreeSet<(String, String)>) {
    let has_edge = |a: &str, b: &str| edges.contains(&edge(a, b));
    for pk in network.validator_ids() {
        let qset = network.quorum_set(pk).unwrap();
        for blocking in qset.minimal_blocking() {
            if blocking.contains(pk) {
                continue;
            }
            assert!(
                blocking.iter().any(|w| has_edge(pk, w)),
                "{} has no neighbor in blocking set {:?}",
                pk,
                blocking
            );
        }
    }
    let ids: Vec<&String> = network.validator_ids().collect();
    for (i, u) in ids.iter().enumerate() {
        for v in &ids[i + 1..] {
            let two_hop = ids
                .iter()
                .any(|w| w != u && w != v && has_edge(u, w) && has_edge(w, v));
            assert!(
                has_edge(u, v) || two_hop,
                "{} and {} are more than two hops apart",
                u,
                v
            );
        }
    }
}

#[test]
fn single_validator_needs_no_edges() {
    let network = Network::from_json_str(
        r#"[{"publicKey": "A", "quorumSet": {"threshold": 1, "validators": ["A"], "innerQuorumSets": []}}]"#,
    )
    .unwrap();
    assert!(optimal_edges(&network).is_empty());
}

#[test]
fn mutual_trust_needs_one_edge() {
    let network = Network::from_json_str(
        r#"[
        {"publicKey": "A", "quorumSet": {"threshold": 1, "validators": ["B"], "innerQuorumSets": []}},
        {"publicKey": "B", "quorumSet": {"threshold": 1, "validators": ["A"], "innerQuorumSets": []}}
    ]"#,
    )
    .unwrap();
    let edges = optimal_edges(&network);
    assert_eq!(edges, BTreeSet::from([edge("A", "B")]));
}

#[test]
fn three_cycle_needs_all_three_edges() {
    let network = Network::from_json_str(
        r#"[
        {"publicKey": "A", "quorumSet": {"threshold": 1, "validators": ["B"], "innerQuorumSets": []}},
        {"publicKey": "B", "quorumSet": {"threshold": 1, "validators": ["C"], "innerQuorumSets": []}},
        {"publicKey": "C", "quorumSet": {"threshold": 1, "validators": ["A"], "innerQuorumSets": []}}
    ]"#,
    )
    .unwrap();
    let edges = optimal_edges(&network);
    assert_eq!(
        edges,
        BTreeSet::from([edge("A", "B"), edge("B", "C"), edge("A", "C")])
    );
}

#[test]
fn shared_nested_qset_overlay_satisfies_constraints() {
    let qset = r#"{"threshold": 3, "validators": ["A", "B", "C"],
        "innerQuorumSets": [{"threshold": 2, "validators": ["1", "2", "3"], "innerQuorumSets": []}]}"#;
    let nodes: Vec<String> = ["A", "B", "C", "1", "2", "3"]
        .iter()
        .map(|pk| format!(r#"{{"publicKey": "{}", "quorumSet": {}}}"#, pk, qset))
        .collect();
    let network = Network::from_json_str(&format!("[{}]", nodes.join(","))).unwrap();
    let edges = optimal_edges(&network);
    assert_overlay_valid(&network, &edges);
    // the complete graph always works, the optimum must beat it
    assert!(edges.len() < 15);
}

#[test]
fn symmetric_network_overlay_satisfies_constraints() {
    let network = symmetric_network(2).unwrap();
    let edges = optimal_edges(&network);
    assert_overlay_valid(&network, &edges);
}
