use std::collections::BTreeSet;

use super::{qset, set_of};
use crate::dump::{canonical_json, dump_network};
use crate::json_parser::organizations_from_json_str;
use crate::network::{AnalyzerError, Network};
use crate::symmetric_network;

const SIMPLE: &str = r#"[
    {"publicKey": "A", "quorumSet": {"threshold": 2, "validators": ["A", "B"], "innerQuorumSets": []}},
    {"publicKey": "B", "quorumSet": {"threshold": 2, "validators": ["B", "A"], "innerQuorumSets": []}}
]"#;

#[test]
fn parses_canonical_document() {
    let network = Network::from_json_str(SIMPLE).unwrap();
    assert_eq!(network.len(), 2);
    assert_eq!(
        network.quorum_set("A").unwrap(),
        &qset(2, &["A", "B"], vec![])
    );
}

#[test]
fn equal_quorum_sets_are_interned_once() {
    // element order differs in the document; structurally the sets are equal
    let network = Network::from_json_str(SIMPLE).unwrap();
    assert_eq!(network.distinct_qset_count(), 1);
    assert_eq!(network.quorum_set("A"), network.quorum_set("B"));
}

#[test]
fn nested_equal_quorum_sets_are_shared() {
    let data = r#"[
        {"publicKey": "A", "quorumSet": {"threshold": 1, "validators": [],
            "innerQuorumSets": [{"threshold": 1, "validators": ["B"], "innerQuorumSets": []}]}},
        {"publicKey": "B", "quorumSet": {"threshold": 1, "validators": [],
            "innerQuorumSets": [{"threshold": 1, "validators": ["B"], "innerQuorumSets": []}]}}
    ]"#;
    let network = Network::from_json_str(data).unwrap();
    // the outer set and the inner set: two distinct vertices in total
    assert_eq!(network.distinct_qset_count(), 2);
}

#[test]
fn tolerates_extra_fields_and_filters_non_validators() {
    let data = r#"[
        {"publicKey": "A", "isValidator": true, "alias": "node-a",
         "quorumSet": {"threshold": 1, "validators": ["A"], "innerQuorumSets": [], "hashKey": "xyz"}},
        {"publicKey": "W", "isValidator": false,
         "quorumSet": {"threshold": 1, "validators": ["A"], "innerQuorumSets": []}}
    ]"#;
    let network = Network::from_json_str(data).unwrap();
    assert_eq!(network.len(), 1);
    assert!(network.contains("A"));
    assert!(!network.contains("W"));
}

#[test]
fn missing_inner_quorum_sets_reads_as_empty() {
    let data = r#"[{"publicKey": "A", "quorumSet": {"threshold": 1, "validators": ["A"]}}]"#;
    let network = Network::from_json_str(data).unwrap();
    assert_eq!(network.quorum_set("A").unwrap().inner().len(), 0);
}

#[test]
fn duplicate_validator_is_rejected() {
    let data = r#"[
        {"publicKey": "A", "quorumSet": {"threshold": 1, "validators": ["A"], "innerQuorumSets": []}},
        {"publicKey": "A", "quorumSet": {"threshold": 1, "validators": ["A"], "innerQuorumSets": []}}
    ]"#;
    assert!(matches!(
        Network::from_json_str(data),
        Err(AnalyzerError::DuplicateValidator(pk)) if pk == "A"
    ));
}

#[test]
fn unknown_reference_is_attributed_to_its_validator() {
    let data = r#"[
        {"publicKey": "A", "quorumSet": {"threshold": 1, "validators": ["Z"], "innerQuorumSets": []}}
    ]"#;
    match Network::from_json_str(data) {
        Err(AnalyzerError::Malformed { validator, reason }) => {
            assert_eq!(validator, "A");
            assert!(reason.contains("Z"));
        }
        other => panic!("expected malformed error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn threshold_out_of_range_is_rejected() {
    for bad in [
        r#"[{"publicKey": "A", "quorumSet": {"threshold": 0, "validators": ["A"], "innerQuorumSets": []}}]"#,
        r#"[{"publicKey": "A", "quorumSet": {"threshold": 2, "validators": ["A"], "innerQuorumSets": []}}]"#,
        r#"[{"publicKey": "A", "quorumSet": {"threshold": 1, "validators": [], "innerQuorumSets": []}}]"#,
    ] {
        assert!(matches!(
            Network::from_json_str(bad),
            Err(AnalyzerError::Malformed { validator, .. }) if validator == "A"
        ));
    }
}

#[test]
fn most_frequent_qset_and_top_tier() {
    let data = r#"[
        {"publicKey": "A", "quorumSet": {"threshold": 2, "validators": ["A", "B", "C"], "innerQuorumSets": []}},
        {"publicKey": "B", "quorumSet": {"threshold": 2, "validators": ["A", "B", "C"], "innerQuorumSets": []}},
        {"publicKey": "C", "quorumSet": {"threshold": 2, "validators": ["A", "B", "C"], "innerQuorumSets": []}},
        {"publicKey": "D", "quorumSet": {"threshold": 1, "validators": ["A"], "innerQuorumSets": []}}
    ]"#;
    let network = Network::from_json_str(data).unwrap();
    let mfq = network.most_frequent_qset().unwrap();
    assert_eq!(mfq, &qset(2, &["A", "B", "C"], vec![]));
    let tier = network.top_tier().unwrap();
    assert_eq!(
        tier.validator_ids().cloned().collect::<BTreeSet<_>>(),
        set_of(&["A", "B", "C"])
    );
}

#[test]
fn simplify_keys_renames_and_preserves_structure() {
    let data = r#"[
        {"publicKey": "GXBETA", "quorumSet": {"threshold": 2, "validators": ["GXBETA", "GXALPHA"], "innerQuorumSets": []}},
        {"publicKey": "GXALPHA", "quorumSet": {"threshold": 2, "validators": ["GXBETA", "GXALPHA"], "innerQuorumSets": []}}
    ]"#;
    let network = Network::from_json_str(data).unwrap();
    let simplified = network.simplify_keys().unwrap();
    assert_eq!(
        simplified.validator_ids().cloned().collect::<BTreeSet<_>>(),
        set_of(&["1", "2"])
    );
    // GXALPHA sorts first, so it becomes "1"
    assert_eq!(
        simplified.quorum_set("1").unwrap(),
        &qset(2, &["1", "2"], vec![])
    );
    assert_eq!(simplified.distinct_qset_count(), 1);
}

#[test]
fn simplify_keys_is_idempotent() {
    let network = symmetric_network(4).unwrap();
    let once = network.simplify_keys().unwrap();
    let twice = once.simplify_keys().unwrap();
    assert_eq!(
        canonical_json(&once).dump(),
        canonical_json(&twice).dump()
    );
}

#[test]
fn parses_organizations() {
    let data = r#"[
        {"name": "Org One", "validators": ["A", "B"]},
        {"name": "Org Two", "validators": ["C"]}
    ]"#;
    let orgs = organizations_from_json_str(data).unwrap();
    assert_eq!(orgs.len(), 2);
    assert_eq!(orgs["Org One"], set_of(&["A", "B"]));
}

#[test]
fn dump_round_trips_and_uses_strkeys() {
    let network = symmetric_network(2).unwrap();
    let dir = std::env::temp_dir().join(format!("intertwine_dump_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    dump_network(&network, "net", &dir).unwrap();

    let canonical = std::fs::read_to_string(dir.join("net.json")).unwrap();
    let reloaded = Network::from_json_str(&canonical).unwrap();
    assert_eq!(
        canonical_json(&reloaded).dump(),
        canonical_json(&network).dump()
    );

    let core = std::fs::read_to_string(dir.join("net_for_stellar_core.json")).unwrap();
    let core = json::parse(&core).unwrap();
    assert_eq!(core.len(), network.len());
    for node in core.members() {
        let pk = node["publicKey"].as_str().unwrap();
        assert_eq!(pk.len(), 56);
        assert!(pk.starts_with('G'));
        assert_eq!(node["quorumSet"]["t"].as_u32(), Some(2));
        assert_eq!(node["quorumSet"]["v"].len(), 2);
    }

    let orgs = std::fs::read_to_string(dir.join("net_orgs.json")).unwrap();
    let orgs = json::parse(&orgs).unwrap();
    assert_eq!(orgs.len(), 2);
    for org in orgs.members() {
        assert_eq!(org["validators"].len(), 3);
    }

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn generators_are_deterministic() {
    let network = symmetric_network(3).unwrap();
    assert_eq!(network.len(), 9);
    assert_eq!(network.distinct_qset_count(), 4);
    assert_eq!(network.organizations().len(), 3);
    assert_eq!(network.quorum_set("org0v0").unwrap().threshold(), 3);

    let a = crate::almost_symmetric_network(6, 5, 42).unwrap();
    let b = crate::almost_symmetric_network(6, 5, 42).unwrap();
    assert_eq!(canonical_json(&a).dump(), canonical_json(&b).dump());
    assert!(a.len() <= 18 && a.len() >= 12);
}

#[test]
fn from_json_path_reads_files() {
    let path = std::env::temp_dir().join(format!("intertwine_net_{}.json", std::process::id()));
    std::fs::write(&path, SIMPLE).unwrap();
    let network = Network::from_json_path(&path).unwrap();
    assert_eq!(network.len(), 2);
    std::fs::remove_file(&path).unwrap();
}
