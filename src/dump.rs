//! Persisted network dumps for external tools. Three files are written for a
//! prefix `p`: `p.json` (the canonical document this crate also reads),
//! `p_for_stellar_core.json` (each validator under a fresh random strkey,
//! quorum sets flattened to `{ "t": threshold, "v": [..] }`) and
//! `p_orgs.json` (organization names with their validators, also under the
//! fresh strkeys so the two generated files agree).

use json::JsonValue;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::Path;

use crate::network::{AnalyzerError, Network};
use crate::qset::QuorumSet;

pub fn dump_network(network: &Network, prefix: &str, dir: &Path) -> Result<(), AnalyzerError> {
    std::fs::write(
        dir.join(format!("{}.json", prefix)),
        canonical_json(network).pretty(2),
    )?;
    let strkeys = fresh_strkeys(network);
    std::fs::write(
        dir.join(format!("{}_for_stellar_core.json", prefix)),
        stellar_core_json(network, &strkeys)?.pretty(2),
    )?;
    std::fs::write(
        dir.join(format!("{}_orgs.json", prefix)),
        organizations_json(network, &strkeys).pretty(2),
    )?;
    Ok(())
}

pub fn canonical_json(network: &Network) -> JsonValue {
    let nodes = network
        .validator_ids()
        .filter_map(|pk| {
            network.quorum_set(pk).map(|qset| {
                let mut node = JsonValue::new_object();
                node["publicKey"] = pk.as_str().into();
                node["quorumSet"] = quorum_set_json(qset);
                node
            })
        })
        .collect();
    JsonValue::Array(nodes)
}

fn quorum_set_json(qset: &QuorumSet) -> JsonValue {
    let mut value = JsonValue::new_object();
    value["threshold"] = qset.threshold().into();
    value["validators"] = JsonValue::Array(
        qset.validators()
            .iter()
            .map(|v| v.as_str().into())
            .collect(),
    );
    value["innerQuorumSets"] =
        JsonValue::Array(qset.inner().iter().map(quorum_set_json).collect());
    value
}

fn fresh_strkeys(network: &Network) -> BTreeMap<String, String> {
    let mut rng = rand::thread_rng();
    network
        .validator_ids()
        .map(|pk| {
            let bytes: [u8; 32] = rng.gen();
            let strkey = stellar_strkey::ed25519::PublicKey(bytes).to_string();
            (pk.clone(), strkey)
        })
        .collect()
}

fn stellar_core_json(
    network: &Network,
    strkeys: &BTreeMap<String, String>,
) -> Result<JsonValue, AnalyzerError> {
    let nodes = network
        .validator_ids()
        .filter_map(|pk| {
            network.quorum_set(pk).map(|qset| {
                flat_quorum_set_json(qset, strkeys).map(|flat| {
                    let mut node = JsonValue::new_object();
                    node["publicKey"] = strkeys[pk].as_str().into();
                    node["quorumSet"] = flat;
                    node
                })
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(JsonValue::Array(nodes))
}

fn flat_quorum_set_json(
    qset: &QuorumSet,
    strkeys: &BTreeMap<String, String>,
) -> Result<JsonValue, AnalyzerError> {
    let mut value = JsonValue::new_object();
    value["t"] = qset.threshold().into();
    let mut entries: Vec<JsonValue> = Vec::new();
    for v in qset.validators() {
        let strkey = strkeys
            .get(v)
            .ok_or_else(|| AnalyzerError::UnknownValidator(v.clone()))?;
        entries.push(strkey.as_str().into());
    }
    for inner in qset.inner() {
        entries.push(flat_quorum_set_json(inner, strkeys)?);
    }
    value["v"] = JsonValue::Array(entries);
    Ok(value)
}

fn organizations_json(network: &Network, strkeys: &BTreeMap<String, String>) -> JsonValue {
    let orgs = network
        .organizations()
        .iter()
        .map(|(name, members)| {
            let mut org = JsonValue::new_object();
            org["name"] = name.as_str().into();
            org["validators"] = JsonValue::Array(
                members
                    .iter()
                    .filter_map(|pk| strkeys.get(pk))
                    .map(|strkey| strkey.as_str().into())
                    .collect(),
            );
            org
        })
        .collect();
    JsonValue::Array(orgs)
}
