//! Loading of the stellarbeat-style validator document (a JSON array of
//! nodes with `publicKey` and `quorumSet`) and the organizations document.
//! Parsing tolerates extra fields everywhere; nodes explicitly marked
//! `isValidator: false` are dropped.

use json::JsonValue;
use std::collections::{BTreeMap, BTreeSet};

use crate::network::{AnalyzerError, Network};
use crate::qset::QuorumSet;

pub(crate) fn network_from_json_str(data: &str) -> Result<Network, AnalyzerError> {
    let parsed = json::parse(data)
        .map_err(|e| AnalyzerError::Parse(format!("invalid JSON: {}", e)))?;
    let nodes = match parsed {
        JsonValue::Array(nodes) => nodes,
        _ => {
            return Err(AnalyzerError::Parse(
                "root is not an array of validators".to_string(),
            ))
        }
    };

    let mut validators = Vec::new();
    for node in &nodes {
        if node["isValidator"].as_bool() == Some(false) {
            continue;
        }
        let public_key = node["publicKey"]
            .as_str()
            .ok_or_else(|| {
                AnalyzerError::Parse("publicKey field missing or not a string".to_string())
            })?
            .to_string();
        let qset = parse_quorum_set(&node["quorumSet"]).map_err(|e| match e {
            AnalyzerError::MalformedQuorumSet(reason) | AnalyzerError::Parse(reason) => {
                AnalyzerError::Malformed {
                    validator: public_key.clone(),
                    reason,
                }
            }
            other => other,
        })?;
        validators.push((public_key, qset));
    }
    Network::from_validators(validators)
}

fn parse_quorum_set(value: &JsonValue) -> Result<QuorumSet, AnalyzerError> {
    let threshold = value["threshold"].as_u32().ok_or_else(|| {
        AnalyzerError::Parse("threshold field missing or not a number".to_string())
    })?;

    let mut validators = BTreeSet::new();
    match &value["validators"] {
        JsonValue::Array(entries) => {
            for entry in entries {
                let pk = entry.as_str().ok_or_else(|| {
                    AnalyzerError::Parse("validator entry must be a string".to_string())
                })?;
                validators.insert(pk.to_string());
            }
        }
        JsonValue::Null => {}
        _ => {
            return Err(AnalyzerError::Parse(
                "validators field is not an array".to_string(),
            ))
        }
    }

    let mut inner = BTreeSet::new();
    match &value["innerQuorumSets"] {
        JsonValue::Array(entries) => {
            for entry in entries {
                inner.insert(parse_quorum_set(entry)?);
            }
        }
        JsonValue::Null => {}
        _ => {
            return Err(AnalyzerError::Parse(
                "innerQuorumSets field is not an array".to_string(),
            ))
        }
    }

    QuorumSet::new(threshold, validators, inner)
}

pub(crate) fn organizations_from_json_str(
    data: &str,
) -> Result<BTreeMap<String, BTreeSet<String>>, AnalyzerError> {
    let parsed = json::parse(data)
        .map_err(|e| AnalyzerError::Parse(format!("invalid JSON: {}", e)))?;
    let entries = match parsed {
        JsonValue::Array(entries) => entries,
        _ => {
            return Err(AnalyzerError::Parse(
                "root is not an array of organizations".to_string(),
            ))
        }
    };

    let mut organizations = BTreeMap::new();
    for entry in &entries {
        let name = entry["name"]
            .as_str()
            .ok_or_else(|| {
                AnalyzerError::Parse("name field missing or not a string".to_string())
            })?
            .to_string();
        let mut members = BTreeSet::new();
        if let JsonValue::Array(pks) = &entry["validators"] {
            for pk in pks {
                let pk = pk.as_str().ok_or_else(|| {
                    AnalyzerError::Parse(
                        "organization validator entry must be a string".to_string(),
                    )
                })?;
                members.insert(pk.to_string());
            }
        }
        organizations.insert(name, members);
    }
    Ok(organizations)
}
