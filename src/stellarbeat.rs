//! Fetches the live validator configuration from the stellarbeat API and
//! caches the filtered document on disk, so repeated analyses do not hit the
//! network.

use json::JsonValue;
use log::info;
use std::path::Path;

use crate::network::{AnalyzerError, Network};

const NODES_URL: &str = "https://api.stellarbeat.io/v1/node";

/// Loads the network from `cache`, fetching it first when `update` is set or
/// no cache exists yet.
pub fn get_network(update: bool, cache: &Path) -> Result<Network, AnalyzerError> {
    if update || !cache.exists() {
        fetch_and_cache(cache)?;
    }
    Network::from_json_path(cache)
}

fn fetch_and_cache(cache: &Path) -> Result<(), AnalyzerError> {
    info!(target: "FBA", "fetching validator data from {}", NODES_URL);
    let body = reqwest::blocking::get(NODES_URL)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(|e| AnalyzerError::Fetch(e.to_string()))?;

    let parsed = json::parse(&body)
        .map_err(|e| AnalyzerError::Parse(format!("invalid JSON from data source: {}", e)))?;
    let nodes = match parsed {
        JsonValue::Array(nodes) => nodes,
        _ => {
            return Err(AnalyzerError::Parse(
                "data source root is not an array".to_string(),
            ))
        }
    };

    // Keep only actual validators, and only the fields the analyzer reads.
    let filtered: Vec<JsonValue> = nodes
        .into_iter()
        .filter(|node| node["isValidator"].as_bool() == Some(true))
        .map(|node| {
            let mut kept = JsonValue::new_object();
            kept["publicKey"] = node["publicKey"].clone();
            kept["quorumSet"] = node["quorumSet"].clone();
            kept
        })
        .collect();

    std::fs::write(cache, JsonValue::Array(filtered).dump())?;
    Ok(())
}
