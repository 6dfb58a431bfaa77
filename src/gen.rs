//! Network generators for stress testing: a fully symmetric organization
//! structure, and a degraded variant with randomly deleted validators.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};

use crate::network::{AnalyzerError, Network};
use crate::qset::QuorumSet;

const VALIDATORS_PER_ORG: usize = 3;

fn validator_id(org: usize, v: usize) -> String {
    format!("org{}v{}", org, v)
}

/// Byzantine-style threshold over `n` organizations: tolerate up to
/// `(n - 1) / 3` failed organizations.
fn org_threshold(n_orgs: usize) -> u32 {
    (n_orgs - (n_orgs - 1) / 3) as u32
}

/// A network of `n_orgs` organizations with three validators each. Every
/// validator declares the same quorum set: one 2-of-3 inner slice per
/// organization, `org_threshold` of which are required.
pub fn symmetric_network(n_orgs: usize) -> Result<Network, AnalyzerError> {
    let roster: Vec<Vec<String>> = (0..n_orgs)
        .map(|org| {
            (0..VALIDATORS_PER_ORG)
                .map(|v| validator_id(org, v))
                .collect()
        })
        .collect();
    network_from_roster(&roster)
}

/// A symmetric network degraded by deleting, per organization and with
/// probability scaled by `delete_prob_factor`, one randomly chosen
/// validator. Deterministic in the seed.
pub fn almost_symmetric_network(
    n_orgs: usize,
    delete_prob_factor: u32,
    seed: u64,
) -> Result<Network, AnalyzerError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let delete_prob = f64::from(delete_prob_factor.min(15)) / 15.0;
    let roster: Vec<Vec<String>> = (0..n_orgs)
        .map(|org| {
            let mut members: Vec<String> = (0..VALIDATORS_PER_ORG)
                .map(|v| validator_id(org, v))
                .collect();
            if rng.gen_bool(delete_prob) {
                let victim = rng.gen_range(0..members.len());
                members.remove(victim);
            }
            members
        })
        .collect();
    network_from_roster(&roster)
}

fn network_from_roster(roster: &[Vec<String>]) -> Result<Network, AnalyzerError> {
    let inner: BTreeSet<QuorumSet> = roster
        .iter()
        .map(|members| QuorumSet::new(2, members.iter().cloned().collect(), BTreeSet::new()))
        .collect::<Result<_, _>>()?;
    let top = QuorumSet::new(org_threshold(roster.len()), BTreeSet::new(), inner)?;

    let validators: Vec<(String, QuorumSet)> = roster
        .iter()
        .flat_map(|members| members.iter().map(|pk| (pk.clone(), top.clone())))
        .collect();
    let mut network = Network::from_validators(validators)?;

    let organizations: BTreeMap<String, BTreeSet<String>> = roster
        .iter()
        .enumerate()
        .map(|(org, members)| {
            (
                format!("org{}", org),
                members.iter().cloned().collect::<BTreeSet<_>>(),
            )
        })
        .collect();
    network.set_organizations(organizations);
    Ok(network)
}
