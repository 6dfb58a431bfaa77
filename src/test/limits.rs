use std::time::Duration;

use crate::closure::{IntertwineAnalyzer, Verdict};
use crate::limits::Deadline;
use crate::overlay::{find_optimal_overlay, OverlayOutcome};
use crate::symmetric_network;

#[test]
fn expired_deadline_yields_unknown_verdict() {
    let deadline = Deadline::after_millis(0);
    std::thread::sleep(Duration::from_millis(2));
    let analyzer = IntertwineAnalyzer::new(symmetric_network(4).unwrap(), deadline);
    assert_eq!(
        analyzer.check_network_intertwined().unwrap(),
        Verdict::Unknown
    );
}

#[test]
fn expired_deadline_yields_unknown_overlay() {
    let deadline = Deadline::after_millis(0);
    std::thread::sleep(Duration::from_millis(2));
    let network = symmetric_network(4).unwrap();
    assert!(matches!(
        find_optimal_overlay(&network, &deadline).unwrap(),
        OverlayOutcome::Unknown
    ));
}

#[test]
fn generous_deadline_completes() {
    let deadline = Deadline::after_millis(60_000);
    let analyzer = IntertwineAnalyzer::new(symmetric_network(2).unwrap(), deadline.clone());
    assert_eq!(analyzer.check_network_intertwined().unwrap(), Verdict::True);
    assert!(deadline.elapsed() <= Duration::from_secs(60));
}

#[test]
fn deadline_expiry_is_monotone() {
    let deadline = Deadline::after_millis(0);
    std::thread::sleep(Duration::from_millis(2));
    assert!(deadline.expired());
    assert!(deadline.expired());
}
