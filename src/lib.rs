mod closure;
mod dump;
mod gen;
mod json_parser;
mod limits;
mod network;
mod overlay;
mod prop;
mod qset;
mod solver;
mod tvl;

#[cfg(feature = "cli")]
pub mod stellarbeat;

#[cfg(test)]
mod test;

pub use closure::{IntertwineAnalyzer, Verdict};
pub use dump::{canonical_json, dump_network};
pub use gen::{almost_symmetric_network, symmetric_network};
pub use limits::Deadline;
pub use network::{AnalyzerError, Network};
pub use overlay::{find_optimal_overlay, OverlayOutcome};
pub use prop::{Atom, AtomTable, Prop};
pub use qset::QuorumSet;
pub use solver::{is_sat, is_valid, maximize, Assignment, MaxSatResult, SatResult, ValidityResult};
pub use tvl::{Tvl, TvlId};
