use crate::limits::Deadline;
use crate::prop::AtomTable;
use crate::solver::{self, SatResult, ValidityResult};
use crate::tvl::{Tvl, TvlId};

fn check_validity(build: impl FnOnce(&mut Tvl) -> TvlId) -> ValidityResult {
    let mut tvl = Tvl::new();
    let formula = build(&mut tvl);
    let mut atoms = AtomTable::new();
    let classical = tvl.translate_for_validity(formula, &mut atoms);
    solver::is_valid(&classical, &atoms, &Deadline::unlimited())
}

fn check_satisfiability(build: impl FnOnce(&mut Tvl) -> TvlId) -> SatResult {
    let mut tvl = Tvl::new();
    let formula = build(&mut tvl);
    let mut atoms = AtomTable::new();
    let classical = tvl.translate_for_satisfiability(formula, &mut atoms);
    solver::is_sat(&classical, &atoms, &Deadline::unlimited())
}

#[test]
fn not_f_is_valid() {
    let result = check_validity(|tvl| {
        let f = tvl.constant_false();
        tvl.not(f)
    });
    assert_eq!(result, ValidityResult::Valid);
}

#[test]
fn f_is_unsatisfiable() {
    let result = check_satisfiability(|tvl| tvl.constant_false());
    assert!(matches!(result, SatResult::Unsat));
}

#[test]
fn variable_is_satisfiable_but_not_valid() {
    assert!(matches!(
        check_satisfiability(|tvl| tvl.var("p")),
        SatResult::Sat(_)
    ));
    assert_eq!(check_validity(|tvl| tvl.var("p")), ValidityResult::Invalid);
}

/// p and q each witness the other, so their closure axioms force them to
/// agree.
#[test]
fn mutual_witnesses_are_intertwined() {
    let result = check_validity(|tvl| {
        let p = tvl.var("p");
        let q = tvl.var("q");
        let np = tvl.not(p);
        let nq = tvl.not(q);
        let axioms = [
            tvl.dimp(q, p),
            tvl.dimp(nq, np),
            tvl.dimp(p, q),
            tvl.dimp(np, nq),
        ];
        let closed_ax = tvl.and_all(&axioms);
        let agree = agreement(tvl, p, q);
        tvl.dimp(closed_ax, agree)
    });
    assert_eq!(result, ValidityResult::Valid);
}

/// p follows a shared witness r and q follows p; validity survives.
#[test]
fn shared_witness_keeps_intertwinedness() {
    let result = check_validity(|tvl| {
        let p = tvl.var("p");
        let q = tvl.var("q");
        let r = tvl.var("r");
        let np = tvl.not(p);
        let nq = tvl.not(q);
        let nr = tvl.not(r);
        let axioms = [
            tvl.dimp(r, p),
            tvl.dimp(nr, np),
            tvl.dimp(p, q),
            tvl.dimp(np, nq),
        ];
        let closed_ax = tvl.and_all(&axioms);
        let agree = agreement(tvl, p, q);
        tvl.dimp(closed_ax, agree)
    });
    assert_eq!(result, ValidityResult::Valid);
}

/// p and q follow two unrelated witnesses; nothing ties them together.
#[test]
fn disjoint_witnesses_break_intertwinedness() {
    let result = check_validity(|tvl| {
        let p = tvl.var("p");
        let q = tvl.var("q");
        let r = tvl.var("r");
        let s = tvl.var("s");
        let np = tvl.not(p);
        let nq = tvl.not(q);
        let nr = tvl.not(r);
        let ns = tvl.not(s);
        let axioms = [
            tvl.dimp(r, p),
            tvl.dimp(nr, np),
            tvl.dimp(s, q),
            tvl.dimp(ns, nq),
        ];
        let closed_ax = tvl.and_all(&axioms);
        let agree = agreement(tvl, p, q);
        tvl.dimp(closed_ax, agree)
    });
    assert_eq!(result, ValidityResult::Invalid);
}

fn agreement(tvl: &mut Tvl, p: TvlId, q: TvlId) -> TvlId {
    let both = tvl.and(p, q);
    let np = tvl.not(p);
    let nq = tvl.not(q);
    let neither = tvl.and(np, nq);
    tvl.or(both, neither)
}

#[test]
fn hash_consing_shares_subformulas() {
    let mut tvl = Tvl::new();
    let p1 = tvl.var("p");
    let p2 = tvl.var("p");
    assert_eq!(p1, p2);
    let q = tvl.var("q");
    let a1 = tvl.and(p1, q);
    let a2 = tvl.and(p2, q);
    assert_eq!(a1, a2);
}

#[test]
fn local_simplifications() {
    let mut tvl = Tvl::new();
    let p = tvl.var("p");
    let np = tvl.not(p);
    assert_eq!(tvl.not(np), p);
    let dp = tvl.diamond(p);
    assert_eq!(tvl.diamond(dp), dp);
    let f = tvl.constant_false();
    assert_eq!(tvl.or(p, f), p);
    assert_eq!(tvl.and(p, f), f);
}

/// Diamond is not the identity: ◇p is valid-equivalent to p being
/// designated, and □ strictly strengthens it.
#[test]
fn diamond_and_box_differ() {
    // ◇p ∨ ¬◇p is valid (◇ projects to a classical value)
    let result = check_validity(|tvl| {
        let p = tvl.var("p");
        let dp = tvl.diamond(p);
        let ndp = tvl.not(dp);
        tvl.or(dp, ndp)
    });
    assert_eq!(result, ValidityResult::Valid);
    // p ∨ ¬p is also valid in this logic (B is designated)
    let result = check_validity(|tvl| {
        let p = tvl.var("p");
        let np = tvl.not(p);
        tvl.or(p, np)
    });
    assert_eq!(result, ValidityResult::Valid);
    // but □p is satisfiable while □p ∧ ¬p is not: □ rules out B
    let result = check_satisfiability(|tvl| {
        let p = tvl.var("p");
        let bp = tvl.boxed(p);
        let np = tvl.not(p);
        tvl.and(bp, np)
    });
    assert!(matches!(result, SatResult::Unsat));
    let result = check_satisfiability(|tvl| {
        let p = tvl.var("p");
        tvl.boxed(p)
    });
    assert!(matches!(result, SatResult::Sat(_)));
}
