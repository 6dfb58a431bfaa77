//! The solver adapter: classical satisfiability, validity and weighted
//! MaxSAT over [`Prop`] formulas. Nothing outside this module touches solver
//! types; formulas are converted to CNF here via the Tseitin transformation
//! and handed to `batsat`.

use batsat::{interface::SolveResult, lbool, theory, Lit, Solver, SolverInterface};
use log::{trace, warn};
use std::collections::HashMap;

use crate::limits::Deadline;
use crate::prop::{Atom, AtomTable, Prop};

/// A model as a map from atoms to truth values. Atoms the solver never saw
/// read as false.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    values: HashMap<Atom, bool>,
}

impl Assignment {
    pub fn is_true(&self, a: Atom) -> bool {
        self.values.get(&a).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub enum SatResult {
    Sat(Assignment),
    Unsat,
    /// The deadline expired or the solver gave up.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidityResult {
    Valid,
    Invalid,
    Unknown,
}

#[derive(Debug, Clone)]
pub enum MaxSatResult {
    /// A model satisfying all hard constraints and a maximum-weight subset
    /// of the soft ones.
    Optimal(Assignment),
    /// The hard constraints alone are unsatisfiable.
    Unsat,
    Unknown,
}

/// Raised internally when the deadline fires during CNF construction.
struct Expired;

struct CnfBuilder {
    solver: Solver<Deadline>,
    deadline: Deadline,
    atom_lits: HashMap<Atom, Lit>,
}

impl CnfBuilder {
    fn new(deadline: &Deadline) -> Self {
        CnfBuilder {
            solver: Solver::new(Default::default(), deadline.clone()),
            deadline: deadline.clone(),
            atom_lits: HashMap::new(),
        }
    }

    fn fresh(&mut self) -> Lit {
        Lit::new(self.solver.new_var_default(), true)
    }

    fn atom_lit(&mut self, a: Atom) -> Lit {
        if let Some(&l) = self.atom_lits.get(&a) {
            return l;
        }
        let l = Lit::new(self.solver.new_var_default(), true);
        self.atom_lits.insert(a, l);
        l
    }

    fn add_clause(&mut self, clause: &mut Vec<Lit>) -> Result<(), Expired> {
        if self.deadline.expired() {
            return Err(Expired);
        }
        self.solver.add_clause_reuse(clause);
        Ok(())
    }

    /// Returns a literal equivalent to `f`, introducing one fresh
    /// proposition per connective.
    fn tseitin(&mut self, f: &Prop) -> Result<Lit, Expired> {
        match f {
            Prop::Var(a) => Ok(self.atom_lit(*a)),
            Prop::Not(p) => Ok(!self.tseitin(p)?),
            Prop::And(children) => {
                let lits = children
                    .iter()
                    .map(|c| self.tseitin(c))
                    .collect::<Result<Vec<_>, _>>()?;
                let gate = self.fresh();
                if lits.is_empty() {
                    // empty conjunction is true
                    self.add_clause(&mut vec![gate])?;
                    return Ok(gate);
                }
                let mut long = Vec::with_capacity(lits.len() + 1);
                long.push(gate);
                for &l in &lits {
                    self.add_clause(&mut vec![!gate, l])?;
                    long.push(!l);
                }
                self.add_clause(&mut long)?;
                Ok(gate)
            }
            Prop::Or(children) => {
                let lits = children
                    .iter()
                    .map(|c| self.tseitin(c))
                    .collect::<Result<Vec<_>, _>>()?;
                let gate = self.fresh();
                if lits.is_empty() {
                    // empty disjunction is false
                    self.add_clause(&mut vec![!gate])?;
                    return Ok(gate);
                }
                let mut long = Vec::with_capacity(lits.len() + 1);
                long.push(!gate);
                for &l in &lits {
                    self.add_clause(&mut vec![gate, !l])?;
                    long.push(l);
                }
                self.add_clause(&mut long)?;
                Ok(gate)
            }
            Prop::Implies(a, b) => {
                let la = self.tseitin(a)?;
                let lb = self.tseitin(b)?;
                let gate = self.fresh();
                self.add_clause(&mut vec![!gate, !la, lb])?;
                self.add_clause(&mut vec![gate, la])?;
                self.add_clause(&mut vec![gate, !lb])?;
                Ok(gate)
            }
        }
    }

    /// Unary counter over `inputs` (Bailleux-Boutilier): output k (1-based)
    /// is implied whenever at least k inputs are true, so assuming ¬output_k
    /// caps the count at k-1. Duplicated inputs count with multiplicity.
    fn totalizer(&mut self, inputs: &[Lit]) -> Result<Vec<Lit>, Expired> {
        if inputs.len() <= 1 {
            return Ok(inputs.to_vec());
        }
        let (l, r) = inputs.split_at(inputs.len() / 2);
        let left = self.totalizer(l)?;
        let right = self.totalizer(r)?;
        let out: Vec<Lit> = (0..left.len() + right.len()).map(|_| self.fresh()).collect();
        for i in 0..=left.len() {
            for j in 0..=right.len() {
                if i + j == 0 {
                    continue;
                }
                let mut clause = Vec::with_capacity(3);
                if i > 0 {
                    clause.push(!left[i - 1]);
                }
                if j > 0 {
                    clause.push(!right[j - 1]);
                }
                clause.push(out[i + j - 1]);
                self.add_clause(&mut clause)?;
            }
        }
        Ok(out)
    }

    fn solve(&mut self, assumptions: &[Lit]) -> SatResult {
        let mut th = theory::EmptyTheory::new();
        let CnfBuilder {
            solver, atom_lits, ..
        } = self;
        let result = match solver.solve_limited_th_full(&mut th, assumptions) {
            SolveResult::Sat(model) => {
                let values = atom_lits
                    .iter()
                    .map(|(&a, &l)| (a, model.value_lit(l) == lbool::TRUE))
                    .collect();
                SatResult::Sat(Assignment { values })
            }
            SolveResult::Unsat(_) => SatResult::Unsat,
            SolveResult::Unknown(_) => SatResult::Unknown,
        };
        result
    }
}

pub fn is_sat(formula: &Prop, atoms: &AtomTable, deadline: &Deadline) -> SatResult {
    let mut builder = CnfBuilder::new(deadline);
    let root = match builder.tseitin(formula) {
        Ok(l) => l,
        Err(Expired) => return SatResult::Unknown,
    };
    if builder.add_clause(&mut vec![root]).is_err() {
        return SatResult::Unknown;
    }
    trace!(
        target: "FBA",
        "is_sat: {} atoms, {} solver vars, {} clauses",
        atoms.len(),
        builder.solver.num_vars(),
        builder.solver.num_clauses()
    );
    builder.solve(&[])
}

pub fn is_valid(formula: &Prop, atoms: &AtomTable, deadline: &Deadline) -> ValidityResult {
    match is_sat(&Prop::not(formula.clone()), atoms, deadline) {
        SatResult::Sat(_) => ValidityResult::Invalid,
        SatResult::Unsat => ValidityResult::Valid,
        SatResult::Unknown => ValidityResult::Unknown,
    }
}

/// Weighted MaxSAT: find a model of all of `hard` violating a minimum total
/// weight of `soft` clauses. Works by relaxing each soft clause, counting
/// the relaxation literals with a totalizer (a weight-w clause feeds the
/// counter w times), and tightening the admissible count with solver
/// assumptions until the instance becomes unsatisfiable.
pub fn maximize(
    hard: &[Prop],
    soft: &[Prop],
    weights: &[u32],
    atoms: &AtomTable,
    deadline: &Deadline,
) -> MaxSatResult {
    debug_assert_eq!(soft.len(), weights.len());
    let mut builder = CnfBuilder::new(deadline);

    let built = (|| -> Result<Vec<Lit>, Expired> {
        for h in hard {
            let root = builder.tseitin(h)?;
            builder.add_clause(&mut vec![root])?;
        }
        let mut counter_inputs = Vec::new();
        for (s, &w) in soft.iter().zip(weights) {
            let relax = builder.fresh();
            let root = builder.tseitin(s)?;
            builder.add_clause(&mut vec![root, relax])?;
            for _ in 0..w {
                counter_inputs.push(relax);
            }
        }
        builder.totalizer(&counter_inputs)
    })();
    let outputs = match built {
        Ok(o) => o,
        Err(Expired) => return MaxSatResult::Unknown,
    };

    trace!(
        target: "FBA",
        "maximize: {} hard, {} soft ({} weighted), {} atoms, {} vars, {} clauses",
        hard.len(),
        soft.len(),
        outputs.len(),
        atoms.len(),
        builder.solver.num_vars(),
        builder.solver.num_clauses()
    );

    let mut best: Option<(Assignment, usize)> = None;
    loop {
        let assumptions = match &best {
            None => vec![],
            Some((_, 0)) => break,
            Some((_, violations)) => vec![!outputs[violations - 1]],
        };
        match builder.solve(&assumptions) {
            SatResult::Sat(assignment) => {
                let violations = count_violations(soft, weights, &assignment);
                trace!(target: "FBA", "maximize: model with violation weight {}", violations);
                best = Some((assignment, violations));
                if violations == 0 {
                    break;
                }
            }
            SatResult::Unsat => break,
            SatResult::Unknown => match best {
                None => return MaxSatResult::Unknown,
                Some(_) => {
                    warn!(target: "FBA", "maximize interrupted, returning incumbent model");
                    break;
                }
            },
        }
    }
    match best {
        Some((assignment, _)) => MaxSatResult::Optimal(assignment),
        None => MaxSatResult::Unsat,
    }
}

fn count_violations(soft: &[Prop], weights: &[u32], assignment: &Assignment) -> usize {
    soft.iter()
        .zip(weights)
        .filter(|(clause, _)| !eval(clause, assignment))
        .map(|(_, &w)| w as usize)
        .sum()
}

fn eval(f: &Prop, assignment: &Assignment) -> bool {
    match f {
        Prop::Var(a) => assignment.is_true(*a),
        Prop::Not(p) => !eval(p, assignment),
        Prop::And(children) => children.iter().all(|c| eval(c, assignment)),
        Prop::Or(children) => children.iter().any(|c| eval(c, assignment)),
        Prop::Implies(a, b) => !eval(a, assignment) || eval(b, assignment),
    }
}
