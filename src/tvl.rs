//! Three-valued paraconsistent logic over the truth values T, B and F, where
//! B ("both") is designated alongside T. Formulas live in an arena that
//! hash-conses structurally equal subformulas, and validity/satisfiability
//! questions are answered by translating the arena's truth tables into
//! classical propositional logic.

use std::collections::HashMap;

use crate::prop::{Atom, AtomTable, Prop};

/// Handle to a formula in a [`Tvl`] arena. Children always have smaller ids
/// than their parents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TvlId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct SymId(u32);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TvlNode {
    /// The constant F.
    False,
    Var(SymId),
    Not(TvlId),
    And(TvlId, TvlId),
    Or(TvlId, TvlId),
    /// ◇: projects "at least true" (T and B map to T, F maps to F).
    Diamond(TvlId),
}

/// Formula arena. Constructors intern nodes and apply the local rewrites
/// that hold in all three-valued assignments: double negation, idempotent ◇,
/// and the unit/absorption laws of the constant F.
#[derive(Debug, Default)]
pub struct Tvl {
    nodes: Vec<TvlNode>,
    dedup: HashMap<TvlNode, TvlId>,
    sym_names: Vec<String>,
    sym_dedup: HashMap<String, SymId>,
}

impl Tvl {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, node: TvlNode) -> TvlId {
        if let Some(&id) = self.dedup.get(&node) {
            return id;
        }
        let id = TvlId(self.nodes.len() as u32);
        self.nodes.push(node.clone());
        self.dedup.insert(node, id);
        id
    }

    fn node(&self, id: TvlId) -> &TvlNode {
        &self.nodes[id.0 as usize]
    }

    pub fn var(&mut self, name: &str) -> TvlId {
        let sym = if let Some(&s) = self.sym_dedup.get(name) {
            s
        } else {
            let s = SymId(self.sym_names.len() as u32);
            self.sym_names.push(name.to_string());
            self.sym_dedup.insert(name.to_string(), s);
            s
        };
        self.intern(TvlNode::Var(sym))
    }

    pub fn constant_false(&mut self) -> TvlId {
        self.intern(TvlNode::False)
    }

    pub fn not(&mut self, x: TvlId) -> TvlId {
        if let TvlNode::Not(inner) = *self.node(x) {
            return inner;
        }
        self.intern(TvlNode::Not(x))
    }

    pub fn and(&mut self, a: TvlId, b: TvlId) -> TvlId {
        if matches!(self.node(a), TvlNode::False) {
            return a;
        }
        if matches!(self.node(b), TvlNode::False) {
            return b;
        }
        self.intern(TvlNode::And(a, b))
    }

    pub fn or(&mut self, a: TvlId, b: TvlId) -> TvlId {
        if matches!(self.node(a), TvlNode::False) {
            return b;
        }
        if matches!(self.node(b), TvlNode::False) {
            return a;
        }
        self.intern(TvlNode::Or(a, b))
    }

    pub fn diamond(&mut self, x: TvlId) -> TvlId {
        if matches!(self.node(x), TvlNode::Diamond(_) | TvlNode::False) {
            return x;
        }
        self.intern(TvlNode::Diamond(x))
    }

    /// "Curly" implication: ¬x ∨ y.
    pub fn cimp(&mut self, x: TvlId, y: TvlId) -> TvlId {
        let nx = self.not(x);
        self.or(nx, y)
    }

    /// "Double" implication ◇x ⥽ y, the implication used by the closure
    /// axioms: it fires whenever x is designated (T or B).
    pub fn dimp(&mut self, x: TvlId, y: TvlId) -> TvlId {
        let dx = self.diamond(x);
        self.cimp(dx, y)
    }

    /// □x := (¬x ⟹_D F).
    pub fn boxed(&mut self, x: TvlId) -> TvlId {
        let nx = self.not(x);
        let f = self.constant_false();
        self.dimp(nx, f)
    }

    pub fn and_all(&mut self, xs: &[TvlId]) -> TvlId {
        assert!(!xs.is_empty());
        xs[1..].iter().fold(xs[0], |acc, &x| self.and(acc, x))
    }

    pub fn or_all(&mut self, xs: &[TvlId]) -> TvlId {
        assert!(!xs.is_empty());
        xs[1..].iter().fold(xs[0], |acc, &x| self.or(acc, x))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A classical formula that is valid iff `root` is three-valued-valid
    /// (i.e. designated under every assignment).
    pub fn translate_for_validity(&self, root: TvlId, atoms: &mut AtomTable) -> Prop {
        let (constraints, root_tb) = self.encode_tables(root, atoms);
        Prop::implies(Prop::And(constraints), Prop::Var(root_tb))
    }

    /// A classical formula that is satisfiable iff `root` is
    /// three-valued-satisfiable (designated under some assignment).
    pub fn translate_for_satisfiability(&self, root: TvlId, atoms: &mut AtomTable) -> Prop {
        let (mut constraints, root_tb) = self.encode_tables(root, atoms);
        constraints.push(Prop::Var(root_tb));
        Prop::And(constraints)
    }

    /// Associates to every reachable subformula two classical variables,
    /// is_TB ("value is T or B") and is_FB ("value is F or B"), and collects
    /// the constraints pinning them to the connective truth tables. Returns
    /// the constraints and the is_TB variable of `root`.
    ///
    /// Walks the arena in id order instead of recursing, so conjunction
    /// spines of any depth are fine.
    fn encode_tables(&self, root: TvlId, atoms: &mut AtomTable) -> (Vec<Prop>, Atom) {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if reachable[id.0 as usize] {
                continue;
            }
            reachable[id.0 as usize] = true;
            match *self.node(id) {
                TvlNode::False | TvlNode::Var(_) => {}
                TvlNode::Not(x) | TvlNode::Diamond(x) => stack.push(x),
                TvlNode::And(a, b) | TvlNode::Or(a, b) => {
                    stack.push(a);
                    stack.push(b);
                }
            }
        }

        let pairs: Vec<(Atom, Atom)> = (0..self.nodes.len())
            .map(|i| {
                (
                    atoms.atom(&format!("is_TB(#{})", i)),
                    atoms.atom(&format!("is_FB(#{})", i)),
                )
            })
            .collect();
        let pair = |id: TvlId| pairs[id.0 as usize];

        let mut constraints = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if !reachable[i] {
                continue;
            }
            let me = pair(TvlId(i as u32));
            // No fourth truth value: every subformula is T, B or F.
            constraints.push(Prop::Or(vec![Prop::var(me.0), Prop::var(me.1)]));
            match *node {
                TvlNode::False => {
                    constraints.push(Prop::And(vec![
                        Prop::not(Prop::var(me.0)),
                        Prop::var(me.1),
                    ]));
                }
                TvlNode::Var(_) => {}
                TvlNode::Not(x) => {
                    let c = pair(x);
                    constraints.push(Prop::And(vec![
                        Prop::implies(is_t(c), is_f(me)),
                        Prop::implies(is_b(c), is_b(me)),
                        Prop::implies(is_f(c), is_t(me)),
                    ]));
                }
                TvlNode::Diamond(x) => {
                    let c = pair(x);
                    constraints.push(Prop::And(vec![
                        Prop::implies(is_t(c), is_t(me)),
                        Prop::implies(is_b(c), is_t(me)),
                        Prop::implies(is_f(c), is_f(me)),
                    ]));
                }
                TvlNode::And(a, b) => {
                    let (l, r) = (pair(a), pair(b));
                    constraints.push(truth_table(l, r, me, AND_TABLE));
                }
                TvlNode::Or(a, b) => {
                    let (l, r) = (pair(a), pair(b));
                    constraints.push(truth_table(l, r, me, OR_TABLE));
                }
            }
        }
        (constraints, pair(root).0)
    }
}

#[derive(Clone, Copy)]
enum Tv {
    T,
    B,
    F,
}

// Rows and columns ordered T, B, F.
const AND_TABLE: [[Tv; 3]; 3] = [
    [Tv::T, Tv::B, Tv::F],
    [Tv::B, Tv::B, Tv::F],
    [Tv::F, Tv::F, Tv::F],
];
const OR_TABLE: [[Tv; 3]; 3] = [
    [Tv::T, Tv::T, Tv::T],
    [Tv::T, Tv::B, Tv::B],
    [Tv::T, Tv::B, Tv::F],
];

fn is_t(p: (Atom, Atom)) -> Prop {
    Prop::And(vec![Prop::var(p.0), Prop::not(Prop::var(p.1))])
}

fn is_b(p: (Atom, Atom)) -> Prop {
    Prop::And(vec![Prop::var(p.0), Prop::var(p.1)])
}

fn is_f(p: (Atom, Atom)) -> Prop {
    Prop::And(vec![Prop::not(Prop::var(p.0)), Prop::var(p.1)])
}

fn value_of(p: (Atom, Atom), v: Tv) -> Prop {
    match v {
        Tv::T => is_t(p),
        Tv::B => is_b(p),
        Tv::F => is_f(p),
    }
}

/// One implication per cell of a binary connective's table.
fn truth_table(l: (Atom, Atom), r: (Atom, Atom), me: (Atom, Atom), table: [[Tv; 3]; 3]) -> Prop {
    let values = [Tv::T, Tv::B, Tv::F];
    let mut cells = Vec::with_capacity(9);
    for (i, &lv) in values.iter().enumerate() {
        for (j, &rv) in values.iter().enumerate() {
            cells.push(Prop::implies(
                Prop::And(vec![value_of(l, lv), value_of(r, rv)]),
                value_of(me, table[i][j]),
            ));
        }
    }
    Prop::And(cells)
}
