use std::collections::HashMap;

/// A named classical propositional variable, interned in an [`AtomTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom(pub(crate) u32);

/// Interner for classical variable names. Translators derive names from the
/// identity of whatever they are encoding, so translating the same structure
/// twice yields the same atoms.
#[derive(Debug, Default)]
pub struct AtomTable {
    names: Vec<String>,
    dedup: HashMap<String, Atom>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&mut self, name: &str) -> Atom {
        if let Some(&a) = self.dedup.get(name) {
            return a;
        }
        let a = Atom(self.names.len() as u32);
        self.names.push(name.to_string());
        self.dedup.insert(name.to_string(), a);
        a
    }

    pub fn name(&self, a: Atom) -> &str {
        &self.names[a.0 as usize]
    }

    pub fn atoms(&self) -> impl Iterator<Item = Atom> {
        (0..self.names.len() as u32).map(Atom)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Classical propositional formulas. This is the only formula type the
/// solver adapter accepts; connectives are n-ary so that large conjunctions
/// stay flat instead of growing a deep spine.
#[derive(Clone, Debug, PartialEq)]
pub enum Prop {
    Var(Atom),
    Not(Box<Prop>),
    And(Vec<Prop>),
    Or(Vec<Prop>),
    Implies(Box<Prop>, Box<Prop>),
}

impl Prop {
    pub fn var(a: Atom) -> Self {
        Prop::Var(a)
    }

    pub fn not(p: Prop) -> Self {
        Prop::Not(Box::new(p))
    }

    pub fn implies(antecedent: Prop, consequent: Prop) -> Self {
        Prop::Implies(Box::new(antecedent), Box::new(consequent))
    }
}
