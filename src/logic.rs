//! Literals and clauses.

use std::ops::{BitOr, BitOrAssign, Not};

use itertools::Itertools;
use varisat::{Lit, Var};

/// Dense id of a Boolean variable, starting at 0.
pub type VarId = usize;

/// A Boolean variable or its negation.
///
/// Negating a literal flips `negated` and keeps `var`; two literals refer to the same variable iff their `var`s match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    /// The variable.
    pub var: VarId,
    /// Whether this is the variable's negation.
    pub negated: bool,
}

impl Literal {
    /// The non-negated literal of `var`.
    #[inline]
    pub fn positive(var: VarId) -> Self {
        Self { var, negated: false }
    }

    /// Whether this literal holds under `assignment`, which has one entry per variable.
    #[inline]
    pub fn holds(&self, assignment: &[bool]) -> bool {
        assignment[self.var] != self.negated
    }
}

impl Not for Literal {
    type Output = Literal;

    #[inline]
    fn not(self) -> Self::Output {
        Self { var: self.var, negated: !self.negated }
    }
}

impl From<Literal> for Lit {
    fn from(value: Literal) -> Self {
        Var::from_index(value.var).lit(!value.negated)
    }
}

/// A disjunction of literals. Literal order is insertion order and carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    /// The literals, in insertion order.
    #[inline]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Number of literals.
    #[inline]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Whether the clause has no literals, and so can never hold.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Append `literal` to the disjunction.
    #[inline]
    pub fn push(&mut self, literal: Literal) -> &mut Self {
        self.literals.push(literal);
        self
    }

    /// Whether at least one literal holds under `assignment`.
    pub fn satisfied_by(&self, assignment: &[bool]) -> bool {
        self.literals.iter().any(|lit| lit.holds(assignment))
    }
}

impl From<Literal> for Clause {
    fn from(value: Literal) -> Self {
        Self { literals: vec![value] }
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self { literals: iter.into_iter().collect_vec() }
    }
}

impl BitOr for Literal {
    type Output = Clause;

    fn bitor(self, rhs: Literal) -> Self::Output {
        Clause { literals: vec![self, rhs] }
    }
}

impl BitOr<Literal> for Clause {
    type Output = Clause;

    fn bitor(mut self, rhs: Literal) -> Self::Output {
        self.literals.push(rhs);
        self
    }
}

impl BitOrAssign<Literal> for Clause {
    fn bitor_assign(&mut self, rhs: Literal) {
        self.literals.push(rhs);
    }
}

/// Clauses asserting that no two of `lits` hold together; `(!A + !B) * (!A + !C) * ...`
pub(crate) fn at_most_one(lits: &[Literal]) -> impl Iterator<Item = Clause> + '_ {
    lits.iter()
        .tuple_combinations()
        .map(|(a, b)| !*a | !*b)
}
