//! Boolean filter expressions.
//!
//! A [`Condition`] is an immutable list of predicates joined left to right by
//! `AND` / `OR`; each predicate is either a `field operator value` triple or a
//! nested condition, optionally negated. Every combinator returns a new
//! condition and leaves the receiver untouched.

use recordset_core::Value;

use crate::operator::Operator;

/// How a predicate joins the predicates before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Connector {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// The body of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// `field operator value`
    Compare {
        /// Field name, column or dotted path.
        field: String,
        /// Comparison operator.
        operator: Operator,
        /// Right-hand value.
        value: Value,
    },
    /// A nested condition, compiled in parentheses.
    Group(Condition),
}

/// One predicate of a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Connector to the preceding predicates (ignored for the first one).
    pub connector: Connector,
    /// Whether the term is negated.
    pub negate: bool,
    /// The term itself.
    pub term: Term,
}

/// An immutable boolean expression over field/operator/value triples.
///
/// # Example
///
/// ```
/// use recordset_query::{Condition, Operator};
///
/// let adults = Condition::new().and("age", Operator::GreaterOrEqual, 18);
/// let named = Condition::new()
///     .and("name", Operator::Like, "A%")
///     .or("name", Operator::Like, "B%");
/// let cond = adults.and_cond(&named);
/// assert_eq!(cond.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    predicates: Vec<Predicate>,
}

impl Condition {
    /// The empty condition, matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether there are no predicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Number of top-level predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Top-level predicates in order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    fn push(&self, connector: Connector, negate: bool, term: Term) -> Self {
        let mut next = self.clone();
        next.predicates.push(Predicate {
            connector,
            negate,
            term,
        });
        next
    }

    fn compare(field: &str, operator: Operator, value: impl Into<Value>) -> Term {
        Term::Compare {
            field: field.to_string(),
            operator,
            value: value.into(),
        }
    }

    /// `self AND field op value`
    #[must_use]
    pub fn and(&self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(Connector::And, false, Self::compare(field, operator, value))
    }

    /// `self AND NOT (field op value)`
    #[must_use]
    pub fn and_not(&self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(Connector::And, true, Self::compare(field, operator, value))
    }

    /// `self OR field op value`
    #[must_use]
    pub fn or(&self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(Connector::Or, false, Self::compare(field, operator, value))
    }

    /// `self OR NOT (field op value)`
    #[must_use]
    pub fn or_not(&self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(Connector::Or, true, Self::compare(field, operator, value))
    }

    /// `self AND (other)`. An empty `other` leaves the condition unchanged.
    #[must_use]
    pub fn and_cond(&self, other: &Condition) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        self.push(Connector::And, false, Term::Group(other.clone()))
    }

    /// `self AND NOT (other)`.
    #[must_use]
    pub fn and_not_cond(&self, other: &Condition) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        self.push(Connector::And, true, Term::Group(other.clone()))
    }

    /// `self OR (other)`.
    #[must_use]
    pub fn or_cond(&self, other: &Condition) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        self.push(Connector::Or, false, Term::Group(other.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinators_do_not_mutate_receiver() {
        let base = Condition::new().and("name", Operator::Equals, "Alice");
        let narrowed = base.and("age", Operator::Greater, 18);
        assert_eq!(base.len(), 1);
        assert_eq!(narrowed.len(), 2);
    }

    #[test]
    fn test_negation_and_connectors() {
        let cond = Condition::new()
            .and("a", Operator::Equals, 1)
            .or_not("b", Operator::Equals, 2);
        let p = &cond.predicates()[1];
        assert_eq!(p.connector, Connector::Or);
        assert!(p.negate);
    }

    #[test]
    fn test_empty_subcondition_is_ignored() {
        let cond = Condition::new().and("a", Operator::Equals, 1);
        assert_eq!(cond.and_cond(&Condition::new()), cond);
        assert_eq!(cond.or_cond(&Condition::new()).len(), 1);
    }
}
