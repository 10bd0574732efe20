//! Comparison operators of filter predicates.

use std::fmt;
use std::str::FromStr;

use recordset_core::Error;

/// A comparison operator between a field and a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=` (`IS NULL` against NULL)
    Equals,
    /// `!=` (`IS NOT NULL` against NULL)
    NotEquals,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    Lower,
    /// `<=`
    LowerOrEqual,
    /// `LIKE` with a caller-supplied pattern
    Like,
    /// Case-insensitive `LIKE`
    ILike,
    /// `NOT LIKE`
    NotLike,
    /// Substring match (`LIKE '%value%'`)
    Contains,
    /// Negated substring match
    NotContains,
    /// Membership in a list
    In,
    /// Non-membership in a list
    NotIn,
}

impl Operator {
    /// Canonical textual form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Lower => "<",
            Operator::LowerOrEqual => "<=",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::NotLike => "not like",
            Operator::Contains => "contains",
            Operator::NotContains => "not contains",
            Operator::In => "in",
            Operator::NotIn => "not in",
        }
    }

    /// For negative operators, the positive operator they negate.
    #[must_use]
    pub const fn positive(&self) -> Option<Operator> {
        match self {
            Operator::NotEquals => Some(Operator::Equals),
            Operator::NotLike => Some(Operator::Like),
            Operator::NotContains => Some(Operator::Contains),
            Operator::NotIn => Some(Operator::In),
            _ => None,
        }
    }

    /// Whether the operator compares against a list of values.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_lowercase().as_str() {
            "=" | "==" => Ok(Operator::Equals),
            "!=" | "<>" => Ok(Operator::NotEquals),
            ">" => Ok(Operator::Greater),
            ">=" => Ok(Operator::GreaterOrEqual),
            "<" => Ok(Operator::Lower),
            "<=" => Ok(Operator::LowerOrEqual),
            "like" | "=like" => Ok(Operator::Like),
            "ilike" | "=ilike" => Ok(Operator::ILike),
            "not like" => Ok(Operator::NotLike),
            "contains" => Ok(Operator::Contains),
            "not contains" => Ok(Operator::NotContains),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            _ => Err(Error::InvalidOperator(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operators() {
        assert_eq!("=".parse::<Operator>().unwrap(), Operator::Equals);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::NotEquals);
        assert_eq!("NOT   IN".parse::<Operator>().unwrap(), Operator::NotIn);
        assert_eq!("ILike".parse::<Operator>().unwrap(), Operator::ILike);
        assert!(matches!(
            "~=".parse::<Operator>(),
            Err(Error::InvalidOperator(op)) if op == "~="
        ));
    }

    #[test]
    fn test_positive_form() {
        assert_eq!(Operator::NotIn.positive(), Some(Operator::In));
        assert_eq!(Operator::Greater.positive(), None);
        assert!(Operator::In.is_multi());
    }

    #[test]
    fn test_display_round_trip() {
        for op in [Operator::NotContains, Operator::LowerOrEqual, Operator::ILike] {
            assert_eq!(op.to_string().parse::<Operator>().unwrap(), op);
        }
    }
}
