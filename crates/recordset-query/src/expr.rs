//! Validation of field-path, ordering and grouping expressions.
//!
//! Order and group expressions are plain strings supplied by callers
//! (`"name DESC"`, `"profile_id.age"`). They are parsed against fixed
//! patterns before anything reaches statement text.

use std::fmt;
use std::sync::OnceLock;

use recordset_core::{Error, Result};
use regex::Regex;

const PATH_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*$";
const ORDER_PATTERN: &str =
    r"^\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)(?:\s+((?i)asc|desc))?\s*$";

fn path_regex() -> Option<&'static Regex> {
    static PATH: OnceLock<Option<Regex>> = OnceLock::new();
    PATH.get_or_init(|| Regex::new(PATH_PATTERN).ok()).as_ref()
}

fn order_regex() -> Option<&'static Regex> {
    static ORDER: OnceLock<Option<Regex>> = OnceLock::new();
    ORDER.get_or_init(|| Regex::new(ORDER_PATTERN).ok()).as_ref()
}

/// Sort direction of an order expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending (default)
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A parsed `path [ASC|DESC]` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderExpr {
    /// Field path.
    pub path: String,
    /// Direction.
    pub direction: Direction,
}

/// Check that `path` is a dotted sequence of identifiers.
pub fn validate_path(path: &str) -> Result<()> {
    let regex = path_regex()
        .ok_or_else(|| Error::invalid_expression(path, "path pattern failed to compile"))?;
    if regex.is_match(path) {
        Ok(())
    } else {
        Err(Error::invalid_expression(path, "not a field path"))
    }
}

/// Parse an ordering expression.
pub fn parse_order(expression: &str) -> Result<OrderExpr> {
    let regex = order_regex()
        .ok_or_else(|| Error::invalid_expression(expression, "order pattern failed to compile"))?;
    let caps = regex
        .captures(expression)
        .ok_or_else(|| Error::invalid_expression(expression, "expected `field [ASC|DESC]`"))?;
    let path = caps
        .get(1)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::invalid_expression(expression, "missing field path"))?;
    let direction = match caps.get(2) {
        Some(m) if m.as_str().eq_ignore_ascii_case("desc") => Direction::Desc,
        _ => Direction::Asc,
    };
    Ok(OrderExpr { path, direction })
}

/// Parse a grouping expression (a bare field path).
pub fn parse_group(expression: &str) -> Result<String> {
    let trimmed = expression.trim();
    validate_path(trimmed)?;
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_directions() {
        assert_eq!(
            parse_order("name").unwrap(),
            OrderExpr {
                path: "name".into(),
                direction: Direction::Asc
            }
        );
        let desc = parse_order("  profile_id.age   desc ").unwrap();
        assert_eq!(desc.path, "profile_id.age");
        assert_eq!(desc.direction, Direction::Desc);
    }

    #[test]
    fn test_rejects_injection() {
        assert!(parse_order("name; DROP TABLE users").is_err());
        assert!(parse_order("name DESC, id").is_err());
        assert!(parse_group("lower(name)").is_err());
        assert!(validate_path("a..b").is_err());
        assert!(validate_path("").is_err());
    }

    #[test]
    fn test_group_is_trimmed() {
        assert_eq!(parse_group(" email ").unwrap(), "email");
    }
}
