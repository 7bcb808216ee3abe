//! Display conditions of the form `<key> <operator> <value>`

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static DEPENDENCY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\s*([!=<>]+)\s*([\w-]+)$").expect("dependency pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Operator {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// True for `==` and `!=`, the only operators defined for unordered values
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }

    /// Apply the operator as `current <op> expected`
    pub fn compare<T: PartialOrd + ?Sized>(self, current: &T, expected: &T) -> bool {
        match self {
            Self::Eq => current == expected,
            Self::Ne => current != expected,
            Self::Lt => current < expected,
            Self::Le => current <= expected,
            Self::Gt => current > expected,
            Self::Ge => current >= expected,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition attached to a dependent preference, checked against the current
/// value of the preference named by `key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub key: String,
    pub operator: Operator,
    pub value: String,
    /// Result of the last evaluation by the owning group
    pub passed: bool,
}

impl Dependency {
    pub fn new(key: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
            passed: true,
        }
    }

    /// Parse an expression; anything outside the grammar is "no dependency".
    /// The whole text must match, so surrounding whitespace is rejected.
    pub fn parse(expression: &str) -> Option<Self> {
        let Some(captures) = DEPENDENCY_PATTERN.captures(expression) else {
            if !expression.is_empty() {
                debug!(expression = %expression, "Ignoring unparseable dependency expression");
            }
            return None;
        };

        let Some(operator) = Operator::parse(&captures[2]) else {
            debug!(expression = %expression, operator = &captures[2], "Ignoring unknown dependency operator");
            return None;
        };

        Some(Self::new(&captures[1], operator, &captures[3]))
    }

    /// Expected value as a boolean (only a case-insensitive `true` is true)
    pub fn value_as_bool(&self) -> bool {
        self.value.eq_ignore_ascii_case("true")
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.operator, self.value)
    }
}
