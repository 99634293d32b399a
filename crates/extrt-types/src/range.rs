//! Disjunctive version constraint ranges (spec §3 "RangeSet / Constraint").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::version::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Operator {
    fn matches(self, candidate: &Version, bound: &Version) -> bool {
        match self {
            Operator::Lt => candidate < bound,
            Operator::Le => candidate <= bound,
            Operator::Gt => candidate > bound,
            Operator::Ge => candidate >= bound,
            Operator::Eq => candidate == bound,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Eq => "=",
        }
    }
}

/// A single comparator: an operator paired with the version it compares
/// against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparator {
    pub operator: Operator,
    pub version: Version,
}

/// A conjunction of comparators — all must match a candidate version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint(pub Vec<Comparator>);

impl Constraint {
    /// `self` matches `candidate` if every comparator matches, subject to
    /// the prerelease opt-in rule (spec §3): if `candidate` is a
    /// prerelease, at least one comparator in this conjunction must name
    /// the same (major, minor, patch) with its own prerelease tag.
    pub fn matches(&self, candidate: &Version) -> bool {
        if self.0.is_empty() {
            return true;
        }
        if !self.0.iter().all(|c| c.operator.matches(candidate, &c.version)) {
            return false;
        }
        if candidate.is_prerelease() {
            return self
                .0
                .iter()
                .any(|c| c.version.is_prerelease() && c.version.same_release(candidate));
        }
        true
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|c| format!("{}{}", c.operator.as_str(), c.version))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// A disjunction of [`Constraint`]s — matches if any conjunction matches.
/// An empty `RangeSet` matches every version (spec: "no version
/// constraint" used for synthesized language-module dependencies).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSet(pub Vec<Constraint>);

impl RangeSet {
    pub fn any() -> Self {
        Self(vec![Constraint(Vec::new())])
    }

    pub fn matches(&self, candidate: &Version) -> bool {
        if self.0.is_empty() {
            return true;
        }
        self.0.iter().any(|c| c.matches(candidate))
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" || "))
    }
}

impl FromStr for RangeSet {
    type Err = String;

    /// Parses e.g. `">=1.0.0, <2.0.0 || >=3.0.0"` into a disjunction of
    /// conjunctions. Each comparator is `<op><version>` with no space
    /// between operator and version.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut constraints = Vec::new();
        for conjunction in s.split("||") {
            let conjunction = conjunction.trim();
            if conjunction.is_empty() {
                continue;
            }
            let mut comparators = Vec::new();
            for term in conjunction.split(',') {
                let term = term.trim();
                if term.is_empty() {
                    continue;
                }
                comparators.push(parse_comparator(term)?);
            }
            constraints.push(Constraint(comparators));
        }
        if constraints.is_empty() {
            constraints.push(Constraint(Vec::new()));
        }
        Ok(RangeSet(constraints))
    }
}

fn parse_comparator(term: &str) -> Result<Comparator, String> {
    let (operator, rest) = if let Some(rest) = term.strip_prefix(">=") {
        (Operator::Ge, rest)
    } else if let Some(rest) = term.strip_prefix("<=") {
        (Operator::Le, rest)
    } else if let Some(rest) = term.strip_prefix('>') {
        (Operator::Gt, rest)
    } else if let Some(rest) = term.strip_prefix('<') {
        (Operator::Lt, rest)
    } else if let Some(rest) = term.strip_prefix('=') {
        (Operator::Eq, rest)
    } else {
        (Operator::Eq, term)
    };
    let version: Version = rest
        .trim()
        .parse()
        .map_err(|e| format!("invalid version in constraint '{term}': {e}"))?;
    Ok(Comparator { operator, version })
}
