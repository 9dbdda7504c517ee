//! Exclusion rules and the field filter
//!
//! Rules remove entries that must never be exposed for translation, or that
//! must never be overwritten by it. A name rule matches when any segment of the
//! path has that literal text; a pattern rule is a regex over the encoded path.

use crate::error::ConfigError;
use crate::path::FlatPath;
use crate::types::FlatEntrySet;
use regex::Regex;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum ExclusionRule {
    /// Exact segment name, e.g. `ID`
    Name(String),
    /// Regex over the full encoded path, e.g. `^meta/_elementor_data/`
    Pattern(Regex),
}

impl ExclusionRule {
    pub fn name(literal: impl Into<String>) -> Self {
        ExclusionRule::Name(literal.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(ExclusionRule::Pattern)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn matches(&self, path: &FlatPath, encoded: &str) -> bool {
        match self {
            ExclusionRule::Name(literal) => path.segments().iter().any(|s| s.text() == literal.as_str()),
            ExclusionRule::Pattern(regex) => regex.is_match(encoded),
        }
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionRule::Name(literal) => write!(f, "name '{literal}'"),
            ExclusionRule::Pattern(regex) => write!(f, "pattern '{}'", regex.as_str()),
        }
    }
}

/// An immutable-per-run collection of exclusion rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ExclusionRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from configured names and patterns
    pub fn compile<S: AsRef<str>>(names: &[S], patterns: &[S]) -> Result<Self, ConfigError> {
        let mut rules: Vec<ExclusionRule> = names
            .iter()
            .map(|name| ExclusionRule::name(name.as_ref()))
            .collect();
        for pattern in patterns {
            rules.push(ExclusionRule::pattern(pattern.as_ref())?);
        }
        Ok(RuleSet { rules })
    }

    /// This rule set plus one more rule
    pub fn with(mut self, rule: ExclusionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExclusionRule> {
        self.rules.iter()
    }

    /// First rule matching `path`, if any
    pub fn find_match(&self, path: &FlatPath, encoded: &str) -> Option<&ExclusionRule> {
        self.rules.iter().find(|rule| rule.matches(path, encoded))
    }
}

impl FromIterator<ExclusionRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = ExclusionRule>>(iter: I) -> Self {
        RuleSet {
            rules: iter.into_iter().collect(),
        }
    }
}

/// A new entry set without the entries matched by any of `rules`
pub fn exclude(entries: &FlatEntrySet, rules: &RuleSet) -> FlatEntrySet {
    if rules.is_empty() {
        return entries.clone();
    }

    entries
        .iter()
        .filter(|(path, _)| {
            let encoded = path.encode();
            match rules.find_match(path, &encoded) {
                Some(rule) => {
                    debug!(field = %encoded, %rule, "removed field because of configuration");
                    false
                }
                None => true,
            }
        })
        .map(|(path, value)| (path.clone(), value.clone()))
        .collect()
}
