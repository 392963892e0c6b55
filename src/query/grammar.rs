//! Rules a query must obey: where it starts, which variables exist and which tags
//! need another tag before them.
//!
//! The service documents its ordering constraints only by example, so rules are data
//! rather than code. [`Grammar::default`] lets spatial filters appear anywhere after the
//! root; [`Grammar::strict`] and [`Grammar::permissive`] bracket it.

use crate::query::catalog::VariableCatalog;
use crate::query::error::QueryError;
use crate::query::tag::{Tag, TagKind};

pub const DEFAULT_ROOT: &str = "https://iridl.ldeo.columbia.edu/SOURCES";

/// `tag` may only be appended once a `prerequisite` tag is already in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderingRule {
    pub tag: TagKind,
    pub prerequisite: TagKind,
}

impl OrderingRule {
    pub const fn new(tag: TagKind, prerequisite: TagKind) -> Self {
        Self { tag, prerequisite }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    root: String,
    catalog: VariableCatalog,
    rules: Vec<OrderingRule>,
}

impl Grammar {
    /// No ordering rules at all.
    pub fn permissive() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            catalog: VariableCatalog::default(),
            rules: Vec::new(),
        }
    }

    /// The default rules, plus spatial filters needing a selected variable.
    pub fn strict() -> Self {
        Self::default()
            .with_rule(OrderingRule::new(
                TagKind::PointFilter,
                TagKind::VariableSelect,
            ))
            .with_rule(OrderingRule::new(
                TagKind::RegionFilter,
                TagKind::VariableSelect,
            ))
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_catalog(mut self, catalog: VariableCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Registers an extra variable identifier next to the existing catalog.
    pub fn with_variable_path(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.catalog = self.catalog.with_entry(name, path);
        self
    }

    pub fn with_rule(mut self, rule: OrderingRule) -> Self {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &[OrderingRule] {
        &self.rules
    }

    pub(crate) fn base_tag(&self) -> Tag {
        Tag::Base {
            root: self.root.clone(),
        }
    }

    pub(crate) fn resolve_variable(&self, name: &str) -> Result<Tag, QueryError> {
        let path = self
            .catalog
            .path_for(name)
            .ok_or_else(|| QueryError::UnknownVariable(name.to_string()))?;
        Ok(Tag::VariableSelect {
            name: name.to_string(),
            path: path.to_string(),
        })
    }

    /// Checks whether a tag of `kind` may follow `prefix`.
    pub fn check_append(&self, prefix: &[Tag], kind: TagKind) -> Result<(), QueryError> {
        for rule in self.rules.iter().filter(|rule| rule.tag == kind) {
            if !prefix.iter().any(|tag| tag.kind() == rule.prerequisite) {
                return Err(QueryError::OrderingViolation {
                    tag: rule.tag,
                    prerequisite: rule.prerequisite,
                });
            }
        }
        Ok(())
    }
}

/// Aggregations and analysis operators need something to operate on.
impl Default for Grammar {
    fn default() -> Self {
        Self::permissive()
            .with_rule(OrderingRule::new(
                TagKind::TemporalAggregate,
                TagKind::VariableSelect,
            ))
            .with_rule(OrderingRule::new(
                TagKind::AnalysisOp,
                TagKind::VariableSelect,
            ))
    }
}
