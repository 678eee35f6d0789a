//! attribute parser - converts declared attributes to a configuration
//!
//! each element flavor exposes the predicates it supports under its own
//! attribute prefix (`has-param`, `when-hash`, ...). `match-any` switches the
//! combinator to any. empty or malformed values leave the predicate absent.

use std::collections::BTreeMap;

use tracing::warn;

use super::types::{Combinator, Configuration, NetworkState, ParamSpec, PredicateKind};

/// presence of this attribute switches the combinator to any
pub const MATCH_ANY_ATTRIBUTE: &str = "match-any";

/// which attributes a flavor observes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSchema {
    /// attribute prefix, e.g. "has-"
    pub prefix: &'static str,
    /// predicate kinds this flavor supports
    pub kinds: &'static [PredicateKind],
}

impl AttributeSchema {
    /// attribute name for a predicate kind, e.g. "has-media"
    pub fn attribute_name(&self, kind: PredicateKind) -> String {
        format!("{}{}", self.prefix, kind.as_str())
    }

    pub fn supports(&self, kind: PredicateKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// every attribute whose change triggers re-evaluation
    pub fn observed_attributes(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .kinds
            .iter()
            .map(|k| self.attribute_name(*k))
            .collect();
        names.push(MATCH_ANY_ATTRIBUTE.to_string());
        names
    }

    pub fn is_observed(&self, name: &str) -> bool {
        if name == MATCH_ANY_ATTRIBUTE {
            return true;
        }
        self.kind_for(name).is_some()
    }

    /// predicate kind for an attribute name, if this schema supports it
    pub fn kind_for(&self, name: &str) -> Option<PredicateKind> {
        let suffix = name.strip_prefix(self.prefix)?;
        PredicateKind::parse(suffix).filter(|k| self.supports(*k))
    }
}

/// build a configuration from declared attributes
///
/// attributes the schema does not observe are ignored.
pub fn parse_attributes(
    attributes: &BTreeMap<String, String>,
    schema: &AttributeSchema,
) -> Configuration {
    let text = |kind: PredicateKind| -> Option<String> {
        if !schema.supports(kind) {
            return None;
        }
        attributes
            .get(&schema.attribute_name(kind))
            .filter(|v| !v.is_empty())
            .cloned()
    };

    let param = text(PredicateKind::Param).and_then(|raw| {
        let spec = ParamSpec::parse(&raw);
        if spec.is_none() {
            warn!(value = %raw, "ignoring malformed param spec");
        }
        spec
    });

    let network = text(PredicateKind::Network).and_then(|raw| {
        let state = NetworkState::parse(&raw);
        if state.is_none() {
            warn!(value = %raw, "ignoring network spec, expected 'online' or 'offline'");
        }
        state
    });

    let combinator = if attributes.contains_key(MATCH_ANY_ATTRIBUTE) {
        Combinator::Any
    } else {
        Combinator::All
    };

    Configuration {
        param,
        hash: text(PredicateKind::Hash),
        lang: text(PredicateKind::Lang),
        media: text(PredicateKind::Media),
        support: text(PredicateKind::Support),
        network,
        combinator,
    }
}

/// list problems with declared attributes, for validation
///
/// flags predicate-looking attributes the schema does not support and
/// values that would be ignored.
pub fn check_attributes(
    attributes: &BTreeMap<String, String>,
    schema: &AttributeSchema,
) -> Vec<String> {
    let mut problems = Vec::new();

    for (name, value) in attributes {
        if name == MATCH_ANY_ATTRIBUTE {
            continue;
        }

        let Some(kind) = schema.kind_for(name) else {
            let looks_like_predicate = ["has-", "when-"].iter().any(|prefix| {
                name.strip_prefix(prefix)
                    .and_then(PredicateKind::parse)
                    .is_some()
            });
            if looks_like_predicate {
                problems.push(format!(
                    "attribute '{}' is not supported (supported: {})",
                    name,
                    schema.observed_attributes().join(", ")
                ));
            }
            continue;
        };

        if value.is_empty() {
            problems.push(format!("attribute '{}' is empty and will be ignored", name));
            continue;
        }

        match kind {
            PredicateKind::Param if ParamSpec::parse(value).is_none() => {
                problems.push(format!(
                    "attribute '{}': '{}' has an empty parameter name",
                    name, value
                ));
            }
            PredicateKind::Network if NetworkState::parse(value).is_none() => {
                problems.push(format!(
                    "attribute '{}': '{}' must be 'online' or 'offline'",
                    name, value
                ));
            }
            _ => {}
        }
    }

    problems
}
