//! tag name -> flavor definitions

use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use super::{ConditionalElement, Flavor};
use crate::environment::Host;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid element name '{0}': must start with a lowercase letter, contain '-', and have no uppercase or whitespace")]
    InvalidName(String),

    #[error("element '{tag}' is already defined as {existing}")]
    AlreadyDefined { tag: String, existing: Flavor },

    #[error("element '{0}' is not defined")]
    UnknownTag(String),
}

/// check a custom element name
pub fn is_valid_tag(tag: &str) -> bool {
    let starts_lowercase = tag
        .chars()
        .next()
        .map(|c| c.is_ascii_lowercase())
        .unwrap_or(false);

    starts_lowercase
        && tag.contains('-')
        && !tag.chars().any(|c| c.is_uppercase() || c.is_whitespace())
}

/// definitions of conditional elements available to a document
#[derive(Debug, Clone, Default)]
pub struct ElementRegistry {
    definitions: BTreeMap<String, Flavor>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// registry with every flavor under its default tag
    pub fn with_defaults() -> Self {
        let definitions = Flavor::all()
            .iter()
            .map(|f| (f.default_tag().to_string(), *f))
            .collect();
        Self { definitions }
    }

    pub fn define(&mut self, tag: &str, flavor: Flavor) -> Result<(), RegistryError> {
        if !is_valid_tag(tag) {
            return Err(RegistryError::InvalidName(tag.to_string()));
        }
        if let Some(existing) = self.definitions.get(tag) {
            return Err(RegistryError::AlreadyDefined {
                tag: tag.to_string(),
                existing: *existing,
            });
        }

        debug!(tag, flavor = %flavor, "element defined");
        self.definitions.insert(tag.to_string(), flavor);
        Ok(())
    }

    pub fn lookup(&self, tag: &str) -> Option<Flavor> {
        self.definitions.get(tag).copied()
    }

    /// build a detached element for a defined tag
    pub fn create(&self, tag: &str, host: Rc<dyn Host>) -> Result<ConditionalElement, RegistryError> {
        let flavor = self
            .lookup(tag)
            .ok_or_else(|| RegistryError::UnknownTag(tag.to_string()))?;
        Ok(ConditionalElement::with_tag(tag, flavor, host))
    }

    /// (tag, flavor) pairs sorted by tag
    pub fn definitions(&self) -> impl Iterator<Item = (&str, Flavor)> {
        self.definitions.iter().map(|(t, f)| (t.as_str(), *f))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
