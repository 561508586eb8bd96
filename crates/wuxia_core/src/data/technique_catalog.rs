//! Validated technique catalog.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CombatError, Result};
use crate::technique::Technique;

/// Techniques keyed by name, every entry validated.
#[derive(Debug, Clone, Default)]
pub struct TechniqueCatalog {
    techniques: BTreeMap<String, Technique>,
}

impl TechniqueCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a RON list of techniques.
    ///
    /// # Errors
    ///
    /// Returns an error if the RON is malformed, a technique fails
    /// validation, or two techniques share a name.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let mut catalog = Self::new();
        catalog.extend_from_ron_str(ron)?;
        Ok(catalog)
    }

    /// Parse a RON list of techniques into this catalog.
    ///
    /// Returns the number of techniques added.
    ///
    /// # Errors
    ///
    /// Same as [`TechniqueCatalog::from_ron_str`]. Nothing is added on error.
    pub fn extend_from_ron_str(&mut self, ron: &str) -> Result<usize> {
        let parsed: Vec<Technique> = ron::from_str(ron)?;
        for technique in &parsed {
            technique.validate()?;
            if self.techniques.contains_key(&technique.name) {
                return Err(CombatError::DuplicateTechnique(technique.name.clone()));
            }
        }
        let mut seen = BTreeSet::new();
        if let Some(dup) = parsed.iter().find(|t| !seen.insert(t.name.as_str())) {
            return Err(CombatError::DuplicateTechnique(dup.name.clone()));
        }

        let count = parsed.len();
        for technique in parsed {
            self.techniques.insert(technique.name.clone(), technique);
        }
        tracing::debug!(count, total = self.techniques.len(), "Loaded techniques");
        Ok(count)
    }

    /// Validate and add a single technique.
    ///
    /// # Errors
    ///
    /// Returns an error if the technique is invalid or its name is taken.
    pub fn insert(&mut self, technique: Technique) -> Result<()> {
        technique.validate()?;
        if self.techniques.contains_key(&technique.name) {
            return Err(CombatError::DuplicateTechnique(technique.name));
        }
        self.techniques.insert(technique.name.clone(), technique);
        Ok(())
    }

    /// Technique by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Technique> {
        self.techniques.get(name)
    }

    /// Number of techniques.
    #[must_use]
    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }

    /// Iterate techniques in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Technique> {
        self.techniques.values()
    }
}
