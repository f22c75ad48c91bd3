//! Candidate triples - entity/relation/entity statements prior to persistence

use serde::{Deserialize, Serialize};

/// Lower bound of the importance scale
pub const IMPORTANCE_MIN: i64 = 1;
/// Upper bound of the importance scale
pub const IMPORTANCE_MAX: i64 = 5;
/// Value used when the backend omits importance or emits something unusable
pub const IMPORTANCE_DEFAULT: i64 = 3;

/// A candidate statement extracted from a chunk.
///
/// Both endpoints plus a free-text relation description, annotated with the
/// concept-type label, an importance score, and a category. Identity fields
/// must be non-empty after [`Triple::normalize`] or the triple is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    /// Name of the first node
    pub node_1: String,

    /// Name of the second node
    pub node_2: String,

    /// Free-text relation description, also the edge identity key
    pub edge: String,

    /// Concept-type label for the pair (person, location, concept, ...)
    #[serde(default)]
    pub entity: String,

    /// Importance on a 1-5 scale
    #[serde(default = "default_importance")]
    pub importance: i64,

    /// Thematic category
    #[serde(default)]
    pub category: String,
}

fn default_importance() -> i64 {
    IMPORTANCE_DEFAULT
}

impl Triple {
    /// Create a triple with default annotations
    pub fn new(
        node_1: impl Into<String>,
        node_2: impl Into<String>,
        edge: impl Into<String>,
    ) -> Self {
        Self {
            node_1: node_1.into(),
            node_2: node_2.into(),
            edge: edge.into(),
            entity: String::new(),
            importance: IMPORTANCE_DEFAULT,
            category: String::new(),
        }
    }

    /// Builder: set the concept-type label
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = entity.into();
        self
    }

    /// Builder: set the importance score
    pub fn with_importance(mut self, importance: i64) -> Self {
        self.importance = importance;
        self
    }

    /// Builder: set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Trim all fields, clamp importance to the 1-5 scale, and reject the
    /// triple when any identity field ends up empty.
    pub fn normalize(mut self) -> Option<Self> {
        self.node_1 = self.node_1.trim().to_string();
        self.node_2 = self.node_2.trim().to_string();
        self.edge = self.edge.trim().to_string();
        self.entity = self.entity.trim().to_string();
        self.category = self.category.trim().to_string();

        if self.node_1.is_empty() || self.node_2.is_empty() || self.edge.is_empty() {
            return None;
        }

        self.importance = clamp_importance(self.importance);
        Some(self)
    }
}

/// Coerce an importance value into the 1-5 scale
pub fn clamp_importance(value: i64) -> i64 {
    value.clamp(IMPORTANCE_MIN, IMPORTANCE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triple_builder() {
        let triple = Triple::new("France", "Germany", "declared war on")
            .with_entity("Country")
            .with_importance(5)
            .with_category("Political");

        assert_eq!(triple.node_1, "France");
        assert_eq!(triple.node_2, "Germany");
        assert_eq!(triple.edge, "declared war on");
        assert_eq!(triple.entity, "Country");
        assert_eq!(triple.importance, 5);
        assert_eq!(triple.category, "Political");
    }

    #[test]
    fn test_normalize_trims_fields() {
        let triple = Triple::new("  France ", " Germany", " declared war on  ")
            .normalize()
            .unwrap();

        assert_eq!(triple.node_1, "France");
        assert_eq!(triple.node_2, "Germany");
        assert_eq!(triple.edge, "declared war on");
    }

    #[test]
    fn test_normalize_drops_empty_identity_fields() {
        assert!(Triple::new("", "Germany", "declared war on").normalize().is_none());
        assert!(Triple::new("France", "   ", "declared war on").normalize().is_none());
        assert!(Triple::new("France", "Germany", "").normalize().is_none());
    }

    #[test]
    fn test_normalize_clamps_importance() {
        let low = Triple::new("a", "b", "c").with_importance(-3).normalize().unwrap();
        let high = Triple::new("a", "b", "c").with_importance(42).normalize().unwrap();
        let fine = Triple::new("a", "b", "c").with_importance(2).normalize().unwrap();

        assert_eq!(low.importance, IMPORTANCE_MIN);
        assert_eq!(high.importance, IMPORTANCE_MAX);
        assert_eq!(fine.importance, 2);
    }
}
