// Relationships between diagram elements
//
// Relationships reference elements by id, never by pointer, which keeps the
// model cycle-tolerant. The label is only set when the relation is mediated
// by a named member.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::element::Access;
use super::id::DiagramId;

/// Kind of relationship between two elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Extension,
    Composition,
    Aggregation,
    Association,
    Dependency,
    Instantiation,
    Friendship,
    Constraint,
    Includes,
}

impl RelationshipKind {
    /// Ordering strength used when eliding redundant dependencies: a
    /// dependency edge between a pair is dropped when a stronger edge
    /// already connects the same pair.
    pub fn is_stronger_than_dependency(&self) -> bool {
        matches!(
            self,
            RelationshipKind::Extension
                | RelationshipKind::Composition
                | RelationshipKind::Aggregation
        )
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipKind::Extension => "extension",
            RelationshipKind::Composition => "composition",
            RelationshipKind::Aggregation => "aggregation",
            RelationshipKind::Association => "association",
            RelationshipKind::Dependency => "dependency",
            RelationshipKind::Instantiation => "instantiation",
            RelationshipKind::Friendship => "friendship",
            RelationshipKind::Constraint => "constraint",
            RelationshipKind::Includes => "includes",
        };
        write!(f, "{}", s)
    }
}

/// A directed relationship between two elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: DiagramId,
    pub target: DiagramId,
    pub kind: RelationshipKind,
    /// Name of the mediating member, when there is one
    pub label: Option<String>,
    pub access: Access,
    pub multiplicity_source: Option<String>,
    pub multiplicity_target: Option<String>,
}

impl Relationship {
    pub fn new(source: DiagramId, target: DiagramId, kind: RelationshipKind) -> Self {
        Self {
            source,
            target,
            kind,
            label: None,
            access: Access::default(),
            multiplicity_source: None,
            multiplicity_target: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Identity of the edge for deduplication (label-insensitive)
    pub fn edge_key(&self) -> (DiagramId, DiagramId, RelationshipKind) {
        (self.source, self.target, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stronger_than_dependency() {
        assert!(RelationshipKind::Extension.is_stronger_than_dependency());
        assert!(RelationshipKind::Composition.is_stronger_than_dependency());
        assert!(RelationshipKind::Aggregation.is_stronger_than_dependency());
        assert!(!RelationshipKind::Association.is_stronger_than_dependency());
        assert!(!RelationshipKind::Dependency.is_stronger_than_dependency());
        assert!(!RelationshipKind::Friendship.is_stronger_than_dependency());
    }

    #[test]
    fn test_builder() {
        let r = Relationship::new(DiagramId(1), DiagramId(2), RelationshipKind::Aggregation)
            .with_label("pImpl")
            .with_access(Access::Private);
        assert_eq!(r.label.as_deref(), Some("pImpl"));
        assert_eq!(r.access, Access::Private);
        assert_eq!(
            r.edge_key(),
            (DiagramId(1), DiagramId(2), RelationshipKind::Aggregation)
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(RelationshipKind::Extension.to_string(), "extension");
        assert_eq!(RelationshipKind::Includes.to_string(), "includes");
    }
}
