// Common element attributes
//
// Every modeled entity (class, enum, concept, package, file, participant)
// shares this header: name, namespace, id, source location and presentation
// flags. Kind-specific payloads live with their diagram models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::id::DiagramId;
use super::name::Namespace;

/// C++ access specifier
///
/// Free functions and namespace-level declarations carry no access
/// specifier; an unknown or absent access is treated as public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
    None,
}

impl Access {
    /// PlantUML member prefix
    pub fn symbol(&self) -> &'static str {
        match self {
            Access::Public | Access::None => "+",
            Access::Protected => "#",
            Access::Private => "-",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
            Access::None => "none",
        };
        write!(f, "{}", s)
    }
}

/// Location of a declaration in the analyzed sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SourceLocation {
    /// File the declaration appears in
    pub file: PathBuf,
    /// Presumed line
    pub line: u32,
    /// Presumed column
    pub column: u32,
    /// Translation unit the declaration was harvested from
    pub translation_unit: PathBuf,
}

/// Attributes shared by every diagram element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Short (unqualified) name
    pub name: String,
    /// Enclosing namespace
    pub namespace: Namespace,
    /// Stable identity, always `DiagramId::of(qualified_name())`
    pub id: DiagramId,
    /// Source location, when the front-end supplied one
    pub location: Option<SourceLocation>,
    /// Documentation comment attached to the declaration
    pub comment: Option<String>,
    /// Style hint for emitters (e.g. `#aliceblue`)
    pub style: Option<String>,
    /// Excluded from rendering by a comment directive
    pub skip: bool,
    /// Carries a `[[deprecated]]` attribute
    pub deprecated: bool,
    /// Access under which the element was declared
    pub access: Access,
}

impl Element {
    /// Create an element, deriving its id from the qualified name
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        let name = name.into();
        let id = DiagramId::of(&namespace.qualify(&name));
        Self {
            name,
            namespace,
            id,
            location: None,
            comment: None,
            style: None,
            skip: false,
            deprecated: false,
            access: Access::default(),
        }
    }

    /// Fully qualified name
    pub fn qualified_name(&self) -> String {
        self.namespace.qualify(&self.name)
    }

    /// Qualified name rendered relative to a `using_namespace` root
    pub fn display_name(&self, using_namespace: &Namespace) -> String {
        self.namespace
            .relative_to(using_namespace)
            .qualify(&self.name)
    }

    /// Whether this element's forward-declaration data should be replaced
    /// by `other` during a merge (same id, later and more complete sighting)
    pub fn absorb(&mut self, other: Element) {
        if self.location.is_none() {
            self.location = other.location;
        }
        if self.comment.is_none() {
            self.comment = other.comment;
        }
        self.deprecated |= other.deprecated;
        self.skip |= other.skip;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id_matches_qualified_name() {
        let e = Element::new(Namespace::parse("a::b"), "C");
        assert_eq!(e.qualified_name(), "a::b::C");
        assert_eq!(e.id, DiagramId::of("a::b::C"));
    }

    #[test]
    fn test_display_name_relative() {
        let e = Element::new(Namespace::parse("app::core"), "Engine");
        assert_eq!(e.display_name(&Namespace::parse("app")), "core::Engine");
        assert_eq!(e.display_name(&Namespace::new()), "app::core::Engine");
        assert_eq!(e.display_name(&Namespace::parse("other")), "app::core::Engine");
    }

    #[test]
    fn test_access_defaults_to_public() {
        assert_eq!(Access::default(), Access::Public);
        assert_eq!(Access::None.symbol(), "+");
        assert_eq!(Access::Private.symbol(), "-");
    }

    #[test]
    fn test_absorb_completes_forward_declaration() {
        let ns = Namespace::parse("a");
        let mut forward = Element::new(ns.clone(), "C");
        let mut complete = Element::new(ns, "C");
        complete.comment = Some("A class".to_string());
        complete.deprecated = true;

        forward.absorb(complete);
        assert_eq!(forward.comment.as_deref(), Some("A class"));
        assert!(forward.deprecated);
    }
}
