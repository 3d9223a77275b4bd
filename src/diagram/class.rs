// Class diagram model
//
// The diagram is an id-indexed arena and the single owner of its elements;
// relationships reference endpoints by id only, so mutually-referencing
// classes are unproblematic.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::filter::DiagramFilter;
use crate::model::{
    render_param_list, Access, DiagramId, Element, Namespace, Relationship, RelationshipKind,
    TemplateParameter,
};

/// Kind of a class diagram element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Struct,
    Union,
    Enum,
    Concept,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Struct => "struct",
            ClassKind::Union => "union",
            ClassKind::Enum => "enum",
            ClassKind::Concept => "concept",
        }
    }
}

/// A base class reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaseClass {
    pub id: DiagramId,
    pub access: Access,
    pub is_virtual: bool,
}

/// A data member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMember {
    pub name: String,
    pub r#type: String,
    pub access: Access,
    pub is_static: bool,
    pub is_const: bool,
}

/// A method parameter, pre-rendered for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodParameter {
    pub name: String,
    pub r#type: String,
    pub default_value: Option<String>,
}

/// A method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMethod {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<MethodParameter>,
    pub access: Access,
    pub is_static: bool,
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_defaulted: bool,
}

/// A class, struct, union, enum, or concept in the class diagram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    #[serde(flatten)]
    pub element: Element,
    pub kind: ClassKind,
    pub is_abstract: bool,
    pub is_template: bool,
    /// False while only a forward declaration has been seen
    pub is_complete: bool,
    pub bases: Vec<BaseClass>,
    pub members: Vec<ClassMember>,
    pub methods: Vec<ClassMethod>,
    pub template_params: Vec<TemplateParameter>,
    pub friends: Vec<DiagramId>,
    /// Enum constants, for `kind == Enum`
    pub constants: Vec<String>,
    pub nested_in: Option<DiagramId>,
}

impl Class {
    /// Create a class element; the id derives from the full name including
    /// any template parameter list
    pub fn new(namespace: Namespace, name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            element: Element::new(namespace, name),
            kind,
            is_abstract: false,
            is_template: false,
            is_complete: true,
            bases: Vec::new(),
            members: Vec::new(),
            methods: Vec::new(),
            template_params: Vec::new(),
            friends: Vec::new(),
            constants: Vec::new(),
            nested_in: None,
        }
    }

    pub fn id(&self) -> DiagramId {
        self.element.id
    }

    /// Qualified name including the template parameter list
    pub fn full_name(&self) -> String {
        format!(
            "{}{}",
            self.element.qualified_name(),
            render_param_list(&self.template_params)
        )
    }

    /// Name rendered relative to `using_namespace`, template list included
    pub fn display_name(&self, using_namespace: &Namespace) -> String {
        format!(
            "{}{}",
            self.element.display_name(using_namespace),
            render_param_list(&self.template_params)
        )
    }

    /// Merge a later sighting of the same entity; a complete definition
    /// always wins over a forward declaration
    pub fn merge(&mut self, other: Class) {
        if !self.is_complete && other.is_complete {
            let old = std::mem::replace(self, other);
            self.element.absorb(old.element);
            return;
        }
        if self.is_complete && !other.is_complete {
            self.element.absorb(other.element);
            return;
        }

        self.element.absorb(other.element);
        self.is_abstract |= other.is_abstract;
        self.is_template |= other.is_template;
        if self.bases.is_empty() {
            self.bases = other.bases;
        }
        if self.members.is_empty() {
            self.members = other.members;
        }
        if self.methods.is_empty() {
            self.methods = other.methods;
        }
        if self.template_params.is_empty() {
            self.template_params = other.template_params;
        }
        if self.constants.is_empty() {
            self.constants = other.constants;
        }
        for friend in other.friends {
            if !self.friends.contains(&friend) {
                self.friends.push(friend);
            }
        }
        self.nested_in = self.nested_in.or(other.nested_in);
    }
}

/// The class diagram model
#[derive(Debug, Default, Serialize)]
pub struct ClassDiagram {
    pub name: String,
    pub using_namespace: Namespace,
    classes: Vec<Class>,
    relationships: Vec<Relationship>,
    #[serde(skip)]
    index: HashMap<DiagramId, usize>,
    #[serde(skip)]
    filter: DiagramFilter,
}

impl ClassDiagram {
    pub fn new(name: impl Into<String>, using_namespace: Namespace, filter: DiagramFilter) -> Self {
        Self {
            name: name.into(),
            using_namespace,
            classes: Vec::new(),
            relationships: Vec::new(),
            index: HashMap::new(),
            filter,
        }
    }

    pub fn filter(&self) -> &DiagramFilter {
        &self.filter
    }

    pub fn root_namespace(&self) -> &Namespace {
        &self.using_namespace
    }

    pub fn should_include(&self, qualified_name: &str) -> bool {
        self.filter.should_include(qualified_name)
    }

    /// Add or merge a class; duplicate ids must refer to the same canonical
    /// name, anything else is a fatal identity collision
    pub fn add_class(&mut self, class: Class) -> Result<DiagramId> {
        let id = class.id();
        if let Some(&slot) = self.index.get(&id) {
            let existing = &mut self.classes[slot];
            if existing.element.qualified_name() != class.element.qualified_name() {
                return Err(Error::IdentityCollision {
                    first: existing.element.qualified_name(),
                    second: class.element.qualified_name(),
                    id: id.value(),
                });
            }
            existing.merge(class);
        } else {
            self.index.insert(id, self.classes.len());
            self.classes.push(class);
        }
        Ok(id)
    }

    /// Add a relationship; exact duplicates are ignored
    pub fn add_relationship(&mut self, relationship: Relationship) {
        if !self.relationships.contains(&relationship) {
            self.relationships.push(relationship);
        }
    }

    pub fn get(&self, id: DiagramId) -> Option<&Class> {
        self.index.get(&id).map(|&slot| &self.classes[slot])
    }

    /// Look up by full display name (relative to `using_namespace`) or by
    /// fully qualified name
    pub fn find(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| {
            c.display_name(&self.using_namespace) == name
                || c.full_name() == name
                || c.element.qualified_name() == name
        })
    }

    pub fn elements(&self) -> &[Class] {
        &self.classes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Consume the diagram into its classes and relationships, for the
    /// merge phase
    pub fn into_parts(self) -> (Vec<Class>, Vec<Relationship>) {
        (self.classes, self.relationships)
    }

    /// Transitive base chain of a class, by qualified name
    pub fn ancestors_of(&self, id: DiagramId) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<DiagramId> = self
            .get(id)
            .map(|c| c.bases.iter().map(|b| b.id).collect())
            .unwrap_or_default();
        while let Some(base_id) = stack.pop() {
            if let Some(base) = self.get(base_id) {
                let name = base.full_name();
                if !out.contains(&name) {
                    out.push(name);
                    stack.extend(base.bases.iter().map(|b| b.id));
                }
            }
        }
        out
    }

    /// Normalization pass run once after the merge phase
    ///
    /// Resolves base lists into extension edges, drops edges with missing
    /// endpoints or self-dependencies, elides dependencies shadowed by a
    /// stronger edge, reduces transitive inheritance shadows and computes
    /// the nesting index.
    pub fn finalize(&mut self) {
        // Bases become extension edges
        let mut extensions = Vec::new();
        for class in &self.classes {
            for base in &class.bases {
                extensions.push(
                    Relationship::new(class.id(), base.id, RelationshipKind::Extension)
                        .with_access(base.access),
                );
            }
        }
        for extension in extensions {
            self.add_relationship(extension);
        }

        // Drop edges to elements outside the diagram and dependency
        // self-edges
        let index = &self.index;
        self.relationships.retain(|r| {
            index.contains_key(&r.source)
                && index.contains_key(&r.target)
                && !(r.source == r.target && r.kind == RelationshipKind::Dependency)
        });

        // A dependency already implied by a stronger edge between the same
        // pair is redundant
        let strong: Vec<(DiagramId, DiagramId)> = self
            .relationships
            .iter()
            .filter(|r| r.kind.is_stronger_than_dependency())
            .map(|r| (r.source, r.target))
            .collect();
        self.relationships.retain(|r| {
            r.kind != RelationshipKind::Dependency || !strong.contains(&(r.source, r.target))
        });

        self.reduce_inheritance();
        self.compute_nesting();
    }

    /// Remove extension edges shadowed by a transitive inheritance path
    fn reduce_inheritance(&mut self) {
        let direct: Vec<(DiagramId, DiagramId)> = self
            .relationships
            .iter()
            .filter(|r| r.kind == RelationshipKind::Extension)
            .map(|r| (r.source, r.target))
            .collect();

        let reaches = |from: DiagramId, to: DiagramId, skip: (DiagramId, DiagramId)| -> bool {
            let mut stack: Vec<DiagramId> = direct
                .iter()
                .filter(|&&(s, t)| s == from && (s, t) != skip)
                .map(|&(_, t)| t)
                .collect();
            let mut seen = vec![from];
            while let Some(node) = stack.pop() {
                if node == to {
                    return true;
                }
                if seen.contains(&node) {
                    continue;
                }
                seen.push(node);
                stack.extend(
                    direct
                        .iter()
                        .filter(|&&(s, _)| s == node)
                        .map(|&(_, t)| t),
                );
            }
            false
        };

        self.relationships.retain(|r| {
            r.kind != RelationshipKind::Extension
                || !reaches(r.source, r.target, (r.source, r.target))
        });
    }

    /// A class whose qualified name extends another class's by `::` tokens
    /// is nested inside it; the innermost enclosing class wins
    fn compute_nesting(&mut self) {
        let names: Vec<(DiagramId, String)> = self
            .classes
            .iter()
            .map(|c| (c.id(), c.element.qualified_name()))
            .collect();

        for class in &mut self.classes {
            if class.nested_in.is_some() {
                continue;
            }
            let own = class.element.qualified_name();
            let parent = names
                .iter()
                .filter(|(id, name)| {
                    *id != class.id() && own.starts_with(&format!("{}::", name))
                })
                .max_by_key(|(_, name)| name.len());
            class.nested_in = parent.map(|(id, _)| *id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagram() -> ClassDiagram {
        ClassDiagram::new("test", Namespace::parse("app"), DiagramFilter::default())
    }

    fn class(ns: &str, name: &str) -> Class {
        Class::new(Namespace::parse(ns), name, ClassKind::Class)
    }

    #[test]
    fn test_add_and_get() {
        let mut d = diagram();
        let id = d.add_class(class("app", "Widget")).unwrap();
        assert_eq!(id, DiagramId::of("app::Widget"));
        assert_eq!(d.get(id).unwrap().element.name, "Widget");
        assert_eq!(d.elements().len(), 1);
    }

    #[test]
    fn test_duplicate_merges() {
        let mut d = diagram();
        let mut forward = class("app", "Widget");
        forward.is_complete = false;

        let mut complete = class("app", "Widget");
        complete.members.push(ClassMember {
            name: "size".to_string(),
            r#type: "int".to_string(),
            access: Access::Private,
            is_static: false,
            is_const: false,
        });

        d.add_class(forward).unwrap();
        d.add_class(complete).unwrap();

        assert_eq!(d.elements().len(), 1);
        let merged = d.get(DiagramId::of("app::Widget")).unwrap();
        assert!(merged.is_complete);
        assert_eq!(merged.members.len(), 1);
    }

    #[test]
    fn test_display_name_with_template() {
        let mut c = class("app", "G");
        c.is_template = true;
        c.template_params
            .push(TemplateParameter::make_template_type("T"));
        assert_eq!(c.display_name(&Namespace::parse("app")), "G<T>");
        assert_eq!(c.full_name(), "app::G<T>");
    }

    #[test]
    fn test_find_by_display_name() {
        let mut d = diagram();
        let mut c = class("app", "H");
        c.is_template = true;
        c.template_params
            .push(TemplateParameter::make_template_type("T"));
        c.template_params
            .push(TemplateParameter::make_template_type("P"));
        d.add_class(c).unwrap();

        assert!(d.find("H<T,P>").is_some());
        assert!(d.find("app::H<T,P>").is_some());
        assert!(d.find("H<T>").is_none());
    }

    #[test]
    fn test_finalize_bases_become_extensions() {
        let mut d = diagram();
        let base_id = d.add_class(class("app", "Base")).unwrap();
        let mut derived = class("app", "Derived");
        derived.bases.push(BaseClass {
            id: base_id,
            access: Access::Public,
            is_virtual: false,
        });
        let derived_id = d.add_class(derived).unwrap();

        d.finalize();
        assert!(d.relationships().iter().any(|r| {
            r.kind == RelationshipKind::Extension
                && r.source == derived_id
                && r.target == base_id
        }));
    }

    #[test]
    fn test_finalize_drops_shadowed_dependency() {
        let mut d = diagram();
        let a = d.add_class(class("app", "A")).unwrap();
        let b = d.add_class(class("app", "B")).unwrap();

        d.add_relationship(
            Relationship::new(a, b, RelationshipKind::Aggregation).with_label("member"),
        );
        d.add_relationship(Relationship::new(a, b, RelationshipKind::Dependency));
        d.finalize();

        assert!(d
            .relationships()
            .iter()
            .any(|r| r.kind == RelationshipKind::Aggregation));
        assert!(!d
            .relationships()
            .iter()
            .any(|r| r.kind == RelationshipKind::Dependency));
    }

    #[test]
    fn test_finalize_drops_self_dependency() {
        let mut d = diagram();
        let a = d.add_class(class("app", "A")).unwrap();
        d.add_relationship(Relationship::new(a, a, RelationshipKind::Dependency));
        d.finalize();
        assert!(d.relationships().is_empty());
    }

    #[test]
    fn test_finalize_drops_dangling_relationship() {
        let mut d = diagram();
        let a = d.add_class(class("app", "A")).unwrap();
        d.add_relationship(Relationship::new(
            a,
            DiagramId::of("app::Unknown"),
            RelationshipKind::Dependency,
        ));
        d.finalize();
        assert!(d.relationships().is_empty());
    }

    #[test]
    fn test_inheritance_reduction() {
        let mut d = diagram();
        let a = d.add_class(class("app", "A")).unwrap();
        let b = d.add_class(class("app", "B")).unwrap();
        let c = d.add_class(class("app", "C")).unwrap();

        // C -> B -> A plus the transitive shadow C -> A
        d.add_relationship(Relationship::new(c, b, RelationshipKind::Extension));
        d.add_relationship(Relationship::new(b, a, RelationshipKind::Extension));
        d.add_relationship(Relationship::new(c, a, RelationshipKind::Extension));
        d.finalize();

        let extensions: Vec<_> = d
            .relationships()
            .iter()
            .filter(|r| r.kind == RelationshipKind::Extension)
            .collect();
        assert_eq!(extensions.len(), 2);
        assert!(!extensions.iter().any(|r| r.source == c && r.target == a));
    }

    #[test]
    fn test_identity_collision_detected() {
        let mut d = diagram();
        d.add_class(class("app", "A")).unwrap();

        // Forge a class whose id collides but whose name differs
        let mut forged = class("app", "B");
        forged.element.id = DiagramId::of("app::A");
        assert!(matches!(
            d.add_class(forged),
            Err(Error::IdentityCollision { .. })
        ));
    }

    #[test]
    fn test_nesting_computed_from_names() {
        let mut d = diagram();
        let outer = d.add_class(class("app", "A")).unwrap();
        let inner = d.add_class(class("app::A", "AA")).unwrap();
        let innermost = d.add_class(class("app::A::AA", "AAA")).unwrap();
        d.finalize();

        assert_eq!(d.get(inner).unwrap().nested_in, Some(outer));
        assert_eq!(d.get(innermost).unwrap().nested_in, Some(inner));
        assert_eq!(d.get(outer).unwrap().nested_in, None);
    }

    #[test]
    fn test_ancestors_of() {
        let mut d = diagram();
        let a = d.add_class(class("app", "A")).unwrap();
        let mut b = class("app", "B");
        b.bases.push(BaseClass {
            id: a,
            access: Access::Public,
            is_virtual: false,
        });
        let b_id = d.add_class(b).unwrap();
        let mut c = class("app", "C");
        c.bases.push(BaseClass {
            id: b_id,
            access: Access::Public,
            is_virtual: false,
        });
        let c_id = d.add_class(c).unwrap();

        let ancestors = d.ancestors_of(c_id);
        assert!(ancestors.contains(&"app::B".to_string()));
        assert!(ancestors.contains(&"app::A".to_string()));
    }
}
