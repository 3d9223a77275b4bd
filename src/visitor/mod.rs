// Translation unit visitors
//
// One visitor per diagram kind converts front-end declarations into model
// elements and synthesizes relationships. The type-shape-to-relationship
// mapping lives here and is shared by all of them.

pub mod class_diagram;
pub mod include_diagram;
pub mod package_diagram;
pub mod sequence_diagram;

pub use class_diagram::ClassDiagramVisitor;
pub use include_diagram::IncludeDiagramVisitor;
pub use package_diagram::PackageDiagramVisitor;
pub use sequence_diagram::SequenceDiagramVisitor;

use std::collections::HashMap;

use crate::frontend::{Decl, QualType, TemplateArg, TranslationUnit};
use crate::model::RelationshipKind;

/// Shape of a relationship target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Record,
    Enum,
}

/// A relationship discovered while classifying a type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundRelationship {
    /// Qualified name of the target declaration
    pub target: String,
    pub kind: RelationshipKind,
    pub target_kind: TargetKind,
}

/// Recursively classify a type and emit the relationships it implies
///
/// The caller-supplied hint decides the kind recorded for records and enums
/// reached by value; pointers and references override it on the way down:
///
/// - pointer and lvalue-reference: association to the pointee/referent
/// - rvalue-reference and array: aggregation to the referent/element
/// - template specialization: recurse into each type argument with the
///   current hint; function prototype arguments contribute a dependency per
///   parameter
/// - void and void pointers contribute nothing
pub fn find_relationships(
    r#type: &QualType,
    out: &mut Vec<FoundRelationship>,
    hint: RelationshipKind,
) {
    match r#type {
        QualType::Void | QualType::Builtin { .. } | QualType::Unexposed { .. } => {}
        QualType::Pointer { pointee } => {
            if !pointee.is_void() {
                find_relationships(pointee, out, RelationshipKind::Association);
            }
        }
        QualType::LValueReference { referent } => {
            find_relationships(referent, out, RelationshipKind::Association);
        }
        QualType::RValueReference { referent } => {
            find_relationships(referent, out, RelationshipKind::Aggregation);
        }
        QualType::Array { element } => {
            find_relationships(element, out, RelationshipKind::Aggregation);
        }
        QualType::Enum { name } => {
            out.push(FoundRelationship {
                target: name.clone(),
                kind: hint,
                target_kind: TargetKind::Enum,
            });
        }
        QualType::Record { name } => {
            out.push(FoundRelationship {
                target: name.clone(),
                kind: hint,
                target_kind: TargetKind::Record,
            });
        }
        QualType::TemplateSpecialization { args, .. } => {
            for arg in args {
                if let TemplateArg::Type { value } = arg {
                    match value {
                        QualType::FunctionProto { parameters, .. } => {
                            for parameter in parameters {
                                find_relationships(
                                    parameter,
                                    out,
                                    RelationshipKind::Dependency,
                                );
                            }
                        }
                        other => find_relationships(other, out, hint),
                    }
                }
            }
        }
        QualType::FunctionProto { parameters, .. } => {
            for parameter in parameters {
                find_relationships(parameter, out, RelationshipKind::Dependency);
            }
        }
        QualType::Alias { aliased, .. } => {
            find_relationships(aliased, out, hint);
        }
    }
}

/// Whether a type is a smart pointer with owning semantics; fields of such
/// types relate to their pointee by aggregation rather than composition
pub fn is_owning_smart_pointer(r#type: &QualType) -> bool {
    match r#type.desugared() {
        QualType::TemplateSpecialization { name, .. } => [
            "std::unique_ptr",
            "std::shared_ptr",
            "std::weak_ptr",
            "std::auto_ptr",
        ]
        .iter()
        .any(|p| name == p || name.ends_with(&format!("::{}", p))),
        _ => false,
    }
}

/// Typedef and alias targets discovered in a translation unit, used to
/// expand names in unexposed template argument strings
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    map: HashMap<String, String>,
}

impl AliasIndex {
    pub fn build(tu: &TranslationUnit) -> Self {
        let mut index = Self::default();
        index.collect(&tu.declarations);
        index
    }

    fn collect(&mut self, declarations: &[Decl]) {
        for decl in declarations {
            match decl {
                Decl::Alias(alias) => {
                    self.map.insert(
                        alias.qualified_name.clone(),
                        alias.aliased.canonical_name(),
                    );
                    // Unqualified spelling, for references inside the
                    // declaring namespace
                    if let Some((_, short)) = alias.qualified_name.rsplit_once("::") {
                        self.map
                            .entry(short.to_string())
                            .or_insert_with(|| alias.aliased.canonical_name());
                    }
                }
                Decl::Namespace(ns) => self.collect(&ns.declarations),
                _ => {}
            }
        }
    }

    /// Expand a name through the alias chain; unresolved names pass through
    pub fn resolve(&self, name: &str) -> String {
        let mut current = name.to_string();
        let mut hops = 0;
        while let Some(next) = self.map.get(&current) {
            if hops > 16 || *next == current {
                break;
            }
            current = next.clone();
            hops += 1;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::AliasDecl;

    #[test]
    fn test_pointer_yields_association() {
        let mut out = Vec::new();
        find_relationships(
            &QualType::pointer_to(QualType::record("a::B")),
            &mut out,
            RelationshipKind::Composition,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, RelationshipKind::Association);
        assert_eq!(out[0].target, "a::B");
    }

    #[test]
    fn test_void_pointer_yields_nothing() {
        let mut out = Vec::new();
        find_relationships(
            &QualType::pointer_to(QualType::Void),
            &mut out,
            RelationshipKind::Dependency,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_rvalue_reference_yields_aggregation() {
        let mut out = Vec::new();
        find_relationships(
            &QualType::rvalue_reference_to(QualType::record("a::B")),
            &mut out,
            RelationshipKind::Dependency,
        );
        assert_eq!(out[0].kind, RelationshipKind::Aggregation);
    }

    #[test]
    fn test_array_yields_aggregation() {
        let mut out = Vec::new();
        find_relationships(
            &QualType::array_of(QualType::record("a::B")),
            &mut out,
            RelationshipKind::Dependency,
        );
        assert_eq!(out[0].kind, RelationshipKind::Aggregation);
    }

    #[test]
    fn test_value_record_keeps_hint() {
        let mut out = Vec::new();
        find_relationships(
            &QualType::record("a::B"),
            &mut out,
            RelationshipKind::Composition,
        );
        assert_eq!(out[0].kind, RelationshipKind::Composition);
    }

    #[test]
    fn test_enum_keeps_hint() {
        let mut out = Vec::new();
        find_relationships(
            &QualType::enumeration("a::Color"),
            &mut out,
            RelationshipKind::Dependency,
        );
        assert_eq!(out[0].kind, RelationshipKind::Dependency);
        assert_eq!(out[0].target_kind, TargetKind::Enum);
    }

    #[test]
    fn test_specialization_recurses_with_hint() {
        let mut out = Vec::new();
        let unique_ptr = QualType::specialization(
            "std::unique_ptr",
            [TemplateArg::Type {
                value: QualType::record("impl::widget"),
            }],
        );
        find_relationships(&unique_ptr, &mut out, RelationshipKind::Aggregation);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, "impl::widget");
        assert_eq!(out[0].kind, RelationshipKind::Aggregation);
    }

    #[test]
    fn test_function_proto_args_yield_dependencies() {
        let mut out = Vec::new();
        let callback = QualType::specialization(
            "std::function",
            [TemplateArg::Type {
                value: QualType::FunctionProto {
                    return_type: Box::new(QualType::Void),
                    parameters: vec![QualType::record("a::Event")],
                },
            }],
        );
        find_relationships(&callback, &mut out, RelationshipKind::Composition);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, RelationshipKind::Dependency);
        assert_eq!(out[0].target, "a::Event");
    }

    #[test]
    fn test_owning_smart_pointer_detection() {
        let unique = QualType::specialization(
            "std::unique_ptr",
            [TemplateArg::Type {
                value: QualType::record("a::B"),
            }],
        );
        assert!(is_owning_smart_pointer(&unique));
        assert!(!is_owning_smart_pointer(&QualType::record("a::B")));
        assert!(!is_owning_smart_pointer(&QualType::specialization(
            "std::vector",
            [],
        )));
    }

    #[test]
    fn test_alias_index_resolution() {
        let mut tu = TranslationUnit::new("a.cc");
        tu.declarations.push(Decl::Alias(AliasDecl {
            qualified_name: "app::WidgetPtr".to_string(),
            aliased: QualType::record("app::Widget"),
            location: None,
        }));

        let index = AliasIndex::build(&tu);
        assert_eq!(index.resolve("app::WidgetPtr"), "app::Widget");
        assert_eq!(index.resolve("WidgetPtr"), "app::Widget");
        assert_eq!(index.resolve("unknown"), "unknown");
    }
}
