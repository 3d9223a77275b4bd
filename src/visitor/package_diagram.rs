// Package diagram translation unit visitor
//
// Namespaces become packages; a declaration inside namespace A referencing a
// type declared inside namespace B contributes a dependency A -> B.

use std::path::PathBuf;
use tracing::debug;

use super::{find_relationships, FoundRelationship};
use crate::config::DiagramConfig;
use crate::diagram::package::{Package, PackageDiagram};
use crate::error::Result;
use crate::frontend::{Decl, NamespaceDecl, RecordDecl, SourceLoc, TranslationUnit};
use crate::model::{canonicalize, DiagramId, Namespace, RelationshipKind, SourceLocation};

pub struct PackageDiagramVisitor<'a> {
    diagram: &'a mut PackageDiagram,
    config: &'a DiagramConfig,
    tu_path: PathBuf,
}

impl<'a> PackageDiagramVisitor<'a> {
    pub fn new(diagram: &'a mut PackageDiagram, config: &'a DiagramConfig) -> Self {
        Self {
            diagram,
            config,
            tu_path: PathBuf::new(),
        }
    }

    pub fn visit_translation_unit(&mut self, tu: &TranslationUnit) -> Result<()> {
        self.tu_path = tu.path.clone();
        let root = Namespace::new();
        for decl in &tu.declarations {
            self.visit_decl(decl, &root)?;
        }
        Ok(())
    }

    fn visit_decl(&mut self, decl: &Decl, current: &Namespace) -> Result<()> {
        match decl {
            Decl::Namespace(ns) => self.visit_namespace(ns, current),
            Decl::Record(record) => {
                self.process_record(record, current);
                Ok(())
            }
            Decl::Function(function) => {
                if !in_system_header(function.location.as_ref()) {
                    let mut found = Vec::new();
                    find_relationships(
                        &function.return_type,
                        &mut found,
                        RelationshipKind::Dependency,
                    );
                    for parameter in &function.parameters {
                        find_relationships(
                            &parameter.r#type,
                            &mut found,
                            RelationshipKind::Dependency,
                        );
                    }
                    self.add_relationships(current, &found);
                }
                Ok(())
            }
            Decl::Enum(_) | Decl::Concept(_) | Decl::Alias(_) => Ok(()),
        }
    }

    /// Anonymous and inline namespaces do not become packages, but their
    /// contents still belong to the enclosing namespace
    fn visit_namespace(&mut self, ns: &NamespaceDecl, current: &Namespace) -> Result<()> {
        let path = if ns.is_anonymous || ns.is_inline {
            current.clone()
        } else {
            let path = Namespace::parse(&ns.qualified_name);
            debug!(namespace = %path, "visiting namespace declaration");

            // The using_namespace root itself has an empty relative name
            // and is not rendered as a package
            let inside_root = path.relative_to(self.diagram.root_namespace()).is_empty();

            if !inside_root
                && self.diagram.should_include(&path.to_string())
                && self.diagram.get(DiagramId::of(&path.to_string())).is_none()
            {
                let mut package = Package::new(&path);
                package.element.comment = ns.comment.clone();
                package.element.deprecated = ns.is_deprecated;
                package.element.location = ns.location.as_ref().map(|l| SourceLocation {
                    file: l.file.clone(),
                    line: l.line,
                    column: l.column,
                    translation_unit: self.tu_path.clone(),
                });
                self.diagram.add_package(package)?;
            }
            path
        };

        for nested in &ns.declarations {
            self.visit_decl(nested, &path)?;
        }
        Ok(())
    }

    /// Dependency relationships from a record's bases, fields, and methods
    fn process_record(&mut self, record: &RecordDecl, current: &Namespace) {
        if in_system_header(record.location.as_ref()) {
            return;
        }

        let mut found = Vec::new();

        for base in &record.bases {
            find_relationships(&base.r#type, &mut found, RelationshipKind::Dependency);
        }

        for field in &record.fields {
            find_relationships(&field.r#type, &mut found, RelationshipKind::Dependency);
        }

        for method in &record.methods {
            // Implicitly defaulted template methods are skipped unless
            // explicitly enabled
            if !method.template_params.is_empty()
                && method.is_defaulted
                && !method.is_explicitly_defaulted
                && !self.config.process_implicit_defaults
            {
                continue;
            }
            find_relationships(&method.return_type, &mut found, RelationshipKind::Dependency);
            for parameter in &method.parameters {
                find_relationships(&parameter.r#type, &mut found, RelationshipKind::Dependency);
            }
        }

        for friend in &record.friends {
            if let Some(r#type) = &friend.referenced_type {
                find_relationships(r#type, &mut found, RelationshipKind::Dependency);
            }
        }

        self.add_relationships(current, &found);

        for nested in &record.nested_records {
            self.process_record(nested, current);
        }
    }

    /// Map each found target to its enclosing namespace and record the
    /// package dependency
    fn add_relationships(&mut self, current: &Namespace, found: &[FoundRelationship]) {
        if current.is_empty() {
            return;
        }
        let current_id = DiagramId::of(&canonicalize(&current.to_string()));

        for relationship in found {
            let mut target_ns = Namespace::parse(&relationship.target);
            target_ns.pop_back();
            if target_ns.is_empty() {
                continue;
            }
            let target_name = target_ns.to_string();
            if self.diagram.should_include(&target_name) {
                self.diagram
                    .add_dependency(current_id, DiagramId::of(&canonicalize(&target_name)));
            }
        }
    }
}

fn in_system_header(loc: Option<&SourceLoc>) -> bool {
    loc.map(|l| l.is_system_header).unwrap_or(false)
}
