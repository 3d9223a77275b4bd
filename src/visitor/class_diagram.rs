// Class diagram translation unit visitor
//
// Builds class, enum and concept elements, records bases, members, methods
// and friends, and synthesizes relationships from every referenced type.

use std::path::PathBuf;
use tracing::debug;

use super::{find_relationships, is_owning_smart_pointer, AliasIndex, FoundRelationship};
use crate::config::DiagramConfig;
use crate::diagram::class::{
    BaseClass, Class, ClassDiagram, ClassKind, ClassMember, ClassMethod, MethodParameter,
};
use crate::error::Result;
use crate::filter::{FilterCandidate, FilterResult};
use crate::frontend::{
    ConceptDecl, Decl, EnumDecl, MethodDecl, QualType, RecordDecl, RecordKind, SourceLoc,
    TemplateArg, TemplateParamDecl, TemplateParamKind, TranslationUnit,
};
use crate::model::{
    canonicalize, parse_unexposed_template_params, render_param_list, DiagramId, Relationship,
    RelationshipKind, SourceLocation, TemplateParameter,
};

pub struct ClassDiagramVisitor<'a> {
    diagram: &'a mut ClassDiagram,
    config: &'a DiagramConfig,
    tu_path: PathBuf,
    aliases: AliasIndex,
    /// Records whose filter decision needs diagram state not yet present,
    /// with their enclosing-record chains
    deferred: Vec<(RecordDecl, Vec<String>)>,
}

impl<'a> ClassDiagramVisitor<'a> {
    pub fn new(diagram: &'a mut ClassDiagram, config: &'a DiagramConfig) -> Self {
        Self {
            diagram,
            config,
            tu_path: PathBuf::new(),
            aliases: AliasIndex::default(),
            deferred: Vec::new(),
        }
    }

    pub fn visit_translation_unit(&mut self, tu: &TranslationUnit) -> Result<()> {
        self.tu_path = tu.path.clone();
        self.aliases = AliasIndex::build(tu);
        for decl in &tu.declarations {
            self.visit_decl(decl)?;
        }
        self.drain_deferred()
    }

    fn visit_decl(&mut self, decl: &Decl) -> Result<()> {
        match decl {
            Decl::Namespace(ns) => {
                for nested in &ns.declarations {
                    self.visit_decl(nested)?;
                }
            }
            Decl::Record(record) => self.process_record(record, &[])?,
            Decl::Enum(decl) => self.process_enum(decl, &[])?,
            Decl::Concept(decl) => self.process_concept(decl)?,
            Decl::Function(_) | Decl::Alias(_) => {}
        }
        Ok(())
    }

    /// Retry deferred records until no further progress is made
    fn drain_deferred(&mut self) -> Result<()> {
        loop {
            let pending = std::mem::take(&mut self.deferred);
            if pending.is_empty() {
                return Ok(());
            }
            let before = pending.len();
            for (record, parents) in &pending {
                self.process_record(record, parents)?;
            }
            if self.deferred.len() == before {
                debug!(
                    count = before,
                    "records unresolved beyond fix-point, dropping"
                );
                self.deferred.clear();
                return Ok(());
            }
        }
    }

    fn process_record(&mut self, record: &RecordDecl, parents: &[String]) -> Result<()> {
        if in_system_header(record.location.as_ref()) {
            return Ok(());
        }

        let full_name = self.record_full_name(record);

        let ancestors = self.resolved_ancestors(record);
        let dependencies = record_dependency_targets(record);
        let mut candidate = FilterCandidate::named(&full_name)
            .with_type("class")
            .with_parents(parents)
            .with_dependencies(&dependencies);
        if let Some(location) = &record.location {
            candidate = candidate.with_file(&location.file);
        }
        if let Some(ancestors) = &ancestors {
            candidate = candidate.with_ancestors(ancestors);
        }
        if record.specializes.is_some() {
            candidate = candidate.with_specializes(record.specializes.as_deref());
        }

        // An excluded record still gets its nested declarations visited;
        // a parents predicate may admit them independently
        let admitted = match self.diagram.filter().classify(&candidate) {
            FilterResult::Excluded => false,
            FilterResult::Deferred => {
                self.deferred.push((record.clone(), parents.to_vec()));
                return Ok(());
            }
            FilterResult::Admitted => true,
        };

        if admitted {
            self.add_record(record)?;
        }

        let mut nested_parents = Vec::with_capacity(parents.len() + 1);
        nested_parents.push(full_name);
        nested_parents.extend(parents.iter().cloned());
        for nested in &record.nested_records {
            self.process_record(nested, &nested_parents)?;
        }
        for nested in &record.nested_enums {
            self.process_enum(nested, &nested_parents)?;
        }

        Ok(())
    }

    /// Build the class element and its relationships for an admitted record
    fn add_record(&mut self, record: &RecordDecl) -> Result<()> {
        let mut class = self.build_class(record);
        let class_id = class.id();

        let mut relationships: Vec<Relationship> = Vec::new();

        for base in &record.bases {
            if let Some(name) = base.r#type.as_record_name() {
                class.bases.push(BaseClass {
                    id: DiagramId::of(&canonicalize(name)),
                    access: base.access,
                    is_virtual: base.is_virtual,
                });
            }
        }

        for field in &record.fields {
            if !self.diagram.filter().should_include_access(field.access) {
                continue;
            }
            class.members.push(ClassMember {
                name: field.name.clone(),
                r#type: field.r#type.canonical_name(),
                access: field.access,
                is_static: field.is_static,
                is_const: field.is_const,
            });

            let hint = if is_owning_smart_pointer(&field.r#type) {
                RelationshipKind::Aggregation
            } else {
                RelationshipKind::Composition
            };
            let mut found = Vec::new();
            find_relationships(&field.r#type, &mut found, hint);
            for rel in found {
                if let Some(r) = self.relationship_from(class_id, &rel) {
                    relationships
                        .push(r.with_label(field.name.clone()).with_access(field.access));
                }
            }
        }

        for method in &record.methods {
            if !self.diagram.filter().should_include_access(method.access) {
                continue;
            }
            class.methods.push(self.build_method(method));

            // Implicitly defaulted template methods contribute no edges
            // unless explicitly enabled
            if !method.template_params.is_empty()
                && method.is_defaulted
                && !method.is_explicitly_defaulted
                && !self.config.process_implicit_defaults
            {
                continue;
            }

            let mut found = Vec::new();
            find_relationships(&method.return_type, &mut found, RelationshipKind::Dependency);
            for parameter in &method.parameters {
                find_relationships(&parameter.r#type, &mut found, RelationshipKind::Dependency);
            }
            for rel in found {
                if let Some(r) = self.relationship_from(class_id, &rel) {
                    relationships.push(r);
                }
            }
        }

        for friend in &record.friends {
            if let Some(name) = friend
                .referenced_type
                .as_ref()
                .and_then(QualType::as_record_name)
            {
                if self.diagram.should_include(name) {
                    let friend_id = DiagramId::of(&canonicalize(name));
                    class.friends.push(friend_id);
                    relationships.push(Relationship::new(
                        class_id,
                        friend_id,
                        RelationshipKind::Friendship,
                    ));
                }
            }
        }

        for parameter in &record.template_params {
            if let Some(constraint) = &parameter.constraint {
                if self.diagram.should_include(constraint) {
                    relationships.push(Relationship::new(
                        class_id,
                        DiagramId::of(&canonicalize(constraint)),
                        RelationshipKind::Constraint,
                    ));
                }
            }
        }

        if let Some(primary) = &record.specializes {
            relationships.push(Relationship::new(
                class_id,
                DiagramId::of(&canonicalize(primary)),
                RelationshipKind::Instantiation,
            ));
        }

        self.diagram.add_class(class)?;
        for relationship in relationships {
            if self
                .diagram
                .filter()
                .should_include_relationship(relationship.kind)
            {
                self.diagram.add_relationship(relationship);
            }
        }

        Ok(())
    }

    fn process_enum(&mut self, decl: &EnumDecl, parents: &[String]) -> Result<()> {
        if in_system_header(decl.location.as_ref()) {
            return Ok(());
        }

        let mut candidate = FilterCandidate::named(&decl.qualified_name)
            .with_type("enum")
            .with_parents(parents)
            .with_dependencies(&[]);
        if let Some(location) = &decl.location {
            candidate = candidate.with_file(&location.file);
        }
        if self.diagram.filter().classify(&candidate) != FilterResult::Admitted {
            return Ok(());
        }

        let (namespace, name) = crate::model::split_name(&decl.qualified_name);
        let mut class = Class::new(namespace, name, ClassKind::Enum);
        class.element.access = decl.access;
        class.element.comment = decl.comment.clone();
        class.element.deprecated = decl.is_deprecated;
        class.element.location = self.source_location(decl.location.as_ref());
        class.constants = decl.constants.clone();

        self.diagram.add_class(class)?;
        Ok(())
    }

    fn process_concept(&mut self, decl: &ConceptDecl) -> Result<()> {
        let candidate = FilterCandidate::named(&decl.qualified_name).with_type("concept");
        if self.diagram.filter().classify(&candidate) != FilterResult::Admitted {
            return Ok(());
        }

        let (namespace, name) = crate::model::split_name(&decl.qualified_name);
        let mut class = Class::new(namespace, name, ClassKind::Concept);
        class.is_template = true;
        class.element.comment = decl.comment.clone();
        class.element.location = self.source_location(decl.location.as_ref());
        class.template_params = decl
            .template_params
            .iter()
            .map(template_param_from_decl)
            .collect();
        class.element.id = DiagramId::of(&canonicalize(&class.full_name()));

        self.diagram.add_class(class)?;
        Ok(())
    }

    fn build_class(&self, record: &RecordDecl) -> Class {
        let (namespace, name) = crate::model::split_name(&record.qualified_name);
        let kind = match record.kind {
            RecordKind::Class => ClassKind::Class,
            RecordKind::Struct => ClassKind::Struct,
            RecordKind::Union => ClassKind::Union,
        };

        let mut class = Class::new(namespace, name, kind);
        class.is_abstract = record.is_abstract;
        class.is_complete = record.is_complete;
        class.element.comment = record.comment.clone();
        class.element.deprecated = record.is_deprecated;
        class.element.location = self.source_location(record.location.as_ref());

        if record.is_template() {
            class.is_template = true;
            class.template_params = if record.specializes.is_some() {
                record
                    .template_args
                    .iter()
                    .map(|arg| self.template_param_from_arg(arg))
                    .collect()
            } else {
                record
                    .template_params
                    .iter()
                    .map(template_param_from_decl)
                    .collect()
            };
            // Template identity derives from the full spelling, so one
            // specialization seen in many translation units is one node
            class.element.id = DiagramId::of(&canonicalize(&class.full_name()));
        }

        class
    }

    fn build_method(&self, method: &MethodDecl) -> ClassMethod {
        ClassMethod {
            name: method.name.clone(),
            return_type: method.return_type.canonical_name(),
            parameters: method
                .parameters
                .iter()
                .map(|p| MethodParameter {
                    name: p.name.clone(),
                    r#type: p.r#type.canonical_name(),
                    default_value: p.default_value.clone(),
                })
                .collect(),
            access: method.access,
            is_static: method.is_static,
            is_const: method.is_const,
            is_virtual: method.is_virtual,
            is_pure_virtual: method.is_pure_virtual,
            is_defaulted: method.is_defaulted,
        }
    }

    /// Full spelling of a record including its template parameter or
    /// argument list
    fn record_full_name(&self, record: &RecordDecl) -> String {
        if record.specializes.is_some() {
            let args: Vec<String> = record.template_args.iter().map(|a| a.to_string()).collect();
            canonicalize(&format!("{}<{}>", record.qualified_name, args.join(",")))
        } else if !record.template_params.is_empty() {
            let params: Vec<TemplateParameter> = record
                .template_params
                .iter()
                .map(template_param_from_decl)
                .collect();
            canonicalize(&format!(
                "{}{}",
                record.qualified_name,
                render_param_list(&params)
            ))
        } else {
            canonicalize(&record.qualified_name)
        }
    }

    /// Transitive ancestors by qualified name; `None` while a base has not
    /// been added to the diagram yet
    fn resolved_ancestors(&self, record: &RecordDecl) -> Option<Vec<String>> {
        let mut out = Vec::new();
        for base in &record.bases {
            let name = canonicalize(base.r#type.as_record_name()?);
            let base_id = DiagramId::of(&name);
            out.push(name);
            match self.diagram.get(base_id) {
                Some(_) => out.extend(self.diagram.ancestors_of(base_id)),
                None => return None,
            }
        }
        Some(out)
    }

    fn relationship_from(
        &self,
        source: DiagramId,
        found: &FoundRelationship,
    ) -> Option<Relationship> {
        let target = canonicalize(&found.target);
        if !self.diagram.should_include(&target) {
            return None;
        }
        Some(Relationship::new(
            source,
            DiagramId::of(&target),
            found.kind,
        ))
    }

    fn template_param_from_arg(&self, arg: &TemplateArg) -> TemplateParameter {
        match arg {
            TemplateArg::Type {
                value: QualType::Unexposed { spelling },
            } => {
                let resolve = |name: &str| self.aliases.resolve(name);
                let mut parsed = parse_unexposed_template_params(spelling, &resolve, 0);
                if parsed.len() == 1 {
                    parsed.remove(0)
                } else {
                    let mut param = TemplateParameter::make_unexposed_argument(spelling.clone());
                    param.params = parsed;
                    param
                }
            }
            TemplateArg::Type { value } => {
                TemplateParameter::make_argument(value.canonical_name())
            }
            TemplateArg::Integral { value } => {
                TemplateParameter::make_non_type(value.to_string())
            }
            TemplateArg::Expression { value } => {
                TemplateParameter::make_unexposed_argument(value.clone())
            }
            TemplateArg::Template { name } => {
                TemplateParameter::make_template_template(name.clone())
            }
            TemplateArg::TemplateExpansion { name } => {
                let mut param = TemplateParameter::make_template_template(name.clone());
                param.is_variadic = true;
                param
            }
            TemplateArg::NullPtr => TemplateParameter::make_non_type("nullptr"),
            TemplateArg::Null => TemplateParameter::make_argument(""),
        }
    }

    fn source_location(&self, loc: Option<&SourceLoc>) -> Option<SourceLocation> {
        loc.map(|l| SourceLocation {
            file: l.file.clone(),
            line: l.line,
            column: l.column,
            translation_unit: self.tu_path.clone(),
        })
    }
}

fn template_param_from_decl(decl: &TemplateParamDecl) -> TemplateParameter {
    let mut param = match decl.kind {
        TemplateParamKind::Type => TemplateParameter::make_template_type(decl.name.clone()),
        TemplateParamKind::NonType => TemplateParameter::make_non_type(decl.name.clone()),
        TemplateParamKind::Template => {
            TemplateParameter::make_template_template(decl.name.clone())
        }
    };
    param.is_variadic = decl.is_variadic;
    param.default_value = decl.default_value.clone();
    if let Some(constraint) = &decl.constraint {
        param.r#type = Some(constraint.clone());
    }
    param
}

fn in_system_header(loc: Option<&SourceLoc>) -> bool {
    loc.map(|l| l.is_system_header).unwrap_or(false)
}

/// Qualified names of every type a record's bases, fields, methods and
/// friends reference, for the dependency filter predicate
fn record_dependency_targets(record: &RecordDecl) -> Vec<String> {
    let mut found = Vec::new();
    for base in &record.bases {
        find_relationships(&base.r#type, &mut found, RelationshipKind::Dependency);
    }
    for field in &record.fields {
        find_relationships(&field.r#type, &mut found, RelationshipKind::Dependency);
    }
    for method in &record.methods {
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

    let mut targets: Vec<String> = found
        .into_iter()
        .map(|rel| canonicalize(&rel.target))
        .collect();
    targets.sort();
    targets.dedup();
    targets
}
