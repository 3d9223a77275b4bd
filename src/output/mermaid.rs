// MermaidJS generation
//
// Mirrors the PlantUML generators with Mermaid's dialect: `classDiagram`,
// `sequenceDiagram`, and `flowchart` for package and include graphs. Node
// ids are sanitized since Mermaid identifiers cannot carry `::` or angle
// brackets.

use crate::config::DiagramConfig;
use crate::diagram::class::{ClassDiagram, ClassKind};
use crate::diagram::include::IncludeDiagram;
use crate::diagram::package::PackageDiagram;
use crate::diagram::sequence::{Activity, MessageKind, SequenceDiagram};
use crate::diagram::DiagramModel;
use crate::model::{Namespace, RelationshipKind};

/// Render any diagram model as MermaidJS
pub fn generate(model: &DiagramModel, config: &DiagramConfig) -> String {
    let lines = match model {
        DiagramModel::Class(diagram) => class_body(diagram),
        DiagramModel::Package(diagram) => package_body(diagram),
        DiagramModel::Include(diagram) => include_body(diagram),
        DiagramModel::Sequence(diagram) => sequence_body(diagram, config),
    };
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Sanitize a string for use as a Mermaid node id
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn class_body(diagram: &ClassDiagram) -> Vec<String> {
    let mut lines = vec!["classDiagram".to_string()];
    let root = diagram.root_namespace();

    for class in diagram.elements() {
        let id = format!("C_{}", class.id());
        let display = class.display_name(root);
        lines.push(format!("    class {}[\"{}\"] {{", id, display));
        if class.kind == ClassKind::Enum {
            lines.push("        <<enumeration>>".to_string());
            for constant in &class.constants {
                lines.push(format!("        {}", constant));
            }
        }
        for member in &class.members {
            lines.push(format!(
                "        {}{} : {}",
                member.access.symbol(),
                member.name,
                member.r#type
            ));
        }
        for method in &class.methods {
            lines.push(format!(
                "        {}{}() {}",
                method.access.symbol(),
                method.name,
                method.return_type
            ));
        }
        lines.push("    }".to_string());
    }

    for relationship in diagram.relationships() {
        let source = format!("C_{}", relationship.source);
        let target = format!("C_{}", relationship.target);
        let line = match relationship.kind {
            RelationshipKind::Extension => format!("    {} <|-- {}", target, source),
            RelationshipKind::Composition => format!("    {} *-- {}", source, target),
            RelationshipKind::Aggregation => format!("    {} o-- {}", source, target),
            RelationshipKind::Association => format!("    {} --> {}", source, target),
            RelationshipKind::Instantiation => format!("    {} ..|> {}", source, target),
            _ => format!("    {} ..> {}", source, target),
        };
        lines.push(line);
    }

    lines
}

fn package_body(diagram: &PackageDiagram) -> Vec<String> {
    let mut lines = vec!["flowchart TD".to_string()];
    for package in diagram.packages() {
        let id = sanitize_id(&package.qualified_name());
        lines.push(format!("    {}[{}]", id, package.element.name));
    }
    for relationship in diagram.relationships() {
        let source = diagram.get(relationship.source);
        let target = diagram.get(relationship.target);
        if let (Some(source), Some(target)) = (source, target) {
            lines.push(format!(
                "    {} --> {}",
                sanitize_id(&source.qualified_name()),
                sanitize_id(&target.qualified_name())
            ));
        }
    }
    lines
}

fn include_body(diagram: &IncludeDiagram) -> Vec<String> {
    let mut lines = vec!["flowchart TD".to_string()];
    for file in diagram.files() {
        lines.push(format!(
            "    {}[\"{}\"]",
            sanitize_id(&file.display_name),
            file.display_name
        ));
    }
    for relationship in diagram.relationships() {
        if let (Some(source), Some(target)) = (
            diagram.get(relationship.source),
            diagram.get(relationship.target),
        ) {
            lines.push(format!(
                "    {} --> {}",
                sanitize_id(&source.display_name),
                sanitize_id(&target.display_name)
            ));
        }
    }
    lines
}

fn sequence_body(diagram: &SequenceDiagram, config: &DiagramConfig) -> Vec<String> {
    let mut lines = vec!["sequenceDiagram".to_string()];
    for entry in diagram.entry_points(&config.start_from) {
        let mut active = vec![entry.usr.clone()];
        emit_activity(diagram, entry, &mut active, &mut lines);
    }
    lines
}

fn emit_activity(
    diagram: &SequenceDiagram,
    activity: &Activity,
    active: &mut Vec<String>,
    lines: &mut Vec<String>,
) {
    let root = diagram.root_namespace();
    for message in &activity.messages {
        match message.kind {
            MessageKind::Call => {
                let from = participant(&message.from, root);
                let to = participant(&message.to, root);
                lines.push(format!("    {}->>{}: {}", from, to, message.name));
                if !active.contains(&message.to_usr) {
                    if let Some(callee) = diagram.activity(&message.to_usr) {
                        active.push(message.to_usr.clone());
                        emit_activity(diagram, callee, active, lines);
                        active.pop();
                    }
                }
                if message.from != message.to && message.return_type != "void" {
                    lines.push(format!("    {}-->>{}: ", to, from));
                }
            }
            MessageKind::Return => {
                let from = participant(&message.from, root);
                let to = participant(&message.to, root);
                lines.push(format!("    {}-->>{}: ", from, to));
            }
            MessageKind::ConditionalEnter => lines.push("    alt".to_string()),
            MessageKind::LoopEnter => lines.push("    loop".to_string()),
            MessageKind::ConditionalExit | MessageKind::LoopExit => {
                lines.push("    end".to_string())
            }
        }
    }
}

fn participant(name: &str, root: &Namespace) -> String {
    sanitize_id(&Namespace::parse(name).relative_to(root).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::class::Class;
    use crate::diagram::package::Package;
    use crate::filter::DiagramFilter;
    use crate::model::Relationship;

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("a::b::C"), "a__b__C");
        assert_eq!(sanitize_id("G<T>"), "G_T_");
        assert_eq!(sanitize_id("main.cc"), "main_cc");
    }

    #[test]
    fn test_class_diagram_header() {
        let mut diagram = ClassDiagram::new("t", Namespace::new(), DiagramFilter::default());
        diagram
            .add_class(Class::new(Namespace::new(), "A", ClassKind::Class))
            .unwrap();
        let out = generate(
            &DiagramModel::Class(diagram),
            &DiagramConfig::default(),
        );
        assert!(out.starts_with("classDiagram"));
        assert!(out.contains("class C_"));
    }

    #[test]
    fn test_extension_arrow_direction() {
        let mut diagram = ClassDiagram::new("t", Namespace::new(), DiagramFilter::default());
        let base = diagram
            .add_class(Class::new(Namespace::new(), "Base", ClassKind::Class))
            .unwrap();
        let derived = diagram
            .add_class(Class::new(Namespace::new(), "Derived", ClassKind::Class))
            .unwrap();
        diagram.add_relationship(Relationship::new(
            derived,
            base,
            RelationshipKind::Extension,
        ));

        let out = generate(&DiagramModel::Class(diagram), &DiagramConfig::default());
        assert!(out.contains(&format!("C_{} <|-- C_{}", base, derived)));
    }

    #[test]
    fn test_package_flowchart() {
        let mut diagram = PackageDiagram::new("t", Namespace::new(), DiagramFilter::default());
        let a = diagram.add_package(Package::new(&Namespace::parse("a"))).unwrap();
        let b = diagram.add_package(Package::new(&Namespace::parse("b"))).unwrap();
        diagram.add_dependency(a, b);
        diagram.finalize();

        let out = generate(&DiagramModel::Package(diagram), &DiagramConfig::default());
        assert!(out.starts_with("flowchart TD"));
        assert!(out.contains("a --> b"));
    }
}
