// PlantUML generation
//
// Each generator is a pure function of the model plus the per-diagram
// config. Output is wrapped in `@startuml` / `@enduml`, with the config's
// `before` and `after` blocks spliced inside the wrapper.

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::config::DiagramConfig;
use crate::diagram::class::{Class, ClassDiagram, ClassKind};
use crate::diagram::include::IncludeDiagram;
use crate::diagram::package::PackageDiagram;
use crate::diagram::sequence::{Activity, MessageKind, SequenceDiagram};
use crate::diagram::DiagramModel;
use crate::model::{Namespace, RelationshipKind};

/// Render any diagram model as PlantUML
pub fn generate(model: &DiagramModel, config: &DiagramConfig) -> String {
    let body = match model {
        DiagramModel::Class(diagram) => class_body(diagram, config),
        DiagramModel::Package(diagram) => package_body(diagram),
        DiagramModel::Include(diagram) => include_body(diagram),
        DiagramModel::Sequence(diagram) => sequence_body(diagram, config),
    };

    let mut lines = vec!["@startuml".to_string()];
    if let Some(title) = &config.title {
        lines.push(format!("title {}", title));
    }
    lines.extend(config.before.iter().cloned());
    lines.extend(body);
    lines.extend(config.after.iter().cloned());
    lines.push("@enduml".to_string());
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn alias(prefix: &str, id: impl std::fmt::Display) -> String {
    format!("{}_{}", prefix, id)
}

fn class_body(diagram: &ClassDiagram, config: &DiagramConfig) -> Vec<String> {
    let mut lines = Vec::new();
    let root = diagram.root_namespace();

    if config.generate_packages {
        // Group elements under their namespace, one package block per
        // namespace prefix
        let mut groups: BTreeMap<String, Vec<&Class>> = BTreeMap::new();
        for class in diagram.elements() {
            let ns = class.element.namespace.relative_to(root).to_string();
            groups.entry(ns).or_default().push(class);
        }
        for (ns, classes) in groups {
            let indent = if ns.is_empty() {
                ""
            } else {
                lines.push(format!("package \"{}\" {{", ns));
                "    "
            };
            for class in classes {
                lines.extend(class_declaration(class, root, config, indent));
            }
            if !ns.is_empty() {
                lines.push("}".to_string());
            }
        }
    } else {
        for class in diagram.elements() {
            lines.extend(class_declaration(class, root, config, ""));
        }
    }

    for relationship in diagram.relationships() {
        let source = alias("C", relationship.source);
        let target = alias("C", relationship.target);
        let label = relationship
            .label
            .as_ref()
            .map(|l| format!(" : {}{}", relationship.access.symbol(), l))
            .unwrap_or_default();
        let line = match relationship.kind {
            RelationshipKind::Extension => format!("{} <|-- {}", target, source),
            RelationshipKind::Composition => format!("{} *-- {}{}", source, target, label),
            RelationshipKind::Aggregation => format!("{} o-- {}{}", source, target, label),
            RelationshipKind::Association => format!("{} --> {}{}", source, target, label),
            RelationshipKind::Dependency => format!("{} ..> {}", source, target),
            RelationshipKind::Instantiation => format!("{} ..|> {}", source, target),
            RelationshipKind::Friendship => format!("{} <.. {} : <<friend>>", target, source),
            RelationshipKind::Constraint => format!("{} ..> {} : <<constraint>>", source, target),
            RelationshipKind::Includes => format!("{} --> {}", source, target),
        };
        lines.push(line);
    }

    // Containment edges for nested types
    for class in diagram.elements() {
        if let Some(parent) = class.nested_in {
            lines.push(format!(
                "{} +-- {}",
                alias("C", parent),
                alias("C", class.id())
            ));
        }
    }

    lines
}

fn class_declaration(
    class: &Class,
    root: &Namespace,
    config: &DiagramConfig,
    indent: &str,
) -> Vec<String> {
    let mut lines = Vec::new();
    let display = class.display_name(root);
    let id = alias("C", class.id());

    let keyword = match class.kind {
        ClassKind::Enum => "enum",
        ClassKind::Concept => "protocol",
        _ if class.is_abstract => "abstract",
        _ => "class",
    };
    let stereotype = match class.kind {
        ClassKind::Struct => " <<struct>>",
        ClassKind::Union => " <<union>>",
        ClassKind::Concept => " <<concept>>",
        _ => "",
    };

    lines.push(format!(
        "{}{} \"{}\" as {}{} {{",
        indent, keyword, display, id, stereotype
    ));

    for constant in &class.constants {
        lines.push(format!("{}    {}", indent, constant));
    }

    for member in &class.members {
        let modifier = if member.is_static { " {static}" } else { "" };
        lines.push(format!(
            "{}    {}{} : {}{}",
            indent,
            member.access.symbol(),
            member.name,
            member.r#type,
            modifier
        ));
    }

    for method in &class.methods {
        let arguments = if config.generate_method_arguments {
            method
                .parameters
                .iter()
                .map(|p| {
                    if p.name.is_empty() {
                        p.r#type.clone()
                    } else {
                        format!("{} {}", p.r#type, p.name)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            String::new()
        };
        let mut modifiers = String::new();
        if method.is_static {
            modifiers.push_str(" {static}");
        }
        if method.is_pure_virtual {
            modifiers.push_str(" {abstract}");
        }
        let constness = if method.is_const { " const" } else { "" };
        lines.push(format!(
            "{}    {}{}({}){} : {}{}",
            indent,
            method.access.symbol(),
            method.name,
            arguments,
            constness,
            method.return_type,
            modifiers
        ));
    }

    lines.push(format!("{}}}", indent));
    lines
}

fn package_body(diagram: &PackageDiagram) -> Vec<String> {
    let mut lines = Vec::new();
    let root = diagram.root_namespace();

    // Nest package blocks along the namespace hierarchy
    let mut children: BTreeMap<String, Vec<&crate::diagram::package::Package>> = BTreeMap::new();
    for package in diagram.packages() {
        let parent = package
            .element
            .namespace
            .relative_to(root)
            .to_string();
        children.entry(parent).or_default().push(package);
    }

    fn emit(
        parent_path: &str,
        children: &BTreeMap<String, Vec<&crate::diagram::package::Package>>,
        root: &Namespace,
        depth: usize,
        lines: &mut Vec<String>,
    ) {
        let Some(packages) = children.get(parent_path) else {
            return;
        };
        let indent = "    ".repeat(depth);
        for package in packages {
            lines.push(format!(
                "{}package \"{}\" as {} {{",
                indent,
                package.element.name,
                alias("P", package.id())
            ));
            let own_path = package
                .element
                .namespace
                .relative_to(root)
                .qualify(&package.element.name);
            emit(&own_path, children, root, depth + 1, lines);
            lines.push(format!("{}}}", indent));
        }
    }

    // Roots are packages whose parent namespace has no package node of its
    // own in the rendered tree
    let rendered_paths: HashSet<String> = diagram
        .packages()
        .iter()
        .map(|p| {
            p.element
                .namespace
                .relative_to(root)
                .qualify(&p.element.name)
        })
        .collect();
    let mut roots: Vec<String> = children
        .keys()
        .filter(|parent| parent.is_empty() || !rendered_paths.contains(*parent))
        .cloned()
        .collect();
    roots.sort();
    roots.dedup();
    for root_path in roots {
        emit(&root_path, &children, root, 0, &mut lines);
    }

    for relationship in diagram.relationships() {
        lines.push(format!(
            "{} ..> {}",
            alias("P", relationship.source),
            alias("P", relationship.target)
        ));
    }

    lines
}

fn include_body(diagram: &IncludeDiagram) -> Vec<String> {
    let mut lines = Vec::new();
    for file in diagram.files() {
        let stereotype = format!(" <<{:?}>>", file.origin).to_lowercase();
        lines.push(format!(
            "file \"{}\" as {}{}",
            file.display_name,
            alias("F", file.id),
            stereotype
        ));
    }
    for relationship in diagram.relationships() {
        lines.push(format!(
            "{} --> {}",
            alias("F", relationship.source),
            alias("F", relationship.target)
        ));
    }
    lines
}

fn sequence_body(diagram: &SequenceDiagram, config: &DiagramConfig) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in diagram.entry_points(&config.start_from) {
        let mut active: Vec<String> = vec![entry.usr.clone()];
        emit_activity(diagram, entry, &mut active, &mut lines);
    }
    lines
}

/// Render an activity's messages, recursing into callee activities
///
/// Recursion targets already on the active stack are not re-walked.
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
                let from = relative_participant(&message.from, root);
                let to = relative_participant(&message.to, root);
                lines.push(format!("\"{}\" -> \"{}\" : {}", from, to, message.name));
                lines.push(format!("activate \"{}\"", to));

                if !active.contains(&message.to_usr) {
                    if let Some(callee) = diagram.activity(&message.to_usr) {
                        active.push(message.to_usr.clone());
                        emit_activity(diagram, callee, active, lines);
                        active.pop();
                    }
                }

                // A call pairs with a return unless the callee returns void
                if message.from != message.to && message.return_type != "void" {
                    lines.push(format!("\"{}\" --> \"{}\"", to, from));
                }
                lines.push(format!("deactivate \"{}\"", to));
            }
            MessageKind::Return => {
                let from = relative_participant(&message.from, root);
                let to = relative_participant(&message.to, root);
                lines.push(format!("\"{}\" --> \"{}\"", from, to));
            }
            MessageKind::ConditionalEnter => lines.push("alt".to_string()),
            MessageKind::ConditionalExit | MessageKind::LoopExit => lines.push("end".to_string()),
            MessageKind::LoopEnter => lines.push("loop".to_string()),
        }
    }
}

fn relative_participant(name: &str, root: &Namespace) -> String {
    Namespace::parse(name).relative_to(root).to_string()
}
