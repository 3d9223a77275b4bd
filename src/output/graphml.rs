// GraphML generation
//
// Emits the element/relationship graph as GraphML with `name` and `kind`
// keys on nodes and a `kind` key on edges.

use crate::config::DiagramConfig;
use crate::diagram::DiagramModel;
use crate::model::{DiagramId, Relationship};

/// Render any diagram model as GraphML
pub fn generate(model: &DiagramModel, _config: &DiagramConfig) -> String {
    let (nodes, edges) = collect(model);

    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">"#.to_string(),
        r#"  <key id="name" for="node" attr.name="name" attr.type="string"/>"#.to_string(),
        r#"  <key id="kind" for="node" attr.name="kind" attr.type="string"/>"#.to_string(),
        r#"  <key id="relation" for="edge" attr.name="kind" attr.type="string"/>"#.to_string(),
        format!(
            r#"  <graph id="{}" edgedefault="directed">"#,
            escape(model.name())
        ),
    ];

    for (id, name, kind) in nodes {
        lines.push(format!(r#"    <node id="n{}">"#, id));
        lines.push(format!(r#"      <data key="name">{}</data>"#, escape(&name)));
        lines.push(format!(r#"      <data key="kind">{}</data>"#, kind));
        lines.push("    </node>".to_string());
    }

    for edge in edges {
        lines.push(format!(
            r#"    <edge source="n{}" target="n{}">"#,
            edge.source, edge.target
        ));
        lines.push(format!(
            r#"      <data key="relation">{}</data>"#,
            edge.kind
        ));
        lines.push("    </edge>".to_string());
    }

    lines.push("  </graph>".to_string());
    lines.push("</graphml>".to_string());
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

type Node = (DiagramId, String, &'static str);

fn collect(model: &DiagramModel) -> (Vec<Node>, Vec<Relationship>) {
    match model {
        DiagramModel::Class(diagram) => {
            let root = diagram.root_namespace();
            let nodes = diagram
                .elements()
                .iter()
                .map(|c| (c.id(), c.display_name(root), c.kind.as_str()))
                .collect();
            (nodes, diagram.relationships().to_vec())
        }
        DiagramModel::Package(diagram) => {
            let root = diagram.root_namespace();
            let nodes = diagram
                .packages()
                .iter()
                .map(|p| {
                    (
                        p.id(),
                        p.element.display_name(root),
                        "package",
                    )
                })
                .collect();
            (nodes, diagram.relationships())
        }
        DiagramModel::Include(diagram) => {
            let nodes = diagram
                .files()
                .iter()
                .map(|f| (f.id, f.display_name.clone(), "file"))
                .collect();
            (nodes, diagram.relationships().to_vec())
        }
        DiagramModel::Sequence(diagram) => {
            // Participants become nodes, calls become edges
            let mut nodes: Vec<Node> = Vec::new();
            let mut edges = Vec::new();
            for activity in diagram.sequences().values() {
                let id = DiagramId::of(&activity.participant);
                if !nodes.iter().any(|(existing, _, _)| *existing == id) {
                    nodes.push((id, activity.participant.clone(), "participant"));
                }
                for message in &activity.messages {
                    let to = DiagramId::of(&message.to);
                    if !nodes.iter().any(|(existing, _, _)| *existing == to) {
                        nodes.push((to, message.to.clone(), "participant"));
                    }
                    edges.push(Relationship::new(
                        DiagramId::of(&message.from),
                        to,
                        crate::model::RelationshipKind::Dependency,
                    ));
                }
            }
            (nodes, edges)
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
