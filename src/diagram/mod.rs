// Diagram models for the four diagram kinds

pub mod class;
pub mod include;
pub mod package;
pub mod sequence;

pub use class::{BaseClass, Class, ClassDiagram, ClassKind, ClassMember, ClassMethod};
pub use include::{FileOrigin, IncludeDiagram, SourceFile};
pub use package::{Package, PackageDiagram};
pub use sequence::{Activity, Message, MessageKind, SequenceDiagram};

use serde::Serialize;

/// A finished diagram of any kind
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiagramModel {
    Class(ClassDiagram),
    Package(PackageDiagram),
    Include(IncludeDiagram),
    Sequence(SequenceDiagram),
}

impl DiagramModel {
    pub fn name(&self) -> &str {
        match self {
            DiagramModel::Class(d) => &d.name,
            DiagramModel::Package(d) => &d.name,
            DiagramModel::Include(d) => &d.name,
            DiagramModel::Sequence(d) => &d.name,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DiagramModel::Class(d) => d.is_empty(),
            DiagramModel::Package(d) => d.is_empty(),
            DiagramModel::Include(d) => d.is_empty(),
            DiagramModel::Sequence(d) => d.is_empty(),
        }
    }
}
