// Include diagram translation unit visitor
//
// Edges run from each file to every file it includes, as reported by the
// front-end's preprocessor hooks. File origin is labelled from the project
// root: system headers stay system, files under the root are project files,
// everything else is external.

use std::path::{Path, PathBuf};

use crate::config::DiagramConfig;
use crate::diagram::include::{FileOrigin, IncludeDiagram, SourceFile};
use crate::error::Result;
use crate::frontend::TranslationUnit;

pub struct IncludeDiagramVisitor<'a> {
    diagram: &'a mut IncludeDiagram,
    #[allow(dead_code)]
    config: &'a DiagramConfig,
    project_root: PathBuf,
}

impl<'a> IncludeDiagramVisitor<'a> {
    pub fn new(
        diagram: &'a mut IncludeDiagram,
        config: &'a DiagramConfig,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            diagram,
            config,
            project_root: project_root.into(),
        }
    }

    pub fn visit_translation_unit(&mut self, tu: &TranslationUnit) -> Result<()> {
        if !self.diagram.should_include(&tu.path) {
            return Ok(());
        }

        let tu_id = self
            .diagram
            .add_file(SourceFile::new(&tu.path, FileOrigin::Project));

        for include in &tu.includes {
            let origin = self.classify(&include.path, include.is_system);
            if origin != FileOrigin::System && !self.diagram.should_include(&include.path) {
                continue;
            }

            let target = self
                .diagram
                .add_file(SourceFile::new(&include.path, origin));

            let source = match &include.source {
                Some(from) if from != &tu.path => {
                    let origin = self.classify(from, false);
                    self.diagram.add_file(SourceFile::new(from, origin))
                }
                _ => tu_id,
            };

            self.diagram.add_include(source, target);
        }

        Ok(())
    }

    fn classify(&self, path: &Path, is_system: bool) -> FileOrigin {
        if is_system {
            FileOrigin::System
        } else if path.starts_with(&self.project_root) {
            FileOrigin::Project
        } else {
            FileOrigin::External
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DiagramFilter;
    use crate::frontend::IncludeDirective;
    use crate::model::RelationshipKind;

    fn tu_with_includes(path: &str, includes: Vec<IncludeDirective>) -> TranslationUnit {
        let mut tu = TranslationUnit::new(path);
        tu.includes = includes;
        tu
    }

    #[test]
    fn test_edges_from_translation_unit() {
        let mut diagram = IncludeDiagram::new("inc", DiagramFilter::default());
        let config = DiagramConfig::default();
        let tu = tu_with_includes(
            "/p/src/main.cc",
            vec![
                IncludeDirective {
                    path: PathBuf::from("/p/src/widget.h"),
                    is_system: false,
                    source: None,
                },
                IncludeDirective {
                    path: PathBuf::from("/usr/include/vector"),
                    is_system: true,
                    source: None,
                },
            ],
        );

        IncludeDiagramVisitor::new(&mut diagram, &config, "/p")
            .visit_translation_unit(&tu)
            .unwrap();

        assert_eq!(diagram.files().len(), 3);
        assert_eq!(diagram.relationships().len(), 2);
        assert!(diagram
            .relationships()
            .iter()
            .all(|r| r.kind == RelationshipKind::Includes));

        let vector = diagram.find("/usr/include/vector").unwrap();
        assert_eq!(vector.origin, FileOrigin::System);
        let widget = diagram.find("/p/src/widget.h").unwrap();
        assert_eq!(widget.origin, FileOrigin::Project);
    }

    #[test]
    fn test_external_classification() {
        let mut diagram = IncludeDiagram::new("inc", DiagramFilter::default());
        let config = DiagramConfig::default();
        let tu = tu_with_includes(
            "/p/src/main.cc",
            vec![IncludeDirective {
                path: PathBuf::from("/vendor/lib.h"),
                is_system: false,
                source: None,
            }],
        );

        IncludeDiagramVisitor::new(&mut diagram, &config, "/p")
            .visit_translation_unit(&tu)
            .unwrap();

        assert_eq!(
            diagram.find("/vendor/lib.h").unwrap().origin,
            FileOrigin::External
        );
    }

    #[test]
    fn test_header_to_header_edge() {
        let mut diagram = IncludeDiagram::new("inc", DiagramFilter::default());
        let config = DiagramConfig::default();
        let tu = tu_with_includes(
            "/p/src/main.cc",
            vec![IncludeDirective {
                path: PathBuf::from("/p/src/b.h"),
                is_system: false,
                source: Some(PathBuf::from("/p/src/a.h")),
            }],
        );

        IncludeDiagramVisitor::new(&mut diagram, &config, "/p")
            .visit_translation_unit(&tu)
            .unwrap();

        let a = diagram.find("/p/src/a.h").unwrap();
        let b = diagram.find("/p/src/b.h").unwrap();
        assert!(diagram
            .relationships()
            .iter()
            .any(|r| r.source == a.id && r.target == b.id));
    }
}
