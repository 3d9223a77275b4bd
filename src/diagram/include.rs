// Include diagram model
//
// A directed graph of source and header files with `includes` edges. File
// origin (system, project, external) is labelled from the configured path
// roots.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::filter::DiagramFilter;
use crate::model::{DiagramId, Relationship, RelationshipKind};

/// Where an included file comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOrigin {
    System,
    Project,
    External,
}

/// A file node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFile {
    pub id: DiagramId,
    pub path: PathBuf,
    /// Path rendered relative to the configured root
    pub display_name: String,
    pub origin: FileOrigin,
    pub is_header: bool,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, origin: FileOrigin) -> Self {
        let path = path.into();
        let is_header = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("h" | "hh" | "hpp" | "hxx" | "inc")
        );
        Self {
            id: DiagramId::of_path(&path),
            display_name: path.to_string_lossy().into_owned(),
            path,
            origin,
            is_header,
        }
    }

    /// Re-render the display name relative to a root directory
    pub fn relativize(&mut self, root: &Path) {
        if let Ok(stripped) = self.path.strip_prefix(root) {
            self.display_name = stripped.to_string_lossy().into_owned();
        }
    }
}

/// The include diagram model
#[derive(Debug, Default, Serialize)]
pub struct IncludeDiagram {
    pub name: String,
    files: Vec<SourceFile>,
    relationships: Vec<Relationship>,
    #[serde(skip)]
    index: HashMap<DiagramId, usize>,
    #[serde(skip)]
    filter: DiagramFilter,
}

impl IncludeDiagram {
    pub fn new(name: impl Into<String>, filter: DiagramFilter) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            relationships: Vec::new(),
            index: HashMap::new(),
            filter,
        }
    }

    pub fn filter(&self) -> &DiagramFilter {
        &self.filter
    }

    pub fn should_include(&self, path: &Path) -> bool {
        self.filter.should_include_path(path)
    }

    pub fn add_file(&mut self, file: SourceFile) -> DiagramId {
        let id = file.id;
        if !self.index.contains_key(&id) {
            self.index.insert(id, self.files.len());
            self.files.push(file);
        }
        id
    }

    /// Record that `source` includes `target`
    pub fn add_include(&mut self, source: DiagramId, target: DiagramId) {
        let edge = Relationship::new(source, target, RelationshipKind::Includes);
        if !self.relationships.contains(&edge) {
            self.relationships.push(edge);
        }
    }

    pub fn get(&self, id: DiagramId) -> Option<&SourceFile> {
        self.index.get(&id).map(|&slot| &self.files[slot])
    }

    pub fn find(&self, display_name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.display_name == display_name)
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Consume the diagram into its files and edges, for the merge phase
    pub fn into_parts(self) -> (Vec<SourceFile>, Vec<Relationship>) {
        (self.files, self.relationships)
    }

    /// Drop edges whose endpoints were filtered out, and relativize display
    /// names against the configured root
    pub fn finalize(&mut self, relative_to: Option<&Path>) {
        let index = &self.index;
        self.relationships
            .retain(|r| index.contains_key(&r.source) && index.contains_key(&r.target));
        if let Some(root) = relative_to {
            for file in &mut self.files {
                file.relativize(root);
            }
        }
    }
}
