// Front-end adapter interface
//
// The traversal consumes translation units through the `Frontend` trait; a
// clang-based adapter implements it out of tree. `JsonFrontend` loads trees
// an adapter dumped to disk, `StaticFrontend` serves in-memory trees and is
// what the test suites use.

pub mod ast;
pub mod compdb;

pub use ast::{
    AliasDecl, BaseSpecifier, CallExpr, ConceptDecl, Decl, EnumDecl, FieldDecl, FriendDecl,
    FunctionDecl, IncludeDirective, MethodDecl, NamespaceDecl, ParamDecl, QualType, RecordDecl,
    RecordKind, SourceLoc, Stmt, TemplateArg, TemplateParamDecl, TemplateParamKind,
    TranslationUnit, Usr,
};
pub use compdb::{CompilationDatabase, CompileCommand};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Produces the declaration tree of a translation unit
///
/// Implementations must be shareable across the engine's worker threads.
pub trait Frontend: Sync {
    fn parse_translation_unit(&self, path: &Path) -> Result<TranslationUnit>;
}

/// Loads declaration trees an external adapter serialized as
/// `<file>.ast.json`, either next to the source file or mirrored under a
/// dedicated directory
#[derive(Debug, Clone, Default)]
pub struct JsonFrontend {
    ast_dir: Option<PathBuf>,
}

impl JsonFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ast_dir(ast_dir: impl Into<PathBuf>) -> Self {
        Self {
            ast_dir: Some(ast_dir.into()),
        }
    }

    fn candidate_paths(&self, path: &Path) -> Vec<PathBuf> {
        let mut sibling = path.as_os_str().to_owned();
        sibling.push(".ast.json");
        let mut candidates = vec![PathBuf::from(sibling)];

        if let (Some(dir), Some(file_name)) = (&self.ast_dir, path.file_name()) {
            let mut name = file_name.to_owned();
            name.push(".ast.json");
            candidates.push(dir.join(name));
        }
        candidates
    }
}

impl Frontend for JsonFrontend {
    fn parse_translation_unit(&self, path: &Path) -> Result<TranslationUnit> {
        for candidate in self.candidate_paths(path) {
            if !candidate.exists() {
                continue;
            }
            let contents = std::fs::read_to_string(&candidate)?;
            return serde_json::from_str(&contents)
                .map_err(|e| Error::translation_unit(path, e.to_string()));
        }
        Err(Error::translation_unit(
            path,
            "no serialized declaration tree found",
        ))
    }
}

/// Serves pre-built translation units from memory
#[derive(Debug, Clone, Default)]
pub struct StaticFrontend {
    units: HashMap<PathBuf, TranslationUnit>,
}

impl StaticFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, unit: TranslationUnit) -> &mut Self {
        self.units.insert(unit.path.clone(), unit);
        self
    }
}

impl Frontend for StaticFrontend {
    fn parse_translation_unit(&self, path: &Path) -> Result<TranslationUnit> {
        self.units
            .get(path)
            .cloned()
            .ok_or_else(|| Error::translation_unit(path, "translation unit not registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_frontend() {
        let mut frontend = StaticFrontend::new();
        frontend.add(TranslationUnit::new("/src/a.cc"));

        assert!(frontend.parse_translation_unit(Path::new("/src/a.cc")).is_ok());
        let err = frontend
            .parse_translation_unit(Path::new("/src/missing.cc"))
            .unwrap_err();
        assert!(err.is_local());
    }

    #[test]
    fn test_json_frontend_sibling_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.cc");
        let tu = TranslationUnit::new(&source);
        std::fs::write(
            dir.path().join("a.cc.ast.json"),
            serde_json::to_string(&tu).unwrap(),
        )
        .unwrap();

        let frontend = JsonFrontend::new();
        let parsed = frontend.parse_translation_unit(&source).unwrap();
        assert_eq!(parsed.path, source);
    }

    #[test]
    fn test_json_frontend_ast_dir() {
        let src_dir = tempfile::tempdir().unwrap();
        let ast_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("b.cc");
        let tu = TranslationUnit::new(&source);
        std::fs::write(
            ast_dir.path().join("b.cc.ast.json"),
            serde_json::to_string(&tu).unwrap(),
        )
        .unwrap();

        let frontend = JsonFrontend::with_ast_dir(ast_dir.path());
        assert!(frontend.parse_translation_unit(&source).is_ok());
    }

    #[test]
    fn test_json_frontend_missing_tree() {
        let frontend = JsonFrontend::new();
        let err = frontend
            .parse_translation_unit(Path::new("/nowhere/z.cc"))
            .unwrap_err();
        assert!(err.is_local());
    }
}
