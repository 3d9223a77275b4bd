// Diagram element filter engine
//
// Each diagram config carries an include and an exclude block. An element is
// admitted iff at least one inclusion predicate holds (an empty include
// block admits everything) and no exclusion predicate holds. The filter is
// consulted before adding an element and before adding a relationship; for
// relationships both endpoints must already have been admitted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::{tokenize_template_parameter, Access, Namespace, RelationshipKind};

/// One include or exclude block of a diagram configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterBlock {
    /// Namespace prefixes, matched in qualified-name token order
    pub namespaces: Vec<String>,
    /// Globs over normalized source paths
    pub paths: Vec<String>,
    /// Fully qualified element names
    pub elements: Vec<String>,
    /// Element kinds: class, enum, concept, package, file, function
    pub element_types: Vec<String>,
    /// Relationship kinds
    pub relationships: Vec<String>,
    /// Access specifiers: public, protected, private
    pub access: Vec<String>,
    /// Roots whose transitive subclasses are selected
    pub subclasses: Vec<String>,
    /// Primary templates whose specializations are selected
    pub specializations: Vec<String>,
    /// Elements selected when an enclosing (parent) element matches
    pub parents: Vec<String>,
    /// Elements selected when one of their dependency targets matches
    pub dependencies: Vec<String>,
}

impl FilterBlock {
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
            && self.paths.is_empty()
            && self.elements.is_empty()
            && self.element_types.is_empty()
            && self.relationships.is_empty()
            && self.access.is_empty()
            && self.subclasses.is_empty()
            && self.specializations.is_empty()
            && self.parents.is_empty()
            && self.dependencies.is_empty()
    }
}

/// Outcome of a filter consultation
///
/// `Deferred` applies when a predicate needs information that is not in the
/// diagram yet, e.g. a specialization whose primary template has not been
/// visited; the visitor retries deferred candidates until a fix-point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    Admitted,
    Excluded,
    Deferred,
}

/// A candidate element under filter evaluation
#[derive(Debug, Clone, Default)]
pub struct FilterCandidate<'a> {
    pub qualified_name: &'a str,
    pub element_type: Option<&'a str>,
    pub access: Option<Access>,
    pub file: Option<&'a Path>,
    /// Qualified names of the candidate's transitive ancestors, when known;
    /// `None` means the inheritance chain cannot be resolved yet
    pub ancestors: Option<&'a [String]>,
    /// Primary template of a specialization, when known; `None` with
    /// `is_specialization` set means the primary is not known yet
    pub specializes: Option<&'a str>,
    pub is_specialization: bool,
    /// Qualified names of the candidate's enclosing (parent) elements,
    /// innermost first, when known
    pub parents: Option<&'a [String]>,
    /// Qualified names of the types the candidate depends on, when known
    pub dependencies: Option<&'a [String]>,
}

impl<'a> FilterCandidate<'a> {
    pub fn named(qualified_name: &'a str) -> Self {
        Self {
            qualified_name,
            ..Default::default()
        }
    }

    pub fn with_type(mut self, element_type: &'a str) -> Self {
        self.element_type = Some(element_type);
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_file(mut self, file: &'a Path) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_ancestors(mut self, ancestors: &'a [String]) -> Self {
        self.ancestors = Some(ancestors);
        self
    }

    pub fn with_specializes(mut self, primary: Option<&'a str>) -> Self {
        self.specializes = primary;
        self.is_specialization = true;
        self
    }

    pub fn with_parents(mut self, parents: &'a [String]) -> Self {
        self.parents = Some(parents);
        self
    }

    pub fn with_dependencies(mut self, dependencies: &'a [String]) -> Self {
        self.dependencies = Some(dependencies);
        self
    }
}

/// The compiled filter of one diagram
#[derive(Debug, Clone, Default)]
pub struct DiagramFilter {
    include: FilterBlock,
    exclude: FilterBlock,
    /// Base directory for relative path predicates
    root: PathBuf,
}

impl DiagramFilter {
    pub fn new(include: FilterBlock, exclude: FilterBlock) -> Self {
        Self {
            include,
            exclude,
            root: PathBuf::new(),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Evaluate a candidate against both blocks
    pub fn classify(&self, candidate: &FilterCandidate) -> FilterResult {
        if self.matches_block(&self.exclude, candidate) == BlockMatch::Yes {
            return FilterResult::Excluded;
        }

        if self.include.is_empty() {
            return FilterResult::Admitted;
        }

        match self.matches_block(&self.include, candidate) {
            BlockMatch::Yes => FilterResult::Admitted,
            BlockMatch::Unknown => FilterResult::Deferred,
            BlockMatch::No => FilterResult::Excluded,
        }
    }

    /// Plain admitted/rejected query by qualified name
    pub fn should_include(&self, qualified_name: &str) -> bool {
        self.classify(&FilterCandidate::named(qualified_name)) == FilterResult::Admitted
    }

    /// Whether a source path is admitted
    pub fn should_include_path(&self, path: &Path) -> bool {
        if self.path_match(&self.exclude.paths, path) {
            return false;
        }
        if self.include.paths.is_empty() {
            return true;
        }
        self.path_match(&self.include.paths, path)
    }

    /// Whether relationships of this kind are admitted
    pub fn should_include_relationship(&self, kind: RelationshipKind) -> bool {
        let name = kind.to_string();
        if self.exclude.relationships.contains(&name) {
            return false;
        }
        self.include.relationships.is_empty() || self.include.relationships.contains(&name)
    }

    /// Whether members with this access are admitted
    pub fn should_include_access(&self, access: Access) -> bool {
        let name = access.to_string();
        if self.exclude.access.contains(&name) {
            return false;
        }
        self.include.access.is_empty() || self.include.access.contains(&name)
    }

    fn matches_block(&self, block: &FilterBlock, candidate: &FilterCandidate) -> BlockMatch {
        let mut unknown = false;

        if !candidate.qualified_name.is_empty() {
            if block
                .namespaces
                .iter()
                .any(|ns| namespace_match(ns, candidate.qualified_name))
            {
                return BlockMatch::Yes;
            }
            if block
                .elements
                .iter()
                .any(|e| element_match(e, candidate.qualified_name))
            {
                return BlockMatch::Yes;
            }
        }

        if let Some(element_type) = candidate.element_type {
            if block.element_types.iter().any(|t| t == element_type) {
                return BlockMatch::Yes;
            }
        }

        if let Some(access) = candidate.access {
            if block.access.iter().any(|a| *a == access.to_string()) {
                return BlockMatch::Yes;
            }
        }

        if let Some(file) = candidate.file {
            if self.path_match(&block.paths, file) {
                return BlockMatch::Yes;
            }
        }

        if !block.subclasses.is_empty() {
            if block
                .subclasses
                .iter()
                .any(|root| element_match(root, candidate.qualified_name))
            {
                return BlockMatch::Yes;
            }
            match candidate.ancestors {
                Some(ancestors) => {
                    if block
                        .subclasses
                        .iter()
                        .any(|root| ancestors.iter().any(|a| element_match(root, a)))
                    {
                        return BlockMatch::Yes;
                    }
                }
                None => unknown = true,
            }
        }

        if !block.specializations.is_empty() && candidate.is_specialization {
            match candidate.specializes {
                Some(primary) => {
                    if block
                        .specializations
                        .iter()
                        .any(|root| element_match(root, primary))
                    {
                        return BlockMatch::Yes;
                    }
                }
                None => unknown = true,
            }
        }

        if !block.parents.is_empty() {
            match candidate.parents {
                Some(parents) => {
                    if block
                        .parents
                        .iter()
                        .any(|rule| parents.iter().any(|p| element_match(rule, p)))
                    {
                        return BlockMatch::Yes;
                    }
                }
                None => unknown = true,
            }
        }

        if !block.dependencies.is_empty() {
            match candidate.dependencies {
                Some(dependencies) => {
                    if block
                        .dependencies
                        .iter()
                        .any(|rule| dependencies.iter().any(|d| element_match(rule, d)))
                    {
                        return BlockMatch::Yes;
                    }
                }
                None => unknown = true,
            }
        }

        if unknown {
            BlockMatch::Unknown
        } else {
            BlockMatch::No
        }
    }

    fn path_match(&self, patterns: &[String], path: &Path) -> bool {
        if patterns.is_empty() {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        patterns.iter().any(|raw| {
            glob::Pattern::new(raw)
                .map(|p| p.matches_path(path) || p.matches_path(relative))
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockMatch {
    Yes,
    No,
    Unknown,
}

/// Namespace predicates match by prefix in qualified-name token order
fn namespace_match(rule: &str, qualified_name: &str) -> bool {
    Namespace::parse(qualified_name).starts_with(&Namespace::parse(rule))
}

/// Element predicates match the full qualified name; template spellings are
/// compared token-wise so whitespace variants agree
fn element_match(rule: &str, qualified_name: &str) -> bool {
    if rule == qualified_name {
        return true;
    }
    if rule.contains('<') || qualified_name.contains('<') {
        return tokenize_template_parameter(rule) == tokenize_template_parameter(qualified_name);
    }
    false
}
