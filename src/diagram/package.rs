// Package diagram model
//
// Every non-anonymous, non-inline namespace is a package node. A dependency
// edge A -> B exists iff at least one declaration inside A references a type
// declared inside B; self-edges are suppressed.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::filter::DiagramFilter;
use crate::model::{DiagramId, Element, Namespace, Relationship, RelationshipKind};

/// A namespace promoted to a first-class node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    #[serde(flatten)]
    pub element: Element,
    /// Ids of packages this package depends on
    pub dependencies: BTreeSet<DiagramId>,
}

impl Package {
    /// Create a package for a namespace path; the id derives from the full
    /// namespace-qualified name
    pub fn new(namespace_path: &Namespace) -> Self {
        let mut parent = namespace_path.clone();
        let name = parent.pop_back().unwrap_or_default();
        Self {
            element: Element::new(parent, name),
            dependencies: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> DiagramId {
        self.element.id
    }

    pub fn qualified_name(&self) -> String {
        self.element.qualified_name()
    }
}

/// The package diagram model
#[derive(Debug, Default, Serialize)]
pub struct PackageDiagram {
    pub name: String,
    pub using_namespace: Namespace,
    packages: Vec<Package>,
    #[serde(skip)]
    index: HashMap<DiagramId, usize>,
    #[serde(skip)]
    filter: DiagramFilter,
}

impl PackageDiagram {
    pub fn new(name: impl Into<String>, using_namespace: Namespace, filter: DiagramFilter) -> Self {
        Self {
            name: name.into(),
            using_namespace,
            packages: Vec::new(),
            index: HashMap::new(),
            filter,
        }
    }

    pub fn filter(&self) -> &DiagramFilter {
        &self.filter
    }

    pub fn root_namespace(&self) -> &Namespace {
        &self.using_namespace
    }

    pub fn should_include(&self, qualified_name: &str) -> bool {
        self.filter.should_include(qualified_name)
    }

    /// Add or merge a package node
    pub fn add_package(&mut self, package: Package) -> Result<DiagramId> {
        let id = package.id();
        if let Some(&slot) = self.index.get(&id) {
            let existing = &mut self.packages[slot];
            if existing.qualified_name() != package.qualified_name() {
                return Err(Error::IdentityCollision {
                    first: existing.qualified_name(),
                    second: package.qualified_name(),
                    id: id.value(),
                });
            }
            existing.dependencies.extend(package.dependencies);
            existing.element.absorb(package.element);
        } else {
            self.index.insert(id, self.packages.len());
            self.packages.push(package);
        }
        Ok(id)
    }

    /// Record a dependency between two packages; self-edges are ignored
    pub fn add_dependency(&mut self, source: DiagramId, target: DiagramId) {
        if source == target {
            return;
        }
        if let Some(&slot) = self.index.get(&source) {
            self.packages[slot].dependencies.insert(target);
        }
    }

    pub fn get(&self, id: DiagramId) -> Option<&Package> {
        self.index.get(&id).map(|&slot| &self.packages[slot])
    }

    pub fn find(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| {
            p.element.name == name
                || p.qualified_name() == name
                || p.element.display_name(&self.using_namespace) == name
        })
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Consume the diagram into its package nodes, for the merge phase
    pub fn into_packages(self) -> Vec<Package> {
        self.packages
    }

    /// Dependency edges as relationship records
    pub fn relationships(&self) -> Vec<Relationship> {
        self.packages
            .iter()
            .flat_map(|p| {
                p.dependencies
                    .iter()
                    .map(|&target| Relationship::new(p.id(), target, RelationshipKind::Dependency))
            })
            .collect()
    }

    /// Drop dependencies on namespaces that never became packages
    pub fn finalize(&mut self) {
        let known: BTreeSet<DiagramId> = self.index.keys().copied().collect();
        for package in &mut self.packages {
            package.dependencies.retain(|d| known.contains(d));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(path: &str) -> Package {
        Package::new(&Namespace::parse(path))
    }

    #[test]
    fn test_package_id_matches_namespace_hash() {
        let p = package("app::core");
        assert_eq!(p.id(), DiagramId::of("app::core"));
        assert_eq!(p.qualified_name(), "app::core");
        assert_eq!(p.element.name, "core");
    }

    #[test]
    fn test_add_and_find() {
        let mut d = PackageDiagram::new("pkg", Namespace::parse("app"), DiagramFilter::default());
        d.add_package(package("app::core")).unwrap();

        assert!(d.find("core").is_some());
        assert!(d.find("app::core").is_some());
        assert!(d.find("ui").is_none());
    }

    #[test]
    fn test_self_dependency_suppressed() {
        let mut d = PackageDiagram::new("pkg", Namespace::new(), DiagramFilter::default());
        let id = d.add_package(package("a")).unwrap();
        d.add_dependency(id, id);
        assert!(d.get(id).unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_dependency_edges() {
        let mut d = PackageDiagram::new("pkg", Namespace::new(), DiagramFilter::default());
        let a = d.add_package(package("a")).unwrap();
        let b = d.add_package(package("b")).unwrap();
        d.add_dependency(a, b);
        d.add_dependency(a, b);

        d.finalize();
        let edges = d.relationships();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, a);
        assert_eq!(edges[0].target, b);
        assert_eq!(edges[0].kind, RelationshipKind::Dependency);
    }

    #[test]
    fn test_finalize_drops_unknown_targets() {
        let mut d = PackageDiagram::new("pkg", Namespace::new(), DiagramFilter::default());
        let a = d.add_package(package("a")).unwrap();
        d.add_dependency(a, DiagramId::of("never::seen"));
        d.finalize();
        assert!(d.relationships().is_empty());
    }

    #[test]
    fn test_merge_unions_dependencies() {
        let mut d = PackageDiagram::new("pkg", Namespace::new(), DiagramFilter::default());
        let b = d.add_package(package("b")).unwrap();
        let c = d.add_package(package("c")).unwrap();

        let mut first = package("a");
        first.dependencies.insert(b);
        let mut second = package("a");
        second.dependencies.insert(c);

        let a = d.add_package(first).unwrap();
        d.add_package(second).unwrap();

        assert_eq!(d.packages().len(), 3);
        assert_eq!(d.get(a).unwrap().dependencies.len(), 2);
    }

    #[test]
    fn test_cyclic_dependencies_allowed() {
        let mut d = PackageDiagram::new("pkg", Namespace::new(), DiagramFilter::default());
        let a = d.add_package(package("a")).unwrap();
        let b = d.add_package(package("b")).unwrap();
        d.add_dependency(a, b);
        d.add_dependency(b, a);
        d.finalize();
        assert_eq!(d.relationships().len(), 2);
    }
}
