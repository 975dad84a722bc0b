//! The set tree

use indexmap::IndexMap;

use super::Dependency;

/// A node of the set tree: dependencies by name and child sets by segment
#[derive(Debug, Clone, Default)]
pub struct DependencySet {
    path: String,
    dependencies: IndexMap<String, Dependency>,
    children: IndexMap<String, DependencySet>,
}

impl DependencySet {
    pub(crate) fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Full dotted path; empty for the root
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.get(name)
    }

    /// Dependencies in registration order
    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.values()
    }

    pub fn child(&self, segment: &str) -> Option<&DependencySet> {
        self.children.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = &DependencySet> {
        self.children.values()
    }

    pub(crate) fn child_mut(&mut self, segment: &str) -> Option<&mut DependencySet> {
        self.children.get_mut(segment)
    }

    pub(crate) fn insert_child(&mut self, segment: &str, child: DependencySet) -> &mut DependencySet {
        self.children.entry(segment.to_string()).or_insert(child)
    }

    pub(crate) fn dependency_mut(&mut self, name: &str) -> Option<&mut Dependency> {
        self.dependencies.get_mut(name)
    }

    pub(crate) fn insert_dependency(&mut self, dependency: Dependency) -> &mut Dependency {
        self.dependencies
            .entry(dependency.name().to_string())
            .or_insert(dependency)
    }

    /// This set and every descendant, depth first
    pub(crate) fn walk<'a>(&'a self, out: &mut Vec<&'a DependencySet>) {
        out.push(self);
        for child in self.children.values() {
            child.walk(out);
        }
    }
}
