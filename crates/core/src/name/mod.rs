//! Hierarchical index of dot-delimited names.
//!
//! Used by the widget catalogue to group widget types by namespace. It is
//! independent from the runtime component tree.

use serde::Serialize;

pub const DELIMITER: char = '.';

/// One node of the name index.
///
/// `path` is fixed when the node is created and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Name {
    value: String,
    path: String,
    children: Vec<Name>,
}

impl Name {
    /// Creates a root node. The root's accumulated path is always empty.
    pub fn root(label: impl Into<String>) -> Self {
        Self {
            value: label.into(),
            path: String::new(),
            children: Vec::new(),
        }
    }

    fn child_of(parent_path: &str, value: &str) -> Self {
        let path = if parent_path.is_empty() {
            value.to_string()
        } else {
            format!("{parent_path}{DELIMITER}{value}")
        };
        Self {
            value: value.to_string(),
            path,
            children: Vec::new(),
        }
    }

    /// Builds a sorted tree out of `paths`. Duplicate paths collapse into one node.
    pub fn tree_of_paths<I, S>(root_label: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut root = Self::root(root_label);
        for path in paths {
            root.add_path(path.as_ref());
        }
        root.sort();
        root
    }

    /// Inserts `path` below this node, reusing existing segments. Empty
    /// segments, as in `a..b` or `.a`, are skipped.
    pub fn add_path(&mut self, path: &str) {
        let (segment, rest) = match path.split_once(DELIMITER) {
            Some((segment, rest)) => (segment, Some(rest)),
            None => (path, None),
        };
        let node = if segment.is_empty() {
            self
        } else {
            self.child_or_insert(segment)
        };
        if let Some(rest) = rest {
            node.add_path(rest);
        }
    }

    fn child_or_insert(&mut self, segment: &str) -> &mut Name {
        let index = match self.children.iter().position(|child| child.value == segment) {
            Some(index) => index,
            None => {
                self.children.push(Self::child_of(&self.path, segment));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Sorts every level alphabetically by segment value. The sort is stable.
    pub fn sort(&mut self) {
        self.children.sort_by(|a, b| a.value.cmp(&b.value));
        for child in &mut self.children {
            child.sort();
        }
    }

    /// The segment this node stands for.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Full dot-joined path from the root to this node.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn children(&self) -> &[Name] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Looks up the node for a full path below this node.
    pub fn find(&self, path: &str) -> Option<&Name> {
        if path.is_empty() {
            return Some(self);
        }
        let (segment, rest) = match path.split_once(DELIMITER) {
            Some((segment, rest)) => (segment, rest),
            None => (path, ""),
        };
        self.children
            .iter()
            .find(|child| child.value == segment)
            .and_then(|child| child.find(rest))
    }

    /// Depth-first list of every leaf below this node.
    pub fn leaves(&self) -> Vec<&Name> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Name>) {
        for child in &self.children {
            if child.is_leaf() {
                out.push(child);
            } else {
                child.collect_leaves(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(name: &Name) -> Vec<&str> {
        name.children().iter().map(Name::value).collect()
    }

    #[test]
    fn duplicates_collapse_and_levels_sort() {
        let root = Name::tree_of_paths("root", ["a.b", "a.c", "a.b"]);

        assert_eq!(root.path(), "");
        assert_eq!(values(&root), vec!["a"]);
        let a = &root.children()[0];
        assert_eq!(values(a), vec!["b", "c"]);
        assert_eq!(a.children()[1].path(), "a.c");
    }

    #[test]
    fn sorting_is_recursive() {
        let root = Name::tree_of_paths(
            "Widgets",
            ["Media.Playlist", "Tools.Logger", "Media.Image", "Tools.Terminal", "Browser"],
        );

        assert_eq!(values(&root), vec!["Browser", "Media", "Tools"]);
        for node in root.children() {
            let names = values(node);
            let mut sorted = names.clone();
            sorted.sort();
            assert_eq!(names, sorted);
        }
        assert_eq!(root.leaves().len(), 5);
    }

    #[test]
    fn empty_path_is_ignored() {
        let mut root = Name::root("root");
        root.add_path("");
        assert!(root.is_leaf());
    }

    #[test]
    fn empty_segments_are_skipped() {
        let root = Name::tree_of_paths("root", ["a..b", ".a", "c.", "..", "a.b"]);

        let top: Vec<&str> = root.children().iter().map(Name::value).collect();
        assert_eq!(top, vec!["a", "c"]);
        let paths: Vec<&str> = root.leaves().into_iter().map(Name::path).collect();
        assert_eq!(paths, vec!["a.b", "c"]);
    }

    #[test]
    fn inserting_siblings_keeps_existing_paths() {
        let mut root = Name::root("root");
        root.add_path("x.y");
        let before = root.find("x.y").map(|node| node.path().to_string());
        root.add_path("x.a");
        root.add_path("x");

        assert_eq!(root.find("x.y").map(Name::path), before.as_deref());
        assert_eq!(root.find("x").map(|node| node.children().len()), Some(2));
        assert!(root.find("x.q").is_none());
    }
}
