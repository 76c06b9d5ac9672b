//! Persisted layouts.
//!
//! A layout is a recursive description of containers and the widget types
//! they hold, keyed by position. Restoring is all-or-nothing: the whole
//! description is checked against the catalogue before a single component is
//! built, and a failed build leaves the target tree untouched.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    catalogue::Catalogue,
    tree::{Component, ComponentId, ComponentTree, ContainerKind, Key},
    Result, ShellError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDescription {
    Container {
        kind: ContainerKind,
        #[serde(default)]
        children: BTreeMap<Key, LayoutDescription>,
    },
    Widget {
        name: String,
    },
}

impl LayoutDescription {
    pub fn container(kind: ContainerKind) -> Self {
        Self::Container {
            kind,
            children: BTreeMap::new(),
        }
    }

    pub fn widget(name: impl Into<String>) -> Self {
        Self::Widget { name: name.into() }
    }

    /// Adds a child, builder style. Ignored on widget descriptions.
    pub fn with_child(mut self, key: Key, child: LayoutDescription) -> Self {
        if let Self::Container { children, .. } = &mut self {
            children.insert(key, child);
        }
        self
    }

    /// Describes the whole tree, starting at its root.
    pub fn snapshot(tree: &ComponentTree) -> Self {
        // The root always exists, so the description cannot be empty.
        Self::describe(tree, tree.root()).unwrap_or_else(|| Self::container(ContainerKind::Free))
    }

    /// Describes the subtree rooted at `id`.
    pub fn describe(tree: &ComponentTree, id: ComponentId) -> Option<Self> {
        let description = match tree.component(id)? {
            Component::Container { kind, children } => Self::Container {
                kind,
                children: children
                    .iter()
                    .filter_map(|(key, child)| Some((*key, Self::describe(tree, *child)?)))
                    .collect(),
            },
            Component::Widget(widget) => Self::widget(widget.type_name()),
        };
        Some(description)
    }

    /// Checks keys and widget names without building anything.
    pub fn validate(&self, catalogue: &Catalogue) -> Result<()> {
        match self {
            Self::Container { kind, children } => {
                for (key, child) in children {
                    if !kind.accepts(*key) {
                        return Err(ShellError::restore(format!(
                            "{kind:?} container has no slot at key {key}"
                        )));
                    }
                    child.validate(catalogue)?;
                }
                Ok(())
            }
            Self::Widget { name } if catalogue.contains(name) => Ok(()),
            Self::Widget { name } => Err(ShellError::restore(format!(
                "unknown widget type `{name}`"
            ))),
        }
    }

    /// Builds a new tree from a description whose top level is a container.
    pub fn restore(&self, catalogue: &Catalogue) -> Result<ComponentTree> {
        let Self::Container { kind, children } = self else {
            return Err(ShellError::restore("the layout root must be a container"));
        };
        self.validate(catalogue)?;

        let mut tree = ComponentTree::new(*kind);
        let root = tree.root();
        for (key, child) in children {
            let attached = child
                .build(&mut tree, catalogue)
                .and_then(|id| tree.add_child(root, *key, Some(id)));
            if let Err(err) = attached {
                for key in children.keys() {
                    tree.remove_child(root, *key);
                }
                return Err(err);
            }
        }
        tracing::info!(components = tree.len(), "restored layout");
        Ok(tree)
    }

    /// Restores this description into `parent` at `key`, replacing whatever
    /// is there. On error the tree is left as it was.
    pub fn restore_into(
        &self,
        tree: &mut ComponentTree,
        parent: ComponentId,
        key: Key,
        catalogue: &Catalogue,
    ) -> Result<ComponentId> {
        self.validate(catalogue)?;
        match tree.kind(parent) {
            Some(kind) if kind.accepts(key) => {}
            Some(_) => {
                return Err(ShellError::InvalidKey {
                    container: parent,
                    key,
                })
            }
            None if tree.contains(parent) => return Err(ShellError::NotAContainer(parent)),
            None => return Err(ShellError::UnknownComponent(parent)),
        }

        let id = self.build(tree, catalogue)?;
        if let Err(err) = tree.add_child(parent, key, Some(id)) {
            tree.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Builds a detached subtree bottom-up. Partial results are destroyed on error.
    fn build(&self, tree: &mut ComponentTree, catalogue: &Catalogue) -> Result<ComponentId> {
        match self {
            Self::Widget { name } => tree.create_widget(catalogue.build(name)?),
            Self::Container { kind, children } => {
                let container = tree.create_container(*kind);
                for (key, child) in children {
                    let built = child
                        .build(tree, catalogue)
                        .and_then(|id| tree.add_child(container, *key, Some(id)));
                    if let Err(err) = built {
                        tree.remove(container);
                        return Err(err);
                    }
                }
                Ok(container)
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
