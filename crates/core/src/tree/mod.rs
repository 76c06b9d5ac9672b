//! The component tree.
//!
//! Components live in an arena owned by [`ComponentTree`] and are addressed
//! by [`ComponentId`]. Containers own their children through a key-ordered
//! map; children only keep the id of their parent, so ownership flows
//! strictly downwards. Features of a widget are declared while the widget is
//! reachable from the root and undeclared as soon as it is detached.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    rc::Rc,
};

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::{
    feature::{FeatureRegistry, Features, Registration},
    render::{RenderHandle, RenderSurface, SurfaceFactory},
    widget::Widget,
    Result, ShellError,
};

/// Position of a child inside its container.
pub type Key = i32;

const UNI_SLOTS: &[Key] = &[1];
const SPLIT_SLOTS: &[Key] = &[1, 2];

/// Stable identity of a component within one tree. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(u64);

impl ComponentId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Layout behaviour of a container, which also decides its key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// One slot, key 1.
    Uni,
    /// Two slots, keys 1 and 2.
    Split { orientation: Orientation },
    /// Tab-like stack keyed by any non-negative index.
    Stack,
    /// Free-form placement keyed by arbitrary coordinates.
    #[default]
    Free,
}

impl ContainerKind {
    /// The fixed slots of a bounded container, `None` for unbounded kinds.
    pub fn slots(self) -> Option<&'static [Key]> {
        match self {
            Self::Uni => Some(UNI_SLOTS),
            Self::Split { .. } => Some(SPLIT_SLOTS),
            Self::Stack | Self::Free => None,
        }
    }

    pub fn accepts(self, key: Key) -> bool {
        match self {
            Self::Uni | Self::Split { .. } => self.slots().map_or(false, |slots| slots.contains(&key)),
            Self::Stack => key >= 0,
            Self::Free => true,
        }
    }

    /// Free-form containers have no predetermined spot: callers must pick a key.
    fn empty_spot(self, children: &BTreeMap<Key, ComponentId>) -> Option<Key> {
        match self {
            Self::Uni | Self::Split { .. } => self
                .slots()?
                .iter()
                .copied()
                .find(|key| !children.contains_key(key)),
            Self::Stack => (0..).find(|key| !children.contains_key(key)),
            Self::Free => None,
        }
    }
}

/// Read-only view of a component.
pub enum Component<'a> {
    Container {
        kind: ContainerKind,
        children: &'a BTreeMap<Key, ComponentId>,
    },
    Widget(&'a dyn Widget),
}

struct Node {
    parent: Option<ComponentId>,
    key: Option<Key>,
    body: Body,
}

enum Body {
    Container(ContainerNode),
    Widget(WidgetNode),
}

struct ContainerNode {
    kind: ContainerKind,
    children: BTreeMap<Key, ComponentId>,
    surface: Option<Box<dyn RenderSurface>>,
    handle: OnceCell<RenderHandle>,
}

struct WidgetNode {
    widget: Box<dyn Widget>,
    features: Features,
}

/// Arena of components rooted at a single container.
///
/// The tree is meant to be owned by the UI thread; feature handles are `Rc`
/// so it cannot be moved to another thread by accident.
pub struct ComponentTree {
    root: ComponentId,
    next_id: u64,
    nodes: HashMap<ComponentId, Node>,
    features: FeatureRegistry,
    surfaces: Option<Box<dyn SurfaceFactory>>,
}

impl ComponentTree {
    pub fn new(root_kind: ContainerKind) -> Self {
        let mut tree = Self {
            root: ComponentId(0),
            next_id: 0,
            nodes: HashMap::new(),
            features: FeatureRegistry::new(),
            surfaces: None,
        };
        tree.root = tree.create_container(root_kind);
        tree
    }

    /// Installs the rendering layer used by [`ComponentTree::load`].
    pub fn with_surfaces(mut self, factory: impl SurfaceFactory + 'static) -> Self {
        self.surfaces = Some(Box::new(factory));
        self
    }

    pub fn root(&self) -> ComponentId {
        self.root
    }

    /// Number of live components, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Creates a detached container.
    pub fn create_container(&mut self, kind: ContainerKind) -> ComponentId {
        self.allocate(Body::Container(ContainerNode {
            kind,
            children: BTreeMap::new(),
            surface: None,
            handle: OnceCell::new(),
        }))
    }

    /// Creates a detached widget, reading its feature set once.
    pub fn create_widget(&mut self, widget: Box<dyn Widget>) -> Result<ComponentId> {
        let features = widget.features();
        features.validate()?;
        let type_name = widget.type_name().to_string();
        let id = self.allocate(Body::Widget(WidgetNode { widget, features }));
        tracing::debug!(%id, widget = %type_name, "created widget");
        Ok(id)
    }

    fn allocate(&mut self, body: Body) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                parent: None,
                key: None,
                body,
            },
        );
        id
    }

    pub fn component(&self, id: ComponentId) -> Option<Component<'_>> {
        let component = match &self.nodes.get(&id)?.body {
            Body::Container(container) => Component::Container {
                kind: container.kind,
                children: &container.children,
            },
            Body::Widget(node) => Component::Widget(&*node.widget),
        };
        Some(component)
    }

    pub fn kind(&self, id: ComponentId) -> Option<ContainerKind> {
        self.container(id).ok().map(|container| container.kind)
    }

    pub fn widget(&self, id: ComponentId) -> Option<&dyn Widget> {
        match &self.nodes.get(&id)?.body {
            Body::Widget(node) => Some(&*node.widget),
            Body::Container(_) => None,
        }
    }

    pub fn widget_mut(&mut self, id: ComponentId) -> Option<&mut (dyn Widget + 'static)> {
        match &mut self.nodes.get_mut(&id)?.body {
            Body::Widget(node) => Some(&mut *node.widget),
            Body::Container(_) => None,
        }
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.nodes.get(&id)?.parent
    }

    pub fn key_of(&self, id: ComponentId) -> Option<Key> {
        self.nodes.get(&id)?.key
    }

    /// Children of a container in key order. Empty for widgets and unknown ids.
    pub fn children(&self, id: ComponentId) -> impl Iterator<Item = (Key, ComponentId)> + '_ {
        self.container(id)
            .ok()
            .into_iter()
            .flat_map(|container| container.children.iter().map(|(key, child)| (*key, *child)))
    }

    pub fn child_at(&self, parent: ComponentId, key: Key) -> Option<ComponentId> {
        self.container(parent).ok()?.children.get(&key).copied()
    }

    /// Parent, grandparent and so on, nearest first.
    pub fn ancestors(&self, id: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    pub fn depth(&self, id: ComponentId) -> usize {
        self.ancestors(id).count()
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: ComponentId) -> bool {
        if !self.contains(id) {
            return false;
        }
        id == self.root || self.ancestors(id).last() == Some(self.root)
    }

    /// `id` followed by every component below it, depth first in key order.
    pub fn descendants(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            if let Body::Container(container) = &node.body {
                stack.extend(container.children.values().rev().copied());
            }
        }
        out
    }

    pub fn features(&self) -> &FeatureRegistry {
        &self.features
    }

    pub fn find(&self, feature: &str) -> impl Iterator<Item = &Registration> {
        self.features.find(feature)
    }

    pub fn find_one(&self, feature: &str) -> Option<&Registration> {
        self.features.find_one(feature)
    }

    pub fn find_as<T: ?Sized + 'static>(&self, feature: &str) -> impl Iterator<Item = Rc<T>> + '_ {
        self.features.find_as::<T>(feature)
    }

    /// The registration for `feature` closest to `from`, measured by the depth
    /// of the deepest shared ancestor. `from` itself is never returned; ties
    /// go to the earliest declaration.
    pub fn find_nearest(&self, from: ComponentId, feature: &str) -> Option<&Registration> {
        let lineage: HashMap<ComponentId, usize> = std::iter::once(from)
            .chain(self.ancestors(from))
            .enumerate()
            .map(|(distance, id)| (id, distance))
            .collect();
        let mut best: Option<(usize, &Registration)> = None;

        for registration in self.features.find(feature) {
            let owner = registration.owner();
            if owner == from {
                continue;
            }
            let shared = std::iter::once(owner)
                .chain(self.ancestors(owner))
                .find_map(|ancestor| lineage.get(&ancestor).copied());
            let Some(distance) = shared else {
                continue;
            };
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, registration));
            }
        }

        best.map(|(_, registration)| registration)
    }

    /// A free key for a new child, or `None` when the container is full or
    /// free-form.
    pub fn get_empty_spot(&self, container: ComponentId) -> Option<Key> {
        let container = self.container(container).ok()?;
        container.kind.empty_spot(&container.children)
    }

    /// Places `child` at `key`, replacing (and destroying) any previous
    /// occupant. `None` removes whatever sits at `key`.
    ///
    /// `child` must be detached; features below it are declared when
    /// `parent` is reachable from the root.
    pub fn add_child(
        &mut self,
        parent: ComponentId,
        key: Key,
        child: Option<ComponentId>,
    ) -> Result<()> {
        self.check_key(parent, key)?;

        let Some(child) = child else {
            self.remove_child(parent, key);
            return Ok(());
        };

        let node = self
            .nodes
            .get(&child)
            .ok_or(ShellError::UnknownComponent(child))?;
        if node.parent == Some(parent) && node.key == Some(key) {
            return Ok(());
        }
        if node.parent.is_some() || child == self.root {
            tracing::warn!(%child, "refusing to add a component that already has a parent");
            return Err(ShellError::AlreadyAttached(child));
        }
        if self.contains_in_lineage(parent, child) {
            return Err(ShellError::Cycle { parent, child });
        }

        self.remove_child(parent, key);
        self.link(parent, key, child);

        if self.is_attached(parent) {
            if let Err(err) = self.declare_subtree(child) {
                self.undeclare_subtree(child);
                self.unlink(parent, key);
                return Err(err);
            }
        }

        tracing::debug!(%parent, key, %child, "attached component");
        self.notify(parent, key, Some(child));
        Ok(())
    }

    /// Removes and destroys the child at `key`. Missing keys are a no-op.
    ///
    /// The surface is told first, then every feature in the subtree is
    /// undeclared, and only then are the widgets closed.
    pub fn remove_child(&mut self, parent: ComponentId, key: Key) -> bool {
        match self.take_child(parent, key) {
            Some(child) => {
                self.destroy(child);
                true
            }
            None => false,
        }
    }

    /// Detaches the child at `key` without destroying it, so it can be added
    /// somewhere else. Its features are undeclared until it is re-attached.
    pub fn take_child(&mut self, parent: ComponentId, key: Key) -> Option<ComponentId> {
        self.child_at(parent, key)?;
        self.notify(parent, key, None);
        let child = self.unlink(parent, key)?;
        self.undeclare_subtree(child);
        tracing::debug!(%parent, key, %child, "detached component");
        Some(child)
    }

    /// Removes `id` from wherever it is and destroys it. The root stays.
    pub fn remove(&mut self, id: ComponentId) -> bool {
        if id == self.root {
            return false;
        }
        match (self.parent(id), self.key_of(id)) {
            (Some(parent), Some(key)) => self.remove_child(parent, key),
            _ if self.contains(id) => {
                self.destroy(id);
                true
            }
            _ => false,
        }
    }

    /// Moves the child at `(from, from_key)` to `(to, to_key)`.
    ///
    /// The target is validated before anything changes. A missing source is
    /// a no-op, an occupied target is replaced.
    pub fn move_child(
        &mut self,
        from: ComponentId,
        from_key: Key,
        to: ComponentId,
        to_key: Key,
    ) -> Result<()> {
        let Some(child) = self.child_at(from, from_key) else {
            return Ok(());
        };
        self.check_key(to, to_key)?;
        if from == to && from_key == to_key {
            return Ok(());
        }
        if self.contains_in_lineage(to, child) {
            return Err(ShellError::Cycle { parent: to, child });
        }

        self.take_child(from, from_key);
        self.add_child(to, to_key, Some(child))
    }

    /// Exchanges the occupants of two positions. Either may be empty.
    pub fn swap_children(
        &mut self,
        a: ComponentId,
        a_key: Key,
        b: ComponentId,
        b_key: Key,
    ) -> Result<()> {
        self.check_key(a, a_key)?;
        self.check_key(b, b_key)?;
        if a == b && a_key == b_key {
            return Ok(());
        }

        let first = self.child_at(a, a_key);
        let second = self.child_at(b, b_key);
        if let Some(child) = first {
            if self.contains_in_lineage(b, child) {
                return Err(ShellError::Cycle { parent: b, child });
            }
        }
        if let Some(child) = second {
            if self.contains_in_lineage(a, child) {
                return Err(ShellError::Cycle { parent: a, child });
            }
        }

        self.take_child(a, a_key);
        self.take_child(b, b_key);
        if let Some(child) = first {
            self.add_child(b, b_key, Some(child))?;
        }
        if let Some(child) = second {
            self.add_child(a, a_key, Some(child))?;
        }
        Ok(())
    }

    /// Materialises `container` through the installed surface factory.
    ///
    /// Idempotent: once materialised the existing handle is returned and no
    /// new surface is created. Existing children are replayed to a fresh
    /// surface.
    pub fn load(&mut self, container: ComponentId) -> Result<RenderHandle> {
        let node = self
            .nodes
            .get_mut(&container)
            .ok_or(ShellError::UnknownComponent(container))?;
        let Body::Container(node) = &mut node.body else {
            return Err(ShellError::NotAContainer(container));
        };
        if let Some(handle) = node.handle.get() {
            return Ok(*handle);
        }

        if node.surface.is_none() {
            let factory = self
                .surfaces
                .as_mut()
                .ok_or(ShellError::NoSurface(container))?;
            node.surface = Some(factory.create(container, node.kind));
        }
        let Some(surface) = node.surface.as_mut() else {
            return Err(ShellError::NoSurface(container));
        };

        let handle = *node.handle.get_or_init(|| surface.materialize(container));
        for (key, child) in &node.children {
            surface.on_child_changed(*key, Some(*child));
        }
        tracing::debug!(%container, handle = handle.0, "loaded container");
        Ok(handle)
    }

    /// Shows the container's surface. Does nothing if it was never loaded.
    pub fn show(&mut self, container: ComponentId) {
        if let Some(surface) = self.surface_mut(container) {
            surface.show();
        }
    }

    /// Hides the container's surface. Does nothing if it was never loaded.
    pub fn hide(&mut self, container: ComponentId) {
        if let Some(surface) = self.surface_mut(container) {
            surface.hide();
        }
    }

    /// Features a widget was created with, whether or not it is attached.
    pub fn declared_features(&self, id: ComponentId) -> Option<&Features> {
        match &self.nodes.get(&id)?.body {
            Body::Widget(node) => Some(&node.features),
            Body::Container(_) => None,
        }
    }

    fn container(&self, id: ComponentId) -> Result<&ContainerNode> {
        match &self
            .nodes
            .get(&id)
            .ok_or(ShellError::UnknownComponent(id))?
            .body
        {
            Body::Container(container) => Ok(container),
            Body::Widget(_) => Err(ShellError::NotAContainer(id)),
        }
    }

    fn surface_mut(&mut self, id: ComponentId) -> Option<&mut Box<dyn RenderSurface>> {
        match &mut self.nodes.get_mut(&id)?.body {
            Body::Container(container) => container.surface.as_mut(),
            Body::Widget(_) => None,
        }
    }

    fn check_key(&self, parent: ComponentId, key: Key) -> Result<()> {
        let kind = self.container(parent)?.kind;
        if !kind.accepts(key) {
            tracing::warn!(%parent, key, ?kind, "rejected key");
            return Err(ShellError::InvalidKey {
                container: parent,
                key,
            });
        }
        Ok(())
    }

    /// Whether `candidate` is `id` or one of its ancestors.
    fn contains_in_lineage(&self, id: ComponentId, candidate: ComponentId) -> bool {
        id == candidate || self.ancestors(id).any(|ancestor| ancestor == candidate)
    }

    fn notify(&mut self, container: ComponentId, key: Key, child: Option<ComponentId>) {
        if let Some(surface) = self.surface_mut(container) {
            surface.on_child_changed(key, child);
        }
    }

    fn link(&mut self, parent: ComponentId, key: Key, child: ComponentId) {
        if let Some(Node {
            body: Body::Container(container),
            ..
        }) = self.nodes.get_mut(&parent)
        {
            container.children.insert(key, child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
            node.key = Some(key);
        }
    }

    fn unlink(&mut self, parent: ComponentId, key: Key) -> Option<ComponentId> {
        let child = match &mut self.nodes.get_mut(&parent)?.body {
            Body::Container(container) => container.children.remove(&key)?,
            Body::Widget(_) => return None,
        };
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
            node.key = None;
        }
        Some(child)
    }

    fn declare_subtree(&mut self, id: ComponentId) -> Result<usize> {
        let mut declared = 0;
        for current in self.descendants(id) {
            if let Some(Node {
                body: Body::Widget(node),
                ..
            }) = self.nodes.get(&current)
            {
                declared += self.features.declare(current, &node.features)?;
            }
        }
        Ok(declared)
    }

    fn undeclare_subtree(&mut self, id: ComponentId) -> usize {
        self.descendants(id)
            .into_iter()
            .map(|current| self.features.undeclare(current))
            .sum()
    }

    /// Drops a detached subtree, closing its widgets after undeclaring them.
    fn destroy(&mut self, id: ComponentId) {
        let doomed = self.descendants(id);
        for current in &doomed {
            self.features.undeclare(*current);
        }
        for current in doomed {
            if let Some(Node {
                body: Body::Widget(mut node),
                ..
            }) = self.nodes.remove(&current)
            {
                node.widget.close();
            }
        }
        tracing::debug!(%id, "destroyed component");
    }
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("root", &self.root)
            .field("components", &self.nodes.len())
            .field("features", &self.features.names())
            .field("surfaces", &self.surfaces.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::render::{HeadlessSurfaces, SurfaceEvent};

    trait PlaylistFeature {
        fn playlist(&self) -> Rc<Playlist>;
    }

    #[derive(Debug, Default)]
    struct Playlist {
        songs: Vec<String>,
    }

    struct PlaylistHandle(Rc<Playlist>);

    impl PlaylistFeature for PlaylistHandle {
        fn playlist(&self) -> Rc<Playlist> {
            self.0.clone()
        }
    }

    struct PlaylistView {
        handle: Rc<PlaylistHandle>,
        closed: Rc<Cell<bool>>,
    }

    impl Widget for PlaylistView {
        fn type_name(&self) -> &str {
            "Media.Playlist"
        }

        fn features(&self) -> Features {
            Features::new().with::<dyn PlaylistFeature>("Playlist", self.handle.clone())
        }

        fn close(&mut self) {
            self.closed.set(true);
        }
    }

    /// Widget declaring arbitrary feature names with a unit handle.
    struct Gadget {
        features: Vec<&'static str>,
        closed: Rc<Cell<u32>>,
    }

    impl Widget for Gadget {
        fn type_name(&self) -> &str {
            "Test.Gadget"
        }

        fn features(&self) -> Features {
            self.features
                .iter()
                .fold(Features::new(), |features, name| features.with(*name, Rc::new(())))
        }

        fn close(&mut self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    fn gadget(tree: &mut ComponentTree, features: &[&'static str]) -> (ComponentId, Rc<Cell<u32>>) {
        let closed = Rc::new(Cell::new(0));
        let id = tree
            .create_widget(Box::new(Gadget {
                features: features.to_vec(),
                closed: closed.clone(),
            }))
            .unwrap();
        (id, closed)
    }

    fn owners(tree: &ComponentTree, feature: &str) -> Vec<ComponentId> {
        tree.find(feature).map(Registration::owner).collect()
    }

    #[test]
    fn reader_finds_playlist_until_it_is_detached() {
        let mut tree = ComponentTree::new(ContainerKind::Stack);
        let root = tree.root();
        let playlist = Rc::new(Playlist {
            songs: vec!["intro.ogg".to_string()],
        });
        let closed = Rc::new(Cell::new(false));

        let view = tree
            .create_widget(Box::new(PlaylistView {
                handle: Rc::new(PlaylistHandle(playlist.clone())),
                closed: closed.clone(),
            }))
            .unwrap();
        let (reader, _) = gadget(&mut tree, &["Song reader"]);
        tree.add_child(root, 0, Some(view)).unwrap();
        tree.add_child(root, 1, Some(reader)).unwrap();

        let found: Vec<_> = tree.find_as::<dyn PlaylistFeature>("Playlist").collect();
        assert_eq!(found.len(), 1);
        assert!(Rc::ptr_eq(&found[0].playlist(), &playlist));
        assert_eq!(found[0].playlist().songs, ["intro.ogg"]);
        assert_eq!(
            tree.find_nearest(reader, "Playlist").map(Registration::owner),
            Some(view)
        );

        assert!(tree.remove_child(root, 0));
        assert!(tree.find_one("Playlist").is_none());
        assert!(tree.find_nearest(reader, "Playlist").is_none());
        assert!(closed.get());
        assert!(!tree.contains(view));
    }

    #[test]
    fn adding_absent_child_removes_key_and_features() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let root = tree.root();
        let (widget, closed) = gadget(&mut tree, &["Image display"]);

        tree.add_child(root, 4, Some(widget)).unwrap();
        assert_eq!(owners(&tree, "Image display"), vec![widget]);

        tree.add_child(root, 4, None).unwrap();
        assert!(tree.child_at(root, 4).is_none());
        assert!(owners(&tree, "Image display").is_empty());
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn same_feature_lists_widgets_in_attach_order() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let root = tree.root();
        let (first, _) = gadget(&mut tree, &["Playlist"]);
        let (second, _) = gadget(&mut tree, &["Playlist"]);

        tree.add_child(root, 10, Some(second)).unwrap();
        tree.add_child(root, -3, Some(first)).unwrap();
        assert_eq!(owners(&tree, "Playlist"), vec![second, first]);
        assert_eq!(tree.features().find_last("Playlist").map(Registration::owner), Some(first));

        tree.remove(second);
        assert_eq!(owners(&tree, "Playlist"), vec![first]);
    }

    #[test]
    fn missing_keys_are_silent_no_ops() {
        let mut tree = ComponentTree::new(ContainerKind::Stack);
        let root = tree.root();

        assert!(!tree.remove_child(root, 3));
        assert!(!tree.remove_child(ComponentId::from_raw(99), 0));
        assert!(tree.take_child(root, 3).is_none());
        tree.add_child(root, 3, None).unwrap();
        tree.move_child(root, 5, root, 6).unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn bounded_containers_reject_foreign_keys() {
        let mut tree = ComponentTree::new(ContainerKind::Split {
            orientation: Orientation::Horizontal,
        });
        let root = tree.root();
        let (widget, _) = gadget(&mut tree, &["Logger"]);

        let err = tree.add_child(root, 3, Some(widget)).unwrap_err();
        assert!(matches!(err, ShellError::InvalidKey { key: 3, .. }));
        assert!(tree.parent(widget).is_none());
        assert!(tree.find_one("Logger").is_none());

        let stack = tree.create_container(ContainerKind::Stack);
        assert!(matches!(
            tree.add_child(stack, -1, None),
            Err(ShellError::InvalidKey { .. })
        ));
        assert!(matches!(
            tree.add_child(widget, 0, None),
            Err(ShellError::NotAContainer(_))
        ));
    }

    #[test]
    fn empty_spot_depends_on_container_kind() {
        let mut tree = ComponentTree::new(ContainerKind::Uni);
        let root = tree.root();
        assert_eq!(tree.get_empty_spot(root), Some(1));
        let (widget, _) = gadget(&mut tree, &[]);
        tree.add_child(root, 1, Some(widget)).unwrap();
        assert_eq!(tree.get_empty_spot(root), None);

        let split = tree.create_container(ContainerKind::Split {
            orientation: Orientation::Vertical,
        });
        let (left, _) = gadget(&mut tree, &[]);
        tree.add_child(split, 1, Some(left)).unwrap();
        assert_eq!(tree.get_empty_spot(split), Some(2));

        let stack = tree.create_container(ContainerKind::Stack);
        for key in [0, 1, 2] {
            let (tab, _) = gadget(&mut tree, &[]);
            tree.add_child(stack, key, Some(tab)).unwrap();
        }
        assert_eq!(tree.get_empty_spot(stack), Some(3));
        tree.remove_child(stack, 1);
        assert_eq!(tree.get_empty_spot(stack), Some(1));

        let free = tree.create_container(ContainerKind::Free);
        assert_eq!(tree.get_empty_spot(free), None);
    }

    #[test]
    fn reparenting_requires_detaching_first() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let root = tree.root();
        let holder = tree.create_container(ContainerKind::Stack);
        tree.add_child(root, 0, Some(holder)).unwrap();
        let (widget, closed) = gadget(&mut tree, &["Terminal"]);
        tree.add_child(root, 1, Some(widget)).unwrap();

        let err = tree.add_child(holder, 0, Some(widget)).unwrap_err();
        assert!(matches!(err, ShellError::AlreadyAttached(_)));

        let taken = tree.take_child(root, 1).unwrap();
        assert!(tree.find_one("Terminal").is_none());
        assert!(tree.contains(taken));
        assert_eq!(closed.get(), 0);

        tree.add_child(holder, 0, Some(taken)).unwrap();
        assert_eq!(owners(&tree, "Terminal"), vec![widget]);
        assert_eq!(tree.parent(widget), Some(holder));
        assert_eq!(tree.depth(widget), 2);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let root = tree.root();
        let outer = tree.create_container(ContainerKind::Free);
        let inner = tree.create_container(ContainerKind::Free);
        tree.add_child(root, 0, Some(outer)).unwrap();
        tree.add_child(outer, 0, Some(inner)).unwrap();

        let taken = tree.take_child(root, 0).unwrap();
        assert!(matches!(
            tree.add_child(inner, 0, Some(taken)),
            Err(ShellError::Cycle { .. })
        ));
        assert!(matches!(
            tree.add_child(taken, 1, Some(taken)),
            Err(ShellError::Cycle { .. })
        ));
        assert!(matches!(
            tree.add_child(inner, 0, Some(root)),
            Err(ShellError::AlreadyAttached(_))
        ));
    }

    #[test]
    fn features_follow_reachability_from_root() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let root = tree.root();
        let panel = tree.create_container(ContainerKind::Split {
            orientation: Orientation::Horizontal,
        });
        let (left, _) = gadget(&mut tree, &["Web reader"]);
        let (right, _) = gadget(&mut tree, &["Web reader", "Logger"]);
        tree.add_child(panel, 1, Some(left)).unwrap();
        tree.add_child(panel, 2, Some(right)).unwrap();

        assert!(tree.find_one("Web reader").is_none());
        assert!(!tree.is_attached(left));

        tree.add_child(root, 0, Some(panel)).unwrap();
        assert_eq!(owners(&tree, "Web reader"), vec![left, right]);
        assert_eq!(owners(&tree, "Logger"), vec![right]);
        assert!(tree.is_attached(right));
        assert_eq!(tree.descendants(panel), vec![panel, left, right]);
    }

    #[test]
    fn removing_container_closes_every_widget_below() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let root = tree.root();
        let panel = tree.create_container(ContainerKind::Stack);
        let nested = tree.create_container(ContainerKind::Uni);
        let (a, a_closed) = gadget(&mut tree, &["Playlist"]);
        let (b, b_closed) = gadget(&mut tree, &["Playlist"]);
        tree.add_child(nested, 1, Some(b)).unwrap();
        tree.add_child(panel, 0, Some(a)).unwrap();
        tree.add_child(panel, 1, Some(nested)).unwrap();
        tree.add_child(root, 0, Some(panel)).unwrap();
        assert_eq!(tree.find("Playlist").count(), 2);

        assert!(tree.remove_child(root, 0));
        assert_eq!(tree.find("Playlist").count(), 0);
        assert_eq!((a_closed.get(), b_closed.get()), (1, 1));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn replacing_a_child_destroys_the_previous_one() {
        let mut tree = ComponentTree::new(ContainerKind::Uni);
        let root = tree.root();
        let (old, old_closed) = gadget(&mut tree, &["Image display"]);
        let (new, _) = gadget(&mut tree, &["Image display"]);

        tree.add_child(root, 1, Some(old)).unwrap();
        tree.add_child(root, 1, Some(old)).unwrap();
        assert_eq!(old_closed.get(), 0);

        tree.add_child(root, 1, Some(new)).unwrap();
        assert_eq!(old_closed.get(), 1);
        assert_eq!(owners(&tree, "Image display"), vec![new]);
    }

    #[test]
    fn nearest_lookup_prefers_closest_relative() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let root = tree.root();
        let (far, _) = gadget(&mut tree, &["Playlist"]);
        tree.add_child(root, 0, Some(far)).unwrap();

        let panel = tree.create_container(ContainerKind::Stack);
        let (near, _) = gadget(&mut tree, &["Playlist"]);
        let (reader, _) = gadget(&mut tree, &["Playlist", "Song reader"]);
        tree.add_child(panel, 0, Some(near)).unwrap();
        tree.add_child(panel, 1, Some(reader)).unwrap();
        tree.add_child(root, 1, Some(panel)).unwrap();

        assert_eq!(
            tree.find_nearest(reader, "Playlist").map(Registration::owner),
            Some(near)
        );
        assert_eq!(
            tree.find_nearest(far, "Playlist").map(Registration::owner),
            Some(near)
        );
        assert!(tree.find_nearest(reader, "Song reader").is_none());
    }

    #[test]
    fn nearest_lookup_walks_deep_lineages() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let mut parent = tree.root();
        let mut playlists = Vec::new();
        for _ in 0..32 {
            let level = tree.create_container(ContainerKind::Stack);
            tree.add_child(parent, 0, Some(level)).unwrap();
            let (playlist, _) = gadget(&mut tree, &["Playlist"]);
            tree.add_child(level, 1, Some(playlist)).unwrap();
            playlists.push(playlist);
            parent = level;
        }
        let (reader, _) = gadget(&mut tree, &["Song reader"]);
        tree.add_child(parent, 2, Some(reader)).unwrap();

        assert_eq!(tree.depth(reader), 33);
        assert_eq!(
            tree.find_nearest(reader, "Playlist").map(Registration::owner),
            playlists.last().copied()
        );
        // Every deeper playlist shares the same level with the topmost one.
        assert_eq!(
            tree.find_nearest(playlists[0], "Playlist").map(Registration::owner),
            Some(playlists[1])
        );
    }

    #[test]
    fn move_and_swap_keep_features_declared() {
        let mut tree = ComponentTree::new(ContainerKind::Split {
            orientation: Orientation::Horizontal,
        });
        let root = tree.root();
        let (a, _) = gadget(&mut tree, &["Logger"]);
        let (b, _) = gadget(&mut tree, &["Terminal"]);
        tree.add_child(root, 1, Some(a)).unwrap();

        tree.move_child(root, 1, root, 2).unwrap();
        assert_eq!(tree.child_at(root, 2), Some(a));
        assert_eq!(owners(&tree, "Logger"), vec![a]);

        tree.add_child(root, 1, Some(b)).unwrap();
        tree.swap_children(root, 1, root, 2).unwrap();
        assert_eq!(tree.child_at(root, 1), Some(a));
        assert_eq!(tree.child_at(root, 2), Some(b));
        assert_eq!(tree.key_of(b), Some(2));
        assert_eq!(owners(&tree, "Terminal"), vec![b]);

        assert!(matches!(
            tree.move_child(root, 1, root, 7),
            Err(ShellError::InvalidKey { .. })
        ));
        assert_eq!(tree.child_at(root, 1), Some(a));
    }

    #[test]
    fn blank_feature_names_fail_at_creation() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let err = tree
            .create_widget(Box::new(Gadget {
                features: vec![""],
                closed: Rc::new(Cell::new(0)),
            }))
            .unwrap_err();
        assert!(matches!(err, ShellError::InvalidFeature(_)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn load_is_idempotent_and_replays_children() {
        let surfaces = HeadlessSurfaces::new();
        let mut tree = ComponentTree::new(ContainerKind::Stack).with_surfaces(surfaces.clone());
        let root = tree.root();
        let (widget, _) = gadget(&mut tree, &[]);
        tree.add_child(root, 0, Some(widget)).unwrap();
        assert!(surfaces.events().is_empty());

        let handle = tree.load(root).unwrap();
        assert_eq!(tree.load(root).unwrap(), handle);
        assert_eq!(
            surfaces.events(),
            vec![
                SurfaceEvent::Materialized {
                    container: root,
                    handle
                },
                SurfaceEvent::ChildChanged {
                    container: root,
                    key: 0,
                    child: Some(widget)
                },
            ]
        );

        surfaces.clear();
        tree.remove_child(root, 0);
        tree.hide(root);
        tree.show(root);
        assert_eq!(
            surfaces.events(),
            vec![
                SurfaceEvent::ChildChanged {
                    container: root,
                    key: 0,
                    child: None
                },
                SurfaceEvent::Hidden(root),
                SurfaceEvent::Shown(root),
            ]
        );
    }

    #[test]
    fn show_and_hide_without_surface_are_no_ops() {
        let mut tree = ComponentTree::new(ContainerKind::Free);
        let root = tree.root();
        tree.show(root);
        tree.hide(root);
        tree.show(ComponentId::from_raw(42));

        assert!(matches!(tree.load(root), Err(ShellError::NoSurface(_))));
    }
}
