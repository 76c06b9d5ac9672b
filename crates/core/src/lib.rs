//! Core library for the widget shell.
//!
//! The shell arranges interchangeable widgets in a tree of containers. This
//! crate owns that structure and the routing between widgets; drawing, audio
//! and the widgets themselves live elsewhere and talk to it through the
//! [`Widget`], [`RenderSurface`] and [`SurfaceFactory`] traits.
//!
//! - [`tree`] holds components in an arena and keeps feature registrations in
//!   step with what is reachable from the root.
//! - [`feature`] lets a widget find another one by feature name.
//! - [`catalogue`] and [`name`] describe which widget types exist.
//! - [`layout`] persists and restores trees.

pub mod catalogue;
pub mod config;
pub mod error;
pub mod feature;
pub mod layout;
pub mod name;
pub mod preferred;
pub mod reference;
pub mod render;
pub mod tree;
pub mod widget;

pub use catalogue::{Catalogue, WidgetFactory};
pub use config::ShellConfig;
pub use error::{Result, ShellError};
pub use feature::{FeatureHandle, FeatureRegistry, Features, Registration};
pub use layout::LayoutDescription;
pub use name::Name;
pub use preferred::PrefList;
pub use reference::Lazy;
pub use render::{HeadlessSurfaces, RenderHandle, RenderSurface, SurfaceEvent, SurfaceFactory};
pub use tree::{Component, ComponentId, ComponentTree, ContainerKind, Key, Orientation};
pub use widget::Widget;
