//! Boundary to the rendering layer.
//!
//! The tree never draws anything itself. Each container gets at most one
//! [`RenderSurface`], created on demand by the installed [`SurfaceFactory`]
//! and told about every structural change below that container.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use serde::{Deserialize, Serialize};

use crate::tree::{ComponentId, ContainerKind, Key};

/// Opaque handle to whatever the rendering layer materialised for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderHandle(pub u64);

/// Visual counterpart of a single container.
pub trait RenderSurface {
    /// Builds the visual root for `container`. Called once per surface.
    fn materialize(&mut self, container: ComponentId) -> RenderHandle;

    /// A child was placed at `key`, or removed when `child` is `None`.
    fn on_child_changed(&mut self, key: Key, child: Option<ComponentId>);

    fn show(&mut self);

    fn hide(&mut self);
}

/// Creates surfaces for containers. Installed once per tree.
pub trait SurfaceFactory {
    fn create(&mut self, container: ComponentId, kind: ContainerKind) -> Box<dyn RenderSurface>;
}

/// Everything a headless surface was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Materialized {
        container: ComponentId,
        handle: RenderHandle,
    },
    ChildChanged {
        container: ComponentId,
        key: Key,
        child: Option<ComponentId>,
    },
    Shown(ComponentId),
    Hidden(ComponentId),
}

/// Surface factory without a display. Every call is logged through
/// `tracing` and appended to a shared event list, which makes it usable
/// both from the command line and from tests.
#[derive(Clone, Default)]
pub struct HeadlessSurfaces {
    next_handle: Rc<Cell<u64>>,
    events: Rc<RefCell<Vec<SurfaceEvent>>>,
}

impl HeadlessSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, across every surface.
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl fmt::Debug for HeadlessSurfaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessSurfaces")
            .field("next_handle", &self.next_handle.get())
            .field("events", &self.events.borrow().len())
            .finish()
    }
}

impl SurfaceFactory for HeadlessSurfaces {
    fn create(&mut self, container: ComponentId, kind: ContainerKind) -> Box<dyn RenderSurface> {
        tracing::debug!(%container, ?kind, "creating headless surface");
        Box::new(HeadlessSurface {
            container,
            shared: self.clone(),
        })
    }
}

struct HeadlessSurface {
    container: ComponentId,
    shared: HeadlessSurfaces,
}

impl HeadlessSurface {
    fn record(&self, event: SurfaceEvent) {
        self.shared.events.borrow_mut().push(event);
    }
}

impl RenderSurface for HeadlessSurface {
    fn materialize(&mut self, container: ComponentId) -> RenderHandle {
        let handle = RenderHandle(self.shared.next_handle.get());
        self.shared.next_handle.set(handle.0 + 1);
        tracing::debug!(%container, handle = handle.0, "materialized container");
        self.record(SurfaceEvent::Materialized { container, handle });
        handle
    }

    fn on_child_changed(&mut self, key: Key, child: Option<ComponentId>) {
        tracing::debug!(container = %self.container, key, ?child, "child changed");
        self.record(SurfaceEvent::ChildChanged {
            container: self.container,
            key,
            child,
        });
    }

    fn show(&mut self) {
        self.record(SurfaceEvent::Shown(self.container));
    }

    fn hide(&mut self) {
        self.record(SurfaceEvent::Hidden(self.container));
    }
}
