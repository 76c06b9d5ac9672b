use crate::tree::{ComponentId, Key};

/// Result alias that carries the custom [`ShellError`] type.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Common error type for the core crate.
///
/// Structural no-ops (removing a missing key, detaching twice) and feature
/// absence are not represented here: those are ordinary outcomes.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// Free-form message for conditions that have no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Layout or configuration JSON could not be read or written.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// A feature was declared with an unusable name.
    #[error("invalid feature name `{0}`")]
    InvalidFeature(String),
    /// The key is outside the slots offered by a bounded container.
    #[error("container {container} has no slot at key {key}")]
    InvalidKey { container: ComponentId, key: Key },
    #[error("component {0} does not exist")]
    UnknownComponent(ComponentId),
    #[error("component {0} is not a container")]
    NotAContainer(ComponentId),
    /// Reparenting requires removing the component from its old parent first.
    #[error("component {0} already has a parent")]
    AlreadyAttached(ComponentId),
    #[error("adding {child} below {parent} would create a cycle")]
    Cycle {
        parent: ComponentId,
        child: ComponentId,
    },
    /// No rendering layer was installed, so nothing can be materialised.
    #[error("no rendering surface available for container {0}")]
    NoSurface(ComponentId),
    /// A persisted layout description is malformed.
    #[error("cannot restore layout: {0}")]
    Restore(String),
    #[error("unknown widget type `{0}`")]
    UnknownWidget(String),
    /// A factory built a widget that does not match what it was registered as.
    #[error("widget factory `{factory}` {problem}")]
    Factory { factory: String, problem: String },
}

impl ShellError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn restore<T: Into<String>>(msg: T) -> Self {
        Self::Restore(msg.into())
    }
}

impl From<&str> for ShellError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ShellError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
