use crate::feature::Features;

/// Leaf component wrapping a concrete behaviour.
///
/// Widgets never register themselves: the tree reads [`Widget::features`]
/// once, when the component is created, and declares or undeclares that set
/// as the widget enters or leaves the tree.
pub trait Widget {
    /// Catalogue name of the widget type, e.g. `Media.Playlist`.
    fn type_name(&self) -> &str;

    /// Features implemented by this instance.
    fn features(&self) -> Features;

    /// Called once the widget is removed from the tree for good, after its
    /// features have been undeclared.
    fn close(&mut self) {}
}
