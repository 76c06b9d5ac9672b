//! Catalogue of widget types available to the shell.
//!
//! Factories are grouped by their dot-delimited names for browsing and by the
//! features their widgets declare, with one preferred factory per feature.

use std::{collections::HashMap, fmt};

use crate::{name::Name, preferred::PrefList, reference::Lazy, widget::Widget, Result, ShellError};

type Build = Box<dyn Fn() -> Box<dyn Widget>>;

/// Constructor for one widget type.
///
/// The advertised features are read from a sample instance at registration,
/// so they are always the set the widgets themselves declare.
pub struct WidgetFactory {
    name: String,
    features: Vec<String>,
    build: Build,
}

impl WidgetFactory {
    /// `name` is the widget type's catalogue path, e.g. `Media.Playlist`, and
    /// must equal the [`Widget::type_name`] of what `build` returns.
    ///
    /// `build` runs once here. The sample never enters a tree, so it is
    /// dropped without being closed.
    pub fn new(
        name: impl Into<String>,
        build: impl Fn() -> Box<dyn Widget> + 'static,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ShellError::msg("widget factories need a name"));
        }

        let sample = build();
        if sample.type_name() != name {
            return Err(ShellError::Factory {
                problem: format!("builds widgets of type `{}`", sample.type_name()),
                factory: name,
            });
        }
        let declared = sample.features();
        declared.validate()?;
        let features = declared.names().map(str::to_string).collect();

        Ok(Self {
            name,
            features,
            build: Box::new(build),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn implements(&self, feature: &str) -> bool {
        self.features.iter().any(|candidate| candidate == feature)
    }

    /// Builds a widget, rejecting instances that stopped matching the sample
    /// read at registration.
    pub fn build(&self) -> Result<Box<dyn Widget>> {
        let widget = (self.build)();
        if widget.type_name() != self.name {
            return Err(self.mismatch(format!("built a widget of type `{}`", widget.type_name())));
        }
        let declared = widget.features();
        declared.validate()?;
        if !declared.names().eq(self.features.iter().map(String::as_str)) {
            return Err(self.mismatch(format!(
                "built a widget declaring {declared:?} instead of {:?}",
                self.features
            )));
        }
        Ok(widget)
    }

    fn mismatch(&self, problem: String) -> ShellError {
        ShellError::Factory {
            factory: self.name.clone(),
            problem,
        }
    }
}

impl fmt::Debug for WidgetFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetFactory")
            .field("name", &self.name)
            .field("features", &self.features)
            .finish()
    }
}

pub struct Catalogue {
    label: String,
    factories: Vec<WidgetFactory>,
    by_feature: HashMap<String, PrefList<String>>,
    index: Lazy<Name>,
}

impl Catalogue {
    /// Creates an empty catalogue whose name index is rooted at `label`.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let index = Self::lazy_index(&label, Vec::new());
        Self {
            label,
            factories: Vec::new(),
            by_feature: HashMap::new(),
            index,
        }
    }

    fn lazy_index(label: &str, names: Vec<String>) -> Lazy<Name> {
        let label = label.to_string();
        Lazy::boxed(move || Name::tree_of_paths(label, names))
    }

    /// Adds a factory. Names must be unique.
    pub fn register(&mut self, factory: WidgetFactory) -> Result<()> {
        if self.get(factory.name()).is_some() {
            return Err(ShellError::msg(format!(
                "widget type `{}` is already registered",
                factory.name()
            )));
        }

        for feature in factory.features() {
            self.by_feature
                .entry(feature.clone())
                .or_default()
                .push(factory.name().to_string());
        }
        tracing::debug!(widget = factory.name(), "registered widget type");
        self.factories.push(factory);

        let names = self.names().map(str::to_string).collect();
        self.index = Self::lazy_index(&self.label, names);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&WidgetFactory> {
        self.factories.iter().find(|factory| factory.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Builds a new widget of type `name`.
    pub fn build(&self, name: &str) -> Result<Box<dyn Widget>> {
        self.get(name)
            .ok_or_else(|| ShellError::UnknownWidget(name.to_string()))?
            .build()
    }

    /// Factory names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(WidgetFactory::name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Factories advertising `feature`, in registration order.
    pub fn implementing<'a>(&'a self, feature: &str) -> impl Iterator<Item = &'a WidgetFactory> {
        self.by_feature
            .get(feature)
            .into_iter()
            .flat_map(|names| names.iter())
            .filter_map(|name| self.get(name))
    }

    /// The preferred factory for `feature`, falling back to the first one registered.
    pub fn preferred_for(&self, feature: &str) -> Option<&WidgetFactory> {
        self.by_feature
            .get(feature)
            .and_then(PrefList::preferred_or_first)
            .and_then(|name| self.get(name))
    }

    /// Marks `name` as the preferred implementation of `feature`. Returns
    /// `false` when that factory does not advertise the feature.
    pub fn set_preferred(&mut self, feature: &str, name: &str) -> bool {
        self.by_feature
            .get_mut(feature)
            .map_or(false, |names| names.set_preferred(&name.to_string()))
    }

    /// Browsable index of every widget type, sorted by namespace.
    pub fn index(&self) -> &Name {
        self.index.get()
    }
}

impl fmt::Debug for Catalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalogue")
            .field("label", &self.label)
            .field("factories", &self.factories)
            .finish()
    }
}
