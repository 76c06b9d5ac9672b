//! Feature routing between widgets.
//!
//! A feature is a flat, case-sensitive name such as `Playlist`. A widget
//! implements it by handing out a handle under that name; any other
//! component can then look the handle up without knowing the widget's type.
//! Handles are stored type-erased and recovered with
//! [`Registration::downcast`], usually as `Rc<dyn SomeFeatureTrait>`.

use std::{any::Any, collections::HashMap, fmt, rc::Rc};

use crate::{tree::ComponentId, Result, ShellError};

/// Type-erased feature handle. It wraps an `Rc<T>` for the feature type `T`.
pub type FeatureHandle = Rc<dyn Any>;

/// The feature set a widget declares at construction.
#[derive(Clone, Default)]
pub struct Features {
    entries: Vec<(String, FeatureHandle)>,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a feature implemented by `handle`.
    ///
    /// `T` is normally a trait object, so `find_as::<dyn Trait>` can recover it.
    pub fn with<T: ?Sized + 'static>(mut self, name: impl Into<String>, handle: Rc<T>) -> Self {
        let handle: FeatureHandle = Rc::new(handle);
        self.entries.push((name.into(), handle));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rejects names that cannot be looked up.
    pub fn validate(&self) -> Result<()> {
        for (name, _) in &self.entries {
            validate_name(name)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ShellError::InvalidFeature(name.to_string()));
    }
    Ok(())
}

/// A component registered under one feature name.
#[derive(Clone)]
pub struct Registration {
    owner: ComponentId,
    handle: FeatureHandle,
}

impl Registration {
    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    pub fn handle(&self) -> &FeatureHandle {
        &self.handle
    }

    /// Recovers the handle as `Rc<T>` when it was declared with that type.
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Rc<T>> {
        self.handle.downcast_ref::<Rc<T>>().cloned()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("owner", &self.owner)
            .finish()
    }
}

/// Index of live feature registrations, owned by a component tree.
///
/// Only the tree writes to it, so lookups never observe a half-declared or
/// half-undeclared component.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    by_name: HashMap<String, Vec<Registration>>,
    by_owner: HashMap<ComponentId, Vec<String>>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `owner` under every feature in `features`.
    ///
    /// Names are validated before anything is written. Declaring an
    /// already registered (owner, name) pair again has no effect.
    pub(crate) fn declare(&mut self, owner: ComponentId, features: &Features) -> Result<usize> {
        features.validate()?;
        if features.is_empty() {
            return Ok(0);
        }

        let mut added = 0;
        for (name, handle) in &features.entries {
            let declared = self.by_owner.entry(owner).or_default();
            if declared.iter().any(|existing| existing == name) {
                continue;
            }
            declared.push(name.clone());
            self.by_name
                .entry(name.clone())
                .or_default()
                .push(Registration {
                    owner,
                    handle: handle.clone(),
                });
            added += 1;
        }

        if added > 0 {
            tracing::debug!(%owner, added, "declared features");
        }
        Ok(added)
    }

    /// Removes every registration owned by `owner`. Safe to call repeatedly.
    pub(crate) fn undeclare(&mut self, owner: ComponentId) -> usize {
        let Some(names) = self.by_owner.remove(&owner) else {
            return 0;
        };

        for name in &names {
            if let Some(registrations) = self.by_name.get_mut(name) {
                registrations.retain(|registration| registration.owner != owner);
                if registrations.is_empty() {
                    self.by_name.remove(name);
                }
            }
        }

        tracing::debug!(%owner, removed = names.len(), "undeclared features");
        names.len()
    }

    /// Registrations for `name`, in declaration order. Possibly empty.
    pub fn find(&self, name: &str) -> impl Iterator<Item = &Registration> {
        self.by_name.get(name).into_iter().flatten()
    }

    pub fn find_one(&self, name: &str) -> Option<&Registration> {
        self.find(name).next()
    }

    /// The most recently declared registration for `name`.
    pub fn find_last(&self, name: &str) -> Option<&Registration> {
        self.by_name.get(name).and_then(|registrations| registrations.last())
    }

    /// Typed handles for `name`. Registrations of another type are skipped.
    pub fn find_as<T: ?Sized + 'static>(&self, name: &str) -> impl Iterator<Item = Rc<T>> + '_ {
        self.find(name)
            .filter_map(|registration| registration.downcast::<T>())
    }

    pub fn is_declared(&self, owner: ComponentId, name: &str) -> bool {
        self.by_owner
            .get(&owner)
            .map_or(false, |names| names.iter().any(|declared| declared == name))
    }

    /// Feature names declared by `owner`, in declaration order.
    pub fn features_of(&self, owner: ComponentId) -> &[String] {
        self.by_owner.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All feature names that currently have at least one registration, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct Hello(&'static str);

    impl Greeter for Hello {
        fn greet(&self) -> String {
            format!("hello from {}", self.0)
        }
    }

    fn greeter(label: &'static str) -> Features {
        let handle: Rc<dyn Greeter> = Rc::new(Hello(label));
        Features::new().with("Greeter", handle)
    }

    fn owners(registry: &FeatureRegistry, name: &str) -> Vec<ComponentId> {
        registry.find(name).map(Registration::owner).collect()
    }

    #[test]
    fn find_returns_declaration_order() {
        let mut registry = FeatureRegistry::new();
        let first = ComponentId::from_raw(7);
        let second = ComponentId::from_raw(3);

        registry.declare(first, &greeter("first")).unwrap();
        registry.declare(second, &greeter("second")).unwrap();

        assert_eq!(owners(&registry, "Greeter"), vec![first, second]);
        assert_eq!(registry.find_last("Greeter").map(Registration::owner), Some(second));

        registry.undeclare(first);
        assert_eq!(owners(&registry, "Greeter"), vec![second]);
    }

    #[test]
    fn typed_lookup_invokes_handle() {
        let mut registry = FeatureRegistry::new();
        registry
            .declare(ComponentId::from_raw(1), &greeter("widget"))
            .unwrap();

        let found: Vec<Rc<dyn Greeter>> = registry.find_as::<dyn Greeter>("Greeter").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].greet(), "hello from widget");
        assert_eq!(registry.find_as::<String>("Greeter").count(), 0);
    }

    #[test]
    fn redeclaring_is_idempotent_and_undeclare_twice_is_safe() {
        let mut registry = FeatureRegistry::new();
        let owner = ComponentId::from_raw(1);
        let features = greeter("one").with("Other", Rc::new(5_u32));

        assert_eq!(registry.declare(owner, &features).unwrap(), 2);
        assert_eq!(registry.declare(owner, &features).unwrap(), 0);
        assert_eq!(registry.find("Greeter").count(), 1);
        assert_eq!(registry.features_of(owner), ["Greeter", "Other"]);

        assert_eq!(registry.undeclare(owner), 2);
        assert_eq!(registry.undeclare(owner), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn absence_is_not_an_error() {
        let registry = FeatureRegistry::new();
        assert!(registry.find_one("Playlist").is_none());
        assert_eq!(registry.find("Playlist").count(), 0);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut registry = FeatureRegistry::new();
        registry
            .declare(ComponentId::from_raw(1), &greeter("x"))
            .unwrap();
        assert!(registry.find_one("greeter").is_none());
        assert!(registry.is_declared(ComponentId::from_raw(1), "Greeter"));
    }

    #[test]
    fn blank_names_are_rejected_without_partial_registration() {
        let mut registry = FeatureRegistry::new();
        let features = greeter("x").with(" ", Rc::new(()));

        let err = registry
            .declare(ComponentId::from_raw(1), &features)
            .unwrap_err();
        assert!(matches!(err, ShellError::InvalidFeature(_)));
        assert!(registry.is_empty());
    }
}
