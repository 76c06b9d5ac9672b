//! Ordered list with an optional preferred member.
//!
//! The preferred marker is tracked by position. Every mutating operation
//! shifts or clears it so it always points at a member of the list.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefList<T> {
    items: Vec<T>,
    preferred: Option<usize>,
}

impl<T> Default for PrefList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            preferred: None,
        }
    }
}

impl<T> PrefList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn preferred(&self) -> Option<&T> {
        self.preferred.and_then(|index| self.items.get(index))
    }

    pub fn preferred_index(&self) -> Option<usize> {
        self.preferred
    }

    /// Returns the preferred element, falling back to the first one.
    /// An empty list yields `None`.
    pub fn preferred_or_first(&self) -> Option<&T> {
        self.preferred().or_else(|| self.items.first())
    }

    pub fn clear_preferred(&mut self) {
        self.preferred = None;
    }

    /// Marks the element at `index` as preferred. Out of range indices are ignored.
    pub fn set_preferred_index(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.preferred = Some(index);
            true
        } else {
            false
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Appends `item` and makes it the preferred element. The previous
    /// preferred element stays in the list.
    pub fn add_preferred(&mut self, item: T) {
        self.add(item, true);
    }

    /// Appends `item`, marking it preferred only when `preferred` is set.
    pub fn add(&mut self, item: T, preferred: bool) {
        self.items.push(item);
        if preferred {
            self.preferred = Some(self.items.len() - 1);
        }
    }

    pub fn insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item);
        if let Some(current) = self.preferred {
            if current >= index {
                self.preferred = Some(current + 1);
            }
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.preferred = match self.preferred {
            Some(current) if current == index => None,
            Some(current) if current > index => Some(current - 1),
            other => other,
        };
        Some(removed)
    }

    pub fn remove_range(&mut self, range: Range<usize>) {
        let end = range.end.min(self.items.len());
        let start = range.start.min(end);
        self.items.drain(start..end);
        self.preferred = match self.preferred {
            Some(current) if (start..end).contains(&current) => None,
            Some(current) if current >= end => Some(current - (end - start)),
            other => other,
        };
    }

    /// Keeps only the elements matching `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let preferred = self.preferred;
        let mut kept = 0;
        let mut new_preferred = None;
        let mut index = 0;
        self.items.retain(|item| {
            let retained = keep(item);
            if retained {
                if preferred == Some(index) {
                    new_preferred = Some(kept);
                }
                kept += 1;
            }
            index += 1;
            retained
        });
        self.preferred = new_preferred;
    }

    /// Removes every element matching `remove`, returning how many went away.
    pub fn remove_if(&mut self, mut remove: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.retain(|item| !remove(item));
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.preferred = None;
    }
}

impl<T: PartialEq> PrefList<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn position(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }

    /// Marks an existing member as preferred. Non-members are rejected.
    pub fn set_preferred(&mut self, item: &T) -> bool {
        match self.position(item) {
            Some(index) => self.set_preferred_index(index),
            None => false,
        }
    }

    /// Removes the first element equal to `item`.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.position(item) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    /// Removes every element that is equal to one of `items`.
    pub fn remove_all(&mut self, items: &[T]) -> usize {
        self.remove_if(|candidate| items.contains(candidate))
    }

    /// Keeps only the elements that are equal to one of `items`.
    pub fn retain_all(&mut self, items: &[T]) {
        self.retain(|candidate| items.contains(candidate));
    }

    /// Replaces the element at `index`, returning the old one. The marker
    /// survives only when the replacement equals the element it replaces.
    pub fn set(&mut self, index: usize, item: T) -> Option<T> {
        let slot = self.items.get_mut(index)?;
        let old = std::mem::replace(slot, item);
        if self.preferred == Some(index) && self.items[index] != old {
            self.preferred = None;
        }
        Some(old)
    }

    /// Replaces every element in place with `map(element)`. The marker
    /// survives only when the preferred element maps to an equal value.
    pub fn replace_all(&mut self, mut map: impl FnMut(&T) -> T) {
        let mut preferred_kept = false;
        for (index, item) in self.items.iter_mut().enumerate() {
            let next = map(item);
            if self.preferred == Some(index) {
                preferred_kept = next == *item;
            }
            *item = next;
        }
        if !preferred_kept {
            self.preferred = None;
        }
    }
}

impl<T> FromIterator<T> for PrefList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            preferred: None,
        }
    }
}

impl<'a, T> IntoIterator for &'a PrefList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
