//! Containers of preferences
//!
//! [`Children`] is the single ordered-list-plus-key-map used by every
//! container variant, and owns the recursive key lookup and update logic.
//! [`PreferenceGroup`] adds dependency tracking and the displayable
//! projection on top.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::Preference;
use crate::error::StoreError;
use crate::store::{PreferenceStore, StoreEditor};

/// Ordered children with a key -> index map over the full list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Children {
    items: Vec<Preference>,
    #[serde(skip)]
    key_map: HashMap<String, usize>,
}

impl Children {
    pub fn new(items: Vec<Preference>) -> Self {
        let mut children = Self {
            items,
            key_map: HashMap::new(),
        };
        children.rebuild_key_map();
        if children.key_map.len() != children.items.len() {
            for (index, pref) in children.items.iter().enumerate() {
                if children.key_map.get(&pref.key) != Some(&index) {
                    warn!(key = %pref.key, index, "Duplicate preference key shadowed by a later item");
                }
            }
        }
        children
    }

    /// Later duplicates of a key shadow earlier ones
    pub(crate) fn rebuild_key_map(&mut self) {
        self.key_map = self
            .items
            .iter()
            .enumerate()
            .map(|(index, pref)| (pref.key.clone(), index))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Preference> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Preference> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Preference] {
        &self.items
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Preference> {
        self.items.iter_mut()
    }

    pub(crate) fn key_map(&self) -> &HashMap<String, usize> {
        &self.key_map
    }

    /// Direct child with this key
    pub fn find(&self, key: &str) -> Option<&Preference> {
        self.key_map.get(key).and_then(|&index| self.items.get(index))
    }

    /// Preference with this key at any depth, direct children first
    pub fn find_descendant(&self, key: &str) -> Option<&Preference> {
        self.find(key).or_else(|| {
            self.items
                .iter()
                .filter_map(Preference::children)
                .find_map(|nested| nested.find_descendant(key))
        })
    }

    /// Index of the child with this key, or of the child container that holds
    /// it somewhere below. Direct children win over nested matches.
    pub fn find_key_position(&self, key: &str) -> Option<usize> {
        if let Some(&index) = self.key_map.get(key) {
            return Some(index);
        }
        self.items.iter().position(|pref| {
            pref.children()
                .is_some_and(|nested| nested.find_key_position(key).is_some())
        })
    }

    /// Replace the matching child, or hand the update to the container that
    /// holds it. Returns the index in this list that changed.
    pub fn notify_update(&mut self, updated: Preference) -> Option<usize> {
        let Some(position) = self.find_key_position(&updated.key) else {
            debug!(key = %updated.key, "Update for unknown key ignored");
            return None;
        };

        let target = &mut self.items[position];
        if target.key == updated.key {
            *target = updated;
        } else {
            target.notify_child_update(updated)?;
        }
        Some(position)
    }
}

/// Root (or nested) container with dependency-driven visibility
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceGroup {
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Write defaults into the store on first load
    pub pre_init: bool,
    preferences: Children,
    /// Dependent key -> key of the preference it depends on
    #[serde(skip)]
    dependencies: HashMap<String, String>,
    /// Indices into `preferences` of the items currently allowed to display
    #[serde(skip)]
    displayable: Vec<usize>,
}

impl Default for PreferenceGroup {
    fn default() -> Self {
        Self::new(crate::constants::document::DEFAULT_NAMESPACE)
    }
}

impl PreferenceGroup {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: None,
            pre_init: false,
            preferences: Children::default(),
            dependencies: HashMap::new(),
            displayable: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    pub fn preferences(&self) -> &[Preference] {
        self.preferences.as_slice()
    }

    pub fn children(&self) -> &Children {
        &self.preferences
    }

    pub fn find_preference(&self, key: &str) -> Option<&Preference> {
        self.preferences.find(key)
    }

    /// Like [`Self::find_preference`] but also searches nested containers
    pub fn find_descendant(&self, key: &str) -> Option<&Preference> {
        self.preferences.find_descendant(key)
    }

    /// Key -> index into [`Self::preferences`], not into the displayable list
    pub fn key_map(&self) -> &HashMap<String, usize> {
        self.preferences.key_map()
    }

    pub fn dependencies(&self) -> &HashMap<String, String> {
        &self.dependencies
    }

    /// Replace the children and rebuild the dependency map.
    /// Call [`Self::update_dependencies`] before reading the displayable list.
    pub fn set_preferences(&mut self, preferences: Vec<Preference>) {
        self.preferences = Children::new(preferences);
        self.dependencies = self
            .preferences
            .iter()
            .filter_map(|pref| {
                pref.dependency
                    .as_ref()
                    .map(|dependency| (pref.key.clone(), dependency.key.clone()))
            })
            .collect();
        debug!(namespace = %self.namespace, count = self.len(), dependencies = self.dependencies.len(), "Preferences replaced");
    }

    /// Re-evaluate every dependency against current parent values, then
    /// recompute the displayable list and the key map
    pub fn update_dependencies(&mut self) {
        // Every item is evaluated by position so shadowed duplicate keys
        // never keep a stale flag
        let results: Vec<bool> = self
            .preferences
            .iter()
            .map(|child| match &child.dependency {
                // A missing parent never hides its dependent
                Some(dependency) => self
                    .preferences
                    .find(&dependency.key)
                    .is_none_or(|parent| parent.meets_dependency_of(child)),
                None => true,
            })
            .collect();

        for (pref, passed) in self.preferences.iter_mut().zip(results) {
            if let Some(dependency) = pref.dependency.as_mut() {
                dependency.passed = passed;
            }
        }

        self.displayable = self
            .preferences
            .iter()
            .enumerate()
            .filter(|(_, pref)| pref.allow_display())
            .map(|(index, _)| index)
            .collect();

        self.preferences.rebuild_key_map();
    }

    pub fn displayable_len(&self) -> usize {
        self.displayable.len()
    }

    /// Children whose dependencies currently pass, in their original order
    pub fn displayable_preferences(&self) -> impl Iterator<Item = &Preference> + '_ {
        self.displayable
            .iter()
            .filter_map(|&index| self.preferences.get(index))
    }

    /// Owned copy of the displayable list, for diffing against later states
    pub fn displayable_snapshot(&self) -> Vec<Preference> {
        self.displayable_preferences().cloned().collect()
    }

    pub fn find_key_position(&self, key: &str) -> Option<usize> {
        self.preferences.find_key_position(key)
    }

    /// Swap in an edited copy of a preference (found at any depth) and
    /// re-evaluate dependencies. `None` means the key is unknown and nothing
    /// changed.
    pub fn notify_update(&mut self, updated: Preference) -> Option<usize> {
        let key = updated.key.clone();
        let position = self.preferences.notify_update(updated)?;
        debug!(key = %key, position, "Updated preference");
        self.update_dependencies();
        Some(position)
    }

    /// Set every child's namespace to the group's
    pub fn apply_namespace(&mut self) {
        let namespace = self.namespace.clone();
        for pref in self.preferences.iter_mut() {
            pref.set_namespace(&namespace);
        }
    }

    pub fn load(&mut self, store: &dyn PreferenceStore) {
        for pref in self.preferences.iter_mut() {
            pref.load(store);
        }
        self.update_dependencies();
    }

    /// Queue every child's values; the caller commits the editor once
    pub fn save(&self, editor: &mut StoreEditor) {
        for pref in self.preferences.iter() {
            pref.save(editor);
        }
    }

    /// Write current values for every child whose value is not yet stored.
    /// Existing entries are never overwritten.
    pub fn pre_init(&self, store: &mut dyn PreferenceStore) -> Result<usize, StoreError> {
        let mut editor = StoreEditor::new();
        let mut initialised = 0;
        for pref in self.preferences.iter() {
            pref.pre_init_into(&*store, &mut editor, &mut initialised);
        }

        if initialised > 0 {
            info!(namespace = %self.namespace, count = initialised, "Writing default preference values");
            store.commit(editor)?;
        }
        Ok(initialised)
    }

    /// Same identity and same child keys in the same order
    pub fn same_contents(&self, other: &PreferenceGroup) -> bool {
        self.preferences.len() == other.preferences.len()
            && self
                .preferences
                .iter()
                .zip(other.preferences.iter())
                .all(|(a, b)| a.key == b.key)
    }
}
