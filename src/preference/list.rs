use serde::Serialize;
use tracing::warn;

use super::Dependency;
use crate::constants::suffix;
use crate::resources::{self, ResourceResolver};
use crate::store::{PreferenceStore, StoreEditor};

/// Single choice from a resource-backed list of options.
/// Persists the selected index at `key` and its label at `key_display`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListPreference {
    pub selected_value: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_display: Option<String>,
    /// Reference to a string array, e.g. `@array/modes`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options_ref: Option<String>,
}

pub fn display_key(key: &str) -> String {
    format!("{key}{}", suffix::LIST_DISPLAY)
}

impl ListPreference {
    pub fn new(selected_value: i32) -> Self {
        Self {
            selected_value,
            ..Self::default()
        }
    }

    /// Refresh `selected_display` from the option list.
    /// Leaves the previous label alone when the options or index are unusable.
    pub fn update_display_value(&mut self, resolver: &dyn ResourceResolver) {
        let Some(reference) = self.display_options_ref.as_deref() else {
            return;
        };
        let Some(options) = resources::get_string_array(resolver, reference) else {
            warn!(reference = %reference, "List options could not be resolved");
            return;
        };
        match usize::try_from(self.selected_value)
            .ok()
            .and_then(|index| options.get(index))
        {
            Some(label) => self.selected_display = Some(label.clone()),
            None => warn!(
                reference = %reference,
                selected = self.selected_value,
                options = options.len(),
                "Selected index is outside the option list"
            ),
        }
    }

    /// Select an index and refresh its label
    pub fn select(&mut self, index: i32, resolver: &dyn ResourceResolver) {
        self.selected_value = index;
        self.update_display_value(resolver);
    }

    pub(crate) fn load(&mut self, key: &str, store: &dyn PreferenceStore) {
        self.selected_value = store.get_int(key, self.selected_value);
        if let Some(display) = store.get_string(&display_key(key)) {
            self.selected_display = Some(display);
        }
    }

    pub(crate) fn save(&self, key: &str, editor: &mut StoreEditor) {
        editor.put_int(key, self.selected_value);
        editor.put_string(display_key(key), self.selected_display.as_deref());
    }

    pub(crate) fn meets_dependency(&self, dependency: &Dependency) -> bool {
        match dependency.value.parse::<i32>() {
            Ok(expected) => dependency.operator.compare(&self.selected_value, &expected),
            Err(_) => {
                warn!(dependency = %dependency, "List dependency value is not an integer");
                true
            }
        }
    }
}
