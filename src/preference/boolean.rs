use serde::Serialize;

use super::Dependency;
use crate::store::{PreferenceStore, StoreEditor};

/// On/off switch persisted as a single bool at `key`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BooleanPreference {
    pub checked: bool,
    /// Shown instead of the description while checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_description: Option<String>,
    /// Shown instead of the description while unchecked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unselected_description: Option<String>,
}

impl BooleanPreference {
    pub fn new(checked: bool) -> Self {
        Self {
            checked,
            ..Self::default()
        }
    }

    /// Description for the current state, falling back to `description`
    pub fn context_description<'a>(&'a self, description: Option<&'a str>) -> Option<&'a str> {
        let specific = if self.checked {
            self.selected_description.as_deref()
        } else {
            self.unselected_description.as_deref()
        };
        specific.or(description)
    }

    pub(crate) fn load(&mut self, key: &str, store: &dyn PreferenceStore) {
        self.checked = store.get_bool(key, self.checked);
    }

    pub(crate) fn save(&self, key: &str, editor: &mut StoreEditor) {
        editor.put_bool(key, self.checked);
    }

    /// Only `==` and `!=` gate on a switch; other operators always pass
    pub(crate) fn meets_dependency(&self, dependency: &Dependency) -> bool {
        if dependency.operator.is_equality() {
            dependency
                .operator
                .compare(&self.checked, &dependency.value_as_bool())
        } else {
            true
        }
    }
}
