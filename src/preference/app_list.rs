use serde::Serialize;

use super::Dependency;
use crate::constants::suffix;
use crate::store::{PreferenceStore, StoreEditor};

/// A chosen external application component.
/// Persists the activity at `key`, the package at `key_package` and the
/// display name at `key_nicename`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppListPreference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_activity: Option<String>,
}

pub fn package_key(key: &str) -> String {
    format!("{key}{}", suffix::APP_PACKAGE)
}

pub fn nice_name_key(key: &str) -> String {
    format!("{key}{}", suffix::APP_NICE_NAME)
}

impl AppListPreference {
    pub fn select(&mut self, name: &str, package: &str, activity: &str) {
        self.app_name = Some(name.to_string());
        self.app_package = Some(package.to_string());
        self.app_activity = Some(activity.to_string());
    }

    /// Stored values replace the current ones; absent entries clear them
    pub(crate) fn load(&mut self, key: &str, store: &dyn PreferenceStore) {
        self.app_activity = store.get_string(key);
        self.app_package = store.get_string(&package_key(key));
        self.app_name = store.get_string(&nice_name_key(key));
    }

    pub(crate) fn save(&self, key: &str, editor: &mut StoreEditor) {
        editor.put_string(key, self.app_activity.as_deref());
        editor.put_string(package_key(key), self.app_package.as_deref());
        editor.put_string(nice_name_key(key), self.app_name.as_deref());
    }

    /// Compares the package name; ordering operators always pass
    pub(crate) fn meets_dependency(&self, dependency: &Dependency) -> bool {
        if dependency.operator.is_equality() {
            dependency
                .operator
                .compare(&self.app_package.as_deref(), &Some(dependency.value.as_str()))
        } else {
            true
        }
    }
}
