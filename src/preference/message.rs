use serde::Serialize;

use crate::constants::suffix;
use crate::store::{PreferenceStore, StoreEditor};

/// Informational card the user may swipe away.
/// Only the dismissed flag is persisted, at `key_dismissed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePreference {
    pub dismissible: bool,
    pub dismissed: bool,
}

pub fn dismissed_key(key: &str) -> String {
    format!("{key}{}", suffix::DISMISSED)
}

impl MessagePreference {
    pub fn new(dismissible: bool) -> Self {
        Self {
            dismissible,
            dismissed: false,
        }
    }

    pub(crate) fn load(&mut self, key: &str, store: &dyn PreferenceStore) {
        self.dismissed = store.get_bool(&dismissed_key(key), false);
    }

    pub(crate) fn save(&self, key: &str, editor: &mut StoreEditor) {
        editor.put_bool(dismissed_key(key), self.dismissed);
    }
}
