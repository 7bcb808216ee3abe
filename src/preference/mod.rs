//! The preference tree model
//!
//! A [`Preference`] carries the fields common to every setting plus a closed
//! [`PreferenceKind`] with the variant state. Everything that differs between
//! kinds (persistence, dependency evaluation, text input) is dispatched with a
//! `match` here so adding a kind is a compile error everywhere it matters.

pub mod app_list;
pub mod boolean;
pub mod color;
pub mod dependency;
pub mod group;
pub mod list;
pub mod message;
pub mod seekbar;

pub use app_list::AppListPreference;
pub use boolean::BooleanPreference;
pub use color::{ColorItem, ColorPreference, ColorPreferenceGroup};
pub use dependency::{Dependency, Operator};
pub use group::{Children, PreferenceGroup};
pub use list::ListPreference;
pub use message::MessagePreference;
pub use seekbar::{SeekbarNumber, SeekbarParams};

use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::{document, kind};
use crate::resources::{self, ResourceResolver};
use crate::store::{PreferenceStore, StoreEditor};

/// Variant state, tagged by the document `type` it was built from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PreferenceKind {
    #[serde(rename = "boolean")]
    Boolean(BooleanPreference),
    #[serde(rename = "list_single")]
    List(ListPreference),
    #[serde(rename = "list_apps")]
    AppList(AppListPreference),
    #[serde(rename = "color")]
    Color(ColorPreference),
    #[serde(rename = "color_group")]
    ColorGroup(ColorPreferenceGroup),
    #[serde(rename = "section")]
    Section,
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "message")]
    Message(MessagePreference),
    #[serde(rename = "seekbar_int")]
    IntSeekbar(SeekbarParams<i32>),
    #[serde(rename = "seekbar_float")]
    FloatSeekbar(SeekbarParams<f32>),
    #[serde(rename = "group")]
    Group(PreferenceGroup),
}

impl PreferenceKind {
    /// Document `type` string for this kind
    pub fn type_name(&self) -> &'static str {
        match self {
            PreferenceKind::Boolean(_) => kind::BOOLEAN,
            PreferenceKind::List(_) => kind::LIST_SINGLE,
            PreferenceKind::AppList(_) => kind::LIST_APPS,
            PreferenceKind::Color(_) => kind::COLOR,
            PreferenceKind::ColorGroup(_) => kind::COLOR_GROUP,
            PreferenceKind::Section => kind::SECTION,
            PreferenceKind::Simple => kind::SIMPLE,
            PreferenceKind::Message(_) => kind::MESSAGE,
            PreferenceKind::IntSeekbar(_) => kind::SEEKBAR_INT,
            PreferenceKind::FloatSeekbar(_) => kind::SEEKBAR_FLOAT,
            PreferenceKind::Group(_) => kind::GROUP,
        }
    }
}

/// One configurable setting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preference {
    pub key: String,
    /// Store partition the value is persisted in
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub dependency: Option<Dependency>,
    #[serde(flatten)]
    pub kind: PreferenceKind,
}

impl Preference {
    pub fn new(key: impl Into<String>, kind: PreferenceKind) -> Self {
        Self {
            key: key.into(),
            namespace: document::DEFAULT_NAMESPACE.to_string(),
            name: None,
            description: None,
            dependency: None,
            kind,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Dependency satisfied (or absent) and not a dismissed message
    pub fn allow_display(&self) -> bool {
        let passed = self.dependency.as_ref().is_none_or(|dependency| dependency.passed);
        let dismissed = matches!(&self.kind, PreferenceKind::Message(message) if message.dismissed);
        passed && !dismissed
    }

    /// Whether this preference's current value satisfies `dependency`.
    /// Kinds without a comparable value never block display.
    pub fn meets_dependency(&self, dependency: Option<&Dependency>) -> bool {
        let Some(dependency) = dependency else {
            return true;
        };
        match &self.kind {
            PreferenceKind::Boolean(pref) => pref.meets_dependency(dependency),
            PreferenceKind::List(pref) => pref.meets_dependency(dependency),
            PreferenceKind::AppList(pref) => pref.meets_dependency(dependency),
            PreferenceKind::IntSeekbar(params) => params.meets_dependency(dependency),
            PreferenceKind::FloatSeekbar(params) => params.meets_dependency(dependency),
            _ => true,
        }
    }

    /// Evaluate `child`'s dependency with `self` as the parent
    pub fn meets_dependency_of(&self, child: &Preference) -> bool {
        self.meets_dependency(child.dependency.as_ref())
    }

    /// Description for the current state; only switches vary it
    pub fn context_description(&self) -> Option<&str> {
        match &self.kind {
            PreferenceKind::Boolean(pref) => pref.context_description(self.description.as_deref()),
            _ => self.description.as_deref(),
        }
    }

    /// Store key whose presence means the value was persisted before
    pub fn persisted_key(&self) -> Option<String> {
        match &self.kind {
            PreferenceKind::Boolean(_) | PreferenceKind::List(_) | PreferenceKind::Color(_) => {
                Some(self.key.clone())
            }
            // Absent app fields are removed on save, so only a written one counts
            PreferenceKind::AppList(app) => {
                if app.app_activity.is_some() {
                    Some(self.key.clone())
                } else if app.app_package.is_some() {
                    Some(app_list::package_key(&self.key))
                } else {
                    app.app_name.as_ref().map(|_| app_list::nice_name_key(&self.key))
                }
            }
            PreferenceKind::IntSeekbar(_) | PreferenceKind::FloatSeekbar(_) => {
                Some(seekbar::value_key(&self.key))
            }
            PreferenceKind::Message(message) if message.dismissible => {
                Some(message::dismissed_key(&self.key))
            }
            _ => None,
        }
    }

    pub fn load(&mut self, store: &dyn PreferenceStore) {
        let key = self.key.as_str();
        match &mut self.kind {
            PreferenceKind::Boolean(pref) => pref.load(key, store),
            PreferenceKind::List(pref) => pref.load(key, store),
            PreferenceKind::AppList(pref) => pref.load(key, store),
            PreferenceKind::Color(pref) => pref.color.load(key, store),
            PreferenceKind::ColorGroup(group) => {
                for child in group.colors.iter_mut() {
                    child.load(store);
                }
            }
            PreferenceKind::Message(message) if message.dismissible => message.load(key, store),
            PreferenceKind::IntSeekbar(params) => params.load(key, store),
            PreferenceKind::FloatSeekbar(params) => params.load(key, store),
            PreferenceKind::Group(group) => group.load(store),
            _ => {}
        }
    }

    pub fn save(&self, editor: &mut StoreEditor) {
        let key = self.key.as_str();
        match &self.kind {
            PreferenceKind::Boolean(pref) => pref.save(key, editor),
            PreferenceKind::List(pref) => pref.save(key, editor),
            PreferenceKind::AppList(pref) => pref.save(key, editor),
            PreferenceKind::Color(pref) => pref.color.save(key, editor),
            PreferenceKind::ColorGroup(group) => {
                for child in group.colors.iter() {
                    child.save(editor);
                }
            }
            PreferenceKind::Message(message) if message.dismissible => message.save(key, editor),
            PreferenceKind::IntSeekbar(params) => params.save(key, editor),
            PreferenceKind::FloatSeekbar(params) => params.save(key, editor),
            PreferenceKind::Group(group) => group.save(editor),
            _ => {}
        }
    }

    /// Queue the current value if the store has nothing for it yet.
    /// Containers recurse into their children.
    pub(crate) fn pre_init_into(
        &self,
        store: &dyn PreferenceStore,
        editor: &mut StoreEditor,
        initialised: &mut usize,
    ) {
        if let Some(children) = self.children() {
            for child in children.iter() {
                child.pre_init_into(store, editor, initialised);
            }
            return;
        }

        let Some(persisted) = self.persisted_key() else {
            return;
        };
        if store.contains_key(&persisted) {
            return;
        }
        debug!(key = %self.key, "Initialising missing preference value");
        self.save(editor);
        *initialised += 1;
    }

    /// Move this preference, and any children, into another store partition
    pub fn set_namespace(&mut self, namespace: &str) {
        self.namespace = namespace.to_string();
        match &mut self.kind {
            PreferenceKind::ColorGroup(group) => {
                for child in group.colors.iter_mut() {
                    child.set_namespace(namespace);
                }
            }
            PreferenceKind::Group(group) => {
                group.namespace = namespace.to_string();
                group.apply_namespace();
            }
            _ => {}
        }
    }

    /// Children of container kinds
    pub fn children(&self) -> Option<&Children> {
        match &self.kind {
            PreferenceKind::ColorGroup(group) => Some(&group.colors),
            PreferenceKind::Group(group) => Some(group.children()),
            _ => None,
        }
    }

    /// Route an update for a descendant key into this container
    pub(crate) fn notify_child_update(&mut self, updated: Preference) -> Option<usize> {
        match &mut self.kind {
            PreferenceKind::ColorGroup(group) => group.notify_update(updated),
            PreferenceKind::Group(group) => group.notify_update(updated),
            _ => {
                warn!(key = %self.key, child = %updated.key, "Preference has no children to update");
                None
            }
        }
    }

    /// Same key and kind, i.e. the same row in a displayed list
    pub fn same_object(&self, other: &Preference) -> bool {
        self.key == other.key && self.type_name() == other.type_name()
    }

    /// Shallow comparison of what a list row shows. Color groups compare
    /// their settings and child count; nested groups compare child keys.
    pub fn same_contents(&self, other: &Preference) -> bool {
        if self.name != other.name
            || self.description != other.description
            || self.allow_display() != other.allow_display()
        {
            return false;
        }
        match (&self.kind, &other.kind) {
            (PreferenceKind::ColorGroup(a), PreferenceKind::ColorGroup(b)) => {
                a.alpha_enabled == b.alpha_enabled && a.colors.len() == b.colors.len()
            }
            (PreferenceKind::Group(a), PreferenceKind::Group(b)) => {
                a.name == b.name && a.same_contents(b)
            }
            (a, b) => a == b,
        }
    }

    /// Mark a dismissible message as dismissed. Returns false for anything else.
    pub fn dismiss(&mut self) -> bool {
        match &mut self.kind {
            PreferenceKind::Message(message) if message.dismissible => {
                message.dismissed = true;
                true
            }
            _ => {
                debug!(key = %self.key, kind = self.type_name(), "Preference cannot be dismissed");
                false
            }
        }
    }

    /// Apply a value typed as text, e.g. from the command line.
    ///
    /// Lists take an option index, colors take `#AARRGGBB`/`#RRGGBB` or a
    /// decimal ARGB, app lists take `package/activity`. Returns false when
    /// the text does not fit the kind, leaving the preference unchanged.
    pub fn set_from_text(&mut self, text: &str, resolver: &dyn ResourceResolver) -> bool {
        let text = text.trim();
        let applied = match &mut self.kind {
            PreferenceKind::Boolean(pref) => parse_switch(text).map(|checked| pref.checked = checked),
            PreferenceKind::List(pref) => text
                .parse::<i32>()
                .ok()
                .map(|index| pref.select(index, resolver)),
            PreferenceKind::AppList(pref) => text.split_once('/').map(|(package, activity)| {
                let name = pref.app_name.clone().unwrap_or_else(|| package.to_string());
                pref.select(&name, package, activity)
            }),
            PreferenceKind::Color(pref) => resources::parse_color(text).map(|color| {
                pref.color = ColorItem::new(color);
            }),
            PreferenceKind::Message(message) if message.dismissible => {
                parse_switch(text).map(|dismissed| message.dismissed = dismissed)
            }
            PreferenceKind::IntSeekbar(params) => {
                i32::parse_value(text).map(|value| params.set_value(value))
            }
            PreferenceKind::FloatSeekbar(params) => {
                f32::parse_value(text).map(|value| params.set_value(value))
            }
            _ => None,
        };

        if applied.is_none() {
            warn!(key = %self.key, kind = self.type_name(), value = %text, "Value does not apply to preference");
        }
        applied.is_some()
    }
}

fn parse_switch(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::LiteralResources;
    use crate::store::MemoryStore;

    fn message(key: &str, dismissible: bool) -> Preference {
        Preference::new(key, PreferenceKind::Message(MessagePreference::new(dismissible)))
    }

    #[test]
    fn test_dependency_dispatch_by_kind() {
        let parent = Preference::new("switch", PreferenceKind::Boolean(BooleanPreference::new(true)));
        let mut child = Preference::new("child", PreferenceKind::Simple);
        child.dependency = Dependency::parse("switch == true");
        assert!(parent.meets_dependency_of(&child));

        child.dependency = Dependency::parse("switch == false");
        assert!(!parent.meets_dependency_of(&child));

        let section = Preference::new("switch", PreferenceKind::Section);
        assert!(section.meets_dependency_of(&child));
        assert!(parent.meets_dependency(None));
    }

    #[test]
    fn test_allow_display_follows_dependency_flag() {
        let mut pref = Preference::new("child", PreferenceKind::Simple);
        assert!(pref.allow_display());

        let mut dependency = Dependency::new("parent", Operator::Eq, "true");
        dependency.passed = false;
        pref.dependency = Some(dependency);
        assert!(!pref.allow_display());
    }

    #[test]
    fn test_dismissed_message_is_hidden() {
        let mut pref = message("welcome", true);
        assert!(pref.allow_display());
        assert!(pref.dismiss());
        assert!(!pref.allow_display());

        let mut sticky = message("notice", false);
        assert!(!sticky.dismiss());
        assert!(sticky.allow_display());
    }

    #[test]
    fn test_message_dismissal_persists() {
        let mut pref = message("welcome", true);
        pref.dismiss();

        let mut store = MemoryStore::new();
        let mut editor = StoreEditor::new();
        pref.save(&mut editor);
        store.commit(editor).unwrap();
        assert!(store.get_bool("welcome_dismissed", false));

        let mut reloaded = message("welcome", true);
        reloaded.load(&store);
        assert!(!reloaded.allow_display());
    }

    #[test]
    fn test_persisted_key_per_kind() {
        let seekbar = Preference::new("volume", PreferenceKind::IntSeekbar(SeekbarParams::new(0, 10, 1, 5)));
        assert_eq!(seekbar.persisted_key().as_deref(), Some("volume_value"));

        let switch = Preference::new("wifi", PreferenceKind::Boolean(BooleanPreference::new(false)));
        assert_eq!(switch.persisted_key().as_deref(), Some("wifi"));

        assert_eq!(Preference::new("header", PreferenceKind::Section).persisted_key(), None);
        assert_eq!(message("notice", false).persisted_key(), None);

        let empty_app = Preference::new("launcher", PreferenceKind::AppList(AppListPreference::default()));
        assert_eq!(empty_app.persisted_key(), None);

        let package_only = AppListPreference {
            app_package: Some("clock".to_string()),
            ..AppListPreference::default()
        };
        let app = Preference::new("launcher", PreferenceKind::AppList(package_only));
        assert_eq!(app.persisted_key().as_deref(), Some("launcher_package"));
    }

    #[test]
    fn test_pre_init_twice_writes_nothing_new() {
        let mut nested = PreferenceGroup::new("prefs");
        nested.set_preferences(vec![
            Preference::new("launcher", PreferenceKind::AppList(AppListPreference::default())),
            Preference::new("wifi", PreferenceKind::Boolean(BooleanPreference::new(true))),
        ]);
        let group = Preference::new("nested", PreferenceKind::Group(nested));

        let mut store = MemoryStore::new();
        let mut initialised = 0;
        let mut editor = StoreEditor::new();
        group.pre_init_into(&store, &mut editor, &mut initialised);
        store.commit(editor).unwrap();
        assert_eq!(initialised, 1);

        let mut again = 0;
        let mut editor = StoreEditor::new();
        group.pre_init_into(&store, &mut editor, &mut again);
        assert_eq!(again, 0);
        assert!(editor.is_empty());
    }

    #[test]
    fn test_context_description_uses_switch_state() {
        let mut switch = BooleanPreference::new(true);
        switch.selected_description = Some("On".to_string());
        let mut pref = Preference::new("wifi", PreferenceKind::Boolean(switch));
        pref.description = Some("Wireless".to_string());
        assert_eq!(pref.context_description(), Some("On"));

        if let PreferenceKind::Boolean(switch) = &mut pref.kind {
            switch.checked = false;
        }
        assert_eq!(pref.context_description(), Some("Wireless"));
    }

    #[test]
    fn test_set_namespace_reaches_color_children() {
        let colors = vec![Preference::new(
            "primary",
            PreferenceKind::Color(ColorPreference::new(ColorItem::new(1))),
        )];
        let mut pref = Preference::new(
            "palette",
            PreferenceKind::ColorGroup(ColorPreferenceGroup::new(colors, false)),
        );
        pref.set_namespace("theme");

        let children = pref.children().unwrap();
        assert!(children.iter().all(|child| child.namespace == "theme"));
    }

    #[test]
    fn test_same_object_and_contents() {
        let a = Preference::new("wifi", PreferenceKind::Boolean(BooleanPreference::new(false)));
        let mut b = a.clone();
        assert!(a.same_object(&b));
        assert!(a.same_contents(&b));

        b.kind = PreferenceKind::Boolean(BooleanPreference::new(true));
        assert!(a.same_object(&b));
        assert!(!a.same_contents(&b));

        let other = Preference::new("wifi", PreferenceKind::Simple);
        assert!(!a.same_object(&other));
    }

    #[test]
    fn test_nested_groups_compare_child_keys() {
        let nested = |keys: &[&str]| {
            let mut group = PreferenceGroup::new("prefs");
            group.set_preferences(keys.iter().map(|key| Preference::new(*key, PreferenceKind::Simple)).collect());
            Preference::new("advanced", PreferenceKind::Group(group))
        };
        assert!(nested(&["a", "b"]).same_contents(&nested(&["a", "b"])));
        assert!(!nested(&["a", "b"]).same_contents(&nested(&["a", "c"])));
        assert!(!nested(&["a", "b"]).same_contents(&nested(&["b", "a"])));
    }

    #[test]
    fn test_set_from_text() {
        let resolver = LiteralResources;

        let mut switch = Preference::new("wifi", PreferenceKind::Boolean(BooleanPreference::new(false)));
        assert!(switch.set_from_text("on", &resolver));
        assert!(matches!(&switch.kind, PreferenceKind::Boolean(pref) if pref.checked));
        assert!(!switch.set_from_text("maybe", &resolver));

        let mut seekbar = Preference::new("volume", PreferenceKind::IntSeekbar(SeekbarParams::new(0, 10, 2, 0)));
        assert!(seekbar.set_from_text("7", &resolver));
        assert!(matches!(&seekbar.kind, PreferenceKind::IntSeekbar(params) if params.value() == 6));

        let mut color = Preference::new(
            "accent",
            PreferenceKind::Color(ColorPreference::new(ColorItem::from_swatch(0, 1, 2))),
        );
        assert!(color.set_from_text("#FF0000", &resolver));
        assert!(matches!(
            &color.kind,
            PreferenceKind::Color(pref) if pref.color == ColorItem::new(0xFFFF_0000_u32 as i32)
        ));

        let mut app = Preference::new("launcher", PreferenceKind::AppList(AppListPreference::default()));
        assert!(app.set_from_text("clock/clock.Alarm", &resolver));
        assert!(matches!(
            &app.kind,
            PreferenceKind::AppList(pref) if pref.app_package.as_deref() == Some("clock")
        ));

        let mut section = Preference::new("header", PreferenceKind::Section);
        assert!(!section.set_from_text("1", &resolver));
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let mut pref = Preference::new("wifi", PreferenceKind::Boolean(BooleanPreference::new(true)));
        pref.dependency = Dependency::parse("airplane == false");
        let value = serde_json::to_value(&pref).unwrap();
        assert_eq!(value["type"], "boolean");
        assert_eq!(value["key"], "wifi");
        assert_eq!(value["checked"], true);
        assert_eq!(value["if"]["key"], "airplane");
    }
}
