use serde::Serialize;
use tracing::warn;

use super::group::Children;
use super::{Preference, PreferenceKind};
use crate::constants::{color::NO_SWATCH, suffix};
use crate::store::{PreferenceStore, StoreEditor};

/// An ARGB color, optionally tagged with the swatch it was picked from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorItem {
    pub color: i32,
    /// Palette index, or -1 for a free color
    pub swatch: i32,
    /// Position within the palette, or -1 for a free color
    pub swatch_position: i32,
}

impl Default for ColorItem {
    fn default() -> Self {
        Self::new(0)
    }
}

pub fn swatch_key(key: &str) -> String {
    format!("{key}{}", suffix::SWATCH)
}

pub fn swatch_position_key(key: &str) -> String {
    format!("{key}{}", suffix::SWATCH_POSITION)
}

impl ColorItem {
    pub fn new(color: i32) -> Self {
        Self {
            color,
            swatch: NO_SWATCH,
            swatch_position: NO_SWATCH,
        }
    }

    pub fn from_swatch(color: i32, swatch: i32, swatch_position: i32) -> Self {
        Self {
            color,
            swatch,
            swatch_position,
        }
    }

    pub fn is_from_swatch(&self) -> bool {
        self.swatch != NO_SWATCH && self.swatch_position != NO_SWATCH
    }

    /// Forget the swatch origin, keeping the color
    pub fn clear_swatch(&mut self) {
        self.swatch = NO_SWATCH;
        self.swatch_position = NO_SWATCH;
    }

    /// Swatch fields are not carried over from the previous value
    pub(crate) fn load(&mut self, key: &str, store: &dyn PreferenceStore) {
        self.color = store.get_int(key, self.color);
        self.swatch = store.get_int(&swatch_key(key), NO_SWATCH);
        self.swatch_position = store.get_int(&swatch_position_key(key), NO_SWATCH);
    }

    pub(crate) fn save(&self, key: &str, editor: &mut StoreEditor) {
        editor.put_int(key, self.color);
        editor.put_int(swatch_key(key), self.swatch);
        editor.put_int(swatch_position_key(key), self.swatch_position);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColorPreference {
    pub color: ColorItem,
    pub alpha_enabled: bool,
}

impl ColorPreference {
    pub fn new(color: ColorItem) -> Self {
        Self {
            color,
            alpha_enabled: false,
        }
    }

    pub fn update(&mut self, color: i32, swatch: i32, swatch_position: i32) {
        self.color = ColorItem::from_swatch(color, swatch, swatch_position);
    }
}

/// Several colors edited together, e.g. a theme palette.
/// Children are always `Color` preferences and share the group namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColorPreferenceGroup {
    pub alpha_enabled: bool,
    pub colors: Children,
}

impl ColorPreferenceGroup {
    /// Non-color entries are dropped. `alpha_enabled` on the group forces
    /// alpha on every child.
    pub fn new(colors: Vec<Preference>, alpha_enabled: bool) -> Self {
        let colors = colors
            .into_iter()
            .filter_map(|mut pref| match &mut pref.kind {
                PreferenceKind::Color(color) => {
                    if alpha_enabled {
                        color.alpha_enabled = true;
                    }
                    Some(pref)
                }
                _ => {
                    warn!(key = %pref.key, kind = pref.type_name(), "Dropping non-color entry from color group");
                    None
                }
            })
            .collect();

        Self {
            alpha_enabled,
            colors: Children::new(colors),
        }
    }

    pub(crate) fn notify_update(&mut self, mut updated: Preference) -> Option<usize> {
        let PreferenceKind::Color(color) = &mut updated.kind else {
            warn!(key = %updated.key, kind = updated.type_name(), "Color group only accepts color updates");
            return None;
        };
        if self.alpha_enabled {
            color.alpha_enabled = true;
        }
        self.colors.notify_update(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn color(key: &str, value: i32) -> Preference {
        Preference::new(key, PreferenceKind::Color(ColorPreference::new(ColorItem::new(value))))
    }

    #[test]
    fn test_color_item_defaults_to_free_color() {
        let item = ColorItem::new(0x11223344);
        assert_eq!(item.swatch, -1);
        assert_eq!(item.swatch_position, -1);
        assert!(!item.is_from_swatch());
    }

    #[test]
    fn test_color_item_save_then_load() {
        let item = ColorItem::from_swatch(0xFF_FF_00_FF_u32 as i32, 3, 7);
        let mut store = MemoryStore::new();
        let mut editor = StoreEditor::new();
        item.save("accent", &mut editor);
        store.commit(editor).unwrap();

        assert_eq!(store.get_int("accent_swatch", 0), 3);
        assert_eq!(store.get_int("accent_swatch_position", 0), 7);

        let mut loaded = ColorItem::new(0);
        loaded.load("accent", &store);
        assert_eq!(loaded, item);
    }

    #[test]
    fn test_load_without_swatch_resets_to_free_color() {
        let mut store = MemoryStore::new();
        let mut editor = StoreEditor::new();
        editor.put_int("accent", 42);
        store.commit(editor).unwrap();

        let mut item = ColorItem::from_swatch(1, 2, 3);
        item.load("accent", &store);
        assert_eq!(item, ColorItem::new(42));
    }

    #[test]
    fn test_group_alpha_applies_to_children() {
        let group = ColorPreferenceGroup::new(vec![color("a", 1), color("b", 2)], true);
        assert!(group.colors.iter().all(|pref| match &pref.kind {
            PreferenceKind::Color(color) => color.alpha_enabled,
            _ => false,
        }));
    }

    #[test]
    fn test_group_drops_non_color_children() {
        let group = ColorPreferenceGroup::new(
            vec![color("a", 1), Preference::new("oops", PreferenceKind::Simple)],
            false,
        );
        assert_eq!(group.colors.len(), 1);
    }

    #[test]
    fn test_group_notify_update() {
        let mut group = ColorPreferenceGroup::new(vec![color("a", 1), color("b", 2)], false);
        assert_eq!(group.notify_update(color("b", 99)), Some(1));
        assert_eq!(group.notify_update(color("missing", 5)), None);
        assert_eq!(
            group.notify_update(Preference::new("a", PreferenceKind::Simple)),
            None
        );

        match &group.colors.get(1).unwrap().kind {
            PreferenceKind::Color(color) => assert_eq!(color.color.color, 99),
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
