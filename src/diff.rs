//! List edits between two displayed snapshots
//!
//! Displayed positions are stable: dependency changes only add or remove
//! rows, they never reorder them. So the diff is a tail insert or tail
//! remove, plus a rebind of every overlapping row. Rows are always rebound
//! even when their contents look the same, since a renderer may hold
//! callbacks bound to the previous value.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::preference::{Preference, PreferenceGroup};
use crate::store::{PreferenceStore, StoreEditor};

/// One operation for a list renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "edit", rename_all = "snake_case")]
pub enum ListEdit {
    Inserted { position: usize, count: usize },
    Removed { position: usize, count: usize },
    Changed { position: usize, count: usize },
}

impl fmt::Display for ListEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, position, count) = match *self {
            ListEdit::Inserted { position, count } => ("insert", position, count),
            ListEdit::Removed { position, count } => ("remove", position, count),
            ListEdit::Changed { position, count } => ("rebind", position, count),
        };
        if count == 1 {
            write!(f, "{label} {position}")
        } else {
            write!(f, "{label} {}-{}", position, position + count - 1)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListDiff {
    pub old_len: usize,
    pub new_len: usize,
    pub edits: Vec<ListEdit>,
}

impl ListDiff {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Total rows touched by each kind of edit: (inserted, removed, changed)
    pub fn counts(&self) -> (usize, usize, usize) {
        self.edits
            .iter()
            .fold((0, 0, 0), |(inserted, removed, changed), edit| match *edit {
                ListEdit::Inserted { count, .. } => (inserted + count, removed, changed),
                ListEdit::Removed { count, .. } => (inserted, removed + count, changed),
                ListEdit::Changed { count, .. } => (inserted, removed, changed + count),
            })
    }
}

/// Edits turning `old` into `new`
pub fn diff(old: &[Preference], new: &[Preference]) -> ListDiff {
    let overlap = old.len().min(new.len());
    let mut edits = Vec::with_capacity(2);

    if new.len() > old.len() {
        edits.push(ListEdit::Inserted {
            position: old.len(),
            count: new.len() - old.len(),
        });
    } else if new.len() < old.len() {
        edits.push(ListEdit::Removed {
            position: new.len(),
            count: old.len() - new.len(),
        });
    }

    if overlap > 0 {
        edits.push(ListEdit::Changed {
            position: 0,
            count: overlap,
        });
    }

    let (same_rows, same_contents) = old
        .iter()
        .zip(new)
        .fold((0, 0), |(rows, contents), (a, b)| {
            let same_row = a.same_object(b);
            (
                rows + usize::from(same_row),
                contents + usize::from(same_row && a.same_contents(b)),
            )
        });
    debug!(
        old = old.len(),
        new = new.len(),
        same_rows,
        unchanged = same_contents,
        "Computed list diff"
    );

    ListDiff {
        old_len: old.len(),
        new_len: new.len(),
        edits,
    }
}

/// A group together with the snapshot a renderer last displayed
#[derive(Debug, Clone, Default)]
pub struct DisplayedList {
    group: PreferenceGroup,
    displayed: Vec<Preference>,
}

impl DisplayedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self) -> &PreferenceGroup {
        &self.group
    }

    pub fn into_group(self) -> PreferenceGroup {
        self.group
    }

    pub fn displayed(&self) -> &[Preference] {
        &self.displayed
    }

    pub fn len(&self) -> usize {
        self.displayed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displayed.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Preference> {
        self.displayed.get(position)
    }

    /// Show a new tree, replacing whatever was displayed
    pub fn set_group(&mut self, mut group: PreferenceGroup) -> ListDiff {
        group.update_dependencies();
        self.group = group;
        self.refresh()
    }

    /// Apply an edited copy of a preference. `None` when the key is unknown.
    pub fn notify_update(&mut self, updated: Preference) -> Option<ListDiff> {
        self.group.notify_update(updated)?;
        Some(self.refresh())
    }

    /// Dismiss the message shown at `position` and persist that.
    /// `Ok(None)` when there is nothing dismissible there.
    pub fn dismiss(
        &mut self,
        position: usize,
        store: &mut dyn PreferenceStore,
    ) -> Result<Option<ListDiff>, StoreError> {
        let Some(mut pref) = self.displayed.get(position).cloned() else {
            debug!(position, displayed = self.displayed.len(), "Dismiss position out of range");
            return Ok(None);
        };
        if !pref.dismiss() {
            return Ok(None);
        }

        let mut editor = StoreEditor::new();
        pref.save(&mut editor);
        store.commit(editor)?;

        info!(key = %pref.key, position, "Dismissed message");
        Ok(self.notify_update(pref))
    }

    fn refresh(&mut self) -> ListDiff {
        let next = self.group.displayable_snapshot();
        let edits = diff(&self.displayed, &next);
        self.displayed = next;
        edits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::{BooleanPreference, Dependency, MessagePreference, PreferenceKind};
    use crate::store::MemoryStore;

    fn simple(count: usize) -> Vec<Preference> {
        (0..count)
            .map(|index| Preference::new(format!("item_{index}"), PreferenceKind::Simple))
            .collect()
    }

    fn boolean(key: &str, checked: bool) -> Preference {
        Preference::new(key, PreferenceKind::Boolean(BooleanPreference::new(checked)))
    }

    #[test]
    fn test_growing_list_inserts_at_tail() {
        let result = diff(&simple(3), &simple(5));
        assert_eq!(
            result.edits,
            vec![
                ListEdit::Inserted { position: 3, count: 2 },
                ListEdit::Changed { position: 0, count: 3 },
            ]
        );
        assert_eq!(result.counts(), (2, 0, 3));
    }

    #[test]
    fn test_shrinking_list_removes_at_tail() {
        let result = diff(&simple(5), &simple(3));
        assert_eq!(
            result.edits,
            vec![
                ListEdit::Removed { position: 3, count: 2 },
                ListEdit::Changed { position: 0, count: 3 },
            ]
        );
    }

    #[test]
    fn test_equal_sizes_rebind_everything() {
        let result = diff(&simple(4), &simple(4));
        assert_eq!(result.edits, vec![ListEdit::Changed { position: 0, count: 4 }]);
    }

    #[test]
    fn test_empty_lists() {
        assert!(diff(&[], &[]).is_empty());
        assert_eq!(
            diff(&[], &simple(2)).edits,
            vec![ListEdit::Inserted { position: 0, count: 2 }]
        );
    }

    #[test]
    fn test_edit_display() {
        assert_eq!(ListEdit::Inserted { position: 3, count: 2 }.to_string(), "insert 3-4");
        assert_eq!(ListEdit::Changed { position: 0, count: 1 }.to_string(), "rebind 0");
    }

    fn dependent_group() -> PreferenceGroup {
        let mut detail = Preference::new("detail", PreferenceKind::Simple);
        detail.dependency = Dependency::parse("master == true");
        let mut group = PreferenceGroup::new("prefs");
        group.set_preferences(vec![boolean("master", false), detail]);
        group
    }

    #[test]
    fn test_displayed_list_tracks_dependency_changes() {
        let mut list = DisplayedList::new();
        let initial = list.set_group(dependent_group());
        assert_eq!(initial.edits, vec![ListEdit::Inserted { position: 0, count: 1 }]);

        let shown = list.notify_update(boolean("master", true)).unwrap();
        assert_eq!(shown.new_len, 2);
        assert_eq!(list.get(1).map(|pref| pref.key.as_str()), Some("detail"));

        let hidden = list.notify_update(boolean("master", false)).unwrap();
        assert_eq!(hidden.edits[0], ListEdit::Removed { position: 1, count: 1 });

        assert!(list.notify_update(boolean("unknown", true)).is_none());
    }

    #[test]
    fn test_dismiss_message() {
        let mut group = PreferenceGroup::new("prefs");
        group.set_preferences(vec![
            Preference::new("welcome", PreferenceKind::Message(MessagePreference::new(true))),
            Preference::new("footer", PreferenceKind::Simple),
        ]);
        let mut list = DisplayedList::new();
        list.set_group(group);
        let mut store = MemoryStore::new();

        // not a message
        assert!(list.dismiss(1, &mut store).unwrap().is_none());
        assert!(list.dismiss(9, &mut store).unwrap().is_none());

        let result = list.dismiss(0, &mut store).unwrap().unwrap();
        assert_eq!(result.edits[0], ListEdit::Removed { position: 1, count: 1 });
        assert_eq!(list.get(0).map(|pref| pref.key.as_str()), Some("footer"));
        assert!(store.get_bool("welcome_dismissed", false));
    }
}
