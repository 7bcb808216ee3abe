//! Discrete sliders over int or float ranges
//!
//! A slider widget only knows positions `0..=step_count`. The params map
//! between those positions and the real values the rest of the system
//! reads, so `min` need not be zero and steps need not be one.

use serde::Serialize;
use std::fmt;
use tracing::warn;

use super::Dependency;
use crate::constants::suffix;
use crate::store::{PreferenceStore, StoreEditor};

pub fn value_key(key: &str) -> String {
    format!("{key}{}", suffix::SEEKBAR_VALUE)
}

/// Numeric types a seekbar can range over
pub trait SeekbarNumber: Copy + PartialOrd + fmt::Debug + fmt::Display + Serialize {
    /// Whole steps from `from` to `to`, rounded down
    fn steps_between(from: Self, to: Self, step_size: Self) -> i32;

    fn offset(min: Self, step_size: Self, steps: i32) -> Self;

    fn is_positive(self) -> bool;

    fn parse_value(text: &str) -> Option<Self>;

    fn read(store: &dyn PreferenceStore, key: &str, default: Self) -> Self;

    fn write(editor: &mut StoreEditor, key: &str, value: Self);
}

impl SeekbarNumber for i32 {
    fn steps_between(from: Self, to: Self, step_size: Self) -> i32 {
        if step_size <= 0 {
            return 0;
        }
        let steps = (i64::from(to) - i64::from(from)).div_euclid(i64::from(step_size));
        steps.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    fn offset(min: Self, step_size: Self, steps: i32) -> Self {
        min.saturating_add(step_size.saturating_mul(steps))
    }

    fn is_positive(self) -> bool {
        self > 0
    }

    fn parse_value(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    fn read(store: &dyn PreferenceStore, key: &str, default: Self) -> Self {
        store.get_int(key, default)
    }

    fn write(editor: &mut StoreEditor, key: &str, value: Self) {
        editor.put_int(key, value);
    }
}

/// Absorbs rounding error so that e.g. 0.3 / 0.1 counts as 3 steps
const FLOAT_STEP_EPSILON: f32 = 1e-4;

impl SeekbarNumber for f32 {
    fn steps_between(from: Self, to: Self, step_size: Self) -> i32 {
        if step_size.is_nan() || step_size <= 0.0 {
            return 0;
        }
        // `as` saturates and maps NaN to 0
        ((to - from) / step_size + FLOAT_STEP_EPSILON).floor() as i32
    }

    fn offset(min: Self, step_size: Self, steps: i32) -> Self {
        min + steps as f32 * step_size
    }

    fn is_positive(self) -> bool {
        self > 0.0
    }

    fn parse_value(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }

    fn read(store: &dyn PreferenceStore, key: &str, default: Self) -> Self {
        store.get_float(key, default)
    }

    fn write(editor: &mut StoreEditor, key: &str, value: Self) {
        editor.put_float(key, value);
    }
}

/// Range, step and current position of a seekbar.
/// The persisted value lives at `key_value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeekbarParams<N: SeekbarNumber> {
    pub min: N,
    pub max: N,
    pub step_size: N,
    pub default_value: N,
    selected_step: i32,
}

impl<N: SeekbarNumber> SeekbarParams<N> {
    pub fn new(min: N, max: N, step_size: N, default_value: N) -> Self {
        let mut params = Self {
            min,
            max,
            step_size,
            default_value,
            selected_step: 0,
        };
        if !step_size.is_positive() {
            warn!(step_size = %step_size, "Seekbar step size must be positive, slider will have a single position");
        }
        params.selected_step = params.value_to_step(default_value);
        params
    }

    /// Number of gaps between slider positions
    pub fn step_count(&self) -> i32 {
        N::steps_between(self.min, self.max, self.step_size).max(0)
    }

    pub fn selected_step(&self) -> i32 {
        self.selected_step
    }

    pub fn set_selected_step(&mut self, step: i32) {
        self.selected_step = step.clamp(0, self.step_count());
    }

    /// Real value at the selected position
    pub fn value(&self) -> N {
        N::offset(self.min, self.step_size, self.selected_step)
    }

    pub fn set_value(&mut self, value: N) {
        self.selected_step = self.value_to_step(value);
    }

    /// Slider position for a value, clamped to the slider range
    pub fn value_to_step(&self, value: N) -> i32 {
        N::steps_between(self.min, value, self.step_size).clamp(0, self.step_count())
    }

    pub(crate) fn load(&mut self, key: &str, store: &dyn PreferenceStore) {
        let stored = N::read(store, &value_key(key), self.default_value);
        self.selected_step = self.value_to_step(stored);
    }

    pub(crate) fn save(&self, key: &str, editor: &mut StoreEditor) {
        N::write(editor, &value_key(key), self.value());
    }

    pub(crate) fn meets_dependency(&self, dependency: &Dependency) -> bool {
        match N::parse_value(&dependency.value) {
            Some(expected) => dependency.operator.compare(&self.value(), &expected),
            None => {
                warn!(dependency = %dependency, "Seekbar dependency value is not numeric");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::Operator;
    use crate::store::MemoryStore;

    #[test]
    fn test_int_step_count() {
        assert_eq!(SeekbarParams::new(3, 10, 1, 3).step_count(), 7);
        assert_eq!(SeekbarParams::new(0, 10, 2, 0).step_count(), 5);
        assert_eq!(SeekbarParams::new(0, 9, 3, 0).step_count(), 3);
        assert_eq!(SeekbarParams::new(-10, -1, 1, -10).step_count(), 9);
    }

    #[test]
    fn test_int_value_to_step_clamps() {
        let params = SeekbarParams::new(3, 10, 1, 3);
        assert_eq!(params.value_to_step(3), 0);
        assert_eq!(params.value_to_step(5), 2);
        assert_eq!(params.value_to_step(8), 5);
        assert_eq!(params.value_to_step(10), 7);
        assert_eq!(params.value_to_step(0), 0);
        assert_eq!(params.value_to_step(11), 7);
    }

    #[test]
    fn test_int_selected_step_derives_value() {
        let mut params = SeekbarParams::new(-10, 10, 1, -10);
        assert_eq!(params.selected_step(), 0);
        assert_eq!(params.value(), -10);

        params.set_selected_step(3);
        assert_eq!(params.value(), -7);

        params.set_selected_step(100);
        assert_eq!(params.selected_step(), 20);
        params.set_selected_step(-4);
        assert_eq!(params.selected_step(), 0);
    }

    #[test]
    fn test_int_default_value_sets_initial_step() {
        let params = SeekbarParams::new(0, 100, 10, 45);
        assert_eq!(params.selected_step(), 4);
        assert_eq!(params.value(), 40);
    }

    #[test]
    fn test_float_step_count() {
        assert_eq!(SeekbarParams::new(0.0_f32, 1.0, 1.0, 0.0).step_count(), 1);
        assert_eq!(SeekbarParams::new(0.0_f32, 1.0, 0.5, 0.0).step_count(), 2);
        assert_eq!(SeekbarParams::new(0.0_f32, 4.5, 0.25, 0.0).step_count(), 18);
        assert_eq!(SeekbarParams::new(3.0_f32, 7.5, 0.5, 3.0).step_count(), 9);
        assert_eq!(SeekbarParams::new(0.0_f32, 0.3, 0.1, 0.0).step_count(), 3);
    }

    #[test]
    fn test_float_value_to_step() {
        let params = SeekbarParams::new(3.0_f32, 7.5, 0.5, 3.0);
        assert_eq!(params.value_to_step(3.0), 0);
        assert_eq!(params.value_to_step(5.0), 4);
        assert_eq!(params.value_to_step(6.5), 7);
        assert_eq!(params.value_to_step(7.5), 9);
        assert_eq!(params.value_to_step(0.0), 0);
        assert_eq!(params.value_to_step(11.0), 9);
        // between steps rounds down
        assert_eq!(params.value_to_step(3.25), 0);
    }

    #[test]
    fn test_float_selected_step_value() {
        let mut params = SeekbarParams::new(0.0_f32, 1.0, 0.25, 0.0);
        params.set_selected_step(3);
        assert_eq!(params.step_count(), 4);
        assert_eq!(params.value(), 0.75);
    }

    #[test]
    fn test_zero_step_size_has_single_position() {
        let mut params = SeekbarParams::new(0, 10, 0, 5);
        assert_eq!(params.step_count(), 0);
        params.set_selected_step(4);
        assert_eq!(params.selected_step(), 0);
        assert_eq!(params.value(), 0);
    }

    #[test]
    fn test_int_save_then_load() {
        let mut saved = SeekbarParams::new(-10, 10, 1, -10);
        saved.set_value(5);

        let mut store = MemoryStore::new();
        let mut editor = StoreEditor::new();
        saved.save("volume", &mut editor);
        store.commit(editor).unwrap();
        assert_eq!(store.get_int("volume_value", 0), 5);

        let mut loaded = SeekbarParams::new(-10, 10, 1, -10);
        loaded.load("volume", &store);
        assert_eq!(loaded.value(), 5);
    }

    #[test]
    fn test_float_save_then_load() {
        let mut saved = SeekbarParams::new(-10.0_f32, 10.0, 1.0, -10.0);
        saved.set_value(5.0);

        let mut store = MemoryStore::new();
        let mut editor = StoreEditor::new();
        saved.save("ratio", &mut editor);
        store.commit(editor).unwrap();
        assert_eq!(store.get_float("ratio_value", 0.0), 5.0);

        let mut loaded = SeekbarParams::new(-10.0_f32, 10.0, 1.0, -10.0);
        loaded.load("ratio", &store);
        assert_eq!(loaded.value(), 5.0);
    }

    #[test]
    fn test_load_missing_uses_default() {
        let mut params = SeekbarParams::new(0, 10, 1, 6);
        params.set_selected_step(1);
        params.load("missing", &MemoryStore::new());
        assert_eq!(params.value(), 6);
    }

    #[test]
    fn test_dependency_ordering() {
        let mut params = SeekbarParams::new(0, 10, 1, 0);
        params.set_value(4);
        assert!(params.meets_dependency(&Dependency::new("level", Operator::Ge, "4")));
        assert!(params.meets_dependency(&Dependency::new("level", Operator::Lt, "5")));
        assert!(!params.meets_dependency(&Dependency::new("level", Operator::Gt, "4")));
        assert!(params.meets_dependency(&Dependency::new("level", Operator::Eq, "many")));

        let mut float = SeekbarParams::new(0.0_f32, 1.0, 0.25, 0.0);
        float.set_value(0.5);
        assert!(float.meets_dependency(&Dependency::new("ratio", Operator::Ne, "1")));
        assert!(!float.meets_dependency(&Dependency::new("ratio", Operator::Le, "0")));
    }
}
