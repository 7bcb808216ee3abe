//! JSON-defined preference trees
//!
//! A definitions document describes typed preferences (switches, lists,
//! colors, sliders, messages, nested groups) and the conditions under which
//! each is shown. This crate builds that tree, loads and saves its values
//! against a key-value store, keeps the displayable subset in step with
//! dependency changes, and reports the list edits a renderer needs.

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod diff;
pub mod error;
pub mod factory;
pub mod loader;
pub mod preference;
pub mod resources;
pub mod store;

pub use diff::{DisplayedList, ListDiff, ListEdit};
pub use error::{LoadError, StoreError};
pub use factory::{build_from_document, load_document};
pub use loader::{LoadedPreferences, PendingLoad, PreferenceLoader};
pub use preference::{Dependency, Operator, Preference, PreferenceGroup, PreferenceKind};
pub use store::{JsonFileStore, MemoryStore, PreferenceStore, StoreEditor, StoreValue};
