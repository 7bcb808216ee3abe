//! Building a preference tree from a JSON definitions document
//!
//! Only a broken root is an error. Individual items that cannot be built are
//! logged and skipped so one bad entry never hides the rest of the screen.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::constants::{document, field, kind, seekbar};
use crate::error::LoadError;
use crate::preference::{
    AppListPreference, BooleanPreference, ColorItem, ColorPreference, ColorPreferenceGroup,
    Dependency, ListPreference, MessagePreference, Preference, PreferenceGroup, PreferenceKind,
    SeekbarParams,
};
use crate::resources::{self, ResourceResolver};
use crate::store::PreferenceStore;

type Object = Map<String, Value>;

/// Parse a definitions document into a group with dependencies evaluated
/// against the built-in defaults. The store is not touched.
pub fn build_from_document(
    raw: &str,
    resolver: &dyn ResourceResolver,
) -> Result<PreferenceGroup, LoadError> {
    let root: Value = serde_json::from_str(raw)?;
    let root = root.as_object().ok_or(LoadError::NotAnObject)?;
    let items = root
        .get(document::ITEMS)
        .and_then(Value::as_array)
        .ok_or(LoadError::MissingItems)?;

    let namespace = declared_namespace(root);
    debug!(namespace = %namespace, items = items.len(), "Building preference tree");

    let mut group = PreferenceGroup::new(namespace);
    group.name = resolved_text(root, field::NAME, resolver);
    group.pre_init = flag(root, document::PRE_INIT, resolver, false);
    group.set_preferences(build_items(items, &group.namespace, resolver));
    group.apply_namespace();
    group.update_dependencies();

    info!(
        namespace = %group.namespace,
        count = group.len(),
        displayable = group.displayable_len(),
        pre_init = group.pre_init,
        "Built preference tree"
    );
    Ok(group)
}

/// Store namespace a document declares, without building it
pub fn namespace_of(raw: &str) -> Result<String, LoadError> {
    let root: Value = serde_json::from_str(raw)?;
    let root = root.as_object().ok_or(LoadError::NotAnObject)?;
    Ok(declared_namespace(root))
}

fn declared_namespace(root: &Object) -> String {
    text(root, document::NAMESPACE)
        .filter(|namespace| !namespace.is_empty())
        .unwrap_or_else(|| document::DEFAULT_NAMESPACE.to_string())
}

/// Build, load current values from `store`, and run first-run
/// initialisation when the document asks for it
pub fn load_document(
    raw: &str,
    resolver: &dyn ResourceResolver,
    store: &mut dyn PreferenceStore,
) -> Result<PreferenceGroup, LoadError> {
    let mut group = build_from_document(raw, resolver)?;
    if group.is_empty() {
        return Err(LoadError::Empty {
            namespace: group.namespace.clone(),
        });
    }

    group.load(&*store);
    if group.pre_init {
        let written = group.pre_init(store)?;
        debug!(namespace = %group.namespace, written, "Pre-initialisation finished");
    }
    Ok(group)
}

fn build_items(items: &[Value], namespace: &str, resolver: &dyn ResourceResolver) -> Vec<Preference> {
    items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| build_item(item, position, None, namespace, resolver))
        .collect()
}

/// `fallback_type` applies when the item has no `type` of its own
fn build_item(
    item: &Value,
    position: usize,
    fallback_type: Option<&str>,
    namespace: &str,
    resolver: &dyn ResourceResolver,
) -> Option<Preference> {
    let Some(object) = item.as_object() else {
        warn!(position, "Skipping preference item that is not an object");
        return None;
    };
    let Some(key) = text(object, field::KEY).filter(|key| !key.is_empty()) else {
        warn!(position, "Skipping preference item without a key");
        return None;
    };

    let type_name = text(object, field::TYPE)
        .filter(|type_name| !type_name.is_empty())
        .or_else(|| fallback_type.map(str::to_string));

    let kind = match type_name.as_deref() {
        None | Some(kind::SIMPLE) => PreferenceKind::Simple,
        Some(kind::BOOLEAN) => PreferenceKind::Boolean(build_boolean(object, resolver)),
        Some(kind::LIST_SINGLE) => PreferenceKind::List(build_list(object, resolver)),
        Some(kind::LIST_APPS) => PreferenceKind::AppList(build_app_list(object, resolver)),
        Some(kind::COLOR) => PreferenceKind::Color(build_color(object, resolver)),
        Some(kind::COLOR_GROUP) => {
            PreferenceKind::ColorGroup(build_color_group(object, namespace, resolver))
        }
        Some(kind::SECTION) => PreferenceKind::Section,
        Some(kind::MESSAGE) => PreferenceKind::Message(build_message(object, resolver)),
        Some(kind::SEEKBAR_INT) => PreferenceKind::IntSeekbar(build_int_seekbar(object, resolver)),
        Some(kind::SEEKBAR_FLOAT) => {
            PreferenceKind::FloatSeekbar(build_float_seekbar(object, resolver))
        }
        Some(kind::GROUP) => PreferenceKind::Group(build_group(object, namespace, resolver)),
        Some(unknown) => {
            warn!(key = %key, position, kind = %unknown, "Skipping preference item of unknown type");
            return None;
        }
    };

    let mut pref = Preference::new(key, kind);
    pref.name = resolved_text(object, field::NAME, resolver);
    pref.description = resolved_text(object, field::DESCRIPTION, resolver);
    pref.dependency = text(object, field::DEPENDENCY).and_then(|expression| Dependency::parse(&expression));
    pref.set_namespace(namespace);
    Some(pref)
}

fn build_boolean(object: &Object, resolver: &dyn ResourceResolver) -> BooleanPreference {
    BooleanPreference {
        checked: flag(object, field::CHECKED, resolver, false),
        selected_description: resolved_text(object, field::SELECTED_DESCRIPTION, resolver),
        unselected_description: resolved_text(object, field::UNSELECTED_DESCRIPTION, resolver),
    }
}

fn build_list(object: &Object, resolver: &dyn ResourceResolver) -> ListPreference {
    let mut list = ListPreference::new(int(object, field::LIST_DEFAULT, resolver, 0));
    list.display_options_ref = text(object, field::LIST_OPTIONS).filter(|options| !options.is_empty());
    list.update_display_value(resolver);
    list
}

fn build_app_list(object: &Object, resolver: &dyn ResourceResolver) -> AppListPreference {
    AppListPreference {
        app_name: resolved_text(object, field::APP_NAME, resolver),
        app_package: text(object, field::APP_PACKAGE),
        app_activity: text(object, field::APP_ACTIVITY),
    }
}

fn build_color(object: &Object, resolver: &dyn ResourceResolver) -> ColorPreference {
    let color = ColorItem::from_swatch(
        argb(object, field::COLOR, resolver),
        int(object, field::SWATCH, resolver, crate::constants::color::NO_SWATCH),
        int(object, field::SWATCH_POSITION, resolver, crate::constants::color::NO_SWATCH),
    );
    ColorPreference {
        color,
        alpha_enabled: flag(object, field::ALPHA_ENABLED, resolver, false),
    }
}

/// Entries of `colors` default to type `color`
fn build_color_group(
    object: &Object,
    namespace: &str,
    resolver: &dyn ResourceResolver,
) -> ColorPreferenceGroup {
    let colors = object
        .get(field::COLORS)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .enumerate()
                .filter_map(|(position, entry)| {
                    build_item(entry, position, Some(kind::COLOR), namespace, resolver)
                })
                .collect()
        })
        .unwrap_or_default();

    ColorPreferenceGroup::new(colors, flag(object, field::ALPHA_ENABLED, resolver, false))
}

fn build_message(object: &Object, resolver: &dyn ResourceResolver) -> MessagePreference {
    let mut message = MessagePreference::new(flag(object, field::DISMISSIBLE, resolver, false));
    message.dismissed = message.dismissible && flag(object, field::DISMISSED, resolver, false);
    message
}

fn build_int_seekbar(object: &Object, resolver: &dyn ResourceResolver) -> SeekbarParams<i32> {
    let min = int(object, field::SEEKBAR_MIN, resolver, seekbar::INT_MIN);
    let mut params = SeekbarParams::new(
        min,
        int(object, field::SEEKBAR_MAX, resolver, seekbar::INT_MAX),
        int(object, field::SEEKBAR_STEP_SIZE, resolver, seekbar::INT_STEP_SIZE),
        int(object, field::SEEKBAR_VALUE, resolver, min),
    );
    // selected_step holds a value in seekbar units, not a step index
    if object.contains_key(field::SEEKBAR_SELECTED_STEP) {
        params.set_value(int(object, field::SEEKBAR_SELECTED_STEP, resolver, params.value()));
    }
    params
}

fn build_float_seekbar(object: &Object, resolver: &dyn ResourceResolver) -> SeekbarParams<f32> {
    let min = float(object, field::SEEKBAR_MIN, resolver, seekbar::FLOAT_MIN);
    let mut params = SeekbarParams::new(
        min,
        float(object, field::SEEKBAR_MAX, resolver, seekbar::FLOAT_MAX),
        float(object, field::SEEKBAR_STEP_SIZE, resolver, seekbar::FLOAT_STEP_SIZE),
        float(object, field::SEEKBAR_VALUE, resolver, min),
    );
    if object.contains_key(field::SEEKBAR_SELECTED_STEP) {
        params.set_value(float(object, field::SEEKBAR_SELECTED_STEP, resolver, params.value()));
    }
    params
}

/// Nested groups share the document namespace and never pre-initialise on
/// their own; the root handles the whole tree
fn build_group(object: &Object, namespace: &str, resolver: &dyn ResourceResolver) -> PreferenceGroup {
    let mut group = PreferenceGroup::new(namespace);
    group.name = resolved_text(object, field::NAME, resolver);
    let items = object
        .get(document::ITEMS)
        .and_then(Value::as_array)
        .map(|items| build_items(items, namespace, resolver))
        .unwrap_or_default();
    if items.is_empty() {
        warn!(name = ?group.name, "Nested group has no usable items");
    }
    group.set_preferences(items);
    group.update_dependencies();
    group
}

/// Scalar field as text; numbers and bools are stringified
fn text(object: &Object, name: &str) -> Option<String> {
    match object.get(name)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

/// Text with `@type/name` references resolved; empty text counts as absent
fn resolved_text(object: &Object, name: &str, resolver: &dyn ResourceResolver) -> Option<String> {
    text(object, name)
        .map(|value| resources::get_string(resolver, &value))
        .filter(|value| !value.is_empty())
}

fn flag(object: &Object, name: &str, resolver: &dyn ResourceResolver, default: bool) -> bool {
    match object.get(name) {
        Some(Value::Bool(value)) => *value,
        Some(Value::String(value)) => resources::get_bool(resolver, value),
        _ => default,
    }
}

fn int(object: &Object, name: &str, resolver: &dyn ResourceResolver, default: i32) -> i32 {
    match object.get(name) {
        Some(Value::Number(value)) => value
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .or_else(|| value.as_f64().map(|value| value as i32))
            .unwrap_or(default),
        Some(Value::String(value)) => resources::get_int(resolver, value),
        _ => default,
    }
}

fn float(object: &Object, name: &str, resolver: &dyn ResourceResolver, default: f32) -> f32 {
    match object.get(name) {
        Some(Value::Number(value)) => value.as_f64().map_or(default, |value| value as f32),
        Some(Value::String(value)) => resources::get_float(resolver, value),
        _ => default,
    }
}

/// Numbers are raw ARGB, strings go through color parsing
fn argb(object: &Object, name: &str, resolver: &dyn ResourceResolver) -> i32 {
    match object.get(name) {
        Some(Value::Number(value)) => value.as_i64().map_or(0, |value| value as i32),
        Some(Value::String(value)) => resources::get_color(resolver, value),
        _ => 0,
    }
}
