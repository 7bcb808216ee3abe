//! Resolution of literal-or-reference field values
//!
//! Definition fields may hold a literal (`"Dark mode"`, `"3"`, `"#ff0000"`)
//! or a symbolic reference of the form `@type/name`. References go through a
//! [`ResourceResolver`]; anything that is not a reference, or that the
//! resolver does not know, is used as literal text.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(\w+)/(.+)$").expect("reference pattern is valid"));

/// A parsed `@type/name` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub kind: String,
    pub name: String,
}

impl ResourceRef {
    pub fn parse(text: &str) -> Option<Self> {
        let captures = REFERENCE_PATTERN.captures(text)?;
        Some(Self {
            kind: captures[1].to_string(),
            name: captures[2].to_string(),
        })
    }
}

/// A resolved resource
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    TextArray(Vec<String>),
}

/// Looks up symbolic references
pub trait ResourceResolver {
    fn resolve(&self, reference: &ResourceRef) -> Option<ResourceValue>;
}

/// Resolver that knows no references; every value is a literal
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralResources;

impl ResourceResolver for LiteralResources {
    fn resolve(&self, _reference: &ResourceRef) -> Option<ResourceValue> {
        None
    }
}

/// Table of resources keyed by type then name, loadable from JSON:
///
/// ```json
/// { "string": { "title": "Settings" }, "array": { "modes": ["Off", "On"] } }
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct ResourceTable {
    entries: HashMap<String, HashMap<String, Value>>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn insert(&mut self, kind: &str, name: &str, value: Value) {
        self.entries
            .entry(kind.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }
}

impl ResourceResolver for ResourceTable {
    fn resolve(&self, reference: &ResourceRef) -> Option<ResourceValue> {
        let value = self.entries.get(&reference.kind)?.get(&reference.name)?;
        match value {
            Value::String(text) => Some(ResourceValue::Text(text.clone())),
            Value::Bool(flag) => Some(ResourceValue::Bool(*flag)),
            Value::Number(number) => number
                .as_i64()
                .map(ResourceValue::Integer)
                .or_else(|| number.as_f64().map(ResourceValue::Float)),
            Value::Array(items) => Some(ResourceValue::TextArray(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            _ => None,
        }
    }
}

fn lookup(resolver: &dyn ResourceResolver, text: &str) -> Option<ResourceValue> {
    let reference = ResourceRef::parse(text)?;
    let value = resolver.resolve(&reference);
    if value.is_none() {
        debug!(reference = %text, "Unresolved resource reference, using literal text");
    }
    value
}

/// Referenced text, or the literal itself
pub fn get_string(resolver: &dyn ResourceResolver, text: &str) -> String {
    match lookup(resolver, text) {
        Some(ResourceValue::Text(value)) => value,
        Some(ResourceValue::Integer(value)) => value.to_string(),
        Some(ResourceValue::Float(value)) => value.to_string(),
        Some(ResourceValue::Bool(value)) => value.to_string(),
        _ => text.to_string(),
    }
}

/// Only a case-insensitive `true` is true
pub fn get_bool(resolver: &dyn ResourceResolver, text: &str) -> bool {
    match lookup(resolver, text) {
        Some(ResourceValue::Bool(value)) => value,
        Some(ResourceValue::Text(value)) => value.eq_ignore_ascii_case("true"),
        _ => text.trim().eq_ignore_ascii_case("true"),
    }
}

/// Unparseable input yields 0
pub fn get_int(resolver: &dyn ResourceResolver, text: &str) -> i32 {
    match lookup(resolver, text) {
        Some(ResourceValue::Integer(value)) => i32::try_from(value).unwrap_or(0),
        Some(ResourceValue::Float(value)) => value as i32,
        Some(ResourceValue::Text(value)) => parse_int(&value).unwrap_or(0),
        _ => parse_int(text).unwrap_or(0),
    }
}

/// Unparseable input yields 0.0
pub fn get_float(resolver: &dyn ResourceResolver, text: &str) -> f32 {
    match lookup(resolver, text) {
        Some(ResourceValue::Float(value)) => value as f32,
        Some(ResourceValue::Integer(value)) => value as f32,
        Some(ResourceValue::Text(value)) => value.trim().parse().unwrap_or(0.0),
        _ => text.trim().parse().unwrap_or(0.0),
    }
}

/// ARGB color from a reference, a hex code or a decimal integer
pub fn get_color(resolver: &dyn ResourceResolver, text: &str) -> i32 {
    match lookup(resolver, text) {
        Some(ResourceValue::Integer(value)) => value as i32,
        Some(ResourceValue::Text(value)) => parse_color(&value).unwrap_or(0),
        _ => parse_color(text).unwrap_or(0),
    }
}

pub fn get_string_array(resolver: &dyn ResourceResolver, text: &str) -> Option<Vec<String>> {
    match lookup(resolver, text) {
        Some(ResourceValue::TextArray(values)) => Some(values),
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}

/// `#RRGGBB`, `#AARRGGBB`, a decimal integer, or bare hex digits, in that order.
/// Six-digit codes are made fully opaque.
pub fn parse_color(text: &str) -> Option<i32> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    if let Ok(value) = text.parse::<i64>() {
        return Some(value as i32);
    }
    parse_hex_color(text)
}

fn parse_hex_color(hex: &str) -> Option<i32> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    match hex.len() {
        6 => Some((value | crate::constants::color::OPAQUE_ALPHA) as i32),
        8 => Some(value as i32),
        _ => None,
    }
}
