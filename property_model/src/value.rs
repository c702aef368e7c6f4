//! Core value types for the generic property representation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::Key;

/// Property names starting with this character are metadata properties and
/// are mapped separately from ordinary data fields.
pub const META_MARKER: char = '$';

/// A geographic point: latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns whether the point is within the valid lat/lng ranges.
    pub fn valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A tri-state boolean used by metadata fields.
///
/// `Auto` is the unset state; metadata reads report the field's declared
/// default instead of a concrete value while a toggle is `Auto`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Toggle {
    #[default]
    Auto,
    On,
    Off,
}

impl Toggle {
    /// `None` while unset, otherwise whether the toggle is `On`.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Toggle::Auto => None,
            Toggle::On => Some(true),
            Toggle::Off => Some(false),
        }
    }
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        if value {
            Toggle::On
        } else {
            Toggle::Off
        }
    }
}

/// A single typed scalar value in the generic data model.
///
/// Immutable once constructed. Timestamps carry microsecond semantics; see
/// [`Property::new`] for the truncation applied on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
    Geo(GeoPoint),
    Key(Key),
    Null,
}

impl PropertyValue {
    /// Short name of the variant, used in mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Str(_) => "string",
            PropertyValue::Bytes(_) => "bytes",
            PropertyValue::Time(_) => "timestamp",
            PropertyValue::Geo(_) => "geo-point",
            PropertyValue::Key(_) => "key",
            PropertyValue::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl From<i64> for PropertyValue {
    fn from(val: i64) -> Self {
        PropertyValue::Int(val)
    }
}

impl From<f64> for PropertyValue {
    fn from(val: f64) -> Self {
        PropertyValue::Float(val)
    }
}

impl From<bool> for PropertyValue {
    fn from(val: bool) -> Self {
        PropertyValue::Bool(val)
    }
}

impl From<String> for PropertyValue {
    fn from(val: String) -> Self {
        PropertyValue::Str(val)
    }
}

impl From<&str> for PropertyValue {
    fn from(val: &str) -> Self {
        PropertyValue::Str(val.to_string())
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(val: Vec<u8>) -> Self {
        PropertyValue::Bytes(val)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(val: DateTime<Utc>) -> Self {
        PropertyValue::Time(val)
    }
}

impl From<GeoPoint> for PropertyValue {
    fn from(val: GeoPoint) -> Self {
        PropertyValue::Geo(val)
    }
}

impl From<Key> for PropertyValue {
    fn from(val: Key) -> Self {
        PropertyValue::Key(val)
    }
}

impl<T> From<Option<T>> for PropertyValue
where
    T: Into<PropertyValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => PropertyValue::Null,
        }
    }
}

/// Whether a property participates in secondary indexing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexSetting {
    #[default]
    ShouldIndex,
    NoIndex,
}

/// A `PropertyValue` plus its index setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    value: PropertyValue,
    index: IndexSetting,
}

impl Property {
    /// Wraps a value with the given index setting.
    ///
    /// Timestamp values are truncated (not rounded) to microsecond
    /// resolution here, so every `Property` in a map already carries the
    /// at-rest precision.
    pub fn new(value: PropertyValue, index: IndexSetting) -> Self {
        let value = match value {
            PropertyValue::Time(t) => PropertyValue::Time(truncate_to_micros(t)),
            other => other,
        };
        Self { value, index }
    }

    pub fn indexed(value: PropertyValue) -> Self {
        Self::new(value, IndexSetting::ShouldIndex)
    }

    pub fn unindexed(value: PropertyValue) -> Self {
        Self::new(value, IndexSetting::NoIndex)
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn into_value(self) -> PropertyValue {
        self.value
    }

    pub fn index_setting(&self) -> IndexSetting {
        self.index
    }
}

/// Drops any sub-microsecond component of a timestamp.
pub fn truncate_to_micros(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_micros(t.timestamp_micros()).unwrap_or(t)
}

/// A capability a field type may implement to fully override the default
/// coercion between its in-memory form and a `Property`.
pub trait PropertyConverter {
    fn to_property(&self) -> anyhow::Result<Property>;
    fn from_property(&mut self, prop: &Property) -> anyhow::Result<()>;
}

/// Mapping from property name to an ordered sequence of values.
///
/// Insertion order within a name is significant: the first value appended
/// under a name maps to index 0 of a repeated field. Names beginning with
/// [`META_MARKER`] denote metadata properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap {
    entries: HashMap<String, Vec<Property>>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `name`, preserving arrival order.
    pub fn append(&mut self, name: impl Into<String>, prop: Property) {
        self.entries.entry(name.into()).or_default().push(prop);
    }

    /// Replaces the whole value list under `name`.
    pub fn insert(&mut self, name: impl Into<String>, props: Vec<Property>) {
        self.entries.insert(name.into(), props);
    }

    pub fn get(&self, name: &str) -> Option<&[Property]> {
        self.entries.get(name).map(|v| v.as_slice())
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<Property>> {
        self.entries.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &[Property])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Number of distinct property names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
