//! Field-level readers and writers handed to [`Serializable`] implementations.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::engine::SerializationEngine;
use super::error::json_kind;
use super::{ClassEntry, SerdeError, SerdeResult, Serializable, TYPE_KEY};

// =============================================================================
// Writer
// =============================================================================

/// Collects the fields of one tagged node.
pub struct FieldWriter<'a> {
    engine: &'a SerializationEngine<'a>,
    fields: Map<String, Value>,
}

impl<'a> FieldWriter<'a> {
    pub(crate) fn new(engine: &'a SerializationEngine<'a>, tag: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(TYPE_KEY.to_string(), Value::String(tag.to_string()));
        Self { engine, fields }
    }

    /// Writes a plain value (primitive, sequence or unregistered struct).
    pub fn value<V: Serialize + ?Sized>(
        &mut self,
        name: &str,
        value: &V,
    ) -> SerdeResult<&mut Self> {
        self.fields
            .insert(name.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Writes a registered object as a nested tagged node.
    pub fn object<T: Serializable>(&mut self, name: &str, value: &T) -> SerdeResult<&mut Self> {
        let node = self.engine.serialize(value)?;
        self.fields.insert(name.to_string(), node);
        Ok(self)
    }

    /// Writes a registered object, or `null` when absent.
    pub fn optional_object<T: Serializable>(
        &mut self,
        name: &str,
        value: Option<&T>,
    ) -> SerdeResult<&mut Self> {
        let node = match value {
            Some(value) => self.engine.serialize(value)?,
            None => Value::Null,
        };
        self.fields.insert(name.to_string(), node);
        Ok(self)
    }

    /// Writes a sequence of registered objects, order preserved.
    pub fn list<T: Serializable>(&mut self, name: &str, items: &[T]) -> SerdeResult<&mut Self> {
        let nodes = items
            .iter()
            .map(|item| self.engine.serialize(item))
            .collect::<SerdeResult<Vec<_>>>()?;
        self.fields.insert(name.to_string(), Value::Array(nodes));
        Ok(self)
    }

    /// Writes a keyed collection of registered objects.
    pub fn map<T: Serializable>(
        &mut self,
        name: &str,
        items: &BTreeMap<String, T>,
    ) -> SerdeResult<&mut Self> {
        let mut nodes = Map::new();
        for (key, item) in items {
            nodes.insert(key.clone(), self.engine.serialize(item)?);
        }
        self.fields.insert(name.to_string(), Value::Object(nodes));
        Ok(self)
    }

    /// Writes an ISO-8601 timestamp.
    pub fn date(&mut self, name: &str, value: &DateTime<Utc>) -> SerdeResult<&mut Self> {
        self.fields
            .insert(name.to_string(), Value::String(format_date(value)));
        Ok(self)
    }

    pub(crate) fn finish(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Millisecond form (`2024-05-01T10:00:00.000Z`) unless the instant carries
/// finer digits, which are then written in full.
pub(crate) fn format_date(value: &DateTime<Utc>) -> String {
    let format = if value.timestamp_subsec_nanos() % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else {
        SecondsFormat::AutoSi
    };
    value.to_rfc3339_opts(format, true)
}

// =============================================================================
// Reader
// =============================================================================

/// Read access to the fields of one node during reconstruction.
pub struct FieldReader<'a> {
    engine: &'a SerializationEngine<'a>,
    fields: &'a Map<String, Value>,
    tag: &'a str,
    base: &'static str,
    path: &'a str,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(
        engine: &'a SerializationEngine<'a>,
        fields: &'a Map<String, Value>,
        tag: &'a str,
        base: &'static str,
        path: &'a str,
    ) -> Self {
        Self {
            engine,
            fields,
            tag,
            base,
            path,
        }
    }

    /// Constructor tag this node resolved to
    pub fn tag(&self) -> &str {
        self.tag
    }

    /// Location of this node in the document (`$.content.timeline`)
    pub fn path(&self) -> &str {
        self.path
    }

    pub fn has(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(v) if !v.is_null())
    }

    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name)
    }

    /// Reads a required plain value.
    pub fn value<V: DeserializeOwned>(&self, name: &str) -> SerdeResult<V> {
        let raw = self
            .fields
            .get(name)
            .ok_or_else(|| SerdeError::missing(name, self.path))?;
        self.decode(name, raw)
    }

    /// Reads a plain value, using `default` when absent or `null`.
    pub fn value_or<V: DeserializeOwned>(&self, name: &str, default: V) -> SerdeResult<V> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(raw) => self.decode(name, raw),
        }
    }

    pub fn value_or_default<V: DeserializeOwned + Default>(&self, name: &str) -> SerdeResult<V> {
        self.value_or(name, V::default())
    }

    pub fn optional<V: DeserializeOwned>(&self, name: &str) -> SerdeResult<Option<V>> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => self.decode(name, raw).map(Some),
        }
    }

    /// Reads a required registered object.
    pub fn object<T: Serializable>(&self, name: &str) -> SerdeResult<T> {
        let raw = self
            .fields
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| SerdeError::missing(name, self.path))?;
        self.engine
            .read_typed(raw, self.child_entry(name), &self.child_path(name))
    }

    /// Reads a registered object, building `default` when absent or `null`.
    pub fn object_or_else<T: Serializable>(
        &self,
        name: &str,
        default: impl FnOnce() -> T,
    ) -> SerdeResult<T> {
        Ok(self.optional_object(name)?.unwrap_or_else(default))
    }

    pub fn optional_object<T: Serializable>(&self, name: &str) -> SerdeResult<Option<T>> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => self
                .engine
                .read_typed(raw, self.child_entry(name), &self.child_path(name))
                .map(Some),
        }
    }

    /// Reads a sequence of registered objects.
    ///
    /// An absent field reads as empty. Elements that cannot be rebuilt are
    /// dropped under the degrade policy and abort the read under fail-fast.
    pub fn list<T: Serializable>(&self, name: &str) -> SerdeResult<Vec<T>> {
        let items = match self.fields.get(name) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(SerdeError::invalid(
                    name,
                    self.path,
                    format!("expected an array, found {}", json_kind(other)),
                ))
            }
        };

        let expected = self.child_entry(name);
        let base_path = self.child_path(name);
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let path = format!("{base_path}[{index}]");
            match self.engine.read_typed::<T>(item, expected, &path) {
                Ok(value) => out.push(value),
                Err(err) => self.engine.drop_element(&path, item, err)?,
            }
        }
        Ok(out)
    }

    /// Reads a keyed collection of registered objects.
    pub fn map<T: Serializable>(&self, name: &str) -> SerdeResult<BTreeMap<String, T>> {
        let entries = match self.fields.get(name) {
            None | Some(Value::Null) => return Ok(BTreeMap::new()),
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                return Err(SerdeError::invalid(
                    name,
                    self.path,
                    format!("expected an object, found {}", json_kind(other)),
                ))
            }
        };

        let expected = self.child_entry(name);
        let base_path = self.child_path(name);
        let mut out = BTreeMap::new();
        for (key, item) in entries {
            let path = format!("{base_path}.{key}");
            match self.engine.read_typed::<T>(item, expected, &path) {
                Ok(value) => {
                    out.insert(key.clone(), value);
                }
                Err(err) => self.engine.drop_element(&path, item, err)?,
            }
        }
        Ok(out)
    }

    /// Reads a required strict ISO-8601 timestamp.
    pub fn date(&self, name: &str) -> SerdeResult<DateTime<Utc>> {
        let raw = self
            .fields
            .get(name)
            .ok_or_else(|| SerdeError::missing(name, self.path))?;
        self.parse_date(name, raw)
    }

    /// Reads a timestamp, using `default` when absent or `null`.
    pub fn date_or(&self, name: &str, default: DateTime<Utc>) -> SerdeResult<DateTime<Utc>> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(raw) => self.parse_date(name, raw),
        }
    }

    fn parse_date(&self, name: &str, raw: &Value) -> SerdeResult<DateTime<Utc>> {
        let path = self.child_path(name);
        match raw {
            Value::String(text) => self.engine.parse_date(text, &path),
            other => Err(SerdeError::InvalidDate {
                value: other.to_string(),
                path,
            }),
        }
    }

    fn decode<V: DeserializeOwned>(&self, name: &str, raw: &Value) -> SerdeResult<V> {
        serde::Deserialize::deserialize(raw)
            .map_err(|e| SerdeError::invalid(name, self.path, e.to_string()))
    }

    /// Child constructor registered for `name` on this node's tag, then on its base tag.
    fn child_entry(&self, name: &str) -> Option<&'a ClassEntry> {
        let registry = self.engine.registry();
        registry
            .child_field(self.tag, name)
            .or_else(|| registry.child_field(self.base, name))
    }

    fn child_path(&self, name: &str) -> String {
        format!("{}.{}", self.path, name)
    }
}
