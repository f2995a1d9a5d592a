//! Serialization Engine
//!
//! Walks object graphs into tagged trees and rebuilds them, consulting the
//! [`ClassRegistry`] at every polymorphic boundary.

use std::any::Any;
use std::cell::RefCell;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::error::json_kind;
use super::{
    short_type_name, ClassEntry, ClassRegistry, FieldReader, FieldWriter, SerdeError,
    SerdeResult, Serializable, TYPE_KEY,
};

// =============================================================================
// Policy & Diagnostics
// =============================================================================

/// What to do with a node whose `__type` cannot be resolved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnknownTagPolicy {
    /// Record a diagnostic, fall back to the expected type, drop list
    /// elements that still cannot be built.
    #[default]
    Degrade,
    /// Abort the whole document.
    FailFast,
}

/// A node the engine could not rebuild as tagged
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Location in the document (`$.content.timeline.tracks[0].clips[3]`)
    pub path: String,
    pub tag: Option<String>,
    pub message: String,
    /// The node as it was stored
    pub raw: Value,
}

/// Result of reconstructing a tree without an expected type
pub enum Reconstructed {
    Object { tag: String, value: Box<dyn Any> },
    Raw(Value),
}

impl Reconstructed {
    pub fn tag(&self) -> Option<&str> {
        match self {
            Reconstructed::Object { tag, .. } => Some(tag),
            Reconstructed::Raw(_) => None,
        }
    }

    /// Takes the rebuilt object out if it has type `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        match self {
            Reconstructed::Object { tag, value } => match value.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(value) => Err(Reconstructed::Object { tag, value }),
            },
            raw => Err(raw),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

const ISO_DATETIME_PATTERN: &str =
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?(Z|[+-]\d{2}:\d{2})$";

fn iso_datetime() -> &'static Regex {
    static ISO: OnceLock<Regex> = OnceLock::new();
    ISO.get_or_init(|| Regex::new(ISO_DATETIME_PATTERN).expect("ISO date-time pattern is valid"))
}

/// Whether `text` is a strict ISO-8601 date-time (`2024-05-01T10:00:00.000Z`)
pub fn is_iso_datetime(text: &str) -> bool {
    iso_datetime().is_match(text)
}

/// Converts between registered types and tagged JSON trees.
///
/// Diagnostics collected under [`UnknownTagPolicy::Degrade`] accumulate until
/// [`SerializationEngine::take_diagnostics`] is called.
pub struct SerializationEngine<'r> {
    registry: &'r ClassRegistry,
    policy: UnknownTagPolicy,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl<'r> SerializationEngine<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Self {
            registry,
            policy: UnknownTagPolicy::default(),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    pub fn with_policy(mut self, policy: UnknownTagPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UnknownTagPolicy {
        self.policy
    }

    pub fn registry(&self) -> &'r ClassRegistry {
        self.registry
    }

    // -------------------------------------------------------------------------
    // Serialize
    // -------------------------------------------------------------------------

    /// Serializes a registered value into a tagged node.
    pub fn serialize<T: Serializable>(&self, value: &T) -> SerdeResult<Value> {
        let tag = self.resolve_tag(value);
        let mut writer = FieldWriter::new(self, tag);
        value.write_fields(&mut writer)?;
        Ok(writer.finish())
    }

    pub fn to_json_string<T: Serializable>(&self, value: &T, pretty: bool) -> SerdeResult<String> {
        let tree = self.serialize(value)?;
        let text = if pretty {
            serde_json::to_string_pretty(&tree)?
        } else {
            serde_json::to_string(&tree)?
        };
        Ok(text)
    }

    /// Tag for `value`: the registry's tag for its exact constructor, else the
    /// constructor's own tag, else the Rust type name.
    fn resolve_tag<T: Serializable>(&self, value: &T) -> &'r str {
        let own = value.type_tag();
        if let Some(tag) = self.registry.tag_for::<T>(own) {
            return tag;
        }
        if own.is_empty() {
            short_type_name::<T>()
        } else {
            own
        }
    }

    // -------------------------------------------------------------------------
    // Deserialize
    // -------------------------------------------------------------------------

    /// Rebuilds a `T` from a tree.
    pub fn deserialize<T: Serializable>(&self, tree: &Value) -> SerdeResult<T> {
        self.read_typed(tree, None, "$")
    }

    pub fn from_json_str<T: Serializable>(&self, text: &str) -> SerdeResult<T> {
        let tree: Value = serde_json::from_str(text)?;
        self.deserialize(&tree)
    }

    /// Rebuilds whatever the root tag names, or hands the tree back unchanged.
    pub fn reconstruct(&self, tree: &Value) -> SerdeResult<Reconstructed> {
        let Some(fields) = tree.as_object() else {
            return Ok(Reconstructed::Raw(tree.clone()));
        };
        let Some(tag) = fields.get(TYPE_KEY) else {
            return Ok(Reconstructed::Raw(tree.clone()));
        };
        let tag_text = tag.as_str().unwrap_or_default();
        match self.registry.class(tag_text) {
            Some(entry) => {
                let reader = FieldReader::new(self, fields, entry.variant(), entry.base(), "$");
                let value = entry.build(&reader)?;
                Ok(Reconstructed::Object {
                    tag: entry.tag().to_string(),
                    value,
                })
            }
            None => {
                self.degrade(
                    Diagnostic {
                        path: "$".to_string(),
                        tag: Some(tag_text.to_string()),
                        message: "unknown type tag, keeping raw tree".to_string(),
                        raw: tree.clone(),
                    },
                    SerdeError::UnknownTag {
                        tag: tag_text.to_string(),
                        path: "$".to_string(),
                    },
                )?;
                Ok(Reconstructed::Raw(tree.clone()))
            }
        }
    }

    /// Deep copy through serialize then deserialize.
    pub fn deep_clone<T: Serializable>(&self, value: &T) -> SerdeResult<T> {
        let tree = self.serialize(value)?;
        self.deserialize(&tree)
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }

    pub fn diagnostics_len(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    /// Rebuilds a node expected to be a `T`.
    ///
    /// Resolution order: the node's own registered tag, then the constructor
    /// registered for the parent field (`expected`), then `T`'s base tag.
    pub(crate) fn read_typed<T: Serializable>(
        &self,
        tree: &Value,
        expected: Option<&ClassEntry>,
        path: &str,
    ) -> SerdeResult<T> {
        let fields = tree.as_object().ok_or_else(|| SerdeError::ExpectedObject {
            path: path.to_string(),
            found: json_kind(tree),
        })?;

        let fallback = expected
            .filter(|entry| entry.builds::<T>())
            .map(ClassEntry::variant)
            .unwrap_or(T::TYPE_NAME);

        let variant = match fields.get(TYPE_KEY) {
            None => fallback,
            Some(Value::String(tag)) => match self.registry.class(tag) {
                Some(entry) if entry.builds::<T>() => entry.variant(),
                Some(entry) => {
                    self.degrade(
                        Diagnostic {
                            path: path.to_string(),
                            tag: Some(tag.clone()),
                            message: format!(
                                "tag builds {} where {} is expected, using {}",
                                entry.type_name(),
                                short_type_name::<T>(),
                                fallback
                            ),
                            raw: tree.clone(),
                        },
                        SerdeError::TypeMismatch {
                            tag: tag.clone(),
                            path: path.to_string(),
                            expected: short_type_name::<T>().to_string(),
                            found: entry.type_name().to_string(),
                        },
                    )?;
                    fallback
                }
                None => {
                    self.degrade(
                        Diagnostic {
                            path: path.to_string(),
                            tag: Some(tag.clone()),
                            message: format!("unknown type tag, using {fallback}"),
                            raw: tree.clone(),
                        },
                        SerdeError::UnknownTag {
                            tag: tag.clone(),
                            path: path.to_string(),
                        },
                    )?;
                    fallback
                }
            },
            Some(other) => {
                return Err(SerdeError::invalid(
                    TYPE_KEY,
                    path,
                    format!("expected a string, found {}", json_kind(other)),
                ))
            }
        };

        let reader = FieldReader::new(self, fields, variant, T::TYPE_NAME, path);
        T::from_fields(variant, &reader)
    }

    pub(crate) fn parse_date(&self, text: &str, path: &str) -> SerdeResult<DateTime<Utc>> {
        if !is_iso_datetime(text) {
            return Err(SerdeError::InvalidDate {
                value: text.to_string(),
                path: path.to_string(),
            });
        }
        DateTime::parse_from_rfc3339(text)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|_| SerdeError::InvalidDate {
                value: text.to_string(),
                path: path.to_string(),
            })
    }

    /// Handles a list element that could not be rebuilt.
    pub(crate) fn drop_element(&self, path: &str, raw: &Value, err: SerdeError) -> SerdeResult<()> {
        let tag = raw
            .get(TYPE_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);
        let message = format!("element dropped: {err}");
        self.degrade(
            Diagnostic {
                path: path.to_string(),
                tag,
                message,
                raw: raw.clone(),
            },
            err,
        )
    }

    fn degrade(&self, diagnostic: Diagnostic, err: SerdeError) -> SerdeResult<()> {
        match self.policy {
            UnknownTagPolicy::FailFast => Err(err),
            UnknownTagPolicy::Degrade => {
                warn!(
                    path = %diagnostic.path,
                    tag = diagnostic.tag.as_deref().unwrap_or("-"),
                    "Reconstruction degraded: {}",
                    diagnostic.message
                );
                self.diagnostics.borrow_mut().push(diagnostic);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for SerializationEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationEngine")
            .field("classes", &self.registry.len())
            .field("policy", &self.policy)
            .field("diagnostics", &self.diagnostics_len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
