//! Class Registry
//!
//! Maps type tags to constructors and records child-field mappings.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::{FieldReader, SerdeResult, Serializable};

/// Type-erased reconstruction entry point
type Factory = fn(&str, &FieldReader<'_>) -> SerdeResult<Box<dyn Any>>;

fn build_boxed<T: Serializable>(
    variant: &str,
    fields: &FieldReader<'_>,
) -> SerdeResult<Box<dyn Any>> {
    let value = T::from_fields(variant, fields)?;
    Ok(Box::new(value))
}

/// A registered constructor: a Rust type plus the variant it builds.
#[derive(Clone)]
pub struct ClassEntry {
    tag: String,
    variant: String,
    type_id: TypeId,
    type_name: &'static str,
    base: &'static str,
    factory: Factory,
}

impl ClassEntry {
    pub fn new<T: Serializable>(tag: &str, variant: &str) -> Self {
        Self {
            tag: tag.to_string(),
            variant: variant.to_string(),
            type_id: TypeId::of::<T>(),
            type_name: super::short_type_name::<T>(),
            base: T::TYPE_NAME,
            factory: build_boxed::<T>,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Constructor variant handed to `from_fields`
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Rust type built by this entry
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn base(&self) -> &'static str {
        self.base
    }

    /// Whether this entry builds values of type `T`
    pub fn builds<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub(crate) fn build(&self, fields: &FieldReader<'_>) -> SerdeResult<Box<dyn Any>> {
        (self.factory)(&self.variant, fields)
    }
}

impl fmt::Debug for ClassEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassEntry")
            .field("tag", &self.tag)
            .field("variant", &self.variant)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Tag → constructor table plus per-parent child-field mappings.
///
/// Registration is idempotent and the last registration of a tag wins.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassEntry>,
    /// Reverse lookup: (Rust type, variant) → tag
    constructor_tags: HashMap<TypeId, HashMap<String, String>>,
    /// parent tag → field name → child constructor
    child_fields: HashMap<String, HashMap<String, ClassEntry>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `tag`, building the variant of the same name.
    pub fn register_class<T: Serializable>(&mut self, tag: &str) -> &mut Self {
        self.register_variant::<T>(tag, tag)
    }

    /// Registers `T` under `tag`, building `variant`.
    pub fn register_variant<T: Serializable>(&mut self, tag: &str, variant: &str) -> &mut Self {
        let entry = ClassEntry::new::<T>(tag, variant);
        if let Some(previous) = self.classes.insert(tag.to_string(), entry) {
            debug!(
                "Class tag '{}' re-registered (was {}::{})",
                tag, previous.type_name, previous.variant
            );
        }
        self.constructor_tags
            .entry(TypeId::of::<T>())
            .or_default()
            .insert(variant.to_string(), tag.to_string());
        self
    }

    /// Records that `field` of `parent` must be rebuilt with `T`'s `variant`.
    pub fn register_child_field<T: Serializable>(
        &mut self,
        parent: &str,
        field: &str,
        variant: &str,
    ) -> &mut Self {
        self.child_fields
            .entry(parent.to_string())
            .or_default()
            .insert(field.to_string(), ClassEntry::new::<T>(variant, variant));
        self
    }

    pub fn class(&self, tag: &str) -> Option<&ClassEntry> {
        self.classes.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.classes.contains_key(tag)
    }

    /// Tag recorded for the exact constructor `(T, variant)`
    pub fn tag_for<T: Any>(&self, variant: &str) -> Option<&str> {
        self.constructor_tags
            .get(&TypeId::of::<T>())
            .and_then(|variants| variants.get(variant))
            .map(String::as_str)
    }

    pub fn child_field(&self, parent: &str, field: &str) -> Option<&ClassEntry> {
        self.child_fields
            .get(parent)
            .and_then(|fields| fields.get(field))
    }

    /// Registered tags in sorted order
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
