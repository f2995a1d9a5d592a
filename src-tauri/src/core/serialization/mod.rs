//! Serialization Module
//!
//! Converts live object graphs into tagged JSON trees and back.
//!
//! Every persisted type describes its own shape through an explicit field
//! schema ([`Serializable::write_fields`] / [`Serializable::from_fields`]).
//! Registered types carry a reserved `__type` key naming their concrete
//! constructor so that polymorphic fields (a clip list holding silences,
//! subtitles and asset clips) can be rebuilt with the right variant. The
//! [`ClassRegistry`] maps tags to constructors and records which child type a
//! parent's field must be rebuilt with; the [`SerializationEngine`] walks the
//! tree consulting it.
//!
//! `from_fields` is the only reconstruction path: it assigns stored values
//! directly and never goes through the validating constructors, so those keep
//! enforcing their invariants unconditionally.

mod engine;
mod error;
mod fields;
mod registry;

pub use engine::{Diagnostic, Reconstructed, SerializationEngine, UnknownTagPolicy};
pub use error::{SerdeError, SerdeResult};
pub use fields::{FieldReader, FieldWriter};
pub use registry::{ClassEntry, ClassRegistry};

use std::any::Any;

/// Reserved key holding a node's type tag
pub const TYPE_KEY: &str = "__type";

/// A type with an explicit, exhaustive field schema.
pub trait Serializable: Any + Sized {
    /// Tag of the base constructor, used when a tree carries no `__type`.
    ///
    /// An empty tag makes serialization fall back to the Rust type name.
    const TYPE_NAME: &'static str;

    /// Tag of the concrete constructor this value was built with.
    fn type_tag(&self) -> &'static str {
        Self::TYPE_NAME
    }

    /// Writes every declared field.
    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()>;

    /// Rebuilds a value from stored fields.
    ///
    /// `variant` is the constructor tag the node resolved to.
    fn from_fields(variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self>;
}

/// Last path segment of a Rust type name (`qurancaption_lib::core::Duration` -> `Duration`)
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}
