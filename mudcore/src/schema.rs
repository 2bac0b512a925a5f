//!
//! A schema is a list of `(name, type, field-offset)` entries, made
//! concrete as a Rust trait so [`crate::registry::EntityRegistry`] can be
//! generic over any entity type. See `mudcore-derive` for the
//! `#[derive(Entity)]` macro that implements this trait from struct field
//! attributes.
//!

use crate::attrlist::AttributeList;
use crate::error::Error;

/// The on-disk type of a schema field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Unsigned,
}

/// A typed value read from or about to be written to a record line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    Unsigned(u32),
}

impl FieldValue {
    /// Renders the value the way it is written on disk: a string verbatim,
    /// an unsigned integer in decimal.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Unsigned(n) => n.to_string(),
        }
    }

    /// Parses a disk-form string into a typed value per `kind`. Decimal for
    /// `Unsigned`; a malformed number is a load failure.
    pub fn parse(kind: FieldType, raw: &str) -> Result<Self, Error> {
        match kind {
            FieldType::Str => Ok(FieldValue::Str(raw.to_owned())),
            FieldType::Unsigned => raw
                .parse::<u32>()
                .map(FieldValue::Unsigned)
                .map_err(|_| Error::Malformed(format!("not an unsigned integer: {raw:?}"))),
        }
    }
}

/// One schema field: its on-disk name, type, and typed getter/setter.
pub struct FieldDescriptor<T> {
    pub name: &'static str,
    pub kind: FieldType,
    pub get: fn(&T) -> FieldValue,
    pub set: fn(&mut T, FieldValue) -> Result<(), Error>,
}

/// An entity type's schema: its fixed typed fields, plus the extras list
/// for anything else found on disk.
pub trait Schema: Sized {
    /// The FDB domain this entity type lives in (e.g. `"rooms"`).
    const DOMAIN: &'static str;

    /// The typed fields declared by this schema, in declaration order.
    fn field_descriptors() -> &'static [FieldDescriptor<Self>];

    /// The entity's own id, as stored in its `id` schema field.
    fn id(&self) -> u16;

    /// Sets the entity's id (used when constructing a blank entity and when
    /// a loaded record's `id` field is parsed).
    fn set_id(&mut self, id: u16);

    fn extras(&self) -> &AttributeList;
    fn extras_mut(&mut self) -> &mut AttributeList;

    /// A freshly allocated, blank entity with the given id.
    fn blank(id: u16) -> Self;

    /// Finds the descriptor for `name` by case-insensitive comparison, the
    /// same rule [`AttributeList::find`] uses.
    fn find_descriptor(name: &str) -> Option<&'static FieldDescriptor<Self>> {
        Self::field_descriptors()
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }
}
