//! Error types for the propstore crate
//!
//! Four error families, per the propagation rules of the mapping engine:
//! schema errors are permanent and cached per record type; per-field
//! mismatches accumulate into a single [`LoadError::Mismatches`] while the
//! rest of the load proceeds; the indexed-property ceiling fails a save
//! fast; codec errors live in `ordered_codec::DecodeError` and are
//! re-exported from the crate root.

use std::fmt;

use thiserror::Error;

/// A permanent, type-level schema problem.
///
/// Once recorded for a record type, the same error is returned on every
/// subsequent save/load/metadata call for that type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("field `{field}` is recursively defined")]
    RecursivelyDefined { field: String },

    #[error("duplicate property name `{name}`")]
    DuplicatePropertyName { name: String },

    #[error("metadata field `${key}` registered more than once")]
    DuplicateMetaField { key: String },

    #[error("field `{field}` has invalid property name `{name}`")]
    InvalidPropertyName { field: String, name: String },

    #[error("flattening field `{field}` would nest repeated values inside repeated values")]
    RepeatedFlattening { field: String },

    #[error("metadata field `${key}` has bad default value `{default}`")]
    BadMetaDefault { key: String, default: String },

    #[error("field `{field}` mixes a metadata tag with a non-metadata accessor, or the reverse")]
    MetaAccessMismatch { field: String },

    #[error("field `{field}` has a problem: {source}")]
    Nested {
        field: String,
        source: Box<SchemaError>,
    },
}

/// Why one property could not be loaded into one field.
///
/// Mismatches never abort sibling fields; they are collected across the
/// whole load and reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    /// Record type the load was targeting.
    pub record: &'static str,
    /// Property name that failed to resolve or coerce.
    pub property: String,
    pub reason: String,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot load property `{}` into record `{}`: {}",
            self.property, self.record, self.reason
        )
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("too many indexed properties: the record tree exceeds the limit of {limit}")]
    TooManyIndexedProperties { limit: usize },

    #[error("conversion failed for field `{field}`: {source}")]
    Conversion {
        field: String,
        source: anyhow::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// One entry per property value that failed to load. Fields that did
    /// coerce successfully remain populated on the target record.
    #[error("{} propert{} could not be loaded", .0.len(), if .0.len() == 1 { "y" } else { "ies" })]
    Mismatches(Vec<FieldMismatch>),
}

impl LoadError {
    /// The collected mismatches, empty for schema errors.
    pub fn mismatches(&self) -> &[FieldMismatch] {
        match self {
            LoadError::Mismatches(m) => m,
            LoadError::Schema(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("metadata field is unset")]
    Unset,

    #[error("cannot set metadata field `${key}`: field has no setter")]
    Unsettable { key: String },

    #[error("metadata value for `${key}` has the wrong shape")]
    TypeMismatch { key: String },
}
