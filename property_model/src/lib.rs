//! Property Model - the generic, schema-less value representation
//!
//! This crate defines the value union (`PropertyValue`), the indexed property
//! wrapper (`Property`), and the name -> ordered-values container
//! (`PropertyMap`) that the structural mapping engine produces and consumes.
//! It also carries the supporting structured scalars (`Key`, `GeoPoint`,
//! `Toggle`), the `PropertyConverter` override trait, and the property-name
//! grammar used by schema construction.

pub mod key;
pub mod validation;
pub mod value;

pub use key::Key;
pub use validation::{is_valid_property_name, validate_property_name, NameError};
pub use value::{
    GeoPoint, IndexSetting, Property, PropertyConverter, PropertyMap, PropertyValue, Toggle,
    META_MARKER,
};
