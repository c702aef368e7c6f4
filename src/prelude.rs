//! Convenience re-exports for common propstore usage
//!
//! Re-exports the most commonly used items from the propstore crates, so a
//! single use statement covers record registration, mapping, and the value
//! model.
//!
//! # Example
//!
//! ```rust
//! use propstore::prelude::*;
//!
//! // Now you have access to the mapper, the registration API, and the
//! // property value model.
//! ```

pub use crate::errors::{FieldMismatch, LoadError, MetaError, SaveError, SchemaError};
pub use crate::mapper::PropertyMapper;
pub use crate::meta::MetaValue;
pub use crate::record::{FieldSpec, Record};

// Value model
pub use property_model::{
    GeoPoint, IndexSetting, Key, Property, PropertyConverter, PropertyMap, PropertyValue, Toggle,
};

// Ordered byte codec
pub use ordered_codec::{
    put_bytes, put_f64, put_geo_point, put_str, put_time, put_uint, take_bytes, take_f64,
    take_geo_point, take_str, take_time, take_uint, DecodeError,
};

// Common external dependencies
pub use anyhow;
pub use chrono;
