//! # Propstore
//!
//! A structural mapping engine between typed records and schemaless
//! property maps, with an order-preserving byte codec for the primitive
//! values.
//!
//! Record types declare their fields explicitly; the engine derives a
//! per-type schema once, caches it, and then converts records to and from
//! [`PropertyMap`]s: nested records flatten into dotted names, repeated
//! fields map to multi-valued properties, and `$`-prefixed metadata fields
//! travel outside the data namespace. The [`ordered_codec`] crate encodes
//! the primitive values as byte strings whose lexicographic order matches
//! the natural order of the values.
//!
//! ## Quick Start
//!
//! ```rust
//! use propstore::prelude::*;
//!
//! #[derive(Default)]
//! struct Employee {
//!     key: Option<Key>,
//!     name: String,
//!     badge: i64,
//!     tags: Vec<String>,
//! }
//!
//! impl Record for Employee {
//!     fn record_name() -> &'static str {
//!         "Employee"
//!     }
//!
//!     fn fields() -> Vec<FieldSpec<Self>> {
//!         vec![
//!             FieldSpec::plain("key", "-", |r| &r.key, |r| &mut r.key),
//!             FieldSpec::plain("name", "", |r| &r.name, |r| &mut r.name),
//!             FieldSpec::plain("badge", "badge_number,noindex", |r| &r.badge, |r| &mut r.badge),
//!             FieldSpec::repeated("tags", "", |r| &r.tags, |r| &mut r.tags),
//!         ]
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mapper = PropertyMapper::new();
//!
//!     let emp = Employee {
//!         key: None,
//!         name: "June".to_string(),
//!         badge: 42,
//!         tags: vec!["eng".to_string(), "oncall".to_string()],
//!     };
//!
//!     let props = mapper.save(&emp, false)?;
//!     assert_eq!(props.get("tags").map(|v| v.len()), Some(2));
//!
//!     let mut loaded = Employee::default();
//!     mapper.load(&mut loaded, &props)?;
//!     assert_eq!(loaded.name, "June");
//!     assert_eq!(loaded.badge, 42);
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod coerce;
pub mod errors;
pub mod load;
pub mod mapper;
pub mod meta;
pub mod prelude;
pub mod record;
pub mod save;

mod schema;

// Re-export the main public types for convenience
pub use coerce::{Coerced, PropertyPrimitive};
pub use errors::{FieldMismatch, LoadError, MetaError, SaveError, SchemaError};
pub use mapper::PropertyMapper;
pub use meta::MetaValue;
pub use record::{FieldSpec, Record};
pub use save::MAX_INDEXED_PROPERTIES;

// Re-export member crates used in the public API
pub use ordered_codec;
pub use property_model;

pub use ordered_codec::DecodeError;
pub use property_model::{
    GeoPoint, IndexSetting, Key, Property, PropertyConverter, PropertyMap, PropertyValue, Toggle,
};
