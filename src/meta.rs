//! Metadata field access.
//!
//! Metadata fields are registered under reserved `$`-prefixed names and are
//! read and written through `get_meta`/`set_meta` rather than ordinary
//! save/load. An unset field reports the default declared in its tag;
//! toggle-shaped fields surface as booleans once explicitly set.

use property_model::{Property, PropertyValue, Toggle};

use crate::errors::MetaError;
use crate::mapper::PropertyMapper;
use crate::record::{Access, MetaAccess, MetaShape, Record};
use crate::schema::RecordSchema;

/// A metadata value as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl MetaValue {
    pub(crate) fn into_property_value(self) -> PropertyValue {
        match self {
            MetaValue::Str(s) => PropertyValue::Str(s),
            MetaValue::Int(v) => PropertyValue::Int(v),
            MetaValue::Bool(b) => PropertyValue::Bool(b),
        }
    }
}

/// Parses the tag option slot into the field's default value.
///
/// String defaults are taken verbatim; integer defaults parse as i64 with
/// an empty option meaning zero; toggles require an explicit `on`/`off`
/// (or `true`/`false`) default so that an unset toggle has a defined
/// reading.
pub(crate) fn parse_meta_default(opts: &str, shape: MetaShape) -> Option<MetaValue> {
    match shape {
        MetaShape::Str => Some(MetaValue::Str(opts.to_string())),
        MetaShape::Int => {
            if opts.is_empty() {
                Some(MetaValue::Int(0))
            } else {
                opts.parse::<i64>().ok().map(MetaValue::Int)
            }
        }
        MetaShape::Toggle => match opts {
            "on" | "On" | "true" => Some(MetaValue::Bool(true)),
            "off" | "Off" | "false" => Some(MetaValue::Bool(false)),
            _ => None,
        },
    }
}

/// Current value of the meta field at `pos`: the field's own value when the
/// field is settable and has been explicitly set, otherwise the tag default.
/// A setter-less field is a constant and always reads as its default.
pub(crate) fn meta_value_at<R: Record>(
    schema: &RecordSchema<R>,
    rec: &R,
    pos: usize,
) -> MetaValue {
    let tag = &schema.tags()[pos];
    let default = tag
        .meta_default
        .clone()
        .unwrap_or_else(|| panic!("metadata table points at field `{}` without a default", tag.field_name));
    match &schema.specs()[pos].access {
        Access::Meta(meta) if !meta.settable() => default,
        Access::Meta(MetaAccess::Str { get, .. }) => {
            let current = get(rec);
            if current.is_empty() {
                default
            } else {
                MetaValue::Str(current.to_string())
            }
        }
        Access::Meta(MetaAccess::Int { get, .. }) => {
            let current = get(rec);
            if current == 0 {
                default
            } else {
                MetaValue::Int(current)
            }
        }
        Access::Meta(MetaAccess::Toggle { get, .. }) => match get(rec).as_bool() {
            Some(b) => MetaValue::Bool(b),
            None => default,
        },
        _ => panic!(
            "metadata table points at non-metadata field `{}`",
            tag.field_name
        ),
    }
}

impl PropertyMapper {
    /// Reads a metadata field.
    ///
    /// Unknown keys report [`MetaError::Unset`]. A registered field whose
    /// value is still the type default reports its tag default; a toggle
    /// that has been explicitly set reads as a boolean. Setter-less fields
    /// always report their tag default.
    pub fn get_meta<R: Record>(&self, rec: &R, key: &str) -> Result<MetaValue, MetaError> {
        let schema = self.schema::<R>();
        if let Some(problem) = schema.problem() {
            return Err(problem.clone().into());
        }
        let pos = schema.meta_pos(key).ok_or(MetaError::Unset)?;
        Ok(meta_value_at(&schema, rec, pos))
    }

    /// Writes a metadata field.
    ///
    /// A boolean assigned to a toggle-shaped field is coerced to the
    /// corresponding toggle state. Fields registered without a setter
    /// reject writes with [`MetaError::Unsettable`].
    pub fn set_meta<R: Record>(
        &self,
        rec: &mut R,
        key: &str,
        value: MetaValue,
    ) -> Result<(), MetaError> {
        let schema = self.schema::<R>();
        if let Some(problem) = schema.problem() {
            return Err(problem.clone().into());
        }
        let pos = schema.meta_pos(key).ok_or(MetaError::Unset)?;
        let meta = match &schema.specs()[pos].access {
            Access::Meta(meta) => meta,
            _ => panic!("metadata table points at non-metadata field `{}`", key),
        };
        if !meta.settable() {
            return Err(MetaError::Unsettable {
                key: key.to_string(),
            });
        }
        match (meta, value) {
            (MetaAccess::Str { set: Some(set), .. }, MetaValue::Str(s)) => {
                set(rec, s);
                Ok(())
            }
            (MetaAccess::Int { set: Some(set), .. }, MetaValue::Int(v)) => {
                set(rec, v);
                Ok(())
            }
            (MetaAccess::Toggle { set: Some(set), .. }, MetaValue::Bool(b)) => {
                set(rec, Toggle::from(b));
                Ok(())
            }
            _ => Err(MetaError::TypeMismatch {
                key: key.to_string(),
            }),
        }
    }

    /// Emits one `$key` property per registered metadata field, used by
    /// save when metadata emission is requested.
    pub(crate) fn append_meta_properties<R: Record>(
        &self,
        schema: &RecordSchema<R>,
        rec: &R,
        out: &mut property_model::PropertyMap,
    ) {
        for (key, pos) in schema.meta_keys() {
            let value = meta_value_at(schema, rec, pos);
            out.append(
                format!("${key}"),
                Property::unindexed(value.into_property_value()),
            );
        }
    }
}
