//! Property map -> record conversion.

use property_model::{Property, PropertyMap, META_MARKER};

use crate::errors::{FieldMismatch, LoadError};
use crate::mapper::PropertyMapper;
use crate::record::{Access, Record};
use crate::schema::RecordSchema;

impl PropertyMapper {
    /// Populates `rec` from `props`.
    ///
    /// Loading is tolerant: a value that cannot coerce into its field is
    /// recorded as a mismatch and the rest of the map is still applied, so
    /// a partially compatible record comes back as populated as possible.
    /// Names starting with the metadata marker are skipped.
    pub fn load<R: Record>(&self, rec: &mut R, props: &PropertyMap) -> Result<(), LoadError> {
        let schema = self.schema::<R>();
        if let Some(problem) = schema.problem() {
            return Err(problem.clone().into());
        }
        crate::trace_log!("loading {} from {} properties", R::record_name(), props.len());
        let mut mismatches: Vec<FieldMismatch> = Vec::new();
        for (name, values) in props.iter() {
            if name.starts_with(META_MARKER) {
                continue;
            }
            let multiple = values.len() > 1;
            for (i, prop) in values.iter().enumerate() {
                if let Err(reason) = load_one(self, &schema, rec, name, i, prop, multiple) {
                    mismatches.push(FieldMismatch {
                        record: R::record_name(),
                        property: name.clone(),
                        reason,
                    });
                }
            }
        }
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(LoadError::Mismatches(mismatches))
        }
    }
}

/// Applies the `index`-th value of property `name` to one record level.
///
/// `require_repeated` is set when the property carries more than one value,
/// in which case only a repeated field may absorb it. Errors are reason
/// strings; the caller attaches the property name and record type.
pub(crate) fn load_one<R: Record>(
    mapper: &PropertyMapper,
    schema: &RecordSchema<R>,
    rec: &mut R,
    name: &str,
    index: usize,
    prop: &Property,
    require_repeated: bool,
) -> Result<(), String> {
    if let Some(problem) = schema.problem() {
        return Err(problem.to_string());
    }
    let pos = match schema.name_pos(name) {
        Some(pos) => pos,
        None => return Err("no such field".to_string()),
    };
    let tag = &schema.tags()[pos];
    match &schema.specs()[pos].access {
        Access::Plain(access) => {
            if require_repeated {
                return Err("multiple-valued property requires a repeated field".to_string());
            }
            access.set(rec, prop.value())
        }
        Access::Repeated(access) => access.set(rec, index, prop.value()),
        Access::Convert(access) => {
            if require_repeated {
                return Err("multiple-valued property requires a repeated field".to_string());
            }
            access.from_property(rec, prop).map_err(|e| e.to_string())
        }
        Access::RepeatedConvert(access) => access
            .from_property_at(rec, index, prop)
            .map_err(|e| e.to_string()),
        Access::Nested(access) | Access::RepeatedNested(access) => {
            let rest = &name[tag.name.len()..];
            access.load(mapper, rec, index, rest, prop, require_repeated)
        }
        Access::Meta(_) => {
            // Metadata fields never appear in the data name table.
            Err("property addresses a metadata field".to_string())
        }
    }
}
