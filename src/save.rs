//! Record -> property map conversion.

use property_model::{IndexSetting, Property, PropertyMap};

use crate::errors::SaveError;
use crate::mapper::PropertyMapper;
use crate::record::{Access, Record};
use crate::schema::RecordSchema;

/// Hard ceiling on should-index property values across one record tree.
/// Bounds secondary-index fan-out for pathological records.
pub const MAX_INDEXED_PROPERTIES: usize = 20_000;

impl PropertyMapper {
    /// Converts `rec` into a fresh property map.
    ///
    /// Fields are walked in declaration order; nested records flatten into
    /// dotted names; repeated fields emit one value per element in order.
    /// With `with_meta`, one unindexed `$key` property is also emitted per
    /// registered metadata field.
    pub fn save<R: Record>(&self, rec: &R, with_meta: bool) -> Result<PropertyMap, SaveError> {
        let schema = self.schema::<R>();
        crate::trace_log!("saving {} (with_meta: {})", R::record_name(), with_meta);
        let mut out = PropertyMap::new();
        let mut indexed = 0usize;
        save_fields(
            self,
            &schema,
            rec,
            &mut out,
            "",
            IndexSetting::ShouldIndex,
            &mut indexed,
        )?;
        if with_meta {
            self.append_meta_properties(&schema, rec, &mut out);
        }
        Ok(out)
    }
}

/// Saves every field of one record level under `prefix`, accumulating the
/// should-index count across the whole tree.
pub(crate) fn save_fields<R: Record>(
    mapper: &PropertyMapper,
    schema: &RecordSchema<R>,
    rec: &R,
    out: &mut PropertyMap,
    prefix: &str,
    setting: IndexSetting,
    indexed: &mut usize,
) -> Result<(), SaveError> {
    if let Some(problem) = schema.problem() {
        return Err(problem.clone().into());
    }

    for (spec, tag) in schema.specs().iter().zip(schema.tags()) {
        if tag.excluded {
            continue;
        }
        let name = if prefix.is_empty() {
            tag.name.clone()
        } else {
            format!("{prefix}{}", tag.name)
        };
        // NoIndex is inherited downward; a field can opt out of indexing
        // but never back in under an unindexed parent.
        let setting = if tag.index == IndexSetting::NoIndex {
            IndexSetting::NoIndex
        } else {
            setting
        };

        match &spec.access {
            Access::Plain(access) => {
                push_property(out, name, Property::new(access.get(rec), setting), indexed)?;
            }
            Access::Repeated(access) => {
                for i in 0..access.len(rec) {
                    push_property(
                        out,
                        name.clone(),
                        Property::new(access.get(rec, i), setting),
                        indexed,
                    )?;
                }
            }
            Access::Convert(access) => {
                let prop = access.to_property(rec).map_err(|source| SaveError::Conversion {
                    field: tag.field_name.to_string(),
                    source,
                })?;
                push_property(out, name, prop, indexed)?;
            }
            Access::RepeatedConvert(access) => {
                for i in 0..access.len(rec) {
                    let prop =
                        access
                            .to_property_at(rec, i)
                            .map_err(|source| SaveError::Conversion {
                                field: tag.field_name.to_string(),
                                source,
                            })?;
                    push_property(out, name.clone(), prop, indexed)?;
                }
            }
            Access::Nested(access) | Access::RepeatedNested(access) => {
                access.save(mapper, rec, out, &name, setting, indexed)?;
            }
            Access::Meta(_) => {
                // Metadata fields are excluded; `tag.excluded` already
                // skipped them.
            }
        }
    }
    Ok(())
}

fn push_property(
    out: &mut PropertyMap,
    name: String,
    prop: Property,
    indexed: &mut usize,
) -> Result<(), SaveError> {
    if prop.index_setting() == IndexSetting::ShouldIndex {
        *indexed += 1;
        if *indexed > MAX_INDEXED_PROPERTIES {
            return Err(SaveError::TooManyIndexedProperties {
                limit: MAX_INDEXED_PROPERTIES,
            });
        }
    }
    out.append(name, prop);
    Ok(())
}
