//! Per-type field schemas and their construction.
//!
//! A [`RecordSchema`] is computed once per record type and cached for the
//! mapper's lifetime. Construction resolves the tag of every declared field,
//! validates names against the property-name grammar, registers metadata
//! fields, flattens nested record namespaces, and detects recursive type
//! definitions. Any problem found is recorded on the schema and returned
//! unchanged on every later use of the type; the half-built field tables are
//! discarded.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use property_model::{is_valid_property_name, IndexSetting, META_MARKER};

use crate::errors::SchemaError;
use crate::meta::{parse_meta_default, MetaValue};
use crate::record::{Access, FieldSpec, Record};

/// Schema cache slots, keyed by record type.
///
/// A `Building` slot marks a type whose schema is currently under
/// construction; nested construction re-entering such a type has found a
/// recursive definition.
pub(crate) type Slots = HashMap<TypeId, Slot>;

pub(crate) enum Slot {
    Building,
    Ready(Arc<dyn Any + Send + Sync>),
}

/// Why a nested schema could not be used by its referencing field.
pub(crate) enum BuildFailure {
    /// The nested type is currently under construction: a cycle.
    InProgress,
    /// The nested type's own schema is broken.
    Problem(SchemaError),
}

/// What a parent schema needs to know about a nested type.
pub(crate) struct NestedInfo {
    /// Flattened property names of the nested schema.
    pub names: Vec<String>,
    pub has_repeated: bool,
}

/// Parsed tag of one declared field.
pub(crate) struct FieldTag {
    pub field_name: &'static str,
    /// Effective property name. Nested fields carry a trailing `.` so the
    /// flattened child names can be recovered by prefix stripping. Empty
    /// for excluded and metadata fields.
    pub name: String,
    pub excluded: bool,
    pub index: IndexSetting,
    pub meta_key: Option<String>,
    pub meta_default: Option<MetaValue>,
}

impl FieldTag {
    fn excluded(field_name: &'static str) -> Self {
        Self {
            field_name,
            name: String::new(),
            excluded: true,
            index: IndexSetting::NoIndex,
            meta_key: None,
            meta_default: None,
        }
    }
}

/// The cached, immutable schema of one record type.
pub(crate) struct RecordSchema<R: Record> {
    record_name: &'static str,
    specs: Vec<FieldSpec<R>>,
    tags: Vec<FieldTag>,
    by_name: HashMap<String, usize>,
    by_meta: HashMap<String, usize>,
    has_repeated: bool,
    problem: Option<SchemaError>,
}

impl<R: Record> RecordSchema<R> {
    pub(crate) fn record_name(&self) -> &'static str {
        self.record_name
    }

    pub(crate) fn specs(&self) -> &[FieldSpec<R>] {
        &self.specs
    }

    pub(crate) fn tags(&self) -> &[FieldTag] {
        &self.tags
    }

    /// Field position for a flattened property name.
    pub(crate) fn name_pos(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn meta_pos(&self, key: &str) -> Option<usize> {
        self.by_meta.get(key).copied()
    }

    pub(crate) fn meta_keys(&self) -> impl Iterator<Item = (&String, usize)> {
        self.by_meta.iter().map(|(k, &pos)| (k, pos))
    }

    pub(crate) fn problem(&self) -> Option<&SchemaError> {
        self.problem.as_ref()
    }

    pub(crate) fn info(&self) -> NestedInfo {
        NestedInfo {
            names: self.by_name.keys().cloned().collect(),
            has_repeated: self.has_repeated,
        }
    }

    fn broken(problem: SchemaError) -> Self {
        Self {
            record_name: R::record_name(),
            specs: Vec::new(),
            tags: Vec::new(),
            by_name: HashMap::new(),
            by_meta: HashMap::new(),
            has_repeated: false,
            problem: Some(problem),
        }
    }
}

/// Builds and publishes the schema for `R`, replacing its `Building` marker.
///
/// Must run with exclusive access to the slots (the mapper holds the write
/// lock); nested types are built recursively into the same slot table.
pub(crate) fn build_schema<R: Record>(slots: &mut Slots) -> Arc<RecordSchema<R>> {
    slots.insert(TypeId::of::<R>(), Slot::Building);
    let schema = Arc::new(construct::<R>(slots));
    crate::debug_log!(
        "built schema for {}: {} fields, problem: {:?}",
        R::record_name(),
        schema.tags.len(),
        schema.problem
    );
    slots.insert(
        TypeId::of::<R>(),
        Slot::Ready(schema.clone() as Arc<dyn Any + Send + Sync>),
    );
    schema
}

/// Cache lookup used during construction of a referencing schema.
pub(crate) fn get_or_build<R: Record>(
    slots: &mut Slots,
) -> Result<Arc<RecordSchema<R>>, BuildFailure> {
    let schema = match slots.get(&TypeId::of::<R>()) {
        Some(Slot::Building) => return Err(BuildFailure::InProgress),
        Some(Slot::Ready(entry)) => entry
            .clone()
            .downcast::<RecordSchema<R>>()
            .unwrap_or_else(|_| panic!("schema cache entry for {} has the wrong type", R::record_name())),
        None => build_schema::<R>(slots),
    };
    match schema.problem() {
        Some(problem) => Err(BuildFailure::Problem(problem.clone())),
        None => Ok(schema),
    }
}

fn construct<R: Record>(slots: &mut Slots) -> RecordSchema<R> {
    let specs = R::fields();
    let mut tags: Vec<FieldTag> = Vec::with_capacity(specs.len());
    let mut by_name: HashMap<String, usize> = HashMap::with_capacity(specs.len());
    let mut by_meta: HashMap<String, usize> = HashMap::new();
    let mut has_repeated = false;

    for (i, spec) in specs.iter().enumerate() {
        let (raw_name, opts) = match spec.tag.split_once(',') {
            Some((name, opts)) => (name, opts),
            None => (spec.tag, ""),
        };

        // Metadata fields live in their own name table and are excluded
        // from data mapping.
        if raw_name.starts_with(META_MARKER) {
            let meta = match &spec.access {
                Access::Meta(meta) => meta,
                _ => {
                    return RecordSchema::broken(SchemaError::MetaAccessMismatch {
                        field: spec.field_name.to_string(),
                    })
                }
            };
            let key = &raw_name[1..];
            if by_meta.contains_key(key) {
                return RecordSchema::broken(SchemaError::DuplicateMetaField {
                    key: key.to_string(),
                });
            }
            let default = match parse_meta_default(opts, meta.shape()) {
                Some(default) => default,
                None => {
                    return RecordSchema::broken(SchemaError::BadMetaDefault {
                        key: key.to_string(),
                        default: opts.to_string(),
                    })
                }
            };
            by_meta.insert(key.to_string(), i);
            tags.push(FieldTag {
                meta_key: Some(key.to_string()),
                meta_default: Some(default),
                ..FieldTag::excluded(spec.field_name)
            });
            continue;
        }

        if matches!(spec.access, Access::Meta(_)) {
            return RecordSchema::broken(SchemaError::MetaAccessMismatch {
                field: spec.field_name.to_string(),
            });
        }

        if raw_name == "-" {
            tags.push(FieldTag::excluded(spec.field_name));
            continue;
        }

        let name = if raw_name.is_empty() {
            spec.field_name.to_string()
        } else {
            raw_name.to_string()
        };
        if !is_valid_property_name(&name) {
            return RecordSchema::broken(SchemaError::InvalidPropertyName {
                field: spec.field_name.to_string(),
                name,
            });
        }
        let index = if opts == "noindex" {
            IndexSetting::NoIndex
        } else {
            IndexSetting::ShouldIndex
        };

        match &spec.access {
            Access::Plain(_) | Access::Convert(_) => {
                if by_name.insert(name.clone(), i).is_some() {
                    return RecordSchema::broken(SchemaError::DuplicatePropertyName { name });
                }
            }
            Access::Repeated(_) | Access::RepeatedConvert(_) => {
                if by_name.insert(name.clone(), i).is_some() {
                    return RecordSchema::broken(SchemaError::DuplicatePropertyName { name });
                }
                has_repeated = true;
            }
            Access::Nested(access) | Access::RepeatedNested(access) => {
                let repeated = matches!(spec.access, Access::RepeatedNested(_));
                let info = match access.nested_info(slots) {
                    Ok(info) => info,
                    Err(BuildFailure::InProgress) => {
                        return RecordSchema::broken(SchemaError::RecursivelyDefined {
                            field: spec.field_name.to_string(),
                        })
                    }
                    Err(BuildFailure::Problem(problem)) => {
                        return RecordSchema::broken(SchemaError::Nested {
                            field: spec.field_name.to_string(),
                            source: Box::new(problem),
                        })
                    }
                };
                if repeated && info.has_repeated {
                    return RecordSchema::broken(SchemaError::RepeatedFlattening {
                        field: spec.field_name.to_string(),
                    });
                }
                let dotted = format!("{name}.");
                for rel in &info.names {
                    let abs = format!("{dotted}{rel}");
                    if by_name.insert(abs.clone(), i).is_some() {
                        return RecordSchema::broken(SchemaError::DuplicatePropertyName {
                            name: abs,
                        });
                    }
                }
                has_repeated |= repeated || info.has_repeated;
                tags.push(FieldTag {
                    field_name: spec.field_name,
                    name: dotted,
                    excluded: false,
                    index,
                    meta_key: None,
                    meta_default: None,
                });
                continue;
            }
            Access::Meta(_) => {
                // Handled above; meta tags never reach this match.
                return RecordSchema::broken(SchemaError::MetaAccessMismatch {
                    field: spec.field_name.to_string(),
                });
            }
        }

        tags.push(FieldTag {
            field_name: spec.field_name,
            name,
            excluded: false,
            index,
            meta_key: None,
            meta_default: None,
        });
    }

    RecordSchema {
        record_name: R::record_name(),
        specs,
        tags,
        by_name,
        by_meta,
        has_repeated,
        problem: None,
    }
}
