//! Field registration for record types.
//!
//! The mapping engine never inspects types at runtime; a record type
//! declares its fields explicitly through [`Record::fields`], returning one
//! [`FieldSpec`] per field in declaration order. Each spec pairs the field's
//! tag (the `name[,option]` contract) with typed access into the record,
//! from which schema construction derives the property-name tables.

use property_model::{IndexSetting, Property, PropertyConverter, PropertyMap, PropertyValue, Toggle};

use crate::coerce::{Coerced, PropertyPrimitive};
use crate::errors::SaveError;
use crate::mapper::PropertyMapper;
use crate::schema::{BuildFailure, NestedInfo, Slots};
use crate::{load, save, schema};

/// A record type that can be saved to and loaded from a [`PropertyMap`].
pub trait Record: Default + 'static {
    /// Type name used in diagnostics.
    fn record_name() -> &'static str;

    /// Field declarations, in declaration order.
    fn fields() -> Vec<FieldSpec<Self>>;
}

/// One declared field: its name, its tag, and typed access into the record.
///
/// The tag follows the `name[,option]` contract: an empty name derives the
/// property name from the field's own name, `"-"` excludes the field, a
/// leading `$` marks a metadata field (with the option slot holding its
/// default), and the option `noindex` opts a data field out of indexing.
pub struct FieldSpec<R> {
    pub(crate) field_name: &'static str,
    pub(crate) tag: &'static str,
    pub(crate) access: Access<R>,
}

impl<R: Record> FieldSpec<R> {
    /// A single-valued field of a supported primitive shape.
    pub fn plain<T: PropertyPrimitive>(
        field_name: &'static str,
        tag: &'static str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self {
        Self {
            field_name,
            tag,
            access: Access::Plain(Box::new(PlainField { get, get_mut })),
        }
    }

    /// A repeated field: one property value per element, order preserved.
    pub fn repeated<T: PropertyPrimitive + Default>(
        field_name: &'static str,
        tag: &'static str,
        get: fn(&R) -> &Vec<T>,
        get_mut: fn(&mut R) -> &mut Vec<T>,
    ) -> Self {
        Self {
            field_name,
            tag,
            access: Access::Repeated(Box::new(RepeatedField { get, get_mut })),
        }
    }

    /// A nested record, flattened into the parent namespace as
    /// `<name>.<inner>`.
    pub fn nested<S: Record>(
        field_name: &'static str,
        tag: &'static str,
        get: fn(&R) -> &S,
        get_mut: fn(&mut R) -> &mut S,
    ) -> Self {
        Self {
            field_name,
            tag,
            access: Access::Nested(Box::new(NestedField { get, get_mut })),
        }
    }

    /// A repeated nested record. The nested type may not itself contain
    /// repeated fields (flattening would produce a sequence of sequences).
    pub fn repeated_nested<S: Record>(
        field_name: &'static str,
        tag: &'static str,
        get: fn(&R) -> &Vec<S>,
        get_mut: fn(&mut R) -> &mut Vec<S>,
    ) -> Self {
        Self {
            field_name,
            tag,
            access: Access::RepeatedNested(Box::new(RepeatedNestedField { get, get_mut })),
        }
    }

    /// A field whose type fully overrides coercion via [`PropertyConverter`].
    pub fn convert<T: PropertyConverter + 'static>(
        field_name: &'static str,
        tag: &'static str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self {
        Self {
            field_name,
            tag,
            access: Access::Convert(Box::new(ConvertField { get, get_mut })),
        }
    }

    /// A repeated converter field.
    pub fn repeated_convert<T: PropertyConverter + Default + 'static>(
        field_name: &'static str,
        tag: &'static str,
        get: fn(&R) -> &Vec<T>,
        get_mut: fn(&mut R) -> &mut Vec<T>,
    ) -> Self {
        Self {
            field_name,
            tag,
            access: Access::RepeatedConvert(Box::new(RepeatedConvertField { get, get_mut })),
        }
    }

    /// A string-shaped metadata field. Passing `None` for the setter makes
    /// the field unsettable through `set_meta`.
    pub fn meta_str(
        field_name: &'static str,
        tag: &'static str,
        get: fn(&R) -> &str,
        set: Option<fn(&mut R, String)>,
    ) -> Self {
        Self {
            field_name,
            tag,
            access: Access::Meta(MetaAccess::Str { get, set }),
        }
    }

    /// An integer-shaped metadata field.
    pub fn meta_i64(
        field_name: &'static str,
        tag: &'static str,
        get: fn(&R) -> i64,
        set: Option<fn(&mut R, i64)>,
    ) -> Self {
        Self {
            field_name,
            tag,
            access: Access::Meta(MetaAccess::Int { get, set }),
        }
    }

    /// A toggle-shaped metadata field; reads and writes surface as booleans.
    pub fn meta_toggle(
        field_name: &'static str,
        tag: &'static str,
        get: fn(&R) -> Toggle,
        set: Option<fn(&mut R, Toggle)>,
    ) -> Self {
        Self {
            field_name,
            tag,
            access: Access::Meta(MetaAccess::Toggle { get, set }),
        }
    }
}

pub(crate) enum Access<R> {
    Plain(Box<dyn PlainAccess<R>>),
    Repeated(Box<dyn RepeatedAccess<R>>),
    Nested(Box<dyn NestedAccess<R>>),
    RepeatedNested(Box<dyn NestedAccess<R>>),
    Convert(Box<dyn ConvertAccess<R>>),
    RepeatedConvert(Box<dyn RepeatedConvertAccess<R>>),
    Meta(MetaAccess<R>),
}

/// Declared shape of a metadata field, for default parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MetaShape {
    Str,
    Int,
    Toggle,
}

pub(crate) enum MetaAccess<R> {
    Str {
        get: fn(&R) -> &str,
        set: Option<fn(&mut R, String)>,
    },
    Int {
        get: fn(&R) -> i64,
        set: Option<fn(&mut R, i64)>,
    },
    Toggle {
        get: fn(&R) -> Toggle,
        set: Option<fn(&mut R, Toggle)>,
    },
}

impl<R> MetaAccess<R> {
    pub(crate) fn shape(&self) -> MetaShape {
        match self {
            MetaAccess::Str { .. } => MetaShape::Str,
            MetaAccess::Int { .. } => MetaShape::Int,
            MetaAccess::Toggle { .. } => MetaShape::Toggle,
        }
    }

    pub(crate) fn settable(&self) -> bool {
        match self {
            MetaAccess::Str { set, .. } => set.is_some(),
            MetaAccess::Int { set, .. } => set.is_some(),
            MetaAccess::Toggle { set, .. } => set.is_some(),
        }
    }
}

pub(crate) trait PlainAccess<R>: Send + Sync {
    fn get(&self, rec: &R) -> PropertyValue;
    fn set(&self, rec: &mut R, value: &PropertyValue) -> Result<(), String>;
}

pub(crate) trait RepeatedAccess<R>: Send + Sync {
    fn len(&self, rec: &R) -> usize;
    fn get(&self, rec: &R, index: usize) -> PropertyValue;
    fn set(&self, rec: &mut R, index: usize, value: &PropertyValue) -> Result<(), String>;
}

pub(crate) trait ConvertAccess<R>: Send + Sync {
    fn to_property(&self, rec: &R) -> anyhow::Result<Property>;
    fn from_property(&self, rec: &mut R, prop: &Property) -> anyhow::Result<()>;
}

pub(crate) trait RepeatedConvertAccess<R>: Send + Sync {
    fn len(&self, rec: &R) -> usize;
    fn to_property_at(&self, rec: &R, index: usize) -> anyhow::Result<Property>;
    fn from_property_at(&self, rec: &mut R, index: usize, prop: &Property) -> anyhow::Result<()>;
}

/// Access into a nested record field. Schema construction uses
/// `nested_info` to flatten the nested namespace; save/load descend through
/// the nested schema at run time.
pub(crate) trait NestedAccess<R>: Send + Sync {
    fn nested_info(&self, slots: &mut Slots) -> Result<NestedInfo, BuildFailure>;

    fn save(
        &self,
        mapper: &PropertyMapper,
        rec: &R,
        out: &mut PropertyMap,
        prefix: &str,
        setting: IndexSetting,
        indexed: &mut usize,
    ) -> Result<(), SaveError>;

    fn load(
        &self,
        mapper: &PropertyMapper,
        rec: &mut R,
        index: usize,
        rest: &str,
        prop: &Property,
        require_repeated: bool,
    ) -> Result<(), String>;
}

struct PlainField<R, T> {
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R, T: PropertyPrimitive> PlainAccess<R> for PlainField<R, T> {
    fn get(&self, rec: &R) -> PropertyValue {
        (self.get)(rec).to_value()
    }

    fn set(&self, rec: &mut R, value: &PropertyValue) -> Result<(), String> {
        match T::from_value(value)? {
            Coerced::Set(v) => *(self.get_mut)(rec) = v,
            Coerced::Keep => {}
        }
        Ok(())
    }
}

struct RepeatedField<R, T> {
    get: fn(&R) -> &Vec<T>,
    get_mut: fn(&mut R) -> &mut Vec<T>,
}

impl<R, T: PropertyPrimitive + Default> RepeatedAccess<R> for RepeatedField<R, T> {
    fn len(&self, rec: &R) -> usize {
        (self.get)(rec).len()
    }

    fn get(&self, rec: &R, index: usize) -> PropertyValue {
        (self.get)(rec)[index].to_value()
    }

    fn set(&self, rec: &mut R, index: usize, value: &PropertyValue) -> Result<(), String> {
        let coerced = match T::from_value(value)? {
            Coerced::Set(v) => v,
            Coerced::Keep => return Ok(()),
        };
        let elems = (self.get_mut)(rec);
        while elems.len() <= index {
            elems.push(T::default());
        }
        elems[index] = coerced;
        Ok(())
    }
}

struct ConvertField<R, T> {
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R, T: PropertyConverter> ConvertAccess<R> for ConvertField<R, T> {
    fn to_property(&self, rec: &R) -> anyhow::Result<Property> {
        (self.get)(rec).to_property()
    }

    fn from_property(&self, rec: &mut R, prop: &Property) -> anyhow::Result<()> {
        (self.get_mut)(rec).from_property(prop)
    }
}

struct RepeatedConvertField<R, T> {
    get: fn(&R) -> &Vec<T>,
    get_mut: fn(&mut R) -> &mut Vec<T>,
}

impl<R, T: PropertyConverter + Default> RepeatedConvertAccess<R> for RepeatedConvertField<R, T> {
    fn len(&self, rec: &R) -> usize {
        (self.get)(rec).len()
    }

    fn to_property_at(&self, rec: &R, index: usize) -> anyhow::Result<Property> {
        (self.get)(rec)[index].to_property()
    }

    fn from_property_at(&self, rec: &mut R, index: usize, prop: &Property) -> anyhow::Result<()> {
        let elems = (self.get_mut)(rec);
        while elems.len() <= index {
            elems.push(T::default());
        }
        elems[index].from_property(prop)
    }
}

struct NestedField<R, S> {
    get: fn(&R) -> &S,
    get_mut: fn(&mut R) -> &mut S,
}

impl<R: Record, S: Record> NestedAccess<R> for NestedField<R, S> {
    fn nested_info(&self, slots: &mut Slots) -> Result<NestedInfo, BuildFailure> {
        let nested = schema::get_or_build::<S>(slots)?;
        Ok(nested.info())
    }

    fn save(
        &self,
        mapper: &PropertyMapper,
        rec: &R,
        out: &mut PropertyMap,
        prefix: &str,
        setting: IndexSetting,
        indexed: &mut usize,
    ) -> Result<(), SaveError> {
        let nested = mapper.schema::<S>();
        save::save_fields(mapper, &nested, (self.get)(rec), out, prefix, setting, indexed)
    }

    fn load(
        &self,
        mapper: &PropertyMapper,
        rec: &mut R,
        index: usize,
        rest: &str,
        prop: &Property,
        require_repeated: bool,
    ) -> Result<(), String> {
        let nested = mapper.schema::<S>();
        load::load_one(
            mapper,
            &nested,
            (self.get_mut)(rec),
            rest,
            index,
            prop,
            require_repeated,
        )
    }
}

struct RepeatedNestedField<R, S> {
    get: fn(&R) -> &Vec<S>,
    get_mut: fn(&mut R) -> &mut Vec<S>,
}

impl<R: Record, S: Record> NestedAccess<R> for RepeatedNestedField<R, S> {
    fn nested_info(&self, slots: &mut Slots) -> Result<NestedInfo, BuildFailure> {
        let nested = schema::get_or_build::<S>(slots)?;
        Ok(nested.info())
    }

    fn save(
        &self,
        mapper: &PropertyMapper,
        rec: &R,
        out: &mut PropertyMap,
        prefix: &str,
        setting: IndexSetting,
        indexed: &mut usize,
    ) -> Result<(), SaveError> {
        let nested = mapper.schema::<S>();
        for elem in (self.get)(rec) {
            save::save_fields(mapper, &nested, elem, out, prefix, setting, indexed)?;
        }
        Ok(())
    }

    fn load(
        &self,
        mapper: &PropertyMapper,
        rec: &mut R,
        index: usize,
        rest: &str,
        prop: &Property,
        _require_repeated: bool,
    ) -> Result<(), String> {
        let nested = mapper.schema::<S>();
        let elems = (self.get_mut)(rec);
        // The n-th occurrence of a flattened name addresses element n.
        while elems.len() <= index {
            elems.push(S::default());
        }
        load::load_one(mapper, &nested, &mut elems[index], rest, index, prop, false)
    }
}
