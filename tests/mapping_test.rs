//! End-to-end tests for the record <-> property-map engine: schema
//! resolution, save/load symmetry, nested flattening, metadata fields, and
//! the failure paths callers are expected to observe.

use propstore::prelude::*;
use propstore::MAX_INDEXED_PROPERTIES;

#[derive(Default)]
struct Employee {
    key: Option<Key>,
    name: String,
    badge: i64,
    secret: String,
    notes: String,
    tags: Vec<String>,
}

impl Record for Employee {
    fn record_name() -> &'static str {
        "Employee"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::plain("key", "", |r| &r.key, |r| &mut r.key),
            FieldSpec::plain("name", "", |r| &r.name, |r| &mut r.name),
            FieldSpec::plain("badge", "badge_number", |r| &r.badge, |r| &mut r.badge),
            FieldSpec::plain("secret", "-", |r| &r.secret, |r| &mut r.secret),
            FieldSpec::plain("notes", "notes,noindex", |r| &r.notes, |r| &mut r.notes),
            FieldSpec::repeated("tags", "", |r| &r.tags, |r| &mut r.tags),
        ]
    }
}

fn sample_employee() -> Employee {
    Employee {
        key: Some(Key::new("emp:1")),
        name: "June".to_string(),
        badge: 42,
        secret: "do not persist".to_string(),
        notes: "long free text".to_string(),
        tags: vec!["eng".to_string(), "oncall".to_string(), "berlin".to_string()],
    }
}

#[test]
fn test_save_load_roundtrip() {
    let mapper = PropertyMapper::new();
    let props = mapper.save(&sample_employee(), false).unwrap();

    assert!(props.get("secret").is_none());
    assert_eq!(
        props.get("badge_number").unwrap()[0].value(),
        &PropertyValue::Int(42)
    );
    assert_eq!(
        props.get("notes").unwrap()[0].index_setting(),
        IndexSetting::NoIndex
    );

    let mut loaded = Employee::default();
    mapper.load(&mut loaded, &props).unwrap();
    assert_eq!(loaded.key, Some(Key::new("emp:1")));
    assert_eq!(loaded.name, "June");
    assert_eq!(loaded.badge, 42);
    assert_eq!(loaded.secret, "");
    assert_eq!(loaded.tags, vec!["eng", "oncall", "berlin"]);
}

#[test]
fn test_repeated_field_preserves_element_order() {
    let mapper = PropertyMapper::new();
    let props = mapper.save(&sample_employee(), false).unwrap();
    let tags = props.get("tags").unwrap();
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[0].value(), &PropertyValue::Str("eng".to_string()));
    assert_eq!(tags[2].value(), &PropertyValue::Str("berlin".to_string()));
}

#[test]
fn test_null_leaves_key_field_untouched() {
    let mapper = PropertyMapper::new();
    let mut props = PropertyMap::new();
    props.append("key", Property::indexed(PropertyValue::Null));
    props.append("name", Property::indexed(PropertyValue::Str("x".into())));

    let mut target = Employee {
        key: Some(Key::new("emp:9")),
        ..Employee::default()
    };
    mapper.load(&mut target, &props).unwrap();
    assert_eq!(target.key, Some(Key::new("emp:9")));
    assert_eq!(target.name, "x");
}

#[test]
fn test_partial_load_reports_mismatches_and_keeps_good_fields() {
    let mapper = PropertyMapper::new();
    let mut props = mapper.save(&sample_employee(), false).unwrap();
    props.insert(
        "badge_number",
        vec![Property::indexed(PropertyValue::Str("not a number".into()))],
    );
    props.append("unmapped", Property::indexed(PropertyValue::Int(7)));

    let mut loaded = Employee::default();
    let err = mapper.load(&mut loaded, &props).unwrap_err();
    let mismatches = err.mismatches();
    assert_eq!(mismatches.len(), 2);
    assert!(mismatches.iter().any(|m| m.property == "badge_number"
        && m.reason.contains("type mismatch")));
    assert!(mismatches
        .iter()
        .any(|m| m.property == "unmapped" && m.reason == "no such field"));
    // The compatible properties still landed.
    assert_eq!(loaded.name, "June");
    assert_eq!(loaded.tags.len(), 3);
}

#[test]
fn test_multiple_values_require_a_repeated_field() {
    let mapper = PropertyMapper::new();
    let mut props = PropertyMap::new();
    props.append("name", Property::indexed(PropertyValue::Str("a".into())));
    props.append("name", Property::indexed(PropertyValue::Str("b".into())));

    let mut loaded = Employee::default();
    let err = mapper.load(&mut loaded, &props).unwrap_err();
    assert_eq!(err.mismatches().len(), 2);
    assert!(err.mismatches()[0]
        .reason
        .contains("requires a repeated field"));
}

// Nested records flatten into dotted names.

#[derive(Default)]
struct Address {
    street: String,
    zip: i64,
}

impl Record for Address {
    fn record_name() -> &'static str {
        "Address"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::plain("street", "", |r| &r.street, |r| &mut r.street),
            FieldSpec::plain("zip", "", |r| &r.zip, |r| &mut r.zip),
        ]
    }
}

#[derive(Default)]
struct Company {
    name: String,
    hq: Address,
    sites: Vec<Address>,
}

impl Record for Company {
    fn record_name() -> &'static str {
        "Company"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::plain("name", "", |r| &r.name, |r| &mut r.name),
            FieldSpec::nested("hq", "hq,noindex", |r| &r.hq, |r| &mut r.hq),
            FieldSpec::repeated_nested("sites", "", |r| &r.sites, |r| &mut r.sites),
        ]
    }
}

#[test]
fn test_nested_records_flatten_and_roundtrip() {
    let mapper = PropertyMapper::new();
    let company = Company {
        name: "Acme".to_string(),
        hq: Address {
            street: "Main St 1".to_string(),
            zip: 10115,
        },
        sites: vec![
            Address {
                street: "North Rd 2".to_string(),
                zip: 20095,
            },
            Address {
                street: "South Ave 3".to_string(),
                zip: 80331,
            },
        ],
    };

    let props = mapper.save(&company, false).unwrap();
    assert_eq!(
        props.get("hq.street").unwrap()[0].value(),
        &PropertyValue::Str("Main St 1".to_string())
    );
    // The n-th value of a flattened repeated-nested name addresses element n.
    let streets = props.get("sites.street").unwrap();
    assert_eq!(streets.len(), 2);
    assert_eq!(
        streets[1].value(),
        &PropertyValue::Str("South Ave 3".to_string())
    );

    let mut loaded = Company::default();
    mapper.load(&mut loaded, &props).unwrap();
    assert_eq!(loaded.hq.zip, 10115);
    assert_eq!(loaded.sites.len(), 2);
    assert_eq!(loaded.sites[0].street, "North Rd 2");
    assert_eq!(loaded.sites[1].zip, 80331);
}

#[test]
fn test_noindex_is_inherited_through_nesting() {
    let mapper = PropertyMapper::new();
    let props = mapper.save(&Company::default(), false).unwrap();
    assert_eq!(
        props.get("hq.street").unwrap()[0].index_setting(),
        IndexSetting::NoIndex
    );
    assert_eq!(
        props.get("hq.zip").unwrap()[0].index_setting(),
        IndexSetting::NoIndex
    );
    assert_eq!(
        props.get("name").unwrap()[0].index_setting(),
        IndexSetting::ShouldIndex
    );
}

// Schema-level failures are permanent and reported on every use.

#[derive(Default)]
struct DupNames {
    a: i64,
    b: i64,
}

impl Record for DupNames {
    fn record_name() -> &'static str {
        "DupNames"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::plain("a", "same", |r| &r.a, |r| &mut r.a),
            FieldSpec::plain("b", "same", |r| &r.b, |r| &mut r.b),
        ]
    }
}

#[test]
fn test_duplicate_property_names_break_the_schema() {
    let mapper = PropertyMapper::new();
    let err = mapper.save(&DupNames::default(), false).unwrap_err();
    assert!(matches!(
        err,
        SaveError::Schema(SchemaError::DuplicatePropertyName { ref name }) if name == "same"
    ));
    // The problem is cached: loading reports the same error.
    let err = mapper
        .load(&mut DupNames::default(), &PropertyMap::new())
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Schema(SchemaError::DuplicatePropertyName { .. })
    ));
}

#[derive(Default)]
struct BadName {
    v: i64,
}

impl Record for BadName {
    fn record_name() -> &'static str {
        "BadName"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![FieldSpec::plain("v", "9lives", |r| &r.v, |r| &mut r.v)]
    }
}

#[test]
fn test_invalid_property_name_breaks_the_schema() {
    let mapper = PropertyMapper::new();
    let err = mapper.save(&BadName::default(), false).unwrap_err();
    assert!(matches!(
        err,
        SaveError::Schema(SchemaError::InvalidPropertyName { .. })
    ));
}

#[derive(Default)]
struct Shadowed {
    literal: String,
    hq: Address,
}

impl Record for Shadowed {
    fn record_name() -> &'static str {
        "Shadowed"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::plain("literal", "hq.street", |r| &r.literal, |r| &mut r.literal),
            FieldSpec::nested("hq", "", |r| &r.hq, |r| &mut r.hq),
        ]
    }
}

#[test]
fn test_flattened_name_collision_is_detected_at_construction() {
    let mapper = PropertyMapper::new();
    let err = mapper.save(&Shadowed::default(), false).unwrap_err();
    assert!(matches!(
        err,
        SaveError::Schema(SchemaError::DuplicatePropertyName { ref name }) if name == "hq.street"
    ));
}

#[derive(Default)]
struct Node {
    label: String,
    children: Vec<Node>,
}

impl Record for Node {
    fn record_name() -> &'static str {
        "Node"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::plain("label", "", |r| &r.label, |r| &mut r.label),
            FieldSpec::repeated_nested("children", "", |r| &r.children, |r| &mut r.children),
        ]
    }
}

#[test]
fn test_recursive_type_is_rejected() {
    let mapper = PropertyMapper::new();
    let err = mapper.save(&Node::default(), false).unwrap_err();
    assert!(matches!(
        err,
        SaveError::Schema(SchemaError::RecursivelyDefined { ref field }) if field == "children"
    ));
}

#[derive(Default)]
struct Inner {
    xs: Vec<i64>,
}

impl Record for Inner {
    fn record_name() -> &'static str {
        "Inner"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![FieldSpec::repeated("xs", "", |r| &r.xs, |r| &mut r.xs)]
    }
}

#[derive(Default)]
struct Outer {
    inners: Vec<Inner>,
}

impl Record for Outer {
    fn record_name() -> &'static str {
        "Outer"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![FieldSpec::repeated_nested(
            "inners",
            "",
            |r| &r.inners,
            |r| &mut r.inners,
        )]
    }
}

#[test]
fn test_repeated_inside_repeated_is_rejected() {
    let mapper = PropertyMapper::new();
    let err = mapper.save(&Outer::default(), false).unwrap_err();
    assert!(matches!(
        err,
        SaveError::Schema(SchemaError::RepeatedFlattening { ref field }) if field == "inners"
    ));
}

// The indexed-property ceiling counts values across the whole record tree.

#[derive(Default)]
struct Wide {
    xs: Vec<i64>,
}

impl Record for Wide {
    fn record_name() -> &'static str {
        "Wide"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![FieldSpec::repeated("xs", "", |r| &r.xs, |r| &mut r.xs)]
    }
}

#[test]
fn test_indexed_property_ceiling() {
    let mapper = PropertyMapper::new();

    let at_limit = Wide {
        xs: vec![0; MAX_INDEXED_PROPERTIES],
    };
    assert!(mapper.save(&at_limit, false).is_ok());

    let over = Wide {
        xs: vec![0; MAX_INDEXED_PROPERTIES + 1],
    };
    let err = mapper.save(&over, false).unwrap_err();
    assert!(matches!(
        err,
        SaveError::TooManyIndexedProperties { limit } if limit == MAX_INDEXED_PROPERTIES
    ));
}

#[test]
fn test_unindexed_values_do_not_count_toward_the_ceiling() {
    #[derive(Default)]
    struct WideUnindexed {
        xs: Vec<i64>,
    }

    impl Record for WideUnindexed {
        fn record_name() -> &'static str {
            "WideUnindexed"
        }

        fn fields() -> Vec<FieldSpec<Self>> {
            vec![FieldSpec::repeated("xs", "xs,noindex", |r| &r.xs, |r| &mut r.xs)]
        }
    }

    let mapper = PropertyMapper::new();
    let rec = WideUnindexed {
        xs: vec![0; MAX_INDEXED_PROPERTIES + 10],
    };
    assert!(mapper.save(&rec, false).is_ok());
}

// Metadata fields.

#[derive(Default)]
struct Versioned {
    id: String,
    version: i64,
    archived: Toggle,
    body: String,
}

impl Record for Versioned {
    fn record_name() -> &'static str {
        "Versioned"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::meta_str("id", "$id,unset-id", |r| &r.id, Some(|r, v| r.id = v)),
            FieldSpec::meta_i64("version", "$version,1", |r| r.version, None),
            FieldSpec::meta_toggle(
                "archived",
                "$archived,off",
                |r| r.archived,
                Some(|r, v| r.archived = v),
            ),
            FieldSpec::plain("body", "", |r| &r.body, |r| &mut r.body),
        ]
    }
}

#[test]
fn test_meta_defaults_and_explicit_values() {
    let mapper = PropertyMapper::new();
    let mut rec = Versioned::default();

    assert_eq!(
        mapper.get_meta(&rec, "id").unwrap(),
        MetaValue::Str("unset-id".to_string())
    );
    assert_eq!(mapper.get_meta(&rec, "version").unwrap(), MetaValue::Int(1));
    assert_eq!(
        mapper.get_meta(&rec, "archived").unwrap(),
        MetaValue::Bool(false)
    );

    mapper
        .set_meta(&mut rec, "id", MetaValue::Str("doc-7".to_string()))
        .unwrap();
    mapper
        .set_meta(&mut rec, "archived", MetaValue::Bool(true))
        .unwrap();
    assert_eq!(rec.archived, Toggle::On);
    assert_eq!(
        mapper.get_meta(&rec, "id").unwrap(),
        MetaValue::Str("doc-7".to_string())
    );
    assert_eq!(
        mapper.get_meta(&rec, "archived").unwrap(),
        MetaValue::Bool(true)
    );
}

#[test]
fn test_unsettable_meta_always_reports_its_default() {
    let mapper = PropertyMapper::new();
    // `version` has no setter; a stray in-memory value must not leak out.
    let rec = Versioned {
        version: 5,
        ..Versioned::default()
    };
    assert_eq!(mapper.get_meta(&rec, "version").unwrap(), MetaValue::Int(1));
    let props = mapper.save(&rec, true).unwrap();
    assert_eq!(
        props.get("$version").unwrap()[0].value(),
        &PropertyValue::Int(1)
    );
}

#[test]
fn test_meta_error_paths() {
    let mapper = PropertyMapper::new();
    let mut rec = Versioned::default();

    assert!(matches!(
        mapper.get_meta(&rec, "missing"),
        Err(MetaError::Unset)
    ));
    assert!(matches!(
        mapper.set_meta(&mut rec, "version", MetaValue::Int(2)),
        Err(MetaError::Unsettable { .. })
    ));
    assert!(matches!(
        mapper.set_meta(&mut rec, "id", MetaValue::Int(3)),
        Err(MetaError::TypeMismatch { .. })
    ));
}

#[test]
fn test_save_with_meta_emits_unindexed_meta_properties() {
    let mapper = PropertyMapper::new();
    let rec = Versioned {
        id: "doc-1".to_string(),
        body: "hello".to_string(),
        ..Versioned::default()
    };

    let plain = mapper.save(&rec, false).unwrap();
    assert!(plain.get("$id").is_none());

    let with_meta = mapper.save(&rec, true).unwrap();
    let id = &with_meta.get("$id").unwrap()[0];
    assert_eq!(id.value(), &PropertyValue::Str("doc-1".to_string()));
    assert_eq!(id.index_setting(), IndexSetting::NoIndex);
    assert_eq!(
        with_meta.get("$version").unwrap()[0].value(),
        &PropertyValue::Int(1)
    );

    // Metadata properties are ignored on load.
    let mut loaded = Versioned::default();
    mapper.load(&mut loaded, &with_meta).unwrap();
    assert_eq!(loaded.id, "");
    assert_eq!(loaded.body, "hello");
}

#[derive(Default)]
struct BadMeta {
    flag: Toggle,
}

impl Record for BadMeta {
    fn record_name() -> &'static str {
        "BadMeta"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![FieldSpec::meta_toggle(
            "flag",
            "$flag,sometimes",
            |r| r.flag,
            None,
        )]
    }
}

#[derive(Default)]
struct DupMeta {
    a: String,
    b: String,
}

impl Record for DupMeta {
    fn record_name() -> &'static str {
        "DupMeta"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::meta_str("a", "$id", |r| &r.a, None),
            FieldSpec::meta_str("b", "$id", |r| &r.b, None),
        ]
    }
}

#[test]
fn test_duplicate_meta_keys_break_the_schema() {
    let mapper = PropertyMapper::new();
    let err = mapper.get_meta(&DupMeta::default(), "id").unwrap_err();
    assert!(matches!(
        err,
        MetaError::Schema(SchemaError::DuplicateMetaField { ref key }) if key == "id"
    ));
}

#[test]
fn test_toggle_meta_requires_explicit_default() {
    let mapper = PropertyMapper::new();
    let err = mapper.get_meta(&BadMeta::default(), "flag").unwrap_err();
    assert!(matches!(
        err,
        MetaError::Schema(SchemaError::BadMetaDefault { ref key, .. }) if key == "flag"
    ));
}

// Converter fields fully override the default coercion.

#[derive(Default)]
struct Celsius(f64);

impl PropertyConverter for Celsius {
    fn to_property(&self) -> anyhow::Result<Property> {
        if self.0.is_nan() {
            anyhow::bail!("temperature is not a number");
        }
        Ok(Property::unindexed(PropertyValue::Str(format!(
            "{:.1}C",
            self.0
        ))))
    }

    fn from_property(&mut self, prop: &Property) -> anyhow::Result<()> {
        match prop.value() {
            PropertyValue::Str(s) => {
                let digits = s
                    .strip_suffix('C')
                    .ok_or_else(|| anyhow::anyhow!("missing unit suffix: {s}"))?;
                self.0 = digits.parse()?;
                Ok(())
            }
            other => anyhow::bail!("expected a temperature string, got {}", other.kind()),
        }
    }
}

#[derive(Default)]
struct Reading {
    sensor: String,
    temp: Celsius,
}

impl Record for Reading {
    fn record_name() -> &'static str {
        "Reading"
    }

    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::plain("sensor", "", |r| &r.sensor, |r| &mut r.sensor),
            FieldSpec::convert("temp", "", |r| &r.temp, |r| &mut r.temp),
        ]
    }
}

#[test]
fn test_converter_overrides_default_coercion() {
    let mapper = PropertyMapper::new();
    let rec = Reading {
        sensor: "roof".to_string(),
        temp: Celsius(21.5),
    };

    let props = mapper.save(&rec, false).unwrap();
    let temp = &props.get("temp").unwrap()[0];
    assert_eq!(temp.value(), &PropertyValue::Str("21.5C".to_string()));
    // The converter's own index setting is kept.
    assert_eq!(temp.index_setting(), IndexSetting::NoIndex);

    let mut loaded = Reading::default();
    mapper.load(&mut loaded, &props).unwrap();
    assert_eq!(loaded.temp.0, 21.5);
}

#[test]
fn test_converter_failure_aborts_save_but_is_a_mismatch_on_load() {
    let mapper = PropertyMapper::new();

    let bad = Reading {
        sensor: "roof".to_string(),
        temp: Celsius(f64::NAN),
    };
    let err = mapper.save(&bad, false).unwrap_err();
    assert!(matches!(err, SaveError::Conversion { ref field, .. } if field == "temp"));

    let mut props = PropertyMap::new();
    props.append("sensor", Property::indexed(PropertyValue::Str("s".into())));
    props.append("temp", Property::indexed(PropertyValue::Int(3)));
    let mut loaded = Reading::default();
    let err = mapper.load(&mut loaded, &props).unwrap_err();
    assert_eq!(err.mismatches().len(), 1);
    assert_eq!(err.mismatches()[0].property, "temp");
    // The sibling field still loaded.
    assert_eq!(loaded.sensor, "s");
}

#[test]
fn test_schema_cache_is_safe_under_concurrency() {
    use std::sync::Arc;

    let mapper = Arc::new(PropertyMapper::new());
    let baseline = mapper.save(&sample_employee(), false).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let mapper = Arc::clone(&mapper);
            std::thread::spawn(move || mapper.save(&sample_employee(), false).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), baseline);
    }
}
