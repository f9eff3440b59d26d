use packspec_core::error::{ShapeError, SpecError, ValueError};
use packspec_core::params::{
    specs_from_param, ClassPropertySpecParams, DatapointSpecParams, DatasourceSpecParams,
    GraphSpecParams,
};
use packspec_core::raw::RawValue;
use packspec_core::types::RrdType;

fn raw(source: &str) -> RawValue {
    let yaml: serde_yaml::Value = serde_yaml::from_str(source).unwrap();
    RawValue::from_yaml(yaml).unwrap()
}

#[test]
fn test_defaults_merge_explicit_wins() {
    let param = raw(r#"
DEFAULTS:
  cycletime: 500
one: {}
two:
  cycletime: 60
"#);
    let specs =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap();

    assert_eq!(specs["one"].cycletime, Some(500));
    assert_eq!(specs["two"].cycletime, Some(60));
}

#[test]
fn test_defaults_entry_never_materialized() {
    let param = raw(r#"
DEFAULTS:
  cycletime: 500
one: {}
"#);
    let specs =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap();

    assert_eq!(specs.len(), 1);
    assert!(!specs.contains_key("DEFAULTS"));
}

#[test]
fn test_defaults_flow_into_extra_params() {
    let param = raw(r#"
DEFAULTS:
  property_int: 100
plain: {}
override:
  property_int: 10
"#);
    let specs =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap();

    assert_eq!(
        specs["plain"].extra_params.get("property_int"),
        Some(&RawValue::Number(100.0))
    );
    assert_eq!(
        specs["override"].extra_params.get("property_int"),
        Some(&RawValue::Number(10.0))
    );
}

#[test]
fn test_defaults_entry_must_be_mapping() {
    let param = raw(r#"
DEFAULTS: 5
one: {}
"#);
    let err =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap_err();
    match err {
        SpecError::Shape(ShapeError::DefaultsShape { field, .. }) => {
            assert_eq!(field, "datasources");
        }
        other => panic!("Expected DefaultsShape error, but got {:?}", other),
    }
}

#[test]
fn test_sequence_of_names() {
    let param = raw(r#"
- alpha
- beta
"#);
    let specs =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap();

    assert_eq!(specs.len(), 2);
    // Built-in defaults apply to each generated entry.
    assert_eq!(specs["alpha"].type_.as_deref(), Some("Datasource"));
    assert_eq!(specs["beta"].cycletime, Some(300));
}

#[test]
fn test_sequence_of_mappings_with_name_field() {
    let param = raw(r#"
- name: alpha
  cycletime: 60
"#);
    let specs =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap();

    assert_eq!(specs["alpha"].cycletime, Some(60));
}

#[test]
fn test_sequence_unnamed_item_fails() {
    let param = raw(r#"
- alpha
- 42
"#);
    let err =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap_err();
    match err {
        SpecError::Shape(ShapeError::UnnamedItem { field, index, .. }) => {
            assert_eq!(field, "datasources");
            assert_eq!(index, 1);
        }
        other => panic!("Expected UnnamedItem error, but got {:?}", other),
    }
}

#[test]
fn test_sequence_mapping_without_name_fails() {
    let param = raw(r#"
- cycletime: 60
"#);
    let err =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap_err();
    assert!(matches!(
        err,
        SpecError::Shape(ShapeError::UnnamedItem { index: 0, .. })
    ));
}

#[test]
fn test_bare_string_collection_shorthand() {
    let param = RawValue::from("alpha");
    let specs =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap();

    assert_eq!(specs.len(), 1);
    assert!(specs.contains_key("alpha"));
}

#[test]
fn test_collection_rejects_other_scalars() {
    let param = RawValue::Number(42.0);
    let err =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap_err();
    match err {
        SpecError::Shape(ShapeError::CollectionShape { field, found }) => {
            assert_eq!(field, "datasources");
            assert_eq!(found, "number");
        }
        other => panic!("Expected CollectionShape error, but got {:?}", other),
    }
}

#[test]
fn test_absent_collection_is_empty() {
    let specs = specs_from_param::<DatasourceSpecParams>(None, "datasources", false).unwrap();
    assert!(specs.is_empty());
}

#[test]
fn test_leave_defaults_keeps_fields_unset() {
    let param = raw(r#"
some_prop:
  label: Some Property
"#);
    let sparse =
        specs_from_param::<ClassPropertySpecParams>(Some(&param), "properties", true).unwrap();
    assert_eq!(sparse["some_prop"].type_, None);
    assert_eq!(sparse["some_prop"].order, None);

    let filled =
        specs_from_param::<ClassPropertySpecParams>(Some(&param), "properties", false).unwrap();
    assert_eq!(filled["some_prop"].type_.as_deref(), Some("string"));
    assert_eq!(filled["some_prop"].order, Some(100));
}

#[test]
fn test_class_property_scalar_shorthand_is_type() {
    let param = raw(r#"
count: int
"#);
    let specs =
        specs_from_param::<ClassPropertySpecParams>(Some(&param), "properties", true).unwrap();
    assert_eq!(specs["count"].type_.as_deref(), Some("int"));
}

#[test]
fn test_datapoint_scalar_shorthand() {
    let param = raw(r#"
reading: GAUGE
"#);
    let specs =
        specs_from_param::<DatapointSpecParams>(Some(&param), "datapoints", false).unwrap();
    assert_eq!(specs["reading"].rrdtype, Some(RrdType::Gauge));
}

#[test]
fn test_datapoint_scalar_shorthand_with_bounds() {
    let param = raw(r#"
reading: DERIVE_MIN_0_MAX_100
"#);
    let specs =
        specs_from_param::<DatapointSpecParams>(Some(&param), "datapoints", false).unwrap();
    assert_eq!(specs["reading"].rrdtype, Some(RrdType::Derive));
    assert_eq!(specs["reading"].rrdmin.as_deref(), Some("0"));
    assert_eq!(specs["reading"].rrdmax.as_deref(), Some("100"));
}

#[test]
fn test_datapoint_shorthand_invalid_rrdtype() {
    let param = raw(r#"
reading: BOGUS
"#);
    let err =
        specs_from_param::<DatapointSpecParams>(Some(&param), "datapoints", false).unwrap_err();
    assert!(matches!(
        err,
        SpecError::Value(ValueError::InvalidDatapointShorthand { .. })
    ));
}

#[test]
fn test_datapoint_shorthand_invalid_suffix() {
    let param = raw(r#"
reading: GAUGE_FOO
"#);
    let err =
        specs_from_param::<DatapointSpecParams>(Some(&param), "datapoints", false).unwrap_err();
    assert!(matches!(
        err,
        SpecError::Value(ValueError::InvalidDatapointShorthand { .. })
    ));
}

#[test]
fn test_datapoint_defaults_merge_with_scalar_shorthand() {
    // A scalar item body expands to fields first, then DEFAULTS fill gaps.
    let param = raw(r#"
DEFAULTS:
  rrdmin: 5
reading: GAUGE
"#);
    let specs =
        specs_from_param::<DatapointSpecParams>(Some(&param), "datapoints", false).unwrap();
    assert_eq!(specs["reading"].rrdtype, Some(RrdType::Gauge));
    assert_eq!(specs["reading"].rrdmin.as_deref(), Some("5"));
}

#[test]
fn test_unknown_field_rejected_without_extra_params() {
    let param = raw(r#"
load:
  bogus: 1
"#);
    let err = specs_from_param::<GraphSpecParams>(Some(&param), "graphs", false).unwrap_err();
    match err {
        SpecError::Shape(ShapeError::UnknownField {
            type_name,
            name,
            field,
        }) => {
            assert_eq!(type_name, "graph");
            assert_eq!(name, "load");
            assert_eq!(field, "bogus");
        }
        other => panic!("Expected UnknownField error, but got {:?}", other),
    }
}

#[test]
fn test_field_with_wrong_type_fails() {
    let param = raw(r#"
one:
  enabled: "yes"
"#);
    let err =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap_err();
    match err {
        SpecError::Shape(ShapeError::FieldShape {
            field,
            expected,
            found,
            ..
        }) => {
            assert_eq!(field, "enabled");
            assert_eq!(expected, "a boolean");
            assert_eq!(found, "string");
        }
        other => panic!("Expected FieldShape error, but got {:?}", other),
    }
}

#[test]
fn test_null_item_body_means_empty() {
    let param = raw(r#"
one:
two: {}
"#);
    let specs =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs["one"].type_.as_deref(), Some("Datasource"));
}

#[test]
fn test_entry_order_is_preserved() {
    let param = raw(r#"
zeta: {}
alpha: {}
mike: {}
"#);
    let specs =
        specs_from_param::<DatasourceSpecParams>(Some(&param), "datasources", false).unwrap();
    let names: Vec<&String> = specs.keys().collect();
    assert_eq!(names, ["zeta", "alpha", "mike"]);
}
