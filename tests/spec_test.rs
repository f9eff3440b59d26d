use packspec_core::analyze;
use packspec_core::error::{CrossRefError, SpecError, ValueError};
use packspec_core::params::{specs_from_param, GraphPointSpecParams, ThresholdLegend};
use packspec_core::raw::RawValue;
use packspec_core::spec::{GraphPointSpec, GraphPointType};
use packspec_core::target::{ModelRoot, PropertyValue};
use packspec_core::types::GRAPH_COLORS;

fn raw(source: &str) -> RawValue {
    let yaml: serde_yaml::Value = serde_yaml::from_str(source).unwrap();
    RawValue::from_yaml(yaml).unwrap()
}

/// Builds a single resolved graph point from a YAML body.
fn graphpoint(body: &str) -> GraphPointSpec {
    let source = format!("gp:\n{}", body);
    let params =
        specs_from_param::<GraphPointSpecParams>(Some(&raw(&source)), "graphpoints", false)
            .unwrap();
    GraphPointSpec::from_params(&params["gp"])
}

fn graphpoint_err(body: &str) -> SpecError {
    let source = format!("gp:\n{}", body);
    specs_from_param::<GraphPointSpecParams>(Some(&raw(&source)), "graphpoints", false)
        .unwrap_err()
}

#[test]
fn test_dpname_shorthand_expansion() {
    let gp = graphpoint("  dpName: ifInOctets");
    assert_eq!(gp.dp_name.as_deref(), Some("ifInOctets_ifInOctets"));
}

#[test]
fn test_dpname_with_separator_passes_through() {
    let gp = graphpoint("  dpName: snmp_ifInOctets");
    assert_eq!(gp.dp_name.as_deref(), Some("snmp_ifInOctets"));
}

#[test]
fn test_colorindex_selects_palette_modulo() {
    let gp = graphpoint("  colorindex: 17");
    let expected = GRAPH_COLORS[17 % GRAPH_COLORS.len()];
    assert_eq!(gp.color.as_ref().unwrap().as_str(), expected);
}

#[test]
fn test_colorindex_wins_over_color() {
    let gp = graphpoint("  color: '#ff0000'\n  colorindex: 0");
    assert_eq!(gp.color.as_ref().unwrap().as_str(), GRAPH_COLORS[0]);
}

#[test]
fn test_colorindex_accepts_numeric_string() {
    let gp = graphpoint("  colorindex: '3'");
    assert_eq!(gp.color.as_ref().unwrap().as_str(), GRAPH_COLORS[3]);
}

#[test]
fn test_colorindex_non_numeric_fails() {
    let err = graphpoint_err("  colorindex: abc");
    assert!(matches!(
        err,
        SpecError::Value(ValueError::ColorIndexNotNumeric { .. })
    ));
}

#[test]
fn test_color_invalid_hex_fails() {
    let err = graphpoint_err("  color: zzz123");
    assert!(matches!(
        err,
        SpecError::Value(ValueError::InvalidColor { .. })
    ));
}

#[test]
fn test_threshold_legends_bare_string() {
    let gp = graphpoint("  thresholdLegends: HighUsage");
    assert_eq!(gp.threshold_legends.len(), 1);
    assert_eq!(
        gp.threshold_legends["HighUsage"],
        ThresholdLegend {
            legend: None,
            color: None
        }
    );
}

#[test]
fn test_threshold_legends_partial_entry_normalized() {
    let gp = graphpoint("  thresholdLegends:\n    HighUsage:\n      legend: busy");
    assert_eq!(
        gp.threshold_legends["HighUsage"],
        ThresholdLegend {
            legend: Some("busy".to_string()),
            color: None
        }
    );
}

#[test]
fn test_threshold_legends_non_mapping_entry_defaults() {
    let gp = graphpoint("  thresholdLegends:\n    HighUsage: yes-please");
    assert_eq!(
        gp.threshold_legends["HighUsage"],
        ThresholdLegend {
            legend: None,
            color: None
        }
    );
}

#[test]
fn test_threshold_legends_invalid_shape_fails() {
    let err = graphpoint_err("  thresholdLegends: 42");
    assert!(matches!(
        err,
        SpecError::Value(ValueError::InvalidThresholdLegends { .. })
    ));
}

#[test]
fn test_line_type_case_normalized() {
    let gp = graphpoint("  lineType: area");
    assert_eq!(
        gp.extra_params.get("lineType"),
        Some(&RawValue::String("AREA".to_string()))
    );
}

#[test]
fn test_line_type_invalid_fails_with_allowed_set() {
    let err = graphpoint_err("  lineType: dotted");
    match err {
        SpecError::Value(ValueError::InvalidLineType { value, allowed }) => {
            assert_eq!(value, "dotted");
            assert!(allowed.contains("LINE"));
            assert!(allowed.contains("AREA"));
            assert!(allowed.contains("DONTDRAW"));
        }
        other => panic!("Expected InvalidLineType error, but got {:?}", other),
    }
}

#[test]
fn test_cfunc_invalid_defaults_to_average() {
    let gp = graphpoint("  cFunc: SUM");
    assert_eq!(
        gp.extra_params.get("cFunc"),
        Some(&RawValue::String("AVERAGE".to_string()))
    );
}

#[test]
fn test_cfunc_valid_passes_through() {
    let gp = graphpoint("  cFunc: MAX");
    assert_eq!(
        gp.extra_params.get("cFunc"),
        Some(&RawValue::String("MAX".to_string()))
    );
}

#[test]
fn test_unknown_type_falls_back_to_datapoint_variant() {
    let gp = graphpoint("  type: BogusGraphPoint");
    assert_eq!(gp.type_, GraphPointType::DataPoint);
}

// --- creation against the object model ---

const TEMPLATE_DOC: &str = r#"
name: test.graphs
device_classes:
  /Server:
    templates:
      Health:
        datasources:
          status:
            datapoints:
              status: GAUGE
        thresholds:
          HighStatus:
            dsnames: [status_status]
            maxval: 90
        graphs:
          Status:
            units: percent
            graphpoints:
              status:
                dpName: status
                lineType: AREA
                includeThresholds: true
                thresholdLegends:
                  HighStatus:
                    legend: busy
                    color: ff0000
"#;

fn create_model(source: &str) -> Result<ModelRoot, SpecError> {
    let analysis = analyze(source)?;
    let mut model = ModelRoot::new();
    analysis.create(&mut model)?;
    Ok(model)
}

#[test]
fn test_graphpoint_create_applies_extra_params() {
    let model = create_model(TEMPLATE_DOC).unwrap();
    let graph = model
        .device_class("/Server")
        .unwrap()
        .template("Health")
        .unwrap()
        .graph("Status")
        .unwrap();

    let point = graph.point("status").unwrap();
    assert_eq!(point.type_, "DataPointGraphPoint");
    assert_eq!(
        point.properties.get("dpName"),
        Some(&PropertyValue::String("status_status".to_string()))
    );
    assert_eq!(
        point.properties.get("lineType"),
        Some(&PropertyValue::String("AREA".to_string()))
    );
}

#[test]
fn test_include_thresholds_annotates_overlay_points() {
    let model = create_model(TEMPLATE_DOC).unwrap();
    let graph = model
        .device_class("/Server")
        .unwrap()
        .template("Health")
        .unwrap()
        .graph("Status")
        .unwrap();

    let overlay = graph.point("HighStatus").unwrap();
    assert_eq!(overlay.type_, "ThresholdGraphPoint");
    assert_eq!(
        overlay.properties.get("threshId"),
        Some(&PropertyValue::String("HighStatus".to_string()))
    );
    assert_eq!(
        overlay.properties.get("legend"),
        Some(&PropertyValue::String("busy".to_string()))
    );
    assert_eq!(
        overlay.properties.get("color"),
        Some(&PropertyValue::String("ff0000".to_string()))
    );
}

#[test]
fn test_include_thresholds_without_legend_creates_bare_overlay() {
    let source = TEMPLATE_DOC.replace(
        r#"                thresholdLegends:
                  HighStatus:
                    legend: busy
                    color: ff0000
"#,
        "",
    );
    let model = create_model(&source).unwrap();
    let graph = model
        .device_class("/Server")
        .unwrap()
        .template("Health")
        .unwrap()
        .graph("Status")
        .unwrap();

    let overlay = graph.point("HighStatus").unwrap();
    assert_eq!(overlay.properties.get("legend"), None);
}

#[test]
fn test_graphpoint_unknown_extra_param_fails() {
    let source = TEMPLATE_DOC.replace("lineType: AREA", "bogusParam: 1");
    let err = create_model(&source).unwrap_err();
    match err {
        SpecError::Value(ValueError::UnknownProperty { key, type_name }) => {
            assert_eq!(key, "bogusParam");
            assert_eq!(type_name, "DataPointGraphPoint");
        }
        other => panic!("Expected UnknownProperty error, but got {:?}", other),
    }
}

#[test]
fn test_graphpoint_unknown_datapoint_fails() {
    let source = TEMPLATE_DOC.replace("dpName: status", "dpName: missing");
    let err = create_model(&source).unwrap_err();
    match err {
        SpecError::CrossRef(CrossRefError::UnknownDatapoint {
            datapoint,
            graphpoint,
            template,
        }) => {
            assert_eq!(datapoint, "missing_missing");
            assert_eq!(graphpoint, "status");
            assert_eq!(template, "Health");
        }
        other => panic!("Expected UnknownDatapoint error, but got {:?}", other),
    }
}

#[test]
fn test_threshold_unknown_dsname_fails() {
    let source = TEMPLATE_DOC.replace("dsnames: [status_status]", "dsnames: [nope_nope]");
    let err = create_model(&source).unwrap_err();
    match err {
        SpecError::CrossRef(CrossRefError::UnknownDsname {
            dsname, threshold, ..
        }) => {
            assert_eq!(dsname, "nope_nope");
            assert_eq!(threshold, "HighStatus");
        }
        other => panic!("Expected UnknownDsname error, but got {:?}", other),
    }
}

#[test]
fn test_datasource_unknown_type_fails() {
    let source = r#"
device_classes:
  /Server:
    templates:
      Health:
        datasources:
          status:
            type: NopeSource
"#;
    let err = create_model(source).unwrap_err();
    match err {
        SpecError::CrossRef(CrossRefError::UnknownTargetType { type_name, context }) => {
            assert_eq!(type_name, "NopeSource");
            assert!(context.contains("status"));
        }
        other => panic!("Expected UnknownTargetType error, but got {:?}", other),
    }
}

#[test]
fn test_threshold_node_carries_bounds() {
    let model = create_model(TEMPLATE_DOC).unwrap();
    let threshold = model
        .device_class("/Server")
        .unwrap()
        .template("Health")
        .unwrap()
        .threshold("HighStatus")
        .unwrap();

    assert_eq!(threshold.type_, "MinMaxThreshold");
    assert_eq!(threshold.dsnames, ["status_status"]);
    assert_eq!(
        threshold.properties.get("maxval"),
        Some(&PropertyValue::String("90".to_string()))
    );
}

#[test]
fn test_graph_comments_become_comment_points() {
    let source = r#"
device_classes:
  /Server:
    templates:
      Health:
        graphs:
          Status:
            comments: [first note, second note]
"#;
    let model = create_model(source).unwrap();
    let graph = model
        .device_class("/Server")
        .unwrap()
        .template("Health")
        .unwrap()
        .graph("Status")
        .unwrap();

    assert_eq!(graph.points.len(), 2);
    assert_eq!(graph.points[0].type_, "CommentGraphPoint");
    assert_eq!(
        graph.points[0].properties.get("text"),
        Some(&PropertyValue::String("first note".to_string()))
    );
    assert_eq!(
        graph.points[1].properties.get("sequence"),
        Some(&PropertyValue::Int(1))
    );
}

#[test]
fn test_graphpoints_are_sequenced_in_order() {
    let source = r#"
device_classes:
  /Server:
    templates:
      Health:
        datasources:
          status:
            datapoints:
              status: GAUGE
              load: GAUGE
        graphs:
          Status:
            graphpoints:
              first:
                dpName: status_status
              second:
                dpName: status_load
"#;
    let model = create_model(source).unwrap();
    let graph = model
        .device_class("/Server")
        .unwrap()
        .template("Health")
        .unwrap()
        .graph("Status")
        .unwrap();

    assert_eq!(
        graph.point("first").unwrap().properties.get("sequence"),
        Some(&PropertyValue::Int(0))
    );
    assert_eq!(
        graph.point("second").unwrap().properties.get("sequence"),
        Some(&PropertyValue::Int(1))
    );
}
