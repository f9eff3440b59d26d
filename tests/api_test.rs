use packspec_core::api::analyze;
use packspec_core::target::ModelRoot;

#[test]
fn test_simple_analyze_to_json() {
    let source = r#"
name: test.pack
device_classes:
  /Server:
    templates:
      Health:
        description: basic health checks
        datasources:
          status:
            datapoints:
              status: GAUGE
"#;

    let analysis = analyze(source).unwrap();
    let result = analysis.to_json().unwrap();
    let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

    assert_eq!(result_json["name"], "test.pack");
    let template = &result_json["device_classes"]["/Server"]["templates"]["Health"];
    assert_eq!(template["description"], "basic health checks");
    // Built-in defaults are visible in the normalized export.
    assert_eq!(template["datasources"]["status"]["cycletime"], 300);
    assert_eq!(
        template["datasources"]["status"]["datapoints"]["status"]["rrdtype"],
        "GAUGE"
    );
}

#[test]
fn test_defaults_are_merged_not_exported() {
    let source = r#"
name: test.pack
device_classes:
  /Server:
    templates:
      Health:
        datasources:
          DEFAULTS:
            cycletime: 60
          status: {}
"#;

    let analysis = analyze(source).unwrap();
    let result = analysis.to_json().unwrap();
    let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

    let datasources =
        &result_json["device_classes"]["/Server"]["templates"]["Health"]["datasources"];
    assert!(datasources.get("DEFAULTS").is_none());
    assert_eq!(datasources["status"]["cycletime"], 60);
}

#[test]
fn test_simple_analyze_to_yaml() {
    let source = "name: test.pack\n";

    let analysis = analyze(source).unwrap();
    let result = analysis.to_yaml().unwrap();

    assert_eq!(result, "name: test.pack\n");
}

#[test]
fn test_analyze_and_create_round_trip() {
    let source = r#"
name: test.pack
classes:
  Widget:
    label: Widget
device_classes:
  /Server:
    templates:
      Health:
        datasources:
          status:
            datapoints:
              status: GAUGE
"#;

    let analysis = analyze(source).unwrap();
    let mut model = ModelRoot::new();
    analysis.create(&mut model).unwrap();

    assert!(model.class("Widget").is_some());
    let template = model
        .device_class("/Server")
        .unwrap()
        .template("Health")
        .unwrap();
    assert!(template.datasource("status").is_some());
    assert!(template
        .datasource("status")
        .unwrap()
        .datapoint("status")
        .is_some());
}

#[test]
fn test_empty_document_analyzes() {
    let analysis = analyze("{}").unwrap();
    assert!(analysis.spec.classes.is_empty());
    assert!(analysis.spec.device_classes.is_empty());
}
