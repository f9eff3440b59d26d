// API error path tests
// These test error handling, conversions, and edge cases in the API layer

use packspec_core::{analyze, error::SpecError};

#[test]
fn test_api_analyze_yaml_error() {
    let source = "classes: [unclosed";
    let result = analyze(source);
    assert!(result.is_err());
    if let Err(SpecError::Yaml { .. }) = result {
        // Success
    } else {
        panic!("Expected YAML error");
    }
}

#[test]
fn test_api_document_must_be_mapping() {
    let source = "- just\n- a\n- list\n";
    let result = analyze(source);
    assert!(result.is_err());
    if let Err(SpecError::Shape(_)) = result {
        // Success
    } else {
        panic!("Expected shape error");
    }
}

#[test]
fn test_api_unknown_top_level_key() {
    let source = "bogus_section: {}\n";
    let result = analyze(source);
    assert!(result.is_err());
    if let Err(SpecError::Shape(_)) = result {
        // Success
    } else {
        panic!("Expected shape error");
    }
}

#[test]
fn test_api_value_error_type() {
    let source = r#"
device_classes:
  /Server:
    templates:
      Health:
        graphs:
          Status:
            graphpoints:
              status:
                colorindex: abc
"#;
    let result = analyze(source);
    assert!(result.is_err());
    if let Err(SpecError::Value(_)) = result {
        // Success
    } else {
        panic!("Expected value error");
    }
}

#[test]
fn test_api_cross_ref_error_type() {
    let source = r#"
classes:
  Disk:
    base: [Missing]
"#;
    let result = analyze(source);
    assert!(result.is_err());
    if let Err(SpecError::CrossRef(_)) = result {
        // Success
    } else {
        panic!("Expected cross-reference error");
    }
}

#[test]
fn test_api_error_display() {
    if let Err(err) = analyze("bogus_section: {}\n") {
        let error_string = format!("{}", err);
        assert!(!error_string.is_empty());
        assert!(error_string.contains("bogus_section"));
    } else {
        panic!("Should have errored");
    }
}

#[test]
fn test_api_error_message_names_offending_key() {
    let source = r#"
device_classes:
  /Server:
    templates:
      Health:
        graphs:
          Status:
            graphpoints:
              status:
                lineType: dotted
"#;
    if let Err(err) = analyze(source) {
        let message = format!("{}", err);
        assert!(message.contains("dotted"));
        assert!(message.contains("lineType"));
    } else {
        panic!("Should have errored");
    }
}

#[test]
fn test_api_empty_source_fails_cleanly() {
    // An empty document parses as null, which is not a mapping.
    let result = analyze("");
    assert!(result.is_err());
}
