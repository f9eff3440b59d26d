use crate::error::SpecError;
use crate::params::PackSpecParams;
use crate::raw::RawValue;
use crate::serialization::{params_to_value, Value};
use crate::spec::PackSpec;
use crate::target::ModelRoot;
use serde::{Serialize, Serializer};

/// The result of a successful analysis of a pack specification document.
/// Holds both the normalized parameter tree (suitable for re-export) and the
/// fully resolved spec tree (ready to create objects with).
#[derive(Debug)]
pub struct Analysis {
    pub params: PackSpecParams,
    pub spec: PackSpec,
}

impl Serialize for Analysis {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = self.to_value();
        value.serialize(serializer)
    }
}

impl Analysis {
    /// Serializes the normalized specification into a generic `Value`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        params_to_value(&self.params)
    }

    /// Serializes the normalized specification into a pretty-printed JSON
    /// string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the normalized specification into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }

    /// Materializes every declared object into `model`. Fail-fast: the first
    /// error aborts the remaining creation sequence.
    ///
    /// # Errors
    /// Returns a `SpecError` on any cross-reference or value failure.
    pub fn create(&self, model: &mut ModelRoot) -> Result<(), SpecError> {
        self.spec.create(model)
    }
}

/// Analyzes a YAML pack specification document: parses, normalizes, and
/// resolves it.
///
/// This is the primary entry point. It returns an [`Analysis`] on success,
/// which carries the normalized parameter tree and the resolved spec, and
/// can materialize the declared objects into a [`ModelRoot`].
///
/// # Errors
///
/// Returns a `SpecError` if the document is not valid YAML, cannot be
/// coerced into the expected shapes, or violates a value constraint.
pub fn analyze(source: &str) -> Result<Analysis, SpecError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(source)?;
    let raw = RawValue::from_yaml(yaml)?;
    analyze_value(&raw)
}

/// Analyzes an already-parsed raw document. Useful when the host loads and
/// merges documents itself.
///
/// # Errors
///
/// Returns a `SpecError` on shape or value violations.
pub fn analyze_value(raw: &RawValue) -> Result<Analysis, SpecError> {
    let params = PackSpecParams::from_raw(raw)?;
    let spec = PackSpec::resolve(&params)?;
    Ok(Analysis { params, spec })
}

#[cfg(test)]
mod tests {
    use crate::analyze;

    #[test]
    fn test_simple_analyze_to_json() {
        let source = r#"
name: test.pack
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
        let result = analysis.to_json().unwrap();
        let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(result_json["name"], "test.pack");
        let status = &result_json["device_classes"]["/Server"]["templates"]["Health"]
            ["datasources"]["status"];
        assert_eq!(status["datapoints"]["status"]["rrdtype"], "GAUGE");
    }

    #[test]
    fn test_analyze_resolves_spec_tree() {
        let source = r#"
name: test.pack
classes:
  Widget:
    label: Widget
"#;

        let analysis = analyze(source).unwrap();
        assert!(analysis.spec.classes.contains_key("Widget"));
        assert_eq!(
            analysis.spec.classes["Widget"].label.as_deref(),
            Some("Widget")
        );
    }

    #[test]
    fn test_simple_analyze_to_yaml() {
        let source = r#"
name: test.pack
"#;

        let analysis = analyze(source).unwrap();
        let result = analysis.to_yaml().unwrap();

        assert_eq!(result, "name: test.pack\n");
    }
}
