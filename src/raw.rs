use crate::error::ShapeError;
use indexmap::IndexMap;

/// Ordered string-keyed mapping, the shape every collection in a pack
/// document arrives in. Declaration order is preserved end to end.
pub type RawMapping = IndexMap<String, RawValue>;

/// Loosely-typed input value. Raw declarative input is parsed into this
/// explicit union before any normalization rule runs, so shorthand handling
/// dispatches on the actual shape rather than duck-typing.
#[derive(Debug, PartialEq, Clone)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Sequence(Vec<RawValue>),
    Mapping(RawMapping),
}

impl RawValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "boolean",
            RawValue::Number(_) => "number",
            RawValue::String(_) => "string",
            RawValue::Sequence(_) => "sequence",
            RawValue::Mapping(_) => "mapping",
        }
    }

    /// Converts a parsed YAML value into the raw input union. Mapping keys
    /// must be strings; anything else is a shape error.
    pub fn from_yaml(value: serde_yaml::Value) -> Result<RawValue, ShapeError> {
        match value {
            serde_yaml::Value::Null => Ok(RawValue::Null),
            serde_yaml::Value::Bool(b) => Ok(RawValue::Bool(b)),
            serde_yaml::Value::Number(n) => Ok(RawValue::Number(n.as_f64().unwrap_or(0.0))),
            serde_yaml::Value::String(s) => Ok(RawValue::String(s)),
            serde_yaml::Value::Sequence(seq) => {
                let items = seq
                    .into_iter()
                    .map(RawValue::from_yaml)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RawValue::Sequence(items))
            }
            serde_yaml::Value::Mapping(map) => {
                let mut out = RawMapping::new();
                for (key, value) in map {
                    let key = match key {
                        serde_yaml::Value::String(s) => s,
                        other => {
                            return Err(ShapeError::NonStringKey {
                                found: yaml_type_name(&other).to_string(),
                            })
                        }
                    };
                    out.insert(key, RawValue::from_yaml(value)?);
                }
                Ok(RawValue::Mapping(out))
            }
            serde_yaml::Value::Tagged(tagged) => RawValue::from_yaml(tagged.value),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&RawMapping> {
        match self {
            RawValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Integer coercion: integral numbers and strings that parse as integers
    /// both count. Everything else is `None`.
    pub fn coerce_i64(&self) -> Option<i64> {
        match self {
            RawValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            RawValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Human-readable rendering for error messages.
    pub fn display(&self) -> String {
        match self {
            RawValue::Null => "null".to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Number(n) => format_number(*n),
            RawValue::String(s) => s.clone(),
            RawValue::Sequence(_) => "<sequence>".to_string(),
            RawValue::Mapping(_) => "<mapping>".to_string(),
        }
    }
}

/// Renders integral floats without a trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn yaml_type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::String(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<RawMapping> for RawValue {
    fn from(value: RawMapping) -> Self {
        RawValue::Mapping(value)
    }
}
