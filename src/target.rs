//! Target object surface: capability descriptors for the platform types a
//! pack configures, plus a reference in-memory object graph.
//!
//! Specs never reflect over live objects. Every settable property is declared
//! up front in a [`TargetCatalog`] entry, and extra-parameter application is
//! checked against the catalog before any mutation happens. Hosts extend the
//! catalog with their own subtypes via [`TargetCatalog::register`]; property
//! lookups walk the base chain, so a subtype's property set is a superset of
//! its base's.

use crate::error::ValueError;
use crate::raw::{format_number, RawValue};
use crate::types::Cardinality;
use indexmap::IndexMap;

/// Kind of a settable target property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Int,
    Float,
    Boolean,
    Lines,
}

impl PropertyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PropertyKind::String => "a string",
            PropertyKind::Int => "an integer",
            PropertyKind::Float => "a number",
            PropertyKind::Boolean => "a boolean",
            PropertyKind::Lines => "a sequence of strings",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub id: String,
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    pub fn new(id: &str, kind: PropertyKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
        }
    }
}

/// A concrete property value held by a target object.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    Lines(Vec<String>),
}

impl PropertyValue {
    /// Coerces a raw value to the descriptor's kind. Integral numbers satisfy
    /// Int; any number satisfies Float. Returns `None` on mismatch.
    pub fn from_raw(raw: &RawValue, kind: PropertyKind) -> Option<PropertyValue> {
        match (kind, raw) {
            (PropertyKind::String, RawValue::String(s)) => Some(PropertyValue::String(s.clone())),
            (PropertyKind::Int, RawValue::Number(n)) if n.fract() == 0.0 => {
                Some(PropertyValue::Int(*n as i64))
            }
            (PropertyKind::Float, RawValue::Number(n)) => Some(PropertyValue::Float(*n)),
            (PropertyKind::Boolean, RawValue::Bool(b)) => Some(PropertyValue::Boolean(*b)),
            (PropertyKind::Lines, RawValue::Sequence(seq)) => {
                let lines = seq
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()?;
                Some(PropertyValue::Lines(lines))
            }
            _ => None,
        }
    }

    /// Best-effort coercion with no descriptor, used for free-form bags like
    /// zProperties and class property defaults.
    pub fn infer(raw: &RawValue) -> Option<PropertyValue> {
        match raw {
            RawValue::Bool(b) => Some(PropertyValue::Boolean(*b)),
            RawValue::Number(n) if n.fract() == 0.0 => Some(PropertyValue::Int(*n as i64)),
            RawValue::Number(n) => Some(PropertyValue::Float(*n)),
            RawValue::String(s) => Some(PropertyValue::String(s.clone())),
            RawValue::Sequence(seq) => {
                let lines = seq
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()?;
                Some(PropertyValue::Lines(lines))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(n) => Some(*n),
            PropertyValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Int(n) => n.to_string(),
            PropertyValue::Float(n) => format_number(*n),
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Lines(lines) => lines.join(", "),
        }
    }
}

/// A registered target type: name, optional base, and the properties it
/// declares in addition to its base's.
#[derive(Debug, Clone)]
pub struct TargetType {
    pub name: String,
    pub base: Option<String>,
    pub properties: Vec<PropertyDescriptor>,
}

impl TargetType {
    pub fn new(name: &str, base: Option<&str>, properties: Vec<PropertyDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            base: base.map(str::to_string),
            properties,
        }
    }
}

/// Registry of target types and their settable-property descriptors.
#[derive(Debug, Clone)]
pub struct TargetCatalog {
    types: IndexMap<String, TargetType>,
}

impl TargetCatalog {
    pub fn empty() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Catalog pre-populated with the standard monitoring types.
    pub fn builtin() -> Self {
        use PropertyKind::*;
        let mut catalog = Self::empty();
        let d = PropertyDescriptor::new;

        catalog.register(TargetType::new(
            "Datasource",
            None,
            vec![
                d("enabled", Boolean),
                d("component", String),
                d("eventClass", String),
                d("severity", Int),
                d("commandTemplate", String),
                d("cycletime", Int),
            ],
        ));
        catalog.register(TargetType::new(
            "Datapoint",
            None,
            vec![
                d("rrdtype", String),
                d("createCmd", String),
                d("isrow", Boolean),
                d("rrdmin", String),
                d("rrdmax", String),
                d("description", String),
                d("aliases", Lines),
            ],
        ));
        catalog.register(TargetType::new(
            "MinMaxThreshold",
            None,
            vec![
                d("enabled", Boolean),
                d("minval", String),
                d("maxval", String),
                d("eventClass", String),
                d("severity", Int),
                d("escalateCount", Int),
            ],
        ));
        catalog.register(TargetType::new(
            "Graph",
            None,
            vec![
                d("units", String),
                d("miny", Int),
                d("maxy", Int),
                d("log", Boolean),
                d("height", Int),
                d("width", Int),
                d("hasSummary", Boolean),
                d("sequence", Int),
            ],
        ));
        catalog.register(TargetType::new(
            "GraphPoint",
            None,
            vec![d("color", String), d("legend", String), d("sequence", Int)],
        ));
        catalog.register(TargetType::new(
            "DataPointGraphPoint",
            Some("GraphPoint"),
            vec![
                d("dpName", String),
                d("lineType", String),
                d("lineWidth", Int),
                d("stacked", Boolean),
                d("format", String),
                d("limit", Int),
                d("rpn", String),
                d("cFunc", String),
            ],
        ));
        catalog.register(TargetType::new(
            "CommentGraphPoint",
            Some("GraphPoint"),
            vec![d("text", String)],
        ));
        catalog.register(TargetType::new(
            "ThresholdGraphPoint",
            Some("GraphPoint"),
            vec![d("threshId", String)],
        ));
        catalog
    }

    pub fn register(&mut self, ty: TargetType) {
        self.types.insert(ty.name.clone(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&TargetType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Full property set of a type: its own declarations plus everything
    /// inherited along the base chain. Own declarations shadow base ones.
    pub fn properties_of(&self, type_name: &str) -> Vec<&PropertyDescriptor> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out: Vec<&PropertyDescriptor> = Vec::new();
        let mut current = self.types.get(type_name);
        while let Some(ty) = current {
            for desc in &ty.properties {
                if !seen.contains(&desc.id.as_str()) {
                    seen.push(&desc.id);
                    out.push(desc);
                }
            }
            current = ty.base.as_deref().and_then(|b| self.types.get(b));
        }
        out
    }

    pub fn find_property(&self, type_name: &str, id: &str) -> Option<&PropertyDescriptor> {
        let mut current = self.types.get(type_name);
        while let Some(ty) = current {
            if let Some(desc) = ty.properties.iter().find(|d| d.id == id) {
                return Some(desc);
            }
            current = ty.base.as_deref().and_then(|b| self.types.get(b));
        }
        None
    }
}

/// Ordered property bag carried by every target node.
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    values: IndexMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checked assignment: the key must be a property declared by
    /// `type_name` (or a base), and the value must coerce to its kind.
    /// Application is fail-fast; keys applied before a failure stay applied.
    pub fn set(
        &mut self,
        catalog: &TargetCatalog,
        type_name: &str,
        key: &str,
        value: &RawValue,
    ) -> Result<(), ValueError> {
        let desc =
            catalog
                .find_property(type_name, key)
                .ok_or_else(|| ValueError::UnknownProperty {
                    key: key.to_string(),
                    type_name: type_name.to_string(),
                })?;
        let value = PropertyValue::from_raw(value, desc.kind).ok_or_else(|| {
            ValueError::PropertyTypeMismatch {
                key: key.to_string(),
                type_name: type_name.to_string(),
                expected: desc.kind.name(),
                found: value.type_name().to_string(),
            }
        })?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Unchecked assignment for fields owned by the spec layer itself.
    pub fn set_value(&mut self, key: &str, value: PropertyValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// --- The persisted object graph ---

/// Root of the materialized object graph.
#[derive(Debug)]
pub struct ModelRoot {
    pub catalog: TargetCatalog,
    pub classes: Vec<ClassNode>,
    pub relationship_schemas: Vec<RelationshipSchemaNode>,
    pub device_classes: Vec<DeviceClassNode>,
}

impl ModelRoot {
    pub fn new() -> Self {
        Self::with_catalog(TargetCatalog::builtin())
    }

    pub fn with_catalog(catalog: TargetCatalog) -> Self {
        Self {
            catalog,
            classes: Vec::new(),
            relationship_schemas: Vec::new(),
            device_classes: Vec::new(),
        }
    }

    pub fn class(&self, id: &str) -> Option<&ClassNode> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn device_class(&self, path: &str) -> Option<&DeviceClassNode> {
        self.device_classes.iter().find(|d| d.path == path)
    }
}

impl Default for ModelRoot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ClassNode {
    pub id: String,
    pub bases: Vec<String>,
    pub label: Option<String>,
    pub monitoring_templates: Vec<String>,
    pub properties: Vec<ClassPropertyNode>,
    pub relationships: Vec<ClassRelationshipNode>,
    pub impact_triggers: Vec<ImpactTriggerNode>,
}

impl ClassNode {
    pub fn relationship(&self, id: &str) -> Option<&ClassRelationshipNode> {
        self.relationships.iter().find(|r| r.id == id)
    }

    pub fn property(&self, id: &str) -> Option<&ClassPropertyNode> {
        self.properties.iter().find(|p| p.id == id)
    }
}

#[derive(Debug)]
pub struct ClassPropertyNode {
    pub id: String,
    pub type_: String,
    pub label: Option<String>,
    pub short_label: Option<String>,
    pub order: i64,
    pub default: Option<PropertyValue>,
    pub editable: bool,
    pub display: bool,
}

#[derive(Debug)]
pub struct ClassRelationshipNode {
    pub id: String,
    pub label: Option<String>,
    pub short_label: Option<String>,
    pub order: i64,
    pub display: bool,
}

#[derive(Debug)]
pub struct ImpactTriggerNode {
    pub id: String,
    pub policy: String,
    pub state: String,
    pub trigger_type: String,
    pub threshold: i64,
}

#[derive(Debug)]
pub struct RelationshipSchemaNode {
    pub left: String,
    pub cardinality: Cardinality,
    pub right: String,
}

#[derive(Debug)]
pub struct DeviceClassNode {
    pub path: String,
    pub zproperties: PropertyBag,
    pub templates: Vec<TemplateNode>,
}

impl DeviceClassNode {
    pub fn template(&self, id: &str) -> Option<&TemplateNode> {
        self.templates.iter().find(|t| t.id == id)
    }
}

#[derive(Debug)]
pub struct TemplateNode {
    pub id: String,
    pub description: Option<String>,
    pub target_class: Option<String>,
    pub datasources: Vec<DatasourceNode>,
    pub thresholds: Vec<ThresholdNode>,
    pub graphs: Vec<GraphNode>,
}

impl TemplateNode {
    pub fn datasource(&self, id: &str) -> Option<&DatasourceNode> {
        self.datasources.iter().find(|d| d.id == id)
    }

    pub fn threshold(&self, id: &str) -> Option<&ThresholdNode> {
        self.thresholds.iter().find(|t| t.id == id)
    }

    pub fn graph(&self, id: &str) -> Option<&GraphNode> {
        self.graphs.iter().find(|g| g.id == id)
    }
}

#[derive(Debug)]
pub struct DatasourceNode {
    pub id: String,
    pub type_: String,
    pub properties: PropertyBag,
    pub datapoints: Vec<DatapointNode>,
}

impl DatasourceNode {
    pub fn datapoint(&self, id: &str) -> Option<&DatapointNode> {
        self.datapoints.iter().find(|d| d.id == id)
    }
}

#[derive(Debug)]
pub struct DatapointNode {
    pub id: String,
    pub type_: String,
    pub properties: PropertyBag,
}

#[derive(Debug)]
pub struct ThresholdNode {
    pub id: String,
    pub type_: String,
    pub dsnames: Vec<String>,
    pub properties: PropertyBag,
}

#[derive(Debug)]
pub struct GraphNode {
    pub id: String,
    pub properties: PropertyBag,
    pub points: Vec<GraphPointNode>,
}

impl GraphNode {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            properties: PropertyBag::new(),
            points: Vec::new(),
        }
    }

    /// Factory for a typed graph point child. Returns a handle to the new
    /// point; the caller configures it in place.
    pub fn create_graph_point(&mut self, type_: &str, id: &str) -> &mut GraphPointNode {
        self.points.push(GraphPointNode {
            id: id.to_string(),
            type_: type_.to_string(),
            properties: PropertyBag::new(),
        });
        self.points.last_mut().expect("just pushed")
    }

    pub fn point(&self, id: &str) -> Option<&GraphPointNode> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Returns indices of the threshold-overlay points for `dp_name`,
    /// creating any that do not exist yet. One overlay point per threshold
    /// whose dsnames include the datapoint; existing points are reused, so
    /// repeated calls never duplicate.
    pub fn add_thresholds_for_datapoint(
        &mut self,
        dp_name: &str,
        thresholds: &[ThresholdNode],
    ) -> Vec<usize> {
        let mut out = Vec::new();
        for threshold in thresholds {
            if !threshold.dsnames.iter().any(|d| d == dp_name) {
                continue;
            }
            if let Some(idx) = self.points.iter().position(|p| p.id == threshold.id) {
                out.push(idx);
                continue;
            }
            let idx = self.points.len();
            let point = self.create_graph_point("ThresholdGraphPoint", &threshold.id);
            point
                .properties
                .set_value("threshId", PropertyValue::String(threshold.id.clone()));
            out.push(idx);
        }
        out
    }
}

#[derive(Debug)]
pub struct GraphPointNode {
    pub id: String,
    pub type_: String,
    pub properties: PropertyBag,
}
