use crate::params::{
    ClassPropertySpecParams, ClassRelationshipSpecParams, ClassSpecParams, DatapointSpecParams,
    DatasourceSpecParams, DeviceClassSpecParams, GraphPointSpecParams, GraphSpecParams,
    ImpactTriggerSpecParams, PackSpecParams, TemplateSpecParams, ThresholdSpecParams,
};
use crate::raw::{RawMapping, RawValue};
use indexmap::IndexMap;
use serde::Serialize;

/// Generic serializable value. Only explicitly set fields of the normalized
/// params tree are emitted, so a loaded document can be re-exported as
/// YAML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

type Object = IndexMap<String, Value>;

pub(crate) fn raw_to_value(raw: &RawValue) -> Value {
    match raw {
        RawValue::Null => Value::Null,
        RawValue::Bool(b) => Value::Bool(*b),
        RawValue::Number(n) if n.fract() == 0.0 => Value::Int(*n as i64),
        RawValue::Number(n) => Value::Number(*n),
        RawValue::String(s) => Value::String(s.clone()),
        RawValue::Sequence(seq) => Value::Array(seq.iter().map(raw_to_value).collect()),
        RawValue::Mapping(mapping) => Value::Object(
            mapping
                .iter()
                .map(|(k, v)| (k.clone(), raw_to_value(v)))
                .collect(),
        ),
    }
}

fn set_str(map: &mut Object, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.clone()));
    }
}

fn set_bool(map: &mut Object, key: &str, value: &Option<bool>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::Bool(*value));
    }
}

fn set_i64(map: &mut Object, key: &str, value: &Option<i64>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::Int(*value));
    }
}

fn set_list(map: &mut Object, key: &str, values: &[String]) {
    if !values.is_empty() {
        map.insert(
            key.to_string(),
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        );
    }
}

fn set_extra(map: &mut Object, extra_params: &RawMapping) {
    for (key, value) in extra_params {
        map.insert(key.clone(), raw_to_value(value));
    }
}

pub(crate) fn params_to_value(params: &PackSpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "name", &params.name);
    if !params.classes.is_empty() {
        map.insert(
            "classes".to_string(),
            Value::Object(
                params
                    .classes
                    .iter()
                    .map(|(k, v)| (k.clone(), class_to_value(v)))
                    .collect(),
            ),
        );
    }
    if !params.class_relationships.is_empty() {
        map.insert(
            "class_relationships".to_string(),
            Value::Array(
                params
                    .class_relationships
                    .iter()
                    .map(|s| Value::String(s.display()))
                    .collect(),
            ),
        );
    }
    if !params.device_classes.is_empty() {
        map.insert(
            "device_classes".to_string(),
            Value::Object(
                params
                    .device_classes
                    .iter()
                    .map(|(k, v)| (k.clone(), device_class_to_value(v)))
                    .collect(),
            ),
        );
    }
    Value::Object(map)
}

fn class_to_value(class: &ClassSpecParams) -> Value {
    let mut map = Object::new();
    set_list(&mut map, "base", &class.base);
    set_str(&mut map, "label", &class.label);
    set_list(&mut map, "monitoring_templates", &class.monitoring_templates);
    if !class.properties.is_empty() {
        map.insert(
            "properties".to_string(),
            Value::Object(
                class
                    .properties
                    .iter()
                    .map(|(k, v)| (k.clone(), property_to_value(v)))
                    .collect(),
            ),
        );
    }
    if !class.relationships.is_empty() {
        map.insert(
            "relationships".to_string(),
            Value::Object(
                class
                    .relationships
                    .iter()
                    .map(|(k, v)| (k.clone(), relationship_to_value(v)))
                    .collect(),
            ),
        );
    }
    if !class.impact_triggers.is_empty() {
        map.insert(
            "impact_triggers".to_string(),
            Value::Object(
                class
                    .impact_triggers
                    .iter()
                    .map(|(k, v)| (k.clone(), trigger_to_value(v)))
                    .collect(),
            ),
        );
    }
    Value::Object(map)
}

fn property_to_value(property: &ClassPropertySpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "type", &property.type_);
    set_str(&mut map, "label", &property.label);
    set_str(&mut map, "short_label", &property.short_label);
    set_i64(&mut map, "order", &property.order);
    if let Some(default) = &property.default {
        map.insert("default".to_string(), raw_to_value(default));
    }
    set_bool(&mut map, "editable", &property.editable);
    set_bool(&mut map, "display", &property.display);
    Value::Object(map)
}

fn relationship_to_value(relationship: &ClassRelationshipSpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "label", &relationship.label);
    set_str(&mut map, "short_label", &relationship.short_label);
    set_i64(&mut map, "order", &relationship.order);
    set_bool(&mut map, "display", &relationship.display);
    Value::Object(map)
}

fn trigger_to_value(trigger: &ImpactTriggerSpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "policy", &trigger.policy);
    set_str(&mut map, "state", &trigger.state);
    set_str(&mut map, "trigger_type", &trigger.trigger_type);
    set_i64(&mut map, "threshold", &trigger.threshold);
    Value::Object(map)
}

fn device_class_to_value(device_class: &DeviceClassSpecParams) -> Value {
    let mut map = Object::new();
    set_bool(&mut map, "create", &device_class.create);
    set_bool(&mut map, "remove", &device_class.remove);
    if !device_class.zproperties.is_empty() {
        map.insert(
            "zProperties".to_string(),
            raw_to_value(&RawValue::Mapping(device_class.zproperties.clone())),
        );
    }
    if !device_class.templates.is_empty() {
        map.insert(
            "templates".to_string(),
            Value::Object(
                device_class
                    .templates
                    .iter()
                    .map(|(k, v)| (k.clone(), template_to_value(v)))
                    .collect(),
            ),
        );
    }
    Value::Object(map)
}

fn template_to_value(template: &TemplateSpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "description", &template.description);
    set_str(&mut map, "targetClass", &template.target_class);
    if !template.datasources.is_empty() {
        map.insert(
            "datasources".to_string(),
            Value::Object(
                template
                    .datasources
                    .iter()
                    .map(|(k, v)| (k.clone(), datasource_to_value(v)))
                    .collect(),
            ),
        );
    }
    if !template.thresholds.is_empty() {
        map.insert(
            "thresholds".to_string(),
            Value::Object(
                template
                    .thresholds
                    .iter()
                    .map(|(k, v)| (k.clone(), threshold_to_value(v)))
                    .collect(),
            ),
        );
    }
    if !template.graphs.is_empty() {
        map.insert(
            "graphs".to_string(),
            Value::Object(
                template
                    .graphs
                    .iter()
                    .map(|(k, v)| (k.clone(), graph_to_value(v)))
                    .collect(),
            ),
        );
    }
    Value::Object(map)
}

fn datasource_to_value(datasource: &DatasourceSpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "type", &datasource.type_);
    set_bool(&mut map, "enabled", &datasource.enabled);
    set_str(&mut map, "component", &datasource.component);
    set_str(&mut map, "eventClass", &datasource.event_class);
    set_i64(&mut map, "severity", &datasource.severity);
    set_str(&mut map, "commandTemplate", &datasource.command_template);
    set_i64(&mut map, "cycletime", &datasource.cycletime);
    if !datasource.datapoints.is_empty() {
        map.insert(
            "datapoints".to_string(),
            Value::Object(
                datasource
                    .datapoints
                    .iter()
                    .map(|(k, v)| (k.clone(), datapoint_to_value(v)))
                    .collect(),
            ),
        );
    }
    set_extra(&mut map, &datasource.extra_params);
    Value::Object(map)
}

fn datapoint_to_value(datapoint: &DatapointSpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "type", &datapoint.type_);
    if let Some(rrdtype) = datapoint.rrdtype {
        map.insert("rrdtype".to_string(), Value::String(rrdtype.to_string()));
    }
    set_str(&mut map, "createCmd", &datapoint.create_cmd);
    set_bool(&mut map, "isrow", &datapoint.isrow);
    set_str(&mut map, "rrdmin", &datapoint.rrdmin);
    set_str(&mut map, "rrdmax", &datapoint.rrdmax);
    set_str(&mut map, "description", &datapoint.description);
    if !datapoint.aliases.is_empty() {
        map.insert(
            "aliases".to_string(),
            Value::Object(
                datapoint
                    .aliases
                    .iter()
                    .map(|(k, v)| {
                        let value = match v {
                            Some(formula) => Value::String(formula.clone()),
                            None => Value::Null,
                        };
                        (k.clone(), value)
                    })
                    .collect(),
            ),
        );
    }
    set_extra(&mut map, &datapoint.extra_params);
    Value::Object(map)
}

fn threshold_to_value(threshold: &ThresholdSpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "type", &threshold.type_);
    set_list(&mut map, "dsnames", &threshold.dsnames);
    set_bool(&mut map, "enabled", &threshold.enabled);
    set_str(&mut map, "minval", &threshold.minval);
    set_str(&mut map, "maxval", &threshold.maxval);
    set_str(&mut map, "eventClass", &threshold.event_class);
    set_i64(&mut map, "severity", &threshold.severity);
    set_extra(&mut map, &threshold.extra_params);
    Value::Object(map)
}

fn graph_to_value(graph: &GraphSpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "units", &graph.units);
    set_i64(&mut map, "miny", &graph.miny);
    set_i64(&mut map, "maxy", &graph.maxy);
    set_bool(&mut map, "log", &graph.log);
    set_i64(&mut map, "height", &graph.height);
    set_i64(&mut map, "width", &graph.width);
    set_bool(&mut map, "hasSummary", &graph.has_summary);
    set_list(&mut map, "comments", &graph.comments);
    if !graph.graphpoints.is_empty() {
        map.insert(
            "graphpoints".to_string(),
            Value::Object(
                graph
                    .graphpoints
                    .iter()
                    .map(|(k, v)| (k.clone(), graphpoint_to_value(v)))
                    .collect(),
            ),
        );
    }
    Value::Object(map)
}

fn graphpoint_to_value(graphpoint: &GraphPointSpecParams) -> Value {
    let mut map = Object::new();
    set_str(&mut map, "type", &graphpoint.type_);
    set_str(&mut map, "dpName", &graphpoint.dp_name);
    if let Some(color) = &graphpoint.color {
        map.insert("color".to_string(), Value::String(color.to_string()));
    }
    set_i64(&mut map, "colorindex", &graphpoint.colorindex);
    set_bool(&mut map, "includeThresholds", &graphpoint.include_thresholds);
    if !graphpoint.threshold_legends.is_empty() {
        map.insert(
            "thresholdLegends".to_string(),
            Value::Object(
                graphpoint
                    .threshold_legends
                    .iter()
                    .map(|(k, v)| {
                        let mut entry = Object::new();
                        entry.insert(
                            "legend".to_string(),
                            v.legend.clone().map_or(Value::Null, Value::String),
                        );
                        entry.insert(
                            "color".to_string(),
                            v.color.clone().map_or(Value::Null, Value::String),
                        );
                        (k.clone(), Value::Object(entry))
                    })
                    .collect(),
            ),
        );
    }
    set_extra(&mut map, &graphpoint.extra_params);
    Value::Object(map)
}
