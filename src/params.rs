//! Spec-parameter layer: lightly-normalized, typed representations of the
//! declarative input, one type per kind of entry.
//!
//! [`specs_from_param`] is the shared normalization entry point. It accepts a
//! collection in any of three forms (name→body mapping, sequence of named
//! items, bare string), folds the reserved `DEFAULTS` entry into every
//! sibling, and constructs one typed parameter object per entry. Fields left
//! unset stay `None`; built-in defaults are filled immediately unless the
//! caller asks for `leave_defaults`, in which case a later inheritance pass
//! owns them.

use crate::error::{ShapeError, SpecError, ValueError};
use crate::raw::{format_number, RawMapping, RawValue};
use crate::types::{Cardinality, Color, RrdType};
use indexmap::IndexMap;
use std::str::FromStr;

/// One kind of declarative entry. Implementations own their field coercion
/// rules; the normalization machinery owns shapes and DEFAULTS.
pub trait SpecParamsType: Sized {
    const TYPE_NAME: &'static str;

    fn from_fields(name: &str, fields: RawMapping) -> Result<Self, SpecError>;

    /// Expands a bare scalar item body into mapping fields. Types without a
    /// scalar shorthand reject.
    fn fields_from_scalar(name: &str, value: &RawValue) -> Result<RawMapping, SpecError> {
        Err(ShapeError::ItemShape {
            type_name: Self::TYPE_NAME,
            name: name.to_string(),
            found: value.type_name().to_string(),
        }
        .into())
    }

    /// Fills unset fields with the type's built-in defaults. Skipped in
    /// `leave_defaults` mode.
    fn apply_defaults(&mut self) {}
}

/// Normalizes a raw collection value into a mapping of named, typed
/// spec-parameter objects.
pub fn specs_from_param<T: SpecParamsType>(
    param: Option<&RawValue>,
    field_name: &str,
    leave_defaults: bool,
) -> Result<IndexMap<String, T>, SpecError> {
    let mut out = IndexMap::new();
    let Some(param) = param else {
        return Ok(out);
    };

    let mut entries: RawMapping = match param {
        RawValue::Null => RawMapping::new(),
        RawValue::Mapping(mapping) => mapping.clone(),
        RawValue::Sequence(seq) => {
            log::debug!("expanding sequence form of '{field_name}'");
            let mut mapping = RawMapping::new();
            for (index, item) in seq.iter().enumerate() {
                match item {
                    RawValue::String(name) => {
                        mapping.insert(name.clone(), RawValue::Null);
                    }
                    RawValue::Mapping(fields) => {
                        let mut fields = fields.clone();
                        match fields.shift_remove("name") {
                            Some(RawValue::String(name)) => {
                                mapping.insert(name, RawValue::Mapping(fields));
                            }
                            _ => {
                                return Err(ShapeError::UnnamedItem {
                                    type_name: T::TYPE_NAME,
                                    field: field_name.to_string(),
                                    index,
                                }
                                .into())
                            }
                        }
                    }
                    _ => {
                        return Err(ShapeError::UnnamedItem {
                            type_name: T::TYPE_NAME,
                            field: field_name.to_string(),
                            index,
                        }
                        .into())
                    }
                }
            }
            mapping
        }
        RawValue::String(name) => {
            log::debug!("expanding bare string shorthand for '{field_name}'");
            let mut mapping = RawMapping::new();
            mapping.insert(name.clone(), RawValue::Null);
            mapping
        }
        other => {
            return Err(ShapeError::CollectionShape {
                field: field_name.to_string(),
                found: other.type_name().to_string(),
            }
            .into())
        }
    };

    let defaults = match entries.shift_remove("DEFAULTS") {
        Some(RawValue::Mapping(defaults)) => {
            log::debug!(
                "merging DEFAULTS into {} '{field_name}' entries",
                entries.len()
            );
            defaults
        }
        Some(RawValue::Null) | None => RawMapping::new(),
        Some(other) => {
            return Err(ShapeError::DefaultsShape {
                field: field_name.to_string(),
                found: other.type_name().to_string(),
            }
            .into())
        }
    };

    for (name, body) in entries {
        let explicit = match body {
            RawValue::Null => RawMapping::new(),
            RawValue::Mapping(fields) => fields,
            scalar => {
                log::debug!("expanding scalar shorthand for {} '{name}'", T::TYPE_NAME);
                T::fields_from_scalar(&name, &scalar)?
            }
        };
        // DEFAULTS first, explicit values win.
        let mut fields = defaults.clone();
        for (key, value) in explicit {
            fields.insert(key, value);
        }
        let mut item = T::from_fields(&name, fields)?;
        if !leave_defaults {
            item.apply_defaults();
        }
        out.insert(name, item);
    }
    Ok(out)
}

// --- field extraction helpers ---

fn field_shape(
    type_name: &'static str,
    name: &str,
    field: &str,
    expected: &'static str,
    found: &RawValue,
) -> SpecError {
    ShapeError::FieldShape {
        type_name,
        name: name.to_string(),
        field: field.to_string(),
        expected,
        found: found.type_name().to_string(),
    }
    .into()
}

fn take_string(
    fields: &mut RawMapping,
    type_name: &'static str,
    name: &str,
    key: &str,
) -> Result<Option<String>, SpecError> {
    match fields.shift_remove(key) {
        None | Some(RawValue::Null) => Ok(None),
        Some(RawValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(field_shape(type_name, name, key, "a string", &other)),
    }
}

fn take_bool(
    fields: &mut RawMapping,
    type_name: &'static str,
    name: &str,
    key: &str,
) -> Result<Option<bool>, SpecError> {
    match fields.shift_remove(key) {
        None | Some(RawValue::Null) => Ok(None),
        Some(RawValue::Bool(b)) => Ok(Some(b)),
        Some(other) => Err(field_shape(type_name, name, key, "a boolean", &other)),
    }
}

fn take_i64(
    fields: &mut RawMapping,
    type_name: &'static str,
    name: &str,
    key: &str,
) -> Result<Option<i64>, SpecError> {
    match fields.shift_remove(key) {
        None | Some(RawValue::Null) => Ok(None),
        Some(value) => value
            .coerce_i64()
            .map(Some)
            .ok_or_else(|| field_shape(type_name, name, key, "an integer", &value)),
    }
}

/// A string-valued field that also accepts numbers (stringified). Threshold
/// bounds are the usual case: `minval: 0` and `minval: "here.speed * 2"`
/// both occur in the wild.
fn take_scalar_string(
    fields: &mut RawMapping,
    type_name: &'static str,
    name: &str,
    key: &str,
) -> Result<Option<String>, SpecError> {
    match fields.shift_remove(key) {
        None | Some(RawValue::Null) => Ok(None),
        Some(RawValue::String(s)) => Ok(Some(s)),
        Some(RawValue::Number(n)) => Ok(Some(format_number(n))),
        Some(other) => Err(field_shape(
            type_name,
            name,
            key,
            "a string or number",
            &other,
        )),
    }
}

/// A scalar-or-sequence field: a bare string counts as a one-element list.
fn take_string_list(
    fields: &mut RawMapping,
    type_name: &'static str,
    name: &str,
    key: &str,
) -> Result<Option<Vec<String>>, SpecError> {
    match fields.shift_remove(key) {
        None | Some(RawValue::Null) => Ok(None),
        Some(RawValue::String(s)) => Ok(Some(vec![s])),
        Some(RawValue::Sequence(seq)) => {
            let mut items = Vec::with_capacity(seq.len());
            for item in &seq {
                match item.as_str() {
                    Some(s) => items.push(s.to_string()),
                    None => {
                        return Err(field_shape(
                            type_name,
                            name,
                            key,
                            "a string or sequence of strings",
                            item,
                        ))
                    }
                }
            }
            Ok(Some(items))
        }
        Some(other) => Err(field_shape(
            type_name,
            name,
            key,
            "a string or sequence of strings",
            &other,
        )),
    }
}

fn reject_unknown(
    fields: &RawMapping,
    type_name: &'static str,
    name: &str,
) -> Result<(), SpecError> {
    if let Some((field, _)) = fields.first() {
        return Err(ShapeError::UnknownField {
            type_name,
            name: name.to_string(),
            field: field.clone(),
        }
        .into());
    }
    Ok(())
}

// --- root ---

/// The whole declarative document, normalized.
#[derive(Debug, Clone)]
pub struct PackSpecParams {
    pub name: Option<String>,
    pub classes: IndexMap<String, ClassSpecParams>,
    pub class_relationships: Vec<RelationshipSchemaSpecParams>,
    pub device_classes: IndexMap<String, DeviceClassSpecParams>,
}

impl PackSpecParams {
    pub fn from_raw(raw: &RawValue) -> Result<Self, SpecError> {
        let RawValue::Mapping(doc) = raw else {
            return Err(ShapeError::DocumentShape {
                found: raw.type_name().to_string(),
            }
            .into());
        };
        let mut doc = doc.clone();
        let name = take_string(&mut doc, "pack", "pack", "name")?;
        let classes = specs_from_param(doc.shift_remove("classes").as_ref(), "classes", false)?;
        let class_relationships = match doc.shift_remove("class_relationships") {
            None | Some(RawValue::Null) => Vec::new(),
            Some(RawValue::Sequence(seq)) => seq
                .iter()
                .map(RelationshipSchemaSpecParams::from_raw)
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(field_shape(
                    "pack",
                    name.as_deref().unwrap_or("pack"),
                    "class_relationships",
                    "a sequence",
                    &other,
                ))
            }
        };
        let device_classes = specs_from_param(
            doc.shift_remove("device_classes").as_ref(),
            "device_classes",
            false,
        )?;
        reject_unknown(&doc, "pack", name.as_deref().unwrap_or("pack"))?;
        Ok(Self {
            name,
            classes,
            class_relationships,
            device_classes,
        })
    }
}

// --- classes ---

#[derive(Debug, Clone)]
pub struct ClassSpecParams {
    pub name: String,
    pub base: Vec<String>,
    pub label: Option<String>,
    pub monitoring_templates: Vec<String>,
    pub properties: IndexMap<String, ClassPropertySpecParams>,
    pub relationships: IndexMap<String, ClassRelationshipSpecParams>,
    pub impact_triggers: IndexMap<String, ImpactTriggerSpecParams>,
}

impl SpecParamsType for ClassSpecParams {
    const TYPE_NAME: &'static str = "class";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let base = take_string_list(&mut fields, Self::TYPE_NAME, name, "base")?.unwrap_or_default();
        let label = take_string(&mut fields, Self::TYPE_NAME, name, "label")?;
        let monitoring_templates =
            take_string_list(&mut fields, Self::TYPE_NAME, name, "monitoring_templates")?
                .unwrap_or_default();
        // Class children stay sparse; base-chain resolution fills defaults.
        let properties = specs_from_param(
            fields.shift_remove("properties").as_ref(),
            "properties",
            true,
        )?;
        let relationships = specs_from_param(
            fields.shift_remove("relationships").as_ref(),
            "relationships",
            true,
        )?;
        let impact_triggers = specs_from_param(
            fields.shift_remove("impact_triggers").as_ref(),
            "impact_triggers",
            true,
        )?;
        reject_unknown(&fields, Self::TYPE_NAME, name)?;
        Ok(Self {
            name: name.to_string(),
            base,
            label,
            monitoring_templates,
            properties,
            relationships,
            impact_triggers,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClassPropertySpecParams {
    pub name: String,
    pub type_: Option<String>,
    pub label: Option<String>,
    pub short_label: Option<String>,
    pub order: Option<i64>,
    pub default: Option<RawValue>,
    pub editable: Option<bool>,
    pub display: Option<bool>,
}

impl ClassPropertySpecParams {
    /// Field-level merge: unset fields inherit from `base`, set fields win.
    pub fn merge_over(mut self, base: &Self) -> Self {
        self.type_ = self.type_.or_else(|| base.type_.clone());
        self.label = self.label.or_else(|| base.label.clone());
        self.short_label = self.short_label.or_else(|| base.short_label.clone());
        self.order = self.order.or(base.order);
        self.default = self.default.or_else(|| base.default.clone());
        self.editable = self.editable.or(base.editable);
        self.display = self.display.or(base.display);
        self
    }
}

impl SpecParamsType for ClassPropertySpecParams {
    const TYPE_NAME: &'static str = "class property";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let type_ = take_string(&mut fields, Self::TYPE_NAME, name, "type")?;
        let label = take_string(&mut fields, Self::TYPE_NAME, name, "label")?;
        let short_label = take_string(&mut fields, Self::TYPE_NAME, name, "short_label")?;
        let order = take_i64(&mut fields, Self::TYPE_NAME, name, "order")?;
        let default = match fields.shift_remove("default") {
            None | Some(RawValue::Null) => None,
            Some(value) => Some(value),
        };
        let editable = take_bool(&mut fields, Self::TYPE_NAME, name, "editable")?;
        let display = take_bool(&mut fields, Self::TYPE_NAME, name, "display")?;
        reject_unknown(&fields, Self::TYPE_NAME, name)?;
        Ok(Self {
            name: name.to_string(),
            type_,
            label,
            short_label,
            order,
            default,
            editable,
            display,
        })
    }

    fn fields_from_scalar(name: &str, value: &RawValue) -> Result<RawMapping, SpecError> {
        // `some_prop: string` is shorthand for `some_prop: {type: string}`.
        let RawValue::String(type_) = value else {
            return Err(ShapeError::ItemShape {
                type_name: Self::TYPE_NAME,
                name: name.to_string(),
                found: value.type_name().to_string(),
            }
            .into());
        };
        let mut fields = RawMapping::new();
        fields.insert("type".to_string(), RawValue::String(type_.clone()));
        Ok(fields)
    }

    fn apply_defaults(&mut self) {
        self.type_.get_or_insert_with(|| "string".to_string());
        self.order.get_or_insert(100);
        self.editable.get_or_insert(false);
        self.display.get_or_insert(true);
    }
}

#[derive(Debug, Clone)]
pub struct ClassRelationshipSpecParams {
    pub name: String,
    pub label: Option<String>,
    pub short_label: Option<String>,
    pub order: Option<i64>,
    pub display: Option<bool>,
}

impl ClassRelationshipSpecParams {
    pub fn merge_over(mut self, base: &Self) -> Self {
        self.label = self.label.or_else(|| base.label.clone());
        self.short_label = self.short_label.or_else(|| base.short_label.clone());
        self.order = self.order.or(base.order);
        self.display = self.display.or(base.display);
        self
    }
}

impl SpecParamsType for ClassRelationshipSpecParams {
    const TYPE_NAME: &'static str = "class relationship";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let label = take_string(&mut fields, Self::TYPE_NAME, name, "label")?;
        let short_label = take_string(&mut fields, Self::TYPE_NAME, name, "short_label")?;
        let order = take_i64(&mut fields, Self::TYPE_NAME, name, "order")?;
        let display = take_bool(&mut fields, Self::TYPE_NAME, name, "display")?;
        reject_unknown(&fields, Self::TYPE_NAME, name)?;
        Ok(Self {
            name: name.to_string(),
            label,
            short_label,
            order,
            display,
        })
    }

    fn apply_defaults(&mut self) {
        self.order.get_or_insert(100);
        self.display.get_or_insert(true);
    }
}

#[derive(Debug, Clone)]
pub struct ImpactTriggerSpecParams {
    pub name: String,
    pub policy: Option<String>,
    pub state: Option<String>,
    pub trigger_type: Option<String>,
    pub threshold: Option<i64>,
}

impl ImpactTriggerSpecParams {
    pub fn merge_over(mut self, base: &Self) -> Self {
        self.policy = self.policy.or_else(|| base.policy.clone());
        self.state = self.state.or_else(|| base.state.clone());
        self.trigger_type = self.trigger_type.or_else(|| base.trigger_type.clone());
        self.threshold = self.threshold.or(base.threshold);
        self
    }
}

impl SpecParamsType for ImpactTriggerSpecParams {
    const TYPE_NAME: &'static str = "impact trigger";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let policy = take_string(&mut fields, Self::TYPE_NAME, name, "policy")?;
        let state = take_string(&mut fields, Self::TYPE_NAME, name, "state")?;
        let trigger_type = take_string(&mut fields, Self::TYPE_NAME, name, "trigger_type")?;
        let threshold = take_i64(&mut fields, Self::TYPE_NAME, name, "threshold")?;
        reject_unknown(&fields, Self::TYPE_NAME, name)?;
        Ok(Self {
            name: name.to_string(),
            policy,
            state,
            trigger_type,
            threshold,
        })
    }

    fn apply_defaults(&mut self) {
        self.policy.get_or_insert_with(|| "AVAILABILITY".to_string());
        self.state.get_or_insert_with(|| "DOWN".to_string());
        self.trigger_type
            .get_or_insert_with(|| "policyPercentageTrigger".to_string());
        self.threshold.get_or_insert(50);
    }
}

/// One `"<left> <cardinality> <right>"` schema declaration.
#[derive(Debug, Clone)]
pub struct RelationshipSchemaSpecParams {
    pub left: String,
    pub cardinality: Cardinality,
    pub right: String,
}

impl RelationshipSchemaSpecParams {
    pub fn from_raw(raw: &RawValue) -> Result<Self, SpecError> {
        let Some(schema) = raw.as_str() else {
            return Err(ValueError::InvalidRelationshipSchema {
                value: raw.display(),
            }
            .into());
        };
        let tokens: Vec<&str> = schema.split_whitespace().collect();
        let [left, cardinality, right] = tokens.as_slice() else {
            return Err(ValueError::InvalidRelationshipSchema {
                value: schema.to_string(),
            }
            .into());
        };
        Ok(Self {
            left: left.to_string(),
            cardinality: cardinality.parse::<Cardinality>()?,
            right: right.to_string(),
        })
    }

    pub fn display(&self) -> String {
        format!("{} {} {}", self.left, self.cardinality, self.right)
    }
}

// --- device classes and templates ---

#[derive(Debug, Clone)]
pub struct DeviceClassSpecParams {
    pub name: String,
    pub create: Option<bool>,
    pub remove: Option<bool>,
    pub zproperties: RawMapping,
    pub templates: IndexMap<String, TemplateSpecParams>,
}

impl SpecParamsType for DeviceClassSpecParams {
    const TYPE_NAME: &'static str = "device class";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let create = take_bool(&mut fields, Self::TYPE_NAME, name, "create")?;
        let remove = take_bool(&mut fields, Self::TYPE_NAME, name, "remove")?;
        let zproperties = match fields.shift_remove("zProperties") {
            None | Some(RawValue::Null) => RawMapping::new(),
            Some(RawValue::Mapping(zprops)) => zprops,
            Some(other) => {
                return Err(field_shape(
                    Self::TYPE_NAME,
                    name,
                    "zProperties",
                    "a mapping",
                    &other,
                ))
            }
        };
        let templates =
            specs_from_param(fields.shift_remove("templates").as_ref(), "templates", false)?;
        reject_unknown(&fields, Self::TYPE_NAME, name)?;
        Ok(Self {
            name: name.to_string(),
            create,
            remove,
            zproperties,
            templates,
        })
    }

    fn apply_defaults(&mut self) {
        self.create.get_or_insert(true);
        self.remove.get_or_insert(false);
    }
}

#[derive(Debug, Clone)]
pub struct TemplateSpecParams {
    pub name: String,
    pub description: Option<String>,
    pub target_class: Option<String>,
    pub datasources: IndexMap<String, DatasourceSpecParams>,
    pub thresholds: IndexMap<String, ThresholdSpecParams>,
    pub graphs: IndexMap<String, GraphSpecParams>,
}

impl SpecParamsType for TemplateSpecParams {
    const TYPE_NAME: &'static str = "template";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let description = take_string(&mut fields, Self::TYPE_NAME, name, "description")?;
        let target_class = take_string(&mut fields, Self::TYPE_NAME, name, "targetClass")?;
        let datasources = specs_from_param(
            fields.shift_remove("datasources").as_ref(),
            "datasources",
            false,
        )?;
        let thresholds = specs_from_param(
            fields.shift_remove("thresholds").as_ref(),
            "thresholds",
            false,
        )?;
        let graphs = specs_from_param(fields.shift_remove("graphs").as_ref(), "graphs", false)?;
        reject_unknown(&fields, Self::TYPE_NAME, name)?;
        Ok(Self {
            name: name.to_string(),
            description,
            target_class,
            datasources,
            thresholds,
            graphs,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DatasourceSpecParams {
    pub name: String,
    pub type_: Option<String>,
    pub enabled: Option<bool>,
    pub component: Option<String>,
    pub event_class: Option<String>,
    pub severity: Option<i64>,
    pub command_template: Option<String>,
    pub cycletime: Option<i64>,
    pub datapoints: IndexMap<String, DatapointSpecParams>,
    /// Everything not recognized above flows through to the target object.
    pub extra_params: RawMapping,
}

impl SpecParamsType for DatasourceSpecParams {
    const TYPE_NAME: &'static str = "datasource";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let type_ = take_string(&mut fields, Self::TYPE_NAME, name, "type")?;
        let enabled = take_bool(&mut fields, Self::TYPE_NAME, name, "enabled")?;
        let component = take_string(&mut fields, Self::TYPE_NAME, name, "component")?;
        let event_class = take_string(&mut fields, Self::TYPE_NAME, name, "eventClass")?;
        let severity = take_i64(&mut fields, Self::TYPE_NAME, name, "severity")?;
        let command_template = take_string(&mut fields, Self::TYPE_NAME, name, "commandTemplate")?;
        let cycletime = take_i64(&mut fields, Self::TYPE_NAME, name, "cycletime")?;
        let datapoints = specs_from_param(
            fields.shift_remove("datapoints").as_ref(),
            "datapoints",
            false,
        )?;
        Ok(Self {
            name: name.to_string(),
            type_,
            enabled,
            component,
            event_class,
            severity,
            command_template,
            cycletime,
            datapoints,
            extra_params: fields,
        })
    }

    fn apply_defaults(&mut self) {
        self.type_.get_or_insert_with(|| "Datasource".to_string());
        self.enabled.get_or_insert(true);
        self.severity.get_or_insert(3);
        self.cycletime.get_or_insert(300);
    }
}

#[derive(Debug, Clone)]
pub struct DatapointSpecParams {
    pub name: String,
    pub type_: Option<String>,
    pub rrdtype: Option<RrdType>,
    pub create_cmd: Option<String>,
    pub isrow: Option<bool>,
    pub rrdmin: Option<String>,
    pub rrdmax: Option<String>,
    pub description: Option<String>,
    pub aliases: IndexMap<String, Option<String>>,
    pub extra_params: RawMapping,
}

impl SpecParamsType for DatapointSpecParams {
    const TYPE_NAME: &'static str = "datapoint";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let type_ = take_string(&mut fields, Self::TYPE_NAME, name, "type")?;
        let rrdtype = match take_string(&mut fields, Self::TYPE_NAME, name, "rrdtype")? {
            Some(s) => Some(RrdType::from_str(&s)?),
            None => None,
        };
        let create_cmd = take_string(&mut fields, Self::TYPE_NAME, name, "createCmd")?;
        let isrow = take_bool(&mut fields, Self::TYPE_NAME, name, "isrow")?;
        let rrdmin = take_scalar_string(&mut fields, Self::TYPE_NAME, name, "rrdmin")?;
        let rrdmax = take_scalar_string(&mut fields, Self::TYPE_NAME, name, "rrdmax")?;
        let description = take_string(&mut fields, Self::TYPE_NAME, name, "description")?;
        let aliases = match fields.shift_remove("aliases") {
            None | Some(RawValue::Null) => IndexMap::new(),
            Some(RawValue::String(alias)) => {
                let mut aliases = IndexMap::new();
                aliases.insert(alias, None);
                aliases
            }
            Some(RawValue::Mapping(mapping)) => {
                let mut aliases = IndexMap::new();
                for (alias, formula) in mapping {
                    match formula {
                        RawValue::Null => aliases.insert(alias, None),
                        RawValue::String(f) => aliases.insert(alias, Some(f)),
                        other => {
                            return Err(field_shape(
                                Self::TYPE_NAME,
                                name,
                                "aliases",
                                "a mapping of alias to formula (or null)",
                                &other,
                            ))
                        }
                    };
                }
                aliases
            }
            Some(other) => {
                return Err(field_shape(
                    Self::TYPE_NAME,
                    name,
                    "aliases",
                    "a string or mapping",
                    &other,
                ))
            }
        };
        Ok(Self {
            name: name.to_string(),
            type_,
            rrdtype,
            create_cmd,
            isrow,
            rrdmin,
            rrdmax,
            description,
            aliases,
            extra_params: fields,
        })
    }

    /// `GAUGE`, `DERIVE_MIN_0`, `COUNTER_MIN_0_MAX_100` and friends.
    fn fields_from_scalar(name: &str, value: &RawValue) -> Result<RawMapping, SpecError> {
        let RawValue::String(shorthand) = value else {
            return Err(ShapeError::ItemShape {
                type_name: Self::TYPE_NAME,
                name: name.to_string(),
                found: value.type_name().to_string(),
            }
            .into());
        };
        let mut tokens = shorthand.split('_');
        let rrdtype = tokens.next().unwrap_or_default();
        if RrdType::from_str(rrdtype).is_err() {
            return Err(ValueError::InvalidDatapointShorthand {
                value: shorthand.clone(),
            }
            .into());
        }
        let mut fields = RawMapping::new();
        fields.insert(
            "rrdtype".to_string(),
            RawValue::String(rrdtype.to_ascii_uppercase()),
        );
        while let Some(token) = tokens.next() {
            let key = match token {
                "MIN" => "rrdmin",
                "MAX" => "rrdmax",
                _ => {
                    return Err(ValueError::InvalidDatapointShorthand {
                        value: shorthand.clone(),
                    }
                    .into())
                }
            };
            let bound = tokens.next().filter(|b| b.parse::<f64>().is_ok());
            let Some(bound) = bound else {
                return Err(ValueError::InvalidDatapointShorthand {
                    value: shorthand.clone(),
                }
                .into());
            };
            fields.insert(key.to_string(), RawValue::String(bound.to_string()));
        }
        Ok(fields)
    }

    fn apply_defaults(&mut self) {
        self.type_.get_or_insert_with(|| "Datapoint".to_string());
        self.rrdtype.get_or_insert(RrdType::Gauge);
        self.isrow.get_or_insert(true);
    }
}

#[derive(Debug, Clone)]
pub struct ThresholdSpecParams {
    pub name: String,
    pub type_: Option<String>,
    pub dsnames: Vec<String>,
    pub enabled: Option<bool>,
    pub minval: Option<String>,
    pub maxval: Option<String>,
    pub event_class: Option<String>,
    pub severity: Option<i64>,
    pub extra_params: RawMapping,
}

impl SpecParamsType for ThresholdSpecParams {
    const TYPE_NAME: &'static str = "threshold";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let type_ = take_string(&mut fields, Self::TYPE_NAME, name, "type")?;
        let dsnames =
            take_string_list(&mut fields, Self::TYPE_NAME, name, "dsnames")?.unwrap_or_default();
        let enabled = take_bool(&mut fields, Self::TYPE_NAME, name, "enabled")?;
        let minval = take_scalar_string(&mut fields, Self::TYPE_NAME, name, "minval")?;
        let maxval = take_scalar_string(&mut fields, Self::TYPE_NAME, name, "maxval")?;
        let event_class = take_string(&mut fields, Self::TYPE_NAME, name, "eventClass")?;
        let severity = take_i64(&mut fields, Self::TYPE_NAME, name, "severity")?;
        Ok(Self {
            name: name.to_string(),
            type_,
            dsnames,
            enabled,
            minval,
            maxval,
            event_class,
            severity,
            extra_params: fields,
        })
    }

    fn apply_defaults(&mut self) {
        self.type_.get_or_insert_with(|| "MinMaxThreshold".to_string());
        self.enabled.get_or_insert(true);
        self.severity.get_or_insert(3);
    }
}

// --- graphs ---

#[derive(Debug, Clone)]
pub struct GraphSpecParams {
    pub name: String,
    pub units: Option<String>,
    pub miny: Option<i64>,
    pub maxy: Option<i64>,
    pub log: Option<bool>,
    pub height: Option<i64>,
    pub width: Option<i64>,
    pub has_summary: Option<bool>,
    pub comments: Vec<String>,
    pub graphpoints: IndexMap<String, GraphPointSpecParams>,
}

impl SpecParamsType for GraphSpecParams {
    const TYPE_NAME: &'static str = "graph";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let units = take_string(&mut fields, Self::TYPE_NAME, name, "units")?;
        let miny = take_i64(&mut fields, Self::TYPE_NAME, name, "miny")?;
        let maxy = take_i64(&mut fields, Self::TYPE_NAME, name, "maxy")?;
        let log = take_bool(&mut fields, Self::TYPE_NAME, name, "log")?;
        let height = take_i64(&mut fields, Self::TYPE_NAME, name, "height")?;
        let width = take_i64(&mut fields, Self::TYPE_NAME, name, "width")?;
        let has_summary = take_bool(&mut fields, Self::TYPE_NAME, name, "hasSummary")?;
        let comments =
            take_string_list(&mut fields, Self::TYPE_NAME, name, "comments")?.unwrap_or_default();
        let graphpoints = specs_from_param(
            fields.shift_remove("graphpoints").as_ref(),
            "graphpoints",
            false,
        )?;
        reject_unknown(&fields, Self::TYPE_NAME, name)?;
        Ok(Self {
            name: name.to_string(),
            units,
            miny,
            maxy,
            log,
            height,
            width,
            has_summary,
            comments,
            graphpoints,
        })
    }

    fn apply_defaults(&mut self) {
        self.miny.get_or_insert(-1);
        self.maxy.get_or_insert(-1);
        self.log.get_or_insert(false);
        self.height.get_or_insert(100);
        self.width.get_or_insert(500);
        self.has_summary.get_or_insert(true);
    }
}

pub const VALID_LINE_TYPES: [&str; 3] = ["DONTDRAW", "LINE", "AREA"];
pub const VALID_CONSOLIDATION_FNS: [&str; 4] = ["AVERAGE", "MIN", "MAX", "LAST"];

/// Normalized thresholdLegends entry; both keys always present, possibly
/// null.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThresholdLegend {
    pub legend: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GraphPointSpecParams {
    pub name: String,
    pub type_: Option<String>,
    pub dp_name: Option<String>,
    pub color: Option<Color>,
    pub colorindex: Option<i64>,
    pub include_thresholds: Option<bool>,
    pub threshold_legends: IndexMap<String, ThresholdLegend>,
    pub extra_params: RawMapping,
}

impl SpecParamsType for GraphPointSpecParams {
    const TYPE_NAME: &'static str = "graph point";

    fn from_fields(name: &str, mut fields: RawMapping) -> Result<Self, SpecError> {
        let type_ = take_string(&mut fields, Self::TYPE_NAME, name, "type")?;
        let dp_name = take_string(&mut fields, Self::TYPE_NAME, name, "dpName")?;
        let color = match take_string(&mut fields, Self::TYPE_NAME, name, "color")? {
            Some(s) => Some(Color::new(&s)?),
            None => None,
        };
        let colorindex = match fields.shift_remove("colorindex") {
            None | Some(RawValue::Null) => None,
            Some(value) => Some(value.coerce_i64().ok_or_else(|| {
                ValueError::ColorIndexNotNumeric {
                    value: value.display(),
                }
            })?),
        };
        let include_thresholds = take_bool(&mut fields, Self::TYPE_NAME, name, "includeThresholds")?;
        let threshold_legends = parse_threshold_legends(fields.shift_remove("thresholdLegends"))?;
        let mut extra_params = fields;
        validate_extra_params(&mut extra_params)?;
        Ok(Self {
            name: name.to_string(),
            type_,
            dp_name,
            color,
            colorindex,
            include_thresholds,
            threshold_legends,
            extra_params,
        })
    }

    fn apply_defaults(&mut self) {
        self.type_
            .get_or_insert_with(|| "DataPointGraphPoint".to_string());
        self.include_thresholds.get_or_insert(false);
    }
}

fn parse_threshold_legends(
    raw: Option<RawValue>,
) -> Result<IndexMap<String, ThresholdLegend>, SpecError> {
    let mut out = IndexMap::new();
    match raw {
        None | Some(RawValue::Null) => {}
        Some(RawValue::String(id)) => {
            log::debug!("setting default thresholdLegends for {id}");
            out.insert(id, ThresholdLegend::default());
        }
        Some(RawValue::Mapping(mapping)) => {
            for (id, data) in mapping {
                let entry = match data {
                    RawValue::Mapping(data) => ThresholdLegend {
                        legend: data.get("legend").and_then(|v| v.as_str()).map(str::to_string),
                        color: data.get("color").and_then(|v| v.as_str()).map(str::to_string),
                    },
                    // Anything that is not a mapping means "defaults".
                    _ => ThresholdLegend::default(),
                };
                out.insert(id, entry);
            }
        }
        Some(other) => {
            return Err(ValueError::InvalidThresholdLegends {
                found: other.display(),
            }
            .into())
        }
    }
    Ok(out)
}

/// Semantic validation of the recognized extra-params keys. `lineType` is
/// case-normalized and must be valid; an invalid `cFunc` silently becomes
/// AVERAGE.
fn validate_extra_params(extra_params: &mut RawMapping) -> Result<(), SpecError> {
    if let Some(value) = extra_params.get("lineType").cloned() {
        let allowed = VALID_LINE_TYPES.join(", ");
        let line_type = value.as_str().ok_or_else(|| ValueError::InvalidLineType {
            value: value.display(),
            allowed: allowed.clone(),
        })?;
        let upper = line_type.to_ascii_uppercase();
        if !VALID_LINE_TYPES.contains(&upper.as_str()) {
            return Err(ValueError::InvalidLineType {
                value: line_type.to_string(),
                allowed,
            }
            .into());
        }
        extra_params.insert("lineType".to_string(), RawValue::String(upper));
    }

    if let Some(value) = extra_params.get("cFunc").cloned() {
        let valid = value
            .as_str()
            .map(|s| VALID_CONSOLIDATION_FNS.contains(&s))
            .unwrap_or(false);
        if !valid {
            log::debug!(
                "invalid consolidation function {}, defaulting to AVERAGE",
                value.display()
            );
            extra_params.insert("cFunc".to_string(), RawValue::String("AVERAGE".to_string()));
        }
    }
    Ok(())
}
