//! Resolved spec layer: the creation-ready counterparts of the parameter
//! types.
//!
//! Resolution happens in two passes. [`PackSpec::resolve`] folds class
//! inheritance (additive per-name merge over the base chain, field-level
//! overlay inside matching entries) and fills built-in defaults, producing a
//! tree with concrete values. `create()` then materializes target objects in
//! dependency order and performs every cross-reference check: datasource and
//! threshold types against the catalog, threshold dsnames and graph point
//! dpNames against the template's datapoints, schema endpoints against the
//! created classes. Any failure aborts the remaining creation sequence.

use crate::error::{CrossRefError, SpecError};
use crate::params::{
    ClassPropertySpecParams, ClassRelationshipSpecParams, ClassSpecParams,
    DatapointSpecParams, DatasourceSpecParams, DeviceClassSpecParams, GraphPointSpecParams,
    GraphSpecParams, ImpactTriggerSpecParams, PackSpecParams, RelationshipSchemaSpecParams,
    SpecParamsType, TemplateSpecParams, ThresholdLegend, ThresholdSpecParams,
};
use crate::raw::RawMapping;
use crate::target::{
    ClassNode, ClassPropertyNode, ClassRelationshipNode, DatapointNode, DatasourceNode,
    DeviceClassNode, GraphNode, ImpactTriggerNode, ModelRoot, PropertyBag, PropertyValue,
    RelationshipSchemaNode, TargetCatalog, TemplateNode, ThresholdNode,
};
use crate::types::{Cardinality, Color, RrdType};
use indexmap::IndexMap;

/// The resolved pack: single owner of the whole spec tree. Child specs never
/// point back at their parents; creation passes the needed context down as
/// borrowed arguments instead.
#[derive(Debug, Clone)]
pub struct PackSpec {
    pub name: String,
    pub classes: IndexMap<String, ClassSpec>,
    pub class_relationships: Vec<RelationshipSchemaSpec>,
    pub device_classes: IndexMap<String, DeviceClassSpec>,
}

impl PackSpec {
    pub fn resolve(params: &PackSpecParams) -> Result<Self, SpecError> {
        let mut classes = IndexMap::new();
        for (name, class_params) in &params.classes {
            classes.insert(name.clone(), ClassSpec::resolve(&params.classes, class_params)?);
        }
        let class_relationships = params
            .class_relationships
            .iter()
            .map(RelationshipSchemaSpec::from_params)
            .collect();
        let mut device_classes = IndexMap::new();
        for (path, dc_params) in &params.device_classes {
            device_classes.insert(path.clone(), DeviceClassSpec::from_params(dc_params));
        }
        Ok(Self {
            name: params.name.clone().unwrap_or_default(),
            classes,
            class_relationships,
            device_classes,
        })
    }

    /// Materializes every object the pack declares, in dependency order:
    /// classes, relationship schemas, device classes with their templates.
    pub fn create(&self, model: &mut ModelRoot) -> Result<(), SpecError> {
        log::debug!("creating objects for pack '{}'", self.name);
        for class in self.classes.values() {
            model.classes.push(class.create());
        }
        for schema in &self.class_relationships {
            for endpoint in [&schema.left, &schema.right] {
                // Dotted names are platform classes outside this pack.
                if !endpoint.contains('.') && model.class(endpoint).is_none() {
                    return Err(CrossRefError::UnknownSchemaEndpoint {
                        endpoint: endpoint.clone(),
                        schema: schema.display(),
                    }
                    .into());
                }
            }
            model.relationship_schemas.push(schema.create());
        }
        for device_class in self.device_classes.values() {
            let node = device_class.create(&model.catalog)?;
            model.device_classes.push(node);
        }
        Ok(())
    }
}

// --- class resolution ---

#[derive(Debug, Clone)]
pub struct ClassSpec {
    pub name: String,
    pub bases: Vec<String>,
    pub label: Option<String>,
    pub monitoring_templates: Vec<String>,
    pub properties: IndexMap<String, ClassPropertySpec>,
    pub relationships: IndexMap<String, ClassRelationshipSpec>,
    pub impact_triggers: IndexMap<String, ImpactTriggerSpec>,
}

impl ClassSpec {
    fn resolve(
        all: &IndexMap<String, ClassSpecParams>,
        params: &ClassSpecParams,
    ) -> Result<Self, SpecError> {
        let mut stack = Vec::new();
        let (mut properties, mut relationships, mut impact_triggers) =
            merged_class_children(all, &params.name, &mut stack)?;
        for property in properties.values_mut() {
            property.apply_defaults();
        }
        for relationship in relationships.values_mut() {
            relationship.apply_defaults();
        }
        for trigger in impact_triggers.values_mut() {
            trigger.apply_defaults();
        }
        Ok(Self {
            name: params.name.clone(),
            bases: params.base.clone(),
            label: params.label.clone(),
            monitoring_templates: params.monitoring_templates.clone(),
            properties: properties
                .iter()
                .map(|(k, v)| (k.clone(), ClassPropertySpec::from_params(v)))
                .collect(),
            relationships: relationships
                .iter()
                .map(|(k, v)| (k.clone(), ClassRelationshipSpec::from_params(v)))
                .collect(),
            impact_triggers: impact_triggers
                .iter()
                .map(|(k, v)| (k.clone(), ImpactTriggerSpec::from_params(v)))
                .collect(),
        })
    }

    fn create(&self) -> ClassNode {
        ClassNode {
            id: self.name.clone(),
            bases: self.bases.clone(),
            label: self.label.clone(),
            monitoring_templates: self.monitoring_templates.clone(),
            properties: self.properties.values().map(ClassPropertySpec::create).collect(),
            relationships: self
                .relationships
                .values()
                .map(ClassRelationshipSpec::create)
                .collect(),
            impact_triggers: self
                .impact_triggers
                .values()
                .map(ImpactTriggerSpec::create)
                .collect(),
        }
    }
}

type MergedChildren = (
    IndexMap<String, ClassPropertySpecParams>,
    IndexMap<String, ClassRelationshipSpecParams>,
    IndexMap<String, ImpactTriggerSpecParams>,
);

/// Collects a class's properties, relationships and impact triggers across
/// its base chain. The merge is additive: entries declared only on a base
/// survive, entries redeclared on a subclass field-merge over the base's.
fn merged_class_children(
    all: &IndexMap<String, ClassSpecParams>,
    name: &str,
    stack: &mut Vec<String>,
) -> Result<MergedChildren, SpecError> {
    if stack.iter().any(|n| n == name) {
        return Err(CrossRefError::InheritanceCycle {
            class: name.to_string(),
            chain: format!("{} -> {}", stack.join(" -> "), name),
        }
        .into());
    }
    let params = &all[name];
    stack.push(name.to_string());

    let mut properties = IndexMap::new();
    let mut relationships = IndexMap::new();
    let mut impact_triggers = IndexMap::new();
    for base in &params.base {
        if base.contains('.') {
            continue;
        }
        if !all.contains_key(base.as_str()) {
            return Err(CrossRefError::UnknownBaseClass {
                class: name.to_string(),
                base: base.clone(),
            }
            .into());
        }
        let (base_props, base_rels, base_triggers) = merged_class_children(all, base, stack)?;
        overlay(&mut properties, &base_props, ClassPropertySpecParams::merge_over);
        overlay(
            &mut relationships,
            &base_rels,
            ClassRelationshipSpecParams::merge_over,
        );
        overlay(
            &mut impact_triggers,
            &base_triggers,
            ImpactTriggerSpecParams::merge_over,
        );
    }
    overlay(&mut properties, &params.properties, ClassPropertySpecParams::merge_over);
    overlay(
        &mut relationships,
        &params.relationships,
        ClassRelationshipSpecParams::merge_over,
    );
    overlay(
        &mut impact_triggers,
        &params.impact_triggers,
        ImpactTriggerSpecParams::merge_over,
    );

    stack.pop();
    Ok((properties, relationships, impact_triggers))
}

fn overlay<T: Clone>(
    acc: &mut IndexMap<String, T>,
    upper: &IndexMap<String, T>,
    merge: impl Fn(T, &T) -> T,
) {
    for (key, value) in upper {
        let merged = match acc.get(key) {
            Some(lower) => merge(value.clone(), lower),
            None => value.clone(),
        };
        acc.insert(key.clone(), merged);
    }
}

#[derive(Debug, Clone)]
pub struct ClassPropertySpec {
    pub name: String,
    pub type_: String,
    pub label: Option<String>,
    pub short_label: Option<String>,
    pub order: i64,
    pub default: Option<PropertyValue>,
    pub editable: bool,
    pub display: bool,
}

impl ClassPropertySpec {
    fn from_params(params: &ClassPropertySpecParams) -> Self {
        Self {
            name: params.name.clone(),
            type_: params.type_.clone().unwrap_or_else(|| "string".to_string()),
            label: params.label.clone(),
            short_label: params.short_label.clone(),
            order: params.order.unwrap_or(100),
            default: params.default.as_ref().and_then(PropertyValue::infer),
            editable: params.editable.unwrap_or(false),
            display: params.display.unwrap_or(true),
        }
    }

    fn create(&self) -> ClassPropertyNode {
        ClassPropertyNode {
            id: self.name.clone(),
            type_: self.type_.clone(),
            label: self.label.clone(),
            short_label: self.short_label.clone(),
            order: self.order,
            default: self.default.clone(),
            editable: self.editable,
            display: self.display,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassRelationshipSpec {
    pub name: String,
    pub label: Option<String>,
    pub short_label: Option<String>,
    pub order: i64,
    pub display: bool,
}

impl ClassRelationshipSpec {
    fn from_params(params: &ClassRelationshipSpecParams) -> Self {
        Self {
            name: params.name.clone(),
            label: params.label.clone(),
            short_label: params.short_label.clone(),
            order: params.order.unwrap_or(100),
            display: params.display.unwrap_or(true),
        }
    }

    fn create(&self) -> ClassRelationshipNode {
        ClassRelationshipNode {
            id: self.name.clone(),
            label: self.label.clone(),
            short_label: self.short_label.clone(),
            order: self.order,
            display: self.display,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImpactTriggerSpec {
    pub name: String,
    pub policy: String,
    pub state: String,
    pub trigger_type: String,
    pub threshold: i64,
}

impl ImpactTriggerSpec {
    fn from_params(params: &ImpactTriggerSpecParams) -> Self {
        Self {
            name: params.name.clone(),
            policy: params.policy.clone().unwrap_or_else(|| "AVAILABILITY".to_string()),
            state: params.state.clone().unwrap_or_else(|| "DOWN".to_string()),
            trigger_type: params
                .trigger_type
                .clone()
                .unwrap_or_else(|| "policyPercentageTrigger".to_string()),
            threshold: params.threshold.unwrap_or(50),
        }
    }

    fn create(&self) -> ImpactTriggerNode {
        ImpactTriggerNode {
            id: self.name.clone(),
            policy: self.policy.clone(),
            state: self.state.clone(),
            trigger_type: self.trigger_type.clone(),
            threshold: self.threshold,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelationshipSchemaSpec {
    pub left: String,
    pub cardinality: Cardinality,
    pub right: String,
}

impl RelationshipSchemaSpec {
    fn from_params(params: &RelationshipSchemaSpecParams) -> Self {
        Self {
            left: params.left.clone(),
            cardinality: params.cardinality,
            right: params.right.clone(),
        }
    }

    pub fn display(&self) -> String {
        format!("{} {} {}", self.left, self.cardinality, self.right)
    }

    fn create(&self) -> RelationshipSchemaNode {
        RelationshipSchemaNode {
            left: self.left.clone(),
            cardinality: self.cardinality,
            right: self.right.clone(),
        }
    }
}

// --- device classes and templates ---

#[derive(Debug, Clone)]
pub struct DeviceClassSpec {
    pub path: String,
    pub create_if_missing: bool,
    pub remove: bool,
    pub zproperties: RawMapping,
    pub templates: IndexMap<String, TemplateSpec>,
}

impl DeviceClassSpec {
    fn from_params(params: &DeviceClassSpecParams) -> Self {
        Self {
            path: params.name.clone(),
            create_if_missing: params.create.unwrap_or(true),
            remove: params.remove.unwrap_or(false),
            zproperties: params.zproperties.clone(),
            templates: params
                .templates
                .iter()
                .map(|(k, v)| (k.clone(), TemplateSpec::from_params(v)))
                .collect(),
        }
    }

    fn create(&self, catalog: &TargetCatalog) -> Result<DeviceClassNode, SpecError> {
        let mut zproperties = PropertyBag::new();
        for (key, value) in &self.zproperties {
            match PropertyValue::infer(value) {
                Some(value) => zproperties.set_value(key, value),
                None => log::debug!("skipping non-scalar zProperty '{key}'"),
            }
        }
        let mut node = DeviceClassNode {
            path: self.path.clone(),
            zproperties,
            templates: Vec::new(),
        };
        for template in self.templates.values() {
            node.templates.push(template.create(catalog)?);
        }
        Ok(node)
    }
}

#[derive(Debug, Clone)]
pub struct TemplateSpec {
    pub name: String,
    pub description: Option<String>,
    pub target_class: Option<String>,
    pub datasources: IndexMap<String, DatasourceSpec>,
    pub thresholds: IndexMap<String, ThresholdSpec>,
    pub graphs: IndexMap<String, GraphSpec>,
}

impl TemplateSpec {
    fn from_params(params: &TemplateSpecParams) -> Self {
        Self {
            name: params.name.clone(),
            description: params.description.clone(),
            target_class: params.target_class.clone(),
            datasources: params
                .datasources
                .iter()
                .map(|(k, v)| (k.clone(), DatasourceSpec::from_params(v)))
                .collect(),
            thresholds: params
                .thresholds
                .iter()
                .map(|(k, v)| (k.clone(), ThresholdSpec::from_params(v)))
                .collect(),
            graphs: params
                .graphs
                .iter()
                .map(|(k, v)| (k.clone(), GraphSpec::from_params(v)))
                .collect(),
        }
    }

    /// Every `<datasource>_<datapoint>` name this template defines.
    pub fn datapoint_names(&self) -> Vec<String> {
        self.datasources
            .values()
            .flat_map(|ds| {
                ds.datapoints
                    .keys()
                    .map(move |dp| format!("{}_{}", ds.name, dp))
            })
            .collect()
    }

    pub fn create(&self, catalog: &TargetCatalog) -> Result<TemplateNode, SpecError> {
        log::debug!("creating template '{}'", self.name);
        let mut node = TemplateNode {
            id: self.name.clone(),
            description: self.description.clone(),
            target_class: self.target_class.clone(),
            datasources: Vec::new(),
            thresholds: Vec::new(),
            graphs: Vec::new(),
        };
        for datasource in self.datasources.values() {
            node.datasources.push(datasource.create(catalog)?);
        }
        for threshold in self.thresholds.values() {
            node.thresholds.push(threshold.create(self, catalog)?);
        }
        for graph in self.graphs.values() {
            let graph_node = graph.create(self, catalog, &node.thresholds)?;
            node.graphs.push(graph_node);
        }
        Ok(node)
    }
}

#[derive(Debug, Clone)]
pub struct DatasourceSpec {
    pub name: String,
    pub type_: String,
    pub enabled: bool,
    pub component: Option<String>,
    pub event_class: Option<String>,
    pub severity: i64,
    pub command_template: Option<String>,
    pub cycletime: i64,
    pub datapoints: IndexMap<String, DatapointSpec>,
    pub extra_params: RawMapping,
}

impl DatasourceSpec {
    fn from_params(params: &DatasourceSpecParams) -> Self {
        Self {
            name: params.name.clone(),
            type_: params.type_.clone().unwrap_or_else(|| "Datasource".to_string()),
            enabled: params.enabled.unwrap_or(true),
            component: params.component.clone(),
            event_class: params.event_class.clone(),
            severity: params.severity.unwrap_or(3),
            command_template: params.command_template.clone(),
            cycletime: params.cycletime.unwrap_or(300),
            datapoints: params
                .datapoints
                .iter()
                .map(|(k, v)| (k.clone(), DatapointSpec::from_params(v)))
                .collect(),
            extra_params: params.extra_params.clone(),
        }
    }

    fn create(&self, catalog: &TargetCatalog) -> Result<DatasourceNode, SpecError> {
        if !catalog.contains(&self.type_) {
            return Err(CrossRefError::UnknownTargetType {
                type_name: self.type_.clone(),
                context: format!("datasource '{}'", self.name),
            }
            .into());
        }
        let mut node = DatasourceNode {
            id: self.name.clone(),
            type_: self.type_.clone(),
            properties: PropertyBag::new(),
            datapoints: Vec::new(),
        };
        node.properties
            .set_value("enabled", PropertyValue::Boolean(self.enabled));
        node.properties
            .set_value("severity", PropertyValue::Int(self.severity));
        node.properties
            .set_value("cycletime", PropertyValue::Int(self.cycletime));
        if let Some(component) = &self.component {
            node.properties
                .set_value("component", PropertyValue::String(component.clone()));
        }
        if let Some(event_class) = &self.event_class {
            node.properties
                .set_value("eventClass", PropertyValue::String(event_class.clone()));
        }
        if let Some(command) = &self.command_template {
            node.properties
                .set_value("commandTemplate", PropertyValue::String(command.clone()));
        }
        for datapoint in self.datapoints.values() {
            node.datapoints.push(datapoint.create(catalog, &self.name)?);
        }
        for (key, value) in &self.extra_params {
            node.properties.set(catalog, &self.type_, key, value)?;
        }
        Ok(node)
    }
}

#[derive(Debug, Clone)]
pub struct DatapointSpec {
    pub name: String,
    pub type_: String,
    pub rrdtype: RrdType,
    pub create_cmd: Option<String>,
    pub isrow: bool,
    pub rrdmin: Option<String>,
    pub rrdmax: Option<String>,
    pub description: Option<String>,
    pub aliases: IndexMap<String, Option<String>>,
    pub extra_params: RawMapping,
}

impl DatapointSpec {
    fn from_params(params: &DatapointSpecParams) -> Self {
        Self {
            name: params.name.clone(),
            type_: params.type_.clone().unwrap_or_else(|| "Datapoint".to_string()),
            rrdtype: params.rrdtype.unwrap_or(RrdType::Gauge),
            create_cmd: params.create_cmd.clone(),
            isrow: params.isrow.unwrap_or(true),
            rrdmin: params.rrdmin.clone(),
            rrdmax: params.rrdmax.clone(),
            description: params.description.clone(),
            aliases: params.aliases.clone(),
            extra_params: params.extra_params.clone(),
        }
    }

    fn create(&self, catalog: &TargetCatalog, ds_name: &str) -> Result<DatapointNode, SpecError> {
        if !catalog.contains(&self.type_) {
            return Err(CrossRefError::UnknownTargetType {
                type_name: self.type_.clone(),
                context: format!("datapoint '{}_{}'", ds_name, self.name),
            }
            .into());
        }
        let mut node = DatapointNode {
            id: self.name.clone(),
            type_: self.type_.clone(),
            properties: PropertyBag::new(),
        };
        node.properties
            .set_value("rrdtype", PropertyValue::String(self.rrdtype.to_string()));
        node.properties
            .set_value("isrow", PropertyValue::Boolean(self.isrow));
        if let Some(create_cmd) = &self.create_cmd {
            node.properties
                .set_value("createCmd", PropertyValue::String(create_cmd.clone()));
        }
        if let Some(rrdmin) = &self.rrdmin {
            node.properties
                .set_value("rrdmin", PropertyValue::String(rrdmin.clone()));
        }
        if let Some(rrdmax) = &self.rrdmax {
            node.properties
                .set_value("rrdmax", PropertyValue::String(rrdmax.clone()));
        }
        if let Some(description) = &self.description {
            node.properties
                .set_value("description", PropertyValue::String(description.clone()));
        }
        if !self.aliases.is_empty() {
            let lines = self
                .aliases
                .iter()
                .map(|(alias, formula)| match formula {
                    Some(formula) => format!("{alias}:{formula}"),
                    None => alias.clone(),
                })
                .collect();
            node.properties
                .set_value("aliases", PropertyValue::Lines(lines));
        }
        for (key, value) in &self.extra_params {
            node.properties.set(catalog, &self.type_, key, value)?;
        }
        Ok(node)
    }
}

#[derive(Debug, Clone)]
pub struct ThresholdSpec {
    pub name: String,
    pub type_: String,
    pub dsnames: Vec<String>,
    pub enabled: bool,
    pub minval: Option<String>,
    pub maxval: Option<String>,
    pub event_class: Option<String>,
    pub severity: i64,
    pub extra_params: RawMapping,
}

impl ThresholdSpec {
    fn from_params(params: &ThresholdSpecParams) -> Self {
        Self {
            name: params.name.clone(),
            type_: params
                .type_
                .clone()
                .unwrap_or_else(|| "MinMaxThreshold".to_string()),
            dsnames: params.dsnames.clone(),
            enabled: params.enabled.unwrap_or(true),
            minval: params.minval.clone(),
            maxval: params.maxval.clone(),
            event_class: params.event_class.clone(),
            severity: params.severity.unwrap_or(3),
            extra_params: params.extra_params.clone(),
        }
    }

    fn create(
        &self,
        template: &TemplateSpec,
        catalog: &TargetCatalog,
    ) -> Result<ThresholdNode, SpecError> {
        if !catalog.contains(&self.type_) {
            return Err(CrossRefError::UnknownTargetType {
                type_name: self.type_.clone(),
                context: format!("threshold '{}'", self.name),
            }
            .into());
        }
        let datapoint_names = template.datapoint_names();
        for dsname in &self.dsnames {
            if !datapoint_names.iter().any(|n| n == dsname) {
                return Err(CrossRefError::UnknownDsname {
                    dsname: dsname.clone(),
                    threshold: self.name.clone(),
                    template: template.name.clone(),
                }
                .into());
            }
        }
        let mut node = ThresholdNode {
            id: self.name.clone(),
            type_: self.type_.clone(),
            dsnames: self.dsnames.clone(),
            properties: PropertyBag::new(),
        };
        node.properties
            .set_value("enabled", PropertyValue::Boolean(self.enabled));
        node.properties
            .set_value("severity", PropertyValue::Int(self.severity));
        if let Some(minval) = &self.minval {
            node.properties
                .set_value("minval", PropertyValue::String(minval.clone()));
        }
        if let Some(maxval) = &self.maxval {
            node.properties
                .set_value("maxval", PropertyValue::String(maxval.clone()));
        }
        if let Some(event_class) = &self.event_class {
            node.properties
                .set_value("eventClass", PropertyValue::String(event_class.clone()));
        }
        for (key, value) in &self.extra_params {
            node.properties.set(catalog, &self.type_, key, value)?;
        }
        Ok(node)
    }
}

// --- graphs ---

/// The graph point variants. Anything unrecognized falls back to the data
/// point variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphPointType {
    DataPoint,
    Comment,
    Threshold,
}

impl GraphPointType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "DataPointGraphPoint" => GraphPointType::DataPoint,
            "CommentGraphPoint" => GraphPointType::Comment,
            "ThresholdGraphPoint" => GraphPointType::Threshold,
            other => {
                log::debug!("unknown graph point type '{other}', using DataPointGraphPoint");
                GraphPointType::DataPoint
            }
        }
    }

    pub fn target_type_name(&self) -> &'static str {
        match self {
            GraphPointType::DataPoint => "DataPointGraphPoint",
            GraphPointType::Comment => "CommentGraphPoint",
            GraphPointType::Threshold => "ThresholdGraphPoint",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphSpec {
    pub name: String,
    pub units: Option<String>,
    pub miny: i64,
    pub maxy: i64,
    pub log: bool,
    pub height: i64,
    pub width: i64,
    pub has_summary: bool,
    pub comments: Vec<String>,
    pub graphpoints: IndexMap<String, GraphPointSpec>,
}

impl GraphSpec {
    fn from_params(params: &GraphSpecParams) -> Self {
        Self {
            name: params.name.clone(),
            units: params.units.clone(),
            miny: params.miny.unwrap_or(-1),
            maxy: params.maxy.unwrap_or(-1),
            log: params.log.unwrap_or(false),
            height: params.height.unwrap_or(100),
            width: params.width.unwrap_or(500),
            has_summary: params.has_summary.unwrap_or(true),
            comments: params.comments.clone(),
            graphpoints: params
                .graphpoints
                .iter()
                .map(|(k, v)| (k.clone(), GraphPointSpec::from_params(v)))
                .collect(),
        }
    }

    pub fn create(
        &self,
        template: &TemplateSpec,
        catalog: &TargetCatalog,
        thresholds: &[ThresholdNode],
    ) -> Result<GraphNode, SpecError> {
        let mut graph = GraphNode::new(&self.name);
        if let Some(units) = &self.units {
            graph
                .properties
                .set_value("units", PropertyValue::String(units.clone()));
        }
        graph.properties.set_value("miny", PropertyValue::Int(self.miny));
        graph.properties.set_value("maxy", PropertyValue::Int(self.maxy));
        graph
            .properties
            .set_value("log", PropertyValue::Boolean(self.log));
        graph
            .properties
            .set_value("height", PropertyValue::Int(self.height));
        graph
            .properties
            .set_value("width", PropertyValue::Int(self.width));
        graph
            .properties
            .set_value("hasSummary", PropertyValue::Boolean(self.has_summary));

        let mut sequence: i64 = 0;
        for (index, text) in self.comments.iter().enumerate() {
            let point = graph.create_graph_point("CommentGraphPoint", &format!("comment-{index}"));
            point
                .properties
                .set_value("text", PropertyValue::String(text.clone()));
            point
                .properties
                .set_value("sequence", PropertyValue::Int(sequence));
            sequence += 1;
        }

        let datapoint_names = template.datapoint_names();
        for graphpoint in self.graphpoints.values() {
            if graphpoint.type_ == GraphPointType::DataPoint {
                if let Some(dp_name) = &graphpoint.dp_name {
                    if !datapoint_names.iter().any(|n| n == dp_name) {
                        return Err(CrossRefError::UnknownDatapoint {
                            datapoint: dp_name.clone(),
                            graphpoint: graphpoint.name.clone(),
                            template: template.name.clone(),
                        }
                        .into());
                    }
                }
            }
            graphpoint.create(&mut graph, Some(sequence), thresholds, catalog)?;
            sequence += 1;
        }
        Ok(graph)
    }
}

#[derive(Debug, Clone)]
pub struct GraphPointSpec {
    pub name: String,
    pub type_: GraphPointType,
    pub dp_name: Option<String>,
    pub colorindex: Option<i64>,
    pub color: Option<Color>,
    pub include_thresholds: bool,
    pub threshold_legends: IndexMap<String, ThresholdLegend>,
    pub extra_params: RawMapping,
}

impl GraphPointSpec {
    pub fn from_params(params: &GraphPointSpecParams) -> Self {
        let type_ = GraphPointType::from_name(
            params.type_.as_deref().unwrap_or("DataPointGraphPoint"),
        );
        // Shorthand for datapoints that share their datasource's name.
        let dp_name = params.dp_name.as_ref().map(|dp| {
            if dp.contains('_') {
                dp.clone()
            } else {
                format!("{dp}_{dp}")
            }
        });
        // colorindex wins over a directly specified color.
        let mut color = params.color.clone();
        if let Some(index) = params.colorindex {
            color = Some(Color::from_index(index));
        }
        Self {
            name: params.name.clone(),
            type_,
            dp_name,
            colorindex: params.colorindex,
            color,
            include_thresholds: params.include_thresholds.unwrap_or(false),
            threshold_legends: params.threshold_legends.clone(),
            extra_params: params.extra_params.clone(),
        }
    }

    /// Instantiates this graph point under `graph` and, when
    /// `includeThresholds` is set, annotates the threshold-overlay points of
    /// its datapoint with the configured legends. Overlay points are only
    /// ever annotated, never created as thresholds.
    pub fn create(
        &self,
        graph: &mut GraphNode,
        sequence: Option<i64>,
        thresholds: &[ThresholdNode],
        catalog: &TargetCatalog,
    ) -> Result<(), SpecError> {
        let type_name = self.type_.target_type_name();
        log::debug!("adding graph point '{}'", self.name);
        let point = graph.create_graph_point(type_name, &self.name);
        if let Some(dp_name) = &self.dp_name {
            point
                .properties
                .set_value("dpName", PropertyValue::String(dp_name.clone()));
        }
        if let Some(sequence) = sequence {
            point
                .properties
                .set_value("sequence", PropertyValue::Int(sequence));
        }
        if let Some(color) = &self.color {
            point
                .properties
                .set_value("color", PropertyValue::String(color.to_string()));
        }
        for (key, value) in &self.extra_params {
            point.properties.set(catalog, type_name, key, value)?;
        }

        if self.include_thresholds {
            if let Some(dp_name) = &self.dp_name {
                for index in graph.add_thresholds_for_datapoint(dp_name, thresholds) {
                    let point = &mut graph.points[index];
                    let Some(entry) = self.threshold_legends.get(&point.id) else {
                        continue;
                    };
                    if let Some(legend) = &entry.legend {
                        point
                            .properties
                            .set_value("legend", PropertyValue::String(legend.clone()));
                    }
                    if let Some(color) = &entry.color {
                        point
                            .properties
                            .set_value("color", PropertyValue::String(color.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}
