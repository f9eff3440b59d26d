use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SpecError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    CrossRef(#[from] CrossRefError),

    #[error("invalid YAML document: {message}")]
    #[diagnostic(
        code(spec::yaml),
        help("The document must be valid YAML before it can be analyzed.")
    )]
    Yaml { message: String },
}

impl From<serde_yaml::Error> for SpecError {
    fn from(err: serde_yaml::Error) -> Self {
        SpecError::Yaml {
            message: err.to_string(),
        }
    }
}

/// Raw input could not be coerced into the expected spec-parameter shape.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ShapeError {
    #[error("a pack specification document must be a mapping (got {found})")]
    #[diagnostic(code(shape::document))]
    DocumentShape { found: String },

    #[error("mapping keys must be strings (got {found})")]
    #[diagnostic(code(shape::non_string_key))]
    NonStringKey { found: String },

    #[error("'{field}' must be given as a mapping, sequence, or string (got {found})")]
    #[diagnostic(code(shape::collection))]
    CollectionShape { field: String, found: String },

    #[error("sequence entry {index} of '{field}' does not resolve to a named {type_name}")]
    #[diagnostic(
        code(shape::unnamed_item),
        help("Sequence entries must be bare names or mappings carrying a 'name' field.")
    )]
    UnnamedItem {
        type_name: &'static str,
        field: String,
        index: usize,
    },

    #[error("DEFAULTS entry of '{field}' must be a mapping (got {found})")]
    #[diagnostic(code(shape::defaults))]
    DefaultsShape { field: String, found: String },

    #[error("{type_name} '{name}' must be a mapping (got {found})")]
    #[diagnostic(code(shape::item))]
    ItemShape {
        type_name: &'static str,
        name: String,
        found: String,
    },

    #[error("{type_name} '{name}': field '{field}' expects {expected} (got {found})")]
    #[diagnostic(code(shape::field))]
    FieldShape {
        type_name: &'static str,
        name: String,
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("unknown field '{field}' on {type_name} '{name}'")]
    #[diagnostic(
        code(shape::unknown_field),
        help("Unrecognized keys are only accepted on types that support extra parameters.")
    )]
    UnknownField {
        type_name: &'static str,
        name: String,
        field: String,
    },
}

/// A field value violates a domain constraint.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ValueError {
    #[error("'{value}' is not a valid color (expected six hexadecimal digits)")]
    #[diagnostic(code(value::color))]
    InvalidColor { value: String },

    #[error("graphpoint colorindex must be numeric (got {value})")]
    #[diagnostic(code(value::colorindex))]
    ColorIndexNotNumeric { value: String },

    #[error("'{value}' is not a valid graph point lineType (valid lineTypes: {allowed})")]
    #[diagnostic(code(value::line_type))]
    InvalidLineType { value: String, allowed: String },

    #[error("thresholdLegends must be specified as a mapping or a string (got {found})")]
    #[diagnostic(code(value::threshold_legends))]
    InvalidThresholdLegends { found: String },

    #[error("'{value}' is not a valid datapoint type (valid types: {allowed})")]
    #[diagnostic(code(value::rrdtype))]
    InvalidRrdType { value: String, allowed: String },

    #[error("'{value}' is not a valid datapoint shorthand")]
    #[diagnostic(
        code(value::datapoint_shorthand),
        help("Shorthand takes the form RRDTYPE with optional _MIN_<n> and _MAX_<n> suffixes, e.g. DERIVE_MIN_0.")
    )]
    InvalidDatapointShorthand { value: String },

    #[error("'{value}' is not a valid relationship cardinality (valid cardinalities: {allowed})")]
    #[diagnostic(code(value::cardinality))]
    InvalidCardinality { value: String, allowed: String },

    #[error("'{value}' is not a valid relationship schema")]
    #[diagnostic(
        code(value::relationship_schema),
        help("Schemas take the form '<left class> <cardinality> <right class>', e.g. 'Device 1:MC Interface'.")
    )]
    InvalidRelationshipSchema { value: String },

    #[error("'{key}' is not a valid property for {type_name}")]
    #[diagnostic(
        code(value::unknown_property),
        help("Extra parameters must match a settable property declared by the target type or one of its bases.")
    )]
    UnknownProperty { key: String, type_name: String },

    #[error("property '{key}' of {type_name} expects {expected} (got {found})")]
    #[diagnostic(code(value::property_type))]
    PropertyTypeMismatch {
        key: String,
        type_name: String,
        expected: &'static str,
        found: String,
    },
}

/// A spec refers to another spec or target object that does not exist.
/// Detected at creation time, not parse time.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CrossRefError {
    #[error("class '{class}' extends unknown base class '{base}'")]
    #[diagnostic(code(crossref::base_class))]
    UnknownBaseClass { class: String, base: String },

    #[error("class '{class}' participates in an inheritance cycle ({chain})")]
    #[diagnostic(code(crossref::inheritance_cycle))]
    InheritanceCycle { class: String, chain: String },

    #[error("relationship schema '{schema}' references unknown class '{endpoint}'")]
    #[diagnostic(
        code(crossref::schema_endpoint),
        help("Endpoints must be classes declared in this pack, or dotted paths to platform classes.")
    )]
    UnknownSchemaEndpoint { endpoint: String, schema: String },

    #[error("'{type_name}' is not a registered target type (required by {context})")]
    #[diagnostic(code(crossref::target_type))]
    UnknownTargetType { type_name: String, context: String },

    #[error("graph point '{graphpoint}' references unknown datapoint '{datapoint}' in template '{template}'")]
    #[diagnostic(code(crossref::datapoint))]
    UnknownDatapoint {
        datapoint: String,
        graphpoint: String,
        template: String,
    },

    #[error("threshold '{threshold}' references unknown dsname '{dsname}' in template '{template}'")]
    #[diagnostic(
        code(crossref::dsname),
        help("dsnames take the form '<datasource>_<datapoint>' and must name a datapoint of the same template.")
    )]
    UnknownDsname {
        dsname: String,
        threshold: String,
        template: String,
    },
}
