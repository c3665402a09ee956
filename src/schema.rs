//! Build a whole [`ParameterSchema`] from one config object.
//!
//! A build is a single pass over the config's parameters in order. The first
//! failing parameter aborts the pass and nothing built so far is returned.
//! Independent config objects can be built in parallel with [`build_many`].
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::debug;

use crate::error::BuildError;
use crate::ir::{DefaultValue, ParameterDescriptor, Ty, Value, UNBOUNDED_LEN};
use crate::lower::{lower_parameter, BuildOptions};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Input: parameter name → spec string, plus optional raw inline comments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSpec {
    pub parameters: IndexMap<String, String>,
    #[serde(default)]
    pub inline_comments: IndexMap<String, Option<String>>,
}

/// Ordered, read-only mapping from parameter name to descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    params: IndexMap<String, ParameterDescriptor>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ConfigSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameter(mut self, name: impl Into<String>, spec: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), spec.into());
        self
    }

    pub fn comment(mut self, name: impl Into<String>, comment: impl Into<String>) -> Self {
        self.inline_comments.insert(name.into(), Some(comment.into()));
        self
    }

    fn comment_for(&self, name: &str) -> Option<&str> {
        self.inline_comments.get(name).and_then(|c| c.as_deref())
    }
}

impl ParameterSchema {
    pub fn get(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.params.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterDescriptor)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

pub fn build_schema(config: &ConfigSpec) -> Result<ParameterSchema, BuildError> {
    build_schema_with(config, &BuildOptions::default())
}

pub fn build_schema_with(config: &ConfigSpec, options: &BuildOptions) -> Result<ParameterSchema, BuildError> {
    let params = config
        .parameters
        .iter()
        .map(|(name, spec)| {
            lower_parameter(name, spec, config.comment_for(name), options)
                .map(|descriptor| (name.clone(), descriptor))
        })
        .collect::<Result<IndexMap<_, _>, _>>()?;
    debug!(parameters = params.len(), "built parameter schema");
    Ok(ParameterSchema { params })
}

/// Build independent config objects in parallel. Results keep input order.
pub fn build_many(configs: &[ConfigSpec], options: &BuildOptions) -> Vec<Result<ParameterSchema, BuildError>> {
    configs
        .par_iter()
        .map(|config| build_schema_with(config, options))
        .collect()
}

// ————————————————————————————————————————————————————————————————————————————
// JSON VIEW
// ————————————————————————————————————————————————————————————————————————————

/// JSON description of a schema, one object per parameter.
pub fn emit_schema(schema: &ParameterSchema) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    for (name, descriptor) in schema.iter() {
        out.insert(name.to_string(), emit_descriptor(descriptor));
    }
    serde_json::Value::Object(out)
}

pub fn emit_descriptor(d: &ParameterDescriptor) -> serde_json::Value {
    use serde_json::{json, Value as Json};

    let mut o = json!({
        "type": d.ty().name(),
        "allow_none": d.allow_none(),
    });
    match d.default_value() {
        DefaultValue::NotProvided => {}
        DefaultValue::Null => { o["default"] = Json::Null; }
        DefaultValue::Value(v) => { o["default"] = value_to_json(v); }
    }
    if let Some(help) = d.help() {
        o["help"] = Json::from(help);
    }

    match d.ty() {
        Ty::Any | Ty::Boolean | Ty::Text => {}
        Ty::Integer { min, max } => {
            if let Some(m) = *min { o["min"] = Json::from(m); }
            if let Some(m) = *max { o["max"] = Json::from(m); }
        }
        Ty::Float { min, max } => {
            if let Some(m) = *min { o["min"] = Json::from(m); }
            if let Some(m) = *max { o["max"] = Json::from(m); }
        }
        Ty::ListOf { item, min_len, max_len } => {
            if let Some(item) = item { o["item"] = Json::from(item.name()); }
            o["min_len"] = Json::from(*min_len);
            // unbounded → null
            o["max_len"] = if *max_len == UNBOUNDED_LEN { Json::Null } else { Json::from(*max_len) };
        }
        Ty::Enum { options } => {
            o["options"] = Json::Array(options.iter().cloned().map(Json::from).collect());
        }
    }
    o
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Integer(n) => serde_json::Value::from(*n),
        Value::Float(x) => float_to_json(*x),
        Value::Boolean(b) => serde_json::Value::from(*b),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
        Value::List(xs) => serde_json::Value::Array(xs.iter().map(value_to_json).collect()),
    }
}

/// NaN and infinities have no JSON number form. They are emitted as the
/// strings `"NaN"`, `"inf"`, `"-inf"` so they never read as a null default.
fn float_to_json(x: f64) -> serde_json::Value {
    match serde_json::Number::from_f64(x) {
        Some(n) => serde_json::Value::Number(n),
        None if x.is_nan() => serde_json::Value::from("NaN"),
        None if x > 0.0 => serde_json::Value::from("inf"),
        None => serde_json::Value::from("-inf"),
    }
}

// ------------------------------- Tests ------------------------------------ //
