//! Engine configuration (chart form data)
//!
//! Authored fields arrive either as JSON text typed into a control or as
//! already-structured JSON. Both are decoded defensively: a field that does
//! not parse becomes its empty default and a `ConfigParseFailed` event.

use crate::context::ExecutionContext;
use crate::data_model::MetricSpec;
use crate::error::PivtreeError;
use crate::events::EngineEvent;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A configuration field written by a dashboard author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Authored {
    Text(String),
    Json(Value),
}

impl Default for Authored {
    fn default() -> Self {
        Authored::Json(Value::Null)
    }
}

impl Authored {
    /// The JSON value behind this field, `None` when left blank
    pub fn to_value(&self) -> Result<Option<Value>, serde_json::Error> {
        match self {
            Authored::Text(text) if text.trim().is_empty() => Ok(None),
            Authored::Text(text) => serde_json::from_str(text).map(Some),
            Authored::Json(Value::Null) => Ok(None),
            Authored::Json(value) => Ok(Some(value.clone())),
        }
    }

    /// Decode with a custom decoder, falling back to `T::default()`
    pub fn decode_with<T, F>(&self, field: &str, ctx: &ExecutionContext, decode: F) -> T
    where
        T: Default,
        F: FnOnce(Value) -> Result<T, serde_json::Error>,
    {
        let decoded = match self.to_value() {
            Ok(None) => return T::default(),
            Ok(Some(value)) => decode(value),
            Err(e) => Err(e),
        };

        decoded.unwrap_or_else(|e| {
            ctx.emit(EngineEvent::ConfigParseFailed {
                field: field.to_string(),
                error: e.to_string(),
            });
            T::default()
        })
    }

    /// Decode into any deserializable type, falling back to `T::default()`
    pub fn decode<T>(&self, field: &str, ctx: &ExecutionContext) -> T
    where
        T: DeserializeOwned + Default,
    {
        self.decode_with(field, ctx, serde_json::from_value)
    }
}

impl From<&str> for Authored {
    fn from(text: &str) -> Self {
        Authored::Text(text.to_string())
    }
}

impl From<Value> for Authored {
    fn from(value: Value) -> Self {
        Authored::Json(value)
    }
}

fn default_true() -> bool {
    true
}

fn default_platform_column() -> String {
    "platform".to_string()
}

fn default_group_separator() -> String {
    " / ".to_string()
}

/// Everything the engine needs besides the data rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,

    /// Hierarchy description (groups → subgroups → segments → subsegments)
    #[serde(default)]
    pub hierarchy: Authored,

    /// Index-pair swaps applied to the parsed slot order
    #[serde(default)]
    pub swaps: Authored,

    /// when/set and from/to relocation rules
    #[serde(default, alias = "relocation_rules")]
    pub relocation_rules: Authored,

    /// from/to rules keyed on the platform dimension; evaluated before `relocation_rules`
    #[serde(default, alias = "platform_rules")]
    pub platform_rules: Authored,

    #[serde(default)]
    pub exclusions: Authored,

    #[serde(default = "default_true", alias = "show_segments")]
    pub show_segments: bool,

    /// Reject swap batches that move a metric across groups
    #[serde(default = "default_true", alias = "validate_swaps")]
    pub validate_swaps: bool,

    #[serde(default = "default_platform_column", alias = "platform_column")]
    pub platform_column: String,

    #[serde(default = "default_group_separator", alias = "group_separator")]
    pub group_separator: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metrics: Vec::new(),
            hierarchy: Authored::default(),
            swaps: Authored::default(),
            relocation_rules: Authored::default(),
            platform_rules: Authored::default(),
            exclusions: Authored::default(),
            show_segments: true,
            validate_swaps: true,
            platform_column: default_platform_column(),
            group_separator: default_group_separator(),
        }
    }
}

impl EngineConfig {
    pub fn new<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<MetricSpec>,
    {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_hierarchy(mut self, hierarchy: impl Into<Authored>) -> Self {
        self.hierarchy = hierarchy.into();
        self
    }

    pub fn with_swaps(mut self, swaps: impl Into<Authored>) -> Self {
        self.swaps = swaps.into();
        self
    }

    pub fn with_relocation_rules(mut self, rules: impl Into<Authored>) -> Self {
        self.relocation_rules = rules.into();
        self
    }

    pub fn with_platform_rules(mut self, rules: impl Into<Authored>) -> Self {
        self.platform_rules = rules.into();
        self
    }

    pub fn with_exclusions(mut self, exclusions: impl Into<Authored>) -> Self {
        self.exclusions = exclusions.into();
        self
    }

    pub fn show_segments(mut self, show: bool) -> Self {
        self.show_segments = show;
        self
    }

    pub fn validate_swaps(mut self, validate: bool) -> Self {
        self.validate_swaps = validate;
        self
    }

    /// Metric labels in configuration order
    pub fn metric_labels(&self) -> Vec<String> {
        self.metrics.iter().map(MetricSpec::label).collect()
    }

    pub fn from_json_str(text: &str) -> Result<Self, PivtreeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, PivtreeError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PivtreeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PivtreeError::ConfigIo {
            path: path.display().to_string(),
            source: e,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }
}
