//! Declarative configuration schemas for input types.

use serde::{Deserialize, Serialize};

/// Value kind of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Bool,
    Object,
}

/// Describes one configuration field for an input type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Describes an input type and the configuration it expects.
///
/// Returned by [`crate::InputFactory::config_spec`] and exposed via
/// `GET /inputs/info` and `GET /inputs/types/{type}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputTypeInfo {
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub fields: Vec<ConfigField>,
}
