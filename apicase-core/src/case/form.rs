//! Submitted editor form: each field group carries its values plus a
//! companion `desc` map keyed by field name.
//!
//! This is the shape the editor posts and the catalog normalizer produces.
//! The encoder reads it loosely as JSON so that partially filled forms still
//! encode; these types are the strongly-typed way to build one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::canonical::KeyedList;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderGroup {
    #[serde(default)]
    pub header: Map<String, Value>,
    #[serde(default)]
    pub desc: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariablesGroup {
    #[serde(default)]
    pub variables: KeyedList,
    #[serde(default)]
    pub desc: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamsGroup {
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub desc: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataGroup {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub desc: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesGroup {
    #[serde(default)]
    pub files: Map<String, Value>,
    #[serde(default)]
    pub desc: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractGroup {
    #[serde(default)]
    pub extract: KeyedList,
    #[serde(default)]
    pub desc: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateGroup {
    #[serde(default)]
    pub validate: KeyedList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HooksGroup {
    #[serde(default)]
    pub setup_hooks: Vec<String>,
    #[serde(default)]
    pub teardown_hooks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParametersGroup {
    #[serde(default)]
    pub parameters: KeyedList,
    #[serde(default)]
    pub desc: Map<String, Value>,
}

/// Request groups of a test-level form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestGroups {
    #[serde(default)]
    pub form: DataGroup,
    #[serde(default = "empty_object")]
    pub json: Value,
    #[serde(default)]
    pub params: ParamsGroup,
    #[serde(default)]
    pub files: FilesGroup,
}

impl Default for RequestGroups {
    fn default() -> Self {
        Self {
            form: DataGroup::default(),
            json: empty_object(),
            params: ParamsGroup::default(),
            files: FilesGroup::default(),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// A complete editor form.
///
/// Test-level forms fill `request`, `url`, `method`, `times`, `extract` and
/// `validate`; config-level forms fill `base_url`, `is_default` and
/// `parameters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub header: HeaderGroup,
    #[serde(default)]
    pub variables: VariablesGroup,
    #[serde(default)]
    pub hooks: HooksGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestGroups>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<ValidateGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParametersGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<i64>,
    #[serde(rename = "nodeId", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i64>,
}

impl CaseForm {
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
