//! Canonical execution script consumed by the test runner.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Single-entry mappings in declaration order, e.g. `[{"token": "content.token"}]`.
pub type KeyedList = Vec<Map<String, Value>>;

/// Per-field descriptions, keyed by field group and then by field key.
pub type Descriptions = Map<String, Value>;

/// Description groups known to the encoder.
pub mod desc_group {
    pub const HEADER: &str = "header";
    pub const DATA: &str = "data";
    pub const FILES: &str = "files";
    pub const PARAMS: &str = "params";
    pub const VARIABLES: &str = "variables";
    pub const EXTRACT: &str = "extract";
    pub const PARAMETERS: &str = "parameters";
}

/// Request block of a canonical case.
///
/// Test-level cases carry `url`, `method` and `verify`; config-level cases
/// carry `base_url` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Map<String, Value>>,
}

/// A test case in runner form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTestCase {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<u64>,
    #[serde(default)]
    pub request: CanonicalRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<KeyedList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<KeyedList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_hooks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown_hooks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<KeyedList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<KeyedList>,
    #[serde(default)]
    pub desc: Descriptions,
}

impl CanonicalTestCase {
    /// Looks up the description of `key` within `group`.
    ///
    /// A missing group or key reads as an empty string; null does too.
    pub fn description(&self, group: &str, key: &str) -> String {
        match self.desc.get(group).and_then(|g| g.get(key)) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}
