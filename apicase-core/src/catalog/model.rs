//! Payloads returned by the external catalog service.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Response of the menu endpoint: categories with their item summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuResponse {
    pub errcode: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errmsg: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<MenuCategory>,
}

impl MenuResponse {
    /// Sentinel returned when the menu could not be fetched.
    pub fn failure() -> Self {
        Self {
            errcode: 1,
            errmsg: Some("Failed to fetch catalog menu".to_string()),
            data: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errcode == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub list: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(default)]
    pub up_time: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse {
    pub errcode: i64,
    pub data: ListData,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub list: Vec<ListItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListItem {
    #[serde(default)]
    id: Option<i64>,
    #[serde(rename = "_id", default)]
    object_id: Option<i64>,
}

impl ListItem {
    pub fn id(&self) -> Option<i64> {
        self.id.or(self.object_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DetailResponse {
    pub data: RemoteCatalogItem,
}

/// One API definition as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCatalogItem {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(rename = "catid")]
    pub category_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub req_body_type: Option<String>,
    /// Request-body schema as JSON text, possibly with comments.
    #[serde(default)]
    pub req_body_other: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub req_query: Vec<RemoteParam>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub req_body_form: Vec<RemoteParam>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub req_params: Vec<RemoteParam>,
    /// Creation time, epoch seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub add_time: i64,
    /// Last modification time, epoch seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub up_time: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// A query, form or path parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteParam {
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub example: Option<Value>,
}

impl RemoteParam {
    pub fn description(&self) -> String {
        self.desc.clone().unwrap_or_default()
    }

    /// Example value, or an empty string when none is given.
    pub fn example_value(&self) -> Value {
        match &self.example {
            None | Some(Value::Null) => Value::String(String::new()),
            Some(value) => value.clone(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_tolerates_nulls_and_missing_fields() {
        let item: RemoteCatalogItem = serde_json::from_value(json!({
            "_id": 7,
            "catid": 2,
            "path": "/users/{id}",
            "req_query": null,
            "up_time": null
        }))
        .unwrap();

        assert_eq!(item.id, 7);
        assert_eq!(item.category_id, 2);
        assert!(item.req_query.is_empty());
        assert_eq!(item.up_time, 0);
        assert!(item.title.is_none());
    }

    #[test]
    fn test_list_item_accepts_either_id_key() {
        let a: ListItem = serde_json::from_value(json!({"id": 1})).unwrap();
        let b: ListItem = serde_json::from_value(json!({"_id": 2})).unwrap();
        let c: ListItem = serde_json::from_value(json!({"id": 3, "_id": 3})).unwrap();
        let d: ListItem = serde_json::from_value(json!({"title": "no id"})).unwrap();
        assert_eq!((a.id(), b.id(), c.id(), d.id()), (Some(1), Some(2), Some(3), None));
    }

    #[test]
    fn test_param_example_defaults_to_empty_string() {
        let param: RemoteParam = serde_json::from_value(json!({"name": "q"})).unwrap();
        assert_eq!(param.example_value(), json!(""));
        assert_eq!(param.description(), "");
    }

    #[test]
    fn test_failure_sentinel() {
        let failure = MenuResponse::failure();
        assert_eq!(failure.errcode, 1);
        assert!(failure.data.is_empty());
        assert!(!failure.is_ok());
    }
}
