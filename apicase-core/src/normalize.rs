//! Maps catalog items onto editor forms.
//!
//! Each request-body field becomes a template variable plus a `$field`
//! placeholder in the JSON body. The body schema is walked two levels deep:
//! top-level properties and the properties of top-level objects. Deeper
//! structure is skipped.

use chrono::Local;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::Span;

use crate::case::form::{
    CaseForm, DataGroup, ExtractGroup, ParamsGroup, RequestGroups, ValidateGroup, VariablesGroup,
};
use crate::catalog::RemoteCatalogItem;

/// Longest case name kept from a catalog title, in characters.
pub const NAME_LIMIT: usize = 100;
pub const DEFAULT_NAME: &str = "Untitled API";
pub const DEFAULT_METHOD: &str = "GET";

/// Body field that expands into a filter template.
pub const CONDITIONS_FIELD: &str = "conditions";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const UNKNOWN_TYPE: &str = "unknown";

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Catalog item {id}: request body schema is not valid JSON or JSON5: {message}")]
    InvalidBodySchema { id: i64, message: String },
}

/// Catalog provenance of a normalized item.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMeta {
    pub external_id: i64,
    pub category_id: i64,
    pub add_time: i64,
    pub up_time: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedItem {
    pub form: CaseForm,
    pub meta: CatalogMeta,
}

/// Builds editor forms for one local project.
#[derive(Debug, Clone)]
pub struct Normalizer {
    project_id: i64,
    span: Span,
}

impl Normalizer {
    pub fn new(project_id: i64) -> Self {
        Self::with_span(project_id, Span::current())
    }

    pub fn with_span(project_id: i64, span: Span) -> Self {
        Self { project_id, span }
    }

    /// Normalizes every item, logging and skipping the ones that fail.
    pub fn normalize_all<'a>(
        &self,
        items: impl IntoIterator<Item = &'a RemoteCatalogItem>,
    ) -> Vec<NormalizedItem> {
        items
            .into_iter()
            .filter_map(|item| match self.normalize(item) {
                Ok(normalized) => Some(normalized),
                Err(e) => {
                    tracing::error!(parent: &self.span, "{}", e);
                    None
                }
            })
            .collect()
    }

    /// Normalizes one catalog item.
    ///
    /// Fails only when the item declares a JSON body whose schema parses
    /// neither as JSON nor as JSON5; no partial form is produced then.
    pub fn normalize(&self, item: &RemoteCatalogItem) -> Result<NormalizedItem, NormalizeError> {
        tracing::debug!(parent: &self.span, "Normalizing catalog item {}", item.id);
        let mut template = Template::default();

        if let Some(schema) = self.body_schema(item)? {
            self.walk_body_schema(item.id, &schema, &mut template);
        }

        for param in &item.req_query {
            template.params.insert(param.name.clone(), placeholder(&param.name));
            template
                .params_desc
                .insert(param.name.clone(), Value::String(param.description()));
            template.add_variable(&param.name, param.example_value(), param.description());
        }

        for param in &item.req_body_form {
            template.data.insert(param.name.clone(), placeholder(&param.name));
            template
                .data_desc
                .insert(param.name.clone(), Value::String(param.description()));
            template.add_variable(&param.name, param.example_value(), param.description());
        }

        // The url already carries `$name` for path parameters.
        for param in &item.req_params {
            template.add_variable(&param.name, param.example_value(), param.description());
        }

        let name: String = item
            .title
            .as_deref()
            .unwrap_or(DEFAULT_NAME)
            .chars()
            .take(NAME_LIMIT)
            .collect();

        let form = CaseForm {
            name: Some(name),
            variables: VariablesGroup {
                variables: template.variables,
                desc: template.variables_desc,
            },
            request: Some(RequestGroups {
                form: DataGroup {
                    data: template.data,
                    desc: template.data_desc,
                },
                json: Value::Object(template.json),
                params: ParamsGroup {
                    params: template.params,
                    desc: template.params_desc,
                },
                ..Default::default()
            }),
            extract: Some(ExtractGroup::default()),
            validate: Some(ValidateGroup {
                validate: vec![status_ok_validator()],
            }),
            url: Some(path_to_url(&item.path)),
            method: Some(
                item.method
                    .clone()
                    .unwrap_or_else(|| DEFAULT_METHOD.to_string()),
            ),
            times: Some(1),
            node_id: Some(0),
            project: Some(self.project_id),
            ..Default::default()
        };

        Ok(NormalizedItem {
            form,
            meta: CatalogMeta {
                external_id: item.id,
                category_id: item.category_id,
                add_time: item.add_time,
                up_time: item.up_time,
                username: item.username.clone().unwrap_or_default(),
            },
        })
    }

    /// Parses the declared JSON body schema, falling back to JSON5 for
    /// schemas with comments or trailing commas.
    fn body_schema(&self, item: &RemoteCatalogItem) -> Result<Option<Value>, NormalizeError> {
        let text = match (item.req_body_type.as_deref(), item.req_body_other.as_deref()) {
            (Some("json"), Some(text)) if !text.trim().is_empty() => text,
            _ => return Ok(None),
        };

        match serde_json::from_str::<Value>(text) {
            Ok(schema) => Ok(Some(schema)),
            Err(strict) => match json5::from_str::<Value>(text) {
                Ok(schema) => {
                    tracing::debug!(
                        parent: &self.span,
                        "Catalog item {}: body schema read leniently ({})",
                        item.id,
                        strict
                    );
                    Ok(Some(schema))
                }
                Err(lenient) => Err(NormalizeError::InvalidBodySchema {
                    id: item.id,
                    message: format!("{}; {}", strict, lenient),
                }),
            },
        }
    }

    fn walk_body_schema(&self, id: i64, schema: &Value, template: &mut Template) {
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return;
        };

        for (name, field) in properties {
            let Some(field) = field.as_object().map(first_alternative) else {
                continue;
            };
            let field_type = schema_type(field);
            if field_type == UNKNOWN_TYPE {
                tracing::error!(parent: &self.span, "Catalog item {}: field '{}' has no type", id, name);
            }

            match field_type {
                "array" => {
                    let Some(items) = field.get("items").and_then(Value::as_object) else {
                        tracing::warn!(
                            parent: &self.span,
                            "Catalog item {}: array field '{}' has no item schema, skipped",
                            id,
                            name
                        );
                        continue;
                    };
                    if name == CONDITIONS_FIELD {
                        template.add_conditions(items);
                    } else if is_scalar(schema_type(items)) {
                        template.add_field(name, field_type, field);
                    } else {
                        tracing::warn!(
                            parent: &self.span,
                            "Catalog item {}: array field '{}' holds nested {} items, skipped",
                            id,
                            name,
                            schema_type(items)
                        );
                    }
                }
                "object" => {
                    let Some(nested) = field.get("properties").and_then(Value::as_object) else {
                        continue;
                    };
                    for (nested_name, nested_field) in nested {
                        let Some(nested_field) = nested_field.as_object() else {
                            continue;
                        };
                        let nested_type = schema_type(nested_field);
                        if is_scalar(nested_type) {
                            template.add_field(nested_name, nested_type, nested_field);
                        } else {
                            tracing::warn!(
                                parent: &self.span,
                                "Catalog item {}: field '{}.{}' is too deep, skipped",
                                id,
                                name,
                                nested_name
                            );
                        }
                    }
                }
                _ => template.add_field(name, field_type, field),
            }
        }
    }
}

/// Collected template pieces for one item.
#[derive(Default)]
struct Template {
    json: Map<String, Value>,
    variables: Vec<Map<String, Value>>,
    variables_desc: Map<String, Value>,
    params: Map<String, Value>,
    params_desc: Map<String, Value>,
    data: Map<String, Value>,
    data_desc: Map<String, Value>,
}

impl Template {
    fn add_variable(&mut self, name: &str, value: Value, desc: String) {
        let mut entry = Map::new();
        entry.insert(name.to_string(), value);
        self.variables.push(entry);
        self.variables_desc
            .insert(name.to_string(), Value::String(desc));
    }

    /// One scalar body field: a `$name` placeholder plus a variable.
    fn add_field(&mut self, name: &str, field_type: &str, field: &Map<String, Value>) {
        self.json.insert(name.to_string(), placeholder(name));
        let desc = field
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.add_variable(name, default_value(field_type, field), desc);
    }

    /// Expands the `conditions` filter: one variable per allowed attribute,
    /// one for the comparison type, and a filter body aimed at the first
    /// attribute.
    fn add_conditions(&mut self, items: &Map<String, Value>) {
        if items.get("type").and_then(Value::as_str) != Some("object") {
            return;
        }
        let empty = Map::new();
        let properties = items
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let attribute = properties
            .get("attributeName")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let attributes = enum_values(attribute);
        let first = format!("${}", attributes[0]);
        let target_value: Vec<Value> = attributes
            .iter()
            .map(|a| Value::String(format!("${}", a)))
            .collect();

        self.json.insert(
            CONDITIONS_FIELD.to_string(),
            json!({
                "attributeName": first,
                "rangeType": "$rangeType",
                "targetValue": target_value,
            }),
        );

        let attribute_desc = attribute
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        for name in &attributes {
            self.add_variable(name, Value::String(String::new()), attribute_desc.to_string());
        }

        let range_type = properties
            .get("rangeType")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let range_types = enum_values(range_type);
        self.add_variable(
            "rangeType",
            Value::String(range_types[0].clone()),
            format!("Condition match type: {}", range_types.join(",")),
        );

        self.json.insert(
            "orderBy".to_string(),
            json!([{"attributeName": first, "rankType": "DESC"}]),
        );
    }
}

/// Allowed values of an enum schema; never empty.
fn enum_values(schema: &Map<String, Value>) -> Vec<String> {
    let values: Vec<String> = schema
        .get("enum")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    if values.is_empty() {
        vec![String::new()]
    } else {
        values
    }
}

/// Default variable value for a declared schema type.
fn default_value(field_type: &str, field: &Map<String, Value>) -> Value {
    match field_type.to_lowercase().as_str() {
        "integer" | "number" | "bigdecimal" => field.get("default").cloned().unwrap_or(json!(0)),
        "date" => Value::String(Local::now().format(DATE_FORMAT).to_string()),
        _ => Value::String(String::new()),
    }
}

/// Uses the first `anyOf` alternative when one is given.
fn first_alternative(field: &Map<String, Value>) -> &Map<String, Value> {
    field
        .get("anyOf")
        .and_then(Value::as_array)
        .and_then(|alternatives| alternatives.first())
        .and_then(Value::as_object)
        .unwrap_or(field)
}

fn schema_type(field: &Map<String, Value>) -> &str {
    field
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_TYPE)
}

fn is_scalar(field_type: &str) -> bool {
    field_type != "array" && field_type != "object"
}

fn placeholder(name: &str) -> Value {
    Value::String(format!("${}", name))
}

fn status_ok_validator() -> Map<String, Value> {
    let mut entry = Map::new();
    entry.insert("equals".to_string(), json!(["status_code", 200]));
    entry
}

/// Rewrites `{var}` path segments to `$var`.
pub fn path_to_url(path: &str) -> String {
    path.replace('{', "$").replace('}', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{encode_form, Level};
    use chrono::NaiveDateTime;

    fn item(extra: Value) -> RemoteCatalogItem {
        let mut base = json!({
            "_id": 501,
            "catid": 7,
            "title": "Create user",
            "path": "/users/{uid}/roles/{rid}",
            "method": "POST",
            "add_time": 1700000000,
            "up_time": 1700000100,
            "username": "alice"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    fn with_schema(schema: Value) -> RemoteCatalogItem {
        item(json!({"req_body_type": "json", "req_body_other": schema.to_string()}))
    }

    fn variable_names(form: &CaseForm) -> Vec<String> {
        form.variables
            .variables
            .iter()
            .flat_map(|v| v.keys().cloned())
            .collect()
    }

    fn body(form: &CaseForm) -> &Value {
        &form.request.as_ref().unwrap().json
    }

    #[test]
    fn test_basic_fields() {
        let normalized = Normalizer::new(3).normalize(&item(json!({}))).unwrap();
        let form = &normalized.form;

        assert_eq!(form.name.as_deref(), Some("Create user"));
        assert_eq!(form.url.as_deref(), Some("/users/$uid/roles/$rid"));
        assert_eq!(form.method.as_deref(), Some("POST"));
        assert_eq!(form.project, Some(3));
        assert_eq!(form.times, Some(1));
        assert_eq!(
            form.validate.as_ref().unwrap().validate,
            vec![status_ok_validator()]
        );
        assert_eq!(
            normalized.meta,
            CatalogMeta {
                external_id: 501,
                category_id: 7,
                add_time: 1700000000,
                up_time: 1700000100,
                username: "alice".into()
            }
        );
    }

    #[test]
    fn test_name_truncated_to_limit() {
        let long = "名".repeat(150);
        let normalized = Normalizer::new(1)
            .normalize(&item(json!({"title": long})))
            .unwrap();
        assert_eq!(normalized.form.name.unwrap().chars().count(), NAME_LIMIT);

        let untitled = Normalizer::new(1)
            .normalize(&item(json!({"title": null, "method": null})))
            .unwrap();
        assert_eq!(untitled.form.name.as_deref(), Some(DEFAULT_NAME));
        assert_eq!(untitled.form.method.as_deref(), Some(DEFAULT_METHOD));
    }

    #[test]
    fn test_scalar_fields_and_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "user name"},
                "age": {"type": "integer", "default": 18},
                "score": {"type": "number"},
                "born": {"type": "date"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "choice": {"anyOf": [{"type": "boolean"}, {"type": "string"}]}
            }
        });
        let form = Normalizer::new(1).normalize(&with_schema(schema)).unwrap().form;

        assert_eq!(
            variable_names(&form),
            vec!["name", "age", "score", "born", "tags", "choice"]
        );
        assert_eq!(body(&form)["name"], json!("$name"));
        assert_eq!(body(&form)["tags"], json!("$tags"));
        assert_eq!(form.variables.desc["name"], json!("user name"));
        assert_eq!(form.variables.desc["age"], json!(""));

        let vars = &form.variables.variables;
        assert_eq!(vars[0]["name"], json!(""));
        assert_eq!(vars[1]["age"], json!(18));
        assert_eq!(vars[2]["score"], json!(0));
        let born = vars[3]["born"].as_str().unwrap();
        assert!(NaiveDateTime::parse_from_str(born, DATE_FORMAT).is_ok());
        assert_eq!(vars[4]["tags"], json!(""));
        assert_eq!(vars[5]["choice"], json!(""));
    }

    #[test]
    fn test_walk_stops_at_second_level() {
        let schema = json!({
            "properties": {
                "address": {
                    "type": "object",
                    "properties": {
                        "city": {"type": "string"},
                        "geo": {"type": "object", "properties": {"lat": {"type": "number"}}},
                        "lines": {"type": "array", "items": {"type": "string"}}
                    }
                },
                "matrix": {"type": "array", "items": {"type": "array"}},
                "people": {"type": "array", "items": {"type": "object"}}
            }
        });
        let form = Normalizer::new(1).normalize(&with_schema(schema)).unwrap().form;

        assert_eq!(variable_names(&form), vec!["city"]);
        assert_eq!(body(&form), &json!({"city": "$city"}));
    }

    #[test]
    fn test_conditions_field() {
        let schema = json!({
            "properties": {
                "conditions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "attributeName": {"enum": ["x", "y"], "description": "column"},
                            "rangeType": {"enum": ["EQ", "GT"]}
                        }
                    }
                }
            }
        });
        let form = Normalizer::new(1).normalize(&with_schema(schema)).unwrap().form;

        assert_eq!(variable_names(&form), vec!["x", "y", "rangeType"]);
        assert_eq!(
            body(&form)["conditions"],
            json!({"attributeName": "$x", "rangeType": "$rangeType", "targetValue": ["$x", "$y"]})
        );
        assert_eq!(
            body(&form)["orderBy"],
            json!([{"attributeName": "$x", "rankType": "DESC"}])
        );
        assert_eq!(form.variables.variables[2]["rangeType"], json!("EQ"));
        assert_eq!(form.variables.desc["x"], json!("column"));
        assert_eq!(
            form.variables.desc["rangeType"],
            json!("Condition match type: EQ,GT")
        );
    }

    #[test]
    fn test_conditions_without_enum() {
        let schema = json!({
            "properties": {
                "conditions": {"type": "array", "items": {"type": "object", "properties": {}}}
            }
        });
        let form = Normalizer::new(1).normalize(&with_schema(schema)).unwrap().form;
        assert_eq!(variable_names(&form), vec!["", "rangeType"]);
        assert_eq!(body(&form)["conditions"]["attributeName"], json!("$"));
    }

    #[test]
    fn test_commented_schema_is_read_leniently() {
        let text = r#"{
            // request body
            "properties": {
                "id": {"type": "string",},
            },
        }"#;
        let item = item(json!({"req_body_type": "json", "req_body_other": text}));
        let form = Normalizer::new(1).normalize(&item).unwrap().form;
        assert_eq!(variable_names(&form), vec!["id"]);
    }

    #[test]
    fn test_unreadable_schema_fails_whole_item() {
        let item = item(json!({"req_body_type": "json", "req_body_other": "{{ nope"}));
        let normalizer = Normalizer::new(1);
        assert!(matches!(
            normalizer.normalize(&item),
            Err(NormalizeError::InvalidBodySchema { id: 501, .. })
        ));
        assert!(normalizer.normalize_all([&item]).is_empty());
    }

    #[test]
    fn test_non_json_body_type_ignores_schema() {
        let item = item(json!({"req_body_type": "form", "req_body_other": "{{ nope"}));
        assert!(Normalizer::new(1).normalize(&item).is_ok());
    }

    #[test]
    fn test_query_form_and_path_params() {
        let item = item(json!({
            "req_query": [{"name": "page", "desc": "page no", "example": "1"}],
            "req_body_form": [{"name": "avatar", "desc": null}],
            "req_params": [{"name": "uid", "desc": "user id", "example": "42"}]
        }));
        let form = Normalizer::new(1).normalize(&item).unwrap().form;
        let request = form.request.as_ref().unwrap();

        assert_eq!(request.params.params["page"], json!("$page"));
        assert_eq!(request.params.desc["page"], json!("page no"));
        assert_eq!(request.form.data["avatar"], json!("$avatar"));
        assert_eq!(request.form.desc["avatar"], json!(""));
        assert_eq!(variable_names(&form), vec!["page", "avatar", "uid"]);
        assert_eq!(form.variables.variables[2]["uid"], json!("42"));
        assert_eq!(form.variables.desc["uid"], json!("user id"));
    }

    #[test]
    fn test_normalized_form_encodes() {
        let schema = json!({"properties": {"name": {"type": "string"}}});
        let form = Normalizer::new(1).normalize(&with_schema(schema)).unwrap().form;
        let encoded = encode_form(&form, Level::Test).unwrap();

        assert!(encoded.is_complete());
        assert_eq!(encoded.meta.project, Some(1));
        assert_eq!(encoded.meta.node_id, Some(0));
        let case = encoded.case;
        assert_eq!(case.request.url.as_deref(), Some("/users/$uid/roles/$rid"));
        assert_eq!(case.request.json, Some(json!({"name": "$name"})));
        assert_eq!(case.validate.unwrap().len(), 1);
        assert!(case.extract.is_none());
    }
}
