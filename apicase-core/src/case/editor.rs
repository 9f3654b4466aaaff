//! Row-oriented editor representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::form::{
    CaseForm, DataGroup, ExtractGroup, FilesGroup, HeaderGroup, HooksGroup, ParametersGroup,
    ParamsGroup, RequestGroups, ValidateGroup, VariablesGroup,
};
use super::Level;
use crate::infer::{TypeTag, ValueParseError};

/// Comparator used by the placeholder validate row.
pub const DEFAULT_COMPARATOR: &str = "equals";

/// Errors converting editor rows back into a form.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Row '{key}': {source}")]
    Row {
        key: String,
        #[source]
        source: ValueParseError,
    },

    #[error("Invalid JSON body: {0}")]
    JsonBody(#[from] serde_json::Error),
}

/// Untyped row (headers, extractors).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub key: String,
    pub value: String,
    pub desc: String,
}

/// Row whose value text is read back according to its type tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedRow {
    pub key: String,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub tag: TypeTag,
    pub desc: String,
}

impl TypedRow {
    pub fn placeholder() -> Self {
        Self {
            value: Some(String::new()),
            ..Default::default()
        }
    }

    fn parsed(&self) -> Result<Value, FormError> {
        self.tag
            .parse(self.value.as_deref())
            .map_err(|source| FormError::Row {
                key: self.key.clone(),
                source,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateRow {
    pub expect: Option<String>,
    pub actual: String,
    pub comparator: String,
    #[serde(rename = "type")]
    pub tag: TypeTag,
    #[serde(default)]
    pub desc: String,
}

impl Default for ValidateRow {
    fn default() -> Self {
        Self {
            expect: Some(String::new()),
            actual: String::new(),
            comparator: DEFAULT_COMPARATOR.to_string(),
            tag: TypeTag::String,
            desc: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookRow {
    pub setup: String,
    pub teardown: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorRequest {
    pub data: Vec<TypedRow>,
    pub params: Vec<TypedRow>,
    pub json_data: String,
    /// File field name to file reference.
    pub files: Vec<Row>,
}

impl Default for EditorRequest {
    fn default() -> Self {
        Self {
            data: vec![TypedRow::placeholder()],
            params: vec![TypedRow::placeholder()],
            json_data: String::new(),
            files: vec![Row::default()],
        }
    }
}

/// A test case as the editor renders it.
///
/// Every optional group holds at least one row; a row with an empty key is a
/// placeholder and carries no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorTestCase {
    pub name: Option<String>,
    pub header: Vec<Row>,
    pub request: EditorRequest,
    pub variables: Vec<TypedRow>,
    pub hooks: Vec<HookRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<Vec<ValidateRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<Vec<Row>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<TypedRow>>,
    /// Config level only. Not part of the runner script, so decoding leaves
    /// it unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl EditorTestCase {
    /// An empty case with one placeholder row per group.
    pub fn blank(level: Level) -> Self {
        let mut case = Self {
            name: None,
            header: vec![Row::default()],
            request: EditorRequest::default(),
            variables: vec![TypedRow::placeholder()],
            hooks: vec![HookRow::default()],
            times: None,
            method: None,
            url: None,
            validate: None,
            extract: None,
            base_url: None,
            parameters: None,
            is_default: None,
        };
        match level {
            Level::Test => {
                case.validate = Some(vec![ValidateRow::default()]);
                case.extract = Some(vec![Row::default()]);
            }
            Level::Config => {
                case.parameters = Some(vec![TypedRow::placeholder()]);
            }
        }
        case
    }

    /// Converts the rows back into a submittable form.
    ///
    /// Placeholder rows are dropped, typed values are parsed back by tag, empty
    /// hook cells and empty descriptions are dropped, and an empty JSON body
    /// becomes `{}`. Config forms without a default flag are marked
    /// non-default.
    pub fn to_form(&self, level: Level) -> Result<CaseForm, FormError> {
        let mut form = CaseForm {
            name: self.name.clone(),
            header: HeaderGroup {
                header: plain_values(&self.header),
                desc: descriptions(self.header.iter().map(|r| (&r.key, &r.desc))),
            },
            variables: VariablesGroup {
                variables: keyed_values(&self.variables)?,
                desc: descriptions(self.variables.iter().map(|r| (&r.key, &r.desc))),
            },
            hooks: HooksGroup {
                setup_hooks: non_blank(self.hooks.iter().map(|h| &h.setup)),
                teardown_hooks: non_blank(self.hooks.iter().map(|h| &h.teardown)),
            },
            ..Default::default()
        };

        match level {
            Level::Test => {
                let json = if self.request.json_data.trim().is_empty() {
                    Value::Object(Map::new())
                } else {
                    serde_json::from_str(&self.request.json_data)?
                };

                form.request = Some(RequestGroups {
                    form: DataGroup {
                        data: typed_values(&self.request.data)?,
                        desc: descriptions(self.request.data.iter().map(|r| (&r.key, &r.desc))),
                    },
                    json,
                    params: ParamsGroup {
                        params: typed_values(&self.request.params)?,
                        desc: descriptions(
                            self.request.params.iter().map(|r| (&r.key, &r.desc)),
                        ),
                    },
                    files: FilesGroup {
                        files: plain_values(&self.request.files),
                        desc: descriptions(self.request.files.iter().map(|r| (&r.key, &r.desc))),
                    },
                });

                let extract = self.extract.as_deref().unwrap_or_default();
                form.extract = Some(ExtractGroup {
                    extract: extract
                        .iter()
                        .filter(|r| !r.key.is_empty())
                        .map(|r| single(&r.key, Value::String(r.value.clone())))
                        .collect(),
                    desc: descriptions(extract.iter().map(|r| (&r.key, &r.desc))),
                });

                let validate = self.validate.as_deref().unwrap_or_default();
                form.validate = Some(ValidateGroup {
                    validate: validate
                        .iter()
                        .filter(|r| !r.actual.is_empty())
                        .map(|r| {
                            let expected = r.tag.parse(r.expect.as_deref()).map_err(|source| {
                                FormError::Row {
                                    key: r.actual.clone(),
                                    source,
                                }
                            })?;
                            let mut entry = vec![Value::String(r.actual.clone()), expected];
                            if !r.desc.is_empty() {
                                entry.push(Value::String(r.desc.clone()));
                            }
                            Ok(single(&r.comparator, Value::Array(entry)))
                        })
                        .collect::<Result<_, FormError>>()?,
                });

                form.url = self.url.clone();
                form.method = self.method.clone();
                form.times = self.times;
            }
            Level::Config => {
                let parameters = self.parameters.as_deref().unwrap_or_default();
                form.base_url = self.base_url.clone();
                form.is_default = Some(self.is_default.unwrap_or(false));
                form.parameters = Some(ParametersGroup {
                    parameters: keyed_values(parameters)?,
                    desc: descriptions(parameters.iter().map(|r| (&r.key, &r.desc))),
                });
            }
        }

        Ok(form)
    }
}

fn single(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}

fn plain_values(rows: &[Row]) -> Map<String, Value> {
    rows.iter()
        .filter(|r| !r.key.is_empty())
        .map(|r| (r.key.clone(), Value::String(r.value.clone())))
        .collect()
}

fn typed_values(rows: &[TypedRow]) -> Result<Map<String, Value>, FormError> {
    rows.iter()
        .filter(|r| !r.key.is_empty())
        .map(|r| Ok((r.key.clone(), r.parsed()?)))
        .collect()
}

fn keyed_values(rows: &[TypedRow]) -> Result<Vec<Map<String, Value>>, FormError> {
    rows.iter()
        .filter(|r| !r.key.is_empty())
        .map(|r| Ok(single(&r.key, r.parsed()?)))
        .collect()
}

fn descriptions<'a>(rows: impl Iterator<Item = (&'a String, &'a String)>) -> Map<String, Value> {
    rows.filter(|(key, desc)| !key.is_empty() && !desc.is_empty())
        .map(|(key, desc)| (key.clone(), Value::String(desc.clone())))
        .collect()
}

fn non_blank<'a>(cells: impl Iterator<Item = &'a String>) -> Vec<String> {
    cells.filter(|c| !c.is_empty()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_has_one_placeholder_per_group() {
        let case = EditorTestCase::blank(Level::Test);
        assert_eq!(case.header.len(), 1);
        assert_eq!(case.request.data, vec![TypedRow::placeholder()]);
        assert_eq!(case.variables[0].tag, TypeTag::String);
        assert_eq!(case.validate.as_ref().unwrap()[0].comparator, "equals");
        assert!(case.parameters.is_none());

        let config = EditorTestCase::blank(Level::Config);
        assert!(config.validate.is_none());
        assert_eq!(config.parameters.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_rows_serialize_with_type_code() {
        let row = TypedRow {
            key: "n".into(),
            value: Some("1".into()),
            tag: TypeTag::Int,
            desc: "count".into(),
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"key": "n", "value": "1", "type": 2, "desc": "count"})
        );
    }

    #[test]
    fn test_to_form_drops_placeholders() {
        let form = EditorTestCase::blank(Level::Test)
            .to_form(Level::Test)
            .unwrap();
        assert!(form.header.header.is_empty());
        assert!(form.variables.variables.is_empty());
        assert!(form.hooks.setup_hooks.is_empty());
        let request = form.request.unwrap();
        assert_eq!(request.json, json!({}));
        assert!(request.form.data.is_empty());
        assert!(form.validate.unwrap().validate.is_empty());
    }

    #[test]
    fn test_to_form_parses_typed_rows() {
        let mut case = EditorTestCase::blank(Level::Test);
        case.variables = vec![
            TypedRow {
                key: "ids".into(),
                value: Some("[1, 2]".into()),
                tag: TypeTag::Sequence,
                desc: "ids".into(),
            },
            TypedRow {
                key: "page".into(),
                value: Some("$int_page".into()),
                tag: TypeTag::Int,
                desc: String::new(),
            },
        ];
        case.validate = Some(vec![ValidateRow {
            expect: Some("200".into()),
            actual: "status_code".into(),
            comparator: "equals".into(),
            tag: TypeTag::Int,
            desc: "ok".into(),
        }]);

        let form = case.to_form(Level::Test).unwrap();
        assert_eq!(
            form.variables.variables,
            vec![
                single("ids", json!([1, 2])),
                single("page", json!("$int_page")),
            ]
        );
        assert_eq!(
            form.validate.unwrap().validate,
            vec![single("equals", json!(["status_code", 200, "ok"]))]
        );
    }

    #[test]
    fn test_to_form_keeps_files() {
        let mut case = EditorTestCase::blank(Level::Test);
        case.request.files = vec![
            Row {
                key: "avatar".into(),
                value: "a.png".into(),
                desc: "profile picture".into(),
            },
            Row::default(),
        ];
        let files = case.to_form(Level::Test).unwrap().request.unwrap().files;
        assert_eq!(files.files, single("avatar", json!("a.png")));
        assert_eq!(files.desc, single("avatar", json!("profile picture")));
    }

    #[test]
    fn test_to_form_omits_empty_validator_description() {
        let mut case = EditorTestCase::blank(Level::Test);
        case.variables = vec![TypedRow {
            key: "host".into(),
            value: Some("h".into()),
            tag: TypeTag::String,
            desc: String::new(),
        }];
        case.validate = Some(vec![ValidateRow {
            expect: Some("200".into()),
            actual: "status_code".into(),
            comparator: "equals".into(),
            tag: TypeTag::Int,
            desc: String::new(),
        }]);

        let form = case.to_form(Level::Test).unwrap();
        assert_eq!(
            form.validate.unwrap().validate,
            vec![single("equals", json!(["status_code", 200]))]
        );
        assert!(form.variables.desc.is_empty());
    }

    #[test]
    fn test_to_form_carries_default_flag() {
        let mut case = EditorTestCase::blank(Level::Config);
        assert_eq!(case.to_form(Level::Config).unwrap().is_default, Some(false));

        case.is_default = Some(true);
        assert_eq!(case.to_form(Level::Config).unwrap().is_default, Some(true));
    }

    #[test]
    fn test_to_form_reports_bad_row() {
        let mut case = EditorTestCase::blank(Level::Test);
        case.variables = vec![TypedRow {
            key: "count".into(),
            value: Some("many".into()),
            tag: TypeTag::Int,
            desc: String::new(),
        }];
        let err = case.to_form(Level::Test).unwrap_err();
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn test_to_form_rejects_bad_json_body() {
        let mut case = EditorTestCase::blank(Level::Test);
        case.request.json_data = "{not json".into();
        assert!(matches!(
            case.to_form(Level::Test),
            Err(FormError::JsonBody(_))
        ));
    }

    #[test]
    fn test_to_form_splits_hooks() {
        let mut case = EditorTestCase::blank(Level::Test);
        case.hooks = vec![
            HookRow {
                setup: "s1".into(),
                teardown: "t1".into(),
            },
            HookRow {
                setup: "s2".into(),
                teardown: String::new(),
            },
        ];
        let form = case.to_form(Level::Test).unwrap();
        assert_eq!(form.hooks.setup_hooks, vec!["s1", "s2"]);
        assert_eq!(form.hooks.teardown_hooks, vec!["t1"]);
    }
}
